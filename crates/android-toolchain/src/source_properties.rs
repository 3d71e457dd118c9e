//! `source.properties` reader
//!
//! SDK packages (NDK, CMake) describe themselves with a small Java-style
//! properties file at the package root.

use std::collections::BTreeMap;
use std::path::Path;

use crate::revision::{Revision, RevisionParseError};

/// File name of package metadata
pub const SOURCE_PROPERTIES: &str = "source.properties";

/// Key holding the package revision
pub const PKG_REVISION: &str = "Pkg.Revision";

/// Key holding the package description
pub const PKG_DESC: &str = "Pkg.Desc";

/// Outcome of reading `Pkg.Revision`
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PackageRevision {
    Missing,
    Invalid(String),
    Valid(Revision),
}

/// Parsed properties, kept in key order
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SourceProperties {
    values: BTreeMap<String, String>,
}

impl SourceProperties {
    pub fn new(values: BTreeMap<String, String>) -> Self {
        Self { values }
    }

    /// Parse properties text; blank lines and `#`/`!` comments are ignored
    pub fn parse(content: &str) -> Self {
        let mut values = BTreeMap::new();

        for line in content.lines() {
            let line = line.trim();
            if line.is_empty() || line.starts_with('#') || line.starts_with('!') {
                continue;
            }

            let (key, value) = match line.find(['=', ':']) {
                Some(index) => (&line[..index], &line[index + 1..]),
                None => (line, ""),
            };
            values.insert(key.trim().to_string(), value.trim().to_string());
        }

        Self { values }
    }

    /// Read `<folder>/source.properties`; `None` when missing or unreadable
    pub fn load(folder: &Path) -> Option<Self> {
        let content = std::fs::read_to_string(folder.join(SOURCE_PROPERTIES)).ok()?;
        Some(Self::parse(&content))
    }

    pub fn get(&self, key: &str) -> Option<&str> {
        self.values.get(key).map(String::as_str)
    }

    pub fn values(&self) -> &BTreeMap<String, String> {
        &self.values
    }

    pub fn into_values(self) -> BTreeMap<String, String> {
        self.values
    }

    /// Decode `Pkg.Revision`
    pub fn package_revision(&self) -> PackageRevision {
        match self.get(PKG_REVISION) {
            None => PackageRevision::Missing,
            Some(text) => match Revision::parse(text) {
                Ok(revision) => PackageRevision::Valid(revision),
                Err(_) => PackageRevision::Invalid(text.to_string()),
            },
        }
    }

    pub fn revision(&self) -> Result<Option<Revision>, RevisionParseError> {
        self.get(PKG_REVISION).map(Revision::parse).transpose()
    }
}
