//! Installed SDK packages
//!
//! Reads SDK package folders directly instead of going through `sdkmanager`.

use std::path::{Path, PathBuf};
use tracing::debug;

use crate::cmake::{SdkPackage, CMAKE_SDK_PACKAGE_PREFIX};
use crate::revision::Revision;
use crate::source_properties::{PackageRevision, SourceProperties};

/// Scans an SDK root for installed packages
#[derive(Debug, Clone)]
pub struct SdkPackageScanner {
    sdk_root: PathBuf,
}

impl SdkPackageScanner {
    pub fn new(sdk_root: impl Into<PathBuf>) -> Self {
        Self {
            sdk_root: sdk_root.into(),
        }
    }

    pub fn sdk_root(&self) -> &Path {
        &self.sdk_root
    }

    /// Installed `cmake;<version>` packages, ordered by folder name
    ///
    /// The version comes from `Pkg.Revision`; folders without a usable
    /// revision fall back to their name, and are skipped if that isn't a
    /// version either.
    pub fn cmake_packages(&self) -> Vec<SdkPackage> {
        let root = self.sdk_root.join(CMAKE_SDK_PACKAGE_PREFIX);
        let Ok(entries) = std::fs::read_dir(&root) else {
            debug!("No SDK CMake packages in {}", root.display());
            return Vec::new();
        };

        let mut folders: Vec<PathBuf> = entries
            .flatten()
            .map(|entry| entry.path())
            .filter(|path| path.is_dir())
            .collect();
        folders.sort();

        folders
            .into_iter()
            .filter_map(|folder| {
                let version = Self::package_version(&folder)?;
                debug!("Found SDK CMake {} at {}", version, folder.display());
                Some(SdkPackage::new(version, folder))
            })
            .collect()
    }

    fn package_version(folder: &Path) -> Option<Revision> {
        let from_properties = SourceProperties::load(folder).and_then(|properties| {
            match properties.package_revision() {
                PackageRevision::Valid(revision) => Some(revision),
                PackageRevision::Missing | PackageRevision::Invalid(_) => None,
            }
        });

        from_properties.or_else(|| {
            let name = folder.file_name()?.to_str()?;
            Revision::parse(name).ok()
        })
    }
}
