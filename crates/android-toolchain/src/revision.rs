//! Revisions
//!
//! Dotted `major[.minor[.micro]]` versions with an optional preview suffix,
//! as written in `source.properties`, SDK package names and `cmake --version`.

use std::cmp::Ordering;
use std::fmt;
use std::hash::{Hash, Hasher};
use std::str::FromStr;

/// Revision parse errors
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum RevisionParseError {
    #[error("empty revision")]
    Empty,
    #[error("revision '{0}' has an empty or non-numeric component")]
    BadComponent(String),
    #[error("revision '{0}' has more than three components")]
    TooManyComponents(String),
    #[error("revision '{0}' has an empty preview")]
    EmptyPreview(String),
}

/// Number of numeric components that were written
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum Precision {
    Major = 1,
    Minor = 2,
    Micro = 3,
}

impl Precision {
    fn from_count(count: usize) -> Self {
        match count {
            1 => Precision::Major,
            2 => Precision::Minor,
            _ => Precision::Micro,
        }
    }
}

/// A parsed version
///
/// Equality and ordering ignore precision, so `3.6` equals `3.6.0`. A
/// release orders above any preview of the same numbers.
#[derive(Debug, Clone)]
pub struct Revision {
    major: u32,
    minor: u32,
    micro: u32,
    preview: Option<String>,
    precision: Precision,
}

impl Revision {
    /// Three-component revision without preview
    pub fn new(major: u32, minor: u32, micro: u32) -> Self {
        Self {
            major,
            minor,
            micro,
            preview: None,
            precision: Precision::Micro,
        }
    }

    pub fn with_preview(mut self, preview: impl Into<String>) -> Self {
        self.preview = Some(preview.into());
        self
    }

    /// Parse `3.6.0-rc2`, `18.1`, `3.12.0 rc1` ...
    pub fn parse(text: &str) -> Result<Self, RevisionParseError> {
        let text = text.trim();
        if text.is_empty() {
            return Err(RevisionParseError::Empty);
        }

        let numeric_end = text
            .find(|c: char| !(c.is_ascii_digit() || c == '.'))
            .unwrap_or(text.len());
        let (numeric, rest) = text.split_at(numeric_end);

        let preview = if rest.is_empty() {
            None
        } else {
            let stripped = rest
                .strip_prefix('-')
                .or_else(|| rest.strip_prefix(' '))
                .ok_or_else(|| RevisionParseError::BadComponent(text.to_string()))?
                .trim();
            if stripped.is_empty() {
                return Err(RevisionParseError::EmptyPreview(text.to_string()));
            }
            Some(stripped.to_string())
        };

        let parts: Vec<&str> = numeric.split('.').collect();
        if parts.len() > 3 {
            return Err(RevisionParseError::TooManyComponents(text.to_string()));
        }

        let mut components = [0u32; 3];
        for (slot, part) in components.iter_mut().zip(&parts) {
            *slot = part
                .parse::<u32>()
                .map_err(|_| RevisionParseError::BadComponent(text.to_string()))?;
        }

        Ok(Self {
            major: components[0],
            minor: components[1],
            micro: components[2],
            preview,
            precision: Precision::from_count(parts.len()),
        })
    }

    pub fn major(&self) -> u32 {
        self.major
    }

    pub fn minor(&self) -> u32 {
        self.minor
    }

    pub fn micro(&self) -> u32 {
        self.micro
    }

    pub fn preview(&self) -> Option<&str> {
        self.preview.as_deref()
    }

    pub fn precision(&self) -> Precision {
        self.precision
    }

    /// Same numbers and precision, preview dropped
    pub fn strip_preview(&self) -> Revision {
        Revision {
            preview: None,
            ..self.clone()
        }
    }

    /// Exact textual identity, precision and preview included
    pub fn is_identical(&self, other: &Revision) -> bool {
        self == other && self.precision == other.precision
    }

    fn numbers(&self) -> (u32, u32, u32) {
        (self.major, self.minor, self.micro)
    }

    /// Why `self` does not satisfy `requested`, comparing only the
    /// components `requested` spells out; `None` when it does.
    pub fn mismatch_reason(&self, requested: &Revision) -> Option<String> {
        let checks = [
            ("MAJOR", self.major, requested.major, Precision::Major),
            ("MINOR", self.minor, requested.minor, Precision::Minor),
            ("MICRO", self.micro, requested.micro, Precision::Micro),
        ];
        for (name, found, wanted, precision) in checks {
            if requested.precision >= precision && found != wanted {
                return Some(format!("{} value {} wasn't exactly {}", name, found, wanted));
            }
        }

        if let Some(wanted) = requested.preview() {
            if self.preview() != Some(wanted) {
                return Some(format!(
                    "PREVIEW value {} wasn't exactly {}",
                    self.preview().unwrap_or("none"),
                    wanted
                ));
            }
        }
        None
    }

    /// Whether `self` satisfies `requested` (see [`Revision::mismatch_reason`])
    pub fn satisfies(&self, requested: &Revision) -> bool {
        self.mismatch_reason(requested).is_none()
    }
}

impl FromStr for Revision {
    type Err = RevisionParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Revision::parse(s)
    }
}

impl fmt::Display for Revision {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.major)?;
        if self.precision >= Precision::Minor {
            write!(f, ".{}", self.minor)?;
        }
        if self.precision >= Precision::Micro {
            write!(f, ".{}", self.micro)?;
        }
        if let Some(preview) = &self.preview {
            write!(f, "-{}", preview)?;
        }
        Ok(())
    }
}

impl PartialEq for Revision {
    fn eq(&self, other: &Self) -> bool {
        self.cmp(other) == Ordering::Equal
    }
}

impl Eq for Revision {}

impl Hash for Revision {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.numbers().hash(state);
        self.preview.hash(state);
    }
}

impl PartialOrd for Revision {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for Revision {
    fn cmp(&self, other: &Self) -> Ordering {
        self.numbers()
            .cmp(&other.numbers())
            .then_with(|| match (&self.preview, &other.preview) {
                (None, None) => Ordering::Equal,
                (None, Some(_)) => Ordering::Greater,
                (Some(_), None) => Ordering::Less,
                (Some(a), Some(b)) => a.cmp(b),
            })
    }
}
