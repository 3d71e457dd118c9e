//! Error types for cxx-configure
//!
//! Centralized error handling using thiserror.

use thiserror::Error;

/// Main error type shared by the cxx-configure crates
#[derive(Error, Debug)]
pub enum CxxError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("TOML parse error: {0}")]
    TomlParse(#[from] toml::de::Error),

    #[error("TOML serialize error: {0}")]
    TomlSerialize(#[from] toml::ser::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

/// Result type alias for cxx-configure operations
pub type Result<T> = std::result::Result<T, CxxError>;
