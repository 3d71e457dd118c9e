//! cxx-configure core - shared types
//!
//! Error handling, configuration, and the diagnostic sink used by the
//! native toolchain locators.

pub mod config;
pub mod diagnostics;
pub mod error;

pub use config::{CmakeConfig, NdkConfig, PlatformConfig, SdkConfig, ToolchainConfig};
pub use diagnostics::{Diagnostic, DiagnosticSink, DiagnosticSinkExt, RecordingSink, Severity, TeeSink, TracingSink};
pub use error::{CxxError, Result};

/// cxx-configure version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
