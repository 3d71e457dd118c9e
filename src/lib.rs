//! cxx-configure
//!
//! Locates the Android NDK and CMake for native (C/C++) builds, picks the
//! platform version per ABI, and derives compiler settings cache keys from
//! CMake command lines.
//!
//! ## Architecture
//!
//! - `cxx-configure-core`: errors, TOML configuration, diagnostic sinks
//! - `cxx-configure-toolchain`: revisions, NDK/CMake locators, platforms
//! - `cxx-configure-cmake`: CMake argument model and cache keys

#![warn(clippy::all)]

pub mod resolver;

pub use cxx_configure_cmake as cmake;
pub use cxx_configure_core as core;
pub use cxx_configure_toolchain as toolchain;

pub use resolver::{resolve_native_toolchain, NativeToolchain};

/// Common imports
pub mod prelude {
    pub use crate::resolver::{resolve_native_toolchain, NativeToolchain};
    pub use cxx_configure_cmake::{build_cache_key, parse_arguments, CommandLineArgument, CxxCacheKey};
    pub use cxx_configure_core::{
        Diagnostic, DiagnosticSink, DiagnosticSinkExt, RecordingSink, Severity, ToolchainConfig, TracingSink,
    };
    pub use cxx_configure_toolchain::{
        locate_cmake, locate_ndk, Abi, CmakeLocation, NdkLocation, NdkLocatorCache, PlatformConfigurator,
        Revision,
    };
}

/// Library version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
