//! Android native toolchain location
//!
//! Finds the NDK and CMake a native build should use and the platform
//! version each ABI is compiled against:
//! - `revision`, `source_properties`: versions and SDK package metadata
//! - `ndk`: NDK locator with a per-build cache
//! - `cmake`: staged CMake locator
//! - `platform`: API level selection per ABI
//! - `host`, `sdk_packages`: probing of the real machine

pub mod abi;
pub mod cmake;
pub mod host;
pub mod ndk;
pub mod platform;
pub mod revision;
pub mod sdk_packages;
pub mod source_properties;

pub use abi::{Abi, UnknownAbi};
pub use cmake::{
    locate_cmake, search_cmake, CmakeEnvironment, CmakeLocateError, CmakeLocation, CmakeOrigin,
    CmakeRequest, CmakeSearch, SdkPackage,
};
pub use host::{probe_cmake_version, HostCmakeEnvironment};
pub use ndk::{
    locate_ndk, locate_ndk_uncached, FileSystemNdkInstallations, NdkInstallations, NdkLocation,
    NdkLocatorCache, NdkLocatorKey, NdkRequest, DEFAULT_NDK_VERSION,
};
pub use platform::{NdkPlatforms, PlatformConfigurator, UNKNOWN_CODENAME_API};
pub use revision::{Precision, Revision, RevisionParseError};
pub use sdk_packages::SdkPackageScanner;
pub use source_properties::{PackageRevision, SourceProperties};
