//! Native toolchain resolution
//!
//! Wires configuration through the NDK locator, the CMake locator and the
//! platform configurator for every configured ABI.

use std::collections::BTreeMap;
use std::path::Path;

use anyhow::{anyhow, Context, Result};
use tracing::{info, warn};

use cxx_configure_cmake::args::{parse_arguments, CommandLineArgument};
use cxx_configure_core::{DiagnosticSink, ToolchainConfig};
use cxx_configure_toolchain::{
    locate_cmake, locate_ndk, Abi, CmakeLocation, CmakeRequest, FileSystemNdkInstallations,
    HostCmakeEnvironment, NdkLocation, NdkLocatorCache, NdkRequest, PlatformConfigurator,
};

/// Everything a native build needs to configure CMake
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NativeToolchain {
    pub ndk: NdkLocation,
    pub cmake: CmakeLocation,
    pub platforms: BTreeMap<Abi, u32>,
}

impl NativeToolchain {
    /// CMake command line configuring `abi`
    pub fn cmake_arguments(&self, abi: Abi, source_dir: &Path, build_dir: &Path) -> Vec<CommandLineArgument> {
        let ndk = self.ndk.path.display();
        let mut tokens = vec![
            format!("-H{}", source_dir.display()),
            format!("-B{}", build_dir.display()),
            "-GNinja".to_string(),
            format!("-DANDROID_NDK={}", ndk),
            format!("-DCMAKE_TOOLCHAIN_FILE={}/build/cmake/android.toolchain.cmake", ndk),
            format!("-DANDROID_ABI={}", abi),
            format!("-DCMAKE_LIBRARY_OUTPUT_DIRECTORY={}", build_dir.join("lib").display()),
            "-DCMAKE_EXPORT_COMPILE_COMMANDS=ON".to_string(),
        ];
        if let Some(platform) = self.platforms.get(&abi) {
            tokens.push(format!("-DANDROID_PLATFORM=android-{}", platform));
        }
        parse_arguments(tokens)
    }
}

/// Resolve NDK, CMake and per-ABI platform versions for `config`
///
/// Diagnostics go to `sink`; `cache` should live for one build invocation.
pub async fn resolve_native_toolchain(
    config: &ToolchainConfig,
    cache: &NdkLocatorCache,
    sink: &mut dyn DiagnosticSink,
) -> Result<NativeToolchain> {
    let sdk_root = config.sdk.resolve_dir();
    info!("Resolving native toolchain (SDK: {:?})", sdk_root);

    let abis = config
        .platform
        .abis
        .iter()
        .map(|name| name.parse::<Abi>())
        .collect::<std::result::Result<Vec<_>, _>>()
        .context("Invalid ABI in platform configuration")?;

    let ndk_request = NdkRequest {
        declared_version: config.ndk.version.clone(),
        override_path: config.ndk.dir.clone(),
        sdk_root: sdk_root.clone(),
    };
    let ndk = locate_ndk(&ndk_request, &FileSystemNdkInstallations, cache, sink)
        .ok_or_else(|| anyhow!("No usable NDK was found"))?;

    let mut environment = HostCmakeEnvironment::probe(
        config.cmake.dir.as_deref(),
        sdk_root.as_deref(),
        config.cmake.probe_timeout(),
    )
    .await;
    let cmake_request = CmakeRequest {
        declared_version: config.cmake.version.clone(),
        cmake_dir: config.cmake.dir.clone(),
    };
    let located = locate_cmake(&cmake_request, &mut environment, sink);
    for package in environment.downloads_requested() {
        warn!("SDK package '{}' is required; install it with sdkmanager", package);
    }
    let cmake = located.context("CMake could not be located")?;

    let configurator = PlatformConfigurator::new(&ndk.path);
    let platforms = abis
        .into_iter()
        .map(|abi| {
            let platform = configurator.resolve_platform_version(
                abi,
                config.platform.min_sdk,
                config.platform.codename.as_deref(),
                sink,
            );
            (abi, platform)
        })
        .collect();

    Ok(NativeToolchain { ndk, cmake, platforms })
}
