//! cxx-configure command line
//!
//! `cxx-configure [config.toml] [output-dir]` resolves the native toolchain
//! and, when an output folder is given, writes one compiler settings cache
//! key per ABI under `<output-dir>/<abi>`.

use std::path::PathBuf;

use anyhow::{Context, Result};
use tracing::info;
use tracing_subscriber::{EnvFilter, FmtSubscriber};

use cxx_configure::cmake::{build_cache_key, write_cache_key};
use cxx_configure::core::{ToolchainConfig, TracingSink};
use cxx_configure::toolchain::NdkLocatorCache;
use cxx_configure::{resolve_native_toolchain, VERSION};

/// Config file read when none is given
const DEFAULT_CONFIG_FILE: &str = "cxx-configure.toml";

#[tokio::main]
async fn main() -> Result<()> {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    let subscriber = FmtSubscriber::builder()
        .with_env_filter(filter)
        .with_target(false)
        .finish();
    tracing::subscriber::set_global_default(subscriber).context("Failed to set tracing subscriber")?;

    info!("cxx-configure v{}", VERSION);

    let mut args = std::env::args().skip(1);
    let config_path = args
        .next()
        .map(PathBuf::from)
        .unwrap_or_else(|| PathBuf::from(DEFAULT_CONFIG_FILE));
    let output_dir = args.next().map(PathBuf::from);

    let config = ToolchainConfig::load(&config_path)
        .await
        .with_context(|| format!("Failed to load {}", config_path.display()))?;

    let cache = NdkLocatorCache::new();
    let mut sink = TracingSink::new("cxx");
    let toolchain = resolve_native_toolchain(&config, &cache, &mut sink).await?;

    info!("NDK {} at {}", toolchain.ndk.revision, toolchain.ndk.path.display());
    info!("CMake {} at {}", toolchain.cmake.version, toolchain.cmake.path.display());
    for (abi, platform) in &toolchain.platforms {
        info!("{}: android-{}", abi, platform);
    }

    if let Some(output_dir) = output_dir {
        let source_dir = std::env::current_dir()?;
        for abi in toolchain.platforms.keys() {
            let abi_dir = output_dir.join(abi.abi_name());
            let cmake_args = toolchain.cmake_arguments(*abi, &source_dir, &abi_dir);
            let mut abi_sink = TracingSink::new(abi.abi_name());
            let key = build_cache_key(&cmake_args, &mut abi_sink);
            let key_file = write_cache_key(&key, &abi_dir)?;
            info!("Cache key for {} written to {}", abi, key_file.display());
        }
    }

    Ok(())
}
