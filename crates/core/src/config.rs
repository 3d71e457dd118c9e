//! Toolchain Configuration
//!
//! User-facing settings that feed the native toolchain locators:
//! - SDK root
//! - Declared NDK version and `ndk.dir` override
//! - Declared CMake version and `cmake.dir` override
//! - Platform (minSdk / codename) and target ABIs

use std::path::{Path, PathBuf};
use std::time::Duration;
use serde::{Deserialize, Serialize};
use tracing::{debug, info};

use crate::error::{CxxError, Result};

/// Default bound on a single `cmake --version` probe
pub const DEFAULT_PROBE_TIMEOUT_SECS: u64 = 10;

/// Android SDK settings
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
#[serde(default)]
pub struct SdkConfig {
    /// Path to the Android SDK; auto-detected when unset
    pub dir: Option<PathBuf>,
}

impl SdkConfig {
    /// Explicit SDK dir, else environment, else common per-user locations
    pub fn resolve_dir(&self) -> Option<PathBuf> {
        if let Some(dir) = &self.dir {
            return Some(dir.clone());
        }

        for var in ["ANDROID_SDK_ROOT", "ANDROID_HOME"] {
            if let Some(value) = std::env::var_os(var) {
                if !value.is_empty() {
                    return Some(PathBuf::from(value));
                }
            }
        }

        let candidates = if cfg!(windows) {
            vec![dirs::data_local_dir().map(|d| d.join("Android").join("Sdk"))]
        } else if cfg!(target_os = "macos") {
            vec![dirs::home_dir().map(|h| h.join("Library").join("Android").join("sdk"))]
        } else {
            vec![
                dirs::home_dir().map(|h| h.join("Android").join("Sdk")),
                Some(PathBuf::from("/opt/android-sdk")),
            ]
        };

        candidates.into_iter().flatten().find(|p| p.is_dir())
    }
}

/// NDK settings
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
#[serde(default)]
pub struct NdkConfig {
    /// Declared NDK version (major.minor.micro)
    pub version: Option<String>,
    /// Explicit NDK folder (`ndk.dir`); authoritative when set
    pub dir: Option<PathBuf>,
}

/// CMake settings
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(default)]
pub struct CmakeConfig {
    /// Declared CMake version
    pub version: Option<String>,
    /// Explicit CMake install folder (`cmake.dir`), without the `bin` suffix
    pub dir: Option<PathBuf>,
    /// Bound on each `cmake --version` invocation
    pub probe_timeout_secs: u64,
}

impl Default for CmakeConfig {
    fn default() -> Self {
        Self {
            version: None,
            dir: None,
            probe_timeout_secs: DEFAULT_PROBE_TIMEOUT_SECS,
        }
    }
}

impl CmakeConfig {
    pub fn probe_timeout(&self) -> Duration {
        Duration::from_secs(self.probe_timeout_secs.max(1))
    }
}

/// Platform settings
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(default)]
pub struct PlatformConfig {
    /// Declared minSdkVersion
    pub min_sdk: Option<u32>,
    /// Declared API codename (e.g. "P")
    pub codename: Option<String>,
    /// ABIs to configure
    pub abis: Vec<String>,
}

impl Default for PlatformConfig {
    fn default() -> Self {
        Self {
            min_sdk: None,
            codename: None,
            abis: vec![
                "arm64-v8a".to_string(),
                "armeabi-v7a".to_string(),
                "x86".to_string(),
                "x86_64".to_string(),
            ],
        }
    }
}

/// Complete toolchain configuration
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(default)]
pub struct ToolchainConfig {
    /// Configuration version for migrations
    pub version: u32,
    pub sdk: SdkConfig,
    pub ndk: NdkConfig,
    pub cmake: CmakeConfig,
    pub platform: PlatformConfig,
}

impl Default for ToolchainConfig {
    fn default() -> Self {
        Self {
            version: 1,
            sdk: SdkConfig::default(),
            ndk: NdkConfig::default(),
            cmake: CmakeConfig::default(),
            platform: PlatformConfig::default(),
        }
    }
}

impl ToolchainConfig {
    /// Parse from TOML text
    pub fn from_toml_str(contents: &str) -> Result<Self> {
        let config: ToolchainConfig = toml::from_str(contents)?;
        config.validate()?;
        Ok(config)
    }

    /// Load configuration from file, falling back to defaults if it doesn't exist
    pub async fn load(path: &Path) -> Result<Self> {
        if tokio::fs::try_exists(path).await? {
            debug!("Loading toolchain config from {:?}", path);
            let contents = tokio::fs::read_to_string(path).await?;
            Self::from_toml_str(&contents)
        } else {
            info!("Toolchain config {:?} not found, using defaults", path);
            Ok(Self::default())
        }
    }

    /// Save configuration to file
    pub async fn save(&self, path: &Path) -> Result<()> {
        if let Some(parent) = path.parent() {
            tokio::fs::create_dir_all(parent).await?;
        }

        let contents = toml::to_string_pretty(self)?;
        tokio::fs::write(path, contents).await?;

        debug!("Toolchain config saved to {:?}", path);
        Ok(())
    }

    /// Reject settings no locator could act on
    pub fn validate(&self) -> Result<()> {
        if self.version == 0 {
            return Err(CxxError::Config("config version must be at least 1".into()));
        }
        if self.platform.abis.iter().any(|abi| abi.trim().is_empty()) {
            return Err(CxxError::Config("platform.abis contains an empty ABI name".into()));
        }
        Ok(())
    }
}
