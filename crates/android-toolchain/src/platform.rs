//! Platform configurator
//!
//! Picks the API level to compile an ABI against from `minSdkVersion` and/or
//! an API codename, bounded by what the NDK supports. Newer NDKs describe the
//! supported range in `meta/platforms.json`; older ones are scanned for
//! `platforms/android-<N>/arch-<arch>` folders.

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

use cxx_configure_core::diagnostics::{DiagnosticSink, DiagnosticSinkExt};
use cxx_configure_core::Result;
use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use crate::abi::Abi;

/// NDK-relative location of the platform metadata
pub const PLATFORMS_METADATA: &str = "meta/platforms.json";

/// Candidate used for an unrecognized codename; always clamped to the NDK maximum
pub const UNKNOWN_CODENAME_API: u32 = 10_000;

/// Codenames known regardless of NDK metadata
const CODENAME_ALIASES: &[(&str, u32)] = &[
    ("J", 16),
    ("J-MR1", 17),
    ("J-MR2", 18),
    ("K", 19),
    ("L", 21),
    ("L-MR1", 22),
    ("M", 23),
    ("N", 24),
    ("N-MR1", 25),
    ("O", 26),
    ("O-MR1", 27),
    ("P", 28),
    ("Q", 29),
    ("R", 30),
    ("S", 31),
];

/// Contents of `meta/platforms.json`
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NdkPlatforms {
    pub min: u32,
    pub max: u32,
    #[serde(default)]
    pub aliases: BTreeMap<String, u32>,
}

impl NdkPlatforms {
    /// Read the metadata of the NDK at `ndk_root`; `Ok(None)` for legacy NDKs
    pub fn load(ndk_root: &Path) -> Result<Option<Self>> {
        let path = ndk_root.join(PLATFORMS_METADATA);
        if !path.is_file() {
            return Ok(None);
        }
        let contents = std::fs::read_to_string(&path)?;
        let platforms = serde_json::from_str(&contents)?;
        Ok(Some(platforms))
    }
}

/// Resolves platform versions for one NDK
#[derive(Debug, Clone)]
pub struct PlatformConfigurator {
    ndk_root: PathBuf,
    metadata: Option<NdkPlatforms>,
}

impl PlatformConfigurator {
    /// Configurator for the NDK at `ndk_root`, reading its metadata if present
    ///
    /// Unreadable metadata is logged and the NDK is treated as legacy.
    pub fn new(ndk_root: impl Into<PathBuf>) -> Self {
        let ndk_root = ndk_root.into();
        let metadata = match NdkPlatforms::load(&ndk_root) {
            Ok(metadata) => metadata,
            Err(e) => {
                warn!(
                    "Ignoring unreadable {} in {}: {}",
                    PLATFORMS_METADATA,
                    ndk_root.display(),
                    e
                );
                None
            }
        };
        Self { ndk_root, metadata }
    }

    pub fn with_metadata(ndk_root: impl Into<PathBuf>, metadata: Option<NdkPlatforms>) -> Self {
        Self {
            ndk_root: ndk_root.into(),
            metadata,
        }
    }

    pub fn ndk_root(&self) -> &Path {
        &self.ndk_root
    }

    pub fn metadata(&self) -> Option<&NdkPlatforms> {
        self.metadata.as_ref()
    }

    /// API level for `codename`, metadata aliases first
    pub fn codename_api(&self, codename: &str) -> Option<u32> {
        self.metadata
            .as_ref()
            .and_then(|metadata| metadata.aliases.get(codename).copied())
            .or_else(|| {
                CODENAME_ALIASES
                    .iter()
                    .find(|(alias, _)| *alias == codename)
                    .map(|(_, api)| *api)
            })
    }

    /// Platform version to build `abi` against
    pub fn resolve_platform_version(
        &self,
        abi: Abi,
        min_sdk: Option<u32>,
        codename: Option<&str>,
        sink: &mut dyn DiagnosticSink,
    ) -> u32 {
        let candidate = self.candidate_api(min_sdk, codename, sink);

        let resolved = match &self.metadata {
            Some(metadata) => clamp(candidate, metadata.min, metadata.max, sink),
            None => self.resolve_legacy(abi, candidate, sink),
        };
        debug!("Platform for {} resolved to android-{}", abi, resolved);
        resolved
    }

    /// An unrecognized codename yields `min_sdk` when one is given, the sentinel otherwise
    fn candidate_api(&self, min_sdk: Option<u32>, codename: Option<&str>, sink: &mut dyn DiagnosticSink) -> u32 {
        let Some(codename) = codename else {
            return min_sdk.unwrap_or(0);
        };

        let Some(codename_api) = self.codename_api(codename) else {
            sink.error(format!("API codeName '{}' is not recognized.", codename));
            return min_sdk.unwrap_or(UNKNOWN_CODENAME_API);
        };

        match min_sdk {
            None => codename_api,
            Some(min_sdk) if min_sdk == codename_api => {
                sink.warn(format!(
                    "Both codeName '{}' and minSdkVersion '{}' were specified. Only one should be specified.",
                    codename, min_sdk
                ));
                min_sdk
            }
            Some(min_sdk) => {
                sink.error(format!(
                    "Disagreement between codeName '{}' and minSdkVersion '{}'. Only one should be specified.",
                    codename, min_sdk
                ));
                min_sdk
            }
        }
    }

    fn resolve_legacy(&self, abi: Abi, candidate: u32, sink: &mut dyn DiagnosticSink) -> u32 {
        let platforms = self.ndk_root.join("platforms");
        let arch = format!("arch-{}", abi.architecture());

        if platforms
            .join(format!("android-{}", candidate))
            .join(&arch)
            .is_dir()
        {
            return candidate;
        }

        let mut versions = Vec::new();
        if let Ok(entries) = std::fs::read_dir(&platforms) {
            for entry in entries.flatten() {
                let name = entry.file_name().to_string_lossy().into_owned();
                let Some(suffix) = name.strip_prefix("android-") else {
                    continue;
                };
                if !entry.path().join(&arch).is_dir() {
                    continue;
                }
                match suffix.parse::<u32>() {
                    Ok(version) => versions.push(version),
                    Err(_) => sink.info(format!(
                        "Skipping platform folder '{}' with non-numeric API level.",
                        name
                    )),
                }
            }
        }

        match (versions.iter().min(), versions.iter().max()) {
            (Some(&min), Some(&max)) => clamp(candidate, min, max, sink),
            _ => {
                sink.error(format!(
                    "No platforms for ABI '{}' were found in '{}'.",
                    abi,
                    platforms.display()
                ));
                candidate
            }
        }
    }
}

/// Raise silently to `min`; lowering to `max` is an error
fn clamp(candidate: u32, min: u32, max: u32, sink: &mut dyn DiagnosticSink) -> u32 {
    if candidate > max {
        sink.error(format!(
            "Platform version '{}' is beyond '{}', the maximum API level supported by this NDK.",
            candidate, max
        ));
        max
    } else {
        candidate.max(min)
    }
}
