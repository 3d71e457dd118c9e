//! NDK Locator
//!
//! Resolves a single NDK installation folder from the declared NDK version,
//! an explicit `ndk.dir` override and the SDK's `ndk/<version>` and
//! `ndk-bundle` folders.
//!
//! Results are memoized per [`NdkLocatorKey`] in a caller-owned
//! [`NdkLocatorCache`]. The cache lives for one build invocation; a new
//! build must start from an empty cache so installs made in between are seen.

use std::collections::HashMap;
use std::path::{Path, PathBuf};

use cxx_configure_core::diagnostics::{Diagnostic, DiagnosticSink, DiagnosticSinkExt, TeeSink};
use parking_lot::RwLock;
use tracing::debug;

use crate::revision::{Precision, Revision};
use crate::source_properties::{PackageRevision, SourceProperties};

/// NDK version used when none (or an unusable one) is declared
pub const DEFAULT_NDK_VERSION: &str = "21.4.7075529";

/// SDK sub-folder holding side-by-side NDKs
pub const NDK_SIDE_BY_SIDE_DIR: &str = "ndk";

/// Legacy single-NDK SDK sub-folder
pub const NDK_BUNDLE_DIR: &str = "ndk-bundle";

/// Filesystem view the locator needs
pub trait NdkInstallations {
    /// Names of the version folders directly under `ndk_dir`
    fn side_by_side_folders(&self, ndk_dir: &Path) -> Vec<String>;

    /// Metadata of the NDK at `folder`, `None` when absent or unreadable
    fn source_properties(&self, folder: &Path) -> Option<SourceProperties>;
}

/// [`NdkInstallations`] backed by the real filesystem
#[derive(Debug, Clone, Copy, Default)]
pub struct FileSystemNdkInstallations;

impl NdkInstallations for FileSystemNdkInstallations {
    fn side_by_side_folders(&self, ndk_dir: &Path) -> Vec<String> {
        let Ok(entries) = std::fs::read_dir(ndk_dir) else {
            return Vec::new();
        };

        let mut names: Vec<String> = entries
            .flatten()
            .filter(|entry| entry.path().is_dir())
            .filter_map(|entry| entry.file_name().to_str().map(str::to_string))
            .collect();
        names.sort();
        names
    }

    fn source_properties(&self, folder: &Path) -> Option<SourceProperties> {
        SourceProperties::load(folder)
    }
}

/// Inputs to one NDK resolution, already extracted from build configuration
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct NdkRequest {
    /// Declared NDK version, if any
    pub declared_version: Option<String>,
    /// `ndk.dir` override
    pub override_path: Option<PathBuf>,
    /// Android SDK root
    pub sdk_root: Option<PathBuf>,
}

/// Memoization key for NDK resolution
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct NdkLocatorKey {
    pub declared_version: Option<String>,
    pub override_path: Option<PathBuf>,
    pub sdk_root: Option<PathBuf>,
    pub side_by_side_folders: Vec<String>,
}

/// A resolved NDK
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NdkLocation {
    pub path: PathBuf,
    pub revision: Revision,
}

#[derive(Debug, Clone)]
struct CachedResolution {
    location: Option<NdkLocation>,
    diagnostics: Vec<Diagnostic>,
}

/// Per-build memo of NDK resolutions
#[derive(Debug, Default)]
pub struct NdkLocatorCache {
    entries: RwLock<HashMap<NdkLocatorKey, CachedResolution>>,
}

impl NdkLocatorCache {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.entries.read().len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.read().is_empty()
    }
}

/// Locate the NDK, consulting and filling `cache`
///
/// On a cache hit the diagnostics recorded by the original resolution are
/// replayed into `sink`.
pub fn locate_ndk(
    request: &NdkRequest,
    installations: &dyn NdkInstallations,
    cache: &NdkLocatorCache,
    sink: &mut dyn DiagnosticSink,
) -> Option<NdkLocation> {
    let side_by_side = side_by_side_folders(request, installations);
    let key = NdkLocatorKey {
        declared_version: request.declared_version.clone(),
        override_path: request.override_path.clone(),
        sdk_root: request.sdk_root.clone(),
        side_by_side_folders: side_by_side.clone(),
    };

    let hit = cache.entries.read().get(&key).cloned();
    if let Some(hit) = hit {
        debug!("NDK locator cache hit for {:?}", key);
        for diagnostic in hit.diagnostics {
            sink.report(diagnostic);
        }
        return hit.location;
    }

    let mut tee = TeeSink::new(sink);
    let location = resolve(request, &side_by_side, installations, &mut tee);
    let diagnostics = tee.recorded.take();

    cache.entries.write().insert(
        key,
        CachedResolution {
            location: location.clone(),
            diagnostics,
        },
    );
    location
}

/// Locate the NDK without memoization
pub fn locate_ndk_uncached(
    request: &NdkRequest,
    installations: &dyn NdkInstallations,
    sink: &mut dyn DiagnosticSink,
) -> Option<NdkLocation> {
    let side_by_side = side_by_side_folders(request, installations);
    resolve(request, &side_by_side, installations, sink)
}

fn side_by_side_folders(request: &NdkRequest, installations: &dyn NdkInstallations) -> Vec<String> {
    request
        .sdk_root
        .as_ref()
        .map(|root| installations.side_by_side_folders(&root.join(NDK_SIDE_BY_SIDE_DIR)))
        .unwrap_or_default()
}

/// Effective target version and whether the user actually asked for it
struct TargetVersion {
    revision: Revision,
    requested: bool,
}

fn target_version(declared: Option<&str>, sink: &mut dyn DiagnosticSink) -> TargetVersion {
    let default = TargetVersion {
        revision: Revision::parse(DEFAULT_NDK_VERSION).unwrap_or_else(|_| Revision::new(21, 4, 7075529)),
        requested: false,
    };

    let Some(declared) = declared else {
        return default;
    };

    match Revision::parse(declared) {
        Err(_) => {
            sink.error(format!("Requested NDK version '{}' could not be parsed", declared));
            default
        }
        Ok(revision) if revision.precision() < Precision::Micro => {
            sink.error(format!(
                "Specified NDK version '{}' does not have enough precision. \
                 Use major.minor.micro in version.",
                declared
            ));
            default
        }
        Ok(revision) => TargetVersion {
            revision,
            requested: true,
        },
    }
}

/// Version recorded in `folder`'s metadata; every failure is info-level
fn read_revision(
    installations: &dyn NdkInstallations,
    folder: &Path,
    origin: &str,
    sink: &mut dyn DiagnosticSink,
) -> Option<Revision> {
    let Some(properties) = installations.source_properties(folder) else {
        sink.info(format!(
            "Considered {} {} but that location didn't exist",
            folder.display(),
            origin
        ));
        return None;
    };

    match properties.package_revision() {
        PackageRevision::Valid(revision) => Some(revision),
        PackageRevision::Missing => {
            sink.info(format!(
                "Considered {} {} but that location had source.properties with no Pkg.Revision",
                folder.display(),
                origin
            ));
            None
        }
        PackageRevision::Invalid(text) => {
            sink.info(format!(
                "Considered {} {} but that location had source.properties with invalid Pkg.Revision={}",
                folder.display(),
                origin,
                text
            ));
            None
        }
    }
}

fn resolve(
    request: &NdkRequest,
    side_by_side: &[String],
    installations: &dyn NdkInstallations,
    sink: &mut dyn DiagnosticSink,
) -> Option<NdkLocation> {
    let target = target_version(request.declared_version.as_deref(), sink);

    if let Some(override_path) = &request.override_path {
        return locate_by_override(override_path, &target, installations, sink);
    }

    if let Some(sdk_root) = &request.sdk_root {
        let versioned = sdk_root
            .join(NDK_SIDE_BY_SIDE_DIR)
            .join(target.revision.to_string());
        if let Some(revision) =
            read_revision(installations, &versioned, "in SDK side by side folder", sink)
        {
            sink.info(format!(
                "Found requested NDK version {} at {}",
                target.revision,
                versioned.display()
            ));
            return Some(NdkLocation {
                path: versioned,
                revision,
            });
        }

        let bundle = sdk_root.join(NDK_BUNDLE_DIR);
        if let Some(revision) =
            read_revision(installations, &bundle, "in SDK ndk-bundle folder", sink)
        {
            if revision == target.revision {
                sink.info(format!(
                    "Found requested NDK version {} at {}",
                    target.revision,
                    bundle.display()
                ));
                return Some(NdkLocation {
                    path: bundle,
                    revision,
                });
            }
            sink.info(format!(
                "Considered {} in SDK ndk-bundle folder but that NDK had version {} \
                 which didn't match the requested version {}",
                bundle.display(),
                revision,
                target.revision
            ));
        }
    }

    let mut available = side_by_side.to_vec();
    available.sort();
    if available.is_empty() {
        sink.warn(format!(
            "NDK version {} is not installed and no side by side NDK versions are available locally. \
             Install it with the SDK manager.",
            target.revision
        ));
    } else {
        sink.warn(format!(
            "NDK version {} is not installed. Locally available side by side versions: [{}]. \
             Install it with the SDK manager.",
            target.revision,
            available.join(", ")
        ));
    }
    None
}

/// `ndk.dir` is authoritative: it either satisfies the request or nothing does
fn locate_by_override(
    override_path: &Path,
    target: &TargetVersion,
    installations: &dyn NdkInstallations,
    sink: &mut dyn DiagnosticSink,
) -> Option<NdkLocation> {
    let Some(revision) = read_revision(installations, override_path, "by ndk.dir", sink) else {
        sink.error(format!(
            "Location specified by ndk.dir ({}) did not contain a valid NDK and so couldn't be used",
            override_path.display()
        ));
        return None;
    };

    if !target.requested {
        sink.info(format!(
            "No user requested version, choosing {} which is version {}",
            override_path.display(),
            revision
        ));
    } else if revision == target.revision {
        sink.info(format!(
            "Choosing {} from ndk.dir which had the requested version {}",
            override_path.display(),
            target.revision
        ));
    } else {
        sink.error(format!(
            "NDK from ndk.dir at {} had version [{}] which disagrees with the requested NDK version [{}]",
            override_path.display(),
            revision,
            target.revision
        ));
        return None;
    }

    Some(NdkLocation {
        path: override_path.to_path_buf(),
        revision,
    })
}
