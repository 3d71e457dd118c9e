//! CMake Locator
//!
//! Finds a CMake installation for the requested version. The search runs in
//! fixed stages over a [`CmakeSearch`] value: normalize the request, reject
//! versions that are too old, translate the forked CMake's self-reported
//! version, then look in `cmake.dir`, the SDK and `PATH`. Each stage only acts
//! while no result has been found.

use std::fmt;
use std::io;
use std::path::{Path, PathBuf};

use cxx_configure_core::diagnostics::{DiagnosticSink, DiagnosticSinkExt};
use tracing::{debug, info};

use crate::revision::Revision;

/// SDK package version of the forked CMake shipped by the SDK
pub const FORK_CMAKE_SDK_VERSION: &str = "3.6.4111459";

/// Version the forked CMake reports from `cmake --version`
pub const FORK_CMAKE_REPORTED_VERSION: &str = "3.6.0-rc2";

/// Oldest CMake that can be requested
pub const MINIMUM_CMAKE_VERSION: &str = "3.6.0";

/// Micro components at or above this are SDK package numbers, not CMake releases
pub const SDK_CMAKE_MICRO_THRESHOLD: u32 = 1_000_000;

/// SDK package path prefix for CMake
pub const CMAKE_SDK_PACKAGE_PREFIX: &str = "cmake";

fn fork_sdk_version() -> Revision {
    Revision::new(3, 6, 4111459)
}

fn fork_reported_version() -> Revision {
    Revision::new(3, 6, 0).with_preview("rc2")
}

fn minimum_version() -> Revision {
    Revision::new(3, 6, 0)
}

/// An installed SDK CMake package
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SdkPackage {
    pub version: Revision,
    pub path: PathBuf,
}

impl SdkPackage {
    pub fn new(version: Revision, path: impl Into<PathBuf>) -> Self {
        Self {
            version,
            path: path.into(),
        }
    }
}

/// Host facilities the locator consults
pub trait CmakeEnvironment {
    /// Version of the `cmake` executable in `bin_folder`
    ///
    /// `Ok(None)` means there is no CMake there; `Err` means it could not be run.
    fn cmake_version(&self, bin_folder: &Path) -> io::Result<Option<Revision>>;

    /// `bin` folders from `PATH` that may contain `cmake`, in search order
    fn path_candidates(&self) -> Vec<PathBuf>;

    /// Installed SDK CMake packages
    fn sdk_packages(&self) -> Vec<SdkPackage>;

    /// Ask the host to install an SDK package such as `cmake;3.6.4111459`
    fn request_sdk_download(&mut self, package: &str);
}

/// Inputs to one CMake resolution
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CmakeRequest {
    /// Declared CMake version, if any
    pub declared_version: Option<String>,
    /// `cmake.dir` override: an install folder containing `bin/cmake`
    pub cmake_dir: Option<PathBuf>,
}

/// Where a CMake was found
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum CmakeOrigin {
    CmakeDir,
    Sdk,
    Path,
}

impl fmt::Display for CmakeOrigin {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CmakeOrigin::CmakeDir => f.write_str("cmake.dir"),
            CmakeOrigin::Sdk => f.write_str("SDK"),
            CmakeOrigin::Path => f.write_str("PATH"),
        }
    }
}

/// A located CMake install folder (never its `bin` folder)
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CmakeLocation {
    pub path: PathBuf,
    pub version: Revision,
    pub origin: CmakeOrigin,
}

/// CMake could not be located
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("{message}")]
pub struct CmakeLocateError {
    /// Headline followed by one `- ...` line per unsuitable candidate
    pub message: String,
    /// The host should download the requested SDK package itself
    pub request_external_download: bool,
    /// Closest candidate found, if any
    pub best_effort: Option<CmakeLocation>,
}

/// State threaded through the search stages
#[derive(Debug, Clone)]
pub struct CmakeSearch {
    pub requested: Revision,
    /// `requested` came from a valid declared version
    pub explicitly_requested: bool,
    /// Any version was declared, even one that was rejected
    pub version_declared: bool,
    pub result: Option<CmakeLocation>,
    pub first_error: Option<String>,
    pub unsuitable: Vec<String>,
    pub request_external_download: bool,
    pub best_effort: Option<CmakeLocation>,
}

impl CmakeSearch {
    fn new() -> Self {
        Self {
            requested: fork_sdk_version(),
            explicitly_requested: false,
            version_declared: false,
            result: None,
            first_error: None,
            unsuitable: Vec::new(),
            request_external_download: false,
            best_effort: None,
        }
    }

    fn error(&mut self, sink: &mut dyn DiagnosticSink, message: String) {
        sink.error(message.clone());
        if self.first_error.is_none() {
            self.first_error = Some(message);
        }
    }

    fn accept(&mut self, path: PathBuf, version: Revision, origin: CmakeOrigin) {
        self.result = Some(CmakeLocation {
            path,
            version,
            origin,
        });
    }
}

/// Locate CMake for `request`
pub fn locate_cmake(
    request: &CmakeRequest,
    environment: &mut dyn CmakeEnvironment,
    sink: &mut dyn DiagnosticSink,
) -> Result<CmakeLocation, CmakeLocateError> {
    search_cmake(request, environment, sink).into_result()
}

/// Run every search stage and return the final state without deciding
pub fn search_cmake(
    request: &CmakeRequest,
    environment: &mut dyn CmakeEnvironment,
    sink: &mut dyn DiagnosticSink,
) -> CmakeSearch {
    let declared = request.declared_version.as_deref();
    let mut search = CmakeSearch::new();
    search.version_declared = declared.is_some();
    let search = normalize_requested_version(search, declared, sink);
    let search = reject_too_low(search, declared, sink);
    let search = translate_fork_version(search);
    let search = find_in_cmake_dir(search, request.cmake_dir.as_deref(), environment, sink);
    let search = find_in_sdk(search, environment, sink);
    find_in_path(search, environment, sink)
}

fn normalize_requested_version(
    mut search: CmakeSearch,
    declared: Option<&str>,
    sink: &mut dyn DiagnosticSink,
) -> CmakeSearch {
    match declared {
        None => {
            sink.info(format!(
                "No CMake version was specified, defaulting to '{}'.",
                FORK_CMAKE_SDK_VERSION
            ));
        }
        Some(declared) => match Revision::parse(declared) {
            Ok(revision) => {
                search.requested = revision;
                search.explicitly_requested = true;
            }
            Err(e) => {
                debug!("Unparseable CMake version {}: {}", declared, e);
                search.error(
                    sink,
                    format!("CMake version '{}' is not formatted correctly.", declared),
                );
            }
        },
    }
    search
}

fn reject_too_low(mut search: CmakeSearch, declared: Option<&str>, sink: &mut dyn DiagnosticSink) -> CmakeSearch {
    if !search.explicitly_requested || search.requested.strip_preview() >= minimum_version() {
        return search;
    }

    let shown = declared.map(str::to_string).unwrap_or_else(|| search.requested.to_string());
    search.error(
        sink,
        format!(
            "CMake version '{}' is too low. Use {} or higher.",
            shown, MINIMUM_CMAKE_VERSION
        ),
    );
    search.requested = fork_sdk_version();
    search.explicitly_requested = false;
    search
}

fn translate_fork_version(mut search: CmakeSearch) -> CmakeSearch {
    if search.requested.is_identical(&fork_reported_version()) {
        debug!(
            "Translating CMake version {} to SDK version {}",
            FORK_CMAKE_REPORTED_VERSION, FORK_CMAKE_SDK_VERSION
        );
        search.requested = fork_sdk_version();
    }
    search
}

fn find_in_cmake_dir(
    mut search: CmakeSearch,
    cmake_dir: Option<&Path>,
    environment: &dyn CmakeEnvironment,
    sink: &mut dyn DiagnosticSink,
) -> CmakeSearch {
    let Some(cmake_dir) = cmake_dir else {
        return search;
    };
    if search.result.is_some() {
        return search;
    }

    let version = match environment.cmake_version(&cmake_dir.join("bin")) {
        Ok(Some(version)) => version,
        Ok(None) | Err(_) => {
            search.error(
                sink,
                format!("Could not get version from cmake.dir path '{}'.", cmake_dir.display()),
            );
            return search;
        }
    };

    if !search.explicitly_requested {
        sink.info(format!(
            "Using CMake '{}' found via cmake.dir='{}'.",
            version,
            cmake_dir.display()
        ));
        search.accept(cmake_dir.to_path_buf(), version, CmakeOrigin::CmakeDir);
        return search;
    }

    match version.mismatch_reason(&search.requested) {
        None => search.accept(cmake_dir.to_path_buf(), version, CmakeOrigin::CmakeDir),
        Some(reason) => {
            let message = format!(
                "CMake '{}' found via cmake.dir='{}' does not match requested version '{}'.",
                version,
                cmake_dir.display(),
                search.requested
            );
            search.error(sink, message);
            search.unsuitable.push(format!(
                "- CMake '{}' found from cmake.dir did not satisfy requested version '{}' because {}.",
                version, search.requested, reason
            ));
        }
    }
    search
}

fn has_matching_package(packages: &[SdkPackage], requested: &Revision) -> bool {
    packages.iter().any(|package| package.version.satisfies(requested))
}

fn find_in_sdk(
    mut search: CmakeSearch,
    environment: &mut dyn CmakeEnvironment,
    sink: &mut dyn DiagnosticSink,
) -> CmakeSearch {
    if search.result.is_some() {
        return search;
    }

    let mut packages = environment.sdk_packages();
    if search.requested == fork_sdk_version() && !has_matching_package(&packages, &search.requested) {
        let package = format!("{};{}", CMAKE_SDK_PACKAGE_PREFIX, search.requested);
        info!("Requesting SDK package {}", package);
        environment.request_sdk_download(&package);
        packages = environment.sdk_packages();

        if !has_matching_package(&packages, &search.requested) {
            search.request_external_download = true;
            let message = format!(
                "CMake '{}' is required but has not yet been downloaded from the SDK.",
                search.requested
            );
            search.error(sink, message);
        }
    }

    for package in packages {
        match package.version.mismatch_reason(&search.requested) {
            None if search.result.is_none() => {
                search.accept(package.path, package.version, CmakeOrigin::Sdk);
            }
            None => {}
            Some(reason) if search.version_declared => {
                search.unsuitable.push(format!(
                    "- CMake '{}' found in SDK did not satisfy requested version '{}' because {}.",
                    package.version, search.requested, reason
                ));
            }
            Some(_) => {
                search.unsuitable.push(format!(
                    "- CMake found in SDK at '{}' had version '{}'.",
                    package.path.display(),
                    package.version
                ));
            }
        }
    }
    search
}

/// Install folder of a `bin` folder
fn install_folder(bin_folder: &Path) -> PathBuf {
    bin_folder
        .parent()
        .map(Path::to_path_buf)
        .unwrap_or_else(|| bin_folder.to_path_buf())
}

fn find_in_path(
    mut search: CmakeSearch,
    environment: &dyn CmakeEnvironment,
    sink: &mut dyn DiagnosticSink,
) -> CmakeSearch {
    if search.result.is_some() {
        return search;
    }

    let mut best: Option<CmakeLocation> = None;
    for bin_folder in environment.path_candidates() {
        let version = match environment.cmake_version(&bin_folder) {
            Ok(Some(version)) => version,
            Ok(None) => continue,
            Err(e) => {
                debug!("Probing {} failed: {}", bin_folder.display(), e);
                sink.warn(format!(
                    "Could not execute cmake at '{}' to get version. Skipping.",
                    bin_folder.display()
                ));
                continue;
            }
        };
        let install = install_folder(&bin_folder);

        match version.mismatch_reason(&search.requested) {
            None => {
                search.accept(install, version, CmakeOrigin::Path);
                break;
            }
            Some(reason) if search.version_declared => {
                search.unsuitable.push(format!(
                    "- CMake '{}' found in PATH at '{}' did not satisfy requested version '{}' because {}.",
                    version,
                    install.display(),
                    search.requested,
                    reason
                ));
            }
            Some(_) => {
                search.unsuitable.push(format!(
                    "- CMake found in PATH at '{}' had version '{}'.",
                    install.display(),
                    version
                ));
                let better = best.as_ref().map_or(true, |current| version > current.version);
                if better {
                    best = Some(CmakeLocation {
                        path: install,
                        version,
                        origin: CmakeOrigin::Path,
                    });
                }
            }
        }
    }

    if search.result.is_none() {
        if let Some(best) = best {
            sink.info(format!(
                "Using CMake '{}' found in PATH at '{}' as the closest available version.",
                best.version,
                best.path.display()
            ));
            search.best_effort = Some(best);
        }
    }
    search
}

fn not_found_message(requested: &Revision) -> String {
    if requested.micro() >= SDK_CMAKE_MICRO_THRESHOLD {
        format!(
            "CMake '{}' was not found in SDK, PATH, or by cmake.dir property.",
            requested
        )
    } else {
        format!(
            "CMake '{}' was not found in PATH or by cmake.dir property.",
            requested
        )
    }
}

impl CmakeSearch {
    /// Final decision: a result with no pending download, or a failure
    /// headed by the first error
    pub fn into_result(self) -> Result<CmakeLocation, CmakeLocateError> {
        decide(self)
    }
}

fn decide(search: CmakeSearch) -> Result<CmakeLocation, CmakeLocateError> {
    if let Some(result) = &search.result {
        if !search.request_external_download {
            info!(
                "Using CMake {} from {} at {}",
                result.version,
                result.origin,
                result.path.display()
            );
            return Ok(result.clone());
        }
    }

    let CmakeSearch {
        requested,
        result,
        first_error,
        unsuitable,
        request_external_download,
        best_effort,
        ..
    } = search;

    let mut lines = vec![first_error.unwrap_or_else(|| not_found_message(&requested))];
    lines.extend(unsuitable);

    Err(CmakeLocateError {
        message: lines.join("\n"),
        request_external_download,
        best_effort: result.or(best_effort),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use cxx_configure_core::RecordingSink;
    use std::collections::HashMap;

    #[derive(Default)]
    struct FakeEnvironment {
        versions: HashMap<PathBuf, Result<Revision, String>>,
        path: Vec<PathBuf>,
        packages: Vec<SdkPackage>,
        on_download: Vec<SdkPackage>,
        downloads: Vec<String>,
    }

    impl FakeEnvironment {
        fn with_cmake(mut self, bin_folder: &str, version: &str) -> Self {
            self.versions
                .insert(PathBuf::from(bin_folder), Ok(Revision::parse(version).unwrap()));
            self
        }

        fn with_broken_cmake(mut self, bin_folder: &str) -> Self {
            self.versions
                .insert(PathBuf::from(bin_folder), Err("Problem executing cmake".to_string()));
            self
        }

        fn with_path(mut self, folders: &[&str]) -> Self {
            self.path = folders.iter().map(PathBuf::from).collect();
            self
        }

        fn with_package(mut self, version: &str) -> Self {
            self.packages.push(package(version, version));
            self
        }

        fn with_package_at(mut self, folder: &str, version: &str) -> Self {
            self.packages.push(package(folder, version));
            self
        }
    }

    fn package(folder: &str, version: &str) -> SdkPackage {
        SdkPackage::new(Revision::parse(version).unwrap(), format!("/sdk/cmake/{}", folder))
    }

    impl CmakeEnvironment for FakeEnvironment {
        fn cmake_version(&self, bin_folder: &Path) -> io::Result<Option<Revision>> {
            match self.versions.get(bin_folder) {
                None => Ok(None),
                Some(Ok(version)) => Ok(Some(version.clone())),
                Some(Err(message)) => Err(io::Error::new(io::ErrorKind::Other, message.clone())),
            }
        }

        fn path_candidates(&self) -> Vec<PathBuf> {
            self.path.clone()
        }

        fn sdk_packages(&self) -> Vec<SdkPackage> {
            self.packages.clone()
        }

        fn request_sdk_download(&mut self, package: &str) {
            self.downloads.push(package.to_string());
            self.packages.append(&mut self.on_download);
        }
    }

    fn locate(
        declared: Option<&str>,
        cmake_dir: Option<&str>,
        environment: &mut FakeEnvironment,
    ) -> (Result<CmakeLocation, CmakeLocateError>, RecordingSink) {
        let mut sink = RecordingSink::new();
        let request = CmakeRequest {
            declared_version: declared.map(str::to_string),
            cmake_dir: cmake_dir.map(PathBuf::from),
        };
        let result = locate_cmake(&request, environment, &mut sink);
        (result, sink)
    }

    fn path_of(result: &Result<CmakeLocation, CmakeLocateError>) -> PathBuf {
        result.as_ref().unwrap().path.clone()
    }

    #[test]
    fn test_partial_version_matches_preview_on_path() {
        let mut env = FakeEnvironment::default()
            .with_path(&["/a/b/c/cmake/3.12.0-rc1/bin", "/d/e/f"])
            .with_cmake("/a/b/c/cmake/3.12.0-rc1/bin", "3.12.0-rc1");
        let (result, sink) = locate(Some("3.12"), None, &mut env);

        assert_eq!(path_of(&result), PathBuf::from("/a/b/c/cmake/3.12.0-rc1"));
        assert!(sink.warnings().is_empty());
        assert!(sink.errors().is_empty());
        assert!(env.downloads.is_empty());
    }

    #[test]
    fn test_first_match_on_path_wins() {
        let mut env = FakeEnvironment::default()
            .with_path(&["/a/b/c/cmake/3.12.0-rc1/bin", "/a/b/c/cmake/3.12.0/bin"])
            .with_cmake("/a/b/c/cmake/3.12.0-rc1/bin", "3.12.0-rc1")
            .with_cmake("/a/b/c/cmake/3.12.0/bin", "3.12.0");
        let (result, _) = locate(Some("3.12"), None, &mut env);
        assert_eq!(path_of(&result), PathBuf::from("/a/b/c/cmake/3.12.0-rc1"));

        let (result, _) = locate(Some("3.12.0-rc1"), None, &mut env);
        assert_eq!(path_of(&result), PathBuf::from("/a/b/c/cmake/3.12.0-rc1"));
    }

    #[test]
    fn test_sdk_exact_version() {
        let mut env = FakeEnvironment::default()
            .with_package_at("sdkA", "3.6.4111459")
            .with_package_at("sdkB", "3.7.0");
        let mut sink = RecordingSink::new();
        let request = CmakeRequest {
            declared_version: Some("3.7.0".to_string()),
            cmake_dir: None,
        };

        let search = search_cmake(&request, &mut env, &mut sink);
        assert_eq!(
            search.unsuitable,
            vec![
                "- CMake '3.6.4111459' found in SDK did not satisfy requested version '3.7.0' \
                 because MINOR value 6 wasn't exactly 7."
            ]
        );

        let location = search.into_result().unwrap();
        assert_eq!(location.path, PathBuf::from("/sdk/cmake/sdkB"));
        assert_eq!(location.origin, CmakeOrigin::Sdk);
        assert!(sink.errors().is_empty());
        assert!(sink.warnings().is_empty());
    }

    #[test]
    fn test_default_version_from_sdk() {
        let mut env = FakeEnvironment::default()
            .with_package_at("3.10.4111459", "3.10.2")
            .with_package("3.6.4111459");
        let (result, sink) = locate(None, None, &mut env);

        assert_eq!(path_of(&result), PathBuf::from("/sdk/cmake/3.6.4111459"));
        assert!(sink.errors().is_empty());
        assert!(sink.warnings().is_empty());
        assert!(env.downloads.is_empty());
    }

    #[test]
    fn test_requested_version_not_found() {
        let mut env = FakeEnvironment::default().with_package("3.6.4111459");
        let (result, _) = locate(Some("3.10.2"), None, &mut env);

        let error = result.unwrap_err();
        assert_eq!(
            error.to_string(),
            "CMake '3.10.2' was not found in PATH or by cmake.dir property.\n\
             - CMake '3.6.4111459' found in SDK did not satisfy requested version '3.10.2' \
             because MINOR value 6 wasn't exactly 10."
        );
        assert!(!error.request_external_download);
        assert!(error.best_effort.is_none());
    }

    #[test]
    fn test_sdk_style_version_not_found() {
        let mut env = FakeEnvironment::default().with_package("3.6.4111459");
        let (result, _) = locate(Some("3.6.1234567"), None, &mut env);

        assert_eq!(
            result.unwrap_err().message,
            "CMake '3.6.1234567' was not found in SDK, PATH, or by cmake.dir property.\n\
             - CMake '3.6.4111459' found in SDK did not satisfy requested version '3.6.1234567' \
             because MICRO value 4111459 wasn't exactly 1234567."
        );
    }

    #[test]
    fn test_default_version_missing_requests_download() {
        let mut env = FakeEnvironment::default()
            .with_path(&["/a/b/c/cmake/3.8.0/bin", "/d/e/f"])
            .with_cmake("/a/b/c/cmake/3.8.0/bin", "3.8.0");
        let (result, sink) = locate(None, None, &mut env);

        let error = result.unwrap_err();
        assert!(error.request_external_download);
        assert_eq!(env.downloads, vec!["cmake;3.6.4111459"]);
        assert_eq!(
            error.message,
            "CMake '3.6.4111459' is required but has not yet been downloaded from the SDK.\n\
             - CMake found in PATH at '/a/b/c/cmake/3.8.0' had version '3.8.0'."
        );
        assert_eq!(sink.errors().len(), 1);
    }

    #[test]
    fn test_successful_sdk_download() {
        let mut env = FakeEnvironment {
            on_download: vec![package("3.6.4111459", "3.6.4111459")],
            ..Default::default()
        };
        let (result, sink) = locate(None, None, &mut env);

        assert_eq!(path_of(&result), PathBuf::from("/sdk/cmake/3.6.4111459"));
        assert_eq!(env.downloads.len(), 1);
        assert!(sink.errors().is_empty());
    }

    #[test]
    fn test_default_requires_exact_fork_version() {
        let mut env = FakeEnvironment::default().with_package("3.10.4111459");
        let (result, _) = locate(None, None, &mut env);

        assert_eq!(
            result.unwrap_err().message,
            "CMake '3.6.4111459' is required but has not yet been downloaded from the SDK.\n\
             - CMake found in SDK at '/sdk/cmake/3.10.4111459' had version '3.10.4111459'."
        );
    }

    #[test]
    fn test_explicit_fork_version_missing() {
        let mut env = FakeEnvironment::default().with_package_at("3.10.4111459", "3.10.2");
        let (result, _) = locate(Some("3.6.4111459"), None, &mut env);

        let error = result.unwrap_err();
        assert!(error.request_external_download);
        assert_eq!(
            error.message,
            "CMake '3.6.4111459' is required but has not yet been downloaded from the SDK.\n\
             - CMake '3.10.2' found in SDK did not satisfy requested version '3.6.4111459' \
             because MINOR value 10 wasn't exactly 6."
        );
    }

    #[test]
    fn test_unparseable_version_falls_back_to_fork() {
        let mut env = FakeEnvironment::default().with_package("3.6.4111459");
        let (result, sink) = locate(Some("3.bob"), None, &mut env);

        assert_eq!(path_of(&result), PathBuf::from("/sdk/cmake/3.6.4111459"));
        assert_eq!(sink.errors(), vec!["CMake version '3.bob' is not formatted correctly."]);
    }

    #[test]
    fn test_unparseable_version_is_still_a_request_on_path() {
        let mut env = FakeEnvironment::default()
            .with_path(&["/a/bin", "/b/bin"])
            .with_cmake("/a/bin", "3.10.2")
            .with_cmake("/b/bin", "3.18.1");
        let (result, sink) = locate(Some("3.bob"), None, &mut env);

        let error = result.unwrap_err();
        assert!(error.best_effort.is_none());
        assert!(!sink.infos().iter().any(|info| info.starts_with("Using CMake")));
        assert_eq!(
            error.message,
            "CMake version '3.bob' is not formatted correctly.\n\
             - CMake '3.10.2' found in PATH at '/a' did not satisfy requested version '3.6.4111459' \
             because MINOR value 10 wasn't exactly 6.\n\
             - CMake '3.18.1' found in PATH at '/b' did not satisfy requested version '3.6.4111459' \
             because MINOR value 18 wasn't exactly 6."
        );
    }

    #[test]
    fn test_too_low_version_is_still_a_request_on_path() {
        let mut env = FakeEnvironment::default()
            .with_path(&["/a/bin"])
            .with_cmake("/a/bin", "3.2.0");
        let (result, _) = locate(Some("3.2"), None, &mut env);

        let error = result.unwrap_err();
        assert!(error.best_effort.is_none());
        assert!(error
            .message
            .contains("- CMake '3.2.0' found in PATH at '/a' did not satisfy requested version '3.6.4111459'"));
    }

    #[test]
    fn test_version_too_low() {
        for declared in ["3.2", "2.2"] {
            let mut env = FakeEnvironment::default()
                .with_package_at("3.10.4111459", "3.10.2")
                .with_package("3.6.4111459");
            let (result, sink) = locate(Some(declared), None, &mut env);

            assert_eq!(path_of(&result), PathBuf::from("/sdk/cmake/3.6.4111459"));
            assert!(sink.warnings().is_empty());
            assert_eq!(
                sink.errors(),
                vec![format!("CMake version '{}' is too low. Use 3.6.0 or higher.", declared)]
            );
        }
    }

    #[test]
    fn test_fork_reported_version_is_translated() {
        let mut env = FakeEnvironment::default()
            .with_package_at("3.10.4111459", "3.10.2")
            .with_package("3.6.4111459");
        let (result, sink) = locate(Some("3.6.0-rc2"), None, &mut env);

        assert_eq!(path_of(&result), PathBuf::from("/sdk/cmake/3.6.4111459"));
        assert!(sink.errors().is_empty());
    }

    #[test]
    fn test_partial_version_from_sdk() {
        let mut env = FakeEnvironment::default()
            .with_package("3.6.4111459")
            .with_package_at("3.10.4111459", "3.10.2");
        let (result, _) = locate(Some("3.10"), None, &mut env);
        assert_eq!(path_of(&result), PathBuf::from("/sdk/cmake/3.10.4111459"));
    }

    #[test]
    fn test_path_preferred_when_sdk_does_not_match() {
        let mut env = FakeEnvironment::default()
            .with_package("3.6.4111459")
            .with_path(&["/a/b/c/cmake/bin", "/d/e/f"])
            .with_cmake("/a/b/c/cmake/bin", "3.12");
        let (result, sink) = locate(Some("3.12"), None, &mut env);

        let location = result.unwrap();
        assert_eq!(location.path, PathBuf::from("/a/b/c/cmake"));
        assert_eq!(location.origin, CmakeOrigin::Path);
        assert!(sink.errors().is_empty());
    }

    #[test]
    fn test_broken_path_candidate_is_skipped() {
        let mut env = FakeEnvironment::default()
            .with_path(&["/a/b/c/cmake/bin", "/d/e/f/cmake/bin"])
            .with_broken_cmake("/a/b/c/cmake/bin")
            .with_cmake("/d/e/f/cmake/bin", "3.12.0");
        let (result, sink) = locate(Some("3.12"), None, &mut env);

        assert_eq!(path_of(&result), PathBuf::from("/d/e/f/cmake"));
        assert_eq!(
            sink.warnings(),
            vec!["Could not execute cmake at '/a/b/c/cmake/bin' to get version. Skipping."]
        );
        assert!(sink.errors().is_empty());
    }

    #[test]
    fn test_best_effort_picks_highest_on_path() {
        let mut env = FakeEnvironment::default()
            .with_path(&["/p1/bin", "/p2/bin", "/p3/bin"])
            .with_cmake("/p1/bin", "1.0")
            .with_cmake("/p2/bin", "2.0")
            .with_cmake("/p3/bin", "2.0");
        let (result, sink) = locate(None, None, &mut env);

        assert!(sink
            .infos()
            .contains(&"Using CMake '2.0' found in PATH at '/p2' as the closest available version.".to_string()));
        let error = result.unwrap_err();
        let best = error.best_effort.unwrap();
        assert_eq!(best.path, PathBuf::from("/p2"));
        assert_eq!(best.version, Revision::parse("2.0").unwrap());
        assert_eq!(
            error.message,
            "CMake '3.6.4111459' is required but has not yet been downloaded from the SDK.\n\
             - CMake found in PATH at '/p1' had version '1.0'.\n\
             - CMake found in PATH at '/p2' had version '2.0'.\n\
             - CMake found in PATH at '/p3' had version '2.0'."
        );
    }

    #[test]
    fn test_explicit_mismatch_on_path_keeps_scanning() {
        let mut env = FakeEnvironment::default()
            .with_path(&["/a/bin", "/b/bin"])
            .with_cmake("/a/bin", "3.10.2")
            .with_cmake("/b/bin", "3.18.1");
        let (result, _) = locate(Some("3.18.1"), None, &mut env);
        assert_eq!(path_of(&result), PathBuf::from("/b"));

        let (result, _) = locate(Some("3.20.0"), None, &mut env);
        let error = result.unwrap_err();
        assert!(error.best_effort.is_none());
        assert_eq!(
            error.message,
            "CMake '3.20.0' was not found in PATH or by cmake.dir property.\n\
             - CMake '3.10.2' found in PATH at '/a' did not satisfy requested version '3.20.0' \
             because MINOR value 10 wasn't exactly 20.\n\
             - CMake '3.18.1' found in PATH at '/b' did not satisfy requested version '3.20.0' \
             because MINOR value 18 wasn't exactly 20."
        );
    }

    #[test]
    fn test_cmake_dir_matching_version() {
        let mut env = FakeEnvironment::default()
            .with_package("3.6.4111459")
            .with_path(&["/d/e/f"])
            .with_cmake("/a/b/c/cmake/bin", "3.12");
        let (result, sink) = locate(Some("3.12"), Some("/a/b/c/cmake"), &mut env);

        let location = result.unwrap();
        assert_eq!(location.path, PathBuf::from("/a/b/c/cmake"));
        assert_eq!(location.origin, CmakeOrigin::CmakeDir);
        assert!(sink.errors().is_empty());
    }

    #[test]
    fn test_cmake_dir_without_declared_version() {
        let mut env = FakeEnvironment::default()
            .with_package("3.6.4111459")
            .with_cmake("/a/b/c/cmake/bin", "3.12");
        let (result, sink) = locate(None, Some("/a/b/c/cmake"), &mut env);

        assert_eq!(path_of(&result), PathBuf::from("/a/b/c/cmake"));
        assert!(sink.errors().is_empty());
        assert!(env.downloads.is_empty());
    }

    #[test]
    fn test_cmake_dir_wrong_version() {
        let mut env = FakeEnvironment::default()
            .with_package_at("3.10.4111459", "3.10.2")
            .with_package("3.6.4111459")
            .with_path(&["/d/e/f"])
            .with_cmake("/a/b/c/cmake/bin", "3.12");
        let (result, _) = locate(Some("3.13"), Some("/a/b/c/cmake"), &mut env);

        assert_eq!(
            result.unwrap_err().message,
            "CMake '3.12' found via cmake.dir='/a/b/c/cmake' does not match requested version '3.13'.\n\
             - CMake '3.12' found from cmake.dir did not satisfy requested version '3.13' \
             because MINOR value 12 wasn't exactly 13.\n\
             - CMake '3.10.2' found in SDK did not satisfy requested version '3.13' \
             because MINOR value 10 wasn't exactly 13.\n\
             - CMake '3.6.4111459' found in SDK did not satisfy requested version '3.13' \
             because MINOR value 6 wasn't exactly 13."
        );
    }

    #[test]
    fn test_cmake_dir_without_cmake_falls_back() {
        let mut env = FakeEnvironment::default()
            .with_package_at("3.10.4111459", "3.10.2")
            .with_package("3.6.4111459")
            .with_cmake("/a/b/c/cmake/bin", "3.12");
        let (result, sink) = locate(None, Some("/a/b/c/cmake/bin-mistake"), &mut env);

        assert_eq!(path_of(&result), PathBuf::from("/sdk/cmake/3.6.4111459"));
        assert_eq!(
            sink.errors(),
            vec!["Could not get version from cmake.dir path '/a/b/c/cmake/bin-mistake'."]
        );
    }
}
