//! Host probing
//!
//! Runs `cmake --version` for every candidate up front, then serves the
//! synchronous CMake locator from that snapshot.

use std::collections::{HashMap, HashSet};
use std::io;
use std::path::{Path, PathBuf};
use std::time::Duration;

use futures::future::join_all;
use regex::Regex;
use tokio::process::Command;
use tracing::{debug, info, warn};

use crate::cmake::{CmakeEnvironment, SdkPackage};
use crate::revision::Revision;
use crate::sdk_packages::SdkPackageScanner;

/// CMake executable name on this host
pub const CMAKE_EXECUTABLE: &str = if cfg!(windows) { "cmake.exe" } else { "cmake" };

/// Extract the version from `cmake --version` output
pub fn parse_cmake_version_output(output: &str) -> Option<Revision> {
    let pattern = Regex::new(r"cmake version (\S+)").ok()?;
    let captures = pattern.captures(output)?;
    Revision::parse(&captures[1]).ok()
}

/// Version of the CMake in `bin_folder`
///
/// `Ok(None)` when there is no executable there. Failing to run it, a
/// non-zero exit, unrecognized output or exceeding `timeout` are errors.
/// A process that exceeds `timeout` is killed.
pub async fn probe_cmake_version(bin_folder: &Path, timeout: Duration) -> io::Result<Option<Revision>> {
    let exe = bin_folder.join(CMAKE_EXECUTABLE);
    if !exe.is_file() {
        return Ok(None);
    }

    debug!("Probing {}", exe.display());
    let mut command = Command::new(&exe);
    command.arg("--version").kill_on_drop(true);
    let output = tokio::time::timeout(timeout, command.output())
        .await
        .map_err(|_| {
            io::Error::new(
                io::ErrorKind::TimedOut,
                format!("{} --version timed out after {:?}", exe.display(), timeout),
            )
        })??;

    if !output.status.success() {
        return Err(io::Error::new(
            io::ErrorKind::Other,
            format!("{} --version exited with {:?}", exe.display(), output.status.code()),
        ));
    }

    let stdout = String::from_utf8_lossy(&output.stdout);
    parse_cmake_version_output(&stdout).map(Some).ok_or_else(|| {
        io::Error::new(
            io::ErrorKind::InvalidData,
            format!("unrecognized output from {} --version", exe.display()),
        )
    })
}

/// Folders on `PATH` that contain a `cmake`, in `PATH` order
pub fn path_bin_folders() -> Vec<PathBuf> {
    let Ok(executables) = which::which_all(CMAKE_EXECUTABLE) else {
        return Vec::new();
    };

    let mut seen = HashSet::new();
    executables
        .filter_map(|exe| exe.parent().map(Path::to_path_buf))
        .filter(|folder| seen.insert(folder.clone()))
        .collect()
}

type ProbeOutcome = Result<Option<Revision>, String>;

/// [`CmakeEnvironment`] over probed host state
#[derive(Debug, Clone, Default)]
pub struct HostCmakeEnvironment {
    probes: HashMap<PathBuf, ProbeOutcome>,
    path_candidates: Vec<PathBuf>,
    scanner: Option<SdkPackageScanner>,
    downloads: Vec<String>,
}

impl HostCmakeEnvironment {
    /// Probe `cmake.dir` and every `PATH` candidate concurrently
    pub async fn probe(cmake_dir: Option<&Path>, sdk_root: Option<&Path>, timeout: Duration) -> Self {
        Self::probe_candidates(cmake_dir, path_bin_folders(), sdk_root, timeout).await
    }

    /// Like [`HostCmakeEnvironment::probe`] with explicit `PATH` candidates
    pub async fn probe_candidates(
        cmake_dir: Option<&Path>,
        path_candidates: Vec<PathBuf>,
        sdk_root: Option<&Path>,
        timeout: Duration,
    ) -> Self {
        let mut folders: Vec<PathBuf> = cmake_dir.map(|dir| dir.join("bin")).into_iter().collect();
        for candidate in &path_candidates {
            if !folders.contains(candidate) {
                folders.push(candidate.clone());
            }
        }

        let outcomes = join_all(folders.iter().map(|folder| probe_cmake_version(folder, timeout))).await;
        let probes = folders
            .into_iter()
            .zip(outcomes)
            .map(|(folder, outcome)| {
                if let Err(e) = &outcome {
                    debug!("CMake probe of {} failed: {}", folder.display(), e);
                }
                (folder, outcome.map_err(|e| e.to_string()))
            })
            .collect();

        Self {
            probes,
            path_candidates,
            scanner: sdk_root.map(SdkPackageScanner::new),
            downloads: Vec::new(),
        }
    }

    /// SDK packages requested during resolution
    pub fn downloads_requested(&self) -> &[String] {
        &self.downloads
    }
}

impl CmakeEnvironment for HostCmakeEnvironment {
    fn cmake_version(&self, bin_folder: &Path) -> io::Result<Option<Revision>> {
        match self.probes.get(bin_folder) {
            None => Ok(None),
            Some(Ok(version)) => Ok(version.clone()),
            Some(Err(message)) => Err(io::Error::new(io::ErrorKind::Other, message.clone())),
        }
    }

    fn path_candidates(&self) -> Vec<PathBuf> {
        self.path_candidates.clone()
    }

    fn sdk_packages(&self) -> Vec<SdkPackage> {
        self.scanner
            .as_ref()
            .map(SdkPackageScanner::cmake_packages)
            .unwrap_or_default()
    }

    fn request_sdk_download(&mut self, package: &str) {
        match &self.scanner {
            Some(scanner) => info!(
                "SDK package {} is not installed in {}",
                package,
                scanner.sdk_root().display()
            ),
            None => warn!("SDK package {} is needed but no SDK is configured", package),
        }
        self.downloads.push(package.to_string());
    }
}
