//! Compiler settings cache key
//!
//! Reduces a CMake command line to the parts that decide compiler settings,
//! so builds that only differ in output folders or generator can share the
//! results of a previous configure step.

use std::collections::BTreeMap;
use std::hash::{Hash, Hasher};
use std::path::{Path, PathBuf};

use cxx_configure_core::diagnostics::{DiagnosticSink, DiagnosticSinkExt};
use cxx_configure_toolchain::source_properties::SourceProperties;
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};
use tracing::debug;

use crate::args::{get_property_value, remove_property, CommandLineArgument};

/// Stands in for the NDK folder inside key arguments
pub const NDK_DIR_PLACEHOLDER: &str = "${ndk.dir}";

/// Property naming the NDK folder
pub const ANDROID_NDK_PROPERTY: &str = "ANDROID_NDK";

/// Key file written by [`write_cache_key`]
pub const CACHE_KEY_FILE: &str = "compiler_settings_cache_key.json";

/// Hash file written next to the key file
pub const CACHE_KEY_HASH_FILE: &str = "compiler_settings_cache_key.sha256";

/// Properties that never affect compiler settings
pub const CACHE_KEY_PROPERTY_BLACKLIST: &[&str] = &[
    "CMAKE_LIBRARY_OUTPUT_DIRECTORY",
    "CMAKE_RUNTIME_OUTPUT_DIRECTORY",
    "CMAKE_ARCHIVE_OUTPUT_DIRECTORY",
    "CMAKE_EXPORT_COMPILE_COMMANDS",
    "CMAKE_MAKE_PROGRAM",
];

/// Cache key errors
#[derive(Debug, thiserror::Error)]
pub enum CacheKeyError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
    #[error("Cache key at {0} does not match its recorded hash")]
    HashMismatch(PathBuf),
}

/// Identity of a set of compiler settings
///
/// Equality, hashing and the serialized form cover the NDK's
/// `source.properties` and the arguments only. The NDK folder itself is
/// replaced by [`NDK_DIR_PLACEHOLDER`] in `args`, so moving the NDK keeps the key.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct CxxCacheKey {
    #[serde(skip)]
    pub ndk_installation_folder: Option<PathBuf>,
    #[serde(default)]
    pub ndk_source_properties: Option<BTreeMap<String, String>>,
    pub args: Vec<String>,
}

impl PartialEq for CxxCacheKey {
    fn eq(&self, other: &Self) -> bool {
        self.ndk_source_properties == other.ndk_source_properties && self.args == other.args
    }
}

impl Eq for CxxCacheKey {}

impl Hash for CxxCacheKey {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.ndk_source_properties.hash(state);
        self.args.hash(state);
    }
}

fn affects_compiler_settings(arg: &CommandLineArgument) -> bool {
    match arg {
        CommandLineArgument::GeneratorName { .. }
        | CommandLineArgument::BinaryOutputPath { .. }
        | CommandLineArgument::CmakeListsPath { .. } => false,
        CommandLineArgument::DefineProperty { property_name, .. } => {
            !CACHE_KEY_PROPERTY_BLACKLIST.contains(&property_name.as_str())
        }
        CommandLineArgument::Unknown { .. } => true,
    }
}

/// Build the cache key for a CMake command line
///
/// Only `<ndk>/source.properties` is read; a missing file is a warning. An
/// empty `ANDROID_NDK` counts as no NDK folder, so nothing is read at all.
pub fn build_cache_key(args: &[CommandLineArgument], sink: &mut dyn DiagnosticSink) -> CxxCacheKey {
    let mut kept: Vec<CommandLineArgument> = args
        .iter()
        .filter(|arg| affects_compiler_settings(arg))
        .cloned()
        .collect();

    let ndk_installation_folder = get_property_value(&kept, ANDROID_NDK_PROPERTY)
        .filter(|folder| !folder.is_empty())
        .map(PathBuf::from);
    remove_property(&mut kept, ANDROID_NDK_PROPERTY);

    let ndk_source_properties = ndk_installation_folder.as_deref().and_then(|folder| {
        match SourceProperties::load(folder) {
            Some(properties) => Some(properties.into_values()),
            None => {
                sink.warn(format!(
                    "Could not read source.properties of NDK at '{}'. \
                     The compiler settings cache key will not include the NDK revision.",
                    folder.display()
                ));
                None
            }
        }
    });

    let ndk_text = ndk_installation_folder
        .as_deref()
        .map(|folder| folder.to_string_lossy().into_owned())
        .unwrap_or_default();
    let args = kept
        .iter()
        .map(|arg| {
            if ndk_text.is_empty() {
                arg.source_argument().to_string()
            } else {
                arg.source_argument().replace(&ndk_text, NDK_DIR_PLACEHOLDER)
            }
        })
        .collect();

    CxxCacheKey {
        ndk_installation_folder,
        ndk_source_properties,
        args,
    }
}

fn to_json(key: &CxxCacheKey) -> Result<String, CacheKeyError> {
    Ok(serde_json::to_string_pretty(key)?)
}

fn sha256_hex(bytes: &[u8]) -> String {
    hex::encode(Sha256::digest(bytes))
}

/// Hex SHA-256 of the key's serialized form
pub fn cache_key_hash(key: &CxxCacheKey) -> Result<String, CacheKeyError> {
    Ok(sha256_hex(to_json(key)?.as_bytes()))
}

/// Write the key and its hash into `dir`, returning the key file path
pub fn write_cache_key(key: &CxxCacheKey, dir: &Path) -> Result<PathBuf, CacheKeyError> {
    std::fs::create_dir_all(dir)?;

    let json = to_json(key)?;
    let key_file = dir.join(CACHE_KEY_FILE);
    std::fs::write(&key_file, &json)?;
    std::fs::write(dir.join(CACHE_KEY_HASH_FILE), sha256_hex(json.as_bytes()))?;

    debug!("Wrote compiler settings cache key to {}", key_file.display());
    Ok(key_file)
}

/// Read a key written by [`write_cache_key`], checking the hash file if present
pub fn read_cache_key(dir: &Path) -> Result<CxxCacheKey, CacheKeyError> {
    let key_file = dir.join(CACHE_KEY_FILE);
    let json = std::fs::read_to_string(&key_file)?;

    let hash_file = dir.join(CACHE_KEY_HASH_FILE);
    if hash_file.is_file() {
        let recorded = std::fs::read_to_string(&hash_file)?;
        if recorded.trim() != sha256_hex(json.as_bytes()) {
            return Err(CacheKeyError::HashMismatch(key_file));
        }
    }

    Ok(serde_json::from_str(&json)?)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::args::parse_arguments;
    use cxx_configure_core::RecordingSink;

    fn ndk_with_properties() -> tempfile::TempDir {
        let ndk = tempfile::tempdir().unwrap();
        std::fs::write(
            ndk.path().join("source.properties"),
            "Pkg.Desc = Android NDK\nPkg.Revision = 21.4.7075529\n",
        )
        .unwrap();
        ndk
    }

    fn key_for(tokens: &[String]) -> (CxxCacheKey, RecordingSink) {
        let mut sink = RecordingSink::new();
        let key = build_cache_key(&parse_arguments(tokens), &mut sink);
        (key, sink)
    }

    #[test]
    fn test_key_drops_output_only_arguments() {
        let ndk = ndk_with_properties();
        let ndk_dir = ndk.path().display().to_string();
        let tokens = vec![
            "-H/src/app".to_string(),
            "-B/build/arm64".to_string(),
            "-GNinja".to_string(),
            format!("-DANDROID_NDK={}", ndk_dir),
            "-DCMAKE_LIBRARY_OUTPUT_DIRECTORY=/build/libs".to_string(),
            "-DCMAKE_MAKE_PROGRAM=/usr/bin/ninja".to_string(),
            "-DANDROID_ABI=arm64-v8a".to_string(),
            format!("-DCMAKE_TOOLCHAIN_FILE={}/build/cmake/android.toolchain.cmake", ndk_dir),
        ];

        let (key, sink) = key_for(&tokens);
        assert!(sink.diagnostics().is_empty());
        assert_eq!(key.ndk_installation_folder.as_deref(), Some(ndk.path()));
        assert_eq!(
            key.args,
            vec![
                "-DANDROID_ABI=arm64-v8a",
                "-DCMAKE_TOOLCHAIN_FILE=${ndk.dir}/build/cmake/android.toolchain.cmake",
            ]
        );
        let properties = key.ndk_source_properties.as_ref().unwrap();
        assert_eq!(properties.get("Pkg.Revision").map(String::as_str), Some("21.4.7075529"));
    }

    #[test]
    fn test_key_is_deterministic_and_ignores_outputs() {
        let ndk = ndk_with_properties();
        let define_ndk = format!("-DANDROID_NDK={}", ndk.path().display());
        let first = vec![
            "-H/src/a".to_string(),
            "-B/out/debug".to_string(),
            "-GNinja".to_string(),
            define_ndk.clone(),
            "-DANDROID_PLATFORM=android-21".to_string(),
        ];
        let second = vec![
            "-H/src/b".to_string(),
            "-B/out/release".to_string(),
            "-GUnix Makefiles".to_string(),
            define_ndk,
            "-DANDROID_PLATFORM=android-21".to_string(),
        ];

        assert_eq!(key_for(&first).0, key_for(&first).0);
        assert_eq!(key_for(&first).0, key_for(&second).0);
        assert_eq!(cache_key_hash(&key_for(&first).0).unwrap(), cache_key_hash(&key_for(&second).0).unwrap());
    }

    #[test]
    fn test_relocated_ndk_keeps_key() {
        let a = ndk_with_properties();
        let b = ndk_with_properties();
        let tokens_for = |ndk: &Path| {
            vec![
                format!("-DANDROID_NDK={}", ndk.display()),
                format!("-DCMAKE_TOOLCHAIN_FILE={}/build/cmake/android.toolchain.cmake", ndk.display()),
            ]
        };

        let (key_a, _) = key_for(&tokens_for(a.path()));
        let (key_b, _) = key_for(&tokens_for(b.path()));
        assert_ne!(key_a.ndk_installation_folder, key_b.ndk_installation_folder);
        assert_eq!(key_a, key_b);
    }

    #[test]
    fn test_substitution_replaces_every_occurrence_only() {
        let tokens = vec![
            "-DANDROID_NDK=/opt/ndk/21.0".to_string(),
            "-DFLAGS=-I/opt/ndk/21.0/include -I/opt/ndk/21.0/sysroot -I/opt/other".to_string(),
        ];
        let (key, sink) = key_for(&tokens);

        assert_eq!(
            key.args,
            vec!["-DFLAGS=-I${ndk.dir}/include -I${ndk.dir}/sysroot -I/opt/other"]
        );
        assert!(key.ndk_source_properties.is_none());
        assert_eq!(sink.warnings().len(), 1);
    }

    #[test]
    fn test_empty_ndk_folder_reads_nothing() {
        let tokens = vec!["-DANDROID_NDK=".to_string(), "-DA=1".to_string()];
        let (key, sink) = key_for(&tokens);
        assert_eq!(key.args, vec!["-DA=1"]);
        assert!(key.ndk_installation_folder.is_none());
        assert!(key.ndk_source_properties.is_none());
        assert!(sink.diagnostics().is_empty());
    }

    #[test]
    fn test_without_ndk_property() {
        let (key, sink) = key_for(&["-DANDROID_ABI=x86".to_string(), "--trace".to_string()]);
        assert!(key.ndk_installation_folder.is_none());
        assert!(key.ndk_source_properties.is_none());
        assert_eq!(key.args, vec!["-DANDROID_ABI=x86", "--trace"]);
        assert!(sink.diagnostics().is_empty());
    }

    #[test]
    fn test_write_and_read_key() {
        let ndk = ndk_with_properties();
        let (key, _) = key_for(&[
            format!("-DANDROID_NDK={}", ndk.path().display()),
            "-DANDROID_ABI=x86_64".to_string(),
        ]);
        let out = tempfile::tempdir().unwrap();
        let dir = out.path().join("cxx").join("debug");

        let key_file = write_cache_key(&key, &dir).unwrap();
        assert_eq!(key_file, dir.join(CACHE_KEY_FILE));

        let json = std::fs::read_to_string(&key_file).unwrap();
        assert!(!json.contains("ndk_installation_folder"));
        assert_eq!(
            std::fs::read_to_string(dir.join(CACHE_KEY_HASH_FILE)).unwrap(),
            cache_key_hash(&key).unwrap()
        );

        let loaded = read_cache_key(&dir).unwrap();
        assert_eq!(loaded, key);
        assert!(loaded.ndk_installation_folder.is_none());
    }

    #[test]
    fn test_tampered_key_is_rejected() {
        let out = tempfile::tempdir().unwrap();
        let key = CxxCacheKey {
            args: vec!["-DA=1".to_string()],
            ..Default::default()
        };
        write_cache_key(&key, out.path()).unwrap();
        std::fs::write(out.path().join(CACHE_KEY_FILE), r#"{ "args": ["-DA=2"] }"#).unwrap();

        assert!(matches!(read_cache_key(out.path()), Err(CacheKeyError::HashMismatch(_))));
    }
}
