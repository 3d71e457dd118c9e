//! CMake command lines and compiler settings cache keys

pub mod args;
pub mod cache_key;

pub use args::{get_property_value, parse_arguments, remove_property, to_string_arguments, CommandLineArgument};
pub use cache_key::{
    build_cache_key, cache_key_hash, read_cache_key, write_cache_key, CacheKeyError, CxxCacheKey,
    CACHE_KEY_FILE, CACHE_KEY_HASH_FILE, NDK_DIR_PLACEHOLDER,
};
