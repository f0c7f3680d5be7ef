// src/config/loader.rs

use std::fs;
use std::path::Path;

use crate::config::model::BuildConfigFile;
use crate::config::validate::validate;
use crate::errors::Result;

/// Parse a build configuration from a JSON string.
pub fn load_from_str(contents: &str) -> Result<BuildConfigFile> {
    let config: BuildConfigFile = serde_json::from_str(contents)?;
    Ok(config)
}

/// Load a build configuration file from a given path.
///
/// This only performs JSON deserialization; it does **not** perform semantic
/// validation. Use [`load_and_validate`] for that.
pub fn load_from_path(path: impl AsRef<Path>) -> Result<BuildConfigFile> {
    let contents = fs::read_to_string(path.as_ref())?;
    load_from_str(&contents)
}

/// Load a build configuration from path and run semantic validation.
///
/// This is the recommended entry point for the rest of the application:
/// - reads JSON
/// - applies defaults (handled by `serde` + `Default` impls)
/// - checks build names, ninja output configs, and generator/test scripts
pub fn load_and_validate(path: impl AsRef<Path>) -> Result<BuildConfigFile> {
    let config = load_from_path(path)?;
    validate(&config)?;
    Ok(config)
}
