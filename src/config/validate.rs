// src/config/validate.rs

//! Semantic validation of a deserialized build configuration.

use std::collections::HashSet;

use crate::config::model::BuildConfigFile;
use crate::errors::{BuildRunnerError, Result};

/// Check a configuration for problems serde cannot catch.
///
/// - build names must be unique and non-empty
/// - every ninja stage needs a non-empty output config
/// - generator tasks need at least one script
/// - tests need a non-empty script
pub fn validate(config: &BuildConfigFile) -> Result<()> {
    let mut seen = HashSet::new();

    for build in &config.builds {
        if build.name.is_empty() {
            return Err(BuildRunnerError::ConfigError(
                "build with empty name".to_string(),
            ));
        }
        if !seen.insert(build.name.as_str()) {
            return Err(BuildRunnerError::ConfigError(format!(
                "duplicate build name: {}",
                build.name
            )));
        }
        if build.ninja.config.is_empty() {
            return Err(BuildRunnerError::ConfigError(format!(
                "build '{}' has an empty ninja config",
                build.name
            )));
        }
        for task in &build.generators {
            if task.scripts.is_empty() {
                return Err(BuildRunnerError::ConfigError(format!(
                    "generator task '{}' in build '{}' has no scripts",
                    task.name, build.name
                )));
            }
        }
        for test in &build.tests {
            if test.script.is_empty() {
                return Err(BuildRunnerError::ConfigError(format!(
                    "test '{}' in build '{}' has an empty script",
                    test.name, build.name
                )));
            }
        }
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::loader::load_from_str;

    #[test]
    fn duplicate_build_names_are_rejected() {
        let cfg = load_from_str(
            r#"{"builds": [
                {"name": "a", "gn": {}, "ninja": {"config": "a"}},
                {"name": "a", "gn": {}, "ninja": {"config": "a"}}
            ]}"#,
        )
        .unwrap();
        assert!(matches!(
            validate(&cfg),
            Err(BuildRunnerError::ConfigError(_))
        ));
    }

    #[test]
    fn empty_ninja_config_is_rejected() {
        let cfg = load_from_str(
            r#"{"builds": [{"name": "a", "gn": {}, "ninja": {"config": ""}}]}"#,
        )
        .unwrap();
        assert!(validate(&cfg).is_err());
    }

    #[test]
    fn generator_without_scripts_is_rejected() {
        let cfg = load_from_str(
            r#"{"builds": [{
                "name": "a", "gn": {}, "ninja": {"config": "a"},
                "generators": [{"name": "empty", "scripts": []}]
            }]}"#,
        )
        .unwrap();
        assert!(validate(&cfg).is_err());
    }

    #[test]
    fn valid_config_passes() {
        let cfg = load_from_str(
            r#"{"builds": [{"name": "a", "gn": {}, "ninja": {"config": "a"}}]}"#,
        )
        .unwrap();
        assert!(validate(&cfg).is_ok());
    }
}
