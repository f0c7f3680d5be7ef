// src/config/model.rs

use serde::Deserialize;

/// Top-level build configuration file: a list of named builds.
#[derive(Debug, Clone, Deserialize)]
pub struct BuildConfigFile {
    pub builds: Vec<Build>,
}

impl BuildConfigFile {
    pub fn find_build(&self, name: &str) -> Option<&Build> {
        self.builds.iter().find(|b| b.name == name)
    }
}

/// One build target: a four-stage pipeline description.
#[derive(Debug, Clone, Deserialize)]
pub struct Build {
    pub name: String,
    /// Execution-environment requirements, e.g. `["os=Linux", "cpu=x64"]`.
    #[serde(default)]
    pub drone_dimensions: Vec<String>,
    pub gn: GnStage,
    pub ninja: NinjaStage,
    #[serde(default)]
    pub generators: Vec<GeneratorTask>,
    #[serde(default)]
    pub tests: Vec<TestTask>,
}

/// Config-generation stage.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct GnStage {
    #[serde(default)]
    pub args: Vec<String>,
}

/// Build-execution stage.
#[derive(Debug, Clone, Deserialize)]
pub struct NinjaStage {
    /// Build output directory name under `out/`.
    pub config: String,
    #[serde(default)]
    pub targets: Vec<String>,
}

/// One ordered generator task (possibly several scripts).
#[derive(Debug, Clone, Deserialize)]
pub struct GeneratorTask {
    pub name: String,
    #[serde(default)]
    pub language: String,
    pub scripts: Vec<String>,
    #[serde(default)]
    pub parameters: Vec<String>,
}

/// One test invocation.
#[derive(Debug, Clone, Deserialize)]
pub struct TestTask {
    pub name: String,
    #[serde(default)]
    pub language: String,
    pub script: String,
    #[serde(default)]
    pub parameters: Vec<String>,
}

/// Merge stage-declared GN arguments with caller-supplied extras.
///
/// An extra `--flag=value` replaces a stage-declared `--flag=...` in place;
/// exact duplicates collapse; order is otherwise preserved.
pub fn merge_gn_args(base: &[String], extra: &[String]) -> Vec<String> {
    fn flag_name(arg: &str) -> Option<&str> {
        if arg.starts_with("--") {
            arg.split('=').next()
        } else {
            None
        }
    }

    let mut merged: Vec<String> = Vec::new();
    for arg in base.iter().chain(extra.iter()) {
        if let Some(name) = flag_name(arg) {
            if let Some(existing) = merged
                .iter_mut()
                .find(|a| flag_name(a) == Some(name))
            {
                *existing = arg.clone();
                continue;
            }
        } else if merged.iter().any(|a| a == arg) {
            continue;
        }
        merged.push(arg.clone());
    }
    merged
}
