// src/runners/gn.rs

//! Config-generation (GN) step runner.

use std::collections::BTreeMap;
use std::fs;
use std::future::Future;
use std::path::{Path, PathBuf};
use std::pin::Pin;
use std::sync::LazyLock;

use regex::{Captures, Regex};
use tracing::{debug, info};

use crate::config::model::{merge_gn_args, GnStage};
use crate::errors::Result;
use crate::events::{EventHandler, RunnerEvent, RunnerResult, RunnerStart};
use crate::runners::{run_process, StdioMode, StepRunner};

/// Event name for the config-generation stage.
pub const GN_STAGE: &str = "gn";

/// Matches `"command": "..."` entries in a compile_commands.json file.
static COMMAND_ENTRY_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r#""command":\s*"([^"]*)""#).unwrap());

/// Runs the configuration generator once with the merged argument list.
pub struct GnRunner {
    checkout: PathBuf,
    /// Stage args merged with caller extras, computed once at construction.
    merged_args: Vec<String>,
    dry_run: bool,
}

impl GnRunner {
    pub fn new(
        checkout: PathBuf,
        stage: &GnStage,
        extra_args: &[String],
        dry_run: bool,
    ) -> Self {
        Self {
            checkout,
            merged_args: merge_gn_args(&stage.args, extra_args),
            dry_run,
        }
    }

    fn command(&self) -> Vec<String> {
        let mut command = vec![self
            .checkout
            .join("tools")
            .join("gn")
            .display()
            .to_string()];
        command.extend(self.merged_args.iter().cloned());
        command
    }

    async fn run_impl(&self, events: &EventHandler) -> Result<bool> {
        let command = self.command();
        events(RunnerEvent::Start(RunnerStart::new(
            GN_STAGE,
            command.clone(),
            BTreeMap::new(),
        )));

        let artifacts =
            run_process(&command, &BTreeMap::new(), StdioMode::Capture, self.dry_run).await;
        let ok = artifacts.ok();

        events(RunnerEvent::Result(RunnerResult::new(
            GN_STAGE, command, artifacts,
        )));
        Ok(ok)
    }
}

impl StepRunner for GnRunner {
    fn run<'a>(
        &'a self,
        events: &'a EventHandler,
    ) -> Pin<Box<dyn Future<Output = Result<bool>> + Send + 'a>> {
        Box::pin(self.run_impl(events))
    }
}

/// Post-step hook: clean up the generated compile-commands artifact.
///
/// Some toolchain configurations capture wrapper invocations (ccache,
/// rewrapper) in front of the compiler driver, which confuses tooling that
/// consumes compile_commands.json. This strips everything before the driver
/// in each `"command"` entry. Absence of the artifact is not an error, and
/// entries that don't match are left alone; the file is written back only
/// when at least one entry changed.
pub fn fix_compile_commands(out_dir: &Path, dry_run: bool) -> Result<()> {
    let path = out_dir.join("compile_commands.json");
    if dry_run || !path.is_file() {
        debug!(path = %path.display(), "skipping compile_commands fixup");
        return Ok(());
    }

    let contents = fs::read_to_string(&path)?;
    let mut changed = false;

    let rewritten = COMMAND_ENTRY_RE.replace_all(&contents, |caps: &Captures| {
        match strip_compiler_wrapper(&caps[1]) {
            Some(stripped) => {
                changed = true;
                format!(r#""command": "{stripped}""#)
            }
            None => caps[0].to_string(),
        }
    });

    if changed {
        info!(path = %path.display(), "rewrote compile_commands.json");
        fs::write(&path, rewritten.as_bytes())?;
    }
    Ok(())
}

/// Drop any leading wrapper text before the compiler driver.
///
/// Returns `None` when there is nothing to strip (no driver found, or the
/// driver is already the first token).
fn strip_compiler_wrapper(command_line: &str) -> Option<String> {
    let tokens: Vec<&str> = command_line.split(' ').collect();
    let driver_idx = tokens.iter().position(|token| {
        token
            .rsplit('/')
            .next()
            .is_some_and(|base| base.contains("clang"))
    })?;
    if driver_idx == 0 {
        return None;
    }
    Some(tokens[driver_idx..].join(" "))
}
