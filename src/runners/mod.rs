// src/runners/mod.rs

//! Step runners: one per pipeline stage.
//!
//! Each runner is a single-shot object constructed with everything it needs
//! and driven once through [`StepRunner::run`]. The shared pieces live here:
//!
//! - the [`StepRunner`] capability trait
//! - interpreter resolution for script-based stages
//! - [`run_process`], the dry-run-aware subprocess helper
//!
//! In dry-run mode no subprocess is spawned anywhere; a canonical
//! "successful, empty-output" result is substituted while all event
//! emission and branching runs exactly as on the real path.

pub mod generator;
pub mod gn;
pub mod ninja;
pub mod test;

use std::future::Future;
use std::path::Path;
use std::pin::Pin;
use std::process::Stdio;

use tokio::process::Command;
use tracing::{debug, info};

use crate::errors::Result;
use crate::events::{CommandEnv, EventHandler, ProcessArtifacts};

pub use generator::GeneratorRunner;
pub use gn::GnRunner;
pub use ninja::NinjaRunner;
pub use test::TestRunner;

/// Trait abstracting one pipeline stage.
///
/// `run` is called exactly once per runner instance; it emits the stage's
/// event sequence through `events` and returns whether the stage succeeded.
/// Expected failures (non-zero exits, precondition mismatches) travel as
/// `Ok(false)` plus events, never as `Err`.
pub trait StepRunner: Send {
    fn run<'a>(
        &'a self,
        events: &'a EventHandler,
    ) -> Pin<Box<dyn Future<Output = Result<bool>> + Send + 'a>>;
}

/// Map a stage's language token to a concrete interpreter binary.
///
/// - tokens beginning with `python` resolve to `python3`
/// - `dart` resolves to this engine's own executable, so scripts can invoke
///   the same toolchain that is orchestrating them
/// - the empty string means the script is directly executable
/// - anything else is used verbatim as the interpreter name
pub fn resolve_interpreter(language: &str, own_executable: &Path) -> Option<String> {
    if language.is_empty() {
        return None;
    }
    if language.starts_with("python") {
        return Some("python3".to_string());
    }
    if language == "dart" {
        return Some(own_executable.display().to_string());
    }
    Some(language.to_string())
}

/// How a subprocess's output should be handled.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StdioMode {
    /// Capture stdout/stderr into the returned artifacts.
    Capture,
    /// Stream directly to the invoking process's own stdio (nothing
    /// captured); used by the test runner for live visibility.
    Inherit,
}

/// Run a command to completion, or simulate it in dry-run mode.
///
/// Spawn failures are folded into a failed [`ProcessArtifacts`] (exit -1,
/// error text on stderr) rather than propagated; the caller reports them
/// through the ordinary Result event path.
pub async fn run_process(
    command: &[String],
    env: &CommandEnv,
    mode: StdioMode,
    dry_run: bool,
) -> ProcessArtifacts {
    if dry_run {
        debug!(command = %command.join(" "), "dry-run: skipping process spawn");
        return ProcessArtifacts::dry_run();
    }

    let (program, args) = match command.split_first() {
        Some(split) => split,
        None => return ProcessArtifacts::spawn_failure("empty command line"),
    };

    info!(command = %command.join(" "), "starting process");

    let mut cmd = Command::new(program);
    cmd.args(args).envs(env).kill_on_drop(true);

    match mode {
        StdioMode::Capture => match cmd.output().await {
            Ok(output) => ProcessArtifacts {
                exit_code: output.status.code().unwrap_or(-1),
                stdout: String::from_utf8_lossy(&output.stdout).into_owned(),
                stderr: String::from_utf8_lossy(&output.stderr).into_owned(),
            },
            Err(err) => {
                ProcessArtifacts::spawn_failure(format!("running '{program}': {err}"))
            }
        },
        StdioMode::Inherit => {
            let status = cmd
                .stdout(Stdio::inherit())
                .stderr(Stdio::inherit())
                .status()
                .await;
            match status {
                Ok(status) => ProcessArtifacts {
                    exit_code: status.code().unwrap_or(-1),
                    stdout: String::new(),
                    stderr: String::new(),
                },
                Err(err) => {
                    ProcessArtifacts::spawn_failure(format!("running '{program}': {err}"))
                }
            }
        }
    }
}
