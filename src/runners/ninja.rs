// src/runners/ninja.rs

//! Build-execution (ninja) step runner.
//!
//! This is the long-running stage: ninja output is consumed incrementally,
//! line by line. Progress markers become Progress events and are dropped
//! from the captured output; everything else gets its diagnostic paths
//! rewritten and is buffered for the terminal Result event. Stdout and
//! stderr are drained concurrently so interleaved production cannot
//! deadlock on a full pipe buffer.
//!
//! When remote execution is requested the ninja invocation is wrapped in an
//! RBE session: startup must succeed before ninja spawns, and shutdown is
//! always attempted afterwards, whatever the build did.

use std::collections::BTreeMap;
use std::future::Future;
use std::io::IsTerminal;
use std::path::PathBuf;
use std::pin::Pin;
use std::process::Stdio;
use std::sync::Arc;

use tokio::io::{AsyncBufReadExt, BufReader};
use tokio::process::Command;
use tracing::{debug, info, warn};

use crate::errors::Result;
use crate::config::model::NinjaStage;
use crate::events::{
    CommandEnv, EventHandler, ProcessArtifacts, RunnerError, RunnerEvent, RunnerProgress,
    RunnerResult, RunnerStart,
};
use crate::host::Host;
use crate::parse::{parse_progress, rewrite_diagnostic_path};
use crate::rbe::{RbeConfig, RbeSession};
use crate::runners::StepRunner;

/// Event name for the build-execution stage.
pub const NINJA_STAGE: &str = "ninja";

pub struct NinjaRunner {
    checkout: PathBuf,
    host: Host,
    stage: NinjaStage,
    drone_dimensions: Vec<String>,
    rbe: Option<RbeConfig>,
    /// Caller-requested parallelism; `None` lets ninja choose unless remote
    /// execution raises it.
    concurrency: Option<usize>,
    dry_run: bool,
}

impl NinjaRunner {
    pub fn new(
        checkout: PathBuf,
        host: Host,
        stage: NinjaStage,
        drone_dimensions: Vec<String>,
        rbe: Option<RbeConfig>,
        concurrency: Option<usize>,
        dry_run: bool,
    ) -> Self {
        Self {
            checkout,
            host,
            stage,
            drone_dimensions,
            rbe,
            concurrency,
            dry_run,
        }
    }

    fn out_dir(&self) -> PathBuf {
        self.checkout.join("out").join(&self.stage.config)
    }

    /// Parallelism passed to ninja: the explicit level when given, the
    /// host heuristic when remote execution is active, otherwise nothing.
    fn effective_concurrency(&self) -> Option<usize> {
        let remote_active = self
            .rbe
            .as_ref()
            .is_some_and(|config| !config.remote_disabled);
        self.concurrency.or_else(|| {
            remote_active.then(|| self.host.default_build_concurrency())
        })
    }

    fn command(&self) -> Vec<String> {
        let mut command = vec![
            self.checkout.join("tools").join("ninja").display().to_string(),
            "-C".to_string(),
            self.out_dir().display().to_string(),
        ];
        if let Some(concurrency) = self.effective_concurrency() {
            command.push("-j".to_string());
            command.push(concurrency.to_string());
        }
        command.extend(self.stage.targets.iter().cloned());
        command
    }

    async fn run_impl(&self, events: &EventHandler) -> Result<bool> {
        if !self.host.can_run(&self.drone_dimensions) {
            events(RunnerEvent::Error(RunnerError::new(
                NINJA_STAGE,
                format!(
                    "host platform does not match drone dimensions {:?}",
                    self.drone_dimensions
                ),
            )));
            return Ok(false);
        }

        let mut env = color_environment();

        match &self.rbe {
            Some(config) => {
                let session = RbeSession::new(
                    self.checkout.clone(),
                    self.host,
                    config,
                    self.dry_run,
                );
                // The build actions read the same RBE variables as the proxy.
                env.extend(session.environment().clone());

                if !session.bootstrap(false, events).await? {
                    return Ok(false);
                }

                // Shutdown is always attempted, including when the build
                // itself returns an error; its failure never overrides the
                // build outcome.
                let build_result = self.run_ninja(env, events).await;
                if let Err(err) = session.bootstrap(true, events).await {
                    warn!(error = %err, "rbe shutdown errored");
                }
                build_result
            }
            None => self.run_ninja(env, events).await,
        }
    }

    async fn run_ninja(&self, env: CommandEnv, events: &EventHandler) -> Result<bool> {
        let command = self.command();
        events(RunnerEvent::Start(RunnerStart::new(
            NINJA_STAGE,
            command.clone(),
            env.clone(),
        )));

        let artifacts = if self.dry_run {
            debug!("dry-run: skipping ninja spawn");
            ProcessArtifacts::dry_run()
        } else {
            let cwd = std::env::current_dir()?;
            self.spawn_and_stream(&command, &env, cwd, events).await
        };
        let ok = artifacts.ok();

        events(RunnerEvent::Result(RunnerResult::new(
            NINJA_STAGE,
            command,
            artifacts,
        )));
        Ok(ok)
    }

    /// Spawn ninja with incremental line-oriented stdout consumption.
    ///
    /// Returns only after both streams are fully drained and the process
    /// has exited.
    async fn spawn_and_stream(
        &self,
        command: &[String],
        env: &CommandEnv,
        cwd: PathBuf,
        events: &EventHandler,
    ) -> ProcessArtifacts {
        let mut cmd = Command::new(&command[0]);
        cmd.args(&command[1..])
            .envs(env)
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .kill_on_drop(true);

        let mut child = match cmd.spawn() {
            Ok(child) => child,
            Err(err) => {
                return ProcessArtifacts::spawn_failure(format!(
                    "spawning '{}': {err}",
                    command[0]
                ));
            }
        };

        let stdout_task = child.stdout.take().map(|stdout| {
            let events = Arc::clone(events);
            let out_dir = self.out_dir();
            tokio::spawn(async move {
                let mut captured = String::new();
                let mut lines = BufReader::new(stdout).lines();
                while let Ok(Some(line)) = lines.next_line().await {
                    if let Some(progress) = parse_progress(&line) {
                        events(RunnerEvent::Progress(RunnerProgress::new(
                            NINJA_STAGE,
                            progress.what,
                            progress.completed,
                            progress.total,
                        )));
                        continue;
                    }
                    let rewritten = rewrite_diagnostic_path(&line, &out_dir, &cwd);
                    debug!("ninja stdout: {}", rewritten);
                    captured.push_str(&rewritten);
                    captured.push('\n');
                }
                captured
            })
        });

        // Stderr is buffered raw; draining it concurrently keeps the child
        // from blocking on a full pipe while we read stdout.
        let stderr_task = child.stderr.take().map(|stderr| {
            tokio::spawn(async move {
                let mut captured = String::new();
                let mut lines = BufReader::new(stderr).lines();
                while let Ok(Some(line)) = lines.next_line().await {
                    captured.push_str(&line);
                    captured.push('\n');
                }
                captured
            })
        });

        let exit_code = match child.wait().await {
            Ok(status) => status.code().unwrap_or(-1),
            Err(err) => {
                warn!(error = %err, "waiting for ninja failed");
                -1
            }
        };

        let stdout = match stdout_task {
            Some(task) => task.await.unwrap_or_default(),
            None => String::new(),
        };
        let stderr = match stderr_task {
            Some(task) => task.await.unwrap_or_default(),
            None => String::new(),
        };

        info!(exit_code, "ninja exited");
        ProcessArtifacts {
            exit_code,
            stdout,
            stderr,
        }
    }
}

impl StepRunner for NinjaRunner {
    fn run<'a>(
        &'a self,
        events: &'a EventHandler,
    ) -> Pin<Box<dyn Future<Output = Result<bool>> + Send + 'a>> {
        Box::pin(self.run_impl(events))
    }
}

/// Environment that forces ANSI color in build tool output.
///
/// Forcing is on when stdout supports ANSI and `CLICOLOR_FORCE` isn't
/// explicitly disabling it, or when `CLICOLOR_FORCE=1` explicitly enables
/// it.
fn color_environment() -> CommandEnv {
    let forced = std::env::var("CLICOLOR_FORCE").ok();
    let enabled = match forced.as_deref() {
        Some("1") => true,
        Some("0") => false,
        _ => std::io::stdout().is_terminal(),
    };

    let mut env = BTreeMap::new();
    if enabled {
        env.insert("CLICOLOR_FORCE".to_string(), "1".to_string());
    }
    env
}
