// src/events.rs

//! Typed lifecycle events emitted by step runners.
//!
//! Every stage of a pipeline run (gn, ninja, generator tasks, tests, RBE
//! startup/shutdown) reports its lifecycle through [`RunnerEvent`]s:
//!
//! - [`RunnerStart`] when a command is about to run
//! - [`RunnerProgress`] for `[n/m]`-style progress markers in build output
//! - [`RunnerResult`] when a process exits (or a dry-run substitutes one)
//! - [`RunnerError`] for precondition failures that never spawn a process
//!
//! Events are immutable records; consumers receive them through an
//! [`EventHandler`] callback, invoked synchronously in emission order. For a
//! given stage name, Start always precedes Progress/Result/Error.

use std::collections::BTreeMap;
use std::fmt;
use std::sync::Arc;

use chrono::{DateTime, Utc};

/// Callback invoked for every emitted event, in emission order.
///
/// The handler must not block indefinitely; it runs inline with the pipeline.
pub type EventHandler = Arc<dyn Fn(RunnerEvent) + Send + Sync>;

/// Extra environment variables active for a command (empty when none).
pub type CommandEnv = BTreeMap<String, String>;

/// Raw outcome of a subprocess.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProcessArtifacts {
    pub exit_code: i32,
    pub stdout: String,
    pub stderr: String,
}

impl ProcessArtifacts {
    pub fn ok(&self) -> bool {
        self.exit_code == 0
    }

    /// The canonical "successful, empty-output" outcome substituted in
    /// dry-run mode.
    pub fn dry_run() -> Self {
        Self {
            exit_code: 0,
            stdout: String::new(),
            stderr: String::new(),
        }
    }

    /// Outcome used when a process could not be spawned at all.
    pub fn spawn_failure(message: impl Into<String>) -> Self {
        Self {
            exit_code: -1,
            stdout: String::new(),
            stderr: message.into(),
        }
    }
}

/// Closed set of step lifecycle events.
#[derive(Debug, Clone)]
pub enum RunnerEvent {
    Start(RunnerStart),
    Progress(RunnerProgress),
    Result(RunnerResult),
    Error(RunnerError),
}

impl RunnerEvent {
    /// Stage name this event belongs to.
    pub fn name(&self) -> &str {
        match self {
            RunnerEvent::Start(e) => &e.name,
            RunnerEvent::Progress(e) => &e.name,
            RunnerEvent::Result(e) => &e.name,
            RunnerEvent::Error(e) => &e.name,
        }
    }
}

impl fmt::Display for RunnerEvent {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RunnerEvent::Start(e) => e.fmt(f),
            RunnerEvent::Progress(e) => e.fmt(f),
            RunnerEvent::Result(e) => e.fmt(f),
            RunnerEvent::Error(e) => e.fmt(f),
        }
    }
}

fn format_timestamp(ts: &DateTime<Utc>) -> String {
    ts.format("%Y-%m-%dT%H:%M:%S%.3f").to_string()
}

/// A stage is about to run a command.
#[derive(Debug, Clone)]
pub struct RunnerStart {
    pub name: String,
    pub command: Vec<String>,
    pub environment: CommandEnv,
    pub timestamp: DateTime<Utc>,
}

impl RunnerStart {
    pub fn new(
        name: impl Into<String>,
        command: Vec<String>,
        environment: CommandEnv,
    ) -> Self {
        Self {
            name: name.into(),
            command,
            environment,
            timestamp: Utc::now(),
        }
    }
}

impl fmt::Display for RunnerStart {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} {}: starting: {}",
            format_timestamp(&self.timestamp),
            self.name,
            self.command.join(" ")
        )
    }
}

/// A unit-of-work progress marker recognised in build output.
#[derive(Debug, Clone)]
pub struct RunnerProgress {
    pub name: String,
    /// Free-text description of the current unit of work.
    pub what: String,
    pub completed: u64,
    /// Always >= `completed` and > 0; enforced at construction.
    pub total: u64,
    pub timestamp: DateTime<Utc>,
}

impl RunnerProgress {
    /// Panics if `total` is zero or less than `completed`; [`percent`]
    /// relies on the marker being well-formed.
    ///
    /// [`percent`]: RunnerProgress::percent
    pub fn new(
        name: impl Into<String>,
        what: impl Into<String>,
        completed: u64,
        total: u64,
    ) -> Self {
        assert!(
            total >= 1 && completed <= total,
            "progress marker out of range: {completed}/{total}"
        );
        Self {
            name: name.into(),
            what: what.into(),
            completed,
            total,
            timestamp: Utc::now(),
        }
    }

    pub fn percent(&self) -> f64 {
        self.completed as f64 * 100.0 / self.total as f64
    }

    pub fn done(&self) -> bool {
        self.completed == self.total
    }
}

impl fmt::Display for RunnerProgress {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} {}: {:.1}% {}{}",
            format_timestamp(&self.timestamp),
            self.name,
            self.percent(),
            self.what,
            if self.done() { " (done)" } else { "" }
        )
    }
}

/// A stage's process exited (or a dry-run substituted an outcome).
#[derive(Debug, Clone)]
pub struct RunnerResult {
    pub name: String,
    pub command: Vec<String>,
    pub artifacts: ProcessArtifacts,
    /// Message rendered on success; defaults to "OK".
    pub ok_message: String,
    pub timestamp: DateTime<Utc>,
}

impl RunnerResult {
    pub fn new(
        name: impl Into<String>,
        command: Vec<String>,
        artifacts: ProcessArtifacts,
    ) -> Self {
        Self {
            name: name.into(),
            command,
            artifacts,
            ok_message: "OK".to_string(),
            timestamp: Utc::now(),
        }
    }

    pub fn with_ok_message(mut self, message: impl Into<String>) -> Self {
        self.ok_message = message.into();
        self
    }

    pub fn ok(&self) -> bool {
        self.artifacts.ok()
    }
}

impl fmt::Display for RunnerResult {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let ts = format_timestamp(&self.timestamp);
        if self.ok() {
            write!(f, "{} {}: {}", ts, self.name, self.ok_message)
        } else {
            // Primary diagnostic surface: full command line and captured
            // output, verbatim, no truncation.
            write!(
                f,
                "{} {}: FAILED\n{}\n{}\n{}",
                ts,
                self.name,
                self.command.join(" "),
                self.artifacts.stdout,
                self.artifacts.stderr
            )
        }
    }
}

/// A precondition failure that never spawned a process
/// (e.g. platform mismatch, missing required binary).
#[derive(Debug, Clone)]
pub struct RunnerError {
    pub name: String,
    /// Empty for synthetic events with no associated command.
    pub command: Vec<String>,
    pub error: String,
    pub timestamp: DateTime<Utc>,
}

impl RunnerError {
    pub fn new(name: impl Into<String>, error: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            command: Vec::new(),
            error: error.into(),
            timestamp: Utc::now(),
        }
    }
}

impl fmt::Display for RunnerError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} {}: ERROR: {}",
            format_timestamp(&self.timestamp),
            self.name,
            self.error
        )
    }
}
