// src/pipeline.rs

//! Pipeline orchestrator.
//!
//! Sequences the four stages for a single build target, short-circuiting on
//! the first failure:
//!
//! `NotStarted -> ConfigGen -> BuildExec -> Generators -> Tests -> Done`
//!
//! Any failing stage moves the pipeline directly to `Failed` and no later
//! stage runs. Each stage is individually skippable; skipped stages are
//! trivially successful and emit no events. The whole-build platform check
//! happens before any stage: a mismatch emits a single Error event named
//! after the build and halts.

use std::path::PathBuf;

use tracing::{info, warn};

use crate::config::model::Build;
use crate::errors::Result;
use crate::events::{EventHandler, RunnerError, RunnerEvent};
use crate::host::Host;
use crate::rbe::RbeConfig;
use crate::runners::{
    gn::fix_compile_commands, GeneratorRunner, GnRunner, NinjaRunner, StepRunner, TestRunner,
};

/// Caller knobs for one pipeline run.
#[derive(Debug, Clone)]
pub struct PipelineOptions {
    /// Exercise all orchestration logic without spawning subprocesses.
    pub dry_run: bool,
    pub run_gn: bool,
    pub run_ninja: bool,
    pub run_generators: bool,
    pub run_tests: bool,
    /// Remote execution; `None` builds purely locally with no session.
    pub rbe: Option<RbeConfig>,
    /// Explicit build parallelism; `None` defers to ninja or, under remote
    /// execution, to the host heuristic.
    pub concurrency: Option<usize>,
    pub extra_gn_args: Vec<String>,
    pub extra_test_args: Vec<String>,
}

impl Default for PipelineOptions {
    fn default() -> Self {
        Self {
            dry_run: false,
            run_gn: true,
            run_ninja: true,
            run_generators: true,
            run_tests: true,
            rbe: None,
            concurrency: None,
            extra_gn_args: Vec::new(),
            extra_test_args: Vec::new(),
        }
    }
}

/// Orchestrator stage progression.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PipelineState {
    NotStarted,
    ConfigGen,
    BuildExec,
    Generators,
    Tests,
    Done,
    Failed,
}

/// Owns the lifetime of one build pipeline run.
pub struct Pipeline {
    host: Host,
    checkout: PathBuf,
    build: Build,
    options: PipelineOptions,
    own_executable: PathBuf,
    state: PipelineState,
}

impl Pipeline {
    pub fn new(
        host: Host,
        checkout: PathBuf,
        build: Build,
        options: PipelineOptions,
    ) -> Result<Self> {
        let own_executable = std::env::current_exe()?;
        Ok(Self {
            host,
            checkout,
            build,
            options,
            own_executable,
            state: PipelineState::NotStarted,
        })
    }

    pub fn state(&self) -> PipelineState {
        self.state
    }

    fn out_dir(&self) -> PathBuf {
        self.checkout.join("out").join(&self.build.ninja.config)
    }

    /// Run the pipeline once. Overall success is the short-circuited AND of
    /// all executed stages.
    pub async fn run(&mut self, events: &EventHandler) -> Result<bool> {
        info!(build = %self.build.name, "pipeline starting");

        if !self.host.can_run(&self.build.drone_dimensions) {
            warn!(build = %self.build.name, "host does not satisfy drone dimensions");
            events(RunnerEvent::Error(RunnerError::new(
                &self.build.name,
                format!(
                    "host platform does not match drone dimensions {:?}",
                    self.build.drone_dimensions
                ),
            )));
            self.state = PipelineState::Failed;
            return Ok(false);
        }

        if self.options.run_gn {
            self.state = PipelineState::ConfigGen;
            let runner = GnRunner::new(
                self.checkout.clone(),
                &self.build.gn,
                &self.options.extra_gn_args,
                self.options.dry_run,
            );
            if !runner.run(events).await? {
                self.state = PipelineState::Failed;
                return Ok(false);
            }
            fix_compile_commands(&self.out_dir(), self.options.dry_run)?;
        }

        if self.options.run_ninja {
            self.state = PipelineState::BuildExec;
            let runner = NinjaRunner::new(
                self.checkout.clone(),
                self.host,
                self.build.ninja.clone(),
                self.build.drone_dimensions.clone(),
                self.options.rbe.clone(),
                self.options.concurrency,
                self.options.dry_run,
            );
            if !runner.run(events).await? {
                self.state = PipelineState::Failed;
                return Ok(false);
            }
        }

        if self.options.run_generators {
            self.state = PipelineState::Generators;
            for task in &self.build.generators {
                let runner = GeneratorRunner::new(
                    self.checkout.clone(),
                    task.clone(),
                    self.own_executable.clone(),
                    self.options.dry_run,
                );
                if !runner.run(events).await? {
                    self.state = PipelineState::Failed;
                    return Ok(false);
                }
            }
        }

        if self.options.run_tests {
            self.state = PipelineState::Tests;
            for test in &self.build.tests {
                let runner = TestRunner::new(
                    self.checkout.clone(),
                    test.clone(),
                    self.options.extra_test_args.clone(),
                    self.own_executable.clone(),
                    self.options.dry_run,
                );
                if !runner.run(events).await? {
                    self.state = PipelineState::Failed;
                    return Ok(false);
                }
            }
        }

        self.state = PipelineState::Done;
        info!(build = %self.build.name, "pipeline finished");
        Ok(true)
    }
}
