// src/runners/generator.rs

//! Generator-task step runner: ordered scripts, fail-fast.

use std::collections::BTreeMap;
use std::future::Future;
use std::path::PathBuf;
use std::pin::Pin;

use tracing::{info, warn};

use crate::config::model::GeneratorTask;
use crate::errors::Result;
use crate::events::{EventHandler, RunnerEvent, RunnerResult, RunnerStart};
use crate::runners::{resolve_interpreter, run_process, StdioMode, StepRunner};

pub struct GeneratorRunner {
    checkout: PathBuf,
    task: GeneratorTask,
    own_executable: PathBuf,
    dry_run: bool,
}

impl GeneratorRunner {
    pub fn new(
        checkout: PathBuf,
        task: GeneratorTask,
        own_executable: PathBuf,
        dry_run: bool,
    ) -> Self {
        Self {
            checkout,
            task,
            own_executable,
            dry_run,
        }
    }

    fn script_command(&self, script: &str) -> Vec<String> {
        let mut command = Vec::new();
        if let Some(interpreter) =
            resolve_interpreter(&self.task.language, &self.own_executable)
        {
            command.push(interpreter);
        }
        command.push(self.checkout.join(script).display().to_string());
        command.extend(self.task.parameters.iter().cloned());
        command
    }

    /// Run the task's scripts strictly in order, stopping at the first
    /// failure; remaining scripts are skipped.
    async fn run_impl(&self, events: &EventHandler) -> Result<bool> {
        for script in &self.task.scripts {
            let command = self.script_command(script);
            events(RunnerEvent::Start(RunnerStart::new(
                &self.task.name,
                command.clone(),
                BTreeMap::new(),
            )));

            let artifacts =
                run_process(&command, &BTreeMap::new(), StdioMode::Capture, self.dry_run)
                    .await;
            let ok = artifacts.ok();

            events(RunnerEvent::Result(RunnerResult::new(
                &self.task.name,
                command,
                artifacts,
            )));

            if !ok {
                warn!(task = %self.task.name, script, "generator script failed; skipping the rest");
                return Ok(false);
            }
            info!(task = %self.task.name, script, "generator script finished");
        }
        Ok(true)
    }
}

impl StepRunner for GeneratorRunner {
    fn run<'a>(
        &'a self,
        events: &'a EventHandler,
    ) -> Pin<Box<dyn Future<Output = Result<bool>> + Send + 'a>> {
        Box::pin(self.run_impl(events))
    }
}
