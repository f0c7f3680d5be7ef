// src/runners/test.rs

//! Test step runner.
//!
//! Test output streams straight to the invoking process's own stdio for
//! live visibility; nothing is captured or parsed, the Result event carries
//! the exit code only.

use std::collections::BTreeMap;
use std::future::Future;
use std::path::PathBuf;
use std::pin::Pin;

use crate::config::model::TestTask;
use crate::errors::Result;
use crate::events::{EventHandler, RunnerEvent, RunnerResult, RunnerStart};
use crate::runners::{resolve_interpreter, run_process, StdioMode, StepRunner};

pub struct TestRunner {
    checkout: PathBuf,
    test: TestTask,
    extra_args: Vec<String>,
    own_executable: PathBuf,
    dry_run: bool,
}

impl TestRunner {
    pub fn new(
        checkout: PathBuf,
        test: TestTask,
        extra_args: Vec<String>,
        own_executable: PathBuf,
        dry_run: bool,
    ) -> Self {
        Self {
            checkout,
            test,
            extra_args,
            own_executable,
            dry_run,
        }
    }

    fn command(&self) -> Vec<String> {
        let mut command = Vec::new();
        if let Some(interpreter) =
            resolve_interpreter(&self.test.language, &self.own_executable)
        {
            command.push(interpreter);
        }
        command.push(self.checkout.join(&self.test.script).display().to_string());
        command.extend(self.test.parameters.iter().cloned());
        command.extend(self.extra_args.iter().cloned());
        command
    }

    async fn run_impl(&self, events: &EventHandler) -> Result<bool> {
        let command = self.command();
        events(RunnerEvent::Start(RunnerStart::new(
            &self.test.name,
            command.clone(),
            BTreeMap::new(),
        )));

        let artifacts =
            run_process(&command, &BTreeMap::new(), StdioMode::Inherit, self.dry_run).await;
        let ok = artifacts.ok();

        events(RunnerEvent::Result(RunnerResult::new(
            &self.test.name,
            command,
            artifacts,
        )));
        Ok(ok)
    }
}

impl StepRunner for TestRunner {
    fn run<'a>(
        &'a self,
        events: &'a EventHandler,
    ) -> Pin<Box<dyn Future<Output = Result<bool>> + Send + 'a>> {
        Box::pin(self.run_impl(events))
    }
}
