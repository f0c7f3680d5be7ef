// src/lib.rs

pub mod cli;
pub mod config;
pub mod errors;
pub mod events;
pub mod host;
pub mod logging;
pub mod parse;
pub mod pipeline;
pub mod rbe;
pub mod runners;

use std::path::PathBuf;
use std::str::FromStr;
use std::sync::Arc;

use tracing::info;

use crate::cli::CliArgs;
use crate::config::loader::load_and_validate;
use crate::errors::{BuildRunnerError, Result};
use crate::events::EventHandler;
use crate::host::Host;
use crate::pipeline::{Pipeline, PipelineOptions};
use crate::rbe::{RbeConfig, RbeExecStrategy};

/// High-level entry point used by `main.rs`.
///
/// This wires together:
/// - config loading
/// - host detection
/// - pipeline construction
/// - an event handler that renders every event to stdout
///
/// Returns whether the pipeline succeeded.
pub async fn run(args: CliArgs) -> Result<bool> {
    let config_path = PathBuf::from(&args.config);
    let cfg = load_and_validate(&config_path)?;

    let build = cfg
        .find_build(&args.build)
        .cloned()
        .ok_or_else(|| BuildRunnerError::BuildNotFound(args.build.clone()))?;

    let host = Host::detect()?;
    let options = pipeline_options(&args)?;

    info!(build = %build.name, dry_run = options.dry_run, "configured pipeline");

    let events: EventHandler = Arc::new(|event| println!("{event}"));
    let mut pipeline = Pipeline::new(host, PathBuf::from(&args.checkout), build, options)?;
    pipeline.run(&events).await
}

fn pipeline_options(args: &CliArgs) -> Result<PipelineOptions> {
    let rbe = if args.rbe {
        let mut config = RbeConfig {
            remote_disabled: args.no_remote,
            ..Default::default()
        };
        if let Some(ref strategy) = args.rbe_strategy {
            config.exec_strategy = RbeExecStrategy::from_str(strategy)
                .map_err(BuildRunnerError::ConfigError)?;
        }
        Some(config)
    } else {
        None
    };

    Ok(PipelineOptions {
        dry_run: args.dry_run,
        run_gn: !args.no_gn,
        run_ninja: !args.no_ninja,
        run_generators: !args.no_generators,
        run_tests: !args.no_tests,
        rbe,
        concurrency: args.concurrency,
        extra_gn_args: args.extra_gn_args.clone(),
        extra_test_args: args.extra_test_args.clone(),
    })
}
