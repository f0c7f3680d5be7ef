// src/cli.rs

//! CLI argument parsing using `clap`.

use clap::{Parser, ValueEnum};

/// Command-line arguments for `buildrunner`.
#[derive(Debug, Clone, Parser)]
#[command(
    name = "buildrunner",
    version,
    about = "Drive a build config through gn, ninja, generators, and tests.",
    long_about = None
)]
pub struct CliArgs {
    /// Path to the build configuration file (JSON).
    #[arg(long, value_name = "PATH", default_value = "builds.json")]
    pub config: String,

    /// Name of the build to run.
    #[arg(long, value_name = "NAME")]
    pub build: String,

    /// Source checkout root the toolchain paths are resolved under.
    #[arg(long, value_name = "PATH", default_value = ".")]
    pub checkout: String,

    /// Exercise the full pipeline without spawning any subprocesses.
    #[arg(long)]
    pub dry_run: bool,

    /// Skip the config-generation stage.
    #[arg(long)]
    pub no_gn: bool,

    /// Skip the build-execution stage.
    #[arg(long)]
    pub no_ninja: bool,

    /// Skip the generator tasks.
    #[arg(long)]
    pub no_generators: bool,

    /// Skip the tests.
    #[arg(long)]
    pub no_tests: bool,

    /// Offload build actions through remote build execution.
    #[arg(long)]
    pub rbe: bool,

    /// With --rbe: disable remote workers (local execution + cache only).
    #[arg(long)]
    pub no_remote: bool,

    /// With --rbe: execution strategy
    /// (local, racing, remote, remote_local_fallback).
    #[arg(long, value_name = "STRATEGY")]
    pub rbe_strategy: Option<String>,

    /// Explicit build parallelism; omit to let the tool decide.
    #[arg(long, short = 'j', value_name = "N")]
    pub concurrency: Option<usize>,

    /// Extra argument for the config-generation step (repeatable).
    #[arg(long = "gn-arg", value_name = "ARG")]
    pub extra_gn_args: Vec<String>,

    /// Extra argument appended to every test invocation (repeatable).
    #[arg(long = "test-arg", value_name = "ARG")]
    pub extra_test_args: Vec<String>,

    /// Logging level (error, warn, info, debug, trace).
    ///
    /// If omitted, `BUILDRUNNER_LOG` or a default level will be used.
    #[arg(long, value_enum, value_name = "LEVEL")]
    pub log_level: Option<LogLevel>,
}

/// Log level as exposed on the CLI.
#[derive(Debug, Copy, Clone, ValueEnum)]
pub enum LogLevel {
    Error,
    Warn,
    Info,
    Debug,
    Trace,
}

/// Convenience wrapper around `CliArgs::parse()`.
pub fn parse() -> CliArgs {
    CliArgs::parse()
}
