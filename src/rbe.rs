// src/rbe.rs

//! Remote build execution (RBE) configuration and session management.
//!
//! Two pieces live here:
//!
//! - [`RbeConfig`], an immutable value whose [`RbeConfig::environment`] is a
//!   pure derivation of the environment variables the reclient tools read.
//! - [`RbeSession`], which starts and stops the reproxy process around the
//!   build-execution step via the `bootstrap` helper binary.
//!
//! The session is used with scoped-resource discipline: the ninja runner
//! starts it, runs the build capturing the outcome, and always attempts
//! shutdown before returning, regardless of how the build went.

use std::collections::BTreeMap;
use std::path::PathBuf;
use std::str::FromStr;

use tracing::{debug, warn};

use crate::errors::Result;
use crate::events::{CommandEnv, EventHandler, RunnerError, RunnerEvent, RunnerResult, RunnerStart};
use crate::host::Host;
use crate::runners::{run_process, StdioMode};

/// Event name for the session startup step.
pub const RBE_STARTUP: &str = "rbe:startup";
/// Event name for the session shutdown step.
pub const RBE_SHUTDOWN: &str = "rbe:shutdown";

/// Where build actions are allowed to execute.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RbeExecStrategy {
    /// Execute locally only (remote cache still consulted).
    Local,
    /// Race local against remote execution.
    Racing,
    /// Execute remotely only.
    Remote,
    /// Execute remotely, falling back to local on failure.
    RemoteLocalFallback,
}

impl RbeExecStrategy {
    pub fn as_str(&self) -> &'static str {
        match self {
            RbeExecStrategy::Local => "local",
            RbeExecStrategy::Racing => "racing",
            RbeExecStrategy::Remote => "remote",
            RbeExecStrategy::RemoteLocalFallback => "remote_local_fallback",
        }
    }
}

impl FromStr for RbeExecStrategy {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "local" => Ok(RbeExecStrategy::Local),
            "racing" => Ok(RbeExecStrategy::Racing),
            "remote" => Ok(RbeExecStrategy::Remote),
            "remote_local_fallback" => Ok(RbeExecStrategy::RemoteLocalFallback),
            other => Err(format!(
                "invalid exec strategy: {other} (expected \"local\", \"racing\", \"remote\", or \"remote_local_fallback\")"
            )),
        }
    }
}

/// Immutable remote-execution configuration.
#[derive(Debug, Clone, PartialEq)]
pub struct RbeConfig {
    /// When set, no remote workers are used at all; only the disable flag is
    /// exported.
    pub remote_disabled: bool,
    pub exec_strategy: RbeExecStrategy,
    /// Remote preference in `[0, 1]`; only meaningful for `racing`.
    pub racing_bias: f64,
    /// Share of the local machine usable for local execution; only
    /// meaningful for `racing`.
    pub local_resource_fraction: f64,
}

impl Default for RbeConfig {
    fn default() -> Self {
        Self {
            remote_disabled: false,
            exec_strategy: RbeExecStrategy::Racing,
            racing_bias: 0.95,
            local_resource_fraction: 0.2,
        }
    }
}

impl RbeConfig {
    /// Derive the flat environment-variable mapping the reclient tools
    /// expect. Pure function of `self`.
    pub fn environment(&self) -> CommandEnv {
        let mut env = BTreeMap::new();
        env.insert("RBE_cas_concurrency".to_string(), "500".to_string());
        env.insert("RBE_deps_cache_max_mb".to_string(), "512".to_string());

        if self.remote_disabled {
            env.insert("RBE_remote_disabled".to_string(), "1".to_string());
            return env;
        }

        env.insert(
            "RBE_exec_strategy".to_string(),
            self.exec_strategy.as_str().to_string(),
        );
        if self.exec_strategy == RbeExecStrategy::Racing {
            env.insert("RBE_racing_bias".to_string(), self.racing_bias.to_string());
            env.insert(
                "RBE_local_resource_fraction".to_string(),
                self.local_resource_fraction.to_string(),
            );
        }
        env
    }
}

/// A remote-execution proxy session scoped around one build-execution step.
#[derive(Debug)]
pub struct RbeSession {
    checkout: PathBuf,
    host: Host,
    env: CommandEnv,
    dry_run: bool,
}

impl RbeSession {
    pub fn new(checkout: PathBuf, host: Host, config: &RbeConfig, dry_run: bool) -> Self {
        Self {
            checkout,
            host,
            env: config.environment(),
            dry_run,
        }
    }

    /// Environment exported to the proxy and to the build executor.
    pub fn environment(&self) -> &CommandEnv {
        &self.env
    }

    fn reclient_dir(&self) -> PathBuf {
        self.checkout
            .join("buildtools")
            .join(self.host.platform_dir())
            .join("reclient")
    }

    fn tool(&self, name: &str) -> PathBuf {
        self.reclient_dir()
            .join(format!("{name}{}", self.host.os.exe_suffix()))
    }

    fn config_file(&self) -> PathBuf {
        self.checkout
            .join("build")
            .join("rbe")
            .join(self.host.os.rbe_config_name())
    }

    /// Start or stop the reproxy process.
    ///
    /// Emits Start/Result events named [`RBE_STARTUP`] or [`RBE_SHUTDOWN`].
    /// A missing bootstrap binary emits an Error event and fails fast
    /// without spawning anything. On shutdown success the generic "OK" is
    /// replaced by a statistics line captured from the still-running
    /// session.
    pub async fn bootstrap(&self, shutdown: bool, events: &EventHandler) -> Result<bool> {
        let name = if shutdown { RBE_SHUTDOWN } else { RBE_STARTUP };
        let bootstrap = self.tool("bootstrap");

        if !self.dry_run && !bootstrap.is_file() {
            events(RunnerEvent::Error(RunnerError::new(
                name,
                format!("bootstrap binary not found at {}", bootstrap.display()),
            )));
            return Ok(false);
        }

        // Statistics must come from the live session; once the proxy is
        // stopped reproxystatus has nothing to report.
        let stats = if shutdown {
            self.session_stats().await
        } else {
            None
        };

        let mut command = vec![
            bootstrap.display().to_string(),
            format!("--re_proxy={}", self.tool("reproxy").display()),
        ];
        if shutdown {
            command.push("--shutdown".to_string());
        } else {
            command.push("--use_application_default_credentials".to_string());
            command.push(format!("--cfg={}", self.config_file().display()));
        }

        events(RunnerEvent::Start(RunnerStart::new(
            name,
            command.clone(),
            self.env.clone(),
        )));

        let artifacts = run_process(&command, &self.env, StdioMode::Capture, self.dry_run).await;
        let ok = artifacts.ok();

        let mut result = RunnerResult::new(name, command, artifacts);
        if shutdown && ok {
            let message = match stats {
                Some(line) => line,
                None => {
                    let raw = result.artifacts.stdout.trim();
                    if raw.is_empty() {
                        "OK".to_string()
                    } else {
                        raw.to_string()
                    }
                }
            };
            result = result.with_ok_message(message);
        }
        if shutdown && !ok {
            // Shutdown failure must not override the build step's own
            // outcome; it is only visible through this event.
            warn!(name, "rbe shutdown failed");
        }
        events(RunnerEvent::Result(result));

        Ok(ok)
    }

    /// Statistics line from the running session: the second line of
    /// `reproxystatus` output, when the tool responds with one.
    async fn session_stats(&self) -> Option<String> {
        let status_command = vec![self.tool("reproxystatus").display().to_string()];
        let status =
            run_process(&status_command, &self.env, StdioMode::Capture, self.dry_run).await;

        if !status.ok() {
            debug!("reproxystatus unavailable; no session statistics");
            return None;
        }
        status
            .stdout
            .lines()
            .nth(1)
            .map(str::trim)
            .filter(|line| !line.is_empty())
            .map(str::to_string)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::host::{CpuArch, HostOs};

    #[test]
    fn remote_disabled_exports_only_disable_and_tuning_keys() {
        let env = RbeConfig {
            remote_disabled: true,
            ..Default::default()
        }
        .environment();

        assert_eq!(env.get("RBE_remote_disabled").map(String::as_str), Some("1"));
        assert_eq!(env.get("RBE_cas_concurrency").map(String::as_str), Some("500"));
        assert_eq!(env.get("RBE_deps_cache_max_mb").map(String::as_str), Some("512"));
        assert!(!env.contains_key("RBE_exec_strategy"));
        assert!(!env.contains_key("RBE_racing_bias"));
        assert!(!env.contains_key("RBE_local_resource_fraction"));
        assert_eq!(env.len(), 3);
    }

    #[test]
    fn racing_strategy_exports_bias_and_fraction() {
        let env = RbeConfig::default().environment();
        assert_eq!(env.get("RBE_exec_strategy").map(String::as_str), Some("racing"));
        assert_eq!(env.get("RBE_racing_bias").map(String::as_str), Some("0.95"));
        assert_eq!(
            env.get("RBE_local_resource_fraction").map(String::as_str),
            Some("0.2")
        );
        assert!(!env.contains_key("RBE_remote_disabled"));
        assert_eq!(env.len(), 5);
    }

    #[test]
    fn non_racing_strategy_omits_bias_and_fraction() {
        let env = RbeConfig {
            exec_strategy: RbeExecStrategy::Local,
            ..Default::default()
        }
        .environment();
        assert_eq!(env.get("RBE_exec_strategy").map(String::as_str), Some("local"));
        assert!(!env.contains_key("RBE_racing_bias"));
        assert!(!env.contains_key("RBE_local_resource_fraction"));
        assert_eq!(env.len(), 3);
    }

    #[test]
    fn strategy_parsing() {
        assert_eq!(
            "remote_local_fallback".parse::<RbeExecStrategy>().unwrap(),
            RbeExecStrategy::RemoteLocalFallback
        );
        assert!("warp-speed".parse::<RbeExecStrategy>().is_err());
    }

    #[test]
    fn toolchain_paths_are_platform_keyed() {
        let host = Host {
            os: HostOs::MacOs,
            arch: CpuArch::Arm64,
            logical_cpus: 8,
        };
        let session = RbeSession::new(
            PathBuf::from("/checkout"),
            host,
            &RbeConfig::default(),
            true,
        );
        assert_eq!(
            session.tool("bootstrap"),
            PathBuf::from("/checkout/buildtools/mac-arm64/reclient/bootstrap")
        );
        assert_eq!(
            session.config_file(),
            PathBuf::from("/checkout/build/rbe/mac.cfg")
        );
    }
}
