// src/host.rs

//! Host platform classification.
//!
//! The toolchain layout (buildtools subdirectories, binary suffixes, RBE
//! config file names) is keyed on exactly two CPU buckets and three OS
//! buckets. Anything outside those is a fatal configuration error; there is
//! no sensible way to continue on an unsupported host.

use std::thread;

use crate::errors::{BuildRunnerError, Result};

/// CPU architecture bucket.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CpuArch {
    Arm64,
    X64,
}

impl CpuArch {
    /// Classify a platform identifier into an architecture bucket.
    ///
    /// Recognised identifiers: `arm64`/`aarch64` and `x64`/`x86_64`/`amd64`.
    pub fn from_identifier(id: &str) -> Result<Self> {
        match id {
            "arm64" | "aarch64" => Ok(CpuArch::Arm64),
            "x64" | "x86_64" | "amd64" => Ok(CpuArch::X64),
            other => Err(BuildRunnerError::UnsupportedArch(other.to_string())),
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            CpuArch::Arm64 => "arm64",
            CpuArch::X64 => "x64",
        }
    }
}

/// Operating system bucket.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HostOs {
    Linux,
    MacOs,
    Windows,
}

impl HostOs {
    pub fn from_identifier(id: &str) -> Result<Self> {
        match id {
            "linux" => Ok(HostOs::Linux),
            "macos" => Ok(HostOs::MacOs),
            "windows" => Ok(HostOs::Windows),
            other => Err(BuildRunnerError::UnsupportedOs(other.to_string())),
        }
    }

    /// Suffix appended to toolchain binary names.
    pub fn exe_suffix(&self) -> &'static str {
        match self {
            HostOs::Linux | HostOs::MacOs => "",
            HostOs::Windows => ".exe",
        }
    }

    /// OS-keyed RBE config file name under `build/rbe/`.
    pub fn rbe_config_name(&self) -> &'static str {
        match self {
            HostOs::Linux => "linux.cfg",
            HostOs::MacOs => "mac.cfg",
            HostOs::Windows => "win.cfg",
        }
    }

    /// Short OS key used in buildtools directory names.
    pub fn dir_key(&self) -> &'static str {
        match self {
            HostOs::Linux => "linux",
            HostOs::MacOs => "mac",
            HostOs::Windows => "windows",
        }
    }

    /// Whether a drone dimension value like `Linux` or `Mac-12` matches
    /// this OS.
    pub fn matches_dimension(&self, value: &str) -> bool {
        value.to_lowercase().starts_with(self.dir_key())
    }
}

/// Immutable description of the machine the pipeline runs on.
#[derive(Debug, Clone, Copy)]
pub struct Host {
    pub os: HostOs,
    pub arch: CpuArch,
    pub logical_cpus: usize,
}

/// Multiplier applied to the physical-core estimate when computing the
/// remote-execution build concurrency.
const CONCURRENCY_PER_CORE: usize = 80;

/// Hard cap on the computed remote-execution build concurrency.
const CONCURRENCY_CAP: usize = 1000;

impl Host {
    /// Detect the current host from the environment.
    pub fn detect() -> Result<Self> {
        let os = HostOs::from_identifier(std::env::consts::OS)?;
        let arch = CpuArch::from_identifier(std::env::consts::ARCH)?;
        let logical_cpus = thread::available_parallelism()
            .map(|n| n.get())
            .unwrap_or(1);
        Ok(Self {
            os,
            arch,
            logical_cpus,
        })
    }

    /// Architecture/OS-keyed buildtools subdirectory, e.g. `linux-x64`.
    pub fn platform_dir(&self) -> String {
        format!("{}-{}", self.os.dir_key(), self.arch.as_str())
    }

    /// Build concurrency used when remote execution is active and the
    /// caller gave no explicit level.
    ///
    /// On x64 the logical count is halved to approximate physical cores
    /// under SMT; ARM parts ship without SMT so the full count is used.
    pub fn default_build_concurrency(&self) -> usize {
        let cores = match self.arch {
            CpuArch::X64 => (self.logical_cpus / 2).max(1),
            CpuArch::Arm64 => self.logical_cpus.max(1),
        };
        (cores * CONCURRENCY_PER_CORE).min(CONCURRENCY_CAP)
    }

    /// Check declared drone dimensions against this host.
    ///
    /// Only `os=` dimensions are verified; other dimensions describe CI
    /// fleet metadata the local host cannot meaningfully check.
    pub fn can_run(&self, drone_dimensions: &[String]) -> bool {
        drone_dimensions
            .iter()
            .filter_map(|dim| dim.strip_prefix("os="))
            .all(|value| self.os.matches_dimension(value))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn host(os: HostOs, arch: CpuArch, cpus: usize) -> Host {
        Host {
            os,
            arch,
            logical_cpus: cpus,
        }
    }

    #[test]
    fn arch_classification() {
        assert_eq!(CpuArch::from_identifier("aarch64").unwrap(), CpuArch::Arm64);
        assert_eq!(CpuArch::from_identifier("arm64").unwrap(), CpuArch::Arm64);
        assert_eq!(CpuArch::from_identifier("x86_64").unwrap(), CpuArch::X64);
        assert_eq!(CpuArch::from_identifier("amd64").unwrap(), CpuArch::X64);
        assert!(matches!(
            CpuArch::from_identifier("riscv64"),
            Err(BuildRunnerError::UnsupportedArch(_))
        ));
    }

    #[test]
    fn os_classification_and_suffixes() {
        assert_eq!(HostOs::from_identifier("linux").unwrap().exe_suffix(), "");
        assert_eq!(HostOs::from_identifier("macos").unwrap().exe_suffix(), "");
        assert_eq!(
            HostOs::from_identifier("windows").unwrap().exe_suffix(),
            ".exe"
        );
        assert!(matches!(
            HostOs::from_identifier("freebsd"),
            Err(BuildRunnerError::UnsupportedOs(_))
        ));
    }

    #[test]
    fn platform_dirs() {
        assert_eq!(
            host(HostOs::Linux, CpuArch::X64, 8).platform_dir(),
            "linux-x64"
        );
        assert_eq!(
            host(HostOs::MacOs, CpuArch::Arm64, 8).platform_dir(),
            "mac-arm64"
        );
    }

    #[test]
    fn concurrency_halves_x64_but_not_arm() {
        assert_eq!(
            host(HostOs::Linux, CpuArch::X64, 8).default_build_concurrency(),
            320
        );
        assert_eq!(
            host(HostOs::MacOs, CpuArch::Arm64, 8).default_build_concurrency(),
            640
        );
    }

    #[test]
    fn concurrency_is_capped() {
        assert_eq!(
            host(HostOs::Linux, CpuArch::X64, 128).default_build_concurrency(),
            1000
        );
        assert_eq!(
            host(HostOs::Linux, CpuArch::Arm64, 1024).default_build_concurrency(),
            1000
        );
    }

    #[test]
    fn concurrency_single_cpu() {
        // logical/2 on a single-cpu x64 box must not collapse to zero.
        assert_eq!(
            host(HostOs::Linux, CpuArch::X64, 1).default_build_concurrency(),
            80
        );
    }

    #[test]
    fn drone_dimension_matching() {
        let h = host(HostOs::Linux, CpuArch::X64, 8);
        assert!(h.can_run(&["os=Linux".to_string()]));
        assert!(h.can_run(&["device_type=none".to_string()]));
        assert!(h.can_run(&[]));
        assert!(!h.can_run(&["os=Windows-10".to_string()]));

        let mac = host(HostOs::MacOs, CpuArch::Arm64, 8);
        assert!(mac.can_run(&["os=Mac-12".to_string()]));
        assert!(!mac.can_run(&["os=Linux".to_string()]));
    }
}
