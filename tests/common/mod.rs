// tests/common/mod.rs

//! Shared fixtures for the integration suites.

#![allow(dead_code)]

use buildrunner::host::{CpuArch, Host, HostOs};

/// A plain linux-x64 host; drone dimensions in the suites are written
/// against it.
pub fn linux_host() -> Host {
    Host {
        os: HostOs::Linux,
        arch: CpuArch::X64,
        logical_cpus: 4,
    }
}

/// Write an executable script under the checkout root.
#[cfg(unix)]
pub fn write_script(checkout: &std::path::Path, rel: &str, body: &str) {
    use std::fs;
    use std::os::unix::fs::PermissionsExt;

    let path = checkout.join(rel);
    fs::create_dir_all(path.parent().unwrap()).unwrap();
    fs::write(&path, body).unwrap();
    fs::set_permissions(&path, fs::Permissions::from_mode(0o755)).unwrap();
}
