//! Host platform detection.
//!
//! Produces the `(platform, arch)` pair once per run. Explicit overrides
//! skip detection but still go through the same name mapping.

use std::path::Path;
use std::process::Command;

use foundryup_schema::{Arch, Platform, SchemaError, Target};

/// Marker file present on Alpine Linux (musl) hosts.
const ALPINE_RELEASE: &str = "/etc/alpine-release";

/// Detect the release target for this host.
///
/// # Errors
///
/// Returns [`SchemaError::UnsupportedPlatform`] if the OS name (detected or
/// overridden) has no published releases.
pub fn detect_target(
    platform_override: Option<&str>,
    arch_override: Option<&str>,
) -> Result<Target, SchemaError> {
    let platform = match platform_override {
        Some(name) => Platform::from_os_name(name)?,
        None => Platform::from_os_name(&os_name())?,
    };

    let arch = match arch_override {
        Some(machine) => Arch::from_machine(machine, false),
        None => Arch::from_machine(std::env::consts::ARCH, is_translated()),
    };

    tracing::debug!(%platform, %arch, "resolved release target");
    Ok(Target::new(platform, arch))
}

/// Lowercase OS name of the running host, with Alpine split out from Linux.
fn os_name() -> String {
    let os = std::env::consts::OS;
    if os == "linux" && Path::new(ALPINE_RELEASE).exists() {
        return "alpine".to_string();
    }
    os.to_string()
}

/// True when the process runs under Rosetta 2 translation.
fn is_translated() -> bool {
    if !cfg!(target_os = "macos") {
        return false;
    }
    Command::new("sysctl")
        .args(["-n", "sysctl.proc_translated"])
        .output()
        .ok()
        .filter(|o| o.status.success())
        .is_some_and(|o| String::from_utf8_lossy(&o.stdout).trim() == "1")
}
