//! Host facts: package manager, kernel release, Secure Boot state.

use anyhow::Result;

use crate::distro::PackageManager;
use crate::process::{Cmd, CommandRunner};

use super::types::CheckResult;

/// Text `mokutil --sb-state` prints when Secure Boot is on.
const SECURE_BOOT_ENABLED: &str = "SecureBoot enabled";

pub fn detect_package_manager(runner: &dyn CommandRunner) -> (Option<PackageManager>, CheckResult) {
    match PackageManager::detect(runner) {
        Some(pm) => (Some(pm), CheckResult::pass_with("package manager", pm.program())),
        None => (
            None,
            CheckResult::fail("package manager", "None of apt-get, dnf, pacman, zypper found"),
        ),
    }
}

/// Running kernel release (`uname -r`).
pub fn kernel_release(runner: &dyn CommandRunner) -> Result<String> {
    let result = Cmd::new("uname")
        .arg("-r")
        .error_msg("Could not determine the running kernel")
        .run(runner)?;
    Ok(result.stdout_trimmed().to_string())
}

/// Whether Secure Boot is enforcing. Missing mokutil counts as disabled.
pub fn secure_boot(runner: &dyn CommandRunner) -> (bool, CheckResult) {
    if runner.locate("mokutil").is_none() {
        return (
            false,
            CheckResult::warn("Secure Boot", "mokutil not found - assuming disabled"),
        );
    }

    // mokutil exits non-zero on legacy BIOS systems; the text is what matters.
    let output = Cmd::new("mokutil")
        .arg("--sb-state")
        .allow_fail()
        .run(runner)
        .map(|r| format!("{}{}", r.stdout, r.stderr))
        .unwrap_or_default();

    if output.contains(SECURE_BOOT_ENABLED) {
        (true, CheckResult::pass_with("Secure Boot", "enabled - module signing key must be enrolled"))
    } else {
        (false, CheckResult::pass_with("Secure Boot", "disabled"))
    }
}

/// Tools the build needs. Missing ones are installed later, so only warn.
pub fn check_build_tools(runner: &dyn CommandRunner) -> Vec<CheckResult> {
    ["dkms", "git", "make"]
        .into_iter()
        .map(|tool| match runner.locate(tool) {
            Some(path) => CheckResult::pass_with(tool, path.to_string_lossy()),
            None => CheckResult::warn(tool, "Not found - will be installed"),
        })
        .collect()
}
