//! Privilege checks and sudo credential caching.

use anyhow::{Context, Result};
use std::time::Duration;

use crate::error::InstallError;
use crate::process::{Cmd, CommandRunner};

use super::types::CheckResult;

/// Effective uid of the installer process.
pub fn effective_uid(runner: &dyn CommandRunner) -> Result<u32> {
    let result = Cmd::new("id")
        .arg("-u")
        .error_msg("Could not determine the current user")
        .run(runner)?;
    result
        .stdout_trimmed()
        .parse()
        .with_context(|| format!("Unexpected `id -u` output: {:?}", result.stdout_trimmed()))
}

/// Refuse to run as root.
pub fn check_not_root(runner: &dyn CommandRunner) -> Result<CheckResult, InstallError> {
    match effective_uid(runner) {
        Ok(0) => Err(InstallError::RunningAsRoot),
        Ok(uid) => Ok(CheckResult::pass_with("unprivileged user", format!("uid {}", uid))),
        Err(e) => {
            tracing::debug!("uid lookup failed: {:#}", e);
            Err(InstallError::PrivilegesUnavailable)
        }
    }
}

/// Prompt for the sudo password once, then keep the credential cache warm.
pub fn acquire(runner: &dyn CommandRunner, keepalive: Duration) -> Result<CheckResult, InstallError> {
    if !Cmd::sudo("-v").interactive().succeeds(runner) {
        return Err(InstallError::PrivilegesUnavailable);
    }
    runner.keep_alive(Cmd::sudo("-n").arg("true"), keepalive);
    Ok(CheckResult::pass("sudo credentials"))
}
