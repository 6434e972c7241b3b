//! Preflight checks.
//!
//! Refuses to run as root, caches sudo credentials, and discovers the host
//! facts every later stage depends on.

mod host;
mod privileges;
mod types;

use anyhow::Result;

use crate::config::Config;
use crate::error::InstallError;
use crate::process::CommandRunner;
use crate::status::StatusLog;

pub use privileges::effective_uid;
pub use types::{CheckResult, CheckStatus, HostFacts, PreflightReport};

/// Run all preflight checks and return the discovered host facts.
///
/// The root check runs before anything that touches sudo.
pub fn run_preflight(
    runner: &dyn CommandRunner,
    config: &Config,
    log: &StatusLog,
) -> Result<HostFacts> {
    println!("Running preflight checks...\n");
    let mut report = PreflightReport::default();

    match privileges::check_not_root(runner) {
        Ok(check) => report.push(check),
        Err(e) => {
            report.push(CheckResult::fail("unprivileged user", e.to_string()));
            return fatal(&report, e);
        }
    }

    match privileges::acquire(runner, config.keepalive_interval) {
        Ok(check) => report.push(check),
        Err(e) => {
            report.push(CheckResult::fail("sudo credentials", e.to_string()));
            return fatal(&report, e);
        }
    }

    let (package_manager, check) = host::detect_package_manager(runner);
    report.push(check);
    let Some(package_manager) = package_manager else {
        return fatal(&report, InstallError::NoPackageManager);
    };

    let kernel = host::kernel_release(runner)?;
    report.push(CheckResult::pass_with("kernel", kernel.as_str()));

    let (secure_boot, check) = host::secure_boot(runner);
    report.push(check);

    report.checks.extend(host::check_build_tools(runner));
    report.print();

    log.info(format!(
        "Preflight passed: {} on kernel {}, Secure Boot {}",
        package_manager,
        kernel,
        if secure_boot { "enabled" } else { "disabled" }
    ));

    Ok(HostFacts {
        package_manager,
        kernel,
        secure_boot,
    })
}

fn fatal(report: &PreflightReport, err: InstallError) -> Result<HostFacts> {
    report.print();
    Err(err.into())
}
