//! Build-tool packages.

use anyhow::{Context, Result};

use crate::error::InstallError;
use crate::preflight::HostFacts;

use super::{StepContext, StepOutcome};

/// Install whichever required packages are missing.
pub fn install_missing(ctx: &StepContext<'_>, host: &HostFacts) -> Result<StepOutcome> {
    let pm = host.package_manager;
    let required: Vec<String> = match &ctx.config.required_packages {
        Some(list) => list.clone(),
        None => pm.default_packages().iter().map(|p| p.to_string()).collect(),
    };

    let missing = pm.missing_packages(ctx.runner, &required);
    if missing.is_empty() {
        ctx.log.info("All required packages are installed");
        return Ok(StepOutcome::skipped("nothing missing"));
    }

    ctx.log.info(format!("Installing: {}", missing.join(" ")));
    pm.install_cmd(&missing)
        .run(ctx.runner)
        .context(InstallError::PackagesFailed)?;
    ctx.log.info(format!("Installed {} package(s)", missing.len()));
    Ok(StepOutcome::Completed)
}
