//! Optional system upgrade.

use anyhow::{Context, Result};

use crate::error::InstallError;
use crate::preflight::HostFacts;

use super::{StepContext, StepOutcome};

pub fn offer_upgrade(ctx: &StepContext<'_>, host: &HostFacts) -> Result<StepOutcome> {
    let pm = host.package_manager;

    let count = match pm.upgradable_count(ctx.runner) {
        Ok(count) => count,
        Err(e) => {
            ctx.log.warn(format!("Could not check for updates: {:#}", e));
            return Ok(StepOutcome::skipped("update check failed"));
        }
    };

    if count == 0 {
        ctx.log.info("System packages are up to date");
        return Ok(StepOutcome::skipped("no updates"));
    }

    let question = format!("{} package update(s) available. Install them now?", count);
    if !ctx.prompt.confirm(&question, false)? {
        ctx.log.info(format!("Skipping {} available update(s)", count));
        return Ok(StepOutcome::skipped("declined"));
    }

    pm.upgrade_cmd()
        .run(ctx.runner)
        .context(InstallError::UpgradeFailed)?;
    ctx.log.info(format!("Installed {} update(s)", count));
    Ok(StepOutcome::Completed)
}
