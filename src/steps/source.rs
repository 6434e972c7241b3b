//! Driver source checkout.

use anyhow::{Context, Result};
use std::fs;

use crate::common::WorkDirGuard;
use crate::error::InstallError;
use crate::process::Cmd;

use super::{StepContext, StepOutcome};

/// Shallow-clone the driver repository into the work directory.
///
/// An existing directory is only replaced after confirmation; declining
/// keeps it as-is and skips the clone.
pub fn fetch_source(ctx: &StepContext<'_>, guard: &mut WorkDirGuard) -> Result<StepOutcome> {
    let config = ctx.config;
    let dest = &config.work_dir;

    if dest.exists() {
        let question = format!("{} already exists. Delete it and clone again?", dest.display());
        if !ctx.prompt.confirm(&question, true)? {
            ctx.log.info(format!("Keeping existing source in {}", dest.display()));
            return Ok(StepOutcome::skipped("kept existing source tree"));
        }
        fs::remove_dir_all(dest)
            .with_context(|| format!("Failed to remove {}", dest.display()))?;
    }

    if let Some(parent) = dest.parent() {
        fs::create_dir_all(parent)
            .with_context(|| format!("Failed to create {}", parent.display()))?;
    }

    // From here on the directory is ours; a failed run should not leave it.
    guard.set_remove(true);

    ctx.log.info(format!("Cloning {} into {}", config.repo_url, dest.display()));
    Cmd::new("git")
        .args(["clone", "--depth", "1", config.repo_url.as_str()])
        .arg_path(dest)
        .interactive()
        .run(ctx.runner)
        .context(InstallError::CloneFailed {
            url: config.repo_url.clone(),
            dest: dest.clone(),
        })?;

    Ok(StepOutcome::Completed)
}
