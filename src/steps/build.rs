//! DKMS build and registration, firmware and modprobe config.

use anyhow::{Context, Result};

use crate::dkms;
use crate::error::InstallError;
use crate::process::Cmd;
use crate::timing::Timer;

use super::{StepContext, StepOutcome};

pub fn build_and_register(ctx: &StepContext<'_>) -> Result<StepOutcome> {
    let config = ctx.config;
    let log = ctx.log;
    let tree = &config.work_dir;
    let target = config.dkms_target();

    log.info(format!("Building {} with DKMS (this can take several minutes)", target));
    let timer = Timer::start("DKMS build");
    dkms::install_cmd(tree)
        .run(ctx.runner)
        .context(InstallError::BuildFailed {
            target: target.clone(),
        })?;
    let elapsed = timer.finish();
    log.info(format!("{} built and installed ({})", target, elapsed));

    match Cmd::sudo("make")
        .arg("install_fw")
        .dir(tree)
        .interactive()
        .run(ctx.runner)
    {
        Ok(_) => log.info("Firmware installed"),
        Err(e) => log.warn(format!("Firmware install failed: {:#}", e)),
    }

    let conf = tree.join(&config.conf_file);
    if !conf.exists() {
        log.warn(format!("{} not found in the source tree", config.conf_file));
        return Ok(StepOutcome::Completed);
    }

    let installed = config.installed_conf();
    match Cmd::sudo("cp")
        .arg_path(&conf)
        .arg_path(&installed)
        .run(ctx.runner)
    {
        Ok(_) => log.info(format!("Installed {}", installed.display())),
        Err(e) => log.warn(format!(
            "Could not install {}: {:#}",
            installed.display(),
            e
        )),
    }

    Ok(StepOutcome::Completed)
}
