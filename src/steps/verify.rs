//! Post-install verification. Never fatal.

use crate::dkms;

use super::{StepContext, StepOutcome};

pub fn verify(ctx: &StepContext<'_>) -> StepOutcome {
    let config = ctx.config;
    let target = config.dkms_target();

    match dkms::status(ctx.runner, &config.module_name) {
        Ok(entries) => {
            let installed = entries
                .iter()
                .any(|e| e.version == config.module_version && e.is_installed());
            if installed {
                ctx.log.info(format!("DKMS reports {} installed", target));
            } else {
                ctx.log
                    .warn(format!("DKMS does not report {} as installed", target));
            }
        }
        Err(e) => ctx.log.warn(format!("Could not verify DKMS status: {:#}", e)),
    }

    let conf = config.installed_conf();
    if conf.exists() {
        ctx.log.info(format!("Found {}", conf.display()));
    } else {
        ctx.log.warn(format!("{} is missing", conf.display()));
    }

    StepOutcome::Completed
}
