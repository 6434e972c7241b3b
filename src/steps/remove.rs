//! Removal of an existing installation. Best-effort throughout.

use std::path::{Path, PathBuf};

use crate::dkms;
use crate::process::Cmd;

use super::detect::Detection;
use super::{StepContext, StepOutcome};

/// Unload, deregister and delete everything `detection` found.
pub fn remove_installation(ctx: &StepContext<'_>, detection: &Detection) -> StepOutcome {
    let config = ctx.config;
    let log = ctx.log;

    for module in &detection.loaded {
        match Cmd::sudo("modprobe").args(["-r", module.as_str()]).run(ctx.runner) {
            Ok(_) => log.info(format!("Unloaded {}", module)),
            Err(e) => log.warn(format!("Could not unload {}: {:#}", module, e)),
        }
    }

    for version in &detection.registered {
        match dkms::remove_cmd(&config.module_name, version).run(ctx.runner) {
            Ok(_) => log.info(format!("Removed {}/{} from DKMS", config.module_name, version)),
            Err(e) => log.warn(format!(
                "Could not remove {}/{} from DKMS: {:#}",
                config.module_name, version, e
            )),
        }
    }

    let mut sources: Vec<PathBuf> = detection
        .registered
        .iter()
        .map(|v| config.dkms_source_dir(v))
        .collect();
    let configured = config.dkms_source_dir(&config.module_version);
    if !sources.contains(&configured) {
        sources.push(configured);
    }

    for source in sources.iter().filter(|p| p.exists()) {
        delete(ctx, Cmd::sudo("rm").arg("-rf").arg_path(source), source);
    }

    let conf = config.installed_conf();
    if conf.exists() {
        delete(ctx, Cmd::sudo("rm").arg("-f").arg_path(&conf), &conf);
    }

    StepOutcome::Completed
}

fn delete(ctx: &StepContext<'_>, cmd: Cmd, path: &Path) {
    match cmd.run(ctx.runner) {
        Ok(_) => ctx.log.info(format!("Deleted {}", path.display())),
        Err(e) => ctx
            .log
            .warn(format!("Could not delete {}: {:#}", path.display(), e)),
    }
}
