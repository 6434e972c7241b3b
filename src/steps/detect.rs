//! Existing-install detection.

use crate::dkms::{self, LoadedModule};
use crate::process::Cmd;

use super::StepContext;

/// What is currently on the system for the target driver.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Detection {
    /// Loaded driver modules, in safe unload order.
    pub loaded: Vec<String>,
    /// Versions registered with DKMS.
    pub registered: Vec<String>,
}

impl Detection {
    pub fn found(&self) -> bool {
        !self.loaded.is_empty() || !self.registered.is_empty()
    }
}

/// Scan `lsmod` and `dkms status` for the target driver.
pub fn detect_existing(ctx: &StepContext<'_>) -> Detection {
    let config = ctx.config;

    let loaded = match Cmd::new("lsmod").run(ctx.runner) {
        Ok(result) => {
            let modules: Vec<LoadedModule> = dkms::parse_lsmod(&result.stdout);
            let matched = dkms::matching_modules(&modules, &config.module_prefix);
            dkms::unload_order(&matched)
        }
        Err(e) => {
            ctx.log.warn(format!("Could not list loaded modules: {:#}", e));
            Vec::new()
        }
    };

    // No dkms yet simply means nothing is registered.
    let registered = if ctx.runner.locate("dkms").is_some() {
        match dkms::status(ctx.runner, &config.module_name) {
            Ok(entries) => dkms::registered_versions(&entries),
            Err(e) => {
                ctx.log.warn(format!("Could not query DKMS: {:#}", e));
                Vec::new()
            }
        }
    } else {
        Vec::new()
    };

    let detection = Detection { loaded, registered };
    if detection.found() {
        ctx.log.info(format!(
            "Existing installation found (loaded: [{}], registered: [{}])",
            detection.loaded.join(", "),
            detection.registered.join(", ")
        ));
    } else {
        ctx.log.info("No existing installation found");
    }
    detection
}
