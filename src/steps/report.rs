//! Final instructions.

use crate::config::Config;
use crate::preflight::HostFacts;

use super::{StepContext, StepOutcome};

pub fn print_report(ctx: &StepContext<'_>, host: &HostFacts) -> StepOutcome {
    println!();
    print!("{}", render(ctx.config, host.secure_boot));
    ctx.log.info(format!("Installation of {} complete", ctx.config.dkms_target()));
    StepOutcome::Completed
}

/// Report text: MOK enrollment when Secure Boot is on, then checks.
pub fn render(config: &Config, secure_boot: bool) -> String {
    let mut out = String::new();

    if secure_boot {
        out.push_str("Secure Boot is enabled. The module will not load until its signing key is enrolled:\n");
        out.push_str(&format!(
            "  1. sudo mokutil --import {}\n",
            config.mok_key.display()
        ));
        out.push_str("  2. Choose a one-time password when prompted\n");
        out.push_str("  3. Reboot, pick \"Enroll MOK\" in the MOK manager and enter that password\n\n");
    }

    out.push_str("After rebooting, check the driver with:\n");
    out.push_str(&format!("  lsmod | grep {}\n", config.module_prefix));
    out.push_str(&format!("  dkms status {}\n", config.module_name));
    out.push_str(&format!(
        "  sudo dmesg | grep -i {}\n",
        config.module_prefix.trim_end_matches(['_', '-'])
    ));
    out
}
