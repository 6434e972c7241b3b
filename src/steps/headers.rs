//! Kernel header installation.

use anyhow::{bail, Result};

use crate::error::InstallError;
use crate::preflight::HostFacts;

use super::{StepContext, StepOutcome};

/// Make sure `<modules_root>/<kernel>/build` exists.
///
/// Candidates are tried in order and the first successful install wins.
pub fn ensure_headers(ctx: &StepContext<'_>, host: &HostFacts) -> Result<StepOutcome> {
    let pm = host.package_manager;

    if !pm.refresh_cmd().succeeds(ctx.runner) {
        ctx.log.warn("Package index refresh failed; continuing with cached index");
    }

    let header_dir = ctx.config.header_dir(&host.kernel);
    if header_dir.exists() {
        ctx.log.info(format!("Kernel headers present at {}", header_dir.display()));
        return Ok(StepOutcome::skipped("headers already installed"));
    }

    for candidate in pm.header_candidates(&host.kernel) {
        ctx.log.info(format!(
            "Installing {} ({})",
            candidate.label, candidate.package
        ));
        if pm.install_cmd(&[&candidate.package]).succeeds(ctx.runner) {
            ctx.log.info(format!("Installed {}", candidate.package));
            return Ok(StepOutcome::Completed);
        }
        ctx.log.info(format!("{} not available", candidate.package));
    }

    bail!(InstallError::HeadersUnavailable {
        kernel: host.kernel.clone()
    })
}
