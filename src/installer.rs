//! Installer orchestration.
//!
//! Preflight runs first, then a fixed list of stages for the chosen mode.
//! A fatal stage ends the run with an error; a declined gate ends it with
//! [`Finish::Cancelled`].

use anyhow::{bail, Result};
use std::fmt;

use crate::common::WorkDirGuard;
use crate::config::Config;
use crate::error::InstallError;
use crate::preflight::{self, HostFacts};
use crate::process::{Cmd, CommandRunner};
use crate::prompt::Prompt;
use crate::signals;
use crate::status::StatusLog;
use crate::steps::detect::{self, Detection};
use crate::steps::{build, headers, packages, remove, report, source, updates, verify};
use crate::steps::{StepContext, StepOutcome};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Mode {
    Install,
    Uninstall,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Stage {
    Confirm,
    DetectExisting,
    Remove,
    Headers,
    Updates,
    Packages,
    Clone,
    Build,
    Verify,
    Report,
    CleanupChoice,
    RebootChoice,
}

pub const INSTALL_FLOW: &[Stage] = &[
    Stage::Confirm,
    Stage::DetectExisting,
    Stage::Remove,
    Stage::Headers,
    Stage::Updates,
    Stage::Packages,
    Stage::Clone,
    Stage::Build,
    Stage::Verify,
    Stage::Report,
    Stage::CleanupChoice,
    Stage::RebootChoice,
];

pub const UNINSTALL_FLOW: &[Stage] = &[Stage::Confirm, Stage::DetectExisting, Stage::Remove];

impl fmt::Display for Stage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let title = match self {
            Stage::Confirm => "Confirm",
            Stage::DetectExisting => "Checking for an existing installation",
            Stage::Remove => "Removing existing installation",
            Stage::Headers => "Kernel headers",
            Stage::Updates => "System updates",
            Stage::Packages => "Build dependencies",
            Stage::Clone => "Fetching driver source",
            Stage::Build => "Building and registering the driver",
            Stage::Verify => "Verifying installation",
            Stage::Report => "Next steps",
            Stage::CleanupChoice => "Cleanup",
            Stage::RebootChoice => "Reboot",
        };
        f.write_str(title)
    }
}

/// How a run ended without a fatal error.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Finish {
    Completed,
    Cancelled,
}

pub struct Installer<'a> {
    ctx: StepContext<'a>,
    mode: Mode,
    detection: Detection,
    guard: WorkDirGuard,
    executed: Vec<Stage>,
}

impl<'a> Installer<'a> {
    pub fn new(
        config: &'a Config,
        runner: &'a dyn CommandRunner,
        prompt: &'a dyn Prompt,
        log: &'a StatusLog,
        mode: Mode,
    ) -> Self {
        Self {
            ctx: StepContext {
                config,
                runner,
                prompt,
                log,
            },
            mode,
            detection: Detection::default(),
            guard: WorkDirGuard::new(&config.work_dir),
            executed: Vec::new(),
        }
    }

    /// Stages that ran to completion (or were skipped), in order.
    pub fn executed(&self) -> &[Stage] {
        &self.executed
    }

    /// Whether the work directory will be deleted at shutdown.
    pub fn cleanup_pending(&self) -> bool {
        self.guard.will_remove()
    }

    /// Run preflight and the stage list for this mode.
    ///
    /// Fatal errors are recorded in the status log before being returned.
    pub fn run(&mut self) -> Result<Finish> {
        let result = self.run_stages();
        if let Err(e) = &result {
            self.ctx.log.error(format!("{:#}", e));
        }
        result
    }

    fn run_stages(&mut self) -> Result<Finish> {
        let target = self.ctx.config.dkms_target();
        self.ctx.log.info(match self.mode {
            Mode::Install => format!("=== Installing {} ===", target),
            Mode::Uninstall => format!("=== Uninstalling {} ===", target),
        });

        let host = preflight::run_preflight(self.ctx.runner, self.ctx.config, self.ctx.log)?;

        let flow = match self.mode {
            Mode::Install => INSTALL_FLOW,
            Mode::Uninstall => UNINSTALL_FLOW,
        };

        for &stage in flow {
            if signals::interrupted() {
                bail!(InstallError::Interrupted);
            }

            println!("\n==> {}", stage);
            let outcome = self.run_stage(stage, &host)?;
            self.executed.push(stage);

            match outcome {
                StepOutcome::Completed => {}
                StepOutcome::Skipped(reason) => {
                    tracing::debug!(%stage, %reason, "stage skipped");
                }
                StepOutcome::Cancelled => {
                    self.ctx.log.info("Cancelled by user");
                    return Ok(Finish::Cancelled);
                }
            }
        }

        self.ctx.log.info("Done");
        Ok(Finish::Completed)
    }

    fn run_stage(&mut self, stage: Stage, host: &HostFacts) -> Result<StepOutcome> {
        let ctx = &self.ctx;
        let config = ctx.config;

        match stage {
            Stage::Confirm => {
                let question = match self.mode {
                    Mode::Install => format!(
                        "Install {} from {}?",
                        config.dkms_target(),
                        config.repo_url
                    ),
                    Mode::Uninstall => {
                        format!("Remove {} and its configuration?", config.module_name)
                    }
                };
                Ok(if ctx.prompt.confirm(&question, true)? {
                    StepOutcome::Completed
                } else {
                    StepOutcome::Cancelled
                })
            }
            Stage::DetectExisting => {
                self.detection = detect::detect_existing(ctx);
                Ok(StepOutcome::Completed)
            }
            Stage::Remove => {
                if !self.detection.found() {
                    return Ok(StepOutcome::skipped("nothing installed"));
                }
                if self.mode == Mode::Install
                    && !ctx
                        .prompt
                        .confirm("Remove the existing installation before continuing?", true)?
                {
                    return Ok(StepOutcome::Cancelled);
                }

                remove::remove_installation(ctx, &self.detection);
                self.detection = detect::detect_existing(ctx);
                if self.detection.found() {
                    ctx.log.warn("Parts of the previous installation are still present");
                }
                Ok(StepOutcome::Completed)
            }
            Stage::Headers => headers::ensure_headers(ctx, host),
            Stage::Updates => updates::offer_upgrade(ctx, host),
            Stage::Packages => packages::install_missing(ctx, host),
            Stage::Clone => source::fetch_source(ctx, &mut self.guard),
            Stage::Build => build::build_and_register(ctx),
            Stage::Verify => Ok(verify::verify(ctx)),
            Stage::Report => Ok(report::print_report(ctx, host)),
            Stage::CleanupChoice => {
                // Only a tree this run cloned is ours to offer for deletion.
                if !self.guard.will_remove() {
                    ctx.log
                        .info(format!("Keeping source in {}", config.work_dir.display()));
                    return Ok(StepOutcome::skipped("source tree not cloned by this run"));
                }
                let question = format!("Delete the source directory {}?", config.work_dir.display());
                let remove = ctx.prompt.confirm(&question, true)?;
                self.guard.set_remove(remove);
                if !remove {
                    ctx.log
                        .info(format!("Keeping source in {}", config.work_dir.display()));
                }
                Ok(StepOutcome::Completed)
            }
            Stage::RebootChoice => {
                if !ctx.prompt.confirm("Reboot now to load the driver?", false)? {
                    return Ok(StepOutcome::skipped("reboot declined"));
                }
                self.guard.resolve();
                ctx.log.info("Rebooting");
                if let Err(e) = Cmd::sudo("reboot").run(ctx.runner) {
                    ctx.log.warn(format!("Reboot failed: {:#}", e));
                }
                Ok(StepOutcome::Completed)
            }
        }
    }
}
