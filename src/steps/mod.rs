//! Installer steps.
//!
//! Each step is a function over a [`StepContext`] returning a
//! [`StepOutcome`]. Fatal problems come back as `Err`; recoverable ones are
//! recorded as warnings and the step still succeeds.

pub mod build;
pub mod detect;
pub mod headers;
pub mod packages;
pub mod remove;
pub mod report;
pub mod source;
pub mod updates;
pub mod verify;

use crate::config::Config;
use crate::process::CommandRunner;
use crate::prompt::Prompt;
use crate::status::StatusLog;

/// Everything a step may touch.
pub struct StepContext<'a> {
    pub config: &'a Config,
    pub runner: &'a dyn CommandRunner,
    pub prompt: &'a dyn Prompt,
    pub log: &'a StatusLog,
}

/// How a step ended when it did not fail.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StepOutcome {
    /// The step did its work.
    Completed,
    /// Nothing to do, or the user chose to skip it.
    Skipped(String),
    /// The user declined a gate that ends the run.
    Cancelled,
}

impl StepOutcome {
    pub fn skipped(reason: impl Into<String>) -> Self {
        Self::Skipped(reason.into())
    }
}
