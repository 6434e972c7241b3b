//! Preflight check results and the facts they establish.

use crate::distro::PackageManager;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CheckStatus {
    Pass,
    /// The installer cannot continue.
    Fail,
    /// Usable, but something later may need attention.
    Warn,
}

impl CheckStatus {
    fn marker(self) -> (&'static str, &'static str) {
        match self {
            Self::Pass => ("✓", "PASS"),
            Self::Fail => ("✗", "FAIL"),
            Self::Warn => ("⚠", "WARN"),
        }
    }
}

/// Outcome of one preflight check.
#[derive(Debug, Clone)]
pub struct CheckResult {
    pub name: String,
    pub status: CheckStatus,
    pub details: Option<String>,
}

impl CheckResult {
    fn new(name: impl Into<String>, status: CheckStatus, details: Option<String>) -> Self {
        Self {
            name: name.into(),
            status,
            details,
        }
    }

    pub fn pass(name: impl Into<String>) -> Self {
        Self::new(name, CheckStatus::Pass, None)
    }

    pub fn pass_with(name: impl Into<String>, details: impl Into<String>) -> Self {
        Self::new(name, CheckStatus::Pass, Some(details.into()))
    }

    pub fn fail(name: impl Into<String>, details: impl Into<String>) -> Self {
        Self::new(name, CheckStatus::Fail, Some(details.into()))
    }

    pub fn warn(name: impl Into<String>, details: impl Into<String>) -> Self {
        Self::new(name, CheckStatus::Warn, Some(details.into()))
    }
}

/// Facts discovered about the host, shared by later stages.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HostFacts {
    pub package_manager: PackageManager,
    pub kernel: String,
    pub secure_boot: bool,
}

/// Checks in the order they ran.
#[derive(Debug, Default)]
pub struct PreflightReport {
    pub checks: Vec<CheckResult>,
}

impl PreflightReport {
    pub fn push(&mut self, check: CheckResult) {
        self.checks.push(check);
    }

    pub fn count(&self, status: CheckStatus) -> usize {
        self.checks.iter().filter(|c| c.status == status).count()
    }

    pub fn print(&self) {
        for check in &self.checks {
            let (icon, label) = check.status.marker();
            match &check.details {
                Some(details) => println!("  {} [{}] {}: {}", icon, label, check.name, details),
                None => println!("  {} [{}] {}", icon, label, check.name),
            }
        }

        match (self.count(CheckStatus::Fail), self.count(CheckStatus::Warn)) {
            (0, 0) => {}
            (0, warned) => println!("  {} warning(s)", warned),
            (failed, _) => println!("  {} check(s) failed", failed),
        }
        println!();
    }
}
