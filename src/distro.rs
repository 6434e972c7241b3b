//! Package manager detection and distro-specific package tables.

use anyhow::{bail, Result};
use std::fmt;

use crate::process::{Cmd, CommandRunner};

/// Supported host package managers, in detection order.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PackageManager {
    Apt,
    Dnf,
    Pacman,
    Zypper,
}

/// One way of getting kernel headers onto the host.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HeaderCandidate {
    /// Human-readable method, used in logs.
    pub label: &'static str,
    pub package: String,
}

impl PackageManager {
    pub const ALL: [PackageManager; 4] = [Self::Apt, Self::Dnf, Self::Pacman, Self::Zypper];

    /// Executable whose presence identifies this package manager.
    pub fn program(self) -> &'static str {
        match self {
            Self::Apt => "apt-get",
            Self::Dnf => "dnf",
            Self::Pacman => "pacman",
            Self::Zypper => "zypper",
        }
    }

    /// First package manager found in PATH.
    pub fn detect(runner: &dyn CommandRunner) -> Option<Self> {
        Self::ALL
            .into_iter()
            .find(|pm| runner.locate(pm.program()).is_some())
    }

    /// Build tools the driver needs besides kernel headers.
    pub fn default_packages(self) -> &'static [&'static str] {
        match self {
            Self::Apt => &["dkms", "git", "build-essential", "libelf-dev"],
            Self::Dnf => &["dkms", "git", "make", "gcc", "elfutils-libelf-devel"],
            Self::Pacman => &["dkms", "git", "base-devel"],
            Self::Zypper => &["dkms", "git", "make", "gcc", "libelf-devel"],
        }
    }

    /// Header packages to try, most specific first.
    pub fn header_candidates(self, kernel: &str) -> Vec<HeaderCandidate> {
        let candidate = |label, package: String| HeaderCandidate { label, package };
        match self {
            Self::Apt => vec![
                candidate("Raspberry Pi headers", "raspberrypi-kernel-headers".into()),
                candidate("exact kernel headers", format!("linux-headers-{}", kernel)),
                candidate("generic kernel headers", "linux-headers-generic".into()),
            ],
            Self::Dnf => vec![
                candidate("exact kernel headers", format!("kernel-devel-{}", kernel)),
                candidate("generic kernel headers", "kernel-devel".into()),
            ],
            Self::Pacman => vec![candidate("generic kernel headers", "linux-headers".into())],
            Self::Zypper => vec![
                candidate("exact kernel headers", format!("kernel-default-devel-{}", kernel)),
                candidate("generic kernel headers", "kernel-default-devel".into()),
            ],
        }
    }

    /// Refresh the package index.
    pub fn refresh_cmd(self) -> Cmd {
        match self {
            Self::Apt => Cmd::sudo("apt-get").arg("update"),
            Self::Dnf => Cmd::sudo("dnf").arg("makecache"),
            Self::Pacman => Cmd::sudo("pacman").arg("-Sy"),
            Self::Zypper => Cmd::sudo("zypper").args(["--non-interactive", "refresh"]),
        }
        .interactive()
    }

    /// Install packages without further prompts.
    pub fn install_cmd<S: AsRef<str>>(self, packages: &[S]) -> Cmd {
        let names = packages.iter().map(|p| p.as_ref());
        match self {
            Self::Apt => Cmd::sudo("apt-get").args(["install", "-y"]).args(names),
            Self::Dnf => Cmd::sudo("dnf").args(["install", "-y"]).args(names),
            Self::Pacman => Cmd::sudo("pacman")
                .args(["-S", "--needed", "--noconfirm"])
                .args(names),
            Self::Zypper => Cmd::sudo("zypper")
                .args(["--non-interactive", "install"])
                .args(names),
        }
        .interactive()
    }

    /// Upgrade every installed package.
    pub fn upgrade_cmd(self) -> Cmd {
        match self {
            Self::Apt => Cmd::sudo("apt-get").args(["upgrade", "-y"]),
            Self::Dnf => Cmd::sudo("dnf").args(["upgrade", "-y"]),
            Self::Pacman => Cmd::sudo("pacman").args(["-Su", "--noconfirm"]),
            Self::Zypper => Cmd::sudo("zypper").args(["--non-interactive", "update"]),
        }
        .interactive()
    }

    /// Whether `package` is currently installed.
    pub fn is_installed(self, runner: &dyn CommandRunner, package: &str) -> bool {
        let query = match self {
            Self::Apt => Cmd::new("dpkg-query").args(["-W", "-f=${Status}", package]),
            Self::Dnf | Self::Zypper => Cmd::new("rpm").args(["-q", package]),
            Self::Pacman => Cmd::new("pacman").args(["-Q", package]),
        };

        match query.allow_fail().run(runner) {
            Ok(result) if result.success() => match self {
                Self::Apt => result.stdout.contains("install ok installed"),
                _ => true,
            },
            _ => false,
        }
    }

    /// Packages from `required` that are not installed yet, in order.
    pub fn missing_packages<S: AsRef<str>>(
        self,
        runner: &dyn CommandRunner,
        required: &[S],
    ) -> Vec<String> {
        required
            .iter()
            .map(|p| p.as_ref())
            .filter(|p| !self.is_installed(runner, p))
            .map(str::to_string)
            .collect()
    }

    /// Number of packages with pending upgrades.
    pub fn upgradable_count(self, runner: &dyn CommandRunner) -> Result<usize> {
        match self {
            Self::Apt => {
                let result = Cmd::new("apt")
                    .args(["list", "--upgradable"])
                    .error_msg("Could not list upgradable packages")
                    .run(runner)?;
                Ok(count_apt_upgradable(&result.stdout))
            }
            Self::Dnf => {
                // check-update exits 100 when updates exist.
                let result = Cmd::new("dnf")
                    .args(["-q", "check-update"])
                    .allow_fail()
                    .run(runner)?;
                match result.code() {
                    0 => Ok(0),
                    100 => Ok(count_listed_packages(&result.stdout)),
                    code => bail!("dnf check-update failed (exit code {})", code),
                }
            }
            Self::Pacman => {
                // -Qu exits 1 when nothing is upgradable.
                let result = Cmd::new("pacman").arg("-Qu").allow_fail().run(runner)?;
                Ok(count_listed_packages(&result.stdout))
            }
            Self::Zypper => {
                let result = Cmd::new("zypper")
                    .args(["--quiet", "list-updates"])
                    .error_msg("Could not list upgradable packages")
                    .run(runner)?;
                Ok(result
                    .stdout
                    .lines()
                    .filter(|l| l.trim_start().starts_with("v "))
                    .count())
            }
        }
    }
}

impl fmt::Display for PackageManager {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.program())
    }
}

/// Count entries in `apt list --upgradable` output.
pub fn count_apt_upgradable(output: &str) -> usize {
    output
        .lines()
        .filter(|l| l.contains("[upgradable from"))
        .count()
}

/// Count `name version ...` rows, skipping blanks and section headers.
fn count_listed_packages(output: &str) -> usize {
    output
        .lines()
        .filter(|l| l.split_whitespace().count() >= 2 && !l.ends_with(':'))
        .count()
}
