//! Fatal installer errors.

use std::path::PathBuf;

/// Conditions that abort the run with exit code 1.
#[derive(Debug, thiserror::Error)]
pub enum InstallError {
    #[error("Do not run this installer as root; it asks for sudo when it needs it")]
    RunningAsRoot,

    #[error("Could not acquire sudo privileges")]
    PrivilegesUnavailable,

    #[error("No supported package manager found (looked for apt-get, dnf, pacman, zypper)")]
    NoPackageManager,

    #[error("Kernel headers for {kernel} could not be installed")]
    HeadersUnavailable { kernel: String },

    #[error("Package installation failed")]
    PackagesFailed,

    #[error("System upgrade failed")]
    UpgradeFailed,

    #[error("Failed to clone {url} into {}", .dest.display())]
    CloneFailed { url: String, dest: PathBuf },

    #[error("DKMS build of {target} failed")]
    BuildFailed { target: String },

    #[error("Interrupted")]
    Interrupted,
}
