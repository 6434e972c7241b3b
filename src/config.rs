//! Installer configuration.
//!
//! Built-in defaults describe the rtw88 driver. Every value can be
//! overridden from a `.env` file or the environment; environment variables
//! take precedence over `.env` (dotenvy never overwrites existing vars).

use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::time::Duration;

/// Default git URL for the driver source.
pub const DEFAULT_REPO_URL: &str = "https://github.com/lwfinger/rtw88.git";
/// DKMS package name.
pub const DEFAULT_MODULE_NAME: &str = "rtw88";
/// DKMS package version, as declared in the tree's dkms.conf.
pub const DEFAULT_MODULE_VERSION: &str = "0.6";
/// Prefix shared by every kernel module the driver loads.
pub const DEFAULT_MODULE_PREFIX: &str = "rtw_";

/// Installer configuration.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Config {
    /// Git URL of the driver source.
    pub repo_url: String,
    /// DKMS package name.
    pub module_name: String,
    /// DKMS package version.
    pub module_version: String,
    /// Prefix matched against `lsmod` module names.
    pub module_prefix: String,
    /// Modprobe config shipped in the source tree.
    pub conf_file: String,
    /// Clone target.
    pub work_dir: PathBuf,
    /// Append-only status record.
    pub status_file: PathBuf,
    /// Root holding `<kernel>/build` header trees (default: /lib/modules)
    pub modules_root: PathBuf,
    /// Destination for the modprobe config (default: /etc/modprobe.d)
    pub modprobe_dir: PathBuf,
    /// Where DKMS keeps registered sources (default: /usr/src)
    pub dkms_source_root: PathBuf,
    /// DKMS signing key to enroll under Secure Boot.
    pub mok_key: PathBuf,
    /// Replaces the package manager's default build-tool list when set.
    pub required_packages: Option<Vec<String>>,
    /// How often the sudo timestamp is refreshed.
    pub keepalive_interval: Duration,
}

impl Config {
    /// Load configuration from the process environment.
    ///
    /// Call `dotenvy::dotenv()` first to pick up a `.env` file.
    pub fn load() -> Self {
        let vars: HashMap<String, String> = std::env::vars().collect();
        let home = dirs::home_dir().unwrap_or_else(std::env::temp_dir);
        Self::from_vars(&vars, &home)
    }

    /// Build configuration from a variable map, with relative paths and
    /// defaults resolved against `home`.
    pub fn from_vars(vars: &HashMap<String, String>, home: &Path) -> Self {
        let get = |key: &str| {
            vars.get(key)
                .map(|v| v.trim())
                .filter(|v| !v.is_empty())
                .map(str::to_string)
        };
        let path = |key: &str, default: PathBuf| {
            get(key)
                .map(|s| {
                    let p = PathBuf::from(s);
                    if p.is_absolute() {
                        p
                    } else {
                        home.join(p)
                    }
                })
                .unwrap_or(default)
        };

        let module_name = get("DRIVER_NAME").unwrap_or_else(|| DEFAULT_MODULE_NAME.to_string());
        let module_version =
            get("DRIVER_VERSION").unwrap_or_else(|| DEFAULT_MODULE_VERSION.to_string());

        let required_packages = get("DRIVER_REQUIRED_PACKAGES").map(|list| {
            list.split(',')
                .map(str::trim)
                .filter(|p| !p.is_empty())
                .map(str::to_string)
                .collect::<Vec<_>>()
        });

        let keepalive_secs = get("SUDO_KEEPALIVE_SECS")
            .and_then(|s| s.parse::<u64>().ok())
            .filter(|&s| s > 0)
            .unwrap_or(60);

        Self {
            repo_url: get("DRIVER_REPO_URL").unwrap_or_else(|| DEFAULT_REPO_URL.to_string()),
            module_prefix: get("DRIVER_MODULE_PREFIX")
                .unwrap_or_else(|| DEFAULT_MODULE_PREFIX.to_string()),
            conf_file: get("DRIVER_CONF_FILE").unwrap_or_else(|| format!("{}.conf", module_name)),
            work_dir: path("DRIVER_WORK_DIR", home.join(&module_name)),
            status_file: path(
                "DRIVER_STATUS_FILE",
                home.join(format!(".{}-install.log", module_name)),
            ),
            modules_root: path("MODULES_ROOT", PathBuf::from("/lib/modules")),
            modprobe_dir: path("MODPROBE_DIR", PathBuf::from("/etc/modprobe.d")),
            dkms_source_root: path("DKMS_SOURCE_ROOT", PathBuf::from("/usr/src")),
            mok_key: path("MOK_KEY_PATH", PathBuf::from("/var/lib/dkms/mok.pub")),
            required_packages,
            keepalive_interval: Duration::from_secs(keepalive_secs),
            module_name,
            module_version,
        }
    }

    /// `name/version`, as DKMS addresses a package.
    pub fn dkms_target(&self) -> String {
        format!("{}/{}", self.module_name, self.module_version)
    }

    /// Installed modprobe config path.
    pub fn installed_conf(&self) -> PathBuf {
        self.modprobe_dir.join(&self.conf_file)
    }

    /// Kernel build directory that header packages provide.
    pub fn header_dir(&self, kernel: &str) -> PathBuf {
        self.modules_root.join(kernel).join("build")
    }

    /// DKMS source tree for a given version.
    pub fn dkms_source_dir(&self, version: &str) -> PathBuf {
        self.dkms_source_root
            .join(format!("{}-{}", self.module_name, version))
    }

    /// Print configuration for debugging.
    pub fn print(&self) {
        println!("Configuration:");
        println!("  DRIVER_REPO_URL: {}", self.repo_url);
        println!("  DRIVER: {}", self.dkms_target());
        println!("  DRIVER_WORK_DIR: {}", self.work_dir.display());
        println!("  DRIVER_STATUS_FILE: {}", self.status_file.display());
    }
}
