//! Shared test utilities: a simulated Debian host and scripted prompts.

#![allow(dead_code)]

use std::cell::RefCell;
use std::collections::{HashMap, HashSet, VecDeque};
use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;
use tempfile::TempDir;

use anyhow::{bail, Result};
use nix::sys::signal::{raise, Signal};
use kmod_installer::config::Config;
use kmod_installer::error::InstallError;
use kmod_installer::process::{Cmd, CommandResult, CommandRunner};
use kmod_installer::prompt::Prompt;
use kmod_installer::status::StatusLog;

pub const KERNEL: &str = "6.8.0-45-generic";

/// Mutable state the fake host answers from.
#[derive(Debug, Clone)]
pub struct HostState {
    pub uid: u32,
    pub sudo_ok: bool,
    pub kernel: String,
    pub secure_boot: bool,
    /// Programs `locate` finds.
    pub programs: HashSet<String>,
    /// `lsmod` rows: (name, users).
    pub loaded: Vec<(String, Vec<String>)>,
    /// `dkms status` rows: (name, version, state).
    pub dkms: Vec<(String, String, String)>,
    /// What `dkms install <tree>` registers.
    pub dkms_package: (String, String),
    pub installed_packages: HashSet<String>,
    /// Packages apt-get can install.
    pub available_packages: HashSet<String>,
    pub upgradable: usize,
    /// Modules `modprobe -r` refuses to unload.
    pub unload_refused: HashSet<String>,
    /// Command-line prefixes (without sudo) forced to fail.
    pub failing: Vec<String>,
    /// Files `git clone` writes into the destination.
    pub clone_files: Vec<(String, String)>,
    /// Command-line prefix (without sudo) during which Ctrl-C is pressed.
    pub interrupt_on: Option<String>,
}

impl HostState {
    /// Ubuntu box with build tools present and nothing of the driver.
    pub fn debian() -> Self {
        let set = |items: &[&str]| items.iter().map(|s| s.to_string()).collect::<HashSet<_>>();
        Self {
            uid: 1000,
            sudo_ok: true,
            kernel: KERNEL.to_string(),
            secure_boot: false,
            programs: set(&["apt-get", "dkms", "git", "make", "mokutil"]),
            loaded: Vec::new(),
            dkms: Vec::new(),
            dkms_package: ("rtw88".to_string(), "0.6".to_string()),
            installed_packages: set(&["dkms", "git", "build-essential", "libelf-dev"]),
            available_packages: set(&[
                "dkms",
                "git",
                "build-essential",
                "libelf-dev",
                &format!("linux-headers-{}", KERNEL),
                "linux-headers-generic",
            ]),
            upgradable: 0,
            unload_refused: HashSet::new(),
            failing: Vec::new(),
            clone_files: vec![
                (
                    "rtw88.conf".to_string(),
                    "options rtw_core disable_lps_deep=y\n".to_string(),
                ),
                (
                    "dkms.conf".to_string(),
                    "PACKAGE_NAME=\"rtw88\"\nPACKAGE_VERSION=\"0.6\"\n".to_string(),
                ),
            ],
            interrupt_on: None,
        }
    }

    /// The rtw88 stack as a loaded system shows it.
    pub fn with_driver_loaded(mut self) -> Self {
        let users = |u: &[&str]| u.iter().map(|s| s.to_string()).collect::<Vec<_>>();
        self.loaded = vec![
            ("rtw_8822ce".into(), users(&[])),
            ("rtw_8822c".into(), users(&["rtw_8822ce"])),
            ("rtw_pci".into(), users(&["rtw_8822ce"])),
            ("rtw_core".into(), users(&["rtw_8822c", "rtw_pci", "rtw_8822ce"])),
            ("mac80211".into(), users(&["rtw_pci", "rtw_core"])),
        ];
        self.dkms = vec![(
            "rtw88".into(),
            "0.5".into(),
            "installed".into(),
        )];
        self
    }
}

/// A [`CommandRunner`] that simulates the host in memory and in a sandbox.
pub struct FakeHost {
    pub state: RefCell<HostState>,
    calls: RefCell<Vec<String>>,
}

impl FakeHost {
    pub fn new(state: HostState) -> Self {
        Self {
            state: RefCell::new(state),
            calls: RefCell::new(Vec::new()),
        }
    }

    /// Every command line run, in order.
    pub fn calls(&self) -> Vec<String> {
        self.calls.borrow().clone()
    }

    pub fn called(&self, prefix: &str) -> bool {
        self.calls.borrow().iter().any(|c| c.starts_with(prefix))
    }

    pub fn position(&self, prefix: &str) -> Option<usize> {
        self.calls.borrow().iter().position(|c| c.starts_with(prefix))
    }

    fn lsmod(&self) -> String {
        let mut out = String::from("Module                  Size  Used by\n");
        for (name, users) in &self.state.borrow().loaded {
            if users.is_empty() {
                out.push_str(&format!("{:<24}16384  0\n", name));
            } else {
                out.push_str(&format!(
                    "{:<24}16384  {} {}\n",
                    name,
                    users.len(),
                    users.join(",")
                ));
            }
        }
        out
    }

    fn simulate(&self, words: &[String]) -> CommandResult {
        let ok = |out: &str| CommandResult::new(0, out, "");
        let fail = |code: i32, err: &str| CommandResult::new(code, "", err);
        let w: Vec<&str> = words.iter().map(String::as_str).collect();
        let mut state = self.state.borrow_mut();

        match w.as_slice() {
            ["id", "-u"] => ok(&format!("{}\n", state.uid)),
            ["sudo", "-v"] => {
                if state.sudo_ok {
                    ok("")
                } else {
                    fail(1, "Sorry, try again.")
                }
            }
            ["uname", "-r"] => ok(&format!("{}\n", state.kernel)),
            ["mokutil", "--sb-state"] => ok(if state.secure_boot {
                "SecureBoot enabled\n"
            } else {
                "SecureBoot disabled\n"
            }),
            ["lsmod"] => {
                drop(state);
                ok(&self.lsmod())
            }
            ["dkms", "status", name] => {
                let out: String = state
                    .dkms
                    .iter()
                    .filter(|(n, _, _)| n == name)
                    .map(|(n, v, s)| format!("{}/{}, {}, x86_64: {}\n", n, v, state.kernel, s))
                    .collect();
                ok(&out)
            }
            ["dkms", "remove", target, "--all"] => {
                let Some((name, version)) = target.split_once('/') else {
                    return fail(1, "bad target");
                };
                let before = state.dkms.len();
                state.dkms.retain(|(n, v, _)| !(n == name && v == version));
                if state.dkms.len() == before {
                    fail(3, "Error! The module/version combo is not located in the DKMS tree.")
                } else {
                    ok("Deleting module")
                }
            }
            ["dkms", "install", tree] => {
                if !Path::new(tree).join("dkms.conf").exists() {
                    return fail(1, "Error! Could not locate dkms.conf file.");
                }
                let (name, version) = state.dkms_package.clone();
                state.dkms.push((name, version, "installed".into()));
                ok("")
            }
            ["modprobe", "-r", module] => {
                if state.unload_refused.contains(*module) {
                    return fail(1, &format!("modprobe: FATAL: Module {} is in use.", module));
                }
                state.loaded.retain(|(n, _)| n != module);
                for (_, users) in state.loaded.iter_mut() {
                    users.retain(|u| u != module);
                }
                ok("")
            }
            ["rm", "-rf", path] => {
                let _ = fs::remove_dir_all(path);
                ok("")
            }
            ["rm", "-f", path] => {
                let _ = fs::remove_file(path);
                ok("")
            }
            ["cp", from, to] => match fs::copy(from, to) {
                Ok(_) => ok(""),
                Err(e) => fail(1, &e.to_string()),
            },
            ["make", "install_fw"] => ok(""),
            ["git", "clone", "--depth", "1", _url, dest] => {
                let dest = PathBuf::from(dest);
                if dest.exists() {
                    return fail(128, "fatal: destination path already exists");
                }
                fs::create_dir_all(&dest).unwrap();
                for (file, content) in &state.clone_files {
                    fs::write(dest.join(file), content).unwrap();
                }
                ok("")
            }
            ["apt-get", "update"] => ok(""),
            ["apt-get", "install", "-y", packages @ ..] => {
                if packages.iter().all(|p| state.available_packages.contains(*p)) {
                    for p in packages {
                        state.installed_packages.insert(p.to_string());
                    }
                    ok("")
                } else {
                    fail(100, "E: Unable to locate package")
                }
            }
            ["apt-get", "upgrade", "-y"] => {
                state.upgradable = 0;
                ok("")
            }
            ["apt", "list", "--upgradable"] => {
                let mut out = String::from("Listing... Done\n");
                for i in 0..state.upgradable {
                    out.push_str(&format!(
                        "pkg{}/noble-updates 1.1 amd64 [upgradable from: 1.0]\n",
                        i
                    ));
                }
                ok(&out)
            }
            ["dpkg-query", "-W", "-f=${Status}", package] => {
                if state.installed_packages.contains(*package) {
                    ok("install ok installed")
                } else {
                    fail(1, &format!("dpkg-query: no packages found matching {}", package))
                }
            }
            ["reboot"] => ok(""),
            _ => fail(127, "command not simulated"),
        }
    }
}

impl CommandRunner for FakeHost {
    fn execute(&self, cmd: &Cmd) -> Result<CommandResult> {
        let line = cmd.to_string();
        self.calls.borrow_mut().push(line);

        let mut words: Vec<String> = std::iter::once(cmd.program().to_string())
            .chain(cmd.get_args().iter().cloned())
            .collect();
        if words[0] == "sudo" && words.len() > 1 && !words[1].starts_with('-') {
            words.remove(0);
        }

        let inner = words.join(" ");
        let interrupt = self
            .state
            .borrow()
            .interrupt_on
            .as_ref()
            .is_some_and(|prefix| inner.starts_with(prefix.as_str()));
        if interrupt {
            raise(Signal::SIGINT).expect("Failed to raise SIGINT");
        }

        if self
            .state
            .borrow()
            .failing
            .iter()
            .any(|prefix| inner.starts_with(prefix.as_str()))
        {
            return Ok(CommandResult::new(1, "", "forced failure"));
        }

        Ok(self.simulate(&words))
    }

    fn locate(&self, program: &str) -> Option<PathBuf> {
        self.state
            .borrow()
            .programs
            .contains(program)
            .then(|| PathBuf::from("/usr/bin").join(program))
    }

    fn keep_alive(&self, cmd: Cmd, _every: Duration) {
        self.calls.borrow_mut().push(format!("keepalive: {}", cmd));
    }
}

/// Answers prompts from a queue, falling back to each prompt's default.
#[derive(Default)]
pub struct ScriptedPrompt {
    answers: RefCell<VecDeque<bool>>,
    asked: RefCell<Vec<String>>,
    /// Zero-based question at which Ctrl-C lands.
    interrupt_at: Option<usize>,
}

impl ScriptedPrompt {
    pub fn new(answers: &[bool]) -> Self {
        Self {
            answers: RefCell::new(answers.iter().copied().collect()),
            ..Self::default()
        }
    }

    /// Ctrl-C while question number `index` is open.
    pub fn interrupt_at(mut self, index: usize) -> Self {
        self.interrupt_at = Some(index);
        self
    }

    pub fn asked(&self) -> Vec<String> {
        self.asked.borrow().clone()
    }
}

impl Prompt for ScriptedPrompt {
    fn confirm(&self, question: &str, default: bool) -> Result<bool> {
        let index = self.asked.borrow().len();
        self.asked.borrow_mut().push(question.to_string());
        if self.interrupt_at == Some(index) {
            bail!(InstallError::Interrupted);
        }
        Ok(self.answers.borrow_mut().pop_front().unwrap_or(default))
    }
}

/// Sandbox with every installer path redirected into a temp directory.
pub struct TestEnv {
    /// Temporary directory (kept alive for lifetime of TestEnv)
    pub _temp_dir: TempDir,
    pub config: Config,
    pub log: StatusLog,
}

impl TestEnv {
    pub fn new() -> Self {
        let temp_dir = TempDir::new().expect("Failed to create temp dir");
        let root = temp_dir.path();
        let home = root.join("home");

        let dirs = ["home", "lib/modules", "etc/modprobe.d", "usr/src"];
        for dir in dirs {
            fs::create_dir_all(root.join(dir)).expect("Failed to create sandbox dir");
        }

        let vars: HashMap<String, String> = [
            ("MODULES_ROOT", root.join("lib/modules")),
            ("MODPROBE_DIR", root.join("etc/modprobe.d")),
            ("DKMS_SOURCE_ROOT", root.join("usr/src")),
            ("DRIVER_STATUS_FILE", home.join("status.log")),
        ]
        .into_iter()
        .map(|(k, v)| (k.to_string(), v.to_string_lossy().into_owned()))
        .collect();

        let config = Config::from_vars(&vars, &home);
        let log = StatusLog::new(&config.status_file).quiet();

        Self {
            _temp_dir: temp_dir,
            config,
            log,
        }
    }

    /// Pretend the running kernel's headers are installed.
    pub fn install_headers(&self) {
        fs::create_dir_all(self.config.header_dir(KERNEL)).expect("Failed to create header dir");
    }

    pub fn status_lines(&self) -> Vec<String> {
        fs::read_to_string(&self.config.status_file)
            .unwrap_or_default()
            .lines()
            .map(str::to_string)
            .collect()
    }
}
