//! Centralized command execution with consistent error handling.
//!
//! Every external tool the installer touches (package managers, dkms, git,
//! modprobe, mokutil) is reached through a [`Cmd`] handed to a
//! [`CommandRunner`]. The real runner spawns processes; tests substitute a
//! fake host that answers from in-memory state.

use anyhow::{bail, Context, Result};
use std::fmt;
use std::path::{Path, PathBuf};
use std::process::{Command, Stdio};
use std::thread;
use std::time::Duration;

/// Result of a command execution.
#[derive(Debug, Clone, Default)]
pub struct CommandResult {
    code: i32,
    /// Captured stdout (empty for interactive commands).
    pub stdout: String,
    /// Captured stderr (empty for interactive commands).
    pub stderr: String,
}

impl CommandResult {
    pub fn new(code: i32, stdout: impl Into<String>, stderr: impl Into<String>) -> Self {
        Self {
            code,
            stdout: stdout.into(),
            stderr: stderr.into(),
        }
    }

    /// Returns true if the command exited successfully.
    pub fn success(&self) -> bool {
        self.code == 0
    }

    /// Exit code, or -1 if terminated by signal.
    pub fn code(&self) -> i32 {
        self.code
    }

    /// Get stdout, trimmed of whitespace.
    pub fn stdout_trimmed(&self) -> &str {
        self.stdout.trim()
    }

    /// Get stderr, trimmed of whitespace.
    pub fn stderr_trimmed(&self) -> &str {
        self.stderr.trim()
    }
}

/// Executes commands on behalf of the installer.
pub trait CommandRunner {
    /// Run the command. `Err` means it could not be started at all; a
    /// non-zero exit is reported through [`CommandResult::code`].
    fn execute(&self, cmd: &Cmd) -> Result<CommandResult>;

    /// Locate a program in PATH.
    fn locate(&self, program: &str) -> Option<PathBuf>;

    /// Re-run `cmd` every `every` for the rest of the process lifetime.
    fn keep_alive(&self, _cmd: Cmd, _every: Duration) {}
}

/// Builder for configuring command execution.
#[derive(Debug, Clone)]
pub struct Cmd {
    program: String,
    args: Vec<String>,
    current_dir: Option<PathBuf>,
    /// Inherit the terminal instead of capturing output.
    interactive: bool,
    /// If true, don't fail on non-zero exit.
    allow_fail: bool,
    /// Custom error message prefix.
    error_prefix: Option<String>,
}

impl Cmd {
    /// Create a new command builder.
    pub fn new(program: impl AsRef<str>) -> Self {
        Self {
            program: program.as_ref().to_string(),
            args: Vec::new(),
            current_dir: None,
            interactive: false,
            allow_fail: false,
            error_prefix: None,
        }
    }

    /// Create a command that runs `program` through sudo.
    pub fn sudo(program: impl AsRef<str>) -> Self {
        Self::new("sudo").arg(program)
    }

    /// Add a single argument.
    pub fn arg(mut self, arg: impl AsRef<str>) -> Self {
        self.args.push(arg.as_ref().to_string());
        self
    }

    /// Add multiple arguments.
    pub fn args<I, S>(mut self, args: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        for arg in args {
            self.args.push(arg.as_ref().to_string());
        }
        self
    }

    /// Add a path as an argument.
    pub fn arg_path(mut self, path: &Path) -> Self {
        self.args.push(path.to_string_lossy().into_owned());
        self
    }

    /// Set the working directory.
    pub fn dir(mut self, dir: &Path) -> Self {
        self.current_dir = Some(dir.to_path_buf());
        self
    }

    /// Stream output to the terminal (package installs, builds, clones).
    pub fn interactive(mut self) -> Self {
        self.interactive = true;
        self
    }

    /// Allow non-zero exit codes without failing.
    pub fn allow_fail(mut self) -> Self {
        self.allow_fail = true;
        self
    }

    /// Set a custom error message prefix.
    pub fn error_msg(mut self, msg: impl AsRef<str>) -> Self {
        self.error_prefix = Some(msg.as_ref().to_string());
        self
    }

    pub fn program(&self) -> &str {
        &self.program
    }

    pub fn get_args(&self) -> &[String] {
        &self.args
    }

    pub fn current_dir(&self) -> Option<&Path> {
        self.current_dir.as_deref()
    }

    /// The tool actually being run, looking through a sudo wrapper.
    pub fn tool_name(&self) -> &str {
        match self.args.first() {
            Some(first) if self.program == "sudo" && !first.starts_with('-') => first,
            _ => &self.program,
        }
    }

    pub fn is_interactive(&self) -> bool {
        self.interactive
    }

    /// Run the command through `runner`, failing on non-zero exit unless
    /// [`Cmd::allow_fail`] was set.
    pub fn run(self, runner: &dyn CommandRunner) -> Result<CommandResult> {
        tracing::debug!(command = %self, "running");
        let result = runner.execute(&self)?;
        tracing::debug!(command = %self, code = result.code, "finished");

        if !self.allow_fail && !result.success() {
            let prefix = self
                .error_prefix
                .clone()
                .unwrap_or_else(|| format!("'{}' failed", self.tool_name()));

            let stderr = result.stderr_trimmed();
            if stderr.is_empty() {
                bail!("{} (exit code {})", prefix, result.code());
            } else {
                bail!("{} (exit code {}):\n{}", prefix, result.code(), stderr);
            }
        }

        Ok(result)
    }

    /// Run and report only whether the command exited successfully.
    ///
    /// A command that cannot be started counts as a failure.
    pub fn succeeds(self, runner: &dyn CommandRunner) -> bool {
        self.allow_fail()
            .run(runner)
            .map(|r| r.success())
            .unwrap_or(false)
    }
}

impl fmt::Display for Cmd {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.program)?;
        for arg in &self.args {
            write!(f, " {}", arg)?;
        }
        Ok(())
    }
}

/// Runs commands on the real host.
#[derive(Debug, Default, Clone, Copy)]
pub struct SystemRunner;

impl CommandRunner for SystemRunner {
    fn execute(&self, job: &Cmd) -> Result<CommandResult> {
        let mut cmd = Command::new(&job.program);
        cmd.args(&job.args);

        if let Some(ref dir) = job.current_dir {
            cmd.current_dir(dir);
        }

        if job.interactive {
            cmd.stdin(Stdio::inherit());
            cmd.stdout(Stdio::inherit());
            cmd.stderr(Stdio::inherit());

            let status = cmd.status().with_context(|| {
                format!("Failed to execute '{}'. Is it installed?", job.program)
            })?;

            return Ok(CommandResult::new(status.code().unwrap_or(-1), "", ""));
        }

        let output = cmd.output().with_context(|| {
            format!("Failed to execute '{}'. Is it installed?", job.program)
        })?;

        Ok(CommandResult {
            code: output.status.code().unwrap_or(-1),
            stdout: String::from_utf8_lossy(&output.stdout).into_owned(),
            stderr: String::from_utf8_lossy(&output.stderr).into_owned(),
        })
    }

    fn locate(&self, program: &str) -> Option<PathBuf> {
        which::which(program).ok()
    }

    fn keep_alive(&self, job: Cmd, every: Duration) {
        // Detached: the thread dies with the process.
        let spawned = thread::Builder::new()
            .name("sudo-keepalive".into())
            .spawn(move || loop {
                thread::sleep(every);
                let ok = Command::new(&job.program)
                    .args(&job.args)
                    .stdin(Stdio::null())
                    .stdout(Stdio::null())
                    .stderr(Stdio::null())
                    .status()
                    .map(|s| s.success())
                    .unwrap_or(false);
                if !ok {
                    tracing::debug!(command = %job, "keepalive refresh failed");
                }
            });
        if let Err(e) = spawned {
            tracing::warn!("could not start keepalive thread: {}", e);
        }
    }
}
