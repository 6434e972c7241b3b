//! kmod-installer - guided installer for out-of-tree DKMS drivers.
//!
//! Installs kernel headers and build tools, clones the driver source,
//! builds and registers it with DKMS, and installs its firmware and
//! modprobe configuration. `--uninstall` removes a previous installation.

use clap::error::ErrorKind;
use clap::Parser;
use std::env;
use std::process::ExitCode;

use kmod_installer::config::Config;
use kmod_installer::installer::{Finish, Installer, Mode};
use kmod_installer::process::SystemRunner;
use kmod_installer::prompt::TerminalPrompt;
use kmod_installer::signals;
use kmod_installer::status::StatusLog;

#[derive(Parser, Debug)]
#[command(name = "kmod-installer", version)]
#[command(about = "Build, register and configure an out-of-tree DKMS kernel driver")]
#[command(
    after_help = "CONFIGURATION:\n  DRIVER_REPO_URL, DRIVER_NAME, DRIVER_VERSION, DRIVER_WORK_DIR and\n  DRIVER_STATUS_FILE may be set in the environment or a .env file."
)]
struct Cli {
    /// Answer every prompt with its default (unattended)
    #[arg(short = 'y', long = "yes")]
    yes: bool,

    /// Remove an existing installation instead of installing
    #[arg(short, long)]
    uninstall: bool,

    /// Show every command as it runs
    #[arg(short, long)]
    verbose: bool,
}

fn main() -> ExitCode {
    let cli = match Cli::try_parse() {
        Ok(cli) => cli,
        Err(e) => {
            let _ = e.print();
            return match e.kind() {
                ErrorKind::DisplayHelp | ErrorKind::DisplayVersion => ExitCode::SUCCESS,
                _ => ExitCode::FAILURE,
            };
        }
    };

    let default_level = if cli.verbose { "debug" } else { "warn" };
    let env_filter = env::var("RUST_LOG").unwrap_or_else(|_| default_level.to_string());
    tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from(env_filter))
        .with_target(false)
        .compact()
        .init();

    // Load .env if present
    dotenvy::dotenv().ok();
    let config = Config::load();
    if cli.verbose {
        config.print();
    }

    if let Err(e) = signals::install_interrupt_handler() {
        tracing::warn!("could not install Ctrl-C handler: {}", e);
    }

    let mode = if cli.uninstall {
        Mode::Uninstall
    } else {
        Mode::Install
    };
    let runner = SystemRunner;
    let prompt = TerminalPrompt::new(cli.yes);
    let log = StatusLog::new(&config.status_file);

    let mut installer = Installer::new(&config, &runner, &prompt, &log, mode);
    let outcome = installer.run();
    // Deferred work-dir cleanup runs here, before the process exits.
    drop(installer);

    match outcome {
        Ok(Finish::Completed) | Ok(Finish::Cancelled) => ExitCode::SUCCESS,
        Err(e) => {
            let action = match mode {
                Mode::Install => "Installation",
                Mode::Uninstall => "Uninstall",
            };
            eprintln!("\n{} failed: {:#}", action, e);
            eprintln!("Status log: {}", config.status_file.display());
            ExitCode::FAILURE
        }
    }
}
