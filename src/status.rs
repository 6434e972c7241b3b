//! Append-only status record.
//!
//! Each line is `<YYYY-MM-DD HH:MM:SS> - <message>`. The file is created on
//! first write and only ever opened in append mode.

use anyhow::{Context, Result};
use chrono::Local;
use std::fs::OpenOptions;
use std::io::Write;
use std::path::{Path, PathBuf};

const TIMESTAMP_FORMAT: &str = "%Y-%m-%d %H:%M:%S";

/// Console echo plus persisted status lines.
#[derive(Debug, Clone)]
pub struct StatusLog {
    path: PathBuf,
    echo: bool,
}

impl StatusLog {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            echo: true,
        }
    }

    /// Persist without printing to the console.
    pub fn quiet(mut self) -> Self {
        self.echo = false;
        self
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn info(&self, message: impl AsRef<str>) {
        let message = message.as_ref();
        if self.echo {
            println!("{}", message);
        }
        tracing::info!("{}", message);
        self.record(message);
    }

    pub fn warn(&self, message: impl AsRef<str>) {
        let message = message.as_ref();
        if self.echo {
            eprintln!("  ⚠ WARNING: {}", message);
        }
        tracing::warn!("{}", message);
        self.record(&format!("WARNING: {}", message));
    }

    pub fn error(&self, message: impl AsRef<str>) {
        let message = message.as_ref();
        if self.echo {
            eprintln!("  ✗ ERROR: {}", message);
        }
        tracing::error!("{}", message);
        self.record(&format!("ERROR: {}", message));
    }

    /// Failing to persist must never stop the installer.
    fn record(&self, message: &str) {
        if let Err(e) = self.append(message) {
            tracing::debug!("status record not written: {:#}", e);
        }
    }

    /// Append one timestamped line.
    pub fn append(&self, message: &str) -> Result<()> {
        let mut file = OpenOptions::new()
            .create(true)
            .append(true)
            .open(&self.path)
            .with_context(|| format!("Failed to open {}", self.path.display()))?;

        // Multi-line command errors stay on one record line.
        let flat = message.replace('\n', " | ");
        writeln!(
            file,
            "{} - {}",
            Local::now().format(TIMESTAMP_FORMAT),
            flat
        )
        .with_context(|| format!("Failed to write {}", self.path.display()))
    }
}
