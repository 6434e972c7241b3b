//! Deferred cleanup of the cloned work directory.

use std::fs;
use std::path::{Path, PathBuf};

/// Removes the work directory at shutdown when armed.
///
/// Armed when this run creates the directory, so a failed or interrupted
/// install does not leave a half-built tree behind. The cleanup choice at
/// the end of a successful install overrides it. The decision is applied
/// exactly once: explicitly via [`WorkDirGuard::resolve`] or on drop.
#[derive(Debug)]
pub struct WorkDirGuard {
    path: PathBuf,
    remove: bool,
    resolved: bool,
}

impl WorkDirGuard {
    /// A disarmed guard for `path`.
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            remove: false,
            resolved: false,
        }
    }

    pub fn set_remove(&mut self, remove: bool) {
        self.remove = remove;
    }

    pub fn will_remove(&self) -> bool {
        self.remove && !self.resolved
    }

    /// Apply the cleanup decision. Later calls are no-ops.
    pub fn resolve(&mut self) {
        if self.resolved {
            return;
        }
        self.resolved = true;

        if self.remove && self.path.exists() {
            println!("Removing {}...", self.path.display());
            cleanup_work_dir(&self.path);
        }
    }
}

impl Drop for WorkDirGuard {
    fn drop(&mut self) {
        self.resolve();
    }
}

/// Remove a directory tree, ignoring errors (idempotent).
pub fn cleanup_work_dir(path: &Path) {
    if let Err(e) = fs::remove_dir_all(path) {
        if path.exists() {
            tracing::warn!("could not remove {}: {}", path.display(), e);
        }
    }
}
