//! DKMS and loaded-module queries.
//!
//! Parses `dkms status` and `lsmod` output and derives the order in which
//! the driver's modules can be unloaded.

use anyhow::Result;
use std::collections::{HashMap, HashSet};
use std::path::Path;

use crate::process::{Cmd, CommandRunner};

/// One line of `dkms status`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DkmsEntry {
    pub name: String,
    pub version: String,
    pub kernel: Option<String>,
    pub arch: Option<String>,
    /// `added`, `built` or `installed` (plus any trailing warning text).
    pub state: String,
}

impl DkmsEntry {
    pub fn is_installed(&self) -> bool {
        self.state.starts_with("installed")
    }
}

/// Parse `dkms status` output.
///
/// Accepts both `name/version, kernel, arch: state` (dkms 3) and the older
/// `name, version, kernel, arch: state`.
pub fn parse_status(output: &str) -> Vec<DkmsEntry> {
    output.lines().filter_map(parse_status_line).collect()
}

fn parse_status_line(line: &str) -> Option<DkmsEntry> {
    let line = line.trim();
    let (fields, state) = line.rsplit_once(':')?;
    let mut parts: Vec<&str> = fields.split(',').map(str::trim).collect();

    let head = parts.remove(0);
    let (name, version) = match head.split_once('/') {
        Some((n, v)) => (n, v),
        None if !parts.is_empty() => (head, parts.remove(0)),
        None => return None,
    };
    if name.is_empty() || version.is_empty() {
        return None;
    }

    let mut rest = parts.into_iter().filter(|p| !p.is_empty());
    Some(DkmsEntry {
        name: name.to_string(),
        version: version.to_string(),
        kernel: rest.next().map(str::to_string),
        arch: rest.next().map(str::to_string),
        state: state.trim().to_string(),
    })
}

/// Query DKMS for entries belonging to `name`.
pub fn status(runner: &dyn CommandRunner, name: &str) -> Result<Vec<DkmsEntry>> {
    let result = Cmd::new("dkms")
        .args(["status", name])
        .error_msg("dkms status failed")
        .run(runner)?;
    Ok(parse_status(&result.stdout)
        .into_iter()
        .filter(|e| e.name == name)
        .collect())
}

/// Distinct versions registered for `name`, in first-seen order.
pub fn registered_versions(entries: &[DkmsEntry]) -> Vec<String> {
    let mut seen = HashSet::new();
    entries
        .iter()
        .filter(|e| seen.insert(e.version.clone()))
        .map(|e| e.version.clone())
        .collect()
}

/// Register, build and install a source tree in one step.
pub fn install_cmd(source_tree: &Path) -> Cmd {
    Cmd::sudo("dkms")
        .arg("install")
        .arg_path(source_tree)
        .interactive()
        .error_msg("DKMS build/install failed")
}

/// Remove `name/version` from every kernel.
pub fn remove_cmd(name: &str, version: &str) -> Cmd {
    Cmd::sudo("dkms")
        .arg("remove")
        .arg(format!("{}/{}", name, version))
        .arg("--all")
}

/// One row of `lsmod`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LoadedModule {
    pub name: String,
    /// Modules that depend on this one.
    pub used_by: Vec<String>,
}

/// Parse `lsmod` output (`Module Size Used-by-count [users,...]`).
pub fn parse_lsmod(output: &str) -> Vec<LoadedModule> {
    output
        .lines()
        .skip_while(|l| l.starts_with("Module"))
        .filter_map(|line| {
            let mut cols = line.split_whitespace();
            let name = cols.next()?;
            let _size = cols.next()?;
            let _count = cols.next()?;
            let used_by = cols
                .next()
                .map(|users| {
                    users
                        .split(',')
                        .filter(|u| !u.is_empty() && *u != "-")
                        .map(str::to_string)
                        .collect()
                })
                .unwrap_or_default();
            Some(LoadedModule {
                name: name.to_string(),
                used_by,
            })
        })
        .collect()
}

/// Loaded modules whose name starts with `prefix`.
///
/// lsmod reports dashes as underscores, so the prefix is normalised.
pub fn matching_modules<'a>(modules: &'a [LoadedModule], prefix: &str) -> Vec<&'a LoadedModule> {
    let prefix = prefix.replace('-', "_");
    modules
        .iter()
        .filter(|m| m.name.starts_with(&prefix))
        .collect()
}

/// Order `modules` so every module comes after all modules using it.
///
/// Users outside the set are ignored. A dependency cycle (which the kernel
/// does not allow) falls back to lsmod order for the remainder.
pub fn unload_order(modules: &[&LoadedModule]) -> Vec<String> {
    let names: HashSet<&str> = modules.iter().map(|m| m.name.as_str()).collect();

    // Number of in-set users still loaded, per module.
    let mut pending: HashMap<&str, usize> = modules
        .iter()
        .map(|m| {
            let users = m
                .used_by
                .iter()
                .filter(|u| names.contains(u.as_str()))
                .count();
            (m.name.as_str(), users)
        })
        .collect();

    let mut order = Vec::with_capacity(modules.len());
    let mut done: HashSet<&str> = HashSet::new();

    while order.len() < modules.len() {
        let next = modules
            .iter()
            .find(|m| !done.contains(m.name.as_str()) && pending[m.name.as_str()] == 0)
            .or_else(|| modules.iter().find(|m| !done.contains(m.name.as_str())));

        let Some(module) = next else { break };
        done.insert(module.name.as_str());
        order.push(module.name.clone());

        // Unloading `module` releases whatever it was using.
        for other in modules {
            if other.used_by.iter().any(|u| *u == module.name) {
                if let Some(count) = pending.get_mut(other.name.as_str()) {
                    *count = count.saturating_sub(1);
                }
            }
        }
    }

    order
}
