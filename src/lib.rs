//! kmod-installer library exports.
//!
//! The binary is a thin CLI over [`installer::Installer`]; everything is
//! public so integration tests can drive the stages against a fake host.

pub mod common;
pub mod config;
pub mod distro;
pub mod dkms;
pub mod error;
pub mod installer;
pub mod preflight;
pub mod process;
pub mod prompt;
pub mod signals;
pub mod status;
pub mod steps;
pub mod timing;
