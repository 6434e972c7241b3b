//! Yes/no confirmation gates.

use anyhow::{bail, Result};
use std::io::{self, BufRead, Write};

use crate::error::InstallError;
use crate::signals;

/// Asks the user to confirm a step.
pub trait Prompt {
    /// Ask `question`; `default` applies on empty input, EOF, and in
    /// unattended mode. Fails with [`InstallError::Interrupted`] when
    /// Ctrl-C arrives while waiting for the answer.
    fn confirm(&self, question: &str, default: bool) -> Result<bool>;
}

/// Reads answers from stdin, or applies defaults when unattended.
#[derive(Debug, Clone, Copy)]
pub struct TerminalPrompt {
    unattended: bool,
}

impl TerminalPrompt {
    pub fn new(unattended: bool) -> Self {
        Self { unattended }
    }
}

impl Prompt for TerminalPrompt {
    fn confirm(&self, question: &str, default: bool) -> Result<bool> {
        let hint = if default { "[Y/n]" } else { "[y/N]" };

        if self.unattended {
            println!("{} {} {}", question, hint, if default { "y" } else { "n" });
            return Ok(default);
        }

        print!("{} {} ", question, hint);
        let _ = io::stdout().flush();
        read_confirmation(&mut io::stdin().lock(), default)
    }
}

/// Read one answer line from `input`.
///
/// The read itself survives Ctrl-C, so the interrupt flag is checked once
/// the line arrives and wins over whatever was typed.
pub fn read_confirmation(input: &mut impl BufRead, default: bool) -> Result<bool> {
    let mut line = String::new();
    let read = input.read_line(&mut line);

    if signals::interrupted() {
        println!();
        bail!(InstallError::Interrupted);
    }

    match read {
        Ok(0) | Err(_) => {
            println!();
            Ok(default)
        }
        Ok(_) => Ok(parse_answer(&line).unwrap_or(default)),
    }
}

/// Interpret a typed answer. Unrecognised input yields `None`.
pub fn parse_answer(input: &str) -> Option<bool> {
    match input.trim().to_ascii_lowercase().as_str() {
        "y" | "yes" => Some(true),
        "n" | "no" => Some(false),
        _ => None,
    }
}
