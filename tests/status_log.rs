//! The status record across whole runs.

mod helpers;

use regex::Regex;

use helpers::{FakeHost, HostState, TestEnv};
use kmod_installer::installer::{Installer, Mode};
use kmod_installer::prompt::TerminalPrompt;

fn line_pattern() -> Regex {
    Regex::new(r"^\d{4}-\d{2}-\d{2} \d{2}:\d{2}:\d{2} - .+$").unwrap()
}

#[test]
fn test_every_line_is_timestamped() {
    let env = TestEnv::new();
    env.install_headers();
    let host = FakeHost::new(HostState::debian().with_driver_loaded());
    let prompt = TerminalPrompt::new(true);

    Installer::new(&env.config, &host, &prompt, &env.log, Mode::Install)
        .run()
        .unwrap();

    let pattern = line_pattern();
    let lines = env.status_lines();
    assert!(lines.len() > 5);
    for line in &lines {
        assert!(pattern.is_match(line), "malformed status line: {:?}", line);
    }
}

#[test]
fn test_record_is_append_only_across_runs() {
    let env = TestEnv::new();
    let prompt = TerminalPrompt::new(true);

    let host = FakeHost::new(HostState::debian().with_driver_loaded());
    Installer::new(&env.config, &host, &prompt, &env.log, Mode::Uninstall)
        .run()
        .unwrap();
    let first = env.status_lines();
    assert!(!first.is_empty());

    let host = FakeHost::new(HostState::debian());
    Installer::new(&env.config, &host, &prompt, &env.log, Mode::Uninstall)
        .run()
        .unwrap();
    let second = env.status_lines();

    assert!(second.len() > first.len());
    assert_eq!(&second[..first.len()], first.as_slice());
    let headers = second
        .iter()
        .filter(|l| l.ends_with("=== Uninstalling rtw88/0.6 ==="))
        .count();
    assert_eq!(headers, 2);
}

#[test]
fn test_fatal_error_is_recorded() {
    let env = TestEnv::new();
    let mut state = HostState::debian();
    state.uid = 0;
    let host = FakeHost::new(state);
    let prompt = TerminalPrompt::new(true);

    let result = Installer::new(&env.config, &host, &prompt, &env.log, Mode::Install).run();
    assert!(result.is_err());

    let lines = env.status_lines();
    let last = lines.last().unwrap();
    assert!(line_pattern().is_match(last));
    assert!(last.contains(" - ERROR: Do not run this installer as root"));
}
