// Copyright (c) Contributors to the SPK project.
// SPDX-License-Identifier: Apache-2.0

//! End-to-end tests running the `envdir` binary.

#![cfg(unix)]

use std::os::unix::fs::PermissionsExt;
use std::path::Path;
use std::process::{Command, Output};

use rstest::{fixture, rstest};
use tempfile::TempDir;

#[fixture]
fn env_dir() -> TempDir {
    TempDir::new().expect("Failed to create temp dir")
}

fn write_var(dir: &Path, name: &str, content: &str) {
    std::fs::write(dir.join(name), content).expect("Failed to write variable file");
}

/// Run envdir with a clean environment holding only PATH and `vars`.
fn envdir(args: &[&str], vars: &[(&str, &str)]) -> Output {
    let path = std::env::var_os("PATH").unwrap_or_else(|| "/usr/bin:/bin".into());
    Command::new(env!("CARGO_BIN_EXE_envdir"))
        .args(args)
        .env_clear()
        .env("PATH", path)
        .envs(vars.iter().copied())
        .output()
        .expect("Failed to run envdir")
}

fn stdout(output: &Output) -> String {
    String::from_utf8_lossy(&output.stdout).into_owned()
}

fn json_records(output: &str) -> Vec<serde_json::Value> {
    output
        .lines()
        .filter(|line| line.starts_with('{'))
        .map(|line| serde_json::from_str(line).expect("log line is valid json"))
        .collect()
}

#[rstest]
fn test_success_with_debug_json(env_dir: TempDir) {
    write_var(env_dir.path(), "VAR_FROM_DIR", "value-from-dir");
    let dir = env_dir.path().to_str().unwrap();

    let output = envdir(
        &["-d", dir, "-f", "-lf", "json", "-ll", "debug", "printenv"],
        &[("VAR_FROM_PARENT", "value-from-parent"), ("HOME", "/home/tester")],
    );
    let out = stdout(&output);

    assert_eq!(output.status.code(), Some(0), "{out}");

    let records = json_records(&out);
    let has_record = |msg: &str, name: &str| {
        records
            .iter()
            .any(|r| r["level"] == "DEBUG" && r["msg"] == msg && r["name"] == name)
    };
    assert!(has_record("read value from parent process", "HOME"), "{out}");
    assert!(has_record("read value from parent process", "VAR_FROM_PARENT"), "{out}");
    assert!(has_record("read value from directory", "VAR_FROM_DIR"), "{out}");

    let printed: Vec<_> = out.lines().filter(|line| !line.starts_with('{')).collect();
    assert!(printed.contains(&"VAR_FROM_PARENT=value-from-parent"), "{out}");
    assert!(printed.contains(&"VAR_FROM_DIR=value-from-dir"), "{out}");
    assert!(printed.iter().any(|line| line.starts_with("PATH=")), "{out}");
}

#[rstest]
fn test_settings_from_environment(env_dir: TempDir) {
    write_var(env_dir.path(), "VAR_FROM_DIR", "value-from-dir\n");
    let dir = env_dir.path().to_str().unwrap();

    let output = envdir(
        &["printenv", "VAR_FROM_DIR"],
        &[
            ("ENVDIR_DIRECTORY", dir),
            ("ENVDIR_LOG_LEVEL", "debug"),
            ("ENVDIR_LOG_FORMAT", "text"),
        ],
    );
    let out = stdout(&output);

    assert_eq!(output.status.code(), Some(0), "{out}");
    assert!(out.contains("level=DEBUG msg=\"using config\""), "{out}");
    assert!(out.contains(" log-level=debug log-format=text\n"), "{out}");
    assert!(out.contains("msg=\"read value from directory\" name=VAR_FROM_DIR value=value-from-dir"), "{out}");
    assert!(out.ends_with("\nvalue-from-dir\n"), "{out}");
}

#[rstest]
fn test_directory_wins_over_parent(env_dir: TempDir) {
    write_var(env_dir.path(), "SHARED", "from-dir");
    let dir = env_dir.path().to_str().unwrap();

    let output = envdir(&["-d", dir, "printenv", "SHARED"], &[("SHARED", "from-parent")]);

    assert_eq!(output.status.code(), Some(0));
    assert_eq!(stdout(&output), "from-dir\n");
}

#[rstest]
fn test_paranoid_drops_parent_variables(env_dir: TempDir) {
    let dir = env_dir.path().to_str().unwrap();

    let output = envdir(
        &["-d", dir, "-p", "printenv"],
        &[("VAR_FROM_PARENT", "value-from-parent"), ("TERM", "xterm")],
    );
    let out = stdout(&output);

    assert_eq!(output.status.code(), Some(0), "{out}");
    assert!(!out.contains("VAR_FROM_PARENT"), "{out}");
    assert!(out.lines().any(|line| line == "TERM=xterm"), "{out}");
    assert!(out.lines().any(|line| line == "HOSTNAME="), "{out}");
}

#[rstest]
fn test_missing_command() {
    let output = envdir(&[], &[]);

    assert_eq!(output.status.code(), Some(2));
    assert!(stdout(&output).contains("level=ERROR msg=\"missing command\""));
}

#[rstest]
fn test_command_not_found() {
    let output = envdir(&["not-existing-subcommand"], &[]);
    let out = stdout(&output);

    assert_eq!(output.status.code(), Some(1), "{out}");
    assert!(
        out.contains(
            r#"level=ERROR msg="error running subprocess" err="\"not-existing-subcommand\": executable file not found in $PATH""#
        ),
        "{out}"
    );
}

#[rstest]
fn test_command_not_executable(env_dir: TempDir) {
    let script = env_dir.path().join("script.sh");
    std::fs::write(&script, "#!/bin/sh\necho hi\n").unwrap();
    std::fs::set_permissions(&script, std::fs::Permissions::from_mode(0o644)).unwrap();

    let output = envdir(&[script.to_str().unwrap()], &[]);
    let out = stdout(&output);

    assert_eq!(output.status.code(), Some(1), "{out}");
    assert!(out.contains("msg=\"error running subprocess\""), "{out}");
    assert!(out.contains("permission denied"), "{out}");
}

#[rstest]
fn test_exit_code_is_forwarded() {
    let output = envdir(&["-ll", "info", "false"], &[]);

    assert_eq!(output.status.code(), Some(1));
    assert!(
        stdout(&output).contains(r#"level=INFO msg="subcommand exited with error" err="exit status: 1""#)
    );
}

#[rstest]
fn test_custom_exit_code_is_forwarded() {
    let output = envdir(&["sh", "-c", "exit 42"], &[]);

    assert_eq!(output.status.code(), Some(42));
    assert_eq!(stdout(&output), "");
}

#[rstest]
fn test_missing_directory_with_fail_flag() {
    let output = envdir(&["-f", "-d", "/non-existing-directory", "true"], &[]);
    let out = stdout(&output);

    assert_eq!(output.status.code(), Some(3), "{out}");
    assert!(
        out.contains(r#"level=ERROR msg="error parsing environment variables" err="error reading variables from directory \"/non-existing-directory\""#),
        "{out}"
    );
}

#[rstest]
fn test_fail_flag_can_disable_environment_setting() {
    let output = envdir(
        &["-f=false", "-d", "/non-existing-directory", "true"],
        &[("ENVDIR_FAIL", "true")],
    );

    assert_eq!(output.status.code(), Some(0));
    assert_eq!(stdout(&output), "");
}

#[rstest]
fn test_non_utf8_arguments_reach_command() {
    use std::os::unix::ffi::OsStrExt;

    let raw = std::ffi::OsStr::from_bytes(b"\xffx");
    let output = Command::new(env!("CARGO_BIN_EXE_envdir"))
        .args(["-d", "/non-existing-directory", "printf", "%s"])
        .arg(raw)
        .env_clear()
        .env("PATH", std::env::var_os("PATH").unwrap_or_else(|| "/usr/bin:/bin".into()))
        .output()
        .expect("Failed to run envdir");

    assert_eq!(output.status.code(), Some(0));
    assert_eq!(output.stdout, b"\xffx");
}

#[rstest]
fn test_missing_directory_is_ignored_by_default() {
    let output = envdir(&["-d", "/non-existing-directory", "true"], &[]);

    assert_eq!(output.status.code(), Some(0));
    assert_eq!(stdout(&output), "");
}

#[rstest]
fn test_unreadable_entry_fails_without_fail_flag(env_dir: TempDir) {
    std::fs::create_dir(env_dir.path().join("NESTED")).unwrap();
    let dir = env_dir.path().to_str().unwrap();

    let output = envdir(&["-d", dir, "true"], &[]);
    let out = stdout(&output);

    assert_eq!(output.status.code(), Some(3), "{out}");
    assert!(out.contains("error reading variable file"), "{out}");
}

#[rstest]
fn test_version() {
    let output = envdir(&["-v", "true"], &[]);

    assert_eq!(output.status.code(), Some(0));
    assert!(stdout(&output).starts_with(&format!(
        "envdir version {}, build ",
        env!("CARGO_PKG_VERSION")
    )));
}

#[rstest]
fn test_help() {
    let output = envdir(&["-h"], &[]);
    let out = stdout(&output);

    assert_eq!(output.status.code(), Some(0));
    assert!(out.contains("Usage: envdir"), "{out}");
    assert!(out.contains("Fail if missing directory"), "{out}");
}

#[rstest]
#[case(&["-x", "true"])]
#[case(&["-ll", "verbose", "true"])]
fn test_invalid_flags(#[case] args: &[&str]) {
    let output = envdir(args, &[]);

    assert_eq!(output.status.code(), Some(2));
    assert_eq!(stdout(&output), "");
    assert!(!output.stderr.is_empty());
}

#[rstest]
fn test_invalid_setting_in_environment() {
    let output = envdir(&["true"], &[("ENVDIR_LOG_FORMAT", "xml")]);

    assert_eq!(output.status.code(), Some(2));
    assert!(String::from_utf8_lossy(&output.stderr).contains("ENVDIR_LOG_FORMAT"));
}
