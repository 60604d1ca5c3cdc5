// Copyright (c) Contributors to the SPK project.
// SPDX-License-Identifier: Apache-2.0

//! Locating and running the target command.

use std::ffi::{OsStr, OsString};
use std::path::{Path, PathBuf};
use std::process::{Command, ExitStatus};

use crate::environment::{EnvEntry, ProcessEnv};
use crate::{Error, Result};

#[cfg(all(test, unix))]
#[path = "./launch_test.rs"]
mod launch_test;

/// Resolve `command` to an executable file.
///
/// Names containing a path separator are used as given, anything else is
/// searched for in the `PATH` of `parent`.
pub fn find_executable(command: &OsStr, parent: &ProcessEnv) -> Result<PathBuf> {
    let not_found = || Error::CommandNotFound {
        command: command.to_string_lossy().into_owned(),
    };
    if command.is_empty() {
        return Err(not_found());
    }

    let has_separator = command
        .as_encoded_bytes()
        .iter()
        .any(|byte| byte.is_ascii() && std::path::is_separator(char::from(*byte)));
    if has_separator {
        let path = PathBuf::from(command);
        return match std::fs::metadata(&path) {
            Ok(meta) if is_executable(&meta) => Ok(path),
            Err(err) if err.kind() == std::io::ErrorKind::NotFound => Err(not_found()),
            _ => Err(Error::NotExecutable { path }),
        };
    }

    let search_path = parent.get("PATH").unwrap_or_default();
    search_dirs(search_path)
        .map(|dir| dir.join(command))
        .find(|candidate| std::fs::metadata(candidate).is_ok_and(|meta| is_executable(&meta)))
        .ok_or_else(not_found)
}

/// Directories of a `PATH` value that are searched for commands.
///
/// Empty and relative components would resolve against the working
/// directory and are skipped.
fn search_dirs(search_path: &OsStr) -> impl Iterator<Item = PathBuf> + '_ {
    std::env::split_paths(search_path).filter(|dir| dir.is_absolute())
}

#[cfg(unix)]
fn is_executable(meta: &std::fs::Metadata) -> bool {
    use std::os::unix::fs::PermissionsExt;
    meta.is_file() && meta.permissions().mode() & 0o111 != 0
}

#[cfg(not(unix))]
fn is_executable(meta: &std::fs::Metadata) -> bool {
    meta.is_file()
}

/// Run `program` with exactly the given environment and wait for it.
///
/// The standard streams are inherited. When a name appears more than once
/// in `environment` the last value wins.
pub fn run_command(
    program: &Path,
    args: &[OsString],
    environment: &[EnvEntry],
) -> Result<ExitStatus> {
    Command::new(program)
        .args(args)
        .env_clear()
        .envs(environment.iter().map(|entry| (&entry.name, &entry.value)))
        .status()
        .map_err(|error| Error::SpawnFailed {
            path: program.to_owned(),
            error,
        })
}

/// Process exit code to report for a finished child.
///
/// A child terminated by a signal maps to `128 + signal`.
pub fn exit_code(status: ExitStatus) -> i32 {
    if let Some(code) = status.code() {
        return code;
    }

    #[cfg(unix)]
    {
        use std::os::unix::process::ExitStatusExt;
        if let Some(signal) = status.signal() {
            return 128 + signal;
        }
    }

    1
}
