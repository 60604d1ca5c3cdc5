// Copyright (c) Contributors to the SPK project.
// SPDX-License-Identifier: Apache-2.0

//! Error types for envdir operations.

use miette::Diagnostic;
use std::path::PathBuf;
use thiserror::Error;

/// Convenience Result type with envdir Error.
pub type Result<T> = std::result::Result<T, Error>;

/// Errors that can occur while resolving, composing or launching.
#[derive(Error, Diagnostic, Debug)]
pub enum Error {
    /// Command line flags could not be parsed
    #[error("{0}")]
    #[diagnostic(
        code(envdir::invalid_arguments),
        help("Run 'envdir -h' to see the supported flags")
    )]
    InvalidArguments(#[source] clap::Error),

    /// An ENVDIR_* variable holds an unrecognized value
    #[error("invalid value {value:?} for {name}, expected one of: {}", .expected.join(", "))]
    #[diagnostic(code(envdir::invalid_setting))]
    InvalidSetting {
        name: &'static str,
        value: String,
        expected: Vec<String>,
    },

    /// The variables directory could not be listed
    #[error("error reading variables from directory {path:?}: {error}")]
    #[diagnostic(
        code(envdir::directory_unavailable),
        help("Create the directory or run without -f to ignore it")
    )]
    DirectoryUnavailable {
        path: PathBuf,
        #[source]
        error: std::io::Error,
    },

    /// A file inside the variables directory could not be read
    #[error("error reading variable file {path:?}: {error}")]
    #[diagnostic(code(envdir::entry_unreadable))]
    EntryUnreadable {
        path: PathBuf,
        #[source]
        error: std::io::Error,
    },

    /// The target command is not on PATH
    #[error("{command:?}: executable file not found in $PATH")]
    #[diagnostic(code(envdir::command_not_found))]
    CommandNotFound { command: String },

    /// The target command exists but cannot be executed
    #[error("{path:?}: permission denied")]
    #[diagnostic(
        code(envdir::not_executable),
        help("Check that the file is a regular file with the executable bit set")
    )]
    NotExecutable { path: PathBuf },

    /// The operating system refused to start the target command
    #[error("failed to start {path:?}: {error}")]
    #[diagnostic(code(envdir::spawn_failed))]
    SpawnFailed {
        path: PathBuf,
        #[source]
        error: std::io::Error,
    },
}

impl Error {
    /// True for failures while building the child environment.
    pub fn is_composition(&self) -> bool {
        matches!(
            self,
            Self::DirectoryUnavailable { .. } | Self::EntryUnreadable { .. }
        )
    }

    /// True for failures to find or start the target command.
    pub fn is_launch(&self) -> bool {
        matches!(
            self,
            Self::CommandNotFound { .. } | Self::NotExecutable { .. } | Self::SpawnFailed { .. }
        )
    }
}
