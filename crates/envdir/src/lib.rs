// Copyright (c) Contributors to the SPK project.
// SPDX-License-Identifier: Apache-2.0

//! envdir - run a command with variables loaded from a directory
//!
//! This crate provides the core library behind the `envdir` command: it
//! builds the environment of a child process from the parent process
//! environment and a directory holding one file per variable.
//!
//! # Overview
//!
//! Every regular file in the directory becomes a variable: the file name is
//! the variable name and the file content, minus a single trailing newline,
//! is the value. Directory variables are placed after the inherited ones, so
//! they take precedence. In paranoid mode only a small set of system
//! variables is inherited from the parent.
//!
//! # Example
//!
//! ```text
//! $ ls /secrets
//! DATABASE_URL  API_TOKEN
//! $ envdir -d /secrets -f -p ./server --port 8080
//! ```

pub mod compose;
pub mod config;
pub mod environment;
pub mod error;
pub mod launch;
pub mod logging;

pub use compose::{PARANOID_VARIABLES, compose_environment};
pub use config::{Config, Invocation, LogFormat, LogLevel, resolve};
pub use environment::{EnvEntry, ProcessEnv};
pub use error::{Error, Result};
pub use launch::{exit_code, find_executable, run_command};
