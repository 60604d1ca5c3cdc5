// Copyright (c) Contributors to the SPK project.
// SPDX-License-Identifier: Apache-2.0

//! Layered configuration: built-in defaults, `ENVDIR_*` variables, then flags.

use std::ffi::OsString;
use std::path::PathBuf;

use clap::{CommandFactory, Parser, ValueEnum};

use crate::environment::ProcessEnv;
use crate::{Error, Result};

#[cfg(test)]
#[path = "./config_test.rs"]
mod config_test;

/// Directory scanned when neither `-d` nor `ENVDIR_DIRECTORY` is given.
pub const DEFAULT_DIRECTORY: &str = "/secrets";

pub const ENV_DIRECTORY: &str = "ENVDIR_DIRECTORY";
pub const ENV_FAIL: &str = "ENVDIR_FAIL";
pub const ENV_PARANOID: &str = "ENVDIR_PARANOID";
pub const ENV_LOG_FORMAT: &str = "ENVDIR_LOG_FORMAT";
pub const ENV_LOG_LEVEL: &str = "ENVDIR_LOG_LEVEL";

/// Flags that consume the following token as their value.
const VALUE_FLAGS: &[&str] = &["d", "lf", "ll"];

/// Rendering of log records.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, ValueEnum)]
pub enum LogFormat {
    /// `level=INFO msg="..." key=value` lines
    #[default]
    Text,
    /// One JSON object per line
    Json,
}

/// Minimum severity of emitted log records.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord, ValueEnum)]
pub enum LogLevel {
    Debug,
    Info,
    #[default]
    Warn,
    Error,
}

impl LogLevel {
    pub fn as_tracing(self) -> tracing::Level {
        match self {
            Self::Debug => tracing::Level::DEBUG,
            Self::Info => tracing::Level::INFO,
            Self::Warn => tracing::Level::WARN,
            Self::Error => tracing::Level::ERROR,
        }
    }
}

macro_rules! display_as_value_name {
    ($ty:ty) => {
        impl std::fmt::Display for $ty {
            fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
                match self.to_possible_value() {
                    Some(value) => f.write_str(value.get_name()),
                    None => Ok(()),
                }
            }
        }
    };
}

display_as_value_name!(LogFormat);
display_as_value_name!(LogLevel);

/// Finalized settings for a single invocation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Config {
    /// Directory holding one file per variable.
    pub directory: PathBuf,
    /// Treat an unreadable directory as an error instead of skipping it.
    pub fail_on_missing_directory: bool,
    /// Only pass a fixed set of system variables from the parent.
    pub paranoid: bool,
    pub log_format: LogFormat,
    pub log_level: LogLevel,
    /// Target command, empty when none was given.
    pub command: OsString,
    pub args: Vec<OsString>,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            directory: PathBuf::from(DEFAULT_DIRECTORY),
            fail_on_missing_directory: false,
            paranoid: false,
            log_format: LogFormat::default(),
            log_level: LogLevel::default(),
            command: OsString::new(),
            args: Vec::new(),
        }
    }
}

impl Config {
    pub fn has_command(&self) -> bool {
        !self.command.is_empty()
    }
}

/// What the caller should do after resolving the command line.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Invocation {
    /// Print the rendered help text and exit successfully.
    Help(String),
    /// Print the version banner and exit successfully.
    Version,
    /// Compose the environment and run the target command.
    Run(Config),
}

/// Run a command with environment variables read from a directory
#[derive(Parser, Debug)]
#[clap(
    name = "envdir",
    disable_help_flag = true,
    disable_version_flag = true,
    args_override_self = true,
    override_usage = "envdir [-d DIR] [-f] [-p] [-lf FORMAT] [-ll LEVEL] [-v] [-h] COMMAND [ARGS...]"
)]
struct Flags {
    /// Directory to read files from [env: ENVDIR_DIRECTORY] [default: /secrets]
    #[clap(long = "d", value_name = "DIR", allow_hyphen_values = true)]
    directory: Option<PathBuf>,

    /// Fail if missing directory [env: ENVDIR_FAIL]
    #[clap(
        long = "f",
        num_args = 0..=1,
        require_equals = true,
        default_missing_value = "true"
    )]
    fail: Option<bool>,

    /// Don't pass any env vars except default system ones [env: ENVDIR_PARANOID]
    #[clap(
        long = "p",
        num_args = 0..=1,
        require_equals = true,
        default_missing_value = "true"
    )]
    paranoid: Option<bool>,

    /// Log format [env: ENVDIR_LOG_FORMAT] [default: text]
    #[clap(long = "lf", value_name = "FORMAT", ignore_case = true)]
    log_format: Option<LogFormat>,

    /// Log level [env: ENVDIR_LOG_LEVEL] [default: warn]
    #[clap(long = "ll", value_name = "LEVEL", ignore_case = true)]
    log_level: Option<LogLevel>,

    /// Show version
    #[clap(long = "v")]
    show_version: bool,

    /// Show help
    #[clap(long = "h", alias = "help")]
    show_help: bool,

    /// Command to run, followed by its arguments
    #[clap(
        value_name = "COMMAND",
        num_args = 1..,
        trailing_var_arg = true,
        value_parser = clap::value_parser!(OsString)
    )]
    command: Vec<OsString>,
}

/// Resolve the invocation from an environment snapshot and an argument
/// vector (including the program name).
pub fn resolve<I, T>(env: &ProcessEnv, args: I) -> Result<Invocation>
where
    I: IntoIterator<Item = T>,
    T: Into<OsString>,
{
    let args = normalize_flags(args.into_iter().map(Into::into));
    let flags = Flags::try_parse_from(args).map_err(Error::InvalidArguments)?;

    if flags.show_help {
        let help = Flags::command().render_help().to_string();
        return Ok(Invocation::Help(help));
    }
    if flags.show_version {
        return Ok(Invocation::Version);
    }

    let directory = flags
        .directory
        .or_else(|| env.get_non_empty(ENV_DIRECTORY).map(PathBuf::from))
        .unwrap_or_else(|| PathBuf::from(DEFAULT_DIRECTORY));

    let log_format = match flags.log_format {
        Some(format) => format,
        None => value_from_env(env, ENV_LOG_FORMAT)?.unwrap_or_default(),
    };
    let log_level = match flags.log_level {
        Some(level) => level,
        None => value_from_env(env, ENV_LOG_LEVEL)?.unwrap_or_default(),
    };

    let mut command = flags.command.into_iter();
    Ok(Invocation::Run(Config {
        directory,
        fail_on_missing_directory: flags
            .fail
            .unwrap_or_else(|| switch_from_env(env, ENV_FAIL)),
        paranoid: flags
            .paranoid
            .unwrap_or_else(|| switch_from_env(env, ENV_PARANOID)),
        log_format,
        log_level,
        command: command.next().unwrap_or_default(),
        args: command.collect(),
    }))
}

/// Only the literal string `true` enables a switch.
fn switch_from_env(env: &ProcessEnv, name: &str) -> bool {
    env.get_non_empty(name).is_some_and(|value| value == "true")
}

fn value_from_env<T: ValueEnum>(env: &ProcessEnv, name: &'static str) -> Result<Option<T>> {
    let Some(value) = env.get_non_empty(name) else {
        return Ok(None);
    };
    T::from_str(&value, true)
        .map(Some)
        .map_err(|_| Error::InvalidSetting {
            name,
            value,
            expected: T::value_variants()
                .iter()
                .filter_map(|variant| variant.to_possible_value())
                .map(|possible| possible.get_name().to_string())
                .collect(),
        })
}

/// Rewrite single-dash flags (`-lf json`, `-d=/x`) into the double-dash form
/// clap understands.
///
/// Only tokens ahead of the target command are rewritten, everything from the
/// first non-flag token onwards is passed through untouched.
fn normalize_flags(mut args: impl Iterator<Item = OsString>) -> Vec<OsString> {
    let mut normalized: Vec<OsString> = args.next().into_iter().collect();

    while let Some(arg) = args.next() {
        let Some(text) = arg.to_str().map(str::to_owned) else {
            normalized.push(arg);
            break;
        };
        if text == "--" || text == "-" || !text.starts_with('-') {
            normalized.push(arg);
            break;
        }

        let name = text.trim_start_matches('-');
        let takes_value = VALUE_FLAGS.contains(&name);
        normalized.push(format!("--{name}").into());
        if takes_value {
            if let Some(value) = args.next() {
                normalized.push(value);
            }
        }
    }

    normalized.extend(args);
    normalized
}
