// Copyright (c) Contributors to the SPK project.
// SPDX-License-Identifier: Apache-2.0

//! Run the target command inside the composed environment.

use envdir::{Config, ProcessEnv};

/// The target command could not be found or started.
pub const EXIT_LAUNCH_FAILED: i32 = 1;
/// No target command was given.
pub const EXIT_MISSING_COMMAND: i32 = 2;
/// The environment could not be composed.
pub const EXIT_COMPOSITION_FAILED: i32 = 3;

/// Compose the environment and run the target command
#[derive(Debug)]
pub struct CmdExec {
    config: Config,
    parent: ProcessEnv,
}

impl CmdExec {
    pub fn new(config: Config, parent: ProcessEnv) -> Self {
        Self { config, parent }
    }

    /// Returns the exit code for this process.
    pub fn run(&mut self) -> i32 {
        let config = &self.config;
        tracing::debug!(
            dir = %config.directory.display(),
            fail = config.fail_on_missing_directory,
            paranoid = config.paranoid,
            "log-level" = %config.log_level,
            "log-format" = %config.log_format,
            "using config"
        );

        if !config.has_command() {
            tracing::error!("missing command");
            return EXIT_MISSING_COMMAND;
        }

        let program = match envdir::find_executable(&config.command, &self.parent) {
            Ok(program) => program,
            Err(err) => {
                tracing::error!(err = %err, "error running subprocess");
                return EXIT_LAUNCH_FAILED;
            }
        };
        tracing::debug!(cmd = %program.display(), args = ?config.args, "using command");

        let environment = match envdir::compose_environment(config, &self.parent) {
            Ok(environment) => environment,
            Err(err) => {
                tracing::error!(err = %err, "error parsing environment variables");
                return EXIT_COMPOSITION_FAILED;
            }
        };

        match envdir::run_command(&program, &config.args, &environment) {
            Ok(status) if status.success() => 0,
            Ok(status) => {
                tracing::info!(err = %status, "subcommand exited with error");
                envdir::exit_code(status)
            }
            Err(err) => {
                tracing::error!(err = %err, "error running subprocess");
                EXIT_LAUNCH_FAILED
            }
        }
    }
}
