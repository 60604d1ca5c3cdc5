// Copyright (c) Contributors to the SPK project.
// SPDX-License-Identifier: Apache-2.0

//! envdir - run a command with environment variables read from a directory

use envdir::{Invocation, ProcessEnv};
use miette::Result;

mod cmd_exec;
mod cmd_version;

use cmd_exec::CmdExec;
use cmd_version::CmdVersion;

/// Exit code for flags or settings that could not be parsed.
const EXIT_USAGE: i32 = 2;

fn run() -> Result<i32> {
    let parent = ProcessEnv::from_current();

    let code = match envdir::resolve(&parent, std::env::args_os())? {
        Invocation::Help(help) => {
            print!("{help}");
            0
        }
        Invocation::Version => CmdVersion.run(),
        Invocation::Run(config) => {
            envdir::logging::init(&config);
            CmdExec::new(config, parent).run()
        }
    };
    Ok(code)
}

fn main() {
    let code = match run() {
        Ok(code) => code,
        Err(report) => {
            eprintln!("{report:?}");
            EXIT_USAGE
        }
    };
    std::process::exit(code);
}
