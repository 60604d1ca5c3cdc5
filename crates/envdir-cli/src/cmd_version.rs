// Copyright (c) Contributors to the SPK project.
// SPDX-License-Identifier: Apache-2.0

//! Version banner.

const VERSION: &str = env!("CARGO_PKG_VERSION");
const COMMIT: Option<&str> = option_env!("ENVDIR_BUILD_COMMIT");
const DATE: Option<&str> = option_env!("ENVDIR_BUILD_DATE");

/// Show version
#[derive(Debug, Default)]
pub struct CmdVersion;

impl CmdVersion {
    pub fn run(&mut self) -> i32 {
        println!("{}", banner(VERSION, COMMIT, DATE));
        0
    }
}

fn banner(version: &str, commit: Option<&str>, date: Option<&str>) -> String {
    // only a real commit hash is shortened, never the placeholder
    let commit = match commit {
        Some(commit) if commit.len() > 8 => commit.get(..7).unwrap_or(commit),
        Some(commit) => commit,
        None => "unavailable",
    };
    let date = date.unwrap_or("unknown");
    format!("envdir version {version}, build {commit} ({date})")
}
