// Copyright (c) Contributors to the SPK project.
// SPDX-License-Identifier: Apache-2.0

//! Composition of the child environment from the parent process and a
//! directory of variable files.

use std::ffi::{OsStr, OsString};
use std::path::Path;

use crate::config::Config;
use crate::environment::{EnvEntry, ProcessEnv};
use crate::{Error, Result};

#[cfg(test)]
#[path = "./compose_test.rs"]
mod compose_test;

/// Parent variables passed through in paranoid mode, in this order.
pub const PARANOID_VARIABLES: [&str; 7] = ["HOME", "HOSTNAME", "PATH", "PWD", "TERM", "TZ", "UMASK"];

/// Compose the environment for the child process.
///
/// Parent entries come first and directory entries after them, so a
/// variable defined in both places resolves to the directory value once the
/// list is collapsed with last-wins semantics.
///
/// A directory that cannot be listed is skipped unless
/// `fail_on_missing_directory` is set. A file inside the directory that
/// cannot be read always fails the composition.
pub fn compose_environment(config: &Config, parent: &ProcessEnv) -> Result<Vec<EnvEntry>> {
    let mut composed = parent_entries(parent, config.paranoid);
    composed.extend(directory_entries(
        &config.directory,
        config.fail_on_missing_directory,
    )?);
    Ok(composed)
}

/// Entries taken from the parent process.
pub fn parent_entries(parent: &ProcessEnv, paranoid: bool) -> Vec<EnvEntry> {
    if paranoid {
        return PARANOID_VARIABLES
            .iter()
            .map(|name| {
                let value = parent.get(name).map(OsStr::to_os_string).unwrap_or_default();
                tracing::debug!(
                    name = *name,
                    value = %value.to_string_lossy(),
                    "read value from parent process"
                );
                EnvEntry::new(*name, value)
            })
            .collect();
    }

    // logging every inherited variable is only paid for at debug level
    let audit = tracing::enabled!(tracing::Level::DEBUG);
    parent
        .iter()
        .map(|(name, value)| {
            if audit {
                tracing::debug!(
                    name = %name.to_string_lossy(),
                    value = %value.to_string_lossy(),
                    "read value from parent process"
                );
            }
            EnvEntry::new(name, value)
        })
        .collect()
}

/// Entries read from the files in `directory`, sorted by file name.
pub fn directory_entries(directory: &Path, fail_on_missing: bool) -> Result<Vec<EnvEntry>> {
    let listing = std::fs::read_dir(directory)
        .and_then(|entries| entries.collect::<std::io::Result<Vec<_>>>());
    let mut listing = match listing {
        Ok(listing) => listing,
        Err(error) if fail_on_missing => {
            return Err(Error::DirectoryUnavailable {
                path: directory.to_owned(),
                error,
            });
        }
        Err(_) => return Ok(Vec::new()),
    };
    listing.sort_by_key(|entry| entry.file_name());

    let mut entries = Vec::with_capacity(listing.len());
    for entry in listing {
        let path = entry.path();
        let mut data = std::fs::read(&path).map_err(|error| Error::EntryUnreadable {
            path: path.clone(),
            error,
        })?;
        if data.last() == Some(&b'\n') {
            data.pop();
        }

        let name = entry.file_name();
        let value = os_string_from_bytes(data);
        tracing::debug!(
            name = %name.to_string_lossy(),
            value = %value.to_string_lossy(),
            "read value from directory"
        );
        entries.push(EnvEntry::new(name, value));
    }

    Ok(entries)
}

#[cfg(unix)]
fn os_string_from_bytes(data: Vec<u8>) -> OsString {
    use std::os::unix::ffi::OsStringExt;
    OsString::from_vec(data)
}

#[cfg(not(unix))]
fn os_string_from_bytes(data: Vec<u8>) -> OsString {
    match String::from_utf8(data) {
        Ok(value) => value.into(),
        Err(err) => String::from_utf8_lossy(err.as_bytes()).into_owned().into(),
    }
}
