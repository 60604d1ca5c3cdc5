// Copyright (c) Contributors to the SPK project.
// SPDX-License-Identifier: Apache-2.0

//! Environment variable tables passed in and out of composition.

use std::ffi::{OsStr, OsString};

#[cfg(test)]
#[path = "./environment_test.rs"]
mod environment_test;

/// A single `NAME=VALUE` entry destined for the child process.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EnvEntry {
    pub name: OsString,
    pub value: OsString,
}

impl EnvEntry {
    pub fn new(name: impl Into<OsString>, value: impl Into<OsString>) -> Self {
        Self {
            name: name.into(),
            value: value.into(),
        }
    }
}

impl std::fmt::Display for EnvEntry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "{}={}",
            self.name.to_string_lossy(),
            self.value.to_string_lossy()
        )
    }
}

/// Snapshot of a process environment, in its original order.
///
/// Resolution and composition read variables from this table instead of
/// the live process so that both can be driven with arbitrary inputs.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ProcessEnv {
    vars: Vec<(OsString, OsString)>,
}

impl ProcessEnv {
    /// Capture the environment of the current process.
    pub fn from_current() -> Self {
        std::env::vars_os().collect()
    }

    /// Look up a variable, the last occurrence of a name wins.
    pub fn get<K: AsRef<OsStr>>(&self, name: K) -> Option<&OsStr> {
        let name = name.as_ref();
        self.vars
            .iter()
            .rev()
            .find(|(key, _)| key == name)
            .map(|(_, value)| value.as_os_str())
    }

    /// Look up a variable that must be set to a non-empty value.
    pub fn get_non_empty<K: AsRef<OsStr>>(&self, name: K) -> Option<String> {
        self.get(name)
            .filter(|value| !value.is_empty())
            .map(|value| value.to_string_lossy().into_owned())
    }

    pub fn iter(&self) -> impl Iterator<Item = (&OsStr, &OsStr)> {
        self.vars
            .iter()
            .map(|(key, value)| (key.as_os_str(), value.as_os_str()))
    }

    pub fn len(&self) -> usize {
        self.vars.len()
    }

    pub fn is_empty(&self) -> bool {
        self.vars.is_empty()
    }
}

impl<K, V> FromIterator<(K, V)> for ProcessEnv
where
    K: Into<OsString>,
    V: Into<OsString>,
{
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        Self {
            vars: iter
                .into_iter()
                .map(|(key, value)| (key.into(), value.into()))
                .collect(),
        }
    }
}
