// Copyright 2024-2026 Space Publish Contributors
// SPDX-License-Identifier: Apache-2.0

//! CLI module for operator commands.
//!
//! ## Usage
//!
//! ```bash
//! space-publish publish --artifact model.pkl --name "Credit Scorer" --owner alice --schema @fields.json
//! space-publish render  --schema '["age","income"]' --name "Credit Scorer" --out ./bundle
//! space-publish config show
//! ```

pub mod config_cmd;
pub mod publish_cmd;
pub mod render_cmd;

use std::path::PathBuf;

use thiserror::Error;

pub use publish_cmd::run_publish;
pub use render_cmd::run_render;

/// Command completed.
pub const EXIT_SUCCESS: i32 = 0;
/// Infrastructure failure.
pub const EXIT_FAILURE: i32 = 1;
/// Bad arguments, bad input or bad configuration.
pub const EXIT_USAGE: i32 = 2;
/// Interrupted by Ctrl+C.
pub const EXIT_INTERRUPTED: i32 = 130;

#[derive(Debug, Error, PartialEq, Eq)]
pub enum CliError {
    #[error("missing required option {0}")]
    MissingFlag(&'static str),

    #[error("option {0} requires a value")]
    MissingValue(String),

    #[error("unknown option {0}")]
    UnknownFlag(String),

    #[error("failed to read {path}: {message}")]
    ReadFile { path: PathBuf, message: String },
}

/// Parsed `--flag value` pairs.
#[derive(Debug, Default)]
pub struct Flags {
    values: Vec<(String, String)>,
}

impl Flags {
    /// Last value given for `name`.
    pub fn get(&self, name: &str) -> Option<&str> {
        self.values
            .iter()
            .rev()
            .find(|(k, _)| k == name)
            .map(|(_, v)| v.as_str())
    }

    pub fn require(&self, name: &'static str) -> Result<&str, CliError> {
        self.get(name).ok_or(CliError::MissingFlag(name))
    }
}

/// Parse `--flag value` and `--flag=value` pairs, accepting only `known` flags.
pub fn parse_flags(args: &[String], known: &[&str]) -> Result<Flags, CliError> {
    let mut flags = Flags::default();
    let mut iter = args.iter();

    while let Some(arg) = iter.next() {
        let (name, inline) = match arg.split_once('=') {
            Some((name, value)) if name.starts_with("--") => (name, Some(value.to_string())),
            _ => (arg.as_str(), None),
        };
        if !known.contains(&name) {
            return Err(CliError::UnknownFlag(name.to_string()));
        }
        let value = match inline {
            Some(value) => value,
            None => iter
                .next()
                .cloned()
                .ok_or_else(|| CliError::MissingValue(name.to_string()))?,
        };
        flags.values.push((name.to_string(), value));
    }
    Ok(flags)
}

/// Schema text from an argument: inline JSON, or `@path` to read a file.
pub fn read_schema_arg(value: &str) -> Result<String, CliError> {
    match value.strip_prefix('@') {
        Some(path) => std::fs::read_to_string(path).map_err(|e| CliError::ReadFile {
            path: PathBuf::from(path),
            message: e.to_string(),
        }),
        None => Ok(value.to_string()),
    }
}
