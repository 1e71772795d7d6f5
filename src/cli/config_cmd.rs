// Copyright 2024-2026 Space Publish Contributors
// SPDX-License-Identifier: Apache-2.0

//! Config CLI subcommands: show, defaults, validate.
//!
//! These commands read configuration directly from environment variables.

use crate::config::{self, EffectiveConfig};

use super::{EXIT_SUCCESS, EXIT_USAGE};

/// Print effective config as key-value pairs to stdout.
pub fn run_show() {
    let cfg = config::load().effective_config();
    print_config(&cfg);
}

/// Print default config values (no env overrides) to stdout.
pub fn run_defaults() {
    for (key, value) in default_entries() {
        println!("{}={}", key, value);
    }
}

fn default_entries() -> Vec<(&'static str, String)> {
    vec![
        ("PUBLISH_ACCOUNT", String::new()),
        ("PUBLISH_TOKEN", "<unset>".to_string()),
        ("PUBLISH_HOST", config::DEFAULT_HOST.to_string()),
        ("PUBLISH_NAMESPACE", config::DEFAULT_NAMESPACE.to_string()),
        (
            "PUBLISH_WORKSPACE_ROOT",
            config::default_workspace_root().display().to_string(),
        ),
        ("PUBLISH_STEP_TIMEOUT", config::DEFAULT_STEP_TIMEOUT_SECS.to_string()),
        ("PUBLISH_GIT_BIN", config::DEFAULT_GIT_BIN.to_string()),
        ("PUBLISH_OUTPUT_POLICY", "lenient".to_string()),
        ("PUBLISH_COMMIT_NAME", config::DEFAULT_COMMIT_NAME.to_string()),
        ("PUBLISH_COMMIT_EMAIL", config::DEFAULT_COMMIT_EMAIL.to_string()),
        ("PUBLISH_TEMPLATES", "<builtin>".to_string()),
        ("PUBLISH_LOG_FORMAT", "json".to_string()),
        ("PUBLISH_LOG_LEVEL", config::DEFAULT_LOG_LEVEL.to_string()),
        ("PUBLISH_LOG_FILE", "<stderr>".to_string()),
    ]
}

/// Validate configuration for obvious misconfigurations.
///
/// Returns 0 if valid, 2 if any warnings are found.
pub fn run_validate() -> i32 {
    let warnings = config::load().validate();

    for warning in &warnings {
        eprintln!("WARNING: {}", warning);
    }

    if warnings.is_empty() {
        println!("Configuration is valid.");
        EXIT_SUCCESS
    } else {
        EXIT_USAGE
    }
}

fn print_config(cfg: &EffectiveConfig) {
    for (key, value) in cfg.entries() {
        println!("{}={}", key, value);
    }
}
