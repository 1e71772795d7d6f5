// Copyright 2024-2026 Space Publish Contributors
// SPDX-License-Identifier: Apache-2.0

//! `render` subcommand: write a bundle locally without publishing.

use std::path::PathBuf;

use crate::bundle::{Bundle, BundleSpec};
use crate::config;
use crate::error::PublishFailure;
use crate::publisher::{load_templates, validate_artifact_name};

use super::publish_cmd::report_failure;
use super::{parse_flags, read_schema_arg, EXIT_FAILURE, EXIT_SUCCESS, EXIT_USAGE};

const FLAGS: &[&str] = &["--schema", "--name", "--artifact-name", "--out"];

/// Render the bundle into `--out` and list the written files.
pub fn run_render(args: &[String]) -> i32 {
    let flags = match parse_flags(args, FLAGS) {
        Ok(flags) => flags,
        Err(e) => {
            eprintln!("Error: {}", e);
            return EXIT_USAGE;
        }
    };
    let (schema_arg, model_name, out) = match (
        flags.require("--schema"),
        flags.require("--name"),
        flags.require("--out"),
    ) {
        (Ok(schema), Ok(name), Ok(out)) => (schema, name, PathBuf::from(out)),
        (Err(e), _, _) | (_, Err(e), _) | (_, _, Err(e)) => {
            eprintln!("Error: {}", e);
            return EXIT_USAGE;
        }
    };
    let schema_text = match read_schema_arg(schema_arg) {
        Ok(text) => text,
        Err(e) => {
            eprintln!("Error: {}", e);
            return EXIT_USAGE;
        }
    };

    let artifact_file = match validate_artifact_name(flags.get("--artifact-name").unwrap_or_default()) {
        Ok(name) => name,
        Err(e) => return report_failure(&PublishFailure::from(e)),
    };
    let templates = match load_templates(config::load().templates.as_deref()) {
        Ok(templates) => templates,
        Err(e) => return report_failure(&PublishFailure::from(e)),
    };
    let bundle = match Bundle::generate(
        &templates,
        &BundleSpec::new(model_name, &artifact_file),
        &schema_text,
    ) {
        Ok(bundle) => bundle,
        Err(e) => return report_failure(&PublishFailure::from(e)),
    };

    if let Err(e) = std::fs::create_dir_all(&out) {
        eprintln!("Error: failed to create {}: {}", out.display(), e);
        return EXIT_FAILURE;
    }
    match bundle.write_to(&out) {
        Ok(paths) => {
            for path in paths {
                println!("{}", path.display());
            }
            EXIT_SUCCESS
        }
        Err(e) => {
            eprintln!("Error: {}", e);
            EXIT_FAILURE
        }
    }
}
