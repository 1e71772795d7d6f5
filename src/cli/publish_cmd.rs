// Copyright 2024-2026 Space Publish Contributors
// SPDX-License-Identifier: Apache-2.0

//! `publish` subcommand: run a full publish from local files.

use std::path::Path;

use tracing::warn;

use crate::config;
use crate::error::PublishFailure;
use crate::publisher::{ArtifactUpload, PublishRequest, Publisher};

use super::{parse_flags, read_schema_arg, EXIT_FAILURE, EXIT_INTERRUPTED, EXIT_SUCCESS, EXIT_USAGE};

const FLAGS: &[&str] = &["--artifact", "--name", "--owner", "--schema"];

/// Parse arguments, publish, print the result as JSON.
///
/// Ctrl+C drops the in-flight attempt, which removes its workspace and kills
/// the running step, then exits with 130.
pub async fn run_publish(args: &[String]) -> i32 {
    let request = match build_request(args).await {
        Ok(request) => request,
        Err(message) => {
            eprintln!("Error: {}", message);
            return EXIT_USAGE;
        }
    };

    let env = config::load();
    for warning in env.validate() {
        warn!(warning = %warning, "configuration warning");
    }
    let publisher = match Publisher::from_env(&env) {
        Ok(publisher) => publisher,
        Err(e) => {
            eprintln!("Error: {}", e);
            return EXIT_USAGE;
        }
    };

    tokio::select! {
        result = publisher.run_publish(request) => match result {
            Ok(published) => {
                match serde_json::to_string_pretty(&published) {
                    Ok(json) => println!("{}", json),
                    Err(_) => println!("{} {}", published.space_id, published.endpoint_url),
                }
                EXIT_SUCCESS
            }
            Err(failure) => report_failure(&failure),
        },
        _ = tokio::signal::ctrl_c() => {
            eprintln!("Interrupted; publish attempt abandoned and workspace removed.");
            EXIT_INTERRUPTED
        }
    }
}

async fn build_request(args: &[String]) -> Result<PublishRequest, String> {
    let flags = parse_flags(args, FLAGS).map_err(|e| e.to_string())?;
    let artifact_path = flags.require("--artifact").map_err(|e| e.to_string())?;
    let model_name = flags.require("--name").map_err(|e| e.to_string())?;
    let owner = flags.get("--owner").unwrap_or_default();
    let schema_text = read_schema_arg(flags.require("--schema").map_err(|e| e.to_string())?)
        .map_err(|e| e.to_string())?;

    let artifact = ArtifactUpload::from_path(Path::new(artifact_path))
        .await
        .map_err(|e| format!("failed to open artifact {}: {}", artifact_path, e))?;

    Ok(PublishRequest {
        owner: owner.to_string(),
        model_name: model_name.to_string(),
        schema_text,
        artifact,
    })
}

/// Print a failure and map it to an exit code.
pub fn report_failure(failure: &PublishFailure) -> i32 {
    eprintln!("Error: {}", failure);
    match failure {
        PublishFailure::Deployment(deployment) => {
            eprintln!("Cause: {}", deployment.cause_chain());
            EXIT_FAILURE
        }
        PublishFailure::Schema(_) | PublishFailure::Artifact(_) | PublishFailure::Template(_) => {
            EXIT_USAGE
        }
    }
}
