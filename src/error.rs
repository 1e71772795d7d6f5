//! Error taxonomy for the publishing pipeline.
//!
//! Client faults (`SchemaFormatError`, `ArtifactError`) are kept apart from
//! infrastructure faults (`PublishError`) so callers can map the former to a
//! bad-request response and the latter to a server error.

use std::error::Error as StdError;
use std::time::Duration;

use thiserror::Error;

use crate::bundle::TemplateError;
use crate::transport::StepKind;

/// The field-schema text could not be turned into a usable field list.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum SchemaFormatError {
    #[error("expected a JSON object or an array of strings ({detail}): {text}")]
    Malformed { text: String, detail: String },

    #[error("schema declares no fields: {text}")]
    Empty { text: String },

    #[error("field {field:?} yields unusable identifier {identifier:?}")]
    UnusableIdentifier {
        text: String,
        field: String,
        identifier: String,
    },

    #[error("fields {first:?} and {second:?} both normalize to {identifier:?}")]
    IdentifierCollision {
        text: String,
        identifier: String,
        first: String,
        second: String,
    },
}

impl SchemaFormatError {
    /// The schema text that was rejected.
    pub fn text(&self) -> &str {
        match self {
            Self::Malformed { text, .. }
            | Self::Empty { text }
            | Self::UnusableIdentifier { text, .. }
            | Self::IdentifierCollision { text, .. } => text,
        }
    }
}

/// The uploaded artifact was rejected before any work started.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum ArtifactError {
    #[error("artifact filename contains a path sequence, whitespace or control character: {0:?}")]
    InvalidName(String),

    #[error("artifact filename is reserved for a generated file: {0}")]
    Reserved(String),

    #[error("cannot publish an empty artifact: {0}")]
    Empty(String),
}

/// Infrastructure failure while staging or pushing a bundle.
#[derive(Debug, Error)]
pub enum PublishError {
    #[error("{context}")]
    Io {
        context: String,
        #[source]
        source: std::io::Error,
    },

    #[error("{step} step failed with exit code {exit_code}: `{command}`\n{output}")]
    Command {
        step: StepKind,
        command: String,
        exit_code: i32,
        output: String,
    },

    #[error("{step} step timed out after {}s: `{command}`", limit.as_secs())]
    Timeout {
        step: StepKind,
        command: String,
        limit: Duration,
    },
}

impl PublishError {
    pub(crate) fn io(context: impl Into<String>, source: std::io::Error) -> Self {
        Self::Io {
            context: context.into(),
            source,
        }
    }

    pub(crate) fn io_at(action: &str, path: &std::path::Path, source: std::io::Error) -> Self {
        Self::io(format!("failed to {} {}", action, path.display()), source)
    }

    /// The transport step that failed, if the failure came from one.
    pub fn step(&self) -> Option<StepKind> {
        match self {
            Self::Command { step, .. } | Self::Timeout { step, .. } => Some(*step),
            Self::Io { .. } => None,
        }
    }

    pub fn is_timeout(&self) -> bool {
        matches!(self, Self::Timeout { .. })
    }
}

/// Externally visible wrapper for every infrastructure failure.
#[derive(Debug, Error)]
#[error("deployment of {space_id} failed")]
pub struct DeploymentFailure {
    pub space_id: String,
    #[source]
    pub cause: PublishError,
}

impl DeploymentFailure {
    pub fn new(space_id: impl Into<String>, cause: PublishError) -> Self {
        Self {
            space_id: space_id.into(),
            cause,
        }
    }

    /// Render the failure and every underlying source on one line.
    pub fn cause_chain(&self) -> String {
        let mut chain = self.to_string();
        let mut source: Option<&(dyn StdError + 'static)> = self.source();
        while let Some(err) = source {
            chain.push_str(": ");
            chain.push_str(&err.to_string());
            source = err.source();
        }
        chain
    }
}

/// Single error type returned by [`crate::Publisher::run_publish`].
#[derive(Debug, Error)]
pub enum PublishFailure {
    #[error("invalid field schema: {0}")]
    Schema(#[from] SchemaFormatError),

    #[error("invalid artifact: {0}")]
    Artifact(#[from] ArtifactError),

    #[error("template error: {0}")]
    Template(#[from] TemplateError),

    #[error(transparent)]
    Deployment(#[from] DeploymentFailure),
}

impl PublishFailure {
    /// True when the caller supplied bad input.
    pub fn is_client_error(&self) -> bool {
        matches!(self, Self::Schema(_) | Self::Artifact(_))
    }

    /// HTTP-style status class for the surrounding application.
    pub fn status_code(&self) -> u16 {
        if self.is_client_error() {
            400
        } else {
            500
        }
    }

    pub fn as_deployment(&self) -> Option<&DeploymentFailure> {
        match self {
            Self::Deployment(failure) => Some(failure),
            _ => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_schema_errors_are_client_errors() {
        let failure = PublishFailure::from(SchemaFormatError::Empty {
            text: "{}".into(),
        });
        assert!(failure.is_client_error());
        assert_eq!(failure.status_code(), 400);
    }

    #[test]
    fn test_artifact_errors_are_client_errors() {
        let failure = PublishFailure::from(ArtifactError::InvalidName("../x".into()));
        assert!(failure.is_client_error());
    }

    #[test]
    fn test_deployment_failures_are_server_errors() {
        let cause = PublishError::Timeout {
            step: StepKind::Push,
            command: "git push".into(),
            limit: Duration::from_secs(180),
        };
        let failure = PublishFailure::from(DeploymentFailure::new("acct/ml-x-abc123", cause));
        assert!(!failure.is_client_error());
        assert_eq!(failure.status_code(), 500);
        assert!(failure.as_deployment().is_some());
    }

    #[test]
    fn test_cause_chain_includes_io_source() {
        let cause = PublishError::io(
            "failed to create workspace",
            std::io::Error::new(std::io::ErrorKind::PermissionDenied, "denied"),
        );
        let failure = DeploymentFailure::new("acct/space", cause);
        let chain = failure.cause_chain();
        assert!(chain.starts_with("deployment of acct/space failed"));
        assert!(chain.contains("failed to create workspace"));
        assert!(chain.ends_with("denied"));
    }

    #[test]
    fn test_command_error_message_carries_exit_code_and_output() {
        let err = PublishError::Command {
            step: StepKind::Commit,
            command: "git commit -m msg".into(),
            exit_code: 128,
            output: "fatal: nothing".into(),
        };
        let msg = err.to_string();
        assert!(msg.contains("commit"));
        assert!(msg.contains("128"));
        assert!(msg.contains("fatal: nothing"));
        assert_eq!(err.step(), Some(StepKind::Commit));
        assert!(!err.is_timeout());
    }

    #[test]
    fn test_schema_error_exposes_text() {
        let err = SchemaFormatError::Malformed {
            text: "nope".into(),
            detail: "not json".into(),
        };
        assert_eq!(err.text(), "nope");
    }
}
