//! Transport pipeline.
//!
//! Drives the publish sequence (init, remote registration, staging, commit,
//! forced push) against a populated workspace. Steps run strictly in order;
//! the first failure or timeout aborts the rest. Everything that reaches a log
//! record or an error value is redacted first.

pub mod redact;
pub mod runner;
pub mod step;

use std::path::Path;
use std::str::FromStr;
use std::sync::{Arc, OnceLock};
use std::time::{Duration, Instant};

use aho_corasick::AhoCorasick;
use tracing::{debug, info, warn};

use crate::error::PublishError;

pub use redact::{Redactor, RemoteUrl, TOKEN_MASK};
pub use runner::{CommandOutcome, CommandRunner, CommandSpec, ProcessRunner};
pub use step::{
    CommitIdentity, PublishSequence, Step, StepKind, COMMIT_MESSAGE, DEFAULT_STEP_TIMEOUT,
    PRIMARY_BRANCH, REMOTE_NAME,
};

/// Substrings that mark a failure in otherwise successful output.
pub const ERROR_MARKERS: [&str; 2] = ["error:", "fatal:"];

static MARKER_MATCHER: OnceLock<Option<AhoCorasick>> = OnceLock::new();

fn marker_matcher() -> Option<&'static AhoCorasick> {
    MARKER_MATCHER
        .get_or_init(|| {
            AhoCorasick::builder()
                .ascii_case_insensitive(true)
                .build(ERROR_MARKERS)
                .ok()
        })
        .as_ref()
}

/// Error markers found in `output`, in marker order, without duplicates.
pub fn error_markers(output: &str) -> Vec<&'static str> {
    let mut found = [false; ERROR_MARKERS.len()];
    match marker_matcher() {
        Some(matcher) => {
            for m in matcher.find_iter(output) {
                found[m.pattern().as_usize()] = true;
            }
        }
        None => {
            let lowered = output.to_ascii_lowercase();
            for (i, marker) in ERROR_MARKERS.iter().enumerate() {
                found[i] = lowered.contains(marker);
            }
        }
    }
    ERROR_MARKERS
        .iter()
        .zip(found)
        .filter_map(|(marker, hit)| hit.then_some(*marker))
        .collect()
}

/// Treatment of error markers in the output of a step that exited 0.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum OutputPolicy {
    /// Log a warning and continue.
    #[default]
    Lenient,
    /// Fail the step.
    Strict,
}

impl OutputPolicy {
    pub fn as_str(&self) -> &'static str {
        match self {
            OutputPolicy::Lenient => "lenient",
            OutputPolicy::Strict => "strict",
        }
    }
}

impl FromStr for OutputPolicy {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "lenient" => Ok(OutputPolicy::Lenient),
            "strict" => Ok(OutputPolicy::Strict),
            other => Err(format!("unknown output policy: {}", other)),
        }
    }
}

/// Settings shared by every publish.
#[derive(Debug, Clone)]
pub struct TransportConfig {
    pub program: String,
    pub step_timeout: Duration,
    pub output_policy: OutputPolicy,
    pub identity: CommitIdentity,
}

impl Default for TransportConfig {
    fn default() -> Self {
        Self {
            program: "git".to_string(),
            step_timeout: DEFAULT_STEP_TIMEOUT,
            output_policy: OutputPolicy::default(),
            identity: CommitIdentity::default(),
        }
    }
}

/// Environment applied to every step so the client never blocks on a prompt.
const NON_INTERACTIVE_ENV: [(&str, &str); 2] = [("GIT_TERMINAL_PROMPT", "0"), ("GIT_ASKPASS", "")];

/// Executes publish sequences through a [`CommandRunner`].
#[derive(Clone)]
pub struct Pipeline {
    runner: Arc<dyn CommandRunner>,
    config: TransportConfig,
}

impl Pipeline {
    pub fn new(runner: Arc<dyn CommandRunner>, config: TransportConfig) -> Self {
        Self { runner, config }
    }

    pub fn config(&self) -> &TransportConfig {
        &self.config
    }

    /// Build the standard sequence for `remote`.
    pub fn sequence_for(&self, remote: &RemoteUrl) -> PublishSequence {
        PublishSequence::standard(remote.expose(), &self.config.identity, self.config.step_timeout)
    }

    /// Publish the contents of `workdir` to `remote`.
    pub async fn publish(&self, workdir: &Path, remote: &RemoteUrl) -> Result<(), PublishError> {
        let sequence = self.sequence_for(remote);
        self.execute(&sequence, workdir, &remote.redactor()).await
    }

    /// Run `sequence` step by step, stopping at the first failure.
    pub async fn execute(
        &self,
        sequence: &PublishSequence,
        workdir: &Path,
        redactor: &Redactor,
    ) -> Result<(), PublishError> {
        for step in sequence.steps() {
            self.run_step(step, workdir, redactor).await?;
        }
        Ok(())
    }

    async fn run_step(
        &self,
        step: &Step,
        workdir: &Path,
        redactor: &Redactor,
    ) -> Result<CommandOutcome, PublishError> {
        let command = redactor.redact(&step.command_line(&self.config.program));
        info!(step = %step.kind, command = %command, "running transport step");

        let spec = CommandSpec {
            program: self.config.program.clone(),
            args: step.args.clone(),
            cwd: workdir.to_path_buf(),
            env: NON_INTERACTIVE_ENV
                .iter()
                .map(|(k, v)| (k.to_string(), v.to_string()))
                .collect(),
            timeout: step.timeout,
        };

        let started = Instant::now();
        let outcome = self.runner.run(&spec).await.map_err(|e| {
            PublishError::io(format!("failed to run {} step: `{}`", step.kind, command), e)
        })?;
        let output = redactor.redact(&outcome.combined_output);
        debug!(
            step = %step.kind,
            exit_code = outcome.exit_code,
            timed_out = outcome.timed_out,
            elapsed_ms = started.elapsed().as_millis() as u64,
            output = %output,
            "transport step finished"
        );

        if outcome.timed_out {
            return Err(PublishError::Timeout {
                step: step.kind,
                command,
                limit: step.timeout,
            });
        }
        if outcome.exit_code != 0 {
            return Err(PublishError::Command {
                step: step.kind,
                command,
                exit_code: outcome.exit_code,
                output,
            });
        }

        let markers = error_markers(&output);
        if !markers.is_empty() {
            match self.config.output_policy {
                OutputPolicy::Lenient => {
                    warn!(
                        step = %step.kind,
                        command = %command,
                        markers = ?markers,
                        "possible error in output despite exit code 0"
                    );
                }
                OutputPolicy::Strict => {
                    return Err(PublishError::Command {
                        step: step.kind,
                        command,
                        exit_code: outcome.exit_code,
                        output,
                    });
                }
            }
        }

        Ok(outcome)
    }
}

impl std::fmt::Debug for Pipeline {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Pipeline").field("config", &self.config).finish_non_exhaustive()
    }
}
