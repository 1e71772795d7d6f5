//! Typed descriptors for the publish command sequence.

use std::fmt;
use std::time::Duration;

/// Branch created by `init` and pushed to the remote.
pub const PRIMARY_BRANCH: &str = "main";

/// Name the remote is registered under.
pub const REMOTE_NAME: &str = "origin";

/// Message of the single publish commit.
pub const COMMIT_MESSAGE: &str = "Deploy model and application code via automated service";

/// Wall-clock budget for a single step.
pub const DEFAULT_STEP_TIMEOUT: Duration = Duration::from_secs(180);

/// One stage of the publish sequence.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum StepKind {
    Init,
    RemoteAdd,
    Stage,
    Commit,
    Push,
}

impl StepKind {
    /// Every step in execution order.
    pub const ALL: [StepKind; 5] = [
        StepKind::Init,
        StepKind::RemoteAdd,
        StepKind::Stage,
        StepKind::Commit,
        StepKind::Push,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            StepKind::Init => "init",
            StepKind::RemoteAdd => "remote-add",
            StepKind::Stage => "stage",
            StepKind::Commit => "commit",
            StepKind::Push => "push",
        }
    }
}

impl fmt::Display for StepKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Author identity recorded on the publish commit.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CommitIdentity {
    pub name: String,
    pub email: String,
}

impl Default for CommitIdentity {
    fn default() -> Self {
        Self {
            name: "space-publish".to_string(),
            email: "space-publish@localhost".to_string(),
        }
    }
}

/// A single external command with its own time budget.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Step {
    pub kind: StepKind,
    pub args: Vec<String>,
    pub timeout: Duration,
}

impl Step {
    fn new(kind: StepKind, args: &[&str], timeout: Duration) -> Self {
        Self {
            kind,
            args: args.iter().map(|a| a.to_string()).collect(),
            timeout,
        }
    }

    /// Space-joined command line. Contains credentials for `RemoteAdd`.
    pub fn command_line(&self, program: &str) -> String {
        std::iter::once(program)
            .chain(self.args.iter().map(String::as_str))
            .collect::<Vec<_>>()
            .join(" ")
    }
}

/// The ordered steps of one publish.
#[derive(Debug, Clone)]
pub struct PublishSequence {
    steps: Vec<Step>,
}

impl PublishSequence {
    /// init, remote add, add, commit, forced push.
    pub fn standard(remote_url: &str, identity: &CommitIdentity, timeout: Duration) -> Self {
        let user_name = format!("user.name={}", identity.name);
        let user_email = format!("user.email={}", identity.email);
        let initial_branch = format!("--initial-branch={}", PRIMARY_BRANCH);

        let steps = vec![
            Step::new(StepKind::Init, &["init", &initial_branch], timeout),
            Step::new(
                StepKind::RemoteAdd,
                &["remote", "add", REMOTE_NAME, remote_url],
                timeout,
            ),
            Step::new(StepKind::Stage, &["add", "."], timeout),
            Step::new(
                StepKind::Commit,
                &["-c", &user_name, "-c", &user_email, "commit", "-m", COMMIT_MESSAGE],
                timeout,
            ),
            Step::new(
                StepKind::Push,
                &["push", REMOTE_NAME, PRIMARY_BRANCH, "--force"],
                timeout,
            ),
        ];
        Self { steps }
    }

    /// Override the budget of one step.
    pub fn with_timeout(mut self, kind: StepKind, timeout: Duration) -> Self {
        for step in self.steps.iter_mut().filter(|s| s.kind == kind) {
            step.timeout = timeout;
        }
        self
    }

    pub fn steps(&self) -> &[Step] {
        &self.steps
    }
}
