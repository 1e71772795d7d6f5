//! External command execution with merged output and a hard time limit.

use std::path::PathBuf;
use std::process::Stdio;
use std::time::Duration;

use async_trait::async_trait;
use tokio::io::{AsyncBufReadExt, AsyncRead, BufReader};
use tokio::process::Command;
use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tokio::time::timeout;
use tracing::{debug, warn};

/// How long to keep reading output after the process has exited.
///
/// Bounded because a surviving grandchild can hold the pipe open.
const DRAIN_GRACE: Duration = Duration::from_secs(2);

/// Exit code reported when the process did not exit on its own.
pub const NO_EXIT_CODE: i32 = -1;

/// A fully described command invocation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CommandSpec {
    pub program: String,
    pub args: Vec<String>,
    pub cwd: PathBuf,
    pub env: Vec<(String, String)>,
    pub timeout: Duration,
}

/// Result of one external process.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CommandOutcome {
    pub exit_code: i32,
    /// Stdout and stderr interleaved in arrival order.
    pub combined_output: String,
    pub timed_out: bool,
}

impl CommandOutcome {
    pub fn success(&self) -> bool {
        !self.timed_out && self.exit_code == 0
    }
}

/// Executes commands for the transport pipeline.
///
/// Implementations must enforce `spec.timeout`, terminate the process when it
/// elapses and report `timed_out`. An `Err` is reserved for failures to start
/// or wait on the process.
#[async_trait]
pub trait CommandRunner: Send + Sync {
    async fn run(&self, spec: &CommandSpec) -> std::io::Result<CommandOutcome>;
}

/// Runs commands as child processes of the current process.
#[derive(Debug, Clone, Default)]
pub struct ProcessRunner;

impl ProcessRunner {
    pub fn new() -> Self {
        Self
    }
}

#[async_trait]
impl CommandRunner for ProcessRunner {
    async fn run(&self, spec: &CommandSpec) -> std::io::Result<CommandOutcome> {
        let mut cmd = Command::new(&spec.program);
        cmd.args(&spec.args)
            .current_dir(&spec.cwd)
            .envs(spec.env.iter().map(|(k, v)| (k.as_str(), v.as_str())))
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .kill_on_drop(true);

        let mut child = cmd.spawn()?;

        let (tx, mut rx) = mpsc::unbounded_channel();
        let mut readers = Vec::with_capacity(2);
        if let Some(stdout) = child.stdout.take() {
            readers.push(spawn_reader(stdout, tx.clone()));
        }
        if let Some(stderr) = child.stderr.take() {
            readers.push(spawn_reader(stderr, tx.clone()));
        }
        drop(tx);

        let (exit_code, timed_out) = match timeout(spec.timeout, child.wait()).await {
            Ok(Ok(status)) => {
                for reader in &mut readers {
                    if timeout(DRAIN_GRACE, &mut *reader).await.is_err() {
                        debug!(program = %spec.program, "output still open after exit, abandoning");
                    }
                }
                (status.code().unwrap_or(NO_EXIT_CODE), false)
            }
            Ok(Err(e)) => {
                abort_all(&readers);
                return Err(e);
            }
            Err(_) => {
                // kill() also reaps the child
                if let Err(e) = child.kill().await {
                    warn!(program = %spec.program, error = %e, "failed to kill timed out process");
                }
                (NO_EXIT_CODE, true)
            }
        };
        abort_all(&readers);

        let mut combined_output = String::new();
        while let Ok(chunk) = rx.try_recv() {
            combined_output.push_str(&chunk);
        }

        Ok(CommandOutcome {
            exit_code,
            combined_output,
            timed_out,
        })
    }
}

fn spawn_reader<R>(stream: R, tx: mpsc::UnboundedSender<String>) -> JoinHandle<()>
where
    R: AsyncRead + Unpin + Send + 'static,
{
    tokio::spawn(async move {
        let mut reader = BufReader::new(stream);
        let mut line = Vec::new();
        loop {
            line.clear();
            match reader.read_until(b'\n', &mut line).await {
                Ok(0) | Err(_) => break,
                Ok(_) => {
                    if tx.send(String::from_utf8_lossy(&line).into_owned()).is_err() {
                        break;
                    }
                }
            }
        }
    })
}

fn abort_all(readers: &[JoinHandle<()>]) {
    for reader in readers {
        reader.abort();
    }
}
