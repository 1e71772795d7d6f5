//! Publish lifecycle tests against a scripted remote.
//!
//! Covers workspace cleanup on every exit path, failure mapping, credential
//! redaction in errors and logs, and concurrent attempts.

use std::collections::HashSet;
use std::io::Write;
use std::path::Path;
use std::sync::{Arc, Mutex};
use std::time::Duration;

use async_trait::async_trait;
use tokio::sync::Notify;

use space_publish::publisher::load_templates;
use space_publish::transport::{StepKind, TransportConfig};
use space_publish::{
    ArtifactUpload, CommandOutcome, CommandRunner, CommandSpec, HostingTarget, PublishFailure,
    PublishRequest, Publisher, PublisherConfig,
};

const TOKEN: &str = "hf_SuperSecretToken42";

// =============================================================================
// Scripted remote
// =============================================================================

/// Answers every step with success unless told otherwise.
#[derive(Default)]
struct FakeRemote {
    fail_at: Option<(StepKind, CommandOutcome)>,
    hang_at: Option<StepKind>,
    hanging: Notify,
    seen: Mutex<Vec<(StepKind, CommandSpec)>>,
    pushed_files: Mutex<Vec<Vec<String>>>,
}

impl FakeRemote {
    fn failing_at(kind: StepKind, outcome: CommandOutcome) -> Self {
        Self {
            fail_at: Some((kind, outcome)),
            ..Self::default()
        }
    }

    fn steps(&self) -> Vec<StepKind> {
        self.seen.lock().unwrap().iter().map(|(k, _)| *k).collect()
    }
}

fn step_of(spec: &CommandSpec) -> StepKind {
    match spec.args.first().map(String::as_str) {
        Some("init") => StepKind::Init,
        Some("remote") => StepKind::RemoteAdd,
        Some("add") => StepKind::Stage,
        Some("-c") => StepKind::Commit,
        Some("push") => StepKind::Push,
        other => panic!("unexpected step {:?}", other),
    }
}

fn file_names(dir: &Path) -> Vec<String> {
    let mut names: Vec<String> = std::fs::read_dir(dir)
        .unwrap()
        .map(|e| e.unwrap().file_name().to_string_lossy().into_owned())
        .collect();
    names.sort();
    names
}

#[async_trait]
impl CommandRunner for FakeRemote {
    async fn run(&self, spec: &CommandSpec) -> std::io::Result<CommandOutcome> {
        let kind = step_of(spec);
        self.seen.lock().unwrap().push((kind, spec.clone()));
        tokio::task::yield_now().await;

        if kind == StepKind::Push {
            self.pushed_files.lock().unwrap().push(file_names(&spec.cwd));
        }
        if self.hang_at == Some(kind) {
            self.hanging.notify_one();
            std::future::pending::<()>().await;
        }
        match &self.fail_at {
            Some((at, outcome)) if *at == kind => Ok(outcome.clone()),
            _ => Ok(CommandOutcome {
                exit_code: 0,
                combined_output: String::new(),
                timed_out: false,
            }),
        }
    }
}

// =============================================================================
// Fixtures
// =============================================================================

fn publisher(root: &Path, remote: Arc<FakeRemote>) -> Publisher {
    let config = PublisherConfig {
        target: HostingTarget {
            host: "huggingface.co".into(),
            namespace: "spaces".into(),
            account: "acme".into(),
            token: TOKEN.into(),
        },
        workspace_root: root.to_path_buf(),
        transport: TransportConfig {
            step_timeout: Duration::from_secs(5),
            ..TransportConfig::default()
        },
    };
    Publisher::new(config, load_templates(None).unwrap(), remote)
}

fn request(name: &str, schema: &str, artifact_name: &str, bytes: &[u8]) -> PublishRequest {
    PublishRequest {
        owner: "alice".into(),
        model_name: name.into(),
        schema_text: schema.into(),
        artifact: ArtifactUpload::new(
            std::io::Cursor::new(bytes.to_vec()),
            artifact_name,
            bytes.len() as u64,
        ),
    }
}

fn churn_request() -> PublishRequest {
    request("Churn Model", r#"{"tenure":0,"charges":0}"#, "churn.pkl", b"pickled-bytes")
}

fn leftover(root: &Path) -> usize {
    match std::fs::read_dir(root) {
        Ok(entries) => entries.count(),
        Err(_) => 0,
    }
}

/// Log sink shared with a scoped subscriber.
#[derive(Clone, Default)]
struct Captured(Arc<Mutex<Vec<u8>>>);

impl Captured {
    fn text(&self) -> String {
        String::from_utf8_lossy(&self.0.lock().unwrap()).into_owned()
    }
}

impl Write for Captured {
    fn write(&mut self, buf: &[u8]) -> std::io::Result<usize> {
        self.0.lock().unwrap().extend_from_slice(buf);
        Ok(buf.len())
    }

    fn flush(&mut self) -> std::io::Result<()> {
        Ok(())
    }
}

fn capture_logs() -> (Captured, tracing::subscriber::DefaultGuard) {
    let sink = Captured::default();
    let writer = sink.clone();
    let subscriber = tracing_subscriber::fmt()
        .with_max_level(tracing::Level::DEBUG)
        .with_ansi(false)
        .with_writer(move || writer.clone())
        .finish();
    (sink, tracing::subscriber::set_default(subscriber))
}

// =============================================================================
// Success path
// =============================================================================

#[tokio::test]
async fn successful_publish_returns_space_and_endpoint() {
    let root = tempfile::tempdir().unwrap();
    let remote = Arc::new(FakeRemote::default());
    let result = publisher(root.path(), remote.clone())
        .run_publish(churn_request())
        .await
        .unwrap();

    assert!(result.space_id.starts_with("acme/ml-churn-model-"));
    assert_eq!(
        result.endpoint_url,
        format!("https://huggingface.co/spaces/{}", result.space_id)
    );
    assert_eq!(remote.steps(), StepKind::ALL);
    assert_eq!(leftover(root.path()), 0);
}

#[tokio::test]
async fn bundle_and_artifact_are_staged_before_push() {
    let root = tempfile::tempdir().unwrap();
    let remote = Arc::new(FakeRemote::default());
    publisher(root.path(), remote.clone())
        .run_publish(churn_request())
        .await
        .unwrap();

    let pushed = remote.pushed_files.lock().unwrap();
    assert_eq!(
        pushed[0],
        ["Dockerfile", "README.md", "churn.pkl", "main.py", "requirements.txt"]
    );
}

#[tokio::test]
async fn every_step_runs_in_the_same_workspace() {
    let root = tempfile::tempdir().unwrap();
    let remote = Arc::new(FakeRemote::default());
    publisher(root.path(), remote.clone())
        .run_publish(churn_request())
        .await
        .unwrap();

    let seen = remote.seen.lock().unwrap();
    let dirs: HashSet<_> = seen.iter().map(|(_, spec)| spec.cwd.clone()).collect();
    assert_eq!(dirs.len(), 1);
    let dir = dirs.into_iter().next().unwrap();
    assert!(dir.starts_with(root.path()));
    assert!(!dir.exists());
}

// =============================================================================
// Failure paths
// =============================================================================

#[tokio::test]
async fn failure_at_each_step_removes_workspace() {
    for (index, kind) in StepKind::ALL.iter().enumerate() {
        let root = tempfile::tempdir().unwrap();
        let remote = Arc::new(FakeRemote::failing_at(
            *kind,
            CommandOutcome {
                exit_code: 128,
                combined_output: format!("fatal: {} went wrong\n", kind),
                timed_out: false,
            },
        ));
        let failure = publisher(root.path(), remote.clone())
            .run_publish(churn_request())
            .await
            .unwrap_err();

        let deployment = failure.as_deployment().expect("deployment failure");
        assert_eq!(deployment.cause.step(), Some(*kind));
        assert_eq!(remote.steps().len(), index + 1, "steps after {} must not run", kind);
        assert_eq!(failure.status_code(), 500);
        assert_eq!(leftover(root.path()), 0, "workspace left behind after {}", kind);
    }
}

#[tokio::test]
async fn push_timeout_is_reported_as_timeout() {
    let root = tempfile::tempdir().unwrap();
    let remote = Arc::new(FakeRemote::failing_at(
        StepKind::Push,
        CommandOutcome {
            exit_code: -1,
            combined_output: String::new(),
            timed_out: true,
        },
    ));
    let failure = publisher(root.path(), remote)
        .run_publish(churn_request())
        .await
        .unwrap_err();

    let deployment = failure.as_deployment().unwrap();
    assert!(deployment.cause.is_timeout());
    assert!(deployment.cause_chain().contains("timed out"));
    assert_eq!(leftover(root.path()), 0);
}

#[tokio::test]
async fn schema_error_creates_no_workspace() {
    let root = tempfile::tempdir().unwrap();
    let workspace_root = root.path().join("spaces");
    let remote = Arc::new(FakeRemote::default());
    let failure = publisher(&workspace_root, remote.clone())
        .run_publish(request("m", "{oops", "m.pkl", b"x"))
        .await
        .unwrap_err();

    assert!(matches!(failure, PublishFailure::Schema(_)));
    assert!(failure.is_client_error());
    assert!(!workspace_root.exists());
    assert!(remote.steps().is_empty());
}

#[tokio::test]
async fn artifact_errors_create_no_workspace() {
    let root = tempfile::tempdir().unwrap();
    let workspace_root = root.path().join("spaces");
    let remote = Arc::new(FakeRemote::default());
    let publisher = publisher(&workspace_root, remote.clone());

    for (name, bytes) in [
        ("../escape.pkl", &b"x"[..]),
        ("my model.pkl", &b"x"[..]),
        ("main.py", &b"x"[..]),
        ("empty.pkl", &b""[..]),
    ] {
        let failure = publisher
            .run_publish(request("m", "[\"a\"]", name, bytes))
            .await
            .unwrap_err();
        assert!(matches!(failure, PublishFailure::Artifact(_)), "{}", name);
        assert_eq!(failure.status_code(), 400);
    }
    assert!(!workspace_root.exists());
    assert!(remote.steps().is_empty());
}

#[tokio::test]
async fn short_artifact_stream_fails_before_transport() {
    let root = tempfile::tempdir().unwrap();
    let remote = Arc::new(FakeRemote::default());
    let mut req = churn_request();
    req.artifact = ArtifactUpload::new(std::io::Cursor::new(b"abc".to_vec()), "churn.pkl", 10);

    let failure = publisher(root.path(), remote.clone())
        .run_publish(req)
        .await
        .unwrap_err();
    assert!(failure.as_deployment().is_some());
    assert!(remote.steps().is_empty());
    assert_eq!(leftover(root.path()), 0);
}

// =============================================================================
// Cancellation and concurrency
// =============================================================================

#[tokio::test]
async fn aborted_publish_removes_workspace() {
    let root = tempfile::tempdir().unwrap();
    let remote = Arc::new(FakeRemote {
        hang_at: Some(StepKind::Push),
        ..FakeRemote::default()
    });
    let publisher = publisher(root.path(), remote.clone());

    let task = tokio::spawn(async move { publisher.run_publish(churn_request()).await });
    tokio::time::timeout(Duration::from_secs(5), remote.hanging.notified())
        .await
        .expect("push never started");
    assert_eq!(leftover(root.path()), 1);

    task.abort();
    let joined = task.await;
    assert!(joined.unwrap_err().is_cancelled());
    assert_eq!(leftover(root.path()), 0);
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn concurrent_publishes_use_distinct_workspaces() {
    let root = tempfile::tempdir().unwrap();
    let remote = Arc::new(FakeRemote::default());
    let publisher = publisher(root.path(), remote.clone());

    let handles: Vec<_> = (0..8)
        .map(|_| {
            let publisher = publisher.clone();
            tokio::spawn(async move { publisher.run_publish(churn_request()).await })
        })
        .collect();

    let mut space_ids = HashSet::new();
    for handle in handles {
        space_ids.insert(handle.await.unwrap().unwrap().space_id);
    }
    assert_eq!(space_ids.len(), 8);

    let seen = remote.seen.lock().unwrap();
    let dirs: HashSet<_> = seen
        .iter()
        .filter(|(kind, _)| *kind == StepKind::Init)
        .map(|(_, spec)| spec.cwd.clone())
        .collect();
    assert_eq!(dirs.len(), 8);
    assert_eq!(seen.len(), 8 * StepKind::ALL.len());
    assert_eq!(leftover(root.path()), 0);
}

// =============================================================================
// Credential redaction
// =============================================================================

#[tokio::test]
async fn token_never_reaches_errors_or_logs() {
    let (logs, _guard) = capture_logs();
    let root = tempfile::tempdir().unwrap();
    let remote = Arc::new(FakeRemote::failing_at(
        StepKind::Push,
        CommandOutcome {
            exit_code: 128,
            combined_output: format!(
                "fatal: unable to access 'https://acme:{}@huggingface.co/spaces/acme/x/': 403\n",
                TOKEN
            ),
            timed_out: false,
        },
    ));
    let failure = publisher(root.path(), remote.clone())
        .run_publish(churn_request())
        .await
        .unwrap_err();

    // The runner itself must see the real credential.
    let seen = remote.seen.lock().unwrap();
    assert!(seen[1].1.args.iter().any(|a| a.contains(TOKEN)));

    let deployment = failure.as_deployment().unwrap();
    for rendered in [
        failure.to_string(),
        format!("{:?}", failure),
        deployment.cause_chain(),
        logs.text(),
    ] {
        assert!(!rendered.contains(TOKEN), "token leaked: {}", rendered);
    }
    assert!(deployment.cause_chain().contains("<TOKEN>"));

    let text = logs.text();
    assert!(text.contains("running transport step"));
    assert!(text.contains("publish failed"));
}

#[tokio::test]
async fn token_is_absent_from_success_logs() {
    let (logs, _guard) = capture_logs();
    let root = tempfile::tempdir().unwrap();
    publisher(root.path(), Arc::new(FakeRemote::default()))
        .run_publish(churn_request())
        .await
        .unwrap();

    let text = logs.text();
    assert!(text.contains("publish succeeded"));
    assert!(text.contains("remote-add"));
    assert!(!text.contains(TOKEN));
}
