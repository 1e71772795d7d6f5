//! Publisher configuration loading from environment variables.
//!
//! All configuration values are loaded from `PUBLISH_*` environment variables
//! with sensible defaults. Invalid values fall back to defaults without crashing.
//! The hosting token is read but never printed.
//!
//! # Environment Variables
//!
//! | Variable | Default | Description |
//! |---|---|---|
//! | `PUBLISH_ACCOUNT` | (empty) | Hosting account owning published spaces |
//! | `PUBLISH_TOKEN` | (empty) | Hosting token embedded in the remote URL |
//! | `PUBLISH_HOST` | huggingface.co | Remote host |
//! | `PUBLISH_NAMESPACE` | spaces | Path segment between host and space id |
//! | `PUBLISH_WORKSPACE_ROOT` | `<tmp>/space-publish` | Parent of workspaces |
//! | `PUBLISH_STEP_TIMEOUT` | 180 | Per-step timeout (secs) |
//! | `PUBLISH_GIT_BIN` | git | Version-control client |
//! | `PUBLISH_OUTPUT_POLICY` | lenient | `lenient` or `strict` |
//! | `PUBLISH_COMMIT_NAME` | space-publish | Commit author name |
//! | `PUBLISH_COMMIT_EMAIL` | space-publish@localhost | Commit author email |
//! | `PUBLISH_TEMPLATES` | (unset) | TOML template set replacing the built-in one |
//! | `PUBLISH_LOG_FORMAT` | json | `json` or `pretty` |
//! | `PUBLISH_LOG_LEVEL` | info | `EnvFilter` directive |
//! | `PUBLISH_LOG_FILE` | (unset) | Append logs to this file instead of stderr |

use std::path::PathBuf;
use std::time::Duration;

use crate::publisher::{HostingTarget, PublisherConfig};
use crate::telemetry::{LogConfig, LogFormat};
use crate::transport::{CommitIdentity, OutputPolicy, TransportConfig};

pub const DEFAULT_HOST: &str = "huggingface.co";
pub const DEFAULT_NAMESPACE: &str = "spaces";
pub const DEFAULT_STEP_TIMEOUT_SECS: u64 = 180;
pub const DEFAULT_GIT_BIN: &str = "git";
pub const DEFAULT_COMMIT_NAME: &str = "space-publish";
pub const DEFAULT_COMMIT_EMAIL: &str = "space-publish@localhost";
pub const DEFAULT_LOG_LEVEL: &str = "info";

/// Every variable read by [`load`], in documentation order.
pub const ENV_KEYS: &[&str] = &[
    "PUBLISH_ACCOUNT",
    "PUBLISH_TOKEN",
    "PUBLISH_HOST",
    "PUBLISH_NAMESPACE",
    "PUBLISH_WORKSPACE_ROOT",
    "PUBLISH_STEP_TIMEOUT",
    "PUBLISH_GIT_BIN",
    "PUBLISH_OUTPUT_POLICY",
    "PUBLISH_COMMIT_NAME",
    "PUBLISH_COMMIT_EMAIL",
    "PUBLISH_TEMPLATES",
    "PUBLISH_LOG_FORMAT",
    "PUBLISH_LOG_LEVEL",
    "PUBLISH_LOG_FILE",
];

/// Effective configuration summary, safe to print.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EffectiveConfig {
    pub account: String,
    /// `<redacted>` or `<unset>`, never the token.
    pub token: &'static str,
    pub host: String,
    pub namespace: String,
    pub workspace_root: String,
    pub step_timeout_secs: u64,
    pub git_bin: String,
    pub output_policy: &'static str,
    pub commit_name: String,
    pub commit_email: String,
    pub templates: String,
    pub log_format: &'static str,
    pub log_level: String,
    pub log_file: String,
}

impl EffectiveConfig {
    /// `(variable, value)` pairs in documentation order.
    pub fn entries(&self) -> Vec<(&'static str, String)> {
        vec![
            ("PUBLISH_ACCOUNT", self.account.clone()),
            ("PUBLISH_TOKEN", self.token.to_string()),
            ("PUBLISH_HOST", self.host.clone()),
            ("PUBLISH_NAMESPACE", self.namespace.clone()),
            ("PUBLISH_WORKSPACE_ROOT", self.workspace_root.clone()),
            ("PUBLISH_STEP_TIMEOUT", self.step_timeout_secs.to_string()),
            ("PUBLISH_GIT_BIN", self.git_bin.clone()),
            ("PUBLISH_OUTPUT_POLICY", self.output_policy.to_string()),
            ("PUBLISH_COMMIT_NAME", self.commit_name.clone()),
            ("PUBLISH_COMMIT_EMAIL", self.commit_email.clone()),
            ("PUBLISH_TEMPLATES", self.templates.clone()),
            ("PUBLISH_LOG_FORMAT", self.log_format.to_string()),
            ("PUBLISH_LOG_LEVEL", self.log_level.clone()),
            ("PUBLISH_LOG_FILE", self.log_file.clone()),
        ]
    }
}

/// All publisher configuration loaded from environment variables.
#[derive(Clone)]
pub struct EnvConfig {
    pub account: String,
    pub token: String,
    pub host: String,
    pub namespace: String,
    pub workspace_root: PathBuf,
    pub step_timeout: Duration,
    pub git_bin: String,
    pub output_policy: OutputPolicy,
    pub identity: CommitIdentity,
    pub templates: Option<PathBuf>,
    pub log: LogConfig,
}

impl std::fmt::Debug for EnvConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("EnvConfig")
            .field("effective", &self.effective_config())
            .finish()
    }
}

/// Default parent directory for workspaces.
pub fn default_workspace_root() -> PathBuf {
    std::env::temp_dir().join("space-publish")
}

/// Parse a `u64` env var, returning `default` on missing or invalid.
fn parse_u64(key: &str, default: u64) -> u64 {
    match std::env::var(key) {
        Ok(val) => val.trim().parse::<u64>().unwrap_or(default),
        Err(_) => default,
    }
}

/// Read a string env var, returning `default` on missing or blank.
fn parse_string(key: &str, default: &str) -> String {
    match std::env::var(key) {
        Ok(val) if !val.trim().is_empty() => val.trim().to_string(),
        _ => default.to_string(),
    }
}

/// Parse any `FromStr` env var, returning the type's default on missing or invalid.
fn parse_enum<T: std::str::FromStr + Default>(key: &str) -> T {
    std::env::var(key)
        .ok()
        .and_then(|val| val.parse::<T>().ok())
        .unwrap_or_default()
}

fn parse_path(key: &str) -> Option<PathBuf> {
    std::env::var_os(key)
        .filter(|val| !val.is_empty())
        .map(PathBuf::from)
}

/// Load all configuration from environment variables.
///
/// Missing or invalid values fall back to safe defaults without panicking.
pub fn load() -> EnvConfig {
    let step_secs = parse_u64("PUBLISH_STEP_TIMEOUT", DEFAULT_STEP_TIMEOUT_SECS).max(1);

    EnvConfig {
        account: parse_string("PUBLISH_ACCOUNT", ""),
        token: std::env::var("PUBLISH_TOKEN").unwrap_or_default().trim().to_string(),
        host: parse_string("PUBLISH_HOST", DEFAULT_HOST),
        namespace: parse_string("PUBLISH_NAMESPACE", DEFAULT_NAMESPACE),
        workspace_root: parse_path("PUBLISH_WORKSPACE_ROOT").unwrap_or_else(default_workspace_root),
        step_timeout: Duration::from_secs(step_secs),
        git_bin: parse_string("PUBLISH_GIT_BIN", DEFAULT_GIT_BIN),
        output_policy: parse_enum("PUBLISH_OUTPUT_POLICY"),
        identity: CommitIdentity {
            name: parse_string("PUBLISH_COMMIT_NAME", DEFAULT_COMMIT_NAME),
            email: parse_string("PUBLISH_COMMIT_EMAIL", DEFAULT_COMMIT_EMAIL),
        },
        templates: parse_path("PUBLISH_TEMPLATES"),
        log: LogConfig {
            format: parse_enum::<LogFormat>("PUBLISH_LOG_FORMAT"),
            level: parse_string("PUBLISH_LOG_LEVEL", DEFAULT_LOG_LEVEL),
            output_path: parse_path("PUBLISH_LOG_FILE"),
        },
    }
}

impl EnvConfig {
    /// Return a printable summary of all effective values.
    pub fn effective_config(&self) -> EffectiveConfig {
        EffectiveConfig {
            account: self.account.clone(),
            token: if self.token.is_empty() { "<unset>" } else { "<redacted>" },
            host: self.host.clone(),
            namespace: self.namespace.clone(),
            workspace_root: self.workspace_root.display().to_string(),
            step_timeout_secs: self.step_timeout.as_secs(),
            git_bin: self.git_bin.clone(),
            output_policy: self.output_policy.as_str(),
            commit_name: self.identity.name.clone(),
            commit_email: self.identity.email.clone(),
            templates: self
                .templates
                .as_ref()
                .map(|p| p.display().to_string())
                .unwrap_or_else(|| "<builtin>".to_string()),
            log_format: self.log.format.as_str(),
            log_level: self.log.level.clone(),
            log_file: self
                .log
                .output_path
                .as_ref()
                .map(|p| p.display().to_string())
                .unwrap_or_else(|| "<stderr>".to_string()),
        }
    }

    /// Problems that would make a publish fail or misbehave.
    pub fn validate(&self) -> Vec<String> {
        let mut warnings = Vec::new();

        if self.account.is_empty() {
            warnings.push("PUBLISH_ACCOUNT is not set; spaces have no owner".to_string());
        } else if self.account.contains(&['/', ':', '@'][..]) || self.account.chars().any(char::is_whitespace) {
            warnings.push(format!(
                "PUBLISH_ACCOUNT ({}) contains characters that break the remote URL",
                self.account
            ));
        }
        if self.token.is_empty() {
            warnings.push("PUBLISH_TOKEN is not set; pushes will be rejected".to_string());
        }
        if self.workspace_root.exists() && !self.workspace_root.is_dir() {
            warnings.push(format!(
                "PUBLISH_WORKSPACE_ROOT ({}) is not a directory",
                self.workspace_root.display()
            ));
        }
        if let Some(path) = &self.templates {
            if !path.is_file() {
                warnings.push(format!("PUBLISH_TEMPLATES ({}) is not a file", path.display()));
            }
        }
        if let Some(path) = &self.log.output_path {
            let parent = path.parent().filter(|p| !p.as_os_str().is_empty());
            if path.is_dir() || parent.is_some_and(|p| !p.is_dir()) {
                warnings.push(format!("PUBLISH_LOG_FILE ({}) cannot be opened", path.display()));
            }
        }
        warnings
    }

    pub fn hosting_target(&self) -> HostingTarget {
        HostingTarget {
            host: self.host.clone(),
            namespace: self.namespace.clone(),
            account: self.account.clone(),
            token: self.token.clone(),
        }
    }

    pub fn transport_config(&self) -> TransportConfig {
        TransportConfig {
            program: self.git_bin.clone(),
            step_timeout: self.step_timeout,
            output_policy: self.output_policy,
            identity: self.identity.clone(),
        }
    }

    pub fn publisher_config(&self) -> PublisherConfig {
        PublisherConfig {
            target: self.hosting_target(),
            workspace_root: self.workspace_root.clone(),
            transport: self.transport_config(),
        }
    }
}
