//! Single-use publish workspaces.
//!
//! A [`Workspace`] is created for exactly one publish attempt and removed when
//! it is released or dropped, whichever happens first. Dropping covers early
//! returns, panics and cancelled futures. Removal failures are logged and
//! never replace the outcome of the attempt.

use std::fmt;
use std::path::{Path, PathBuf};

use tempfile::TempDir;
use tracing::{debug, error, info};

use crate::error::PublishError;

/// Prefix of every workspace directory name.
pub const WORKSPACE_PREFIX: &str = "publish-";

/// Lifecycle of one publish attempt.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum PublishState {
    Created,
    Populating,
    Publishing,
    Succeeded,
    Failed,
}

impl PublishState {
    pub fn as_str(&self) -> &'static str {
        match self {
            PublishState::Created => "created",
            PublishState::Populating => "populating",
            PublishState::Publishing => "publishing",
            PublishState::Succeeded => "succeeded",
            PublishState::Failed => "failed",
        }
    }

    pub fn is_terminal(&self) -> bool {
        matches!(self, PublishState::Succeeded | PublishState::Failed)
    }

    pub fn can_transition_to(&self, next: PublishState) -> bool {
        use PublishState::*;
        matches!(
            (self, next),
            (Created, Populating)
                | (Created, Failed)
                | (Populating, Publishing)
                | (Populating, Failed)
                | (Publishing, Succeeded)
                | (Publishing, Failed)
        )
    }
}

impl fmt::Display for PublishState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Exclusively owned scratch directory for one publish attempt.
pub struct Workspace {
    dir: Option<TempDir>,
    path: PathBuf,
    state: PublishState,
}

impl Workspace {
    /// Create a uniquely named directory under `root`, creating `root` if needed.
    pub fn create(root: &Path) -> Result<Self, PublishError> {
        std::fs::create_dir_all(root).map_err(|e| PublishError::io_at("create", root, e))?;
        let dir = tempfile::Builder::new()
            .prefix(WORKSPACE_PREFIX)
            .tempdir_in(root)
            .map_err(|e| PublishError::io(format!("failed to create workspace in {}", root.display()), e))?;
        let path = dir.path().to_path_buf();
        info!(path = %path.display(), "created workspace");

        Ok(Self {
            dir: Some(dir),
            path,
            state: PublishState::Created,
        })
    }

    /// [`Workspace::create`] on the blocking pool.
    pub async fn open(root: &Path) -> Result<Self, PublishError> {
        let root = root.to_path_buf();
        tokio::task::spawn_blocking(move || Self::create(&root))
            .await
            .map_err(|e| PublishError::io("workspace creation task failed", std::io::Error::other(e)))?
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn state(&self) -> PublishState {
        self.state
    }

    /// Move to `next` if the transition is allowed. Returns whether it moved.
    pub fn advance(&mut self, next: PublishState) -> bool {
        if !self.state.can_transition_to(next) {
            debug!(from = %self.state, to = %next, "ignoring invalid workspace transition");
            return false;
        }
        debug!(from = %self.state, to = %next, path = %self.path.display(), "workspace transition");
        self.state = next;
        true
    }

    /// Remove the directory now. Returns whether removal succeeded.
    pub fn release(mut self) -> bool {
        self.teardown()
    }

    /// [`Workspace::release`] on the blocking pool.
    pub async fn close(mut self) -> bool {
        let Some(dir) = self.dir.take() else {
            return true;
        };
        let path = self.path.clone();
        let state = self.state;
        match tokio::task::spawn_blocking(move || dir.close()).await {
            Ok(result) => log_removal(&path, state, result),
            Err(e) => log_removal(&path, state, Err(std::io::Error::other(e))),
        }
    }

    fn teardown(&mut self) -> bool {
        let Some(dir) = self.dir.take() else {
            return true;
        };
        log_removal(&self.path, self.state, dir.close())
    }
}

fn log_removal(path: &Path, state: PublishState, result: std::io::Result<()>) -> bool {
    match result {
        Ok(()) => {
            info!(path = %path.display(), state = %state, "removed workspace");
            true
        }
        Err(e) => {
            error!(
                path = %path.display(),
                state = %state,
                error = %e,
                "failed to remove workspace"
            );
            false
        }
    }
}

impl Drop for Workspace {
    fn drop(&mut self) {
        self.teardown();
    }
}

impl fmt::Debug for Workspace {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Workspace")
            .field("path", &self.path)
            .field("state", &self.state)
            .finish()
    }
}
