// Clean checkout management for the data repository
//
// Every run starts from a pristine tree: first run clones, later runs
// fetch and hard-reset, discarding anything a previous run left behind.
// The checkout always uses the credential-free repository URL; the push
// credential exists only for the duration of the push command.

use crate::config::RepositoryConfig;
use crate::errors::GitError;
use crate::git::process::run_git;
use std::path::{Path, PathBuf};
use tracing::{info, instrument};

/// Manages the single working tree the pipeline operates on
pub struct GitWorkspace {
    config: RepositoryConfig,
}

impl GitWorkspace {
    pub fn new(config: RepositoryConfig) -> Self {
        Self { config }
    }

    pub fn path(&self) -> PathBuf {
        PathBuf::from(&self.config.workspace_dir)
    }

    /// Produce a clean checkout of the configured branch
    ///
    /// Returns the workspace path. The resulting tree matches the remote
    /// branch head exactly; untracked files are removed.
    #[instrument(skip(self), fields(branch = %self.config.branch))]
    pub async fn ensure_clean_checkout(&self) -> Result<PathBuf, GitError> {
        let path = self.path();

        if path.join(".git").is_dir() {
            self.reset_existing(&path).await?;
        } else if path.exists() && path.read_dir().map(|mut d| d.next().is_some()).unwrap_or(true) {
            // A non-empty directory that is not a checkout cannot be reused
            return Err(GitError::InvalidWorkspace(path.display().to_string()));
        } else {
            self.clone_fresh(&path).await?;
        }

        info!(path = %path.display(), "Workspace is clean");
        Ok(path)
    }

    async fn clone_fresh(&self, path: &Path) -> Result<(), GitError> {
        if let Some(parent) = path.parent() {
            if !parent.as_os_str().is_empty() {
                std::fs::create_dir_all(parent)
                    .map_err(|e| GitError::SpawnFailed(e.to_string()))?;
            }
        }

        info!(url = %self.config.url, "Cloning data repository");
        run_git(
            None,
            &[
                "clone",
                "--branch",
                &self.config.branch,
                "--single-branch",
                &self.config.url,
                &path.display().to_string(),
            ],
            &[],
        )
        .await?;
        Ok(())
    }

    async fn reset_existing(&self, path: &Path) -> Result<(), GitError> {
        run_git(
            Some(path),
            &["fetch", &self.config.remote, &self.config.branch],
            &[],
        )
        .await?;
        run_git(
            Some(path),
            &["checkout", "-f", "-B", &self.config.branch, "FETCH_HEAD"],
            &[],
        )
        .await?;
        run_git(Some(path), &["clean", "-fd"], &[]).await?;
        Ok(())
    }
}
