//! Clone executor: one bounded-retry clone sequence per repository.
//!
//! Every invocation produces a [`CloneOutcome`] value, success or failure;
//! no error ever escapes to the caller. Invocations touch no shared state
//! and write only under their own destination path, so they are safe to run
//! concurrently without synchronization.

use std::path::{Path, PathBuf};
use std::time::Instant;

use crate::analytics::CloneOutcome;
use crate::credentials::Credentials;
use crate::git::{self, GitCli, GitError};
use crate::retry::RetryPolicy;
use crate::types::RepoDescriptor;

/// Executes clones for the orchestrator.
pub trait Cloner: Send + Sync {
    /// Clone one repository, retrying per the executor's policy.
    ///
    /// `is_original` marks the upstream-of-a-fork clone, which lands under a
    /// qualified destination so it cannot collide with the fork's own clone.
    fn clone_repo(&self, repo: &RepoDescriptor, is_original: bool) -> CloneOutcome;
}

/// Clone executor backed by the system git CLI.
pub struct CloneExecutor {
    git: GitCli,
    retry: RetryPolicy,
    credentials: Credentials,
    destination: PathBuf,
    depth: Option<u32>,
    lfs_enabled: bool,
}

impl CloneExecutor {
    /// Create an executor cloning into `destination`.
    pub fn new(
        destination: PathBuf,
        depth: Option<u32>,
        credentials: Credentials,
        lfs_enabled: bool,
    ) -> Self {
        Self {
            git: GitCli::new(),
            retry: RetryPolicy::default(),
            credentials,
            destination,
            depth,
            lfs_enabled,
        }
    }

    /// Override the retry policy.
    pub fn with_retry(mut self, retry: RetryPolicy) -> Self {
        self.retry = retry;
        self
    }

    #[cfg(test)]
    fn with_git(mut self, git: GitCli) -> Self {
        self.git = git;
        self
    }

    /// Destination for a repository clone.
    ///
    /// Upstream originals go under `<name>_original/<name>` so a fork and
    /// its upstream cloned in the same run land on distinct paths.
    fn clone_destination(&self, name: &str, is_original: bool) -> PathBuf {
        if is_original {
            self.destination.join(format!("{name}_original")).join(name)
        } else {
            self.destination.join(name)
        }
    }

    /// One full clone attempt: checkout-free clone, plain checkout, and the
    /// LFS fetch/checkout pair when LFS is enabled.
    fn attempt(&self, url: &str, repo_dir: &Path) -> Result<(), GitError> {
        self.git.clone_no_checkout(url, repo_dir, self.depth)?;
        self.git.checkout(repo_dir)?;
        if self.lfs_enabled {
            self.git.lfs_fetch_all(repo_dir)?;
            self.git.lfs_checkout(repo_dir)?;
        }
        Ok(())
    }
}

impl Cloner for CloneExecutor {
    fn clone_repo(&self, repo: &RepoDescriptor, is_original: bool) -> CloneOutcome {
        if let Err(err) = git::validate_name(&repo.name, "repository name") {
            return CloneOutcome::failure(
                repo,
                is_original,
                self.lfs_enabled,
                0,
                err.to_string(),
            );
        }

        let repo_dir = self.clone_destination(&repo.name, is_original);
        let url = self.credentials.authenticated_url(&repo.clone_url);
        // Only directories created by this invocation may be cleaned up
        // between attempts.
        let preexisting = repo_dir.exists();
        let started = Instant::now();

        let result = self.retry.run(|attempt| {
            if attempt > 1 {
                log::debug!("retrying clone of {} (attempt {})", repo.name, attempt);
                if !preexisting && repo_dir.exists() {
                    let _ = std::fs::remove_dir_all(&repo_dir);
                }
            }
            self.attempt(&url, &repo_dir)
        });

        match result {
            Ok(((), attempts)) => {
                let elapsed = started.elapsed();
                let head_commit = git::head_commit(&repo_dir);
                log::info!(
                    "cloned {} in {:.2}s (attempt {})",
                    repo.name,
                    elapsed.as_secs_f64(),
                    attempts
                );
                CloneOutcome::success(
                    repo,
                    is_original,
                    self.lfs_enabled,
                    elapsed,
                    attempts,
                    head_commit,
                )
            }
            Err((err, attempts)) => {
                let message = self.credentials.redact(&err.to_string());
                log::warn!(
                    "failed to clone {} after {} attempts: {}",
                    repo.name,
                    attempts,
                    message
                );
                CloneOutcome::failure(repo, is_original, self.lfs_enabled, attempts, message)
            }
        }
    }
}
