//! Clone orchestration: drive a whole run from listing to ledger flush.
//!
//! The run moves through Listing, Dispatching, Collecting, and Finalizing.
//! Listing failure or an empty result set is fatal; everything after that
//! point is isolated per repository. All ledger merges happen on the calling
//! thread: workers only ever hand outcomes back over a channel.

use std::path::PathBuf;
use std::sync::Arc;
use std::time::{Duration, Instant};

use indicatif::{ProgressBar, ProgressStyle};
use thiserror::Error;

use crate::analytics::{Ledger, LedgerError};
use crate::clone::Cloner;
use crate::github::{RemoteError, RemoteSource};
use crate::pool::{CloneJob, ClonePool};
use crate::types::{RepoDescriptor, RepoKind};

/// Fatal run-level failures.
#[derive(Error, Debug)]
pub enum RunError {
    /// Listing the user's repositories failed.
    #[error("failed to list repositories: {0}")]
    Listing(#[from] RemoteError),
    /// The listing succeeded but came back empty.
    #[error("no repositories found for user {0}")]
    NoRepositories(String),
    /// The ledger could not be read or written.
    #[error("ledger error: {0}")]
    Ledger(#[from] LedgerError),
}

/// Per-run configuration.
pub struct RunConfig {
    /// GitHub username whose repositories are cloned.
    pub user: String,
    /// Owned or starred listing.
    pub kind: RepoKind,
    /// Path of the analytics ledger document.
    pub ledger_path: PathBuf,
    /// Also resolve and clone the upstream original of every fork.
    pub sync_forks: bool,
    /// Worker pool size.
    pub workers: usize,
}

/// End-of-run statistics.
#[derive(Debug)]
pub struct RunSummary {
    /// Clone sequences submitted this run.
    pub attempted: usize,
    /// Clone sequences that ended in success.
    pub succeeded: usize,
    /// Successful upstream-original clones (sync mode).
    pub originals_cloned: usize,
    /// Wall-clock duration of dispatch + collection.
    pub elapsed: Duration,
}

impl RunSummary {
    /// Successful clones per minute over the whole run.
    pub fn rate_per_minute(&self) -> f64 {
        let secs = self.elapsed.as_secs_f64();
        if secs == 0.0 {
            return 0.0;
        }
        self.succeeded as f64 / secs * 60.0
    }
}

/// Drives one run against a remote source and a cloner.
pub struct Orchestrator<S> {
    source: S,
    cloner: Arc<dyn Cloner>,
    config: RunConfig,
}

impl<S: RemoteSource> Orchestrator<S> {
    /// Create an orchestrator for one run.
    pub fn new(source: S, cloner: Arc<dyn Cloner>, config: RunConfig) -> Self {
        Self {
            source,
            cloner,
            config,
        }
    }

    /// Run the full pipeline.
    ///
    /// The ledger file is written exactly once, after every submitted clone
    /// has completed; a listing failure leaves it untouched.
    pub fn run(&self) -> Result<RunSummary, RunError> {
        // Listing
        let repos = self
            .source
            .list_repositories(&self.config.user, self.config.kind)?;
        if repos.is_empty() {
            return Err(RunError::NoRepositories(self.config.user.clone()));
        }
        log::info!(
            "found {} {} repositories for {}",
            repos.len(),
            self.config.kind,
            self.config.user
        );

        let mut ledger = Ledger::load(&self.config.ledger_path)?;
        let started = Instant::now();

        // Dispatching
        let mut pool = ClonePool::spawn(self.config.workers, Arc::clone(&self.cloner));
        let mut submitted = 0usize;
        for repo in &repos {
            if pool.submit(CloneJob {
                repo: repo.clone(),
                is_original: false,
            }) {
                submitted += 1;
            }
        }

        if self.config.sync_forks {
            submitted += self.dispatch_fork_origins(&repos, &pool);
        }

        // Collecting: completion order, single-threaded ledger merge.
        let bar = progress_bar(submitted as u64, "cloning");
        let mut succeeded = 0usize;
        let mut originals_cloned = 0usize;
        for _ in 0..submitted {
            let outcome = match pool.results().recv() {
                Ok(outcome) => outcome,
                // Workers are gone; everything received so far stays merged.
                Err(_) => break,
            };
            if outcome.success {
                succeeded += 1;
                if outcome.original_cloned {
                    originals_cloned += 1;
                }
            } else {
                bar.println(format!(
                    "Failed to clone {}: {}",
                    outcome.name,
                    outcome.error.as_deref().unwrap_or("unknown error")
                ));
            }
            ledger.record(outcome);
            bar.inc(1);
        }
        bar.finish_and_clear();
        pool.shutdown();

        // Finalizing
        let elapsed = started.elapsed();
        ledger.save(&self.config.ledger_path)?;
        log::info!(
            "run complete: {}/{} cloned in {:.2}s",
            succeeded,
            submitted,
            elapsed.as_secs_f64()
        );

        Ok(RunSummary {
            attempted: submitted,
            succeeded,
            originals_cloned,
            elapsed,
        })
    }

    /// Resolve fork origins sequentially and submit each found upstream.
    /// Returns how many extra jobs were submitted.
    fn dispatch_fork_origins(&self, repos: &[RepoDescriptor], pool: &ClonePool) -> usize {
        let forks: Vec<&RepoDescriptor> = repos.iter().filter(|repo| repo.fork).collect();
        if forks.is_empty() {
            return 0;
        }
        log::info!("resolving origins for {} forked repositories", forks.len());

        let bar = progress_bar(forks.len() as u64, "fetching originals");
        let mut extra = 0;
        for fork in forks {
            if let Some(origin) = self.source.resolve_origin(fork) {
                if pool.submit(CloneJob {
                    repo: origin,
                    is_original: true,
                }) {
                    extra += 1;
                }
            }
            bar.inc(1);
        }
        bar.finish_and_clear();
        extra
    }
}

fn progress_bar(total: u64, message: &'static str) -> ProgressBar {
    let bar = ProgressBar::new(total);
    let style = ProgressStyle::with_template("{msg} [{bar:40}] {pos}/{len}")
        .unwrap_or_else(|_| ProgressStyle::default_bar())
        .progress_chars("=> ");
    bar.set_style(style);
    bar.set_message(message);
    bar
}
