//! Fixed-size worker pool for clone execution.
//!
//! Workers pull jobs from a shared channel and push every outcome to a
//! result channel that the orchestrator alone drains; the ledger is never
//! touched from a worker thread. Concurrency is capped by the pool size to
//! bound outbound network and disk load, independent of how many jobs are
//! submitted.

use crossbeam_channel::{Receiver, Sender, unbounded};
use std::sync::Arc;
use std::thread::{self, JoinHandle};

use crate::analytics::CloneOutcome;
use crate::clone::Cloner;
use crate::types::RepoDescriptor;

/// Default number of concurrent clone workers.
pub const DEFAULT_WORKERS: usize = 32;

/// One unit of work: a repository to clone.
pub struct CloneJob {
    /// The repository to clone.
    pub repo: RepoDescriptor,
    /// Whether this is the upstream original of a fork.
    pub is_original: bool,
}

/// Handle to a pool of clone workers.
pub struct ClonePool {
    job_tx: Option<Sender<CloneJob>>,
    result_rx: Receiver<CloneOutcome>,
    threads: Vec<JoinHandle<()>>,
}

impl ClonePool {
    /// Spawn `size` worker threads executing jobs with `cloner`.
    pub fn spawn(size: usize, cloner: Arc<dyn Cloner>) -> Self {
        let (job_tx, job_rx) = unbounded::<CloneJob>();
        let (result_tx, result_rx) = unbounded();

        let threads = (0..size.max(1))
            .map(|i| {
                let job_rx = job_rx.clone();
                let result_tx = result_tx.clone();
                let cloner = Arc::clone(&cloner);
                thread::Builder::new()
                    .name(format!("ghrip-worker-{i}"))
                    .spawn(move || worker_loop(&job_rx, &result_tx, cloner.as_ref()))
                    .expect("failed to spawn worker thread")
            })
            .collect();

        Self {
            job_tx: Some(job_tx),
            result_rx,
            threads,
        }
    }

    /// Submit a job. Returns false if the pool is already shut down.
    pub fn submit(&self, job: CloneJob) -> bool {
        match &self.job_tx {
            Some(tx) => tx.send(job).is_ok(),
            None => false,
        }
    }

    /// Receiver for completed outcomes, in completion order.
    pub fn results(&self) -> &Receiver<CloneOutcome> {
        &self.result_rx
    }

    /// Close the job channel and wait for workers to drain and exit.
    pub fn shutdown(&mut self) {
        self.job_tx.take();
        for thread in self.threads.drain(..) {
            let _ = thread.join();
        }
    }
}

impl Drop for ClonePool {
    fn drop(&mut self) {
        self.shutdown();
    }
}

fn worker_loop(job_rx: &Receiver<CloneJob>, result_tx: &Sender<CloneOutcome>, cloner: &dyn Cloner) {
    while let Ok(job) = job_rx.recv() {
        let outcome = cloner.clone_repo(&job.repo, job.is_original);
        if result_tx.send(outcome).is_err() {
            // Orchestrator went away; nothing left to report to.
            break;
        }
    }
}
