//! Clone outcome records and the on-disk analytics ledger.
//!
//! The ledger is a single JSON document mapping repository name to the most
//! recent outcome for that name. It is read fully before a run, mutated only
//! by the orchestrator's collecting loop, and rewritten fully at the end.

use std::collections::BTreeMap;
use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

use chrono::Utc;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::types::RepoDescriptor;

/// Errors returned by ledger persistence.
#[derive(Error, Debug)]
pub enum LedgerError {
    /// An underlying IO operation failed.
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
    /// The ledger document could not be parsed or serialized.
    #[error("malformed ledger document: {0}")]
    Malformed(#[from] serde_json::Error),
}

/// Result of one clone attempt sequence.
///
/// Success outcomes carry the full analytics payload; failure outcomes carry
/// only the name, the flags, the attempt count, and the error text. The
/// constructors enforce this split, and the serialized field names match the
/// ledger document layout.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CloneOutcome {
    /// Repository name, the ledger key.
    pub name: String,
    /// Whether the clone sequence ended in success.
    pub success: bool,
    /// Completion timestamp (RFC 3339), success only.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub last_ripped: Option<String>,
    /// Star count at listing time, success only.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub stars: Option<u64>,
    /// Fork count at listing time, success only.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub forks: Option<u64>,
    /// Wall-clock seconds across the whole attempt loop, success only.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub clone_time: Option<f64>,
    /// Whether the cloned repository is a fork.
    #[serde(default)]
    pub is_fork: bool,
    /// True when this outcome is for the upstream original of a fork.
    #[serde(default)]
    pub original_cloned: bool,
    /// Whether LFS content was fetched for this clone.
    #[serde(default)]
    pub lfs_supported: bool,
    /// Number of attempts consumed before success or exhaustion.
    #[serde(default)]
    pub attempts: u32,
    /// HEAD commit of the clone, when it could be resolved.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub head_commit: Option<String>,
    /// Redacted error text from the external tool, failure only.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl CloneOutcome {
    /// Outcome for a clone sequence that succeeded.
    pub fn success(
        repo: &RepoDescriptor,
        original_cloned: bool,
        lfs_supported: bool,
        clone_time: Duration,
        attempts: u32,
        head_commit: Option<String>,
    ) -> Self {
        Self {
            name: repo.name.clone(),
            success: true,
            last_ripped: Some(Utc::now().to_rfc3339()),
            stars: Some(repo.stargazers_count),
            forks: Some(repo.forks_count),
            clone_time: Some(clone_time.as_secs_f64()),
            is_fork: repo.fork,
            original_cloned,
            lfs_supported,
            attempts,
            head_commit,
            error: None,
        }
    }

    /// Outcome for a clone sequence that exhausted its attempts.
    pub fn failure(
        repo: &RepoDescriptor,
        original_cloned: bool,
        lfs_supported: bool,
        attempts: u32,
        error: String,
    ) -> Self {
        Self {
            name: repo.name.clone(),
            success: false,
            last_ripped: None,
            stars: None,
            forks: None,
            clone_time: None,
            is_fork: repo.fork,
            original_cloned,
            lfs_supported,
            attempts,
            head_commit: None,
            error: Some(error),
        }
    }
}

/// Analytics ledger: repository name → most recent outcome.
#[derive(Debug, Default)]
pub struct Ledger {
    entries: BTreeMap<String, CloneOutcome>,
}

impl Ledger {
    /// Deterministic ledger path for a user.
    pub fn path_for(directory: &Path, user: &str) -> PathBuf {
        directory.join(format!("{user}_repo_analytics.json"))
    }

    /// Load the ledger document; an absent file yields an empty ledger.
    pub fn load(path: &Path) -> Result<Self, LedgerError> {
        if !path.exists() {
            return Ok(Self::default());
        }
        let contents = fs::read_to_string(path)?;
        let entries = serde_json::from_str(&contents)?;
        Ok(Self { entries })
    }

    /// Rewrite the whole ledger document.
    pub fn save(&self, path: &Path) -> Result<(), LedgerError> {
        if let Some(parent) = path.parent() {
            if !parent.as_os_str().is_empty() {
                fs::create_dir_all(parent)?;
            }
        }
        let json = serde_json::to_string_pretty(&self.entries)?;
        fs::write(path, json)?;
        Ok(())
    }

    /// Record an outcome, replacing any earlier entry for the same name.
    pub fn record(&mut self, outcome: CloneOutcome) {
        self.entries.insert(outcome.name.clone(), outcome);
    }

    /// Look up the outcome for a repository name.
    pub fn get(&self, name: &str) -> Option<&CloneOutcome> {
        self.entries.get(name)
    }

    /// Number of entries.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// True when the ledger holds no entries.
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}
