//! Shared types for ghrip

use serde::{Deserialize, Serialize};
use std::fmt;

/// Which set of a user's repositories to list.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RepoKind {
    /// Repositories the user owns.
    Owned,
    /// Repositories the user has starred.
    Starred,
}

impl fmt::Display for RepoKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RepoKind::Owned => write!(f, "owned"),
            RepoKind::Starred => write!(f, "starred"),
        }
    }
}

/// One remote repository as returned by the GitHub API.
///
/// Only the fields the engine consumes are kept; everything else in the API
/// object is ignored during deserialization. Descriptors are immutable once
/// produced by the lister or the fork resolver.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RepoDescriptor {
    /// Repository name, unique within a user's set.
    pub name: String,
    /// HTTPS clone URL.
    pub clone_url: String,
    /// Whether this repository is a fork.
    #[serde(default)]
    pub fork: bool,
    /// Star count at listing time.
    #[serde(default)]
    pub stargazers_count: u64,
    /// Fork count at listing time.
    #[serde(default)]
    pub forks_count: u64,
    /// Canonical API URL, used for fork-origin lookup.
    pub url: String,
}
