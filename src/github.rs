//! GitHub REST client: repository listing and fork-origin resolution.

use std::time::Duration;

use serde::Deserialize;
use thiserror::Error;

use crate::credentials::Credentials;
use crate::types::{RepoDescriptor, RepoKind};

const API_ROOT: &str = "https://api.github.com";
const PAGE_SIZE: u32 = 100;
const USER_AGENT: &str = "ghrip";
const REQUEST_TIMEOUT: Duration = Duration::from_secs(30);

/// Errors returned by GitHub API operations.
#[derive(Error, Debug)]
pub enum RemoteError {
    /// The API answered a listing page with a non-success status.
    #[error("GitHub returned HTTP {status} on page {page}")]
    Status { status: u16, page: u32 },
    /// The request never produced an HTTP response.
    #[error("transport error: {0}")]
    Transport(String),
    /// The response body could not be decoded.
    #[error("failed to decode API response: {0}")]
    Decode(#[from] std::io::Error),
}

/// Remote collaborator seam used by the orchestrator.
pub trait RemoteSource {
    /// List every repository of the given kind for a user.
    ///
    /// Fails atomically: a non-success status on any page discards pages
    /// already fetched.
    fn list_repositories(
        &self,
        user: &str,
        kind: RepoKind,
    ) -> Result<Vec<RepoDescriptor>, RemoteError>;

    /// Resolve the upstream original of a forked repository.
    ///
    /// Soft failure: any error yields `None`; callers must tolerate missing
    /// ancestry.
    fn resolve_origin(&self, repo: &RepoDescriptor) -> Option<RepoDescriptor>;
}

/// Full repository object, of which only the nested source matters here.
#[derive(Deserialize)]
struct RepoDetail {
    source: Option<RepoDescriptor>,
}

/// GitHub REST API client.
pub struct GitHubClient {
    agent: ureq::Agent,
    credentials: Credentials,
    api_root: String,
}

impl GitHubClient {
    /// Create a client with the given credentials.
    pub fn new(credentials: Credentials) -> Self {
        Self {
            agent: ureq::builder().timeout(REQUEST_TIMEOUT).build(),
            credentials,
            api_root: API_ROOT.to_string(),
        }
    }

    fn get(&self, url: &str) -> ureq::Request {
        let request = self.agent.get(url).set("User-Agent", USER_AGENT);
        match self.credentials.auth_header() {
            Some(header) => request.set("Authorization", &header),
            None => request,
        }
    }

    fn page_url(&self, user: &str, kind: RepoKind, page: u32) -> String {
        let endpoint = match kind {
            RepoKind::Owned => "repos",
            RepoKind::Starred => "starred",
        };
        format!(
            "{}/users/{}/{}?page={}&per_page={}",
            self.api_root, user, endpoint, page, PAGE_SIZE
        )
    }
}

impl RemoteSource for GitHubClient {
    fn list_repositories(
        &self,
        user: &str,
        kind: RepoKind,
    ) -> Result<Vec<RepoDescriptor>, RemoteError> {
        let mut all = Vec::new();
        let mut page = 1u32;

        loop {
            let url = self.page_url(user, kind, page);
            let response = self.get(&url).call().map_err(|err| match err {
                ureq::Error::Status(status, _) => RemoteError::Status { status, page },
                ureq::Error::Transport(transport) => RemoteError::Transport(transport.to_string()),
            })?;

            let repos: Vec<RepoDescriptor> = response.into_json()?;
            if repos.is_empty() {
                break;
            }
            log::debug!("page {} returned {} {} repos", page, repos.len(), kind);
            all.extend(repos);
            page += 1;
        }

        Ok(all)
    }

    fn resolve_origin(&self, repo: &RepoDescriptor) -> Option<RepoDescriptor> {
        if !repo.fork {
            return None;
        }

        let response = match self.get(&repo.url).call() {
            Ok(response) => response,
            Err(ureq::Error::Status(status, _)) => {
                log::warn!("origin lookup for {} failed: HTTP {}", repo.name, status);
                return None;
            }
            Err(ureq::Error::Transport(transport)) => {
                log::warn!("origin lookup for {} failed: {}", repo.name, transport);
                return None;
            }
        };

        let detail: RepoDetail = match response.into_json() {
            Ok(detail) => detail,
            Err(err) => {
                log::warn!("origin lookup for {} returned bad JSON: {}", repo.name, err);
                return None;
            }
        };

        if detail.source.is_none() {
            log::debug!("{} carries no source repository", repo.name);
        }
        detail.source
    }
}
