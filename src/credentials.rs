//! GitHub token handling.
//!
//! A single [`Credentials`] value is shared by the API client (token as an
//! `Authorization` header) and the clone executor (token embedded into the
//! https clone URL for git). Any text that may contain the embedded form,
//! such as captured git stderr, must pass through [`Credentials::redact`]
//! before it is logged or written to the ledger.

use std::fmt;

/// Placeholder substituted for the token in redacted text.
const REDACTED: &str = "[REDACTED]";

/// Optional GitHub access token.
#[derive(Clone, Default)]
pub struct Credentials {
    token: Option<String>,
}

impl Credentials {
    /// Wrap an optional token. Empty strings count as no token.
    pub fn new(token: Option<String>) -> Self {
        Self {
            token: token.filter(|t| !t.is_empty()),
        }
    }

    /// Credentials without a token.
    pub fn anonymous() -> Self {
        Self::default()
    }

    /// True when no token is configured.
    pub fn is_anonymous(&self) -> bool {
        self.token.is_none()
    }

    /// Value for the `Authorization` header, if a token is present.
    pub fn auth_header(&self) -> Option<String> {
        self.token.as_ref().map(|token| format!("token {token}"))
    }

    /// Embed the token into an https clone URL.
    ///
    /// Non-https URLs are returned unchanged. The returned string is
    /// sensitive and must never be logged.
    pub fn authenticated_url(&self, clone_url: &str) -> String {
        match &self.token {
            Some(token) if clone_url.starts_with("https://") => {
                clone_url.replacen("https://", &format!("https://{token}@"), 1)
            }
            _ => clone_url.to_string(),
        }
    }

    /// Strip the token from text captured from the external tool.
    pub fn redact(&self, text: &str) -> String {
        match &self.token {
            Some(token) => text.replace(token.as_str(), REDACTED),
            None => text.to_string(),
        }
    }
}

impl fmt::Debug for Credentials {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Credentials")
            .field("token", &self.token.as_ref().map(|_| REDACTED))
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn authenticated_url_embeds_token() {
        let creds = Credentials::new(Some("s3cret".into()));
        assert_eq!(
            creds.authenticated_url("https://github.com/o/r.git"),
            "https://s3cret@github.com/o/r.git"
        );
    }

    #[test]
    fn authenticated_url_without_token_is_unchanged() {
        let creds = Credentials::anonymous();
        assert_eq!(
            creds.authenticated_url("https://github.com/o/r.git"),
            "https://github.com/o/r.git"
        );
    }

    #[test]
    fn authenticated_url_leaves_non_https_alone() {
        let creds = Credentials::new(Some("s3cret".into()));
        assert_eq!(creds.authenticated_url("/tmp/local/repo"), "/tmp/local/repo");
    }

    #[test]
    fn empty_token_counts_as_anonymous() {
        let creds = Credentials::new(Some(String::new()));
        assert!(creds.is_anonymous());
        assert_eq!(creds.auth_header(), None);
    }

    #[test]
    fn auth_header_uses_token_scheme() {
        let creds = Credentials::new(Some("s3cret".into()));
        assert_eq!(creds.auth_header().as_deref(), Some("token s3cret"));
    }

    #[test]
    fn redact_strips_every_occurrence() {
        let creds = Credentials::new(Some("s3cret".into()));
        let text = "fatal: 'https://s3cret@github.com/o/r.git' not found (s3cret)";
        let redacted = creds.redact(text);
        assert!(!redacted.contains("s3cret"));
        assert!(redacted.contains(REDACTED));
    }

    #[test]
    fn debug_never_reveals_token() {
        let creds = Credentials::new(Some("s3cret".into()));
        let debug = format!("{:?}", creds);
        assert!(!debug.contains("s3cret"));
    }
}
