//! Git operations using a hybrid CLI + libgit2 approach.
//!
//! **CLI (with hardening) for write operations:**
//! - `clone_no_checkout` - needs `--depth` and `--no-checkout`
//! - `checkout` - populate the working tree after a checkout-free clone
//! - `lfs_fetch_all` / `lfs_checkout` - LFS plumbing is CLI-only
//!
//! **libgit2 for read operations:**
//! - `head_commit` - resolve the cloned HEAD for analytics
//! - `repository_exists` - simple path validation

use git2::Repository;
use std::path::Path;
use std::process::{Command, Stdio};
use thiserror::Error;

/// Errors returned by git operations.
#[derive(Error, Debug)]
pub enum GitError {
    /// Clone failed.
    #[error("clone failed: {0}")]
    CloneError(String),
    /// Checkout failed.
    #[error("checkout failed: {0}")]
    CheckoutError(String),
    /// An LFS operation failed.
    #[error("lfs {op} failed: {message}")]
    LfsError { op: &'static str, message: String },
    /// Output parsing or unexpected git data.
    #[error("failed to parse git data: {0}")]
    ParseError(String),
    /// Underlying IO error.
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    /// Invalid inputs were provided.
    #[error("invalid input: {0}")]
    InvalidInput(String),
}

/// Validate that a repository name is safe to use as a path component.
///
/// Rejects:
/// - Empty strings
/// - Strings containing `..` (path traversal)
/// - Strings containing `/` or `\` (path separators)
/// - Strings starting with `-` (could be interpreted as flags)
/// - Strings containing null bytes or control characters
pub(crate) fn validate_name(value: &str, name: &str) -> Result<(), GitError> {
    if value.is_empty() {
        return Err(GitError::InvalidInput(format!("{} cannot be empty", name)));
    }
    if value.contains("..") {
        return Err(GitError::InvalidInput(format!(
            "{} cannot contain '..'",
            name
        )));
    }
    if value.contains('/') || value.contains('\\') {
        return Err(GitError::InvalidInput(format!(
            "{} cannot contain path separators",
            name
        )));
    }
    if value.starts_with('-') {
        return Err(GitError::InvalidInput(format!(
            "{} cannot start with '-'",
            name
        )));
    }
    if value.bytes().any(|b| b == 0 || b < 0x20) {
        return Err(GitError::InvalidInput(format!(
            "{} cannot contain null or control characters",
            name
        )));
    }
    Ok(())
}

/// Validate that a clone URL does not look like a flag.
fn validate_url(value: &str) -> Result<(), GitError> {
    if value.is_empty() {
        return Err(GitError::InvalidInput("clone URL cannot be empty".into()));
    }
    if value.starts_with('-') {
        return Err(GitError::InvalidInput(
            "clone URL cannot start with '-'".into(),
        ));
    }
    if value.bytes().any(|b| b == 0 || b < 0x20) {
        return Err(GitError::InvalidInput(
            "clone URL cannot contain null or control characters".into(),
        ));
    }
    Ok(())
}

fn path_str<'a>(path: &'a Path, what: &str) -> Result<&'a str, GitError> {
    path.to_str()
        .ok_or_else(|| GitError::ParseError(format!("{} path is not valid UTF-8", what)))
}

/// Git CLI wrapper with security hardening.
pub struct GitCli {
    git_path: String,
}

impl Default for GitCli {
    fn default() -> Self {
        Self::new()
    }
}

impl GitCli {
    /// Create a new GitCli instance using the system git.
    pub fn new() -> Self {
        Self {
            git_path: "git".into(),
        }
    }

    /// Use a specific program instead of the system git.
    #[cfg(test)]
    pub fn with_program(program: impl Into<String>) -> Self {
        Self {
            git_path: program.into(),
        }
    }

    /// Create a hardened Command with security settings.
    ///
    /// Applies:
    /// - `GIT_LFS_SKIP_SMUDGE=1` - no LFS downloads outside the explicit LFS steps
    /// - `GIT_TERMINAL_PROMPT=0` - disable interactive prompts
    /// - `core.hooksPath=` - disable hooks execution
    fn command(&self) -> Command {
        let mut cmd = Command::new(&self.git_path);
        cmd.env("GIT_LFS_SKIP_SMUDGE", "1");
        cmd.env("GIT_TERMINAL_PROMPT", "0");
        cmd.args(["-c", "core.hooksPath="]);
        cmd.stdin(Stdio::null());
        cmd
    }

    /// Clone a repository without checking out working files.
    ///
    /// `depth` limits history when present. On failure a destination
    /// directory this call created is removed again.
    ///
    /// The URL may embed a credential; it must never appear in logs, and
    /// the caller is responsible for redacting captured stderr.
    pub fn clone_no_checkout(
        &self,
        url: &str,
        dest: &Path,
        depth: Option<u32>,
    ) -> Result<(), GitError> {
        validate_url(url)?;

        let dest_existed = dest.exists();

        if let Some(parent) = dest.parent() {
            std::fs::create_dir_all(parent)?;
        }

        let dest_str = path_str(dest, "destination")?;

        let mut cmd = self.command();
        cmd.arg("clone");
        if let Some(depth) = depth {
            cmd.arg(format!("--depth={depth}"));
        }
        cmd.args(["--no-checkout", "--"]);
        cmd.arg(url);
        cmd.arg(dest_str);

        let output = cmd.output()?;

        if !output.status.success() {
            let stderr = String::from_utf8_lossy(&output.stderr);
            if !dest_existed {
                let _ = std::fs::remove_dir_all(dest);
            }
            return Err(GitError::CloneError(stderr.into_owned()));
        }

        Ok(())
    }

    /// Check out the default branch in a cloned repository.
    pub fn checkout(&self, repo_dir: &Path) -> Result<(), GitError> {
        let dir_str = path_str(repo_dir, "repository")?;

        let output = self
            .command()
            .arg("-C")
            .arg(dir_str)
            .arg("checkout")
            .output()?;

        if !output.status.success() {
            let stderr = String::from_utf8_lossy(&output.stderr);
            return Err(GitError::CheckoutError(stderr.into_owned()));
        }

        Ok(())
    }

    /// Fetch all LFS objects for a cloned repository.
    pub fn lfs_fetch_all(&self, repo_dir: &Path) -> Result<(), GitError> {
        self.lfs(repo_dir, "fetch", &["fetch", "--all"])
    }

    /// Replace LFS pointer files with their content.
    pub fn lfs_checkout(&self, repo_dir: &Path) -> Result<(), GitError> {
        self.lfs(repo_dir, "checkout", &["checkout"])
    }

    fn lfs(&self, repo_dir: &Path, op: &'static str, args: &[&str]) -> Result<(), GitError> {
        let dir_str = path_str(repo_dir, "repository")?;

        let output = self
            .command()
            .arg("-C")
            .arg(dir_str)
            .arg("lfs")
            .args(args)
            .output()?;

        if !output.status.success() {
            let stderr = String::from_utf8_lossy(&output.stderr);
            return Err(GitError::LfsError {
                op,
                message: stderr.into_owned(),
            });
        }

        Ok(())
    }
}

/// Resolve the HEAD commit SHA of a cloned repository, if possible.
///
/// Best-effort read used to enrich analytics; failures surface as `None`.
pub fn head_commit(path: &Path) -> Option<String> {
    let repo = Repository::open(path).ok()?;
    let head = repo.head().ok()?;
    let commit = head.peel_to_commit().ok()?;
    Some(commit.id().to_string())
}

/// Check if a path contains a valid git repository.
pub fn repository_exists(path: &Path) -> bool {
    Repository::open(path).is_ok()
}

#[cfg(test)]
pub(crate) mod testutil {
    use std::path::{Path, PathBuf};
    use std::process::Command;

    /// Build a local source repository with one commit; returns its path.
    pub(crate) fn init_source_repo(root: &Path) -> PathBuf {
        let source = root.join("source");
        std::fs::create_dir_all(&source).unwrap();

        let run = |args: &[&str]| {
            let output = Command::new("git")
                .args([
                    "-c",
                    "user.name=test",
                    "-c",
                    "user.email=test@example.com",
                    "-c",
                    "commit.gpgsign=false",
                ])
                .arg("-C")
                .arg(&source)
                .args(args)
                .output()
                .expect("git must be installed for these tests");
            assert!(
                output.status.success(),
                "git {:?} failed: {}",
                args,
                String::from_utf8_lossy(&output.stderr)
            );
        };

        run(&["init", "-b", "main"]);
        std::fs::write(source.join("README"), "hello\n").unwrap();
        run(&["add", "README"]);
        run(&["commit", "-m", "initial"]);
        source
    }
}

#[cfg(test)]
mod tests {
    use super::testutil::init_source_repo;
    use super::*;
    use tempfile::tempdir;

    #[test]
    fn clone_no_checkout_then_checkout_populates_worktree() {
        let temp_dir = tempdir().unwrap();
        let source = init_source_repo(temp_dir.path());
        let dest = temp_dir.path().join("clone");

        let git = GitCli::new();
        git.clone_no_checkout(source.to_str().unwrap(), &dest, None)
            .expect("clone failed");

        // No working files yet after a checkout-free clone.
        assert!(!dest.join("README").exists());

        git.checkout(&dest).expect("checkout failed");
        assert!(dest.join("README").exists());
        assert!(repository_exists(&dest));
    }

    #[test]
    fn clone_failure_removes_created_destination() {
        let temp_dir = tempdir().unwrap();
        let dest = temp_dir.path().join("clone");

        let git = GitCli::new();
        let missing = temp_dir.path().join("no-such-source");
        let result = git.clone_no_checkout(missing.to_str().unwrap(), &dest, None);

        assert!(matches!(result, Err(GitError::CloneError(_))));
        assert!(!dest.exists(), "failed clone should not leave {:?}", dest);
    }

    #[test]
    fn clone_preserves_preexisting_destination_on_failure() {
        let temp_dir = tempdir().unwrap();
        let dest = temp_dir.path().join("clone");
        std::fs::create_dir_all(&dest).unwrap();
        std::fs::write(dest.join("keep"), "x").unwrap();

        let git = GitCli::new();
        let missing = temp_dir.path().join("no-such-source");
        let result = git.clone_no_checkout(missing.to_str().unwrap(), &dest, None);

        assert!(result.is_err());
        assert!(dest.join("keep").exists());
    }

    #[test]
    fn head_commit_reads_cloned_head() {
        let temp_dir = tempdir().unwrap();
        let source = init_source_repo(temp_dir.path());
        let dest = temp_dir.path().join("clone");

        let git = GitCli::new();
        git.clone_no_checkout(source.to_str().unwrap(), &dest, None)
            .expect("clone failed");
        git.checkout(&dest).expect("checkout failed");

        let commit = head_commit(&dest).expect("head commit should resolve");
        assert_eq!(commit.len(), 40);
        assert!(commit.chars().all(|c| c.is_ascii_hexdigit()));
    }

    #[test]
    fn head_commit_is_none_for_non_repo() {
        let temp_dir = tempdir().unwrap();
        assert_eq!(head_commit(temp_dir.path()), None);
    }

    #[test]
    fn repository_exists_returns_false_for_nonexistent() {
        let temp_dir = tempdir().unwrap();
        let nonexistent = temp_dir.path().join("nonexistent");
        assert!(!repository_exists(&nonexistent));
    }

    #[test]
    fn missing_git_program_surfaces_as_io_error() {
        let temp_dir = tempdir().unwrap();
        let dest = temp_dir.path().join("clone");

        let git = GitCli::with_program("ghrip-no-such-git-binary");
        let result = git.clone_no_checkout("https://example.com/r.git", &dest, None);
        assert!(matches!(result, Err(GitError::Io(_))));
    }

    #[test]
    fn validate_name_rejects_empty() {
        let result = validate_name("", "repository name");
        assert!(matches!(result, Err(GitError::InvalidInput(_))));
    }

    #[test]
    fn validate_name_rejects_path_traversal() {
        let result = validate_name("foo/../bar", "repository name");
        assert!(matches!(result, Err(GitError::InvalidInput(_))));
    }

    #[test]
    fn validate_name_rejects_path_separators() {
        assert!(matches!(
            validate_name("foo/bar", "repository name"),
            Err(GitError::InvalidInput(_))
        ));
        assert!(matches!(
            validate_name("foo\\bar", "repository name"),
            Err(GitError::InvalidInput(_))
        ));
    }

    #[test]
    fn validate_name_rejects_leading_dash() {
        let result = validate_name("-malicious", "repository name");
        assert!(matches!(result, Err(GitError::InvalidInput(_))));
    }

    #[test]
    fn validate_name_rejects_control_chars() {
        let result = validate_name("foo\0bar", "repository name");
        assert!(matches!(result, Err(GitError::InvalidInput(_))));
        let result = validate_name("foo\nbar", "repository name");
        assert!(matches!(result, Err(GitError::InvalidInput(_))));
    }

    #[test]
    fn validate_name_accepts_valid_names() {
        assert!(validate_name("Hello-World", "repository name").is_ok());
        assert!(validate_name("my_repo.v2", "repository name").is_ok());
        assert!(validate_name("repo123", "repository name").is_ok());
    }

    #[test]
    fn clone_rejects_flag_like_url() {
        let temp_dir = tempdir().unwrap();
        let dest = temp_dir.path().join("clone");

        let git = GitCli::new();
        let result = git.clone_no_checkout("--upload-pack=evil", &dest, None);
        assert!(matches!(result, Err(GitError::InvalidInput(_))));
    }

    #[test]
    fn clone_rejects_empty_url() {
        let temp_dir = tempdir().unwrap();
        let dest = temp_dir.path().join("clone");

        let git = GitCli::new();
        let result = git.clone_no_checkout("", &dest, None);
        assert!(matches!(result, Err(GitError::InvalidInput(_))));
    }
}
