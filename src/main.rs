pub mod analytics;
pub mod clone;
pub mod credentials;
pub mod git;
pub mod github;
pub mod orchestrator;
pub mod pool;
pub mod retry;
pub mod types;

use std::path::PathBuf;
use std::sync::Arc;

use clap::{Parser, ValueEnum};

use crate::analytics::Ledger;
use crate::clone::CloneExecutor;
use crate::credentials::Credentials;
use crate::github::GitHubClient;
use crate::orchestrator::{Orchestrator, RunConfig};
use crate::types::RepoKind;

#[derive(Parser)]
#[command(
    name = "ghrip",
    about = "Bulk-clone a GitHub user's repositories with clone analytics"
)]
struct Cli {
    /// GitHub username
    username: String,

    /// Which repositories to clone
    #[arg(value_enum)]
    mode: Mode,

    /// Directory to clone repositories into
    #[arg(short = 'd', long, default_value = ".")]
    directory: PathBuf,

    /// Depth of git clone (full history when omitted)
    #[arg(long)]
    depth: Option<u32>,

    /// Sync mode: clone original repos for forks
    #[arg(long)]
    sync: bool,

    /// GitHub personal access token
    #[arg(long, env = "GITHUB_TOKEN")]
    token: Option<String>,

    /// Enable Git LFS support
    #[arg(long)]
    lfs: bool,

    /// Number of concurrent clone workers
    #[arg(long, default_value_t = pool::DEFAULT_WORKERS)]
    workers: usize,
}

#[derive(Clone, Copy, ValueEnum)]
enum Mode {
    /// Repositories the user owns
    All,
    /// Repositories the user has starred
    Starred,
}

impl From<Mode> for RepoKind {
    fn from(mode: Mode) -> Self {
        match mode {
            Mode::All => RepoKind::Owned,
            Mode::Starred => RepoKind::Starred,
        }
    }
}

fn main() {
    env_logger::init();

    let cli = Cli::parse();

    if let Err(e) = run(cli) {
        eprintln!("Error: {}", e);
        std::process::exit(1);
    }
}

fn run(cli: Cli) -> Result<(), Box<dyn std::error::Error>> {
    let credentials = Credentials::new(cli.token.clone());
    if credentials.is_anonymous() {
        eprintln!("Warning: no GitHub token provided, you may encounter rate limits");
    }

    if cli.lfs {
        println!("Git LFS support enabled.");
    } else {
        println!("Git LFS support disabled. Large files will be skipped.");
    }

    println!("Cloning repositories into: {}", cli.directory.display());
    if let Some(depth) = cli.depth {
        println!("Using clone depth: {}", depth);
    }
    if cli.sync {
        println!("Sync mode enabled: will clone original repositories for forks");
    }
    println!("Fetching repository information for user: {}", cli.username);

    let client = GitHubClient::new(credentials.clone());
    let executor = Arc::new(CloneExecutor::new(
        cli.directory.clone(),
        cli.depth,
        credentials,
        cli.lfs,
    ));
    let ledger_path = Ledger::path_for(&cli.directory, &cli.username);

    let orchestrator = Orchestrator::new(
        client,
        executor,
        RunConfig {
            user: cli.username,
            kind: cli.mode.into(),
            ledger_path: ledger_path.clone(),
            sync_forks: cli.sync,
            workers: cli.workers,
        },
    );
    let summary = orchestrator.run()?;

    println!();
    println!("Cloning complete.");
    println!("Total repositories attempted: {}", summary.attempted);
    println!("Successfully cloned repositories: {}", summary.succeeded);
    println!(
        "Total time taken: {:.2} seconds",
        summary.elapsed.as_secs_f64()
    );
    println!(
        "Actual cloning rate: {:.2} repos per minute",
        summary.rate_per_minute()
    );
    if cli.sync {
        println!(
            "Original repositories cloned for forks: {}",
            summary.originals_cloned
        );
    }
    println!("Analytics saved to {}", ledger_path.display());

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn mode_maps_to_repo_kind() {
        assert_eq!(RepoKind::from(Mode::All), RepoKind::Owned);
        assert_eq!(RepoKind::from(Mode::Starred), RepoKind::Starred);
    }

    #[test]
    fn cli_parses_positional_and_flags() {
        let cli = Cli::parse_from([
            "ghrip", "octocat", "all", "-d", "/tmp/repos", "--depth", "1", "--sync", "--lfs",
        ]);
        assert_eq!(cli.username, "octocat");
        assert!(matches!(cli.mode, Mode::All));
        assert_eq!(cli.directory, PathBuf::from("/tmp/repos"));
        assert_eq!(cli.depth, Some(1));
        assert!(cli.sync);
        assert!(cli.lfs);
        assert_eq!(cli.workers, pool::DEFAULT_WORKERS);
    }

    #[test]
    fn cli_defaults_to_cwd_and_full_history() {
        let cli = Cli::parse_from(["ghrip", "octocat", "starred"]);
        assert!(matches!(cli.mode, Mode::Starred));
        assert_eq!(cli.directory, PathBuf::from("."));
        assert_eq!(cli.depth, None);
        assert!(!cli.sync);
        assert!(!cli.lfs);
    }
}
