use std::path::PathBuf;

use clap::{Args, Parser, Subcommand, ValueEnum};
use url::Url;

/// rws - browse, edit and commit to a hosted repository without cloning it.
#[derive(Parser)]
#[command(name = "rws", about = "Remote workspace for hosted Git repositories", version)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Command,

    /// Enable verbose output
    #[arg(short, long, global = true)]
    pub verbose: bool,

    /// Output format
    #[arg(long, global = true, default_value = "text")]
    pub format: OutputFormat,

    /// Config file (defaults to ~/.config/rws/config.toml)
    #[arg(long, global = true, env = "RWS_CONFIG")]
    pub config: Option<PathBuf>,

    /// API token, overriding the config file
    #[arg(long, global = true, env = "RWS_TOKEN", hide_env_values = true)]
    pub token: Option<String>,

    /// API root, overriding the config file
    #[arg(long, global = true, env = "RWS_API_BASE")]
    pub api_base: Option<Url>,

    /// Answer yes to every confirmation
    #[arg(short, long, global = true)]
    pub yes: bool,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, ValueEnum)]
pub enum OutputFormat {
    Text,
    Json,
}

#[derive(Subcommand)]
pub enum Command {
    /// Show the file tree of a branch
    Tree(TargetArgs),

    /// Print a file
    Cat(CatArgs),

    /// Write a file from stdin or a local file and commit it
    Put(PutArgs),

    /// Delete a file or folder and commit
    Rm(RmArgs),

    /// Rename a file or folder and commit
    Mv(MvArgs),

    /// Create a folder and commit
    Mkdir(MkdirArgs),

    /// Show the effective configuration
    Config,
}

/// Repository and branch to open.
#[derive(Args, Clone)]
pub struct TargetArgs {
    /// Repository as owner/repo or URL
    pub repo: String,

    /// Branch to open
    #[arg(short, long, default_value = "main")]
    pub branch: String,
}

/// Commit options shared by writing commands.
#[derive(Args, Clone)]
pub struct CommitArgs {
    /// Commit message
    #[arg(short, long)]
    pub message: Option<String>,

    /// Show the pending change without committing
    #[arg(long)]
    pub dry_run: bool,
}

#[derive(Args)]
pub struct CatArgs {
    #[command(flatten)]
    pub target: TargetArgs,

    /// Path inside the repository
    pub path: String,
}

#[derive(Args)]
pub struct PutArgs {
    #[command(flatten)]
    pub target: TargetArgs,

    /// Path inside the repository
    pub path: String,

    /// Local file to upload (stdin if omitted)
    #[arg(short, long)]
    pub file: Option<PathBuf>,

    #[command(flatten)]
    pub commit: CommitArgs,
}

#[derive(Args)]
pub struct RmArgs {
    #[command(flatten)]
    pub target: TargetArgs,

    /// File or folder to delete
    pub path: String,

    #[command(flatten)]
    pub commit: CommitArgs,
}

#[derive(Args)]
pub struct MvArgs {
    #[command(flatten)]
    pub target: TargetArgs,

    /// Current path
    pub from: String,

    /// New path
    pub to: String,

    #[command(flatten)]
    pub commit: CommitArgs,
}

#[derive(Args)]
pub struct MkdirArgs {
    #[command(flatten)]
    pub target: TargetArgs,

    /// Folder to create, e.g. docs/guides
    pub path: String,

    #[command(flatten)]
    pub commit: CommitArgs,
}
