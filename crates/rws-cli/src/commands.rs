use std::path::Path;
use std::sync::Arc;

use anyhow::Context;
use colored::Colorize;
use rws_remote::{GithubRemote, RemoteStore};
use rws_sdk::{
    EntryKind, FileDiff, NoopEditor, Notification, RepoRef, SdkError, Services,
    Severity, Workspace,
};
use rws_types::path;
use tokio::io::AsyncReadExt;

use crate::cli::{
    CatArgs, Cli, Command, CommitArgs, MkdirArgs, MvArgs, OutputFormat, PutArgs, RmArgs,
    TargetArgs,
};
use crate::config::CliConfig;
use crate::prompt::TerminalPrompt;

/// Settings every command runs with.
struct RunContext {
    config: CliConfig,
    format: OutputFormat,
    assume_yes: bool,
}

pub async fn run_command(cli: Cli) -> anyhow::Result<()> {
    let config = CliConfig::load(cli.config.as_deref())?.with_overrides(cli.token, cli.api_base);
    let ctx = RunContext {
        config,
        format: cli.format,
        assume_yes: cli.yes,
    };

    match cli.command {
        Command::Tree(args) => cmd_tree(&ctx, args).await,
        Command::Cat(args) => cmd_cat(&ctx, args).await,
        Command::Put(args) => cmd_put(&ctx, args).await,
        Command::Rm(args) => cmd_rm(&ctx, args).await,
        Command::Mv(args) => cmd_mv(&ctx, args).await,
        Command::Mkdir(args) => cmd_mkdir(&ctx, args).await,
        Command::Config => cmd_config(&ctx),
    }
}

async fn open(ctx: &RunContext, target: &TargetArgs) -> anyhow::Result<Workspace> {
    let repo = RepoRef::parse(&target.repo).map_err(SdkError::from)?;
    let remote = GithubRemote::new(&ctx.config.remote).map_err(SdkError::from)?;
    if !remote.is_authenticated() {
        tracing::warn!("no API token configured; writes will be rejected");
    }
    let remote: Arc<dyn RemoteStore> = Arc::new(remote);
    let services = Services {
        editor: Arc::new(NoopEditor),
        prompt: Arc::new(TerminalPrompt::new(ctx.assume_yes)),
    };
    let ws = Workspace::open_with(remote, services, repo, target.branch.clone()).await?;
    tracing::info!(repo = %ws.repo(), branch = ws.branch(), "workspace opened");
    Ok(ws)
}

async fn cmd_tree(ctx: &RunContext, args: TargetArgs) -> anyhow::Result<()> {
    let ws = open(ctx, &args).await?;
    let tree = ws.projected_tree();

    if ctx.format == OutputFormat::Json {
        println!("{}", serde_json::to_string_pretty(&tree)?);
        return Ok(());
    }

    println!(
        "{} {} at {}",
        "Tree".bold(),
        ws.repo().to_string().cyan(),
        ws.branch().cyan()
    );
    for line in tree.walk() {
        let indent = "  ".repeat(line.depth + 1);
        if line.node.is_dir() {
            println!("{indent}{}/", line.name.blue().bold());
        } else {
            println!("{indent}{}", line.name);
        }
    }
    println!();
    println!("  {} file(s)", tree.file_paths().len().to_string().bold());
    Ok(())
}

async fn cmd_cat(ctx: &RunContext, args: CatArgs) -> anyhow::Result<()> {
    let mut ws = open(ctx, &args.target).await?;
    let content = ws.read_path(&args.path).await?;

    if ctx.format == OutputFormat::Json {
        let out = serde_json::json!({ "path": args.path, "content": content });
        println!("{}", serde_json::to_string_pretty(&out)?);
    } else {
        print!("{content}");
    }
    Ok(())
}

async fn cmd_put(ctx: &RunContext, args: PutArgs) -> anyhow::Result<()> {
    let content = read_input(args.file.as_deref()).await?;
    let mut ws = open(ctx, &args.target).await?;
    let path = path::normalize(&args.path).map_err(SdkError::from)?;

    if !ws.overlay().exists(ws.index(), &path) {
        ws.create_path(path::parent(&path), path::file_name(&path), EntryKind::File)?;
    }
    ws.select_file(&path).await?;
    ws.edit_buffer(&path, content)?;
    ws.save_buffer(&path)?;

    if !ws.status().has_staged_changes() {
        println!("{} {} is unchanged", "✓".green().bold(), path);
        return Ok(());
    }
    finish(ctx, &mut ws, &args.commit).await
}

async fn cmd_rm(ctx: &RunContext, args: RmArgs) -> anyhow::Result<()> {
    let mut ws = open(ctx, &args.target).await?;
    if !ws.delete_path(&args.path).await? {
        println!("{}", "Aborted.".yellow());
        return Ok(());
    }
    finish(ctx, &mut ws, &args.commit).await
}

async fn cmd_mv(ctx: &RunContext, args: MvArgs) -> anyhow::Result<()> {
    let mut ws = open(ctx, &args.target).await?;
    if ws.rename_path(&args.from, &args.to).await?.is_empty() {
        println!("{} nothing to rename", "✓".green().bold());
        return Ok(());
    }
    finish(ctx, &mut ws, &args.commit).await
}

async fn cmd_mkdir(ctx: &RunContext, args: MkdirArgs) -> anyhow::Result<()> {
    let mut ws = open(ctx, &args.target).await?;
    let target = path::normalize(&args.path).map_err(SdkError::from)?;
    ws.create_path(
        path::parent(&target),
        path::file_name(&target),
        EntryKind::Directory,
    )?;
    finish(ctx, &mut ws, &args.commit).await
}

fn cmd_config(ctx: &RunContext) -> anyhow::Result<()> {
    match ctx.format {
        OutputFormat::Json => {
            println!("{}", serde_json::to_string_pretty(&ctx.config.masked())?);
        }
        OutputFormat::Text => {
            if let Some(path) = CliConfig::default_path() {
                println!("{}", format!("# default file: {}", path.display()).dimmed());
            }
            print!("{}", ctx.config.to_display_toml()?);
        }
    }
    Ok(())
}

/// Commit every staged change, or with `--dry-run` show what would be
/// committed.
async fn finish(ctx: &RunContext, ws: &mut Workspace, args: &CommitArgs) -> anyhow::Result<()> {
    if args.dry_run {
        return print_pending(ctx, ws).await;
    }

    let receipt = ws.commit(args.message.as_deref().unwrap_or_default()).await?;
    match ctx.format {
        OutputFormat::Json => println!("{}", serde_json::to_string_pretty(&receipt)?),
        OutputFormat::Text => {
            println!(
                "{} Committed {} on {}",
                "✓".green().bold(),
                receipt.commit_id.short().yellow(),
                ws.branch().cyan()
            );
            println!("  Parent: {}", receipt.parent_id.short().dimmed());
            println!("  Tree:   {}", receipt.tree_id.short().dimmed());
            for path in &receipt.paths {
                println!("    {path}");
            }
            if let Some(notification) = ws.last_notification() {
                print_notification(notification);
            }
        }
    }
    Ok(())
}

async fn print_pending(ctx: &RunContext, ws: &Workspace) -> anyhow::Result<()> {
    let status = ws.status();
    let mut diffs = Vec::with_capacity(status.staged.len());
    for entry in &status.staged {
        diffs.push(ws.diff(&entry.path).await?);
    }

    if ctx.format == OutputFormat::Json {
        println!("{}", serde_json::to_string_pretty(&diffs)?);
        return Ok(());
    }

    println!("{} (dry run, nothing committed)", "Changes to be committed".bold());
    for entry in &status.staged {
        let label = format!("{:>9}:", entry.status.to_string());
        println!("  {} {}", label.green(), entry.path);
    }
    for diff in &diffs {
        println!();
        print_diff(diff);
    }
    Ok(())
}

fn print_diff(diff: &FileDiff) {
    for line in diff.to_unified().lines() {
        if line.starts_with("---") || line.starts_with("+++") {
            println!("{}", line.bold());
        } else if line.starts_with("@@") {
            println!("{}", line.cyan());
        } else if line.starts_with('+') {
            println!("{}", line.green());
        } else if line.starts_with('-') {
            println!("{}", line.red());
        } else {
            println!("{line}");
        }
    }
    if diff.is_empty() {
        println!("{}", "  (empty file)".dimmed());
    }
}

fn print_notification(notification: &Notification) {
    let message = match notification.severity {
        Severity::Info => notification.message.dimmed(),
        Severity::Warning => notification.message.yellow(),
        Severity::Error => notification.message.red(),
    };
    println!("  {message}");
}

async fn read_input(file: Option<&Path>) -> anyhow::Result<String> {
    match file {
        Some(path) => tokio::fs::read_to_string(path)
            .await
            .with_context(|| format!("reading {}", path.display())),
        None => {
            let mut content = String::new();
            tokio::io::stdin()
                .read_to_string(&mut content)
                .await
                .context("reading stdin")?;
            Ok(content)
        }
    }
}
