use clap::Parser;
use colored::Colorize;
use rws_sdk::{SdkError, Severity};
use tracing_subscriber::EnvFilter;

mod cli;
mod commands;
mod config;
mod prompt;

#[tokio::main]
async fn main() {
    let cli = cli::Cli::parse();

    let default_level = if cli.verbose { "debug" } else { "warn" };
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();

    if let Err(err) = commands::run_command(cli).await {
        report(&err);
        std::process::exit(1);
    }
}

/// Print the single user-facing line for a failed command.
fn report(err: &anyhow::Error) {
    let (severity, message) = describe(err);
    let label = match severity {
        Severity::Info => "info:".cyan().bold(),
        Severity::Warning => "warning:".yellow().bold(),
        Severity::Error => "error:".red().bold(),
    };
    eprintln!("{label} {message}");
}

fn describe(err: &anyhow::Error) -> (Severity, String) {
    match err.downcast_ref::<SdkError>() {
        Some(e) if e.kind().is_transient() => {
            (e.kind().severity(), format!("{e} (temporary, try again later)"))
        }
        Some(e) => (e.kind().severity(), e.to_string()),
        None => (Severity::Error, format!("{err:#}")),
    }
}
