//! AuditDesk CLI - Command-line console for the AuditDesk backend
//!
//! Provides commands for:
//! - Logging in and out
//! - Browsing, editing and importing audit findings
//! - Attaching evidence files
//! - Administering user accounts
//! - Managing the local configuration

use std::path::PathBuf;
use std::process::ExitCode;

use anyhow::Result;
use clap::{Parser, Subcommand};
use tracing_subscriber::EnvFilter;

mod commands;
mod context;
mod output;

use commands::{
    audits::AuditsCommand, auth::AuthCommand, completions::CompletionsCommand,
    config::ConfigCommand, users::UsersCommand, Reported,
};
use context::CliContext;
use output::OutputFormat;

#[derive(Debug, Parser)]
#[command(name = "auditdesk", version, about = "Audit record compliance console")]
pub struct Cli {
    /// Output in JSON format
    #[arg(long, global = true)]
    json: bool,

    /// Verbose output (can be repeated: -v, -vv)
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    verbose: u8,

    /// Use alternate config file
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Debug, Subcommand)]
pub enum Commands {
    /// Authentication commands
    #[command(subcommand)]
    Auth(AuthCommand),
    /// Browse and edit audit records
    #[command(subcommand)]
    Audits(AuditsCommand),
    /// Administer user accounts
    #[command(subcommand)]
    Users(UsersCommand),
    /// View and manage configuration
    #[command(subcommand)]
    Config(ConfigCommand),
    /// Generate shell completions
    Completions(CompletionsCommand),
}

#[tokio::main]
async fn main() -> ExitCode {
    let cli = Cli::parse();

    let format = if cli.json {
        OutputFormat::Json
    } else {
        OutputFormat::Human
    };
    let ctx = CliContext::new(cli.config, format);

    // Setup tracing; RUST_LOG wins, then -v, then the configured level
    let filter = match cli.verbose {
        0 => ctx.config().logging.level.clone(),
        1 => "debug".to_string(),
        _ => "trace".to_string(),
    };
    let env_filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(filter));

    tracing_subscriber::fmt()
        .with_env_filter(env_filter)
        .with_target(false)
        .with_writer(std::io::stderr)
        .init();

    ctx.cancel_on_interrupt();

    match run(cli.command, &ctx).await {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            if e.downcast_ref::<Reported>().is_none() {
                ctx.formatter().error(&format!("{e:#}"));
            }
            ExitCode::FAILURE
        }
    }
}

async fn run(command: Commands, ctx: &CliContext) -> Result<()> {
    match command {
        Commands::Auth(cmd) => cmd.execute(ctx).await,
        Commands::Audits(cmd) => cmd.execute(ctx).await,
        Commands::Users(cmd) => cmd.execute(ctx).await,
        Commands::Config(cmd) => cmd.execute(ctx).await,
        Commands::Completions(cmd) => cmd.execute(),
    }
}
