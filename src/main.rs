use anyhow::Result;
use chrono::NaiveDate;
use clap::{CommandFactory, Parser, Subcommand};
use fxsync::core::log::init_logging;

#[derive(Parser)]
#[command(version, about)]
struct Cli {
    /// Enable verbose logging
    #[arg(short, long, global = true)]
    verbose: bool,

    /// Path to optional configuration file
    #[arg(short, long, global = true)]
    config_path: Option<String>,

    #[command(subcommand)]
    command: Option<Commands>,
}

impl From<Commands> for fxsync::AppCommand {
    fn from(cmd: Commands) -> fxsync::AppCommand {
        match cmd {
            Commands::Sync {
                base,
                date,
                dry_run,
            } => fxsync::AppCommand::Sync {
                base,
                date,
                dry_run,
            },
            Commands::Sweep => fxsync::AppCommand::Sweep,
            Commands::TestConnection => fxsync::AppCommand::TestConnection,
            Commands::Usage => fxsync::AppCommand::Usage,
            Commands::AddBase { code } => fxsync::AppCommand::AddBase(code),
            Commands::RemoveBase { code } => fxsync::AppCommand::RemoveBase(code),
            Commands::AddTarget { code } => fxsync::AppCommand::AddTarget(code),
            Commands::RemoveTarget { code } => fxsync::AppCommand::RemoveTarget(code),
            Commands::Rates { date } => fxsync::AppCommand::Rates { date },
            Commands::Setup => unreachable!("Setup command should be handled separately"),
        }
    }
}

#[derive(Subcommand)]
enum Commands {
    /// Create default configuration
    Setup,
    /// Fetch today's rates for every configured base currency
    Sync {
        /// Resync a single base currency only
        #[arg(short, long)]
        base: Option<String>,
        /// Date to store the rates under (YYYY-MM-DD), defaults to today
        #[arg(short, long)]
        date: Option<NaiveDate>,
        /// Fetch and print the rates without saving them
        #[arg(long)]
        dry_run: bool,
    },
    /// Delete rates older than the retention window
    Sweep,
    /// Check the API key against the provider and record the result
    TestConnection,
    /// Display API usage for the current billing period
    Usage,
    /// Add a base currency
    AddBase { code: String },
    /// Remove a base currency
    RemoveBase { code: String },
    /// Add a target currency
    AddTarget { code: String },
    /// Remove a target currency
    RemoveTarget { code: String },
    /// Display stored rates for a date
    Rates {
        /// Date to list (YYYY-MM-DD), defaults to today
        #[arg(short, long)]
        date: Option<NaiveDate>,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    init_logging(cli.verbose);

    let result = match cli.command {
        Some(Commands::Setup) => match cli.config_path.as_deref() {
            Some(path) => fxsync::cli::setup::setup_at_path(path),
            None => fxsync::cli::setup::setup(),
        },
        Some(cmd) => fxsync::run_command(cmd.into(), cli.config_path.as_deref()).await,
        None => {
            Cli::command().print_help()?;
            Ok(())
        }
    };

    if let Err(e) = &result {
        tracing::error!(error = %e, "Application failed");
    }
    result
}
