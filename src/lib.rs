pub mod cli;
pub mod core;
pub mod providers;
pub mod store;

use crate::core::config::{AppConfig, CurrencyList};
use anyhow::Result;
use chrono::NaiveDate;
use std::path::PathBuf;
use tracing::{debug, info};

/// Commands that operate on an existing configuration file.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AppCommand {
    Sync {
        base: Option<String>,
        date: Option<NaiveDate>,
        dry_run: bool,
    },
    Sweep,
    TestConnection,
    Usage,
    AddBase(String),
    RemoveBase(String),
    AddTarget(String),
    RemoveTarget(String),
    Rates {
        date: Option<NaiveDate>,
    },
}

pub async fn run_command(command: AppCommand, config_path: Option<&str>) -> Result<()> {
    info!("fxsync starting...");

    let config_path = match config_path {
        Some(path) => PathBuf::from(path),
        None => AppConfig::default_config_path()?,
    };
    let config = AppConfig::load_from_path(&config_path)?;
    debug!("Loaded config: {config:#?}");

    let today = chrono::Local::now().date_naive();

    match command {
        AppCommand::Sync {
            base,
            date,
            dry_run,
        } => cli::sync::run_sync(&config, base.as_deref(), date.unwrap_or(today), dry_run).await,
        AppCommand::Sweep => cli::sweep::run_sweep(&config, today),
        AppCommand::TestConnection => cli::connection::test_connection(config, &config_path).await,
        AppCommand::Usage => cli::connection::show_usage(&config).await,
        AppCommand::AddBase(code) => {
            cli::currencies::add_currency(config, &config_path, CurrencyList::Base, &code)
        }
        AppCommand::RemoveBase(code) => {
            cli::currencies::remove_currency(config, &config_path, CurrencyList::Base, &code)
        }
        AppCommand::AddTarget(code) => {
            cli::currencies::add_currency(config, &config_path, CurrencyList::Target, &code)
        }
        AppCommand::RemoveTarget(code) => {
            cli::currencies::remove_currency(config, &config_path, CurrencyList::Target, &code)
        }
        AppCommand::Rates { date } => cli::rates::show_rates(&config, date.unwrap_or(today)),
    }
}
