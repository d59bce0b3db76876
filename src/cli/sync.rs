use super::ui;
use crate::core::config::AppConfig;
use crate::core::rate::is_currency_code;
use crate::core::report::RunStatus;
use crate::core::store::RateStore;
use crate::core::sync::{SyncEngine, SyncOptions};
use crate::providers::build_provider;
use crate::store::memory::MemoryRateStore;
use crate::store::open_rate_store;
use anyhow::Result;
use chrono::NaiveDate;
use std::sync::Arc;
use tracing::info;

/// Runs the orchestrator for every configured base, or for `base` alone.
/// Fails only when the run produced no successful base at all.
///
/// With `dry_run` the rates go to an in-memory store that is printed and
/// then dropped; the on-disk store is not opened.
pub async fn run_sync(
    config: &AppConfig,
    base: Option<&str>,
    date: NaiveDate,
    dry_run: bool,
) -> Result<()> {
    let sync_config = match base {
        Some(base) => {
            anyhow::ensure!(
                is_currency_code(base.trim()),
                "Invalid currency code: {base}"
            );
            info!(base, "Manual resync of a single base currency");
            config.sync.for_single_base(base)
        }
        None => config.sync.clone(),
    };

    let scratch = dry_run.then(|| Arc::new(MemoryRateStore::new()));
    let store: Arc<dyn RateStore> = match &scratch {
        Some(scratch) => scratch.clone(),
        None => open_rate_store(config)?,
    };
    let provider = build_provider(&config.provider, &sync_config.api_key)?;
    let engine = SyncEngine::new(provider, store, SyncOptions::from_config(&config.provider));

    let spinner = ui::new_spinner(&format!("Syncing exchange rates for {date}"));
    let outcome = engine.run(&sync_config, date).await;
    spinner.finish_and_clear();

    if let Some(scratch) = &scratch {
        let records = scratch.list_for_date(date)?;
        println!(
            "{}",
            ui::style_text(
                &format!("Dry run: {} rates for {date} were not saved", records.len()),
                ui::StyleType::Title
            )
        );
        if !records.is_empty() {
            println!("{}", super::rates::rates_table(&records));
        }
    }

    match outcome.status() {
        RunStatus::Succeeded => {
            println!("{}", ui::style_text(&outcome.summary, ui::StyleType::Success));
            if let Some(report) = &outcome.report {
                for message in &report.messages {
                    println!("{}", ui::style_text(message, ui::StyleType::Subtle));
                }
            }
            Ok(())
        }
        RunStatus::CompletedWithIssues => {
            println!("{}", ui::style_text(&outcome.summary, ui::StyleType::Warning));
            Ok(())
        }
        RunStatus::Failed => {
            println!("{}", ui::style_text(&outcome.summary, ui::StyleType::Error));
            anyhow::bail!("{}", outcome.summary)
        }
    }
}
