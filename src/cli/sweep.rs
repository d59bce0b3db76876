use super::ui;
use crate::core::config::AppConfig;
use crate::core::retention::{SweepOutcome, retention_cutoff, sweep};
use crate::store::open_rate_store;
use anyhow::Result;
use chrono::NaiveDate;

pub fn run_sweep(config: &AppConfig, today: NaiveDate) -> Result<()> {
    let store = open_rate_store(config)?;
    let cutoff = retention_cutoff(today, config.retention_days);

    match sweep(store.as_ref(), &config.sync, cutoff) {
        SweepOutcome::Disabled => {
            println!(
                "{}",
                ui::style_text(
                    "Exchange rate sync is disabled, nothing was deleted.",
                    ui::StyleType::Subtle
                )
            );
            Ok(())
        }
        SweepOutcome::Deleted(count) => {
            println!(
                "{}",
                ui::style_text(
                    &format!("Deleted {count} rates dated before {cutoff}."),
                    ui::StyleType::Success
                )
            );
            Ok(())
        }
        SweepOutcome::Failed => anyhow::bail!("Failed to delete rates dated before {cutoff}"),
    }
}
