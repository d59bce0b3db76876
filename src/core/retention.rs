//! Retention sweep of old rate records

use crate::core::config::SyncConfig;
use crate::core::store::RateStore;
use chrono::{NaiveDate, TimeDelta};
use tracing::{error, info};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SweepOutcome {
    /// Sync is disabled, the store was not touched.
    Disabled,
    Deleted(usize),
    /// The delete failed; details are in the log.
    Failed,
}

/// First date that survives a sweep run on `today`. A window reaching past
/// the earliest representable date keeps everything.
pub fn retention_cutoff(today: NaiveDate, retention_days: i64) -> NaiveDate {
    TimeDelta::try_days(retention_days.max(0))
        .and_then(|window| today.checked_sub_signed(window))
        .unwrap_or(NaiveDate::MIN)
}

/// Deletes every record dated strictly before `cutoff`. Never fails; a store
/// error is logged and reported as [`SweepOutcome::Failed`].
pub fn sweep(store: &dyn RateStore, config: &SyncConfig, cutoff: NaiveDate) -> SweepOutcome {
    if !config.enabled {
        info!("Exchange rate sync disabled, skipping retention sweep");
        return SweepOutcome::Disabled;
    }

    match store.delete_before(cutoff) {
        Ok(deleted) => {
            info!(%cutoff, deleted, "Deleted old exchange rates");
            SweepOutcome::Deleted(deleted)
        }
        Err(err) => {
            error!(%cutoff, error = %err, "Failed to delete old exchange rates");
            SweepOutcome::Failed
        }
    }
}
