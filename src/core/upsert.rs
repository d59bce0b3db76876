//! Keyed update-or-insert of rate records

use crate::core::error::SyncError;
use crate::core::rate::{RateKey, RateRecord, is_valid_rate};
use crate::core::store::RateStore;
use chrono::NaiveDate;
use tracing::debug;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UpsertAction {
    Inserted,
    Updated,
}

/// Stores `rate` for `(date, from, to)`, updating the existing record in
/// place when there is one. Invalid rates are refused before touching the
/// store.
pub fn upsert_rate(
    store: &dyn RateStore,
    date: NaiveDate,
    from: &str,
    to: &str,
    rate: f64,
) -> Result<UpsertAction, SyncError> {
    if !is_valid_rate(rate) {
        return Err(SyncError::InvalidRate {
            from: from.to_string(),
            to: to.to_string(),
            rate,
        });
    }

    let persistence = |source: anyhow::Error| SyncError::Persistence {
        from: from.to_string(),
        to: to.to_string(),
        source,
    };

    let key = RateKey::new(date, from, to);
    let action = match store.find(&key).map_err(persistence)? {
        Some(_) => {
            store.update_rate(&key, rate).map_err(persistence)?;
            UpsertAction::Updated
        }
        None => {
            store
                .insert(&RateRecord::new(key, rate))
                .map_err(persistence)?;
            UpsertAction::Inserted
        }
    };
    debug!(%date, from, to, rate, ?action, "Upserted rate");
    Ok(action)
}

/// Upserts `from -> to` at `rate` and `to -> from` at its reciprocal.
pub fn upsert_pair(
    store: &dyn RateStore,
    date: NaiveDate,
    from: &str,
    to: &str,
    rate: f64,
) -> Result<(), SyncError> {
    let inverse = 1.0 / rate;
    if !is_valid_rate(rate) || !is_valid_rate(inverse) {
        return Err(SyncError::InvalidRate {
            from: from.to_string(),
            to: to.to_string(),
            rate,
        });
    }

    upsert_rate(store, date, from, to, rate)?;
    upsert_rate(store, date, to, from, inverse)?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::memory::MemoryRateStore;

    fn today() -> NaiveDate {
        NaiveDate::from_ymd_opt(2025, 6, 2).unwrap()
    }

    #[test]
    fn test_insert_then_update_in_place() {
        let store = MemoryRateStore::new();

        let first = upsert_rate(&store, today(), "USD", "EUR", 0.91).unwrap();
        let second = upsert_rate(&store, today(), "USD", "EUR", 0.93).unwrap();

        assert_eq!(first, UpsertAction::Inserted);
        assert_eq!(second, UpsertAction::Updated);
        assert_eq!(store.len(), 1);
        let key = RateKey::new(today(), "USD", "EUR");
        assert_eq!(store.find(&key).unwrap().map(|r| r.rate), Some(0.93));
    }

    #[test]
    fn test_pair_stores_exact_reciprocal() {
        let store = MemoryRateStore::new();
        let rate = 83.123456;

        upsert_pair(&store, today(), "USD", "INR", rate).unwrap();

        let forward = store.find(&RateKey::new(today(), "USD", "INR")).unwrap();
        let inverse = store.find(&RateKey::new(today(), "INR", "USD")).unwrap();
        assert_eq!(forward.map(|r| r.rate), Some(rate));
        assert_eq!(inverse.map(|r| r.rate), Some(1.0 / rate));
        assert_eq!(store.len(), 2);
    }

    #[test]
    fn test_zero_and_negative_rates_never_stored() {
        let store = MemoryRateStore::new();

        for rate in [0.0, -0.5, f64::NAN] {
            let err = upsert_pair(&store, today(), "USD", "EUR", rate).unwrap_err();
            assert!(matches!(err, SyncError::InvalidRate { .. }));
        }
        assert!(store.is_empty());
    }

    #[test]
    fn test_repeated_pair_upsert_is_idempotent() {
        let store = MemoryRateStore::new();
        for _ in 0..3 {
            upsert_pair(&store, today(), "GBP", "EUR", 1.17).unwrap();
        }
        assert_eq!(store.len(), 2);
    }
}
