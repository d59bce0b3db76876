//! Cross rates derived through the reference currency

use crate::core::error::SyncError;
use crate::core::rate::{Rates, is_valid_rate, normalize_currencies};
use crate::core::store::RateStore;
use crate::core::upsert::upsert_pair;
use chrono::NaiveDate;
use tracing::debug;

/// Derives `a -> b` as `usd[b] / usd[a]` and upserts both directions.
///
/// Returns 1 when the pair was written and 0 when the reference rates do not
/// allow a derivation.
pub fn derive_cross(
    store: &dyn RateStore,
    date: NaiveDate,
    currency_a: &str,
    currency_b: &str,
    usd_rates: &Rates,
) -> Result<usize, SyncError> {
    let (Some(&usd_a), Some(&usd_b)) = (usd_rates.get(currency_a), usd_rates.get(currency_b))
    else {
        debug!(currency_a, currency_b, "Missing reference rate, skipping cross pair");
        return Ok(0);
    };
    if !is_valid_rate(usd_a) || !is_valid_rate(usd_b) {
        debug!(currency_a, currency_b, "Invalid reference rate, skipping cross pair");
        return Ok(0);
    }

    let rate = usd_b / usd_a;
    if !is_valid_rate(rate) {
        return Ok(0);
    }

    upsert_pair(store, date, currency_a, currency_b, rate)?;
    Ok(1)
}

/// Every unordered pair of `currencies`, deduplicated, in first-seen order.
pub fn cross_pairs(currencies: &[String]) -> Vec<(String, String)> {
    let unique = normalize_currencies(currencies);
    let mut pairs = Vec::new();
    for (i, a) in unique.iter().enumerate() {
        for b in &unique[i + 1..] {
            pairs.push((a.clone(), b.clone()));
        }
    }
    pairs
}

/// Derives every pair among `currencies`. Stops at the first store failure.
pub fn derive_all(
    store: &dyn RateStore,
    date: NaiveDate,
    currencies: &[String],
    usd_rates: &Rates,
) -> Result<usize, SyncError> {
    let mut updated = 0;
    for (a, b) in cross_pairs(currencies) {
        updated += derive_cross(store, date, &a, &b, usd_rates)?;
    }
    Ok(updated)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::rate::RateKey;
    use crate::store::memory::MemoryRateStore;

    fn today() -> NaiveDate {
        NaiveDate::from_ymd_opt(2025, 6, 2).unwrap()
    }

    fn usd_rates() -> Rates {
        Rates::from([
            ("USD".to_string(), 1.0),
            ("EUR".to_string(), 0.9),
            ("GBP".to_string(), 0.8),
        ])
    }

    fn stored(store: &MemoryRateStore, from: &str, to: &str) -> Option<f64> {
        store
            .find(&RateKey::new(today(), from, to))
            .unwrap()
            .map(|r| r.rate)
    }

    #[test]
    fn test_derives_ratio_and_reciprocal() {
        let store = MemoryRateStore::new();

        let updated = derive_cross(&store, today(), "EUR", "GBP", &usd_rates()).unwrap();

        assert_eq!(updated, 1);
        let forward = 0.8 / 0.9;
        assert_eq!(stored(&store, "EUR", "GBP"), Some(forward));
        assert_eq!(stored(&store, "GBP", "EUR"), Some(1.0 / forward));
    }

    #[test]
    fn test_missing_or_invalid_reference_is_noop() {
        let store = MemoryRateStore::new();
        let mut rates = usd_rates();
        rates.insert("JPY".to_string(), 0.0);

        assert_eq!(derive_cross(&store, today(), "EUR", "CHF", &rates).unwrap(), 0);
        assert_eq!(derive_cross(&store, today(), "JPY", "EUR", &rates).unwrap(), 0);
        assert!(store.is_empty());
    }

    #[test]
    fn test_pairs_are_unique_combinations() {
        let currencies: Vec<String> = ["EUR", "GBP", "eur", "INR"]
            .iter()
            .map(|c| c.to_string())
            .collect();
        let pairs = cross_pairs(&currencies);
        assert_eq!(
            pairs,
            vec![
                ("EUR".to_string(), "GBP".to_string()),
                ("EUR".to_string(), "INR".to_string()),
                ("GBP".to_string(), "INR".to_string()),
            ]
        );
    }

    #[test]
    fn test_derive_all_counts_written_pairs() {
        let store = MemoryRateStore::new();
        let currencies = vec!["EUR".to_string(), "GBP".to_string(), "INR".to_string()];

        let updated = derive_all(&store, today(), &currencies, &usd_rates()).unwrap();

        // INR has no reference rate, only EUR/GBP is derivable.
        assert_eq!(updated, 1);
        assert_eq!(store.len(), 2);
    }
}
