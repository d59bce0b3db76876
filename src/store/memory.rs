use crate::core::rate::{RateKey, RateRecord};
use crate::core::store::RateStore;
use anyhow::{Result, anyhow};
use chrono::NaiveDate;
use std::collections::BTreeMap;
use std::sync::Mutex;
use tracing::debug;

/// In-memory rate store using a BTreeMap behind a Mutex
#[derive(Default)]
pub struct MemoryRateStore {
    inner: Mutex<BTreeMap<RateKey, RateRecord>>,
}

impl MemoryRateStore {
    pub fn new() -> Self {
        Self::default()
    }

    fn lock(&self) -> Result<std::sync::MutexGuard<'_, BTreeMap<RateKey, RateRecord>>> {
        self.inner
            .lock()
            .map_err(|_| anyhow!("Memory rate store lock poisoned"))
    }

    pub fn len(&self) -> usize {
        self.lock().map(|records| records.len()).unwrap_or(0)
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl RateStore for MemoryRateStore {
    fn find(&self, key: &RateKey) -> Result<Option<RateRecord>> {
        Ok(self.lock()?.get(key).cloned())
    }

    fn insert(&self, record: &RateRecord) -> Result<()> {
        let mut records = self.lock()?;
        let key = record.key();
        if records.contains_key(&key) {
            return Err(anyhow!("Rate already exists for {key}"));
        }
        debug!("Rate INSERT for key: {}", key);
        records.insert(key, record.clone());
        Ok(())
    }

    fn update_rate(&self, key: &RateKey, rate: f64) -> Result<()> {
        let mut records = self.lock()?;
        let record = records
            .get_mut(key)
            .ok_or_else(|| anyhow!("No rate stored for {key}"))?;
        debug!("Rate UPDATE for key: {}", key);
        record.rate = rate;
        Ok(())
    }

    fn delete_before(&self, cutoff: NaiveDate) -> Result<usize> {
        let mut records = self.lock()?;
        let before = records.len();
        records.retain(|key, _| key.date >= cutoff);
        Ok(before - records.len())
    }

    fn list_for_date(&self, date: NaiveDate) -> Result<Vec<RateRecord>> {
        Ok(self
            .lock()?
            .values()
            .filter(|record| record.date == date)
            .cloned()
            .collect())
    }

    fn commit(&self) -> Result<()> {
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn day(d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(2025, 3, d).unwrap()
    }

    #[test]
    fn test_insert_find_update() -> Result<()> {
        let store = MemoryRateStore::new();
        let key = RateKey::new(day(10), "USD", "EUR");

        assert!(store.find(&key)?.is_none());
        store.insert(&RateRecord::new(key.clone(), 0.91))?;
        assert_eq!(store.find(&key)?.map(|r| r.rate), Some(0.91));

        store.update_rate(&key, 0.93)?;
        assert_eq!(store.find(&key)?.map(|r| r.rate), Some(0.93));
        assert_eq!(store.len(), 1);
        Ok(())
    }

    #[test]
    fn test_duplicate_insert_rejected() {
        let store = MemoryRateStore::new();
        let record = RateRecord::new(RateKey::new(day(10), "USD", "EUR"), 0.91);
        store.insert(&record).unwrap();
        assert!(store.insert(&record).is_err());
    }

    #[test]
    fn test_update_missing_fails() {
        let store = MemoryRateStore::new();
        let key = RateKey::new(day(10), "USD", "EUR");
        assert!(store.update_rate(&key, 1.0).is_err());
    }

    #[test]
    fn test_delete_before_cutoff() -> Result<()> {
        let store = MemoryRateStore::new();
        for d in [8, 9, 10] {
            store.insert(&RateRecord::new(RateKey::new(day(d), "USD", "EUR"), 0.9))?;
        }
        assert_eq!(store.delete_before(day(9))?, 1);
        assert_eq!(store.list_for_date(day(9))?.len(), 1);
        assert_eq!(store.list_for_date(day(10))?.len(), 1);
        assert!(store.list_for_date(day(8))?.is_empty());
        Ok(())
    }
}
