use crate::core::rate::{RateKey, RateRecord, date_prefix};
use crate::core::store::RateStore;
use anyhow::{Context, Result, anyhow};
use chrono::NaiveDate;
use fjall::{Config, Keyspace, PartitionCreateOptions, PartitionHandle, PersistMode};
use std::path::Path;
use tracing::debug;

const RATES_PARTITION: &str = "rates";

/// Rate store persisted in a fjall keyspace.
///
/// Keys are encoded as `YYYY-MM-DD/FROM/TO`, so a range scan up to a date
/// prefix visits exactly the records older than that date.
pub struct DiskRateStore {
    keyspace: Keyspace,
    partition: PartitionHandle,
}

impl DiskRateStore {
    pub fn open(path: &Path) -> Result<Self> {
        std::fs::create_dir_all(path)
            .with_context(|| format!("Failed to create data directory: {}", path.display()))?;

        let keyspace = Config::new(path)
            .open()
            .with_context(|| format!("Failed to open rate store at {}", path.display()))?;
        let partition = keyspace
            .open_partition(RATES_PARTITION, PartitionCreateOptions::default())
            .context("Failed to open rates partition")?;

        debug!("Opened rate store at {}", path.display());
        Ok(Self {
            keyspace,
            partition,
        })
    }

    fn write(&self, record: &RateRecord) -> Result<()> {
        self.partition
            .insert(record.key().encode(), serde_json::to_vec(record)?)?;
        Ok(())
    }
}

impl RateStore for DiskRateStore {
    fn find(&self, key: &RateKey) -> Result<Option<RateRecord>> {
        match self.partition.get(key.encode())? {
            Some(value) => Ok(Some(serde_json::from_slice(&value)?)),
            None => Ok(None),
        }
    }

    fn insert(&self, record: &RateRecord) -> Result<()> {
        let key = record.key();
        if self.partition.contains_key(key.encode())? {
            return Err(anyhow!("Rate already exists for {key}"));
        }
        debug!("Rate INSERT for key: {}", key);
        self.write(record)
    }

    fn update_rate(&self, key: &RateKey, rate: f64) -> Result<()> {
        let mut record = self
            .find(key)?
            .ok_or_else(|| anyhow!("No rate stored for {key}"))?;
        record.rate = rate;
        debug!("Rate UPDATE for key: {}", key);
        self.write(&record)
    }

    fn delete_before(&self, cutoff: NaiveDate) -> Result<usize> {
        let mut stale = Vec::new();
        for item in self.partition.range(..date_prefix(cutoff)) {
            let (key, _) = item?;
            stale.push(key);
        }

        let deleted = stale.len();
        for key in stale {
            self.partition.remove(key)?;
        }
        self.commit()?;
        Ok(deleted)
    }

    fn list_for_date(&self, date: NaiveDate) -> Result<Vec<RateRecord>> {
        let mut records = Vec::new();
        for item in self.partition.prefix(format!("{}/", date_prefix(date))) {
            let (_, value) = item?;
            records.push(serde_json::from_slice(&value)?);
        }
        Ok(records)
    }

    fn commit(&self) -> Result<()> {
        self.keyspace
            .persist(PersistMode::SyncAll)
            .context("Failed to persist rate store")
    }
}
