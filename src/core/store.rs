//! Persistence abstraction for rate records

use crate::core::rate::{RateKey, RateRecord};
use anyhow::Result;
use chrono::NaiveDate;

/// Keyed storage of [`RateRecord`]s.
///
/// The lookup-then-write sequence used by upserts is not atomic; callers are
/// expected to run a single writer at a time.
pub trait RateStore: Send + Sync {
    fn find(&self, key: &RateKey) -> Result<Option<RateRecord>>;

    /// Inserts a record whose key is not present yet.
    fn insert(&self, record: &RateRecord) -> Result<()>;

    /// Overwrites the rate of an existing record, keeping its identity.
    fn update_rate(&self, key: &RateKey, rate: f64) -> Result<()>;

    /// Deletes every record dated strictly before `cutoff`, returning the
    /// number of records removed.
    fn delete_before(&self, cutoff: NaiveDate) -> Result<usize>;

    fn list_for_date(&self, date: NaiveDate) -> Result<Vec<RateRecord>>;

    /// Makes all writes since the previous commit durable.
    fn commit(&self) -> Result<()>;
}
