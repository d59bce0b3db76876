//! Core rate sync logic, independent of any concrete provider or store

pub mod config;
pub mod cross;
pub mod error;
pub mod fetch;
pub mod log;
pub mod provider;
pub mod rate;
pub mod report;
pub mod retention;
pub mod store;
pub mod sync;
pub mod upsert;

// Re-export main types for cleaner imports
pub use error::{ConfigError, FetchError, SyncError};
pub use provider::{ConnectionStatus, RateProvider, UsageInfo};
pub use rate::{RateKey, RateRecord, Rates};
pub use report::{RunReport, RunStatus};
pub use store::RateStore;
pub use sync::{SyncEngine, SyncOptions, SyncOutcome};
