//! Error taxonomy of a sync run
//!
//! The `Display` output of these errors is what ends up in the run report, so
//! the wording is part of the user-facing contract.

use thiserror::Error;

/// Fatal configuration problems. A run that hits one of these stops before
/// any request is made.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ConfigError {
    #[error("Exchange rate sync is disabled in the sync configuration")]
    Disabled,

    #[error("Missing API key in the sync configuration")]
    MissingApiKey,

    #[error("No base currencies configured")]
    NoBaseCurrencies,

    #[error("No target currencies configured")]
    NoTargetCurrencies,
}

/// A failed provider request, as seen after a single attempt.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum FetchError {
    /// The request never produced an HTTP response.
    #[error("transport error: {0}")]
    Transport(String),

    #[error("HTTP {status}: {body}")]
    Http { status: u16, body: String },

    /// HTTP 200, but the payload reports a provider-level failure.
    #[error("provider error {code}: {message}")]
    Rejected { code: i64, message: String },
}

impl FetchError {
    /// HTTP status of the failure, `None` for transport errors.
    pub fn status(&self) -> Option<u16> {
        match self {
            FetchError::Transport(_) => None,
            FetchError::Http { status, .. } => Some(*status),
            FetchError::Rejected { .. } => Some(200),
        }
    }
}

/// Per-base and per-pair faults that are recorded, never propagated past the
/// orchestrator.
#[derive(Debug, Error)]
pub enum SyncError {
    #[error("Network error while fetching rates for base {base}")]
    Network { base: String },

    #[error("API request failed for base {base} with status code {status}")]
    HttpStatus { base: String, status: u16 },

    #[error("Provider rejected request for base {base} (code {code}: {message})")]
    Rejected {
        base: String,
        code: i64,
        message: String,
    },

    #[error("No rates returned for base {base}")]
    EmptyRates { base: String },

    #[error("Invalid rate {rate} for {from}->{to}")]
    InvalidRate { from: String, to: String, rate: f64 },

    #[error("Failed to store rate {from}->{to}: {source}")]
    Persistence {
        from: String,
        to: String,
        #[source]
        source: anyhow::Error,
    },

    #[error("Failed to commit rates for {scope}: {source}")]
    Commit {
        scope: String,
        #[source]
        source: anyhow::Error,
    },

    #[error("Cross rate conversion failed: {0}")]
    CrossRate(#[source] Box<SyncError>),
}

impl SyncError {
    pub fn from_fetch(base: &str, error: FetchError) -> Self {
        let base = base.to_string();
        match error {
            FetchError::Transport(_) => SyncError::Network { base },
            FetchError::Http { status, .. } => SyncError::HttpStatus { base, status },
            FetchError::Rejected { code, message } => SyncError::Rejected {
                base,
                code,
                message,
            },
        }
    }
}
