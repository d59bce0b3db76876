//! Rate provider abstractions

use crate::core::error::FetchError;
use crate::core::rate::Rates;
use anyhow::Result;
use async_trait::async_trait;
use serde::{Deserialize, Serialize};

/// Result of probing the provider account with the configured key.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ConnectionStatus {
    pub success: bool,
    pub plan: String,
    pub quota: String,
    pub api_status: String,
    /// Whether rates may be requested for bases other than USD.
    pub base_enabled: bool,
    pub error_code: Option<String>,
    pub message: String,
}

impl ConnectionStatus {
    pub fn failed(error_code: &str, explanation: &str) -> Self {
        Self {
            success: false,
            plan: "N/A".to_string(),
            quota: "N/A".to_string(),
            api_status: explanation.to_string(),
            base_enabled: false,
            error_code: Some(error_code.to_string()),
            message: format!("Connection failed: {error_code} - {explanation}"),
        }
    }

    /// Label shown for the allowed base currencies.
    pub fn base_option(&self) -> &'static str {
        match (self.success, self.base_enabled) {
            (false, _) => "N/A",
            (true, true) => "All Currencies",
            (true, false) => "USD Only",
        }
    }
}

/// Request counters for the current billing period.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct UsageInfo {
    pub requests: u64,
    pub requests_quota: u64,
    pub requests_remaining: i64,
    pub days_elapsed: u64,
    pub days_remaining: u64,
    pub daily_average: u64,
}

#[async_trait]
pub trait RateProvider: Send + Sync {
    fn name(&self) -> &str;

    /// Single attempt at fetching the latest rates of `symbols` against
    /// `base`. Retrying is the caller's concern.
    async fn latest(&self, base: &str, symbols: &[String]) -> Result<Rates, FetchError>;

    async fn check_connection(&self) -> Result<ConnectionStatus>;

    async fn usage(&self) -> Result<UsageInfo> {
        anyhow::bail!("{} does not report API usage", self.name())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_base_option_labels() {
        let mut status = ConnectionStatus {
            success: true,
            plan: "Free".into(),
            quota: "1000".into(),
            api_status: "active".into(),
            base_enabled: false,
            error_code: None,
            message: String::new(),
        };
        assert_eq!(status.base_option(), "USD Only");
        status.base_enabled = true;
        assert_eq!(status.base_option(), "All Currencies");

        let failed = ConnectionStatus::failed("invalid_app_id", "Invalid App ID provided.");
        assert_eq!(failed.base_option(), "N/A");
        assert_eq!(failed.quota, "N/A");
        assert_eq!(
            failed.message,
            "Connection failed: invalid_app_id - Invalid App ID provided."
        );
    }
}
