use crate::core::error::FetchError;
use crate::core::provider::{ConnectionStatus, RateProvider};
use crate::core::rate::Rates;
use anyhow::{Context, Result};
use async_trait::async_trait;
use reqwest::Url;
use serde::Deserialize;
use std::collections::BTreeMap;
use std::time::Duration;
use tracing::{debug, instrument, warn};

/// Adapter for the exchangerate.host `live` endpoint. Quotes come back keyed
/// by the concatenated pair (`USDEUR`), so the source prefix is stripped.
pub struct ExchangeRateHostProvider {
    base_url: String,
    access_key: String,
    client: reqwest::Client,
}

impl ExchangeRateHostProvider {
    pub fn new(base_url: &str, access_key: &str, timeout: Duration) -> Result<Self> {
        let client = reqwest::Client::builder()
            .user_agent("fxsync/0.1")
            .timeout(timeout)
            .build()?;
        Ok(Self {
            base_url: base_url.trim_end_matches('/').to_string(),
            access_key: access_key.to_string(),
            client,
        })
    }

    fn live_url(&self, source: &str, currencies: &str) -> Result<Url> {
        Url::parse_with_params(
            &format!("{}/live", self.base_url),
            &[
                ("access_key", self.access_key.as_str()),
                ("source", source),
                ("currencies", currencies),
            ],
        )
        .with_context(|| format!("Invalid provider URL: {}", self.base_url))
    }
}

#[derive(Debug, Deserialize)]
struct LiveResponse {
    #[serde(default)]
    success: bool,
    #[serde(default)]
    quotes: BTreeMap<String, Option<f64>>,
    error: Option<LiveError>,
}

#[derive(Debug, Deserialize)]
struct LiveError {
    #[serde(default)]
    code: i64,
    #[serde(default)]
    info: String,
}

fn quotes_to_rates(source: &str, quotes: BTreeMap<String, Option<f64>>) -> Rates {
    quotes
        .into_iter()
        .filter_map(|(pair, rate)| match pair.strip_prefix(source) {
            Some(target) if !target.is_empty() => Some((target.to_string(), rate.unwrap_or(0.0))),
            _ => {
                warn!(pair = %pair, source, "Ignoring quote for a different source currency");
                None
            }
        })
        .collect()
}

#[async_trait]
impl RateProvider for ExchangeRateHostProvider {
    fn name(&self) -> &str {
        "exchangerate.host"
    }

    #[instrument(name = "ErhLive", skip(self, symbols), fields(base = %base))]
    async fn latest(&self, base: &str, symbols: &[String]) -> Result<Rates, FetchError> {
        let url = self
            .live_url(base, &symbols.join(","))
            .map_err(|e| FetchError::Transport(e.to_string()))?;
        debug!("Requesting live quotes for source {}", base);

        let response = self
            .client
            .get(url)
            .send()
            .await
            .map_err(|e| FetchError::Transport(e.to_string()))?;
        let status = response.status();
        let text = response
            .text()
            .await
            .map_err(|e| FetchError::Transport(e.to_string()))?;

        if !status.is_success() {
            return Err(FetchError::Http {
                status: status.as_u16(),
                body: text,
            });
        }

        let data: LiveResponse = serde_json::from_str(&text).map_err(|e| {
            FetchError::Transport(format!("Failed to parse live response: {e}"))
        })?;

        if !data.success {
            let error = data.error.unwrap_or(LiveError {
                code: 0,
                info: "request was not successful".to_string(),
            });
            return Err(FetchError::Rejected {
                code: error.code,
                message: error.info,
            });
        }

        Ok(quotes_to_rates(base, data.quotes))
    }

    /// Probes a USD-sourced quote, then a EUR-sourced one to find out whether
    /// the plan allows switching the source currency.
    async fn check_connection(&self) -> Result<ConnectionStatus> {
        match self.latest("USD", &["EUR".to_string()]).await {
            Ok(_) => {
                let base_enabled = match self.latest("EUR", &["USD".to_string()]).await {
                    Ok(_) => true,
                    Err(err) => {
                        debug!(error = %err, "Source currency switching not available");
                        false
                    }
                };
                Ok(ConnectionStatus {
                    success: true,
                    plan: "N/A".to_string(),
                    quota: "N/A".to_string(),
                    api_status: "active".to_string(),
                    base_enabled,
                    error_code: None,
                    message: "Connection successful.".to_string(),
                })
            }
            Err(FetchError::Transport(detail)) => {
                Err(anyhow::anyhow!("Request error: {} for connection test", detail))
            }
            Err(FetchError::Http { status, .. }) => Ok(ConnectionStatus::failed(
                &status.to_string(),
                "The provider returned an HTTP error.",
            )),
            Err(FetchError::Rejected { code, message }) => {
                Ok(ConnectionStatus::failed(&code.to_string(), &message))
            }
        }
    }
}
