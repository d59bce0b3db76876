use crate::core::error::FetchError;
use crate::core::provider::{ConnectionStatus, RateProvider, UsageInfo};
use crate::core::rate::Rates;
use anyhow::{Context, Result, anyhow};
use async_trait::async_trait;
use reqwest::Url;
use serde::Deserialize;
use std::collections::BTreeMap;
use std::time::Duration;
use tracing::{debug, instrument};

const ERROR_EXPLANATIONS: &[(&str, &str)] = &[
    (
        "invalid_app_id",
        "Invalid App ID provided. Please check your API Key.",
    ),
    (
        "missing_app_id",
        "No App ID provided. Please provide an API Key.",
    ),
    (
        "not_allowed",
        "This App ID does not have access to the requested feature.",
    ),
    (
        "access_restricted",
        "Access restricted due to overuse or account limits.",
    ),
    (
        "invalid_base",
        "The requested base currency is not supported.",
    ),
    (
        "not_found",
        "The requested API route or resource does not exist.",
    ),
];

/// Human readable explanation of an Open Exchange Rates error code.
pub fn explain_error(code: &str) -> &'static str {
    ERROR_EXPLANATIONS
        .iter()
        .find(|(known, _)| *known == code)
        .map(|(_, explanation)| *explanation)
        .unwrap_or("Unknown error. Please try again or contact support.")
}

pub struct OpenExchangeRatesProvider {
    base_url: String,
    api_key: String,
    client: reqwest::Client,
}

impl OpenExchangeRatesProvider {
    pub fn new(base_url: &str, api_key: &str, timeout: Duration) -> Result<Self> {
        let client = reqwest::Client::builder()
            .user_agent("fxsync/0.1")
            .timeout(timeout)
            .build()?;
        Ok(Self {
            base_url: base_url.trim_end_matches('/').to_string(),
            api_key: api_key.to_string(),
            client,
        })
    }

    fn endpoint(&self, name: &str, params: &[(&str, &str)]) -> Result<Url> {
        let mut query = vec![("app_id", self.api_key.as_str())];
        query.extend_from_slice(params);
        Url::parse_with_params(&format!("{}/{}", self.base_url, name), &query)
            .with_context(|| format!("Invalid provider URL: {}", self.base_url))
    }

    async fn get_usage(&self) -> Result<(u16, String)> {
        let url = self.endpoint("usage.json", &[])?;
        let response = self
            .client
            .get(url)
            .send()
            .await
            .map_err(|e| anyhow!("Request error: {} for usage info", e))?;
        let status = response.status().as_u16();
        let text = response.text().await?;
        Ok((status, text))
    }
}

#[derive(Debug, Deserialize)]
struct LatestResponse {
    #[serde(default)]
    rates: BTreeMap<String, Option<f64>>,
}

#[derive(Debug, Deserialize)]
struct ErrorResponse {
    message: Option<String>,
    description: Option<String>,
}

#[derive(Debug, Deserialize)]
struct UsageResponse {
    status: Option<u16>,
    data: Option<UsageData>,
    message: Option<String>,
    description: Option<String>,
}

#[derive(Debug, Deserialize)]
struct UsageData {
    status: Option<String>,
    plan: UsagePlan,
    usage: Option<UsageInfo>,
}

#[derive(Debug, Deserialize)]
struct UsagePlan {
    name: Option<String>,
    quota: Option<String>,
    #[serde(default)]
    features: PlanFeatures,
}

#[derive(Debug, Deserialize, Default)]
struct PlanFeatures {
    #[serde(default)]
    base: bool,
}

#[async_trait]
impl RateProvider for OpenExchangeRatesProvider {
    fn name(&self) -> &str {
        "openexchangerates.org"
    }

    #[instrument(name = "OxrLatest", skip(self, symbols), fields(base = %base))]
    async fn latest(&self, base: &str, symbols: &[String]) -> Result<Rates, FetchError> {
        let joined = symbols.join(",");
        let url = self
            .endpoint("latest.json", &[("base", base), ("symbols", joined.as_str())])
            .map_err(|e| FetchError::Transport(e.to_string()))?;
        debug!("Requesting rates for base {}", base);

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

        let data: LatestResponse = serde_json::from_str(&text).map_err(|e| {
            FetchError::Transport(format!("Failed to parse rates response: {e}"))
        })?;

        // Null rates become 0.0 so they are skipped as invalid downstream.
        Ok(data
            .rates
            .into_iter()
            .map(|(code, rate)| (code, rate.unwrap_or(0.0)))
            .collect())
    }

    async fn check_connection(&self) -> Result<ConnectionStatus> {
        let (status, text) = self.get_usage().await?;

        if status != 200 {
            let error: ErrorResponse = serde_json::from_str(&text).unwrap_or(ErrorResponse {
                message: None,
                description: None,
            });
            let code = error.message.unwrap_or_else(|| "Unknown Error".to_string());
            debug!(status, code = %code, description = ?error.description, "Connection test failed");
            return Ok(ConnectionStatus::failed(&code, explain_error(&code)));
        }

        let usage: UsageResponse =
            serde_json::from_str(&text).context("Failed to parse usage response")?;
        let data = usage
            .data
            .ok_or_else(|| anyhow!("Usage response has no data"))?;

        Ok(ConnectionStatus {
            success: true,
            plan: data.plan.name.unwrap_or_else(|| "N/A".to_string()),
            quota: data.plan.quota.unwrap_or_else(|| "N/A".to_string()),
            api_status: data.status.unwrap_or_else(|| "active".to_string()),
            base_enabled: data.plan.features.base,
            error_code: None,
            message: "Connection successful.".to_string(),
        })
    }

    async fn usage(&self) -> Result<UsageInfo> {
        let (status, text) = self
            .get_usage()
            .await
            .context("Failed to fetch usage info")?;

        let usage: UsageResponse = serde_json::from_str(&text)
            .with_context(|| format!("Failed to fetch usage info: HTTP {status}"))?;

        if status != 200 || usage.status != Some(200) {
            let desc = usage
                .description
                .or(usage.message)
                .unwrap_or_else(|| "Unknown error.".to_string());
            return Err(anyhow!("Failed to fetch usage info: {}", desc));
        }

        usage
            .data
            .and_then(|data| data.usage)
            .ok_or_else(|| anyhow!("Failed to fetch usage info: response has no usage data"))
    }
}
