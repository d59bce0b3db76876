use crate::core::rate::{is_currency_code, normalize_currencies};
use anyhow::{Context, Result};
use directories::ProjectDirs;
use serde::{Deserialize, Deserializer, Serialize};
use std::{fs, path::PathBuf};
use tracing::debug;

fn currency_list<'de, D>(deserializer: D) -> Result<Vec<String>, D::Error>
where
    D: Deserializer<'de>,
{
    let codes = normalize_currencies(Vec::<String>::deserialize(deserializer)?);
    if let Some(invalid) = codes.iter().find(|code| !is_currency_code(code)) {
        return Err(serde::de::Error::custom(format!(
            "invalid currency code: {invalid}"
        )));
    }
    Ok(codes)
}

/// Snapshot of everything a sync run reads. The orchestrator never writes it.
#[derive(Debug, Deserialize, Serialize, Clone, Default)]
pub struct SyncConfig {
    #[serde(default)]
    pub enabled: bool,
    #[serde(default)]
    pub api_key: String,
    #[serde(default, deserialize_with = "currency_list")]
    pub base_currencies: Vec<String>,
    #[serde(default, deserialize_with = "currency_list")]
    pub target_currencies: Vec<String>,
    #[serde(default)]
    pub cross_rate_conversion: bool,
}

impl SyncConfig {
    /// Copy of this snapshot limited to a single base currency, used for a
    /// manual resync of one base.
    pub fn for_single_base(&self, base: &str) -> Self {
        Self {
            base_currencies: normalize_currencies([base]),
            ..self.clone()
        }
    }
}

#[derive(Debug, Deserialize, Serialize, Clone, Copy, PartialEq, Eq, Default)]
#[serde(rename_all = "snake_case")]
pub enum ProviderKind {
    #[default]
    OpenExchangeRates,
    ExchangeRateHost,
}

impl ProviderKind {
    pub fn default_base_url(&self) -> &'static str {
        match self {
            ProviderKind::OpenExchangeRates => "https://openexchangerates.org/api",
            ProviderKind::ExchangeRateHost => "https://api.exchangerate.host",
        }
    }
}

fn default_timeout_secs() -> u64 {
    15
}

fn default_max_attempts() -> u32 {
    2
}

fn default_request_delay_ms() -> u64 {
    1000
}

fn default_retention_days() -> i64 {
    1
}

#[derive(Debug, Deserialize, Serialize, Clone)]
pub struct ProviderConfig {
    #[serde(default)]
    pub kind: ProviderKind,
    pub base_url: Option<String>,
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,
    #[serde(default = "default_max_attempts")]
    pub max_attempts: u32,
    #[serde(default = "default_request_delay_ms")]
    pub request_delay_ms: u64,
}

impl ProviderConfig {
    pub fn base_url(&self) -> &str {
        self.base_url
            .as_deref()
            .unwrap_or_else(|| self.kind.default_base_url())
    }
}

impl Default for ProviderConfig {
    fn default() -> Self {
        ProviderConfig {
            kind: ProviderKind::default(),
            base_url: None,
            timeout_secs: default_timeout_secs(),
            max_attempts: default_max_attempts(),
            request_delay_ms: default_request_delay_ms(),
        }
    }
}

/// Outcome of the last connection test, recorded only by the explicit
/// `test-connection` command.
#[derive(Debug, Deserialize, Serialize, Clone, PartialEq)]
pub struct ConnectionInfo {
    pub success: bool,
    pub plan: String,
    pub quota: String,
    pub api_status: String,
    pub base_option: String,
}

#[derive(Debug, Deserialize, Serialize, Clone)]
pub struct AppConfig {
    #[serde(default)]
    pub sync: SyncConfig,
    #[serde(default)]
    pub provider: ProviderConfig,
    #[serde(default = "default_retention_days")]
    pub retention_days: i64,
    pub data_path: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub connection: Option<ConnectionInfo>,
}

/// Which currency list a mutation applies to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CurrencyList {
    Base,
    Target,
}

impl AppConfig {
    pub fn load() -> Result<Self> {
        debug!("Loading default config");
        let config_path = Self::default_config_path()?;
        Self::load_from_path(&config_path)
    }

    pub fn default_config_path() -> Result<PathBuf> {
        let proj_dirs = ProjectDirs::from("org", "fxsync", "fxsync")
            .context("Could not determine project directories")?;
        Ok(proj_dirs.config_dir().join("config.yaml"))
    }

    pub fn default_data_path(&self) -> Result<PathBuf> {
        if let Some(custom_path) = &self.data_path {
            return Ok(PathBuf::from(custom_path));
        }
        let proj_dirs = ProjectDirs::from("org", "fxsync", "fxsync")
            .context("Could not determine project directories")?;
        Ok(proj_dirs.data_dir().to_path_buf())
    }

    pub fn load_from_path<P: AsRef<std::path::Path>>(path: P) -> Result<Self> {
        let config_str = fs::read_to_string(path.as_ref())
            .with_context(|| format!("Failed to read config file: {}", path.as_ref().display()))?;

        let config: Self = serde_yaml::from_str(&config_str)
            .with_context(|| format!("Failed to parse config file: {}", path.as_ref().display()))?;
        debug!("Successfully loaded config");
        Ok(config)
    }

    pub fn save_to_path<P: AsRef<std::path::Path>>(&self, path: P) -> Result<()> {
        let config_str = serde_yaml::to_string(self).context("Failed to serialize config")?;
        fs::write(path.as_ref(), config_str)
            .with_context(|| format!("Failed to write config file: {}", path.as_ref().display()))?;
        debug!("Saved config to {}", path.as_ref().display());
        Ok(())
    }

    fn list_mut(&mut self, list: CurrencyList) -> &mut Vec<String> {
        match list {
            CurrencyList::Base => &mut self.sync.base_currencies,
            CurrencyList::Target => &mut self.sync.target_currencies,
        }
    }

    /// Adds a currency to a list. Returns `false` when it was already present.
    pub fn add_currency(&mut self, list: CurrencyList, code: &str) -> Result<bool> {
        let code = code.trim().to_uppercase();
        anyhow::ensure!(is_currency_code(&code), "Invalid currency code: {code}");

        let currencies = self.list_mut(list);
        if currencies.contains(&code) {
            return Ok(false);
        }
        currencies.push(code);
        Ok(true)
    }

    /// Removes a currency from a list. Returns `false` when it was not present.
    pub fn remove_currency(&mut self, list: CurrencyList, code: &str) -> bool {
        let code = code.trim().to_uppercase();
        let currencies = self.list_mut(list);
        let before = currencies.len();
        currencies.retain(|c| *c != code);
        currencies.len() != before
    }
}
