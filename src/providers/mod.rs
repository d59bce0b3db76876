pub mod exchangerate_host;
pub mod openexchangerates;

use crate::core::config::{ProviderConfig, ProviderKind};
use crate::core::provider::RateProvider;
use anyhow::Result;
use exchangerate_host::ExchangeRateHostProvider;
use openexchangerates::OpenExchangeRatesProvider;
use std::sync::Arc;
use std::time::Duration;

/// Builds the provider adapter selected in configuration.
pub fn build_provider(config: &ProviderConfig, api_key: &str) -> Result<Arc<dyn RateProvider>> {
    let timeout = Duration::from_secs(config.timeout_secs);
    let provider: Arc<dyn RateProvider> = match config.kind {
        ProviderKind::OpenExchangeRates => Arc::new(OpenExchangeRatesProvider::new(
            config.base_url(),
            api_key,
            timeout,
        )?),
        ProviderKind::ExchangeRateHost => Arc::new(ExchangeRateHostProvider::new(
            config.base_url(),
            api_key,
            timeout,
        )?),
    };
    Ok(provider)
}
