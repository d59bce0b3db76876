//! Sync orchestrator
//!
//! One run processes every configured base currency strictly in sequence:
//! fetch (with retry), upsert each rate and its inverse, remember the USD
//! rate set, then derive cross rates once all bases are done. Per-base faults
//! end up in the [`RunReport`], per-pair faults only in the log. Nothing
//! escapes `run`.

use crate::core::config::{ProviderConfig, SyncConfig};
use crate::core::cross::derive_all;
use crate::core::error::{ConfigError, SyncError};
use crate::core::fetch::{RetryPolicy, fetch_with_retry};
use crate::core::provider::RateProvider;
use crate::core::rate::{REFERENCE_CURRENCY, Rates, is_currency_code, is_valid_rate};
use crate::core::report::{RunReport, RunStatus};
use crate::core::store::RateStore;
use crate::core::upsert::upsert_pair;
use chrono::NaiveDate;
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, error, info, instrument, warn};

#[derive(Debug, Clone, Copy)]
pub struct SyncOptions {
    pub retry: RetryPolicy,
    /// Pause after each processed base, throttling requests to the provider.
    pub delay: Duration,
}

impl SyncOptions {
    pub fn from_config(config: &ProviderConfig) -> Self {
        let delay = Duration::from_millis(config.request_delay_ms);
        Self {
            retry: RetryPolicy::new(config.max_attempts, delay),
            delay,
        }
    }
}

/// Result of one orchestrator invocation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SyncOutcome {
    pub summary: String,
    /// `None` when the run stopped on a configuration problem.
    pub report: Option<RunReport>,
}

impl SyncOutcome {
    pub fn status(&self) -> RunStatus {
        self.report
            .as_ref()
            .map_or(RunStatus::Failed, RunReport::status)
    }
}

/// Checks the snapshot before any request is made.
pub fn validate_config(config: &SyncConfig) -> Result<(), ConfigError> {
    if !config.enabled {
        return Err(ConfigError::Disabled);
    }
    if config.api_key.trim().is_empty() {
        return Err(ConfigError::MissingApiKey);
    }
    if config.base_currencies.is_empty() {
        return Err(ConfigError::NoBaseCurrencies);
    }
    if config.target_currencies.is_empty() {
        return Err(ConfigError::NoTargetCurrencies);
    }
    Ok(())
}

pub struct SyncEngine {
    provider: Arc<dyn RateProvider>,
    store: Arc<dyn RateStore>,
    options: SyncOptions,
}

impl SyncEngine {
    pub fn new(
        provider: Arc<dyn RateProvider>,
        store: Arc<dyn RateStore>,
        options: SyncOptions,
    ) -> Self {
        Self {
            provider,
            store,
            options,
        }
    }

    #[instrument(name = "SyncRun", skip(self, config), fields(provider = self.provider.name()))]
    pub async fn run(&self, config: &SyncConfig, date: NaiveDate) -> SyncOutcome {
        if let Err(err) = validate_config(config) {
            error!(error = %err, "Exchange rate sync not started");
            return SyncOutcome {
                summary: err.to_string(),
                report: None,
            };
        }

        info!(
            bases = config.base_currencies.len(),
            targets = config.target_currencies.len(),
            "Exchange rate sync starting"
        );

        let mut report = RunReport::default();
        let mut usd_rates: Option<Rates> = None;

        for base in &config.base_currencies {
            let fetched = self.sync_base(config, base, date, &mut report).await;
            if base == REFERENCE_CURRENCY {
                if let Some(mut captured) = fetched {
                    captured.entry(REFERENCE_CURRENCY.to_string()).or_insert(1.0);
                    usd_rates = Some(captured);
                }
            }
        }

        if config.cross_rate_conversion {
            self.derive_cross_rates(config, date, usd_rates.as_ref(), &mut report);
        }

        let summary = report.summary();
        info!(
            succeeded = report.success_count,
            failed = report.fail_count,
            "Exchange rate sync finished"
        );
        SyncOutcome {
            summary,
            report: Some(report),
        }
    }

    /// Fetches and stores one base. Returns the fetched rates when the base
    /// was processed.
    async fn sync_base(
        &self,
        config: &SyncConfig,
        base: &str,
        date: NaiveDate,
        report: &mut RunReport,
    ) -> Option<Rates> {
        let symbols: Vec<String> = config
            .target_currencies
            .iter()
            .filter(|code| *code != base)
            .cloned()
            .collect();
        if symbols.is_empty() {
            report.note(format!(
                "Skipped {base}: no target currencies after excluding base."
            ));
            return None;
        }

        let outcome =
            fetch_with_retry(self.provider.as_ref(), base, &symbols, self.options.retry).await;

        let status = outcome.status();
        let rates = match outcome.rates {
            Some(rates) => rates,
            None => {
                let err = match outcome.last_error {
                    Some(fetch_error) => SyncError::from_fetch(base, fetch_error),
                    None => SyncError::Network {
                        base: base.to_string(),
                    },
                };
                error!(
                    base,
                    attempts = outcome.attempts,
                    status = ?status,
                    error = %err,
                    "Exchange rate fetch failed"
                );
                report.fail(err);
                self.pause().await;
                return None;
            }
        };

        if rates.is_empty() {
            let err = SyncError::EmptyRates {
                base: base.to_string(),
            };
            error!(base, error = %err, "Exchange rate response had no rates");
            report.fail(err);
            self.pause().await;
            return None;
        }

        let updated = self.store_rates(base, date, &rates);
        match self.store.commit() {
            Ok(()) => report.succeed(format!("Updated {updated} pairs for base {base}.")),
            Err(source) => {
                let err = SyncError::Commit {
                    scope: format!("base {base}"),
                    source,
                };
                error!(base, error = %err, "Failed to commit base rates");
                report.fail(err);
            }
        }

        self.pause().await;
        Some(rates)
    }

    /// Upserts every valid rate and its inverse. Faulty pairs are logged and
    /// skipped; the count of fully written pairs is returned.
    fn store_rates(&self, base: &str, date: NaiveDate, rates: &Rates) -> usize {
        let mut updated = 0;
        for (to, &rate) in rates {
            if to == base {
                debug!(base, "Ignoring identity rate");
                continue;
            }
            if !is_currency_code(to) {
                warn!(base, to = %to, "Skipping malformed currency code from provider");
                continue;
            }
            if !is_valid_rate(rate) {
                warn!(base, to = %to, rate, "Skipping invalid rate from provider");
                continue;
            }

            match upsert_pair(self.store.as_ref(), date, base, to, rate) {
                Ok(()) => updated += 1,
                Err(err) => error!(base, to = %to, error = %err, "Exchange rate upsert error"),
            }
        }
        updated
    }

    fn derive_cross_rates(
        &self,
        config: &SyncConfig,
        date: NaiveDate,
        usd_rates: Option<&Rates>,
        report: &mut RunReport,
    ) {
        let Some(usd_rates) = usd_rates else {
            let note = format!(
                "Cross rate conversion skipped: {REFERENCE_CURRENCY} rates were not fetched."
            );
            warn!("{}", note);
            report.note(note);
            return;
        };

        let result = derive_all(
            self.store.as_ref(),
            date,
            &config.target_currencies,
            usd_rates,
        )
        .and_then(|derived| {
            self.store
                .commit()
                .map(|()| derived)
                .map_err(|source| SyncError::Commit {
                    scope: "cross rates".to_string(),
                    source,
                })
        });

        match result {
            Ok(derived) => report.note(format!("Derived {derived} cross rate pairs.")),
            Err(err) => {
                let err = SyncError::CrossRate(Box::new(err));
                error!(error = %err, "Cross rate conversion failed");
                report.fail(err);
            }
        }
    }

    async fn pause(&self) {
        if !self.options.delay.is_zero() {
            tokio::time::sleep(self.options.delay).await;
        }
    }
}
