use crate::core::error::FetchError;
use crate::core::provider::RateProvider;
use crate::core::rate::Rates;
use std::time::Duration;
use tracing::{debug, warn};

/// Bounded retry with a constant pause between attempts.
#[derive(Debug, Clone, Copy)]
pub struct RetryPolicy {
    pub max_attempts: u32,
    pub delay: Duration,
}

impl RetryPolicy {
    pub fn new(max_attempts: u32, delay: Duration) -> Self {
        Self {
            max_attempts: max_attempts.max(1),
            delay,
        }
    }
}

/// What the retrying fetch ended with.
#[derive(Debug)]
pub struct FetchOutcome {
    /// Parsed rates on success, `None` once every attempt failed.
    pub rates: Option<Rates>,
    /// Failure of the final attempt.
    pub last_error: Option<FetchError>,
    pub attempts: u32,
}

impl FetchOutcome {
    /// Final status: 200 on success, the last HTTP status otherwise, `None`
    /// when the last attempt failed below HTTP.
    pub fn status(&self) -> Option<u16> {
        match (&self.rates, &self.last_error) {
            (Some(_), _) => Some(200),
            (None, Some(error)) => error.status(),
            (None, None) => None,
        }
    }
}

/// Fetches the latest rates for `base`, retrying failed attempts up to the
/// policy's limit. A successful response is returned immediately.
pub async fn fetch_with_retry(
    provider: &dyn RateProvider,
    base: &str,
    symbols: &[String],
    policy: RetryPolicy,
) -> FetchOutcome {
    let mut attempt = 1;
    loop {
        match provider.latest(base, symbols).await {
            Ok(rates) => {
                debug!(base, attempt, count = rates.len(), "Fetched rates");
                return FetchOutcome {
                    rates: Some(rates),
                    last_error: None,
                    attempts: attempt,
                };
            }
            Err(err) => {
                match &err {
                    FetchError::Transport(detail) => warn!(
                        provider = provider.name(),
                        base,
                        attempt,
                        error = %detail,
                        "Exchange rate request failed"
                    ),
                    FetchError::Http { status, body } => warn!(
                        provider = provider.name(),
                        base,
                        attempt,
                        status,
                        body = %truncate(body, 2000),
                        "Exchange rate API returned non-200"
                    ),
                    FetchError::Rejected { code, message } => warn!(
                        provider = provider.name(),
                        base,
                        attempt,
                        code,
                        message = %message,
                        "Exchange rate API rejected request"
                    ),
                }
                if attempt >= policy.max_attempts {
                    return FetchOutcome {
                        rates: None,
                        last_error: Some(err),
                        attempts: attempt,
                    };
                }
            }
        }

        attempt += 1;
        tokio::time::sleep(policy.delay).await;
    }
}

/// Cuts `text` to at most `max` characters for logging.
pub fn truncate(text: &str, max: usize) -> &str {
    match text.char_indices().nth(max) {
        Some((idx, _)) => &text[..idx],
        None => text,
    }
}
