//! Stored exchange-rate records and their natural key

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt::Display;

/// Currency the provider quotes every other rate against. Cross rates are
/// derived from the rate set fetched for this base.
pub const REFERENCE_CURRENCY: &str = "USD";

/// Rates returned by a provider for one base, keyed by target currency.
pub type Rates = BTreeMap<String, f64>;

/// Natural key of a [`RateRecord`]. At most one record exists per key.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct RateKey {
    pub date: NaiveDate,
    pub from_currency: String,
    pub to_currency: String,
}

impl RateKey {
    pub fn new(date: NaiveDate, from: &str, to: &str) -> Self {
        Self {
            date,
            from_currency: from.to_string(),
            to_currency: to.to_string(),
        }
    }

    /// Encodes the key so that byte order matches date order, e.g.
    /// `2025-01-31/USD/EUR`.
    pub fn encode(&self) -> String {
        format!(
            "{}/{}/{}",
            date_prefix(self.date),
            self.from_currency,
            self.to_currency
        )
    }
}

impl Display for RateKey {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "{} {}->{}",
            self.date, self.from_currency, self.to_currency
        )
    }
}

/// Fixed-width date component of an encoded key.
pub fn date_prefix(date: NaiveDate) -> String {
    date.format("%Y-%m-%d").to_string()
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RateRecord {
    pub date: NaiveDate,
    pub from_currency: String,
    pub to_currency: String,
    pub rate: f64,
}

impl RateRecord {
    pub fn new(key: RateKey, rate: f64) -> Self {
        Self {
            date: key.date,
            from_currency: key.from_currency,
            to_currency: key.to_currency,
            rate,
        }
    }

    pub fn key(&self) -> RateKey {
        RateKey::new(self.date, &self.from_currency, &self.to_currency)
    }
}

/// A rate is usable only when it is finite and strictly positive; anything
/// else is bad provider data and has no meaningful inverse.
pub fn is_valid_rate(rate: f64) -> bool {
    rate.is_finite() && rate > 0.0
}

/// Normalises a currency list: trims, upper-cases, drops blanks and removes
/// duplicates while keeping first-seen order.
pub fn normalize_currencies<I, S>(codes: I) -> Vec<String>
where
    I: IntoIterator<Item = S>,
    S: AsRef<str>,
{
    let mut cleaned: Vec<String> = Vec::new();
    for code in codes {
        let code = code.as_ref().trim().to_uppercase();
        if !code.is_empty() && !cleaned.contains(&code) {
            cleaned.push(code);
        }
    }
    cleaned
}

/// ISO 4217 style code: exactly three ASCII letters.
pub fn is_currency_code(code: &str) -> bool {
    code.len() == 3 && code.chars().all(|c| c.is_ascii_alphabetic())
}
