use std::fmt::{Display, Formatter};

use rust_decimal::{Decimal, RoundingStrategy};
use serde::{Deserialize, Serialize};
use time::Date;

use crate::{Isin, Ticker, ValidationError};

/// One instrument to price, as delivered by the input parser.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct StockRequest {
    pub name: String,
    pub ticker: Option<String>,
    pub isin: Option<String>,
}

impl StockRequest {
    /// Build a request, trimming every field and dropping blank identifiers.
    pub fn new(name: impl Into<String>, ticker: Option<&str>, isin: Option<&str>) -> Self {
        Self {
            name: name.into().trim().to_owned(),
            ticker: non_blank(ticker),
            isin: non_blank(isin),
        }
    }

    /// Name-only request, as produced by `--stocks`.
    pub fn named(name: impl Into<String>) -> Self {
        Self::new(name, None, None)
    }
}

fn non_blank(value: Option<&str>) -> Option<String> {
    value
        .map(str::trim)
        .filter(|trimmed| !trimmed.is_empty())
        .map(str::to_owned)
}

/// Ticker that has been validated against the market-data provider.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ResolvedSymbol {
    pub ticker: Ticker,
    pub isin: Option<Isin>,
    pub currency: String,
}

/// Close reported by the market-data provider for one session.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ClosingPrice {
    /// Exchange-local session date.
    pub session: Date,
    pub price: Decimal,
}

/// Price found for a requested date, possibly on a later session.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PriceObservation {
    pub date: Date,
    pub price: Decimal,
    pub actual_trading_date: Date,
}

impl PriceObservation {
    pub fn was_adjusted(&self) -> bool {
        self.actual_trading_date != self.date
    }
}

/// Outcome of pricing a single [`StockRequest`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum LookupResult {
    Success {
        name: String,
        ticker: Ticker,
        isin: Option<Isin>,
        currency: String,
        start: PriceObservation,
        end: PriceObservation,
        percentage: Decimal,
    },
    NotFound {
        name: String,
    },
    Delisted {
        name: String,
        ticker: Ticker,
    },
    Error {
        name: String,
        message: String,
    },
}

impl LookupResult {
    pub fn name(&self) -> &str {
        match self {
            Self::Success { name, .. }
            | Self::NotFound { name }
            | Self::Delisted { name, .. }
            | Self::Error { name, .. } => name,
        }
    }

    pub const fn is_success(&self) -> bool {
        matches!(self, Self::Success { .. })
    }
}

/// Which end of the date range a price belongs to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Boundary {
    Start,
    End,
}

impl Boundary {
    pub const fn label(self) -> &'static str {
        match self {
            Self::Start => "Start",
            Self::End => "End",
        }
    }
}

impl Display for Boundary {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.label())
    }
}

/// A requested date that was moved forward to the next session with data.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DateAdjustment {
    pub boundary: Boundary,
    pub requested: Date,
    pub actual: Date,
    pub name: String,
}

/// `((end - start) / start) * 100`, rounded to one decimal place.
///
/// Returns `None` when `start` is zero.
pub fn percentage_change(start: Decimal, end: Decimal) -> Option<Decimal> {
    if start.is_zero() {
        return None;
    }
    let change = (end - start).checked_div(start)?.checked_mul(Decimal::ONE_HUNDRED)?;
    Some(change.round_dp_with_strategy(1, RoundingStrategy::MidpointAwayFromZero))
}

/// Currency codes are three ASCII letters. Minor units such as `GBp` keep their case.
pub fn validate_currency_code(value: &str) -> Result<(), ValidationError> {
    let valid = value.len() == 3 && value.chars().all(|ch| ch.is_ascii_alphabetic());
    if valid {
        Ok(())
    } else {
        Err(ValidationError::InvalidCurrency {
            value: value.to_owned(),
        })
    }
}
