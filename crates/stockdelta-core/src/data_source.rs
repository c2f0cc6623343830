//! Provider contracts used by the resolver and the adjuster.
//!
//! Two collaborators sit behind trait objects so the pipeline can run
//! against live services or scripted fakes:
//!
//! | Trait | Operations | Live adapter |
//! |-------|------------|--------------|
//! | [`MarketDataProvider`] | currency metadata, closing price, forward close search, history check | [`crate::adapters::YahooAdapter`] |
//! | [`SymbologyService`] | ISIN to ticker (single and batched), name search | [`crate::adapters::OpenFigiAdapter`] |
//!
//! "No data" is always `Ok(None)` / `Ok(false)`. An `Err(SourceError)` means
//! the service could not be used at all, and the pipeline treats it as fatal.
//!
//! The batched and ranged operations have default implementations built on
//! the single-item ones. Live adapters override them to save round trips.
//!
//! # Example
//!
//! ```rust,ignore
//! use stockdelta_core::{MarketDataProvider, SourceError, Ticker, YahooAdapter};
//! use time::macros::date;
//!
//! async fn close(adapter: &YahooAdapter) -> Result<(), SourceError> {
//!     let ticker = Ticker::parse("MSFT").expect("valid ticker");
//!     if let Some(close) = adapter.closing_price(&ticker, date!(2025 - 01 - 06)).await? {
//!         println!("{} {}", close.session, close.price);
//!     }
//!     Ok(())
//! }
//! ```

use std::fmt::{Display, Formatter};
use std::future::Future;
use std::pin::Pin;

use time::{Date, Duration};

use crate::{ClosingPrice, Isin, ProviderId, Ticker};

/// Boxed future returned by provider operations.
pub type SourceFuture<'a, T> = Pin<Box<dyn Future<Output = Result<T, SourceError>> + Send + 'a>>;

/// Adapter-level error classification.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SourceErrorKind {
    Unavailable,
    RateLimited,
    Internal,
}

/// Structured error raised when a provider cannot serve a call.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SourceError {
    kind: SourceErrorKind,
    message: String,
    retryable: bool,
}

impl SourceError {
    pub fn unavailable(message: impl Into<String>) -> Self {
        Self {
            kind: SourceErrorKind::Unavailable,
            message: message.into(),
            retryable: true,
        }
    }

    pub fn rate_limited(message: impl Into<String>) -> Self {
        Self {
            kind: SourceErrorKind::RateLimited,
            message: message.into(),
            retryable: true,
        }
    }

    pub fn internal(message: impl Into<String>) -> Self {
        Self {
            kind: SourceErrorKind::Internal,
            message: message.into(),
            retryable: false,
        }
    }

    pub const fn kind(&self) -> SourceErrorKind {
        self.kind
    }

    pub fn message(&self) -> &str {
        &self.message
    }

    pub const fn retryable(&self) -> bool {
        self.retryable
    }

    pub const fn code(&self) -> &'static str {
        match self.kind {
            SourceErrorKind::Unavailable => "source.unavailable",
            SourceErrorKind::RateLimited => "source.rate_limited",
            SourceErrorKind::Internal => "source.internal",
        }
    }
}

impl Display for SourceError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "{} ({})", self.message, self.code())
    }
}

impl std::error::Error for SourceError {}

/// Historical price source.
pub trait MarketDataProvider: Send + Sync {
    fn id(&self) -> ProviderId;

    /// Trading currency of the instrument, or `None` when the ticker is unknown.
    fn instrument_currency<'a>(&'a self, ticker: &'a Ticker) -> SourceFuture<'a, Option<String>>;

    /// Close for exactly `date`, or `None` when that session has no data.
    fn closing_price<'a>(
        &'a self,
        ticker: &'a Ticker,
        date: Date,
    ) -> SourceFuture<'a, Option<ClosingPrice>>;

    /// First close on `target` or one of the `horizon_days` calendar days
    /// after it. Never returns a session earlier than `target`.
    fn first_close_on_or_after<'a>(
        &'a self,
        ticker: &'a Ticker,
        target: Date,
        horizon_days: u32,
    ) -> SourceFuture<'a, Option<ClosingPrice>> {
        Box::pin(async move {
            for offset in 0..=horizon_days {
                let Some(day) = target.checked_add(Duration::days(i64::from(offset))) else {
                    break;
                };
                if let Some(close) = self.closing_price(ticker, day).await? {
                    return Ok(Some(close));
                }
            }
            Ok(None)
        })
    }

    /// Whether the instrument has ever had a price.
    fn has_any_history<'a>(&'a self, ticker: &'a Ticker) -> SourceFuture<'a, bool>;
}

/// Identifier mapping and instrument search.
pub trait SymbologyService: Send + Sync {
    fn id(&self) -> ProviderId;

    fn isin_to_ticker<'a>(&'a self, isin: &'a Isin) -> SourceFuture<'a, Option<Ticker>>;

    /// Map several ISINs at once. The result is index-aligned with `isins`.
    fn map_isins<'a>(&'a self, isins: &'a [Isin]) -> SourceFuture<'a, Vec<Option<Ticker>>> {
        Box::pin(async move {
            let mut tickers = Vec::with_capacity(isins.len());
            for isin in isins {
                tickers.push(self.isin_to_ticker(isin).await?);
            }
            Ok(tickers)
        })
    }

    /// Every acceptable listing for `name`, most preferred first.
    fn search_candidates<'a>(&'a self, name: &'a str) -> SourceFuture<'a, Vec<Ticker>>;

    /// The most preferred listing for `name`.
    fn search_by_name<'a>(&'a self, name: &'a str) -> SourceFuture<'a, Option<Ticker>> {
        Box::pin(async move { Ok(self.search_candidates(name).await?.into_iter().next()) })
    }
}
