//! # stockdelta core
//!
//! Ticker resolution and trading-day adjusted price lookup.
//!
//! ## Overview
//!
//! Given a company name with an optional ticker and ISIN, plus a start and
//! an end date, this crate:
//!
//! - **Resolves** the instrument to a ticker (explicit ticker, else ISIN, else name search)
//! - **Validates** the ticker by fetching its trading currency
//! - **Adjusts** each date forward to the first session with a close
//! - **Classifies** misses as NotFound or Delisted, and computes the percentage change
//!
//! ## Modules
//!
//! | Module | Description |
//! |--------|-------------|
//! | [`adapters`] | Live providers (Yahoo chart, OpenFIGI) |
//! | [`adjuster`] | Walks a date forward to the next trading session |
//! | [`cache`] | Per-run resolution cache |
//! | [`config`] | Lookup and provider configuration |
//! | [`data_source`] | Provider traits and [`SourceError`] |
//! | [`domain`] | Requests, results, tickers, ISINs, dates |
//! | [`error`] | Validation and pipeline errors |
//! | [`http_client`] | HTTP transport abstraction |
//! | [`lookup`] | Orchestrates resolve → adjust → classify |
//! | [`providers`] | Builds the live provider set |
//! | [`resolver`] | Ticker → ISIN → name resolution chain |
//! | [`throttling`] | Request pacing |
//!
//! ## Quick Start
//!
//! ```rust,ignore
//! use stockdelta_core::{
//!     parse_trading_date, LookupConfig, PriceLookup, ProviderConfig, ProviderSetBuilder,
//!     StockRequest,
//! };
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let providers = ProviderSetBuilder::new(ProviderConfig::from_env()).build();
//!     let lookup = PriceLookup::new(&providers, LookupConfig::default())?;
//!
//!     let request = StockRequest::new("Microsoft", None, Some("US5949181045"));
//!     let start = parse_trading_date("01-Jan-25")?;
//!     let end = parse_trading_date("01-Mar-25")?;
//!
//!     let outcome = lookup.lookup(&request, start, end).await?;
//!     println!("{:?}", outcome.result);
//!     Ok(())
//! }
//! ```
//!
//! ## Architecture
//!
//! ```text
//! ┌─────────────────┐
//! │  CLI / Caller   │
//! └────────┬────────┘
//!          │
//!          ▼
//! ┌─────────────────┐     ┌──────────────────┐
//! │  PriceLookup    │────▶│ ResolutionCache  │
//! └────────┬────────┘     └──────────────────┘
//!          │
//!          ▼
//! ┌─────────────────┐     ┌──────────────────┐
//! │ SymbolResolver  │────▶│ SymbologyService │
//! │ TradingDay-     │     │ MarketData-      │
//! │   Adjuster      │     │   Provider       │
//! └─────────────────┘     └────────┬─────────┘
//!                                  │
//!                                  ▼
//!                         ┌──────────────────┐
//!                         │ HttpClient       │
//!                         │ (reqwest/script) │
//!                         └──────────────────┘
//! ```

pub mod adapters;
pub mod adjuster;
pub mod cache;
pub mod config;
pub mod data_source;
pub mod domain;
pub mod error;
pub mod http_client;
pub mod lookup;
pub mod providers;
pub mod resolver;
pub mod source;
pub mod throttling;

pub use adapters::{OpenFigiAdapter, YahooAdapter};
pub use adjuster::{Adjustment, TradingDayAdjuster};
pub use cache::{IsinMappings, ResolutionCache, ResolutionKey};
pub use config::{LookupConfig, ProviderConfig, DEFAULT_HORIZON_DAYS};
pub use data_source::{
    MarketDataProvider, SourceError, SourceErrorKind, SourceFuture, SymbologyService,
};
pub use domain::{
    format_trading_date, parse_trading_date, percentage_change, validate_currency_code, Boundary,
    ClosingPrice, DateAdjustment, Isin, LookupResult, PriceObservation, ResolvedSymbol,
    StockRequest, Ticker,
};
pub use error::{PipelineError, ValidationError};
pub use lookup::{adjustment_notes, LookupOutcome, LookupReport, PriceLookup};
pub use providers::{ProviderSet, ProviderSetBuilder};
pub use resolver::{Resolution, SymbolResolver};
pub use source::ProviderId;
