//! # Domain Models
//!
//! Canonical domain types for stockdelta.
//!
//! ## Models
//!
//! | Type | Description |
//! |------|-------------|
//! | [`StockRequest`] | Name plus optional ticker/ISIN from one input row |
//! | [`ResolvedSymbol`] | Ticker validated against the market-data provider |
//! | [`PriceObservation`] | Price for a requested date and the session it came from |
//! | [`LookupResult`] | Success, NotFound, Delisted or Error for one request |
//! | [`DateAdjustment`] | Record of a date moved forward to the next session |
//! | [`Ticker`] | Validated exchange ticker |
//! | [`Isin`] | ISIN with verified check digit |
//!
//! ## Validation
//!
//! Identifiers validate at construction time:
//!
//! ```rust,ignore
//! use stockdelta_core::{Isin, Ticker, ValidationError};
//!
//! let isin = Isin::parse("US5949181045")?;
//! let ticker = Ticker::parse("msft")?; // normalized to "MSFT"
//!
//! let bad = Isin::parse("US5949181046");
//! assert!(matches!(bad, Err(ValidationError::IsinCheckDigit { .. })));
//! ```

mod date;
mod isin;
mod models;
mod ticker;

pub use date::{format_trading_date, parse_trading_date};
pub use isin::Isin;
pub use models::{
    percentage_change, validate_currency_code, Boundary, ClosingPrice, DateAdjustment,
    LookupResult, PriceObservation, ResolvedSymbol, StockRequest,
};
pub use ticker::Ticker;
