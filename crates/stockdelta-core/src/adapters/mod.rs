//! Live provider adapters.

mod openfigi;
mod yahoo;

pub use openfigi::{exchange_suffix, OpenFigiAdapter, OPENFIGI_URL};
pub use yahoo::{YahooAdapter, YAHOO_CHART_URL};
