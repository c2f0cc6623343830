use std::sync::Arc;

use time::Date;

use crate::data_source::MarketDataProvider;
use crate::error::PipelineError;
use crate::{PriceObservation, ResolvedSymbol};

/// Outcome of walking forward from a requested date.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Adjustment {
    Found(PriceObservation),
    /// No session with data between the target and the end of the horizon.
    HorizonExhausted,
}

/// Finds the first session on or after a target date that has a close.
///
/// Searches `target ..= target + horizon_days`, so the reported session is
/// never earlier than the target.
#[derive(Clone)]
pub struct TradingDayAdjuster {
    market_data: Arc<dyn MarketDataProvider>,
    horizon_days: u32,
}

impl TradingDayAdjuster {
    pub fn new(market_data: Arc<dyn MarketDataProvider>, horizon_days: u32) -> Self {
        Self {
            market_data,
            horizon_days,
        }
    }

    pub async fn adjust(
        &self,
        symbol: &ResolvedSymbol,
        target: Date,
    ) -> Result<Adjustment, PipelineError> {
        let close = self
            .market_data
            .first_close_on_or_after(&symbol.ticker, target, self.horizon_days)
            .await
            .map_err(|source| PipelineError::unreachable(self.market_data.id(), source))?;

        let Some(close) = close.filter(|close| close.session >= target) else {
            tracing::debug!(
                ticker = %symbol.ticker,
                %target,
                horizon_days = self.horizon_days,
                "no session with data inside horizon"
            );
            return Ok(Adjustment::HorizonExhausted);
        };

        if close.session != target {
            tracing::info!(
                ticker = %symbol.ticker,
                %target,
                actual = %close.session,
                "moved to next trading day"
            );
        }
        Ok(Adjustment::Found(PriceObservation {
            date: target,
            price: close.price,
            actual_trading_date: close.session,
        }))
    }
}
