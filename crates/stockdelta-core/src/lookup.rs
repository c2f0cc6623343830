//! Price lookup orchestration.
//!
//! [`PriceLookup::lookup`] resolves a request once, then adjusts the start
//! and end dates independently against the resolved ticker:
//!
//! ```text
//! StockRequest ──▶ SymbolResolver ──▶ TradingDayAdjuster(start)
//!                        │                     │
//!                        │            TradingDayAdjuster(end)
//!                        ▼                     ▼
//!                   NotFound            Success / Delisted / NotFound / Error
//! ```
//!
//! Per-instrument outcomes are values of [`LookupResult`]. Anything that
//! should stop the batch is a [`PipelineError`].

use std::collections::BTreeMap;
use std::sync::Arc;

use time::Date;
use tokio::sync::Semaphore;
use tokio::task::JoinSet;

use crate::adjuster::{Adjustment, TradingDayAdjuster};
use crate::config::LookupConfig;
use crate::data_source::MarketDataProvider;
use crate::error::PipelineError;
use crate::providers::ProviderSet;
use crate::resolver::{Resolution, SymbolResolver};
use crate::{
    format_trading_date, percentage_change, Boundary, DateAdjustment, LookupResult,
    PriceObservation, ResolvedSymbol, StockRequest, ValidationError,
};

/// Result of one request plus any date adjustments behind it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LookupOutcome {
    pub result: LookupResult,
    pub adjustments: Vec<DateAdjustment>,
}

impl LookupOutcome {
    fn plain(result: LookupResult) -> Self {
        Self {
            result,
            adjustments: Vec::new(),
        }
    }
}

/// Everything the output layer needs for one run.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LookupReport {
    pub start: Date,
    pub end: Date,
    /// One result per request, in input order.
    pub results: Vec<LookupResult>,
    pub adjustments: Vec<DateAdjustment>,
}

impl LookupReport {
    /// Adjustment notes grouped by boundary and session, Start before End.
    pub fn notes(&self) -> Vec<String> {
        adjustment_notes(&self.adjustments)
    }
}

#[derive(Clone)]
pub struct PriceLookup {
    resolver: SymbolResolver,
    adjuster: TradingDayAdjuster,
    market_data: Arc<dyn MarketDataProvider>,
    config: LookupConfig,
}

impl PriceLookup {
    pub fn new(providers: &ProviderSet, config: LookupConfig) -> Result<Self, ValidationError> {
        config.validate()?;
        Ok(Self {
            resolver: SymbolResolver::new(providers),
            adjuster: TradingDayAdjuster::new(
                Arc::clone(&providers.market_data),
                config.horizon_days,
            ),
            market_data: Arc::clone(&providers.market_data),
            config,
        })
    }

    pub fn resolver(&self) -> &SymbolResolver {
        &self.resolver
    }

    pub const fn config(&self) -> LookupConfig {
        self.config
    }

    /// Price one request between `start` and `end`.
    pub async fn lookup(
        &self,
        request: &StockRequest,
        start: Date,
        end: Date,
    ) -> Result<LookupOutcome, PipelineError> {
        let name = request.name.clone();

        let symbol = match self.resolver.resolve(request).await? {
            Resolution::Resolved(symbol) => symbol,
            Resolution::NotFound => {
                return Ok(LookupOutcome::plain(LookupResult::NotFound { name }));
            }
        };

        let start_obs = match self.adjuster.adjust(&symbol, start).await? {
            Adjustment::Found(observation) => observation,
            Adjustment::HorizonExhausted => return self.classify_missing(name, symbol).await,
        };
        let end_obs = match self.adjuster.adjust(&symbol, end).await? {
            Adjustment::Found(observation) => observation,
            Adjustment::HorizonExhausted => return self.classify_missing(name, symbol).await,
        };

        let adjustments: Vec<DateAdjustment> = [(Boundary::Start, &start_obs), (Boundary::End, &end_obs)]
            .into_iter()
            .filter(|(_, observation)| observation.was_adjusted())
            .map(|(boundary, observation)| DateAdjustment {
                boundary,
                requested: observation.date,
                actual: observation.actual_trading_date,
                name: name.clone(),
            })
            .collect();

        let Some(percentage) = percentage_change(start_obs.price, end_obs.price) else {
            tracing::warn!(%name, ticker = %symbol.ticker, "start price is zero");
            return Ok(LookupOutcome::plain(LookupResult::Error {
                name,
                message: String::from("Start price is zero; percentage change is undefined"),
            }));
        };

        Ok(LookupOutcome {
            result: success(name, symbol, start_obs, end_obs, percentage),
            adjustments,
        })
    }

    /// Price every request, failing fast on the first pipeline error.
    ///
    /// ISINs are mapped in bulk before any request is priced.
    pub async fn lookup_all(
        &self,
        requests: &[StockRequest],
        start: Date,
        end: Date,
    ) -> Result<LookupReport, PipelineError> {
        tracing::info!(
            count = requests.len(),
            start = %format_trading_date(start),
            end = %format_trading_date(end),
            concurrency = self.config.concurrency,
            "pricing requests"
        );

        let outcomes = self
            .price_all(requests, start, end)
            .await
            .inspect_err(|error| tracing::error!(code = error.code(), %error, "aborting batch"))?;

        let mut results = Vec::with_capacity(outcomes.len());
        let mut adjustments = Vec::new();
        for outcome in outcomes {
            results.push(outcome.result);
            adjustments.extend(outcome.adjustments);
        }

        Ok(LookupReport {
            start,
            end,
            results,
            adjustments,
        })
    }

    async fn price_all(
        &self,
        requests: &[StockRequest],
        start: Date,
        end: Date,
    ) -> Result<Vec<LookupOutcome>, PipelineError> {
        self.resolver.prefetch_isins(requests).await?;
        if self.config.concurrency > 1 && requests.len() > 1 {
            self.lookup_concurrent(requests, start, end).await
        } else {
            self.lookup_sequential(requests, start, end).await
        }
    }

    async fn lookup_sequential(
        &self,
        requests: &[StockRequest],
        start: Date,
        end: Date,
    ) -> Result<Vec<LookupOutcome>, PipelineError> {
        let mut outcomes = Vec::with_capacity(requests.len());
        for request in requests {
            outcomes.push(self.lookup(request, start, end).await?);
        }
        Ok(outcomes)
    }

    async fn lookup_concurrent(
        &self,
        requests: &[StockRequest],
        start: Date,
        end: Date,
    ) -> Result<Vec<LookupOutcome>, PipelineError> {
        let permits = Arc::new(Semaphore::new(self.config.concurrency));
        let mut tasks = JoinSet::new();

        for (index, request) in requests.iter().cloned().enumerate() {
            let lookup = self.clone();
            let permits = Arc::clone(&permits);
            tasks.spawn(async move {
                let _permit = permits
                    .acquire_owned()
                    .await
                    .map_err(|e| PipelineError::Task(e.to_string()))?;
                let outcome = lookup.lookup(&request, start, end).await?;
                Ok::<_, PipelineError>((index, outcome))
            });
        }

        let mut indexed = Vec::with_capacity(requests.len());
        while let Some(joined) = tasks.join_next().await {
            let completed = joined
                .map_err(|e| PipelineError::Task(e.to_string()))
                .and_then(|result| result);
            match completed {
                Ok(pair) => indexed.push(pair),
                Err(error) => {
                    tasks.abort_all();
                    return Err(error);
                }
            }
        }

        indexed.sort_by_key(|(index, _)| *index);
        Ok(indexed.into_iter().map(|(_, outcome)| outcome).collect())
    }

    /// A resolved ticker with no session inside the horizon is Delisted when
    /// it has ever traded, NotFound otherwise.
    async fn classify_missing(
        &self,
        name: String,
        symbol: ResolvedSymbol,
    ) -> Result<LookupOutcome, PipelineError> {
        let traded = self
            .market_data
            .has_any_history(&symbol.ticker)
            .await
            .map_err(|source| PipelineError::unreachable(self.market_data.id(), source))?;

        let result = if traded {
            tracing::warn!(%name, ticker = %symbol.ticker, "instrument looks delisted");
            LookupResult::Delisted {
                name,
                ticker: symbol.ticker,
            }
        } else {
            tracing::warn!(%name, ticker = %symbol.ticker, "no price history");
            LookupResult::NotFound { name }
        };
        Ok(LookupOutcome::plain(result))
    }
}

fn success(
    name: String,
    symbol: ResolvedSymbol,
    start: PriceObservation,
    end: PriceObservation,
    percentage: rust_decimal::Decimal,
) -> LookupResult {
    LookupResult::Success {
        name,
        ticker: symbol.ticker,
        isin: symbol.isin,
        currency: symbol.currency,
        start,
        end,
        percentage,
    }
}

/// `"<Start|End> date adjusted to dd-Mon-yy (next trading day) for: A, B"`.
pub fn adjustment_notes(adjustments: &[DateAdjustment]) -> Vec<String> {
    let mut groups: BTreeMap<(Boundary, Date), Vec<&str>> = BTreeMap::new();
    for adjustment in adjustments {
        groups
            .entry((adjustment.boundary, adjustment.actual))
            .or_default()
            .push(adjustment.name.as_str());
    }

    groups
        .into_iter()
        .map(|((boundary, actual), names)| {
            format!(
                "{boundary} date adjusted to {} (next trading day) for: {}",
                format_trading_date(actual),
                names.join(", ")
            )
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use time::macros::date;

    fn adjustment(boundary: Boundary, actual: Date, name: &str) -> DateAdjustment {
        DateAdjustment {
            boundary,
            requested: date!(2025 - 01 - 04),
            actual,
            name: name.to_owned(),
        }
    }

    #[test]
    fn notes_group_names_by_boundary_and_session() {
        let notes = adjustment_notes(&[
            adjustment(Boundary::End, date!(2025 - 03 - 03), "Apple"),
            adjustment(Boundary::Start, date!(2025 - 01 - 06), "Microsoft"),
            adjustment(Boundary::Start, date!(2025 - 01 - 06), "Apple"),
        ]);

        assert_eq!(
            notes,
            vec![
                "Start date adjusted to 06-Jan-25 (next trading day) for: Microsoft, Apple",
                "End date adjusted to 03-Mar-25 (next trading day) for: Apple",
            ]
        );
    }

    #[test]
    fn no_adjustments_means_no_notes() {
        assert!(adjustment_notes(&[]).is_empty());
    }
}
