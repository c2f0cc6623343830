//! Symbology resolution: turns a [`StockRequest`] into a validated ticker.
//!
//! Candidates are tried in a fixed order, and the first candidate the
//! market-data provider recognises wins:
//!
//! | Step | Source | Falls through on miss |
//! |------|--------|-----------------------|
//! | 1 | explicit ticker from the request | no, an explicit ticker is final |
//! | 2 | ISIN via [`SymbologyService::isin_to_ticker`] | yes |
//! | 3 | name via [`SymbologyService::search_candidates`] | yes |
//!
//! Every candidate is confirmed with
//! [`MarketDataProvider::instrument_currency`]. A candidate without a
//! currency is treated as unknown. Name search can return several listings;
//! they are confirmed in exchange priority order until one has a currency.
//!
//! [`SymbolResolver::prefetch_isins`] maps every ISIN of a batch up front
//! with [`SymbologyService::map_isins`], so step 2 is served from memory.

use std::sync::Arc;

use crate::cache::{IsinMappings, ResolutionCache, ResolutionKey};
use crate::data_source::{MarketDataProvider, SourceError, SymbologyService};
use crate::error::PipelineError;
use crate::providers::ProviderSet;
use crate::{Isin, ResolvedSymbol, StockRequest, Ticker};

/// Result of resolving one request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Resolution {
    Resolved(ResolvedSymbol),
    NotFound,
}

#[derive(Debug)]
enum Attempt<'a> {
    Explicit(&'a str),
    Isin(Isin),
    Name(&'a str),
}

impl Attempt<'_> {
    const fn label(&self) -> &'static str {
        match self {
            Self::Explicit(_) => "ticker",
            Self::Isin(_) => "isin",
            Self::Name(_) => "name",
        }
    }
}

#[derive(Clone)]
pub struct SymbolResolver {
    market_data: Arc<dyn MarketDataProvider>,
    symbology: Arc<dyn SymbologyService>,
    cache: ResolutionCache,
    mappings: IsinMappings,
}

impl SymbolResolver {
    pub fn new(providers: &ProviderSet) -> Self {
        Self {
            market_data: Arc::clone(&providers.market_data),
            symbology: Arc::clone(&providers.symbology),
            cache: ResolutionCache::new(),
            mappings: IsinMappings::new(),
        }
    }

    pub fn with_cache(mut self, cache: ResolutionCache) -> Self {
        self.cache = cache;
        self
    }

    pub fn cache(&self) -> &ResolutionCache {
        &self.cache
    }

    /// Resolve a request. Only provider failures are errors; an unknown
    /// instrument is `Ok(Resolution::NotFound)`.
    pub async fn resolve(&self, request: &StockRequest) -> Result<Resolution, PipelineError> {
        let key = ResolutionKey::for_request(request);
        if let Some(cached) = self.cache.get(&key).await {
            tracing::debug!(name = %request.name, "resolution served from cache");
            return Ok(cached);
        }

        let isin = request_isin(request);
        let resolution = self.run_chain(request, isin).await?;
        match &resolution {
            Resolution::Resolved(symbol) => tracing::info!(
                name = %request.name,
                ticker = %symbol.ticker,
                currency = %symbol.currency,
                "resolved instrument"
            ),
            Resolution::NotFound => {
                tracing::warn!(name = %request.name, "instrument could not be resolved")
            }
        }

        self.cache.put(key, resolution.clone()).await;
        Ok(resolution)
    }

    /// Map the ISINs of every request that will reach the ISIN step, in as
    /// few symbology calls as the service allows.
    pub async fn prefetch_isins(&self, requests: &[StockRequest]) -> Result<(), PipelineError> {
        let mut pending: Vec<Isin> = Vec::new();
        for request in requests.iter().filter(|request| request.ticker.is_none()) {
            let Some(isin) = request.isin.as_deref().and_then(|raw| Isin::parse(raw).ok()) else {
                continue;
            };
            if pending.contains(&isin)
                || self.mappings.contains(&isin).await
                || self.cache.get(&ResolutionKey::for_request(request)).await.is_some()
            {
                continue;
            }
            pending.push(isin);
        }
        if pending.is_empty() {
            return Ok(());
        }

        tracing::debug!(count = pending.len(), "prefetching isin mappings");
        let tickers = self
            .symbology
            .map_isins(&pending)
            .await
            .map_err(|source| PipelineError::unreachable(self.symbology.id(), source))?;
        self.mappings.extend(pending.into_iter().zip(tickers)).await;
        Ok(())
    }

    async fn run_chain(
        &self,
        request: &StockRequest,
        isin: Option<Isin>,
    ) -> Result<Resolution, PipelineError> {
        for attempt in attempts(request, isin.clone()) {
            let label = attempt.label();
            let candidates = self.candidates(attempt).await?;
            if candidates.is_empty() {
                tracing::debug!(name = %request.name, step = label, "no candidate");
                continue;
            }

            for ticker in candidates {
                let currency = self
                    .market_data
                    .instrument_currency(&ticker)
                    .await
                    .map_err(|source| PipelineError::unreachable(self.market_data.id(), source))?;

                match currency {
                    Some(currency) => {
                        return Ok(Resolution::Resolved(ResolvedSymbol {
                            ticker,
                            isin,
                            currency,
                        }));
                    }
                    None => tracing::debug!(
                        name = %request.name,
                        step = label,
                        %ticker,
                        "candidate has no market data"
                    ),
                }
            }
        }

        Ok(Resolution::NotFound)
    }

    /// Tickers to confirm for one attempt, most preferred first.
    async fn candidates(&self, attempt: Attempt<'_>) -> Result<Vec<Ticker>, PipelineError> {
        let unreachable = |source: SourceError| PipelineError::unreachable(self.symbology.id(), source);
        match attempt {
            Attempt::Explicit(raw) => match Ticker::parse(raw) {
                Ok(ticker) => Ok(vec![ticker]),
                Err(error) => {
                    tracing::warn!(ticker = raw, %error, "invalid explicit ticker");
                    Ok(Vec::new())
                }
            },
            Attempt::Isin(isin) => {
                let mapped = match self.mappings.get(&isin).await {
                    Some(mapped) => mapped,
                    None => self.symbology.isin_to_ticker(&isin).await.map_err(unreachable)?,
                };
                Ok(mapped.into_iter().collect())
            }
            Attempt::Name(name) => self.symbology.search_candidates(name).await.map_err(unreachable),
        }
    }
}

fn request_isin(request: &StockRequest) -> Option<Isin> {
    let raw = request.isin.as_deref()?;
    match Isin::parse(raw) {
        Ok(isin) => Some(isin),
        Err(error) => {
            tracing::warn!(name = %request.name, isin = raw, %error, "ignoring invalid isin");
            None
        }
    }
}

/// Lookup order for a request. Empty when there is nothing to look up.
fn attempts(request: &StockRequest, isin: Option<Isin>) -> Vec<Attempt<'_>> {
    if let Some(ticker) = request.ticker.as_deref() {
        return vec![Attempt::Explicit(ticker)];
    }

    let mut attempts = Vec::with_capacity(2);
    if let Some(isin) = isin {
        attempts.push(Attempt::Isin(isin));
    }
    if !request.name.trim().is_empty() {
        attempts.push(Attempt::Name(request.name.as_str()));
    }
    attempts
}
