//! Assembles the live market-data and symbology providers.
//!
//! ```rust,ignore
//! use stockdelta_core::{ProviderConfig, ProviderSetBuilder};
//!
//! // Keys and endpoint overrides from the environment
//! let providers = ProviderSetBuilder::new(ProviderConfig::from_env()).build();
//! ```

use std::sync::Arc;

use crate::adapters::{OpenFigiAdapter, YahooAdapter};
use crate::config::ProviderConfig;
use crate::data_source::{MarketDataProvider, SymbologyService};
use crate::http_client::{HttpClient, ReqwestHttpClient};
use crate::throttling::RequestPacer;

/// The two collaborators the pipeline needs.
#[derive(Clone)]
pub struct ProviderSet {
    pub market_data: Arc<dyn MarketDataProvider>,
    pub symbology: Arc<dyn SymbologyService>,
}

impl ProviderSet {
    pub fn new(
        market_data: Arc<dyn MarketDataProvider>,
        symbology: Arc<dyn SymbologyService>,
    ) -> Self {
        Self {
            market_data,
            symbology,
        }
    }
}

/// Builder that wires adapters from a [`ProviderConfig`].
pub struct ProviderSetBuilder {
    config: ProviderConfig,
    http_client: Option<Arc<dyn HttpClient>>,
}

impl ProviderSetBuilder {
    pub fn new(config: ProviderConfig) -> Self {
        Self {
            config,
            http_client: None,
        }
    }

    /// Share one transport between both adapters instead of creating a reqwest client.
    pub fn with_http_client(mut self, http_client: Arc<dyn HttpClient>) -> Self {
        self.http_client = Some(http_client);
        self
    }

    pub fn build(self) -> ProviderSet {
        let config = self.config;
        let http_client = self
            .http_client
            .unwrap_or_else(|| Arc::new(ReqwestHttpClient::new()) as Arc<dyn HttpClient>);

        let mut yahoo = YahooAdapter::with_http_client(Arc::clone(&http_client))
            .with_timeout_ms(config.timeout_ms);
        if let Some(url) = &config.yahoo_base_url {
            yahoo = yahoo.with_base_url(url.clone());
        }

        let mut openfigi = OpenFigiAdapter::with_http_client(http_client)
            .with_timeout_ms(config.timeout_ms)
            .with_pacing(
                RequestPacer::every(config.mapping_interval),
                RequestPacer::every(config.search_interval),
            );
        if let Some(url) = &config.openfigi_base_url {
            openfigi = openfigi.with_base_url(url.clone());
        }
        match &config.openfigi_api_key {
            Some(key) => openfigi = openfigi.with_api_key(key.clone()),
            None => tracing::info!("no OpenFIGI API key configured, using anonymous rate limits"),
        }

        ProviderSet::new(Arc::new(yahoo), Arc::new(openfigi))
    }
}
