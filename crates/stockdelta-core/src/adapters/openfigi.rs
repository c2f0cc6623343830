use std::sync::Arc;

use serde::{Deserialize, Serialize};

use crate::data_source::{SourceError, SourceFuture, SymbologyService};
use crate::http_client::{HttpAuth, HttpClient, HttpRequest, HttpResponse, ReqwestHttpClient};
use crate::throttling::RequestPacer;
use crate::{Isin, ProviderId, Ticker};

pub const OPENFIGI_URL: &str = "https://api.openfigi.com";

/// Most ISIN jobs OpenFIGI accepts in one anonymous mapping request.
pub const MAPPING_BATCH_SIZE: usize = 10;

/// Security types accepted from name search (matched against either type field).
const ACCEPTED_SECURITY_TYPES: [&str; 3] = ["Common Stock", "REIT", "ETP"];

/// Exchange preference for name search, highest first. UK first, US second.
const EXCHANGE_PRIORITY: [&str; 11] = [
    "LN", "US", "UN", "UQ", "UM", "CN", "CT", "GF", "GR", "GY", "NA",
];

/// Yahoo ticker suffix for a Bloomberg exchange code.
pub fn exchange_suffix(exch_code: &str) -> &'static str {
    match exch_code {
        "LN" => ".L",
        "GY" => ".DE",
        "FP" => ".PA",
        "JP" => ".T",
        "HK" => ".HK",
        "AU" => ".AX",
        "CN" => ".TO",
        _ => "",
    }
}

/// ISIN mapping and name search against OpenFIGI v3.
#[derive(Clone)]
pub struct OpenFigiAdapter {
    http_client: Arc<dyn HttpClient>,
    auth: HttpAuth,
    base_url: String,
    timeout_ms: u64,
    mapping_pacer: RequestPacer,
    search_pacer: RequestPacer,
}

impl Default for OpenFigiAdapter {
    fn default() -> Self {
        Self::with_http_client(Arc::new(ReqwestHttpClient::new()))
    }
}

impl OpenFigiAdapter {
    pub fn with_http_client(http_client: Arc<dyn HttpClient>) -> Self {
        Self {
            http_client,
            auth: HttpAuth::None,
            base_url: String::from(OPENFIGI_URL),
            timeout_ms: 10_000,
            mapping_pacer: RequestPacer::every(crate::config::DEFAULT_MAPPING_INTERVAL),
            search_pacer: RequestPacer::every(crate::config::DEFAULT_SEARCH_INTERVAL),
        }
    }

    pub fn with_api_key(mut self, api_key: impl Into<String>) -> Self {
        self.auth = HttpAuth::Header {
            name: String::from("X-OPENFIGI-APIKEY"),
            value: api_key.into(),
        };
        self
    }

    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = base_url.into().trim_end_matches('/').to_owned();
        self
    }

    pub fn with_timeout_ms(mut self, timeout_ms: u64) -> Self {
        self.timeout_ms = timeout_ms;
        self
    }

    pub fn with_pacing(mut self, mapping: RequestPacer, search: RequestPacer) -> Self {
        self.mapping_pacer = mapping;
        self.search_pacer = search;
        self
    }

    async fn post(&self, path: &str, body: String) -> Result<HttpResponse, SourceError> {
        let endpoint = format!("{}{}", self.base_url, path);
        let request = HttpRequest::post(&endpoint)
            .with_json_body(body)
            .with_auth(&self.auth)
            .with_timeout_ms(self.timeout_ms);

        let response = self.http_client.execute(request).await.map_err(|e| {
            SourceError::unavailable(format!("openfigi transport error: {}", e.message()))
        })?;

        if response.status == 429 {
            return Err(SourceError::rate_limited(rate_limit_message(&response)));
        }
        if !response.is_success() {
            return Err(SourceError::unavailable(format!(
                "openfigi returned error status: {}",
                response.status
            )));
        }
        Ok(response)
    }
}

impl SymbologyService for OpenFigiAdapter {
    fn id(&self) -> ProviderId {
        ProviderId::OpenFigi
    }

    fn isin_to_ticker<'a>(&'a self, isin: &'a Isin) -> SourceFuture<'a, Option<Ticker>> {
        Box::pin(async move {
            let mapped = self.map_isins(std::slice::from_ref(isin)).await?;
            Ok(mapped.into_iter().next().flatten())
        })
    }

    fn map_isins<'a>(&'a self, isins: &'a [Isin]) -> SourceFuture<'a, Vec<Option<Ticker>>> {
        Box::pin(async move {
            let mut tickers = Vec::with_capacity(isins.len());
            for batch in isins.chunks(MAPPING_BATCH_SIZE) {
                tickers.extend(self.map_batch(batch).await?);
            }
            Ok(tickers)
        })
    }

    fn search_candidates<'a>(&'a self, name: &'a str) -> SourceFuture<'a, Vec<Ticker>> {
        Box::pin(async move {
            let body = serde_json::to_string(&SearchQuery { query: name })
                .map_err(|e| SourceError::internal(format!("failed to encode search query: {e}")))?;

            self.search_pacer.ready().await;
            tracing::debug!(provider = "openfigi", name, "searching by name");
            let response = self.post("/v3/search", body).await?;

            let page: SearchPage = serde_json::from_str(&response.body).map_err(|e| {
                SourceError::internal(format!("failed to parse openfigi search: {e}"))
            })?;
            if let Some(reason) = page.error {
                tracing::debug!(provider = "openfigi", name, %reason, "search returned an error");
                return Ok(Vec::new());
            }

            let mut tickers: Vec<Ticker> = Vec::new();
            for ticker in ranked_matches(&page.data, name)
                .into_iter()
                .filter_map(FigiInstrument::yahoo_ticker)
            {
                if !tickers.contains(&ticker) {
                    tickers.push(ticker);
                }
            }
            Ok(tickers)
        })
    }
}

impl OpenFigiAdapter {
    /// One mapping request for at most [`MAPPING_BATCH_SIZE`] ISINs.
    async fn map_batch(&self, batch: &[Isin]) -> Result<Vec<Option<Ticker>>, SourceError> {
        let jobs: Vec<MappingJob<'_>> = batch
            .iter()
            .map(|isin| MappingJob {
                id_type: "ID_ISIN",
                id_value: isin.as_str(),
            })
            .collect();
        let body = serde_json::to_string(&jobs)
            .map_err(|e| SourceError::internal(format!("failed to encode mapping jobs: {e}")))?;

        self.mapping_pacer.ready().await;
        tracing::debug!(provider = "openfigi", jobs = batch.len(), "mapping isins");
        let response = self.post("/v3/mapping", body).await?;

        let items: Vec<MappingItem> = serde_json::from_str(&response.body).map_err(|e| {
            SourceError::internal(format!("failed to parse openfigi mapping: {e}"))
        })?;
        if items.len() != batch.len() {
            return Err(SourceError::internal(format!(
                "openfigi returned {} mapping results for {} jobs",
                items.len(),
                batch.len()
            )));
        }

        Ok(batch
            .iter()
            .zip(items)
            .map(|(isin, item)| {
                if let Some(reason) = item.warning.or(item.error) {
                    tracing::debug!(provider = "openfigi", %isin, %reason, "isin not mapped");
                    return None;
                }
                item.data.first().and_then(FigiInstrument::yahoo_ticker)
            })
            .collect())
    }
}

/// Candidates whose security type is accepted and whose name contains the
/// query, ordered by exchange priority. Input order breaks ties.
fn ranked_matches<'a>(candidates: &'a [FigiInstrument], query: &str) -> Vec<&'a FigiInstrument> {
    let query = query.to_lowercase();
    let eligible: Vec<&FigiInstrument> = candidates
        .iter()
        .filter(|candidate| candidate.has_accepted_type() && candidate.name_contains(&query))
        .collect();

    EXCHANGE_PRIORITY
        .iter()
        .flat_map(|exchange| {
            eligible
                .iter()
                .copied()
                .filter(move |candidate| candidate.exch_code.as_deref() == Some(*exchange))
        })
        .collect()
}

fn rate_limit_message(response: &HttpResponse) -> String {
    let header = |name: &str| response.header(name).unwrap_or("unknown").to_owned();
    format!(
        "openfigi rate limit exceeded (limit: {}, remaining: {}, reset in: {}s)",
        header("ratelimit-limit"),
        header("ratelimit-remaining"),
        header("ratelimit-reset"),
    )
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct MappingJob<'a> {
    id_type: &'static str,
    id_value: &'a str,
}

#[derive(Debug, Serialize)]
struct SearchQuery<'a> {
    query: &'a str,
}

#[derive(Debug, Clone, Deserialize)]
struct MappingItem {
    #[serde(default)]
    data: Vec<FigiInstrument>,
    #[serde(default)]
    warning: Option<String>,
    #[serde(default)]
    error: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
struct SearchPage {
    #[serde(default)]
    data: Vec<FigiInstrument>,
    #[serde(default)]
    error: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
struct FigiInstrument {
    #[serde(default)]
    ticker: Option<String>,
    #[serde(default)]
    exch_code: Option<String>,
    #[serde(default)]
    name: Option<String>,
    #[serde(default)]
    security_type: Option<String>,
    #[serde(default)]
    security_type2: Option<String>,
}

impl FigiInstrument {
    fn has_accepted_type(&self) -> bool {
        [&self.security_type, &self.security_type2]
            .into_iter()
            .flatten()
            .any(|kind| ACCEPTED_SECURITY_TYPES.contains(&kind.as_str()))
    }

    fn name_contains(&self, lowercase_query: &str) -> bool {
        self.name
            .as_deref()
            .is_some_and(|name| name.to_lowercase().contains(lowercase_query))
    }

    /// Ticker with trailing slashes stripped and the exchange suffix appended.
    fn yahoo_ticker(&self) -> Option<Ticker> {
        let raw = self.ticker.as_deref()?.trim().trim_end_matches('/');
        let suffix = exchange_suffix(self.exch_code.as_deref().unwrap_or_default());
        match Ticker::parse(&format!("{raw}{suffix}")) {
            Ok(ticker) => Some(ticker),
            Err(error) => {
                tracing::warn!(provider = "openfigi", raw, %error, "discarding unusable ticker");
                None
            }
        }
    }
}
