use std::sync::Arc;

use rust_decimal::Decimal;
use serde::Deserialize;
use time::{Date, Duration, OffsetDateTime};

use crate::data_source::{MarketDataProvider, SourceError, SourceFuture};
use crate::http_client::{HttpClient, HttpRequest, ReqwestHttpClient};
use crate::{validate_currency_code, ClosingPrice, ProviderId, Ticker};

pub const YAHOO_CHART_URL: &str = "https://query1.finance.yahoo.com/v8/finance/chart";

/// Query used for currency metadata and the history check.
const FULL_HISTORY_QUERY: &str = "range=max&interval=3mo";

/// Daily closes from the Yahoo Finance chart endpoint.
#[derive(Clone)]
pub struct YahooAdapter {
    http_client: Arc<dyn HttpClient>,
    base_url: String,
    timeout_ms: u64,
}

impl Default for YahooAdapter {
    fn default() -> Self {
        Self::with_http_client(Arc::new(ReqwestHttpClient::new()))
    }
}

impl YahooAdapter {
    pub fn with_http_client(http_client: Arc<dyn HttpClient>) -> Self {
        Self {
            http_client,
            base_url: String::from(YAHOO_CHART_URL),
            timeout_ms: 10_000,
        }
    }

    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = base_url.into().trim_end_matches('/').to_owned();
        self
    }

    pub fn with_timeout_ms(mut self, timeout_ms: u64) -> Self {
        self.timeout_ms = timeout_ms;
        self
    }

    /// Fetches one chart. `Ok(None)` means Yahoo has no data for the ticker.
    async fn fetch_chart(
        &self,
        ticker: &Ticker,
        query: &str,
    ) -> Result<Option<YahooChartResult>, SourceError> {
        let endpoint = format!(
            "{}/{}?{}",
            self.base_url,
            urlencoding::encode(ticker.as_str()),
            query
        );
        tracing::debug!(provider = "yahoo", %ticker, %endpoint, "requesting chart");

        let request = HttpRequest::get(&endpoint)
            .with_header("accept", "application/json")
            .with_timeout_ms(self.timeout_ms);

        let response = self.http_client.execute(request).await.map_err(|e| {
            SourceError::unavailable(format!("yahoo transport error: {}", e.message()))
        })?;

        if response.status == 404 {
            tracing::debug!(provider = "yahoo", %ticker, "chart not found");
            return Ok(None);
        }
        if response.status == 429 {
            return Err(SourceError::rate_limited(
                "yahoo rate limit exceeded (status 429)",
            ));
        }
        if !response.is_success() {
            return Err(SourceError::unavailable(format!(
                "yahoo returned status {}",
                response.status
            )));
        }

        let chart_response: YahooChartResponse = serde_json::from_str(&response.body)
            .map_err(|e| SourceError::internal(format!("failed to parse yahoo chart: {e}")))?;

        if let Some(error) = chart_response.chart.error {
            tracing::debug!(
                provider = "yahoo",
                %ticker,
                code = %error.code,
                description = %error.description,
                "chart returned an error object"
            );
            return Ok(None);
        }

        Ok(chart_response
            .chart
            .result
            .and_then(|results| results.into_iter().next()))
    }

    /// Daily closes for the sessions around `first..=last`, in one request.
    async fn daily_closes_between(
        &self,
        ticker: &Ticker,
        first: Date,
        last: Date,
    ) -> Result<Vec<ClosingPrice>, SourceError> {
        let (period1, period2) = session_window(first, last);
        let query = format!("period1={period1}&period2={period2}&interval=1d&events=history");
        let Some(chart) = self.fetch_chart(ticker, &query).await? else {
            return Ok(Vec::new());
        };

        chart
            .daily_closes()
            .into_iter()
            .map(|(session, close)| -> Result<ClosingPrice, SourceError> {
                let price = Decimal::try_from(close)
                    .map_err(|e| SourceError::internal(format!("invalid yahoo close {close}: {e}")))?
                    .round_dp(6);
                Ok(ClosingPrice { session, price })
            })
            .collect()
    }
}

impl MarketDataProvider for YahooAdapter {
    fn id(&self) -> ProviderId {
        ProviderId::Yahoo
    }

    fn instrument_currency<'a>(&'a self, ticker: &'a Ticker) -> SourceFuture<'a, Option<String>> {
        Box::pin(async move {
            let Some(chart) = self.fetch_chart(ticker, FULL_HISTORY_QUERY).await? else {
                return Ok(None);
            };
            let currency = chart.meta.currency.filter(|code| {
                let valid = validate_currency_code(code).is_ok();
                if !valid {
                    tracing::warn!(provider = "yahoo", %ticker, currency = %code, "ignoring malformed currency");
                }
                valid
            });
            Ok(currency)
        })
    }

    fn closing_price<'a>(
        &'a self,
        ticker: &'a Ticker,
        date: Date,
    ) -> SourceFuture<'a, Option<ClosingPrice>> {
        Box::pin(async move {
            let closes = self.daily_closes_between(ticker, date, date).await?;
            Ok(closes.into_iter().find(|close| close.session == date))
        })
    }

    fn first_close_on_or_after<'a>(
        &'a self,
        ticker: &'a Ticker,
        target: Date,
        horizon_days: u32,
    ) -> SourceFuture<'a, Option<ClosingPrice>> {
        Box::pin(async move {
            let last = target
                .checked_add(Duration::days(i64::from(horizon_days)))
                .unwrap_or(target);
            let closes = self.daily_closes_between(ticker, target, last).await?;
            Ok(closes
                .into_iter()
                .filter(|close| close.session >= target && close.session <= last)
                .min_by_key(|close| close.session))
        })
    }

    fn has_any_history<'a>(&'a self, ticker: &'a Ticker) -> SourceFuture<'a, bool> {
        Box::pin(async move {
            let chart = self.fetch_chart(ticker, FULL_HISTORY_QUERY).await?;
            Ok(chart.is_some_and(|chart| !chart.daily_closes().is_empty()))
        })
    }
}

/// Unix bounds covering `first..=last` with a day of margin on each side, so
/// sessions east or west of UTC still fall inside the window.
fn session_window(first: Date, last: Date) -> (i64, i64) {
    let from = first.checked_sub(Duration::days(1)).unwrap_or(first);
    let to = last.checked_add(Duration::days(2)).unwrap_or(last);
    (
        from.midnight().assume_utc().unix_timestamp(),
        to.midnight().assume_utc().unix_timestamp(),
    )
}

#[derive(Debug, Clone, Deserialize)]
struct YahooChartResponse {
    chart: YahooChartData,
}

#[derive(Debug, Clone, Deserialize)]
struct YahooChartData {
    #[serde(default)]
    result: Option<Vec<YahooChartResult>>,
    #[serde(default)]
    error: Option<YahooChartError>,
}

#[derive(Debug, Clone, Deserialize)]
struct YahooChartError {
    #[serde(default)]
    code: String,
    #[serde(default)]
    description: String,
}

#[derive(Debug, Clone, Deserialize)]
struct YahooChartResult {
    meta: YahooChartMeta,
    #[serde(default)]
    timestamp: Option<Vec<i64>>,
    indicators: YahooChartIndicators,
}

#[derive(Debug, Clone, Deserialize)]
struct YahooChartMeta {
    #[serde(default)]
    currency: Option<String>,
    /// Exchange offset from UTC in seconds.
    #[serde(default)]
    gmtoffset: i64,
}

#[derive(Debug, Clone, Deserialize)]
struct YahooChartIndicators {
    #[serde(default)]
    quote: Vec<YahooChartQuote>,
}

#[derive(Debug, Clone, Deserialize)]
struct YahooChartQuote {
    #[serde(default)]
    close: Vec<Option<f64>>,
}

impl YahooChartResult {
    /// Non-null closes keyed by exchange-local session date.
    fn daily_closes(&self) -> Vec<(Date, f64)> {
        let Some(timestamps) = &self.timestamp else {
            return Vec::new();
        };
        let Some(quote) = self.indicators.quote.first() else {
            return Vec::new();
        };

        timestamps
            .iter()
            .zip(&quote.close)
            .filter_map(|(&ts, close)| {
                let close = (*close)?;
                let local = OffsetDateTime::from_unix_timestamp(ts.checked_add(self.meta.gmtoffset)?)
                    .ok()?;
                Some((local.date(), close))
            })
            .collect()
    }
}
