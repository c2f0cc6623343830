//! Runtime configuration for lookups and provider access.

use std::env;
use std::time::Duration;

use crate::ValidationError;

/// Calendar days the adjuster may walk forward from a requested date.
pub const DEFAULT_HORIZON_DAYS: u32 = 10;
pub const DEFAULT_TIMEOUT_MS: u64 = 10_000;
/// OpenFIGI anonymous mapping limit is 25 requests per minute.
pub const DEFAULT_MAPPING_INTERVAL: Duration = Duration::from_millis(2_500);
/// OpenFIGI anonymous search limit is 5 requests per minute, plus a second of slack.
pub const DEFAULT_SEARCH_INTERVAL: Duration = Duration::from_secs(13);

/// Controls how a batch of requests is priced.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LookupConfig {
    pub horizon_days: u32,
    /// Number of requests in flight at once. `1` keeps processing sequential.
    pub concurrency: usize,
}

impl LookupConfig {
    pub fn new(horizon_days: u32, concurrency: usize) -> Result<Self, ValidationError> {
        let config = Self {
            horizon_days,
            concurrency,
        };
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<(), ValidationError> {
        if self.horizon_days == 0 {
            return Err(ValidationError::ZeroHorizon);
        }
        if self.concurrency == 0 {
            return Err(ValidationError::ZeroConcurrency);
        }
        Ok(())
    }
}

impl Default for LookupConfig {
    fn default() -> Self {
        Self {
            horizon_days: DEFAULT_HORIZON_DAYS,
            concurrency: 1,
        }
    }
}

/// Connection settings for the live providers.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProviderConfig {
    pub openfigi_api_key: Option<String>,
    pub openfigi_base_url: Option<String>,
    pub yahoo_base_url: Option<String>,
    pub timeout_ms: u64,
    pub mapping_interval: Duration,
    pub search_interval: Duration,
}

impl ProviderConfig {
    /// Read keys and endpoint overrides from the environment.
    ///
    /// `STOCKDELTA_OPENFIGI_API_KEY` wins over `OPENFIGI_API_KEY`.
    pub fn from_env() -> Self {
        Self {
            openfigi_api_key: non_empty_var("STOCKDELTA_OPENFIGI_API_KEY")
                .or_else(|| non_empty_var("OPENFIGI_API_KEY")),
            openfigi_base_url: non_empty_var("STOCKDELTA_OPENFIGI_URL"),
            yahoo_base_url: non_empty_var("STOCKDELTA_YAHOO_URL"),
            ..Self::default()
        }
    }

    pub fn with_openfigi_key(mut self, key: impl Into<String>) -> Self {
        self.openfigi_api_key = Some(key.into());
        self
    }

    pub fn with_timeout_ms(mut self, timeout_ms: u64) -> Self {
        self.timeout_ms = timeout_ms;
        self
    }

    /// Disable request pacing, for tests against local fakes.
    pub fn unpaced(mut self) -> Self {
        self.mapping_interval = Duration::ZERO;
        self.search_interval = Duration::ZERO;
        self
    }
}

impl Default for ProviderConfig {
    fn default() -> Self {
        Self {
            openfigi_api_key: None,
            openfigi_base_url: None,
            yahoo_base_url: None,
            timeout_ms: DEFAULT_TIMEOUT_MS,
            mapping_interval: DEFAULT_MAPPING_INTERVAL,
            search_interval: DEFAULT_SEARCH_INTERVAL,
        }
    }
}

fn non_empty_var(name: &str) -> Option<String> {
    env::var(name)
        .ok()
        .map(|value| value.trim().to_owned())
        .filter(|value| !value.is_empty())
}
