use thiserror::Error;

use crate::data_source::SourceError;
use crate::ProviderId;

/// Validation errors for identifiers, dates and configuration.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum ValidationError {
    #[error("ticker cannot be empty")]
    EmptyTicker,
    #[error("ticker length {len} exceeds max {max}")]
    TickerTooLong { len: usize, max: usize },
    #[error("ticker contains invalid character '{ch}' at index {index}")]
    TickerInvalidChar { ch: char, index: usize },

    #[error("isin cannot be empty")]
    EmptyIsin,
    #[error("isin must be 12 characters, got {len}")]
    IsinLength { len: usize },
    #[error("isin '{value}' must be a 2-letter country code, 9 alphanumerics and a check digit")]
    IsinFormat { value: String },
    #[error("isin '{value}' has an invalid check digit")]
    IsinCheckDigit { value: String },

    #[error("invalid date format, expected dd-mmm-yy (e.g., 01-Jan-25), got: {value}")]
    InvalidDate { value: String },

    #[error("currency must be a 3-letter ISO code: '{value}'")]
    InvalidCurrency { value: String },

    #[error("horizon_days must be greater than zero")]
    ZeroHorizon,
    #[error("concurrency must be greater than zero")]
    ZeroConcurrency,
}

/// Failure that aborts the whole batch.
///
/// Per-instrument problems never surface here; they are folded into
/// [`crate::LookupResult`] so the remaining requests keep running.
#[derive(Debug, Error)]
pub enum PipelineError {
    #[error("{provider} is unreachable: {source}")]
    ProviderUnreachable {
        provider: ProviderId,
        #[source]
        source: SourceError,
    },

    #[error(transparent)]
    InvalidInput(#[from] ValidationError),

    #[error("lookup task failed: {0}")]
    Task(String),
}

impl PipelineError {
    pub fn unreachable(provider: ProviderId, source: SourceError) -> Self {
        Self::ProviderUnreachable { provider, source }
    }

    pub const fn code(&self) -> &'static str {
        match self {
            Self::ProviderUnreachable { .. } => "pipeline.provider_unreachable",
            Self::InvalidInput(_) => "pipeline.invalid_input",
            Self::Task(_) => "pipeline.task",
        }
    }
}
