use stockdelta_core::{PipelineError, ValidationError};
use thiserror::Error;

/// CLI-level error categories mapped to exit codes.
#[derive(Debug, Error)]
pub enum CliError {
    #[error("{0}")]
    Usage(String),

    /// Input file that cannot be read or does not have the expected layout.
    #[error("{0}")]
    Input(String),

    #[error("invalid input: {0}")]
    Validation(#[from] ValidationError),

    #[error("provider unreachable: {0}")]
    ProviderUnreachable(PipelineError),

    #[error("lookup failed: {0}")]
    Pipeline(PipelineError),

    #[error(transparent)]
    Csv(#[from] csv::Error),

    #[error(transparent)]
    Io(#[from] std::io::Error),
}

impl From<PipelineError> for CliError {
    fn from(error: PipelineError) -> Self {
        match error {
            PipelineError::InvalidInput(validation) => Self::Validation(validation),
            unreachable @ PipelineError::ProviderUnreachable { .. } => {
                Self::ProviderUnreachable(unreachable)
            }
            other => Self::Pipeline(other),
        }
    }
}

impl CliError {
    pub const fn exit_code(&self) -> u8 {
        match self {
            Self::Usage(_) => 2,
            Self::Input(_) => 2,
            Self::Validation(_) => 2,
            Self::ProviderUnreachable(_) => 3,
            Self::Pipeline(_) => 1,
            Self::Csv(_) => 4,
            Self::Io(_) => 10,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use stockdelta_core::{ProviderId, SourceError};

    #[test]
    fn pipeline_errors_keep_their_category() {
        let unreachable: CliError = PipelineError::unreachable(
            ProviderId::Yahoo,
            SourceError::unavailable("yahoo returned status 503"),
        )
        .into();
        assert_eq!(unreachable.exit_code(), 3);
        assert!(unreachable.to_string().starts_with("provider unreachable: yahoo"));

        let invalid: CliError = PipelineError::from(ValidationError::ZeroHorizon).into();
        assert_eq!(invalid.exit_code(), 2);
        assert!(invalid.to_string().starts_with("invalid input:"));
    }
}
