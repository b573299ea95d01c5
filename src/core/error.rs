use thiserror::Error;

/// Failures a fund request can end with.
///
/// Chunk-level upstream failures and cache write failures are absorbed by the
/// sync pipeline and never show up here.
#[derive(Debug, Error)]
pub enum FundError {
    #[error("Missing {0} parameter")]
    MissingParameter(&'static str),

    #[error("Invalid parameter: {0}")]
    InvalidParameter(String),

    #[error("Upstream unavailable: {0}")]
    UpstreamUnavailable(String),

    #[error("Upstream returned an invalid response: {snippet}")]
    UpstreamBadResponse { snippet: String },

    #[error("Fund not found: {0}")]
    FundNotFound(String),

    #[error(transparent)]
    Internal(#[from] anyhow::Error),
}

impl FundError {
    /// Chunk fetches are retried only for failures that may go away.
    pub fn is_transient(&self) -> bool {
        matches!(
            self,
            FundError::UpstreamUnavailable(_) | FundError::UpstreamBadResponse { .. }
        )
    }
}
