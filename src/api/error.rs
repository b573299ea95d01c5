use axum::{
    Json,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use serde_json::json;
use tracing::error;

use crate::core::error::FundError;

/// A [`FundError`] on its way out of an endpoint. `summary` is the headline
/// used for server side failures, e.g. "Failed to load fund".
#[derive(Debug)]
pub struct ApiError {
    summary: &'static str,
    error: FundError,
}

impl ApiError {
    pub fn new(summary: &'static str, error: FundError) -> Self {
        Self { summary, error }
    }

    pub fn status(&self) -> StatusCode {
        match self.error {
            FundError::MissingParameter(_) | FundError::InvalidParameter(_) => StatusCode::BAD_REQUEST,
            FundError::FundNotFound(_) => StatusCode::NOT_FOUND,
            FundError::UpstreamUnavailable(_)
            | FundError::UpstreamBadResponse { .. }
            | FundError::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = self.status();
        let detail = self.error.to_string();
        let headline = match &self.error {
            FundError::MissingParameter(_) | FundError::InvalidParameter(_) => detail.clone(),
            FundError::FundNotFound(_) => "Fund not found".to_string(),
            _ => {
                error!(error = %self.error, "{}", self.summary);
                self.summary.to_string()
            }
        };
        (status, Json(json!({ "error": headline, "detail": detail }))).into_response()
    }
}
