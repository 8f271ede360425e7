use axum::{Json, http::StatusCode};
use serde::{Deserialize, Serialize};

use crate::error::QueryError;

pub const DEFAULT_TOP_LIMIT: usize = 10;
pub const MAX_TOP_LIMIT: usize = 100;

#[derive(Debug, Deserialize)]
pub struct TitleRequest {
    #[serde(default)]
    pub title: String,
}

#[derive(Debug, Deserialize)]
pub struct TopTenParams {
    #[serde(default)]
    pub limit: Option<usize>,
}

impl TopTenParams {
    pub fn effective_limit(&self) -> usize {
        self.limit
            .unwrap_or(DEFAULT_TOP_LIMIT)
            .clamp(1, MAX_TOP_LIMIT)
    }
}

#[derive(Debug)]
pub struct ApiError {
    pub status: StatusCode,
    pub message: String,
    pub detail: Option<anyhow::Error>,
}

impl ApiError {
    pub fn bad_request(message: impl Into<String>) -> Self {
        Self {
            status: StatusCode::BAD_REQUEST,
            message: message.into(),
            detail: None,
        }
    }

    pub fn internal(err: anyhow::Error) -> Self {
        Self {
            status: StatusCode::INTERNAL_SERVER_ERROR,
            message: format!("{err:#}"),
            detail: Some(err),
        }
    }
}

#[derive(Debug, Serialize, Deserialize)]
pub struct ErrorBody {
    pub error: String,
}

impl axum::response::IntoResponse for ApiError {
    fn into_response(self) -> axum::response::Response {
        if let Some(detail) = &self.detail {
            tracing::error!(error = %detail);
        }
        let body = Json(ErrorBody {
            error: self.message,
        });
        (self.status, body).into_response()
    }
}

impl From<QueryError> for ApiError {
    fn from(value: QueryError) -> Self {
        match value {
            QueryError::InvalidInput(message) => ApiError::bad_request(message),
            failure @ QueryError::ProviderFailure(_) => {
                ApiError::internal(anyhow::Error::new(failure))
            }
        }
    }
}
