//! HTTP error mapping

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde_json::json;
use thiserror::Error;
use tracing::error;

use crate::activity::ActivityError;
use crate::render::RenderError;

#[derive(Error, Debug)]
pub enum ApiError {
    #[error(transparent)]
    Activity(#[from] ActivityError),

    #[error(transparent)]
    Render(#[from] RenderError),

    #[error("Bad request: {0}")]
    BadRequest(String),

    #[error("Unsupported content type")]
    UnsupportedMediaType,
}

impl ApiError {
    pub fn bad_request(msg: impl Into<String>) -> Self {
        Self::BadRequest(msg.into())
    }

    pub fn status(&self) -> StatusCode {
        match self {
            Self::Activity(ActivityError::StoreUnavailable(_)) => StatusCode::SERVICE_UNAVAILABLE,
            Self::Activity(ActivityError::NotFound(_)) => StatusCode::NOT_FOUND,
            Self::Activity(ActivityError::InvalidWindow { .. }) | Self::Render(_) => {
                StatusCode::INTERNAL_SERVER_ERROR
            }
            Self::BadRequest(_) => StatusCode::BAD_REQUEST,
            Self::UnsupportedMediaType => StatusCode::UNSUPPORTED_MEDIA_TYPE,
        }
    }

    /// Body text; store and internal details stay in the logs
    fn public_message(&self) -> String {
        match self {
            Self::Activity(ActivityError::StoreUnavailable(_)) => {
                "Storage is temporarily unavailable, try again later".to_string()
            }
            Self::Activity(ActivityError::InvalidWindow { .. }) | Self::Render(_) => {
                "Internal server error".to_string()
            }
            other => other.to_string(),
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = self.status();
        if status.is_server_error() {
            error!("Request failed: {}", self);
        }
        (status, Json(json!({ "error": self.public_message() }))).into_response()
    }
}
