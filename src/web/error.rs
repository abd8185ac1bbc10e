use axum::http::header::RETRY_AFTER;
use axum::http::{HeaderValue, StatusCode};
use axum::response::{IntoResponse, Response};
use axum::Json;
use std::time::Duration;
use tracing::{error, info};

use crate::models::ErrorBody;
use crate::Error;

/// Failures surfaced to HTTP clients as `{"error": ...}` bodies.
#[derive(Debug)]
pub enum ApiError {
    /// A pipeline error from the generator
    Generation(Error),
    /// The requested image does not exist
    NotFound(String),
    /// Client exceeded its request budget
    RateLimited { limit: String, retry_after: Duration },
}

impl From<Error> for ApiError {
    fn from(err: Error) -> Self {
        ApiError::Generation(err)
    }
}

impl ApiError {
    fn status_and_message(&self) -> (StatusCode, String) {
        match self {
            ApiError::NotFound(_) => (StatusCode::NOT_FOUND, "Image not found".to_string()),
            ApiError::RateLimited { limit, .. } => (
                StatusCode::TOO_MANY_REQUESTS,
                format!("Rate limit exceeded: {}", limit),
            ),
            ApiError::Generation(err) => match err {
                Error::WordSelection(message) => {
                    (StatusCode::INTERNAL_SERVER_ERROR, message.clone())
                }
                Error::Busy => (StatusCode::SERVICE_UNAVAILABLE, err.to_string()),
                Error::AiProvider(_) | Error::Http(_) => (
                    StatusCode::BAD_GATEWAY,
                    "Image generation failed".to_string(),
                ),
                _ => (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    "Internal server error".to_string(),
                ),
            },
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let (status, message) = self.status_and_message();

        match &self {
            ApiError::NotFound(name) => info!("404 image {}", name),
            ApiError::RateLimited { limit, .. } => info!("429 rate limited ({})", limit),
            ApiError::Generation(err) => error!("{} {}", status.as_u16(), err),
        }

        let mut response = (status, Json(ErrorBody::new(message))).into_response();
        if let ApiError::RateLimited { retry_after, .. } = self {
            let seconds = retry_after.as_secs().max(1);
            if let Ok(value) = HeaderValue::from_str(&seconds.to_string()) {
                response.headers_mut().insert(RETRY_AFTER, value);
            }
        }
        response
    }
}
