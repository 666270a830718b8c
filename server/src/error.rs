use axum::{
    Json,
    http::{HeaderValue, StatusCode, header},
    response::{IntoResponse, Response},
};
use snakelab_protocol::ErrorResponse;
use std::time::Duration;

use crate::auth::AuthError;
use crate::config::ConfigError;
use crate::logic::image::UpstreamError;

#[derive(thiserror::Error, Debug)]
pub enum ApiError {
    #[error("Authentication failed: {0}")]
    Unauthorized(#[from] AuthError),
    #[error("Upstream error: {0}")]
    Upstream(#[from] UpstreamError),
    #[error("Request timed out after {0:?}")]
    Timeout(Duration),
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),
    #[error("Internal server error: {0}")]
    InternalError(#[from] anyhow::Error),
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let (status, detail) = match &self {
            ApiError::Unauthorized(err) => {
                tracing::warn!("Rejected credentials: {err}");
                let detail = match err {
                    AuthError::MissingToken => "Not authenticated",
                    _ => "Could not validate credentials",
                };
                (StatusCode::UNAUTHORIZED, detail.to_string())
            }
            ApiError::Upstream(err) => {
                tracing::error!("Image generation failed: {err}");
                (StatusCode::INTERNAL_SERVER_ERROR, err.to_string())
            }
            ApiError::Timeout(limit) => {
                tracing::error!("Request timed out after {limit:?}");
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    "Request timed out".to_string(),
                )
            }
            ApiError::Config(err) => {
                tracing::error!("Configuration error: {err}");
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    "Internal server error".to_string(),
                )
            }
            ApiError::InternalError(err) => {
                tracing::error!("Internal server error: {:?}", err);
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    "Internal server error".to_string(),
                )
            }
        };

        let mut response = (status, Json(ErrorResponse { detail })).into_response();
        if status == StatusCode::UNAUTHORIZED {
            response
                .headers_mut()
                .insert(header::WWW_AUTHENTICATE, HeaderValue::from_static("Bearer"));
        }
        response
    }
}
