use actix_web::http::StatusCode;
use actix_web::{HttpResponse, ResponseError};
use serde_json::{Value, json};
use thiserror::Error;

/// Failures surfaced by the request pipeline. Every variant maps to the
/// `{error, details?}` response body through [`ResponseError`].
#[derive(Debug, Error)]
pub enum GatewayError {
    #[error("Request body exceeds limit of {limit} bytes")]
    PayloadTooLarge { limit: usize },

    #[error("Invalid JSON payload.")]
    InvalidJson,

    #[error("Image fetch failed with status {status}")]
    ImageFetch { status: u16 },

    #[error("{message}")]
    Upstream {
        status: u16,
        message: String,
        payload: Value,
    },

    #[error("Failed to read request body: {0}")]
    BodyRead(#[from] actix_web::error::PayloadError),

    #[error("Upstream request failed: {0}")]
    Transport(#[from] reqwest::Error),

    #[error(transparent)]
    Internal(#[from] anyhow::Error),
}

impl ResponseError for GatewayError {
    fn status_code(&self) -> StatusCode {
        match self {
            Self::PayloadTooLarge { .. } => StatusCode::PAYLOAD_TOO_LARGE,
            Self::InvalidJson => StatusCode::BAD_REQUEST,
            Self::ImageFetch { status } | Self::Upstream { status, .. } => {
                StatusCode::from_u16(*status).unwrap_or(StatusCode::INTERNAL_SERVER_ERROR)
            }
            Self::BodyRead(_) | Self::Transport(_) | Self::Internal(_) => {
                StatusCode::INTERNAL_SERVER_ERROR
            }
        }
    }

    fn error_response(&self) -> HttpResponse {
        let mut body = json!({ "error": self.to_string() });
        match self {
            Self::PayloadTooLarge { .. } | Self::InvalidJson => {}
            Self::Upstream { payload, .. } => body["details"] = payload.clone(),
            _ => body["details"] = Value::Null,
        }
        HttpResponse::build(self.status_code()).json(body)
    }
}
