use axum::{
    response::{IntoResponse, Response},
    Json,
    http::StatusCode,
};
use serde_json::json;
use tracing::error;

#[derive(Debug, thiserror::Error)]
pub enum AppError {
    #[error("Failed to fetch website data: {0}")]
    Fetch(String),

    #[error("Text generation failed: {0}")]
    Generation(String),

    #[error("Chatbot is currently disabled (API Key missing).")]
    CapabilityUnavailable,

    #[error("Invalid request: {0}")]
    Input(String),

    #[error("Unauthorized")]
    Unauthorized,

    #[error("Storage error: {0}")]
    Store(String),

    #[error("Index {index} is out of range for {len} records")]
    IndexOutOfRange { index: usize, len: usize },

    #[error("{0}")]
    NotFound(String),

    #[error("Configuration error: {0}")]
    Config(String),
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let (status, body) = match self {
            AppError::Input(msg) => (StatusCode::BAD_REQUEST, json!({ "error": msg })),
            AppError::Unauthorized => (
                StatusCode::UNAUTHORIZED,
                json!({ "error": "Unauthorized" }),
            ),
            AppError::CapabilityUnavailable => (
                StatusCode::SERVICE_UNAVAILABLE,
                json!({ "error": self.to_string() }),
            ),
            AppError::Generation(msg) => {
                // Provider detail stays in the logs, never in the response.
                error!("Generation error: {msg}");
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    json!({ "error": "Text generation failed" }),
                )
            }
            AppError::Fetch(msg) => {
                error!("Fetch error: {msg}");
                (
                    StatusCode::BAD_GATEWAY,
                    json!({ "error": "Upstream fetch failed" }),
                )
            }
            AppError::Store(msg) => {
                error!("Store error: {msg}");
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    json!({ "status": "error", "message": msg }),
                )
            }
            AppError::IndexOutOfRange { .. } => (
                StatusCode::NOT_FOUND,
                json!({ "status": "error", "message": self.to_string() }),
            ),
            AppError::NotFound(msg) => (
                StatusCode::NOT_FOUND,
                json!({ "status": "error", "message": msg }),
            ),
            AppError::Config(msg) => {
                error!("Config error: {msg}");
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    json!({ "error": "Server is not configured correctly" }),
                )
            }
        };

        (status, Json(body)).into_response()
    }
}

impl From<reqwest::Error> for AppError {
    fn from(err: reqwest::Error) -> Self {
        AppError::Fetch(err.to_string())
    }
}

impl From<std::env::VarError> for AppError {
    fn from(err: std::env::VarError) -> Self {
        AppError::Config(err.to_string())
    }
}

pub type Result<T> = std::result::Result<T, AppError>;
