//! services/api/src/error.rs
//!
//! Defines the primary error type for the entire API service and how each
//! variant is rendered as an HTTP response.

use crate::config::ConfigError;
use axum::{
    extract::rejection::JsonRejection,
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use caption_genius_core::{
    schedule::ScheduleError, PipelineError, PortError, ValidationError,
};
use serde_json::json;
use tracing::error;

/// The primary error type for the `api` service.
#[derive(Debug, thiserror::Error)]
pub enum ApiError {
    /// Represents an error that occurred during configuration loading.
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    /// Represents an error that propagated up from one of the core service ports.
    #[error("Service Port Error: {0}")]
    Port(#[from] PortError),

    /// A failure of the caption generation pipeline.
    #[error("{0}")]
    Pipeline(#[from] PipelineError),

    #[error("{0}")]
    Schedule(#[from] ScheduleError),

    #[error("{0}")]
    Validation(#[from] ValidationError),

    /// The request body was not the JSON the handler expects.
    #[error("{}", .0.body_text())]
    Body(#[from] JsonRejection),

    /// Represents an error from the underlying database library.
    #[error("Database Error: {0}")]
    Database(#[from] sqlx::Error),

    /// Represents a standard Input/Output error (e.g., binding to a network socket).
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// No valid session accompanied the request.
    #[error("Unauthorized - Please sign in first")]
    Unauthenticated,

    /// A catch-all for any other unexpected errors.
    #[error("An unexpected internal error occurred: {0}")]
    Internal(String),
}

const GENERIC_MESSAGE: &str = "Internal server error";

fn port_status(e: &PortError) -> StatusCode {
    match e {
        PortError::NotFound(_) => StatusCode::NOT_FOUND,
        PortError::Unauthorized => StatusCode::UNAUTHORIZED,
        PortError::Unexpected(_) | PortError::EmptyResponse(_) => {
            StatusCode::INTERNAL_SERVER_ERROR
        }
    }
}

impl ApiError {
    pub fn status_code(&self) -> StatusCode {
        match self {
            ApiError::Validation(_) | ApiError::Body(_) => StatusCode::BAD_REQUEST,
            ApiError::Unauthenticated => StatusCode::UNAUTHORIZED,
            ApiError::Port(e) => port_status(e),
            ApiError::Schedule(ScheduleError::Validation(_)) => StatusCode::BAD_REQUEST,
            ApiError::Schedule(ScheduleError::Port(e)) => port_status(e),
            ApiError::Pipeline(e) => match e {
                PipelineError::Validation(_) | PipelineError::InvalidNiche(_) => {
                    StatusCode::BAD_REQUEST
                }
                PipelineError::Unauthorized => StatusCode::UNAUTHORIZED,
                PipelineError::InsufficientCredits => StatusCode::PAYMENT_REQUIRED,
                PipelineError::QuotaExceeded { .. } => StatusCode::TOO_MANY_REQUESTS,
                PipelineError::GenerationFailed
                | PipelineError::Store(_)
                | PipelineError::Provider(_) => StatusCode::INTERNAL_SERVER_ERROR,
            },
            ApiError::Config(_)
            | ApiError::Database(_)
            | ApiError::Io(_)
            | ApiError::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    /// The message shown to the caller. Server faults never leak their details.
    fn public_message(&self) -> String {
        match self {
            ApiError::Pipeline(PipelineError::GenerationFailed)
            | ApiError::Pipeline(PipelineError::Store(_))
            | ApiError::Pipeline(PipelineError::Provider(_)) => {
                "Failed to generate caption".to_string()
            }
            ApiError::Pipeline(PipelineError::Unauthorized) => "Invalid OpenAI API key".to_string(),
            ApiError::Port(PortError::NotFound(_))
            | ApiError::Schedule(ScheduleError::Port(PortError::NotFound(_))) => {
                "Not found".to_string()
            }
            _ if self.status_code().is_server_error() => GENERIC_MESSAGE.to_string(),
            other => other.to_string(),
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = self.status_code();
        if status.is_server_error() {
            error!("Request failed: {:?}", self);
        }

        let body = match &self {
            ApiError::Pipeline(PipelineError::QuotaExceeded { used, limit }) => json!({
                "error": self.public_message(),
                "used": used,
                "limit": limit,
            }),
            _ => json!({ "error": self.public_message() }),
        };
        (status, Json(body)).into_response()
    }
}
