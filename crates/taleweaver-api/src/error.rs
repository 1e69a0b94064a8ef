//! Taleweaver — API error types.

use axum::Json;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use serde::Serialize;
use taleweaver_core::error::DomainError;
use taleweaver_session::domain::failure::AdvancementFailure;
use thiserror::Error;
use tracing::error;

/// Startup and runtime errors for the API server.
#[derive(Debug, Error)]
pub enum AppError {
    /// A required environment variable is missing or invalid.
    #[error("configuration error: {0}")]
    Config(String),

    /// Database connection or pool error.
    #[error("database error: {0}")]
    Database(#[from] sqlx::Error),

    /// Schema migration failed.
    #[error("migration error: {0}")]
    Migration(#[from] sqlx::migrate::MigrateError),

    /// Tracing or exporter setup failed.
    #[error("telemetry error: {0}")]
    Telemetry(String),

    /// Network binding or I/O error.
    #[error("server error: {0}")]
    Server(#[from] std::io::Error),
}

/// JSON body returned for error responses.
#[derive(Debug, Serialize)]
pub struct ErrorBody {
    /// Always `false`.
    pub success: bool,
    /// Human-readable, player-safe message.
    pub message: String,
    /// Machine-readable error code.
    pub error: &'static str,
    /// Whether resubmitting the same request may succeed.
    pub retryable: bool,
}

/// HTTP-layer error that implements `IntoResponse`.
#[derive(Debug)]
pub enum ApiError {
    /// An advancement stopped.
    Advancement(AdvancementFailure),
    /// A requested record does not exist.
    NotFound(String),
    /// A read failed.
    Storage(DomainError),
    /// The advancement task did not complete.
    Internal(String),
}

impl From<AdvancementFailure> for ApiError {
    fn from(failure: AdvancementFailure) -> Self {
        Self::Advancement(failure)
    }
}

impl From<DomainError> for ApiError {
    fn from(err: DomainError) -> Self {
        Self::Storage(err)
    }
}

fn advancement_status(failure: &AdvancementFailure) -> StatusCode {
    match failure {
        AdvancementFailure::InvalidRequest(_) | AdvancementFailure::NoActiveSession(_) => {
            StatusCode::BAD_REQUEST
        }
        AdvancementFailure::CampaignNotFound(_) => StatusCode::NOT_FOUND,
        AdvancementFailure::StorageUnavailable(_)
        | AdvancementFailure::GenerationUnavailable(_)
        | AdvancementFailure::MalformedGeneration(_)
        | AdvancementFailure::PersistenceFailed { .. } => StatusCode::INTERNAL_SERVER_ERROR,
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let (status, body) = match self {
            Self::Advancement(failure) => (
                advancement_status(&failure),
                ErrorBody {
                    success: false,
                    message: failure.public_message(),
                    error: failure.kind().code(),
                    retryable: failure.is_retryable(),
                },
            ),
            Self::NotFound(message) => (
                StatusCode::NOT_FOUND,
                ErrorBody {
                    success: false,
                    message,
                    error: "not_found",
                    retryable: false,
                },
            ),
            Self::Storage(err) => {
                error!(error = %err, "storage read failed");
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    ErrorBody {
                        success: false,
                        message: "The campaign could not be loaded right now".to_owned(),
                        error: "storage_unavailable",
                        retryable: false,
                    },
                )
            }
            Self::Internal(reason) => {
                error!(%reason, "request handling failed");
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    ErrorBody {
                        success: false,
                        message: "Something went wrong, please try again".to_owned(),
                        error: "internal_error",
                        retryable: false,
                    },
                )
            }
        };

        (status, Json(body)).into_response()
    }
}
