use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde_json::json;
use thiserror::Error;

/// Connection settings are missing or malformed. Raised when the data source
/// first builds its connection target, not at process start.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Database connection requires {0}")]
    MissingDatabaseSettings(String),

    #[error("PGPORT '{0}' is not a valid port number")]
    InvalidPort(String),

    #[error("DATABASE_URL is invalid: {0}")]
    InvalidDatabaseUrl(String),
}

/// Failure at the row fetch boundary. Never retried.
#[derive(Debug, Error)]
pub enum DataAccessError {
    #[error("could not acquire a database connection: {0}")]
    Connect(#[source] sqlx::Error),

    #[error("query execution failed: {0}")]
    Query(#[source] sqlx::Error),

    #[error("query references parameter ':{0}' which was not supplied")]
    MissingParameter(String),

    #[error("could not decode column '{column}': {source}")]
    Decode {
        column: String,
        #[source]
        source: sqlx::Error,
    },
}

/// Application-level error type.
/// Implements `IntoResponse` so Axum handlers can return `Result<T, AppError>`.
#[derive(Debug, Error)]
pub enum AppError {
    #[error("Validation error: {0}")]
    Validation(String),

    #[error("Configuration error: {0}")]
    Configuration(#[from] ConfigError),

    #[error("Data access error: {0}")]
    DataAccess(#[from] DataAccessError),
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let (status, code, message) = match &self {
            AppError::Validation(msg) => (StatusCode::BAD_REQUEST, "VALIDATION_ERROR", msg.clone()),
            AppError::Configuration(e) => {
                tracing::error!("Configuration error: {e}");
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    "CONFIGURATION_ERROR",
                    "The service is not configured to reach its database".to_string(),
                )
            }
            AppError::DataAccess(e) => {
                tracing::error!("Database error: {e}");
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    "DATABASE_ERROR",
                    "A database error occurred".to_string(),
                )
            }
        };

        let body = Json(json!({
            "error": {
                "code": code,
                "message": message
            }
        }));

        (status, body).into_response()
    }
}
