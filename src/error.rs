use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde_json::json;
use thiserror::Error;

use crate::validation::ValidationError;

pub type AppResult<T> = Result<T, AppError>;
pub type StoreResult<T> = Result<T, StoreError>;

// ── Store errors ──────────────────────────────────────────────────────────────

/// Tagged result of a failed repository call.
#[derive(Debug, Error)]
pub enum StoreError {
    #[error("unique constraint violated: {}", .0.join(", "))]
    UniqueViolation(Vec<String>),
    #[error("store rejected values: {}", .0.join(", "))]
    ValidationFailure(Vec<String>),
    #[error("product {0} not found")]
    NotFound(i64),
    #[error(transparent)]
    Failure(sqlx::Error),
}

/// Named table constraints and the message each one surfaces to clients.
const CONSTRAINT_MESSAGES: &[(&str, &str)] = &[
    ("name_length", "Name must be between 2 and 100 characters."),
    ("price_non_negative", "Price cannot be negative."),
    ("stock_non_negative", "Stock count cannot be negative."),
    ("products.name", "Product name is required."),
    ("products.price", "Price is required."),
    ("products.stock", "Stock is required."),
];

impl From<sqlx::Error> for StoreError {
    fn from(err: sqlx::Error) -> Self {
        let sqlx::Error::Database(db) = &err else {
            return StoreError::Failure(err);
        };

        match db.kind() {
            sqlx::error::ErrorKind::UniqueViolation => {
                StoreError::UniqueViolation(vec!["name must be unique".to_string()])
            }
            sqlx::error::ErrorKind::CheckViolation | sqlx::error::ErrorKind::NotNullViolation => {
                let text = db.message();
                let mut messages: Vec<String> = CONSTRAINT_MESSAGES
                    .iter()
                    .filter(|(constraint, _)| text.contains(constraint))
                    .map(|(_, message)| message.to_string())
                    .collect();
                if messages.is_empty() {
                    messages.push("A field value is not allowed.".to_string());
                }
                StoreError::ValidationFailure(messages)
            }
            _ => StoreError::Failure(err),
        }
    }
}

// ── Handler boundary ──────────────────────────────────────────────────────────

#[derive(Debug, Error)]
pub enum AppError {
    #[error(transparent)]
    Validation(#[from] ValidationError),
    #[error("{0}")]
    BadRequest(String),
    #[error("{0}")]
    NotFound(String),
    #[error("{0}")]
    Conflict(String),
    #[error("{0}")]
    Unavailable(String),
    /// `message` is what the client sees; `source` is only logged.
    #[error("{message}")]
    Internal {
        message: &'static str,
        #[source]
        source: StoreError,
    },
}

impl AppError {
    /// Maps a store error onto the client-facing taxonomy. `fallback` is the
    /// message returned when the cause must not be shown.
    pub fn from_store(err: StoreError, fallback: &'static str) -> Self {
        match err {
            StoreError::UniqueViolation(messages) => {
                AppError::Conflict(format!("Database Error: {}", messages.join(", ")))
            }
            StoreError::ValidationFailure(messages) => {
                AppError::BadRequest(format!("Database Error: {}", messages.join(", ")))
            }
            StoreError::NotFound(id) => {
                AppError::NotFound(format!("Product with ID {id} not found."))
            }
            source @ StoreError::Failure(_) => AppError::Internal {
                message: fallback,
                source,
            },
        }
    }

    pub fn status(&self) -> StatusCode {
        match self {
            AppError::Validation(_) | AppError::BadRequest(_) => StatusCode::BAD_REQUEST,
            AppError::NotFound(_) => StatusCode::NOT_FOUND,
            AppError::Conflict(_) => StatusCode::CONFLICT,
            AppError::Unavailable(_) => StatusCode::SERVICE_UNAVAILABLE,
            AppError::Internal { .. } => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let status = self.status();
        if let AppError::Internal { message, source } = &self {
            tracing::error!(error = ?source, "{}", message);
        }

        let body = Json(json!({
            "success": false,
            "message": self.to_string(),
        }));

        (status, body).into_response()
    }
}
