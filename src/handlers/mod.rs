pub mod products;

use std::any::Any;

use axum::{
    extract::State,
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde_json::{json, Value};

use crate::{
    error::{AppError, AppResult},
    AppState,
};

pub async fn health(State(state): State<AppState>) -> AppResult<(StatusCode, Json<Value>)> {
    state.products.ping().await.map_err(|err| {
        tracing::error!(error = %err, "Health check failed");
        AppError::Unavailable("Database unavailable.".to_string())
    })?;

    Ok((StatusCode::OK, Json(json!({ "status": "ok", "service": "product-service" }))))
}

pub async fn not_found() -> AppError {
    AppError::NotFound("Route not found.".to_string())
}

/// Turns a handler panic into the standard 500 body instead of a dropped connection.
pub fn panic_response(err: Box<dyn Any + Send + 'static>) -> Response {
    let detail = err
        .downcast_ref::<String>()
        .map(String::as_str)
        .or_else(|| err.downcast_ref::<&str>().copied())
        .unwrap_or("unknown panic");
    tracing::error!(panic = detail, "Handler panicked");

    (
        StatusCode::INTERNAL_SERVER_ERROR,
        Json(json!({ "success": false, "message": "Internal Server Error." })),
    )
        .into_response()
}
