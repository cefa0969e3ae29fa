use axum::{
    extract::{rejection::JsonRejection, Path, State},
    http::StatusCode,
    Json,
};
use serde_json::{json, Map, Value};
use tracing::{info, warn};

use crate::{
    error::{AppError, AppResult, StoreError},
    validation::{validate_create, validate_update},
    AppState,
};

const PROCESS_FAILED: &str = "Internal Server Error: Could not process request.";
const LIST_FAILED: &str = "Internal Server Error: Could not retrieve products.";
const GET_FAILED: &str = "Internal Server Error: Could not retrieve product.";
const DELETE_FAILED: &str = "Internal Server Error: Could not delete product.";

// ── Create ────────────────────────────────────────────────────────────────────

pub async fn create_product(
    State(state): State<AppState>,
    body: Result<Json<Value>, JsonRejection>,
) -> AppResult<(StatusCode, Json<Value>)> {
    let fields = validate_create(&json_object(body)?)?;

    let product = state
        .products
        .create(fields)
        .await
        .map_err(|err| rejected_write(err, PROCESS_FAILED))?;

    info!(id = product.id, name = %product.name, "Created product");

    Ok((
        StatusCode::CREATED,
        Json(json!({
            "success": true,
            "message": "Product added successfully.",
            "product": product,
        })),
    ))
}

// ── List ──────────────────────────────────────────────────────────────────────

pub async fn list_products(State(state): State<AppState>) -> AppResult<Json<Value>> {
    let products = state
        .products
        .find_all()
        .await
        .map_err(|err| AppError::from_store(err, LIST_FAILED))?;

    info!(count = products.len(), "Listed products");

    Ok(Json(json!({
        "success": true,
        "count": products.len(),
        "products": products,
    })))
}

// ── Get by ID ─────────────────────────────────────────────────────────────────

pub async fn get_product(
    State(state): State<AppState>,
    Path(raw_id): Path<String>,
) -> AppResult<Json<Value>> {
    let id = resolve_id(&raw_id)?;
    let product = state
        .products
        .find_by_id(id)
        .await
        .map_err(|err| AppError::from_store(err, GET_FAILED))?;

    Ok(Json(json!({
        "success": true,
        "product": product,
    })))
}

// ── Update ────────────────────────────────────────────────────────────────────

pub async fn update_product(
    State(state): State<AppState>,
    Path(raw_id): Path<String>,
    body: Result<Json<Value>, JsonRejection>,
) -> AppResult<Json<Value>> {
    // The body is judged before the id, so a bad payload is a 400 even for unknown ids.
    let changes = validate_update(&json_object(body)?)?;
    let id = resolve_id(&raw_id)?;

    let product = state
        .products
        .update_by_id(id, changes)
        .await
        .map_err(|err| rejected_write(err, PROCESS_FAILED))?;

    info!(id, name = %product.name, "Updated product");

    Ok(Json(json!({
        "success": true,
        "message": format!("Product ID {id} updated successfully."),
        "product": product,
    })))
}

// ── Delete ────────────────────────────────────────────────────────────────────

pub async fn delete_product(
    State(state): State<AppState>,
    Path(raw_id): Path<String>,
) -> AppResult<StatusCode> {
    let not_found = || AppError::NotFound(format!("Product with ID {raw_id} not found for deletion."));

    let id = raw_id.parse::<i64>().map_err(|_| not_found())?;
    let deleted = state
        .products
        .delete_by_id(id)
        .await
        .map_err(|err| AppError::from_store(err, DELETE_FAILED))?;

    if deleted == 0 {
        return Err(not_found());
    }

    info!(id, "Deleted product");
    Ok(StatusCode::NO_CONTENT)
}

// ── Helpers ───────────────────────────────────────────────────────────────────

/// Non-object JSON bodies carry no fields.
fn json_object(body: Result<Json<Value>, JsonRejection>) -> AppResult<Map<String, Value>> {
    match body {
        Ok(Json(Value::Object(map))) => Ok(map),
        Ok(Json(_)) => Ok(Map::new()),
        Err(rejection) => Err(AppError::BadRequest(rejection.body_text())),
    }
}

/// Ids that are not integers cannot name a row, so they are reported like unknown ids.
fn resolve_id(raw: &str) -> AppResult<i64> {
    raw.parse::<i64>()
        .map_err(|_| AppError::NotFound(format!("Product with ID {raw} not found.")))
}

fn rejected_write(err: StoreError, fallback: &'static str) -> AppError {
    if matches!(
        err,
        StoreError::UniqueViolation(_) | StoreError::ValidationFailure(_)
    ) {
        warn!(error = %err, "Store rejected write");
    }
    AppError::from_store(err, fallback)
}
