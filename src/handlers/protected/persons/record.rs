use axum::{
    extract::{Path, State},
    response::Json,
    Extension,
};
use serde_json::{json, Value};

use crate::database::models::{PersonInput, PersonPatch};
use crate::database::persons::PersonRepository;
use crate::error::ApiError;
use crate::middleware::AuthUser;
use crate::state::AppState;

/// GET /persons/:seq - Fetch one of the caller's records
pub async fn get(
    State(state): State<AppState>,
    Extension(user): Extension<AuthUser>,
    Path(seq): Path<i64>,
) -> Result<Json<Value>, ApiError> {
    let person = PersonRepository::new(state.pool.clone())
        .get(user.id, seq)
        .await?
        .ok_or_else(|| ApiError::not_found("Person not found"))?;

    Ok(Json(json!({ "success": true, "data": person })))
}

/// PUT /persons/:seq - Replace all mutable fields of a record
pub async fn put(
    State(state): State<AppState>,
    Extension(user): Extension<AuthUser>,
    Path(seq): Path<i64>,
    Json(input): Json<PersonInput>,
) -> Result<Json<Value>, ApiError> {
    input.validate().map_err(ApiError::bad_request)?;

    let person = PersonRepository::new(state.pool.clone())
        .replace(user.id, seq, &input)
        .await?
        .ok_or_else(|| ApiError::not_found("Person not found"))?;

    Ok(Json(json!({ "success": true, "data": person })))
}

/// PATCH /persons/:seq - Apply a subset of fields to a record
///
/// The payload must be a JSON object naming at least one updatable field;
/// identity fields are rejected and unknown fields are skipped.
pub async fn patch(
    State(state): State<AppState>,
    Extension(user): Extension<AuthUser>,
    Path(seq): Path<i64>,
    Json(payload): Json<Value>,
) -> Result<Json<Value>, ApiError> {
    let object = payload
        .as_object()
        .ok_or_else(|| ApiError::bad_request("update payload must be a JSON object"))?;

    let patch =
        PersonPatch::from_json(object).map_err(|e| ApiError::bad_request(e.to_string()))?;

    let person = PersonRepository::new(state.pool.clone())
        .update_fields(user.id, seq, &patch)
        .await?
        .ok_or_else(|| ApiError::not_found("Person not found"))?;

    Ok(Json(json!({ "success": true, "data": person })))
}

/// DELETE /persons/:seq - Remove a record and return its last state
pub async fn delete(
    State(state): State<AppState>,
    Extension(user): Extension<AuthUser>,
    Path(seq): Path<i64>,
) -> Result<Json<Value>, ApiError> {
    let person = PersonRepository::new(state.pool.clone())
        .delete(user.id, seq)
        .await?
        .ok_or_else(|| ApiError::not_found("Person not found"))?;

    Ok(Json(json!({ "success": true, "data": person })))
}
