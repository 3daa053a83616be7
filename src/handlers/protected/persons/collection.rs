use axum::{
    extract::{Query, State},
    http::StatusCode,
    response::Json,
    Extension,
};
use serde::Deserialize;
use serde_json::{json, Value};

use crate::config;
use crate::database::models::PersonInput;
use crate::database::persons::PersonRepository;
use crate::error::ApiError;
use crate::middleware::AuthUser;
use crate::state::AppState;

#[derive(Debug, Deserialize)]
pub struct ListQuery {
    /// Case-insensitive substring match on name
    pub search: Option<String>,
    pub skip: Option<i64>,
    pub limit: Option<i64>,
}

/// POST /persons - Create a record owned by the caller
///
/// The per-owner sequence number is allocated by the store; the response
/// carries both it and the global id.
pub async fn create(
    State(state): State<AppState>,
    Extension(user): Extension<AuthUser>,
    Json(input): Json<PersonInput>,
) -> Result<(StatusCode, Json<Value>), ApiError> {
    input.validate().map_err(ApiError::bad_request)?;

    let person = PersonRepository::new(state.pool.clone())
        .create(user.id, &input)
        .await?;

    Ok((
        StatusCode::CREATED,
        Json(json!({ "success": true, "data": person })),
    ))
}

/// GET /persons - List the caller's records in sequence order
pub async fn list(
    State(state): State<AppState>,
    Extension(user): Extension<AuthUser>,
    Query(query): Query<ListQuery>,
) -> Result<Json<Value>, ApiError> {
    let api = &config::config().api;

    let skip = query.skip.unwrap_or(0);
    if skip < 0 {
        return Err(ApiError::bad_request("skip must be >= 0"));
    }

    let limit = query.limit.unwrap_or(api.default_page_size);
    if limit < 1 {
        return Err(ApiError::bad_request("limit must be >= 1"));
    }
    let limit = limit.min(api.max_page_size);

    let items = PersonRepository::new(state.pool.clone())
        .list(user.id, query.search.as_deref(), skip, limit)
        .await?;

    Ok(Json(json!({
        "success": true,
        "data": {
            "items": items,
            "skip": skip,
            "limit": limit
        }
    })))
}
