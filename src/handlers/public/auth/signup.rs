// handlers/public/auth/signup.rs - POST /auth/signup handler

use axum::{extract::State, http::StatusCode, response::Json};
use serde_json::{json, Value};

use super::AuthRequest;
use crate::auth;
use crate::database::accounts::AccountRepository;
use crate::error::ApiError;
use crate::state::AppState;

/// POST /auth/signup - Create a new account
///
/// Fails with 409 if the username is taken. The password is stored only as a
/// bcrypt hash.
pub async fn signup_post(
    State(state): State<AppState>,
    Json(payload): Json<AuthRequest>,
) -> Result<(StatusCode, Json<Value>), ApiError> {
    if payload.username.is_empty() || payload.password.is_empty() {
        return Err(ApiError::bad_request(
            "username and password must not be empty",
        ));
    }

    let repo = AccountRepository::new(state.pool.clone());

    // Friendly pre-check; the UNIQUE constraint in the repository closes the
    // race with a concurrent signup for the same name
    if repo.find_by_username(&payload.username).await?.is_some() {
        return Err(ApiError::conflict("Username already exists"));
    }

    let hashed = auth::hash_password(&payload.password)?;
    let account = repo.create(&payload.username, &hashed).await?;

    tracing::info!("Created account '{}'", account.username);

    Ok((
        StatusCode::CREATED,
        Json(json!({
            "success": true,
            "data": {
                "username": account.username
            }
        })),
    ))
}
