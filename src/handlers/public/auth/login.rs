// handlers/public/auth/login.rs - POST /auth/login handler

use axum::{extract::State, response::Json};
use serde_json::{json, Value};

use super::AuthRequest;
use crate::auth;
use crate::config;
use crate::database::accounts::AccountRepository;
use crate::error::ApiError;
use crate::state::AppState;

/// POST /auth/login - Verify credentials and issue a bearer JWT
///
/// The token carries the account id and username and expires after the
/// configured lifetime (60 minutes by default). An unknown username and a
/// wrong password produce the same response.
pub async fn login_post(
    State(state): State<AppState>,
    Json(payload): Json<AuthRequest>,
) -> Result<Json<Value>, ApiError> {
    let repo = AccountRepository::new(state.pool.clone());

    let account = repo
        .find_by_username(&payload.username)
        .await?
        .ok_or_else(|| ApiError::invalid_credentials("Incorrect username or password"))?;

    if !auth::verify_password(&payload.password, &account.hashed_password) {
        return Err(ApiError::invalid_credentials(
            "Incorrect username or password",
        ));
    }

    let claims = auth::Claims::new(account.username, account.id);
    let token = auth::generate_jwt(claims)?;

    Ok(Json(json!({
        "success": true,
        "data": {
            "access_token": token,
            "token_type": "bearer",
            "expires_in": config::config().security.token_expiry_minutes * 60
        }
    })))
}
