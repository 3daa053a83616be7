use serde::Serialize;
use sqlx::FromRow;

/// Authentication principal. Usernames are immutable after signup and
/// accounts are never deleted.
#[derive(Debug, Clone, Serialize, FromRow)]
pub struct Account {
    pub id: i64,
    pub username: String,
    #[serde(skip_serializing)]
    pub hashed_password: String,
}
