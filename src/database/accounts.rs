use sqlx::SqlitePool;

use crate::database::manager::{is_unique_violation, DatabaseError};
use crate::database::models::Account;

/// Account lookup and creation over an explicit pool handle
#[derive(Clone)]
pub struct AccountRepository {
    pool: SqlitePool,
}

impl AccountRepository {
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }

    pub async fn find_by_username(&self, username: &str) -> Result<Option<Account>, DatabaseError> {
        let account = sqlx::query_as::<_, Account>(
            "SELECT id, username, hashed_password FROM auth_users WHERE username = ?",
        )
        .bind(username)
        .fetch_optional(&self.pool)
        .await?;

        Ok(account)
    }

    /// Insert a new account. The UNIQUE constraint on username closes the
    /// race between a pre-check and the insert.
    pub async fn create(
        &self,
        username: &str,
        hashed_password: &str,
    ) -> Result<Account, DatabaseError> {
        let result = sqlx::query_as::<_, Account>(
            "INSERT INTO auth_users (username, hashed_password) VALUES (?, ?)
             RETURNING id, username, hashed_password",
        )
        .bind(username)
        .bind(hashed_password)
        .fetch_one(&self.pool)
        .await;

        match result {
            Ok(account) => Ok(account),
            Err(e) if is_unique_violation(&e) => {
                Err(DatabaseError::Conflict("Username already exists".to_string()))
            }
            Err(e) => Err(e.into()),
        }
    }
}
