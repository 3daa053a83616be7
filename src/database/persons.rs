use sqlx::SqlitePool;
use tracing::warn;

use crate::database::manager::{is_busy, is_unique_violation, DatabaseError};
use crate::database::models::{Person, PersonInput, PersonPatch};

const PERSON_COLUMNS: &str = "id, owner_id, seq, name, roll, age, gender";

/// How many allocation conflicts to absorb before giving up on a Create.
/// Conflicts require two same-owner inserts racing past the atomic MAX+1
/// statement, so more than one retry is already unusual.
const MAX_CREATE_ATTEMPTS: u32 = 3;

/// Owner-scoped CRUD over person records.
///
/// Every query carries an `owner_id` predicate, so one account can never see
/// or touch another account's rows. Records are addressed by their per-owner
/// sequence number; rows lacking one never match.
#[derive(Clone)]
pub struct PersonRepository {
    pool: SqlitePool,
}

impl PersonRepository {
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }

    /// Persist a new record, allocating the next per-owner sequence number.
    ///
    /// The number is computed as MAX(seq)+1 inside the INSERT itself, which
    /// SQLite executes atomically; the unique (owner_id, seq) index is the
    /// backstop, and a unique-violation simply retries the allocation.
    pub async fn create(
        &self,
        owner_id: i64,
        input: &PersonInput,
    ) -> Result<Person, DatabaseError> {
        let mut attempt = 0;
        loop {
            attempt += 1;

            let result = sqlx::query_as::<_, Person>(
                "INSERT INTO persons (owner_id, seq, name, roll, age, gender)
                 VALUES (
                     ?1,
                     (SELECT COALESCE(MAX(seq), 0) + 1 FROM persons WHERE owner_id = ?1),
                     ?2, ?3, ?4, ?5
                 )
                 RETURNING id, owner_id, seq, name, roll, age, gender",
            )
            .bind(owner_id)
            .bind(&input.name)
            .bind(&input.roll)
            .bind(input.age as i64)
            .bind(&input.gender)
            .fetch_one(&self.pool)
            .await;

            match result {
                Ok(person) => return Ok(person),
                Err(e)
                    if (is_unique_violation(&e) || is_busy(&e))
                        && attempt < MAX_CREATE_ATTEMPTS =>
                {
                    warn!(
                        "Sequence allocation conflict for owner {} (attempt {}), retrying",
                        owner_id, attempt
                    );
                }
                Err(e) => return Err(e.into()),
            }
        }
    }

    /// List the caller's records ordered by sequence number, optionally
    /// filtered by a case-insensitive name substring. Rows missing a seq
    /// (partial-migration stragglers) sort last, by global id.
    pub async fn list(
        &self,
        owner_id: i64,
        search: Option<&str>,
        skip: i64,
        limit: i64,
    ) -> Result<Vec<Person>, DatabaseError> {
        let persons = match search {
            Some(needle) => {
                let pattern = format!("%{}%", needle);
                sqlx::query_as::<_, Person>(&format!(
                    "SELECT {PERSON_COLUMNS} FROM persons
                     WHERE owner_id = ? AND name LIKE ?
                     ORDER BY (seq IS NULL), seq ASC, id ASC
                     LIMIT ? OFFSET ?"
                ))
                .bind(owner_id)
                .bind(pattern)
                .bind(limit)
                .bind(skip)
                .fetch_all(&self.pool)
                .await?
            }
            None => {
                sqlx::query_as::<_, Person>(&format!(
                    "SELECT {PERSON_COLUMNS} FROM persons
                     WHERE owner_id = ?
                     ORDER BY (seq IS NULL), seq ASC, id ASC
                     LIMIT ? OFFSET ?"
                ))
                .bind(owner_id)
                .bind(limit)
                .bind(skip)
                .fetch_all(&self.pool)
                .await?
            }
        };

        Ok(persons)
    }

    pub async fn get(&self, owner_id: i64, seq: i64) -> Result<Option<Person>, DatabaseError> {
        let person = sqlx::query_as::<_, Person>(&format!(
            "SELECT {PERSON_COLUMNS} FROM persons WHERE owner_id = ? AND seq = ?"
        ))
        .bind(owner_id)
        .bind(seq)
        .fetch_optional(&self.pool)
        .await?;

        Ok(person)
    }

    /// Overwrite all mutable fields. Identity fields (id, owner_id, seq) are
    /// not in the SET list and can never change here.
    pub async fn replace(
        &self,
        owner_id: i64,
        seq: i64,
        input: &PersonInput,
    ) -> Result<Option<Person>, DatabaseError> {
        let person = sqlx::query_as::<_, Person>(&format!(
            "UPDATE persons SET name = ?, roll = ?, age = ?, gender = ?
             WHERE owner_id = ? AND seq = ?
             RETURNING {PERSON_COLUMNS}"
        ))
        .bind(&input.name)
        .bind(&input.roll)
        .bind(input.age as i64)
        .bind(&input.gender)
        .bind(owner_id)
        .bind(seq)
        .fetch_optional(&self.pool)
        .await?;

        Ok(person)
    }

    /// Apply an allow-listed subset of fields. The patch has already been
    /// validated; absent fields keep their stored value.
    pub async fn update_fields(
        &self,
        owner_id: i64,
        seq: i64,
        patch: &PersonPatch,
    ) -> Result<Option<Person>, DatabaseError> {
        let person = sqlx::query_as::<_, Person>(&format!(
            "UPDATE persons SET
                 name = COALESCE(?, name),
                 roll = COALESCE(?, roll),
                 age = COALESCE(?, age),
                 gender = COALESCE(?, gender)
             WHERE owner_id = ? AND seq = ?
             RETURNING {PERSON_COLUMNS}"
        ))
        .bind(&patch.name)
        .bind(&patch.roll)
        .bind(patch.age)
        .bind(&patch.gender)
        .bind(owner_id)
        .bind(seq)
        .fetch_optional(&self.pool)
        .await?;

        Ok(person)
    }

    /// Remove the record and return its last state. Surviving records keep
    /// their sequence numbers; nothing is renumbered or compacted.
    pub async fn delete(&self, owner_id: i64, seq: i64) -> Result<Option<Person>, DatabaseError> {
        let person = sqlx::query_as::<_, Person>(&format!(
            "DELETE FROM persons WHERE owner_id = ? AND seq = ?
             RETURNING {PERSON_COLUMNS}"
        ))
        .bind(owner_id)
        .bind(seq)
        .fetch_optional(&self.pool)
        .await?;

        Ok(person)
    }
}
