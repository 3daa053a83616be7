use std::future::Future;

use sqlx::{Row, SqlitePool};
use tracing::{info, warn};

/// Bring the persisted schema up to the current shape.
///
/// Steps run in order; each is idempotent and each failure is logged and
/// skipped rather than propagated, so a partially-upgraded database still
/// boots. The routine itself never returns an error.
pub async fn migrate(pool: &SqlitePool) {
    info!("Running schema upgrade steps");

    // 1. Base tables for fresh installs (already in current shape)
    run_step("create_base_tables", create_base_tables(pool)).await;

    // 2. Legacy shape one: no ownership concept
    run_step("add_owner_column", add_owner_column(pool)).await;

    // 3. Legacy shape two: ownership without per-owner numbering.
    //    Adding the column and backfilling happen together, once.
    run_step("add_seq_column_and_backfill", add_seq_column_and_backfill(pool)).await;

    // 4. Storage-level backstop for the per-owner allocation invariant
    run_step("ensure_owner_seq_index", ensure_owner_seq_index(pool)).await;
}

async fn run_step(name: &str, step: impl Future<Output = Result<(), sqlx::Error>>) {
    if let Err(e) = step.await {
        warn!("Schema step {} did nothing: {}", name, e);
    }
}

async fn create_base_tables(pool: &SqlitePool) -> Result<(), sqlx::Error> {
    sqlx::query(
        "CREATE TABLE IF NOT EXISTS auth_users (
            id INTEGER PRIMARY KEY AUTOINCREMENT,
            username TEXT NOT NULL UNIQUE,
            hashed_password TEXT NOT NULL
        )",
    )
    .execute(pool)
    .await?;

    sqlx::query(
        "CREATE TABLE IF NOT EXISTS persons (
            id INTEGER PRIMARY KEY AUTOINCREMENT,
            owner_id INTEGER REFERENCES auth_users(id),
            seq INTEGER,
            name TEXT NOT NULL,
            roll TEXT NOT NULL,
            age INTEGER NOT NULL,
            gender TEXT NOT NULL
        )",
    )
    .execute(pool)
    .await?;

    Ok(())
}

async fn add_owner_column(pool: &SqlitePool) -> Result<(), sqlx::Error> {
    // Skipped, not attempted, when the column is already there
    if column_exists(pool, "persons", "owner_id").await? {
        return Ok(());
    }

    info!("Adding persons.owner_id column");
    sqlx::query("ALTER TABLE persons ADD COLUMN owner_id INTEGER REFERENCES auth_users(id)")
        .execute(pool)
        .await?;

    // Rows predating ownership keep a NULL owner. Assigning one here would
    // silently hand every orphaned record to some account, so we never do.
    Ok(())
}

/// Adds the per-owner sequence column and numbers existing owned rows.
///
/// The backfill runs only on the upgrade that introduces the column: for each
/// distinct owner, that owner's rows ordered by global id get 1, 2, 3, ….
/// Rows without an owner keep a NULL seq and stay out of owner-scoped queries.
async fn add_seq_column_and_backfill(pool: &SqlitePool) -> Result<(), sqlx::Error> {
    if column_exists(pool, "persons", "seq").await? {
        return Ok(());
    }

    info!("Adding persons.seq column and backfilling per-owner numbers");

    let mut tx = pool.begin().await?;

    sqlx::query("ALTER TABLE persons ADD COLUMN seq INTEGER")
        .execute(&mut *tx)
        .await?;

    let owners: Vec<i64> = sqlx::query_scalar(
        "SELECT DISTINCT owner_id FROM persons WHERE owner_id IS NOT NULL ORDER BY owner_id",
    )
    .fetch_all(&mut *tx)
    .await?;

    for owner_id in owners {
        let ids: Vec<i64> =
            sqlx::query_scalar("SELECT id FROM persons WHERE owner_id = ? ORDER BY id ASC")
                .bind(owner_id)
                .fetch_all(&mut *tx)
                .await?;

        for (idx, id) in ids.iter().enumerate() {
            sqlx::query("UPDATE persons SET seq = ? WHERE id = ?")
                .bind(idx as i64 + 1)
                .bind(id)
                .execute(&mut *tx)
                .await?;
        }
    }

    tx.commit().await?;
    Ok(())
}

async fn ensure_owner_seq_index(pool: &SqlitePool) -> Result<(), sqlx::Error> {
    sqlx::query(
        "CREATE UNIQUE INDEX IF NOT EXISTS idx_persons_owner_seq ON persons(owner_id, seq)",
    )
    .execute(pool)
    .await?;
    Ok(())
}

/// Column existence check via SQLite table introspection
async fn column_exists(
    pool: &SqlitePool,
    table: &str,
    column: &str,
) -> Result<bool, sqlx::Error> {
    let rows = sqlx::query(&format!("PRAGMA table_info({})", table))
        .fetch_all(pool)
        .await?;
    Ok(rows
        .iter()
        .filter_map(|r| r.try_get::<String, _>("name").ok())
        .any(|n| n == column))
}
