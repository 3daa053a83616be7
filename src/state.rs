use sqlx::SqlitePool;

/// Shared application state handed to handlers through axum.
///
/// The pool is opened once in `main`; nothing holds a process-global handle.
#[derive(Clone)]
pub struct AppState {
    pub pool: SqlitePool,
}
