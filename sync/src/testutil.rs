//! Helpers for testing services that consume sync requests.

use sqlx::sqlite::SqlitePoolOptions;

use crate::error::Result;
use crate::store::SqliteSyncStore;

/// A private in-memory `SQLite` database with `schema` applied in order.
///
/// The pool keeps a single connection for its whole life, so every statement
/// sees the same database.
///
/// # Errors
///
/// Fails when the database cannot be opened or a schema statement is rejected.
pub async fn sqlite_store(schema: &[&str]) -> Result<SqliteSyncStore> {
    let pool = SqlitePoolOptions::new()
        .max_connections(1)
        .idle_timeout(None)
        .max_lifetime(None)
        .connect("sqlite::memory:")
        .await?;

    for statement in schema {
        sqlx::query(statement).execute(&pool).await?;
    }
    tracing::debug!(statements = schema.len(), "Test database ready");
    Ok(SqliteSyncStore::from_pool(pool))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::filter::{Dialect, Statement};
    use crate::store::SyncStore;

    #[tokio::test]
    async fn schema_is_applied() {
        let store = sqlite_store(&["CREATE TABLE meters (id INTEGER PRIMARY KEY, guid TEXT)"])
            .await
            .unwrap();
        assert_eq!(store.dialect(), Dialect::Sqlite);

        let inserted = store
            .execute(&Statement {
                sql: "INSERT INTO meters (guid) VALUES ('abc'), ('def')".into(),
                params: Vec::new(),
            })
            .await
            .unwrap();
        assert_eq!(inserted, 2);
    }

    #[tokio::test]
    async fn invalid_schema_is_an_error() {
        assert!(sqlite_store(&["CREATE TABLE"]).await.is_err());
    }
}
