//! `SQLite` store.

use async_trait::async_trait;
use sqlx::{sqlite::SqlitePoolOptions, SqlitePool};

use super::SyncStore;
use crate::error::Result;
use crate::filter::{Dialect, SqlValue, Statement};

#[derive(Clone)]
pub struct SqliteSyncStore {
    pool: SqlitePool,
}

impl SqliteSyncStore {
    pub async fn connect(dsn: &str) -> Result<Self> {
        let pool = SqlitePoolOptions::new()
            .max_connections(5)
            .connect(dsn)
            .await?;
        Ok(Self { pool })
    }

    pub fn from_pool(pool: SqlitePool) -> Self {
        Self { pool }
    }

    pub fn pool(&self) -> &SqlitePool {
        &self.pool
    }
}

#[async_trait]
impl SyncStore for SqliteSyncStore {
    fn dialect(&self) -> Dialect {
        Dialect::Sqlite
    }

    async fn execute(&self, statement: &Statement) -> Result<u64> {
        let mut query = sqlx::query(&statement.sql);
        for param in &statement.params {
            query = match param {
                SqlValue::Null => query.bind(None::<String>),
                SqlValue::Bool(b) => query.bind(*b),
                SqlValue::Int(i) => query.bind(*i),
                SqlValue::Float(f) => query.bind(*f),
                SqlValue::Text(s) => query.bind(s.as_str()),
            };
        }
        let result = query.execute(&self.pool).await?;
        Ok(result.rows_affected())
    }
}
