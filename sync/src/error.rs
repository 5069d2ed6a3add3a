//! Error types for the sync protocol.

use thiserror::Error;

#[derive(Debug, Error)]
pub enum SyncError {
    #[error("table {0} doesn't exist !")]
    UnknownTable(String),

    #[error("column {column} is not synced for table {table}")]
    UnknownColumn { table: String, column: String },

    #[error("Unknown operator {0}")]
    UnknownOperator(String),

    #[error("Invalid filter on {column}: {reason}")]
    InvalidFilter { column: String, reason: String },

    #[error("UPDATE on table {0} has no columns to sync")]
    MissingColumns(String),

    #[error("Unsupported database: {0}")]
    UnsupportedDatabase(String),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),

    #[error("Transport error: {0}")]
    Transport(#[from] TransportError),
}

#[derive(Debug, Error)]
pub enum TransportError {
    #[error("AMQP error: {0}")]
    Amqp(#[from] lapin::Error),

    #[error("Broker did not confirm message published on {exchange}")]
    NotConfirmed { exchange: String },

    #[error("Queue {0} already has a consumer")]
    QueueBusy(String),

    #[error("Exchange {exchange} already declared as {declared}")]
    ExchangeMismatch { exchange: String, declared: String },
}

pub type Result<T> = std::result::Result<T, SyncError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn error_display() {
        assert_eq!(
            SyncError::UnknownTable("meters".into()).to_string(),
            "table meters doesn't exist !"
        );
        assert_eq!(
            SyncError::UnknownColumn {
                table: "meters".into(),
                column: "secret".into()
            }
            .to_string(),
            "column secret is not synced for table meters"
        );
        assert_eq!(
            SyncError::from(TransportError::QueueBusy("q".into())).to_string(),
            "Transport error: Queue q already has a consumer"
        );
    }
}
