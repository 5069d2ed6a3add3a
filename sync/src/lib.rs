//! MyEM Sync
//!
//! Row-level propagation of UPDATE and DELETE operations between service
//! databases through a message broker.
//!
//! A service changing rows that other services copy publishes a
//! [`SyncRequest`] with [`DbSyncPublisher::sync_model`]. The owning service
//! runs a [`DbSyncConsumer`] that turns each row operation into one SQL
//! statement on its [`SyncStore`].
//!
//! Delivery is at most once: no ordering, retry or idempotency guarantee is
//! made, and failures are only reported.
//!
//! The crate also carries the request [`throttle`](crate::ThrottleConsumer)
//! queue used to spread calls to rate-limited upstream APIs.

mod consumer;
mod error;
mod filter;
mod protocol;
mod publisher;
mod store;
mod throttle;
mod transport;

#[cfg(feature = "testutil")]
pub mod testutil;

pub use consumer::{DbSyncConsumer, SyncReport};
pub use error::{Result, SyncError, TransportError};
pub use filter::{
    delete_statement, format_sql_filter, update_statement, Column, Dialect, Predicate, SqlValue,
    Statement, SyncModel,
};
pub use protocol::{FilterOp, Identifier, RowToSync, SyncOp, SyncRequest};
pub use publisher::DbSyncPublisher;
pub use store::{DatabaseStore, SyncStore};
#[cfg(feature = "postgres")]
pub use store::PgSyncStore;
#[cfg(feature = "sqlite")]
pub use store::SqliteSyncStore;
pub use throttle::{ThrottleConsumer, ThrottlePublisher, ThrottledCall, ThrottledHandler};
pub use transport::{AmqpTransport, MemoryTransport, MessageHandler, Route, Transport};
