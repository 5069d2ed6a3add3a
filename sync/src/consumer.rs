//! Applying sync requests to the local database.

use std::collections::BTreeMap;
use std::sync::Arc;

use async_trait::async_trait;
use futures::future::BoxFuture;
use myem_config::ExchangeType;

use crate::error::{Result, SyncError};
use crate::filter::{delete_statement, format_sql_filter, update_statement, SyncModel};
use crate::protocol::{RowToSync, SyncOp, SyncRequest};
use crate::store::SyncStore;
use crate::transport::{MessageHandler, Route, Transport};

/// Rows affected per table by one sync request.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SyncReport {
    pub rows_affected: BTreeMap<String, u64>,
}

impl SyncReport {
    pub fn total(&self) -> u64 {
        self.rows_affected.values().sum()
    }
}

/// Receives sync requests for the tables of one service.
pub struct DbSyncConsumer<S> {
    name: String,
    models: Vec<SyncModel>,
    store: S,
    exchange_type: ExchangeType,
}

impl<S: SyncStore> DbSyncConsumer<S> {
    pub fn new(name: impl Into<String>, store: S) -> Self {
        Self {
            name: name.into(),
            models: Vec::new(),
            store,
            exchange_type: ExchangeType::default(),
        }
    }

    /// Exchange type of the service route, `BrokerSettings::exchange_type`.
    #[must_use]
    pub fn with_exchange_type(mut self, exchange_type: ExchangeType) -> Self {
        self.exchange_type = exchange_type;
        self
    }

    #[must_use]
    pub fn with_model(mut self, model: SyncModel) -> Self {
        self.models.push(model);
        self
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn store(&self) -> &S {
        &self.store
    }

    /// Route the service's publishers send to.
    pub fn route(&self) -> Route {
        Route::for_service(&self.name).with_exchange_type(self.exchange_type)
    }

    pub fn get_model(&self, table_name: &str) -> Option<&SyncModel> {
        self.models.iter().find(|model| model.table() == table_name)
    }

    /// Apply every row operation of `request`.
    ///
    /// Tables are processed in name order and each statement is committed on
    /// its own: an error leaves the operations applied before it in place.
    ///
    /// # Errors
    ///
    /// Fails on the first unknown table, invalid filter or database error.
    #[tracing::instrument(skip(self, request), fields(service = %self.name))]
    pub async fn sync_db_model(&self, request: &SyncRequest) -> Result<SyncReport> {
        tracing::info!("db sync request has arrived");
        let mut report = SyncReport::default();

        for (table_name, rows) in request {
            let model = self
                .get_model(table_name)
                .ok_or_else(|| SyncError::UnknownTable(table_name.clone()))?;
            tracing::info!(table = %table_name, rows = rows.len(), "Syncing table");

            let mut affected = 0;
            for row in rows {
                affected += self.sync_row(model, row).await?;
            }
            report.rows_affected.insert(table_name.clone(), affected);
        }

        Ok(report)
    }

    async fn sync_row(&self, model: &SyncModel, row: &RowToSync) -> Result<u64> {
        let predicates = format_sql_filter(model, &row.identifiers)?;
        if predicates.is_empty() {
            tracing::warn!(table = %model.table(), op = ?row.op, "No identifiers, the whole table is targeted");
        }

        let dialect = self.store.dialect();
        let statement = match row.op {
            SyncOp::Delete => delete_statement(model, &predicates, dialect),
            SyncOp::Update => {
                let columns = row
                    .columns_to_sync
                    .as_ref()
                    .ok_or_else(|| SyncError::MissingColumns(model.table().to_string()))?;
                update_statement(model, columns, &predicates, dialect)?
            }
        };

        let affected = self.store.execute(&statement).await?;
        tracing::debug!(table = %model.table(), op = ?row.op, affected, "Row operation applied");
        Ok(affected)
    }
}

impl<S: SyncStore + 'static> DbSyncConsumer<S> {
    /// Consume the service's queue until `shutdown` resolves.
    ///
    /// # Errors
    ///
    /// Fails when the transport cannot declare or read the queue.
    pub async fn consume_messages(
        self: Arc<Self>,
        transport: &dyn Transport,
        shutdown: BoxFuture<'static, ()>,
    ) -> Result<()> {
        let route = self.route();
        transport.consume(&route, self, shutdown).await?;
        Ok(())
    }
}

#[async_trait]
impl<S: SyncStore> MessageHandler for DbSyncConsumer<S> {
    async fn handle(&self, body: &[u8]) -> Result<()> {
        let request: SyncRequest = serde_json::from_slice(body)?;
        let report = self.sync_db_model(&request).await?;
        tracing::info!(rows = report.total(), "db sync request applied");
        Ok(())
    }
}
