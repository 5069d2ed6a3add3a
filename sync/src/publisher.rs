//! Publishing sync requests to the service owning the tables.

use std::sync::Arc;

use myem_config::ExchangeType;

use crate::error::Result;
use crate::protocol::SyncRequest;
use crate::transport::{AmqpTransport, Route, Transport};

/// Sends sync requests after local rows were changed, so that services
/// holding copies of those rows can update or delete them.
#[derive(Clone)]
pub struct DbSyncPublisher {
    transport: Arc<dyn Transport>,
    exchange_type: ExchangeType,
}

impl DbSyncPublisher {
    pub fn new(transport: Arc<dyn Transport>) -> Self {
        Self {
            transport,
            exchange_type: ExchangeType::default(),
        }
    }

    /// Publisher over an AMQP connection to `uri`.
    ///
    /// # Errors
    ///
    /// Fails when the broker cannot be reached.
    pub async fn connect(uri: &str) -> Result<Self> {
        let transport = AmqpTransport::connect(uri).await?;
        Ok(Self::new(Arc::new(transport)))
    }

    #[must_use]
    pub fn with_exchange_type(mut self, exchange_type: ExchangeType) -> Self {
        self.exchange_type = exchange_type;
        self
    }

    pub fn route(&self, service_name: &str) -> Route {
        Route::for_service(service_name).with_exchange_type(self.exchange_type)
    }

    /// Publish `data` to `service_name`.
    ///
    /// # Errors
    ///
    /// Fails when the message cannot be serialized or the broker does not
    /// accept it.
    #[tracing::instrument(skip(self, data), fields(tables = data.len()))]
    pub async fn sync_model(&self, service_name: &str, data: &SyncRequest) -> Result<()> {
        let body = serde_json::to_vec(data)?;
        tracing::info!("Sending sync request");
        self.transport
            .publish(&self.route(service_name), body)
            .await?;
        Ok(())
    }
}
