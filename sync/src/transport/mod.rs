//! Message transports carrying sync requests between services.

mod amqp;
mod memory;

pub use amqp::AmqpTransport;
pub use memory::MemoryTransport;

use std::sync::Arc;

use async_trait::async_trait;
use futures::future::BoxFuture;
use myem_config::{ExchangeType, ThrottleSettings};

use crate::error::{Result, TransportError};

/// Exchange, binding and queue a service receives its messages on.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Route {
    pub exchange: String,
    pub exchange_type: ExchangeType,
    pub routing_key: String,
    pub queue: String,
}

impl Route {
    pub fn new(
        exchange: impl Into<String>,
        routing_key: impl Into<String>,
        queue: impl Into<String>,
    ) -> Self {
        Self {
            exchange: exchange.into(),
            exchange_type: ExchangeType::default(),
            routing_key: routing_key.into(),
            queue: queue.into(),
        }
    }

    /// `{name}_exchange`, `{name}_routing_key`, `{name}_queue`.
    pub fn for_service(name: &str) -> Self {
        Self::new(
            format!("{name}_exchange"),
            format!("{name}_routing_key"),
            format!("{name}_queue"),
        )
    }

    pub fn throttle(settings: &ThrottleSettings) -> Self {
        Self::new(&settings.exchange, &settings.routing_key, &settings.queue)
    }

    #[must_use]
    pub fn with_exchange_type(mut self, exchange_type: ExchangeType) -> Self {
        self.exchange_type = exchange_type;
        self
    }
}

/// Processes the body of one delivered message.
#[async_trait]
pub trait MessageHandler: Send + Sync {
    async fn handle(&self, body: &[u8]) -> Result<()>;
}

#[async_trait]
pub trait Transport: Send + Sync {
    /// Publish `body` on the route's exchange with its routing key.
    ///
    /// The exchange is declared first; the queue is not.
    async fn publish(&self, route: &Route, body: Vec<u8>) -> std::result::Result<(), TransportError>;

    /// Declare the route and feed every message of its queue to `handler`
    /// until `shutdown` resolves.
    ///
    /// Messages are acknowledged once the handler returns, whatever its outcome;
    /// handler errors are logged.
    async fn consume(
        &self,
        route: &Route,
        handler: Arc<dyn MessageHandler>,
        shutdown: BoxFuture<'static, ()>,
    ) -> std::result::Result<(), TransportError>;
}

async fn dispatch(route: &Route, handler: &dyn MessageHandler, body: &[u8]) {
    if let Err(e) = handler.handle(body).await {
        tracing::error!(queue = %route.queue, error = %e, "Message handler failed");
    }
}
