//! Rate-limited dispatch of deferred calls through a queue.
//!
//! Producers enqueue named calls with [`ThrottlePublisher::call_with_throttle`];
//! a [`ThrottleConsumer`] admits at most `max_hits_per_minute` of them per
//! minute and hands each to a [`ThrottledHandler`].

use std::num::NonZeroU32;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

use async_trait::async_trait;
use futures::future::BoxFuture;
use governor::{DefaultDirectRateLimiter, Quota, RateLimiter};
use myem_config::{ExchangeType, ThrottleSettings};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::error::Result;
use crate::transport::{AmqpTransport, MessageHandler, Route, Transport};

/// Message body: the function to call and its keyword arguments, flattened
/// into one object.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ThrottledCall {
    pub function_name: String,
    #[serde(flatten)]
    pub kwargs: Map<String, Value>,
}

#[derive(Clone)]
pub struct ThrottlePublisher {
    transport: Arc<dyn Transport>,
    route: Route,
}

impl ThrottlePublisher {
    pub fn new(transport: Arc<dyn Transport>, settings: &ThrottleSettings) -> Self {
        Self {
            transport,
            route: Route::throttle(settings),
        }
    }

    /// # Errors
    ///
    /// Fails when the broker cannot be reached.
    pub async fn connect(uri: &str, settings: &ThrottleSettings) -> Result<Self> {
        let transport = AmqpTransport::connect(uri).await?;
        Ok(Self::new(Arc::new(transport), settings))
    }

    #[must_use]
    pub fn with_exchange_type(mut self, exchange_type: ExchangeType) -> Self {
        self.route = self.route.with_exchange_type(exchange_type);
        self
    }

    pub fn route(&self) -> &Route {
        &self.route
    }

    /// Enqueue a call to `function_name`.
    ///
    /// A `function_name` key in `kwargs` is overwritten.
    ///
    /// # Errors
    ///
    /// Fails when the broker does not accept the message.
    pub async fn call_with_throttle(
        &self,
        function_name: &str,
        mut kwargs: Map<String, Value>,
    ) -> Result<()> {
        kwargs.remove("function_name");
        let call = ThrottledCall {
            function_name: function_name.to_string(),
            kwargs,
        };
        let body = serde_json::to_vec(&call)?;
        self.transport.publish(&self.route, body).await?;
        tracing::debug!(function = %function_name, "Throttled call enqueued");
        Ok(())
    }
}

/// Executes the calls admitted by a [`ThrottleConsumer`].
#[async_trait]
pub trait ThrottledHandler: Send + Sync {
    async fn throttle_call(&self, function_name: &str, kwargs: Map<String, Value>) -> Result<()>;
}

pub struct ThrottleConsumer<H> {
    handler: H,
    route: Route,
    limiter: DefaultDirectRateLimiter,
    hits: AtomicU64,
}

impl<H: ThrottledHandler> ThrottleConsumer<H> {
    /// A `max_hits_per_minute` of zero is treated as one.
    pub fn new(handler: H, settings: &ThrottleSettings) -> Self {
        let max_hits = NonZeroU32::new(settings.max_hits_per_minute).unwrap_or(NonZeroU32::MIN);
        Self {
            handler,
            route: Route::throttle(settings),
            limiter: RateLimiter::direct(Quota::per_minute(max_hits)),
            hits: AtomicU64::new(0),
        }
    }

    #[must_use]
    pub fn with_exchange_type(mut self, exchange_type: ExchangeType) -> Self {
        self.route = self.route.with_exchange_type(exchange_type);
        self
    }

    pub fn handler(&self) -> &H {
        &self.handler
    }

    pub fn route(&self) -> &Route {
        &self.route
    }

    /// Calls admitted so far.
    pub fn hits(&self) -> u64 {
        self.hits.load(Ordering::SeqCst)
    }

    /// Wait until the per-minute budget admits `call`, then run it.
    ///
    /// # Errors
    ///
    /// Returns the handler's error.
    pub async fn consume_requests_with_time_condition(&self, call: ThrottledCall) -> Result<()> {
        if self.limiter.check().is_err() {
            tracing::info!(function = %call.function_name, "Throttle budget spent, waiting");
            self.limiter.until_ready().await;
        }
        let hits = self.hits.fetch_add(1, Ordering::SeqCst) + 1;
        tracing::info!(hits, function = %call.function_name, "Throttled call admitted");

        self.handler
            .throttle_call(&call.function_name, call.kwargs)
            .await
    }
}

impl<H: ThrottledHandler + 'static> ThrottleConsumer<H> {
    /// Consume the throttle queue until `shutdown` resolves.
    ///
    /// # Errors
    ///
    /// Fails when the transport cannot declare or read the queue.
    pub async fn consume_messages(
        self: Arc<Self>,
        transport: &dyn Transport,
        shutdown: BoxFuture<'static, ()>,
    ) -> Result<()> {
        let route = self.route.clone();
        transport.consume(&route, self, shutdown).await?;
        Ok(())
    }
}

#[async_trait]
impl<H: ThrottledHandler> MessageHandler for ThrottleConsumer<H> {
    async fn handle(&self, body: &[u8]) -> Result<()> {
        let call: ThrottledCall = serde_json::from_slice(body)?;
        self.consume_requests_with_time_condition(call).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::transport::MemoryTransport;
    use serde_json::json;
    use std::time::Duration;
    use tokio::sync::Mutex;

    #[derive(Default)]
    struct Recorder {
        calls: Mutex<Vec<(String, Map<String, Value>)>>,
    }

    #[async_trait]
    impl ThrottledHandler for Recorder {
        async fn throttle_call(&self, function_name: &str, kwargs: Map<String, Value>) -> Result<()> {
            self.calls
                .lock()
                .await
                .push((function_name.to_string(), kwargs));
            Ok(())
        }
    }

    fn settings(max_hits_per_minute: u32) -> ThrottleSettings {
        ThrottleSettings {
            max_hits_per_minute,
            ..ThrottleSettings::default()
        }
    }

    fn call(name: &str) -> ThrottledCall {
        ThrottledCall {
            function_name: name.to_string(),
            kwargs: Map::new(),
        }
    }

    #[test]
    fn call_body_is_flat() {
        let mut kwargs = Map::new();
        kwargs.insert("meter_guid".into(), json!("abc"));
        let call = ThrottledCall {
            function_name: "fetch_consumption".into(),
            kwargs,
        };
        assert_eq!(
            serde_json::to_value(&call).unwrap(),
            json!({"function_name": "fetch_consumption", "meter_guid": "abc"})
        );

        let parsed: ThrottledCall =
            serde_json::from_value(json!({"function_name": "f", "a": 1, "b": [2]})).unwrap();
        assert_eq!(parsed.function_name, "f");
        assert_eq!(parsed.kwargs["a"], 1);
        assert_eq!(parsed.kwargs["b"], json!([2]));
    }

    #[tokio::test]
    async fn dispatches_to_handler_and_counts_hits() {
        let consumer = ThrottleConsumer::new(Recorder::default(), &settings(10));
        let body = br#"{"function_name": "fetch_consumption", "meter_guid": "abc"}"#;
        consumer.handle(body).await.unwrap();
        consumer.handle(body).await.unwrap();

        assert_eq!(consumer.hits(), 2);
        let calls = consumer.handler().calls.lock().await;
        assert_eq!(calls.len(), 2);
        assert_eq!(calls[0].0, "fetch_consumption");
        assert_eq!(calls[0].1["meter_guid"], "abc");
        assert!(!calls[0].1.contains_key("function_name"));
    }

    #[tokio::test]
    async fn waits_once_budget_is_spent() {
        let consumer = ThrottleConsumer::new(Recorder::default(), &settings(2));
        consumer
            .consume_requests_with_time_condition(call("a"))
            .await
            .unwrap();
        consumer
            .consume_requests_with_time_condition(call("b"))
            .await
            .unwrap();

        let third = tokio::time::timeout(
            Duration::from_millis(100),
            consumer.consume_requests_with_time_condition(call("c")),
        )
        .await;
        assert!(third.is_err());
        assert_eq!(consumer.hits(), 2);
    }

    #[tokio::test]
    async fn zero_budget_admits_one_call() {
        let consumer = ThrottleConsumer::new(Recorder::default(), &settings(0));
        consumer
            .consume_requests_with_time_condition(call("a"))
            .await
            .unwrap();
        assert_eq!(consumer.hits(), 1);
    }

    #[tokio::test]
    async fn malformed_body_is_an_error() {
        let consumer = ThrottleConsumer::new(Recorder::default(), &settings(10));
        assert!(consumer.handle(b"{\"kwargs\": 1}").await.is_err());
        assert_eq!(consumer.hits(), 0);
    }

    #[tokio::test]
    async fn publisher_to_consumer_over_memory_transport() {
        let transport = Arc::new(MemoryTransport::new());
        let settings = settings(10);
        let consumer = Arc::new(
            ThrottleConsumer::new(Recorder::default(), &settings)
                .with_exchange_type(ExchangeType::Fanout),
        );
        let publisher = ThrottlePublisher::new(transport.clone(), &settings)
            .with_exchange_type(ExchangeType::Fanout);
        assert_eq!(publisher.route(), consumer.route());
        transport.declare(consumer.route()).await.unwrap();

        let (stop_tx, stop_rx) = tokio::sync::oneshot::channel::<()>();
        let worker = {
            let transport = transport.clone();
            let consumer = consumer.clone();
            tokio::spawn(async move {
                let shutdown: BoxFuture<'static, ()> = Box::pin(async move {
                    let _ = stop_rx.await;
                });
                consumer.consume_messages(transport.as_ref(), shutdown).await
            })
        };

        let mut kwargs = Map::new();
        kwargs.insert("meter_guid".into(), json!("abc"));
        publisher
            .call_with_throttle("fetch_consumption", kwargs)
            .await
            .unwrap();

        for _ in 0..100 {
            if consumer.hits() == 1 {
                break;
            }
            tokio::time::sleep(Duration::from_millis(10)).await;
        }
        assert_eq!(consumer.hits(), 1);

        let _ = stop_tx.send(());
        worker.await.unwrap().unwrap();

        let calls = consumer.handler().calls.lock().await;
        assert_eq!(calls[0].0, "fetch_consumption");
        assert_eq!(calls[0].1["meter_guid"], "abc");
    }
}
