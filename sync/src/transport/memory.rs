//! In-process broker with AMQP routing semantics.
//!
//! Exchanges route to bound queues by exchange type: exact routing key for
//! direct, every binding for fanout, `*`/`#` patterns for topic. Messages
//! published before any queue is bound are dropped, as a broker would.

use std::collections::{BTreeSet, HashMap};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use async_trait::async_trait;
use futures::future::BoxFuture;
use myem_config::ExchangeType;
use tokio::sync::mpsc;

use super::{dispatch, MessageHandler, Route, Transport};
use crate::error::TransportError;

type Receiver = mpsc::UnboundedReceiver<Vec<u8>>;

#[derive(Default)]
pub struct MemoryTransport {
    broker: Mutex<Broker>,
}

#[derive(Default)]
struct Broker {
    exchanges: HashMap<String, Exchange>,
    queues: HashMap<String, Queue>,
}

struct Exchange {
    kind: ExchangeType,
    bindings: Vec<Binding>,
}

struct Binding {
    routing_key: String,
    queue: String,
}

struct Queue {
    sender: mpsc::UnboundedSender<Vec<u8>>,
    receiver: Option<Receiver>,
}

impl Broker {
    fn declare_exchange(&mut self, route: &Route) -> Result<&mut Exchange, TransportError> {
        let exchange = self
            .exchanges
            .entry(route.exchange.clone())
            .or_insert_with(|| Exchange {
                kind: route.exchange_type,
                bindings: Vec::new(),
            });
        if exchange.kind != route.exchange_type {
            return Err(TransportError::ExchangeMismatch {
                exchange: route.exchange.clone(),
                declared: exchange.kind.as_str().to_string(),
            });
        }
        Ok(exchange)
    }

    fn declare(&mut self, route: &Route) -> Result<(), TransportError> {
        let exchange = self.declare_exchange(route)?;
        let bound = exchange
            .bindings
            .iter()
            .any(|b| b.queue == route.queue && b.routing_key == route.routing_key);
        if !bound {
            exchange.bindings.push(Binding {
                routing_key: route.routing_key.clone(),
                queue: route.queue.clone(),
            });
        }

        self.queues.entry(route.queue.clone()).or_insert_with(|| {
            let (sender, receiver) = mpsc::unbounded_channel();
            Queue {
                sender,
                receiver: Some(receiver),
            }
        });
        Ok(())
    }
}

/// A queue's receiver, held by its consumer and handed back to the queue on
/// drop, including when the consuming task is aborted.
struct Lease<'a> {
    broker: &'a Mutex<Broker>,
    queue: String,
    receiver: Option<Receiver>,
}

impl Lease<'_> {
    async fn recv(&mut self) -> Option<Vec<u8>> {
        match self.receiver.as_mut() {
            Some(receiver) => receiver.recv().await,
            None => None,
        }
    }
}

impl Drop for Lease<'_> {
    fn drop(&mut self) {
        let Some(receiver) = self.receiver.take() else {
            return;
        };
        let mut broker = self.broker.lock().unwrap_or_else(PoisonError::into_inner);
        if let Some(queue) = broker.queues.get_mut(&self.queue) {
            queue.receiver = Some(receiver);
        }
    }
}

impl MemoryTransport {
    pub fn new() -> Self {
        Self::default()
    }

    /// Declare the exchange and queue of `route` and bind them.
    pub async fn declare(&self, route: &Route) -> Result<(), TransportError> {
        self.broker().declare(route)
    }

    fn broker(&self) -> MutexGuard<'_, Broker> {
        self.broker.lock().unwrap_or_else(PoisonError::into_inner)
    }

    fn lease(&self, route: &Route) -> Result<Lease<'_>, TransportError> {
        let mut broker = self.broker();
        broker.declare(route)?;
        let receiver = broker
            .queues
            .get_mut(&route.queue)
            .and_then(|queue| queue.receiver.take())
            .ok_or_else(|| TransportError::QueueBusy(route.queue.clone()))?;
        Ok(Lease {
            broker: &self.broker,
            queue: route.queue.clone(),
            receiver: Some(receiver),
        })
    }
}

#[async_trait]
impl Transport for MemoryTransport {
    async fn publish(&self, route: &Route, body: Vec<u8>) -> Result<(), TransportError> {
        let mut broker = self.broker();
        let exchange = broker.declare_exchange(route)?;

        // One copy per queue, however many of its bindings match.
        let targets: BTreeSet<String> = exchange
            .bindings
            .iter()
            .filter(|b| binding_matches(exchange.kind, &b.routing_key, &route.routing_key))
            .map(|b| b.queue.clone())
            .collect();

        if targets.is_empty() {
            tracing::debug!(exchange = %route.exchange, routing_key = %route.routing_key, "No queue bound, message dropped");
            return Ok(());
        }

        for name in targets {
            if let Some(queue) = broker.queues.get(&name) {
                if queue.sender.send(body.clone()).is_err() {
                    tracing::debug!(queue = %name, "Queue closed, message dropped");
                }
            }
        }
        Ok(())
    }

    async fn consume(
        &self,
        route: &Route,
        handler: Arc<dyn MessageHandler>,
        mut shutdown: BoxFuture<'static, ()>,
    ) -> Result<(), TransportError> {
        let mut lease = self.lease(route)?;

        loop {
            tokio::select! {
                () = &mut shutdown => break,
                message = lease.recv() => match message {
                    Some(body) => dispatch(route, handler.as_ref(), &body).await,
                    None => break,
                },
            }
        }
        Ok(())
    }
}

fn binding_matches(kind: ExchangeType, binding_key: &str, routing_key: &str) -> bool {
    match kind {
        ExchangeType::Direct => binding_key == routing_key,
        ExchangeType::Fanout => true,
        ExchangeType::Topic => {
            let pattern: Vec<&str> = binding_key.split('.').collect();
            let words: Vec<&str> = routing_key.split('.').collect();
            topic_matches(&pattern, &words)
        }
    }
}

fn topic_matches(pattern: &[&str], words: &[&str]) -> bool {
    match (pattern.split_first(), words.split_first()) {
        (None, None) => true,
        (Some((&"#", rest)), _) => {
            topic_matches(rest, words) || (!words.is_empty() && topic_matches(pattern, &words[1..]))
        }
        (Some((&expected, rest)), Some((&word, remaining))) => {
            (expected == "*" || expected == word) && topic_matches(rest, remaining)
        }
        _ => false,
    }
}
