// ============================
// backend-lib/src/events/mod.rs
// ============================
//! In-process event bus with at-least-once delivery.
//!
//! Publishers push JSON payloads onto named queues. A [`Consumer`] drains one
//! queue, running its handler for every delivery in a separate task: success
//! acks, failure or panic nacks and the delivery is redelivered with a bumped
//! attempt counter until the redelivery budget is spent, at which point it is
//! dead-lettered.
use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use dashmap::DashMap;
use metrics::counter;
use serde::{de::DeserializeOwned, Serialize};
use thiserror::Error;
use tokio::{
    sync::{mpsc, watch},
    task::JoinHandle,
};

use crate::metrics::{EVENT_ACKED, EVENT_DEAD_LETTERED, EVENT_NACKED, EVENT_PUBLISHED};

#[derive(Error, Debug)]
pub enum EventError {
    #[error("queue `{0}` is not declared")]
    UnknownQueue(String),

    #[error("queue `{0}` already has a consumer")]
    AlreadyConsumed(String),

    #[error("queue `{0}` is closed")]
    Closed(String),

    #[error("failed to encode event: {0}")]
    Encode(#[from] serde_json::Error),
}

/// A message handed to a consumer
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Delivery {
    pub queue: String,
    pub payload: Vec<u8>,
    /// 1 for the first delivery, incremented on every redelivery
    pub attempt: u32,
}

impl Delivery {
    /// Decode the JSON payload
    pub fn decode<T: DeserializeOwned>(&self) -> Result<T, serde_json::Error> {
        serde_json::from_slice(&self.payload)
    }
}

/// Publishing side of the bus
#[async_trait]
pub trait EventPublisher: Send + Sync {
    async fn publish(&self, queue: &str, payload: Vec<u8>) -> Result<(), EventError>;
}

/// Serialize `event` as JSON and publish it
pub async fn publish_json<T: Serialize + Sync>(
    publisher: &dyn EventPublisher,
    queue: &str,
    event: &T,
) -> Result<(), EventError> {
    let payload = serde_json::to_vec(event)?;
    publisher.publish(queue, payload).await
}

/// Consuming side: processes one delivery.
///
/// `Ok` acks. `Err` nacks and asks for redelivery.
#[async_trait]
pub trait DeliveryHandler: Send + Sync + 'static {
    async fn handle(&self, delivery: &Delivery) -> anyhow::Result<()>;
}

struct Queue {
    tx: mpsc::UnboundedSender<Delivery>,
    rx: Mutex<Option<mpsc::UnboundedReceiver<Delivery>>>,
}

/// Channel-backed broker; one unbounded channel per declared queue
#[derive(Clone, Default)]
pub struct MemoryBroker {
    queues: Arc<DashMap<String, Queue>>,
    dead_letters: Arc<Mutex<Vec<Delivery>>>,
}

impl MemoryBroker {
    pub fn new() -> Self {
        Self::default()
    }

    /// Declare `queue`; declaring twice is a no-op
    pub fn declare_queue(&self, queue: &str) {
        self.queues.entry(queue.to_string()).or_insert_with(|| {
            let (tx, rx) = mpsc::unbounded_channel();
            Queue {
                tx,
                rx: Mutex::new(Some(rx)),
            }
        });
    }

    /// Take the receiving end of `queue`; a queue has at most one consumer
    pub fn consume(&self, queue: &str) -> Result<mpsc::UnboundedReceiver<Delivery>, EventError> {
        let entry = self
            .queues
            .get(queue)
            .ok_or_else(|| EventError::UnknownQueue(queue.to_string()))?;
        let taken = entry
            .rx
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
            .take();
        taken.ok_or_else(|| EventError::AlreadyConsumed(queue.to_string()))
    }

    /// Put a delivery back on its queue
    pub fn requeue(&self, delivery: Delivery) -> Result<(), EventError> {
        self.send(delivery)
    }

    fn send(&self, delivery: Delivery) -> Result<(), EventError> {
        let entry = self
            .queues
            .get(&delivery.queue)
            .ok_or_else(|| EventError::UnknownQueue(delivery.queue.clone()))?;
        entry
            .tx
            .send(delivery)
            .map_err(|e| EventError::Closed(e.0.queue))
    }

    fn dead_letter(&self, delivery: Delivery) {
        self.dead_letters
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
            .push(delivery);
    }

    /// Deliveries that exhausted their redelivery budget
    pub fn dead_letters(&self) -> Vec<Delivery> {
        self.dead_letters
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
            .clone()
    }
}

#[async_trait]
impl EventPublisher for MemoryBroker {
    async fn publish(&self, queue: &str, payload: Vec<u8>) -> Result<(), EventError> {
        self.send(Delivery {
            queue: queue.to_string(),
            payload,
            attempt: 1,
        })?;
        counter!(EVENT_PUBLISHED).increment(1);
        Ok(())
    }
}

/// Drains one queue through a [`DeliveryHandler`]
pub struct Consumer {
    broker: MemoryBroker,
    queue: String,
    handler: Arc<dyn DeliveryHandler>,
    max_redeliveries: u32,
}

impl Consumer {
    pub fn new(
        broker: MemoryBroker,
        queue: impl Into<String>,
        handler: Arc<dyn DeliveryHandler>,
        max_redeliveries: u32,
    ) -> Self {
        Self {
            broker,
            queue: queue.into(),
            handler,
            max_redeliveries,
        }
    }

    /// Start consuming until `shutdown` flips to `true` or its sender is dropped
    pub fn spawn(self, mut shutdown: watch::Receiver<bool>) -> Result<JoinHandle<()>, EventError> {
        let mut rx = self.broker.consume(&self.queue)?;
        tracing::info!(queue = %self.queue, "consumer started");

        Ok(tokio::spawn(async move {
            loop {
                tokio::select! {
                    changed = shutdown.changed() => {
                        if changed.is_err() || *shutdown.borrow() {
                            break;
                        }
                    }
                    next = rx.recv() => match next {
                        Some(delivery) => self.process(delivery).await,
                        None => {
                            tracing::warn!(queue = %self.queue, "queue closed");
                            break;
                        }
                    },
                }
            }
            tracing::info!(queue = %self.queue, "consumer stopped");
        }))
    }

    async fn process(&self, delivery: Delivery) {
        let handler = Arc::clone(&self.handler);
        let task_delivery = delivery.clone();
        // A panicking handler surfaces as a JoinError instead of killing the loop
        let outcome = tokio::spawn(async move { handler.handle(&task_delivery).await }).await;

        match outcome {
            Ok(Ok(())) => {
                counter!(EVENT_ACKED).increment(1);
                tracing::debug!(queue = %delivery.queue, attempt = delivery.attempt, "delivery acked");
            },
            Ok(Err(err)) => self.nack(delivery, format!("{err:#}")),
            Err(join_err) => self.nack(delivery, format!("handler panicked: {join_err}")),
        }
    }

    fn nack(&self, delivery: Delivery, reason: String) {
        counter!(EVENT_NACKED).increment(1);

        if delivery.attempt > self.max_redeliveries {
            counter!(EVENT_DEAD_LETTERED).increment(1);
            tracing::error!(
                queue = %delivery.queue,
                attempt = delivery.attempt,
                reason = %reason,
                "redelivery budget exhausted, dead-lettering"
            );
            self.broker.dead_letter(delivery);
            return;
        }

        tracing::warn!(
            queue = %delivery.queue,
            attempt = delivery.attempt,
            reason = %reason,
            "delivery nacked, requeueing"
        );
        let redelivery = Delivery {
            attempt: delivery.attempt + 1,
            ..delivery
        };
        if let Err(err) = self.broker.requeue(redelivery) {
            tracing::error!(error = %err, "failed to requeue delivery");
        }
    }
}
