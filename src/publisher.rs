//! Publishes order events to NATS.

use tracing::{debug, warn};

use crate::domain::events::OrderEvent;

#[derive(Clone)]
pub struct EventPublisher {
    client: async_nats::Client,
    subject_prefix: String,
}

impl EventPublisher {
    pub fn new(client: async_nats::Client, subject_prefix: impl Into<String>) -> Self {
        Self { client, subject_prefix: subject_prefix.into() }
    }

    pub fn subject_for(&self, event: &OrderEvent) -> String { subject(&self.subject_prefix, event) }

    /// Best effort: the order is already stored, so failures are only logged.
    pub async fn publish(&self, events: Vec<OrderEvent>) {
        for event in events {
            let subject = self.subject_for(&event);
            let payload = match serde_json::to_vec(&event) {
                Ok(p) => p,
                Err(e) => {
                    warn!(%subject, error = %e, "could not encode order event");
                    continue;
                }
            };
            match self.client.publish(subject.clone(), payload.into()).await {
                Ok(()) => debug!(%subject, order_id = %event.order_id(), "order event published"),
                Err(e) => warn!(%subject, order_id = %event.order_id(), error = %e, "order event not published"),
            }
        }
    }
}

fn subject(prefix: &str, event: &OrderEvent) -> String { format!("{}.{}", prefix, event.name()) }
