// Batch events
//
// Every committed batch mutation is published to a sink: snapshots and
// deletions for the persistence collaborator, detach notices for the order
// store, and readiness notices for the admin notification mechanism.

use chrono::NaiveDate;
use rust_decimal::Decimal;
use serde::Serialize;
use tokio::sync::mpsc::UnboundedSender;
use uuid::Uuid;

use crate::batches::Batch;
use crate::pricing::format_naira;

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "event", rename_all = "snake_case")]
pub enum BatchEvent {
    /// New state of a batch after a committed mutation
    Saved { batch: Batch },

    /// The batch lost its last order and no longer exists
    Deleted { batch_id: Uuid },

    /// The order left its batch; its stored `batch_id` must be cleared
    OrderDetached {
        order_id: String,
        batch_id: Option<Uuid>,
    },

    /// Fired once per pending → ready transition
    BecameReady {
        batch_id: Uuid,
        date: NaiveDate,
        slot: String,
        estate_or_hotel: String,
        shop_id: String,
        order_count: u32,
        total_value: Decimal,
    },
}

impl BatchEvent {
    pub fn saved(batch: &Batch) -> Self {
        BatchEvent::Saved {
            batch: batch.clone(),
        }
    }

    pub fn became_ready(batch: &Batch) -> Self {
        BatchEvent::BecameReady {
            batch_id: batch.id,
            date: batch.date,
            slot: batch.slot.clone(),
            estate_or_hotel: batch.estate_or_hotel.clone(),
            shop_id: batch.shop_id.clone(),
            order_count: batch.order_count,
            total_value: batch.total_value,
        }
    }

    pub fn order_detached(order_id: &str) -> Self {
        BatchEvent::OrderDetached {
            order_id: order_id.to_string(),
            batch_id: None,
        }
    }

    pub fn name(&self) -> &'static str {
        match self {
            BatchEvent::Saved { .. } => "saved",
            BatchEvent::Deleted { .. } => "deleted",
            BatchEvent::OrderDetached { .. } => "order_detached",
            BatchEvent::BecameReady { .. } => "became_ready",
        }
    }
}

/// Consumer of batch events
pub trait BatchEventSink: Send + Sync {
    fn publish(&self, event: BatchEvent);
}

/// Sink that only logs events
#[derive(Debug, Clone, Default)]
pub struct TracingSink;

impl BatchEventSink for TracingSink {
    fn publish(&self, event: BatchEvent) {
        match &event {
            BatchEvent::Saved { batch } => tracing::debug!(
                "Batch {} saved: {} orders, {} ({})",
                batch.id,
                batch.order_count,
                format_naira(batch.total_value),
                batch.status
            ),
            BatchEvent::Deleted { batch_id } => {
                tracing::debug!("Batch {} deleted", batch_id)
            }
            BatchEvent::OrderDetached { order_id, .. } => {
                tracing::debug!("Order {} detached from its batch", order_id)
            }
            BatchEvent::BecameReady {
                batch_id,
                estate_or_hotel,
                slot,
                order_count,
                ..
            } => tracing::info!(
                "Batch {} for {} at {} is ready with {} orders",
                batch_id,
                estate_or_hotel,
                slot,
                order_count
            ),
        }
    }
}

/// Sink that forwards events to a background consumer
#[derive(Debug, Clone)]
pub struct ChannelSink {
    tx: UnboundedSender<BatchEvent>,
}

impl ChannelSink {
    pub fn new(tx: UnboundedSender<BatchEvent>) -> Self {
        Self { tx }
    }
}

impl BatchEventSink for ChannelSink {
    fn publish(&self, event: BatchEvent) {
        let name = event.name();
        if self.tx.send(event).is_err() {
            tracing::error!("Batch event consumer is gone, dropped {} event", name);
        }
    }
}
