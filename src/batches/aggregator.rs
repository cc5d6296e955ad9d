// Batch Aggregator
//
// Groups orders into delivery batches keyed by (date, slot, estate/hotel, shop)
// and drives the batch lifecycle. Every mutation is an optimistic
// read-modify-compare-and-swap against the store, retried a bounded number of
// times on conflict, so concurrent orders for the same key never lose updates.
// Commits and their events go out under one guard, so sinks see snapshots in
// commit order.

use std::sync::atomic::{AtomicU32, Ordering};
use std::sync::{Arc, Mutex};

use chrono::Utc;
use uuid::Uuid;

use crate::batches::{
    Batch, BatchError, BatchEvent, BatchEventSink, BatchFilter, BatchKey, BatchMetrics,
    BatchResult, BatchStatus, BatchStatusMachine, BatchStore,
};
use crate::orders::Order;
use crate::pricing::format_naira;

/// Default number of orders before a batch is ready
pub const DEFAULT_BATCH_THRESHOLD: u32 = 5;

/// Default bound on optimistic update attempts
pub const DEFAULT_MAX_ATTEMPTS: u32 = 3;

/// Batch aggregation settings
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BatchConfig {
    pub default_threshold: u32,
    pub max_attempts: u32,
}

impl Default for BatchConfig {
    fn default() -> Self {
        Self {
            default_threshold: DEFAULT_BATCH_THRESHOLD,
            max_attempts: DEFAULT_MAX_ATTEMPTS,
        }
    }
}

/// Store write requested by a plan
enum Write {
    Keep,
    Put(Batch),
    Delete,
}

/// Outcome of planning one mutation against the current batch state
struct Plan<T> {
    write: Write,
    events: Vec<BatchEvent>,
    output: T,
}

impl<T> Plan<T> {
    fn unchanged(output: T) -> Self {
        Self {
            write: Write::Keep,
            events: Vec::new(),
            output,
        }
    }
}

/// Maintains the batch collection and enforces assignment and lifecycle rules
pub struct BatchAggregator {
    store: Arc<dyn BatchStore>,
    sink: Arc<dyn BatchEventSink>,
    metrics: BatchMetrics,
    default_threshold: AtomicU32,
    max_attempts: u32,
    commit: Mutex<()>,
}

impl BatchAggregator {
    pub fn new(
        store: Arc<dyn BatchStore>,
        sink: Arc<dyn BatchEventSink>,
        config: BatchConfig,
    ) -> Self {
        Self {
            store,
            sink,
            metrics: BatchMetrics::new(),
            default_threshold: AtomicU32::new(config.default_threshold.max(1)),
            max_attempts: config.max_attempts.max(1),
            commit: Mutex::new(()),
        }
    }

    pub fn metrics(&self) -> &BatchMetrics {
        &self.metrics
    }

    pub fn default_threshold(&self) -> u32 {
        self.default_threshold.load(Ordering::Relaxed)
    }

    /// Change the threshold given to batches created from now on.
    ///
    /// Existing batches keep the threshold they were created with.
    pub fn set_default_threshold(&self, threshold: u32) -> BatchResult<()> {
        if threshold == 0 {
            return Err(BatchError::InvalidInput(
                "batch threshold must be at least 1".to_string(),
            ));
        }
        self.default_threshold.store(threshold, Ordering::Relaxed);
        tracing::info!("Default batch threshold set to {}", threshold);
        Ok(())
    }

    /// Add an order to the batch for its (date, slot, estate/hotel, shop) key,
    /// creating the batch when the key is new.
    ///
    /// Re-assigning an order that is already a member is a no-op.
    ///
    /// # Errors
    ///
    /// - [`BatchError::OrderAlreadyAssigned`] if `order.batch_id` names another batch
    /// - [`BatchError::InvalidTransition`] if the batch already has a driver
    /// - [`BatchError::InvalidInput`] for a negative total or blank key fields
    /// - [`BatchError::ConcurrencyConflict`] when retries run out
    pub fn assign_order_to_batch(&self, order: &Order) -> BatchResult<Batch> {
        let _timer = self.metrics.start_operation("assign");
        validate_order(order)?;

        let key = order.batch_key();
        let threshold = self.default_threshold();

        let batch = self.update_with_retry(&key, |current| {
            let mut created = false;
            let mut batch = match (current, order.batch_id) {
                (Some(batch), Some(assigned)) if batch.id != assigned => {
                    return Err(BatchError::OrderAlreadyAssigned {
                        order_id: order.id.clone(),
                        batch_id: assigned,
                    })
                }
                (None, Some(assigned)) => {
                    return Err(BatchError::OrderAlreadyAssigned {
                        order_id: order.id.clone(),
                        batch_id: assigned,
                    })
                }
                (Some(batch), _) => batch,
                (None, None) => {
                    created = true;
                    Batch::new(Uuid::new_v4(), &key, threshold, Utc::now())
                }
            };

            if batch.contains(&order.id) {
                return Ok(Plan::unchanged((batch, false, false)));
            }

            if !batch.status.accepts_orders() {
                return Err(BatchError::InvalidTransition(format!(
                    "batch {} is {} and no longer accepts orders",
                    batch.id, batch.status
                )));
            }

            batch.add_member(&order.id, order.total)?;
            batch.touch(Utc::now());

            let mut events = Vec::new();
            let became_ready = batch.status == BatchStatus::Pending && batch.meets_threshold();
            if became_ready {
                batch.status = BatchStatus::Ready;
            }
            events.push(BatchEvent::saved(&batch));
            if became_ready {
                events.push(BatchEvent::became_ready(&batch));
            }

            Ok(Plan {
                write: Write::Put(batch.clone()),
                events,
                output: (batch, created, became_ready),
            })
        });

        let (batch, created, became_ready) = match batch {
            Ok(outcome) => outcome,
            Err(e) => {
                tracing::warn!("Failed to assign order {} to batch {}: {}", order.id, key, e);
                return Err(e);
            }
        };

        if created {
            self.metrics.record_batch_created();
            tracing::info!("Created batch {} for {}", batch.id, key);
        }
        if became_ready {
            self.metrics.record_ready();
        }
        self.metrics.record_assignment();
        tracing::info!(
            "Order {} assigned to batch {} ({}/{} orders, {})",
            order.id,
            batch.id,
            batch.order_count,
            batch.threshold,
            format_naira(batch.total_value)
        );

        Ok(batch)
    }

    /// Take an order out of its batch; the batch is deleted when it empties.
    ///
    /// The batch value drops by the amount recorded when the order joined,
    /// whatever `order.total` says now. A ready batch that drops below its
    /// threshold goes back to pending. Returns the remaining batch, or `None`
    /// if it was deleted.
    pub fn remove_order_from_batch(&self, order: &Order) -> BatchResult<Option<Batch>> {
        let _timer = self.metrics.start_operation("remove");

        let batch_id = order.batch_id.ok_or_else(|| BatchError::NotFound {
            resource: "Batch assignment for order",
            id: order.id.clone(),
        })?;
        let key = order.batch_key();

        let remaining = self.update_with_retry(&key, |current| {
            let mut batch = match current {
                Some(batch) if batch.id == batch_id => batch,
                _ => {
                    return Err(BatchError::NotFound {
                        resource: "Batch",
                        id: batch_id.to_string(),
                    })
                }
            };

            if !batch.contains(&order.id) {
                return Err(BatchError::NotFound {
                    resource: "Order in batch",
                    id: order.id.clone(),
                });
            }

            if !batch.status.accepts_orders() {
                return Err(BatchError::InvalidTransition(format!(
                    "batch {} is {} and its orders can no longer be removed",
                    batch.id, batch.status
                )));
            }

            if let Some(member) = batch.remove_member(&order.id) {
                if member.total != order.total {
                    tracing::warn!(
                        "Order {} left batch {} with total {} but joined with {}",
                        order.id,
                        batch.id,
                        order.total,
                        member.total
                    );
                }
            }
            batch.touch(Utc::now());

            if batch.order_count == 0 {
                return Ok(Plan {
                    write: Write::Delete,
                    events: vec![
                        BatchEvent::Deleted { batch_id: batch.id },
                        BatchEvent::order_detached(&order.id),
                    ],
                    output: None,
                });
            }

            if batch.status == BatchStatus::Ready && !batch.meets_threshold() {
                batch.status = BatchStatus::Pending;
            }

            Ok(Plan {
                write: Write::Put(batch.clone()),
                events: vec![
                    BatchEvent::saved(&batch),
                    BatchEvent::order_detached(&order.id),
                ],
                output: Some(batch),
            })
        })?;

        self.metrics.record_removal();
        match &remaining {
            Some(batch) => tracing::info!(
                "Order {} removed from batch {} ({} orders left, {})",
                order.id,
                batch.id,
                batch.order_count,
                batch.status
            ),
            None => {
                self.metrics.record_batch_deleted();
                tracing::info!(
                    "Order {} removed from batch {}, batch deleted",
                    order.id,
                    batch_id
                );
            }
        }

        Ok(remaining)
    }

    /// Move a batch to the status that immediately follows its current one.
    pub fn advance_batch(&self, batch_id: Uuid, target: BatchStatus) -> BatchResult<Batch> {
        let _timer = self.metrics.start_operation("advance");
        let key = self.key_for(batch_id)?;

        let (batch, became_ready) = self
            .update_with_retry(&key, |current| {
                let mut batch = match current {
                    Some(batch) if batch.id == batch_id => batch,
                    _ => {
                        return Err(BatchError::NotFound {
                            resource: "Batch",
                            id: batch_id.to_string(),
                        })
                    }
                };

                batch.status = BatchStatusMachine::transition(batch.status, target)
                    .map_err(BatchError::InvalidTransition)?;
                batch.touch(Utc::now());

                let became_ready = target == BatchStatus::Ready;
                let mut events = vec![BatchEvent::saved(&batch)];
                if became_ready {
                    events.push(BatchEvent::became_ready(&batch));
                }

                Ok(Plan {
                    write: Write::Put(batch.clone()),
                    events,
                    output: (batch, became_ready),
                })
            })
            .map_err(|e| {
                tracing::warn!("Rejected advance of batch {} to {}: {}", batch_id, target, e);
                e
            })?;

        self.metrics.record_transition();
        if became_ready {
            self.metrics.record_ready();
        }
        tracing::info!("Batch {} advanced to {}", batch.id, batch.status);

        Ok(batch)
    }

    /// Record the driver and van for a batch that is assigned or later.
    pub fn assign_driver(
        &self,
        batch_id: Uuid,
        driver_name: &str,
        van_number: &str,
    ) -> BatchResult<Batch> {
        let _timer = self.metrics.start_operation("assign_driver");

        let driver_name = driver_name.trim();
        let van_number = van_number.trim();
        if driver_name.is_empty() || van_number.is_empty() {
            return Err(BatchError::InvalidInput(
                "driver name and van number are required".to_string(),
            ));
        }

        let key = self.key_for(batch_id)?;
        let batch = self.update_with_retry(&key, |current| {
            let mut batch = match current {
                Some(batch) if batch.id == batch_id => batch,
                _ => {
                    return Err(BatchError::NotFound {
                        resource: "Batch",
                        id: batch_id.to_string(),
                    })
                }
            };

            if !batch.status.allows_driver_assignment() {
                return Err(BatchError::InvalidTransition(format!(
                    "driver can only be set once batch {} is assigned, it is {}",
                    batch.id, batch.status
                )));
            }

            batch.driver_name = Some(driver_name.to_string());
            batch.van_number = Some(van_number.to_string());
            batch.touch(Utc::now());

            Ok(Plan {
                write: Write::Put(batch.clone()),
                events: vec![BatchEvent::saved(&batch)],
                output: batch,
            })
        })?;

        self.metrics.record_driver_assignment();
        tracing::info!(
            "Batch {} assigned to driver {} (van {})",
            batch.id,
            driver_name,
            van_number
        );

        Ok(batch)
    }

    pub fn get_batch(&self, batch_id: Uuid) -> BatchResult<Batch> {
        tracing::debug!("Fetching batch {}", batch_id);
        self.store
            .load_by_id(batch_id)?
            .ok_or_else(|| BatchError::NotFound {
                resource: "Batch",
                id: batch_id.to_string(),
            })
    }

    pub fn list_batches(&self, filter: &BatchFilter) -> BatchResult<Vec<Batch>> {
        let batches: Vec<Batch> = self
            .store
            .list()?
            .into_iter()
            .filter(|batch| filter.matches(batch))
            .collect();
        tracing::debug!("Listed {} batches", batches.len());
        Ok(batches)
    }

    fn key_for(&self, batch_id: Uuid) -> BatchResult<BatchKey> {
        Ok(self.get_batch(batch_id)?.key())
    }

    /// Run `plan` against the current state of `key` and commit its result
    /// with compare-and-swap, re-reading and retrying on conflict.
    ///
    /// Planning runs unlocked. The swap and the publishing of its events share
    /// the commit guard, so a later write never reaches the sink first.
    fn update_with_retry<T>(
        &self,
        key: &BatchKey,
        mut plan: impl FnMut(Option<Batch>) -> BatchResult<Plan<T>>,
    ) -> BatchResult<T> {
        for attempt in 1..=self.max_attempts {
            let current = self.store.load(key)?;
            let expected = current.as_ref().map(|batch| batch.version);
            let planned = plan(current)?;

            let next = match planned.write {
                Write::Keep => return Ok(planned.output),
                Write::Put(batch) => Some(batch),
                Write::Delete => None,
            };

            let committed = {
                let _guard = self
                    .commit
                    .lock()
                    .map_err(|_| BatchError::Store("batch commit lock poisoned".to_string()))?;
                let committed = self.store.compare_and_swap(key, expected, next)?;
                if committed {
                    for event in planned.events {
                        self.sink.publish(event);
                    }
                }
                committed
            };
            if committed {
                return Ok(planned.output);
            }

            self.metrics.record_conflict_retry();
            tracing::warn!(
                "Concurrent update on batch {} (attempt {}/{})",
                key,
                attempt,
                self.max_attempts
            );
        }

        self.metrics.record_conflict_exhausted();
        tracing::error!(
            "Giving up on batch {} after {} conflicting attempts",
            key,
            self.max_attempts
        );
        Err(BatchError::ConcurrencyConflict {
            key: key.to_string(),
            attempts: self.max_attempts,
        })
    }
}

fn validate_order(order: &Order) -> BatchResult<()> {
    if order.total.is_sign_negative() && !order.total.is_zero() {
        return Err(BatchError::InvalidInput(format!(
            "order {} has a negative total",
            order.id
        )));
    }
    for (field, value) in [
        ("id", &order.id),
        ("batch_slot", &order.batch_slot),
        ("estate_or_hotel", &order.estate_or_hotel),
        ("shop_id", &order.shop_id),
    ] {
        if value.trim().is_empty() {
            return Err(BatchError::InvalidInput(format!(
                "order {} is missing {}",
                order.id, field
            )));
        }
    }
    Ok(())
}
