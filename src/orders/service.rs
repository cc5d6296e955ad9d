use std::sync::Arc;

use chrono::{DateTime, FixedOffset, Utc};
use uuid::Uuid;

use crate::batches::{Batch, BatchAggregator};
use crate::orders::{
    CheckoutRequest, Order, OrderError, OrderResult, OrderStatus, PaymentStatus, StatusMachine,
};
use crate::pricing::{format_naira, CartLine, PricingEngine};
use crate::slots::SlotSchedule;

/// Length of the hex suffix in generated order ids
const ORDER_ID_HEX_LEN: usize = 10;

/// Order lifecycle: checkout, payment, fulfilment and cancellation.
///
/// Orders are passed in and returned by value; storing them is the caller's job.
pub struct OrderWorkflow {
    pricing: Arc<PricingEngine>,
    batches: Arc<BatchAggregator>,
    slots: SlotSchedule,
}

impl OrderWorkflow {
    pub fn new(pricing: Arc<PricingEngine>, batches: Arc<BatchAggregator>, slots: SlotSchedule) -> Self {
        Self {
            pricing,
            batches,
            slots,
        }
    }

    /// Build a priced, unpaid order from a cart
    ///
    /// # Errors
    /// - `InvalidInput` for an empty cart or items from more than one shop
    /// - `Slot` when the delivery slot is unknown or already closed at `now`
    /// - `Pricing` when a line cannot be priced
    pub fn checkout(&self, request: CheckoutRequest, now: DateTime<FixedOffset>) -> OrderResult<Order> {
        let shop_id = match request.items.first() {
            Some(item) => item.shop_id.clone(),
            None => {
                return Err(OrderError::InvalidInput(
                    "cart must contain at least one item".to_string(),
                ))
            }
        };
        if request.items.iter().any(|item| item.shop_id != shop_id) {
            return Err(OrderError::InvalidInput(
                "all items in an order must come from the same shop".to_string(),
            ));
        }

        let estate_or_hotel = request.estate_or_hotel.trim().to_string();
        if estate_or_hotel.is_empty() {
            return Err(OrderError::InvalidInput(
                "estate or hotel is required".to_string(),
            ));
        }

        let slot = self
            .slots
            .validate_booking(request.batch_date, &request.batch_slot, now)?;

        let lines: Vec<CartLine> = request.items.iter().map(|item| item.cart_line()).collect();
        let breakdown = self.pricing.quote(&lines)?;

        let created_at = now.with_timezone(&Utc);
        let order = Order {
            id: generate_order_id(),
            user_id: request.user_id,
            items: request.items,
            subtotal: breakdown.subtotal,
            delivery_fee: breakdown.delivery_fee,
            service_fee: breakdown.service_fee,
            vat: breakdown.vat,
            total: breakdown.total,
            estate_or_hotel,
            state: request.state,
            lga: request.lga,
            shop_id,
            batch_slot: slot.time,
            batch_date: request.batch_date,
            batch_id: None,
            payment_ref: None,
            payment_status: PaymentStatus::Pending,
            status: OrderStatus::Pending,
            created_at,
            updated_at: created_at,
        };

        tracing::info!(
            "Checked out order {} for {} on {} at {}: {}",
            order.id,
            order.estate_or_hotel,
            order.batch_date,
            order.batch_slot,
            format_naira(order.total)
        );

        Ok(order)
    }

    /// Mark the order paid and add it to its delivery batch
    pub fn confirm_payment(&self, order: Order, payment_ref: &str) -> OrderResult<(Order, Batch)> {
        let payment_ref = payment_ref.trim();
        if payment_ref.is_empty() {
            return Err(OrderError::InvalidInput(
                "payment reference is required".to_string(),
            ));
        }
        if order.payment_status != PaymentStatus::Pending {
            return Err(OrderError::PaymentNotPending(order.payment_status));
        }

        let status = StatusMachine::transition(order.status, OrderStatus::Paid)
            .map_err(OrderError::InvalidTransition)?;

        let mut paid = Order {
            status,
            payment_status: PaymentStatus::Paid,
            payment_ref: Some(payment_ref.to_string()),
            updated_at: Utc::now(),
            ..order
        };

        let batch = self.batches.assign_order_to_batch(&paid)?;
        paid.batch_id = Some(batch.id);

        tracing::info!(
            "Payment {} confirmed for order {}, joined batch {}",
            payment_ref,
            paid.id,
            batch.id
        );

        Ok((paid, batch))
    }

    /// Record a failed payment attempt; the order stays pending
    pub fn record_payment_failure(&self, order: Order) -> OrderResult<Order> {
        if order.payment_status != PaymentStatus::Pending {
            return Err(OrderError::PaymentNotPending(order.payment_status));
        }

        tracing::warn!("Payment failed for order {}", order.id);
        Ok(Order {
            payment_status: PaymentStatus::Failed,
            updated_at: Utc::now(),
            ..order
        })
    }

    /// Move a paid order along `paid → packed → out_for_delivery → delivered`
    pub fn advance_order(&self, order: Order, target: OrderStatus) -> OrderResult<Order> {
        if matches!(target, OrderStatus::Paid | OrderStatus::Cancelled) {
            return Err(OrderError::InvalidTransition(format!(
                "order cannot be advanced to {}",
                target
            )));
        }

        let status = StatusMachine::transition(order.status, target).map_err(|e| {
            tracing::warn!("Rejected order {} transition: {}", order.id, e);
            OrderError::InvalidTransition(e)
        })?;

        tracing::info!("Order {} advanced to {}", order.id, status);
        Ok(Order {
            status,
            updated_at: Utc::now(),
            ..order
        })
    }

    /// Cancel the order, taking it out of its batch first
    pub fn cancel_order(&self, order: Order) -> OrderResult<Order> {
        let status = StatusMachine::transition(order.status, OrderStatus::Cancelled)
            .map_err(OrderError::InvalidTransition)?;

        if order.batch_id.is_some() {
            self.batches.remove_order_from_batch(&order)?;
        }

        tracing::info!("Order {} cancelled", order.id);
        Ok(Order {
            status,
            batch_id: None,
            updated_at: Utc::now(),
            ..order
        })
    }
}

fn generate_order_id() -> String {
    let hex = Uuid::new_v4().simple().to_string().to_uppercase();
    format!("RS-{}", &hex[..ORDER_ID_HEX_LEN])
}
