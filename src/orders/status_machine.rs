use crate::orders::OrderStatus;

/// Service for managing order status transitions
pub struct StatusMachine;

impl StatusMachine {
    /// Check if a status transition is valid
    ///
    /// # Valid Transitions
    /// - Pending → Paid, Cancelled
    /// - Paid → Packed, Cancelled
    /// - Packed → OutForDelivery, Cancelled
    /// - OutForDelivery → Delivered
    /// - Delivered, Cancelled → (none)
    pub fn is_valid_transition(from: OrderStatus, to: OrderStatus) -> bool {
        matches!(
            (from, to),
            (OrderStatus::Pending, OrderStatus::Paid)
                | (OrderStatus::Paid, OrderStatus::Packed)
                | (OrderStatus::Packed, OrderStatus::OutForDelivery)
                | (OrderStatus::OutForDelivery, OrderStatus::Delivered)
                | (OrderStatus::Pending, OrderStatus::Cancelled)
                | (OrderStatus::Paid, OrderStatus::Cancelled)
                | (OrderStatus::Packed, OrderStatus::Cancelled)
        )
    }

    /// Attempt to transition from one status to another
    ///
    /// Returns `Ok(to)` if the transition is valid, `Err(message)` otherwise
    pub fn transition(from: OrderStatus, to: OrderStatus) -> Result<OrderStatus, String> {
        if Self::is_valid_transition(from, to) {
            Ok(to)
        } else {
            Err(format!("Invalid status transition from {} to {}", from, to))
        }
    }
}
