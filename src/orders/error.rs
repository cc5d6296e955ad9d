use crate::batches::BatchError;
use crate::orders::PaymentStatus;
use crate::pricing::PricingError;
use crate::slots::SlotError;

/// Error types for order operations
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum OrderError {
    #[error("Invalid order: {0}")]
    InvalidInput(String),

    #[error(transparent)]
    Slot(#[from] SlotError),

    #[error(transparent)]
    Pricing(#[from] PricingError),

    #[error(transparent)]
    Batch(#[from] BatchError),

    #[error("Invalid status transition: {0}")]
    InvalidTransition(String),

    #[error("Payment is {0}, expected pending")]
    PaymentNotPending(PaymentStatus),
}

/// Result type alias for order operations
pub type OrderResult<T> = Result<T, OrderError>;
