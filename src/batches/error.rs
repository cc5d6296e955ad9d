use uuid::Uuid;

/// Error types for batch aggregation
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum BatchError {
    /// The order already names another batch; it must be removed from that one first
    #[error("Order {order_id} is already assigned to batch {batch_id}")]
    OrderAlreadyAssigned { order_id: String, batch_id: Uuid },

    #[error("{resource} not found: {id}")]
    NotFound { resource: &'static str, id: String },

    #[error("Invalid batch transition: {0}")]
    InvalidTransition(String),

    /// Optimistic updates kept colliding until the retry bound ran out
    #[error("Concurrent updates to batch {key} did not settle after {attempts} attempts")]
    ConcurrencyConflict { key: String, attempts: u32 },

    #[error("Invalid batch input: {0}")]
    InvalidInput(String),

    #[error("Batch store error: {0}")]
    Store(String),
}

/// Result type alias for batch operations
pub type BatchResult<T> = Result<T, BatchError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_display() {
        let error = BatchError::NotFound {
            resource: "Batch",
            id: "abc".to_string(),
        };
        assert_eq!(error.to_string(), "Batch not found: abc");

        let error = BatchError::ConcurrencyConflict {
            key: "2025-03-14 10:00 @ Lekki / shop-1".to_string(),
            attempts: 3,
        };
        assert!(error.to_string().contains("after 3 attempts"));
    }
}
