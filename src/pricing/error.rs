/// Error types for cart pricing
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum PricingError {
    #[error("Invalid pricing input: {0}")]
    InvalidInput(String),
}

/// Result type alias for pricing operations
pub type PricingResult<T> = Result<T, PricingError>;
