// Error handling module for the RelaxShopping API
// Converts module errors into HTTP responses with a consistent JSON body

use axum::{
    http::StatusCode,
    response::{IntoResponse, Json, Response},
};
use chrono::Utc;
use serde::Serialize;
use tracing::{debug, error, warn};
use utoipa::ToSchema;

use crate::batches::BatchError;
use crate::orders::OrderError;
use crate::pricing::PricingError;

/// Main error type for the API
/// All handlers return Result<T, ApiError>
///
/// Each variant maps to a specific HTTP status code and error response format.
#[derive(Debug)]
pub enum ApiError {
    /// Validation errors from request validation
    /// Maps to HTTP 400 Bad Request
    ValidationError(validator::ValidationErrors),

    /// Business input rejected by the pricing, batch or order rules
    /// Maps to HTTP 400 Bad Request
    InvalidInput(String),

    /// Resource not found by ID
    /// Maps to HTTP 404 Not Found
    NotFound { resource: String, id: String },

    /// Request conflicts with the current state of a resource
    /// Maps to HTTP 409 Conflict
    Conflict { code: &'static str, message: String },

    /// Internal server errors
    /// Maps to HTTP 500 Internal Server Error
    /// Details are logged, not returned
    InternalError(String),
}

/// Consistent error response structure
///
/// Carries a machine-readable `error_code` and a human-readable `message`.
#[derive(Debug, Serialize, ToSchema)]
pub struct ErrorResponse {
    /// Machine-readable error code (e.g., "VALIDATION_ERROR", "NOT_FOUND")
    #[schema(example = "NOT_FOUND")]
    pub error_code: String,

    #[schema(example = "Batch with id 5b0e... not found")]
    pub message: String,

    /// Field-level validation errors; omitted when None
    #[serde(skip_serializing_if = "Option::is_none")]
    #[schema(value_type = Option<Object>)]
    pub details: Option<serde_json::Value>,

    /// RFC 3339 timestamp of when the error occurred
    pub timestamp: String,
}

impl ErrorResponse {
    fn new(error_code: &str, message: impl Into<String>) -> Self {
        Self {
            error_code: error_code.to_string(),
            message: message.into(),
            details: None,
            timestamp: Utc::now().to_rfc3339(),
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let (status, error_response) = self.to_error_response();
        (status, Json(error_response)).into_response()
    }
}

impl ApiError {
    /// Convert ApiError to HTTP status code and ErrorResponse
    ///
    /// Expected client errors log at debug, conflicts at warn and server
    /// failures at error.
    fn to_error_response(&self) -> (StatusCode, ErrorResponse) {
        match self {
            ApiError::ValidationError(errors) => {
                debug!("Validation error: {:?}", errors);

                let mut response = ErrorResponse::new("VALIDATION_ERROR", "Request validation failed");
                response.details =
                    Some(serde_json::to_value(errors).unwrap_or(serde_json::json!({})));
                (StatusCode::BAD_REQUEST, response)
            }
            ApiError::InvalidInput(message) => {
                debug!("Invalid input: {}", message);
                (
                    StatusCode::BAD_REQUEST,
                    ErrorResponse::new("INVALID_INPUT", message.clone()),
                )
            }
            ApiError::NotFound { resource, id } => {
                debug!("Resource not found: {} with id {}", resource, id);
                (
                    StatusCode::NOT_FOUND,
                    ErrorResponse::new(
                        "NOT_FOUND",
                        format!("{} with id {} not found", resource, id),
                    ),
                )
            }
            ApiError::Conflict { code, message } => {
                warn!("Conflict error ({}): {}", code, message);
                (StatusCode::CONFLICT, ErrorResponse::new(code, message.clone()))
            }
            ApiError::InternalError(internal_msg) => {
                error!("Internal error: {}", internal_msg);
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    ErrorResponse::new("INTERNAL_ERROR", "An internal server error occurred"),
                )
            }
        }
    }

    /// Get the HTTP status code for this error
    pub fn status_code(&self) -> StatusCode {
        match self {
            ApiError::ValidationError(_) | ApiError::InvalidInput(_) => StatusCode::BAD_REQUEST,
            ApiError::NotFound { .. } => StatusCode::NOT_FOUND,
            ApiError::Conflict { .. } => StatusCode::CONFLICT,
            ApiError::InternalError(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl From<validator::ValidationErrors> for ApiError {
    fn from(errors: validator::ValidationErrors) -> Self {
        ApiError::ValidationError(errors)
    }
}

impl From<PricingError> for ApiError {
    fn from(error: PricingError) -> Self {
        match error {
            PricingError::InvalidInput(message) => ApiError::InvalidInput(message),
        }
    }
}

impl From<BatchError> for ApiError {
    fn from(error: BatchError) -> Self {
        let message = error.to_string();
        match error {
            BatchError::InvalidInput(message) => ApiError::InvalidInput(message),
            BatchError::NotFound { resource, id } => ApiError::NotFound {
                resource: resource.to_string(),
                id,
            },
            BatchError::OrderAlreadyAssigned { .. } => ApiError::Conflict {
                code: "ORDER_ALREADY_ASSIGNED",
                message,
            },
            BatchError::InvalidTransition(_) => ApiError::Conflict {
                code: "INVALID_TRANSITION",
                message,
            },
            BatchError::ConcurrencyConflict { .. } => ApiError::Conflict {
                code: "CONCURRENCY_CONFLICT",
                message,
            },
            BatchError::Store(message) => ApiError::InternalError(message),
        }
    }
}

impl From<OrderError> for ApiError {
    fn from(error: OrderError) -> Self {
        let message = error.to_string();
        match error {
            OrderError::Pricing(error) => error.into(),
            OrderError::Batch(error) => error.into(),
            OrderError::InvalidInput(message) => ApiError::InvalidInput(message),
            OrderError::Slot(_) => ApiError::InvalidInput(message),
            OrderError::InvalidTransition(_) | OrderError::PaymentNotPending(_) => {
                ApiError::Conflict {
                    code: "INVALID_TRANSITION",
                    message,
                }
            }
        }
    }
}
