// HTTP handlers for order endpoints
//
// Orders travel in the request body; the service does not keep them.

use axum::{extract::State, http::StatusCode, Json};
use validator::Validate;

use crate::error::{ApiError, ErrorResponse};
use crate::orders::{
    AdvanceOrderRequest, CheckoutRequest, ConfirmPaymentRequest, Order, OrderActionRequest,
    PaymentConfirmation,
};
use crate::slots::lagos_now;
use crate::AppState;

/// Handler for POST /api/orders/checkout
/// Prices the cart and books the delivery slot
#[utoipa::path(
    post,
    path = "/api/orders/checkout",
    request_body = CheckoutRequest,
    responses(
        (status = 201, description = "Order created, awaiting payment", body = Order),
        (status = 400, description = "Invalid cart or slot", body = ErrorResponse)
    ),
    tag = "orders"
)]
pub async fn checkout_handler(
    State(state): State<AppState>,
    Json(request): Json<CheckoutRequest>,
) -> Result<(StatusCode, Json<Order>), ApiError> {
    request.validate()?;

    let order = state.orders.checkout(request, lagos_now())?;
    Ok((StatusCode::CREATED, Json(order)))
}

/// Handler for POST /api/orders/confirm-payment
/// Marks the order paid and assigns it to a delivery batch
#[utoipa::path(
    post,
    path = "/api/orders/confirm-payment",
    request_body = ConfirmPaymentRequest,
    responses(
        (status = 200, description = "Payment recorded", body = PaymentConfirmation),
        (status = 400, description = "Invalid request", body = ErrorResponse),
        (status = 409, description = "Order already paid or assigned", body = ErrorResponse)
    ),
    tag = "orders"
)]
pub async fn confirm_payment_handler(
    State(state): State<AppState>,
    Json(request): Json<ConfirmPaymentRequest>,
) -> Result<Json<PaymentConfirmation>, ApiError> {
    request.validate()?;

    let (order, batch) = state
        .orders
        .confirm_payment(request.order, &request.payment_ref)?;
    Ok(Json(PaymentConfirmation { order, batch }))
}

/// Handler for POST /api/orders/payment-failed
#[utoipa::path(
    post,
    path = "/api/orders/payment-failed",
    request_body = OrderActionRequest,
    responses(
        (status = 200, description = "Failure recorded", body = Order),
        (status = 409, description = "Payment is not pending", body = ErrorResponse)
    ),
    tag = "orders"
)]
pub async fn payment_failed_handler(
    State(state): State<AppState>,
    Json(request): Json<OrderActionRequest>,
) -> Result<Json<Order>, ApiError> {
    let order = state.orders.record_payment_failure(request.order)?;
    Ok(Json(order))
}

/// Handler for POST /api/orders/advance
#[utoipa::path(
    post,
    path = "/api/orders/advance",
    request_body = AdvanceOrderRequest,
    responses(
        (status = 200, description = "Order advanced", body = Order),
        (status = 409, description = "Transition not allowed", body = ErrorResponse)
    ),
    tag = "orders"
)]
pub async fn advance_order_handler(
    State(state): State<AppState>,
    Json(request): Json<AdvanceOrderRequest>,
) -> Result<Json<Order>, ApiError> {
    let order = state.orders.advance_order(request.order, request.status)?;
    Ok(Json(order))
}

/// Handler for POST /api/orders/cancel
/// Cancels the order and removes it from its batch
#[utoipa::path(
    post,
    path = "/api/orders/cancel",
    request_body = OrderActionRequest,
    responses(
        (status = 200, description = "Order cancelled", body = Order),
        (status = 404, description = "Order not in its batch", body = ErrorResponse),
        (status = 409, description = "Order can no longer be cancelled", body = ErrorResponse)
    ),
    tag = "orders"
)]
pub async fn cancel_order_handler(
    State(state): State<AppState>,
    Json(request): Json<OrderActionRequest>,
) -> Result<Json<Order>, ApiError> {
    let order = state.orders.cancel_order(request.order)?;
    Ok(Json(order))
}
