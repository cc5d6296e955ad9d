// HTTP handlers for pricing endpoints

use axum::{extract::State, Json};
use validator::Validate;

use crate::error::{ApiError, ErrorResponse};
use crate::pricing::{PriceBreakdown, QuoteRequest};
use crate::AppState;

/// Handler for POST /api/pricing/quote
/// Prices a cart with the configured fee and VAT rates
#[utoipa::path(
    post,
    path = "/api/pricing/quote",
    request_body = QuoteRequest,
    responses(
        (status = 200, description = "Price breakdown for the cart", body = PriceBreakdown),
        (status = 400, description = "Invalid cart", body = ErrorResponse)
    ),
    tag = "pricing"
)]
pub async fn quote_handler(
    State(state): State<AppState>,
    Json(request): Json<QuoteRequest>,
) -> Result<Json<PriceBreakdown>, ApiError> {
    request.validate()?;

    let breakdown = match request.delivery_fee {
        Some(fee) => state.pricing.quote_with_delivery_fee(&request.lines, fee)?,
        None => state.pricing.quote(&request.lines)?,
    };

    Ok(Json(breakdown))
}
