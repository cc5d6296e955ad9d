pub mod batches;
pub mod config;
pub mod db;
pub mod error;
pub mod orders;
pub mod pricing;
pub mod slots;
pub mod validation;

use std::sync::Arc;

use axum::{response::Json, routing::{get, post, put}, Router};
use serde::Serialize;
use tower::ServiceBuilder;
use tower_http::{
    cors::{Any, CorsLayer},
    trace::TraceLayer,
};
use utoipa::{OpenApi, ToSchema};
use utoipa_swagger_ui::SwaggerUi;

use batches::{BatchAggregator, BatchEventSink, BatchStore};
use config::AppConfig;
use orders::OrderWorkflow;
use pricing::PricingEngine;
use slots::SlotSchedule;

/// OpenAPI documentation structure
#[derive(OpenApi)]
#[openapi(
    paths(
        health_handler,
        pricing::handlers::quote_handler,
        slots::available_slots_handler,
        orders::handlers::checkout_handler,
        orders::handlers::confirm_payment_handler,
        orders::handlers::payment_failed_handler,
        orders::handlers::advance_order_handler,
        orders::handlers::cancel_order_handler,
        batches::handlers::list_batches_handler,
        batches::handlers::get_batch_handler,
        batches::handlers::advance_batch_handler,
        batches::handlers::assign_driver_handler,
        batches::handlers::metrics_handler,
    ),
    components(
        schemas(
            HealthResponse,
            error::ErrorResponse,
            pricing::CartLine,
            pricing::PriceBreakdown,
            pricing::QuoteRequest,
            slots::DeliverySlot,
            orders::Order,
            orders::OrderItem,
            orders::OrderStatus,
            orders::PaymentStatus,
            orders::CheckoutRequest,
            orders::ConfirmPaymentRequest,
            orders::OrderActionRequest,
            orders::AdvanceOrderRequest,
            orders::PaymentConfirmation,
            batches::Batch,
            batches::BatchMember,
            batches::BatchStatus,
            batches::AdvanceBatchRequest,
            batches::AssignDriverRequest,
            batches::MetricsSummary,
        )
    ),
    tags(
        (name = "health", description = "Service liveness"),
        (name = "pricing", description = "Cart pricing"),
        (name = "slots", description = "Delivery slot availability"),
        (name = "orders", description = "Checkout, payment and fulfilment"),
        (name = "batches", description = "Delivery batch administration")
    ),
    info(
        title = "RelaxShopping Order API",
        version = "0.1.0",
        description = "Pricing, checkout and delivery batching for estate and hotel grocery delivery"
    )
)]
pub struct ApiDoc;

/// Application state shared across handlers
#[derive(Clone)]
pub struct AppState {
    pub pricing: Arc<PricingEngine>,
    pub batches: Arc<BatchAggregator>,
    pub orders: Arc<OrderWorkflow>,
    pub slots: Arc<SlotSchedule>,
}

impl AppState {
    pub fn new(config: &AppConfig, store: Arc<dyn BatchStore>, sink: Arc<dyn BatchEventSink>) -> Self {
        let pricing = Arc::new(PricingEngine::new(config.pricing));
        let batches = Arc::new(BatchAggregator::new(store, sink, config.batches));
        let slots = SlotSchedule::default();
        let orders = Arc::new(OrderWorkflow::new(
            pricing.clone(),
            batches.clone(),
            slots.clone(),
        ));

        Self {
            pricing,
            batches,
            orders,
            slots: Arc::new(slots),
        }
    }
}

#[derive(Debug, Serialize, ToSchema)]
pub struct HealthResponse {
    #[schema(example = "ok")]
    pub status: &'static str,
}

/// Handler for GET /health
#[utoipa::path(
    get,
    path = "/health",
    responses(
        (status = 200, description = "Service is up", body = HealthResponse)
    ),
    tag = "health"
)]
pub async fn health_handler() -> Json<HealthResponse> {
    Json(HealthResponse { status: "ok" })
}

/// Creates and configures the application router
/// Maps all API endpoints to their handlers and adds CORS and request tracing
pub fn create_router(state: AppState) -> Router {
    // Configure CORS to allow all origins, methods, and headers
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    Router::new()
        // Swagger UI
        .merge(SwaggerUi::new("/swagger-ui").url("/api-docs/openapi.json", ApiDoc::openapi()))
        .route("/health", get(health_handler))
        .route("/api/pricing/quote", post(pricing::quote_handler))
        .route("/api/slots", get(slots::available_slots_handler))
        .route("/api/orders/checkout", post(orders::checkout_handler))
        .route("/api/orders/confirm-payment", post(orders::confirm_payment_handler))
        .route("/api/orders/payment-failed", post(orders::payment_failed_handler))
        .route("/api/orders/advance", post(orders::advance_order_handler))
        .route("/api/orders/cancel", post(orders::cancel_order_handler))
        .route("/api/batches", get(batches::list_batches_handler))
        .route("/api/batches/:id", get(batches::get_batch_handler))
        .route("/api/batches/:id/advance", post(batches::advance_batch_handler))
        .route("/api/batches/:id/driver", put(batches::assign_driver_handler))
        .route("/api/metrics", get(batches::metrics_handler))
        .layer(
            ServiceBuilder::new()
                .layer(TraceLayer::new_for_http())
                .layer(cors),
        )
        .with_state(state)
}

#[cfg(test)]
mod tests;
