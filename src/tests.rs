// Handler tests for the RelaxShopping API
// Exercises the router end to end against the in-memory batch store

use super::*;
use axum::http::StatusCode;
use axum_test::TestServer;
use chrono::{Duration, NaiveDate};
use rust_decimal_macros::dec;
use serde_json::json;

use crate::batches::{Batch, BatchStatus, InMemoryBatchStore, MetricsSummary, TracingSink};
use crate::orders::{Order, OrderStatus, PaymentConfirmation, PaymentStatus};
use crate::pricing::PriceBreakdown;
use crate::slots::{lagos_now, DeliverySlot};

// ============================================================================
// Test Helpers
// ============================================================================

/// Test app with default pricing and the given batch threshold
fn create_test_app(threshold: u32) -> TestServer {
    let threshold = threshold.to_string();
    let config = AppConfig::from_lookup(|key| match key {
        "BATCH_THRESHOLD" => Some(threshold.clone()),
        _ => None,
    })
    .unwrap();

    let state = AppState::new(
        &config,
        Arc::new(InMemoryBatchStore::new()),
        Arc::new(TracingSink),
    );
    TestServer::new(create_router(state)).unwrap()
}

/// A delivery date far enough ahead that every slot is open
fn delivery_date() -> NaiveDate {
    lagos_now().date_naive() + Duration::days(2)
}

fn checkout_payload(shop_id: &str, unit_price: &str, quantity: u32) -> serde_json::Value {
    json!({
        "user_id": "user-1",
        "items": [{
            "product_id": "prod-rice-5kg",
            "product_name": "Rice 5kg",
            "shop_id": shop_id,
            "shop_name": "Lekki Mart",
            "quantity": quantity,
            "unit_price": unit_price
        }],
        "estate_or_hotel": "Lekki Gardens",
        "state": "Lagos",
        "lga": "Eti-Osa",
        "batch_slot": "10:00",
        "batch_date": delivery_date()
    })
}

async fn checkout(server: &TestServer, unit_price: &str) -> Order {
    let response = server
        .post("/api/orders/checkout")
        .json(&checkout_payload("shop-1", unit_price, 1))
        .await;
    assert_eq!(response.status_code(), StatusCode::CREATED);
    response.json()
}

async fn paid_order(server: &TestServer, unit_price: &str) -> PaymentConfirmation {
    let order = checkout(server, unit_price).await;
    let response = server
        .post("/api/orders/confirm-payment")
        .json(&json!({ "order": order, "payment_ref": format!("PSK_{}", order.id) }))
        .await;
    assert_eq!(response.status_code(), StatusCode::OK);
    response.json()
}

fn error_code(body: &serde_json::Value) -> &str {
    body["error_code"].as_str().unwrap_or_default()
}

// ============================================================================
// Health and Pricing
// ============================================================================

#[tokio::test]
async fn test_health() {
    let server = create_test_app(5);
    let response = server.get("/health").await;

    assert_eq!(response.status_code(), StatusCode::OK);
    let body: serde_json::Value = response.json();
    assert_eq!(body["status"], "ok");
}

#[tokio::test]
async fn test_quote_reference_cart() {
    let server = create_test_app(5);
    let response = server
        .post("/api/pricing/quote")
        .json(&json!({
            "lines": [
                { "product_id": "rice", "unit_price": "5000", "quantity": 1 },
                { "product_id": "oil", "unit_price": "2500", "quantity": 2 }
            ]
        }))
        .await;

    assert_eq!(response.status_code(), StatusCode::OK);
    let breakdown: PriceBreakdown = response.json();
    assert_eq!(breakdown.subtotal, dec!(10000));
    assert_eq!(breakdown.service_fee, dec!(200));
    assert_eq!(breakdown.delivery_fee, dec!(400));
    assert_eq!(breakdown.vat, dec!(795));
    assert_eq!(breakdown.total, dec!(11395));
}

#[tokio::test]
async fn test_quote_empty_cart_with_delivery_override() {
    let server = create_test_app(5);
    let response = server
        .post("/api/pricing/quote")
        .json(&json!({ "lines": [], "delivery_fee": "600" }))
        .await;

    assert_eq!(response.status_code(), StatusCode::OK);
    let breakdown: PriceBreakdown = response.json();
    assert_eq!(breakdown.subtotal, dec!(0));
    assert_eq!(breakdown.vat, dec!(45));
    assert_eq!(breakdown.total, dec!(645));
}

#[tokio::test]
async fn test_quote_rejects_zero_quantity() {
    let server = create_test_app(5);
    let response = server
        .post("/api/pricing/quote")
        .json(&json!({
            "lines": [{ "product_id": "rice", "unit_price": "5000", "quantity": 0 }]
        }))
        .await;

    assert_eq!(response.status_code(), StatusCode::BAD_REQUEST);
    let body: serde_json::Value = response.json();
    assert_eq!(error_code(&body), "VALIDATION_ERROR");
    assert!(body["details"].is_object());
}

#[tokio::test]
async fn test_quote_rejects_negative_price() {
    let server = create_test_app(5);
    let response = server
        .post("/api/pricing/quote")
        .json(&json!({
            "lines": [{ "product_id": "rice", "unit_price": "-1", "quantity": 1 }]
        }))
        .await;

    assert_eq!(response.status_code(), StatusCode::BAD_REQUEST);
}

// ============================================================================
// Slots
// ============================================================================

#[tokio::test]
async fn test_slots_for_future_date() {
    let server = create_test_app(5);
    let response = server
        .get("/api/slots")
        .add_query_param("date", delivery_date().to_string())
        .await;

    assert_eq!(response.status_code(), StatusCode::OK);
    let slots: Vec<DeliverySlot> = response.json();
    let times: Vec<&str> = slots.iter().map(|slot| slot.time.as_str()).collect();
    assert_eq!(times, vec!["08:00", "10:00", "12:00", "15:00", "17:00"]);
}

#[tokio::test]
async fn test_slots_for_past_date() {
    let server = create_test_app(5);
    let yesterday = lagos_now().date_naive() - Duration::days(1);
    let response = server
        .get("/api/slots")
        .add_query_param("date", yesterday.to_string())
        .await;

    let slots: Vec<DeliverySlot> = response.json();
    assert!(slots.is_empty());
}

// ============================================================================
// Orders
// ============================================================================

#[tokio::test]
async fn test_checkout_success() {
    let server = create_test_app(5);
    let response = server
        .post("/api/orders/checkout")
        .json(&checkout_payload("shop-1", "5000", 2))
        .await;

    assert_eq!(response.status_code(), StatusCode::CREATED);
    let order: Order = response.json();
    assert!(order.id.starts_with("RS-"));
    assert_eq!(order.total, dec!(11395));
    assert_eq!(order.status, OrderStatus::Pending);
    assert_eq!(order.payment_status, PaymentStatus::Pending);
    assert_eq!(order.batch_id, None);
    assert_eq!(order.batch_date, delivery_date());
}

#[tokio::test]
async fn test_checkout_rejects_mixed_shops() {
    let server = create_test_app(5);
    let mut payload = checkout_payload("shop-1", "5000", 1);
    payload["items"]
        .as_array_mut()
        .unwrap()
        .push(json!({
            "product_id": "prod-oil",
            "product_name": "Oil",
            "shop_id": "shop-2",
            "shop_name": "Ikoyi Mart",
            "quantity": 1,
            "unit_price": "2500"
        }));

    let response = server.post("/api/orders/checkout").json(&payload).await;

    assert_eq!(response.status_code(), StatusCode::BAD_REQUEST);
    let body: serde_json::Value = response.json();
    assert_eq!(error_code(&body), "INVALID_INPUT");
}

#[tokio::test]
async fn test_checkout_rejects_bad_slots() {
    let server = create_test_app(5);

    let mut malformed = checkout_payload("shop-1", "5000", 1);
    malformed["batch_slot"] = json!("10AM");
    let response = server.post("/api/orders/checkout").json(&malformed).await;
    assert_eq!(response.status_code(), StatusCode::BAD_REQUEST);
    let body: serde_json::Value = response.json();
    assert_eq!(error_code(&body), "VALIDATION_ERROR");

    let mut unknown = checkout_payload("shop-1", "5000", 1);
    unknown["batch_slot"] = json!("09:00");
    let response = server.post("/api/orders/checkout").json(&unknown).await;
    assert_eq!(response.status_code(), StatusCode::BAD_REQUEST);
    let body: serde_json::Value = response.json();
    assert_eq!(error_code(&body), "INVALID_INPUT");
}

#[tokio::test]
async fn test_confirm_payment_assigns_batch() {
    let server = create_test_app(5);
    let confirmation = paid_order(&server, "1000").await;

    assert_eq!(confirmation.order.status, OrderStatus::Paid);
    assert_eq!(confirmation.order.batch_id, Some(confirmation.batch.id));
    assert_eq!(confirmation.batch.status, BatchStatus::Pending);
    assert_eq!(confirmation.batch.order_count, 1);
    assert_eq!(confirmation.batch.total_value, confirmation.order.total);
}

#[tokio::test]
async fn test_confirm_payment_twice_conflicts() {
    let server = create_test_app(5);
    let confirmation = paid_order(&server, "1000").await;

    let response = server
        .post("/api/orders/confirm-payment")
        .json(&json!({ "order": confirmation.order, "payment_ref": "PSK_again" }))
        .await;

    assert_eq!(response.status_code(), StatusCode::CONFLICT);
}

#[tokio::test]
async fn test_fifth_order_makes_batch_ready() {
    let server = create_test_app(5);

    let mut last = None;
    for _ in 0..5 {
        last = Some(paid_order(&server, "1000").await);
    }
    let batch = last.unwrap().batch;

    assert_eq!(batch.status, BatchStatus::Ready);
    assert_eq!(batch.order_count, 5);

    let metrics: MetricsSummary = server.get("/api/metrics").await.json();
    assert_eq!(metrics.assignments, 5);
    assert_eq!(metrics.ready_events, 1);
    assert_eq!(metrics.batches_created, 1);
}

#[tokio::test]
async fn test_payment_failed() {
    let server = create_test_app(5);
    let order = checkout(&server, "1000").await;

    let response = server
        .post("/api/orders/payment-failed")
        .json(&json!({ "order": order }))
        .await;

    assert_eq!(response.status_code(), StatusCode::OK);
    let failed: Order = response.json();
    assert_eq!(failed.payment_status, PaymentStatus::Failed);
}

#[tokio::test]
async fn test_advance_order() {
    let server = create_test_app(5);
    let confirmation = paid_order(&server, "1000").await;

    let response = server
        .post("/api/orders/advance")
        .json(&json!({ "order": confirmation.order, "status": "packed" }))
        .await;
    assert_eq!(response.status_code(), StatusCode::OK);
    let packed: Order = response.json();
    assert_eq!(packed.status, OrderStatus::Packed);

    let response = server
        .post("/api/orders/advance")
        .json(&json!({ "order": packed, "status": "delivered" }))
        .await;
    assert_eq!(response.status_code(), StatusCode::CONFLICT);
}

#[tokio::test]
async fn test_cancel_order_reverts_ready_batch() {
    let server = create_test_app(2);
    let first = paid_order(&server, "1000").await;
    let second = paid_order(&server, "2000").await;
    assert_eq!(second.batch.status, BatchStatus::Ready);

    let response = server
        .post("/api/orders/cancel")
        .json(&json!({ "order": second.order }))
        .await;
    assert_eq!(response.status_code(), StatusCode::OK);
    let cancelled: Order = response.json();
    assert_eq!(cancelled.status, OrderStatus::Cancelled);
    assert_eq!(cancelled.batch_id, None);

    let batch: Batch = server
        .get(&format!("/api/batches/{}", second.batch.id))
        .await
        .json();
    assert_eq!(batch.status, BatchStatus::Pending);
    assert_eq!(batch.order_ids, vec![first.order.id.clone()]);
    assert_eq!(batch.total_value, first.order.total);
}

#[tokio::test]
async fn test_cancel_with_altered_total_keeps_batch_value() {
    let server = create_test_app(5);
    let first = paid_order(&server, "1000").await;
    let second = paid_order(&server, "1000").await;

    let mut altered = first.order.clone();
    altered.total = dec!(50000);
    let response = server
        .post("/api/orders/cancel")
        .json(&json!({ "order": altered }))
        .await;
    assert_eq!(response.status_code(), StatusCode::OK);

    let batch: Batch = server
        .get(&format!("/api/batches/{}", second.batch.id))
        .await
        .json();
    assert_eq!(batch.order_count, 1);
    assert_eq!(batch.order_ids, vec![second.order.id.clone()]);
    assert_eq!(batch.total_value, second.order.total);
}

#[tokio::test]
async fn test_cancel_last_order_deletes_batch() {
    let server = create_test_app(5);
    let confirmation = paid_order(&server, "1000").await;

    let response = server
        .post("/api/orders/cancel")
        .json(&json!({ "order": confirmation.order }))
        .await;
    assert_eq!(response.status_code(), StatusCode::OK);

    let response = server
        .get(&format!("/api/batches/{}", confirmation.batch.id))
        .await;
    assert_eq!(response.status_code(), StatusCode::NOT_FOUND);
}

// ============================================================================
// Batches
// ============================================================================

#[tokio::test]
async fn test_get_unknown_batch() {
    let server = create_test_app(5);
    let response = server
        .get("/api/batches/6f1c2f5e-8f43-4d0e-9a55-1f0c2a4b7d10")
        .await;

    assert_eq!(response.status_code(), StatusCode::NOT_FOUND);
    let body: serde_json::Value = response.json();
    assert_eq!(error_code(&body), "NOT_FOUND");
    assert!(body["message"].as_str().unwrap().contains("not found"));
}

#[tokio::test]
async fn test_list_batches_with_filters() {
    let server = create_test_app(5);
    paid_order(&server, "1000").await;

    let batches: Vec<Batch> = server
        .get("/api/batches")
        .add_query_param("estate_or_hotel", "lekki gardens")
        .add_query_param("status", "pending")
        .await
        .json();
    assert_eq!(batches.len(), 1);

    let batches: Vec<Batch> = server
        .get("/api/batches")
        .add_query_param("status", "ready")
        .await
        .json();
    assert!(batches.is_empty());
}

#[tokio::test]
async fn test_batch_lifecycle_and_driver() {
    let server = create_test_app(5);
    let batch_id = paid_order(&server, "1000").await.batch.id;

    // Skipping straight to assigned is rejected
    let response = server
        .post(&format!("/api/batches/{}/advance", batch_id))
        .json(&json!({ "status": "assigned" }))
        .await;
    assert_eq!(response.status_code(), StatusCode::CONFLICT);
    let body: serde_json::Value = response.json();
    assert_eq!(error_code(&body), "INVALID_TRANSITION");

    let driver = json!({ "driver_name": "Chinedu Okafor", "van_number": "LSD-482-KJ" });
    let response = server
        .put(&format!("/api/batches/{}/driver", batch_id))
        .json(&driver)
        .await;
    assert_eq!(response.status_code(), StatusCode::CONFLICT);

    for status in ["ready", "assigned"] {
        let response = server
            .post(&format!("/api/batches/{}/advance", batch_id))
            .json(&json!({ "status": status }))
            .await;
        assert_eq!(response.status_code(), StatusCode::OK);
    }

    let response = server
        .put(&format!("/api/batches/{}/driver", batch_id))
        .json(&driver)
        .await;
    assert_eq!(response.status_code(), StatusCode::OK);
    let batch: Batch = response.json();
    assert_eq!(batch.status, BatchStatus::Assigned);
    assert_eq!(batch.driver_name.as_deref(), Some("Chinedu Okafor"));
    assert_eq!(batch.van_number.as_deref(), Some("LSD-482-KJ"));
}

#[tokio::test]
async fn test_assign_driver_validates_input() {
    let server = create_test_app(5);
    let batch_id = paid_order(&server, "1000").await.batch.id;

    let response = server
        .put(&format!("/api/batches/{}/driver", batch_id))
        .json(&json!({ "driver_name": "", "van_number": "LSD-482-KJ" }))
        .await;

    assert_eq!(response.status_code(), StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn test_openapi_document_is_served() {
    let server = create_test_app(5);
    let response = server.get("/api-docs/openapi.json").await;

    assert_eq!(response.status_code(), StatusCode::OK);
    let doc: serde_json::Value = response.json();
    assert!(doc["paths"]["/api/batches/{id}/driver"].is_object());
}
