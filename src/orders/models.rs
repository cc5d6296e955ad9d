use chrono::{DateTime, NaiveDate, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;
use uuid::Uuid;
use validator::Validate;

use crate::batches::{Batch, BatchKey};
use crate::pricing::{CartLine, PriceBreakdown};

/// Order status enum representing the fulfilment lifecycle of an order
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "snake_case")]
pub enum OrderStatus {
    Pending,
    Paid,
    Packed,
    OutForDelivery,
    Delivered,
    Cancelled,
}

impl OrderStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            OrderStatus::Pending => "pending",
            OrderStatus::Paid => "paid",
            OrderStatus::Packed => "packed",
            OrderStatus::OutForDelivery => "out_for_delivery",
            OrderStatus::Delivered => "delivered",
            OrderStatus::Cancelled => "cancelled",
        }
    }

    pub fn is_terminal(&self) -> bool {
        matches!(self, OrderStatus::Delivered | OrderStatus::Cancelled)
    }
}

impl Default for OrderStatus {
    fn default() -> Self {
        OrderStatus::Pending
    }
}

impl std::fmt::Display for OrderStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl std::str::FromStr for OrderStatus {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "pending" => Ok(OrderStatus::Pending),
            "paid" => Ok(OrderStatus::Paid),
            "packed" => Ok(OrderStatus::Packed),
            "out_for_delivery" => Ok(OrderStatus::OutForDelivery),
            "delivered" => Ok(OrderStatus::Delivered),
            "cancelled" => Ok(OrderStatus::Cancelled),
            _ => Err(format!("Invalid order status: {}", s)),
        }
    }
}

/// Payment state of an order
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "snake_case")]
pub enum PaymentStatus {
    Pending,
    Paid,
    Failed,
}

impl PaymentStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            PaymentStatus::Pending => "pending",
            PaymentStatus::Paid => "paid",
            PaymentStatus::Failed => "failed",
        }
    }
}

impl Default for PaymentStatus {
    fn default() -> Self {
        PaymentStatus::Pending
    }
}

impl std::fmt::Display for PaymentStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// A purchased product line, as captured at checkout
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Validate, ToSchema)]
pub struct OrderItem {
    #[validate(length(min = 1, message = "Product id must not be empty"))]
    pub product_id: String,
    #[schema(example = "Mama Gold Rice 5kg")]
    #[validate(length(min = 1, message = "Product name must not be empty"))]
    pub product_name: String,
    #[validate(length(min = 1, message = "Shop id must not be empty"))]
    pub shop_id: String,
    #[schema(example = "Lekki Mart")]
    pub shop_name: String,
    #[validate(range(min = 1, message = "Quantity must be at least 1"))]
    pub quantity: u32,
    #[schema(value_type = String, example = "5000.00")]
    #[validate(custom = "crate::validation::validate_non_negative_amount")]
    pub unit_price: Decimal,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub notes: Option<String>,
}

impl OrderItem {
    pub fn cart_line(&self) -> CartLine {
        CartLine {
            product_id: self.product_id.clone(),
            unit_price: self.unit_price,
            quantity: self.quantity,
            notes: self.notes.clone(),
        }
    }
}

/// A placed order
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, ToSchema)]
pub struct Order {
    #[schema(example = "RS-1F3A9C0B2D")]
    pub id: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub user_id: Option<String>,
    pub items: Vec<OrderItem>,
    #[schema(value_type = String)]
    pub subtotal: Decimal,
    #[schema(value_type = String)]
    pub delivery_fee: Decimal,
    #[schema(value_type = String)]
    pub service_fee: Decimal,
    #[schema(value_type = String)]
    pub vat: Decimal,
    #[schema(value_type = String)]
    pub total: Decimal,
    pub estate_or_hotel: String,
    pub state: String,
    pub lga: String,
    pub shop_id: String,
    /// Delivery slot start, `HH:MM`
    pub batch_slot: String,
    pub batch_date: NaiveDate,
    #[serde(default)]
    pub batch_id: Option<Uuid>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub payment_ref: Option<String>,
    pub payment_status: PaymentStatus,
    pub status: OrderStatus,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Order {
    /// Key of the delivery batch this order belongs in
    pub fn batch_key(&self) -> BatchKey {
        BatchKey::new(
            self.batch_date,
            self.batch_slot.clone(),
            self.estate_or_hotel.clone(),
            self.shop_id.clone(),
        )
    }

    pub fn breakdown(&self) -> PriceBreakdown {
        PriceBreakdown {
            subtotal: self.subtotal,
            service_fee: self.service_fee,
            vat: self.vat,
            delivery_fee: self.delivery_fee,
            total: self.total,
        }
    }
}

/// Request DTO for checking out a cart
#[derive(Debug, Clone, Serialize, Deserialize, Validate, ToSchema)]
pub struct CheckoutRequest {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub user_id: Option<String>,
    #[validate]
    pub items: Vec<OrderItem>,
    #[schema(example = "Lekki Gardens Phase 2")]
    #[validate(length(min = 1, max = 200, message = "Estate or hotel is required"))]
    pub estate_or_hotel: String,
    #[schema(example = "Lagos")]
    #[validate(length(min = 1, message = "State is required"))]
    pub state: String,
    #[schema(example = "Eti-Osa")]
    #[validate(length(min = 1, message = "LGA is required"))]
    pub lga: String,
    #[schema(example = "10:00")]
    #[validate(custom = "crate::validation::validate_slot_time")]
    pub batch_slot: String,
    pub batch_date: NaiveDate,
}

/// Request DTO for confirming a successful payment
#[derive(Debug, Clone, Serialize, Deserialize, Validate, ToSchema)]
pub struct ConfirmPaymentRequest {
    pub order: Order,
    #[schema(example = "PSK_5f2c81d0")]
    #[validate(length(min = 1, max = 100, message = "Payment reference is required"))]
    pub payment_ref: String,
}

/// Request DTO for actions that only need the order
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct OrderActionRequest {
    pub order: Order,
}

/// Request DTO for advancing an order's fulfilment status
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct AdvanceOrderRequest {
    pub order: Order,
    pub status: OrderStatus,
}

/// Response for a confirmed payment: the paid order and the batch it joined
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct PaymentConfirmation {
    pub order: Order,
    pub batch: Batch,
}
