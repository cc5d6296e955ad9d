use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;
use validator::Validate;

/// Default service fee rate (2%)
pub const DEFAULT_SERVICE_FEE_RATE: Decimal = Decimal::from_parts(2, 0, 0, false, 2);

/// Default VAT rate (7.5%)
pub const DEFAULT_VAT_RATE: Decimal = Decimal::from_parts(75, 0, 0, false, 3);

/// Default flat delivery fee in naira
pub const DEFAULT_DELIVERY_FEE: Decimal = Decimal::from_parts(400, 0, 0, false, 0);

/// A single line of a shopping cart
///
/// Cart lines live only for the duration of a shopping session and are never
/// persisted by the pricing engine.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Validate, ToSchema)]
pub struct CartLine {
    #[schema(example = "prod-rice-5kg")]
    #[validate(length(min = 1, message = "Product id must not be empty"))]
    pub product_id: String,
    #[schema(value_type = String, example = "5000.00")]
    #[validate(custom = "crate::validation::validate_non_negative_amount")]
    pub unit_price: Decimal,
    #[schema(example = 2)]
    #[validate(range(min = 1, message = "Quantity must be at least 1"))]
    pub quantity: u32,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub notes: Option<String>,
}

impl CartLine {
    pub fn new(product_id: impl Into<String>, unit_price: Decimal, quantity: u32) -> Self {
        Self {
            product_id: product_id.into(),
            unit_price,
            quantity,
            notes: None,
        }
    }
}

/// Cost breakdown of a cart snapshot
///
/// Every component is rounded to two decimal places and
/// `total == subtotal + delivery_fee + service_fee + vat` holds exactly.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
pub struct PriceBreakdown {
    #[schema(value_type = String, example = "10000.00")]
    pub subtotal: Decimal,
    #[schema(value_type = String, example = "200.00")]
    pub service_fee: Decimal,
    #[schema(value_type = String, example = "795.00")]
    pub vat: Decimal,
    #[schema(value_type = String, example = "400.00")]
    pub delivery_fee: Decimal,
    #[schema(value_type = String, example = "11395.00")]
    pub total: Decimal,
}

impl PriceBreakdown {
    /// Amount VAT is charged on: goods plus service fee plus delivery
    pub fn vat_base(&self) -> Decimal {
        self.subtotal + self.service_fee + self.delivery_fee
    }
}

/// Rates and fees applied by the pricing engine
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
pub struct PricingConfig {
    #[schema(value_type = String, example = "0.02")]
    pub service_fee_rate: Decimal,
    #[schema(value_type = String, example = "0.075")]
    pub vat_rate: Decimal,
    #[schema(value_type = String, example = "400")]
    pub delivery_fee: Decimal,
}

impl Default for PricingConfig {
    fn default() -> Self {
        Self {
            service_fee_rate: DEFAULT_SERVICE_FEE_RATE,
            vat_rate: DEFAULT_VAT_RATE,
            delivery_fee: DEFAULT_DELIVERY_FEE,
        }
    }
}

/// Request DTO for pricing a cart
#[derive(Debug, Clone, Serialize, Deserialize, Validate, ToSchema)]
pub struct QuoteRequest {
    #[validate]
    pub lines: Vec<CartLine>,
    /// Overrides the configured delivery fee when present
    #[serde(default)]
    #[schema(value_type = Option<String>)]
    #[validate(custom = "crate::validation::validate_non_negative_amount")]
    pub delivery_fee: Option<Decimal>,
}
