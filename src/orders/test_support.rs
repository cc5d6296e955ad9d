use chrono::{NaiveDate, Utc};
use rust_decimal::Decimal;

use crate::orders::{Order, OrderStatus, PaymentStatus};

/// A paid order for the 10:00 Lekki Gardens slot of shop-1 on 2025-03-14
pub(crate) fn order(id: &str, total: Decimal) -> Order {
    let now = Utc::now();
    Order {
        id: id.to_string(),
        user_id: None,
        items: Vec::new(),
        subtotal: total,
        delivery_fee: Decimal::ZERO,
        service_fee: Decimal::ZERO,
        vat: Decimal::ZERO,
        total,
        estate_or_hotel: "Lekki Gardens".to_string(),
        state: "Lagos".to_string(),
        lga: "Eti-Osa".to_string(),
        shop_id: "shop-1".to_string(),
        batch_slot: "10:00".to_string(),
        batch_date: NaiveDate::from_ymd_opt(2025, 3, 14).unwrap(),
        batch_id: None,
        payment_ref: Some(format!("PSK_{}", id)),
        payment_status: PaymentStatus::Paid,
        status: OrderStatus::Paid,
        created_at: now,
        updated_at: now,
    }
}
