use rust_decimal::{Decimal, RoundingStrategy};

use crate::pricing::{CartLine, PriceBreakdown, PricingConfig, PricingError, PricingResult};

/// Decimal places used for naira amounts
pub const CURRENCY_DECIMAL_PLACES: u32 = 2;

/// Service for calculating cart prices and subtotals
pub struct PriceCalculator;

impl PriceCalculator {
    /// Calculate subtotal for a cart line (quantity * unit_price)
    pub fn calculate_subtotal(quantity: u32, unit_price: Decimal) -> PricingResult<Decimal> {
        unit_price
            .checked_mul(Decimal::from(quantity))
            .ok_or_else(|| PricingError::InvalidInput("line amount overflows".to_string()))
    }

    /// Calculate the sum of several amounts
    pub fn calculate_total(amounts: &[Decimal]) -> PricingResult<Decimal> {
        amounts.iter().try_fold(Decimal::ZERO, |acc, amount| {
            acc.checked_add(*amount)
                .ok_or_else(|| PricingError::InvalidInput("total overflows".to_string()))
        })
    }

    /// Round an amount to kobo precision, halves away from zero
    pub fn round_currency(amount: Decimal) -> Decimal {
        amount.round_dp_with_strategy(
            CURRENCY_DECIMAL_PLACES,
            RoundingStrategy::MidpointAwayFromZero,
        )
    }
}

/// Compute the price breakdown of a cart.
///
/// VAT is charged on subtotal + service fee + delivery fee. Intermediate
/// values keep full precision; only the reported components are rounded, and
/// the total is their sum.
///
/// # Errors
///
/// [`PricingError::InvalidInput`] when a unit price or the delivery fee is
/// negative, a quantity is zero, a rate falls outside `[0, 1]`, or an amount
/// overflows.
pub fn compute_price(
    lines: &[CartLine],
    delivery_fee: Decimal,
    service_fee_rate: Decimal,
    vat_rate: Decimal,
) -> PricingResult<PriceBreakdown> {
    validate_rate("service fee rate", service_fee_rate)?;
    validate_rate("VAT rate", vat_rate)?;
    if delivery_fee.is_sign_negative() && !delivery_fee.is_zero() {
        return Err(PricingError::InvalidInput(format!(
            "delivery fee must not be negative, got {}",
            delivery_fee
        )));
    }

    let line_amounts = lines
        .iter()
        .map(|line| {
            if line.unit_price.is_sign_negative() && !line.unit_price.is_zero() {
                return Err(PricingError::InvalidInput(format!(
                    "unit price of {} must not be negative, got {}",
                    line.product_id, line.unit_price
                )));
            }
            if line.quantity == 0 {
                return Err(PricingError::InvalidInput(format!(
                    "quantity of {} must be at least 1",
                    line.product_id
                )));
            }
            PriceCalculator::calculate_subtotal(line.quantity, line.unit_price)
        })
        .collect::<PricingResult<Vec<_>>>()?;

    let subtotal = PriceCalculator::calculate_total(&line_amounts)?;
    let service_fee = checked_mul(subtotal, service_fee_rate)?;
    let vat_base = PriceCalculator::calculate_total(&[subtotal, service_fee, delivery_fee])?;
    let vat = checked_mul(vat_base, vat_rate)?;

    let subtotal = PriceCalculator::round_currency(subtotal);
    let service_fee = PriceCalculator::round_currency(service_fee);
    let vat = PriceCalculator::round_currency(vat);
    let delivery_fee = PriceCalculator::round_currency(delivery_fee);
    let total = PriceCalculator::calculate_total(&[subtotal, delivery_fee, service_fee, vat])?;

    Ok(PriceBreakdown {
        subtotal,
        service_fee,
        vat,
        delivery_fee,
        total,
    })
}

fn validate_rate(name: &str, rate: Decimal) -> PricingResult<()> {
    if rate < Decimal::ZERO || rate > Decimal::ONE {
        return Err(PricingError::InvalidInput(format!(
            "{} must be between 0 and 1, got {}",
            name, rate
        )));
    }
    Ok(())
}

fn checked_mul(amount: Decimal, rate: Decimal) -> PricingResult<Decimal> {
    amount
        .checked_mul(rate)
        .ok_or_else(|| PricingError::InvalidInput("fee calculation overflows".to_string()))
}

/// Pricing engine bound to a fixed set of rates and delivery fee
#[derive(Debug, Clone, Default)]
pub struct PricingEngine {
    config: PricingConfig,
}

impl PricingEngine {
    pub fn new(config: PricingConfig) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &PricingConfig {
        &self.config
    }

    /// Price a cart with the configured delivery fee
    pub fn quote(&self, lines: &[CartLine]) -> PricingResult<PriceBreakdown> {
        self.quote_with_delivery_fee(lines, self.config.delivery_fee)
    }

    /// Price a cart with an explicit delivery fee
    pub fn quote_with_delivery_fee(
        &self,
        lines: &[CartLine],
        delivery_fee: Decimal,
    ) -> PricingResult<PriceBreakdown> {
        let breakdown = compute_price(
            lines,
            delivery_fee,
            self.config.service_fee_rate,
            self.config.vat_rate,
        )?;

        tracing::debug!(
            "Priced cart of {} lines: subtotal {}, total {}",
            lines.len(),
            format_naira(breakdown.subtotal),
            format_naira(breakdown.total)
        );

        Ok(breakdown)
    }
}

/// Format an amount as naira with thousands separators, e.g. `₦11,395.00`
pub fn format_naira(amount: Decimal) -> String {
    let rounded = PriceCalculator::round_currency(amount);
    let sign = if rounded.is_sign_negative() && !rounded.is_zero() {
        "-"
    } else {
        ""
    };
    let digits = format!("{:.2}", rounded.abs());
    let (whole, fraction) = digits.split_once('.').unwrap_or((digits.as_str(), "00"));

    let mut grouped = String::with_capacity(whole.len() + whole.len() / 3);
    for (index, ch) in whole.chars().enumerate() {
        if index > 0 && (whole.len() - index) % 3 == 0 {
            grouped.push(',');
        }
        grouped.push(ch);
    }

    format!("{}₦{}.{}", sign, grouped, fraction)
}


#[cfg(test)]
mod property_tests {
    use super::*;
    use proptest::prelude::*;
    use rust_decimal_macros::dec;

    fn cart_strategy() -> impl Strategy<Value = Vec<CartLine>> {
        prop::collection::vec((1u32..=5_000_000u32, 1u32..=50), 0..=15).prop_map(|raw| {
            raw.into_iter()
                .enumerate()
                .map(|(index, (kobo, quantity))| {
                    CartLine::new(
                        format!("product-{}", index),
                        Decimal::from(kobo) / Decimal::from(100),
                        quantity,
                    )
                })
                .collect()
        })
    }

    /// Total always equals the sum of the reported components
    #[test]
    fn prop_total_equals_sum_of_components() {
        proptest!(|(lines in cart_strategy(), fee in 0u32..=5000u32)| {
            let breakdown = compute_price(&lines, Decimal::from(fee), dec!(0.02), dec!(0.075)).unwrap();
            prop_assert_eq!(
                breakdown.total,
                breakdown.subtotal + breakdown.delivery_fee + breakdown.service_fee + breakdown.vat
            );
        });
    }

    /// Components follow the documented formulas after rounding
    #[test]
    fn prop_components_follow_formulas() {
        proptest!(|(lines in cart_strategy(), fee in 0u32..=5000u32)| {
            let fee = Decimal::from(fee);
            let breakdown = compute_price(&lines, fee, dec!(0.02), dec!(0.075)).unwrap();

            let raw_subtotal: Decimal = lines
                .iter()
                .map(|line| line.unit_price * Decimal::from(line.quantity))
                .sum();
            let raw_service = raw_subtotal * dec!(0.02);
            let raw_vat = (raw_subtotal + raw_service + fee) * dec!(0.075);

            prop_assert_eq!(breakdown.subtotal, PriceCalculator::round_currency(raw_subtotal));
            prop_assert_eq!(breakdown.service_fee, PriceCalculator::round_currency(raw_service));
            prop_assert_eq!(breakdown.vat, PriceCalculator::round_currency(raw_vat));
        });
    }

    /// Pricing is a pure function of its input
    #[test]
    fn prop_compute_price_is_idempotent() {
        proptest!(|(lines in cart_strategy(), fee in 0u32..=5000u32)| {
            let first = compute_price(&lines, Decimal::from(fee), dec!(0.02), dec!(0.075));
            let second = compute_price(&lines, Decimal::from(fee), dec!(0.02), dec!(0.075));
            prop_assert_eq!(first, second);
        });
    }

    /// Every component is non-negative for valid input
    #[test]
    fn prop_components_are_non_negative() {
        proptest!(|(lines in cart_strategy(), fee in 0u32..=5000u32)| {
            let breakdown = compute_price(&lines, Decimal::from(fee), dec!(0.02), dec!(0.075)).unwrap();
            prop_assert!(breakdown.subtotal >= Decimal::ZERO);
            prop_assert!(breakdown.service_fee >= Decimal::ZERO);
            prop_assert!(breakdown.vat >= Decimal::ZERO);
            prop_assert!(breakdown.total >= breakdown.subtotal);
        });
    }

    /// An empty cart costs the delivery fee plus VAT on it
    #[test]
    fn prop_empty_cart_total() {
        proptest!(|(fee in 0u32..=100_000u32)| {
            let fee = Decimal::from(fee);
            let breakdown = compute_price(&[], fee, dec!(0.02), dec!(0.075)).unwrap();
            prop_assert_eq!(breakdown.subtotal, Decimal::ZERO);
            prop_assert_eq!(breakdown.vat, PriceCalculator::round_currency(fee * dec!(0.075)));
            prop_assert_eq!(breakdown.total, PriceCalculator::round_currency(fee * dec!(1.075)));
        });
    }
}
