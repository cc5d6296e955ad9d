// Validation utilities module
// Custom field validators used by the request DTOs

use rust_decimal::Decimal;
use validator::ValidationError;

/// Validates that a money amount is not negative
pub fn validate_non_negative_amount(amount: &Decimal) -> Result<(), ValidationError> {
    if amount.is_sign_negative() && !amount.is_zero() {
        Err(ValidationError::new("amount_must_not_be_negative"))
    } else {
        Ok(())
    }
}

/// Validates a slot start time in 24-hour `HH:MM` form
pub fn validate_slot_time(slot: &str) -> Result<(), ValidationError> {
    let valid = match slot.split_once(':') {
        Some((hours, minutes)) if hours.len() == 2 && minutes.len() == 2 => {
            matches!(
                (hours.parse::<u8>(), minutes.parse::<u8>()),
                (Ok(h), Ok(m)) if h < 24 && m < 60
            )
        }
        _ => false,
    };

    if valid {
        Ok(())
    } else {
        Err(ValidationError::new("invalid_slot_time"))
    }
}
