// Application configuration
// Read from the environment (and .env via dotenv) with defaults for every value

use rust_decimal::Decimal;
use std::str::FromStr;

use crate::batches::{BatchConfig, DEFAULT_BATCH_THRESHOLD, DEFAULT_MAX_ATTEMPTS};
use crate::pricing::PricingConfig;

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ConfigError {
    #[error("{key} has an invalid value '{value}': {reason}")]
    Invalid {
        key: &'static str,
        value: String,
        reason: String,
    },
}

#[derive(Debug, Clone, PartialEq)]
pub struct AppConfig {
    pub host: String,
    pub port: u16,
    pub database_url: Option<String>,
    pub pricing: PricingConfig,
    pub batches: BatchConfig,
}

impl AppConfig {
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Build the configuration from any key lookup
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, ConfigError> {
        let defaults = PricingConfig::default();

        let pricing = PricingConfig {
            service_fee_rate: rate(&lookup, "SERVICE_FEE_RATE", defaults.service_fee_rate)?,
            vat_rate: rate(&lookup, "VAT_RATE", defaults.vat_rate)?,
            delivery_fee: parsed(&lookup, "DELIVERY_FEE", defaults.delivery_fee)?,
        };
        if pricing.delivery_fee.is_sign_negative() && !pricing.delivery_fee.is_zero() {
            return Err(ConfigError::Invalid {
                key: "DELIVERY_FEE",
                value: pricing.delivery_fee.to_string(),
                reason: "must not be negative".to_string(),
            });
        }

        let batches = BatchConfig {
            default_threshold: at_least_one(&lookup, "BATCH_THRESHOLD", DEFAULT_BATCH_THRESHOLD)?,
            max_attempts: at_least_one(&lookup, "BATCH_MAX_ATTEMPTS", DEFAULT_MAX_ATTEMPTS)?,
        };

        Ok(Self {
            host: lookup("HOST").unwrap_or_else(|| "0.0.0.0".to_string()),
            port: parsed(&lookup, "PORT", 8080)?,
            database_url: lookup("DATABASE_URL").filter(|url| !url.trim().is_empty()),
            pricing,
            batches,
        })
    }

    pub fn addr(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }
}

fn parsed<T>(
    lookup: &impl Fn(&str) -> Option<String>,
    key: &'static str,
    default: T,
) -> Result<T, ConfigError>
where
    T: FromStr,
    T::Err: std::fmt::Display,
{
    match lookup(key) {
        None => Ok(default),
        Some(value) => value.trim().parse().map_err(|e: T::Err| ConfigError::Invalid {
            key,
            reason: e.to_string(),
            value,
        }),
    }
}

fn rate(
    lookup: &impl Fn(&str) -> Option<String>,
    key: &'static str,
    default: Decimal,
) -> Result<Decimal, ConfigError> {
    let value: Decimal = parsed(lookup, key, default)?;
    if value < Decimal::ZERO || value > Decimal::ONE {
        return Err(ConfigError::Invalid {
            key,
            value: value.to_string(),
            reason: "must be between 0 and 1".to_string(),
        });
    }
    Ok(value)
}

fn at_least_one(
    lookup: &impl Fn(&str) -> Option<String>,
    key: &'static str,
    default: u32,
) -> Result<u32, ConfigError> {
    let value: u32 = parsed(lookup, key, default)?;
    if value == 0 {
        return Err(ConfigError::Invalid {
            key,
            value: value.to_string(),
            reason: "must be at least 1".to_string(),
        });
    }
    Ok(value)
}
