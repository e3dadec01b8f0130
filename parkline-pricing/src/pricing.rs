use chrono::Duration;
use parkline_core::TimeWindow;
use parkline_shared::{format_currency, format_duration};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// Percentage off for stays longer than `min_hours_exclusive` billable hours.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct DurationTier {
    pub min_hours_exclusive: i64,
    pub discount: f64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct PricingConfig {
    /// Hourly rate per vehicle type, in cents
    pub hourly_rates_cents: HashMap<String, i64>,

    /// Rate used for vehicle types missing from the table
    pub default_vehicle_type: String,

    /// Applied to the hourly rate of premium spaces
    pub premium_multiplier: f64,

    /// Long-stay bands. Only the highest matching band applies.
    pub duration_tiers: Vec<DurationTier>,

    /// Promotional codes and their fractional discount (e.g. "WEEKEND" => 0.15)
    pub discount_codes: HashMap<String, f64>,

    pub currency: String,
}

impl Default for PricingConfig {
    fn default() -> Self {
        Self {
            hourly_rates_cents: {
                let mut m = HashMap::new();
                m.insert("motorcycle".to_string(), 200);
                m.insert("car".to_string(), 500);
                m.insert("suv".to_string(), 700);
                m.insert("truck".to_string(), 1000);
                m
            },
            default_vehicle_type: "car".to_string(),
            premium_multiplier: 1.5,
            duration_tiers: vec![
                DurationTier { min_hours_exclusive: 12, discount: 0.10 },
                DurationTier { min_hours_exclusive: 24, discount: 0.20 },
            ],
            discount_codes: {
                let mut m = HashMap::new();
                m.insert("NEWUSER".to_string(), 0.20);
                m.insert("WEEKEND".to_string(), 0.15);
                m.insert("LOYALTY".to_string(), 0.10);
                m
            },
            currency: "USD".to_string(),
        }
    }
}

#[derive(Debug, thiserror::Error)]
pub enum PricingError {
    #[error("No hourly rate configured for default vehicle type {0}")]
    MissingDefaultRate(String),

    #[error("Invalid multiplier {0}, must be positive")]
    InvalidMultiplier(f64),

    #[error("Invalid discount {value} for {name}, must be within [0, 1)")]
    InvalidDiscount { name: String, value: f64 },
}

/// Priced stay, ready for display or for recording a payment.
#[derive(Debug, Clone, Serialize)]
pub struct Quote {
    pub vehicle_type: String,
    pub billable_hours: i64,
    pub duration: String,
    pub fee_cents: i64,
    pub discount_code: Option<String>,
    pub discount_cents: i64,
    pub total_cents: i64,
    pub currency: String,
    pub total_display: String,
}

/// Parking fee calculator
pub struct PricingEngine {
    config: PricingConfig,
}

impl PricingEngine {
    pub fn new(config: PricingConfig) -> Result<Self, PricingError> {
        let config = normalize(config);

        if !config.hourly_rates_cents.contains_key(&config.default_vehicle_type) {
            return Err(PricingError::MissingDefaultRate(config.default_vehicle_type));
        }
        if config.premium_multiplier <= 0.0 {
            return Err(PricingError::InvalidMultiplier(config.premium_multiplier));
        }
        for tier in &config.duration_tiers {
            check_fraction(&format!(">{}h tier", tier.min_hours_exclusive), tier.discount)?;
        }
        for (code, value) in &config.discount_codes {
            check_fraction(code, *value)?;
        }

        Ok(Self { config })
    }

    pub fn config(&self) -> &PricingConfig {
        &self.config
    }

    /// Hours charged for a stay. Partial hours always round up.
    pub fn billable_hours(duration: Duration) -> i64 {
        let seconds = duration.num_seconds();
        if seconds <= 0 {
            return 0;
        }
        (seconds + 3599) / 3600
    }

    pub fn hourly_rate(&self, vehicle_type: &str) -> i64 {
        let key = vehicle_type.to_lowercase();
        self.config
            .hourly_rates_cents
            .get(&key)
            .or_else(|| self.config.hourly_rates_cents.get(&self.config.default_vehicle_type))
            .copied()
            .unwrap_or(0)
    }

    /// Long-stay discount fraction for a number of billable hours
    pub fn tier_discount(&self, billable_hours: i64) -> f64 {
        self.config
            .duration_tiers
            .iter()
            .find(|tier| billable_hours > tier.min_hours_exclusive)
            .map(|tier| tier.discount)
            .unwrap_or(0.0)
    }

    /// Fee in cents for parking `vehicle_type` for `duration`.
    pub fn calculate_fee(&self, vehicle_type: &str, duration: Duration, is_premium: bool) -> i64 {
        let hours = Self::billable_hours(duration);
        let mut rate = self.hourly_rate(vehicle_type) as f64;
        if is_premium {
            rate *= self.config.premium_multiplier;
        }

        let gross = hours as f64 * rate;
        (gross * (1.0 - self.tier_discount(hours))).round() as i64
    }

    /// Fractional discount for a promotional code, 0.0 when unknown.
    pub fn code_discount(&self, code: &str) -> f64 {
        self.config
            .discount_codes
            .get(&code.trim().to_uppercase())
            .copied()
            .unwrap_or(0.0)
    }

    /// Returns `(discounted_amount, discount_amount)`.
    pub fn apply_discount(&self, amount_cents: i64, code: &str) -> (i64, i64) {
        let discount = (amount_cents as f64 * self.code_discount(code)).round() as i64;
        (amount_cents - discount, discount)
    }

    pub fn quote(
        &self,
        vehicle_type: &str,
        window: &TimeWindow,
        is_premium: bool,
        discount_code: Option<&str>,
    ) -> Quote {
        let duration = window.duration();
        let fee_cents = self.calculate_fee(vehicle_type, duration, is_premium);

        let (total_cents, discount_cents, discount_code) = match discount_code {
            Some(code) if self.code_discount(code) > 0.0 => {
                let (total, discount) = self.apply_discount(fee_cents, code);
                (total, discount, Some(code.trim().to_uppercase()))
            }
            _ => (fee_cents, 0, None),
        };

        Quote {
            vehicle_type: vehicle_type.to_lowercase(),
            billable_hours: Self::billable_hours(duration),
            duration: format_duration(duration),
            fee_cents,
            discount_code,
            discount_cents,
            total_cents,
            currency: self.config.currency.clone(),
            total_display: format_currency(total_cents, &self.config.currency),
        }
    }
}

impl Default for PricingEngine {
    fn default() -> Self {
        Self {
            config: normalize(PricingConfig::default()),
        }
    }
}

/// Lower-cases vehicle keys, upper-cases codes, orders bands highest first
/// so the first matching band wins.
fn normalize(mut config: PricingConfig) -> PricingConfig {
    config.default_vehicle_type = config.default_vehicle_type.to_lowercase();
    config.hourly_rates_cents = config
        .hourly_rates_cents
        .into_iter()
        .map(|(k, v)| (k.to_lowercase(), v))
        .collect();
    config.discount_codes = config
        .discount_codes
        .into_iter()
        .map(|(k, v)| (k.to_uppercase(), v))
        .collect();
    config
        .duration_tiers
        .sort_by(|a, b| b.min_hours_exclusive.cmp(&a.min_hours_exclusive));
    config
}

fn check_fraction(name: &str, value: f64) -> Result<(), PricingError> {
    if !(0.0..1.0).contains(&value) {
        return Err(PricingError::InvalidDiscount {
            name: name.to_string(),
            value,
        });
    }
    Ok(())
}

/// Fee in cents using the default rate table.
pub fn calculate_parking_fee(vehicle_type: &str, duration: Duration, is_premium: bool) -> i64 {
    PricingEngine::default().calculate_fee(vehicle_type, duration, is_premium)
}
