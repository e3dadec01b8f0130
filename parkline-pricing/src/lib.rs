pub mod discount;
pub mod pricing;

pub use discount::apply_discount;
pub use pricing::{calculate_parking_fee, DurationTier, PricingConfig, PricingEngine, PricingError, Quote};
