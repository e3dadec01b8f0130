use crate::pricing::PricingEngine;

/// Apply a promotional code from the default code table.
///
/// Returns `(discounted_amount, discount_amount)` in cents. Codes are matched
/// case-insensitively and unknown codes leave the amount untouched.
pub fn apply_discount(amount_cents: i64, code: &str) -> (i64, i64) {
    PricingEngine::default().apply_discount(amount_cents, code)
}
