/// Markup and commission arithmetic
///
/// All amounts are integer cents. Percentages are plain `f64` values in
/// `[0, 100]`. The hotel's markup is applied on top of the provider's base
/// price; the platform commission is taken out of the hotel's markup, so the
/// provider always receives the full base price.
use serde::{Deserialize, Serialize};
use thiserror::Error;

#[derive(Error, Debug, Clone, PartialEq)]
pub enum PricingError {
    #[error("{field} must be between 0 and 100, got {value}")]
    PercentageOutOfRange { field: &'static str, value: f64 },
    #[error("Unit price must be positive, got {0}")]
    NonPositivePrice(i64),
    #[error("Quantity must be positive, got {0}")]
    NonPositiveQuantity(i32),
    #[error("Price overflow")]
    Overflow,
}

/// Full price split for one booking
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct PriceBreakdown {
    /// Provider's unit price times quantity
    pub base_price_cents: i64,
    pub markup_percentage: f64,
    pub markup_amount_cents: i64,
    /// Platform's cut of the markup
    pub platform_fee_cents: i64,
    pub hotel_earnings_cents: i64,
    pub provider_earnings_cents: i64,
    /// What the guest pays
    pub total_price_cents: i64,
}

/// Checks that a percentage is a finite value within `[0, 100]`
pub fn validate_percentage(field: &'static str, value: f64) -> Result<f64, PricingError> {
    if value.is_finite() && (0.0..=100.0).contains(&value) {
        Ok(value)
    } else {
        Err(PricingError::PercentageOutOfRange { field, value })
    }
}

/// Applies a percentage to an amount in cents, rounding half up
pub fn percentage_of(amount_cents: i64, percentage: f64) -> i64 {
    ((amount_cents as f64) * percentage / 100.0).round() as i64
}

/// Prices a booking
///
/// ### Arguments
///
/// * `unit_price_cents` - The provider's base price for one unit
/// * `quantity` - The number of units booked
/// * `markup_percentage` - The hotel's markup on this provider
/// * `commission_percentage` - The platform's share of the markup
///
/// ### Returns
///
/// The breakdown, where `total == provider + hotel + platform fee`
///
/// ### Errors
///
/// Returns an error if a percentage is out of range, the price or quantity
/// is not positive, or the base price overflows
pub fn quote(
    unit_price_cents: i64,
    quantity: i32,
    markup_percentage: f64,
    commission_percentage: f64,
) -> Result<PriceBreakdown, PricingError> {
    if unit_price_cents <= 0 {
        return Err(PricingError::NonPositivePrice(unit_price_cents));
    }
    if quantity <= 0 {
        return Err(PricingError::NonPositiveQuantity(quantity));
    }
    let markup_percentage = validate_percentage("markup_percentage", markup_percentage)?;
    let commission_percentage = validate_percentage("platform_commission_percentage", commission_percentage)?;

    let base = unit_price_cents
        .checked_mul(i64::from(quantity))
        .ok_or(PricingError::Overflow)?;
    let markup = percentage_of(base, markup_percentage);
    let platform_fee = percentage_of(markup, commission_percentage);
    let total = base.checked_add(markup).ok_or(PricingError::Overflow)?;

    Ok(PriceBreakdown {
        base_price_cents: base,
        markup_percentage,
        markup_amount_cents: markup,
        platform_fee_cents: platform_fee,
        hotel_earnings_cents: markup - platform_fee,
        provider_earnings_cents: base,
        total_price_cents: total,
    })
}

/// The price a guest sees for one unit of a service
///
/// This is `quote` for a quantity of one. Larger quantities must be quoted
/// as a whole, since the markup is rounded once on the combined base.
pub fn guest_unit_price(unit_price_cents: i64, markup_percentage: f64) -> Result<i64, PricingError> {
    Ok(quote(unit_price_cents, 1, markup_percentage, 0.0)?.total_price_cents)
}
