//! Pricing
//!
//! Money is held as an unsigned count of minor currency units. Discounts are
//! whole percentages and the discounted unit price is rounded half-up to the
//! nearest minor unit.

use std::fmt;

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Largest quantity a single cart line may hold.
pub const MAX_LINE_QUANTITY: u32 = 10;

/// Whole-number discount percentage in `0..=100`.
#[derive(
    Debug, Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize,
)]
#[serde(try_from = "u8", into = "u8")]
pub struct Percentage(u8);

impl Percentage {
    pub const ZERO: Self = Self(0);

    /// Build a percentage, rejecting values above 100.
    ///
    /// # Errors
    ///
    /// Returns [`PercentageError`] when `value` exceeds 100.
    pub const fn new(value: u8) -> Result<Self, PercentageError> {
        if value > 100 {
            return Err(PercentageError(value));
        }

        Ok(Self(value))
    }

    #[must_use]
    pub const fn get(self) -> u8 {
        self.0
    }
}

impl TryFrom<u8> for Percentage {
    type Error = PercentageError;

    fn try_from(value: u8) -> Result<Self, Self::Error> {
        Self::new(value)
    }
}

impl From<Percentage> for u8 {
    fn from(value: Percentage) -> Self {
        value.0
    }
}

impl fmt::Display for Percentage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}%", self.0)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
#[error("percentage {0} is out of range")]
pub struct PercentageError(pub u8);

/// Apply `discount` to `initial`, rounding half-up to a whole minor unit.
#[must_use]
pub fn final_price(initial: u64, discount: Percentage) -> u64 {
    let kept = u128::from(100 - discount.get());
    let rounded = (u128::from(initial) * kept + 50) / 100;

    // Never above `initial`, so this always fits.
    u64::try_from(rounded).unwrap_or(initial)
}

/// Line total for `quantity` units at `unit_price`.
#[must_use]
pub fn line_total(unit_price: u64, quantity: u32) -> u64 {
    unit_price.saturating_mul(u64::from(quantity))
}

/// Render minor units with two decimal places, e.g. `12345` as `"123.45"`.
#[must_use]
pub fn format_amount(amount: u64) -> String {
    format!("{}.{:02}", amount / 100, amount % 100)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn pct(value: u8) -> Percentage {
        Percentage::new(value).expect("valid percentage")
    }

    #[test]
    fn zero_discount_keeps_price() {
        assert_eq!(final_price(1999, Percentage::ZERO), 1999);
    }

    #[test]
    fn full_discount_is_free() {
        assert_eq!(final_price(1999, pct(100)), 0);
    }

    #[test]
    fn rounds_half_up() {
        // 999 * 0.85 = 849.15
        assert_eq!(final_price(999, pct(15)), 849);

        // 10 * 0.95 = 9.5
        assert_eq!(final_price(10, pct(5)), 10);

        // 30 * 0.85 = 25.5
        assert_eq!(final_price(30, pct(15)), 26);
    }

    #[test]
    fn rejects_percentages_over_one_hundred() {
        assert_eq!(Percentage::new(101), Err(PercentageError(101)));
    }

    #[test]
    fn line_total_multiplies_unit_price() {
        assert_eq!(line_total(850, 3), 2550);
    }

    #[test]
    fn format_amount_pads_minor_units() {
        assert_eq!(format_amount(0), "0.00");
        assert_eq!(format_amount(5), "0.05");
        assert_eq!(format_amount(123_450), "1234.50");
    }

    #[test]
    fn percentage_deserializes_with_range_check() {
        let ok: Result<Percentage, _> = serde_json::from_str("20");
        let too_big: Result<Percentage, _> = serde_json::from_str("120");

        assert_eq!(ok.ok(), Some(pct(20)));
        assert!(too_big.is_err(), "120 should not deserialize");
    }
}
