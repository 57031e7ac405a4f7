//! Offer resolution
//!
//! A product's effective discount is the largest percentage among the live
//! offers that target it directly or target its category.

use jiff::Timestamp;

use crate::domain::{
    categories::records::CategoryUuid, offers::records::OfferRecord, pricing::Percentage,
    products::records::ProductUuid,
};

/// Resolve the discount for `product` in `category` at `at`.
///
/// Offers that are inactive, outside their window, or aimed elsewhere are
/// ignored. No applicable offer means no discount.
#[must_use]
pub fn resolve_discount(
    offers: &[OfferRecord],
    product: ProductUuid,
    category: CategoryUuid,
    at: Timestamp,
) -> Percentage {
    offers
        .iter()
        .filter(|offer| offer.is_live_at(at) && offer.targets(product, category))
        .map(|offer| offer.percentage)
        .max()
        .unwrap_or(Percentage::ZERO)
}
