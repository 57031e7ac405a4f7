//! Offer Records

use jiff::Timestamp;

use crate::{
    domain::{
        categories::records::CategoryUuid, pricing::Percentage, products::records::ProductUuid,
    },
    uuids::TypedUuid,
};

/// Offer UUID
pub type OfferUuid = TypedUuid<OfferRecord>;

/// What an offer discounts: a single product or a whole category.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OfferTarget {
    Product(ProductUuid),
    Category(CategoryUuid),
}

/// Offer Record
#[derive(Debug, Clone, PartialEq)]
pub struct OfferRecord {
    pub uuid: OfferUuid,
    pub target: OfferTarget,
    pub percentage: Percentage,
    pub valid_from: Timestamp,
    pub valid_upto: Timestamp,
    pub is_active: bool,
    pub created_at: Timestamp,
    pub updated_at: Timestamp,
}

impl OfferRecord {
    /// Whether the offer is active and `at` falls inside its inclusive window.
    #[must_use]
    pub fn is_live_at(&self, at: Timestamp) -> bool {
        self.is_active && self.valid_from <= at && at <= self.valid_upto
    }

    #[must_use]
    pub fn targets(&self, product: ProductUuid, category: CategoryUuid) -> bool {
        match self.target {
            OfferTarget::Product(uuid) => uuid == product,
            OfferTarget::Category(uuid) => uuid == category,
        }
    }
}
