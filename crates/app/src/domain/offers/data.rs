//! Offer Data

use jiff::Timestamp;

use crate::domain::{
    offers::records::{OfferTarget, OfferUuid},
    pricing::Percentage,
};

/// New Offer Data
#[derive(Debug, Clone, PartialEq)]
pub struct NewOffer {
    pub uuid: OfferUuid,
    pub target: OfferTarget,
    pub percentage: Percentage,
    pub valid_from: Timestamp,
    pub valid_upto: Timestamp,
}
