//! Test Helpers

use crate::domain::addresses::{data::NewAddress, records::AddressUuid};

pub(crate) fn new_address() -> NewAddress {
    NewAddress {
        uuid: AddressUuid::new(),
        name: "Asha Rao".to_string(),
        phone: "9876543210".to_string(),
        line1: "12 MG Road".to_string(),
        line2: Some("Flat 4B".to_string()),
        city: "Bengaluru".to_string(),
        state: "Karnataka".to_string(),
        postal_code: "560001".to_string(),
    }
}
