//! Address Handlers

pub(crate) mod create;
pub(crate) mod index;
pub(crate) mod primary;

#[cfg(test)]
pub(crate) mod tests {
    use emporium_app::domain::addresses::records::{AddressRecord, AddressUuid};
    use jiff::Timestamp;

    use crate::test_helpers::TEST_USER;

    pub(crate) fn make_address(uuid: AddressUuid, is_primary: bool) -> AddressRecord {
        AddressRecord {
            uuid,
            user_uuid: TEST_USER,
            name: "Asha Rao".to_string(),
            phone: "9000000001".to_string(),
            line1: "12 Lake Road".to_string(),
            line2: None,
            city: "Kochi".to_string(),
            state: "Kerala".to_string(),
            postal_code: "682001".to_string(),
            is_primary,
            created_at: Timestamp::UNIX_EPOCH,
            updated_at: Timestamp::UNIX_EPOCH,
        }
    }
}
