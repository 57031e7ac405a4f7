//! Addresses service.

use async_trait::async_trait;
use mockall::automock;
use tracing::info;

use crate::{
    database::Db,
    domain::{
        addresses::{
            data::NewAddress,
            errors::AddressesServiceError,
            records::{AddressRecord, AddressUuid},
            repository::PgAddressesRepository,
        },
        users::records::UserUuid,
    },
};

#[derive(Debug, Clone)]
pub struct PgAddressesService {
    db: Db,
    repository: PgAddressesRepository,
}

impl PgAddressesService {
    #[must_use]
    pub fn new(db: Db) -> Self {
        Self {
            db,
            repository: PgAddressesRepository::new(),
        }
    }
}

#[async_trait]
impl AddressesService for PgAddressesService {
    async fn list_addresses(
        &self,
        user: UserUuid,
    ) -> Result<Vec<AddressRecord>, AddressesServiceError> {
        let mut tx = self.db.begin_transaction().await?;

        let addresses = self.repository.list_addresses(&mut tx, user).await?;

        tx.commit().await?;

        Ok(addresses)
    }

    #[tracing::instrument(
        name = "addresses.service.create_address",
        skip(self, address),
        fields(user_uuid = %user, address_uuid = %address.uuid),
        err
    )]
    async fn create_address(
        &self,
        user: UserUuid,
        address: NewAddress,
    ) -> Result<AddressRecord, AddressesServiceError> {
        let required = [
            &address.name,
            &address.phone,
            &address.line1,
            &address.city,
            &address.state,
            &address.postal_code,
        ];

        if required.iter().any(|value| value.trim().is_empty()) {
            return Err(AddressesServiceError::MissingRequiredData);
        }

        let mut tx = self.db.begin_transaction().await?;

        let created = self
            .repository
            .create_address(&mut tx, user, &address)
            .await?;

        tx.commit().await?;

        info!(address_uuid = %created.uuid, is_primary = created.is_primary, "created address");

        Ok(created)
    }

    #[tracing::instrument(
        name = "addresses.service.set_primary",
        skip(self),
        fields(user_uuid = %user, address_uuid = %address),
        err
    )]
    async fn set_primary(
        &self,
        user: UserUuid,
        address: AddressUuid,
    ) -> Result<AddressRecord, AddressesServiceError> {
        let mut tx = self.db.begin_transaction().await?;

        let record = self.repository.set_primary(&mut tx, user, address).await?;

        tx.commit().await?;

        Ok(record)
    }
}

#[automock]
#[async_trait]
pub trait AddressesService: Send + Sync {
    /// The user's addresses, primary first.
    async fn list_addresses(
        &self,
        user: UserUuid,
    ) -> Result<Vec<AddressRecord>, AddressesServiceError>;

    /// Add an address. The first one a user adds becomes primary.
    async fn create_address(
        &self,
        user: UserUuid,
        address: NewAddress,
    ) -> Result<AddressRecord, AddressesServiceError>;

    /// Make one of the user's addresses the primary one.
    async fn set_primary(
        &self,
        user: UserUuid,
        address: AddressUuid,
    ) -> Result<AddressRecord, AddressesServiceError>;
}

#[cfg(all(test, feature = "integration-tests"))]
mod tests {
    use testresult::TestResult;

    use crate::test::{TestContext, helpers::new_address};

    use super::*;

    #[tokio::test]
    async fn first_address_becomes_primary() -> TestResult {
        let ctx = TestContext::new().await;
        let user = ctx.create_user("first@example.com").await;

        let first = ctx.addresses.create_address(user, new_address()).await?;
        let second = ctx.addresses.create_address(user, new_address()).await?;

        assert!(first.is_primary, "first address should be primary");
        assert!(!second.is_primary, "second address should not be primary");

        Ok(())
    }

    #[tokio::test]
    async fn set_primary_moves_the_flag() -> TestResult {
        let ctx = TestContext::new().await;
        let user = ctx.create_user("move@example.com").await;

        let first = ctx.addresses.create_address(user, new_address()).await?;
        let second = ctx.addresses.create_address(user, new_address()).await?;

        ctx.addresses.set_primary(user, second.uuid).await?;

        let addresses = ctx.addresses.list_addresses(user).await?;

        let primaries: Vec<AddressUuid> = addresses
            .iter()
            .filter(|address| address.is_primary)
            .map(|address| address.uuid)
            .collect();

        assert_eq!(primaries, vec![second.uuid]);
        assert_ne!(first.uuid, second.uuid);

        Ok(())
    }

    #[tokio::test]
    async fn set_primary_on_another_users_address_returns_not_found() -> TestResult {
        let ctx = TestContext::new().await;
        let owner = ctx.create_user("owner@example.com").await;
        let intruder = ctx.create_user("intruder@example.com").await;

        let address = ctx.addresses.create_address(owner, new_address()).await?;

        let result = ctx.addresses.set_primary(intruder, address.uuid).await;

        assert!(
            matches!(result, Err(AddressesServiceError::NotFound)),
            "expected NotFound, got {result:?}"
        );

        Ok(())
    }
}
