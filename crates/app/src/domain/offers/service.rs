//! Offers service.

use async_trait::async_trait;
use jiff::Timestamp;
use mockall::automock;
use tracing::info;

use crate::{
    database::Db,
    domain::{
        offers::{
            data::NewOffer,
            errors::OffersServiceError,
            records::{OfferRecord, OfferUuid},
            repository::PgOffersRepository,
            resolver::resolve_discount,
        },
        pricing::Percentage,
        products::{PgProductsRepository, records::ProductUuid},
    },
};

#[derive(Debug, Clone)]
pub struct PgOffersService {
    db: Db,
    offers: PgOffersRepository,
    products: PgProductsRepository,
}

impl PgOffersService {
    #[must_use]
    pub fn new(db: Db) -> Self {
        Self {
            db,
            offers: PgOffersRepository::new(),
            products: PgProductsRepository::new(),
        }
    }
}

#[async_trait]
impl OffersService for PgOffersService {
    #[tracing::instrument(
        name = "offers.service.create_offer",
        skip(self, offer),
        fields(offer_uuid = %offer.uuid, percentage = offer.percentage.get()),
        err
    )]
    async fn create_offer(&self, offer: NewOffer) -> Result<OfferRecord, OffersServiceError> {
        if offer.valid_from > offer.valid_upto {
            return Err(OffersServiceError::InvalidData);
        }

        let mut tx = self.db.begin_transaction().await?;

        let created = self.offers.create_offer(&mut tx, &offer).await?;

        tx.commit().await?;

        info!(offer_uuid = %created.uuid, "created offer");

        Ok(created)
    }

    async fn list_offers(&self) -> Result<Vec<OfferRecord>, OffersServiceError> {
        let mut tx = self.db.begin_transaction().await?;

        let offers = self.offers.list_offers(&mut tx).await?;

        tx.commit().await?;

        Ok(offers)
    }

    async fn deactivate_offer(&self, offer: OfferUuid) -> Result<(), OffersServiceError> {
        let mut tx = self.db.begin_transaction().await?;

        let rows_affected = self.offers.deactivate_offer(&mut tx, offer).await?;

        if rows_affected == 0 {
            return Err(OffersServiceError::NotFound);
        }

        tx.commit().await?;

        info!(offer_uuid = %offer, "deactivated offer");

        Ok(())
    }

    async fn resolve_discount(
        &self,
        product: ProductUuid,
        at: Timestamp,
    ) -> Result<Percentage, OffersServiceError> {
        let mut tx = self.db.begin_transaction().await?;

        let record = self.products.get_product(&mut tx, product).await?;

        let offers = self
            .offers
            .list_live_offers(&mut tx, &[product], &[record.category_uuid], at)
            .await?;

        tx.commit().await?;

        Ok(resolve_discount(&offers, product, record.category_uuid, at))
    }
}

#[automock]
#[async_trait]
pub trait OffersService: Send + Sync {
    /// Creates a product or category offer.
    async fn create_offer(&self, offer: NewOffer) -> Result<OfferRecord, OffersServiceError>;

    /// Retrieves all offers, newest first.
    async fn list_offers(&self) -> Result<Vec<OfferRecord>, OffersServiceError>;

    /// Stops an offer from applying without deleting it.
    async fn deactivate_offer(&self, offer: OfferUuid) -> Result<(), OffersServiceError>;

    /// Effective discount for a product at the given instant.
    async fn resolve_discount(
        &self,
        product: ProductUuid,
        at: Timestamp,
    ) -> Result<Percentage, OffersServiceError>;
}
