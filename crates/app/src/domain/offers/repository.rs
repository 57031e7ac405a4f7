//! Offers Repository

use jiff::Timestamp;
use jiff_sqlx::Timestamp as SqlxTimestamp;
use sqlx::{FromRow, Postgres, Row, Transaction, postgres::PgRow, query, query_as};
use uuid::Uuid;

use crate::domain::{
    categories::records::CategoryUuid,
    offers::{
        data::NewOffer,
        records::{OfferRecord, OfferTarget, OfferUuid},
    },
    pricing::Percentage,
    products::records::ProductUuid,
};

const CREATE_OFFER_SQL: &str = include_str!("sql/create_offer.sql");
const LIST_OFFERS_SQL: &str = include_str!("sql/list_offers.sql");
const LIST_LIVE_OFFERS_SQL: &str = include_str!("sql/list_live_offers.sql");
const DEACTIVATE_OFFER_SQL: &str = include_str!("sql/deactivate_offer.sql");

#[derive(Debug, Clone, Default)]
pub(crate) struct PgOffersRepository;

impl PgOffersRepository {
    #[must_use]
    pub(crate) fn new() -> Self {
        Self
    }

    pub(crate) async fn create_offer(
        &self,
        tx: &mut Transaction<'_, Postgres>,
        offer: &NewOffer,
    ) -> Result<OfferRecord, sqlx::Error> {
        let (product_uuid, category_uuid) = match offer.target {
            OfferTarget::Product(uuid) => (Some(uuid.into_uuid()), None),
            OfferTarget::Category(uuid) => (None, Some(uuid.into_uuid())),
        };

        query_as::<Postgres, OfferRecord>(CREATE_OFFER_SQL)
            .bind(offer.uuid.into_uuid())
            .bind(product_uuid)
            .bind(category_uuid)
            .bind(i16::from(offer.percentage.get()))
            .bind(SqlxTimestamp::from(offer.valid_from))
            .bind(SqlxTimestamp::from(offer.valid_upto))
            .fetch_one(&mut **tx)
            .await
    }

    pub(crate) async fn list_offers(
        &self,
        tx: &mut Transaction<'_, Postgres>,
    ) -> Result<Vec<OfferRecord>, sqlx::Error> {
        query_as::<Postgres, OfferRecord>(LIST_OFFERS_SQL)
            .fetch_all(&mut **tx)
            .await
    }

    /// Offers live at `at` that target any of `products` or `categories`.
    pub(crate) async fn list_live_offers(
        &self,
        tx: &mut Transaction<'_, Postgres>,
        products: &[ProductUuid],
        categories: &[CategoryUuid],
        at: Timestamp,
    ) -> Result<Vec<OfferRecord>, sqlx::Error> {
        let product_uuids: Vec<Uuid> = products.iter().map(|uuid| uuid.into_uuid()).collect();
        let category_uuids: Vec<Uuid> = categories.iter().map(|uuid| uuid.into_uuid()).collect();

        query_as::<Postgres, OfferRecord>(LIST_LIVE_OFFERS_SQL)
            .bind(&product_uuids)
            .bind(&category_uuids)
            .bind(SqlxTimestamp::from(at))
            .fetch_all(&mut **tx)
            .await
    }

    pub(crate) async fn deactivate_offer(
        &self,
        tx: &mut Transaction<'_, Postgres>,
        offer: OfferUuid,
    ) -> Result<u64, sqlx::Error> {
        let rows_affected = query(DEACTIVATE_OFFER_SQL)
            .bind(offer.into_uuid())
            .execute(&mut **tx)
            .await?
            .rows_affected();

        Ok(rows_affected)
    }
}

impl<'r> FromRow<'r, PgRow> for OfferRecord {
    fn from_row(row: &'r PgRow) -> sqlx::Result<Self> {
        let product_uuid: Option<Uuid> = row.try_get("product_uuid")?;
        let category_uuid: Option<Uuid> = row.try_get("category_uuid")?;

        let target = match (product_uuid, category_uuid) {
            (Some(uuid), None) => OfferTarget::Product(ProductUuid::from_uuid(uuid)),
            (None, Some(uuid)) => OfferTarget::Category(CategoryUuid::from_uuid(uuid)),
            _ => {
                return Err(sqlx::Error::ColumnDecode {
                    index: "product_uuid".to_string(),
                    source: "offer must target exactly one product or category".into(),
                });
            }
        };

        let percentage: i16 = row.try_get("percentage")?;

        let percentage = u8::try_from(percentage)
            .map_err(|e| sqlx::Error::ColumnDecode {
                index: "percentage".to_string(),
                source: Box::new(e),
            })
            .and_then(|value| {
                Percentage::new(value).map_err(|e| sqlx::Error::ColumnDecode {
                    index: "percentage".to_string(),
                    source: Box::new(e),
                })
            })?;

        Ok(Self {
            uuid: OfferUuid::from_uuid(row.try_get("uuid")?),
            target,
            percentage,
            valid_from: row.try_get::<SqlxTimestamp, _>("valid_from")?.to_jiff(),
            valid_upto: row.try_get::<SqlxTimestamp, _>("valid_upto")?.to_jiff(),
            is_active: row.try_get("is_active")?,
            created_at: row.try_get::<SqlxTimestamp, _>("created_at")?.to_jiff(),
            updated_at: row.try_get::<SqlxTimestamp, _>("updated_at")?.to_jiff(),
        })
    }
}
