//! Products Repository

use jiff_sqlx::Timestamp as SqlxTimestamp;
use rustc_hash::FxHashMap;
use sqlx::{FromRow, Postgres, Row, Transaction, postgres::PgRow, query, query_as};
use uuid::Uuid;

use crate::{
    database::{amount_to_db, count_to_db, try_get_amount, try_get_count},
    domain::{
        categories::records::CategoryUuid,
        products::{
            data::NewProduct,
            records::{ProductRecord, ProductUuid, Size, StockLevel},
        },
    },
};

const CREATE_PRODUCT_SQL: &str = include_str!("sql/create_product.sql");
const GET_PRODUCTS_SQL: &str = include_str!("sql/get_products.sql");
const LIST_PRODUCTS_SQL: &str = include_str!("sql/list_products.sql");
const GET_STOCK_SQL: &str = include_str!("sql/get_stock.sql");
const SET_STOCK_SQL: &str = include_str!("sql/set_stock.sql");
const RESERVE_STOCK_SQL: &str = include_str!("sql/reserve_stock.sql");
const RESTORE_STOCK_SQL: &str = include_str!("sql/restore_stock.sql");
const BUMP_POPULARITY_SQL: &str = include_str!("sql/bump_popularity.sql");
const DELETE_PRODUCT_SQL: &str = include_str!("sql/delete_product.sql");

#[derive(Debug, Clone, Default)]
pub(crate) struct PgProductsRepository;

impl PgProductsRepository {
    #[must_use]
    pub(crate) fn new() -> Self {
        Self
    }

    pub(crate) async fn create_product(
        &self,
        tx: &mut Transaction<'_, Postgres>,
        product: &NewProduct,
    ) -> Result<ProductRecord, sqlx::Error> {
        let mut record = query_as::<Postgres, ProductRecord>(CREATE_PRODUCT_SQL)
            .bind(product.uuid.into_uuid())
            .bind(product.category_uuid.into_uuid())
            .bind(&product.name)
            .bind(&product.brand)
            .bind(amount_to_db(product.price)?)
            .fetch_one(&mut **tx)
            .await?;

        for &(size, available) in &product.stock {
            self.set_stock(tx, product.uuid, size, available).await?;

            record.stock.insert(
                size,
                StockLevel {
                    available,
                    sold: 0,
                },
            );
        }

        Ok(record)
    }

    /// Fetch a live product with its stock, failing with `RowNotFound` if absent.
    pub(crate) async fn get_product(
        &self,
        tx: &mut Transaction<'_, Postgres>,
        product: ProductUuid,
    ) -> Result<ProductRecord, sqlx::Error> {
        self.get_products(tx, &[product])
            .await?
            .into_iter()
            .next()
            .ok_or(sqlx::Error::RowNotFound)
    }

    /// Fetch every live product among `products`. Unknown or deleted ones are skipped.
    pub(crate) async fn get_products(
        &self,
        tx: &mut Transaction<'_, Postgres>,
        products: &[ProductUuid],
    ) -> Result<Vec<ProductRecord>, sqlx::Error> {
        let uuids: Vec<Uuid> = products.iter().map(|uuid| uuid.into_uuid()).collect();

        let records = query_as::<Postgres, ProductRecord>(GET_PRODUCTS_SQL)
            .bind(&uuids)
            .fetch_all(&mut **tx)
            .await?;

        self.attach_stock(tx, records).await
    }

    pub(crate) async fn list_products(
        &self,
        tx: &mut Transaction<'_, Postgres>,
    ) -> Result<Vec<ProductRecord>, sqlx::Error> {
        let records = query_as::<Postgres, ProductRecord>(LIST_PRODUCTS_SQL)
            .fetch_all(&mut **tx)
            .await?;

        self.attach_stock(tx, records).await
    }

    pub(crate) async fn set_stock(
        &self,
        tx: &mut Transaction<'_, Postgres>,
        product: ProductUuid,
        size: Size,
        available: u32,
    ) -> Result<u64, sqlx::Error> {
        let rows_affected = query(SET_STOCK_SQL)
            .bind(product.into_uuid())
            .bind(size.as_str())
            .bind(count_to_db(available)?)
            .execute(&mut **tx)
            .await?
            .rows_affected();

        Ok(rows_affected)
    }

    /// Move `quantity` units from available to sold.
    ///
    /// Returns the number of rows changed, which is zero when fewer than
    /// `quantity` units are available.
    pub(crate) async fn reserve_stock(
        &self,
        tx: &mut Transaction<'_, Postgres>,
        product: ProductUuid,
        size: Size,
        quantity: u32,
    ) -> Result<u64, sqlx::Error> {
        let rows_affected = query(RESERVE_STOCK_SQL)
            .bind(product.into_uuid())
            .bind(size.as_str())
            .bind(count_to_db(quantity)?)
            .execute(&mut **tx)
            .await?
            .rows_affected();

        Ok(rows_affected)
    }

    pub(crate) async fn restore_stock(
        &self,
        tx: &mut Transaction<'_, Postgres>,
        product: ProductUuid,
        size: Size,
        quantity: u32,
    ) -> Result<u64, sqlx::Error> {
        let rows_affected = query(RESTORE_STOCK_SQL)
            .bind(product.into_uuid())
            .bind(size.as_str())
            .bind(count_to_db(quantity)?)
            .execute(&mut **tx)
            .await?
            .rows_affected();

        Ok(rows_affected)
    }

    pub(crate) async fn bump_popularity(
        &self,
        tx: &mut Transaction<'_, Postgres>,
        product: ProductUuid,
        by: u64,
    ) -> Result<u64, sqlx::Error> {
        let rows_affected = query(BUMP_POPULARITY_SQL)
            .bind(product.into_uuid())
            .bind(amount_to_db(by)?)
            .execute(&mut **tx)
            .await?
            .rows_affected();

        Ok(rows_affected)
    }

    pub(crate) async fn delete_product(
        &self,
        tx: &mut Transaction<'_, Postgres>,
        product: ProductUuid,
    ) -> Result<u64, sqlx::Error> {
        let rows_affected = query(DELETE_PRODUCT_SQL)
            .bind(product.into_uuid())
            .execute(&mut **tx)
            .await?
            .rows_affected();

        Ok(rows_affected)
    }

    async fn attach_stock(
        &self,
        tx: &mut Transaction<'_, Postgres>,
        mut records: Vec<ProductRecord>,
    ) -> Result<Vec<ProductRecord>, sqlx::Error> {
        if records.is_empty() {
            return Ok(records);
        }

        let uuids: Vec<Uuid> = records.iter().map(|record| record.uuid.into_uuid()).collect();

        let rows = query_as::<Postgres, StockRow>(GET_STOCK_SQL)
            .bind(&uuids)
            .fetch_all(&mut **tx)
            .await?;

        let mut by_product: FxHashMap<ProductUuid, Vec<StockRow>> = FxHashMap::default();

        for row in rows {
            by_product.entry(row.product_uuid).or_default().push(row);
        }

        for record in &mut records {
            if let Some(rows) = by_product.remove(&record.uuid) {
                record.stock = rows.into_iter().map(|row| (row.size, row.level)).collect();
            }
        }

        Ok(records)
    }
}

struct StockRow {
    product_uuid: ProductUuid,
    size: Size,
    level: StockLevel,
}

impl<'r> FromRow<'r, PgRow> for StockRow {
    fn from_row(row: &'r PgRow) -> sqlx::Result<Self> {
        let size: String = row.try_get("size")?;

        Ok(Self {
            product_uuid: ProductUuid::from_uuid(row.try_get("product_uuid")?),
            size: size.parse().map_err(|e| sqlx::Error::ColumnDecode {
                index: "size".to_string(),
                source: Box::new(e),
            })?,
            level: StockLevel {
                available: try_get_count(row, "available")?,
                sold: try_get_count(row, "sold")?,
            },
        })
    }
}

impl<'r> FromRow<'r, PgRow> for ProductRecord {
    fn from_row(row: &'r PgRow) -> sqlx::Result<Self> {
        Ok(Self {
            uuid: ProductUuid::from_uuid(row.try_get("uuid")?),
            category_uuid: CategoryUuid::from_uuid(row.try_get("category_uuid")?),
            name: row.try_get("name")?,
            brand: row.try_get("brand")?,
            price: try_get_amount(row, "price")?,
            popularity: try_get_amount(row, "popularity")?,
            stock: FxHashMap::default(),
            created_at: row.try_get::<SqlxTimestamp, _>("created_at")?.to_jiff(),
            updated_at: row.try_get::<SqlxTimestamp, _>("updated_at")?.to_jiff(),
            deleted_at: row
                .try_get::<Option<SqlxTimestamp>, _>("deleted_at")?
                .map(SqlxTimestamp::to_jiff),
        })
    }
}
