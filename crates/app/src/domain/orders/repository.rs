//! Orders Repository

use jiff_sqlx::Timestamp as SqlxTimestamp;
use sqlx::{
    FromRow, Postgres, Row, Transaction, postgres::PgRow, query, query_as, query_scalar,
    types::Json,
};

use crate::{
    database::{amount_to_db, count_to_db, try_get_amount, try_get_count},
    domain::{
        addresses::records::AddressSnapshot,
        orders::{
            data::NewOrder,
            records::{OrderRecord, OrderStatus, OrderUuid},
        },
        payments::records::{PaymentMethod, PaymentUuid},
        products::records::{ProductUuid, Size},
        users::records::UserUuid,
    },
};

const CREATE_ORDER_SQL: &str = include_str!("sql/create_order.sql");
const GET_ORDER_SQL: &str = include_str!("sql/get_order.sql");
const LOCK_ORDER_SQL: &str = include_str!("sql/lock_order.sql");
const LIST_ORDERS_SQL: &str = include_str!("sql/list_orders.sql");
const LIST_PAYMENT_ORDERS_SQL: &str = include_str!("sql/list_payment_orders.sql");
const UPDATE_STATUS_SQL: &str = include_str!("sql/update_status.sql");
const COUNT_ORDERS_FOR_USER_SQL: &str = include_str!("sql/count_orders_for_user.sql");

#[derive(Debug, Clone, Default)]
pub(crate) struct PgOrdersRepository;

impl PgOrdersRepository {
    #[must_use]
    pub(crate) fn new() -> Self {
        Self
    }

    pub(crate) async fn create_order(
        &self,
        tx: &mut Transaction<'_, Postgres>,
        order: &NewOrder,
    ) -> Result<OrderRecord, sqlx::Error> {
        query_as::<Postgres, OrderRecord>(CREATE_ORDER_SQL)
            .bind(order.uuid.into_uuid())
            .bind(order.payment_uuid.into_uuid())
            .bind(order.user_uuid.into_uuid())
            .bind(order.product_uuid.into_uuid())
            .bind(order.size.as_str())
            .bind(count_to_db(order.quantity)?)
            .bind(amount_to_db(order.unit_price)?)
            .bind(amount_to_db(order.line_amount)?)
            .bind(amount_to_db(order.final_amount)?)
            .bind(Json(&order.address))
            .bind(&order.user_name)
            .bind(&order.product_name)
            .bind(&order.brand)
            .bind(SqlxTimestamp::from(order.placed_at))
            .fetch_one(&mut **tx)
            .await
    }

    pub(crate) async fn get_order(
        &self,
        tx: &mut Transaction<'_, Postgres>,
        order: OrderUuid,
    ) -> Result<OrderRecord, sqlx::Error> {
        query_as::<Postgres, OrderRecord>(GET_ORDER_SQL)
            .bind(order.into_uuid())
            .fetch_one(&mut **tx)
            .await
    }

    /// Same as [`Self::get_order`], holding the order row lock until the
    /// transaction ends.
    pub(crate) async fn lock_order(
        &self,
        tx: &mut Transaction<'_, Postgres>,
        order: OrderUuid,
    ) -> Result<OrderRecord, sqlx::Error> {
        query_as::<Postgres, OrderRecord>(LOCK_ORDER_SQL)
            .bind(order.into_uuid())
            .fetch_one(&mut **tx)
            .await
    }

    /// A user's orders, newest first.
    pub(crate) async fn list_orders(
        &self,
        tx: &mut Transaction<'_, Postgres>,
        user: UserUuid,
    ) -> Result<Vec<OrderRecord>, sqlx::Error> {
        query_as::<Postgres, OrderRecord>(LIST_ORDERS_SQL)
            .bind(user.into_uuid())
            .fetch_all(&mut **tx)
            .await
    }

    pub(crate) async fn list_payment_orders(
        &self,
        tx: &mut Transaction<'_, Postgres>,
        payment: PaymentUuid,
    ) -> Result<Vec<OrderRecord>, sqlx::Error> {
        query_as::<Postgres, OrderRecord>(LIST_PAYMENT_ORDERS_SQL)
            .bind(payment.into_uuid())
            .fetch_all(&mut **tx)
            .await
    }

    /// Move an order to `status`, stamping the matching timestamp.
    pub(crate) async fn update_status(
        &self,
        tx: &mut Transaction<'_, Postgres>,
        order: OrderUuid,
        status: OrderStatus,
        at: jiff::Timestamp,
    ) -> Result<u64, sqlx::Error> {
        let rows_affected = query(UPDATE_STATUS_SQL)
            .bind(order.into_uuid())
            .bind(status.as_str())
            .bind(SqlxTimestamp::from(at))
            .execute(&mut **tx)
            .await?
            .rows_affected();

        Ok(rows_affected)
    }

    /// Number of orders the user has ever placed, whatever their status.
    pub(crate) async fn count_orders_for_user(
        &self,
        tx: &mut Transaction<'_, Postgres>,
        user: UserUuid,
    ) -> Result<u64, sqlx::Error> {
        let count = query_scalar::<Postgres, i64>(COUNT_ORDERS_FOR_USER_SQL)
            .bind(user.into_uuid())
            .fetch_one(&mut **tx)
            .await?;

        u64::try_from(count).map_err(|e| sqlx::Error::Decode(Box::new(e)))
    }
}

impl<'r> FromRow<'r, PgRow> for OrderRecord {
    fn from_row(row: &'r PgRow) -> sqlx::Result<Self> {
        let decode_error = |index: &str, source: Box<dyn std::error::Error + Send + Sync>| {
            sqlx::Error::ColumnDecode {
                index: index.to_string(),
                source,
            }
        };

        let method: String = row.try_get("payment_method")?;
        let payment_method = method
            .parse::<PaymentMethod>()
            .map_err(|e| decode_error("payment_method", Box::new(e)))?;

        let size: String = row.try_get("size")?;
        let size = size
            .parse::<Size>()
            .map_err(|e| decode_error("size", Box::new(e)))?;

        let status: String = row.try_get("status")?;
        let status = status
            .parse::<OrderStatus>()
            .map_err(|e| decode_error("status", Box::new(e)))?;

        let Json(address) = row.try_get::<Json<AddressSnapshot>, _>("address")?;

        Ok(Self {
            uuid: OrderUuid::from_uuid(row.try_get("uuid")?),
            payment_uuid: PaymentUuid::from_uuid(row.try_get("payment_uuid")?),
            payment_method,
            user_uuid: UserUuid::from_uuid(row.try_get("user_uuid")?),
            product_uuid: ProductUuid::from_uuid(row.try_get("product_uuid")?),
            size,
            quantity: try_get_count(row, "quantity")?,
            unit_price: try_get_amount(row, "unit_price")?,
            line_amount: try_get_amount(row, "line_amount")?,
            final_amount: try_get_amount(row, "final_amount")?,
            address,
            user_name: row.try_get("user_name")?,
            product_name: row.try_get("product_name")?,
            brand: row.try_get("brand")?,
            status,
            placed_at: row.try_get::<SqlxTimestamp, _>("placed_at")?.to_jiff(),
            delivered_at: row
                .try_get::<Option<SqlxTimestamp>, _>("delivered_at")?
                .map(SqlxTimestamp::to_jiff),
            cancelled_at: row
                .try_get::<Option<SqlxTimestamp>, _>("cancelled_at")?
                .map(SqlxTimestamp::to_jiff),
            returned_at: row
                .try_get::<Option<SqlxTimestamp>, _>("returned_at")?
                .map(SqlxTimestamp::to_jiff),
            updated_at: row.try_get::<SqlxTimestamp, _>("updated_at")?.to_jiff(),
        })
    }
}
