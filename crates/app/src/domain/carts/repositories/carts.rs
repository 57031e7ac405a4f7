//! Carts Repository

use jiff_sqlx::Timestamp as SqlxTimestamp;
use sqlx::{FromRow, Postgres, Row, Transaction, postgres::PgRow, query, query_as};

use crate::{
    database::{amount_to_db, try_get_amount},
    domain::{
        carts::records::CartRecord, coupons::records::AppliedCoupon, users::records::UserUuid,
    },
};

const GET_CART_SQL: &str = include_str!("../sql/get_cart.sql");
const LOCK_CART_SQL: &str = include_str!("../sql/lock_cart.sql");
const ENSURE_CART_SQL: &str = include_str!("../sql/ensure_cart.sql");
const SET_COUPON_SQL: &str = include_str!("../sql/set_coupon.sql");
const UPDATE_TOTALS_SQL: &str = include_str!("../sql/update_totals.sql");
const CLEAR_CART_SQL: &str = include_str!("../sql/clear_cart.sql");

#[derive(Debug, Clone, Default)]
pub(crate) struct PgCartsRepository;

impl PgCartsRepository {
    #[must_use]
    pub(crate) fn new() -> Self {
        Self
    }

    pub(crate) async fn get_cart(
        &self,
        tx: &mut Transaction<'_, Postgres>,
        user: UserUuid,
    ) -> Result<Option<CartRecord>, sqlx::Error> {
        query_as::<Postgres, CartRecord>(GET_CART_SQL)
            .bind(user.into_uuid())
            .fetch_optional(&mut **tx)
            .await
    }

    /// Same as [`Self::get_cart`] but holds the row lock until the
    /// transaction ends.
    pub(crate) async fn lock_cart(
        &self,
        tx: &mut Transaction<'_, Postgres>,
        user: UserUuid,
    ) -> Result<Option<CartRecord>, sqlx::Error> {
        query_as::<Postgres, CartRecord>(LOCK_CART_SQL)
            .bind(user.into_uuid())
            .fetch_optional(&mut **tx)
            .await
    }

    pub(crate) async fn ensure_cart(
        &self,
        tx: &mut Transaction<'_, Postgres>,
        user: UserUuid,
    ) -> Result<(), sqlx::Error> {
        query(ENSURE_CART_SQL)
            .bind(user.into_uuid())
            .execute(&mut **tx)
            .await?;

        Ok(())
    }

    pub(crate) async fn set_coupon(
        &self,
        tx: &mut Transaction<'_, Postgres>,
        user: UserUuid,
        coupon: Option<&AppliedCoupon>,
    ) -> Result<u64, sqlx::Error> {
        let rows_affected = query(SET_COUPON_SQL)
            .bind(user.into_uuid())
            .bind(coupon.map(|coupon| coupon.code.as_str()))
            .bind(amount_to_db(coupon.map_or(0, |coupon| coupon.amount))?)
            .execute(&mut **tx)
            .await?
            .rows_affected();

        Ok(rows_affected)
    }

    pub(crate) async fn update_totals(
        &self,
        tx: &mut Transaction<'_, Postgres>,
        user: UserUuid,
        total_amount: u64,
        total_initial_amount: u64,
    ) -> Result<u64, sqlx::Error> {
        let rows_affected = query(UPDATE_TOTALS_SQL)
            .bind(user.into_uuid())
            .bind(amount_to_db(total_amount)?)
            .bind(amount_to_db(total_initial_amount)?)
            .execute(&mut **tx)
            .await?
            .rows_affected();

        Ok(rows_affected)
    }

    /// Reset totals and coupon. Items are removed separately.
    pub(crate) async fn clear_cart(
        &self,
        tx: &mut Transaction<'_, Postgres>,
        user: UserUuid,
    ) -> Result<u64, sqlx::Error> {
        let rows_affected = query(CLEAR_CART_SQL)
            .bind(user.into_uuid())
            .execute(&mut **tx)
            .await?
            .rows_affected();

        Ok(rows_affected)
    }
}

impl<'r> FromRow<'r, PgRow> for CartRecord {
    fn from_row(row: &'r PgRow) -> sqlx::Result<Self> {
        let coupon_code: Option<String> = row.try_get("coupon_code")?;
        let coupon_amount = try_get_amount(row, "coupon_amount")?;

        Ok(Self {
            user_uuid: UserUuid::from_uuid(row.try_get("user_uuid")?),
            items: Vec::new(),
            coupon: coupon_code.map(|code| AppliedCoupon {
                code,
                amount: coupon_amount,
            }),
            total_amount: try_get_amount(row, "total_amount")?,
            total_initial_amount: try_get_amount(row, "total_initial_amount")?,
            created_at: row.try_get::<SqlxTimestamp, _>("created_at")?.to_jiff(),
            updated_at: row.try_get::<SqlxTimestamp, _>("updated_at")?.to_jiff(),
        })
    }
}
