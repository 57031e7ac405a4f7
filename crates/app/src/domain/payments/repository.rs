//! Payments Repository

use jiff_sqlx::Timestamp as SqlxTimestamp;
use sqlx::{FromRow, Postgres, Row, Transaction, postgres::PgRow, query, query_as, query_scalar};

use crate::{
    database::{amount_to_db, try_get_amount},
    domain::{
        coupons::records::AppliedCoupon,
        payments::{
            data::NewPayment,
            records::{GatewayReference, PaymentMethod, PaymentRecord, PaymentUuid},
        },
        users::records::UserUuid,
    },
};

const CREATE_PAYMENT_SQL: &str = include_str!("sql/create_payment.sql");
const GET_PAYMENT_SQL: &str = include_str!("sql/get_payment.sql");
const REDUCE_TOTAL_SQL: &str = include_str!("sql/reduce_total.sql");
const GATEWAY_REFERENCE_USED_SQL: &str = include_str!("sql/gateway_reference_used.sql");

#[derive(Debug, Clone, Default)]
pub(crate) struct PgPaymentsRepository;

impl PgPaymentsRepository {
    #[must_use]
    pub(crate) fn new() -> Self {
        Self
    }

    pub(crate) async fn create_payment(
        &self,
        tx: &mut Transaction<'_, Postgres>,
        payment: &NewPayment,
    ) -> Result<PaymentRecord, sqlx::Error> {
        let coupon = payment.coupon.as_ref();
        let gateway = payment.gateway.as_ref();

        query_as::<Postgres, PaymentRecord>(CREATE_PAYMENT_SQL)
            .bind(payment.uuid.into_uuid())
            .bind(payment.user_uuid.into_uuid())
            .bind(payment.method.as_str())
            .bind(amount_to_db(payment.total_amount)?)
            .bind(coupon.map(|coupon| coupon.code.as_str()))
            .bind(amount_to_db(coupon.map_or(0, |coupon| coupon.amount))?)
            .bind(gateway.map(|gateway| gateway.order_id.as_str()))
            .bind(gateway.map(|gateway| gateway.payment_id.as_str()))
            .bind(gateway.map(|gateway| gateway.signature.as_str()))
            .fetch_one(&mut **tx)
            .await
    }

    pub(crate) async fn get_payment(
        &self,
        tx: &mut Transaction<'_, Postgres>,
        payment: PaymentUuid,
    ) -> Result<PaymentRecord, sqlx::Error> {
        query_as::<Postgres, PaymentRecord>(GET_PAYMENT_SQL)
            .bind(payment.into_uuid())
            .fetch_one(&mut **tx)
            .await
    }

    /// Take `amount` off a payment's total. Returns `false` when the total is
    /// smaller than `amount`, leaving it untouched.
    pub(crate) async fn reduce_total(
        &self,
        tx: &mut Transaction<'_, Postgres>,
        payment: PaymentUuid,
        amount: u64,
    ) -> Result<bool, sqlx::Error> {
        let rows_affected = query(REDUCE_TOTAL_SQL)
            .bind(payment.into_uuid())
            .bind(amount_to_db(amount)?)
            .execute(&mut **tx)
            .await?
            .rows_affected();

        Ok(rows_affected == 1)
    }

    /// Whether any payment or wallet transaction already carries these
    /// gateway ids.
    pub(crate) async fn gateway_reference_used(
        &self,
        tx: &mut Transaction<'_, Postgres>,
        reference: &GatewayReference,
    ) -> Result<bool, sqlx::Error> {
        query_scalar::<Postgres, bool>(GATEWAY_REFERENCE_USED_SQL)
            .bind(&reference.order_id)
            .bind(&reference.payment_id)
            .bind(&reference.signature)
            .fetch_one(&mut **tx)
            .await
    }
}

impl<'r> FromRow<'r, PgRow> for PaymentRecord {
    fn from_row(row: &'r PgRow) -> sqlx::Result<Self> {
        let method: String = row.try_get("method")?;
        let method = method
            .parse::<PaymentMethod>()
            .map_err(|e| sqlx::Error::ColumnDecode {
                index: "method".to_string(),
                source: Box::new(e),
            })?;

        let coupon_code: Option<String> = row.try_get("coupon_code")?;
        let coupon_amount = try_get_amount(row, "coupon_amount")?;

        let gateway_order_id: Option<String> = row.try_get("gateway_order_id")?;
        let gateway_payment_id: Option<String> = row.try_get("gateway_payment_id")?;
        let gateway_signature: Option<String> = row.try_get("gateway_signature")?;

        let gateway = match (gateway_order_id, gateway_payment_id, gateway_signature) {
            (Some(order_id), Some(payment_id), Some(signature)) => Some(GatewayReference {
                order_id,
                payment_id,
                signature,
            }),
            _ => None,
        };

        Ok(Self {
            uuid: PaymentUuid::from_uuid(row.try_get("uuid")?),
            user_uuid: UserUuid::from_uuid(row.try_get("user_uuid")?),
            method,
            total_amount: try_get_amount(row, "total_amount")?,
            coupon: coupon_code.map(|code| AppliedCoupon {
                code,
                amount: coupon_amount,
            }),
            gateway,
            created_at: row.try_get::<SqlxTimestamp, _>("created_at")?.to_jiff(),
            updated_at: row.try_get::<SqlxTimestamp, _>("updated_at")?.to_jiff(),
        })
    }
}
