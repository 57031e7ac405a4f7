//! Pending gateway orders
//!
//! A gateway order is created before the customer pays and confirmed after.
//! Between the two we keep what was promised: who pays, how much and, for a
//! checkout, the priced lines to materialize.

use std::{fmt, str::FromStr};

use jiff::Timestamp;
use jiff_sqlx::Timestamp as SqlxTimestamp;
use serde_json::Value;
use sqlx::{FromRow, Postgres, Row, Transaction, postgres::PgRow, query, query_as, types::Json};
use thiserror::Error;

use crate::{
    database::{amount_to_db, try_get_amount},
    domain::{addresses::records::AddressUuid, users::records::UserUuid},
};

const CREATE_PENDING_SQL: &str = include_str!("sql/create_pending.sql");
const LOCK_PENDING_SQL: &str = include_str!("sql/lock_pending.sql");
const COMPLETE_PENDING_SQL: &str = include_str!("sql/complete_pending.sql");

/// What a pending gateway order will pay for once confirmed.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PendingPurpose {
    Checkout,
    TopUp,
}

impl PendingPurpose {
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Checkout => "checkout",
            Self::TopUp => "top_up",
        }
    }
}

impl fmt::Display for PendingPurpose {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for PendingPurpose {
    type Err = UnknownPendingPurpose;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value {
            "checkout" => Ok(Self::Checkout),
            "top_up" => Ok(Self::TopUp),
            other => Err(UnknownPendingPurpose(other.to_string())),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("unknown pending order purpose `{0}`")]
pub struct UnknownPendingPurpose(pub String);

/// A gateway order awaiting confirmation.
#[derive(Debug, Clone, PartialEq)]
pub struct PendingGatewayOrder {
    pub gateway_order_id: String,
    pub user_uuid: UserUuid,
    pub purpose: PendingPurpose,
    pub amount: u64,
    pub address_uuid: Option<AddressUuid>,
    pub plan: Option<Value>,
    pub expires_at: Timestamp,
    pub completed_at: Option<Timestamp>,
    pub created_at: Timestamp,
}

impl PendingGatewayOrder {
    #[must_use]
    pub fn is_expired_at(&self, at: Timestamp) -> bool {
        at > self.expires_at
    }

    #[must_use]
    pub fn is_completed(&self) -> bool {
        self.completed_at.is_some()
    }
}

/// New pending gateway order.
#[derive(Debug, Clone)]
pub struct NewPendingGatewayOrder {
    pub gateway_order_id: String,
    pub user_uuid: UserUuid,
    pub purpose: PendingPurpose,
    pub amount: u64,
    pub address_uuid: Option<AddressUuid>,
    pub plan: Option<Value>,
    pub expires_at: Timestamp,
}

#[derive(Debug, Clone, Default)]
pub(crate) struct PgPendingRepository;

impl PgPendingRepository {
    #[must_use]
    pub(crate) fn new() -> Self {
        Self
    }

    pub(crate) async fn create_pending(
        &self,
        tx: &mut Transaction<'_, Postgres>,
        pending: NewPendingGatewayOrder,
    ) -> Result<PendingGatewayOrder, sqlx::Error> {
        query_as::<Postgres, PendingGatewayOrder>(CREATE_PENDING_SQL)
            .bind(&pending.gateway_order_id)
            .bind(pending.user_uuid.into_uuid())
            .bind(pending.purpose.as_str())
            .bind(amount_to_db(pending.amount)?)
            .bind(pending.address_uuid.map(AddressUuid::into_uuid))
            .bind(pending.plan.map(Json))
            .bind(SqlxTimestamp::from(pending.expires_at))
            .fetch_one(&mut **tx)
            .await
    }

    /// Lock a pending order for confirmation.
    pub(crate) async fn lock_pending(
        &self,
        tx: &mut Transaction<'_, Postgres>,
        gateway_order_id: &str,
    ) -> Result<PendingGatewayOrder, sqlx::Error> {
        query_as::<Postgres, PendingGatewayOrder>(LOCK_PENDING_SQL)
            .bind(gateway_order_id)
            .fetch_one(&mut **tx)
            .await
    }

    pub(crate) async fn complete_pending(
        &self,
        tx: &mut Transaction<'_, Postgres>,
        gateway_order_id: &str,
        at: Timestamp,
    ) -> Result<(), sqlx::Error> {
        query(COMPLETE_PENDING_SQL)
            .bind(gateway_order_id)
            .bind(SqlxTimestamp::from(at))
            .execute(&mut **tx)
            .await?;

        Ok(())
    }
}

impl<'r> FromRow<'r, PgRow> for PendingGatewayOrder {
    fn from_row(row: &'r PgRow) -> sqlx::Result<Self> {
        let purpose: String = row.try_get("purpose")?;
        let purpose = purpose
            .parse::<PendingPurpose>()
            .map_err(|e| sqlx::Error::ColumnDecode {
                index: "purpose".to_string(),
                source: Box::new(e),
            })?;

        let plan: Option<Json<Value>> = row.try_get("plan")?;

        Ok(Self {
            gateway_order_id: row.try_get("gateway_order_id")?,
            user_uuid: UserUuid::from_uuid(row.try_get("user_uuid")?),
            purpose,
            amount: try_get_amount(row, "amount")?,
            address_uuid: row
                .try_get::<Option<uuid::Uuid>, _>("address_uuid")?
                .map(AddressUuid::from_uuid),
            plan: plan.map(|Json(value)| value),
            expires_at: row.try_get::<SqlxTimestamp, _>("expires_at")?.to_jiff(),
            completed_at: row
                .try_get::<Option<SqlxTimestamp>, _>("completed_at")?
                .map(SqlxTimestamp::to_jiff),
            created_at: row.try_get::<SqlxTimestamp, _>("created_at")?.to_jiff(),
        })
    }
}
