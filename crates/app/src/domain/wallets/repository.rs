//! Wallets Repository

use jiff_sqlx::Timestamp as SqlxTimestamp;
use sqlx::{FromRow, Postgres, Row, Transaction, postgres::PgRow, query, query_as};

use crate::{
    database::{amount_to_db, try_get_amount},
    domain::{
        orders::records::OrderUuid,
        payments::records::GatewayReference,
        users::records::UserUuid,
        wallets::{
            data::NewWalletTransaction,
            records::{
                TransactionKind, WalletRecord, WalletTransactionRecord, WalletTransactionUuid,
            },
        },
    },
};

const CREATE_WALLET_SQL: &str = include_str!("sql/create_wallet.sql");
const GET_WALLET_SQL: &str = include_str!("sql/get_wallet.sql");
const LIST_TRANSACTIONS_SQL: &str = include_str!("sql/list_transactions.sql");
const CREDIT_BALANCE_SQL: &str = include_str!("sql/credit_balance.sql");
const DEBIT_BALANCE_SQL: &str = include_str!("sql/debit_balance.sql");
const CREATE_TRANSACTION_SQL: &str = include_str!("sql/create_transaction.sql");

#[derive(Debug, Clone, Default)]
pub(crate) struct PgWalletsRepository;

impl PgWalletsRepository {
    #[must_use]
    pub(crate) fn new() -> Self {
        Self
    }

    pub(crate) async fn create_wallet(
        &self,
        tx: &mut Transaction<'_, Postgres>,
        user: UserUuid,
    ) -> Result<WalletRecord, sqlx::Error> {
        query_as::<Postgres, WalletRecord>(CREATE_WALLET_SQL)
            .bind(user.into_uuid())
            .fetch_one(&mut **tx)
            .await
    }

    pub(crate) async fn get_wallet(
        &self,
        tx: &mut Transaction<'_, Postgres>,
        user: UserUuid,
    ) -> Result<WalletRecord, sqlx::Error> {
        query_as::<Postgres, WalletRecord>(GET_WALLET_SQL)
            .bind(user.into_uuid())
            .fetch_one(&mut **tx)
            .await
    }

    /// A wallet's history, newest first.
    pub(crate) async fn list_transactions(
        &self,
        tx: &mut Transaction<'_, Postgres>,
        user: UserUuid,
    ) -> Result<Vec<WalletTransactionRecord>, sqlx::Error> {
        query_as::<Postgres, WalletTransactionRecord>(LIST_TRANSACTIONS_SQL)
            .bind(user.into_uuid())
            .fetch_all(&mut **tx)
            .await
    }

    /// Add to the balance and log the credit.
    ///
    /// Fails with [`sqlx::Error::RowNotFound`] when the user has no wallet.
    pub(crate) async fn credit(
        &self,
        tx: &mut Transaction<'_, Postgres>,
        entry: &NewWalletTransaction,
    ) -> Result<WalletTransactionRecord, sqlx::Error> {
        let rows_affected = query(CREDIT_BALANCE_SQL)
            .bind(entry.user_uuid.into_uuid())
            .bind(amount_to_db(entry.amount)?)
            .execute(&mut **tx)
            .await?
            .rows_affected();

        if rows_affected == 0 {
            return Err(sqlx::Error::RowNotFound);
        }

        self.record(tx, TransactionKind::Credit, entry).await
    }

    /// Take from the balance and log the debit.
    ///
    /// The balance is only touched when it covers the amount; otherwise
    /// nothing is written and `None` is returned.
    pub(crate) async fn debit(
        &self,
        tx: &mut Transaction<'_, Postgres>,
        entry: &NewWalletTransaction,
    ) -> Result<Option<WalletTransactionRecord>, sqlx::Error> {
        let rows_affected = query(DEBIT_BALANCE_SQL)
            .bind(entry.user_uuid.into_uuid())
            .bind(amount_to_db(entry.amount)?)
            .execute(&mut **tx)
            .await?
            .rows_affected();

        if rows_affected == 0 {
            return Ok(None);
        }

        self.record(tx, TransactionKind::Debit, entry).await.map(Some)
    }

    async fn record(
        &self,
        tx: &mut Transaction<'_, Postgres>,
        kind: TransactionKind,
        entry: &NewWalletTransaction,
    ) -> Result<WalletTransactionRecord, sqlx::Error> {
        let gateway = entry.gateway.as_ref();

        query_as::<Postgres, WalletTransactionRecord>(CREATE_TRANSACTION_SQL)
            .bind(entry.uuid.into_uuid())
            .bind(entry.user_uuid.into_uuid())
            .bind(kind.as_str())
            .bind(amount_to_db(entry.amount)?)
            .bind(&entry.description)
            .bind(entry.order_uuid.map(OrderUuid::into_uuid))
            .bind(gateway.map(|gateway| gateway.order_id.as_str()))
            .bind(gateway.map(|gateway| gateway.payment_id.as_str()))
            .bind(gateway.map(|gateway| gateway.signature.as_str()))
            .fetch_one(&mut **tx)
            .await
    }
}

impl<'r> FromRow<'r, PgRow> for WalletRecord {
    fn from_row(row: &'r PgRow) -> sqlx::Result<Self> {
        Ok(Self {
            user_uuid: UserUuid::from_uuid(row.try_get("user_uuid")?),
            balance: try_get_amount(row, "balance")?,
            created_at: row.try_get::<SqlxTimestamp, _>("created_at")?.to_jiff(),
            updated_at: row.try_get::<SqlxTimestamp, _>("updated_at")?.to_jiff(),
        })
    }
}

impl<'r> FromRow<'r, PgRow> for WalletTransactionRecord {
    fn from_row(row: &'r PgRow) -> sqlx::Result<Self> {
        let kind: String = row.try_get("kind")?;
        let kind = kind
            .parse::<TransactionKind>()
            .map_err(|e| sqlx::Error::ColumnDecode {
                index: "kind".to_string(),
                source: Box::new(e),
            })?;

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
            uuid: WalletTransactionUuid::from_uuid(row.try_get("uuid")?),
            user_uuid: UserUuid::from_uuid(row.try_get("user_uuid")?),
            kind,
            amount: try_get_amount(row, "amount")?,
            description: row.try_get("description")?,
            order_uuid: row
                .try_get::<Option<uuid::Uuid>, _>("order_uuid")?
                .map(OrderUuid::from_uuid),
            gateway,
            created_at: row.try_get::<SqlxTimestamp, _>("created_at")?.to_jiff(),
        })
    }
}
