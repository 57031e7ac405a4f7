//! Get Wallet Handler

use std::{string::ToString, sync::Arc};

use salvo::{oapi::ToSchema, prelude::*};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use emporium_app::domain::wallets::records::{WalletSummary, WalletTransactionRecord};

use crate::{extensions::*, state::State, wallet::errors::into_status_error};

/// Wallet Transaction Response
#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub(crate) struct WalletTransactionResponse {
    pub uuid: Uuid,

    /// `credit` or `debit`
    pub kind: String,
    pub amount: u64,
    pub description: String,
    pub order_uuid: Option<Uuid>,
    pub gateway_payment_id: Option<String>,
    pub created_at: String,
}

impl From<WalletTransactionRecord> for WalletTransactionResponse {
    fn from(transaction: WalletTransactionRecord) -> Self {
        Self {
            uuid: transaction.uuid.into_uuid(),
            kind: transaction.kind.as_str().to_string(),
            amount: transaction.amount,
            description: transaction.description,
            order_uuid: transaction.order_uuid.map(Into::into),
            gateway_payment_id: transaction.gateway.map(|gateway| gateway.payment_id),
            created_at: transaction.created_at.to_string(),
        }
    }
}

/// Wallet Response
#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub(crate) struct WalletResponse {
    /// Balance in minor units
    pub balance: u64,

    /// Transactions, newest first
    pub transactions: Vec<WalletTransactionResponse>,
}

impl From<WalletSummary> for WalletResponse {
    fn from(summary: WalletSummary) -> Self {
        Self {
            balance: summary.balance,
            transactions: summary
                .transactions
                .into_iter()
                .map(WalletTransactionResponse::from)
                .collect(),
        }
    }
}

/// Get Wallet Handler
#[endpoint(
    tags("wallet"),
    summary = "Get Wallet",
    security(("bearer_auth" = [])),
    responses(
        (status_code = StatusCode::OK, description = "Wallet found"),
        (status_code = StatusCode::NOT_FOUND, description = "Wallet not found"),
        (status_code = StatusCode::INTERNAL_SERVER_ERROR, description = "Internal Server Error"),
    ),
)]
pub(crate) async fn handler(depot: &mut Depot) -> Result<Json<WalletResponse>, StatusError> {
    let state = depot.obtain_or_500::<Arc<State>>()?;
    let user = depot.user_or_401()?;

    let wallet = state
        .app
        .wallets
        .get_wallet(user)
        .await
        .map_err(into_status_error)?;

    Ok(Json(wallet.into()))
}
