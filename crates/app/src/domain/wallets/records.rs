//! Wallet Records

use std::{fmt, str::FromStr};

use jiff::Timestamp;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::{
    domain::{
        orders::records::OrderUuid, payments::records::GatewayReference,
        users::records::UserUuid,
    },
    uuids::TypedUuid,
};

/// Wallet Record
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WalletRecord {
    pub user_uuid: UserUuid,
    pub balance: u64,
    pub created_at: Timestamp,
    pub updated_at: Timestamp,
}

/// Wallet Transaction UUID
pub type WalletTransactionUuid = TypedUuid<WalletTransactionRecord>;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TransactionKind {
    Credit,
    Debit,
}

impl TransactionKind {
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Credit => "credit",
            Self::Debit => "debit",
        }
    }
}

impl fmt::Display for TransactionKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for TransactionKind {
    type Err = UnknownTransactionKind;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value {
            "credit" => Ok(Self::Credit),
            "debit" => Ok(Self::Debit),
            other => Err(UnknownTransactionKind(other.to_string())),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("unknown wallet transaction kind `{0}`")]
pub struct UnknownTransactionKind(pub String);

/// One entry of a wallet's append-only history.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WalletTransactionRecord {
    pub uuid: WalletTransactionUuid,
    pub user_uuid: UserUuid,
    pub kind: TransactionKind,
    pub amount: u64,
    pub description: String,
    pub order_uuid: Option<OrderUuid>,
    pub gateway: Option<GatewayReference>,
    pub created_at: Timestamp,
}

/// Balance together with the wallet's history, newest first.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WalletSummary {
    pub balance: u64,
    pub transactions: Vec<WalletTransactionRecord>,
}
