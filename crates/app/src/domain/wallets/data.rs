//! Wallet Data

use crate::domain::{
    orders::records::OrderUuid, payments::records::GatewayReference,
    users::records::UserUuid, wallets::records::WalletTransactionUuid,
};

/// A balance movement to apply and record.
///
/// Whether it credits or debits is decided by the repository method it is
/// passed to.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewWalletTransaction {
    pub uuid: WalletTransactionUuid,
    pub user_uuid: UserUuid,
    pub amount: u64,
    pub description: String,
    pub order_uuid: Option<OrderUuid>,
    pub gateway: Option<GatewayReference>,
}

impl NewWalletTransaction {
    #[must_use]
    pub fn new(user_uuid: UserUuid, amount: u64, description: impl Into<String>) -> Self {
        Self {
            uuid: WalletTransactionUuid::new(),
            user_uuid,
            amount,
            description: description.into(),
            order_uuid: None,
            gateway: None,
        }
    }

    #[must_use]
    pub fn for_order(mut self, order: OrderUuid) -> Self {
        self.order_uuid = Some(order);
        self
    }

    #[must_use]
    pub fn with_gateway(mut self, reference: GatewayReference) -> Self {
        self.gateway = Some(reference);
        self
    }
}
