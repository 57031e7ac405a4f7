//! Wallets service.

use std::sync::Arc;

use async_trait::async_trait;
use jiff::{SignedDuration, Timestamp};
use mockall::automock;
use tracing::{info, warn};
use uuid::Uuid;

use crate::{
    database::Db,
    domain::{
        payments::{
            CaptureError, PaymentGateway, PgPaymentsRepository, PgPendingRepository,
            pending::{NewPendingGatewayOrder, PendingPurpose},
            records::{GatewayHandoff, GatewayReference},
            verify_capture,
        },
        users::records::UserUuid,
        wallets::{
            data::NewWalletTransaction,
            errors::WalletsServiceError,
            records::{WalletSummary, WalletTransactionRecord},
            repository::PgWalletsRepository,
        },
    },
};

#[derive(Clone)]
pub struct PgWalletsService {
    db: Db,
    wallets: PgWalletsRepository,
    payments: PgPaymentsRepository,
    pending: PgPendingRepository,
    gateway: Arc<dyn PaymentGateway>,
    pending_ttl: SignedDuration,
}

impl PgWalletsService {
    #[must_use]
    pub fn new(db: Db, gateway: Arc<dyn PaymentGateway>, pending_ttl: SignedDuration) -> Self {
        Self {
            db,
            wallets: PgWalletsRepository::new(),
            payments: PgPaymentsRepository::new(),
            pending: PgPendingRepository::new(),
            gateway,
            pending_ttl,
        }
    }
}

#[async_trait]
impl WalletsService for PgWalletsService {
    async fn get_wallet(&self, user: UserUuid) -> Result<WalletSummary, WalletsServiceError> {
        let mut tx = self.db.begin_transaction().await?;

        let wallet = self.wallets.get_wallet(&mut tx, user).await?;
        let transactions = self.wallets.list_transactions(&mut tx, user).await?;

        tx.commit().await?;

        Ok(WalletSummary {
            balance: wallet.balance,
            transactions,
        })
    }

    #[tracing::instrument(
        name = "wallets.service.begin_top_up",
        skip(self),
        fields(user_uuid = %user),
        err
    )]
    async fn begin_top_up(
        &self,
        user: UserUuid,
        amount: u64,
        at: Timestamp,
    ) -> Result<GatewayHandoff, WalletsServiceError> {
        if amount == 0 {
            return Err(WalletsServiceError::InvalidAmount);
        }

        let expires_at = at
            .checked_add(self.pending_ttl)
            .map_err(|_| WalletsServiceError::InvalidData)?;

        let mut tx = self.db.begin_transaction().await?;

        self.wallets.get_wallet(&mut tx, user).await?;

        let receipt = format!("topup_{}", Uuid::now_v7().simple());
        let order = self.gateway.create_order(amount, &receipt).await?;

        self.pending
            .create_pending(
                &mut tx,
                NewPendingGatewayOrder {
                    gateway_order_id: order.id.clone(),
                    user_uuid: user,
                    purpose: PendingPurpose::TopUp,
                    amount,
                    address_uuid: None,
                    plan: None,
                    expires_at,
                },
            )
            .await?;

        tx.commit().await?;

        info!(user_uuid = %user, gateway_order_id = %order.id, amount, "started wallet top-up");

        Ok(GatewayHandoff {
            gateway_order_id: order.id,
            amount,
            currency: order.currency,
            key_id: self.gateway.key_id(),
        })
    }

    #[tracing::instrument(
        name = "wallets.service.confirm_top_up",
        skip(self, reference),
        fields(user_uuid = %user, gateway_order_id = %reference.order_id),
        err
    )]
    async fn confirm_top_up(
        &self,
        user: UserUuid,
        reference: GatewayReference,
        at: Timestamp,
    ) -> Result<WalletTransactionRecord, WalletsServiceError> {
        let mut tx = self.db.begin_transaction().await?;

        let pending = self.pending.lock_pending(&mut tx, &reference.order_id).await?;

        if pending.user_uuid != user || pending.purpose != PendingPurpose::TopUp {
            return Err(WalletsServiceError::NotFound);
        }

        if pending.is_completed() {
            return Err(WalletsServiceError::AlreadyProcessed);
        }

        if self.payments.gateway_reference_used(&mut tx, &reference).await? {
            warn!(user_uuid = %user, payment_id = %reference.payment_id, "gateway payment replayed");

            return Err(WalletsServiceError::AlreadyProcessed);
        }

        if pending.is_expired_at(at) {
            match verify_capture(self.gateway.as_ref(), &reference, pending.amount).await {
                Ok(_) => {
                    // Paid after the window closed: the money is still theirs.
                    let entry =
                        NewWalletTransaction::new(user, pending.amount, "Late wallet top-up")
                            .with_gateway(reference.clone());

                    self.wallets.credit(&mut tx, &entry).await?;

                    self.pending
                        .complete_pending(&mut tx, &reference.order_id, at)
                        .await?;

                    tx.commit().await?;

                    warn!(
                        user_uuid = %user,
                        amount = pending.amount,
                        "credited wallet top-up paid after expiry"
                    );
                }
                Err(CaptureError::Gateway(error)) => return Err(error.into()),
                Err(_) => {}
            }

            return Err(WalletsServiceError::Expired);
        }

        verify_capture(self.gateway.as_ref(), &reference, pending.amount).await?;

        let entry = NewWalletTransaction::new(user, pending.amount, "Wallet top-up")
            .with_gateway(reference.clone());

        let credited = self.wallets.credit(&mut tx, &entry).await?;

        self.pending
            .complete_pending(&mut tx, &reference.order_id, at)
            .await?;

        tx.commit().await?;

        info!(user_uuid = %user, amount = pending.amount, "credited wallet top-up");

        Ok(credited)
    }
}

#[automock]
#[async_trait]
pub trait WalletsService: Send + Sync {
    /// Current balance and history of a user's wallet.
    async fn get_wallet(&self, user: UserUuid) -> Result<WalletSummary, WalletsServiceError>;

    /// Create a gateway order to fund the wallet with `amount` minor units.
    async fn begin_top_up(
        &self,
        user: UserUuid,
        amount: u64,
        at: Timestamp,
    ) -> Result<GatewayHandoff, WalletsServiceError>;

    /// Credit the wallet once the gateway confirms the payment.
    async fn confirm_top_up(
        &self,
        user: UserUuid,
        reference: GatewayReference,
        at: Timestamp,
    ) -> Result<WalletTransactionRecord, WalletsServiceError>;
}
