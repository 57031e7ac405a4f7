//! Checkout service.

use std::sync::Arc;

use async_trait::async_trait;
use jiff::{SignedDuration, Timestamp};
use mockall::automock;
use sqlx::{Connection, Postgres, Transaction};
use tracing::{info, warn};
use uuid::Uuid;

use crate::{
    database::Db,
    domain::{
        addresses::{
            PgAddressesRepository,
            records::{AddressSnapshot, AddressUuid},
        },
        carts::{pipeline::CartPipeline, stock::validate_stock},
        checkout::{errors::CheckoutError, plan::CheckoutPlan},
        coupons::CouponRules,
        orders::{
            PgOrdersRepository,
            data::NewOrder,
            records::{OrderRecord, OrderUuid},
        },
        payments::{
            CaptureError, PaymentGateway, PgPaymentsRepository, PgPendingRepository,
            data::NewPayment,
            pending::{NewPendingGatewayOrder, PendingPurpose},
            records::{GatewayHandoff, GatewayReference, PaymentMethod, PaymentRecord, PaymentUuid},
            verify_capture,
        },
        products::{PURCHASE_POPULARITY, PgProductsRepository},
        users::{PgUsersRepository, records::UserUuid},
        wallets::{PgWalletsRepository, data::NewWalletTransaction},
    },
};

/// Settings that shape every checkout.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CheckoutPolicy {
    pub coupon_rules: CouponRules,

    /// How long a gateway checkout waits for its payment.
    pub pending_ttl: SignedDuration,
}

impl Default for CheckoutPolicy {
    fn default() -> Self {
        Self {
            coupon_rules: CouponRules::default(),
            pending_ttl: SignedDuration::from_mins(15),
        }
    }
}

/// The payment and orders created by a successful checkout.
#[derive(Debug, Clone, PartialEq)]
pub struct PlacedCheckout {
    pub payment: PaymentRecord,
    pub orders: Vec<OrderRecord>,
    pub amount: u64,
}

#[derive(Clone)]
pub struct PgCheckoutService {
    db: Db,
    pipeline: CartPipeline,
    addresses: PgAddressesRepository,
    users: PgUsersRepository,
    payments: PgPaymentsRepository,
    pending: PgPendingRepository,
    orders: PgOrdersRepository,
    products: PgProductsRepository,
    wallets: PgWalletsRepository,
    gateway: Arc<dyn PaymentGateway>,
    pending_ttl: SignedDuration,
}

impl PgCheckoutService {
    #[must_use]
    pub fn new(db: Db, gateway: Arc<dyn PaymentGateway>, policy: CheckoutPolicy) -> Self {
        Self {
            db,
            pipeline: CartPipeline::new(policy.coupon_rules),
            addresses: PgAddressesRepository::new(),
            users: PgUsersRepository::new(),
            payments: PgPaymentsRepository::new(),
            pending: PgPendingRepository::new(),
            orders: PgOrdersRepository::new(),
            products: PgProductsRepository::new(),
            wallets: PgWalletsRepository::new(),
            gateway,
            pending_ttl: policy.pending_ttl,
        }
    }

    /// Validate the user's cart for checkout and freeze it into a plan.
    ///
    /// The cart row stays locked for the rest of `tx`. A coupon that no longer
    /// applies is removed in `tx` before [`CheckoutError::CouponRejected`] is
    /// returned, so callers commit `tx` in that case.
    async fn prepare(
        &self,
        tx: &mut Transaction<'_, Postgres>,
        user: UserUuid,
        address: AddressUuid,
        at: Timestamp,
    ) -> Result<CheckoutPlan, CheckoutError> {
        let address = self
            .addresses
            .get_address(tx, user, address)
            .await
            .map_err(|error| match error {
                sqlx::Error::RowNotFound => CheckoutError::AddressNotFound,
                other => other.into(),
            })?;

        let mut cart = self.pipeline.valuate_locked(tx, user, at).await?;

        if cart.is_empty() {
            return Err(CheckoutError::EmptyCart);
        }

        if let Some(rejection) = self.pipeline.revalidate_coupon(tx, &mut cart, at).await? {
            return Err(CheckoutError::CouponRejected(rejection));
        }

        let invalid_lines = validate_stock(&cart);

        if !invalid_lines.is_empty() {
            warn!(
                user_uuid = %user,
                invalid_line_count = invalid_lines.len(),
                "cart has lines that cannot be fulfilled"
            );

            return Err(CheckoutError::StockUnavailable(invalid_lines));
        }

        Ok(CheckoutPlan::from_cart(&cart, AddressSnapshot::from(&address))?)
    }

    /// Write the payment and orders for `plan`, take the stock and, for
    /// wallet payments, the money. Removes the purchased lines from the
    /// user's cart; lines added after the plan was frozen stay.
    async fn materialize(
        &self,
        tx: &mut Transaction<'_, Postgres>,
        user: UserUuid,
        address: AddressUuid,
        plan: &CheckoutPlan,
        method: PaymentMethod,
        gateway: Option<GatewayReference>,
        at: Timestamp,
    ) -> Result<PlacedCheckout, CheckoutError> {
        let customer = self.users.get_user(tx, user).await?;

        let payment = self
            .payments
            .create_payment(
                tx,
                &NewPayment {
                    uuid: PaymentUuid::new(),
                    user_uuid: user,
                    method,
                    total_amount: plan.payable_amount,
                    coupon: plan.coupon.clone(),
                    gateway,
                },
            )
            .await?;

        if method == PaymentMethod::Wallet && plan.payable_amount > 0 {
            let entry = NewWalletTransaction::new(
                user,
                plan.payable_amount,
                format!("Payment for {} item(s)", plan.lines.len()),
            );

            if self.wallets.debit(tx, &entry).await?.is_none() {
                return Err(CheckoutError::InsufficientBalance);
            }
        }

        let mut orders = Vec::with_capacity(plan.lines.len());

        for line in &plan.lines {
            let reserved = self
                .products
                .reserve_stock(tx, line.product_uuid, line.size, line.quantity)
                .await?;

            if reserved == 0 {
                warn!(
                    user_uuid = %user,
                    product_uuid = %line.product_uuid,
                    size = %line.size,
                    "stock ran out during checkout"
                );

                return Err(CheckoutError::StockChanged);
            }

            self.products
                .bump_popularity(tx, line.product_uuid, PURCHASE_POPULARITY)
                .await?;

            let order = self
                .orders
                .create_order(
                    tx,
                    &NewOrder {
                        uuid: OrderUuid::new(),
                        payment_uuid: payment.uuid,
                        user_uuid: user,
                        product_uuid: line.product_uuid,
                        size: line.size,
                        quantity: line.quantity,
                        unit_price: line.unit_price,
                        line_amount: line.line_amount,
                        final_amount: line.final_amount,
                        address: plan.address.clone(),
                        user_name: customer.name.clone(),
                        product_name: line.product_name.clone(),
                        brand: line.brand.clone(),
                        placed_at: at,
                    },
                )
                .await?;

            orders.push(order);
        }

        let purchased: Vec<_> = plan
            .lines
            .iter()
            .map(|line| (line.product_uuid, line.size, line.quantity))
            .collect();

        self.pipeline.settle(tx, user, &purchased, at).await?;

        self.addresses.set_primary(tx, user, address).await?;

        Ok(PlacedCheckout {
            amount: payment.total_amount,
            payment,
            orders,
        })
    }
}

impl PgCheckoutService {
    /// Keep a captured gateway payment that produced no orders as wallet
    /// credit, close its pending record and commit `tx`.
    async fn refund_to_wallet(
        &self,
        mut tx: Transaction<'_, Postgres>,
        user: UserUuid,
        amount: u64,
        reference: &GatewayReference,
        description: &str,
        at: Timestamp,
    ) -> Result<(), CheckoutError> {
        let entry =
            NewWalletTransaction::new(user, amount, description).with_gateway(reference.clone());

        self.wallets.credit(&mut tx, &entry).await?;

        self.pending
            .complete_pending(&mut tx, &reference.order_id, at)
            .await?;

        tx.commit().await?;

        Ok(())
    }
}

#[async_trait]
impl CheckoutService for PgCheckoutService {
    #[tracing::instrument(
        name = "checkout.service.place_order",
        skip(self),
        fields(user_uuid = %user, address_uuid = %address, method = %method),
        err
    )]
    async fn place_order(
        &self,
        user: UserUuid,
        address: AddressUuid,
        method: PaymentMethod,
        at: Timestamp,
    ) -> Result<PlacedCheckout, CheckoutError> {
        if method == PaymentMethod::Gateway {
            return Err(CheckoutError::UnsupportedMethod);
        }

        let mut tx = self.db.begin_transaction().await?;

        let plan = match self.prepare(&mut tx, user, address, at).await {
            Ok(plan) => plan,
            Err(error @ CheckoutError::CouponRejected(_)) => {
                tx.commit().await?;

                return Err(error);
            }
            Err(error) => return Err(error),
        };

        let placed = self
            .materialize(&mut tx, user, address, &plan, method, None, at)
            .await?;

        tx.commit().await?;

        info!(
            user_uuid = %user,
            payment_uuid = %placed.payment.uuid,
            order_count = placed.orders.len(),
            amount = placed.amount,
            "placed order"
        );

        Ok(placed)
    }

    #[tracing::instrument(
        name = "checkout.service.begin_gateway_checkout",
        skip(self),
        fields(user_uuid = %user, address_uuid = %address),
        err
    )]
    async fn begin_gateway_checkout(
        &self,
        user: UserUuid,
        address: AddressUuid,
        at: Timestamp,
    ) -> Result<GatewayHandoff, CheckoutError> {
        let expires_at = at
            .checked_add(self.pending_ttl)
            .map_err(|_| CheckoutError::InvalidData)?;

        let mut tx = self.db.begin_transaction().await?;

        let plan = match self.prepare(&mut tx, user, address, at).await {
            Ok(plan) => plan,
            Err(error @ CheckoutError::CouponRejected(_)) => {
                tx.commit().await?;

                return Err(error);
            }
            Err(error) => return Err(error),
        };

        if plan.payable_amount == 0 {
            return Err(CheckoutError::NothingToPay);
        }

        let snapshot = serde_json::to_value(&plan).map_err(|_| CheckoutError::InvalidData)?;

        let receipt = format!("cart_{}", Uuid::now_v7().simple());
        let order = self
            .gateway
            .create_order(plan.payable_amount, &receipt)
            .await?;

        self.pending
            .create_pending(
                &mut tx,
                NewPendingGatewayOrder {
                    gateway_order_id: order.id.clone(),
                    user_uuid: user,
                    purpose: PendingPurpose::Checkout,
                    amount: plan.payable_amount,
                    address_uuid: Some(address),
                    plan: Some(snapshot),
                    expires_at,
                },
            )
            .await?;

        tx.commit().await?;

        info!(
            user_uuid = %user,
            gateway_order_id = %order.id,
            amount = plan.payable_amount,
            "started gateway checkout"
        );

        Ok(GatewayHandoff {
            gateway_order_id: order.id,
            amount: plan.payable_amount,
            currency: order.currency,
            key_id: self.gateway.key_id(),
        })
    }

    #[tracing::instrument(
        name = "checkout.service.confirm_gateway_checkout",
        skip(self, reference),
        fields(user_uuid = %user, gateway_order_id = %reference.order_id),
        err
    )]
    async fn confirm_gateway_checkout(
        &self,
        user: UserUuid,
        reference: GatewayReference,
        at: Timestamp,
    ) -> Result<PlacedCheckout, CheckoutError> {
        let mut tx = self.db.begin_transaction().await?;

        let pending = self.pending.lock_pending(&mut tx, &reference.order_id).await?;

        if pending.user_uuid != user || pending.purpose != PendingPurpose::Checkout {
            return Err(CheckoutError::NotFound);
        }

        if pending.is_completed() {
            return Err(CheckoutError::AlreadyProcessed);
        }

        if self.payments.gateway_reference_used(&mut tx, &reference).await? {
            warn!(user_uuid = %user, payment_id = %reference.payment_id, "gateway payment replayed");

            return Err(CheckoutError::AlreadyProcessed);
        }

        if pending.is_expired_at(at) {
            // The gateway order outlives the pending record, so the customer
            // may still have paid for it.
            match verify_capture(self.gateway.as_ref(), &reference, pending.amount).await {
                Ok(_) => {
                    self.refund_to_wallet(
                        tx,
                        user,
                        pending.amount,
                        &reference,
                        "Refund for expired gateway checkout",
                        at,
                    )
                    .await?;

                    warn!(
                        user_uuid = %user,
                        amount = pending.amount,
                        "credited wallet for gateway checkout paid after expiry"
                    );
                }
                Err(CaptureError::Gateway(error)) => return Err(error.into()),
                Err(_) => {}
            }

            return Err(CheckoutError::Expired);
        }

        verify_capture(self.gateway.as_ref(), &reference, pending.amount).await?;

        let (Some(address), Some(snapshot)) = (pending.address_uuid, pending.plan.clone()) else {
            return Err(CheckoutError::InvalidData);
        };

        let plan: CheckoutPlan =
            serde_json::from_value(snapshot).map_err(|_| CheckoutError::InvalidData)?;

        let mut savepoint = Connection::begin(&mut *tx).await?;

        let outcome = self
            .materialize(
                &mut savepoint,
                user,
                address,
                &plan,
                PaymentMethod::Gateway,
                Some(reference.clone()),
                at,
            )
            .await;

        match outcome {
            Ok(placed) => {
                savepoint.commit().await?;

                self.pending
                    .complete_pending(&mut tx, &reference.order_id, at)
                    .await?;

                tx.commit().await?;

                info!(
                    user_uuid = %user,
                    payment_uuid = %placed.payment.uuid,
                    order_count = placed.orders.len(),
                    amount = placed.amount,
                    "placed gateway order"
                );

                Ok(placed)
            }
            Err(CheckoutError::StockChanged) => {
                savepoint.rollback().await?;

                self.refund_to_wallet(
                    tx,
                    user,
                    pending.amount,
                    &reference,
                    "Refund for unfulfilled gateway checkout",
                    at,
                )
                .await?;

                warn!(
                    user_uuid = %user,
                    amount = pending.amount,
                    "credited wallet for gateway checkout that ran out of stock"
                );

                Err(CheckoutError::StockChanged)
            }
            Err(error) => Err(error),
        }
    }
}

#[automock]
#[async_trait]
pub trait CheckoutService: Send + Sync {
    /// Check out the user's cart, paying by cash on delivery or from the
    /// wallet.
    async fn place_order(
        &self,
        user: UserUuid,
        address: AddressUuid,
        method: PaymentMethod,
        at: Timestamp,
    ) -> Result<PlacedCheckout, CheckoutError>;

    /// Validate the cart and open a gateway order for it.
    async fn begin_gateway_checkout(
        &self,
        user: UserUuid,
        address: AddressUuid,
        at: Timestamp,
    ) -> Result<GatewayHandoff, CheckoutError>;

    /// Place the orders for a paid gateway checkout.
    async fn confirm_gateway_checkout(
        &self,
        user: UserUuid,
        reference: GatewayReference,
        at: Timestamp,
    ) -> Result<PlacedCheckout, CheckoutError>;
}
