//! Orders service.

use async_trait::async_trait;
use jiff::Timestamp;
use mockall::automock;
use tracing::{info, warn};

use crate::{
    database::Db,
    domain::{
        orders::{
            errors::OrdersServiceError,
            records::{OrderRecord, OrderStatus, OrderUuid},
            repository::PgOrdersRepository,
            status::{Actor, plan_transition},
        },
        payments::PgPaymentsRepository,
        products::PgProductsRepository,
        users::records::UserUuid,
        wallets::{PgWalletsRepository, data::NewWalletTransaction},
    },
};

#[derive(Debug, Clone)]
pub struct PgOrdersService {
    db: Db,
    orders: PgOrdersRepository,
    payments: PgPaymentsRepository,
    products: PgProductsRepository,
    wallets: PgWalletsRepository,
}

impl PgOrdersService {
    #[must_use]
    pub fn new(db: Db) -> Self {
        Self {
            db,
            orders: PgOrdersRepository::new(),
            payments: PgPaymentsRepository::new(),
            products: PgProductsRepository::new(),
            wallets: PgWalletsRepository::new(),
        }
    }

    /// Move `order` to `to` and apply the transition's effects in one
    /// transaction. When `owner` is set the order must belong to that user.
    async fn transition(
        &self,
        owner: Option<UserUuid>,
        order: OrderUuid,
        to: OrderStatus,
        actor: Actor,
        at: Timestamp,
    ) -> Result<OrderRecord, OrdersServiceError> {
        let mut tx = self.db.begin_transaction().await?;

        let current = self.orders.lock_order(&mut tx, order).await?;

        if owner.is_some_and(|owner| owner != current.user_uuid) {
            return Err(OrdersServiceError::NotFound);
        }

        let transition = plan_transition(current.status, to, actor, current.delivered_at, at)
            .inspect_err(|error| {
                warn!(order_uuid = %order, from = %current.status, to = %to, %error, "rejected order transition");
            })?;

        if transition.reverses {
            let reduced = self
                .payments
                .reduce_total(&mut tx, current.payment_uuid, current.final_amount)
                .await?;

            let restored = self
                .products
                .restore_stock(&mut tx, current.product_uuid, current.size, current.quantity)
                .await?;

            if !reduced || restored == 0 {
                warn!(order_uuid = %order, reduced, restored, "order reversal does not match records");

                return Err(OrdersServiceError::ReversalConflict);
            }

            if transition.refund.applies_to(current.payment_method) && current.final_amount > 0 {
                let description = format!(
                    "Refund for {} order: {}",
                    to.label().to_lowercase(),
                    current.product_name
                );

                let entry = NewWalletTransaction::new(
                    current.user_uuid,
                    current.final_amount,
                    description,
                )
                .for_order(current.uuid);

                self.wallets.credit(&mut tx, &entry).await?;
            }
        }

        self.orders.update_status(&mut tx, order, to, at).await?;

        let updated = self.orders.get_order(&mut tx, order).await?;

        tx.commit().await?;

        info!(
            order_uuid = %order,
            from = %transition.from,
            to = %transition.to,
            reversed = transition.reverses,
            "updated order status"
        );

        Ok(updated)
    }
}

#[async_trait]
impl OrdersService for PgOrdersService {
    async fn list_orders(&self, user: UserUuid) -> Result<Vec<OrderRecord>, OrdersServiceError> {
        let mut tx = self.db.begin_transaction().await?;

        let orders = self.orders.list_orders(&mut tx, user).await?;

        tx.commit().await?;

        Ok(orders)
    }

    async fn get_order(
        &self,
        user: UserUuid,
        order: OrderUuid,
    ) -> Result<OrderRecord, OrdersServiceError> {
        let mut tx = self.db.begin_transaction().await?;

        let record = self.orders.get_order(&mut tx, order).await?;

        tx.commit().await?;

        if record.user_uuid != user {
            return Err(OrdersServiceError::NotFound);
        }

        Ok(record)
    }

    #[tracing::instrument(
        name = "orders.service.cancel_order",
        skip(self),
        fields(user_uuid = %user, order_uuid = %order),
        err
    )]
    async fn cancel_order(
        &self,
        user: UserUuid,
        order: OrderUuid,
        at: Timestamp,
    ) -> Result<OrderRecord, OrdersServiceError> {
        self.transition(Some(user), order, OrderStatus::Cancelled, Actor::Customer, at)
            .await
    }

    #[tracing::instrument(
        name = "orders.service.return_order",
        skip(self),
        fields(user_uuid = %user, order_uuid = %order),
        err
    )]
    async fn return_order(
        &self,
        user: UserUuid,
        order: OrderUuid,
        at: Timestamp,
    ) -> Result<OrderRecord, OrdersServiceError> {
        self.transition(Some(user), order, OrderStatus::Returned, Actor::Customer, at)
            .await
    }

    #[tracing::instrument(
        name = "orders.service.update_status",
        skip(self),
        fields(order_uuid = %order, status = %status),
        err
    )]
    async fn update_status(
        &self,
        order: OrderUuid,
        status: OrderStatus,
        at: Timestamp,
    ) -> Result<OrderRecord, OrdersServiceError> {
        self.transition(None, order, status, Actor::Admin, at).await
    }
}

#[automock]
#[async_trait]
pub trait OrdersService: Send + Sync {
    /// A user's orders, newest first.
    async fn list_orders(&self, user: UserUuid) -> Result<Vec<OrderRecord>, OrdersServiceError>;

    /// A single order owned by `user`.
    async fn get_order(
        &self,
        user: UserUuid,
        order: OrderUuid,
    ) -> Result<OrderRecord, OrdersServiceError>;

    /// Cancel a placed order, restoring stock and refunding prepaid amounts.
    async fn cancel_order(
        &self,
        user: UserUuid,
        order: OrderUuid,
        at: Timestamp,
    ) -> Result<OrderRecord, OrdersServiceError>;

    /// Return a delivered order within the return window, refunding it to
    /// the wallet.
    async fn return_order(
        &self,
        user: UserUuid,
        order: OrderUuid,
        at: Timestamp,
    ) -> Result<OrderRecord, OrdersServiceError>;

    /// Move an order to `status` on behalf of an admin.
    async fn update_status(
        &self,
        order: OrderUuid,
        status: OrderStatus,
        at: Timestamp,
    ) -> Result<OrderRecord, OrdersServiceError>;
}

#[cfg(all(test, feature = "integration-tests"))]
mod tests {
    use jiff::SignedDuration;
    use testresult::TestResult;

    use crate::{
        domain::{
            orders::status::TransitionError,
            payments::records::PaymentMethod,
            products::{ProductsService, records::Size},
            wallets::{WalletsService, records::TransactionKind},
        },
        test::TestContext,
    };

    use super::*;

    #[tokio::test]
    async fn cancelling_a_wallet_order_restores_stock_and_refunds() -> TestResult {
        let ctx = TestContext::new().await;
        let user = ctx.create_user("cancel@example.com").await;
        let product = ctx.create_product(1_000, &[(Size::Medium, 5)]).await;

        ctx.fund_wallet(user, 10_000).await;
        ctx.add_to_cart(user, product, Size::Medium, 2).await;

        let placed = ctx.place_order(user, PaymentMethod::Wallet).await;
        let order = placed.orders.first().ok_or("no order placed")?.clone();

        assert_eq!(ctx.wallets.get_wallet(user).await?.balance, 8_000);

        let cancelled = ctx.orders.cancel_order(user, order.uuid, ctx.now()).await?;

        assert_eq!(cancelled.status, OrderStatus::Cancelled);
        assert!(cancelled.cancelled_at.is_some(), "cancellation is stamped");

        let stock = ctx
            .products
            .view_product(product)
            .await?
            .stock_for(Size::Medium)
            .ok_or("size missing")?;

        assert_eq!(stock.available, 5);
        assert_eq!(stock.sold, 0);

        let wallet = ctx.wallets.get_wallet(user).await?;
        let refund = wallet.transactions.first().ok_or("no refund")?;

        assert_eq!(wallet.balance, 10_000);
        assert_eq!(refund.kind, TransactionKind::Credit);
        assert_eq!(refund.amount, 2_000);
        assert_eq!(refund.order_uuid, Some(order.uuid));

        Ok(())
    }

    #[tokio::test]
    async fn cancelling_a_cash_on_delivery_order_does_not_refund() -> TestResult {
        let ctx = TestContext::new().await;
        let user = ctx.create_user("cod@example.com").await;
        let product = ctx.create_product(1_000, &[(Size::Small, 3)]).await;

        ctx.add_to_cart(user, product, Size::Small, 1).await;

        let placed = ctx.place_order(user, PaymentMethod::CashOnDelivery).await;
        let order = placed.orders.first().ok_or("no order placed")?.clone();

        ctx.orders.cancel_order(user, order.uuid, ctx.now()).await?;

        let wallet = ctx.wallets.get_wallet(user).await?;

        assert_eq!(wallet.balance, 0);
        assert!(wallet.transactions.is_empty(), "no refund for cash on delivery");

        Ok(())
    }

    #[tokio::test]
    async fn invalid_transition_has_no_side_effects() -> TestResult {
        let ctx = TestContext::new().await;
        let user = ctx.create_user("invalid@example.com").await;
        let product = ctx.create_product(1_000, &[(Size::Large, 2)]).await;

        ctx.add_to_cart(user, product, Size::Large, 1).await;

        let placed = ctx.place_order(user, PaymentMethod::CashOnDelivery).await;
        let order = placed.orders.first().ok_or("no order placed")?.clone();

        ctx.orders.cancel_order(user, order.uuid, ctx.now()).await?;

        let result = ctx
            .orders
            .update_status(order.uuid, OrderStatus::Placed, ctx.now())
            .await;

        assert!(
            matches!(
                result,
                Err(OrdersServiceError::Transition(TransitionError::InvalidTransition {
                    from: OrderStatus::Cancelled,
                    to: OrderStatus::Placed,
                }))
            ),
            "expected InvalidTransition, got {result:?}"
        );

        let again = ctx.orders.cancel_order(user, order.uuid, ctx.now()).await;

        assert!(
            matches!(again, Err(OrdersServiceError::Transition(_))),
            "expected a transition error, got {again:?}"
        );

        let stock = ctx
            .products
            .view_product(product)
            .await?
            .stock_for(Size::Large)
            .ok_or("size missing")?;

        assert_eq!(stock.available, 2, "stock restored exactly once");

        Ok(())
    }

    #[tokio::test]
    async fn delivered_order_can_be_returned_inside_the_window() -> TestResult {
        let ctx = TestContext::new().await;
        let user = ctx.create_user("return@example.com").await;
        let product = ctx.create_product(2_500, &[(Size::ExtraLarge, 4)]).await;

        ctx.add_to_cart(user, product, Size::ExtraLarge, 1).await;

        let placed = ctx.place_order(user, PaymentMethod::CashOnDelivery).await;
        let order = placed.orders.first().ok_or("no order placed")?.clone();

        let delivered_at = ctx.now();

        ctx.orders
            .update_status(order.uuid, OrderStatus::Delivered, delivered_at)
            .await?;

        let returned = ctx
            .orders
            .return_order(user, order.uuid, delivered_at + SignedDuration::from_hours(72))
            .await?;

        assert_eq!(returned.status, OrderStatus::Returned);

        let wallet = ctx.wallets.get_wallet(user).await?;

        assert_eq!(wallet.balance, 2_500, "returns are refunded even for cash on delivery");

        let received = ctx
            .orders
            .update_status(order.uuid, OrderStatus::ReturnReceived, ctx.now())
            .await?;

        assert_eq!(received.status, OrderStatus::ReturnReceived);

        Ok(())
    }

    #[tokio::test]
    async fn late_return_is_rejected() -> TestResult {
        let ctx = TestContext::new().await;
        let user = ctx.create_user("late-return@example.com").await;
        let product = ctx.create_product(2_500, &[(Size::Small, 4)]).await;

        ctx.add_to_cart(user, product, Size::Small, 1).await;

        let placed = ctx.place_order(user, PaymentMethod::CashOnDelivery).await;
        let order = placed.orders.first().ok_or("no order placed")?.clone();

        let delivered_at = ctx.now();

        ctx.orders
            .update_status(order.uuid, OrderStatus::Delivered, delivered_at)
            .await?;

        let late = delivered_at + SignedDuration::from_mins(10 * 24 * 60 + 144);
        let result = ctx.orders.return_order(user, order.uuid, late).await;

        assert!(
            matches!(
                result,
                Err(OrdersServiceError::Transition(TransitionError::ReturnWindowClosed))
            ),
            "expected ReturnWindowClosed, got {result:?}"
        );

        Ok(())
    }

    #[tokio::test]
    async fn customers_cannot_touch_other_users_orders() -> TestResult {
        let ctx = TestContext::new().await;
        let owner = ctx.create_user("owner@example.com").await;
        let stranger = ctx.create_user("stranger@example.com").await;
        let product = ctx.create_product(1_000, &[(Size::Medium, 2)]).await;

        ctx.add_to_cart(owner, product, Size::Medium, 1).await;

        let placed = ctx.place_order(owner, PaymentMethod::CashOnDelivery).await;
        let order = placed.orders.first().ok_or("no order placed")?.clone();

        let viewed = ctx.orders.get_order(stranger, order.uuid).await;

        assert!(
            matches!(viewed, Err(OrdersServiceError::NotFound)),
            "expected NotFound, got {viewed:?}"
        );

        let cancelled = ctx.orders.cancel_order(stranger, order.uuid, ctx.now()).await;

        assert!(
            matches!(cancelled, Err(OrdersServiceError::NotFound)),
            "expected NotFound, got {cancelled:?}"
        );

        assert_eq!(ctx.orders.list_orders(owner).await?.len(), 1);
        assert!(ctx.orders.list_orders(stranger).await?.is_empty());

        Ok(())
    }
}
