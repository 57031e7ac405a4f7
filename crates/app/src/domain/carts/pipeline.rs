//! Shared cart loading and pricing used by carts and checkout.

use jiff::Timestamp;
use rustc_hash::{FxHashMap, FxHashSet};
use sqlx::{Postgres, Transaction};
use tracing::warn;

use crate::domain::{
    carts::{
        records::CartRecord,
        repositories::{PgCartItemsRepository, PgCartsRepository},
        valuation::{ValuatedCart, valuate},
    },
    categories::records::CategoryUuid,
    coupons::{
        CouponRejection, CouponRules, PgCouponsRepository, records::AppliedCoupon,
        validate_coupon,
    },
    offers::PgOffersRepository,
    orders::PgOrdersRepository,
    products::{
        PgProductsRepository,
        records::{ProductUuid, Size},
    },
    users::records::UserUuid,
};

/// Outcome of checking a coupon code against a cart.
#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) enum CouponCheck {
    Accepted(AppliedCoupon),
    Rejected(CouponRejection),
    Unknown,
}

#[derive(Debug, Clone)]
pub(crate) struct CartPipeline {
    pub(crate) carts: PgCartsRepository,
    pub(crate) items: PgCartItemsRepository,
    pub(crate) products: PgProductsRepository,
    offers: PgOffersRepository,
    coupons: PgCouponsRepository,
    orders: PgOrdersRepository,
    rules: CouponRules,
}

impl CartPipeline {
    pub(crate) fn new(rules: CouponRules) -> Self {
        Self {
            carts: PgCartsRepository::new(),
            items: PgCartItemsRepository::new(),
            products: PgProductsRepository::new(),
            offers: PgOffersRepository::new(),
            coupons: PgCouponsRepository::new(),
            orders: PgOrdersRepository::new(),
            rules,
        }
    }

    /// Load and price the user's cart. A user without a cart gets an empty one.
    pub(crate) async fn valuate(
        &self,
        tx: &mut Transaction<'_, Postgres>,
        user: UserUuid,
        at: Timestamp,
    ) -> Result<ValuatedCart, sqlx::Error> {
        let cart = self
            .carts
            .get_cart(tx, user)
            .await?
            .unwrap_or_else(|| CartRecord::empty(user, at));

        self.price(tx, cart, at).await
    }

    /// Like [`Self::valuate`], holding the cart row lock for the rest of the
    /// transaction.
    pub(crate) async fn valuate_locked(
        &self,
        tx: &mut Transaction<'_, Postgres>,
        user: UserUuid,
        at: Timestamp,
    ) -> Result<ValuatedCart, sqlx::Error> {
        let cart = self
            .carts
            .lock_cart(tx, user)
            .await?
            .unwrap_or_else(|| CartRecord::empty(user, at));

        self.price(tx, cart, at).await
    }

    async fn price(
        &self,
        tx: &mut Transaction<'_, Postgres>,
        mut cart: CartRecord,
        at: Timestamp,
    ) -> Result<ValuatedCart, sqlx::Error> {
        cart.items = self.items.list_items(tx, cart.user_uuid).await?;

        let product_uuids: Vec<ProductUuid> = cart
            .items
            .iter()
            .map(|item| item.product_uuid)
            .collect::<FxHashSet<_>>()
            .into_iter()
            .collect();

        let products: FxHashMap<_, _> = self
            .products
            .get_products(tx, &product_uuids)
            .await?
            .into_iter()
            .map(|product| (product.uuid, product))
            .collect();

        let category_uuids: Vec<CategoryUuid> = products
            .values()
            .map(|product| product.category_uuid)
            .collect::<FxHashSet<_>>()
            .into_iter()
            .collect();

        let offers = if products.is_empty() {
            Vec::new()
        } else {
            self.offers
                .list_live_offers(tx, &product_uuids, &category_uuids, at)
                .await?
        };

        Ok(valuate(&cart, &products, &offers, at))
    }

    /// Check `code` for a user whose cart is worth `cart_total`.
    ///
    /// The accepted amount never exceeds the cart total.
    pub(crate) async fn check_coupon(
        &self,
        tx: &mut Transaction<'_, Postgres>,
        user: UserUuid,
        code: &str,
        cart_total: u64,
        at: Timestamp,
    ) -> Result<CouponCheck, sqlx::Error> {
        let Some(coupon) = self.coupons.find_coupon_by_code(tx, code).await? else {
            return Ok(CouponCheck::Unknown);
        };

        let prior_orders = self.orders.count_orders_for_user(tx, user).await?;

        Ok(
            match validate_coupon(&coupon, &self.rules, prior_orders, cart_total, at) {
                Ok(()) => CouponCheck::Accepted(AppliedCoupon {
                    code: coupon.code,
                    amount: coupon.discount_amount.min(cart_total),
                }),
                Err(rejection) => CouponCheck::Rejected(rejection),
            },
        )
    }

    /// Re-check the cart's applied coupon against its current value.
    ///
    /// A coupon that no longer qualifies is removed from the cart, both in
    /// `cart` and in storage, and the rejection is returned.
    pub(crate) async fn revalidate_coupon(
        &self,
        tx: &mut Transaction<'_, Postgres>,
        cart: &mut ValuatedCart,
        at: Timestamp,
    ) -> Result<Option<CouponRejection>, sqlx::Error> {
        let Some(applied) = cart.coupon.clone() else {
            return Ok(None);
        };

        let check = self
            .check_coupon(tx, cart.user_uuid, &applied.code, cart.total_amount, at)
            .await?;

        let rejection = match check {
            CouponCheck::Accepted(coupon) => {
                cart.coupon = Some(coupon);

                return Ok(None);
            }
            CouponCheck::Rejected(rejection) => rejection,
            CouponCheck::Unknown => CouponRejection::Inactive,
        };

        warn!(
            user_uuid = %cart.user_uuid,
            code = %applied.code,
            %rejection,
            "removing coupon that no longer applies"
        );

        cart.coupon = None;

        self.carts.set_coupon(tx, cart.user_uuid, None).await?;

        Ok(Some(rejection))
    }

    /// Persist the valuation's totals as the cart's display cache.
    pub(crate) async fn refresh_cache(
        &self,
        tx: &mut Transaction<'_, Postgres>,
        cart: &ValuatedCart,
    ) -> Result<(), sqlx::Error> {
        self.carts
            .update_totals(
                tx,
                cart.user_uuid,
                cart.total_amount,
                cart.total_initial_amount,
            )
            .await?;

        Ok(())
    }

    /// Take purchased `(product, size, quantity)` lines out of the user's
    /// cart, drop the coupon the purchase used and refresh the cached
    /// totals for whatever is left.
    pub(crate) async fn settle(
        &self,
        tx: &mut Transaction<'_, Postgres>,
        user: UserUuid,
        purchased: &[(ProductUuid, Size, u32)],
        at: Timestamp,
    ) -> Result<(), sqlx::Error> {
        self.carts.lock_cart(tx, user).await?;

        for &(product, size, quantity) in purchased {
            self.items
                .remove_purchased(tx, user, product, size, quantity)
                .await?;
        }

        self.carts.clear_cart(tx, user).await?;

        let remaining = self.valuate(tx, user, at).await?;

        if !remaining.is_empty() {
            self.refresh_cache(tx, &remaining).await?;
        }

        Ok(())
    }
}
