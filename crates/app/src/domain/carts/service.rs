//! Carts service.

use async_trait::async_trait;
use jiff::Timestamp;
use mockall::automock;
use sqlx::{Postgres, Transaction};
use tracing::{info, warn};

use crate::{
    database::Db,
    domain::{
        carts::{
            data::NewCartItem,
            errors::CartsServiceError,
            pipeline::{CartPipeline, CouponCheck},
            records::CartItemUuid,
            stock::{InvalidLine, check_line, validate_stock},
            valuation::ValuatedCart,
        },
        coupons::CouponRules,
        products::records::{ProductUuid, Size},
        users::records::UserUuid,
    },
};

/// A valuated cart together with the lines that cannot be fulfilled.
#[derive(Debug, Clone, PartialEq)]
pub struct CartValidation {
    pub cart: ValuatedCart,
    pub invalid_lines: Vec<InvalidLine>,
}

impl CartValidation {
    #[must_use]
    pub fn is_valid(&self) -> bool {
        self.invalid_lines.is_empty()
    }
}

#[derive(Debug, Clone)]
pub struct PgCartsService {
    db: Db,
    pipeline: CartPipeline,
}

impl PgCartsService {
    #[must_use]
    pub fn new(db: Db, rules: CouponRules) -> Self {
        Self {
            db,
            pipeline: CartPipeline::new(rules),
        }
    }

    /// Reject `quantity` units of `product` in `size` if stock cannot cover them.
    async fn ensure_stockable(
        &self,
        tx: &mut Transaction<'_, Postgres>,
        product: ProductUuid,
        size: Size,
        quantity: u32,
    ) -> Result<(), CartsServiceError> {
        if quantity == 0 {
            return Err(CartsServiceError::InvalidQuantity);
        }

        let record = self
            .pipeline
            .products
            .get_product(tx, product)
            .await
            .map_err(|error| match error {
                sqlx::Error::RowNotFound => CartsServiceError::ProductNotFound,
                other => other.into(),
            })?;

        match check_line(record.stock_for(size), quantity) {
            Some(issue) => Err(CartsServiceError::InvalidLine(issue)),
            None => Ok(()),
        }
    }

    /// Drop any applied coupon, re-price and refresh the cached totals.
    async fn finish_mutation(
        &self,
        mut tx: Transaction<'_, Postgres>,
        user: UserUuid,
        at: Timestamp,
    ) -> Result<ValuatedCart, CartsServiceError> {
        self.pipeline.carts.set_coupon(&mut tx, user, None).await?;

        let cart = self.pipeline.valuate(&mut tx, user, at).await?;

        self.pipeline.refresh_cache(&mut tx, &cart).await?;

        tx.commit().await?;

        Ok(cart)
    }
}

#[async_trait]
impl CartsService for PgCartsService {
    async fn get_cart(
        &self,
        user: UserUuid,
        at: Timestamp,
    ) -> Result<ValuatedCart, CartsServiceError> {
        let mut tx = self.db.begin_transaction().await?;

        let cart = self.pipeline.valuate(&mut tx, user, at).await?;

        tx.commit().await?;

        Ok(cart)
    }

    #[tracing::instrument(
        name = "carts.service.validate_cart",
        skip(self),
        fields(user_uuid = %user, invalid_line_count = tracing::field::Empty),
        err
    )]
    async fn validate_cart(
        &self,
        user: UserUuid,
        at: Timestamp,
    ) -> Result<CartValidation, CartsServiceError> {
        let mut tx = self.db.begin_transaction().await?;

        let mut cart = self.pipeline.valuate(&mut tx, user, at).await?;

        self.pipeline
            .revalidate_coupon(&mut tx, &mut cart, at)
            .await?;

        tx.commit().await?;

        let invalid_lines = validate_stock(&cart);

        tracing::Span::current().record("invalid_line_count", invalid_lines.len());

        Ok(CartValidation {
            cart,
            invalid_lines,
        })
    }

    #[tracing::instrument(
        name = "carts.service.add_item",
        skip(self, item),
        fields(
            user_uuid = %user,
            product_uuid = %item.product_uuid,
            size = %item.size,
            quantity = item.quantity
        ),
        err
    )]
    async fn add_item(
        &self,
        user: UserUuid,
        item: NewCartItem,
        at: Timestamp,
    ) -> Result<ValuatedCart, CartsServiceError> {
        let mut tx = self.db.begin_transaction().await?;

        self.pipeline.carts.ensure_cart(&mut tx, user).await?;

        let existing = self
            .pipeline
            .items
            .find_item(&mut tx, user, item.product_uuid, item.size)
            .await?;

        let quantity = existing
            .as_ref()
            .map_or(item.quantity, |line| line.quantity.saturating_add(item.quantity));

        self.ensure_stockable(&mut tx, item.product_uuid, item.size, quantity)
            .await?;

        match existing {
            Some(line) => {
                self.pipeline
                    .items
                    .update_item(&mut tx, user, line.uuid, line.size, quantity)
                    .await?;
            }
            None => {
                self.pipeline.items.create_item(&mut tx, user, &item).await?;
            }
        }

        self.finish_mutation(tx, user, at).await
    }

    #[tracing::instrument(
        name = "carts.service.update_item_quantity",
        skip(self),
        fields(user_uuid = %user, item_uuid = %item),
        err
    )]
    async fn update_item_quantity(
        &self,
        user: UserUuid,
        item: CartItemUuid,
        quantity: u32,
        at: Timestamp,
    ) -> Result<ValuatedCart, CartsServiceError> {
        let mut tx = self.db.begin_transaction().await?;

        let line = self.pipeline.items.get_item(&mut tx, user, item).await?;

        self.ensure_stockable(&mut tx, line.product_uuid, line.size, quantity)
            .await?;

        self.pipeline
            .items
            .update_item(&mut tx, user, item, line.size, quantity)
            .await?;

        self.finish_mutation(tx, user, at).await
    }

    #[tracing::instrument(
        name = "carts.service.update_item_size",
        skip(self),
        fields(user_uuid = %user, item_uuid = %item, size = %size),
        err
    )]
    async fn update_item_size(
        &self,
        user: UserUuid,
        item: CartItemUuid,
        size: Size,
        at: Timestamp,
    ) -> Result<ValuatedCart, CartsServiceError> {
        let mut tx = self.db.begin_transaction().await?;

        let line = self.pipeline.items.get_item(&mut tx, user, item).await?;

        if line.size == size {
            return self.finish_mutation(tx, user, at).await;
        }

        let sibling = self
            .pipeline
            .items
            .find_item(&mut tx, user, line.product_uuid, size)
            .await?;

        match sibling {
            Some(sibling) => {
                // Merge into the line that already holds the new size.
                let quantity = sibling.quantity.saturating_add(line.quantity);

                self.ensure_stockable(&mut tx, line.product_uuid, size, quantity)
                    .await?;

                self.pipeline.items.delete_item(&mut tx, user, item).await?;

                self.pipeline
                    .items
                    .update_item(&mut tx, user, sibling.uuid, size, quantity)
                    .await?;
            }
            None => {
                self.ensure_stockable(&mut tx, line.product_uuid, size, line.quantity)
                    .await?;

                self.pipeline
                    .items
                    .update_item(&mut tx, user, item, size, line.quantity)
                    .await?;
            }
        }

        self.finish_mutation(tx, user, at).await
    }

    #[tracing::instrument(
        name = "carts.service.remove_item",
        skip(self),
        fields(user_uuid = %user, item_uuid = %item),
        err
    )]
    async fn remove_item(
        &self,
        user: UserUuid,
        item: CartItemUuid,
        at: Timestamp,
    ) -> Result<ValuatedCart, CartsServiceError> {
        let mut tx = self.db.begin_transaction().await?;

        let rows_affected = self.pipeline.items.delete_item(&mut tx, user, item).await?;

        if rows_affected == 0 {
            return Err(CartsServiceError::NotFound);
        }

        self.finish_mutation(tx, user, at).await
    }

    #[tracing::instrument(
        name = "carts.service.apply_coupon",
        skip(self),
        fields(user_uuid = %user, code = %code),
        err
    )]
    async fn apply_coupon(
        &self,
        user: UserUuid,
        code: &str,
        at: Timestamp,
    ) -> Result<ValuatedCart, CartsServiceError> {
        let mut tx = self.db.begin_transaction().await?;

        let mut cart = self.pipeline.valuate(&mut tx, user, at).await?;

        if cart.is_empty() {
            return Err(CartsServiceError::EmptyCart);
        }

        let check = self
            .pipeline
            .check_coupon(&mut tx, user, code, cart.total_amount, at)
            .await?;

        let coupon = match check {
            CouponCheck::Accepted(coupon) => coupon,
            CouponCheck::Rejected(rejection) => {
                warn!(user_uuid = %user, code, %rejection, "coupon rejected");

                return Err(CartsServiceError::CouponRejected(rejection));
            }
            CouponCheck::Unknown => return Err(CartsServiceError::CouponNotFound),
        };

        self.pipeline
            .carts
            .set_coupon(&mut tx, user, Some(&coupon))
            .await?;

        self.pipeline.refresh_cache(&mut tx, &cart).await?;

        tx.commit().await?;

        info!(user_uuid = %user, code, amount = coupon.amount, "applied coupon");

        cart.coupon = Some(coupon);

        Ok(cart)
    }

    async fn remove_coupon(
        &self,
        user: UserUuid,
        at: Timestamp,
    ) -> Result<ValuatedCart, CartsServiceError> {
        let tx = self.db.begin_transaction().await?;

        self.finish_mutation(tx, user, at).await
    }
}

#[automock]
#[async_trait]
pub trait CartsService: Send + Sync {
    /// Price the user's cart at `at`. Users without a cart get an empty one.
    async fn get_cart(
        &self,
        user: UserUuid,
        at: Timestamp,
    ) -> Result<ValuatedCart, CartsServiceError>;

    /// Price the cart, drop a coupon that no longer applies and report
    /// lines that cannot be fulfilled.
    async fn validate_cart(
        &self,
        user: UserUuid,
        at: Timestamp,
    ) -> Result<CartValidation, CartsServiceError>;

    /// Add units of a product size, merging into an existing line for the
    /// same pair.
    async fn add_item(
        &self,
        user: UserUuid,
        item: NewCartItem,
        at: Timestamp,
    ) -> Result<ValuatedCart, CartsServiceError>;

    /// Replace a line's quantity.
    async fn update_item_quantity(
        &self,
        user: UserUuid,
        item: CartItemUuid,
        quantity: u32,
        at: Timestamp,
    ) -> Result<ValuatedCart, CartsServiceError>;

    /// Move a line to another size, merging with any line already holding it.
    async fn update_item_size(
        &self,
        user: UserUuid,
        item: CartItemUuid,
        size: Size,
        at: Timestamp,
    ) -> Result<ValuatedCart, CartsServiceError>;

    /// Remove a line.
    async fn remove_item(
        &self,
        user: UserUuid,
        item: CartItemUuid,
        at: Timestamp,
    ) -> Result<ValuatedCart, CartsServiceError>;

    /// Validate a coupon code against the cart and apply it.
    async fn apply_coupon(
        &self,
        user: UserUuid,
        code: &str,
        at: Timestamp,
    ) -> Result<ValuatedCart, CartsServiceError>;

    /// Remove any applied coupon.
    async fn remove_coupon(
        &self,
        user: UserUuid,
        at: Timestamp,
    ) -> Result<ValuatedCart, CartsServiceError>;
}

#[cfg(all(test, feature = "integration-tests"))]
mod tests {
    use testresult::TestResult;

    use crate::{
        domain::{
            carts::stock::StockIssue,
            coupons::{CouponRejection, CouponsService, data::NewCoupon, records::CouponUuid},
            products::{ProductsService, data::StockUpdate},
        },
        test::TestContext,
    };

    use super::*;

    fn new_item(product: ProductUuid, size: Size, quantity: u32) -> NewCartItem {
        NewCartItem {
            uuid: CartItemUuid::new(),
            product_uuid: product,
            size,
            quantity,
        }
    }

    async fn create_coupon(ctx: &TestContext, code: &str, minimum: u64, amount: u64) {
        ctx.coupons
            .create_coupon(NewCoupon {
                uuid: CouponUuid::new(),
                code: code.to_string(),
                minimum_purchase: minimum,
                discount_amount: amount,
                valid_from: ctx.now() - jiff::SignedDuration::from_hours(1),
                valid_upto: None,
            })
            .await
            .expect("Failed to create coupon");
    }

    #[tokio::test]
    async fn missing_cart_reads_as_empty() -> TestResult {
        let ctx = TestContext::new().await;
        let user = ctx.create_user("empty@example.com").await;

        let cart = ctx.carts.get_cart(user, ctx.now()).await?;

        assert!(cart.is_empty(), "expected empty cart, got {cart:?}");
        assert_eq!(cart.total_amount, 0);

        Ok(())
    }

    #[tokio::test]
    async fn adding_the_same_size_twice_merges_lines() -> TestResult {
        let ctx = TestContext::new().await;
        let user = ctx.create_user("merge@example.com").await;
        let product = ctx.create_product(1_500, &[(Size::Medium, 8)]).await;

        ctx.carts
            .add_item(user, new_item(product, Size::Medium, 2), ctx.now())
            .await?;

        let cart = ctx
            .carts
            .add_item(user, new_item(product, Size::Medium, 3), ctx.now())
            .await?;

        assert_eq!(cart.lines.len(), 1);
        assert_eq!(cart.lines[0].quantity, 5);
        assert_eq!(cart.total_amount, 7_500);

        Ok(())
    }

    #[tokio::test]
    async fn add_rejects_sizes_the_product_does_not_offer() -> TestResult {
        let ctx = TestContext::new().await;
        let user = ctx.create_user("size@example.com").await;
        let product = ctx.create_product(1_000, &[(Size::Small, 4)]).await;

        let result = ctx
            .carts
            .add_item(user, new_item(product, Size::ExtraLarge, 1), ctx.now())
            .await;

        assert!(
            matches!(
                result,
                Err(CartsServiceError::InvalidLine(StockIssue::InvalidSize))
            ),
            "expected InvalidSize, got {result:?}"
        );

        Ok(())
    }

    #[tokio::test]
    async fn add_caps_a_line_at_ten_units() -> TestResult {
        let ctx = TestContext::new().await;
        let user = ctx.create_user("ten@example.com").await;
        let product = ctx.create_product(1_000, &[(Size::Large, 50)]).await;

        ctx.add_to_cart(user, product, Size::Large, 10).await;

        let result = ctx
            .carts
            .add_item(user, new_item(product, Size::Large, 1), ctx.now())
            .await;

        assert!(
            matches!(
                result,
                Err(CartsServiceError::InvalidLine(StockIssue::MoreThanTen))
            ),
            "expected MoreThanTen, got {result:?}"
        );

        Ok(())
    }

    #[tokio::test]
    async fn zero_quantity_is_rejected() -> TestResult {
        let ctx = TestContext::new().await;
        let user = ctx.create_user("zero-qty@example.com").await;
        let product = ctx.create_product(1_000, &[(Size::Small, 3)]).await;

        let cart = ctx
            .carts
            .add_item(user, new_item(product, Size::Small, 1), ctx.now())
            .await?;

        let result = ctx
            .carts
            .update_item_quantity(user, cart.lines[0].item_uuid, 0, ctx.now())
            .await;

        assert!(
            matches!(result, Err(CartsServiceError::InvalidQuantity)),
            "expected InvalidQuantity, got {result:?}"
        );

        Ok(())
    }

    #[tokio::test]
    async fn changing_size_merges_into_existing_line() -> TestResult {
        let ctx = TestContext::new().await;
        let user = ctx.create_user("resize@example.com").await;
        let product = ctx
            .create_product(1_000, &[(Size::Small, 5), (Size::Medium, 5)])
            .await;

        ctx.add_to_cart(user, product, Size::Small, 1).await;

        let cart = ctx
            .carts
            .add_item(user, new_item(product, Size::Medium, 2), ctx.now())
            .await?;

        let small = cart
            .lines
            .iter()
            .find(|line| line.size == Size::Small)
            .ok_or("small line missing")?;

        let cart = ctx
            .carts
            .update_item_size(user, small.item_uuid, Size::Medium, ctx.now())
            .await?;

        assert_eq!(cart.lines.len(), 1);
        assert_eq!(cart.lines[0].size, Size::Medium);
        assert_eq!(cart.lines[0].quantity, 3);

        Ok(())
    }

    #[tokio::test]
    async fn removing_unknown_item_returns_not_found() -> TestResult {
        let ctx = TestContext::new().await;
        let user = ctx.create_user("remove@example.com").await;

        let result = ctx
            .carts
            .remove_item(user, CartItemUuid::new(), ctx.now())
            .await;

        assert!(
            matches!(result, Err(CartsServiceError::NotFound)),
            "expected NotFound, got {result:?}"
        );

        Ok(())
    }

    #[tokio::test]
    async fn coupon_on_empty_cart_is_rejected() -> TestResult {
        let ctx = TestContext::new().await;
        let user = ctx.create_user("coupon-empty@example.com").await;

        create_coupon(&ctx, "SAVE100", 0, 100).await;

        let result = ctx.carts.apply_coupon(user, "SAVE100", ctx.now()).await;

        assert!(
            matches!(result, Err(CartsServiceError::EmptyCart)),
            "expected EmptyCart, got {result:?}"
        );

        Ok(())
    }

    #[tokio::test]
    async fn unknown_coupon_code_is_not_found() -> TestResult {
        let ctx = TestContext::new().await;
        let user = ctx.create_user("coupon-unknown@example.com").await;
        let product = ctx.create_product(1_000, &[(Size::Small, 3)]).await;

        ctx.add_to_cart(user, product, Size::Small, 1).await;

        let result = ctx.carts.apply_coupon(user, "NOPE", ctx.now()).await;

        assert!(
            matches!(result, Err(CartsServiceError::CouponNotFound)),
            "expected CouponNotFound, got {result:?}"
        );

        Ok(())
    }

    #[tokio::test]
    async fn coupon_below_minimum_purchase_is_rejected() -> TestResult {
        let ctx = TestContext::new().await;
        let user = ctx.create_user("coupon-min@example.com").await;
        let product = ctx.create_product(1_000, &[(Size::Small, 3)]).await;

        create_coupon(&ctx, "BIG", 5_000, 500).await;
        ctx.add_to_cart(user, product, Size::Small, 1).await;

        let result = ctx.carts.apply_coupon(user, "BIG", ctx.now()).await;

        assert!(
            matches!(
                result,
                Err(CartsServiceError::CouponRejected(
                    CouponRejection::BelowMinimumPurchase { minimum: 5_000 }
                ))
            ),
            "expected BelowMinimumPurchase, got {result:?}"
        );

        Ok(())
    }

    #[tokio::test]
    async fn changing_the_cart_drops_the_coupon() -> TestResult {
        let ctx = TestContext::new().await;
        let user = ctx.create_user("coupon-drop@example.com").await;
        let product = ctx.create_product(1_000, &[(Size::Small, 5)]).await;

        create_coupon(&ctx, "SAVE100", 0, 100).await;
        ctx.add_to_cart(user, product, Size::Small, 1).await;

        let cart = ctx.carts.apply_coupon(user, "SAVE100", ctx.now()).await?;

        assert_eq!(cart.payable_amount(), 900);

        let cart = ctx
            .carts
            .add_item(user, new_item(product, Size::Small, 1), ctx.now())
            .await?;

        assert!(cart.coupon.is_none(), "coupon should be cleared, got {cart:?}");
        assert_eq!(cart.payable_amount(), 2_000);

        Ok(())
    }

    #[tokio::test]
    async fn validate_reports_lines_stock_can_no_longer_cover() -> TestResult {
        let ctx = TestContext::new().await;
        let user = ctx.create_user("validate@example.com").await;
        let product = ctx.create_product(1_000, &[(Size::Medium, 5)]).await;

        ctx.add_to_cart(user, product, Size::Medium, 4).await;

        ctx.products
            .set_stock(
                product,
                StockUpdate {
                    size: Size::Medium,
                    available: 2,
                },
            )
            .await?;

        let validation = ctx.carts.validate_cart(user, ctx.now()).await?;

        assert!(!validation.is_valid(), "expected invalid cart");
        assert_eq!(validation.invalid_lines.len(), 1);
        assert_eq!(
            validation.invalid_lines[0].issue,
            StockIssue::MoreThanAvailable
        );

        Ok(())
    }

    #[tokio::test]
    async fn deleted_products_stop_counting_towards_totals() -> TestResult {
        let ctx = TestContext::new().await;
        let user = ctx.create_user("deleted@example.com").await;
        let kept = ctx.create_product(1_000, &[(Size::Small, 5)]).await;
        let gone = ctx.create_product(4_000, &[(Size::Small, 5)]).await;

        ctx.add_to_cart(user, kept, Size::Small, 1).await;
        ctx.add_to_cart(user, gone, Size::Small, 1).await;

        ctx.products.delete_product(gone).await?;

        let validation = ctx.carts.validate_cart(user, ctx.now()).await?;

        assert_eq!(validation.cart.total_amount, 1_000);
        assert!(
            validation
                .invalid_lines
                .iter()
                .any(|line| line.product_uuid == gone && line.issue == StockIssue::NotAvailable),
            "expected deleted product to be flagged, got {:?}",
            validation.invalid_lines
        );

        Ok(())
    }
}
