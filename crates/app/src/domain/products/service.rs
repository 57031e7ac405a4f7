//! Products service.

use async_trait::async_trait;
use mockall::automock;
use tracing::info;

use crate::{
    database::Db,
    domain::products::{
        data::{NewProduct, StockUpdate},
        errors::ProductsServiceError,
        records::{ProductRecord, ProductUuid},
        repository::PgProductsRepository,
    },
};

/// Popularity gained each time a product is viewed.
pub const VIEW_POPULARITY: u64 = 1;

/// Popularity gained each time a product is bought on an order line.
pub const PURCHASE_POPULARITY: u64 = 5;

#[derive(Debug, Clone)]
pub struct PgProductsService {
    db: Db,
    repository: PgProductsRepository,
}

impl PgProductsService {
    #[must_use]
    pub fn new(db: Db) -> Self {
        Self {
            db,
            repository: PgProductsRepository::new(),
        }
    }
}

#[async_trait]
impl ProductsService for PgProductsService {
    async fn list_products(&self) -> Result<Vec<ProductRecord>, ProductsServiceError> {
        let mut tx = self.db.begin_transaction().await?;

        let products = self.repository.list_products(&mut tx).await?;

        tx.commit().await?;

        Ok(products)
    }

    #[tracing::instrument(
        name = "products.service.view_product",
        skip(self),
        fields(product_uuid = %product),
        err
    )]
    async fn view_product(
        &self,
        product: ProductUuid,
    ) -> Result<ProductRecord, ProductsServiceError> {
        let mut tx = self.db.begin_transaction().await?;

        self.repository
            .bump_popularity(&mut tx, product, VIEW_POPULARITY)
            .await?;

        let record = self.repository.get_product(&mut tx, product).await?;

        tx.commit().await?;

        Ok(record)
    }

    #[tracing::instrument(
        name = "products.service.create_product",
        skip(self, product),
        fields(product_uuid = %product.uuid, category_uuid = %product.category_uuid),
        err
    )]
    async fn create_product(
        &self,
        product: NewProduct,
    ) -> Result<ProductRecord, ProductsServiceError> {
        if product.name.trim().is_empty() || product.brand.trim().is_empty() {
            return Err(ProductsServiceError::MissingRequiredData);
        }

        let mut tx = self.db.begin_transaction().await?;

        let created = self.repository.create_product(&mut tx, &product).await?;

        tx.commit().await?;

        info!(product_uuid = %created.uuid, "created product");

        Ok(created)
    }

    #[tracing::instrument(
        name = "products.service.set_stock",
        skip(self),
        fields(product_uuid = %product, size = %update.size, available = update.available),
        err
    )]
    async fn set_stock(
        &self,
        product: ProductUuid,
        update: StockUpdate,
    ) -> Result<ProductRecord, ProductsServiceError> {
        let mut tx = self.db.begin_transaction().await?;

        // Deleted products are not restocked.
        self.repository.get_product(&mut tx, product).await?;

        self.repository
            .set_stock(&mut tx, product, update.size, update.available)
            .await?;

        let record = self.repository.get_product(&mut tx, product).await?;

        tx.commit().await?;

        Ok(record)
    }

    async fn delete_product(&self, product: ProductUuid) -> Result<(), ProductsServiceError> {
        let mut tx = self.db.begin_transaction().await?;

        let rows_affected = self.repository.delete_product(&mut tx, product).await?;

        if rows_affected == 0 {
            return Err(ProductsServiceError::NotFound);
        }

        tx.commit().await?;

        info!(product_uuid = %product, "deleted product");

        Ok(())
    }
}

#[automock]
#[async_trait]
pub trait ProductsService: Send + Sync {
    /// Retrieves all live products, most popular first.
    async fn list_products(&self) -> Result<Vec<ProductRecord>, ProductsServiceError>;

    /// Retrieve a single product and count the view towards its popularity.
    async fn view_product(
        &self,
        product: ProductUuid,
    ) -> Result<ProductRecord, ProductsServiceError>;

    /// Creates a new product with its initial per-size stock.
    async fn create_product(
        &self,
        product: NewProduct,
    ) -> Result<ProductRecord, ProductsServiceError>;

    /// Overwrite the available stock for one size.
    async fn set_stock(
        &self,
        product: ProductUuid,
        update: StockUpdate,
    ) -> Result<ProductRecord, ProductsServiceError>;

    /// Soft-deletes a product.
    async fn delete_product(&self, product: ProductUuid) -> Result<(), ProductsServiceError>;
}

#[cfg(all(test, feature = "integration-tests"))]
mod tests {
    use testresult::TestResult;

    use crate::{
        domain::{
            categories::records::CategoryUuid,
            products::records::{Size, StockLevel},
        },
        test::TestContext,
    };

    use super::*;

    #[tokio::test]
    async fn create_product_stores_stock_per_size() -> TestResult {
        let ctx = TestContext::new().await;
        let category = ctx.create_category("Shirts").await;
        let uuid = ProductUuid::new();

        let product = ctx
            .products
            .create_product(NewProduct {
                uuid,
                category_uuid: category,
                name: "Oxford".to_string(),
                brand: "Acme".to_string(),
                price: 2499,
                stock: vec![(Size::Small, 3), (Size::Large, 0)],
            })
            .await?;

        assert_eq!(product.uuid, uuid);
        assert_eq!(
            product.stock_for(Size::Small),
            Some(StockLevel {
                available: 3,
                sold: 0
            })
        );
        assert_eq!(product.stock_for(Size::Medium), None);

        Ok(())
    }

    #[tokio::test]
    async fn unknown_category_returns_invalid_reference() {
        let ctx = TestContext::new().await;

        let result = ctx
            .products
            .create_product(NewProduct {
                uuid: ProductUuid::new(),
                category_uuid: CategoryUuid::new(),
                name: "Oxford".to_string(),
                brand: "Acme".to_string(),
                price: 100,
                stock: Vec::new(),
            })
            .await;

        assert!(
            matches!(result, Err(ProductsServiceError::InvalidReference)),
            "expected InvalidReference, got {result:?}"
        );
    }

    #[tokio::test]
    async fn viewing_a_product_increases_popularity() -> TestResult {
        let ctx = TestContext::new().await;
        let product = ctx.create_product(2000, &[(Size::Medium, 5)]).await;

        ctx.products.view_product(product).await?;
        let viewed = ctx.products.view_product(product).await?;

        assert_eq!(viewed.popularity, 2 * VIEW_POPULARITY);

        Ok(())
    }

    #[tokio::test]
    async fn set_stock_overwrites_available_units() -> TestResult {
        let ctx = TestContext::new().await;
        let product = ctx.create_product(2000, &[(Size::Medium, 5)]).await;

        let updated = ctx
            .products
            .set_stock(
                product,
                StockUpdate {
                    size: Size::Medium,
                    available: 12,
                },
            )
            .await?;

        assert_eq!(
            updated.stock_for(Size::Medium).map(|level| level.available),
            Some(12)
        );

        Ok(())
    }

    #[tokio::test]
    async fn deleted_product_is_not_found() -> TestResult {
        let ctx = TestContext::new().await;
        let product = ctx.create_product(2000, &[]).await;

        ctx.products.delete_product(product).await?;

        let result = ctx.products.view_product(product).await;

        assert!(
            matches!(result, Err(ProductsServiceError::NotFound)),
            "expected NotFound, got {result:?}"
        );

        Ok(())
    }

    #[tokio::test]
    async fn listing_skips_deleted_and_ranks_by_popularity() -> TestResult {
        let ctx = TestContext::new().await;
        let quiet = ctx.create_product(1000, &[]).await;
        let popular = ctx.create_product(1000, &[]).await;
        let gone = ctx.create_product(1000, &[]).await;

        ctx.products.view_product(popular).await?;
        ctx.products.delete_product(gone).await?;

        let listed: Vec<ProductUuid> = ctx
            .products
            .list_products()
            .await?
            .into_iter()
            .map(|product| product.uuid)
            .collect();

        assert_eq!(listed, vec![popular, quiet]);

        Ok(())
    }
}
