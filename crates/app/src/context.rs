//! App Context

use std::sync::Arc;

use thiserror::Error;

use crate::{
    auth::{AuthService, PgAuthService},
    database::{self, Db},
    domain::{
        addresses::{AddressesService, PgAddressesService},
        carts::{CartsService, PgCartsService},
        categories::{CategoriesService, PgCategoriesService},
        checkout::{CheckoutPolicy, CheckoutService, PgCheckoutService},
        coupons::{CouponsService, PgCouponsService},
        offers::{OffersService, PgOffersService},
        orders::{OrdersService, PgOrdersService},
        payments::{GatewayConfig, PaymentGateway, RazorpayGateway},
        products::{PgProductsService, ProductsService},
        users::{PgUsersService, UsersService},
        wallets::{PgWalletsService, WalletsService},
    },
};

#[derive(Debug, Error)]
pub enum AppInitError {
    #[error("failed to connect to database")]
    Database(#[source] sqlx::Error),
}

#[derive(Clone)]
pub struct AppContext {
    pub auth: Arc<dyn AuthService>,
    pub users: Arc<dyn UsersService>,
    pub addresses: Arc<dyn AddressesService>,
    pub categories: Arc<dyn CategoriesService>,
    pub products: Arc<dyn ProductsService>,
    pub offers: Arc<dyn OffersService>,
    pub coupons: Arc<dyn CouponsService>,
    pub carts: Arc<dyn CartsService>,
    pub checkout: Arc<dyn CheckoutService>,
    pub orders: Arc<dyn OrdersService>,
    pub wallets: Arc<dyn WalletsService>,
}

impl AppContext {
    /// Build application context from a database URL and gateway settings.
    ///
    /// # Errors
    ///
    /// Returns an error when establishing a database connection fails.
    pub async fn from_database_url(
        url: &str,
        gateway: GatewayConfig,
        policy: CheckoutPolicy,
    ) -> Result<Self, AppInitError> {
        let pool = database::connect(url)
            .await
            .map_err(AppInitError::Database)?;

        let gateway: Arc<dyn PaymentGateway> = Arc::new(RazorpayGateway::new(gateway));

        Ok(Self::from_db(Db::new(pool), gateway, policy))
    }

    /// Wire every service over an existing database handle.
    #[must_use]
    pub fn from_db(db: Db, gateway: Arc<dyn PaymentGateway>, policy: CheckoutPolicy) -> Self {
        Self {
            auth: Arc::new(PgAuthService::new(db.clone())),
            users: Arc::new(PgUsersService::new(db.clone())),
            addresses: Arc::new(PgAddressesService::new(db.clone())),
            categories: Arc::new(PgCategoriesService::new(db.clone())),
            products: Arc::new(PgProductsService::new(db.clone())),
            offers: Arc::new(PgOffersService::new(db.clone())),
            coupons: Arc::new(PgCouponsService::new(db.clone())),
            carts: Arc::new(PgCartsService::new(db.clone(), policy.coupon_rules.clone())),
            orders: Arc::new(PgOrdersService::new(db.clone())),
            wallets: Arc::new(PgWalletsService::new(
                db.clone(),
                Arc::clone(&gateway),
                policy.pending_ttl,
            )),
            checkout: Arc::new(PgCheckoutService::new(db, gateway, policy)),
        }
    }
}
