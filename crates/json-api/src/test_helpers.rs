//! Test helpers.

use std::sync::Arc;

use emporium_app::{
    auth::{MockAuthService, Principal, Role},
    context::AppContext,
    domain::{
        addresses::MockAddressesService, carts::MockCartsService,
        categories::MockCategoriesService, checkout::MockCheckoutService,
        coupons::MockCouponsService, offers::MockOffersService, orders::MockOrdersService,
        products::MockProductsService, users::MockUsersService, users::records::UserUuid,
        wallets::MockWalletsService,
    },
};
use salvo::{affix_state::inject, prelude::*};
use uuid::Uuid;

use crate::{extensions::*, state::State};

pub(crate) const TEST_USER: UserUuid = UserUuid::from_uuid(Uuid::nil());

/// One mock per service. A mock without expectations panics when called, so
/// untouched services double as `never()` assertions.
#[derive(Default)]
pub(crate) struct Mocks {
    pub auth: MockAuthService,
    pub users: MockUsersService,
    pub addresses: MockAddressesService,
    pub categories: MockCategoriesService,
    pub products: MockProductsService,
    pub offers: MockOffersService,
    pub coupons: MockCouponsService,
    pub carts: MockCartsService,
    pub checkout: MockCheckoutService,
    pub orders: MockOrdersService,
    pub wallets: MockWalletsService,
}

impl Mocks {
    pub(crate) fn into_state(self) -> Arc<State> {
        State::from_app_context(AppContext {
            auth: Arc::new(self.auth),
            users: Arc::new(self.users),
            addresses: Arc::new(self.addresses),
            categories: Arc::new(self.categories),
            products: Arc::new(self.products),
            offers: Arc::new(self.offers),
            coupons: Arc::new(self.coupons),
            carts: Arc::new(self.carts),
            checkout: Arc::new(self.checkout),
            orders: Arc::new(self.orders),
            wallets: Arc::new(self.wallets),
        })
    }
}

#[salvo::handler]
pub(crate) async fn inject_customer(
    req: &mut Request,
    depot: &mut Depot,
    res: &mut Response,
    ctrl: &mut FlowCtrl,
) {
    depot.insert_principal(Principal {
        user_uuid: TEST_USER,
        role: Role::Customer,
    });

    ctrl.call_next(req, depot, res).await;
}

#[salvo::handler]
pub(crate) async fn inject_admin(
    req: &mut Request,
    depot: &mut Depot,
    res: &mut Response,
    ctrl: &mut FlowCtrl,
) {
    depot.insert_principal(Principal {
        user_uuid: TEST_USER,
        role: Role::Admin,
    });

    ctrl.call_next(req, depot, res).await;
}

/// Serve `route` as the test customer.
pub(crate) fn customer_service(mocks: Mocks, route: Router) -> Service {
    Service::new(
        Router::new()
            .hoop(inject(mocks.into_state()))
            .hoop(inject_customer)
            .push(route),
    )
}

/// Serve `route` as an admin.
pub(crate) fn admin_service(mocks: Mocks, route: Router) -> Service {
    Service::new(
        Router::new()
            .hoop(inject(mocks.into_state()))
            .hoop(inject_admin)
            .push(route),
    )
}
