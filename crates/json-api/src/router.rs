//! App Router

use salvo::Router;

use crate::{
    addresses, auth, carts, categories, checkout, coupons, offers, orders, products, wallet,
};

/// Routes anyone may call.
pub(crate) fn public_router() -> Router {
    Router::new()
        .push(
            Router::with_path("products")
                .get(products::index::handler)
                .push(Router::with_path("{product}").get(products::get::handler)),
        )
        .push(Router::with_path("categories").get(categories::index::handler))
}

/// Routes behind bearer authentication.
pub(crate) fn app_router() -> Router {
    Router::new()
        .hoop(auth::middleware::handler)
        .push(customer_router())
        .push(admin_router())
}

fn customer_router() -> Router {
    Router::new()
        .push(
            Router::with_path("cart")
                .get(carts::get::handler)
                .push(Router::with_path("validation").get(carts::validation::handler))
                .push(
                    Router::with_path("items")
                        .post(carts::add_item::handler)
                        .push(
                            Router::with_path("{item}")
                                .put(carts::update_item::handler)
                                .delete(carts::remove_item::handler),
                        ),
                )
                .push(
                    Router::with_path("coupon")
                        .post(carts::apply_coupon::handler)
                        .delete(carts::remove_coupon::handler),
                ),
        )
        .push(
            Router::with_path("addresses")
                .get(addresses::index::handler)
                .post(addresses::create::handler)
                .push(Router::with_path("{address}/primary").put(addresses::primary::handler)),
        )
        .push(
            Router::with_path("checkout")
                .post(checkout::place::handler)
                .push(
                    Router::with_path("gateway")
                        .post(checkout::begin_gateway::handler)
                        .push(Router::with_path("verify").post(checkout::verify_gateway::handler)),
                ),
        )
        .push(
            Router::with_path("orders")
                .get(orders::index::handler)
                .push(
                    Router::with_path("{order}")
                        .get(orders::get::handler)
                        .push(Router::with_path("cancel").post(orders::cancel::handler))
                        .push(Router::with_path("return").post(orders::return_order::handler)),
                ),
        )
        .push(
            Router::with_path("wallet")
                .get(wallet::get::handler)
                .push(
                    Router::with_path("top-ups")
                        .post(wallet::begin_top_up::handler)
                        .push(Router::with_path("verify").post(wallet::verify_top_up::handler)),
                ),
        )
}

fn admin_router() -> Router {
    Router::with_path("admin")
        .hoop(auth::middleware::require_admin)
        .push(Router::with_path("categories").post(categories::create::handler))
        .push(
            Router::with_path("products")
                .post(products::create::handler)
                .push(
                    Router::with_path("{product}")
                        .delete(products::delete::handler)
                        .push(Router::with_path("stock").put(products::set_stock::handler)),
                ),
        )
        .push(
            Router::with_path("offers")
                .get(offers::index::handler)
                .post(offers::create::handler)
                .push(Router::with_path("{offer}").delete(offers::deactivate::handler)),
        )
        .push(
            Router::with_path("coupons")
                .post(coupons::create::handler)
                .push(Router::with_path("{code}").get(coupons::get::handler)),
        )
        .push(Router::with_path("orders/{order}/status").put(orders::update_status::handler))
}
