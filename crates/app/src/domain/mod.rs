//! Emporium Domain Concerns

pub mod addresses;
pub mod carts;
pub mod categories;
pub mod checkout;
pub mod coupons;
pub mod offers;
pub mod orders;
pub mod payments;
pub mod pricing;
pub mod products;
pub mod users;
pub mod wallets;
