//! Checkout Handlers

pub(crate) mod begin_gateway;
pub(crate) mod place;
pub(crate) mod verify_gateway;
