//! Wallet Handlers

pub(crate) mod begin_top_up;
pub(crate) mod get;
pub(crate) mod verify_top_up;
