//! Offer Handlers

pub(crate) mod create;
pub(crate) mod deactivate;
pub(crate) mod index;
