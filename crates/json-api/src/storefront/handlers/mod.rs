//! Storefront Handlers

pub(crate) mod quote;
