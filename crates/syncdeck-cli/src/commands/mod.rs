//! Command handlers.

pub(crate) mod config;
