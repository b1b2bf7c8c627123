//! Pure domain types: configuration and per-device link state.

pub mod config;
pub mod connection;
