//! Use cases: the device registry and the gateway service loop.

pub mod registry;
pub mod service;
