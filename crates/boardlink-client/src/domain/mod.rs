//! Domain layer for boardlink-client.
//!
//! Pure types only: the selectable dispatch policy and the runtime
//! configuration.  Nothing in this module performs I/O or references the
//! async runtime.

pub mod config;
pub mod policy;

pub use config::ClientConfig;
pub use policy::DispatchPolicy;
