//! Application layer: the per-frame dispatch use case.

pub mod dispatch;

pub use dispatch::{Dispatcher, Outcome};
