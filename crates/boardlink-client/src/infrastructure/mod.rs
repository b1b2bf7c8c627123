//! Infrastructure layer: the TCP channel runner.

pub mod net;

pub use net::run_client;
