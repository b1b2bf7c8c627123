//! Adapters: serial ttys, the device scan, and the TCP listeners.

pub mod net;
pub mod scan;
pub mod serial;
