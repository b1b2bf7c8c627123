//! boardlink-client library crate.
//!
//! A minimal reactive client for the Boardlink gateway: it subscribes to the
//! gateway's event feed, decodes each inbound frame, and dispatches it
//! through a fixed policy table producing a log line and at most one
//! outbound command.
//!
//! # Architecture
//!
//! ```text
//! gateway event feed (port 5559)          gateway command sink (port 5558)
//!         │ JSON frames                           ▲ JSON frames
//!         ▼                                       │
//! [boardlink-client]
//!   ├── domain/           DispatchPolicy, ClientConfig
//!   ├── application/      Dispatcher — the per-frame policy tables
//!   └── infrastructure/   TCP feed reader + command writer (tokio)
//! ```
//!
//! # Layer rules
//!
//! - `domain` has no external dependencies (no I/O, no async, no frameworks).
//! - `application` depends on `domain` and `boardlink-core` only, and
//!   performs no I/O: [`application::dispatch::Dispatcher::handle`] is a
//!   pure frame-in, value-out function, which is what makes the policy
//!   tables directly testable.
//! - `infrastructure` owns the sockets and the run loop.

pub mod application;
pub mod domain;
pub mod infrastructure;
