//! boardlink-gateway library crate.
//!
//! The gateway daemon owns the serial devices and bridges them to the
//! network: it scans the device tree for boards, keeps one serial link per
//! attached board, pushes JSON event frames to every client on the event
//! feed, and executes JSON command frames arriving on the command sink.
//!
//! # Architecture
//!
//! ```text
//!            serial ttys (/dev/ttyUSB*, /dev/ttyACM*)
//!                 ▲                │ lines
//!                 │ writes         ▼
//! [boardlink-gateway]
//!   ├── domain/           GatewayConfig, DeviceLink
//!   ├── application/      DeviceRegistry + GatewayService (the select loop)
//!   └── infrastructure/   tty serial adapter, device scanner, TCP feed/sink
//!                 │ events          ▲ commands
//!                 ▼                 │
//!     event feed (port 5559)   command sink (port 5558)
//! ```
//!
//! # Layer rules
//!
//! - `domain` has no external dependencies beyond serde (no I/O, no async).
//! - `application` holds the gateway's whole behavior against the serial
//!   and scan *traits*; it never touches a socket or a tty directly, which
//!   is what makes the attach/identity/routing flows testable with mocks.
//! - `infrastructure` owns the tokio listeners, the tty files, and the
//!   `/dev` scan.

pub mod application;
pub mod domain;
pub mod infrastructure;
