//! Boardlink client — entry point.
//!
//! Connects to a running gateway's event feed and command sink, then
//! dispatches inbound event frames through the selected policy table.
//!
//! # Usage
//!
//! ```text
//! boardlink-client [OPTIONS]
//!
//! Options:
//!   --gateway-host <HOST>  Gateway hostname or IP      [default: 127.0.0.1]
//!   --event-port <PORT>    Event feed port (inbound)   [default: 5559]
//!   --command-port <PORT>  Command sink port (outbound) [default: 5558]
//!   --policy <POLICY>      by-name | by-device         [default: by-device]
//!   --client-name <NAME>   Startup announcement name   [default: me]
//! ```
//!
//! Environment variables (`BOARDLINK_GATEWAY_HOST`, `BOARDLINK_EVENT_PORT`,
//! `BOARDLINK_COMMAND_PORT`, `BOARDLINK_POLICY`, `BOARDLINK_CLIENT_NAME`)
//! override the defaults; CLI arguments take precedence over both.

use anyhow::Context;
use clap::Parser;
use tracing::info;
use tracing_subscriber::EnvFilter;

use boardlink_client::domain::config::ClientConfig;
use boardlink_client::domain::policy::DispatchPolicy;
use boardlink_client::infrastructure::run_client;

// ── CLI argument definitions ──────────────────────────────────────────────────

/// Minimal reactive client for a Boardlink gateway.
#[derive(Debug, Parser)]
#[command(
    name = "boardlink-client",
    about = "Subscribes to a Boardlink gateway and reacts to device events",
    version
)]
struct Cli {
    /// Hostname or IP address of the gateway.
    #[arg(long, default_value = "127.0.0.1", env = "BOARDLINK_GATEWAY_HOST")]
    gateway_host: String,

    /// TCP port of the gateway's event feed (the client reads from it).
    #[arg(long, default_value_t = 5559, env = "BOARDLINK_EVENT_PORT")]
    event_port: u16,

    /// TCP port of the gateway's command sink (the client writes to it).
    #[arg(long, default_value_t = 5558, env = "BOARDLINK_COMMAND_PORT")]
    command_port: u16,

    /// Dispatch policy: `by-name` or `by-device`.
    ///
    /// `by-name` reacts to `added` events by flashing the fixed identity
    /// "arduino"; `by-device` announces itself on startup and flashes
    /// whichever device connects.
    #[arg(long, default_value = "by-device", env = "BOARDLINK_POLICY")]
    policy: DispatchPolicy,

    /// Name used in the by-device startup announcement.
    #[arg(long, default_value = "me", env = "BOARDLINK_CLIENT_NAME")]
    client_name: String,
}

impl Cli {
    /// Converts the parsed CLI arguments into a [`ClientConfig`].
    fn into_client_config(self) -> ClientConfig {
        ClientConfig {
            gateway_host: self.gateway_host,
            event_port: self.event_port,
            command_port: self.command_port,
            policy: self.policy,
            client_name: self.client_name,
        }
    }
}

// ── Entry point ───────────────────────────────────────────────────────────────

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Structured logging; level is overridden by `RUST_LOG`.
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    let cli = Cli::parse();
    let config = cli.into_client_config();

    info!(
        "boardlink-client starting — gateway={}, policy={}",
        config.gateway_host, config.policy
    );

    // No reconnection: the run loop ends when the feed closes, Ctrl+C ends
    // it earlier.
    tokio::select! {
        result = run_client(config) => result,
        signal = tokio::signal::ctrl_c() => {
            signal.context("failed to listen for Ctrl+C signal")?;
            info!("received Ctrl+C — shutting down");
            Ok(())
        }
    }
}

// ── Tests ─────────────────────────────────────────────────────────────────────
