//! Boardlink gateway — entry point.
//!
//! Owns the serial boards and bridges them to the network: event feed out,
//! command sink in.
//!
//! # Usage
//!
//! ```text
//! boardlink-gateway [OPTIONS]
//!
//! Options:
//!   --config <PATH>         Optional TOML config file
//!   --bind-address <ADDR>   Listener bind address      [default: 0.0.0.0]
//!   --event-port <PORT>     Event feed port            [default: 5559]
//!   --command-port <PORT>   Command sink port          [default: 5558]
//!   --cadence-ms <MS>       Device rescan interval     [default: 200]
//!   --baud-rate <BAUD>      Serial baud rate           [default: 9600]
//! ```
//!
//! Precedence, lowest to highest: built-in defaults, the `--config` TOML
//! file, then individual CLI flags (each also readable from a
//! `BOARDLINK_*` environment variable).

use std::path::PathBuf;
use std::sync::Arc;

use anyhow::Context;
use clap::Parser;
use tracing::info;
use tracing_subscriber::EnvFilter;

use boardlink_gateway::domain::config::{load_file_config, GatewayConfig};
use boardlink_gateway::infrastructure::net::serve;
use boardlink_gateway::infrastructure::scan::GlobScanner;
use boardlink_gateway::infrastructure::serial::tty::TtyOpener;

// ── CLI argument definitions ──────────────────────────────────────────────────

/// Serial board gateway: pushes board events, executes client commands.
#[derive(Debug, Parser)]
#[command(
    name = "boardlink-gateway",
    about = "Bridges Arduino-style serial boards to JSON-speaking TCP clients",
    version
)]
struct Cli {
    /// Path to an optional TOML config file.
    #[arg(long, env = "BOARDLINK_CONFIG")]
    config: Option<PathBuf>,

    /// IP address the listeners bind to.
    #[arg(long, env = "BOARDLINK_BIND_ADDRESS")]
    bind_address: Option<String>,

    /// TCP port of the event feed.
    #[arg(long, env = "BOARDLINK_EVENT_PORT")]
    event_port: Option<u16>,

    /// TCP port of the command sink.
    #[arg(long, env = "BOARDLINK_COMMAND_PORT")]
    command_port: Option<u16>,

    /// Device rescan interval in milliseconds.
    #[arg(long, env = "BOARDLINK_CADENCE_MS")]
    cadence_ms: Option<u64>,

    /// Baud rate for opened serial links.
    #[arg(long, env = "BOARDLINK_BAUD_RATE")]
    baud_rate: Option<u32>,
}

impl Cli {
    /// Layers the CLI flags over `base` (defaults merged with the file).
    fn apply_to(self, mut base: GatewayConfig) -> GatewayConfig {
        if let Some(bind_address) = self.bind_address {
            base.bind_address = bind_address;
        }
        if let Some(event_port) = self.event_port {
            base.event_port = event_port;
        }
        if let Some(command_port) = self.command_port {
            base.command_port = command_port;
        }
        if let Some(cadence_ms) = self.cadence_ms {
            base.cadence_ms = cadence_ms;
        }
        if let Some(baud_rate) = self.baud_rate {
            base.baud_rate = baud_rate;
        }
        base
    }
}

// ── Entry point ───────────────────────────────────────────────────────────────

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    let cli = Cli::parse();

    let file_config = match &cli.config {
        Some(path) => load_file_config(path)
            .with_context(|| format!("failed to load config file {}", path.display()))?,
        None => Default::default(),
    };
    let config = cli.apply_to(file_config.into_gateway_config());

    info!(
        "boardlink-gateway starting — feed {}, sink {}, scanning {:?} every {}ms",
        config.event_addr(),
        config.command_addr(),
        config.scan_patterns,
        config.cadence_ms
    );

    let opener = Arc::new(TtyOpener::new());
    let scanner = Arc::new(GlobScanner::new(config.scan_patterns.clone()));

    tokio::select! {
        result = serve(config, opener, scanner) => result,
        signal = tokio::signal::ctrl_c() => {
            signal.context("failed to listen for Ctrl+C signal")?;
            info!("received Ctrl+C — shutting down");
            Ok(())
        }
    }
}

// ── Tests ─────────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_cli_without_flags_keeps_the_base_config() {
        // Arrange
        let cli = Cli::parse_from(["boardlink-gateway"]);

        // Act
        let config = cli.apply_to(GatewayConfig::default());

        // Assert
        assert_eq!(config, GatewayConfig::default());
    }

    #[test]
    fn test_cli_flags_override_the_base_config() {
        // Arrange
        let cli = Cli::parse_from([
            "boardlink-gateway",
            "--bind-address",
            "127.0.0.1",
            "--event-port",
            "7001",
            "--cadence-ms",
            "1000",
        ]);

        // Act
        let config = cli.apply_to(GatewayConfig::default());

        // Assert: named flags win, the rest stays
        assert_eq!(config.bind_address, "127.0.0.1");
        assert_eq!(config.event_port, 7001);
        assert_eq!(config.cadence_ms, 1000);
        assert_eq!(config.command_port, 5558);
        assert_eq!(config.baud_rate, 9600);
    }

    #[test]
    fn test_cli_rejects_non_numeric_port() {
        let result = Cli::try_parse_from(["boardlink-gateway", "--event-port", "lots"]);
        assert!(result.is_err());
    }
}
