//! Gateway configuration: the runtime struct plus its TOML file schema.
//!
//! Configuration is layered: built-in defaults, then an optional TOML file
//! (`--config path/to/gateway.toml`), then individual CLI flags on top.
//! The merged result is a plain [`GatewayConfig`] handed to the service by
//! value — no globals, no lazy statics.
//!
//! Example file:
//!
//! ```toml
//! [network]
//! event_port = 5559
//! command_port = 5558
//! bind_address = "0.0.0.0"
//!
//! [serial]
//! cadence_ms = 200
//! baud_rate = 9600
//! scan_patterns = ["/dev/ttyUSB*", "/dev/ttyACM*"]
//! ```
//!
//! Every field is optional in the file; fields annotated with
//! `#[serde(default = "...")]` fall back to the built-in value, so a
//! partial file (or none at all) works on first run.

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use thiserror::Error;

use boardlink_core::{DEFAULT_COMMAND_PORT, DEFAULT_EVENT_PORT};

/// How often the device tree is rescanned, in milliseconds.
pub const DEFAULT_CADENCE_MS: u64 = 200;

/// Baud rate for freshly opened serial links.
pub const DEFAULT_BAUD_RATE: u32 = 9600;

/// Error type for configuration file operations.
#[derive(Debug, Error)]
pub enum ConfigError {
    /// A file system I/O error occurred.
    #[error("I/O error accessing config at {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// The TOML content could not be parsed.
    #[error("failed to parse config TOML: {0}")]
    Parse(#[from] toml::de::Error),
}

// ── Runtime config ────────────────────────────────────────────────────────────

/// The fully merged gateway configuration.
#[derive(Debug, Clone, PartialEq)]
pub struct GatewayConfig {
    /// IP address all listeners bind to; `"0.0.0.0"` binds all interfaces.
    pub bind_address: String,
    /// TCP port of the event feed (gateway pushes, clients read).
    pub event_port: u16,
    /// TCP port of the command sink (clients push, gateway reads).
    pub command_port: u16,
    /// Glob-style patterns the device scan matches tty paths against.
    pub scan_patterns: Vec<String>,
    /// Rescan interval in milliseconds.
    pub cadence_ms: u64,
    /// Baud rate for opened serial links.
    pub baud_rate: u32,
}

impl GatewayConfig {
    /// The `host:port` address of the event feed listener.
    pub fn event_addr(&self) -> String {
        format!("{}:{}", self.bind_address, self.event_port)
    }

    /// The `host:port` address of the command sink listener.
    pub fn command_addr(&self) -> String {
        format!("{}:{}", self.bind_address, self.command_port)
    }
}

impl Default for GatewayConfig {
    fn default() -> Self {
        Self {
            bind_address: default_bind_address(),
            event_port: DEFAULT_EVENT_PORT,
            command_port: DEFAULT_COMMAND_PORT,
            scan_patterns: default_scan_patterns(),
            cadence_ms: DEFAULT_CADENCE_MS,
            baud_rate: DEFAULT_BAUD_RATE,
        }
    }
}

// ── File schema ───────────────────────────────────────────────────────────────

/// On-disk TOML schema; every section and field is optional.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct FileConfig {
    #[serde(default)]
    pub network: NetworkSection,
    #[serde(default)]
    pub serial: SerialSection,
}

/// `[network]` section of the config file.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct NetworkSection {
    #[serde(default = "default_bind_address")]
    pub bind_address: String,
    #[serde(default = "default_event_port")]
    pub event_port: u16,
    #[serde(default = "default_command_port")]
    pub command_port: u16,
}

/// `[serial]` section of the config file.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct SerialSection {
    #[serde(default = "default_cadence_ms")]
    pub cadence_ms: u64,
    #[serde(default = "default_baud_rate")]
    pub baud_rate: u32,
    #[serde(default = "default_scan_patterns")]
    pub scan_patterns: Vec<String>,
}

impl FileConfig {
    /// Flattens the file sections into the runtime config.
    pub fn into_gateway_config(self) -> GatewayConfig {
        GatewayConfig {
            bind_address: self.network.bind_address,
            event_port: self.network.event_port,
            command_port: self.network.command_port,
            scan_patterns: self.serial.scan_patterns,
            cadence_ms: self.serial.cadence_ms,
            baud_rate: self.serial.baud_rate,
        }
    }
}

/// Loads a [`FileConfig`] from `path`, returning the defaults if the file
/// does not exist.
///
/// # Errors
///
/// Returns [`ConfigError::Io`] for file-system errors other than "not
/// found", and [`ConfigError::Parse`] if the TOML is malformed.
pub fn load_file_config(path: &Path) -> Result<FileConfig, ConfigError> {
    match std::fs::read_to_string(path) {
        Ok(content) => Ok(toml::from_str(&content)?),
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(FileConfig::default()),
        Err(e) => Err(ConfigError::Io {
            path: path.to_path_buf(),
            source: e,
        }),
    }
}

// ── Default helpers ───────────────────────────────────────────────────────────

fn default_bind_address() -> String {
    "0.0.0.0".to_string()
}
fn default_event_port() -> u16 {
    DEFAULT_EVENT_PORT
}
fn default_command_port() -> u16 {
    DEFAULT_COMMAND_PORT
}
fn default_cadence_ms() -> u64 {
    DEFAULT_CADENCE_MS
}
fn default_baud_rate() -> u32 {
    DEFAULT_BAUD_RATE
}

/// Platform-appropriate tty patterns for Arduino-style boards.
fn default_scan_patterns() -> Vec<String> {
    #[cfg(target_os = "macos")]
    {
        vec!["/dev/cu.usb*".to_string()]
    }
    #[cfg(not(target_os = "macos"))]
    {
        vec!["/dev/ttyUSB*".to_string(), "/dev/ttyACM*".to_string()]
    }
}

impl Default for NetworkSection {
    fn default() -> Self {
        Self {
            bind_address: default_bind_address(),
            event_port: default_event_port(),
            command_port: default_command_port(),
        }
    }
}

impl Default for SerialSection {
    fn default() -> Self {
        Self {
            cadence_ms: default_cadence_ms(),
            baud_rate: default_baud_rate(),
            scan_patterns: default_scan_patterns(),
        }
    }
}

// ── Tests ─────────────────────────────────────────────────────────────────────
