//! Client configuration.
//!
//! [`ClientConfig`] is a plain struct built once at startup from CLI
//! arguments (or defaults, for tests) and passed explicitly into the run
//! loop.  The two channel endpoints are long-lived singletons for the
//! process, so they are owned resources handed to the runner — never
//! ambient globals.

use boardlink_core::{DEFAULT_COMMAND_PORT, DEFAULT_EVENT_PORT};

use crate::domain::policy::DispatchPolicy;

/// All runtime configuration for the client.
#[derive(Debug, Clone)]
pub struct ClientConfig {
    /// Hostname or IP address of the gateway.
    pub gateway_host: String,
    /// TCP port of the gateway's event feed (inbound to the client).
    pub event_port: u16,
    /// TCP port of the gateway's command sink (outbound from the client).
    pub command_port: u16,
    /// Which policy table drives the dispatcher.
    pub policy: DispatchPolicy,
    /// Name used in the by-device startup announcement.
    pub client_name: String,
}

impl ClientConfig {
    /// Address of the event feed, in `host:port` form.
    pub fn event_addr(&self) -> String {
        format!("{}:{}", self.gateway_host, self.event_port)
    }

    /// Address of the command sink, in `host:port` form.
    pub fn command_addr(&self) -> String {
        format!("{}:{}", self.gateway_host, self.command_port)
    }
}

impl Default for ClientConfig {
    /// Defaults match a gateway running on the same machine with its
    /// default ports.
    fn default() -> Self {
        Self {
            gateway_host: "127.0.0.1".to_string(),
            event_port: DEFAULT_EVENT_PORT,
            command_port: DEFAULT_COMMAND_PORT,
            policy: DispatchPolicy::ByDevice,
            client_name: "me".to_string(),
        }
    }
}

// ── Tests ─────────────────────────────────────────────────────────────────────
