//! The client run loop: two TCP channels and the dispatcher between them.
//!
//! Two independent unidirectional channels connect the client to the
//! gateway: the event feed is only read, the command sink is only written.
//! Each endpoint is an owned resource for the life of the process — there
//! is no reconnection: a lost connection is an external fault and ends the
//! run loop cleanly.
//!
//! Frames are processed one at a time to completion, so outbound commands
//! leave in the same order the triggering inbound frames arrived.

use anyhow::Context;
use tokio::io::{AsyncBufReadExt, AsyncWriteExt, BufReader};
use tokio::net::TcpStream;
use tracing::{error, info};

use boardlink_core::ClientCommand;

use crate::application::dispatch::Dispatcher;
use crate::domain::config::ClientConfig;

/// Connects both channels and drives the dispatcher until the feed closes.
///
/// Startup order matters: the policy's announcement (if any) is written
/// before the first inbound frame is read, so it is always the very first
/// outbound frame of the process.
///
/// # Errors
///
/// Returns an error if either channel cannot be connected or an outbound
/// write fails.  Decode faults on inbound frames are *not* errors here;
/// they are logged and the frame is skipped.
pub async fn run_client(config: ClientConfig) -> anyhow::Result<()> {
    let dispatcher = Dispatcher::new(config.policy);

    // Command sink first: the startup announcement must be writable before
    // any inbound frame can trigger a reaction.
    let command_addr = config.command_addr();
    let mut command_stream = TcpStream::connect(&command_addr)
        .await
        .with_context(|| format!("failed to connect to gateway command sink at {command_addr}"))?;
    info!("connected to gateway command sink at {command_addr}");

    let event_addr = config.event_addr();
    let event_stream = TcpStream::connect(&event_addr)
        .await
        .with_context(|| format!("failed to connect to gateway event feed at {event_addr}"))?;
    info!("connected to gateway event feed at {event_addr}");

    if let Some(announcement) = dispatcher.startup_command(&config.client_name) {
        write_command(&mut command_stream, &announcement).await?;
        info!("announced as '{}'", config.client_name);
    }

    let mut feed = BufReader::new(event_stream);
    let mut line = String::new();

    loop {
        line.clear();
        let n = feed
            .read_line(&mut line)
            .await
            .context("read from event feed failed")?;
        if n == 0 {
            info!("event feed closed by gateway");
            break;
        }

        match dispatcher.handle(line.as_bytes()) {
            Ok(outcome) => {
                if let Some(log_line) = outcome.log {
                    info!("{log_line}");
                }
                if let Some(command) = outcome.command {
                    write_command(&mut command_stream, &command).await?;
                }
            }
            Err(fault) => {
                // Deliberate policy: a decode fault skips the frame and the
                // process lives on.
                error!("skipping undecodable frame: {fault}");
            }
        }
    }

    Ok(())
}

/// Encodes and writes one command frame to the sink.
async fn write_command(
    stream: &mut TcpStream,
    command: &ClientCommand,
) -> anyhow::Result<()> {
    let bytes = command.encode().context("failed to encode command frame")?;
    stream
        .write_all(&bytes)
        .await
        .context("write to command sink failed")?;
    Ok(())
}

// ── Tests ─────────────────────────────────────────────────────────────────────
