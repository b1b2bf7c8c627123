//! The gateway's two TCP surfaces and the top-level assembly.
//!
//! The event feed is one-to-many: a hub task owns every subscriber socket
//! and writes each event frame to all of them, silently dropping the dead
//! ones.  The command sink is many-to-one: each accepted client gets a
//! reader task that decodes its frames into the shared command channel.
//! Neither surface talks to the service directly; the channels are the
//! whole interface.

use std::sync::Arc;

use anyhow::Context;
use tokio::io::{AsyncBufReadExt, AsyncWriteExt, BufReader};
use tokio::net::{TcpListener, TcpStream};
use tokio::sync::mpsc;
use tracing::{error, info, warn};

use boardlink_core::{ClientCommand, GatewayEvent};

use crate::application::service::GatewayService;
use crate::domain::config::GatewayConfig;
use crate::infrastructure::scan::DeviceScanner;
use crate::infrastructure::serial::SerialOpener;

const EVENT_CHANNEL_CAPACITY: usize = 256;
const COMMAND_CHANNEL_CAPACITY: usize = 64;

/// Binds both listeners, wires up the channels, and runs the service loop
/// until it stops.
///
/// # Errors
///
/// Returns an error if either listener cannot be bound or the service
/// loop fails.
pub async fn serve(
    config: GatewayConfig,
    opener: Arc<dyn SerialOpener>,
    scanner: Arc<dyn DeviceScanner>,
) -> anyhow::Result<()> {
    let event_addr = config.event_addr();
    let event_listener = TcpListener::bind(&event_addr)
        .await
        .with_context(|| format!("failed to bind event feed on {event_addr}"))?;
    info!("event feed listening on {event_addr}");

    let command_addr = config.command_addr();
    let command_listener = TcpListener::bind(&command_addr)
        .await
        .with_context(|| format!("failed to bind command sink on {command_addr}"))?;
    info!("command sink listening on {command_addr}");

    let (event_tx, event_rx) = mpsc::channel(EVENT_CHANNEL_CAPACITY);
    let (command_tx, command_rx) = mpsc::channel(COMMAND_CHANNEL_CAPACITY);

    tokio::spawn(run_feed_hub(event_listener, event_rx));
    tokio::spawn(accept_command_clients(command_listener, command_tx));

    GatewayService::new(&config, opener, scanner, event_tx, command_rx)
        .run()
        .await
        .context("gateway service loop failed")
}

/// Owns the feed subscribers: accepts new ones and fans each event frame
/// out to all of them.  Runs until the service drops the event sender.
pub async fn run_feed_hub(listener: TcpListener, mut events: mpsc::Receiver<GatewayEvent>) {
    let mut subscribers: Vec<TcpStream> = Vec::new();

    loop {
        tokio::select! {
            accepted = listener.accept() => match accepted {
                Ok((stream, peer)) => {
                    info!("feed subscriber connected from {peer}");
                    subscribers.push(stream);
                }
                Err(e) => warn!("accept on event feed failed: {e}"),
            },
            event = events.recv() => match event {
                Some(event) => {
                    let bytes = match event.encode() {
                        Ok(bytes) => bytes,
                        Err(e) => {
                            error!("failed to encode event frame: {e}");
                            continue;
                        }
                    };
                    broadcast(&mut subscribers, &bytes).await;
                }
                None => break,
            },
        }
    }
}

/// Writes one frame to every subscriber, keeping only the ones the write
/// reached.  There are no delivery guarantees on the feed; a dead
/// subscriber is simply forgotten.
async fn broadcast(subscribers: &mut Vec<TcpStream>, bytes: &[u8]) {
    let mut alive = Vec::with_capacity(subscribers.len());
    for mut stream in subscribers.drain(..) {
        match stream.write_all(bytes).await {
            Ok(()) => alive.push(stream),
            Err(e) => info!("feed subscriber dropped: {e}"),
        }
    }
    *subscribers = alive;
}

/// Accepts command clients and gives each a decoding reader task.
pub async fn accept_command_clients(
    listener: TcpListener,
    command_tx: mpsc::Sender<ClientCommand>,
) {
    loop {
        match listener.accept().await {
            Ok((stream, peer)) => {
                info!("command client connected from {peer}");
                tokio::spawn(read_commands(stream, command_tx.clone()));
            }
            Err(e) => warn!("accept on command sink failed: {e}"),
        }
    }
}

/// Reads one client's command frames until it disconnects.  A frame that
/// does not decode is logged and skipped; the connection stays up.
async fn read_commands(stream: TcpStream, command_tx: mpsc::Sender<ClientCommand>) {
    let mut reader = BufReader::new(stream);
    let mut line = String::new();

    loop {
        line.clear();
        match reader.read_line(&mut line).await {
            Ok(0) => {
                info!("command client disconnected");
                break;
            }
            Ok(_) => match ClientCommand::decode(line.as_bytes()) {
                Ok(command) => {
                    if command_tx.send(command).await.is_err() {
                        break;
                    }
                }
                Err(fault) => error!("skipping undecodable command frame: {fault}"),
            },
            Err(e) => {
                warn!("read from command client failed: {e}");
                break;
            }
        }
    }
}

// ── Tests ─────────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;

    async fn listener() -> (TcpListener, u16) {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let port = listener.local_addr().unwrap().port();
        (listener, port)
    }

    async fn read_line_from(stream: TcpStream) -> String {
        let mut reader = BufReader::new(stream);
        let mut line = String::new();
        reader.read_line(&mut line).await.unwrap();
        line
    }

    #[tokio::test]
    async fn test_feed_hub_broadcasts_to_every_subscriber() {
        // Arrange: a hub with two subscribers
        let (feed_listener, port) = listener().await;
        let (event_tx, event_rx) = mpsc::channel(8);
        tokio::spawn(run_feed_hub(feed_listener, event_rx));

        let first = TcpStream::connect(("127.0.0.1", port)).await.unwrap();
        let second = TcpStream::connect(("127.0.0.1", port)).await.unwrap();

        // Act
        event_tx
            .send(GatewayEvent::Device("/dev/ttyUSB0".to_string()))
            .await
            .unwrap();

        // Assert: both got the same frame
        assert_eq!(
            read_line_from(first).await.trim(),
            "{\"device\":\"/dev/ttyUSB0\"}"
        );
        assert_eq!(
            read_line_from(second).await.trim(),
            "{\"device\":\"/dev/ttyUSB0\"}"
        );
    }

    #[tokio::test]
    async fn test_feed_hub_survives_a_dropped_subscriber() {
        // Arrange
        let (feed_listener, port) = listener().await;
        let (event_tx, event_rx) = mpsc::channel(8);
        tokio::spawn(run_feed_hub(feed_listener, event_rx));

        let doomed = TcpStream::connect(("127.0.0.1", port)).await.unwrap();
        let survivor = TcpStream::connect(("127.0.0.1", port)).await.unwrap();
        drop(doomed);

        // Act: two frames — the first may still land in the dead socket's
        // buffer, the second must reach the survivor
        event_tx
            .send(GatewayEvent::sent("/dev/ttyUSB0"))
            .await
            .unwrap();
        event_tx
            .send(GatewayEvent::sent("/dev/ttyUSB0"))
            .await
            .unwrap();

        // Assert
        let mut reader = BufReader::new(survivor);
        let mut line = String::new();
        reader.read_line(&mut line).await.unwrap();
        assert_eq!(line.trim(), "{\"sent\":\"/dev/ttyUSB0\"}");
        line.clear();
        reader.read_line(&mut line).await.unwrap();
        assert_eq!(line.trim(), "{\"sent\":\"/dev/ttyUSB0\"}");
    }

    #[tokio::test]
    async fn test_command_reader_decodes_into_the_channel() {
        // Arrange
        let (sink_listener, port) = listener().await;
        let (command_tx, mut command_rx) = mpsc::channel(8);
        tokio::spawn(accept_command_clients(sink_listener, command_tx));

        // Act
        let mut client = TcpStream::connect(("127.0.0.1", port)).await.unwrap();
        client.write_all(b"{\"connected\":\"me\"}\n").await.unwrap();

        // Assert
        assert_eq!(
            command_rx.recv().await,
            Some(ClientCommand::connected("me"))
        );
    }

    #[tokio::test]
    async fn test_command_reader_skips_undecodable_frames() {
        // Arrange
        let (sink_listener, port) = listener().await;
        let (command_tx, mut command_rx) = mpsc::channel(8);
        tokio::spawn(accept_command_clients(sink_listener, command_tx));

        // Act: garbage, then a valid frame on the same connection
        let mut client = TcpStream::connect(("127.0.0.1", port)).await.unwrap();
        client.write_all(b"not json\n").await.unwrap();
        client
            .write_all(b"{\"send\":{\"data\":\"FLASH\"}}\n")
            .await
            .unwrap();

        // Assert: only the valid frame came through
        match command_rx.recv().await {
            Some(ClientCommand::Send(send)) => assert_eq!(send.data.as_deref(), Some("FLASH")),
            other => panic!("expected the send command, got {other:?}"),
        }
    }
}
