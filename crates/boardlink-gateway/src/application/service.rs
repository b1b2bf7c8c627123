//! GatewayService: the single loop that owns every board and every frame.
//!
//! One task multiplexes three inputs with `tokio::select!`:
//!
//! 1. the scan tick — rescan the device tree, attach added boards, detach
//!    removed ones;
//! 2. the command channel — frames decoded from the command sink;
//! 3. the line channel — complete lines read from any attached board.
//!
//! Everything the service tells the outside world goes through the event
//! channel; a fan-out hub in the infrastructure layer forwards each frame
//! to every feed subscriber.  The service never holds a socket, so the
//! whole attach/identity/routing behavior runs under tests with mock
//! serial and scan adapters.
//!
//! # Attach and the ID probe
//!
//! A freshly opened board gets `{"device": path}` on the feed and is then
//! probed for its identity with an `ID` line.  The probe is written twice
//! around a buffer clear, with settle delays, because the first write
//! after opening a board is unreliable on common hardware.  The first line
//! the board produces is recorded as its identity and reported as
//! `{"id": {device, name}}`; every later line becomes
//! `{"received": {device, data}}`.

use std::sync::Arc;
use std::time::Duration;

use thiserror::Error;
use tokio::sync::mpsc;
use tokio::time::MissedTickBehavior;
use tracing::{error, info, warn};

use boardlink_core::{ClientCommand, GatewayEvent, SendCommand, StreamTag};

use crate::application::registry::{DeviceRegistry, RegisteredDevice};
use crate::domain::config::GatewayConfig;
use crate::domain::connection::DeviceLink;
use crate::infrastructure::scan::DeviceScanner;
use crate::infrastructure::serial::{SerialHandle, SerialOpener};

/// Settle delay before the first `ID` probe write.
const PROBE_SETTLE: Duration = Duration::from_millis(500);

/// Delay on each side of the buffer clear between the probe writes.
const PROBE_GAP: Duration = Duration::from_millis(100);

/// The identity probe line.
const ID_PROBE: &str = "ID";

const LINE_CHANNEL_CAPACITY: usize = 64;

/// Error type for the service loop.
#[derive(Debug, Error)]
pub enum GatewayError {
    /// The event hub dropped its receiver; nothing can be announced, so
    /// the service stops.
    #[error("event feed hub is gone")]
    FeedClosed,
}

/// One complete line read from an attached board.
#[derive(Debug)]
struct DeviceLine {
    path: String,
    line: String,
}

/// The gateway's device-owning service loop.
pub struct GatewayService {
    registry: DeviceRegistry,
    opener: Arc<dyn SerialOpener>,
    scanner: Arc<dyn DeviceScanner>,
    baud_rate: u32,
    cadence: Duration,
    events: mpsc::Sender<GatewayEvent>,
    commands: mpsc::Receiver<ClientCommand>,
    line_rx: mpsc::Receiver<DeviceLine>,
    line_tx: mpsc::Sender<DeviceLine>,
}

impl GatewayService {
    pub fn new(
        config: &GatewayConfig,
        opener: Arc<dyn SerialOpener>,
        scanner: Arc<dyn DeviceScanner>,
        events: mpsc::Sender<GatewayEvent>,
        commands: mpsc::Receiver<ClientCommand>,
    ) -> Self {
        let (line_tx, line_rx) = mpsc::channel(LINE_CHANNEL_CAPACITY);
        Self {
            registry: DeviceRegistry::new(),
            opener,
            scanner,
            baud_rate: config.baud_rate,
            cadence: Duration::from_millis(config.cadence_ms),
            events,
            commands,
            line_rx,
            line_tx,
        }
    }

    /// Runs the loop until the command channel closes (every producer is
    /// gone, i.e. the listeners shut down) or the event hub disappears.
    ///
    /// # Errors
    ///
    /// Returns [`GatewayError::FeedClosed`] if the event hub drops its
    /// receiver while frames still need to go out.
    pub async fn run(mut self) -> Result<(), GatewayError> {
        let mut scan_tick = tokio::time::interval(self.cadence);
        scan_tick.set_missed_tick_behavior(MissedTickBehavior::Delay);

        loop {
            tokio::select! {
                _ = scan_tick.tick() => self.rescan().await?,
                command = self.commands.recv() => match command {
                    Some(command) => self.handle_command(command).await?,
                    None => break,
                },
                // line_tx lives in self, so this channel never closes on us
                Some(line) = self.line_rx.recv() => self.handle_line(line).await?,
            }
        }
        Ok(())
    }

    // ── Scan / attach / detach ────────────────────────────────────────────────

    async fn rescan(&mut self) -> Result<(), GatewayError> {
        let scanned = match self.scanner.scan().await {
            Ok(scanned) => scanned,
            Err(e) => {
                // A failed scan skips this tick; the boards we have stay up.
                warn!("device scan failed: {e}");
                return Ok(());
            }
        };

        let diff = self.registry.diff_against(&scanned);
        for path in diff.removed {
            self.detach(&path).await?;
        }
        for path in diff.added {
            self.attach(&path).await?;
        }
        Ok(())
    }

    async fn attach(&mut self, path: &str) -> Result<(), GatewayError> {
        info!("connecting to {path}");

        let handle = match self.opener.open(path, self.baud_rate).await {
            Ok(handle) => handle,
            Err(e) => {
                error!("open error: {e}");
                self.emit(GatewayEvent::error("couldn't open port")).await?;
                return Ok(());
            }
        };
        self.emit(GatewayEvent::Device(path.to_string())).await?;

        let SerialHandle { mut writer, lines } = handle;
        self.spawn_line_forwarder(path.to_string(), lines);

        // The first write after open doesn't take on some boards: probe,
        // clear what the garbled write provoked, probe again.
        tokio::time::sleep(PROBE_SETTLE).await;
        if let Err(e) = writer.write_line(ID_PROBE).await {
            warn!("identity probe write to {path} failed: {e}");
        }
        tokio::time::sleep(PROBE_GAP).await;
        if let Err(e) = writer.clear().await {
            warn!("clearing {path} failed: {e}");
        }
        tokio::time::sleep(PROBE_GAP).await;
        if let Err(e) = writer.write_line(ID_PROBE).await {
            warn!("identity probe write to {path} failed: {e}");
        }

        self.registry.insert(RegisteredDevice {
            link: DeviceLink::new(path),
            writer,
        });
        Ok(())
    }

    async fn detach(&mut self, path: &str) -> Result<(), GatewayError> {
        if self.registry.remove(path).is_some() {
            info!("removed {path}");
            self.emit(GatewayEvent::Removed(path.to_string())).await?;
        }
        Ok(())
    }

    fn spawn_line_forwarder(&self, path: String, mut lines: mpsc::Receiver<String>) {
        let line_tx = self.line_tx.clone();
        tokio::spawn(async move {
            while let Some(line) = lines.recv().await {
                let line = DeviceLine {
                    path: path.clone(),
                    line,
                };
                if line_tx.send(line).await.is_err() {
                    break;
                }
            }
        });
    }

    // ── Board lines ───────────────────────────────────────────────────────────

    async fn handle_line(&mut self, line: DeviceLine) -> Result<(), GatewayError> {
        let DeviceLine { path, line } = line;
        if line.trim().is_empty() {
            return Ok(());
        }
        // Lines can race a detach; a line from an unregistered path is stale.
        let Some(device) = self.registry.get_mut(&path) else {
            return Ok(());
        };

        if device.link.awaiting_identity() {
            let identity = device.link.record_identity(&line).to_string();
            info!("added {identity} ({path})");
            self.emit(GatewayEvent::id_report(&path, &identity)).await
        } else {
            self.emit(GatewayEvent::received_line(&path, line.trim()))
                .await
        }
    }

    // ── Client commands ───────────────────────────────────────────────────────

    async fn handle_command(&mut self, command: ClientCommand) -> Result<(), GatewayError> {
        match command {
            ClientCommand::Connected { name } => self.handle_connected(&name).await,
            ClientCommand::Stream(tag) => {
                self.handle_stream(tag);
                Ok(())
            }
            ClientCommand::Send(send) => self.handle_send(send).await,
            ClientCommand::Unrecognized(obj) => {
                warn!(
                    "unhandled command: {}",
                    serde_json::Value::Object(obj)
                );
                Ok(())
            }
        }
    }

    /// Re-announces every attached board to a newly connected client.  The
    /// feed has no per-client addressing, so everyone gets the refresher.
    async fn handle_connected(&mut self, name: &str) -> Result<(), GatewayError> {
        info!("{name} connected");
        let mut frames = Vec::new();
        for device in self.registry.iter() {
            frames.push(GatewayEvent::Device(device.link.path.clone()));
            if let Some(identity) = device.link.identity.as_deref() {
                frames.push(GatewayEvent::id_report(&device.link.path, identity));
            }
        }
        for frame in frames {
            self.emit(frame).await?;
        }
        Ok(())
    }

    /// Stores upstream routing metadata on a board's link.  Invalid tags
    /// are logged and dropped; they are a client-side mistake, not a feed
    /// event.
    fn handle_stream(&mut self, tag: StreamTag) {
        info!("stream {}", tag.stream);
        if tag.user.is_none() {
            error!("no user");
            return;
        }
        let Some(path) = tag.device.clone() else {
            error!("no device");
            return;
        };
        let Some(device) = self.registry.get_mut(&path) else {
            error!("device not found");
            return;
        };
        device.link.stream = Some(tag);
    }

    async fn handle_send(&mut self, send: SendCommand) -> Result<(), GatewayError> {
        let Some(data) = send.data.clone() else {
            error!("missing data");
            return Ok(());
        };

        let device = match self.registry.route_mut(&send) {
            Ok(device) => device,
            Err(e) => {
                let message = e.to_string();
                error!("{message}");
                return self.emit(GatewayEvent::error(&message)).await;
            }
        };

        let path = device.link.path.clone();
        info!("sending to {path}");
        match device.writer.write_line(&data).await {
            Ok(()) => self.emit(GatewayEvent::sent(&path)).await,
            Err(e) => {
                error!("error while sending: {e}");
                self.emit(GatewayEvent::error("couldnt send")).await
            }
        }
    }

    async fn emit(&self, event: GatewayEvent) -> Result<(), GatewayError> {
        self.events
            .send(event)
            .await
            .map_err(|_| GatewayError::FeedClosed)
    }
}

// ── Tests ─────────────────────────────────────────────────────────────────────
