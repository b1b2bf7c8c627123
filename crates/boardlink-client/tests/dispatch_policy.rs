//! Integration tests for the two dispatch policies, driven end to end
//! through the public crate API: raw wire frames in, log lines and encoded
//! commands out.

use boardlink_client::application::dispatch::Dispatcher;
use boardlink_client::domain::policy::DispatchPolicy;
use boardlink_core::{encode_frame, GatewayEvent};

/// Feeds a sequence of raw frames through a dispatcher and collects the
/// produced log lines and encoded outbound frames, skipping decode faults
/// the way the run loop does.
fn run_session(policy: DispatchPolicy, frames: &[&[u8]]) -> (Vec<String>, Vec<Vec<u8>>) {
    let dispatcher = Dispatcher::new(policy);
    let mut logs = Vec::new();
    let mut outbound = Vec::new();

    if let Some(announcement) = dispatcher.startup_command("me") {
        outbound.push(announcement.encode().unwrap());
    }

    for raw in frames {
        let Ok(outcome) = dispatcher.handle(raw) else {
            continue;
        };
        if let Some(line) = outcome.log {
            logs.push(line);
        }
        if let Some(command) = outcome.command {
            outbound.push(command.encode().unwrap());
        }
    }

    (logs, outbound)
}

#[test]
fn test_by_name_full_session() {
    // Arrange: a plausible gateway session — a board appears, the flash is
    // acknowledged, the board disappears again.
    let frames: [&[u8]; 4] = [
        b"{\"added\":\"dev1\"}",
        b"{\"sent\":\"dev1\"}",
        b"{\"removed\":\"dev1\"}",
        b"{\"error\":\"couldnt send\"}",
    ];

    // Act
    let (logs, outbound) = run_session(DispatchPolicy::ByName, &frames);

    // Assert: one log line per frame, and exactly one outbound command —
    // the reaction to `added`, targeting the fixed name.
    assert_eq!(
        logs,
        vec!["added dev1", "sent", "removed dev1", "error couldnt send"]
    );
    assert_eq!(outbound.len(), 1);
    assert_eq!(
        outbound[0],
        b"{\"send\":{\"data\":\"FLASH\",\"name\":\"arduino\"}}\n"
    );
}

#[test]
fn test_by_device_full_session() {
    // Arrange: board attaches, reports its identity, echoes a line back.
    let frames: [&[u8]; 4] = [
        b"{\"device\":\"/dev/ttyUSB0\"}",
        b"{\"id\":{\"device\":\"/dev/ttyUSB0\",\"name\":\"arduino\"}}",
        b"{\"sent\":\"/dev/ttyUSB0\"}",
        b"{\"received\":{\"data\":\"FLASHING\",\"device\":\"/dev/ttyUSB0\"}}",
    ];

    // Act
    let (logs, outbound) = run_session(DispatchPolicy::ByDevice, &frames);

    // Assert: the announcement goes out before any reaction, and the
    // reaction targets the announced device path rather than a name.
    assert_eq!(outbound.len(), 2);
    assert_eq!(outbound[0], b"{\"connected\":\"me\"}\n");
    assert_eq!(
        outbound[1],
        b"{\"send\":{\"data\":\"FLASH\",\"device\":\"/dev/ttyUSB0\"}}\n"
    );
    assert_eq!(logs.len(), 4);
    assert_eq!(logs[0], "device /dev/ttyUSB0");
    assert!(logs[1].starts_with("id "));
    assert_eq!(logs[2], "sent");
    assert!(logs[3].starts_with("received "));
}

#[test]
fn test_policies_diverge_on_the_same_feed() {
    // The same frame sequence produces different outbound traffic under
    // each policy: by-name reacts to `added`, by-device to `device`.
    let frames: [&[u8]; 3] = [
        b"{\"added\":\"dev1\"}",
        b"{\"device\":\"dev1\"}",
        b"{\"what\":\"ever\"}",
    ];

    let (name_logs, name_out) = run_session(DispatchPolicy::ByName, &frames);
    let (device_logs, device_out) = run_session(DispatchPolicy::ByDevice, &frames);

    // by-name: reacts once (added), drops the unrecognized frame silently.
    assert_eq!(name_out.len(), 1);
    assert_eq!(name_logs, vec!["added dev1"]);

    // by-device: announcement plus one reaction (device), and the
    // unrecognized frame leaves a trace.
    assert_eq!(device_out.len(), 2);
    assert_eq!(
        device_logs,
        vec!["device dev1", "not handled {\"what\":\"ever\"}"]
    );
}

#[test]
fn test_decode_faults_do_not_poison_the_session() {
    // Garbage interleaved with valid frames: the valid ones still dispatch.
    let frames: [&[u8]; 5] = [
        b"not json at all",
        b"{\"sent\":true}",
        b"[1,2,3]",
        b"\"just a string\"",
        b"{\"removed\":\"dev1\"}",
    ];

    let (logs, outbound) = run_session(DispatchPolicy::ByDevice, &frames);

    assert_eq!(logs, vec!["sent", "removed dev1"]);
    // Only the startup announcement went out.
    assert_eq!(outbound.len(), 1);
}

#[test]
fn test_wire_frames_built_by_the_gateway_side_dispatch_cleanly() {
    // Frames produced by the gateway-event constructors decode back through
    // the dispatcher exactly like hand-written wire bytes.
    let event = GatewayEvent::received_line("/dev/ttyACM0", "pong");
    let raw = encode_frame(&event).unwrap();

    let outcome = Dispatcher::new(DispatchPolicy::ByDevice)
        .handle(&raw)
        .unwrap();

    assert_eq!(
        outcome.log.as_deref(),
        Some("received {\"data\":\"pong\",\"device\":\"/dev/ttyACM0\"}")
    );
    assert!(outcome.command.is_none());
}
