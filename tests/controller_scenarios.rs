// SPDX-License-Identifier: MPL-2.0
// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! End-to-end tests through the public API with an in-memory publisher.

use std::sync::Arc;
use std::time::Duration;

use hearthlink::command::{Action, CommandFamily, PayloadRule, VerbSpec, VerbTable, VerbTables};
use hearthlink::error::{DispatchError, ProtocolError};
use hearthlink::{Controller, DeviceEvent, DispatcherConfig, Publisher, RouteOutcome};
use hearthlink::registry::Device;
use parking_lot::Mutex;
use tokio::sync::broadcast;

const RESULT: &str = r#"{"Uptime":"0T00:02:33","MqttCount":4,"Dimmer":50,"Color":"FFFFFF","HSBColor":"0,0,100","Channel":1,"POWER":"ON","Wifi":{"SSId":"home","BSSId":"AA:BB:CC","Channel":6,"Mode":"11n","RSSI":-55,"Signal":70}}"#;

/// Publisher recording every message, optionally blocking until released.
#[derive(Debug, Default)]
struct RecordingPublisher {
    sent: Mutex<Vec<(String, String)>>,
    gate: Option<tokio::sync::Semaphore>,
}

impl RecordingPublisher {
    fn gated() -> Self {
        Self {
            gate: Some(tokio::sync::Semaphore::new(0)),
            ..Self::default()
        }
    }

    fn release(&self, n: usize) {
        if let Some(gate) = &self.gate {
            gate.add_permits(n);
        }
    }

    fn sent(&self) -> Vec<(String, String)> {
        self.sent.lock().clone()
    }
}

impl Publisher for RecordingPublisher {
    async fn publish(&self, topic: &str, payload: &str) -> Result<(), ProtocolError> {
        if let Some(gate) = &self.gate {
            gate.acquire()
                .await
                .map_err(|e| ProtocolError::ChannelClosed(e.to_string()))?
                .forget();
        }
        self.sent.lock().push((topic.to_string(), payload.to_string()));
        Ok(())
    }
}

fn roster() -> Vec<Device> {
    vec![
        Device::new("officeLamp", "Office Lamp", "light", "rgbcw"),
        Device::new("hallLamp", "Hall Lamp", "light", "cw"),
        Device::new("fridge", "Fridge", "powermon", "plug"),
    ]
}

fn start() -> (Controller, Arc<RecordingPublisher>) {
    let publisher = Arc::new(RecordingPublisher::default());
    let controller = Controller::builder(roster())
        .start_with_publisher(Arc::clone(&publisher))
        .unwrap();
    (controller, publisher)
}

async fn next_command(rx: &mut broadcast::Receiver<DeviceEvent>) -> DeviceEvent {
    loop {
        let event = tokio::time::timeout(Duration::from_secs(1), rx.recv())
            .await
            .expect("no event within 1s")
            .unwrap();
        if event.is_command() {
            return event;
        }
    }
}

#[tokio::test]
async fn connectivity_announcement_only_sets_online() {
    let (controller, publisher) = start();
    let before = controller.snapshots();

    let outcome = controller.router().route("officeLamp/connected", "online");
    assert!(matches!(outcome, RouteOutcome::Connectivity { changed: true, .. }));

    let after = controller.snapshots();
    assert!(after[0].online);
    assert_eq!(after[0].state, before[0].state);
    assert_eq!(after[0].updated_at, None);
    assert_eq!(after[1..], before[1..]);
    assert!(publisher.sent().is_empty());
}

#[tokio::test]
async fn state_response_populates_snapshot() {
    let (controller, _) = start();

    controller.router().route("stat/officeLamp/RESULT", RESULT);

    let snapshot = controller.snapshot(0).unwrap();
    assert!(snapshot.online);
    assert_eq!(snapshot.state.dimmer(), 50);
    assert_eq!(snapshot.state.brightness(), 50);
    assert_eq!(snapshot.state.wifi().rssi(), -55);
    assert_eq!(snapshot.wifi_signal_percent(), Some(58));
    assert_eq!(snapshot.uptime(), Some(Duration::from_secs(153)));
    assert!(snapshot.updated_at.is_some());
}

#[tokio::test]
async fn oversized_uptime_is_kept_but_not_converted() {
    let (controller, _) = start();
    let payload = RESULT.replace("0T00:02:33", "300000000000000T00:00:00");

    let outcome = controller.router().route("stat/officeLamp/RESULT", &payload);
    assert!(matches!(outcome, RouteOutcome::StateResponse { applied: true, .. }));

    let snapshot = controller.snapshot(0).unwrap();
    assert_eq!(snapshot.state.uptime(), "300000000000000T00:00:00");
    assert_eq!(snapshot.uptime(), None);
}

#[tokio::test]
async fn brightness_command_is_published() {
    let (controller, publisher) = start();
    let mut rx = controller.subscribe();

    controller
        .post_command(0, CommandFamily::OpenBkLight, Action::Brightness, Some(75))
        .unwrap();
    next_command(&mut rx).await;

    assert_eq!(
        publisher.sent(),
        [("cmnd/officeLamp/led_dimmer".to_string(), "75".to_string())]
    );
}

#[tokio::test]
async fn posts_while_busy_coalesce_to_the_latest() {
    let publisher = Arc::new(RecordingPublisher::gated());
    let controller = Controller::builder(roster())
        .start_with_publisher(Arc::clone(&publisher))
        .unwrap();
    let mut rx = controller.subscribe();

    // The first command is taken and blocks in the publisher.
    controller
        .post_command(0, CommandFamily::OpenBkLight, Action::PowerOn, None)
        .unwrap();
    tokio::time::sleep(Duration::from_millis(50)).await;

    controller
        .post_command(1, CommandFamily::OpenBkLight, Action::Brightness, Some(10))
        .unwrap();
    controller
        .post_command(1, CommandFamily::OpenBkLight, Action::Brightness, Some(80))
        .unwrap();

    publisher.release(2);
    next_command(&mut rx).await;
    next_command(&mut rx).await;

    assert_eq!(
        publisher.sent(),
        [
            ("cmnd/officeLamp/led_enableAll".to_string(), "1".to_string()),
            ("cmnd/hallLamp/led_dimmer".to_string(), "80".to_string()),
        ]
    );
}

#[tokio::test]
async fn rejected_posts_never_reach_the_bus() {
    let (controller, publisher) = start();

    assert_eq!(
        controller.post_command(3, CommandFamily::OpenBkLight, Action::PowerOn, None),
        Err(DispatchError::UnknownDevice(3))
    );
    assert_eq!(
        controller.post_command(0, CommandFamily::OpenBkLight, Action::Brightness, None),
        Err(DispatchError::MissingPayload("brightness"))
    );

    tokio::time::sleep(Duration::from_millis(20)).await;
    assert!(publisher.sent().is_empty());
}

#[tokio::test]
async fn deep_topics_are_discarded() {
    let (controller, _) = start();
    let mut rx = controller.subscribe();

    let outcome = controller
        .router()
        .route("stat/officeLamp/RESULT/extra", RESULT);
    assert_eq!(outcome, RouteOutcome::Discarded);

    let snapshot = controller.snapshot(0).unwrap();
    assert!(snapshot.state.is_clean());
    assert!(!snapshot.online);
    assert!(rx.try_recv().is_err());
}

#[tokio::test]
async fn failed_update_clears_previous_state() {
    let (controller, _) = start();
    controller.router().route("stat/officeLamp/RESULT", RESULT);

    let truncated = RESULT.replace(r#""MqttCount":4,"#, "");
    let outcome = controller
        .router()
        .route("stat/officeLamp/RESULT", &truncated);
    assert!(matches!(outcome, RouteOutcome::StateResponse { applied: false, .. }));

    let snapshot = controller.snapshot(0).unwrap();
    assert!(snapshot.state.is_clean());
    assert_eq!(snapshot.wifi_signal_percent(), None);
    // Connectivity is not revoked by a bad payload.
    assert!(snapshot.online);
}

#[tokio::test]
async fn status_payload_is_kept_for_display() {
    let (controller, _) = start();
    let status = r#"{"Status":{"DeviceName":"Office Lamp"}}"#;

    controller.router().route("stat/officeLamp/STATUS", status);

    let snapshot = controller.snapshot(0).unwrap();
    assert_eq!(snapshot.last_status.as_deref(), Some(status));
    assert_eq!(
        snapshot.status().unwrap().device_name(),
        Some("Office Lamp")
    );
    assert!(snapshot.state.is_clean());
}

#[tokio::test]
async fn per_type_verb_table_is_used() {
    let publisher = Arc::new(RecordingPublisher::default());
    let cw_table = VerbTable::openbk_light().with(
        Action::Warmth,
        VerbSpec::new("led_cw", PayloadRule::Requested),
    );
    let controller = Controller::builder(vec![
        Device::new("officeLamp", "Office Lamp", "light", "rgbcw"),
        Device::new("stripe", "Stripe", "cwstrip", "cw"),
    ])
    .verb_tables(VerbTables::new().with_override(CommandFamily::OpenBkLight, "cwstrip", cw_table))
    .start_with_publisher(Arc::clone(&publisher))
    .unwrap();
    let mut rx = controller.subscribe();

    controller
        .post_command(1, CommandFamily::OpenBkLight, Action::Warmth, Some(300))
        .unwrap();
    next_command(&mut rx).await;
    controller
        .post_command(0, CommandFamily::OpenBkLight, Action::Warmth, Some(300))
        .unwrap();
    next_command(&mut rx).await;

    assert_eq!(
        publisher.sent(),
        [
            ("cmnd/stripe/led_cw".to_string(), "300".to_string()),
            ("cmnd/officeLamp/led_temperature".to_string(), "300".to_string()),
        ]
    );
}

#[tokio::test]
async fn online_gating_drops_commands_for_silent_devices() {
    let publisher = Arc::new(RecordingPublisher::default());
    let controller = Controller::builder(roster())
        .dispatcher_config(DispatcherConfig {
            require_online: true,
        })
        .start_with_publisher(Arc::clone(&publisher))
        .unwrap();
    let mut rx = controller.subscribe();

    controller
        .post_command(0, CommandFamily::OpenBkLight, Action::PowerOn, None)
        .unwrap();
    assert!(matches!(
        next_command(&mut rx).await,
        DeviceEvent::CommandFailed { .. }
    ));

    controller.router().route("officeLamp/connected", "online");
    controller
        .post_command(0, CommandFamily::OpenBkLight, Action::PowerOn, None)
        .unwrap();
    assert!(matches!(
        next_command(&mut rx).await,
        DeviceEvent::CommandDispatched { .. }
    ));
    assert_eq!(publisher.sent().len(), 1);
}

#[tokio::test]
async fn shutdown_stops_accepting_commands() {
    let (controller, publisher) = start();
    let registry = Arc::clone(controller.registry());
    controller.shutdown().await.unwrap();

    assert_eq!(registry.len(), 3);
    assert!(publisher.sent().is_empty());
}
