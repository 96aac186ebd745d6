// SPDX-License-Identifier: MPL-2.0
// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Integration tests for the broker connection using mockforge-mqtt.

#![cfg(feature = "mqtt")]

use std::sync::Arc;
use std::time::Duration;

use hearthlink::config::{BrokerSettings, ControllerConfig};
use hearthlink::error::ProtocolError;
use hearthlink::event::EventBus;
use hearthlink::protocol::{MqttConnection, TopicRouter};
use hearthlink::registry::{Device, Registry};
use hearthlink::{Action, CommandFamily, Controller, DeviceEvent, Error};
use mockforge_mqtt::broker::MqttConfig;
use mockforge_mqtt::start_mqtt_server;
use tokio::time::sleep;

/// Helper to find an available port for testing.
fn get_test_port() -> u16 {
    use std::sync::atomic::{AtomicU16, Ordering};
    static PORT_COUNTER: AtomicU16 = AtomicU16::new(18950);
    PORT_COUNTER.fetch_add(1, Ordering::SeqCst)
}

/// Starts a mock MQTT broker on the given port.
async fn start_mock_broker(port: u16) {
    let config = MqttConfig {
        port,
        host: "127.0.0.1".to_string(),
        ..Default::default()
    };

    tokio::spawn(async move {
        let _ = start_mqtt_server(config).await;
    });

    // Give the broker time to bind.
    sleep(Duration::from_millis(500)).await;
}

fn roster() -> Vec<Device> {
    vec![
        Device::new("officeLamp", "Office Lamp", "light", "rgbcw"),
        Device::new("hallLamp", "Hall Lamp", "light", "cw"),
    ]
}

fn router() -> TopicRouter {
    let registry = Arc::new(Registry::new(roster()).unwrap());
    TopicRouter::new(registry, EventBus::new())
}

fn config(port: u16) -> ControllerConfig {
    ControllerConfig {
        mqtt: BrokerSettings {
            broker: "127.0.0.1".to_string(),
            port,
            client_name: format!("hearthlink-test-{port}"),
            username: String::new(),
            password: String::new(),
        },
        devices: roster(),
        redact: false,
    }
}

// ============================================================================
// Connection
// ============================================================================

mod connection {
    use super::*;

    #[tokio::test]
    async fn connect_to_broker() {
        let port = get_test_port();
        start_mock_broker(port).await;

        let result = MqttConnection::builder()
            .host("127.0.0.1")
            .port(port)
            .client_name("hearthlink-connect")
            .build(router())
            .await;

        assert!(result.is_ok(), "Failed to connect: {:?}", result.err());
        let connection = result.unwrap();
        assert!(connection.is_connected());
        assert_eq!(connection.client_id(), "hearthlink-connect");
        assert_eq!(connection.port(), port);
    }

    #[tokio::test]
    async fn generated_client_id() {
        let port = get_test_port();
        start_mock_broker(port).await;

        let connection = MqttConnection::builder()
            .host("127.0.0.1")
            .port(port)
            .build(router())
            .await
            .unwrap();
        assert!(connection.client_id().starts_with("hearthlink_"));
    }

    #[tokio::test]
    async fn publish_and_disconnect() {
        let port = get_test_port();
        start_mock_broker(port).await;

        let connection = MqttConnection::builder()
            .host("127.0.0.1")
            .port(port)
            .build(router())
            .await
            .unwrap();

        connection
            .publish("cmnd/officeLamp/led_dimmer", "75")
            .await
            .unwrap();

        connection.disconnect().await.unwrap();
        assert!(!connection.is_connected());
        assert!(connection.is_closed());

        let err = connection
            .publish("cmnd/officeLamp/led_dimmer", "10")
            .await
            .unwrap_err();
        assert!(matches!(err, ProtocolError::ConnectionFailed(_)));
    }

    #[tokio::test]
    async fn unreachable_broker_times_out() {
        // Nothing listens on this port.
        let port = get_test_port();

        let err = MqttConnection::builder()
            .host("127.0.0.1")
            .port(port)
            .connection_timeout(Duration::from_millis(300))
            .reconnect_delay(Duration::from_millis(50))
            .build(router())
            .await
            .unwrap_err();

        assert!(matches!(err, ProtocolError::Timeout(300)));
    }

    #[tokio::test]
    async fn missing_host_fails() {
        let err = MqttConnection::builder().build(router()).await.unwrap_err();
        assert!(matches!(err, ProtocolError::InvalidAddress(_)));
    }
}

// ============================================================================
// Controller over a broker
// ============================================================================

mod controller {
    use super::*;

    #[tokio::test]
    async fn connect_post_and_shutdown() {
        let port = get_test_port();
        start_mock_broker(port).await;

        let controller = Controller::connect(&config(port)).await.unwrap();
        assert!(controller.connection().is_some_and(MqttConnection::is_connected));

        let mut events = controller.subscribe();
        controller
            .post_command(0, CommandFamily::OpenBkLight, Action::Brightness, Some(75))
            .unwrap();

        let event = tokio::time::timeout(Duration::from_secs(2), events.recv())
            .await
            .unwrap()
            .unwrap();
        assert_eq!(
            event,
            DeviceEvent::CommandDispatched {
                device: controller.device_index("officeLamp").unwrap(),
                topic: "cmnd/officeLamp/led_dimmer".to_string(),
                payload: "75".to_string(),
            }
        );

        controller.shutdown().await.unwrap();
    }

    #[tokio::test]
    async fn dropping_controller_ends_the_session() {
        let port = get_test_port();
        start_mock_broker(port).await;
        let config = config(port);

        let controller = Controller::connect(&config).await.unwrap();
        let connection = controller.connection().cloned().unwrap();
        drop(controller);

        sleep(Duration::from_millis(100)).await;
        assert!(connection.is_closed());
        assert!(!connection.is_connected());

        // A replacement with the same client name keeps its session.
        let replacement = Controller::connect(&config).await.unwrap();
        sleep(Duration::from_millis(500)).await;
        assert!(replacement.connection().is_some_and(MqttConnection::is_connected));
        assert!(connection.is_closed());

        replacement.shutdown().await.unwrap();
    }

    #[tokio::test]
    async fn invalid_config_is_rejected_before_connecting() {
        let mut config = config(get_test_port());
        config.mqtt.broker = String::new();

        let err = Controller::connect(&config).await.unwrap_err();
        assert!(matches!(err, Error::Config(_)));
    }
}
