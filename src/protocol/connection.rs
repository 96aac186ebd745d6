// SPDX-License-Identifier: MPL-2.0
// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! MQTT broker connection.
//!
//! The controller keeps exactly one connection per process. It subscribes to
//! every topic (`#`) and feeds each inbound publish to the [`TopicRouter`];
//! outbound commands go through [`Publisher::publish`].
//!
//! # Examples
//!
//! ```no_run
//! use std::sync::Arc;
//!
//! use hearthlink::event::EventBus;
//! use hearthlink::protocol::{MqttConnection, TopicRouter};
//! use hearthlink::registry::{Device, Registry};
//!
//! # async fn example() -> hearthlink::Result<()> {
//! let registry = Arc::new(Registry::new(vec![Device::new("lamp", "Lamp", "light", "rgb")])?);
//! let router = TopicRouter::new(registry, EventBus::new());
//!
//! let connection = MqttConnection::builder()
//!     .host("192.168.1.20")
//!     .client_name("hearthlink")
//!     .credentials("home", "secret")
//!     .build(router)
//!     .await?;
//!
//! connection.disconnect().await?;
//! # Ok(())
//! # }
//! ```

use std::sync::Arc;
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::time::Duration;

use parking_lot::Mutex;
use rumqttc::{AsyncClient, Event, EventLoop, MqttOptions, Packet, QoS};
use tokio::sync::oneshot;
use tokio::task::JoinHandle;

use crate::config::BrokerSettings;
use crate::error::ProtocolError;

use super::{Publisher, TopicRouter};

/// Topic filter covering every topic on the broker.
pub const SUBSCRIBE_ALL: &str = "#";

/// Counter for generated client IDs.
static CLIENT_ID_COUNTER: AtomicU64 = AtomicU64::new(0);

/// Settings of a broker connection.
#[derive(Debug, Clone)]
pub struct ConnectionConfig {
    host: String,
    port: u16,
    client_name: Option<String>,
    credentials: Option<(String, String)>,
    keep_alive: Duration,
    connection_timeout: Duration,
    reconnect_delay: Duration,
}

impl Default for ConnectionConfig {
    fn default() -> Self {
        Self {
            host: String::new(),
            port: 1883,
            client_name: None,
            credentials: None,
            keep_alive: Duration::from_secs(20),
            connection_timeout: Duration::from_secs(10),
            reconnect_delay: Duration::from_secs(1),
        }
    }
}

/// A connection to the MQTT broker.
///
/// Cheaply cloneable; all clones share the same client and event loop.
#[derive(Clone)]
pub struct MqttConnection {
    inner: Arc<ConnectionInner>,
}

struct ConnectionInner {
    client: AsyncClient,
    config: ConnectionConfig,
    client_id: String,
    connected: AtomicBool,
    closing: AtomicBool,
    event_loop: Mutex<Option<JoinHandle<()>>>,
}

impl ConnectionInner {
    /// Marks the session as down. Returns `true` if the loop should stop.
    fn session_lost(&self) -> bool {
        self.connected.store(false, Ordering::Release);
        self.closing.load(Ordering::Acquire)
    }
}

impl MqttConnection {
    /// Creates a new builder.
    #[must_use]
    pub fn builder() -> MqttConnectionBuilder {
        MqttConnectionBuilder::default()
    }

    /// Returns whether the broker has acknowledged the current session.
    #[must_use]
    pub fn is_connected(&self) -> bool {
        self.inner.connected.load(Ordering::Acquire)
    }

    /// Returns the broker host.
    #[must_use]
    pub fn host(&self) -> &str {
        &self.inner.config.host
    }

    /// Returns the broker port.
    #[must_use]
    pub fn port(&self) -> u16 {
        self.inner.config.port
    }

    /// Returns the client identifier used on the broker.
    #[must_use]
    pub fn client_id(&self) -> &str {
        &self.inner.client_id
    }

    /// Publishes a command at QoS 0, not retained.
    ///
    /// # Errors
    ///
    /// Returns [`ProtocolError::ConnectionFailed`] when the connection is
    /// down, or [`ProtocolError::Mqtt`] if the client rejects the request.
    pub async fn publish(&self, topic: &str, payload: &str) -> Result<(), ProtocolError> {
        if !self.is_connected() {
            return Err(ProtocolError::ConnectionFailed(
                "not connected to broker".to_string(),
            ));
        }
        tracing::debug!(topic = %topic, payload = %payload, "Publishing");
        self.inner
            .client
            .publish(topic, QoS::AtMostOnce, false, payload.as_bytes().to_vec())
            .await?;
        Ok(())
    }

    /// Returns whether the connection was closed and its event loop has stopped.
    #[must_use]
    pub fn is_closed(&self) -> bool {
        self.inner.closing.load(Ordering::Acquire)
            && self
                .inner
                .event_loop
                .lock()
                .as_ref()
                .is_none_or(JoinHandle::is_finished)
    }

    /// Unsubscribes from `#` and disconnects.
    ///
    /// Waits for the event loop to stop, aborting it if the broker has not
    /// closed the session within the connection timeout.
    ///
    /// # Errors
    ///
    /// Returns error if the disconnect request fails.
    pub async fn disconnect(&self) -> Result<(), ProtocolError> {
        tracing::info!(
            host = %self.inner.config.host,
            port = %self.inner.config.port,
            "Disconnecting from MQTT broker"
        );
        self.inner.closing.store(true, Ordering::Release);

        if let Err(e) = self.inner.client.unsubscribe(SUBSCRIBE_ALL).await {
            tracing::warn!(error = %e, "Failed to unsubscribe");
        }
        self.inner.client.disconnect().await?;
        self.inner.connected.store(false, Ordering::Release);

        let handle = self.inner.event_loop.lock().take();
        if let Some(mut handle) = handle
            && tokio::time::timeout(self.inner.config.connection_timeout, &mut handle)
                .await
                .is_err()
        {
            tracing::debug!("MQTT event loop did not stop, aborting");
            handle.abort();
        }
        Ok(())
    }

    /// Stops the connection without waiting for the broker.
    ///
    /// The event loop is aborted and its socket dropped, so the broker ends
    /// the session. Idempotent.
    pub fn close(&self) {
        self.inner.closing.store(true, Ordering::Release);
        self.inner.connected.store(false, Ordering::Release);
        if let Some(handle) = self.inner.event_loop.lock().take() {
            tracing::debug!(client_id = %self.inner.client_id, "Closing MQTT connection");
            handle.abort();
        }
    }
}

impl Publisher for MqttConnection {
    async fn publish(&self, topic: &str, payload: &str) -> Result<(), ProtocolError> {
        MqttConnection::publish(self, topic, payload).await
    }
}

impl std::fmt::Debug for MqttConnection {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("MqttConnection")
            .field("host", &self.inner.config.host)
            .field("port", &self.inner.config.port)
            .field("client_id", &self.inner.client_id)
            .field("connected", &self.is_connected())
            .finish()
    }
}

/// Builder for [`MqttConnection`].
#[derive(Debug, Default)]
pub struct MqttConnectionBuilder {
    config: ConnectionConfig,
}

impl MqttConnectionBuilder {
    /// Starts from the broker section of a configuration file.
    #[must_use]
    pub fn from_settings(settings: &BrokerSettings) -> Self {
        let builder = Self::default()
            .host(&settings.broker)
            .port(settings.port)
            .client_name(&settings.client_name);
        match settings.credentials() {
            Some((username, password)) => builder.credentials(username, password),
            None => builder,
        }
    }

    /// Sets the broker host address.
    #[must_use]
    pub fn host(mut self, host: impl Into<String>) -> Self {
        self.config.host = host.into();
        self
    }

    /// Sets the broker port (default: 1883).
    #[must_use]
    pub fn port(mut self, port: u16) -> Self {
        self.config.port = port;
        self
    }

    /// Sets the client identifier. A unique one is generated if unset.
    #[must_use]
    pub fn client_name(mut self, name: impl Into<String>) -> Self {
        let name = name.into();
        self.config.client_name = (!name.is_empty()).then_some(name);
        self
    }

    /// Sets authentication credentials.
    #[must_use]
    pub fn credentials(mut self, username: impl Into<String>, password: impl Into<String>) -> Self {
        self.config.credentials = Some((username.into(), password.into()));
        self
    }

    /// Sets the keep-alive interval (default: 20 seconds).
    #[must_use]
    pub fn keep_alive(mut self, duration: Duration) -> Self {
        self.config.keep_alive = duration;
        self
    }

    /// Sets how long to wait for the broker to accept the session (default: 10 seconds).
    #[must_use]
    pub fn connection_timeout(mut self, duration: Duration) -> Self {
        self.config.connection_timeout = duration;
        self
    }

    /// Sets the pause between reconnection attempts (default: 1 second).
    #[must_use]
    pub fn reconnect_delay(mut self, duration: Duration) -> Self {
        self.config.reconnect_delay = duration;
        self
    }

    /// Connects, subscribes to `#` and starts routing inbound messages.
    ///
    /// # Errors
    ///
    /// Returns error if:
    /// - Host is not set
    /// - The broker does not accept the session within the timeout
    /// - The subscription request fails
    pub async fn build(self, router: TopicRouter) -> Result<MqttConnection, ProtocolError> {
        if self.config.host.is_empty() {
            return Err(ProtocolError::InvalidAddress(
                "MQTT broker host is required".to_string(),
            ));
        }

        let client_id = self.config.client_name.clone().unwrap_or_else(|| {
            let counter = CLIENT_ID_COUNTER.fetch_add(1, Ordering::Relaxed);
            format!("hearthlink_{}_{}", std::process::id(), counter)
        });

        let mut options = MqttOptions::new(&client_id, &self.config.host, self.config.port);
        options.set_keep_alive(self.config.keep_alive);
        options.set_clean_session(true);
        if let Some((ref username, ref password)) = self.config.credentials {
            options.set_credentials(username, password);
        }

        let (client, event_loop) = AsyncClient::new(options, 10);

        let connection = MqttConnection {
            inner: Arc::new(ConnectionInner {
                client,
                config: self.config,
                client_id,
                connected: AtomicBool::new(false),
                closing: AtomicBool::new(false),
                event_loop: Mutex::new(None),
            }),
        };

        let (connack_tx, connack_rx) = oneshot::channel();
        let handle = tokio::spawn(run_event_loop(
            event_loop,
            connection.clone(),
            router,
            connack_tx,
        ));
        *connection.inner.event_loop.lock() = Some(handle);

        let timeout = connection.inner.config.connection_timeout;
        match tokio::time::timeout(timeout, connack_rx).await {
            Ok(Ok(())) => {}
            Ok(Err(_)) => {
                connection.close();
                return Err(ProtocolError::ConnectionFailed(
                    "MQTT event loop terminated unexpectedly".to_string(),
                ));
            }
            Err(_) => {
                connection.close();
                return Err(ProtocolError::Timeout(
                    u64::try_from(timeout.as_millis()).unwrap_or(u64::MAX),
                ));
            }
        }

        connection
            .inner
            .client
            .subscribe(SUBSCRIBE_ALL, QoS::AtLeastOnce)
            .await?;

        tracing::info!(
            host = %connection.host(),
            port = %connection.port(),
            client_id = %connection.client_id(),
            "Connected to MQTT broker"
        );
        Ok(connection)
    }
}

/// Polls the client event loop until the connection is closed.
///
/// Connection loss, including a broker-initiated disconnect, is logged and
/// polling resumes after the reconnect delay. Each new session is
/// resubscribed because sessions are clean.
async fn run_event_loop(
    mut event_loop: EventLoop,
    connection: MqttConnection,
    router: TopicRouter,
    connack_tx: oneshot::Sender<()>,
) {
    let inner = &connection.inner;
    let mut connack_tx = Some(connack_tx);

    loop {
        match event_loop.poll().await {
            Ok(Event::Incoming(Packet::ConnAck(connack))) => {
                tracing::debug!(?connack, "MQTT session accepted");
                inner.connected.store(true, Ordering::Release);
                if let Some(tx) = connack_tx.take() {
                    let _ = tx.send(());
                } else if let Err(e) = inner.client.try_subscribe(SUBSCRIBE_ALL, QoS::AtLeastOnce)
                {
                    tracing::warn!(error = %e, "Failed to resubscribe after reconnect");
                }
            }
            Ok(Event::Incoming(Packet::SubAck(suback))) => {
                tracing::debug!(?suback, "MQTT subscription acknowledged");
            }
            Ok(Event::Incoming(Packet::Publish(publish))) => {
                match std::str::from_utf8(&publish.payload) {
                    Ok(payload) => {
                        tracing::trace!(topic = %publish.topic, payload = %payload, "MQTT message received");
                        router.route(&publish.topic, payload);
                    }
                    Err(_) => {
                        tracing::debug!(topic = %publish.topic, "Dropping non UTF-8 payload");
                    }
                }
            }
            Ok(Event::Incoming(Packet::Disconnect)) => {
                if inner.session_lost() {
                    tracing::debug!("MQTT event loop stopped");
                    break;
                }
                tracing::warn!("MQTT broker closed the session");
                tokio::time::sleep(inner.config.reconnect_delay).await;
            }
            Ok(_) => {}
            Err(e) => {
                if inner.session_lost() {
                    tracing::debug!("MQTT event loop stopped");
                    break;
                }
                tracing::warn!(error = %e, "Connection to MQTT broker lost");
                tokio::time::sleep(inner.config.reconnect_delay).await;
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::event::EventBus;
    use crate::registry::{Device, Registry};

    fn settings(username: &str) -> BrokerSettings {
        BrokerSettings {
            broker: "10.0.0.2".to_string(),
            port: 1884,
            client_name: "hearthlink-test".to_string(),
            username: username.to_string(),
            password: "pw".to_string(),
        }
    }

    #[test]
    fn builder_default_values() {
        let builder = MqttConnectionBuilder::default();
        assert_eq!(builder.config.port, 1883);
        assert!(builder.config.host.is_empty());
        assert!(builder.config.credentials.is_none());
        assert!(builder.config.client_name.is_none());
        assert_eq!(builder.config.keep_alive, Duration::from_secs(20));
        assert_eq!(builder.config.connection_timeout, Duration::from_secs(10));
    }

    #[test]
    fn builder_from_settings() {
        let builder = MqttConnectionBuilder::from_settings(&settings("home"));
        assert_eq!(builder.config.host, "10.0.0.2");
        assert_eq!(builder.config.port, 1884);
        assert_eq!(builder.config.client_name.as_deref(), Some("hearthlink-test"));
        assert_eq!(
            builder.config.credentials,
            Some(("home".to_string(), "pw".to_string()))
        );
    }

    #[test]
    fn anonymous_settings_skip_credentials() {
        let builder = MqttConnectionBuilder::from_settings(&settings(""));
        assert!(builder.config.credentials.is_none());
    }

    #[test]
    fn empty_client_name_means_generated() {
        let builder = MqttConnectionBuilder::default().client_name("");
        assert!(builder.config.client_name.is_none());
    }

    #[test]
    fn builder_chain() {
        let builder = MqttConnectionBuilder::default()
            .host("broker.local")
            .port(8883)
            .keep_alive(Duration::from_secs(45))
            .connection_timeout(Duration::from_secs(15))
            .reconnect_delay(Duration::from_millis(250));

        assert_eq!(builder.config.host, "broker.local");
        assert_eq!(builder.config.port, 8883);
        assert_eq!(builder.config.keep_alive, Duration::from_secs(45));
        assert_eq!(builder.config.connection_timeout, Duration::from_secs(15));
        assert_eq!(builder.config.reconnect_delay, Duration::from_millis(250));
    }

    fn unconnected(event_loop: Option<JoinHandle<()>>) -> (MqttConnection, EventLoop) {
        let options = MqttOptions::new("hearthlink-unit", "127.0.0.1", 1883);
        let (client, event_loop_handle) = AsyncClient::new(options, 10);
        let connection = MqttConnection {
            inner: Arc::new(ConnectionInner {
                client,
                config: ConnectionConfig::default(),
                client_id: "hearthlink-unit".to_string(),
                connected: AtomicBool::new(true),
                closing: AtomicBool::new(false),
                event_loop: Mutex::new(event_loop),
            }),
        };
        (connection, event_loop_handle)
    }

    #[tokio::test]
    async fn lost_session_keeps_looping_until_closed() {
        let (connection, _event_loop) = unconnected(None);

        assert!(!connection.inner.session_lost());
        assert!(!connection.is_connected());
        assert!(!connection.is_closed());

        connection.close();
        assert!(connection.inner.session_lost());
    }

    #[tokio::test]
    async fn close_aborts_event_loop() {
        let task = tokio::spawn(std::future::pending::<()>());
        let (connection, _event_loop) = unconnected(Some(task));
        assert!(!connection.is_closed());

        connection.close();
        assert!(connection.is_closed());
        assert!(!connection.is_connected());

        // Idempotent.
        connection.close();
        assert!(connection.is_closed());
    }

    #[tokio::test]
    async fn builder_missing_host_fails() {
        let registry = Arc::new(Registry::new(vec![Device::new("a", "A", "light", "")]).unwrap());
        let router = TopicRouter::new(registry, EventBus::new());
        let err = MqttConnectionBuilder::default().build(router).await.unwrap_err();
        assert!(matches!(err, ProtocolError::InvalidAddress(_)));
    }
}
