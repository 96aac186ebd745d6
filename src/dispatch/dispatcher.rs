// SPDX-License-Identifier: MPL-2.0
// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! The command dispatch loop.

use std::sync::Arc;

use crate::command::{Command, VerbTables};
use crate::error::{DispatchError, Error};
use crate::event::{DeviceEvent, EventBus};
use crate::protocol::Publisher;
use crate::registry::Registry;

use super::{DispatchRequest, Mailbox};

/// Dispatcher options.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct DispatcherConfig {
    /// Drop requests for devices that never reported online.
    pub require_online: bool,
}

/// A command ready to publish.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OutboundCommand {
    /// Full command topic.
    pub topic: String,
    /// Decimal payload, or empty.
    pub payload: String,
}

/// Waits for requests in a [`Mailbox`] and publishes them one at a time.
///
/// A request is taken out of the mailbox before it is formatted, so a post
/// arriving while a command is in flight becomes the next request rather
/// than altering the current one. Failures are logged and announced as
/// [`DeviceEvent::CommandFailed`]; nothing is retried.
#[derive(Debug)]
pub struct CommandDispatcher<P> {
    registry: Arc<Registry>,
    mailbox: Arc<Mailbox<DispatchRequest>>,
    tables: Arc<VerbTables>,
    publisher: P,
    events: EventBus,
    config: DispatcherConfig,
}

impl<P: Publisher> CommandDispatcher<P> {
    /// Creates a dispatcher consuming `mailbox` and publishing through `publisher`.
    #[must_use]
    pub fn new(
        registry: Arc<Registry>,
        mailbox: Arc<Mailbox<DispatchRequest>>,
        tables: Arc<VerbTables>,
        publisher: P,
        events: EventBus,
    ) -> Self {
        Self {
            registry,
            mailbox,
            tables,
            publisher,
            events,
            config: DispatcherConfig::default(),
        }
    }

    /// Replaces the dispatcher options.
    #[must_use]
    pub fn with_config(mut self, config: DispatcherConfig) -> Self {
        self.config = config;
        self
    }

    /// Runs until the mailbox is closed.
    pub async fn run(self) {
        tracing::debug!("Command dispatcher started");
        while let Some(request) = self.mailbox.recv().await {
            // The outcome has already been logged and announced.
            let _ = self.dispatch(request).await;
        }
        tracing::debug!("Command dispatcher stopped");
    }

    /// Formats and publishes one request.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Dispatch`] if the request cannot be turned into a
    /// command, or [`Error::Protocol`] if publishing fails.
    pub async fn dispatch(&self, request: DispatchRequest) -> Result<(), Error> {
        let result = self.send(request).await;
        match &result {
            Ok(command) => {
                self.events.publish(DeviceEvent::CommandDispatched {
                    device: request.device,
                    topic: command.topic.clone(),
                    payload: command.payload.clone(),
                });
            }
            Err(e) => {
                tracing::warn!(
                    device = %request.device,
                    action = %request.action,
                    error = %e,
                    "Command not dispatched"
                );
                self.events.publish(DeviceEvent::CommandFailed {
                    device: request.device,
                    error: e.to_string(),
                });
            }
        }
        result.map(|_| ())
    }

    /// Turns a request into the topic and payload to publish.
    ///
    /// # Errors
    ///
    /// Returns [`DispatchError`] if the device is unknown, not online while
    /// that is required, or has no verb for the action.
    pub fn prepare(&self, request: &DispatchRequest) -> Result<OutboundCommand, DispatchError> {
        let device = self
            .registry
            .device(request.device)
            .ok_or(DispatchError::UnknownDevice(request.device.get()))?;

        if self.config.require_online && !self.registry.is_online(request.device) {
            return Err(DispatchError::DeviceOffline(request.device.get()));
        }

        let command =
            self.tables
                .command(request.family, device.kind(), request.action, request.payload)?;
        Ok(OutboundCommand {
            topic: command.topic(device.name()),
            payload: command.mqtt_payload(),
        })
    }

    async fn send(&self, request: DispatchRequest) -> Result<OutboundCommand, Error> {
        let command = self.prepare(&request)?;
        self.publisher
            .publish(&command.topic, &command.payload)
            .await?;
        tracing::debug!(
            device = %request.device,
            topic = %command.topic,
            payload = %command.payload,
            "Command dispatched"
        );
        Ok(command)
    }
}

#[cfg(test)]
mod tests {
    use std::time::Duration;

    use parking_lot::Mutex;

    use super::*;
    use crate::command::{Action, CommandFamily};
    use crate::error::ProtocolError;
    use crate::registry::{Device, DeviceIndex};

    #[derive(Debug, Default)]
    struct Recorder {
        sent: Mutex<Vec<(String, String)>>,
        fail: bool,
    }

    impl Publisher for Recorder {
        async fn publish(&self, topic: &str, payload: &str) -> Result<(), ProtocolError> {
            if self.fail {
                return Err(ProtocolError::ConnectionFailed("down".to_string()));
            }
            self.sent.lock().push((topic.to_string(), payload.to_string()));
            Ok(())
        }
    }

    struct Fixture {
        registry: Arc<Registry>,
        mailbox: Arc<Mailbox<DispatchRequest>>,
        publisher: Arc<Recorder>,
        events: EventBus,
    }

    impl Fixture {
        fn new(fail: bool) -> Self {
            let registry = Arc::new(
                Registry::new(vec![
                    Device::new("officeLamp", "Office", "light", "rgb"),
                    Device::new("fridge", "Fridge", "powermon", "plug"),
                ])
                .unwrap(),
            );
            Self {
                registry,
                mailbox: Arc::new(Mailbox::new()),
                publisher: Arc::new(Recorder {
                    fail,
                    ..Recorder::default()
                }),
                events: EventBus::new(),
            }
        }

        fn dispatcher(&self) -> CommandDispatcher<Arc<Recorder>> {
            CommandDispatcher::new(
                Arc::clone(&self.registry),
                Arc::clone(&self.mailbox),
                Arc::new(VerbTables::new()),
                Arc::clone(&self.publisher),
                self.events.clone(),
            )
        }

        fn request(&self, action: Action, payload: Option<u32>) -> DispatchRequest {
            DispatchRequest::new(
                self.registry.index(0).unwrap(),
                CommandFamily::OpenBkLight,
                action,
                payload,
            )
        }

        fn sent(&self) -> Vec<(String, String)> {
            self.publisher.sent.lock().clone()
        }
    }

    #[test]
    fn prepare_formats_topic_and_payload() {
        let fx = Fixture::new(false);
        let command = fx
            .dispatcher()
            .prepare(&fx.request(Action::Brightness, Some(75)))
            .unwrap();
        assert_eq!(command.topic, "cmnd/officeLamp/led_dimmer");
        assert_eq!(command.payload, "75");
    }

    #[test]
    fn prepare_power_off() {
        let fx = Fixture::new(false);
        let command = fx
            .dispatcher()
            .prepare(&fx.request(Action::PowerOff, None))
            .unwrap();
        assert_eq!(command.topic, "cmnd/officeLamp/led_enableAll");
        assert_eq!(command.payload, "0");
    }

    #[test]
    fn prepare_rejects_unknown_device() {
        let fx = Fixture::new(false);
        let mut request = fx.request(Action::PowerOn, None);
        request.device = DeviceIndex::new(9);
        assert_eq!(
            fx.dispatcher().prepare(&request),
            Err(DispatchError::UnknownDevice(9))
        );
    }

    #[test]
    fn online_gating() {
        let fx = Fixture::new(false);
        let dispatcher = fx.dispatcher().with_config(DispatcherConfig {
            require_online: true,
        });
        let request = fx.request(Action::PowerOn, None);

        assert_eq!(
            dispatcher.prepare(&request),
            Err(DispatchError::DeviceOffline(0))
        );
        fx.registry.mark_online(request.device);
        assert!(dispatcher.prepare(&request).is_ok());
    }

    #[tokio::test]
    async fn dispatch_publishes_and_announces() {
        let fx = Fixture::new(false);
        let mut rx = fx.events.subscribe();

        fx.dispatcher()
            .dispatch(fx.request(Action::Warmth, Some(250)))
            .await
            .unwrap();

        assert_eq!(
            fx.sent(),
            [(
                "cmnd/officeLamp/led_temperature".to_string(),
                "250".to_string()
            )]
        );
        assert!(matches!(
            rx.try_recv().unwrap(),
            DeviceEvent::CommandDispatched { ref payload, .. } if payload == "250"
        ));
    }

    #[tokio::test]
    async fn missing_payload_is_not_published() {
        let fx = Fixture::new(false);
        let mut rx = fx.events.subscribe();

        let err = fx
            .dispatcher()
            .dispatch(fx.request(Action::Brightness, None))
            .await
            .unwrap_err();

        assert!(matches!(
            err,
            Error::Dispatch(DispatchError::MissingPayload("brightness"))
        ));
        assert!(fx.sent().is_empty());
        assert!(matches!(
            rx.try_recv().unwrap(),
            DeviceEvent::CommandFailed { .. }
        ));
    }

    #[tokio::test]
    async fn publish_failure_is_reported() {
        let fx = Fixture::new(true);
        let err = fx
            .dispatcher()
            .dispatch(fx.request(Action::PowerOn, None))
            .await
            .unwrap_err();
        assert!(matches!(err, Error::Protocol(_)));
    }

    #[tokio::test]
    async fn run_until_closed() {
        let fx = Fixture::new(false);
        let handle = tokio::spawn(fx.dispatcher().run());

        let mut rx = fx.events.subscribe();
        fx.mailbox.post(fx.request(Action::PowerOn, None)).unwrap();
        tokio::time::timeout(Duration::from_secs(1), rx.recv())
            .await
            .unwrap()
            .unwrap();

        fx.mailbox.close();
        tokio::time::timeout(Duration::from_secs(1), handle)
            .await
            .unwrap()
            .unwrap();

        assert_eq!(
            fx.sent(),
            [(
                "cmnd/officeLamp/led_enableAll".to_string(),
                "1".to_string()
            )]
        );
    }

    #[tokio::test]
    async fn coalesced_posts_publish_once() {
        let fx = Fixture::new(false);
        fx.mailbox.post(fx.request(Action::Brightness, Some(10))).unwrap();
        fx.mailbox.post(fx.request(Action::Brightness, Some(90))).unwrap();

        let handle = tokio::spawn(fx.dispatcher().run());
        tokio::time::sleep(Duration::from_millis(50)).await;
        fx.mailbox.close();
        handle.await.unwrap();

        assert_eq!(
            fx.sent(),
            [("cmnd/officeLamp/led_dimmer".to_string(), "90".to_string())]
        );
    }

    #[tokio::test]
    async fn failure_does_not_stop_the_loop() {
        let fx = Fixture::new(false);
        let handle = tokio::spawn(fx.dispatcher().run());
        let mut rx = fx.events.subscribe();

        fx.mailbox.post(fx.request(Action::Warmth, None)).unwrap();
        let failed = tokio::time::timeout(Duration::from_secs(1), rx.recv())
            .await
            .unwrap()
            .unwrap();
        assert!(matches!(failed, DeviceEvent::CommandFailed { .. }));

        fx.mailbox.post(fx.request(Action::PowerOn, None)).unwrap();
        let sent = tokio::time::timeout(Duration::from_secs(1), rx.recv())
            .await
            .unwrap()
            .unwrap();
        assert!(matches!(sent, DeviceEvent::CommandDispatched { .. }));

        fx.mailbox.close();
        handle.await.unwrap();
    }
}
