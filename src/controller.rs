// SPDX-License-Identifier: MPL-2.0
// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Controller facade wiring the registry, router, dispatcher and connection.

use std::sync::Arc;

use tokio::sync::broadcast;
use tokio::task::JoinHandle;

use crate::command::{Action, CommandFamily, VerbTables};
use crate::config::ControllerConfig;
use crate::dispatch::{CommandDispatcher, DispatchRequest, DispatcherConfig, Mailbox};
use crate::error::{ConfigError, DispatchError, Error};
use crate::event::{DeviceEvent, EventBus};
#[cfg(feature = "mqtt")]
use crate::protocol::{MqttConnection, MqttConnectionBuilder};
use crate::protocol::{Publisher, TopicRouter};
use crate::registry::{Device, DeviceIndex, Registry};
use crate::snapshot::DeviceSnapshot;

/// Default event bus capacity.
const DEFAULT_EVENT_CAPACITY: usize = 256;

/// A running controller.
///
/// Owns the device registry, routes inbound messages into it and runs the
/// command dispatcher. Presentation code reads [`DeviceSnapshot`]s, posts
/// commands with [`Controller::post_command`] and listens for
/// [`DeviceEvent`]s.
///
/// # Examples
///
/// ```no_run
/// use hearthlink::command::{Action, CommandFamily};
/// use hearthlink::config::ControllerConfig;
/// use hearthlink::Controller;
///
/// # async fn example() -> hearthlink::Result<()> {
/// let config = ControllerConfig::load("config.json")?;
/// let controller = Controller::connect(&config).await?;
///
/// controller.post_command(0, CommandFamily::OpenBkLight, Action::Brightness, Some(75))?;
///
/// for snapshot in controller.snapshots() {
///     println!("{}: online={}", snapshot.device.pretty_name(), snapshot.online);
/// }
///
/// controller.shutdown().await?;
/// # Ok(())
/// # }
/// ```
#[derive(Debug)]
pub struct Controller {
    registry: Arc<Registry>,
    router: TopicRouter,
    mailbox: Arc<Mailbox<DispatchRequest>>,
    events: EventBus,
    dispatcher: Option<JoinHandle<()>>,
    #[cfg(feature = "mqtt")]
    connection: Option<MqttConnection>,
    redact: bool,
}

impl Controller {
    /// Creates a builder for a roster.
    #[must_use]
    pub fn builder(devices: Vec<Device>) -> ControllerBuilder {
        ControllerBuilder::new(devices)
    }

    /// Connects to the broker described by `config` and starts dispatching.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Config`] for an invalid roster and
    /// [`Error::Protocol`] if the broker cannot be reached.
    #[cfg(feature = "mqtt")]
    pub async fn connect(config: &ControllerConfig) -> Result<Self, Error> {
        ControllerBuilder::from_config(config).connect(config).await
    }

    /// Returns the registry.
    #[must_use]
    pub fn registry(&self) -> &Arc<Registry> {
        &self.registry
    }

    /// Returns the inbound message router.
    ///
    /// Transports other than [`MqttConnection`] feed their messages here.
    #[must_use]
    pub fn router(&self) -> &TopicRouter {
        &self.router
    }

    /// Returns the broker connection, if the controller owns one.
    #[cfg(feature = "mqtt")]
    #[must_use]
    pub fn connection(&self) -> Option<&MqttConnection> {
        self.connection.as_ref()
    }

    /// Finds a device by routing key.
    #[must_use]
    pub fn device_index(&self, name: &str) -> Option<DeviceIndex> {
        self.registry.lookup(name)
    }

    /// Returns a snapshot of the device at `index`.
    #[must_use]
    pub fn snapshot(&self, index: usize) -> Option<DeviceSnapshot> {
        let index = self.registry.index(index)?;
        self.registry.snapshot(index).map(|s| self.present(s))
    }

    /// Returns snapshots of every device in roster order.
    #[must_use]
    pub fn snapshots(&self) -> Vec<DeviceSnapshot> {
        self.registry
            .snapshots()
            .into_iter()
            .map(|s| self.present(s))
            .collect()
    }

    /// Subscribes to device events.
    #[must_use]
    pub fn subscribe(&self) -> broadcast::Receiver<DeviceEvent> {
        self.events.subscribe()
    }

    /// Posts a command for the dispatcher.
    ///
    /// Returns immediately. A command still waiting for the dispatcher is
    /// replaced by this one.
    ///
    /// # Errors
    ///
    /// Returns [`DispatchError::UnknownDevice`] for an index outside the
    /// roster, [`DispatchError::MissingPayload`] if the action needs a level
    /// and none was given, and [`DispatchError::Closed`] after shutdown.
    pub fn post_command(
        &self,
        index: usize,
        family: CommandFamily,
        action: Action,
        payload: Option<u32>,
    ) -> Result<(), DispatchError> {
        let device = self
            .registry
            .index(index)
            .ok_or(DispatchError::UnknownDevice(index))?;
        if action.requires_payload() && payload.is_none() {
            return Err(DispatchError::MissingPayload(action.name()));
        }

        let request = DispatchRequest::new(device, family, action, payload);
        if let Some(replaced) = self.mailbox.post(request)? {
            tracing::debug!(
                device = %replaced.device,
                action = %replaced.action,
                "Pending command replaced"
            );
        }
        Ok(())
    }

    /// Stops the dispatcher and disconnects from the broker.
    ///
    /// A command still waiting in the mailbox is discarded.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Protocol`] if the disconnect request fails.
    pub async fn shutdown(mut self) -> Result<(), Error> {
        self.mailbox.close();
        if let Some(handle) = self.dispatcher.take()
            && let Err(e) = handle.await
        {
            tracing::warn!(error = %e, "Command dispatcher task failed");
        }

        #[cfg(feature = "mqtt")]
        if let Some(connection) = self.connection.take() {
            connection.disconnect().await?;
        }
        Ok(())
    }

    fn present(&self, snapshot: DeviceSnapshot) -> DeviceSnapshot {
        if self.redact {
            snapshot.redacted()
        } else {
            snapshot
        }
    }
}

impl Drop for Controller {
    fn drop(&mut self) {
        self.mailbox.close();
        #[cfg(feature = "mqtt")]
        if let Some(connection) = self.connection.take() {
            connection.close();
        }
    }
}

/// Builder for [`Controller`].
#[derive(Debug)]
pub struct ControllerBuilder {
    devices: Vec<Device>,
    tables: VerbTables,
    dispatcher: DispatcherConfig,
    redact: bool,
    event_capacity: usize,
}

impl ControllerBuilder {
    /// Starts a builder for a roster.
    #[must_use]
    pub fn new(devices: Vec<Device>) -> Self {
        Self {
            devices,
            tables: VerbTables::new(),
            dispatcher: DispatcherConfig::default(),
            redact: false,
            event_capacity: DEFAULT_EVENT_CAPACITY,
        }
    }

    /// Starts a builder from a configuration file's roster and options.
    #[must_use]
    pub fn from_config(config: &ControllerConfig) -> Self {
        Self::new(config.devices.clone()).redact(config.redact)
    }

    /// Replaces the verb tables.
    #[must_use]
    pub fn verb_tables(mut self, tables: VerbTables) -> Self {
        self.tables = tables;
        self
    }

    /// Sets the dispatcher options.
    #[must_use]
    pub fn dispatcher_config(mut self, config: DispatcherConfig) -> Self {
        self.dispatcher = config;
        self
    }

    /// Hides SSID and BSSID from snapshots.
    #[must_use]
    pub fn redact(mut self, redact: bool) -> Self {
        self.redact = redact;
        self
    }

    /// Sets the event bus capacity (default: 256).
    #[must_use]
    pub fn event_capacity(mut self, capacity: usize) -> Self {
        self.event_capacity = capacity;
        self
    }

    /// Starts the controller with a custom publisher and no broker connection.
    ///
    /// Inbound messages are fed through [`Controller::router`].
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError`] if the roster is invalid.
    ///
    /// # Panics
    ///
    /// Panics if called outside a tokio runtime.
    pub fn start_with_publisher<P: Publisher>(self, publisher: P) -> Result<Controller, ConfigError> {
        let parts = self.assemble()?;
        Ok(parts.start(publisher))
    }

    /// Connects to the broker and starts the controller.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Config`] for an invalid roster and
    /// [`Error::Protocol`] if the broker cannot be reached.
    #[cfg(feature = "mqtt")]
    pub async fn connect(self, config: &ControllerConfig) -> Result<Controller, Error> {
        config.validate()?;
        let parts = self.assemble()?;
        let connection = MqttConnectionBuilder::from_settings(&config.mqtt)
            .build(parts.router.clone())
            .await?;

        let mut controller = parts.start(connection.clone());
        controller.connection = Some(connection);
        Ok(controller)
    }

    fn assemble(self) -> Result<Parts, ConfigError> {
        let registry = Arc::new(Registry::new(self.devices)?);
        let events = EventBus::with_capacity(self.event_capacity);
        let router = TopicRouter::new(Arc::clone(&registry), events.clone());
        Ok(Parts {
            registry,
            router,
            events,
            tables: Arc::new(self.tables),
            dispatcher: self.dispatcher,
            redact: self.redact,
        })
    }
}

struct Parts {
    registry: Arc<Registry>,
    router: TopicRouter,
    events: EventBus,
    tables: Arc<VerbTables>,
    dispatcher: DispatcherConfig,
    redact: bool,
}

impl Parts {
    fn start<P: Publisher>(self, publisher: P) -> Controller {
        let mailbox = Arc::new(Mailbox::new());
        let dispatcher = CommandDispatcher::new(
            Arc::clone(&self.registry),
            Arc::clone(&mailbox),
            self.tables,
            publisher,
            self.events.clone(),
        )
        .with_config(self.dispatcher);
        let handle = tokio::spawn(dispatcher.run());

        tracing::debug!(devices = self.registry.len(), "Controller started");
        Controller {
            registry: self.registry,
            router: self.router,
            mailbox,
            events: self.events,
            dispatcher: Some(handle),
            #[cfg(feature = "mqtt")]
            connection: None,
            redact: self.redact,
        }
    }
}
