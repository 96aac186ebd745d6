// SPDX-License-Identifier: MPL-2.0
// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! `hearthlink` - a smart-home controller core for MQTT devices.
//!
//! The library keeps a small roster of devices in sync with what they report
//! on an MQTT bus and sends them commands:
//!
//! - **Routing**: inbound `<name>/connected`, `stat/<name>/RESULT` and
//!   `stat/<name>/STATUS` messages update the matching device record
//! - **State sync**: a state response replaces the device state wholesale,
//!   or clears it if the payload is incomplete
//! - **Dispatch**: command requests go through a one-slot coalescing mailbox
//!   to a single dispatcher task that publishes `cmnd/<name>/<verb>`
//! - **Events**: every change is broadcast so a UI can repaint on demand
//!
//! # Quick Start
//!
//! ```no_run
//! use hearthlink::command::{Action, CommandFamily};
//! use hearthlink::config::ControllerConfig;
//! use hearthlink::Controller;
//!
//! #[tokio::main]
//! async fn main() -> hearthlink::Result<()> {
//!     let config = ControllerConfig::load("config.json")?;
//!     let controller = Controller::connect(&config).await?;
//!
//!     let mut events = controller.subscribe();
//!     controller.post_command(0, CommandFamily::OpenBkLight, Action::PowerOn, None)?;
//!
//!     while let Ok(event) = events.recv().await {
//!         println!("{event:?}");
//!     }
//!     Ok(())
//! }
//! ```
//!
//! ## Without a broker
//!
//! Any [`protocol::Publisher`] can stand in for the MQTT connection, and
//! inbound messages can be fed to the router directly:
//!
//! ```
//! use hearthlink::error::ProtocolError;
//! use hearthlink::protocol::Publisher;
//! use hearthlink::registry::Device;
//! use hearthlink::Controller;
//!
//! struct Discard;
//!
//! impl Publisher for Discard {
//!     async fn publish(&self, _topic: &str, _payload: &str) -> Result<(), ProtocolError> {
//!         Ok(())
//!     }
//! }
//!
//! # #[tokio::main(flavor = "current_thread")]
//! # async fn main() {
//! let controller = Controller::builder(vec![Device::new("officeLamp", "Office", "light", "rgb")])
//!     .start_with_publisher(Discard)
//!     .unwrap();
//!
//! controller.router().route("officeLamp/connected", "online");
//! assert!(controller.snapshot(0).unwrap().online);
//! # }
//! ```

pub mod command;
pub mod config;
mod controller;
pub mod dispatch;
pub mod error;
pub mod event;
pub mod protocol;
pub mod registry;
pub mod response;
mod snapshot;
pub mod state;
pub mod types;

pub use command::{Action, Command, CommandFamily, VerbTable, VerbTables};
pub use config::{BrokerSettings, ControllerConfig};
pub use controller::{Controller, ControllerBuilder};
pub use dispatch::{DispatchRequest, DispatcherConfig, Mailbox};
pub use error::{ConfigError, DispatchError, Error, ParseError, ProtocolError, Result};
pub use event::{DeviceEvent, EventBus};
#[cfg(feature = "mqtt")]
pub use protocol::MqttConnection;
pub use protocol::{Publisher, RouteOutcome, TopicRouter};
pub use registry::{Device, DeviceIndex, DeviceKind, MAX_DEVICES, Registry};
pub use snapshot::DeviceSnapshot;
pub use state::{DeviceState, StateSynchronizer};
