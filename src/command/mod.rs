// SPDX-License-Identifier: MPL-2.0
// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Device command definitions.
//!
//! A command request names an [`Action`] within a [`CommandFamily`]. The
//! family's [`VerbTable`] turns it into a [`DeviceCommand`]: a firmware verb
//! plus an optional integer payload, published on `cmnd/<name>/<verb>`.
//!
//! # OpenBK light vocabulary
//!
//! | Action | Verb | Payload |
//! |--------|------|---------|
//! | [`Action::PowerOn`] | `led_enableAll` | `1` |
//! | [`Action::PowerOff`] | `led_enableAll` | `0` |
//! | [`Action::Brightness`] | `led_dimmer` | level |
//! | [`Action::Warmth`] | `led_temperature` | level |
//!
//! # Examples
//!
//! ```
//! use hearthlink::command::{Action, Command, CommandFamily, VerbTables};
//! use hearthlink::registry::DeviceKind;
//!
//! let tables = VerbTables::new();
//! let cmd = tables
//!     .command(CommandFamily::OpenBkLight, &DeviceKind::Light, Action::PowerOn, None)
//!     .unwrap();
//!
//! assert_eq!(cmd.topic("officeLamp"), "cmnd/officeLamp/led_enableAll");
//! assert_eq!(cmd.mqtt_payload(), "1");
//! ```

mod action;
mod verb_table;

pub use action::{Action, CommandFamily};
pub use verb_table::{PayloadRule, VerbSpec, VerbTable, VerbTables};

use crate::protocol::command_topic;

/// A command that can be sent to a device.
pub trait Command {
    /// Returns the firmware verb, the last segment of the command topic.
    fn verb(&self) -> &str;

    /// Returns the command payload, if any.
    fn payload(&self) -> Option<String>;

    /// Returns the topic this command is published on for a device.
    fn topic(&self, routing_key: &str) -> String {
        command_topic(routing_key, self.verb())
    }

    /// Returns the MQTT payload; empty when the command has none.
    fn mqtt_payload(&self) -> String {
        self.payload().unwrap_or_default()
    }
}

/// A verb with an optional decimal payload.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DeviceCommand {
    verb: String,
    value: Option<u32>,
}

impl DeviceCommand {
    /// Creates a command.
    #[must_use]
    pub fn new(verb: impl Into<String>, value: Option<u32>) -> Self {
        Self {
            verb: verb.into(),
            value,
        }
    }

    /// Returns the integer payload.
    #[must_use]
    pub fn value(&self) -> Option<u32> {
        self.value
    }
}

impl Command for DeviceCommand {
    fn verb(&self) -> &str {
        &self.verb
    }

    fn payload(&self) -> Option<String> {
        self.value.map(|v| v.to_string())
    }
}
