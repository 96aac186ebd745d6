// SPDX-License-Identifier: MPL-2.0
// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Mapping from actions to firmware verbs.

use std::collections::HashMap;

use crate::error::DispatchError;
use crate::registry::DeviceKind;

use super::{Action, CommandFamily, DeviceCommand};

/// How the payload of a verb is produced.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PayloadRule {
    /// Always send this value.
    Fixed(u32),
    /// Send the level given with the request.
    Requested,
    /// Send an empty payload.
    Empty,
}

/// A firmware verb and its payload rule.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct VerbSpec {
    verb: String,
    payload: PayloadRule,
}

impl VerbSpec {
    /// Creates a verb entry.
    #[must_use]
    pub fn new(verb: impl Into<String>, payload: PayloadRule) -> Self {
        Self {
            verb: verb.into(),
            payload,
        }
    }

    /// Returns the verb, the last topic segment of the command.
    #[must_use]
    pub fn verb(&self) -> &str {
        &self.verb
    }

    /// Returns the payload rule.
    #[must_use]
    pub fn payload(&self) -> PayloadRule {
        self.payload
    }
}

/// Verbs for each supported action of one kind of device.
///
/// # Examples
///
/// ```
/// use hearthlink::command::{Action, Command, VerbTable};
///
/// let table = VerbTable::openbk_light();
/// let cmd = table.command(Action::Brightness, Some(75), "light").unwrap();
/// assert_eq!(cmd.verb(), "led_dimmer");
/// assert_eq!(cmd.mqtt_payload(), "75");
/// ```
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct VerbTable {
    verbs: HashMap<Action, VerbSpec>,
}

impl VerbTable {
    /// Creates an empty table.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// The OpenBK light vocabulary.
    #[must_use]
    pub fn openbk_light() -> Self {
        Self::new()
            .with(
                Action::PowerOn,
                VerbSpec::new("led_enableAll", PayloadRule::Fixed(1)),
            )
            .with(
                Action::PowerOff,
                VerbSpec::new("led_enableAll", PayloadRule::Fixed(0)),
            )
            .with(
                Action::Brightness,
                VerbSpec::new("led_dimmer", PayloadRule::Requested),
            )
            .with(
                Action::Warmth,
                VerbSpec::new("led_temperature", PayloadRule::Requested),
            )
    }

    /// Adds or replaces the verb for `action`.
    #[must_use]
    pub fn with(mut self, action: Action, spec: VerbSpec) -> Self {
        self.verbs.insert(action, spec);
        self
    }

    /// Returns the verb registered for `action`.
    #[must_use]
    pub fn get(&self, action: Action) -> Option<&VerbSpec> {
        self.verbs.get(&action)
    }

    /// Builds the command for `action`.
    ///
    /// `device_type` only serves the error message.
    ///
    /// # Errors
    ///
    /// Returns [`DispatchError::UnsupportedAction`] if the table has no verb
    /// for the action, or [`DispatchError::MissingPayload`] if the verb needs
    /// a level and none was given.
    pub fn command(
        &self,
        action: Action,
        payload: Option<u32>,
        device_type: &str,
    ) -> Result<DeviceCommand, DispatchError> {
        let spec = self
            .get(action)
            .ok_or_else(|| DispatchError::UnsupportedAction {
                action: action.name(),
                device_type: device_type.to_string(),
            })?;

        let value = match spec.payload {
            PayloadRule::Fixed(value) => Some(value),
            PayloadRule::Requested => {
                Some(payload.ok_or(DispatchError::MissingPayload(action.name()))?)
            }
            PayloadRule::Empty => None,
        };
        Ok(DeviceCommand::new(spec.verb.clone(), value))
    }
}

/// Verb tables per command family, with per device type overrides.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct VerbTables {
    defaults: HashMap<CommandFamily, VerbTable>,
    overrides: HashMap<(CommandFamily, DeviceKind), VerbTable>,
}

impl VerbTables {
    /// Creates the built-in family defaults with no overrides.
    #[must_use]
    pub fn new() -> Self {
        let defaults = HashMap::from([(CommandFamily::OpenBkLight, VerbTable::openbk_light())]);
        Self {
            defaults,
            overrides: HashMap::new(),
        }
    }

    /// Registers the table used for devices of type `kind` in `family`.
    #[must_use]
    pub fn with_override(
        mut self,
        family: CommandFamily,
        kind: impl Into<DeviceKind>,
        table: VerbTable,
    ) -> Self {
        self.overrides.insert((family, kind.into()), table);
        self
    }

    /// Returns the table for a device type, falling back to the family default.
    #[must_use]
    pub fn resolve(&self, family: CommandFamily, kind: &DeviceKind) -> Option<&VerbTable> {
        self.overrides
            .get(&(family, kind.clone()))
            .or_else(|| self.defaults.get(&family))
    }

    /// Builds the command for `action` on a device of type `kind`.
    ///
    /// # Errors
    ///
    /// See [`VerbTable::command`].
    pub fn command(
        &self,
        family: CommandFamily,
        kind: &DeviceKind,
        action: Action,
        payload: Option<u32>,
    ) -> Result<DeviceCommand, DispatchError> {
        let table = self
            .resolve(family, kind)
            .ok_or_else(|| DispatchError::UnsupportedAction {
                action: action.name(),
                device_type: kind.to_string(),
            })?;
        table.command(action, payload, kind.as_str())
    }
}

impl Default for VerbTables {
    fn default() -> Self {
        Self::new()
    }
}
