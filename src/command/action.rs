// SPDX-License-Identifier: MPL-2.0
// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Command families and the actions they offer.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::ParseError;

/// A firmware family that shares one command vocabulary.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CommandFamily {
    /// OpenBK firmware driving a light.
    OpenBkLight,
}

impl CommandFamily {
    /// Returns the family name.
    #[must_use]
    pub const fn name(self) -> &'static str {
        match self {
            Self::OpenBkLight => "openbk_light",
        }
    }
}

impl fmt::Display for CommandFamily {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// What a command should make the device do.
///
/// # Examples
///
/// ```
/// use hearthlink::command::Action;
///
/// let action: Action = "brightness".parse().unwrap();
/// assert_eq!(action, Action::Brightness);
/// assert!(action.requires_payload());
/// assert!(!Action::PowerOn.requires_payload());
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Action {
    /// Switch the device on.
    PowerOn,
    /// Switch the device off.
    PowerOff,
    /// Set the brightness level.
    Brightness,
    /// Set the white color temperature.
    Warmth,
}

impl Action {
    /// All actions, in declaration order.
    pub const ALL: [Self; 4] = [Self::PowerOn, Self::PowerOff, Self::Brightness, Self::Warmth];

    /// Returns the action name.
    #[must_use]
    pub const fn name(self) -> &'static str {
        match self {
            Self::PowerOn => "power_on",
            Self::PowerOff => "power_off",
            Self::Brightness => "brightness",
            Self::Warmth => "warmth",
        }
    }

    /// Returns `true` if the action carries a level chosen by the caller.
    #[must_use]
    pub const fn requires_payload(self) -> bool {
        matches!(self, Self::Brightness | Self::Warmth)
    }
}

impl fmt::Display for Action {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for Action {
    type Err = ParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "on" | "power_on" => Ok(Self::PowerOn),
            "off" | "power_off" => Ok(Self::PowerOff),
            "brightness" | "dimmer" => Ok(Self::Brightness),
            "warmth" | "temperature" | "ct" => Ok(Self::Warmth),
            _ => Err(ParseError::InvalidValue {
                field: "action".to_string(),
                message: format!("unknown action '{s}'"),
            }),
        }
    }
}
