// SPDX-License-Identifier: MPL-2.0
// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Device identity as declared in the roster.

use std::fmt;

use serde::{Deserialize, Serialize};

/// Declared type of a device.
///
/// Types the controller knows how to drive get their own variant; anything
/// else is kept verbatim so the roster round-trips and verb tables can still
/// be registered for it.
///
/// # Examples
///
/// ```
/// use hearthlink::registry::DeviceKind;
///
/// assert_eq!(DeviceKind::from("light"), DeviceKind::Light);
/// assert_eq!(DeviceKind::from("powermon"), DeviceKind::PowerMonitor);
/// assert_eq!(DeviceKind::from("fan").as_str(), "fan");
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum DeviceKind {
    /// A dimmable light (`light`).
    Light,
    /// A power monitoring plug (`powermon`).
    PowerMonitor,
    /// Any other declared type.
    Other(String),
}

impl DeviceKind {
    /// Returns the roster spelling of this type.
    #[must_use]
    pub fn as_str(&self) -> &str {
        match self {
            Self::Light => "light",
            Self::PowerMonitor => "powermon",
            Self::Other(s) => s,
        }
    }
}

impl From<&str> for DeviceKind {
    fn from(s: &str) -> Self {
        match s {
            "light" => Self::Light,
            "powermon" => Self::PowerMonitor,
            other => Self::Other(other.to_string()),
        }
    }
}

impl From<String> for DeviceKind {
    fn from(s: String) -> Self {
        match s.as_str() {
            "light" => Self::Light,
            "powermon" => Self::PowerMonitor,
            _ => Self::Other(s),
        }
    }
}

impl From<DeviceKind> for String {
    fn from(kind: DeviceKind) -> Self {
        match kind {
            DeviceKind::Other(s) => s,
            known => known.as_str().to_string(),
        }
    }
}

impl fmt::Display for DeviceKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A device identity from the roster.
///
/// The `name` is the routing key: it appears as a topic segment in every
/// message to and from the device and must be unique across the roster.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Device {
    /// Control mode, opaque to the controller.
    mode: String,
    /// Human readable name.
    #[serde(rename = "prettyName")]
    pretty_name: String,
    /// Routing key.
    name: String,
    /// Declared type.
    #[serde(rename = "type")]
    kind: DeviceKind,
}

impl Device {
    /// Creates a device identity.
    #[must_use]
    pub fn new(
        name: impl Into<String>,
        pretty_name: impl Into<String>,
        kind: impl Into<DeviceKind>,
        mode: impl Into<String>,
    ) -> Self {
        Self {
            mode: mode.into(),
            pretty_name: pretty_name.into(),
            name: name.into(),
            kind: kind.into(),
        }
    }

    /// Returns the routing key.
    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Returns the display name.
    #[must_use]
    pub fn pretty_name(&self) -> &str {
        &self.pretty_name
    }

    /// Returns the declared type.
    #[must_use]
    pub fn kind(&self) -> &DeviceKind {
        &self.kind
    }

    /// Returns the declared control mode.
    #[must_use]
    pub fn mode(&self) -> &str {
        &self.mode
    }
}
