// SPDX-License-Identifier: MPL-2.0
// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Controller configuration.
//!
//! The configuration is a JSON document with a broker section and the device
//! roster:
//!
//! ```json
//! {
//!   "mqtt": {
//!     "broker": "192.168.1.20",
//!     "port": "1883",
//!     "clientName": "hearthlink",
//!     "username": "home",
//!     "password": "secret"
//!   },
//!   "devices": [
//!     { "mode": "rgbcw", "prettyName": "Office Lamp", "name": "officeLamp", "type": "light" }
//!   ]
//! }
//! ```
//!
//! `port` may be written as a string or a number. An optional top-level
//! `redact` flag hides network identifiers from snapshots.

use std::fmt;
use std::path::Path;

use serde::{Deserialize, Deserializer, Serialize};

use crate::error::ConfigError;
use crate::registry::{Device, validate_roster};

/// Default configuration file name.
pub const DEFAULT_CONFIG_FILE: &str = "config.json";

/// Top-level controller configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct ControllerConfig {
    /// Broker connection settings.
    pub mqtt: BrokerSettings,
    /// Device roster in declaration order.
    pub devices: Vec<Device>,
    /// Hide SSID and BSSID from snapshots.
    #[serde(default)]
    pub redact: bool,
}

impl ControllerConfig {
    /// Reads and validates a configuration file.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::Io`] if the file cannot be read, and any error
    /// of [`ControllerConfig::from_json_str`].
    pub fn load(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        let text = std::fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.display().to_string(),
            source,
        })?;
        let config = Self::from_json_str(&text)?;
        tracing::debug!(
            path = %path.display(),
            devices = config.devices.len(),
            "Loaded configuration"
        );
        Ok(config)
    }

    /// Parses and validates a configuration document.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::Json`] for malformed JSON or missing fields, and
    /// any error of [`ControllerConfig::validate`].
    pub fn from_json_str(text: &str) -> Result<Self, ConfigError> {
        let config: Self = serde_json::from_str(text)?;
        config.validate()?;
        Ok(config)
    }

    /// Checks values that deserialization alone cannot.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError`] if the broker address or client name is empty,
    /// or if the roster is invalid.
    pub fn validate(&self) -> Result<(), ConfigError> {
        self.mqtt.validate()?;
        validate_roster(&self.devices)
    }
}

/// Broker section of the configuration.
#[derive(Clone, Deserialize, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct BrokerSettings {
    /// Broker host name or address.
    pub broker: String,
    /// Broker TCP port.
    #[serde(deserialize_with = "deserialize_port")]
    pub port: u16,
    /// MQTT client identifier.
    pub client_name: String,
    /// User name; empty for anonymous access.
    pub username: String,
    /// Password.
    pub password: String,
}

impl BrokerSettings {
    /// Returns the credentials, or `None` for anonymous access.
    #[must_use]
    pub fn credentials(&self) -> Option<(&str, &str)> {
        (!self.username.is_empty()).then(|| (self.username.as_str(), self.password.as_str()))
    }

    fn validate(&self) -> Result<(), ConfigError> {
        for (field, value) in [("broker", &self.broker), ("clientName", &self.client_name)] {
            if value.trim().is_empty() {
                return Err(ConfigError::EmptyField {
                    owner: "mqtt".to_string(),
                    field,
                });
            }
        }
        if self.port == 0 {
            return Err(ConfigError::InvalidValue {
                field: "port",
                message: "must not be 0".to_string(),
            });
        }
        Ok(())
    }
}

impl fmt::Debug for BrokerSettings {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("BrokerSettings")
            .field("broker", &self.broker)
            .field("port", &self.port)
            .field("client_name", &self.client_name)
            .field("username", &self.username)
            .field("password", &"***")
            .finish()
    }
}

fn deserialize_port<'de, D>(deserializer: D) -> Result<u16, D::Error>
where
    D: Deserializer<'de>,
{
    #[derive(Deserialize)]
    #[serde(untagged)]
    enum Port {
        Number(u16),
        Text(String),
    }

    match Port::deserialize(deserializer)? {
        Port::Number(port) => Ok(port),
        Port::Text(text) => text
            .trim()
            .parse()
            .map_err(|_| serde::de::Error::custom(format!("invalid port '{text}'"))),
    }
}
