// SPDX-License-Identifier: MPL-2.0
// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Full-state response parsing (`stat/<device>/RESULT`).

use serde::Deserialize;
use serde_json::{Map, Value};

use crate::error::ParseError;

/// Top-level keys every state response must carry.
pub const REQUIRED_FIELDS: [&str; 8] = [
    "Uptime",
    "MqttCount",
    "Dimmer",
    "Color",
    "HSBColor",
    "Channel",
    "POWER",
    "Wifi",
];

/// Keys every `Wifi` object inside a state response must carry.
pub const WIFI_REQUIRED_FIELDS: [&str; 6] = ["SSId", "BSSId", "Channel", "Mode", "RSSI", "Signal"];

/// A device's full state as reported on `stat/<device>/RESULT`.
///
/// Every field is required. Unknown extra keys are ignored.
///
/// # Examples
///
/// ```
/// use hearthlink::response::StateResponse;
///
/// let json = r#"{"Uptime":"1T00:02:33","MqttCount":4,"Dimmer":50,"Color":"FFFFFF",
///     "HSBColor":"0,0,100","Channel":1,"POWER":"ON",
///     "Wifi":{"SSId":"home","BSSId":"AA:BB:CC","Channel":6,"Mode":"11n","RSSI":-55,"Signal":70}}"#;
/// let state = StateResponse::parse(json).unwrap();
/// assert_eq!(state.dimmer, 50);
/// assert_eq!(state.wifi.rssi, -55);
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct StateResponse {
    /// Uptime string, e.g. `1T00:02:33`.
    #[serde(rename = "Uptime")]
    pub uptime: String,

    /// Number of MQTT messages the device has handled.
    #[serde(rename = "MqttCount")]
    pub mqtt_count: i64,

    /// Dimmer level.
    #[serde(rename = "Dimmer")]
    pub dimmer: i32,

    /// Raw color string, e.g. `FFFFFF`.
    #[serde(rename = "Color")]
    pub color: String,

    /// HSB color as comma-separated string, e.g. `0,0,100`.
    #[serde(rename = "HSBColor")]
    pub hsb_color: String,

    /// Active channel.
    #[serde(rename = "Channel")]
    pub channel: i32,

    /// Power state string, e.g. `ON`.
    #[serde(rename = "POWER")]
    pub power: String,

    /// Wi-Fi link information.
    #[serde(rename = "Wifi")]
    pub wifi: WifiResponse,
}

/// Wi-Fi descriptors inside a state response.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct WifiResponse {
    /// SSID of the connected network.
    #[serde(rename = "SSId")]
    pub ssid: String,

    /// BSSID of the access point.
    #[serde(rename = "BSSId")]
    pub bssid: String,

    /// Wi-Fi channel.
    #[serde(rename = "Channel")]
    pub channel: i32,

    /// PHY mode, e.g. `11n`.
    #[serde(rename = "Mode")]
    pub mode: String,

    /// Received signal strength in dBm.
    #[serde(rename = "RSSI")]
    pub rssi: i32,

    /// Signal value as reported by the firmware.
    #[serde(rename = "Signal")]
    pub signal: i32,
}

impl StateResponse {
    /// Parses a raw payload, naming the first missing required field.
    ///
    /// # Errors
    ///
    /// Returns [`ParseError::Json`] if the payload is not JSON or a field has
    /// the wrong type, [`ParseError::MissingField`] if a required key is
    /// absent, and [`ParseError::InvalidValue`] if the payload or its `Wifi`
    /// member is not an object.
    pub fn parse(payload: &str) -> Result<Self, ParseError> {
        let value: Value = serde_json::from_str(payload)?;

        let root = value.as_object().ok_or_else(|| ParseError::InvalidValue {
            field: "payload".to_string(),
            message: "expected a JSON object".to_string(),
        })?;
        require_fields(root, &REQUIRED_FIELDS, "")?;

        let wifi = root
            .get("Wifi")
            .and_then(Value::as_object)
            .ok_or_else(|| ParseError::InvalidValue {
                field: "Wifi".to_string(),
                message: "expected a JSON object".to_string(),
            })?;
        require_fields(wifi, &WIFI_REQUIRED_FIELDS, "Wifi.")?;

        serde_json::from_value(value).map_err(Into::into)
    }
}

fn require_fields(
    object: &Map<String, Value>,
    fields: &[&str],
    prefix: &str,
) -> Result<(), ParseError> {
    match fields.iter().find(|field| !object.contains_key(**field)) {
        Some(missing) => Err(ParseError::MissingField(format!("{prefix}{missing}"))),
        None => Ok(()),
    }
}
