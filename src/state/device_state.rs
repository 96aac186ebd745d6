// SPDX-License-Identifier: MPL-2.0
// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Device state tracking.

use serde::Serialize;

use crate::response::StateResponse;

/// Last reported state of a device.
///
/// A `DeviceState` is either clean (every field at its zero/empty default) or
/// fully populated from a single [`StateResponse`]. There are no setters for
/// individual fields: the only way to change a populated state is to replace
/// it as a whole or [`clear`](Self::clear) it.
///
/// Values are kept exactly as they arrived on the wire. Derived presentation
/// values such as the Wi-Fi signal percentage live in
/// [`DeviceSnapshot`](crate::snapshot::DeviceSnapshot).
///
/// # Examples
///
/// ```
/// use hearthlink::response::StateResponse;
/// use hearthlink::state::DeviceState;
///
/// let mut state = DeviceState::new();
/// assert!(state.is_clean());
///
/// let json = r#"{"Uptime":"0T00:00:10","MqttCount":1,"Dimmer":20,"Color":"FF0000",
///     "HSBColor":"0,100,20","Channel":1,"POWER":"ON",
///     "Wifi":{"SSId":"home","BSSId":"AA","Channel":1,"Mode":"11n","RSSI":-60,"Signal":40}}"#;
/// state = DeviceState::from(StateResponse::parse(json).unwrap());
/// assert_eq!(state.dimmer(), 20);
/// assert_eq!(state.brightness(), 20);
///
/// state.clear();
/// assert!(state.is_clean());
/// ```
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct DeviceState {
    uptime: String,
    mqtt_count: i64,
    dimmer: i32,
    color: String,
    hsb_color: String,
    channel: i32,
    power: String,
    wifi: WifiState,
}

/// Wi-Fi descriptors of a device.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct WifiState {
    ssid: String,
    bssid: String,
    channel: i32,
    mode: String,
    rssi: i32,
    signal: i32,
}

impl DeviceState {
    /// Creates a clean device state.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Resets every field to its default.
    pub fn clear(&mut self) {
        *self = Self::default();
    }

    /// Returns `true` if no state has been recorded.
    #[must_use]
    pub fn is_clean(&self) -> bool {
        *self == Self::default()
    }

    /// Returns the uptime string (e.g. `1T00:02:33`).
    #[must_use]
    pub fn uptime(&self) -> &str {
        &self.uptime
    }

    /// Returns the device's MQTT message counter.
    #[must_use]
    pub fn mqtt_count(&self) -> i64 {
        self.mqtt_count
    }

    /// Returns the dimmer level.
    #[must_use]
    pub fn dimmer(&self) -> i32 {
        self.dimmer
    }

    /// Returns the brightness, which mirrors the dimmer level.
    #[must_use]
    pub fn brightness(&self) -> i32 {
        self.dimmer
    }

    /// Returns the raw color string.
    #[must_use]
    pub fn color(&self) -> &str {
        &self.color
    }

    /// Returns the HSB color string.
    #[must_use]
    pub fn hsb_color(&self) -> &str {
        &self.hsb_color
    }

    /// Returns the active channel.
    #[must_use]
    pub fn channel(&self) -> i32 {
        self.channel
    }

    /// Returns the power string (e.g. `ON`).
    #[must_use]
    pub fn power(&self) -> &str {
        &self.power
    }

    /// Returns the Wi-Fi descriptors.
    #[must_use]
    pub fn wifi(&self) -> &WifiState {
        &self.wifi
    }

    pub(crate) fn redact_wifi(&mut self) {
        if !self.wifi.ssid.is_empty() {
            self.wifi.ssid = REDACTED.to_string();
        }
        if !self.wifi.bssid.is_empty() {
            self.wifi.bssid = REDACTED.to_string();
        }
    }
}

const REDACTED: &str = "<redacted>";

impl WifiState {
    /// Returns the SSID.
    #[must_use]
    pub fn ssid(&self) -> &str {
        &self.ssid
    }

    /// Returns the BSSID.
    #[must_use]
    pub fn bssid(&self) -> &str {
        &self.bssid
    }

    /// Returns the Wi-Fi channel.
    #[must_use]
    pub fn channel(&self) -> i32 {
        self.channel
    }

    /// Returns the PHY mode.
    #[must_use]
    pub fn mode(&self) -> &str {
        &self.mode
    }

    /// Returns the RSSI in dBm.
    #[must_use]
    pub fn rssi(&self) -> i32 {
        self.rssi
    }

    /// Returns the signal value reported by the firmware.
    #[must_use]
    pub fn signal(&self) -> i32 {
        self.signal
    }
}

impl From<StateResponse> for DeviceState {
    fn from(response: StateResponse) -> Self {
        Self {
            uptime: response.uptime,
            mqtt_count: response.mqtt_count,
            dimmer: response.dimmer,
            color: response.color,
            hsb_color: response.hsb_color,
            channel: response.channel,
            power: response.power,
            wifi: WifiState {
                ssid: response.wifi.ssid,
                bssid: response.wifi.bssid,
                channel: response.wifi.channel,
                mode: response.wifi.mode,
                rssi: response.wifi.rssi,
                signal: response.wifi.signal,
            },
        }
    }
}
