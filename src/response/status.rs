// SPDX-License-Identifier: MPL-2.0
// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Status response handling (`stat/<device>/STATUS`).

use serde_json::Value;

/// A status response, kept for display only.
///
/// Status payloads are free-form. When the payload happens to be JSON the
/// common identification fields are exposed; otherwise only the raw text is
/// available. Nothing here feeds back into device state.
///
/// # Examples
///
/// ```
/// use hearthlink::response::StatusResponse;
///
/// let status = StatusResponse::new(r#"{"Status":{"DeviceName":"Office Lamp","Module":0}}"#);
/// assert_eq!(status.device_name(), Some("Office Lamp"));
///
/// let text = StatusResponse::new("rebooting");
/// assert_eq!(text.raw(), "rebooting");
/// assert!(text.json().is_none());
/// ```
#[derive(Debug, Clone, PartialEq)]
pub struct StatusResponse {
    raw: String,
    json: Option<Value>,
}

impl StatusResponse {
    /// Wraps a raw status payload.
    #[must_use]
    pub fn new(payload: impl Into<String>) -> Self {
        let raw = payload.into();
        let json = serde_json::from_str::<Value>(&raw)
            .ok()
            .filter(Value::is_object);
        Self { raw, json }
    }

    /// Returns the payload as received.
    #[must_use]
    pub fn raw(&self) -> &str {
        &self.raw
    }

    /// Returns the payload as a JSON object, if it was one.
    #[must_use]
    pub fn json(&self) -> Option<&Value> {
        self.json.as_ref()
    }

    /// Returns `Status.DeviceName`.
    #[must_use]
    pub fn device_name(&self) -> Option<&str> {
        self.json.as_ref()?.pointer("/Status/DeviceName")?.as_str()
    }

    /// Returns `StatusFWR.Version`.
    #[must_use]
    pub fn firmware_version(&self) -> Option<&str> {
        self.json.as_ref()?.pointer("/StatusFWR/Version")?.as_str()
    }

    /// Returns `StatusNET.IPAddress`.
    #[must_use]
    pub fn ip_address(&self) -> Option<&str> {
        self.json.as_ref()?.pointer("/StatusNET/IPAddress")?.as_str()
    }

    /// Returns `StatusNET.Hostname`.
    #[must_use]
    pub fn hostname(&self) -> Option<&str> {
        self.json.as_ref()?.pointer("/StatusNET/Hostname")?.as_str()
    }
}
