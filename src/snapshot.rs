// SPDX-License-Identifier: MPL-2.0
// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Read-only device views for presentation layers.

use std::time::Duration;

use chrono::{DateTime, Utc};
use serde::Serialize;

use crate::registry::{Device, DeviceIndex, DeviceRecord};
use crate::response::StatusResponse;
use crate::state::DeviceState;
use crate::types::{parse_uptime, signal_percent};

/// A copy of one device's identity and record at a point in time.
///
/// Snapshots are detached from the registry: holding one never blocks the
/// router, and later updates are not reflected in it.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DeviceSnapshot {
    /// Registry position.
    pub index: DeviceIndex,
    /// Identity from the roster.
    pub device: Device,
    /// Last reported state (clean if none or if the last update failed).
    pub state: DeviceState,
    /// Whether the device has ever reported online.
    pub online: bool,
    /// When `state` was last replaced.
    pub updated_at: Option<DateTime<Utc>>,
    /// Last raw status payload.
    pub last_status: Option<String>,
}

impl DeviceSnapshot {
    pub(crate) fn new(index: DeviceIndex, device: Device, record: DeviceRecord) -> Self {
        Self {
            index,
            device,
            state: record.state,
            online: record.online,
            updated_at: record.updated_at,
            last_status: record.last_status,
        }
    }

    /// Returns the Wi-Fi signal strength as a 0-100 percentage.
    ///
    /// Returns `None` while the state is clean.
    #[must_use]
    pub fn wifi_signal_percent(&self) -> Option<u8> {
        (!self.state.is_clean()).then(|| signal_percent(self.state.wifi().rssi()))
    }

    /// Returns the reported uptime, if there is one and it parses.
    #[must_use]
    pub fn uptime(&self) -> Option<Duration> {
        parse_uptime(self.state.uptime()).ok()
    }

    /// Returns the last status payload, parsed for display.
    #[must_use]
    pub fn status(&self) -> Option<StatusResponse> {
        self.last_status.as_deref().map(StatusResponse::new)
    }

    /// Returns a copy with network identifiers hidden.
    #[must_use]
    pub fn redacted(mut self) -> Self {
        self.state.redact_wifi();
        self
    }
}
