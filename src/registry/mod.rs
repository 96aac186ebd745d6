// SPDX-License-Identifier: MPL-2.0
// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Device registry.
//!
//! The [`Registry`] owns the device roster and one mutable record per device.
//! The roster is fixed at construction; records are written by the topic
//! router (single writer) and read through [`DeviceSnapshot`]s by any number
//! of readers.
//!
//! # Examples
//!
//! ```
//! use hearthlink::registry::{Device, Registry};
//!
//! let registry = Registry::new(vec![
//!     Device::new("officeLamp", "Office Lamp", "light", "rgbcw"),
//!     Device::new("fridgePlug", "Fridge", "powermon", "plug"),
//! ])
//! .unwrap();
//!
//! let lamp = registry.lookup("officeLamp").unwrap();
//! assert_eq!(lamp.get(), 0);
//! assert!(!registry.is_online(lamp));
//! ```

mod device;
mod device_index;

use std::collections::HashMap;

use chrono::{DateTime, Utc};
use parking_lot::{RwLock, RwLockWriteGuard};

pub use device::{Device, DeviceKind};
pub use device_index::DeviceIndex;

use crate::error::ConfigError;
use crate::snapshot::DeviceSnapshot;
use crate::state::DeviceState;

/// Maximum number of devices a roster may declare.
pub const MAX_DEVICES: usize = 8;

/// Mutable record kept for each device.
#[derive(Debug, Clone, Default)]
pub(crate) struct DeviceRecord {
    /// Last reported state, clean if none or if the last update failed.
    pub state: DeviceState,
    /// Whether the device has ever reported online.
    pub online: bool,
    /// When `state` was last replaced.
    pub updated_at: Option<DateTime<Utc>>,
    /// Last raw `STATUS` payload.
    pub last_status: Option<String>,
}

/// Roster of devices plus their live records.
#[derive(Debug)]
pub struct Registry {
    devices: Vec<Device>,
    records: Vec<RwLock<DeviceRecord>>,
    by_name: HashMap<String, DeviceIndex>,
}

impl Registry {
    /// Builds a registry from a roster.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError`] if the roster is larger than [`MAX_DEVICES`],
    /// contains an empty or unroutable name, or repeats a name.
    pub fn new(devices: Vec<Device>) -> Result<Self, ConfigError> {
        validate_roster(&devices)?;

        let by_name = devices
            .iter()
            .enumerate()
            .map(|(i, device)| (device.name().to_string(), DeviceIndex::new(i)))
            .collect();
        let records = devices
            .iter()
            .map(|_| RwLock::new(DeviceRecord::default()))
            .collect();

        Ok(Self {
            devices,
            records,
            by_name,
        })
    }

    /// Returns the number of registered devices.
    #[must_use]
    pub fn len(&self) -> usize {
        self.devices.len()
    }

    /// Returns `true` if the roster is empty.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.devices.is_empty()
    }

    /// Validates a raw position.
    #[must_use]
    pub fn index(&self, raw: usize) -> Option<DeviceIndex> {
        (raw < self.devices.len()).then(|| DeviceIndex::new(raw))
    }

    /// Finds a device by routing key.
    #[must_use]
    pub fn lookup(&self, name: &str) -> Option<DeviceIndex> {
        self.by_name.get(name).copied()
    }

    /// Returns the identity of a device.
    #[must_use]
    pub fn device(&self, index: DeviceIndex) -> Option<&Device> {
        self.devices.get(index.get())
    }

    /// Iterates over the roster in declaration order.
    pub fn devices(&self) -> impl Iterator<Item = (DeviceIndex, &Device)> {
        self.devices
            .iter()
            .enumerate()
            .map(|(i, device)| (DeviceIndex::new(i), device))
    }

    /// Returns whether the device has ever reported online.
    #[must_use]
    pub fn is_online(&self, index: DeviceIndex) -> bool {
        self.records
            .get(index.get())
            .is_some_and(|record| record.read().online)
    }

    /// Returns a copy of a device's identity and current record.
    #[must_use]
    pub fn snapshot(&self, index: DeviceIndex) -> Option<DeviceSnapshot> {
        let device = self.devices.get(index.get())?;
        let record = self.records.get(index.get())?.read().clone();
        Some(DeviceSnapshot::new(index, device.clone(), record))
    }

    /// Returns snapshots of every device in roster order.
    #[must_use]
    pub fn snapshots(&self) -> Vec<DeviceSnapshot> {
        self.devices()
            .filter_map(|(index, _)| self.snapshot(index))
            .collect()
    }

    /// Marks a device online. Returns `true` if it was not online before.
    pub(crate) fn mark_online(&self, index: DeviceIndex) -> bool {
        let Some(mut record) = self.write(index) else {
            return false;
        };
        !std::mem::replace(&mut record.online, true)
    }

    /// Stores the last raw status payload of a device.
    pub(crate) fn record_status(&self, index: DeviceIndex, payload: &str) {
        if let Some(mut record) = self.write(index) {
            record.last_status = Some(payload.to_string());
        }
    }

    /// Locks a device record for writing.
    pub(crate) fn write(&self, index: DeviceIndex) -> Option<RwLockWriteGuard<'_, DeviceRecord>> {
        self.records.get(index.get()).map(RwLock::write)
    }
}

/// Checks a roster before it is turned into a registry.
pub(crate) fn validate_roster(devices: &[Device]) -> Result<(), ConfigError> {
    if devices.len() > MAX_DEVICES {
        return Err(ConfigError::TooManyDevices {
            count: devices.len(),
            max: MAX_DEVICES,
        });
    }

    let mut seen = std::collections::HashSet::new();
    for (i, device) in devices.iter().enumerate() {
        let name = device.name();
        if name.is_empty() {
            return Err(ConfigError::EmptyField {
                owner: format!("devices[{i}]"),
                field: "name",
            });
        }
        // Routing keys are single topic segments.
        if name.contains(['/', '+', '#']) {
            return Err(ConfigError::InvalidValue {
                field: "name",
                message: format!("'{name}' must not contain '/', '+' or '#'"),
            });
        }
        if !seen.insert(name) {
            return Err(ConfigError::DuplicateDevice(name.to_string()));
        }
    }
    Ok(())
}
