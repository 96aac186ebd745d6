// SPDX-License-Identifier: MPL-2.0
// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Device event types.

use serde::Serialize;

use crate::registry::DeviceIndex;

/// Events emitted by the router and the dispatcher.
///
/// Presentation layers subscribe to these to know when to refresh a
/// snapshot. Events describe what happened; the registry remains the source
/// of truth for the current state.
///
/// # Examples
///
/// ```
/// use hearthlink::event::DeviceEvent;
/// use hearthlink::registry::{Device, Registry};
///
/// let registry = Registry::new(vec![Device::new("lamp", "Lamp", "light", "rgb")]).unwrap();
/// let device = registry.index(0).unwrap();
///
/// let event = DeviceEvent::ConnectivityChanged { device, online: true };
/// assert_eq!(event.device(), device);
/// assert!(event.is_inbound());
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum DeviceEvent {
    /// The device reported (or implied) a connectivity change.
    ConnectivityChanged {
        /// The device.
        device: DeviceIndex,
        /// New connectivity flag.
        online: bool,
    },

    /// A state response replaced the device's state.
    StateReplaced {
        /// The device.
        device: DeviceIndex,
    },

    /// A state response failed to parse and the device's state was cleared.
    StateCleared {
        /// The device.
        device: DeviceIndex,
        /// Why the update was rejected.
        reason: String,
    },

    /// A status payload arrived.
    StatusReceived {
        /// The device.
        device: DeviceIndex,
        /// The payload as received.
        payload: String,
    },

    /// A command was published to the bus.
    CommandDispatched {
        /// The target device.
        device: DeviceIndex,
        /// Topic it was published on.
        topic: String,
        /// Payload that was sent.
        payload: String,
    },

    /// A command could not be built or published.
    CommandFailed {
        /// The target device.
        device: DeviceIndex,
        /// Description of the failure.
        error: String,
    },
}

impl DeviceEvent {
    /// Returns the device this event concerns.
    #[must_use]
    pub fn device(&self) -> DeviceIndex {
        match self {
            Self::ConnectivityChanged { device, .. }
            | Self::StateReplaced { device }
            | Self::StateCleared { device, .. }
            | Self::StatusReceived { device, .. }
            | Self::CommandDispatched { device, .. }
            | Self::CommandFailed { device, .. } => *device,
        }
    }

    /// Returns `true` for events raised by inbound bus traffic.
    #[must_use]
    pub fn is_inbound(&self) -> bool {
        matches!(
            self,
            Self::ConnectivityChanged { .. }
                | Self::StateReplaced { .. }
                | Self::StateCleared { .. }
                | Self::StatusReceived { .. }
        )
    }

    /// Returns `true` for events raised by the command dispatcher.
    #[must_use]
    pub fn is_command(&self) -> bool {
        matches!(
            self,
            Self::CommandDispatched { .. } | Self::CommandFailed { .. }
        )
    }
}
