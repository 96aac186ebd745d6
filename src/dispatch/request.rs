// SPDX-License-Identifier: MPL-2.0
// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Outbound command requests.

use serde::Serialize;

use crate::command::{Action, CommandFamily};
use crate::registry::DeviceIndex;

/// A command intent waiting for the dispatcher.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct DispatchRequest {
    /// Target device.
    pub device: DeviceIndex,
    /// Vocabulary to use.
    pub family: CommandFamily,
    /// What to do.
    pub action: Action,
    /// Level for actions that take one.
    pub payload: Option<u32>,
}

impl DispatchRequest {
    /// Creates a request.
    #[must_use]
    pub fn new(
        device: DeviceIndex,
        family: CommandFamily,
        action: Action,
        payload: Option<u32>,
    ) -> Self {
        Self {
            device,
            family,
            action,
            payload,
        }
    }
}
