// SPDX-License-Identifier: MPL-2.0
// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Applies state responses to device records.

use std::sync::Arc;

use chrono::Utc;

use crate::error::ParseError;
use crate::registry::{DeviceIndex, Registry};
use crate::response::StateResponse;

use super::DeviceState;

/// Writes parsed state responses into the registry.
///
/// Each update clears the target state first and only then writes the new
/// one, all under the record's write lock: readers see either the previous
/// state, the new state, or (after a failed update) a clean state.
#[derive(Debug, Clone)]
pub struct StateSynchronizer {
    registry: Arc<Registry>,
}

impl StateSynchronizer {
    /// Creates a synchronizer writing into `registry`.
    #[must_use]
    pub fn new(registry: Arc<Registry>) -> Self {
        Self { registry }
    }

    /// Replaces a device's state with the one carried by `payload`.
    ///
    /// On failure the device's state is left clean; the update is not
    /// retried.
    ///
    /// # Errors
    ///
    /// Returns [`ParseError`] if the payload is not a complete state response,
    /// or [`ParseError::InvalidValue`] if `index` does not belong to this
    /// registry.
    pub fn apply_state_response(&self, payload: &str, index: DeviceIndex) -> Result<(), ParseError> {
        let parsed = StateResponse::parse(payload);

        let mut record = self
            .registry
            .write(index)
            .ok_or_else(|| ParseError::InvalidValue {
                field: "device".to_string(),
                message: format!("no device at {index}"),
            })?;

        record.state.clear();
        record.updated_at = None;

        let response = parsed?;
        record.state = DeviceState::from(response);
        record.updated_at = Some(Utc::now());
        Ok(())
    }
}
