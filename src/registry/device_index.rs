// SPDX-License-Identifier: MPL-2.0
// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Device index type.

use std::fmt;

use serde::Serialize;

/// Position of a device in the registry.
///
/// Indices are only handed out by a [`Registry`](super::Registry), so holding
/// one means the slot exists for the lifetime of that registry.
///
/// # Examples
///
/// ```
/// use hearthlink::registry::{Device, Registry};
///
/// let registry = Registry::new(vec![Device::new("officeLamp", "Office", "light", "rgb")]).unwrap();
/// let index = registry.index(0).unwrap();
/// assert_eq!(index.get(), 0);
/// assert!(registry.index(1).is_none());
/// ```
#[derive(Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
#[serde(transparent)]
pub struct DeviceIndex(usize);

impl DeviceIndex {
    pub(crate) fn new(index: usize) -> Self {
        Self(index)
    }

    /// Returns the raw position.
    #[must_use]
    pub fn get(self) -> usize {
        self.0
    }
}

impl fmt::Debug for DeviceIndex {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "DeviceIndex({})", self.0)
    }
}

impl fmt::Display for DeviceIndex {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

impl From<DeviceIndex> for usize {
    fn from(index: DeviceIndex) -> Self {
        index.0
    }
}
