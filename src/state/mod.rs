// SPDX-License-Identifier: MPL-2.0
// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Device state and its synchronization.
//!
//! [`DeviceState`] is the last full state a device reported. The
//! [`StateSynchronizer`] is the only writer: it replaces a state wholesale
//! from a state response, or clears it when the response is unusable.

mod device_state;
mod synchronizer;

pub use device_state::{DeviceState, WifiState};
pub use synchronizer::StateSynchronizer;
