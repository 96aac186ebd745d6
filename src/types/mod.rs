// SPDX-License-Identifier: MPL-2.0
// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Value conversions used at the presentation boundary.
//!
//! - [`parse_uptime`] turns the wire uptime string into a [`Duration`](std::time::Duration)
//! - [`signal_percent`] maps an RSSI reading onto a 0-100 scale

mod signal;
mod uptime;

pub use signal::{RSSI_MAX, RSSI_MIN, signal_percent};
pub use uptime::parse_uptime;
