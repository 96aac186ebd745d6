// SPDX-License-Identifier: MPL-2.0
// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Wi-Fi signal strength conversion.

/// RSSI (dBm) mapped to 0 %.
pub const RSSI_MIN: i32 = -90;

/// RSSI (dBm) mapped to 100 %.
pub const RSSI_MAX: i32 = -30;

/// Converts an RSSI reading into a 0-100 signal percentage.
///
/// The scale is linear between [`RSSI_MIN`] and [`RSSI_MAX`]; readings
/// outside that window clamp to the ends. Fractions are truncated.
///
/// # Examples
///
/// ```
/// use hearthlink::types::signal_percent;
///
/// assert_eq!(signal_percent(-55), 58);
/// assert_eq!(signal_percent(-30), 100);
/// assert_eq!(signal_percent(-95), 0);
/// ```
#[must_use]
pub fn signal_percent(rssi: i32) -> u8 {
    let clamped = rssi.clamp(RSSI_MIN, RSSI_MAX);
    let percent = 100 * (clamped - RSSI_MIN) / (RSSI_MAX - RSSI_MIN);
    // Clamped input keeps this within 0..=100.
    u8::try_from(percent).unwrap_or(100)
}
