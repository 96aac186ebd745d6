// SPDX-License-Identifier: MPL-2.0
// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Uptime string parsing.
//!
//! Devices report uptime as `<days>T<HH>:<MM>:<SS>`, e.g. `1T00:02:33`. Some
//! firmware builds write the day count with a trailing `d`.

use std::time::Duration;

use crate::error::ParseError;

/// Parses a device uptime string into a [`Duration`].
///
/// # Examples
///
/// ```
/// use std::time::Duration;
/// use hearthlink::types::parse_uptime;
///
/// assert_eq!(parse_uptime("1T00:02:33").unwrap(), Duration::from_secs(86_553));
/// assert_eq!(parse_uptime("3dT12:00:00").unwrap(), Duration::from_secs(302_400));
/// ```
///
/// # Errors
///
/// Returns [`ParseError::InvalidValue`] if the `T` separator is missing, a
/// component is not a number, the clock part is not `HH:MM:SS`, a clock
/// component is out of range, or the day count overflows.
pub fn parse_uptime(s: &str) -> Result<Duration, ParseError> {
    let s = s.trim();
    let (days, clock) = s
        .split_once('T')
        .ok_or_else(|| invalid(format!("missing 'T' separator in '{s}'")))?;

    let days = number("days", days.trim_end_matches('d'))?;

    let mut parts = clock.split(':');
    let (Some(h), Some(m), Some(sec), None) = (parts.next(), parts.next(), parts.next(), parts.next())
    else {
        return Err(invalid(format!("expected HH:MM:SS, got '{clock}'")));
    };

    let hours = bounded("hours", h, 23)?;
    let minutes = bounded("minutes", m, 59)?;
    let seconds = bounded("seconds", sec, 59)?;

    days.checked_mul(86_400)
        .and_then(|secs| secs.checked_add(hours * 3_600 + minutes * 60 + seconds))
        .map(Duration::from_secs)
        .ok_or_else(|| invalid(format!("day count {days} is too large")))
}

fn number(what: &str, s: &str) -> Result<u64, ParseError> {
    s.parse()
        .map_err(|_| invalid(format!("invalid {what}: '{s}'")))
}

fn bounded(what: &str, s: &str, max: u64) -> Result<u64, ParseError> {
    let value = number(what, s)?;
    if value > max {
        return Err(invalid(format!("{what} must be 0-{max}, got {value}")));
    }
    Ok(value)
}

fn invalid(message: String) -> ParseError {
    ParseError::InvalidValue {
        field: "uptime".to_string(),
        message,
    }
}
