// SPDX-License-Identifier: MPL-2.0
// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Parsing of device response payloads.
//!
//! Devices answer on two `stat/` subtopics: `RESULT` carries the full device
//! state as a JSON object with a fixed schema, `STATUS` carries free-form
//! diagnostics that are only ever displayed.

mod state;
mod status;

pub use state::{REQUIRED_FIELDS, StateResponse, WIFI_REQUIRED_FIELDS, WifiResponse};
pub use status::StatusResponse;
