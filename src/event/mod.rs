// SPDX-License-Identifier: MPL-2.0
// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Event system for device changes.
//!
//! The router publishes an event whenever it changes a device record, and the
//! dispatcher publishes one for every command it handles. A UI subscribes to
//! the [`EventBus`] to repaint on change rather than polling snapshots.

mod device_event;
mod event_bus;

pub use device_event::DeviceEvent;
pub use event_bus::EventBus;
