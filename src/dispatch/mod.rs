// SPDX-License-Identifier: MPL-2.0
// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Outbound command dispatch.
//!
//! Producers post [`DispatchRequest`]s into a [`Mailbox`]; a single
//! [`CommandDispatcher`] task takes them out, formats them and publishes.
//!
//! The mailbox has depth one and coalesces: a request posted before the
//! dispatcher took the previous one replaces it, and producers never block.
//!
//! ```text
//!  producer ──post──▶ Mailbox ──recv──▶ CommandDispatcher ──publish──▶ bus
//!   (any task)        (1 slot)          (Idle/Armed/Dispatching)
//! ```

mod dispatcher;
mod mailbox;
mod request;

pub use dispatcher::{CommandDispatcher, DispatcherConfig, OutboundCommand};
pub use mailbox::Mailbox;
pub use request::DispatchRequest;
