// SPDX-License-Identifier: MPL-2.0
// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Inbound message routing.
//!
//! The [`TopicRouter`] turns each `(topic, payload)` pair received on the bus
//! into at most one update of one device record.
//!
//! # Architecture
//!
//! ```text
//! MQTT Message: stat/officeLamp/RESULT → {"Uptime": ...}
//!                     ↓
//!             TopicRouter.route()
//!                     ↓
//!       Registry.lookup("officeLamp") → DeviceIndex
//!                     ↓
//!     StateSynchronizer.apply_state_response()
//!                     ↓
//!       EventBus.publish(StateReplaced)
//! ```

use std::sync::Arc;

use crate::event::{DeviceEvent, EventBus};
use crate::registry::{DeviceIndex, Registry};
use crate::state::StateSynchronizer;

use super::topic::{CONNECTED_SUBTOPIC, ONLINE_PAYLOAD, ParsedTopic, RESPONSE_PREFIX};

/// What the router did with a message.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RouteOutcome {
    /// A device announced itself online.
    Connectivity {
        /// The device.
        device: DeviceIndex,
        /// Whether the device was offline before.
        changed: bool,
    },

    /// A state response was handled.
    StateResponse {
        /// The device.
        device: DeviceIndex,
        /// `false` if the payload was rejected and the state cleared.
        applied: bool,
    },

    /// A status response was recorded.
    StatusResponse {
        /// The device.
        device: DeviceIndex,
    },

    /// The message is not addressed to anything the router handles.
    Ignored,

    /// The topic was malformed and the message dropped.
    Discarded,
}

impl RouteOutcome {
    /// Returns the device touched by the message, if any.
    #[must_use]
    pub fn device(&self) -> Option<DeviceIndex> {
        match self {
            Self::Connectivity { device, .. }
            | Self::StateResponse { device, .. }
            | Self::StatusResponse { device } => Some(*device),
            Self::Ignored | Self::Discarded => None,
        }
    }
}

/// Routes bus messages to device records.
///
/// Two topic shapes are recognized:
///
/// - `<name>/connected` with payload `online` marks the device online.
/// - `stat/<name>/RESULT` replaces the device state, `stat/<name>/STATUS`
///   records the raw payload for display.
///
/// A root segment naming a registered device takes precedence over the
/// `stat` prefix. Everything else is ignored.
#[derive(Debug, Clone)]
pub struct TopicRouter {
    registry: Arc<Registry>,
    synchronizer: StateSynchronizer,
    events: EventBus,
}

impl TopicRouter {
    /// Creates a router writing into `registry` and announcing on `events`.
    #[must_use]
    pub fn new(registry: Arc<Registry>, events: EventBus) -> Self {
        let synchronizer = StateSynchronizer::new(Arc::clone(&registry));
        Self {
            registry,
            synchronizer,
            events,
        }
    }

    /// Returns the registry this router writes into.
    #[must_use]
    pub fn registry(&self) -> &Arc<Registry> {
        &self.registry
    }

    /// Routes one message. Never panics on malformed input.
    pub fn route(&self, topic: &str, payload: &str) -> RouteOutcome {
        let parsed = match ParsedTopic::parse(topic) {
            Ok(parsed) => parsed,
            Err(e) => {
                tracing::warn!(error = %e, "Discarding message");
                return RouteOutcome::Discarded;
            }
        };

        if let Some(device) = self.registry.lookup(parsed.root()) {
            return self.route_device_topic(device, &parsed, payload);
        }

        if parsed.root() == RESPONSE_PREFIX
            && let Some(outcome) = self.route_response(&parsed, payload)
        {
            return outcome;
        }

        tracing::trace!(topic = %topic, "Ignoring message");
        RouteOutcome::Ignored
    }

    /// Handles `<name>/...` topics.
    fn route_device_topic(
        &self,
        device: DeviceIndex,
        parsed: &ParsedTopic<'_>,
        payload: &str,
    ) -> RouteOutcome {
        let is_announcement = parsed.depth() == 2
            && parsed.segment(1) == Some(CONNECTED_SUBTOPIC)
            && payload == ONLINE_PAYLOAD;
        if !is_announcement {
            tracing::trace!(%device, payload = %payload, "Ignoring device sub-topic");
            return RouteOutcome::Ignored;
        }

        let changed = self.registry.mark_online(device);
        tracing::debug!(%device, changed, "Device online");
        if changed {
            self.events.publish(DeviceEvent::ConnectivityChanged {
                device,
                online: true,
            });
        }
        RouteOutcome::Connectivity { device, changed }
    }

    /// Handles `stat/<name>/<kind>` topics. Returns `None` when the topic
    /// does not address a known device and kind.
    fn route_response(&self, parsed: &ParsedTopic<'_>, payload: &str) -> Option<RouteOutcome> {
        let device = self.registry.lookup(parsed.segment(1)?)?;

        match parsed.segment(2)? {
            "RESULT" => Some(self.apply_state(device, payload)),
            "STATUS" => {
                self.registry.record_status(device, payload);
                tracing::debug!(%device, payload = %payload, "Status response");
                self.events.publish(DeviceEvent::StatusReceived {
                    device,
                    payload: payload.to_string(),
                });
                Some(RouteOutcome::StatusResponse { device })
            }
            _ => None,
        }
    }

    fn apply_state(&self, device: DeviceIndex, payload: &str) -> RouteOutcome {
        match self.synchronizer.apply_state_response(payload, device) {
            Ok(()) => {
                tracing::debug!(%device, "State replaced");
                self.events.publish(DeviceEvent::StateReplaced { device });
                if self.registry.mark_online(device) {
                    self.events.publish(DeviceEvent::ConnectivityChanged {
                        device,
                        online: true,
                    });
                }
                RouteOutcome::StateResponse {
                    device,
                    applied: true,
                }
            }
            Err(e) => {
                tracing::warn!(%device, error = %e, "Rejected state response, state cleared");
                self.events.publish(DeviceEvent::StateCleared {
                    device,
                    reason: e.to_string(),
                });
                RouteOutcome::StateResponse {
                    device,
                    applied: false,
                }
            }
        }
    }
}
