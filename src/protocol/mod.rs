// SPDX-License-Identifier: MPL-2.0
// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Bus protocol: topic handling, inbound routing and the broker connection.
//!
//! - [`TopicRouter`]: turns inbound messages into device record updates
//! - [`MqttConnection`]: the single broker connection (feature `mqtt`)
//! - [`Publisher`]: the outbound seam used by the command dispatcher

#[cfg(feature = "mqtt")]
mod connection;
mod topic;
mod topic_router;

use std::future::Future;
use std::sync::Arc;

#[cfg(feature = "mqtt")]
pub use connection::{ConnectionConfig, MqttConnection, MqttConnectionBuilder, SUBSCRIBE_ALL};
pub use topic::{
    COMMAND_PREFIX, CONNECTED_SUBTOPIC, MAX_TOPIC_DEPTH, ONLINE_PAYLOAD, ParsedTopic,
    RESPONSE_PREFIX, command_topic,
};
pub use topic_router::{RouteOutcome, TopicRouter};

use crate::error::ProtocolError;

/// Sends a command payload on a topic.
///
/// Implemented by [`MqttConnection`]; tests and alternative transports
/// provide their own.
pub trait Publisher: Send + Sync + 'static {
    /// Publishes `payload` on `topic`.
    ///
    /// # Errors
    ///
    /// Returns [`ProtocolError`] if the message could not be handed to the
    /// transport.
    fn publish(
        &self,
        topic: &str,
        payload: &str,
    ) -> impl Future<Output = Result<(), ProtocolError>> + Send;
}

impl<P: Publisher> Publisher for Arc<P> {
    fn publish(
        &self,
        topic: &str,
        payload: &str,
    ) -> impl Future<Output = Result<(), ProtocolError>> + Send {
        (**self).publish(topic, payload)
    }
}
