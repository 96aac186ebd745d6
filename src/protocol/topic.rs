// SPDX-License-Identifier: MPL-2.0
// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Topic parsing and composition.

use crate::error::ParseError;

/// Maximum number of `/`-separated segments an inbound topic may have.
pub const MAX_TOPIC_DEPTH: usize = 3;

/// Prefix of state and status responses.
pub const RESPONSE_PREFIX: &str = "stat";

/// Prefix of outbound commands.
pub const COMMAND_PREFIX: &str = "cmnd";

/// Sub-topic announcing connectivity under a device's routing key.
pub const CONNECTED_SUBTOPIC: &str = "connected";

/// Payload of a connectivity announcement.
pub const ONLINE_PAYLOAD: &str = "online";

/// An inbound topic split into at most [`MAX_TOPIC_DEPTH`] borrowed segments.
///
/// # Examples
///
/// ```
/// use hearthlink::protocol::ParsedTopic;
///
/// let topic = ParsedTopic::parse("stat/officeLamp/RESULT").unwrap();
/// assert_eq!(topic.depth(), 3);
/// assert_eq!(topic.segment(1), Some("officeLamp"));
///
/// assert!(ParsedTopic::parse("a/b/c/d").is_err());
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ParsedTopic<'a> {
    segments: [&'a str; MAX_TOPIC_DEPTH],
    depth: usize,
}

impl<'a> ParsedTopic<'a> {
    /// Splits a topic on `/`.
    ///
    /// Splitting stops as soon as the topic is known to be too deep, so an
    /// arbitrarily long topic costs no more than a short one.
    ///
    /// # Errors
    ///
    /// Returns [`ParseError::TopicTooDeep`] if the topic has more than
    /// [`MAX_TOPIC_DEPTH`] segments.
    pub fn parse(topic: &'a str) -> Result<Self, ParseError> {
        let mut segments = [""; MAX_TOPIC_DEPTH];
        let mut depth = 0;

        for segment in topic.split('/') {
            let Some(slot) = segments.get_mut(depth) else {
                return Err(ParseError::TopicTooDeep {
                    topic: topic.to_string(),
                    max: MAX_TOPIC_DEPTH,
                });
            };
            *slot = segment;
            depth += 1;
        }

        Ok(Self { segments, depth })
    }

    /// Returns the number of segments.
    #[must_use]
    pub fn depth(&self) -> usize {
        self.depth
    }

    /// Returns segment `i`, if present.
    #[must_use]
    pub fn segment(&self, i: usize) -> Option<&'a str> {
        (i < self.depth).then(|| self.segments[i])
    }

    /// Returns the first segment.
    #[must_use]
    pub fn root(&self) -> &'a str {
        self.segments[0]
    }
}

/// Builds the topic a command is published on: `cmnd/<routing_key>/<verb>`.
///
/// # Examples
///
/// ```
/// use hearthlink::protocol::command_topic;
///
/// assert_eq!(command_topic("officeLamp", "led_dimmer"), "cmnd/officeLamp/led_dimmer");
/// ```
#[must_use]
pub fn command_topic(routing_key: &str, verb: &str) -> String {
    format!("{COMMAND_PREFIX}/{routing_key}/{verb}")
}
