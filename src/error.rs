// SPDX-License-Identifier: MPL-2.0
// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Error types for the `hearthlink` library.
//!
//! Failures fall into four families: configuration (fatal at startup),
//! protocol (transport problems, reported and not retried), parse (a single
//! malformed message, discarded) and dispatch (a command request that cannot
//! be honoured).

use thiserror::Error;

/// The main error type for this library.
#[derive(Debug, Error)]
pub enum Error {
    /// The configuration or device roster is invalid.
    #[error("configuration error: {0}")]
    Config(#[from] ConfigError),

    /// Error occurred during protocol communication.
    #[error("protocol error: {0}")]
    Protocol(#[from] ProtocolError),

    /// Error occurred while parsing an inbound message.
    #[error("parse error: {0}")]
    Parse(#[from] ParseError),

    /// A command request could not be accepted or dispatched.
    #[error("dispatch error: {0}")]
    Dispatch(#[from] DispatchError),
}

/// Errors raised while loading the configuration file or validating the roster.
#[derive(Debug, Error)]
pub enum ConfigError {
    /// The configuration file could not be read.
    #[error("cannot read {path}: {source}")]
    Io {
        /// Path of the file that failed to load.
        path: String,
        /// Underlying I/O error.
        #[source]
        source: std::io::Error,
    },

    /// The configuration is not valid JSON or lacks a required field.
    #[error("invalid configuration: {0}")]
    Json(#[from] serde_json::Error),

    /// More devices were declared than the controller supports.
    #[error("device count {count} exceeds the maximum of {max}")]
    TooManyDevices {
        /// Number of devices declared.
        count: usize,
        /// Maximum allowed.
        max: usize,
    },

    /// Two devices share the same routing key.
    #[error("duplicate device name: {0}")]
    DuplicateDevice(String),

    /// A required field is present but empty.
    #[error("field '{field}' of {owner} must not be empty")]
    EmptyField {
        /// The owning section (e.g. `mqtt` or `devices[2]`).
        owner: String,
        /// The empty field.
        field: &'static str,
    },

    /// A field holds a value of the right type but an unusable content.
    #[error("invalid value for '{field}': {message}")]
    InvalidValue {
        /// The offending field.
        field: &'static str,
        /// Description of the problem.
        message: String,
    },
}

/// Errors related to MQTT communication.
#[derive(Debug, Error)]
pub enum ProtocolError {
    /// MQTT client request failed.
    #[cfg(feature = "mqtt")]
    #[error("MQTT error: {0}")]
    Mqtt(#[from] rumqttc::ClientError),

    /// Connection to the broker failed.
    #[error("connection failed: {0}")]
    ConnectionFailed(String),

    /// Request timed out.
    #[error("request timed out after {0} ms")]
    Timeout(u64),

    /// Invalid broker address.
    #[error("invalid address: {0}")]
    InvalidAddress(String),

    /// Internal channel was closed.
    #[error("channel closed: {0}")]
    ChannelClosed(String),
}

/// Errors related to parsing inbound topics and payloads.
#[derive(Debug, Error)]
pub enum ParseError {
    /// JSON parsing failed.
    #[error("JSON parse error: {0}")]
    Json(#[from] serde_json::Error),

    /// Expected field is missing from the payload.
    #[error("missing field in payload: {0}")]
    MissingField(String),

    /// The topic has more `/` separated segments than the router accepts.
    #[error("topic '{topic}' exceeds the maximum depth of {max} segments")]
    TopicTooDeep {
        /// The rejected topic.
        topic: String,
        /// Maximum number of segments.
        max: usize,
    },

    /// Failed to parse a specific value.
    #[error("failed to parse {field}: {message}")]
    InvalidValue {
        /// The field that failed to parse.
        field: String,
        /// Description of the parsing failure.
        message: String,
    },
}

/// Errors related to posting or dispatching device commands.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum DispatchError {
    /// The device index does not refer to a registered device.
    #[error("no device at index {0}")]
    UnknownDevice(usize),

    /// The action needs an integer payload and none was given.
    #[error("action {0} requires a payload")]
    MissingPayload(&'static str),

    /// The device's verb table has no entry for the action.
    #[error("action {action} is not supported by device type '{device_type}'")]
    UnsupportedAction {
        /// The requested action.
        action: &'static str,
        /// The device type whose table was consulted.
        device_type: String,
    },

    /// The device never reported online and the dispatcher requires it.
    #[error("device at index {0} has not reported online")]
    DeviceOffline(usize),

    /// The dispatcher has been shut down.
    #[error("command dispatcher is closed")]
    Closed,
}

/// A specialized Result type for this library.
pub type Result<T> = std::result::Result<T, Error>;
