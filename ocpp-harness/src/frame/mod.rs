//
// Copyright 2026 Hans W. Uhlig. All Rights Reserved.
//
// Licensed under the Apache License, Version 2.0 (the "License");
// you may not use this file except in compliance with the License.
// You may obtain a copy of the License at
//
//      http://www.apache.org/licenses/LICENSE-2.0
//
// Unless required by applicable law or agreed to in writing, software
// distributed under the License is distributed on an "AS IS" BASIS,
// WITHOUT WARRANTIES OR CONDITIONS OF ANY KIND, either express or implied.
// See the License for the specific language governing permissions and
// limitations under the License.
//

//! OCPP-J message frames.
//!
//! Every message exchanged over the connection is one of three frame kinds,
//! laid out as a JSON array whose first element is the message type id:
//!
//! | kind         | layout                                                   |
//! |--------------|----------------------------------------------------------|
//! | `Call`       | `[2, "<id>", "<action>", {payload}]`                     |
//! | `CallResult` | `[3, "<id>", {payload}]`                                 |
//! | `CallError`  | `[4, "<id>", "<errorCode>", "<description>", {details}]` |
//!
//! The transport hands the endpoint already decoded JSON values; this module
//! only classifies them and builds the outgoing ones. Payloads stay opaque
//! [`serde_json::Value`]s.

mod error;
mod error_code;

pub use error::FrameError;
pub use error_code::ErrorCode;

use serde_json::{Value, json};
use std::fmt;

/// Identifier linking a `Call` to its `CallResult` or `CallError`.
///
/// The peer chooses the ids of the calls it sends, so any string is accepted.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct CorrelationId(String);

impl CorrelationId {
    /// Creates a correlation id from any string-like value.
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    /// Returns the id as a string slice.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for CorrelationId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<String> for CorrelationId {
    fn from(id: String) -> Self {
        Self(id)
    }
}

impl From<&str> for CorrelationId {
    fn from(id: &str) -> Self {
        Self(id.to_string())
    }
}

/// Discriminator carried in the first element of every frame.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum MessageType {
    /// A request from either side.
    Call = 2,
    /// A successful response to a `Call`.
    CallResult = 3,
    /// A failed response to a `Call`.
    CallError = 4,
}

impl MessageType {
    /// Maps a wire discriminator to a message type.
    #[must_use]
    pub const fn from_id(id: u64) -> Option<Self> {
        match id {
            2 => Some(Self::Call),
            3 => Some(Self::CallResult),
            4 => Some(Self::CallError),
            _ => None,
        }
    }

    /// Returns the wire discriminator.
    #[must_use]
    pub const fn id(self) -> u64 {
        self as u64
    }
}

/// A classified OCPP-J frame.
#[derive(Debug, Clone, PartialEq)]
pub enum Frame {
    /// A request for `action`.
    Call {
        /// Correlation id chosen by the sender.
        id: CorrelationId,
        /// Action name, e.g. `BootNotification`.
        action: String,
        /// Request payload.
        payload: Value,
    },

    /// A successful response.
    CallResult {
        /// Correlation id of the answered call.
        id: CorrelationId,
        /// Response payload.
        payload: Value,
    },

    /// A failed response.
    CallError {
        /// Correlation id of the answered call.
        id: CorrelationId,
        /// Protocol error code.
        code: ErrorCode,
        /// Human readable description, possibly empty.
        description: String,
        /// Structured details, `{}` when absent.
        details: Value,
    },
}

impl Frame {
    /// Returns the correlation id of this frame.
    #[must_use]
    pub fn id(&self) -> &CorrelationId {
        match self {
            Self::Call { id, .. } | Self::CallResult { id, .. } | Self::CallError { id, .. } => id,
        }
    }

    /// Returns the discriminator of this frame.
    #[must_use]
    pub const fn message_type(&self) -> MessageType {
        match self {
            Self::Call { .. } => MessageType::Call,
            Self::CallResult { .. } => MessageType::CallResult,
            Self::CallError { .. } => MessageType::CallError,
        }
    }

    /// Encodes the frame into its JSON array form.
    #[must_use]
    pub fn to_value(&self) -> Value {
        match self {
            Self::Call {
                id,
                action,
                payload,
            } => json!([MessageType::Call.id(), id.as_str(), action, payload]),
            Self::CallResult { id, payload } => {
                json!([MessageType::CallResult.id(), id.as_str(), payload])
            }
            Self::CallError {
                id,
                code,
                description,
                details,
            } => json!([
                MessageType::CallError.id(),
                id.as_str(),
                code.as_str(),
                description,
                details
            ]),
        }
    }

    /// Classifies a decoded JSON message.
    ///
    /// # Errors
    ///
    /// Returns a [`FrameError`] when the message is not an array, carries an
    /// unknown discriminator, or lacks one of the fields its kind requires.
    pub fn from_value(value: Value) -> Result<Self, FrameError> {
        let Value::Array(items) = value else {
            return Err(FrameError::NotAnArray);
        };
        let mut items = items.into_iter();

        let discriminator = items.next().ok_or(FrameError::Empty)?;
        let message_type = discriminator
            .as_u64()
            .and_then(MessageType::from_id)
            .ok_or(FrameError::UnknownMessageType(discriminator))?;

        let id = match items.next() {
            Some(Value::String(id)) => CorrelationId::from(id),
            Some(_) => return Err(FrameError::invalid("uniqueId", "expected a string")),
            None => return Err(FrameError::missing(message_type, "uniqueId")),
        };

        match message_type {
            MessageType::Call => {
                let action = match items.next() {
                    Some(Value::String(action)) => action,
                    Some(_) => return Err(FrameError::invalid("action", "expected a string")),
                    None => return Err(FrameError::missing(message_type, "action")),
                };
                let payload = items
                    .next()
                    .ok_or_else(|| FrameError::missing(message_type, "payload"))?;
                Ok(Self::Call {
                    id,
                    action,
                    payload,
                })
            }
            MessageType::CallResult => {
                let payload = items
                    .next()
                    .ok_or_else(|| FrameError::missing(message_type, "payload"))?;
                Ok(Self::CallResult { id, payload })
            }
            MessageType::CallError => {
                let code = match items.next() {
                    Some(Value::String(code)) => ErrorCode::from(code.as_str()),
                    Some(_) => return Err(FrameError::invalid("errorCode", "expected a string")),
                    None => return Err(FrameError::missing(message_type, "errorCode")),
                };
                // Some peers omit the trailing fields; tolerate that.
                let description = match items.next() {
                    Some(Value::String(description)) => description,
                    Some(Value::Null) | None => String::new(),
                    Some(_) => {
                        return Err(FrameError::invalid("errorDescription", "expected a string"));
                    }
                };
                let details = items.next().unwrap_or_else(|| json!({}));
                Ok(Self::CallError {
                    id,
                    code,
                    description,
                    details,
                })
            }
        }
    }
}
