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

//! Frame classification errors.

use super::MessageType;
use serde_json::Value;
use thiserror::Error;

/// Reasons an inbound message could not be classified as a frame.
///
/// These are never fatal to the connection: the receive loop logs the
/// message and moves on to the next one.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum FrameError {
    /// The message is not a JSON array.
    #[error("message is not a JSON array")]
    NotAnArray,

    /// The message is an empty array.
    #[error("message is an empty array")]
    Empty,

    /// The discriminator is not one of 2, 3 or 4.
    #[error("unknown message type {0}")]
    UnknownMessageType(Value),

    /// A field required by the frame kind is absent.
    #[error("{message_type:?} frame is missing {field}")]
    MissingField {
        /// Kind of the frame being parsed.
        message_type: MessageType,
        /// Name of the missing field.
        field: &'static str,
    },

    /// A field is present but has the wrong JSON type.
    #[error("invalid {field}: {reason}")]
    InvalidField {
        /// Name of the offending field.
        field: &'static str,
        /// What was expected.
        reason: &'static str,
    },
}

impl FrameError {
    pub(super) const fn missing(message_type: MessageType, field: &'static str) -> Self {
        Self::MissingField {
            message_type,
            field,
        }
    }

    pub(super) const fn invalid(field: &'static str, reason: &'static str) -> Self {
        Self::InvalidField { field, reason }
    }
}
