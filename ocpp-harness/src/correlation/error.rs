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

//! Failures of an outbound call.

use crate::frame::ErrorCode;
use serde_json::Value;
use std::time::Duration;
use thiserror::Error;

/// Why an outbound call did not produce a response payload.
///
/// Scenario assertions depend on telling "peer rejected" ([`Protocol`]) apart
/// from "peer unreachable" ([`Timeout`], [`Closed`]), so each has its own
/// variant and predicate.
///
/// [`Protocol`]: CallError::Protocol
/// [`Timeout`]: CallError::Timeout
/// [`Closed`]: CallError::Closed
#[derive(Debug, Clone, PartialEq, Error)]
pub enum CallError {
    /// No response arrived before the deadline.
    #[error("{action} timed out after {elapsed:?}")]
    Timeout {
        /// Action of the call.
        action: String,
        /// Time spent waiting.
        elapsed: Duration,
    },

    /// The peer answered with a `CallError` frame.
    #[error("{action} rejected by peer with {code}: {description}")]
    Protocol {
        /// Action of the call.
        action: String,
        /// Error code sent by the peer.
        code: ErrorCode,
        /// Description sent by the peer.
        description: String,
        /// Details object sent by the peer.
        details: Value,
    },

    /// The connection closed while the call was pending, or before it was sent.
    #[error("{action} aborted: connection closed")]
    Closed {
        /// Action of the call.
        action: String,
    },
}

impl CallError {
    /// Returns the action of the failed call.
    #[must_use]
    pub fn action(&self) -> &str {
        match self {
            Self::Timeout { action, .. }
            | Self::Protocol { action, .. }
            | Self::Closed { action } => action,
        }
    }

    /// Returns true if the call timed out.
    #[must_use]
    pub const fn is_timeout(&self) -> bool {
        matches!(self, Self::Timeout { .. })
    }

    /// Returns true if the peer rejected the call.
    #[must_use]
    pub const fn is_protocol(&self) -> bool {
        matches!(self, Self::Protocol { .. })
    }

    /// Returns true if the connection closed under the call.
    #[must_use]
    pub const fn is_closed(&self) -> bool {
        matches!(self, Self::Closed { .. })
    }

    /// Returns the peer's error code for protocol errors.
    #[must_use]
    pub const fn code(&self) -> Option<&ErrorCode> {
        match self {
            Self::Protocol { code, .. } => Some(code),
            _ => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_predicates() {
        let timeout = CallError::Timeout {
            action: "Heartbeat".to_string(),
            elapsed: Duration::from_secs(2),
        };
        assert!(timeout.is_timeout());
        assert!(!timeout.is_protocol());
        assert_eq!(timeout.action(), "Heartbeat");
        assert_eq!(timeout.code(), None);

        let rejected = CallError::Protocol {
            action: "Authorize".to_string(),
            code: ErrorCode::SecurityError,
            description: String::new(),
            details: Value::Null,
        };
        assert!(rejected.is_protocol());
        assert_eq!(rejected.code(), Some(&ErrorCode::SecurityError));
    }

    #[test]
    fn test_timeout_display_names_action_and_elapsed() {
        let timeout = CallError::Timeout {
            action: "BootNotification".to_string(),
            elapsed: Duration::from_millis(2000),
        };
        assert_eq!(timeout.to_string(), "BootNotification timed out after 2s");
    }
}
