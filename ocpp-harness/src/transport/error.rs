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

//! Transport layer error types.
//!
//! Transport errors are the lowest level of the error hierarchy. Apart from
//! [`TransportError::InvalidMessage`], which concerns a single message, every
//! variant means the connection is unusable and the endpoint shuts down.

use thiserror::Error;

/// Errors that can occur in the transport layer.
///
/// # Examples
///
/// ```rust
/// use ocpp_harness::transport::TransportError;
///
/// let error = TransportError::Rejected { status: 401 };
/// assert!(error.is_fatal());
/// assert_eq!(error.to_string(), "connection rejected with HTTP status 401");
/// ```
#[derive(Debug, Error)]
pub enum TransportError {
    /// Failed to establish a connection to the remote endpoint.
    #[error("failed to connect to {address}: {reason}")]
    ConnectionFailed {
        /// The address that failed to connect
        address: String,
        /// Why the attempt failed
        reason: String,
    },

    /// The peer refused the WebSocket upgrade with an HTTP status.
    ///
    /// A CSMS answers a charge point presenting bad credentials with `401`.
    #[error("connection rejected with HTTP status {status}")]
    Rejected {
        /// HTTP status of the refused upgrade
        status: u16,
    },

    /// Connection was lost during operation.
    #[error("connection lost: {reason}")]
    ConnectionLost {
        /// Description of why the connection was lost
        reason: String,
    },

    /// Transport is already closed.
    #[error("transport is closed")]
    Closed,

    /// A received message could not be decoded as JSON.
    ///
    /// Only this message is lost; the connection stays usable.
    #[error("invalid message: {reason}")]
    InvalidMessage {
        /// Why decoding failed
        reason: String,
    },

    /// Invalid transport configuration.
    #[error("invalid configuration: {reason}")]
    InvalidConfiguration {
        /// Description of the configuration error
        reason: String,
    },

    /// WebSocket-specific error occurred.
    #[cfg(feature = "websocket")]
    #[error("WebSocket error: {0}")]
    WebSocket(#[from] tokio_tungstenite::tungstenite::Error),
}

impl TransportError {
    /// Returns `true` if the connection cannot be used after this error.
    ///
    /// ```rust
    /// use ocpp_harness::transport::TransportError;
    ///
    /// let error = TransportError::InvalidMessage { reason: "expected value".into() };
    /// assert!(!error.is_fatal());
    /// assert!(TransportError::Closed.is_fatal());
    /// ```
    pub fn is_fatal(&self) -> bool {
        !matches!(self, TransportError::InvalidMessage { .. })
    }

    /// Returns `true` if the peer refused the connection with `status`.
    pub fn is_rejected_with(&self, status: u16) -> bool {
        matches!(self, TransportError::Rejected { status: s } if *s == status)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_invalid_message_is_not_fatal() {
        let error = TransportError::InvalidMessage {
            reason: "trailing characters".to_string(),
        };
        assert!(!error.is_fatal());
    }

    #[test]
    fn test_connection_errors_are_fatal() {
        let errors = [
            TransportError::ConnectionFailed {
                address: "ws://127.0.0.1:9000/CP_1".to_string(),
                reason: "connection refused".to_string(),
            },
            TransportError::ConnectionLost {
                reason: "peer reset".to_string(),
            },
            TransportError::Closed,
            TransportError::Rejected { status: 401 },
        ];
        for error in errors {
            assert!(error.is_fatal(), "{error} should be fatal");
        }
    }

    #[test]
    fn test_rejected_with_status() {
        let error = TransportError::Rejected { status: 401 };
        assert!(error.is_rejected_with(401));
        assert!(!error.is_rejected_with(403));
        assert!(!TransportError::Closed.is_rejected_with(401));
    }
}
