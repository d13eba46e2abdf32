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

//! OCPP-J `CallError` codes.

use std::fmt;

/// Error code carried by a `CallError` frame.
///
/// Codes the protocol does not define are preserved verbatim in
/// [`ErrorCode::Other`] so scenarios can still assert on what the peer sent.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum ErrorCode {
    /// Payload is syntactically incorrect.
    FormatViolation,
    /// Any other error not covered by the more specific codes.
    GenericError,
    /// An internal error occurred and the receiver could not process the action.
    InternalError,
    /// A message with an invalid message type id was received.
    MessageTypeNotSupported,
    /// The requested action is not known by the receiver.
    NotImplemented,
    /// The requested action is recognized but not supported by the receiver.
    NotSupported,
    /// Payload violates occurrence constraints (e.g. a missing required field).
    OccurrenceConstraintViolation,
    /// Payload is syntactically correct but at least one field has an invalid value.
    PropertyConstraintViolation,
    /// Payload does not conform to the PDU structure.
    ProtocolError,
    /// Content of the call is not a valid RPC request.
    RpcFrameworkError,
    /// A security issue prevented the receiver from completing the action.
    SecurityError,
    /// Payload violates data type constraints.
    TypeConstraintViolation,
    /// A code outside the protocol's list.
    Other(String),
}

impl ErrorCode {
    /// Returns the wire representation of the code.
    #[must_use]
    pub fn as_str(&self) -> &str {
        match self {
            Self::FormatViolation => "FormatViolation",
            Self::GenericError => "GenericError",
            Self::InternalError => "InternalError",
            Self::MessageTypeNotSupported => "MessageTypeNotSupported",
            Self::NotImplemented => "NotImplemented",
            Self::NotSupported => "NotSupported",
            Self::OccurrenceConstraintViolation => "OccurrenceConstraintViolation",
            Self::PropertyConstraintViolation => "PropertyConstraintViolation",
            Self::ProtocolError => "ProtocolError",
            Self::RpcFrameworkError => "RpcFrameworkError",
            Self::SecurityError => "SecurityError",
            Self::TypeConstraintViolation => "TypeConstraintViolation",
            Self::Other(code) => code,
        }
    }
}

impl From<&str> for ErrorCode {
    fn from(code: &str) -> Self {
        match code {
            "FormatViolation" => Self::FormatViolation,
            "GenericError" => Self::GenericError,
            "InternalError" => Self::InternalError,
            "MessageTypeNotSupported" => Self::MessageTypeNotSupported,
            "NotImplemented" => Self::NotImplemented,
            "NotSupported" => Self::NotSupported,
            "OccurrenceConstraintViolation" => Self::OccurrenceConstraintViolation,
            "PropertyConstraintViolation" => Self::PropertyConstraintViolation,
            "ProtocolError" => Self::ProtocolError,
            "RpcFrameworkError" => Self::RpcFrameworkError,
            "SecurityError" => Self::SecurityError,
            "TypeConstraintViolation" => Self::TypeConstraintViolation,
            other => Self::Other(other.to_string()),
        }
    }
}

impl fmt::Display for ErrorCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_known_codes_parse() {
        assert_eq!(ErrorCode::from("NotImplemented"), ErrorCode::NotImplemented);
        assert_eq!(
            ErrorCode::from("OccurrenceConstraintViolation"),
            ErrorCode::OccurrenceConstraintViolation
        );
    }

    #[test]
    fn test_unknown_code_is_preserved() {
        let code = ErrorCode::from("VendorSpecific");
        assert_eq!(code, ErrorCode::Other("VendorSpecific".to_string()));
        assert_eq!(code.to_string(), "VendorSpecific");
    }
}
