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

//! Top-level error type for harness scenarios.
//!
//! Errors are layered the same way the crate is:
//!
//! 1. **Transport**: the connection could not be made or was lost ([`TransportError`])
//! 2. **Call**: one outbound call failed ([`CallError`]); only that call is affected
//! 3. **Wait**: an expected CSMS-initiated action did not happen ([`WaitError`])
//! 4. **Unexpected**: the CSMS answered, but not the way the scenario requires
//!
//! [`HarnessError`] composes them so that scenario code can use `?` throughout.
//!
//! # Examples
//!
//! ```rust
//! use ocpp_harness::HarnessError;
//! use ocpp_harness::correlation::CallError;
//!
//! let error: HarnessError = CallError::Closed { action: "Heartbeat".into() }.into();
//! assert!(error.is_call_error());
//! ```

use crate::config::ConfigError;
use crate::correlation::CallError;
use crate::session::WaitError;
use crate::transport::TransportError;
use thiserror::Error;

/// Top-level error type for harness operations.
#[derive(Debug, Error)]
pub enum HarnessError {
    /// The configuration could not be read.
    #[error(transparent)]
    Config(#[from] ConfigError),

    /// The connection failed.
    #[error(transparent)]
    Transport(#[from] TransportError),

    /// An outbound call failed.
    #[error(transparent)]
    Call(#[from] CallError),

    /// A signal was not raised in time.
    #[error(transparent)]
    Wait(#[from] WaitError),

    /// The CSMS answered, but the answer fails a scenario check.
    #[error("{step}: {detail}")]
    Unexpected {
        /// Which step of the scenario failed
        step: String,
        /// What was wrong with the answer
        detail: String,
    },
}

impl HarnessError {
    /// Creates an [`HarnessError::Unexpected`].
    pub fn unexpected(step: impl Into<String>, detail: impl Into<String>) -> Self {
        Self::Unexpected {
            step: step.into(),
            detail: detail.into(),
        }
    }

    /// Returns true for a failed outbound call.
    pub fn is_call_error(&self) -> bool {
        matches!(self, Self::Call(_))
    }

    /// Returns true for a transport failure.
    pub fn is_transport_error(&self) -> bool {
        matches!(self, Self::Transport(_))
    }

    /// Returns the call error, if this is one.
    pub fn as_call_error(&self) -> Option<&CallError> {
        match self {
            Self::Call(e) => Some(e),
            _ => None,
        }
    }
}

/// Result type for harness operations.
pub type Result<T, E = HarnessError> = std::result::Result<T, E>;
