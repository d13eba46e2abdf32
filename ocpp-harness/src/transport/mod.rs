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

//! Transport layer.
//!
//! A transport carries decoded JSON messages between this charge point and
//! the CSMS. The endpoint never looks below that level: message framing,
//! text encoding and keepalive are the transport's business.
//!
//! # Available Transports
//!
//! - [`MemoryTransport`]: connected in-process pair, used by tests and
//!   scripted peers
//! - [`WebSocketTransport`]: OCPP-J over WebSocket (feature `websocket`,
//!   enabled by default)

mod error;
mod memory;
mod traits;
#[cfg(feature = "websocket")]
mod websocket;

pub use error::TransportError;
pub use memory::MemoryTransport;
pub use traits::{FrameSink, FrameSource, Transport};
#[cfg(feature = "websocket")]
pub use websocket::WebSocketTransport;

use std::fmt;
use std::time::Instant;

/// Metadata about a transport connection.
#[derive(Debug, Clone)]
pub struct TransportMetadata {
    /// Process-unique transport identifier
    pub id: u64,

    /// Transport type (e.g., "memory", "websocket")
    pub transport_type: &'static str,

    /// Remote peer, if known
    pub peer: Option<String>,

    /// When the transport was created
    pub created_at: Instant,
}

impl TransportMetadata {
    /// Creates new transport metadata.
    pub fn new(id: u64, transport_type: &'static str) -> Self {
        Self {
            id,
            transport_type,
            peer: None,
            created_at: Instant::now(),
        }
    }

    /// Sets the peer description.
    #[must_use]
    pub fn with_peer(mut self, peer: impl Into<String>) -> Self {
        self.peer = Some(peer.into());
        self
    }
}

impl fmt::Display for TransportMetadata {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.peer {
            Some(peer) => write!(f, "{}#{} ({})", self.transport_type, self.id, peer),
            None => write!(f, "{}#{}", self.transport_type, self.id),
        }
    }
}
