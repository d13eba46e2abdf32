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

use crate::transport::{TransportError, TransportMetadata};
use async_trait::async_trait;
use serde_json::Value;

/// Writing half of a message transport.
///
/// A sink moves whole decoded JSON messages; the endpoint encodes frames
/// into a [`Value`] before handing them over.
#[async_trait]
pub trait FrameSink: Send {
    /// Sends one message to the peer.
    ///
    /// # Errors
    ///
    /// Returns an error if the connection is closed or the write fails.
    async fn send(&mut self, message: Value) -> Result<(), TransportError>;

    /// Closes the sending direction. The peer observes end of stream.
    ///
    /// # Errors
    ///
    /// Returns an error if the close handshake cannot be written.
    async fn close(&mut self) -> Result<(), TransportError>;
}

/// Reading half of a message transport.
#[async_trait]
pub trait FrameSource: Send {
    /// Receives the next message.
    ///
    /// Returns `Ok(None)` once the peer has closed the connection.
    ///
    /// # Errors
    ///
    /// [`TransportError::InvalidMessage`] for a message that is not JSON, in
    /// which case reading may continue; any other error ends the connection.
    async fn receive(&mut self) -> Result<Option<Value>, TransportError>;
}

/// A connected, bi-directional message transport.
///
/// The endpoint takes ownership of a transport and splits it so that reading
/// and writing run on separate tasks.
///
/// # Implementations
///
/// - [`MemoryTransport`](crate::transport::MemoryTransport): in-process pair for tests
/// - `WebSocketTransport`: OCPP-J over WebSocket (feature `websocket`)
pub trait Transport: Send + 'static {
    /// Returns metadata about this transport.
    fn metadata(&self) -> &TransportMetadata;

    /// Splits the transport into separate read and write halves.
    fn split(self) -> (Box<dyn FrameSource>, Box<dyn FrameSink>)
    where
        Self: Sized;
}
