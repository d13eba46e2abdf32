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

//! In-memory transport implementation for testing.
//!
//! Two connected [`MemoryTransport`]s exchange JSON messages over Tokio
//! channels. One end is handed to an endpoint; the other is driven directly
//! by the test as a scripted CSMS.

use crate::transport::{FrameSink, FrameSource, Transport, TransportError, TransportMetadata};
use async_trait::async_trait;
use serde_json::Value;
use std::sync::atomic::{AtomicU64, Ordering};
use tokio::sync::mpsc;
use tracing::debug;

/// Global counter for generating unique transport IDs.
static NEXT_MEMORY_TRANSPORT_ID: AtomicU64 = AtomicU64::new(1);

/// Default buffer size for memory transport channels.
const DEFAULT_BUFFER_SIZE: usize = 1024;

/// In-memory transport implementation.
///
/// Besides implementing [`Transport`], a memory transport can be used
/// directly through [`send`](Self::send) and [`receive`](Self::receive),
/// which is how tests play the CSMS side.
///
/// # Examples
///
/// ```rust
/// use ocpp_harness::transport::MemoryTransport;
/// use serde_json::json;
///
/// # async fn example() -> Result<(), Box<dyn std::error::Error>> {
/// let (mut station, mut csms) = MemoryTransport::pair_default();
///
/// csms.send(json!([2, "1", "Heartbeat", {}])).await?;
/// assert_eq!(station.receive().await?, Some(json!([2, "1", "Heartbeat", {}])));
///
/// drop(csms);
/// assert_eq!(station.receive().await?, None);
/// # Ok(())
/// # }
/// ```
#[derive(Debug)]
pub struct MemoryTransport {
    metadata: TransportMetadata,
    rx: mpsc::Receiver<Value>,
    tx: mpsc::Sender<Value>,
}

impl MemoryTransport {
    /// Creates a pair of connected memory transports.
    ///
    /// `buffer_size` bounds each direction; a full buffer makes `send` wait.
    pub fn pair(buffer_size: usize) -> (Self, Self) {
        let (tx1, rx1) = mpsc::channel(buffer_size);
        let (tx2, rx2) = mpsc::channel(buffer_size);

        let id1 = NEXT_MEMORY_TRANSPORT_ID.fetch_add(1, Ordering::Relaxed);
        let id2 = NEXT_MEMORY_TRANSPORT_ID.fetch_add(1, Ordering::Relaxed);
        debug!(id1, id2, buffer_size, "created memory transport pair");

        let first = Self {
            metadata: TransportMetadata::new(id1, "memory").with_peer(format!("memory#{id2}")),
            rx: rx2,
            tx: tx1,
        };
        let second = Self {
            metadata: TransportMetadata::new(id2, "memory").with_peer(format!("memory#{id1}")),
            rx: rx1,
            tx: tx2,
        };
        (first, second)
    }

    /// Creates a pair of connected memory transports with default buffer size.
    pub fn pair_default() -> (Self, Self) {
        Self::pair(DEFAULT_BUFFER_SIZE)
    }

    /// Sends one message to the other end.
    ///
    /// # Errors
    ///
    /// Returns [`TransportError::Closed`] if the other end is gone.
    pub async fn send(&self, message: Value) -> Result<(), TransportError> {
        self.tx
            .send(message)
            .await
            .map_err(|_| TransportError::Closed)
    }

    /// Receives the next message, or `None` once the other end is gone.
    ///
    /// # Errors
    ///
    /// Never fails; the `Result` mirrors [`FrameSource::receive`].
    pub async fn receive(&mut self) -> Result<Option<Value>, TransportError> {
        Ok(self.rx.recv().await)
    }
}

impl Transport for MemoryTransport {
    fn metadata(&self) -> &TransportMetadata {
        &self.metadata
    }

    fn split(self) -> (Box<dyn FrameSource>, Box<dyn FrameSink>) {
        (
            Box::new(MemorySource { rx: self.rx }),
            Box::new(MemorySink { tx: Some(self.tx) }),
        )
    }
}

struct MemorySource {
    rx: mpsc::Receiver<Value>,
}

#[async_trait]
impl FrameSource for MemorySource {
    async fn receive(&mut self) -> Result<Option<Value>, TransportError> {
        Ok(self.rx.recv().await)
    }
}

struct MemorySink {
    tx: Option<mpsc::Sender<Value>>,
}

#[async_trait]
impl FrameSink for MemorySink {
    async fn send(&mut self, message: Value) -> Result<(), TransportError> {
        let tx = self.tx.as_ref().ok_or(TransportError::Closed)?;
        tx.send(message).await.map_err(|_| TransportError::Closed)
    }

    async fn close(&mut self) -> Result<(), TransportError> {
        self.tx = None;
        Ok(())
    }
}
