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

use super::Caller;
use crate::correlation::{CallError, CorrelationTable};
use crate::observability::EndpointMetrics;
use crate::session::SessionState;
use crate::transport::TransportMetadata;
use parking_lot::Mutex;
use serde_json::Value;
use std::sync::Arc;
use std::time::Duration;
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info};

/// A running charge-point connection.
///
/// Created by [`EndpointBuilder::start`](super::EndpointBuilder::start). While
/// it runs, inbound calls are answered by the dispatcher and outbound calls
/// can be issued with [`call`](Self::call) from any number of tasks.
///
/// Dropping the endpoint shuts the connection down; [`close`](Self::close)
/// does the same and waits for the background tasks to finish.
///
/// # Example
///
/// ```rust
/// use ocpp_harness::endpoint::EndpointBuilder;
/// use ocpp_harness::transport::MemoryTransport;
/// use serde_json::json;
///
/// # async fn example() -> Result<(), Box<dyn std::error::Error>> {
/// let (station, mut csms) = MemoryTransport::pair_default();
/// let endpoint = EndpointBuilder::new().start(station);
///
/// let heartbeat = tokio::spawn({
///     let caller = endpoint.caller();
///     async move { caller.call("Heartbeat", json!({})).await }
/// });
///
/// let request = csms.receive().await?.unwrap();
/// csms.send(json!([3, request[1], {"currentTime": "2026-01-01T00:00:00Z"}])).await?;
///
/// let response = heartbeat.await??;
/// assert_eq!(response["currentTime"], "2026-01-01T00:00:00Z");
/// endpoint.close().await;
/// # Ok(())
/// # }
/// ```
pub struct Endpoint {
    name: String,
    transport: TransportMetadata,
    caller: Caller,
    session: Arc<SessionState>,
    table: Arc<CorrelationTable>,
    metrics: Arc<EndpointMetrics>,
    shutdown: CancellationToken,
    tasks: Mutex<Vec<JoinHandle<()>>>,
}

impl Endpoint {
    #[allow(clippy::too_many_arguments)]
    pub(super) fn new(
        name: String,
        transport: TransportMetadata,
        caller: Caller,
        session: Arc<SessionState>,
        table: Arc<CorrelationTable>,
        metrics: Arc<EndpointMetrics>,
        shutdown: CancellationToken,
        tasks: Vec<JoinHandle<()>>,
    ) -> Self {
        Self {
            name,
            transport,
            caller,
            session,
            table,
            metrics,
            shutdown,
            tasks: Mutex::new(tasks),
        }
    }

    /// Name used in log output, normally the charge point id.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Metadata of the underlying transport.
    pub fn transport(&self) -> &TransportMetadata {
        &self.transport
    }

    /// Returns a handle for issuing calls from other tasks.
    pub fn caller(&self) -> Caller {
        self.caller.clone()
    }

    /// Sends `action` and waits for the answer, at most the configured call
    /// timeout.
    ///
    /// # Errors
    ///
    /// See [`Caller::call_with_timeout`].
    pub async fn call(&self, action: &str, payload: Value) -> Result<Value, CallError> {
        self.caller.call(action, payload).await
    }

    /// Sends `action` and waits at most `timeout` for the answer.
    ///
    /// # Errors
    ///
    /// See [`Caller::call_with_timeout`].
    pub async fn call_with_timeout(
        &self,
        action: &str,
        payload: Value,
        timeout: Duration,
    ) -> Result<Value, CallError> {
        self.caller.call_with_timeout(action, payload, timeout).await
    }

    /// Session state shared with the handlers.
    pub fn session(&self) -> &Arc<SessionState> {
        &self.session
    }

    /// Next value of the outbound sequence counter, starting at 1.
    pub fn next_sequence(&self) -> u64 {
        self.session.next_sequence()
    }

    /// Traffic counters.
    pub fn metrics(&self) -> &EndpointMetrics {
        &self.metrics
    }

    /// Number of outbound calls awaiting an answer.
    pub fn pending_calls(&self) -> usize {
        self.table.len()
    }

    /// Returns true once the connection has ended, for whatever reason.
    pub fn is_closed(&self) -> bool {
        self.shutdown.is_cancelled()
    }

    /// Waits until the connection ends.
    pub async fn closed(&self) {
        self.shutdown.cancelled().await;
    }

    /// Shuts the connection down and waits for the background tasks.
    ///
    /// Every pending call fails with [`CallError::Closed`]. Calling it again
    /// is a no-op.
    pub async fn close(&self) {
        info!(endpoint = %self.name, "closing");
        self.shutdown.cancel();

        let tasks: Vec<_> = self.tasks.lock().drain(..).collect();
        for task in tasks {
            if let Err(e) = task.await {
                debug!(endpoint = %self.name, error = %e, "background task ended abnormally");
            }
        }
    }
}

impl std::fmt::Debug for Endpoint {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Endpoint")
            .field("name", &self.name)
            .field("transport", &self.transport)
            .field("pending_calls", &self.table.len())
            .field("closed", &self.shutdown.is_cancelled())
            .finish()
    }
}

impl Drop for Endpoint {
    fn drop(&mut self) {
        self.shutdown.cancel();
    }
}
