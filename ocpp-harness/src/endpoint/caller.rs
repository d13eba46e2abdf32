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

//! Outbound call handle.

use crate::correlation::{CallError, CorrelationTable};
use crate::frame::Frame;
use crate::observability::EndpointMetrics;
use serde_json::Value;
use std::fmt;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::mpsc;
use tracing::{debug, info};

/// Issues outbound calls on one connection.
///
/// Cheap to clone; every clone talks to the same connection. Handlers get
/// one through [`HandlerContext::caller`](crate::dispatch::HandlerContext::caller)
/// and may call while they run.
#[derive(Clone)]
pub struct Caller {
    table: Arc<CorrelationTable>,
    outgoing: mpsc::UnboundedSender<Value>,
    metrics: Arc<EndpointMetrics>,
    default_timeout: Duration,
}

impl Caller {
    pub(crate) fn new(
        table: Arc<CorrelationTable>,
        outgoing: mpsc::UnboundedSender<Value>,
        metrics: Arc<EndpointMetrics>,
        default_timeout: Duration,
    ) -> Self {
        Self {
            table,
            outgoing,
            metrics,
            default_timeout,
        }
    }

    /// Returns a caller that belongs to no connection.
    ///
    /// Every call fails with [`CallError::Closed`]. Useful for exercising
    /// handlers outside an endpoint.
    pub fn detached() -> Self {
        let table = Arc::new(CorrelationTable::new());
        table.close();
        let (outgoing, _) = mpsc::unbounded_channel();
        Self::new(
            table,
            outgoing,
            Arc::new(EndpointMetrics::new()),
            super::DEFAULT_CALL_TIMEOUT,
        )
    }

    /// Timeout applied by [`call`](Self::call).
    pub fn default_timeout(&self) -> Duration {
        self.default_timeout
    }

    /// Returns true once the connection has closed.
    pub fn is_closed(&self) -> bool {
        self.table.is_closed()
    }

    /// Sends `action` with `payload` and waits for the answer, at most the
    /// default timeout.
    ///
    /// # Errors
    ///
    /// See [`call_with_timeout`](Self::call_with_timeout).
    pub async fn call(&self, action: &str, payload: Value) -> Result<Value, CallError> {
        self.call_with_timeout(action, payload, self.default_timeout)
            .await
    }

    /// Sends `action` with `payload` and waits at most `timeout` for the answer.
    ///
    /// # Errors
    ///
    /// - [`CallError::Timeout`] if the peer did not answer in time
    /// - [`CallError::Protocol`] if the peer answered with a `CallError`
    /// - [`CallError::Closed`] if the connection is or becomes closed
    pub async fn call_with_timeout(
        &self,
        action: &str,
        payload: Value,
        timeout: Duration,
    ) -> Result<Value, CallError> {
        if self.table.is_closed() {
            return Err(CallError::Closed {
                action: action.to_string(),
            });
        }
        let pending = self.table.register(action);
        let frame = Frame::Call {
            id: pending.id().clone(),
            action: action.to_string(),
            payload,
        };

        info!(%action, id = %pending.id(), "sending call");
        if self.outgoing.send(frame.to_value()).is_err() {
            debug!(%action, id = %pending.id(), "writer is gone");
            return Err(CallError::Closed {
                action: action.to_string(),
            });
        }
        self.metrics.record_call_sent();

        let result = pending.wait(timeout).await;
        if matches!(result, Err(CallError::Timeout { .. })) {
            self.metrics.record_timeout();
        }
        result
    }
}

impl fmt::Debug for Caller {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Caller")
            .field("pending", &self.table.len())
            .field("closed", &self.table.is_closed())
            .field("default_timeout", &self.default_timeout)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::correlation::Resolution;
    use crate::frame::CorrelationId;
    use serde_json::json;

    #[tokio::test]
    async fn test_detached_caller_is_closed() {
        let caller = Caller::detached();
        assert!(caller.is_closed());
        let error = caller.call("Heartbeat", json!({})).await.unwrap_err();
        assert!(error.is_closed());
        assert_eq!(error.action(), "Heartbeat");
    }

    #[tokio::test]
    async fn test_call_writes_frame_and_returns_result() {
        let table = Arc::new(CorrelationTable::new());
        let (tx, mut rx) = mpsc::unbounded_channel();
        let metrics = Arc::new(EndpointMetrics::new());
        let caller = Caller::new(table.clone(), tx, metrics.clone(), Duration::from_secs(5));

        let call = tokio::spawn({
            let caller = caller.clone();
            async move { caller.call("Heartbeat", json!({})).await }
        });

        let sent = rx.recv().await.unwrap();
        let frame = Frame::from_value(sent).unwrap();
        let Frame::Call { id, action, payload } = frame else {
            panic!("expected a Call frame");
        };
        assert_eq!(action, "Heartbeat");
        assert_eq!(payload, json!({}));

        assert!(table.resolve(&id, Resolution::Result(json!({"currentTime": "t"}))));
        assert_eq!(call.await.unwrap().unwrap(), json!({"currentTime": "t"}));
        assert_eq!(metrics.calls_sent(), 1);
        assert!(!table.contains(&CorrelationId::new(id.as_str())));
    }

    #[tokio::test(start_paused = true)]
    async fn test_call_timeout_is_counted() {
        let table = Arc::new(CorrelationTable::new());
        let (tx, _rx) = mpsc::unbounded_channel();
        let metrics = Arc::new(EndpointMetrics::new());
        let caller = Caller::new(table.clone(), tx, metrics.clone(), Duration::from_secs(2));

        let error = caller.call("Authorize", json!({})).await.unwrap_err();
        assert!(error.is_timeout());
        assert_eq!(metrics.timeouts(), 1);
        assert!(table.is_empty());
    }
}
