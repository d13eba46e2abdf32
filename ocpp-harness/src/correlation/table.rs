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

//! Tracking of outbound calls awaiting a response.

use super::{CallError, CorrelationIdGenerator};
use crate::frame::{CorrelationId, ErrorCode};
use parking_lot::Mutex;
use serde_json::Value;
use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::oneshot;
use tokio::time::Instant;
use tracing::{debug, warn};

/// What a pending call is completed with.
#[derive(Debug, Clone, PartialEq)]
pub enum Resolution {
    /// The peer answered with a `CallResult`.
    Result(Value),
    /// The peer answered with a `CallError`.
    Error {
        /// Error code sent by the peer.
        code: ErrorCode,
        /// Description sent by the peer.
        description: String,
        /// Details object sent by the peer.
        details: Value,
    },
    /// The connection closed before an answer arrived.
    Closed,
}

#[derive(Debug)]
struct Entry {
    action: String,
    tx: oneshot::Sender<Resolution>,
}

#[derive(Debug, Default)]
struct Entries {
    pending: HashMap<CorrelationId, Entry>,
    closed: bool,
}

/// Maps each outbound call to its eventual result.
///
/// Entries are keyed by correlation id. The receive loop completes them with
/// [`resolve`](Self::resolve); the calling task waits on the
/// [`PendingCall`] returned by [`register`](Self::register). Every entry is
/// completed at most once: whichever of resolve, timeout, cancellation or
/// close removes it from the map first wins, and the others become no-ops.
///
/// The map sits behind a `parking_lot` mutex so that a dropped
/// [`PendingCall`] can remove its entry synchronously.
///
/// # Example
///
/// ```rust
/// use ocpp_harness::correlation::{CorrelationTable, Resolution};
/// use serde_json::json;
/// use std::sync::Arc;
/// use std::time::Duration;
///
/// # async fn example() {
/// let table = Arc::new(CorrelationTable::new());
/// let call = table.register("Heartbeat");
///
/// // ... the receive loop sees the matching CallResult ...
/// assert!(table.resolve(call.id(), Resolution::Result(json!({"currentTime": "now"}))));
///
/// let response = call.wait(Duration::from_secs(1)).await.unwrap();
/// assert_eq!(response["currentTime"], "now");
/// # }
/// ```
#[derive(Debug, Default)]
pub struct CorrelationTable {
    ids: CorrelationIdGenerator,
    entries: Mutex<Entries>,
}

impl CorrelationTable {
    /// Creates an empty table.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers a new outbound call for `action`.
    ///
    /// The returned id is unique among the currently pending calls. If the
    /// table is already closed the call is completed with
    /// [`Resolution::Closed`] straight away.
    pub fn register(self: &Arc<Self>, action: impl Into<String>) -> PendingCall {
        let action = action.into();
        let (tx, rx) = oneshot::channel();

        let id = {
            let mut entries = self.entries.lock();
            let id = loop {
                let id = self.ids.next();
                if !entries.pending.contains_key(&id) {
                    break id;
                }
            };
            if entries.closed {
                let _ = tx.send(Resolution::Closed);
            } else {
                entries.pending.insert(
                    id.clone(),
                    Entry {
                        action: action.clone(),
                        tx,
                    },
                );
            }
            id
        };

        PendingCall {
            id,
            action,
            rx,
            table: Arc::clone(self),
            started: Instant::now(),
            settled: false,
        }
    }

    /// Completes the pending call `id` with `resolution`.
    ///
    /// Returns `false` when no such call is pending: the id is unknown, the
    /// call already timed out, or it was already resolved. Such late or
    /// duplicate answers are a conformance concern of the peer and are only
    /// logged.
    pub fn resolve(&self, id: &CorrelationId, resolution: Resolution) -> bool {
        let entry = self.entries.lock().pending.remove(id);
        match entry {
            Some(entry) => {
                if entry.tx.send(resolution).is_err() {
                    debug!(%id, action = %entry.action, "caller went away before the answer arrived");
                    return false;
                }
                debug!(%id, action = %entry.action, "pending call resolved");
                true
            }
            None => {
                warn!(%id, "discarding answer for unknown or expired call");
                false
            }
        }
    }

    /// Closes the table, failing every pending call with
    /// [`Resolution::Closed`].
    ///
    /// Calls registered afterwards complete with `Closed` immediately.
    /// Returns how many pending calls were failed.
    pub fn close(&self) -> usize {
        let drained: Vec<_> = {
            let mut entries = self.entries.lock();
            entries.closed = true;
            entries.pending.drain().collect()
        };

        let count = drained.len();
        for (id, entry) in drained {
            debug!(%id, action = %entry.action, "failing pending call: connection closed");
            let _ = entry.tx.send(Resolution::Closed);
        }
        count
    }

    /// Returns true once [`close`](Self::close) has been called.
    #[must_use]
    pub fn is_closed(&self) -> bool {
        self.entries.lock().closed
    }

    /// Returns true if `id` is pending.
    #[must_use]
    pub fn contains(&self, id: &CorrelationId) -> bool {
        self.entries.lock().pending.contains_key(id)
    }

    /// Returns the number of pending calls.
    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.lock().pending.len()
    }

    /// Returns true if no call is pending.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.lock().pending.is_empty()
    }

    fn remove(&self, id: &CorrelationId) -> bool {
        self.entries.lock().pending.remove(id).is_some()
    }
}

/// The caller's side of one registered call.
///
/// Dropping it before it settles (for example because the scenario task was
/// cancelled) removes the entry from the table.
#[derive(Debug)]
pub struct PendingCall {
    id: CorrelationId,
    action: String,
    rx: oneshot::Receiver<Resolution>,
    table: Arc<CorrelationTable>,
    started: Instant,
    settled: bool,
}

impl PendingCall {
    /// Returns the correlation id to put on the outgoing `Call` frame.
    #[must_use]
    pub fn id(&self) -> &CorrelationId {
        &self.id
    }

    /// Returns the action this call was registered for.
    #[must_use]
    pub fn action(&self) -> &str {
        &self.action
    }

    /// Waits for the answer, at most `timeout` after registration.
    ///
    /// # Errors
    ///
    /// - [`CallError::Timeout`] if nothing arrived in time; the entry is
    ///   removed so a later answer is discarded.
    /// - [`CallError::Protocol`] if the peer answered with a `CallError`.
    /// - [`CallError::Closed`] if the connection closed first.
    pub async fn wait(mut self, timeout: Duration) -> Result<Value, CallError> {
        let deadline = self.started + timeout;
        let resolution = match tokio::time::timeout_at(deadline, &mut self.rx).await {
            Ok(Ok(resolution)) => resolution,
            Ok(Err(_)) => Resolution::Closed,
            Err(_) => {
                if self.table.remove(&self.id) {
                    self.settled = true;
                    let elapsed = self.started.elapsed();
                    warn!(id = %self.id, action = %self.action, ?elapsed, "call timed out");
                    return Err(CallError::Timeout {
                        action: self.action.clone(),
                        elapsed,
                    });
                }
                // resolve() took the entry first; its answer is already in flight.
                (&mut self.rx).await.unwrap_or(Resolution::Closed)
            }
        };

        self.settled = true;
        match resolution {
            Resolution::Result(payload) => Ok(payload),
            Resolution::Error {
                code,
                description,
                details,
            } => Err(CallError::Protocol {
                action: self.action.clone(),
                code,
                description,
                details,
            }),
            Resolution::Closed => Err(CallError::Closed {
                action: self.action.clone(),
            }),
        }
    }
}

impl Drop for PendingCall {
    fn drop(&mut self) {
        if !self.settled && self.table.remove(&self.id) {
            debug!(id = %self.id, action = %self.action, "pending call cancelled");
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn table() -> Arc<CorrelationTable> {
        Arc::new(CorrelationTable::new())
    }

    #[tokio::test]
    async fn test_register_and_resolve() {
        let table = table();
        let call = table.register("Heartbeat");
        assert_eq!(table.len(), 1);

        assert!(table.resolve(call.id(), Resolution::Result(json!({"ok": true}))));
        assert!(table.is_empty());

        let response = call.wait(Duration::from_secs(1)).await.unwrap();
        assert_eq!(response, json!({"ok": true}));
    }

    #[tokio::test]
    async fn test_resolve_unknown_is_noop() {
        let table = table();
        assert!(!table.resolve(&CorrelationId::from("99"), Resolution::Result(json!({}))));
    }

    #[tokio::test]
    async fn test_resolve_twice_fulfils_once() {
        let table = table();
        let call = table.register("Heartbeat");
        let id = call.id().clone();

        assert!(table.resolve(&id, Resolution::Result(json!(1))));
        assert!(!table.resolve(&id, Resolution::Result(json!(2))));
        assert_eq!(call.wait(Duration::from_secs(1)).await.unwrap(), json!(1));
    }

    #[tokio::test]
    async fn test_resolving_one_never_fulfils_another() {
        let table = table();
        let first = table.register("A");
        let second = table.register("B");
        assert_ne!(first.id(), second.id());

        table.resolve(second.id(), Resolution::Result(json!("b")));
        assert!(table.contains(first.id()));
        assert_eq!(second.wait(Duration::from_secs(1)).await.unwrap(), json!("b"));
    }

    #[tokio::test]
    async fn test_error_resolution_maps_to_protocol_error() {
        let table = table();
        let call = table.register("Authorize");
        table.resolve(
            call.id(),
            Resolution::Error {
                code: ErrorCode::SecurityError,
                description: "nope".to_string(),
                details: json!({}),
            },
        );

        let error = call.wait(Duration::from_secs(1)).await.unwrap_err();
        assert!(error.is_protocol());
        assert_eq!(error.action(), "Authorize");
        assert_eq!(error.code(), Some(&ErrorCode::SecurityError));
    }

    #[tokio::test(start_paused = true)]
    async fn test_timeout_removes_entry_and_late_answer_is_discarded() {
        let table = table();
        let call = table.register("BootNotification");
        let id = call.id().clone();

        let error = call.wait(Duration::from_secs(2)).await.unwrap_err();
        match error {
            CallError::Timeout { action, elapsed } => {
                assert_eq!(action, "BootNotification");
                assert!(elapsed >= Duration::from_secs(2));
                assert!(elapsed < Duration::from_millis(2500));
            }
            other => panic!("expected timeout, got {other:?}"),
        }

        assert!(table.is_empty());
        assert!(!table.resolve(&id, Resolution::Result(json!({}))));
    }

    #[tokio::test]
    async fn test_dropping_pending_call_removes_entry() {
        let table = table();
        let call = table.register("Heartbeat");
        assert_eq!(table.len(), 1);
        drop(call);
        assert!(table.is_empty());
    }

    #[tokio::test]
    async fn test_cancelled_wait_removes_entry() {
        let table = table();
        let call = table.register("Heartbeat");
        let waiter = tokio::spawn(call.wait(Duration::from_secs(60)));
        tokio::task::yield_now().await;

        waiter.abort();
        let _ = waiter.await;
        assert!(table.is_empty());
    }

    #[tokio::test]
    async fn test_close_fails_all_pending() {
        let table = table();
        let calls: Vec<_> = (0..5).map(|i| table.register(format!("Action{i}"))).collect();

        assert_eq!(table.close(), 5);
        assert!(table.is_closed());

        for call in calls {
            let error = call.wait(Duration::from_secs(60)).await.unwrap_err();
            assert!(error.is_closed());
        }
    }

    #[tokio::test]
    async fn test_register_after_close_fails_immediately() {
        let table = table();
        table.close();

        let call = table.register("Heartbeat");
        assert!(table.is_empty());
        assert!(call.wait(Duration::from_secs(60)).await.unwrap_err().is_closed());
    }

    #[tokio::test]
    async fn test_concurrent_register_and_resolve() {
        let table = table();
        let mut handles = vec![];

        for i in 0..100u64 {
            let table = table.clone();
            handles.push(tokio::spawn(async move {
                let call = table.register("Echo");
                table.resolve(call.id(), Resolution::Result(json!(i)));
                call.wait(Duration::from_secs(1)).await.unwrap()
            }));
        }

        for (i, handle) in handles.into_iter().enumerate() {
            assert_eq!(handle.await.unwrap(), json!(i));
        }
        assert!(table.is_empty());
    }
}
