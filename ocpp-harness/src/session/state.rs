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

//! Per-connection mutable session record.

use super::signal::{ArmedSignal, Signal, WaitError};
use parking_lot::Mutex;
use serde_json::Value;
use std::collections::HashMap;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::time::Duration;
use tracing::debug;
use uuid::Uuid;

/// Mutable state shared by the inbound handlers and the scenario driver for
/// the lifetime of one connection.
///
/// It holds three things:
///
/// - the outbound sequence counter used for `seqNo` fields,
/// - named [`Signal`]s, one per logical event (by convention the inbound
///   action name, e.g. `"ReserveNow"`), each with the payload that raised it,
/// - canned responses: values a scenario configures *before* triggering the
///   peer, which handlers return instead of their defaults
///   (e.g. `"ReserveNow.status" => "Rejected"`).
///
/// Every method takes `&self`; critical sections are short and never span an
/// `.await`, so the handlers and the scenario can use it concurrently.
///
/// # Example
///
/// ```rust
/// use ocpp_harness::session::SessionState;
/// use serde_json::json;
/// use std::time::Duration;
///
/// # async fn example() {
/// let session = SessionState::new();
/// session.configure("ReserveNow.status", "Rejected");
///
/// // ... a handler runs ...
/// session.raise("ReserveNow", json!({"id": 7}));
///
/// let request = session.wait_for("ReserveNow", Duration::from_secs(1)).await.unwrap();
/// assert_eq!(request["id"], 7);
/// # }
/// ```
#[derive(Debug, Default)]
pub struct SessionState {
    sequence: AtomicU64,
    transaction_started: AtomicBool,
    transaction_id: Mutex<Option<String>>,
    signals: Mutex<HashMap<String, Arc<Signal>>>,
    canned: Mutex<HashMap<String, Value>>,
}

impl SessionState {
    /// Creates an empty session.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Increments the outbound sequence counter and returns the new value.
    ///
    /// The first call returns `1`.
    pub fn next_sequence(&self) -> u64 {
        self.sequence.fetch_add(1, Ordering::AcqRel) + 1
    }

    /// Returns the last value handed out by [`next_sequence`](Self::next_sequence).
    #[must_use]
    pub fn current_sequence(&self) -> u64 {
        self.sequence.load(Ordering::Acquire)
    }

    /// Returns `"Started"` the first time it is called and `"Updated"` after.
    ///
    /// Reusable states use it to pick the `eventType` of the transaction
    /// event that may or may not open the transaction.
    pub fn transaction_event_type(&self) -> &'static str {
        if self.transaction_started.swap(true, Ordering::AcqRel) {
            "Updated"
        } else {
            "Started"
        }
    }

    /// Forgets the current transaction: the next
    /// [`transaction_event_type`](Self::transaction_event_type) is `"Started"`
    /// and the next [`transaction_id`](Self::transaction_id) is a new one.
    pub fn end_transaction(&self) {
        self.transaction_started.store(false, Ordering::Release);
        self.transaction_id.lock().take();
    }

    /// Returns a fresh transaction id (a random UUID).
    #[must_use]
    pub fn new_transaction_id(&self) -> String {
        Uuid::new_v4().to_string()
    }

    /// Returns the id of the current transaction, generating one on first use.
    pub fn transaction_id(&self) -> String {
        self.transaction_id
            .lock()
            .get_or_insert_with(|| self.new_transaction_id())
            .clone()
    }

    /// Returns the signal `name`, creating it cleared on first use.
    pub fn signal(&self, name: &str) -> Arc<Signal> {
        let mut signals = self.signals.lock();
        if let Some(signal) = signals.get(name) {
            return Arc::clone(signal);
        }
        let signal = Arc::new(Signal::new(name));
        signals.insert(name.to_string(), Arc::clone(&signal));
        signal
    }

    /// Captures `payload` under `name` and sets the signal.
    pub fn raise(&self, name: &str, payload: Value) {
        debug!(signal = name, "signal raised");
        self.signal(name).set(payload);
    }

    /// Clears the signal `name` so that the next wait observes a new event.
    pub fn clear(&self, name: &str) {
        self.signal(name).clear();
    }

    /// Clears every signal.
    pub fn clear_all(&self) {
        let signals: Vec<_> = self.signals.lock().values().cloned().collect();
        for signal in signals {
            signal.clear();
        }
    }

    /// Returns true while the signal `name` is set.
    #[must_use]
    pub fn is_set(&self, name: &str) -> bool {
        self.signal(name).is_set()
    }

    /// Waits until the signal `name` is set and returns the captured payload.
    ///
    /// Signals are level-triggered: this returns immediately while the signal
    /// is still set from an earlier event. Call [`clear`](Self::clear) first,
    /// or use [`arm`](Self::arm), to wait for the next one.
    ///
    /// # Errors
    ///
    /// Returns [`WaitError::Timeout`] if the signal is not set within `timeout`.
    pub async fn wait_for(&self, name: &str, timeout: Duration) -> Result<Value, WaitError> {
        let signal = self.signal(name);
        signal.wait(timeout).await
    }

    /// Starts watching `name` for the next set, ignoring any earlier one.
    ///
    /// Arm before triggering the peer, then wait on the result.
    #[must_use]
    pub fn arm(&self, name: &str) -> ArmedSignal {
        self.signal(name).arm()
    }

    /// Returns the payload captured for `name`, if the signal is set.
    #[must_use]
    pub fn last_payload(&self, name: &str) -> Option<Value> {
        self.signal(name).payload()
    }

    /// Returns the payload captured for `name` and clears the signal.
    pub fn take(&self, name: &str) -> Option<Value> {
        self.signal(name).take()
    }

    /// Sets the canned response `key` to `value`.
    ///
    /// The value stays in effect until it is changed or
    /// [`unconfigure`](Self::unconfigure)d.
    pub fn configure(&self, key: impl Into<String>, value: impl Into<Value>) {
        let key = key.into();
        let value = value.into();
        debug!(%key, %value, "canned response configured");
        self.canned.lock().insert(key, value);
    }

    /// Removes the canned response `key`, returning its value.
    pub fn unconfigure(&self, key: &str) -> Option<Value> {
        self.canned.lock().remove(key)
    }

    /// Returns the canned response `key`, if configured.
    #[must_use]
    pub fn configured(&self, key: &str) -> Option<Value> {
        self.canned.lock().get(key).cloned()
    }

    /// Returns the canned response `key`, or `default` when not configured.
    pub fn response_or(&self, key: &str, default: impl Into<Value>) -> Value {
        self.configured(key).unwrap_or_else(|| default.into())
    }
}
