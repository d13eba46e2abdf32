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

//! Wait-able signals raised by inbound handlers.

use serde_json::Value;
use std::time::Duration;
use thiserror::Error;
use tokio::sync::watch;

/// Failure to observe a signal.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum WaitError {
    /// The signal was not set within the timeout.
    #[error("signal '{signal}' was not raised within {timeout:?}")]
    Timeout {
        /// Name of the signal.
        signal: String,
        /// How long the caller waited.
        timeout: Duration,
    },

    /// The session owning the signal was dropped.
    #[error("signal '{signal}' was dropped with its session")]
    Dropped {
        /// Name of the signal.
        signal: String,
    },
}

impl WaitError {
    /// Returns true if the wait timed out.
    #[must_use]
    pub const fn is_timeout(&self) -> bool {
        matches!(self, Self::Timeout { .. })
    }
}

#[derive(Debug, Clone, Default)]
struct SignalState {
    /// Bumped on every `set`.
    generation: u64,
    /// Payload of the most recent `set`, `None` while cleared.
    payload: Option<Value>,
    /// Payload of the most recent `set`, kept across `clear` and `take`.
    last: Option<Value>,
}

/// A named, level-triggered, re-armable event with the payload that raised it.
///
/// Handlers [`set`](Self::set) it when an inbound message arrives. Scenario
/// code either:
///
/// - [`wait`](Self::wait)s, which returns immediately while the signal is
///   set. To observe the *next* occurrence the signal must be
///   [`clear`](Self::clear)ed first, otherwise the previous payload is
///   returned again.
/// - [`arm`](Self::arm)s it before triggering the peer and then waits on the
///   returned [`ArmedSignal`], which only completes on a `set` that happened
///   after arming, regardless of what was set before.
#[derive(Debug)]
pub struct Signal {
    name: String,
    state: watch::Sender<SignalState>,
}

impl Signal {
    /// Creates a cleared signal.
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            state: watch::Sender::new(SignalState::default()),
        }
    }

    /// Returns the signal name.
    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Captures `payload` and sets the signal, waking every waiter.
    pub fn set(&self, payload: Value) {
        self.state.send_modify(|state| {
            state.generation += 1;
            state.last = Some(payload.clone());
            state.payload = Some(payload);
        });
    }

    /// Clears the signal and forgets the captured payload.
    pub fn clear(&self) {
        self.state.send_modify(|state| state.payload = None);
    }

    /// Returns the captured payload and clears the signal in one step.
    pub fn take(&self) -> Option<Value> {
        let mut taken = None;
        self.state.send_modify(|state| taken = state.payload.take());
        taken
    }

    /// Returns true while the signal is set.
    #[must_use]
    pub fn is_set(&self) -> bool {
        self.state.borrow().payload.is_some()
    }

    /// Returns the payload captured by the last `set`, if not cleared since.
    #[must_use]
    pub fn payload(&self) -> Option<Value> {
        self.state.borrow().payload.clone()
    }

    /// Returns how many times the signal has been set.
    #[must_use]
    pub fn generation(&self) -> u64 {
        self.state.borrow().generation
    }

    /// Waits until the signal is set and returns its payload.
    ///
    /// # Errors
    ///
    /// Returns [`WaitError::Timeout`] if the signal stays cleared for `timeout`.
    pub async fn wait(&self, timeout: Duration) -> Result<Value, WaitError> {
        let mut rx = self.state.subscribe();
        let state = wait_on(&self.name, &mut rx, timeout, |state| state.payload.is_some()).await?;
        state.payload.ok_or_else(|| WaitError::Dropped {
            signal: self.name.clone(),
        })
    }

    /// Starts watching for the next `set`.
    #[must_use]
    pub fn arm(&self) -> ArmedSignal {
        let rx = self.state.subscribe();
        let generation = rx.borrow().generation;
        ArmedSignal {
            name: self.name.clone(),
            rx,
            generation,
        }
    }
}

/// A signal observation that only completes on a `set` after arming.
#[derive(Debug)]
pub struct ArmedSignal {
    name: String,
    rx: watch::Receiver<SignalState>,
    generation: u64,
}

impl ArmedSignal {
    /// Returns the signal name.
    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Waits for the first `set` after [`Signal::arm`] and returns its payload.
    ///
    /// A `set` that was cleared again before this is polled still counts.
    ///
    /// # Errors
    ///
    /// Returns [`WaitError::Timeout`] if no such `set` happens within `timeout`.
    pub async fn wait(mut self, timeout: Duration) -> Result<Value, WaitError> {
        let armed_at = self.generation;
        let state = wait_on(&self.name, &mut self.rx, timeout, |state| {
            state.generation > armed_at
        })
        .await?;
        state.last.ok_or_else(|| WaitError::Dropped { signal: self.name })
    }
}

async fn wait_on(
    name: &str,
    rx: &mut watch::Receiver<SignalState>,
    timeout: Duration,
    ready: impl FnMut(&SignalState) -> bool,
) -> Result<SignalState, WaitError> {
    match tokio::time::timeout(timeout, rx.wait_for(ready)).await {
        Ok(Ok(state)) => Ok(state.clone()),
        Ok(Err(_)) => Err(WaitError::Dropped {
            signal: name.to_string(),
        }),
        Err(_) => Err(WaitError::Timeout {
            signal: name.to_string(),
            timeout,
        }),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use std::sync::Arc;

    #[tokio::test]
    async fn test_wait_returns_immediately_when_set() {
        let signal = Signal::new("ReserveNow");
        signal.set(json!({"id": 1}));
        assert!(signal.is_set());
        assert_eq!(
            signal.wait(Duration::from_millis(10)).await.unwrap(),
            json!({"id": 1})
        );
    }

    #[tokio::test]
    async fn test_wait_wakes_on_set() {
        let signal = Arc::new(Signal::new("Reset"));
        let waiter = {
            let signal = signal.clone();
            tokio::spawn(async move { signal.wait(Duration::from_secs(5)).await })
        };
        tokio::task::yield_now().await;

        signal.set(json!({"type": "Immediate"}));
        assert_eq!(waiter.await.unwrap().unwrap(), json!({"type": "Immediate"}));
    }

    #[tokio::test(start_paused = true)]
    async fn test_clear_then_wait_ignores_previous_payload() {
        let signal = Arc::new(Signal::new("TriggerMessage"));
        signal.set(json!({"requestedMessage": "Heartbeat"}));
        signal.clear();
        assert!(!signal.is_set());
        assert_eq!(signal.payload(), None);

        let waiter = {
            let signal = signal.clone();
            tokio::spawn(async move { signal.wait(Duration::from_secs(5)).await })
        };
        tokio::time::sleep(Duration::from_secs(1)).await;
        assert!(!waiter.is_finished());

        signal.set(json!({"requestedMessage": "BootNotification"}));
        assert_eq!(
            waiter.await.unwrap().unwrap(),
            json!({"requestedMessage": "BootNotification"})
        );
    }

    #[tokio::test(start_paused = true)]
    async fn test_wait_times_out() {
        let signal = Signal::new("GetLog");
        let error = signal.wait(Duration::from_secs(3)).await.unwrap_err();
        assert!(error.is_timeout());
        assert_eq!(
            error,
            WaitError::Timeout {
                signal: "GetLog".to_string(),
                timeout: Duration::from_secs(3),
            }
        );
    }

    #[tokio::test(start_paused = true)]
    async fn test_armed_signal_skips_stale_set() {
        let signal = Signal::new("SetVariables");
        signal.set(json!("stale"));

        let armed = signal.arm();
        let error = armed.wait(Duration::from_secs(1)).await.unwrap_err();
        assert!(error.is_timeout());

        let armed = signal.arm();
        signal.set(json!("fresh"));
        assert_eq!(armed.wait(Duration::from_secs(1)).await.unwrap(), json!("fresh"));
    }

    #[tokio::test(start_paused = true)]
    async fn test_armed_signal_sees_set_cleared_before_wait() {
        let signal = Signal::new("RequestStartTransaction");
        let armed = signal.arm();
        signal.set(json!({"remoteStartId": 7}));
        signal.clear();

        assert_eq!(
            armed.wait(Duration::from_secs(1)).await.unwrap(),
            json!({"remoteStartId": 7})
        );

        let armed = signal.arm();
        signal.set(json!({"remoteStartId": 8}));
        assert_eq!(signal.take(), Some(json!({"remoteStartId": 8})));
        assert_eq!(
            armed.wait(Duration::from_secs(1)).await.unwrap(),
            json!({"remoteStartId": 8})
        );
    }

    #[test]
    fn test_take_clears() {
        let signal = Signal::new("CostUpdated");
        signal.set(json!({"totalCost": 1.5}));
        assert_eq!(signal.generation(), 1);
        assert_eq!(signal.take(), Some(json!({"totalCost": 1.5})));
        assert!(!signal.is_set());
        assert_eq!(signal.take(), None);
    }
}
