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

//! Counters describing the traffic of one endpoint.
//!
//! Counters are atomics that scenario code can read at any time. With the
//! `observability` feature they are also exported through the `metrics`
//! crate under `ocpp.endpoint.*`.

use std::sync::atomic::{AtomicU64, Ordering};

/// Traffic counters of one endpoint.
///
/// # Examples
///
/// ```rust
/// use ocpp_harness::observability::EndpointMetrics;
///
/// let metrics = EndpointMetrics::new();
/// metrics.record_call_sent();
/// metrics.record_result_received();
///
/// assert_eq!(metrics.calls_sent(), 1);
/// assert_eq!(metrics.results_received(), 1);
/// assert_eq!(metrics.outstanding_calls(), 0);
/// ```
#[derive(Debug, Default)]
pub struct EndpointMetrics {
    /// Outbound calls written to the transport
    calls_sent: AtomicU64,
    /// CallResult frames matched to a pending call
    results_received: AtomicU64,
    /// CallError frames matched to a pending call
    errors_received: AtomicU64,
    /// Outbound calls that hit their deadline
    timeouts: AtomicU64,
    /// Inbound calls handed to the dispatcher
    inbound_calls: AtomicU64,
    /// Inbound calls answered with a CallError
    dispatch_failures: AtomicU64,
    /// Messages that could not be classified as a frame
    dropped_frames: AtomicU64,
    /// Answers for unknown, expired or already answered calls
    late_results: AtomicU64,
}

impl EndpointMetrics {
    /// Creates zeroed counters.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Records an outbound call.
    pub fn record_call_sent(&self) {
        self.calls_sent.fetch_add(1, Ordering::Relaxed);
        #[cfg(feature = "observability")]
        ::metrics::counter!("ocpp.endpoint.calls.sent").increment(1);
    }

    /// Records a matched CallResult.
    pub fn record_result_received(&self) {
        self.results_received.fetch_add(1, Ordering::Relaxed);
        #[cfg(feature = "observability")]
        ::metrics::counter!("ocpp.endpoint.results.received").increment(1);
    }

    /// Records a matched CallError.
    pub fn record_error_received(&self) {
        self.errors_received.fetch_add(1, Ordering::Relaxed);
        #[cfg(feature = "observability")]
        ::metrics::counter!("ocpp.endpoint.errors.received").increment(1);
    }

    /// Records an outbound call timing out.
    pub fn record_timeout(&self) {
        self.timeouts.fetch_add(1, Ordering::Relaxed);
        #[cfg(feature = "observability")]
        ::metrics::counter!("ocpp.endpoint.calls.timeout").increment(1);
    }

    /// Records an inbound call.
    pub fn record_inbound_call(&self) {
        self.inbound_calls.fetch_add(1, Ordering::Relaxed);
        #[cfg(feature = "observability")]
        ::metrics::counter!("ocpp.endpoint.inbound.calls").increment(1);
    }

    /// Records an inbound call answered with a CallError.
    pub fn record_dispatch_failure(&self) {
        self.dispatch_failures.fetch_add(1, Ordering::Relaxed);
        #[cfg(feature = "observability")]
        ::metrics::counter!("ocpp.endpoint.inbound.failures").increment(1);
    }

    /// Records a message that was not a valid frame.
    pub fn record_dropped_frame(&self) {
        self.dropped_frames.fetch_add(1, Ordering::Relaxed);
        #[cfg(feature = "observability")]
        ::metrics::counter!("ocpp.endpoint.frames.dropped").increment(1);
    }

    /// Records an answer nobody was waiting for.
    pub fn record_late_result(&self) {
        self.late_results.fetch_add(1, Ordering::Relaxed);
        #[cfg(feature = "observability")]
        ::metrics::counter!("ocpp.endpoint.results.late").increment(1);
    }

    /// Outbound calls sent.
    pub fn calls_sent(&self) -> u64 {
        self.calls_sent.load(Ordering::Relaxed)
    }

    /// CallResults matched.
    pub fn results_received(&self) -> u64 {
        self.results_received.load(Ordering::Relaxed)
    }

    /// CallErrors matched.
    pub fn errors_received(&self) -> u64 {
        self.errors_received.load(Ordering::Relaxed)
    }

    /// Outbound calls timed out.
    pub fn timeouts(&self) -> u64 {
        self.timeouts.load(Ordering::Relaxed)
    }

    /// Inbound calls dispatched.
    pub fn inbound_calls(&self) -> u64 {
        self.inbound_calls.load(Ordering::Relaxed)
    }

    /// Inbound calls answered with a CallError.
    pub fn dispatch_failures(&self) -> u64 {
        self.dispatch_failures.load(Ordering::Relaxed)
    }

    /// Messages dropped as malformed.
    pub fn dropped_frames(&self) -> u64 {
        self.dropped_frames.load(Ordering::Relaxed)
    }

    /// Answers discarded because no call was waiting.
    pub fn late_results(&self) -> u64 {
        self.late_results.load(Ordering::Relaxed)
    }

    /// Calls sent that have not yet been answered, timed out, or failed.
    ///
    /// Calls failed by a closing connection are still counted.
    pub fn outstanding_calls(&self) -> u64 {
        let settled = self.results_received() + self.errors_received() + self.timeouts();
        self.calls_sent().saturating_sub(settled)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_counters_start_at_zero() {
        let metrics = EndpointMetrics::new();
        assert_eq!(metrics.calls_sent(), 0);
        assert_eq!(metrics.inbound_calls(), 0);
        assert_eq!(metrics.dropped_frames(), 0);
        assert_eq!(metrics.outstanding_calls(), 0);
    }

    #[test]
    fn test_outstanding_calls() {
        let metrics = EndpointMetrics::new();
        for _ in 0..4 {
            metrics.record_call_sent();
        }
        metrics.record_result_received();
        metrics.record_error_received();
        metrics.record_timeout();
        assert_eq!(metrics.outstanding_calls(), 1);
    }

    #[test]
    fn test_inbound_counters() {
        let metrics = EndpointMetrics::new();
        metrics.record_inbound_call();
        metrics.record_inbound_call();
        metrics.record_dispatch_failure();
        metrics.record_dropped_frame();
        metrics.record_late_result();
        assert_eq!(metrics.inbound_calls(), 2);
        assert_eq!(metrics.dispatch_failures(), 1);
        assert_eq!(metrics.dropped_frames(), 1);
        assert_eq!(metrics.late_results(), 1);
    }
}
