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

//! Builder for starting an endpoint on a transport.

use super::tasks::{dispatch_task, receive_loop, writer_task};
use super::{Caller, DEFAULT_CALL_TIMEOUT, Endpoint};
use crate::config::HarnessConfig;
use crate::correlation::CorrelationTable;
use crate::dispatch::Dispatcher;
use crate::observability::EndpointMetrics;
use crate::session::SessionState;
use crate::transport::Transport;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::mpsc;
use tokio_util::sync::CancellationToken;
use tracing::{Instrument, info, info_span};

/// Builder for creating and starting endpoints.
///
/// # Examples
///
/// ```rust
/// use ocpp_harness::dispatch::{Dispatcher, handler_fn};
/// use ocpp_harness::endpoint::EndpointBuilder;
/// use ocpp_harness::transport::MemoryTransport;
/// use serde_json::json;
/// use std::time::Duration;
///
/// # async fn example() {
/// let dispatcher = Dispatcher::new()
///     .with_handler("Ping", handler_fn(|_, _| async { Ok(json!({"status": "ok"})) }));
///
/// let (station, _csms) = MemoryTransport::pair_default();
/// let endpoint = EndpointBuilder::new()
///     .with_name("CP_1")
///     .with_dispatcher(dispatcher)
///     .with_call_timeout(Duration::from_secs(5))
///     .start(station);
/// # }
/// ```
#[derive(Debug)]
pub struct EndpointBuilder {
    name: String,
    dispatcher: Dispatcher,
    call_timeout: Duration,
    session: Option<Arc<SessionState>>,
}

impl Default for EndpointBuilder {
    fn default() -> Self {
        Self {
            name: "endpoint".to_string(),
            dispatcher: Dispatcher::new(),
            call_timeout: DEFAULT_CALL_TIMEOUT,
            session: None,
        }
    }
}

impl EndpointBuilder {
    /// Creates a builder with an empty dispatcher and the default call timeout.
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates a builder named after the configured charge point and using
    /// its call timeout.
    pub fn from_config(config: &HarnessConfig) -> Self {
        Self::new()
            .with_name(config.charge_point_id.clone())
            .with_call_timeout(config.call_timeout)
    }

    /// Sets the name used in log output.
    #[must_use]
    pub fn with_name(mut self, name: impl Into<String>) -> Self {
        self.name = name.into();
        self
    }

    /// Sets the table answering inbound calls.
    #[must_use]
    pub fn with_dispatcher(mut self, dispatcher: Dispatcher) -> Self {
        self.dispatcher = dispatcher;
        self
    }

    /// Returns the dispatcher for in-place changes before starting.
    pub fn dispatcher_mut(&mut self) -> &mut Dispatcher {
        &mut self.dispatcher
    }

    /// Sets the default timeout of outbound calls.
    #[must_use]
    pub fn with_call_timeout(mut self, timeout: Duration) -> Self {
        self.call_timeout = timeout;
        self
    }

    /// Uses `session` instead of a fresh one, so the scenario can configure
    /// canned responses before the first message arrives.
    #[must_use]
    pub fn with_session(mut self, session: Arc<SessionState>) -> Self {
        self.session = Some(session);
        self
    }

    /// Takes ownership of `transport` and starts the background tasks.
    ///
    /// Must be called from within a Tokio runtime.
    pub fn start<T: Transport>(self, transport: T) -> Endpoint {
        let metadata = transport.metadata().clone();
        let (source, sink) = transport.split();

        let table = Arc::new(CorrelationTable::new());
        let metrics = Arc::new(EndpointMetrics::new());
        let session = self.session.unwrap_or_default();
        let shutdown = CancellationToken::new();
        let (outgoing_tx, outgoing_rx) = mpsc::unbounded_channel();
        let (inbound_tx, inbound_rx) = mpsc::unbounded_channel();

        let caller = Caller::new(
            Arc::clone(&table),
            outgoing_tx.clone(),
            Arc::clone(&metrics),
            self.call_timeout,
        );

        let span = info_span!("endpoint", name = %self.name, transport = %metadata);
        let tasks = vec![
            tokio::spawn(
                writer_task(sink, outgoing_rx, shutdown.clone()).instrument(span.clone()),
            ),
            tokio::spawn(
                dispatch_task(
                    inbound_rx,
                    self.dispatcher,
                    Arc::clone(&session),
                    caller.clone(),
                    outgoing_tx,
                    Arc::clone(&metrics),
                    shutdown.clone(),
                )
                .instrument(span.clone()),
            ),
            tokio::spawn(
                receive_loop(
                    source,
                    Arc::clone(&table),
                    inbound_tx,
                    Arc::clone(&metrics),
                    shutdown.clone(),
                )
                .instrument(span),
            ),
        ];
        info!(endpoint = %self.name, transport = %metadata, "endpoint started");

        Endpoint::new(
            self.name, metadata, caller, session, table, metrics, shutdown, tasks,
        )
    }
}
