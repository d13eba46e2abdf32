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

//! Background tasks of a running endpoint.
//!
//! A started endpoint runs three tasks:
//! - **Receive loop**: reads messages, classifies them, resolves answers and
//!   queues inbound calls
//! - **Dispatch task**: runs handlers one at a time in arrival order and
//!   queues their replies
//! - **Writer task**: owns the sink and writes queued messages in order
//!
//! Handlers never run on the receive loop, so a handler waiting for the
//! answer to its own outbound call does not stop that answer from being read.

use crate::correlation::{CorrelationTable, Resolution};
use crate::dispatch::{Dispatcher, HandlerContext};
use crate::endpoint::Caller;
use crate::frame::{CorrelationId, Frame};
use crate::observability::EndpointMetrics;
use crate::session::SessionState;
use crate::transport::{FrameSink, FrameSource};
use serde_json::Value;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::mpsc;
use tokio_util::sync::CancellationToken;
use tracing::{debug, error, info, warn};

/// How long the writer waits for the sink to close on shutdown.
const SINK_CLOSE_TIMEOUT: Duration = Duration::from_secs(1);

/// An inbound call waiting for the dispatch task.
#[derive(Debug)]
pub(crate) struct InboundCall {
    pub id: CorrelationId,
    pub action: String,
    pub payload: Value,
}

/// Receive loop: runs until the peer closes, the transport fails, or the
/// endpoint shuts down. Always closes the correlation table on exit.
pub(crate) async fn receive_loop(
    mut source: Box<dyn FrameSource>,
    table: Arc<CorrelationTable>,
    inbound: mpsc::UnboundedSender<InboundCall>,
    metrics: Arc<EndpointMetrics>,
    shutdown: CancellationToken,
) {
    info!("receive loop started");

    loop {
        let received = tokio::select! {
            _ = shutdown.cancelled() => {
                debug!("receive loop cancelled");
                break;
            }
            received = source.receive() => received,
        };

        match received {
            Ok(Some(message)) => route(message, &table, &inbound, &metrics),
            Ok(None) => {
                info!("peer closed the connection");
                break;
            }
            Err(e) if !e.is_fatal() => {
                warn!(error = %e, "skipping undecodable message");
                metrics.record_dropped_frame();
            }
            Err(e) => {
                error!(error = %e, "transport failed");
                break;
            }
        }
    }

    let failed = table.close();
    shutdown.cancel();
    info!(failed, "receive loop stopped");
}

fn route(
    message: Value,
    table: &CorrelationTable,
    inbound: &mpsc::UnboundedSender<InboundCall>,
    metrics: &EndpointMetrics,
) {
    let frame = match Frame::from_value(message) {
        Ok(frame) => frame,
        Err(e) => {
            warn!(error = %e, "dropping malformed frame");
            metrics.record_dropped_frame();
            return;
        }
    };

    match frame {
        Frame::Call {
            id,
            action,
            payload,
        } => {
            info!(%action, %id, "received call");
            metrics.record_inbound_call();
            if inbound
                .send(InboundCall {
                    id,
                    action,
                    payload,
                })
                .is_err()
            {
                warn!("dispatch task is gone; inbound call dropped");
            }
        }
        Frame::CallResult { id, payload } => {
            if table.resolve(&id, Resolution::Result(payload)) {
                metrics.record_result_received();
            } else {
                metrics.record_late_result();
            }
        }
        Frame::CallError {
            id,
            code,
            description,
            details,
        } => {
            let resolution = Resolution::Error {
                code,
                description,
                details,
            };
            if table.resolve(&id, resolution) {
                metrics.record_error_received();
            } else {
                metrics.record_late_result();
            }
        }
    }
}

/// Dispatch task: answers inbound calls in arrival order.
pub(crate) async fn dispatch_task(
    mut inbound: mpsc::UnboundedReceiver<InboundCall>,
    dispatcher: Dispatcher,
    session: Arc<SessionState>,
    caller: Caller,
    outgoing: mpsc::UnboundedSender<Value>,
    metrics: Arc<EndpointMetrics>,
    shutdown: CancellationToken,
) {
    loop {
        let call = tokio::select! {
            _ = shutdown.cancelled() => break,
            call = inbound.recv() => match call {
                Some(call) => call,
                None => break,
            },
        };

        let InboundCall {
            id,
            action,
            payload,
        } = call;
        let ctx = HandlerContext::new(
            action.as_str(),
            id.clone(),
            Arc::clone(&session),
            caller.clone(),
        );

        let result = tokio::select! {
            _ = shutdown.cancelled() => {
                debug!(%action, %id, "handler abandoned on shutdown");
                break;
            }
            result = dispatcher.dispatch(ctx, payload) => result,
        };

        let reply = match result {
            Ok(payload) => {
                debug!(%action, %id, "replying with CallResult");
                Frame::CallResult { id, payload }
            }
            Err(e) => {
                metrics.record_dispatch_failure();
                Frame::CallError {
                    id,
                    code: e.code,
                    description: e.description,
                    details: e.details,
                }
            }
        };

        if outgoing.send(reply.to_value()).is_err() {
            break;
        }
    }

    debug!("dispatch task stopped");
}

/// Writer task: writes queued messages until shutdown, then closes the sink.
///
/// A write failure shuts the whole endpoint down. A write blocked on a peer
/// that stopped reading is abandoned on shutdown.
pub(crate) async fn writer_task(
    mut sink: Box<dyn FrameSink>,
    mut outgoing: mpsc::UnboundedReceiver<Value>,
    shutdown: CancellationToken,
) {
    loop {
        let message = tokio::select! {
            biased;
            message = outgoing.recv() => message,
            _ = shutdown.cancelled() => None,
        };
        let Some(message) = message else {
            break;
        };

        let written = tokio::select! {
            result = sink.send(message) => result,
            _ = shutdown.cancelled() => {
                debug!("pending write abandoned on shutdown");
                break;
            }
        };
        if let Err(e) = written {
            error!(error = %e, "failed to write message");
            shutdown.cancel();
            break;
        }
    }

    match tokio::time::timeout(SINK_CLOSE_TIMEOUT, sink.close()).await {
        Ok(Ok(())) => {}
        Ok(Err(e)) => debug!(error = %e, "failed to close sink"),
        Err(_) => debug!("sink close timed out"),
    }
    debug!("writer task stopped");
}
