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

#![allow(clippy::module_inception)]
#![warn(missing_docs)]
#![warn(clippy::all)]
#![deny(unsafe_code)]

//! # ocpp-harness - OCPP charge point endpoint core
//!
//! `ocpp-harness` plays the charging station side of an OCPP-J connection so
//! that conformance scenarios can drive a CSMS under test:
//!
//! - **Request/response correlation**: outbound calls are matched with their
//!   answers by id, several may be in flight, each with its own deadline
//! - **Inbound dispatch**: CSMS-initiated calls are answered by per-action
//!   handlers, unknown actions with `NotImplemented`
//! - **Session state**: handlers capture requests and raise signals that the
//!   scenario waits on; canned responses steer the replies
//! - **Pluggable transports**: WebSocket and in-memory
//! - **Observability**: structured `tracing` logs and traffic counters
//!
//! ## Architecture
//!
//! - **[`frame`]**: the OCPP-J message frames
//! - **[`correlation`]**: pending outbound calls and their resolution
//! - **[`dispatch`]**: action handlers and the dispatcher table
//! - **[`session`]**: signals, canned responses and counters of one connection
//! - **[`transport`]**: JSON frame sources and sinks
//! - **[`endpoint`]**: the receive loop and the facade tying it together
//! - **[`station`]**: a simulated OCPP 2.0.1 charging station
//! - **[`states`]**: reusable scenario states
//!
//! ## Quick Start
//!
//! ```rust
//! use ocpp_harness::config::HarnessConfig;
//! use ocpp_harness::station::ChargePoint;
//! use ocpp_harness::transport::MemoryTransport;
//! use serde_json::json;
//!
//! # async fn example() -> Result<(), Box<dyn std::error::Error>> {
//! let (station, mut csms) = MemoryTransport::pair_default();
//! let cp = ChargePoint::start(station, HarnessConfig::default());
//!
//! let heartbeat = tokio::spawn({
//!     let caller = cp.caller();
//!     async move { caller.call("Heartbeat", json!({})).await }
//! });
//!
//! // Scripted CSMS side
//! let request = csms.receive().await?.unwrap();
//! assert_eq!(request[2], "Heartbeat");
//! csms.send(json!([3, request[1], {"currentTime": "2026-01-01T00:00:00Z"}])).await?;
//!
//! assert_eq!(heartbeat.await??["currentTime"], "2026-01-01T00:00:00Z");
//! cp.close().await;
//! # Ok(())
//! # }
//! ```
//!
//! ## Logging
//!
//! Everything logs through `tracing`. Call [`logging::init`] once to print
//! logs filtered by `RUST_LOG`.

pub mod config;
pub mod correlation;
pub mod dispatch;
pub mod endpoint;
pub mod error;
pub mod frame;
pub mod logging;
pub mod observability;
pub mod session;
pub mod states;
pub mod station;
pub mod transport;

pub use config::HarnessConfig;
pub use correlation::CallError;
pub use dispatch::Dispatcher;
pub use endpoint::{Caller, Endpoint, EndpointBuilder};
pub use error::{HarnessError, Result};
pub use frame::{ErrorCode, Frame};
pub use observability::EndpointMetrics;
pub use session::SessionState;
pub use station::ChargePoint;
pub use transport::{MemoryTransport, Transport, TransportError};
