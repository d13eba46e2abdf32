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

//! The endpoint facade.
//!
//! An [`Endpoint`] owns one connection. It runs a receive loop that answers
//! inbound calls through a [`Dispatcher`](crate::dispatch::Dispatcher) and
//! resolves the answers to outbound calls, which scenario code issues through
//! [`Endpoint::call`] or a cloned [`Caller`].
//!
//! # Lifecycle
//!
//! 1. Build the dispatcher (see [`crate::station::default_dispatcher`])
//! 2. [`EndpointBuilder::start`] on a connected transport
//! 3. Issue calls and wait for signals
//! 4. [`Endpoint::close`], or let the peer close; pending calls then fail
//!    with `Closed`

mod builder;
mod caller;
#[allow(clippy::module_inception)]
mod endpoint;
mod tasks;

pub use builder::EndpointBuilder;
pub use caller::Caller;
pub use endpoint::Endpoint;

use std::time::Duration;

/// Call timeout used when none is configured.
pub const DEFAULT_CALL_TIMEOUT: Duration = Duration::from_secs(30);
