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

//! A simulated OCPP 2.0.1 charging station on top of the endpoint core.
//!
//! - [`ChargePoint`] sends charge-point-initiated messages
//! - [`default_dispatcher`] answers every CSMS-initiated action
//! - [`requests`] builds the payloads

mod charge_point;
mod handlers;
pub mod requests;

pub use charge_point::ChargePoint;
pub use handlers::{StatusReply, default_dispatcher, response_key, status_key};
pub use requests::TransactionEvent;
