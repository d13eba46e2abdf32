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

//! Correlation of outbound calls with their answers.
//!
//! Every `Call` this endpoint sends is registered in the
//! [`CorrelationTable`] under a fresh id from the
//! [`CorrelationIdGenerator`]. The receive loop completes the entry when a
//! `CallResult` or `CallError` with that id arrives; the calling task waits on
//! its [`PendingCall`] with a deadline. Several calls may be in flight at once
//! and may be answered in any order.

mod error;
mod id;
mod table;

pub use error::CallError;
pub use id::CorrelationIdGenerator;
pub use table::{CorrelationTable, PendingCall, Resolution};
