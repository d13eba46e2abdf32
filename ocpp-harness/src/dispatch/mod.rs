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

//! Dispatch of inbound calls to action handlers.
//!
//! The receive loop hands every inbound `Call` to the [`Dispatcher`], which
//! looks the action up in its table and runs the registered
//! [`ActionHandler`]. The handler's result becomes the `CallResult`; a
//! [`HandlerError`], an unknown action, or a panic becomes a `CallError`.

mod dispatcher;
mod handler;

pub use dispatcher::Dispatcher;
pub use handler::{
    ActionHandler, FnHandler, HandlerContext, HandlerError, handler_fn, optional, required,
    required_array,
};
