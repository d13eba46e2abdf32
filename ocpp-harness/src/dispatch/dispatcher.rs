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

use super::{ActionHandler, HandlerContext, HandlerError};
use futures_util::FutureExt;
use serde_json::Value;
use std::collections::HashMap;
use std::fmt;
use std::panic::AssertUnwindSafe;
use std::sync::Arc;
use tracing::{debug, error, warn};

/// Action name to handler table.
///
/// Built before the endpoint starts and immutable afterwards. The first
/// [`register`](Self::register) of an action wins;
/// [`override_handler`](Self::override_handler) replaces an entry explicitly,
/// which is how a scenario swaps in its own behaviour for one action of a
/// default table.
///
/// # Example
///
/// ```rust
/// use ocpp_harness::dispatch::{Dispatcher, handler_fn};
/// use serde_json::json;
///
/// let mut dispatcher = Dispatcher::new();
/// assert!(dispatcher.register("Ping", handler_fn(|_, _| async { Ok(json!({"status": "ok"})) })));
/// assert!(!dispatcher.register("Ping", handler_fn(|_, _| async { Ok(json!({})) })));
///
/// dispatcher.override_handler("Ping", handler_fn(|_, _| async { Ok(json!({"status": "late"})) }));
/// assert_eq!(dispatcher.len(), 1);
/// ```
#[derive(Clone, Default)]
pub struct Dispatcher {
    handlers: HashMap<String, Arc<dyn ActionHandler>>,
}

impl Dispatcher {
    /// Creates an empty table.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers `handler` for `action` unless one is already registered.
    ///
    /// Returns `false`, leaving the table unchanged, if `action` was taken.
    pub fn register<H>(&mut self, action: impl Into<String>, handler: H) -> bool
    where
        H: ActionHandler + 'static,
    {
        let action = action.into();
        if self.handlers.contains_key(&action) {
            warn!(%action, "handler already registered; keeping the first one");
            return false;
        }
        self.handlers.insert(action, Arc::new(handler));
        true
    }

    /// Builder form of [`register`](Self::register).
    #[must_use]
    pub fn with_handler<H>(mut self, action: impl Into<String>, handler: H) -> Self
    where
        H: ActionHandler + 'static,
    {
        self.register(action, handler);
        self
    }

    /// Registers `handler` for `action`, replacing any existing handler.
    pub fn override_handler<H>(&mut self, action: impl Into<String>, handler: H)
    where
        H: ActionHandler + 'static,
    {
        let action = action.into();
        debug!(%action, "handler overridden");
        self.handlers.insert(action, Arc::new(handler));
    }

    /// Removes the handler for `action`; the action then answers `NotImplemented`.
    pub fn remove(&mut self, action: &str) -> bool {
        self.handlers.remove(action).is_some()
    }

    /// Returns true if `action` has a handler.
    #[must_use]
    pub fn contains(&self, action: &str) -> bool {
        self.handlers.contains_key(action)
    }

    /// Returns the registered action names, sorted.
    #[must_use]
    pub fn actions(&self) -> Vec<&str> {
        let mut actions: Vec<_> = self.handlers.keys().map(String::as_str).collect();
        actions.sort_unstable();
        actions
    }

    /// Number of registered actions.
    #[must_use]
    pub fn len(&self) -> usize {
        self.handlers.len()
    }

    /// Returns true if no action is registered.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.handlers.is_empty()
    }

    /// Runs the handler for `ctx.action()`.
    ///
    /// An unknown action yields `NotImplemented`. A panicking handler yields
    /// `InternalError`; the panic does not propagate.
    pub async fn dispatch(&self, ctx: HandlerContext, payload: Value) -> Result<Value, HandlerError> {
        let Some(handler) = self.handlers.get(ctx.action()).cloned() else {
            warn!(action = %ctx.action(), id = %ctx.id(), "no handler registered");
            return Err(HandlerError::not_implemented(ctx.action()));
        };

        let action = ctx.action().to_string();
        let id = ctx.id().clone();
        match AssertUnwindSafe(handler.handle(ctx, payload))
            .catch_unwind()
            .await
        {
            Ok(Ok(response)) => Ok(response),
            Ok(Err(e)) => {
                error!(%action, %id, code = %e.code, description = %e.description, "handler failed");
                Err(e)
            }
            Err(panic) => {
                let message = if let Some(s) = panic.downcast_ref::<&str>() {
                    (*s).to_string()
                } else if let Some(s) = panic.downcast_ref::<String>() {
                    s.clone()
                } else {
                    "handler panicked".to_string()
                };
                error!(%action, %id, panic = %message, "handler panicked");
                Err(HandlerError::internal(message))
            }
        }
    }
}

impl fmt::Debug for Dispatcher {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Dispatcher")
            .field("actions", &self.actions())
            .finish()
    }
}
