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

//! Handler trait and the context a handler runs in.

use crate::endpoint::Caller;
use crate::frame::{CorrelationId, ErrorCode};
use crate::session::SessionState;
use async_trait::async_trait;
use serde_json::{Value, json};
use std::fmt;
use std::future::Future;
use std::sync::Arc;
use thiserror::Error;

/// A handler failure, answered to the peer as a `CallError` frame.
///
/// # Examples
///
/// ```rust
/// use ocpp_harness::dispatch::HandlerError;
/// use ocpp_harness::frame::ErrorCode;
///
/// let error = HandlerError::missing_field("evseId");
/// assert_eq!(error.code, ErrorCode::OccurrenceConstraintViolation);
/// ```
#[derive(Debug, Clone, PartialEq, Error)]
#[error("{code}: {description}")]
pub struct HandlerError {
    /// Code sent to the peer.
    pub code: ErrorCode,
    /// Description sent to the peer.
    pub description: String,
    /// Details object sent to the peer.
    pub details: Value,
}

impl HandlerError {
    /// Creates an error with empty details.
    pub fn new(code: ErrorCode, description: impl Into<String>) -> Self {
        Self {
            code,
            description: description.into(),
            details: json!({}),
        }
    }

    /// `InternalError` with `description`.
    pub fn internal(description: impl Into<String>) -> Self {
        Self::new(ErrorCode::InternalError, description)
    }

    /// `NotImplemented` for `action`.
    pub fn not_implemented(action: &str) -> Self {
        Self::new(
            ErrorCode::NotImplemented,
            format!("no handler for action {action}"),
        )
    }

    /// `NotSupported` for `action`.
    pub fn not_supported(action: &str) -> Self {
        Self::new(
            ErrorCode::NotSupported,
            format!("action {action} is not supported"),
        )
    }

    /// `OccurrenceConstraintViolation` for a missing required `field`.
    pub fn missing_field(field: &str) -> Self {
        Self::new(
            ErrorCode::OccurrenceConstraintViolation,
            format!("missing required field '{field}'"),
        )
    }

    /// `TypeConstraintViolation` for a `field` of the wrong type.
    pub fn wrong_type(field: &str, expected: &str) -> Self {
        Self::new(
            ErrorCode::TypeConstraintViolation,
            format!("field '{field}' must be {expected}"),
        )
    }

    /// `FormatViolation` with `description`.
    pub fn format(description: impl Into<String>) -> Self {
        Self::new(ErrorCode::FormatViolation, description)
    }

    /// Attaches a details object.
    #[must_use]
    pub fn with_details(mut self, details: Value) -> Self {
        self.details = details;
        self
    }
}

/// Everything a handler knows about the inbound call it is answering.
///
/// Cheap to clone. The [`Caller`] lets a handler issue its own outbound
/// calls while it runs; their answers are still read by the receive loop.
#[derive(Clone)]
pub struct HandlerContext {
    action: String,
    id: CorrelationId,
    session: Arc<SessionState>,
    caller: Caller,
}

impl HandlerContext {
    /// Creates a context for the inbound call `id`.
    pub fn new(
        action: impl Into<String>,
        id: CorrelationId,
        session: Arc<SessionState>,
        caller: Caller,
    ) -> Self {
        Self {
            action: action.into(),
            id,
            session,
            caller,
        }
    }

    /// Action of the inbound call.
    pub fn action(&self) -> &str {
        &self.action
    }

    /// Correlation id chosen by the peer.
    pub fn id(&self) -> &CorrelationId {
        &self.id
    }

    /// Session state of the connection.
    pub fn session(&self) -> &Arc<SessionState> {
        &self.session
    }

    /// Handle for outbound calls on the same connection.
    pub fn caller(&self) -> &Caller {
        &self.caller
    }
}

impl fmt::Debug for HandlerContext {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("HandlerContext")
            .field("action", &self.action)
            .field("id", &self.id)
            .finish_non_exhaustive()
    }
}

/// Answers one kind of inbound call.
///
/// A handler by convention captures the payload in the session under the
/// action name, raises the matching signal, and replies with the canned
/// response the scenario configured or a sensible default.
///
/// # Examples
///
/// ```rust
/// use async_trait::async_trait;
/// use ocpp_harness::dispatch::{ActionHandler, HandlerContext, HandlerError};
/// use serde_json::{Value, json};
///
/// struct ClearCache;
///
/// #[async_trait]
/// impl ActionHandler for ClearCache {
///     async fn handle(&self, ctx: HandlerContext, payload: Value) -> Result<Value, HandlerError> {
///         ctx.session().raise(ctx.action(), payload);
///         Ok(json!({"status": ctx.session().response_or("ClearCache.status", "Accepted")}))
///     }
/// }
/// ```
#[async_trait]
pub trait ActionHandler: Send + Sync {
    /// Handles one inbound call and returns the `CallResult` payload.
    ///
    /// # Errors
    ///
    /// The error is sent back as a `CallError` frame.
    async fn handle(&self, ctx: HandlerContext, payload: Value) -> Result<Value, HandlerError>;
}

/// An [`ActionHandler`] backed by an async closure. See [`handler_fn`].
pub struct FnHandler<F> {
    f: F,
}

/// Wraps an async closure as an [`ActionHandler`].
///
/// ```rust
/// use ocpp_harness::dispatch::{Dispatcher, handler_fn};
/// use serde_json::json;
///
/// let mut dispatcher = Dispatcher::new();
/// dispatcher.register("Ping", handler_fn(|_ctx, _payload| async { Ok(json!({"status": "ok"})) }));
/// assert!(dispatcher.contains("Ping"));
/// ```
pub fn handler_fn<F, Fut>(f: F) -> FnHandler<F>
where
    F: Fn(HandlerContext, Value) -> Fut + Send + Sync + 'static,
    Fut: Future<Output = Result<Value, HandlerError>> + Send + 'static,
{
    FnHandler { f }
}

#[async_trait]
impl<F, Fut> ActionHandler for FnHandler<F>
where
    F: Fn(HandlerContext, Value) -> Fut + Send + Sync + 'static,
    Fut: Future<Output = Result<Value, HandlerError>> + Send + 'static,
{
    async fn handle(&self, ctx: HandlerContext, payload: Value) -> Result<Value, HandlerError> {
        (self.f)(ctx, payload).await
    }
}

/// Returns `payload[field]`, failing with `OccurrenceConstraintViolation`
/// if it is absent or null.
pub fn required<'a>(payload: &'a Value, field: &str) -> Result<&'a Value, HandlerError> {
    optional(payload, field).ok_or_else(|| HandlerError::missing_field(field))
}

/// Returns `payload[field]` unless it is absent or null.
pub fn optional<'a>(payload: &'a Value, field: &str) -> Option<&'a Value> {
    payload.get(field).filter(|value| !value.is_null())
}

/// Returns the array `payload[field]`.
///
/// # Errors
///
/// `OccurrenceConstraintViolation` if absent, `TypeConstraintViolation` if
/// not an array.
pub fn required_array<'a>(payload: &'a Value, field: &str) -> Result<&'a [Value], HandlerError> {
    required(payload, field)?
        .as_array()
        .map(Vec::as_slice)
        .ok_or_else(|| HandlerError::wrong_type(field, "an array"))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_required_and_optional() {
        let payload = json!({"evseId": 1, "reason": null});
        assert_eq!(required(&payload, "evseId").unwrap(), &json!(1));
        assert_eq!(optional(&payload, "reason"), None);
        assert_eq!(
            required(&payload, "reason").unwrap_err(),
            HandlerError::missing_field("reason")
        );
    }

    #[test]
    fn test_required_array() {
        let payload = json!({"setVariableData": [{"a": 1}], "other": 5});
        assert_eq!(required_array(&payload, "setVariableData").unwrap().len(), 1);
        assert_eq!(
            required_array(&payload, "other").unwrap_err().code,
            ErrorCode::TypeConstraintViolation
        );
        assert_eq!(
            required_array(&payload, "missing").unwrap_err().code,
            ErrorCode::OccurrenceConstraintViolation
        );
    }

    #[test]
    fn test_error_display_and_details() {
        let error = HandlerError::internal("boom").with_details(json!({"hint": "retry"}));
        assert_eq!(error.to_string(), "InternalError: boom");
        assert_eq!(error.details["hint"], "retry");
        assert_eq!(
            HandlerError::not_implemented("Foo").code,
            ErrorCode::NotImplemented
        );
    }
}
