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

//! Default handlers for CSMS-initiated actions.
//!
//! Every handler captures the request payload under a signal named after the
//! action and then answers. The answer is steered through canned responses
//! in the [`SessionState`](crate::session::SessionState):
//!
//! - `"<Action>.status"` replaces the default `status` value,
//! - `"<Action>.response"` replaces the whole response payload,
//! - a few actions read further keys, listed on [`default_dispatcher`].

use crate::dispatch::{
    ActionHandler, Dispatcher, HandlerContext, HandlerError, handler_fn, optional, required,
    required_array,
};
use async_trait::async_trait;
use serde_json::{Map, Value, json};
use tracing::debug;

/// Canned-response key overriding the `status` of `action`'s reply.
pub fn status_key(action: &str) -> String {
    format!("{action}.status")
}

/// Canned-response key replacing the entire reply to `action`.
pub fn response_key(action: &str) -> String {
    format!("{action}.response")
}

/// Replies `{"status": ...}` after checking that `required` fields are present.
#[derive(Debug, Clone, Copy)]
pub struct StatusReply {
    default: &'static str,
    required: &'static [&'static str],
}

impl StatusReply {
    /// Replies `default` unless a status is configured.
    pub const fn new(default: &'static str, required: &'static [&'static str]) -> Self {
        Self { default, required }
    }
}

#[async_trait]
impl ActionHandler for StatusReply {
    async fn handle(&self, ctx: HandlerContext, payload: Value) -> Result<Value, HandlerError> {
        for field in self.required {
            required(&payload, field)?;
        }
        capture(&ctx, &payload);
        if let Some(response) = full_override(&ctx) {
            return Ok(response);
        }
        let status = ctx
            .session()
            .response_or(&status_key(ctx.action()), self.default);
        Ok(json!({"status": status}))
    }
}

/// Actions answered with a plain `{status}`, their default status, and the
/// fields their request must carry.
const STATUS_REPLIES: &[(&str, &str, &[&str])] = &[
    ("TriggerMessage", "Accepted", &["requestedMessage"]),
    ("CertificateSigned", "Accepted", &["certificateChain"]),
    ("GetBaseReport", "Accepted", &["requestId", "reportBase"]),
    ("GetReport", "Accepted", &["requestId"]),
    ("Reset", "Accepted", &["type"]),
    ("ClearCache", "Accepted", &[]),
    ("SendLocalList", "Accepted", &["versionNumber", "updateType"]),
    ("RequestStopTransaction", "Accepted", &["transactionId"]),
    ("UnlockConnector", "Unlocked", &["evseId", "connectorId"]),
    ("ChangeAvailability", "Accepted", &["operationalStatus"]),
    ("ReserveNow", "Accepted", &["id", "expiryDateTime", "idToken"]),
    ("CancelReservation", "Accepted", &["reservationId"]),
    ("UpdateFirmware", "Accepted", &["requestId", "firmware"]),
    ("PublishFirmware", "Accepted", &["location", "checksum", "requestId"]),
    ("UnpublishFirmware", "Unpublished", &["checksum"]),
    ("InstallCertificate", "Accepted", &["certificateType", "certificate"]),
    ("DeleteCertificate", "Accepted", &["certificateHashData"]),
    ("SetNetworkProfile", "Accepted", &["configurationSlot", "connectionData"]),
    ("SetChargingProfile", "Accepted", &["evseId", "chargingProfile"]),
    ("ClearChargingProfile", "Accepted", &[]),
    ("GetChargingProfiles", "Accepted", &["requestId", "chargingProfile"]),
    ("GetMonitoringReport", "Accepted", &["requestId"]),
    ("SetMonitoringBase", "Accepted", &["monitoringBase"]),
    ("SetMonitoringLevel", "Accepted", &["severity"]),
    ("CustomerInformation", "Accepted", &["requestId", "report", "clear"]),
    ("GetLog", "Accepted", &["log", "logType", "requestId"]),
    ("SetDisplayMessage", "Accepted", &["message"]),
    ("GetDisplayMessages", "Accepted", &["requestId"]),
    ("ClearDisplayMessage", "Accepted", &["id"]),
];

/// Returns a dispatcher answering every CSMS-initiated OCPP 2.0.1 action.
///
/// Besides `"<Action>.status"` and `"<Action>.response"`, these keys are
/// read:
///
/// | key | effect |
/// |---|---|
/// | `GetVariables.<component>.<variable>` | `attributeValue` reported, default `"0"` |
/// | `GetLocalListVersion.versionNumber` | reported version, default `1` |
/// | `RequestStartTransaction.transactionId` | `transactionId` of the reply |
/// | `GetTransactionStatus.messagesInQueue` | default `false` |
/// | `GetTransactionStatus.ongoingIndicator` | omitted unless set |
/// | `GetInstalledCertificateIds.certificateHashDataChain` | omitted unless set |
/// | `GetCompositeSchedule.schedule` | omitted unless set |
/// | `SetVariableMonitoring.results` | replaces the per-item results |
/// | `ClearVariableMonitoring.results` | replaces the per-id results |
///
/// # Examples
///
/// ```rust
/// use ocpp_harness::station::default_dispatcher;
///
/// let dispatcher = default_dispatcher();
/// assert!(dispatcher.contains("ReserveNow"));
/// assert!(dispatcher.contains("GetVariables"));
/// assert!(!dispatcher.contains("BootNotification"));
/// ```
pub fn default_dispatcher() -> Dispatcher {
    let mut dispatcher = Dispatcher::new();
    for (action, default, fields) in STATUS_REPLIES {
        dispatcher.register(*action, StatusReply::new(*default, *fields));
    }
    dispatcher.register("SetVariables", handler_fn(set_variables));
    dispatcher.register("GetVariables", handler_fn(get_variables));
    dispatcher.register("GetLocalListVersion", handler_fn(get_local_list_version));
    dispatcher.register(
        "RequestStartTransaction",
        handler_fn(request_start_transaction),
    );
    dispatcher.register("GetTransactionStatus", handler_fn(get_transaction_status));
    dispatcher.register("CostUpdated", handler_fn(cost_updated));
    dispatcher.register(
        "GetInstalledCertificateIds",
        handler_fn(get_installed_certificate_ids),
    );
    dispatcher.register("GetCompositeSchedule", handler_fn(get_composite_schedule));
    dispatcher.register("SetVariableMonitoring", handler_fn(set_variable_monitoring));
    dispatcher.register(
        "ClearVariableMonitoring",
        handler_fn(clear_variable_monitoring),
    );
    dispatcher
}

fn capture(ctx: &HandlerContext, payload: &Value) {
    debug!(action = ctx.action(), id = %ctx.id(), "captured request");
    ctx.session().raise(ctx.action(), payload.clone());
}

fn full_override(ctx: &HandlerContext) -> Option<Value> {
    ctx.session().configured(&response_key(ctx.action()))
}

fn status(ctx: &HandlerContext, default: &str) -> Value {
    ctx.session().response_or(&status_key(ctx.action()), default)
}

/// Inserts the canned value `<action>.<field>` into `reply` if configured.
fn put_configured(ctx: &HandlerContext, reply: &mut Map<String, Value>, field: &str) {
    if let Some(value) = ctx
        .session()
        .configured(&format!("{}.{field}", ctx.action()))
    {
        reply.insert(field.to_string(), value);
    }
}

fn component_and_variable(item: &Value) -> (Value, Value) {
    let component = item.get("component").cloned().unwrap_or_else(|| json!({}));
    let variable = item.get("variable").cloned().unwrap_or_else(|| json!({}));
    (component, variable)
}

async fn set_variables(ctx: HandlerContext, payload: Value) -> Result<Value, HandlerError> {
    let items = required_array(&payload, "setVariableData")?;
    capture(&ctx, &payload);
    if let Some(response) = full_override(&ctx) {
        return Ok(response);
    }

    let attribute_status = status(&ctx, "Accepted");
    let results: Vec<Value> = items
        .iter()
        .map(|item| {
            let (component, variable) = component_and_variable(item);
            json!({
                "attributeStatus": attribute_status,
                "component": component,
                "variable": variable,
            })
        })
        .collect();
    Ok(json!({"setVariableResult": results}))
}

async fn get_variables(ctx: HandlerContext, payload: Value) -> Result<Value, HandlerError> {
    let items = required_array(&payload, "getVariableData")?;
    capture(&ctx, &payload);
    if let Some(response) = full_override(&ctx) {
        return Ok(response);
    }

    let results: Vec<Value> = items
        .iter()
        .map(|item| {
            let (component, variable) = component_and_variable(item);
            let key = format!(
                "GetVariables.{}.{}",
                component["name"].as_str().unwrap_or_default(),
                variable["name"].as_str().unwrap_or_default(),
            );
            let value = match ctx.session().configured(&key) {
                Some(Value::String(value)) => value,
                Some(other) => other.to_string(),
                None => "0".to_string(),
            };
            json!({
                "attributeStatus": "Accepted",
                "attributeValue": value,
                "component": component,
                "variable": variable,
            })
        })
        .collect();
    Ok(json!({"getVariableResult": results}))
}

async fn get_local_list_version(
    ctx: HandlerContext,
    payload: Value,
) -> Result<Value, HandlerError> {
    capture(&ctx, &payload);
    if let Some(response) = full_override(&ctx) {
        return Ok(response);
    }
    let version = ctx
        .session()
        .response_or("GetLocalListVersion.versionNumber", 1);
    Ok(json!({"versionNumber": version}))
}

async fn request_start_transaction(
    ctx: HandlerContext,
    payload: Value,
) -> Result<Value, HandlerError> {
    required(&payload, "idToken")?;
    required(&payload, "remoteStartId")?;
    capture(&ctx, &payload);
    if let Some(response) = full_override(&ctx) {
        return Ok(response);
    }

    let mut reply = Map::new();
    reply.insert("status".to_string(), status(&ctx, "Accepted"));
    put_configured(&ctx, &mut reply, "transactionId");
    Ok(Value::Object(reply))
}

async fn get_transaction_status(
    ctx: HandlerContext,
    payload: Value,
) -> Result<Value, HandlerError> {
    capture(&ctx, &payload);
    if let Some(response) = full_override(&ctx) {
        return Ok(response);
    }

    let mut reply = Map::new();
    reply.insert(
        "messagesInQueue".to_string(),
        ctx.session()
            .response_or("GetTransactionStatus.messagesInQueue", false),
    );
    put_configured(&ctx, &mut reply, "ongoingIndicator");
    Ok(Value::Object(reply))
}

async fn cost_updated(ctx: HandlerContext, payload: Value) -> Result<Value, HandlerError> {
    required(&payload, "totalCost")?;
    required(&payload, "transactionId")?;
    capture(&ctx, &payload);
    Ok(full_override(&ctx).unwrap_or_else(|| json!({})))
}

async fn get_installed_certificate_ids(
    ctx: HandlerContext,
    payload: Value,
) -> Result<Value, HandlerError> {
    capture(&ctx, &payload);
    if let Some(response) = full_override(&ctx) {
        return Ok(response);
    }

    let mut reply = Map::new();
    reply.insert("status".to_string(), status(&ctx, "Accepted"));
    put_configured(&ctx, &mut reply, "certificateHashDataChain");
    Ok(Value::Object(reply))
}

async fn get_composite_schedule(
    ctx: HandlerContext,
    payload: Value,
) -> Result<Value, HandlerError> {
    required(&payload, "duration")?;
    required(&payload, "evseId")?;
    capture(&ctx, &payload);
    if let Some(response) = full_override(&ctx) {
        return Ok(response);
    }

    let mut reply = Map::new();
    reply.insert("status".to_string(), status(&ctx, "Accepted"));
    put_configured(&ctx, &mut reply, "schedule");
    Ok(Value::Object(reply))
}

async fn set_variable_monitoring(
    ctx: HandlerContext,
    payload: Value,
) -> Result<Value, HandlerError> {
    let items = required_array(&payload, "setMonitoringData")?;
    capture(&ctx, &payload);
    if let Some(response) = full_override(&ctx) {
        return Ok(response);
    }
    if let Some(results) = ctx.session().configured("SetVariableMonitoring.results") {
        return Ok(json!({"setMonitoringResult": results}));
    }

    let monitor_status = status(&ctx, "Accepted");
    let results: Vec<Value> = items
        .iter()
        .map(|item| {
            let (component, variable) = component_and_variable(item);
            let mut result = Map::new();
            if let Some(id) = optional(item, "id") {
                result.insert("id".to_string(), id.clone());
            }
            result.insert("status".to_string(), monitor_status.clone());
            result.insert(
                "type".to_string(),
                optional(item, "type").cloned().unwrap_or_else(|| json!("Delta")),
            );
            result.insert(
                "severity".to_string(),
                optional(item, "severity").cloned().unwrap_or_else(|| json!(0)),
            );
            result.insert("component".to_string(), component);
            result.insert("variable".to_string(), variable);
            Value::Object(result)
        })
        .collect();
    Ok(json!({"setMonitoringResult": results}))
}

async fn clear_variable_monitoring(
    ctx: HandlerContext,
    payload: Value,
) -> Result<Value, HandlerError> {
    let ids = required_array(&payload, "id")?;
    capture(&ctx, &payload);
    if let Some(response) = full_override(&ctx) {
        return Ok(response);
    }
    if let Some(results) = ctx.session().configured("ClearVariableMonitoring.results") {
        return Ok(json!({"clearMonitoringResult": results}));
    }

    let clear_status = status(&ctx, "Accepted");
    let results: Vec<Value> = ids
        .iter()
        .map(|id| json!({"id": id, "status": clear_status}))
        .collect();
    Ok(json!({"clearMonitoringResult": results}))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::endpoint::Caller;
    use crate::frame::{CorrelationId, ErrorCode};
    use crate::session::SessionState;
    use std::sync::Arc;

    fn context(action: &str, session: &Arc<SessionState>) -> HandlerContext {
        HandlerContext::new(
            action,
            CorrelationId::from("csms-1"),
            Arc::clone(session),
            Caller::detached(),
        )
    }

    async fn dispatch(session: &Arc<SessionState>, action: &str, payload: Value) -> Result<Value, HandlerError> {
        default_dispatcher()
            .dispatch(context(action, session), payload)
            .await
    }

    #[test]
    fn test_every_status_action_is_registered() {
        let dispatcher = default_dispatcher();
        for (action, _, _) in STATUS_REPLIES {
            assert!(dispatcher.contains(action), "{action} missing");
        }
        assert_eq!(dispatcher.len(), STATUS_REPLIES.len() + 10);
    }

    #[tokio::test]
    async fn test_status_reply_default_and_signal() {
        let session = Arc::new(SessionState::new());
        let request = json!({"type": "Immediate"});

        let reply = dispatch(&session, "Reset", request.clone()).await.unwrap();
        assert_eq!(reply, json!({"status": "Accepted"}));
        assert_eq!(session.last_payload("Reset"), Some(request));
    }

    #[tokio::test]
    async fn test_status_reply_canned_status() {
        let session = Arc::new(SessionState::new());
        session.configure(status_key("ReserveNow"), "Rejected");

        let reply = dispatch(
            &session,
            "ReserveNow",
            json!({"id": 3, "expiryDateTime": "2026-01-01T00:00:00Z", "idToken": {"idToken": "A", "type": "Central"}}),
        )
        .await
        .unwrap();
        assert_eq!(reply, json!({"status": "Rejected"}));
    }

    #[tokio::test]
    async fn test_unlock_connector_default() {
        let session = Arc::new(SessionState::new());
        let reply = dispatch(&session, "UnlockConnector", json!({"evseId": 1, "connectorId": 1}))
            .await
            .unwrap();
        assert_eq!(reply["status"], "Unlocked");
    }

    #[tokio::test]
    async fn test_missing_field_is_rejected_without_signal() {
        let session = Arc::new(SessionState::new());
        let error = dispatch(&session, "Reset", json!({})).await.unwrap_err();
        assert_eq!(error.code, ErrorCode::OccurrenceConstraintViolation);
        assert!(!session.is_set("Reset"));
    }

    #[tokio::test]
    async fn test_full_response_override() {
        let session = Arc::new(SessionState::new());
        session.configure(
            response_key("TriggerMessage"),
            json!({"status": "Rejected", "statusInfo": {"reasonCode": "NotEnabled"}}),
        );
        let reply = dispatch(&session, "TriggerMessage", json!({"requestedMessage": "Heartbeat"}))
            .await
            .unwrap();
        assert_eq!(reply["statusInfo"]["reasonCode"], "NotEnabled");
    }

    #[tokio::test]
    async fn test_get_variables_reports_canned_values() {
        let session = Arc::new(SessionState::new());
        session.configure("GetVariables.OCPPCommCtrlr.HeartbeatInterval", 300);

        let reply = dispatch(
            &session,
            "GetVariables",
            json!({"getVariableData": [
                {"component": {"name": "OCPPCommCtrlr"}, "variable": {"name": "HeartbeatInterval"}},
                {"component": {"name": "AuthCtrlr"}, "variable": {"name": "Enabled"}},
            ]}),
        )
        .await
        .unwrap();

        let results = reply["getVariableResult"].as_array().unwrap();
        assert_eq!(results.len(), 2);
        assert_eq!(results[0]["attributeValue"], "300");
        assert_eq!(results[0]["attributeStatus"], "Accepted");
        assert_eq!(results[1]["attributeValue"], "0");
        assert_eq!(results[1]["component"]["name"], "AuthCtrlr");
    }

    #[tokio::test]
    async fn test_set_variables_uses_canned_status() {
        let session = Arc::new(SessionState::new());
        session.configure("SetVariables.status", "Rejected");

        let reply = dispatch(
            &session,
            "SetVariables",
            json!({"setVariableData": [{
                "attributeValue": "60",
                "component": {"name": "OCPPCommCtrlr"},
                "variable": {"name": "HeartbeatInterval"},
            }]}),
        )
        .await
        .unwrap();
        assert_eq!(reply["setVariableResult"][0]["attributeStatus"], "Rejected");
        assert_eq!(reply["setVariableResult"][0]["variable"]["name"], "HeartbeatInterval");
    }

    #[tokio::test]
    async fn test_request_start_transaction_optional_id() {
        let session = Arc::new(SessionState::new());
        let request = json!({"idToken": {"idToken": "A", "type": "Central"}, "remoteStartId": 5});

        let reply = dispatch(&session, "RequestStartTransaction", request.clone())
            .await
            .unwrap();
        assert_eq!(reply, json!({"status": "Accepted"}));

        session.configure("RequestStartTransaction.transactionId", "tx-42");
        let reply = dispatch(&session, "RequestStartTransaction", request)
            .await
            .unwrap();
        assert_eq!(reply, json!({"status": "Accepted", "transactionId": "tx-42"}));
    }

    #[tokio::test]
    async fn test_get_transaction_status_defaults() {
        let session = Arc::new(SessionState::new());
        let reply = dispatch(&session, "GetTransactionStatus", json!({}))
            .await
            .unwrap();
        assert_eq!(reply, json!({"messagesInQueue": false}));

        session.configure("GetTransactionStatus.ongoingIndicator", true);
        let reply = dispatch(&session, "GetTransactionStatus", json!({"transactionId": "t"}))
            .await
            .unwrap();
        assert_eq!(reply["ongoingIndicator"], true);
    }

    #[tokio::test]
    async fn test_get_local_list_version() {
        let session = Arc::new(SessionState::new());
        let reply = dispatch(&session, "GetLocalListVersion", json!({})).await.unwrap();
        assert_eq!(reply, json!({"versionNumber": 1}));
    }

    #[tokio::test]
    async fn test_cost_updated_replies_empty() {
        let session = Arc::new(SessionState::new());
        let reply = dispatch(&session, "CostUpdated", json!({"totalCost": 1.25, "transactionId": "t"}))
            .await
            .unwrap();
        assert_eq!(reply, json!({}));
        assert!(session.is_set("CostUpdated"));
    }

    #[tokio::test]
    async fn test_set_variable_monitoring_per_item() {
        let session = Arc::new(SessionState::new());
        let reply = dispatch(
            &session,
            "SetVariableMonitoring",
            json!({"setMonitoringData": [{
                "value": 10.0,
                "type": "UpperThreshold",
                "severity": 4,
                "component": {"name": "EVSE"},
                "variable": {"name": "Power"},
            }, {
                "value": 1.0,
                "component": {"name": "EVSE"},
                "variable": {"name": "Current"},
            }]}),
        )
        .await
        .unwrap();

        let results = reply["setMonitoringResult"].as_array().unwrap();
        assert_eq!(results[0]["type"], "UpperThreshold");
        assert_eq!(results[0]["severity"], 4);
        assert_eq!(results[1]["type"], "Delta");
        assert_eq!(results[1]["severity"], 0);
        assert_eq!(results[1]["status"], "Accepted");
    }

    #[tokio::test]
    async fn test_clear_variable_monitoring_results() {
        let session = Arc::new(SessionState::new());
        let reply = dispatch(&session, "ClearVariableMonitoring", json!({"id": [1, 2]}))
            .await
            .unwrap();
        assert_eq!(
            reply,
            json!({"clearMonitoringResult": [
                {"id": 1, "status": "Accepted"},
                {"id": 2, "status": "Accepted"},
            ]})
        );

        session.configure(
            "ClearVariableMonitoring.results",
            json!([{"id": 1, "status": "NotFound"}]),
        );
        let reply = dispatch(&session, "ClearVariableMonitoring", json!({"id": [1]}))
            .await
            .unwrap();
        assert_eq!(reply["clearMonitoringResult"][0]["status"], "NotFound");
    }
}
