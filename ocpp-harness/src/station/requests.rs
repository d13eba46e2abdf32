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

//! Payload builders for charge-point-initiated messages.
//!
//! Every function returns the JSON payload of one OCPP 2.0.1 request. Fields
//! passed as `None` are left out rather than sent as `null`.

use chrono::{SecondsFormat, Utc};
use serde_json::{Map, Value, json};

/// Model reported in BootNotification.
pub const STATION_MODEL: &str = "CP Model 1.0";
/// Vendor reported in BootNotification.
pub const STATION_VENDOR: &str = "tzi.app";

/// Current UTC time in RFC 3339 form, e.g. `2026-10-18T09:30:00.000Z`.
pub fn now() -> String {
    Utc::now().to_rfc3339_opts(SecondsFormat::Millis, true)
}

fn object(value: Value) -> Map<String, Value> {
    match value {
        Value::Object(map) => map,
        _ => Map::new(),
    }
}

fn put<V: Into<Value>>(map: &mut Map<String, Value>, key: &str, value: Option<V>) {
    if let Some(value) = value {
        map.insert(key.to_string(), value.into());
    }
}

/// BootNotification with `reason` (e.g. `PowerUp`).
pub fn boot_notification(reason: &str) -> Value {
    json!({
        "chargingStation": {
            "model": STATION_MODEL,
            "vendorName": STATION_VENDOR,
        },
        "reason": reason,
    })
}

/// StatusNotification for one connector.
pub fn status_notification(evse_id: u32, connector_id: u32, status: &str) -> Value {
    json!({
        "timestamp": now(),
        "connectorStatus": status,
        "evseId": evse_id,
        "connectorId": connector_id,
    })
}

/// NotifyEvent carrying `event_data`.
pub fn notify_event(seq_no: u64, event_data: Vec<Value>) -> Value {
    json!({
        "generatedAt": now(),
        "seqNo": seq_no,
        "eventData": event_data,
    })
}

/// A `Delta` event reporting `Connector.AvailabilityState` as `actual_value`.
pub fn connector_availability_event(
    event_id: u64,
    evse_id: u32,
    connector_id: u32,
    actual_value: &str,
) -> Value {
    json!({
        "eventId": event_id,
        "timestamp": now(),
        "trigger": "Delta",
        "actualValue": actual_value,
        "eventNotificationType": "HardWiredNotification",
        "component": {
            "name": "Connector",
            "evse": {"id": evse_id, "connectorId": connector_id},
        },
        "variable": {"name": "AvailabilityState"},
    })
}

/// An `idToken` object.
pub fn id_token(id_token: &str, token_type: &str) -> Value {
    json!({"idToken": id_token, "type": token_type})
}

/// Authorize for a plain token.
pub fn authorize(token: &str, token_type: &str) -> Value {
    json!({"idToken": id_token(token, token_type)})
}

/// Authorize with ISO 15118 data: OCSP hash data for local validation, or
/// the PEM contract certificate for central validation.
pub fn authorize_iso15118(
    token: &str,
    token_type: &str,
    certificate_hash_data: Option<Value>,
    certificate: Option<&str>,
) -> Value {
    let mut payload = object(authorize(token, token_type));
    put(&mut payload, "iso15118CertificateHashData", certificate_hash_data);
    put(&mut payload, "certificate", certificate);
    Value::Object(payload)
}

/// SignCertificate for `csr`.
pub fn sign_certificate(csr: &str, certificate_type: Option<&str>) -> Value {
    let mut payload = object(json!({"csr": csr}));
    put(&mut payload, "certificateType", certificate_type);
    Value::Object(payload)
}

/// SecurityEventNotification of `kind` at `timestamp`.
pub fn security_event_notification(kind: &str, timestamp: &str) -> Value {
    json!({"type": kind, "timestamp": timestamp})
}

/// NotifyReport part `seq_no` of report `request_id`.
pub fn notify_report(request_id: i64, seq_no: u64, report_data: Value, tbc: bool) -> Value {
    json!({
        "requestId": request_id,
        "generatedAt": now(),
        "seqNo": seq_no,
        "reportData": report_data,
        "tbc": tbc,
    })
}

/// ReservationStatusUpdate.
pub fn reservation_status_update(reservation_id: i64, status: &str) -> Value {
    json!({
        "reservationId": reservation_id,
        "reservationUpdateStatus": status,
    })
}

/// MeterValues for one EVSE. Without samples, a single `Trigger` reading of
/// `0.0` is sent.
pub fn meter_values(evse_id: u32, sampled_values: Option<Value>, timestamp: Option<&str>) -> Value {
    let sampled_values =
        sampled_values.unwrap_or_else(|| json!([{"value": 0.0, "context": "Trigger"}]));
    let timestamp = timestamp.map_or_else(now, str::to_string);
    json!({
        "evseId": evse_id,
        "meterValue": [{
            "timestamp": timestamp,
            "sampledValue": sampled_values,
        }],
    })
}

/// LogStatusNotification.
pub fn log_status_notification(status: &str, request_id: Option<i64>) -> Value {
    let mut payload = object(json!({"status": status}));
    put(&mut payload, "requestId", request_id);
    Value::Object(payload)
}

/// FirmwareStatusNotification.
pub fn firmware_status_notification(status: &str, request_id: Option<i64>) -> Value {
    let mut payload = object(json!({"status": status}));
    put(&mut payload, "requestId", request_id);
    Value::Object(payload)
}

/// PublishFirmwareStatusNotification.
pub fn publish_firmware_status_notification(
    status: &str,
    location: Option<Vec<String>>,
    request_id: Option<i64>,
) -> Value {
    let mut payload = object(json!({"status": status}));
    put(&mut payload, "location", location);
    put(&mut payload, "requestId", request_id);
    Value::Object(payload)
}

/// DataTransfer to `vendor_id`.
pub fn data_transfer(vendor_id: &str, message_id: Option<&str>, data: Option<Value>) -> Value {
    let mut payload = object(json!({"vendorId": vendor_id}));
    put(&mut payload, "messageId", message_id);
    put(&mut payload, "data", data);
    Value::Object(payload)
}

/// Heartbeat.
pub fn heartbeat() -> Value {
    json!({})
}

/// GetCertificateStatus for one OCSP request.
pub fn get_certificate_status(ocsp_request_data: Value) -> Value {
    json!({"ocspRequestData": ocsp_request_data})
}

/// Get15118EVCertificate.
pub fn get_15118_ev_certificate(schema_version: &str, action: &str, exi_request: &str) -> Value {
    json!({
        "iso15118SchemaVersion": schema_version,
        "action": action,
        "exiRequest": exi_request,
    })
}

/// NotifyMonitoringReport part `seq_no` of report `request_id`.
pub fn notify_monitoring_report(
    request_id: i64,
    seq_no: u64,
    monitor: Option<Value>,
    tbc: bool,
) -> Value {
    let mut payload = object(json!({
        "requestId": request_id,
        "seqNo": seq_no,
        "generatedAt": now(),
        "tbc": tbc,
    }));
    put(&mut payload, "monitor", monitor);
    Value::Object(payload)
}

/// NotifyCustomerInformation part `seq_no` of request `request_id`.
pub fn notify_customer_information(data: &str, seq_no: u64, request_id: i64, tbc: bool) -> Value {
    json!({
        "data": data,
        "seqNo": seq_no,
        "generatedAt": now(),
        "requestId": request_id,
        "tbc": tbc,
    })
}

/// NotifyDisplayMessages for request `request_id`.
pub fn notify_display_messages(
    request_id: i64,
    message_info: Option<Value>,
    tbc: Option<bool>,
) -> Value {
    let mut payload = object(json!({"requestId": request_id}));
    put(&mut payload, "messageInfo", message_info);
    put(&mut payload, "tbc", tbc);
    Value::Object(payload)
}

/// Builder for a TransactionEvent request.
///
/// # Examples
///
/// ```rust
/// use ocpp_harness::station::TransactionEvent;
///
/// let payload = TransactionEvent::new("Started", "CablePluggedIn", 1, "tx-1")
///     .with_charging_state("EVConnected")
///     .with_evse(1, 1)
///     .to_payload();
///
/// assert_eq!(payload["eventType"], "Started");
/// assert_eq!(payload["transactionInfo"]["chargingState"], "EVConnected");
/// assert_eq!(payload["evse"]["connectorId"], 1);
/// ```
#[derive(Debug, Clone, PartialEq)]
pub struct TransactionEvent {
    event_type: String,
    trigger_reason: String,
    seq_no: u64,
    transaction_id: String,
    timestamp: Option<String>,
    charging_state: Option<String>,
    stopped_reason: Option<String>,
    remote_start_id: Option<i64>,
    id_token: Option<Value>,
    evse: Option<(u32, Option<u32>)>,
    meter_value: Option<Value>,
    offline: Option<bool>,
}

impl TransactionEvent {
    /// Creates an event; the timestamp defaults to the time of
    /// [`to_payload`](Self::to_payload).
    pub fn new(
        event_type: impl Into<String>,
        trigger_reason: impl Into<String>,
        seq_no: u64,
        transaction_id: impl Into<String>,
    ) -> Self {
        Self {
            event_type: event_type.into(),
            trigger_reason: trigger_reason.into(),
            seq_no,
            transaction_id: transaction_id.into(),
            timestamp: None,
            charging_state: None,
            stopped_reason: None,
            remote_start_id: None,
            id_token: None,
            evse: None,
            meter_value: None,
            offline: None,
        }
    }

    /// Sets an explicit timestamp.
    #[must_use]
    pub fn with_timestamp(mut self, timestamp: impl Into<String>) -> Self {
        self.timestamp = Some(timestamp.into());
        self
    }

    /// Sets `transactionInfo.chargingState`.
    #[must_use]
    pub fn with_charging_state(mut self, state: impl Into<String>) -> Self {
        self.charging_state = Some(state.into());
        self
    }

    /// Sets `transactionInfo.stoppedReason`.
    #[must_use]
    pub fn with_stopped_reason(mut self, reason: impl Into<String>) -> Self {
        self.stopped_reason = Some(reason.into());
        self
    }

    /// Sets `transactionInfo.remoteStartId`.
    #[must_use]
    pub fn with_remote_start_id(mut self, id: i64) -> Self {
        self.remote_start_id = Some(id);
        self
    }

    /// Sets the `idToken`.
    #[must_use]
    pub fn with_id_token(mut self, token: &str, token_type: &str) -> Self {
        self.id_token = Some(id_token(token, token_type));
        self
    }

    /// Sets `evse.id` and `evse.connectorId`.
    #[must_use]
    pub fn with_evse(mut self, evse_id: u32, connector_id: u32) -> Self {
        self.evse = Some((evse_id, Some(connector_id)));
        self
    }

    /// Sets `evse.id` only.
    #[must_use]
    pub fn with_evse_id(mut self, evse_id: u32) -> Self {
        self.evse = Some((evse_id, None));
        self
    }

    /// Sets the `meterValue` array.
    #[must_use]
    pub fn with_meter_value(mut self, meter_value: Value) -> Self {
        self.meter_value = Some(meter_value);
        self
    }

    /// Marks the event as queued while offline.
    #[must_use]
    pub fn with_offline(mut self, offline: bool) -> Self {
        self.offline = Some(offline);
        self
    }

    /// Returns the `eventType`.
    pub fn event_type(&self) -> &str {
        &self.event_type
    }

    /// Builds the request payload.
    pub fn to_payload(&self) -> Value {
        let mut info = object(json!({"transactionId": self.transaction_id}));
        put(&mut info, "chargingState", self.charging_state.clone());
        put(&mut info, "stoppedReason", self.stopped_reason.clone());
        put(&mut info, "remoteStartId", self.remote_start_id);

        let mut payload = object(json!({
            "eventType": self.event_type,
            "timestamp": self.timestamp.clone().unwrap_or_else(now),
            "triggerReason": self.trigger_reason,
            "seqNo": self.seq_no,
            "transactionInfo": info,
        }));
        put(&mut payload, "idToken", self.id_token.clone());
        if let Some((id, connector_id)) = self.evse {
            let mut evse = object(json!({"id": id}));
            put(&mut evse, "connectorId", connector_id);
            payload.insert("evse".to_string(), Value::Object(evse));
        }
        put(&mut payload, "meterValue", self.meter_value.clone());
        put(&mut payload, "offline", self.offline);
        Value::Object(payload)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_now_is_rfc3339_utc() {
        let timestamp = now();
        assert!(timestamp.ends_with('Z'));
        assert!(chrono::DateTime::parse_from_rfc3339(&timestamp).is_ok());
    }

    #[test]
    fn test_boot_notification() {
        let payload = boot_notification("PowerUp");
        assert_eq!(payload["reason"], "PowerUp");
        assert_eq!(payload["chargingStation"]["vendorName"], "tzi.app");
        assert_eq!(payload["chargingStation"]["model"], "CP Model 1.0");
    }

    #[test]
    fn test_optional_fields_are_omitted() {
        let payload = sign_certificate("-----BEGIN CERTIFICATE REQUEST-----", None);
        assert!(payload.get("certificateType").is_none());

        let payload = sign_certificate("csr", Some("V2GCertificate"));
        assert_eq!(payload["certificateType"], "V2GCertificate");

        let payload = data_transfer("org.example", None, Some(json!({"k": 1})));
        assert!(payload.get("messageId").is_none());
        assert_eq!(payload["data"]["k"], 1);
    }

    #[test]
    fn test_meter_values_default_sample() {
        let payload = meter_values(2, None, Some("2026-01-01T00:00:00Z"));
        assert_eq!(payload["evseId"], 2);
        assert_eq!(payload["meterValue"][0]["timestamp"], "2026-01-01T00:00:00Z");
        assert_eq!(
            payload["meterValue"][0]["sampledValue"],
            json!([{"value": 0.0, "context": "Trigger"}])
        );
    }

    #[test]
    fn test_connector_availability_event() {
        let event = connector_availability_event(1, 1, 2, "Occupied");
        assert_eq!(event["trigger"], "Delta");
        assert_eq!(event["actualValue"], "Occupied");
        assert_eq!(event["component"]["name"], "Connector");
        assert_eq!(event["component"]["evse"]["connectorId"], 2);
        assert_eq!(event["variable"]["name"], "AvailabilityState");
    }

    #[test]
    fn test_transaction_event_payload() {
        let payload = TransactionEvent::new("Ended", "EVCommunicationLost", 7, "tx-9")
            .with_timestamp("2026-01-01T00:00:00Z")
            .with_charging_state("Idle")
            .with_stopped_reason("EVDisconnected")
            .with_id_token("ABC123", "ISO14443")
            .with_evse_id(1)
            .to_payload();

        assert_eq!(
            payload,
            json!({
                "eventType": "Ended",
                "timestamp": "2026-01-01T00:00:00Z",
                "triggerReason": "EVCommunicationLost",
                "seqNo": 7,
                "transactionInfo": {
                    "transactionId": "tx-9",
                    "chargingState": "Idle",
                    "stoppedReason": "EVDisconnected",
                },
                "idToken": {"idToken": "ABC123", "type": "ISO14443"},
                "evse": {"id": 1},
            })
        );
    }
}
