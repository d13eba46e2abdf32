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

//! Simulated charging station against a scripted CSMS.

use ocpp_harness::HarnessError;
use ocpp_harness::config::HarnessConfig;
use ocpp_harness::states;
use ocpp_harness::station::{ChargePoint, status_key};
use ocpp_harness::transport::MemoryTransport;
use serde_json::{Value, json};
use std::time::Duration;
use tokio::task::JoinHandle;

fn config() -> HarnessConfig {
    HarnessConfig::new("ws://localhost:9000")
        .with_charge_point_id("CP_TEST")
        .with_evse(1, 2)
        .with_call_timeout(Duration::from_secs(5))
        .with_action_timeout(Duration::from_secs(1))
}

/// Answers every call the station makes and returns the requests seen, in
/// order, once the station goes away. Authorize answers carry `auth_status`.
fn scripted_csms(mut csms: MemoryTransport, auth_status: &'static str) -> JoinHandle<Vec<Value>> {
    tokio::spawn(async move {
        let mut seen = Vec::new();
        while let Ok(Some(message)) = csms.receive().await {
            if message[0] != 2 {
                continue;
            }
            let id = message[1].clone();
            let payload = message[3].clone();
            let response = match message[2].as_str().unwrap_or_default() {
                "BootNotification" => json!({
                    "currentTime": "2026-01-01T00:00:00Z",
                    "interval": 300,
                    "status": "Accepted",
                }),
                "Authorize" => json!({"idTokenInfo": {"status": auth_status}}),
                "TransactionEvent" if payload.get("idToken").is_some() => {
                    json!({"idTokenInfo": {"status": "Accepted"}})
                }
                _ => json!({}),
            };
            seen.push(message);
            if csms.send(json!([3, id, response])).await.is_err() {
                break;
            }
        }
        seen
    })
}

fn actions(seen: &[Value]) -> Vec<&str> {
    seen.iter().filter_map(|m| m[2].as_str()).collect()
}

#[tokio::test]
async fn test_booted_state() {
    let (station, csms) = MemoryTransport::pair_default();
    let csms = scripted_csms(csms, "Accepted");
    let cp = ChargePoint::start(station, config());

    let boot = states::booted(&cp).await.unwrap();
    assert_eq!(boot["interval"], 300);
    cp.close().await;

    let seen = csms.await.unwrap();
    assert_eq!(actions(&seen), ["BootNotification", "StatusNotification"]);
    assert_eq!(seen[0][3]["reason"], "PowerUp");
    assert_eq!(seen[1][3]["connectorStatus"], "Available");
    assert_eq!(seen[1][3]["evseId"], 1);
    assert_eq!(seen[1][3]["connectorId"], 2);
}

#[tokio::test]
async fn test_charging_session_states() {
    let (station, csms) = MemoryTransport::pair_default();
    let csms = scripted_csms(csms, "Accepted");
    let cp = ChargePoint::start(station, config());

    states::booted(&cp).await.unwrap();
    states::authorized(&cp, "ABC123", "ISO14443").await.unwrap();
    states::energy_transfer_started(&cp, false).await.unwrap();
    states::stop_authorized(&cp, "ABC123", "ISO14443").await.unwrap();
    states::ev_connected_post_session(&cp).await.unwrap();
    let transaction_id = cp.transaction_id();
    states::ev_disconnected(&cp).await.unwrap();
    assert_ne!(cp.transaction_id(), transaction_id);
    assert_eq!(cp.transaction_event_type(), "Started");
    cp.close().await;

    let seen = csms.await.unwrap();
    let events: Vec<&Value> = seen
        .iter()
        .filter(|m| m[2] == "TransactionEvent")
        .map(|m| &m[3])
        .collect();
    let event_types: Vec<&str> = events
        .iter()
        .map(|e| e["eventType"].as_str().unwrap())
        .collect();
    assert_eq!(
        event_types,
        ["Started", "Updated", "Updated", "Updated", "Updated", "Ended"]
    );
    assert!(
        events
            .iter()
            .all(|e| e["transactionInfo"]["transactionId"] == transaction_id.as_str())
    );

    let sequence: Vec<u64> = events
        .iter()
        .map(|e| e["seqNo"].as_u64().unwrap())
        .collect();
    assert!(sequence.windows(2).all(|w| w[0] < w[1]));

    let evse = json!({"id": 1, "connectorId": 2});
    assert_eq!(events[0]["triggerReason"], "Authorized");
    assert_eq!(events[0]["evse"], evse);
    assert_eq!(events[2]["transactionInfo"]["chargingState"], "Charging");
    assert_eq!(events[2]["evse"], evse);

    let last = events.last().unwrap();
    assert_eq!(last["triggerReason"], "EVCommunicationLost");
    assert_eq!(last["transactionInfo"]["stoppedReason"], "EVDisconnected");
}

#[tokio::test]
async fn test_rejected_authorization_fails_the_state() {
    let (station, csms) = MemoryTransport::pair_default();
    let _csms = scripted_csms(csms, "Invalid");
    let cp = ChargePoint::start(station, config());

    let error = states::authorized(&cp, "BAD", "ISO14443")
        .await
        .unwrap_err();
    match error {
        HarnessError::Unexpected { step, detail } => {
            assert_eq!(step, "Authorize");
            assert!(detail.contains("Invalid"), "{detail}");
        }
        other => panic!("unexpected error {other:?}"),
    }
    cp.close().await;
}

#[tokio::test]
async fn test_authorized_accepts_transaction_event_without_id_token_info() {
    let (station, mut csms) = MemoryTransport::pair_default();
    let cp = ChargePoint::start(station, config());

    let answers = tokio::spawn(async move {
        for _ in 0..2 {
            let message = csms.receive().await.unwrap().unwrap();
            let response = match message[2].as_str().unwrap() {
                "Authorize" => json!({"idTokenInfo": {"status": "Accepted"}}),
                _ => json!({}),
            };
            csms.send(json!([3, message[1], response])).await.unwrap();
        }
        csms
    });

    let response = states::authorized(&cp, "ABC123", "ISO14443").await.unwrap();
    assert_eq!(response, json!({}));
    let _csms = answers.await.unwrap();
    cp.close().await;
}

#[tokio::test]
async fn test_authorized_rejects_transaction_event_with_blocked_token() {
    let (station, mut csms) = MemoryTransport::pair_default();
    let cp = ChargePoint::start(station, config());

    let answers = tokio::spawn(async move {
        for _ in 0..2 {
            let message = csms.receive().await.unwrap().unwrap();
            let status = match message[2].as_str().unwrap() {
                "Authorize" => "Accepted",
                _ => "Blocked",
            };
            let response = json!({"idTokenInfo": {"status": status}});
            csms.send(json!([3, message[1], response])).await.unwrap();
        }
        csms
    });

    let error = states::authorized(&cp, "ABC123", "ISO14443").await.unwrap_err();
    assert!(
        matches!(&error, HarnessError::Unexpected { step, .. } if step == "TransactionEvent"),
        "{error:?}"
    );
    let _csms = answers.await.unwrap();
    cp.close().await;
}

#[tokio::test]
async fn test_canned_status_and_signal() {
    let (station, mut csms) = MemoryTransport::pair_default();
    let cp = ChargePoint::start(station, config());

    cp.configure(status_key("ReserveNow"), "Rejected");
    let reserved = cp.arm("ReserveNow");

    let request = json!({
        "id": 7,
        "expiryDateTime": "2026-01-01T01:00:00Z",
        "idToken": {"idToken": "ABC123", "type": "ISO14443"},
    });
    csms.send(json!([2, "csms-1", "ReserveNow", request.clone()]))
        .await
        .unwrap();

    let reply = csms.receive().await.unwrap().unwrap();
    assert_eq!(reply, json!([3, "csms-1", {"status": "Rejected"}]));
    assert_eq!(reserved.wait(Duration::from_secs(1)).await.unwrap(), request);
    assert_eq!(cp.wait_for("ReserveNow").await.unwrap()["id"], 7);
    cp.close().await;
}

#[tokio::test(start_paused = true)]
async fn test_wait_for_times_out_without_request() {
    let (station, _csms) = MemoryTransport::pair_default();
    let cp = ChargePoint::start(station, config());

    let error = cp.wait_for("Reset").await.unwrap_err();
    assert!(error.is_timeout());
    cp.close().await;
}

#[tokio::test]
async fn test_get_variables_reports_configured_value() {
    let (station, mut csms) = MemoryTransport::pair_default();
    let cp = ChargePoint::start(station, config());
    cp.configure("GetVariables.OCPPCommCtrlr.HeartbeatInterval", "120");

    csms.send(json!([2, "gv-1", "GetVariables", {"getVariableData": [{
        "component": {"name": "OCPPCommCtrlr"},
        "variable": {"name": "HeartbeatInterval"},
    }]}]))
    .await
    .unwrap();

    let reply = csms.receive().await.unwrap().unwrap();
    assert_eq!(reply[1], "gv-1");
    assert_eq!(reply[2]["getVariableResult"][0]["attributeValue"], "120");
    assert!(cp.session().is_set("GetVariables"));
    cp.close().await;
}

#[tokio::test]
async fn test_unsupported_csms_action_is_not_implemented() {
    let (station, mut csms) = MemoryTransport::pair_default();
    let cp = ChargePoint::start(station, config());

    csms.send(json!([2, "x-1", "BootNotification", {}])).await.unwrap();
    let reply = csms.receive().await.unwrap().unwrap();
    assert_eq!(reply[0], 4);
    assert_eq!(reply[2], "NotImplemented");
    cp.close().await;
}

#[tokio::test]
async fn test_convenience_calls_build_payloads() {
    let (station, csms) = MemoryTransport::pair_default();
    let csms = scripted_csms(csms, "Accepted");
    let cp = ChargePoint::start(station, config());

    cp.send_heartbeat().await.unwrap();
    cp.send_meter_values(1, None, None).await.unwrap();
    cp.send_data_transfer("org.example", Some("Ping"), None)
        .await
        .unwrap();
    cp.send_security_event_notification("FirmwareUpdated", "2026-01-01T00:00:00Z")
        .await
        .unwrap();
    cp.close().await;

    let seen = csms.await.unwrap();
    assert_eq!(
        actions(&seen),
        [
            "Heartbeat",
            "MeterValues",
            "DataTransfer",
            "SecurityEventNotification"
        ]
    );
    assert_eq!(seen[1][3]["meterValue"][0]["sampledValue"][0]["context"], "Trigger");
    assert_eq!(seen[2][3], json!({"vendorId": "org.example", "messageId": "Ping"}));
    assert_eq!(seen[3][3]["type"], "FirmwareUpdated");
}
