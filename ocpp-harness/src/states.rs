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

//! Reusable scenario states.
//!
//! Each function drives a [`ChargePoint`] through a short, well-known
//! sequence of messages that brings the CSMS into a given state, checking
//! the CSMS answers on the way. They are meant to be chained: a stop test
//! runs `booted`, `authorized`, `energy_transfer_started`, `stop_authorized`
//! and so on before exercising the behavior it is actually about.
//!
//! All transaction events use the charge point's current transaction id and
//! the configured EVSE and connector.

use crate::error::{HarnessError, Result};
use crate::station::{ChargePoint, TransactionEvent};
use serde_json::Value;
use tracing::info;

fn expect(step: &str, response: &Value, pointer: &str, expected: &str) -> Result<()> {
    match response.pointer(pointer).and_then(Value::as_str) {
        Some(actual) if actual == expected => Ok(()),
        actual => Err(HarnessError::unexpected(
            step,
            format!("{pointer} is {actual:?}, expected {expected:?}"),
        )),
    }
}

fn transaction_event(cp: &ChargePoint, event_type: &str, trigger_reason: &str) -> TransactionEvent {
    TransactionEvent::new(
        event_type,
        trigger_reason,
        cp.next_sequence(),
        cp.transaction_id(),
    )
}

async fn report_connector(cp: &ChargePoint, status: &str) -> Result<()> {
    cp.send_status_notification(status).await?;
    cp.send_connector_availability(status).await?;
    Ok(())
}

/// Boots the station: BootNotification, which must be accepted, then the
/// connector reports `Available`.
///
/// Returns the BootNotification response.
pub async fn booted(cp: &ChargePoint) -> Result<Value> {
    let response = cp.send_boot_notification().await?;
    expect("BootNotification", &response, "/status", "Accepted")?;
    cp.send_status_notification("Available").await?;
    info!(charge_point = %cp.config().charge_point_id, "booted");
    Ok(response)
}

/// An EV drives into the parking bay.
pub async fn parking_bay_occupied(cp: &ChargePoint) -> Result<Value> {
    let event = transaction_event(cp, "Updated", "EVDetected")
        .with_evse(cp.config().evse_id, cp.config().connector_id);
    Ok(cp.send_transaction_event(&event).await?)
}

/// The EV is plugged in before the driver authorizes.
pub async fn ev_connected_pre_session(cp: &ChargePoint) -> Result<Value> {
    report_connector(cp, "Occupied").await?;
    let event = transaction_event(cp, cp.transaction_event_type(), "CablePluggedIn")
        .with_charging_state("EVConnected")
        .with_evse(cp.config().evse_id, cp.config().connector_id);
    Ok(cp.send_transaction_event(&event).await?)
}

/// The driver authorizes locally with `id_token`.
///
/// The Authorize answer must report `idTokenInfo.status` `Accepted`; so must
/// the TransactionEvent answer when it carries `idTokenInfo` at all. Returns
/// the TransactionEvent response.
pub async fn authorized(cp: &ChargePoint, id_token: &str, token_type: &str) -> Result<Value> {
    let response = cp.send_authorize(id_token, token_type).await?;
    expect("Authorize", &response, "/idTokenInfo/status", "Accepted")?;

    let event = transaction_event(cp, cp.transaction_event_type(), "Authorized")
        .with_id_token(id_token, token_type)
        .with_evse(cp.config().evse_id, cp.config().connector_id);
    let response = cp.send_transaction_event(&event).await?;
    if response.get("idTokenInfo").is_some() {
        expect("TransactionEvent", &response, "/idTokenInfo/status", "Accepted")?;
    }
    Ok(response)
}

/// Energy starts flowing.
///
/// Unless `ev_connected`, the connector first reports `Occupied` and the
/// cable is plugged in.
pub async fn energy_transfer_started(cp: &ChargePoint, ev_connected: bool) -> Result<Value> {
    if !ev_connected {
        report_connector(cp, "Occupied").await?;
        let event = transaction_event(cp, "Updated", "CablePluggedIn")
            .with_charging_state("EVConnected")
            .with_evse(cp.config().evse_id, cp.config().connector_id);
        cp.send_transaction_event(&event).await?;
    }

    let event = transaction_event(cp, "Updated", "ChargingStateChanged")
        .with_charging_state("Charging")
        .with_evse(cp.config().evse_id, cp.config().connector_id);
    Ok(cp.send_transaction_event(&event).await?)
}

/// The EV suspends the energy transfer.
pub async fn energy_transfer_suspended(cp: &ChargePoint) -> Result<Value> {
    let event = transaction_event(cp, "Updated", "ChargingStateChanged")
        .with_charging_state("SuspendedEV")
        .with_evse(cp.config().evse_id, cp.config().connector_id);
    Ok(cp.send_transaction_event(&event).await?)
}

/// The driver presents `id_token` to stop; `idTokenInfo.status` must be
/// `Accepted`.
pub async fn stop_authorized(cp: &ChargePoint, id_token: &str, token_type: &str) -> Result<Value> {
    let event = transaction_event(cp, "Updated", "StopAuthorized").with_id_token(id_token, token_type);
    let response = cp.send_transaction_event(&event).await?;
    expect("TransactionEvent", &response, "/idTokenInfo/status", "Accepted")?;
    Ok(response)
}

/// Energy transfer has stopped and the EV is still plugged in.
pub async fn ev_connected_post_session(cp: &ChargePoint) -> Result<Value> {
    let event =
        transaction_event(cp, "Updated", "ChargingStateChanged").with_charging_state("EVConnected");
    Ok(cp.send_transaction_event(&event).await?)
}

/// The EV is unplugged, which ends the transaction.
///
/// The next transaction event after this one starts a new transaction.
pub async fn ev_disconnected(cp: &ChargePoint) -> Result<Value> {
    report_connector(cp, "Available").await?;
    let event = transaction_event(cp, "Ended", "EVCommunicationLost")
        .with_charging_state("Idle")
        .with_stopped_reason("EVDisconnected");
    let response = cp.send_transaction_event(&event).await?;
    cp.session().end_transaction();
    Ok(response)
}
