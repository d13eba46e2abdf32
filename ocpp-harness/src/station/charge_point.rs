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

//! The charge-point facade used by scenarios.

use super::handlers::default_dispatcher;
use super::requests::{self, TransactionEvent};
use crate::config::HarnessConfig;
use crate::correlation::CallError;
use crate::dispatch::Dispatcher;
use crate::endpoint::{Caller, Endpoint, EndpointBuilder};
use crate::session::{ArmedSignal, SessionState, WaitError};
use crate::transport::Transport;
use serde_json::Value;
use std::sync::Arc;

/// A simulated OCPP 2.0.1 charging station.
///
/// Wraps an [`Endpoint`] running the [`default_dispatcher`] and adds one
/// method per charge-point-initiated message. Every `send_*` method waits for
/// the CSMS answer and returns its payload unchanged; judging the answer is
/// up to the scenario.
///
/// # Example
///
/// ```rust,no_run
/// use ocpp_harness::config::HarnessConfig;
/// use ocpp_harness::station::ChargePoint;
///
/// # async fn example() -> ocpp_harness::Result<()> {
/// let config = HarnessConfig::from_env()?;
/// let cp = ChargePoint::connect(config).await?;
///
/// let boot = cp.send_boot_notification().await?;
/// assert_eq!(boot["status"], "Accepted");
///
/// cp.session().configure("Reset.status", "Scheduled");
/// let reset = cp.wait_for("Reset").await?;
/// println!("CSMS requested a {} reset", reset["type"]);
/// cp.close().await;
/// # Ok(())
/// # }
/// ```
#[derive(Debug)]
pub struct ChargePoint {
    endpoint: Endpoint,
    config: HarnessConfig,
}

impl ChargePoint {
    /// Connects to the CSMS described by `config` over WebSocket.
    ///
    /// # Errors
    ///
    /// Returns [`HarnessError::Transport`](crate::HarnessError::Transport) if
    /// the connection or the upgrade fails.
    #[cfg(feature = "websocket")]
    pub async fn connect(config: HarnessConfig) -> crate::Result<Self> {
        let transport = crate::transport::WebSocketTransport::connect(&config).await?;
        Ok(Self::start(transport, config))
    }

    /// Starts the station on an already connected transport.
    pub fn start<T: Transport>(transport: T, config: HarnessConfig) -> Self {
        Self::start_with(transport, config, default_dispatcher())
    }

    /// Starts the station with a custom dispatcher.
    pub fn start_with<T: Transport>(
        transport: T,
        config: HarnessConfig,
        dispatcher: Dispatcher,
    ) -> Self {
        let endpoint = EndpointBuilder::from_config(&config)
            .with_dispatcher(dispatcher)
            .start(transport);
        Self { endpoint, config }
    }

    /// The underlying endpoint.
    pub fn endpoint(&self) -> &Endpoint {
        &self.endpoint
    }

    /// The configuration the station was started with.
    pub fn config(&self) -> &HarnessConfig {
        &self.config
    }

    /// Session state shared with the handlers.
    pub fn session(&self) -> &Arc<SessionState> {
        self.endpoint.session()
    }

    /// Handle for issuing calls from other tasks.
    pub fn caller(&self) -> Caller {
        self.endpoint.caller()
    }

    /// Sends an arbitrary action.
    ///
    /// # Errors
    ///
    /// See [`Caller::call_with_timeout`].
    pub async fn call(&self, action: &str, payload: Value) -> Result<Value, CallError> {
        self.endpoint.call(action, payload).await
    }

    /// Next `seqNo`, starting at 1.
    pub fn next_sequence(&self) -> u64 {
        self.endpoint.next_sequence()
    }

    /// `"Started"` on first use in a transaction, `"Updated"` after.
    pub fn transaction_event_type(&self) -> &'static str {
        self.session().transaction_event_type()
    }

    /// Id of the current transaction.
    pub fn transaction_id(&self) -> String {
        self.session().transaction_id()
    }

    /// Sets a canned response. See [`SessionState::configure`].
    pub fn configure(&self, key: impl Into<String>, value: impl Into<Value>) {
        self.session().configure(key, value);
    }

    /// Waits for the CSMS to send `action`, at most the configured action
    /// timeout, and returns the request payload.
    ///
    /// # Errors
    ///
    /// Returns [`WaitError::Timeout`] if the request does not arrive in time.
    pub async fn wait_for(&self, action: &str) -> Result<Value, WaitError> {
        self.session()
            .wait_for(action, self.config.action_timeout)
            .await
    }

    /// Starts watching for the next `action` request. See [`SessionState::arm`].
    pub fn arm(&self, action: &str) -> ArmedSignal {
        self.session().arm(action)
    }

    /// Closes the connection.
    pub async fn close(&self) {
        self.endpoint.close().await;
    }

    /// BootNotification with reason `PowerUp`.
    pub async fn send_boot_notification(&self) -> Result<Value, CallError> {
        self.send_boot_notification_with_reason("PowerUp").await
    }

    /// BootNotification with an explicit reason.
    pub async fn send_boot_notification_with_reason(
        &self,
        reason: &str,
    ) -> Result<Value, CallError> {
        self.call("BootNotification", requests::boot_notification(reason))
            .await
    }

    /// StatusNotification for the configured EVSE and connector.
    pub async fn send_status_notification(&self, status: &str) -> Result<Value, CallError> {
        self.send_status_notification_for(self.config.evse_id, self.config.connector_id, status)
            .await
    }

    /// StatusNotification for a specific EVSE and connector.
    pub async fn send_status_notification_for(
        &self,
        evse_id: u32,
        connector_id: u32,
        status: &str,
    ) -> Result<Value, CallError> {
        self.call(
            "StatusNotification",
            requests::status_notification(evse_id, connector_id, status),
        )
        .await
    }

    /// NotifyEvent with the next sequence number.
    pub async fn send_notify_event(&self, event_data: Vec<Value>) -> Result<Value, CallError> {
        let payload = requests::notify_event(self.next_sequence(), event_data);
        self.call("NotifyEvent", payload).await
    }

    /// NotifyEvent reporting the configured connector's availability state.
    pub async fn send_connector_availability(
        &self,
        actual_value: &str,
    ) -> Result<Value, CallError> {
        let event = requests::connector_availability_event(
            self.next_sequence(),
            self.config.evse_id,
            self.config.connector_id,
            actual_value,
        );
        self.send_notify_event(vec![event]).await
    }

    /// Authorize.
    pub async fn send_authorize(&self, id_token: &str, token_type: &str) -> Result<Value, CallError> {
        self.call("Authorize", requests::authorize(id_token, token_type))
            .await
    }

    /// Authorize with ISO 15118 certificate data.
    pub async fn send_authorize_iso15118(
        &self,
        id_token: &str,
        token_type: &str,
        certificate_hash_data: Option<Value>,
        certificate: Option<&str>,
    ) -> Result<Value, CallError> {
        let payload = requests::authorize_iso15118(
            id_token,
            token_type,
            certificate_hash_data,
            certificate,
        );
        self.call("Authorize", payload).await
    }

    /// TransactionEvent.
    pub async fn send_transaction_event(
        &self,
        event: &TransactionEvent,
    ) -> Result<Value, CallError> {
        self.call("TransactionEvent", event.to_payload()).await
    }

    /// SignCertificate.
    pub async fn send_sign_certificate(
        &self,
        csr: &str,
        certificate_type: Option<&str>,
    ) -> Result<Value, CallError> {
        self.call(
            "SignCertificate",
            requests::sign_certificate(csr, certificate_type),
        )
        .await
    }

    /// SecurityEventNotification.
    pub async fn send_security_event_notification(
        &self,
        kind: &str,
        timestamp: &str,
    ) -> Result<Value, CallError> {
        self.call(
            "SecurityEventNotification",
            requests::security_event_notification(kind, timestamp),
        )
        .await
    }

    /// NotifyReport.
    pub async fn send_notify_report(
        &self,
        request_id: i64,
        seq_no: u64,
        report_data: Value,
        tbc: bool,
    ) -> Result<Value, CallError> {
        self.call(
            "NotifyReport",
            requests::notify_report(request_id, seq_no, report_data, tbc),
        )
        .await
    }

    /// ReservationStatusUpdate.
    pub async fn send_reservation_status_update(
        &self,
        reservation_id: i64,
        status: &str,
    ) -> Result<Value, CallError> {
        self.call(
            "ReservationStatusUpdate",
            requests::reservation_status_update(reservation_id, status),
        )
        .await
    }

    /// MeterValues.
    pub async fn send_meter_values(
        &self,
        evse_id: u32,
        sampled_values: Option<Value>,
        timestamp: Option<&str>,
    ) -> Result<Value, CallError> {
        self.call(
            "MeterValues",
            requests::meter_values(evse_id, sampled_values, timestamp),
        )
        .await
    }

    /// LogStatusNotification.
    pub async fn send_log_status_notification(
        &self,
        status: &str,
        request_id: Option<i64>,
    ) -> Result<Value, CallError> {
        self.call(
            "LogStatusNotification",
            requests::log_status_notification(status, request_id),
        )
        .await
    }

    /// FirmwareStatusNotification.
    pub async fn send_firmware_status_notification(
        &self,
        status: &str,
        request_id: Option<i64>,
    ) -> Result<Value, CallError> {
        self.call(
            "FirmwareStatusNotification",
            requests::firmware_status_notification(status, request_id),
        )
        .await
    }

    /// PublishFirmwareStatusNotification.
    pub async fn send_publish_firmware_status_notification(
        &self,
        status: &str,
        location: Option<Vec<String>>,
        request_id: Option<i64>,
    ) -> Result<Value, CallError> {
        self.call(
            "PublishFirmwareStatusNotification",
            requests::publish_firmware_status_notification(status, location, request_id),
        )
        .await
    }

    /// DataTransfer.
    pub async fn send_data_transfer(
        &self,
        vendor_id: &str,
        message_id: Option<&str>,
        data: Option<Value>,
    ) -> Result<Value, CallError> {
        self.call(
            "DataTransfer",
            requests::data_transfer(vendor_id, message_id, data),
        )
        .await
    }

    /// Heartbeat.
    pub async fn send_heartbeat(&self) -> Result<Value, CallError> {
        self.call("Heartbeat", requests::heartbeat()).await
    }

    /// GetCertificateStatus.
    pub async fn send_get_certificate_status(
        &self,
        ocsp_request_data: Value,
    ) -> Result<Value, CallError> {
        self.call(
            "GetCertificateStatus",
            requests::get_certificate_status(ocsp_request_data),
        )
        .await
    }

    /// Get15118EVCertificate.
    pub async fn send_get_15118_ev_certificate(
        &self,
        schema_version: &str,
        action: &str,
        exi_request: &str,
    ) -> Result<Value, CallError> {
        self.call(
            "Get15118EVCertificate",
            requests::get_15118_ev_certificate(schema_version, action, exi_request),
        )
        .await
    }

    /// NotifyMonitoringReport.
    pub async fn send_notify_monitoring_report(
        &self,
        request_id: i64,
        seq_no: u64,
        monitor: Option<Value>,
        tbc: bool,
    ) -> Result<Value, CallError> {
        self.call(
            "NotifyMonitoringReport",
            requests::notify_monitoring_report(request_id, seq_no, monitor, tbc),
        )
        .await
    }

    /// NotifyCustomerInformation.
    pub async fn send_notify_customer_information(
        &self,
        data: &str,
        seq_no: u64,
        request_id: i64,
        tbc: bool,
    ) -> Result<Value, CallError> {
        self.call(
            "NotifyCustomerInformation",
            requests::notify_customer_information(data, seq_no, request_id, tbc),
        )
        .await
    }

    /// NotifyDisplayMessages.
    pub async fn send_notify_display_messages(
        &self,
        request_id: i64,
        message_info: Option<Value>,
        tbc: Option<bool>,
    ) -> Result<Value, CallError> {
        self.call(
            "NotifyDisplayMessages",
            requests::notify_display_messages(request_id, message_info, tbc),
        )
        .await
    }
}
