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

//! Harness configuration.
//!
//! Everything a scenario needs to know about its environment: where the CSMS
//! lives, which identity to present, how long to wait, and which EVSE and
//! connector the station under test exposes. Values are normally read from
//! environment variables once at startup and then passed down explicitly.

use base64::Engine;
use base64::engine::general_purpose::STANDARD;
use std::fmt;
use std::str::FromStr;
use std::time::Duration;
use thiserror::Error;

/// WebSocket URL of the CSMS, without the charge point id.
pub const ENV_ADDRESS: &str = "CSMS_ADDRESS";
/// Charge point identity, also the Basic auth user name.
pub const ENV_CHARGE_POINT: &str = "BASIC_AUTH_CP";
/// Basic auth password.
pub const ENV_PASSWORD: &str = "BASIC_AUTH_CP_PASSWORD";
/// Per-call timeout in seconds.
pub const ENV_CALL_TIMEOUT: &str = "CSMS_CALL_TIMEOUT";
/// Seconds to wait for a CSMS-initiated action.
pub const ENV_ACTION_TIMEOUT: &str = "CSMS_ACTION_TIMEOUT";
/// EVSE id of the station under test.
pub const ENV_EVSE_ID: &str = "CONFIGURED_EVSE_ID";
/// Connector id of the station under test.
pub const ENV_CONNECTOR_ID: &str = "CONFIGURED_CONNECTOR_ID";

/// Errors reading the harness configuration.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ConfigError {
    /// A required environment variable is not set.
    #[error("environment variable {var} is not set")]
    Missing {
        /// Name of the variable
        var: &'static str,
    },

    /// An environment variable holds a value that cannot be used.
    #[error("environment variable {var}={value:?} is invalid: {reason}")]
    Invalid {
        /// Name of the variable
        var: &'static str,
        /// The offending value
        value: String,
        /// Why it was rejected
        reason: String,
    },
}

/// HTTP Basic credentials presented during the WebSocket upgrade.
#[derive(Clone, PartialEq, Eq)]
pub struct BasicAuth {
    /// User name, the charge point id for OCPP security profile 1.
    pub username: String,
    /// Password.
    pub password: String,
}

impl BasicAuth {
    /// Creates credentials.
    pub fn new(username: impl Into<String>, password: impl Into<String>) -> Self {
        Self {
            username: username.into(),
            password: password.into(),
        }
    }

    /// Returns the `Authorization` header value.
    ///
    /// ```rust
    /// use ocpp_harness::config::BasicAuth;
    ///
    /// let auth = BasicAuth::new("CP_1", "secret");
    /// assert_eq!(auth.header_value(), "Basic Q1BfMTpzZWNyZXQ=");
    /// ```
    pub fn header_value(&self) -> String {
        let token = STANDARD.encode(format!("{}:{}", self.username, self.password));
        format!("Basic {token}")
    }
}

impl fmt::Debug for BasicAuth {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("BasicAuth")
            .field("username", &self.username)
            .field("password", &"<redacted>")
            .finish()
    }
}

/// Configuration for one harness connection.
///
/// # Examples
///
/// ```rust
/// use ocpp_harness::config::HarnessConfig;
/// use std::time::Duration;
///
/// let config = HarnessConfig::new("ws://localhost:9000/ocpp")
///     .with_charge_point_id("CP_7")
///     .with_call_timeout(Duration::from_secs(5));
///
/// assert_eq!(config.endpoint_url(), "ws://localhost:9000/ocpp/CP_7");
/// assert_eq!(config.evse_id, 1);
/// ```
#[derive(Debug, Clone)]
pub struct HarnessConfig {
    /// WebSocket URL of the CSMS; the charge point id is appended to it.
    pub address: String,

    /// Identity of this charge point.
    ///
    /// Default: `CP_1`
    pub charge_point_id: String,

    /// Basic auth credentials, if the CSMS requires them.
    pub credentials: Option<BasicAuth>,

    /// How long an outbound call waits for its answer.
    ///
    /// Default: 30 seconds
    pub call_timeout: Duration,

    /// How long a scenario waits for the CSMS to initiate an action.
    ///
    /// Default: 30 seconds
    pub action_timeout: Duration,

    /// EVSE used by convenience calls and reusable states.
    ///
    /// Default: 1
    pub evse_id: u32,

    /// Connector used by convenience calls and reusable states.
    ///
    /// Default: 1
    pub connector_id: u32,

    /// WebSocket subprotocol requested on connect.
    ///
    /// Default: `ocpp2.0.1`
    pub subprotocol: String,

    /// Pause after the upgrade before the endpoint is handed out, giving the
    /// CSMS time to register the connection.
    ///
    /// Default: 500 milliseconds
    pub connect_delay: Duration,
}

impl Default for HarnessConfig {
    fn default() -> Self {
        Self {
            address: "ws://localhost:9000".to_string(),
            charge_point_id: "CP_1".to_string(),
            credentials: None,
            call_timeout: Duration::from_secs(30),
            action_timeout: Duration::from_secs(30),
            evse_id: 1,
            connector_id: 1,
            subprotocol: "ocpp2.0.1".to_string(),
            connect_delay: Duration::from_millis(500),
        }
    }
}

impl HarnessConfig {
    /// Creates a configuration for the CSMS at `address` with default values.
    pub fn new(address: impl Into<String>) -> Self {
        Self {
            address: address.into(),
            ..Self::default()
        }
    }

    /// Reads the configuration from the process environment.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::Missing`] if `CSMS_ADDRESS` is not set and
    /// [`ConfigError::Invalid`] if a numeric variable does not parse.
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|var| std::env::var(var).ok())
    }

    /// Reads the configuration through `lookup`, which maps a variable name
    /// to its value.
    ///
    /// ```rust
    /// use ocpp_harness::config::HarnessConfig;
    ///
    /// let config = HarnessConfig::from_lookup(|var| match var {
    ///     "CSMS_ADDRESS" => Some("ws://csms:9000".to_string()),
    ///     "BASIC_AUTH_CP" => Some("CP_9".to_string()),
    ///     _ => None,
    /// })
    /// .unwrap();
    /// assert_eq!(config.endpoint_url(), "ws://csms:9000/CP_9");
    /// ```
    ///
    /// # Errors
    ///
    /// As for [`from_env`](Self::from_env).
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let address = lookup(ENV_ADDRESS).ok_or(ConfigError::Missing { var: ENV_ADDRESS })?;
        let mut config = Self::new(address);

        if let Some(charge_point_id) = lookup(ENV_CHARGE_POINT) {
            config.charge_point_id = charge_point_id;
        }
        if let Some(password) = lookup(ENV_PASSWORD) {
            config.credentials = Some(BasicAuth::new(config.charge_point_id.clone(), password));
        }
        if let Some(secs) = parse::<u64, _>(&lookup, ENV_CALL_TIMEOUT)? {
            config.call_timeout = Duration::from_secs(secs);
        }
        if let Some(secs) = parse::<u64, _>(&lookup, ENV_ACTION_TIMEOUT)? {
            config.action_timeout = Duration::from_secs(secs);
        }
        if let Some(evse_id) = parse(&lookup, ENV_EVSE_ID)? {
            config.evse_id = evse_id;
        }
        if let Some(connector_id) = parse(&lookup, ENV_CONNECTOR_ID)? {
            config.connector_id = connector_id;
        }
        Ok(config)
    }

    /// Returns the URL to connect to: the address joined with the charge
    /// point id.
    pub fn endpoint_url(&self) -> String {
        format!(
            "{}/{}",
            self.address.trim_end_matches('/'),
            self.charge_point_id
        )
    }

    /// Sets the charge point id.
    #[must_use]
    pub fn with_charge_point_id(mut self, id: impl Into<String>) -> Self {
        self.charge_point_id = id.into();
        self
    }

    /// Sets the Basic auth credentials.
    #[must_use]
    pub fn with_credentials(mut self, credentials: BasicAuth) -> Self {
        self.credentials = Some(credentials);
        self
    }

    /// Sets the per-call timeout.
    #[must_use]
    pub fn with_call_timeout(mut self, timeout: Duration) -> Self {
        self.call_timeout = timeout;
        self
    }

    /// Sets the action timeout.
    #[must_use]
    pub fn with_action_timeout(mut self, timeout: Duration) -> Self {
        self.action_timeout = timeout;
        self
    }

    /// Sets the EVSE and connector ids.
    #[must_use]
    pub fn with_evse(mut self, evse_id: u32, connector_id: u32) -> Self {
        self.evse_id = evse_id;
        self.connector_id = connector_id;
        self
    }

    /// Sets the requested WebSocket subprotocol.
    #[must_use]
    pub fn with_subprotocol(mut self, subprotocol: impl Into<String>) -> Self {
        self.subprotocol = subprotocol.into();
        self
    }

    /// Sets the post-connect delay.
    #[must_use]
    pub fn with_connect_delay(mut self, delay: Duration) -> Self {
        self.connect_delay = delay;
        self
    }
}

fn parse<T, F>(lookup: &F, var: &'static str) -> Result<Option<T>, ConfigError>
where
    T: FromStr,
    T::Err: fmt::Display,
    F: Fn(&str) -> Option<String>,
{
    match lookup(var) {
        None => Ok(None),
        Some(value) => value
            .trim()
            .parse()
            .map(Some)
            .map_err(|e: T::Err| ConfigError::Invalid {
                var,
                reason: e.to_string(),
                value,
            }),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn lookup_from(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |var| map.get(var).cloned()
    }

    #[test]
    fn test_defaults() {
        let config = HarnessConfig::default();
        assert_eq!(config.charge_point_id, "CP_1");
        assert_eq!(config.call_timeout, Duration::from_secs(30));
        assert_eq!(config.action_timeout, Duration::from_secs(30));
        assert_eq!(config.evse_id, 1);
        assert_eq!(config.connector_id, 1);
        assert_eq!(config.subprotocol, "ocpp2.0.1");
        assert_eq!(config.connect_delay, Duration::from_millis(500));
        assert!(config.credentials.is_none());
    }

    #[test]
    fn test_from_lookup_reads_all_variables() {
        let config = HarnessConfig::from_lookup(lookup_from(&[
            ("CSMS_ADDRESS", "ws://csms.local:9000/ocpp/"),
            ("BASIC_AUTH_CP", "CP_42"),
            ("BASIC_AUTH_CP_PASSWORD", "hunter22"),
            ("CSMS_CALL_TIMEOUT", "5"),
            ("CSMS_ACTION_TIMEOUT", " 60 "),
            ("CONFIGURED_EVSE_ID", "2"),
            ("CONFIGURED_CONNECTOR_ID", "3"),
        ]))
        .unwrap();

        assert_eq!(config.endpoint_url(), "ws://csms.local:9000/ocpp/CP_42");
        assert_eq!(
            config.credentials,
            Some(BasicAuth::new("CP_42", "hunter22"))
        );
        assert_eq!(config.call_timeout, Duration::from_secs(5));
        assert_eq!(config.action_timeout, Duration::from_secs(60));
        assert_eq!(config.evse_id, 2);
        assert_eq!(config.connector_id, 3);
    }

    #[test]
    fn test_missing_address() {
        let error = HarnessConfig::from_lookup(lookup_from(&[])).unwrap_err();
        assert_eq!(error, ConfigError::Missing { var: "CSMS_ADDRESS" });
    }

    #[test]
    fn test_invalid_number() {
        let error = HarnessConfig::from_lookup(lookup_from(&[
            ("CSMS_ADDRESS", "ws://csms"),
            ("CONFIGURED_EVSE_ID", "one"),
        ]))
        .unwrap_err();
        assert!(matches!(
            error,
            ConfigError::Invalid { var: "CONFIGURED_EVSE_ID", ref value, .. } if value == "one"
        ));
    }

    #[test]
    fn test_basic_auth_header() {
        let auth = BasicAuth::new("CP_1", "password1234");
        assert_eq!(auth.header_value(), "Basic Q1BfMTpwYXNzd29yZDEyMzQ=");
        assert!(!format!("{auth:?}").contains("password1234"));
    }
}
