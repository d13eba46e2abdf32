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

//! WebSocket transport implementation.
//!
//! OCPP-J runs over a WebSocket with one JSON array per text message. The
//! client requests the OCPP subprotocol and, for security profile 1, presents
//! HTTP Basic credentials during the upgrade.
//!
//! # Examples
//!
//! ```rust,no_run
//! use ocpp_harness::config::HarnessConfig;
//! use ocpp_harness::transport::WebSocketTransport;
//!
//! # async fn example() -> Result<(), Box<dyn std::error::Error>> {
//! let config = HarnessConfig::from_env()?;
//! let transport = WebSocketTransport::connect(&config).await?;
//! # Ok(())
//! # }
//! ```

use crate::config::HarnessConfig;
use crate::transport::{FrameSink, FrameSource, Transport, TransportError, TransportMetadata};
use async_trait::async_trait;
use futures_util::stream::{SplitSink, SplitStream};
use futures_util::{SinkExt, StreamExt};
use serde_json::Value;
use std::sync::atomic::{AtomicU64, Ordering};
use tokio::net::TcpStream;
use tokio_tungstenite::tungstenite::client::IntoClientRequest;
use tokio_tungstenite::tungstenite::http::HeaderValue;
use tokio_tungstenite::tungstenite::http::header::{AUTHORIZATION, SEC_WEBSOCKET_PROTOCOL};
use tokio_tungstenite::tungstenite::{Error as WsError, Message};
use tokio_tungstenite::{MaybeTlsStream, WebSocketStream, connect_async};
use tracing::{debug, info, instrument, warn};

type Stream = WebSocketStream<MaybeTlsStream<TcpStream>>;

static NEXT_WEBSOCKET_TRANSPORT_ID: AtomicU64 = AtomicU64::new(1);

/// WebSocket transport implementation.
pub struct WebSocketTransport {
    stream: Stream,
    metadata: TransportMetadata,
}

impl WebSocketTransport {
    /// Connects to `config.endpoint_url()`.
    ///
    /// Requests `config.subprotocol`, sends the Basic `Authorization` header
    /// when credentials are configured, and waits `config.connect_delay`
    /// after the upgrade.
    ///
    /// # Errors
    ///
    /// - [`TransportError::Rejected`] if the server refuses the upgrade,
    ///   e.g. with 401 for bad credentials
    /// - [`TransportError::ConnectionFailed`] if the server cannot be reached
    /// - [`TransportError::InvalidConfiguration`] for an unusable URL or header
    #[instrument(skip(config), fields(url = %config.endpoint_url()))]
    pub async fn connect(config: &HarnessConfig) -> Result<Self, TransportError> {
        let url = config.endpoint_url();
        let mut request =
            url.as_str()
                .into_client_request()
                .map_err(|e| TransportError::InvalidConfiguration {
                    reason: format!("{url}: {e}"),
                })?;

        let headers = request.headers_mut();
        headers.insert(SEC_WEBSOCKET_PROTOCOL, header(&config.subprotocol)?);
        if let Some(credentials) = &config.credentials {
            headers.insert(AUTHORIZATION, header(&credentials.header_value())?);
        }

        let stream = match connect_async(request).await {
            Ok((stream, _response)) => stream,
            Err(WsError::Http(response)) => {
                let status = response.status().as_u16();
                warn!(status, "connection rejected");
                return Err(TransportError::Rejected { status });
            }
            Err(WsError::Io(e)) => {
                return Err(TransportError::ConnectionFailed {
                    address: url,
                    reason: e.to_string(),
                });
            }
            Err(e) => return Err(e.into()),
        };

        let id = NEXT_WEBSOCKET_TRANSPORT_ID.fetch_add(1, Ordering::Relaxed);
        let mut metadata = TransportMetadata::new(id, "websocket");
        if let MaybeTlsStream::Plain(tcp) = stream.get_ref() {
            if let Ok(addr) = tcp.peer_addr() {
                metadata = metadata.with_peer(addr.to_string());
            }
        }
        info!(transport = %metadata, "connected");

        if !config.connect_delay.is_zero() {
            tokio::time::sleep(config.connect_delay).await;
        }

        Ok(Self { stream, metadata })
    }
}

fn header(value: &str) -> Result<HeaderValue, TransportError> {
    HeaderValue::from_str(value).map_err(|e| TransportError::InvalidConfiguration {
        reason: format!("invalid header value {value:?}: {e}"),
    })
}

impl Transport for WebSocketTransport {
    fn metadata(&self) -> &TransportMetadata {
        &self.metadata
    }

    fn split(self) -> (Box<dyn FrameSource>, Box<dyn FrameSink>) {
        let (sink, stream) = self.stream.split();
        (
            Box::new(WebSocketSource { stream }),
            Box::new(WebSocketSink { sink }),
        )
    }
}

struct WebSocketSource {
    stream: SplitStream<Stream>,
}

#[async_trait]
impl FrameSource for WebSocketSource {
    async fn receive(&mut self) -> Result<Option<Value>, TransportError> {
        loop {
            let message = match self.stream.next().await {
                None => return Ok(None),
                Some(Ok(message)) => message,
                Some(Err(WsError::ConnectionClosed | WsError::AlreadyClosed)) => return Ok(None),
                Some(Err(e)) => return Err(e.into()),
            };

            let decoded: Result<Value, serde_json::Error> = match message {
                Message::Text(text) => serde_json::from_str(&text),
                Message::Binary(bytes) => serde_json::from_slice(&bytes),
                Message::Close(frame) => {
                    debug!(?frame, "peer closed the connection");
                    return Ok(None);
                }
                // Pings are answered by tungstenite on the next read or write.
                Message::Ping(_) | Message::Pong(_) | Message::Frame(_) => continue,
            };
            return decoded.map(Some).map_err(|e| TransportError::InvalidMessage {
                reason: e.to_string(),
            });
        }
    }
}

struct WebSocketSink {
    sink: SplitSink<Stream, Message>,
}

#[async_trait]
impl FrameSink for WebSocketSink {
    async fn send(&mut self, message: Value) -> Result<(), TransportError> {
        self.sink.send(Message::text(message.to_string())).await?;
        Ok(())
    }

    async fn close(&mut self) -> Result<(), TransportError> {
        match self.sink.close().await {
            Ok(()) | Err(WsError::ConnectionClosed | WsError::AlreadyClosed) => Ok(()),
            Err(e) => Err(e.into()),
        }
    }
}
