//! WebSocket subscription to the realtime change feed.
//!
//! [`RealtimeSubscription`] connects to the feed, announces the tables it
//! wants, and republishes every parsed frame on a [`RealtimeHub`]. When the
//! connection drops, [`RealtimeSubscription::run`] reconnects with
//! exponential backoff until its [`CancellationToken`] fires.

use std::sync::Arc;

use futures::{SinkExt, StreamExt};
use tokio_tungstenite::tungstenite::Message;
use tokio_tungstenite::{connect_async, MaybeTlsStream, WebSocketStream};
use tokio_util::sync::CancellationToken;

use crate::hub::{parse_frame, RealtimeHub, Table};
use crate::reconnect::{next_delay, ReconnectConfig};

type WsStream = WebSocketStream<MaybeTlsStream<tokio::net::TcpStream>>;

/// Errors from the realtime WebSocket layer.
#[derive(Debug, thiserror::Error)]
pub enum RealtimeError {
    /// Failed to establish the WebSocket connection.
    #[error("Connection error: {0}")]
    Connection(String),

    /// A protocol-level error on an established connection.
    #[error("Protocol error: {0}")]
    Protocol(String),
}

/// Connection settings for the realtime feed.
pub struct RealtimeSubscription {
    ws_url: String,
    tables: Vec<Table>,
    hub: Arc<RealtimeHub>,
    reconnect: ReconnectConfig,
}

impl RealtimeSubscription {
    /// * `ws_url` - feed endpoint, e.g. `ws://host:3000/realtime`.
    pub fn new(ws_url: impl Into<String>, hub: Arc<RealtimeHub>) -> Self {
        Self {
            ws_url: ws_url.into(),
            tables: vec![Table::Tasks, Table::Subtasks],
            hub,
            reconnect: ReconnectConfig::default(),
        }
    }

    pub fn with_reconnect(mut self, config: ReconnectConfig) -> Self {
        self.reconnect = config;
        self
    }

    pub fn ws_url(&self) -> &str {
        &self.ws_url
    }

    /// Connect once, subscribe, and forward frames until the server
    /// closes the stream or a receive error occurs.
    pub async fn connect_and_forward(&self) -> Result<(), RealtimeError> {
        let mut ws_stream = self.connect().await?;
        self.forward_frames(&mut ws_stream).await
    }

    /// Keep the subscription alive until `cancel` fires.
    ///
    /// A clean close from the server resets the backoff; failures grow it.
    pub async fn run(&self, cancel: CancellationToken) {
        let mut delay = self.reconnect.initial_delay;
        let mut attempt = 0u32;

        loop {
            attempt += 1;
            let result = tokio::select! {
                _ = cancel.cancelled() => {
                    tracing::info!(url = %self.ws_url, "Realtime subscription cancelled");
                    return;
                }
                result = self.connect_and_forward() => result,
            };

            match result {
                Ok(()) => {
                    tracing::info!(url = %self.ws_url, "Realtime feed closed, reconnecting");
                    delay = self.reconnect.initial_delay;
                    attempt = 0;
                }
                Err(e) => {
                    tracing::warn!(
                        url = %self.ws_url,
                        attempt,
                        delay_ms = delay.as_millis() as u64,
                        error = %e,
                        "Realtime connection failed",
                    );
                }
            }

            tokio::select! {
                _ = cancel.cancelled() => return,
                _ = tokio::time::sleep(delay) => {}
            }

            if attempt > 0 {
                delay = next_delay(delay, &self.reconnect);
            }
        }
    }

    // ---- private helpers ----

    async fn connect(&self) -> Result<WsStream, RealtimeError> {
        let (mut ws_stream, _response) = connect_async(self.ws_url.as_str()).await.map_err(|e| {
            RealtimeError::Connection(format!(
                "Failed to connect to realtime feed at {}: {e}",
                self.ws_url
            ))
        })?;

        let tables: Vec<&str> = self.tables.iter().map(Table::as_str).collect();
        let subscribe = serde_json::json!({ "type": "subscribe", "tables": tables });
        ws_stream
            .send(Message::Text(subscribe.to_string()))
            .await
            .map_err(|e| RealtimeError::Protocol(format!("Failed to send subscribe frame: {e}")))?;

        tracing::info!(url = %self.ws_url, ?tables, "Subscribed to realtime feed");
        Ok(ws_stream)
    }

    async fn forward_frames(&self, ws_stream: &mut WsStream) -> Result<(), RealtimeError> {
        while let Some(msg_result) = ws_stream.next().await {
            match msg_result {
                Ok(Message::Text(text)) => match parse_frame(&text) {
                    Ok(event) => {
                        tracing::debug!(
                            table = event.table.as_str(),
                            event_type = %event.change.event_type,
                            "Realtime frame",
                        );
                        self.hub.publish(event);
                    }
                    Err(e) => {
                        tracing::warn!(error = %e, "Ignoring unparseable realtime frame");
                    }
                },
                Ok(Message::Binary(_)) => {
                    tracing::trace!("Ignoring binary realtime frame");
                }
                Ok(Message::Ping(_) | Message::Pong(_)) => {
                    // Handled automatically by tungstenite.
                }
                Ok(Message::Close(frame)) => {
                    tracing::info!(?frame, "Realtime feed sent close");
                    return Ok(());
                }
                Ok(Message::Frame(_)) => {}
                Err(e) => {
                    return Err(RealtimeError::Protocol(format!("WebSocket receive error: {e}")));
                }
            }
        }
        Ok(())
    }
}
