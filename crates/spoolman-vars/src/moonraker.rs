//! Moonraker host adapter.
//!
//! - HTTP: active spool status, server info and G-code execution
//! - Websocket: JSON-RPC notifications turned into [`HostEvent`]s

use std::time::Duration;

use async_trait::async_trait;
use futures::StreamExt;
use reqwest::Client;
use serde::Deserialize;
use serde_json::{Value, json};
use tokio::sync::mpsc;
use tokio_tungstenite::tungstenite::Message;
use tracing::{debug, info, warn};

use crate::error::{BridgeError, Result};
use crate::klipper::GcodeExecutor;
use crate::types::{HostEvent, MoonrakerErrorBody, ServerInfoEnvelope, SpoolIdEnvelope};

const ACTIVE_SPOOL_SET: &str = "notify_active_spool_set";
const KLIPPY_READY: &str = "notify_klippy_ready";

/// Host status surface reporting the currently active spool.
#[async_trait]
pub trait ActiveSpoolStatus: Send + Sync {
    async fn active_spool_id(&self) -> Result<Option<i64>>;
}

/// Moonraker HTTP API client.
#[derive(Clone)]
pub struct MoonrakerClient {
    base_url: String,
    http: Client,
}

impl MoonrakerClient {
    pub fn new(base_url: impl Into<String>, timeout: Duration) -> Result<Self> {
        let http = Client::builder()
            .timeout(timeout)
            .build()
            .map_err(BridgeError::Http)?;
        Ok(Self::with_client(base_url, http))
    }

    pub fn with_client(base_url: impl Into<String>, http: Client) -> Self {
        let base_url = base_url.into().trim_end_matches('/').to_string();
        Self { base_url, http }
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    fn url(&self, path: &str) -> String {
        format!("{}/{}", self.base_url, path.trim_start_matches('/'))
    }

    /// Current Klippy state as reported by `/server/info` (e.g. `ready`, `startup`).
    pub async fn klippy_state(&self) -> Result<Option<String>> {
        let url = self.url("server/info");
        let response = self.http.get(&url).send().await?;
        let response = check_status(response, url)?;
        let envelope: ServerInfoEnvelope = response.json().await?;
        Ok(envelope.result.klippy_state)
    }
}

fn check_status(response: reqwest::Response, url: String) -> Result<reqwest::Response> {
    let status = response.status();
    if !status.is_success() {
        return Err(BridgeError::Status {
            status: status.as_u16(),
            url,
        });
    }
    Ok(response)
}

#[async_trait]
impl ActiveSpoolStatus for MoonrakerClient {
    async fn active_spool_id(&self) -> Result<Option<i64>> {
        let url = self.url("server/spoolman/spool_id");
        let response = self.http.get(&url).send().await?;
        let response = check_status(response, url)?;
        let data: Value = response.json().await?;
        debug!(response = %data, "Initial Spoolman status response");
        let envelope: SpoolIdEnvelope = serde_json::from_value(data)?;
        Ok(envelope.result.and_then(|result| result.spool_id))
    }
}

#[async_trait]
impl GcodeExecutor for MoonrakerClient {
    async fn run_gcode(&self, script: &str) -> Result<()> {
        let url = self.url("printer/gcode/script");
        let response = self
            .http
            .post(&url)
            .json(&json!({ "script": script }))
            .send()
            .await?;

        let status = response.status();
        if status.is_success() {
            return Ok(());
        }

        let body = response.text().await?;
        let message = serde_json::from_str::<MoonrakerErrorBody>(&body)
            .map(|parsed| parsed.error.message)
            .unwrap_or_else(|_| format!("HTTP error {}: {body}", status.as_u16()));
        Err(BridgeError::Gcode {
            script: script.to_string(),
            message,
        })
    }
}

// ---------- Notifications ----------

#[derive(Debug, Deserialize)]
struct Notification {
    method: String,
    #[serde(default)]
    params: Vec<Value>,
}

/// Map one websocket text frame to a host event, ignoring everything else.
pub fn parse_notification(text: &str) -> Option<HostEvent> {
    let notification: Notification = serde_json::from_str(text).ok()?;
    match notification.method.as_str() {
        KLIPPY_READY => Some(HostEvent::FirmwareReady),
        ACTIVE_SPOOL_SET => {
            let spool_id = notification
                .params
                .first()
                .and_then(|params| params.get("spool_id"))
                .and_then(Value::as_i64);
            Some(HostEvent::ActiveSpoolSet { spool_id })
        }
        _ => None,
    }
}

/// Listens on Moonraker's websocket and forwards host events to the controller queue.
pub struct NotificationListener {
    websocket_url: String,
    client: MoonrakerClient,
    reconnect_delay: Duration,
}

impl NotificationListener {
    pub fn new(
        websocket_url: impl Into<String>,
        client: MoonrakerClient,
        reconnect_delay: Duration,
    ) -> Self {
        Self {
            websocket_url: websocket_url.into(),
            client,
            reconnect_delay,
        }
    }

    /// Run until the event queue closes, reconnecting after each dropped connection.
    pub async fn run(self, events: mpsc::Sender<HostEvent>) {
        loop {
            match self.listen_once(&events).await {
                Ok(()) => info!(url = %self.websocket_url, "Moonraker websocket closed"),
                Err(err) => warn!(url = %self.websocket_url, error = %err, "Moonraker websocket failed"),
            }
            if events.is_closed() {
                return;
            }
            tokio::time::sleep(self.reconnect_delay).await;
        }
    }

    async fn listen_once(&self, events: &mpsc::Sender<HostEvent>) -> Result<()> {
        let (mut stream, _) = tokio_tungstenite::connect_async(self.websocket_url.as_str()).await?;
        info!(url = %self.websocket_url, "Connected to Moonraker websocket");

        // Klipper may already be ready; no notification is sent for that.
        match self.client.klippy_state().await {
            Ok(Some(state)) if state == "ready" => {
                if events.send(HostEvent::FirmwareReady).await.is_err() {
                    return Ok(());
                }
            }
            Ok(state) => debug!(?state, "Klippy not ready yet"),
            Err(err) => warn!(error = %err, "Failed to query Klippy state"),
        }

        while let Some(message) = stream.next().await {
            let message = message?;
            let event = match &message {
                Message::Text(_) => message.to_text().ok().and_then(parse_notification),
                Message::Close(_) => break,
                _ => None,
            };
            let Some(event) = event else {
                continue;
            };
            debug!(?event, "host event");
            if events.send(event).await.is_err() {
                return Ok(());
            }
        }
        Ok(())
    }
}
