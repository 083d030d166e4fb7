//! Realtime websocket connector.
//!
//! Connects to the hosted realtime endpoint, joins one topic per table and
//! forwards every INSERT frame into the [`FeedHub`]. On any transport error
//! the connector waits and reconnects; shutdown is requested over a control
//! channel.

use std::sync::Arc;
use std::time::Duration;

use futures_util::{SinkExt, StreamExt};
use huddle_core::{RealtimeTable, RowInserted};
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};
use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tokio_tungstenite::tungstenite::Message as WsMessage;

use super::channels::RealtimeTopic;
use super::hub::{FeedError, FeedHub, FeedResult};

const INSERT_EVENT: &str = "INSERT";
const JOIN_EVENT: &str = "phx_join";
const HEARTBEAT_EVENT: &str = "heartbeat";
const HEARTBEAT_TOPIC: &str = "phoenix";

/// Connector configuration
#[derive(Debug, Clone)]
pub struct ConnectorConfig {
    /// Websocket endpoint (`wss://.../realtime/v1/websocket`)
    pub url: String,
    /// Project API key, sent as a query parameter
    pub api_key: Option<String>,
    /// Tables to join
    pub tables: Vec<RealtimeTable>,
    /// Wait before reconnecting after a failure
    pub reconnect_delay: Duration,
    /// Heartbeat interval
    pub heartbeat: Duration,
}

impl ConnectorConfig {
    /// Create a config for every consumed table
    pub fn new(url: impl Into<String>) -> Self {
        Self {
            url: url.into(),
            api_key: None,
            tables: RealtimeTable::ALL.to_vec(),
            reconnect_delay: Duration::from_millis(1000),
            heartbeat: Duration::from_secs(30),
        }
    }

    /// Set the API key
    #[must_use]
    pub fn api_key(mut self, key: impl Into<String>) -> Self {
        self.api_key = Some(key.into());
        self
    }

    /// Set the reconnection delay
    #[must_use]
    pub fn reconnect_delay(mut self, delay: Duration) -> Self {
        self.reconnect_delay = delay;
        self
    }

    /// Endpoint with credentials attached
    pub fn endpoint(&self) -> String {
        match &self.api_key {
            Some(key) => {
                let separator = if self.url.contains('?') { '&' } else { '?' };
                format!("{}{separator}apikey={key}&vsn=1.0.0", self.url)
            }
            None => self.url.clone(),
        }
    }
}

/// Wire frame of the realtime protocol
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FeedFrame {
    pub topic: String,
    pub event: String,
    #[serde(default)]
    pub payload: Value,
    #[serde(rename = "ref", default, skip_serializing_if = "Option::is_none")]
    pub reference: Option<String>,
}

impl FeedFrame {
    /// Join frame for a table topic
    pub fn join(table: RealtimeTable, reference: u64) -> Self {
        Self {
            topic: RealtimeTopic::table(table).name(),
            event: JOIN_EVENT.to_string(),
            payload: json!({
                "config": {
                    "postgres_changes": [
                        { "event": INSERT_EVENT, "schema": "public", "table": table.name() }
                    ]
                }
            }),
            reference: Some(reference.to_string()),
        }
    }

    /// Heartbeat frame
    pub fn heartbeat(reference: u64) -> Self {
        Self {
            topic: HEARTBEAT_TOPIC.to_string(),
            event: HEARTBEAT_EVENT.to_string(),
            payload: json!({}),
            reference: Some(reference.to_string()),
        }
    }

    /// Decode a text frame
    pub fn parse(text: &str) -> FeedResult<Self> {
        Ok(serde_json::from_str(text)?)
    }

    /// Extract the inserted row, if this frame carries one
    ///
    /// Accepts both the flat payload (`{"record": ..}`) and the nested
    /// `postgres_changes` shape (`{"data": {"record": ..}}`).
    pub fn into_row(self) -> Option<RowInserted> {
        let topic = RealtimeTopic::parse(&self.topic)?;

        let (event, record) = match self.payload.get("data") {
            Some(data) => (
                data.get("type").and_then(Value::as_str).unwrap_or(self.event.as_str()),
                data.get("record"),
            ),
            None => (self.event.as_str(), self.payload.get("record")),
        };

        if event != INSERT_EVENT {
            return None;
        }

        record.map(|record| RowInserted::new(topic.realtime_table(), record.clone()))
    }
}

/// Commands for the listener task
#[derive(Debug)]
enum ConnectorCommand {
    Shutdown,
}

/// Websocket connector feeding a [`FeedHub`]
pub struct RealtimeConnector {
    control_tx: mpsc::Sender<ConnectorCommand>,
    task: JoinHandle<()>,
}

impl RealtimeConnector {
    /// Start the background listener
    pub fn start(config: ConnectorConfig, hub: Arc<FeedHub>) -> Self {
        let (control_tx, control_rx) = mpsc::channel(4);
        let task = tokio::spawn(Self::listener_loop(config, hub, control_rx));
        Self { control_tx, task }
    }

    /// Background listener loop
    async fn listener_loop(
        config: ConnectorConfig,
        hub: Arc<FeedHub>,
        mut control_rx: mpsc::Receiver<ConnectorCommand>,
    ) {
        loop {
            match Self::run_listener(&config, &hub, &mut control_rx).await {
                Ok(true) => {
                    tracing::info!("Realtime connector shutting down");
                    break;
                }
                Ok(false) => {
                    tracing::warn!("Realtime stream ended, reconnecting");
                }
                Err(e) => {
                    tracing::error!(error = %e, "Realtime connector error, reconnecting");
                }
            }

            tokio::select! {
                () = tokio::time::sleep(config.reconnect_delay) => {}
                cmd = control_rx.recv() => {
                    if matches!(cmd, Some(ConnectorCommand::Shutdown) | None) {
                        break;
                    }
                }
            }
        }
    }

    /// Run one connection until error, stream end, or shutdown
    async fn run_listener(
        config: &ConnectorConfig,
        hub: &FeedHub,
        control_rx: &mut mpsc::Receiver<ConnectorCommand>,
    ) -> FeedResult<bool> {
        let (ws_stream, _) = tokio_tungstenite::connect_async(config.endpoint())
            .await
            .map_err(|e| FeedError::Connection(e.to_string()))?;
        let (mut sink, mut stream) = ws_stream.split();

        let mut reference: u64 = 0;
        for table in &config.tables {
            reference += 1;
            let frame = serde_json::to_string(&FeedFrame::join(*table, reference))?;
            sink.send(WsMessage::Text(frame))
                .await
                .map_err(|e| FeedError::Connection(e.to_string()))?;
        }

        tracing::info!(tables = config.tables.len(), "Realtime connector joined");

        let mut heartbeat = tokio::time::interval(config.heartbeat);
        heartbeat.tick().await;

        loop {
            tokio::select! {
                msg = stream.next() => {
                    match msg {
                        Some(Ok(WsMessage::Text(text))) => {
                            Self::forward(hub, &text);
                        }
                        Some(Ok(WsMessage::Close(_))) | None => return Ok(false),
                        Some(Ok(_)) => {}
                        Some(Err(e)) => return Err(FeedError::Connection(e.to_string())),
                    }
                }

                _ = heartbeat.tick() => {
                    reference += 1;
                    let frame = serde_json::to_string(&FeedFrame::heartbeat(reference))?;
                    sink.send(WsMessage::Text(frame))
                        .await
                        .map_err(|e| FeedError::Connection(e.to_string()))?;
                }

                cmd = control_rx.recv() => {
                    match cmd {
                        Some(ConnectorCommand::Shutdown) | None => {
                            let _ = sink.close().await;
                            return Ok(true);
                        }
                    }
                }
            }
        }
    }

    fn forward(hub: &FeedHub, text: &str) {
        match FeedFrame::parse(text) {
            Ok(frame) => {
                if let Some(row) = frame.into_row() {
                    let delivered = hub.publish(&row);
                    tracing::trace!(table = %row.table, delivered, "Forwarded realtime insert");
                }
            }
            Err(e) => tracing::debug!(error = %e, "Ignoring unparseable realtime frame"),
        }
    }

    /// Ask the listener to stop
    pub async fn shutdown(&self) -> FeedResult<()> {
        self.control_tx
            .send(ConnectorCommand::Shutdown)
            .await
            .map_err(|_| FeedError::Closed)
    }

    /// Check if the listener task has exited
    pub fn is_finished(&self) -> bool {
        self.task.is_finished()
    }
}

impl Drop for RealtimeConnector {
    fn drop(&mut self) {
        self.task.abort();
    }
}
