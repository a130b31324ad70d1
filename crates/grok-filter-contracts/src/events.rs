use std::fs::OpenOptions;
use std::io::Write;
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use chrono::{SecondsFormat, Utc};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use tokio::sync::mpsc::UnboundedSender;

/// Event pushed to the host while a filter hook runs.
///
/// Serializes as `{"type": "status", "data": {"done": .., "description": ..}}`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", content = "data", rename_all = "snake_case")]
pub enum FilterEvent {
    Status(StatusData),
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StatusData {
    pub done: bool,
    pub description: String,
}

impl FilterEvent {
    pub fn status(description: impl Into<String>, done: bool) -> Self {
        Self::Status(StatusData {
            done,
            description: description.into(),
        })
    }

    pub fn description(&self) -> &str {
        match self {
            Self::Status(data) => data.description.as_str(),
        }
    }

    pub fn is_done(&self) -> bool {
        match self {
            Self::Status(data) => data.done,
        }
    }
}

/// Host-side capability that receives filter events.
#[async_trait]
pub trait Notifier: Send + Sync {
    async fn notify(&self, event: FilterEvent) -> anyhow::Result<()>;
}

/// Append-only writer for `events.jsonl`.
///
/// Each line is the serialized event with `run_id` and `ts` added.
/// One compact JSON object per line.
#[derive(Debug, Clone)]
pub struct JsonlNotifier {
    inner: Arc<JsonlNotifierInner>,
}

#[derive(Debug)]
struct JsonlNotifierInner {
    path: PathBuf,
    run_id: String,
    lock: Mutex<()>,
}

impl JsonlNotifier {
    pub fn new(path: impl Into<PathBuf>, run_id: impl Into<String>) -> Self {
        Self {
            inner: Arc::new(JsonlNotifierInner {
                path: path.into(),
                run_id: run_id.into(),
                lock: Mutex::new(()),
            }),
        }
    }

    pub fn path(&self) -> &Path {
        &self.inner.path
    }

    pub fn run_id(&self) -> &str {
        &self.inner.run_id
    }

    pub fn write(&self, event: &FilterEvent) -> anyhow::Result<Value> {
        let mut row = match serde_json::to_value(event)? {
            Value::Object(map) => map,
            other => {
                let mut map = Map::new();
                map.insert("event".to_string(), other);
                map
            }
        };
        row.insert(
            "run_id".to_string(),
            Value::String(self.inner.run_id.clone()),
        );
        row.insert("ts".to_string(), Value::String(now_utc_iso()));

        if let Some(parent) = self.inner.path.parent() {
            std::fs::create_dir_all(parent)?;
        }

        let line = serde_json::to_string(&row)?;
        let _guard = self
            .inner
            .lock
            .lock()
            .map_err(|_| anyhow::anyhow!("event writer lock poisoned"))?;
        let mut file = OpenOptions::new()
            .create(true)
            .append(true)
            .open(&self.inner.path)?;
        file.write_all(line.as_bytes())?;
        file.write_all(b"\n")?;

        Ok(Value::Object(row))
    }
}

#[async_trait]
impl Notifier for JsonlNotifier {
    /// Appends on the blocking pool so file I/O stays off the async workers.
    async fn notify(&self, event: FilterEvent) -> anyhow::Result<()> {
        let writer = self.clone();
        tokio::task::spawn_blocking(move || writer.write(&event)).await??;
        Ok(())
    }
}

/// Forwards events to an unbounded tokio channel.
#[derive(Debug, Clone)]
pub struct ChannelNotifier {
    sender: UnboundedSender<FilterEvent>,
}

impl ChannelNotifier {
    pub fn new(sender: UnboundedSender<FilterEvent>) -> Self {
        Self { sender }
    }
}

#[async_trait]
impl Notifier for ChannelNotifier {
    async fn notify(&self, event: FilterEvent) -> anyhow::Result<()> {
        self.sender
            .send(event)
            .map_err(|_| anyhow::anyhow!("event receiver dropped"))
    }
}

/// Keeps every event in memory.
#[derive(Debug, Default)]
pub struct RecordingNotifier {
    events: Mutex<Vec<FilterEvent>>,
}

impl RecordingNotifier {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn events(&self) -> Vec<FilterEvent> {
        self.events
            .lock()
            .map(|events| events.clone())
            .unwrap_or_default()
    }

    pub fn descriptions(&self) -> Vec<String> {
        self.events()
            .iter()
            .map(|event| event.description().to_string())
            .collect()
    }

    pub fn terminal_events(&self) -> Vec<FilterEvent> {
        self.events()
            .into_iter()
            .filter(FilterEvent::is_done)
            .collect()
    }
}

#[async_trait]
impl Notifier for RecordingNotifier {
    async fn notify(&self, event: FilterEvent) -> anyhow::Result<()> {
        self.events
            .lock()
            .map_err(|_| anyhow::anyhow!("recording notifier lock poisoned"))?
            .push(event);
        Ok(())
    }
}

fn now_utc_iso() -> String {
    Utc::now().to_rfc3339_opts(SecondsFormat::Micros, false)
}
