// ABOUTME: Activity logger — records one row per completed user turn to every configured sink.
// ABOUTME: Ships a JSONL sink that appends to ~/.local/share/debatemate/sessions/<session_id>.jsonl.

use std::fs::{self, File, OpenOptions};
use std::io::{BufWriter, Write};
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use chrono::{DateTime, Local, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::session::state::Session;

/// Everything recorded about one turn.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TurnRecord {
    pub session_id: String,
    pub timestamp: DateTime<Utc>,
    pub turn: u32,
    pub topic: String,
    pub user_text: String,
    pub assistant_text: String,
    pub topic_change_count: u32,
    pub elapsed_secs: u64,
}

impl TurnRecord {
    /// Snapshot the session for the turn that just completed.
    pub fn capture(session: &Session, user_text: &str, assistant_text: &str) -> Self {
        Self {
            session_id: session.session_id().to_string(),
            timestamp: Utc::now(),
            turn: session.turn_count(),
            topic: session.current_topic().to_string(),
            user_text: user_text.to_string(),
            assistant_text: assistant_text.to_string(),
            topic_change_count: session.topic_change_count(),
            elapsed_secs: session.elapsed_secs(),
        }
    }

    /// Row cells in column order, timestamp rendered in local time.
    pub fn to_row(&self) -> Vec<Value> {
        vec![
            Value::from(self.session_id.clone()),
            Value::from(
                self.timestamp
                    .with_timezone(&Local)
                    .format("%Y-%m-%d %H:%M:%S")
                    .to_string(),
            ),
            Value::from(self.turn),
            Value::from(self.topic.clone()),
            Value::from(self.user_text.clone()),
            Value::from(self.assistant_text.clone()),
            Value::from(self.topic_change_count),
            Value::from(self.elapsed_secs),
        ]
    }
}

/// Append-only destination for turn records.
#[async_trait]
pub trait TurnSink: Send + Sync {
    /// Short name used in diagnostics.
    fn name(&self) -> &str;

    async fn append(&self, record: &TurnRecord) -> anyhow::Result<()>;
}

/// Fans each turn out to every sink. A failing sink does not stop the others.
#[derive(Clone, Default)]
pub struct ActivityLogger {
    sinks: Vec<Arc<dyn TurnSink>>,
}

impl ActivityLogger {
    pub fn new(sinks: Vec<Arc<dyn TurnSink>>) -> Self {
        Self { sinks }
    }

    pub fn with_sink(mut self, sink: Arc<dyn TurnSink>) -> Self {
        self.sinks.push(sink);
        self
    }

    pub fn sink_count(&self) -> usize {
        self.sinks.len()
    }

    /// Record the turn that just completed. Returns one message per failed sink.
    pub async fn log_turn(
        &self,
        session: &Session,
        user_text: &str,
        assistant_text: &str,
    ) -> Vec<String> {
        let record = TurnRecord::capture(session, user_text, assistant_text);
        let mut failures = Vec::new();

        for sink in &self.sinks {
            match sink.append(&record).await {
                Ok(()) => {
                    tracing::debug!(sink = sink.name(), turn = record.turn, "turn logged");
                }
                Err(e) => {
                    tracing::warn!(sink = sink.name(), turn = record.turn, error = %e, "failed to log turn");
                    failures.push(format!("{}: {}", sink.name(), e));
                }
            }
        }

        failures
    }
}

/// Appends turn records as JSONL lines to a per-session file.
pub struct JsonlSink {
    writer: Mutex<BufWriter<File>>,
    pub path: PathBuf,
}

impl JsonlSink {
    /// Open (or create) `<dir>/<session_id>.jsonl` for appending.
    pub fn new_in_dir(dir: &Path, session_id: &str) -> anyhow::Result<Self> {
        fs::create_dir_all(dir)?;
        let path = dir.join(format!("{}.jsonl", session_id));
        let file = OpenOptions::new().create(true).append(true).open(&path)?;
        Ok(Self {
            writer: Mutex::new(BufWriter::new(file)),
            path,
        })
    }
}

#[async_trait]
impl TurnSink for JsonlSink {
    fn name(&self) -> &str {
        "jsonl"
    }

    async fn append(&self, record: &TurnRecord) -> anyhow::Result<()> {
        let line = serde_json::to_string(record)?;
        let mut writer = self
            .writer
            .lock()
            .map_err(|_| anyhow::anyhow!("jsonl writer lock poisoned"))?;
        writeln!(writer, "{}", line)?;
        writer.flush()?;
        Ok(())
    }
}
