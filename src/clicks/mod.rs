//! Click telemetry sink.
//!
//! Click events are audit records, not critical state: the sink is
//! append-only, failures are logged and swallowed, and nothing on the
//! redirect path ever waits for an append to finish. [`spawn_append`] is the
//! only way handlers touch the sink.
//!
//! The file sink writes JSON Lines, one event per line, no fsync. A partial
//! final line after a crash costs at most one telemetry record.

use std::fs::OpenOptions;
use std::io::{self, Write};
use std::path::PathBuf;
use std::sync::Arc;

use async_trait::async_trait;
use tracing::warn;

use crate::types::ClickEvent;

/// Errors that can occur while appending a click event.
#[derive(Debug, thiserror::Error)]
pub enum ClickSinkError {
    /// IO error during the append.
    #[error("IO error: {0}")]
    Io(#[from] io::Error),

    /// Event could not be serialized.
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

/// Append-only destination for click telemetry.
#[async_trait]
pub trait ClickSink: Send + Sync {
    /// Appends one event. At-least-once, best-effort; callers treat failure
    /// as a logging concern, never a request failure.
    async fn append(&self, event: ClickEvent) -> Result<(), ClickSinkError>;
}

/// Fire-and-forget append: spawns the sink call and logs failures at `warn`.
///
/// Returns immediately; the redirect response must never be held waiting on
/// telemetry.
pub fn spawn_append(sink: Arc<dyn ClickSink>, event: ClickEvent) {
    tokio::spawn(async move {
        let deal_id = event.deal_id.clone();
        if let Err(e) = sink.append(event).await {
            warn!(deal_id = %deal_id, error = %e, "failed to record click event");
        }
    });
}

/// Click sink backed by a local JSON Lines file.
pub struct FileClickSink {
    path: PathBuf,
}

impl FileClickSink {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        FileClickSink { path: path.into() }
    }
}

#[async_trait]
impl ClickSink for FileClickSink {
    async fn append(&self, event: ClickEvent) -> Result<(), ClickSinkError> {
        if let Some(parent) = self.path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        let mut file = OpenOptions::new()
            .create(true)
            .append(true)
            .open(&self.path)?;

        let json = serde_json::to_string(&event)?;
        writeln!(file, "{}", json)?;
        Ok(())
    }
}
