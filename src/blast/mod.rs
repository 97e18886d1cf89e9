//! Blast trigger emission.
//!
//! A confirmed inferno purchase hands off to an external worker (video
//! generation and upload) through a one-shot artifact in the triggers
//! directory. This module only produces the artifact; it never reads it
//! back, waits for consumption, or retries a failed write.
//!
//! The artifact name is keyed on the deal id alone (`blast_<deal_id>.json`),
//! so a redelivered webhook overwrites the trigger instead of queueing a
//! second blast for the same deal.

use std::io;
use std::path::PathBuf;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::info;

use crate::types::DealId;

/// Errors that can occur while writing a blast trigger.
#[derive(Debug, Error)]
pub enum BlastError {
    /// IO error during the artifact write.
    #[error("IO error: {0}")]
    Io(#[from] io::Error),

    /// Trigger could not be serialized.
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

/// The one-shot artifact consumed by the blast worker.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BlastTrigger {
    /// Fixed discriminator the worker dispatches on.
    pub action: String,
    pub deal_id: DealId,
    pub created_at: DateTime<Utc>,
}

impl BlastTrigger {
    fn new(deal_id: DealId) -> Self {
        BlastTrigger {
            action: "inferno_blast".to_string(),
            deal_id,
            created_at: Utc::now(),
        }
    }
}

/// Writes blast trigger artifacts into a directory watched by the worker.
pub struct BlastEmitter {
    triggers_dir: PathBuf,
}

impl BlastEmitter {
    pub fn new(triggers_dir: impl Into<PathBuf>) -> Self {
        BlastEmitter {
            triggers_dir: triggers_dir.into(),
        }
    }

    /// Path of the trigger artifact for a deal. One artifact per deal.
    pub fn trigger_path(&self, deal_id: &DealId) -> PathBuf {
        self.triggers_dir
            .join(format!("blast_{}.json", deal_id.as_str()))
    }

    /// Writes the trigger artifact atomically (temp file, then rename), so
    /// the worker never observes a partial trigger.
    pub fn emit(&self, deal_id: &DealId) -> Result<(), BlastError> {
        std::fs::create_dir_all(&self.triggers_dir)?;

        let trigger = BlastTrigger::new(deal_id.clone());
        let path = self.trigger_path(deal_id);
        let tmp_path = path.with_extension("json.tmp");

        std::fs::write(&tmp_path, serde_json::to_vec_pretty(&trigger)?)?;
        std::fs::rename(&tmp_path, &path)?;

        info!(deal_id = %deal_id, path = %path.display(), "blast trigger dropped");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    #[test]
    fn emit_writes_the_trigger_artifact() {
        let dir = tempdir().unwrap();
        let emitter = BlastEmitter::new(dir.path());

        emitter.emit(&DealId::from("7")).unwrap();

        let path = dir.path().join("blast_7.json");
        assert!(path.exists());

        let trigger: BlastTrigger =
            serde_json::from_slice(&std::fs::read(&path).unwrap()).unwrap();
        assert_eq!(trigger.action, "inferno_blast");
        assert_eq!(trigger.deal_id, DealId::from("7"));
    }

    #[test]
    fn duplicate_emission_overwrites_instead_of_duplicating() {
        let dir = tempdir().unwrap();
        let emitter = BlastEmitter::new(dir.path());

        emitter.emit(&DealId::from("7")).unwrap();
        emitter.emit(&DealId::from("7")).unwrap();

        let artifacts: Vec<_> = std::fs::read_dir(dir.path())
            .unwrap()
            .map(|e| e.unwrap().file_name())
            .collect();
        assert_eq!(artifacts.len(), 1, "one trigger per deal, ever");
    }

    #[test]
    fn different_deals_get_separate_artifacts() {
        let dir = tempdir().unwrap();
        let emitter = BlastEmitter::new(dir.path());

        emitter.emit(&DealId::from("7")).unwrap();
        emitter.emit(&DealId::from("8")).unwrap();

        assert!(dir.path().join("blast_7.json").exists());
        assert!(dir.path().join("blast_8.json").exists());
    }

    #[test]
    fn no_temp_file_remains_after_emit() {
        let dir = tempdir().unwrap();
        let emitter = BlastEmitter::new(dir.path());

        emitter.emit(&DealId::from("7")).unwrap();

        assert!(!dir.path().join("blast_7.json.tmp").exists());
    }

    #[test]
    fn triggers_directory_is_created_on_demand() {
        let dir = tempdir().unwrap();
        let emitter = BlastEmitter::new(dir.path().join("triggers"));

        emitter.emit(&DealId::from("7")).unwrap();

        assert!(dir.path().join("triggers/blast_7.json").exists());
    }
}
