//! Versioned whole-document file storage.
//!
//! The gateway's persistent documents (the deals ledger, the subscriber
//! list) are each a single JSON file read in full and written in full. A
//! naive read-modify-write over such a document loses concurrent updates, so
//! every document carries a version token and writes are conditional: a save
//! succeeds only if the document generation is unchanged since the load that
//! produced the mutation. Callers retry on [`StoreError::Conflict`].
//!
//! # File Format
//!
//! A document named `deals` lives as `deals.<gen>.json` where `<gen>` is the
//! generation number. The highest generation on disk is current; superseded
//! generations are deleted after a successful save. Recovery needs no
//! bookkeeping file: a scan for the highest generation always finds the
//! latest complete document, because each generation is written atomically:
//!
//! 1. Write to `deals.<gen>.json.tmp`
//! 2. fsync the file
//! 3. Rename to `deals.<gen>.json`
//! 4. fsync the directory
//!
//! At any crash point either the old or the new generation is complete,
//! never a partial write.

use std::fs::{File, OpenOptions};
use std::io::{self, Write};
use std::marker::PhantomData;
use std::path::{Path, PathBuf};
use std::sync::Mutex;

use serde::Serialize;
use serde::de::DeserializeOwned;
use thiserror::Error;

/// An opaque document version token, returned by [`VersionedFile::load`] and
/// required by [`VersionedFile::save`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Version(pub u64);

impl std::fmt::Display for Version {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Errors that can occur during document store operations.
#[derive(Debug, Error)]
pub enum StoreError {
    /// IO error during file operations.
    #[error("IO error: {0}")]
    Io(#[from] io::Error),

    /// JSON serialization/deserialization error.
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// The document changed since it was loaded. Reload, reapply the
    /// mutation, and save again.
    #[error("version conflict: expected generation {expected}, found {current}")]
    Conflict { expected: Version, current: Version },
}

/// Result type for document store operations.
pub type Result<T> = std::result::Result<T, StoreError>;

/// A whole-document JSON store with conditional writes.
///
/// An empty or missing store loads as `(T::default(), Version(0))`, so the
/// first save uses `Version(0)` as its expected token.
pub struct VersionedFile<T> {
    dir: PathBuf,
    name: &'static str,
    /// Serializes the check-then-rename step of `save` so the generation
    /// comparison and the write are atomic within this process.
    write_lock: Mutex<()>,
    _marker: PhantomData<fn() -> T>,
}

impl<T> VersionedFile<T>
where
    T: Serialize + DeserializeOwned + Default,
{
    /// Creates a store for the document `name` inside `dir`.
    ///
    /// The directory is created lazily on first save.
    pub fn new(dir: impl Into<PathBuf>, name: &'static str) -> Self {
        VersionedFile {
            dir: dir.into(),
            name,
            write_lock: Mutex::new(()),
            _marker: PhantomData,
        }
    }

    fn generation_path(&self, generation: u64) -> PathBuf {
        self.dir.join(format!("{}.{}.json", self.name, generation))
    }

    /// Scans the directory for the highest generation of this document.
    ///
    /// Returns `None` if the directory or document does not exist yet.
    fn current_generation(&self) -> io::Result<Option<u64>> {
        let entries = match std::fs::read_dir(&self.dir) {
            Ok(entries) => entries,
            Err(e) if e.kind() == io::ErrorKind::NotFound => return Ok(None),
            Err(e) => return Err(e),
        };

        let prefix = format!("{}.", self.name);
        let mut max = None;
        for entry in entries {
            let entry = entry?;
            let file_name = entry.file_name();
            let file_name = file_name.to_string_lossy();

            if let Some(generation) = file_name
                .strip_prefix(&prefix)
                .and_then(|s| s.strip_suffix(".json"))
                .and_then(|s| s.parse::<u64>().ok())
            {
                max = Some(max.map_or(generation, |m: u64| m.max(generation)));
            }
        }
        Ok(max)
    }

    /// Loads the current document and its version token.
    pub fn load(&self) -> Result<(T, Version)> {
        match self.current_generation()? {
            None => Ok((T::default(), Version(0))),
            Some(generation) => {
                let file = File::open(self.generation_path(generation))?;
                let value = serde_json::from_reader(io::BufReader::new(file))?;
                Ok((value, Version(generation)))
            }
        }
    }

    /// Saves the document if its generation still matches `expected`.
    ///
    /// On success the new generation file is durable, superseded generations
    /// are removed, and the new version token is returned. On
    /// [`StoreError::Conflict`] nothing is written.
    pub fn save(&self, value: &T, expected: Version) -> Result<Version> {
        let _guard = self.write_lock.lock().unwrap_or_else(|e| e.into_inner());

        let current = self.current_generation()?.unwrap_or(0);
        if current != expected.0 {
            return Err(StoreError::Conflict {
                expected,
                current: Version(current),
            });
        }

        std::fs::create_dir_all(&self.dir)?;

        let next = current + 1;
        let path = self.generation_path(next);
        let tmp_path = path.with_extension("json.tmp");
        let bytes = serde_json::to_vec_pretty(value)?;

        {
            let mut file = OpenOptions::new()
                .write(true)
                .create(true)
                .truncate(true)
                .open(&tmp_path)?;
            file.write_all(&bytes)?;
            file.sync_all()?;
        }
        std::fs::rename(&tmp_path, &path)?;
        fsync_dir(&self.dir)?;

        // Superseded generations are garbage once the rename is durable.
        for generation in (0..=current).rev() {
            match std::fs::remove_file(self.generation_path(generation)) {
                Ok(()) => {}
                Err(e) if e.kind() == io::ErrorKind::NotFound => break,
                Err(e) => return Err(e.into()),
            }
        }

        Ok(Version(next))
    }
}

/// Syncs a directory so renames and deletions in it are durable.
fn fsync_dir(dir: &Path) -> io::Result<()> {
    let dir = OpenOptions::new().read(true).open(dir)?;
    dir.sync_all()
}
