//! Checkpoint files for each crawl phase
//!
//! A checkpoint is the full accumulated record list of the current phase,
//! overwritten wholesale after every unit of progress. It is also the
//! phase's final output. Writes go to a temp file first and are renamed into
//! place, so a crash mid-write leaves the previous checkpoint intact.
//!
//! Files are UTF-8 JSON arrays with four-space indentation; non-ASCII text
//! is written literally.
//!
//! # Example
//!
//! ```no_run
//! use marquee::storage::checkpoint::{Checkpoint, JsonCheckpoint};
//! use marquee::models::CatalogRecord;
//!
//! # fn example() -> Result<(), Box<dyn std::error::Error>> {
//! let mut checkpoint = JsonCheckpoint::new("output/catalog.json");
//!
//! let records: Vec<CatalogRecord> = Vec::new();
//! checkpoint.save(&records)?;
//!
//! let restored: Vec<CatalogRecord> = checkpoint.load()?;
//! assert!(restored.is_empty());
//! # Ok(())
//! # }
//! ```

use serde::de::DeserializeOwned;
use serde::Serialize;
use serde_json::ser::PrettyFormatter;
use serde_json::Value;
use std::fs::{self, File};
use std::io::{BufReader, BufWriter, Write};
use std::path::{Path, PathBuf};

use crate::utils::error::PersistenceError;
use crate::utils::sanitize_filename;

/// Destination for a phase's accumulated records
pub trait Checkpoint<T>: Send {
    /// Overwrite the checkpoint with `records`
    fn save(&mut self, records: &[T]) -> Result<(), PersistenceError>;

    /// Records from a previous run; empty when there is none
    fn load(&self) -> Result<Vec<T>, PersistenceError>;
}

/// Checkpoint backed by one JSON file
#[derive(Debug, Clone)]
pub struct JsonCheckpoint {
    path: PathBuf,
}

impl JsonCheckpoint {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    fn temp_path(&self) -> PathBuf {
        let mut name = self
            .path
            .file_name()
            .map(|n| n.to_os_string())
            .unwrap_or_else(|| "checkpoint".into());
        name.push(".tmp");
        self.path.with_file_name(name)
    }
}

fn io_error(path: &Path, source: std::io::Error) -> PersistenceError {
    PersistenceError::Io {
        path: path.display().to_string(),
        source,
    }
}

/// Serialize `value` as JSON with four-space indentation
pub fn write_pretty<W: Write, T: Serialize + ?Sized>(
    writer: W,
    value: &T,
) -> Result<(), serde_json::Error> {
    let formatter = PrettyFormatter::with_indent(b"    ");
    let mut serializer = serde_json::Serializer::with_formatter(writer, formatter);
    value.serialize(&mut serializer)
}

/// Write `value` to `path` through a sibling temp file and a rename
fn write_atomic<T: Serialize + ?Sized>(
    path: &Path,
    temp_path: &Path,
    value: &T,
) -> Result<(), PersistenceError> {
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        fs::create_dir_all(parent).map_err(|e| io_error(parent, e))?;
    }

    let file = File::create(temp_path).map_err(|e| io_error(temp_path, e))?;
    let mut writer = BufWriter::new(file);
    write_pretty(&mut writer, value)?;
    writer.flush().map_err(|e| io_error(temp_path, e))?;
    drop(writer);

    fs::rename(temp_path, path).map_err(|e| io_error(path, e))
}

impl<T> Checkpoint<T> for JsonCheckpoint
where
    T: Serialize + DeserializeOwned,
{
    fn save(&mut self, records: &[T]) -> Result<(), PersistenceError> {
        write_atomic(&self.path, &self.temp_path(), records)?;
        tracing::debug!(path = %self.path.display(), records = records.len(), "Checkpoint saved");
        Ok(())
    }

    fn load(&self) -> Result<Vec<T>, PersistenceError> {
        if !self.path.exists() {
            return Ok(Vec::new());
        }

        let file = File::open(&self.path).map_err(|e| io_error(&self.path, e))?;
        let records: Vec<T> = serde_json::from_reader(BufReader::new(file))?;

        tracing::debug!(path = %self.path.display(), records = records.len(), "Checkpoint loaded");
        Ok(records)
    }
}

/// In-memory checkpoint that keeps every snapshot it is given
///
/// Useful for dry runs and for observing exactly when a phase checkpoints.
#[derive(Debug, Clone, Default)]
pub struct MemoryCheckpoint<T> {
    snapshots: Vec<Vec<T>>,
    seed: Vec<T>,
}

impl<T: Clone> MemoryCheckpoint<T> {
    pub fn new() -> Self {
        Self {
            snapshots: Vec::new(),
            seed: Vec::new(),
        }
    }

    /// Start with records that `load` returns, as if from a previous run
    pub fn with_existing(seed: Vec<T>) -> Self {
        Self {
            snapshots: Vec::new(),
            seed,
        }
    }

    /// Every saved snapshot, oldest first
    pub fn snapshots(&self) -> &[Vec<T>] {
        &self.snapshots
    }

    /// Record count of each snapshot, oldest first
    pub fn sizes(&self) -> Vec<usize> {
        self.snapshots.iter().map(Vec::len).collect()
    }

    /// Most recent snapshot
    pub fn latest(&self) -> Option<&[T]> {
        self.snapshots.last().map(Vec::as_slice)
    }
}

impl<T: Clone + Send> Checkpoint<T> for MemoryCheckpoint<T> {
    fn save(&mut self, records: &[T]) -> Result<(), PersistenceError> {
        self.snapshots.push(records.to_vec());
        Ok(())
    }

    fn load(&self) -> Result<Vec<T>, PersistenceError> {
        Ok(self.seed.clone())
    }
}

/// Snapshot of a failed title extraction for offline triage
#[derive(Debug, Clone, Default, Serialize)]
pub struct DetailDiagnostic {
    pub error: String,
    pub page_source: String,
    pub next_data: Option<Value>,
    pub above_the_fold: Option<Value>,
}

/// Writes `error_{id}_debug.json` files; failures are logged, never raised
#[derive(Debug, Clone)]
pub struct DiagnosticsWriter {
    dir: PathBuf,
}

impl DiagnosticsWriter {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    /// Path the snapshot for `id` is written to
    pub fn path_for(&self, id: &str) -> PathBuf {
        self.dir
            .join(sanitize_filename(&format!("error_{id}_debug.json")))
    }

    /// Write a snapshot for `id`, returning its path on success
    pub fn write(&self, id: &str, diagnostic: &DetailDiagnostic) -> Option<PathBuf> {
        let path = self.path_for(id);
        let mut temp_name = path.as_os_str().to_os_string();
        temp_name.push(".tmp");

        match write_atomic(&path, Path::new(&temp_name), diagnostic) {
            Ok(()) => {
                tracing::debug!(title_id = %id, path = %path.display(), "Diagnostic snapshot written");
                Some(path)
            }
            Err(e) => {
                tracing::warn!(title_id = %id, error = %e, "Could not write diagnostic snapshot");
                None
            }
        }
    }
}
