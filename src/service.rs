//! Collaborator boundary: persistence and reduction services.
//!
//! The core does not implement transport. [`DiagramStore`] and [`Reducer`]
//! are the seams behind which an HTTP client (or anything else) lives;
//! [`MemoryStore`] is the in-process implementation used in tests and
//! single-process embeddings. [`LocalBackup`] is the durable key-value slot
//! that catches saves when the store is unreachable and offers the last
//! payload back on the next load attempt.
//!
//! Failures are absorbed here and converted to outcomes the UI can present;
//! only "unreachable and no backup" surfaces as an error, carrying the
//! underlying service failure as context.

use std::path::{Path, PathBuf};

use anyhow::{Context, Result, bail};
use serde::{Deserialize, Serialize};

use crate::model::Diagram;
use crate::wire::{DiagramPayload, ReductionRequest, ReductionResponse};

// ────────────────────────────────────────────────────────────────────────────
// Service traits
// ────────────────────────────────────────────────────────────────────────────

/// Store acknowledgement: the saved diagram's id and name.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SavedDiagram {
    pub id: u64,
    pub name: String,
}

/// A diagram held by the store, as returned by the list endpoint.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StoredDiagram {
    pub id: u64,
    #[serde(flatten)]
    pub payload: DiagramPayload,
}

/// Persistence collaborator.
pub trait DiagramStore {
    /// Persist a payload, returning its assigned id and name.
    fn save(&mut self, payload: &DiagramPayload) -> Result<SavedDiagram>;

    /// List all stored diagrams.
    fn list(&self) -> Result<Vec<StoredDiagram>>;
}

/// Reduction collaborator: collapses a block diagram into an equivalent
/// transfer function.
pub trait Reducer {
    fn reduce(&self, request: &ReductionRequest) -> Result<ReductionResponse>;
}

// ────────────────────────────────────────────────────────────────────────────
// In-process store
// ────────────────────────────────────────────────────────────────────────────

/// In-memory [`DiagramStore`] with sequential ids.
#[derive(Debug, Clone, Default)]
pub struct MemoryStore {
    diagrams: Vec<StoredDiagram>,
    next_id: u64,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }
}

impl DiagramStore for MemoryStore {
    fn save(&mut self, payload: &DiagramPayload) -> Result<SavedDiagram> {
        self.next_id += 1;
        let name = payload
            .name
            .clone()
            .unwrap_or_else(|| "My Diagram".to_string());
        self.diagrams.push(StoredDiagram {
            id: self.next_id,
            payload: payload.clone(),
        });
        Ok(SavedDiagram {
            id: self.next_id,
            name,
        })
    }

    fn list(&self) -> Result<Vec<StoredDiagram>> {
        Ok(self.diagrams.clone())
    }
}

// ────────────────────────────────────────────────────────────────────────────
// Local backup slot
// ────────────────────────────────────────────────────────────────────────────

/// Fixed key under which the last-saved payload is held locally.
pub const BACKUP_KEY: &str = "diagram_backup";

/// File-backed key-value slot holding at most one payload under
/// [`BACKUP_KEY`].
#[derive(Debug, Clone)]
pub struct LocalBackup {
    path: PathBuf,
}

impl LocalBackup {
    /// Backup slot inside the given directory.
    pub fn new(dir: impl AsRef<Path>) -> Self {
        Self {
            path: dir.as_ref().join(format!("{}.json", BACKUP_KEY)),
        }
    }

    /// Overwrite the slot with the given payload.
    pub fn store(&self, payload: &DiagramPayload) -> Result<()> {
        let file = std::fs::File::create(&self.path)
            .with_context(|| format!("Create backup file {}", self.path.display()))?;
        serde_json::to_writer(std::io::BufWriter::new(file), payload)
            .context("Serialize backup payload")?;
        Ok(())
    }

    /// Read the slot, `None` if it has never been written.
    pub fn fetch(&self) -> Result<Option<DiagramPayload>> {
        if !self.path.exists() {
            return Ok(None);
        }
        let file = std::fs::File::open(&self.path)
            .with_context(|| format!("Open backup file {}", self.path.display()))?;
        let payload = serde_json::from_reader(std::io::BufReader::new(file))
            .context("Parse backup payload")?;
        Ok(Some(payload))
    }

    /// Drop the slot contents, if any.
    pub fn clear(&self) -> Result<()> {
        if self.path.exists() {
            std::fs::remove_file(&self.path)
                .with_context(|| format!("Remove backup file {}", self.path.display()))?;
        }
        Ok(())
    }
}

// ────────────────────────────────────────────────────────────────────────────
// Save / load / reduce orchestration
// ────────────────────────────────────────────────────────────────────────────

/// Where a save ended up.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SaveOutcome {
    /// The store accepted the payload.
    Remote(SavedDiagram),
    /// The store was unreachable; the payload went to the local backup slot.
    LocalFallback,
}

/// Where a loaded payload came from.
#[derive(Debug, Clone, PartialEq)]
pub enum LoadOutcome {
    Remote(DiagramPayload),
    /// The store was unreachable; this is the last locally backed-up payload.
    LocalFallback(DiagramPayload),
    /// The store is reachable but has no diagram with the requested id.
    NotFound,
}

/// Save a payload to the store, falling back to the local backup slot when
/// the store fails.
pub fn save_diagram(
    store: &mut dyn DiagramStore,
    backup: &LocalBackup,
    payload: &DiagramPayload,
) -> Result<SaveOutcome> {
    match store.save(payload) {
        Ok(saved) => Ok(SaveOutcome::Remote(saved)),
        Err(_) => {
            backup.store(payload)?;
            Ok(SaveOutcome::LocalFallback)
        }
    }
}

/// Load a stored diagram by id. When the store fails, the local backup is
/// offered instead (whatever its id was); with no backup either, the
/// original store error propagates.
pub fn load_diagram(
    store: &dyn DiagramStore,
    backup: &LocalBackup,
    id: u64,
) -> Result<LoadOutcome> {
    match store.list() {
        Ok(diagrams) => Ok(diagrams
            .into_iter()
            .find(|d| d.id == id)
            .map(|d| LoadOutcome::Remote(d.payload))
            .unwrap_or(LoadOutcome::NotFound)),
        Err(err) => match backup.fetch()? {
            Some(payload) => Ok(LoadOutcome::LocalFallback(payload)),
            None => Err(err.context("Service unavailable and no local backup found")),
        },
    }
}

/// Send the live graph to the reduction collaborator. There is no local
/// fallback for reduction: failures propagate with the underlying detail.
/// An empty diagram is rejected before anything is sent.
pub fn reduce_diagram(reducer: &dyn Reducer, diagram: &Diagram) -> Result<ReductionResponse> {
    if diagram.blocks.is_empty() {
        bail!("Nothing to reduce: the diagram has no blocks");
    }
    let request = ReductionRequest::from_diagram(diagram);
    reducer.reduce(&request).context("Reduction failed")
}
