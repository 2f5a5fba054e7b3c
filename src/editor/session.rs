//! Editing session state.
//!
//! [`EditorSession`] owns the live [`Diagram`] together with the undo/redo
//! [`History`], the connection [`ConnectGesture`], a dirty flag, and the last
//! user-visible status line. Every user intent flows through it: intents are
//! validated by the rule engine, and each *successful* mutation records
//! exactly one history snapshot. Rejected or no-op intents record nothing, so
//! every history entry is self-consistent.

use crate::editor::gesture::ConnectGesture;
use crate::editor::history::{History, MAX_HISTORY};
use crate::editor::operations::{self, ConnectOutcome};
use crate::model::{BlockId, BlockKind, Diagram, PortKind};
use crate::wire::{DiagramMetadata, DiagramPayload, ReductionResponse};

/// The complete state of one diagram editing session.
#[derive(Debug, Clone)]
pub struct EditorSession {
    /// The authoritative diagram.
    pub diagram: Diagram,
    /// Undo/redo history.
    pub history: History,
    /// Two-click connection gesture.
    pub gesture: ConnectGesture,
    /// Whether the diagram has been modified since the last save.
    pub dirty: bool,
    /// Last status message for the UI status line.
    status: String,
}

impl Default for EditorSession {
    fn default() -> Self {
        Self::new()
    }
}

impl EditorSession {
    /// Start a session on an empty diagram. The empty state is recorded as
    /// the first history snapshot, so undoing the first edit returns to
    /// "empty" rather than an undefined state.
    pub fn new() -> Self {
        let diagram = Diagram::new();
        let mut history = History::new(MAX_HISTORY);
        history.record(diagram.snapshot());
        Self {
            diagram,
            history,
            gesture: ConnectGesture::Idle,
            dirty: false,
            status: "Ready".to_string(),
        }
    }

    /// Last status message.
    pub fn status(&self) -> &str {
        &self.status
    }

    /// Number of blocks in the diagram (status bar counter).
    pub fn block_count(&self) -> usize {
        self.diagram.blocks.len()
    }

    /// Number of connections in the diagram (status bar counter).
    pub fn connection_count(&self) -> usize {
        self.diagram.connections.len()
    }

    fn committed(&mut self, status: String) {
        self.history.record(self.diagram.snapshot());
        self.dirty = true;
        self.status = status;
    }

    // ── User intents ────────────────────────────────────────────────────────

    /// Create a block of the given kind at `(x, y)`. Never fails; the kind
    /// enumeration is closed.
    pub fn create_block(&mut self, kind: BlockKind, x: f64, y: f64) -> BlockId {
        let id = self.diagram.create_block(kind, x, y).id;
        self.committed(format!("Created {} block", kind.label()));
        id
    }

    /// Press a connection port. The first press arms the gesture; the second
    /// attempts the connection and reports its outcome.
    pub fn press_port(&mut self, block: BlockId, port: PortKind) -> Option<ConnectOutcome> {
        let attempt = match self.gesture.press(block, port) {
            None => {
                self.status = "Click on another connection point to connect".to_string();
                return None;
            }
            Some(attempt) => attempt,
        };
        let outcome = operations::connect(
            &mut self.diagram,
            attempt.from_block,
            attempt.from_port,
            attempt.to_block,
            attempt.to_port,
        );
        match outcome {
            ConnectOutcome::Connected { .. } => {
                let from_label = self.block_label(attempt.from_block);
                let to_label = self.block_label(attempt.to_block);
                self.committed(format!("Connected {} to {}", from_label, to_label));
            }
            ConnectOutcome::AlreadyExists => {
                self.status = "Connection already exists".to_string();
            }
            ConnectOutcome::Rejected => {
                self.status = "Ready".to_string();
            }
        }
        Some(outcome)
    }

    fn block_label(&self, id: BlockId) -> String {
        self.diagram
            .find_block(id)
            .map(|b| b.label.clone())
            .unwrap_or_else(|| format!("Block {}", id))
    }

    /// Flip the sign of a summer input. No-op (no snapshot) when the target
    /// does not resolve.
    pub fn toggle_input_sign(&mut self, summer: BlockId, input_index: usize) -> bool {
        match operations::toggle_input_sign(&mut self.diagram, summer, input_index) {
            Some(sign) => {
                self.committed(format!("Changed input sign to {}", sign.as_str()));
                true
            }
            None => false,
        }
    }

    /// Set a block's display value.
    pub fn set_block_value(&mut self, id: BlockId, value: &str) -> bool {
        let label = self.block_label(id);
        if self.diagram.set_block_value(id, value) {
            self.committed(format!("Updated {} value to {}", label, value));
            true
        } else {
            false
        }
    }

    /// Move a block to a new position.
    pub fn move_block(&mut self, id: BlockId, x: f64, y: f64) -> bool {
        if self.diagram.set_block_position(id, x, y) {
            self.committed(format!("Moved {}", self.block_label(id)));
            true
        } else {
            false
        }
    }

    /// Delete a block and its connections.
    pub fn delete_block(&mut self, id: BlockId) -> bool {
        if operations::delete_block(&mut self.diagram, id) {
            self.committed("Block deleted".to_string());
            true
        } else {
            false
        }
    }

    /// Empty the canvas. Clearing an already-empty diagram is a no-op and
    /// records nothing.
    pub fn clear(&mut self) -> bool {
        if self.diagram.blocks.is_empty() && self.diagram.connections.is_empty() {
            return false;
        }
        self.diagram.clear();
        self.gesture.cancel();
        self.committed("Canvas cleared".to_string());
        true
    }

    // ── Undo / redo ─────────────────────────────────────────────────────────

    /// Step back one snapshot, adopting it wholesale.
    pub fn undo(&mut self) -> bool {
        if let Some(snapshot) = self.history.undo() {
            self.diagram.restore(snapshot);
            self.gesture.cancel();
            self.dirty = true;
            self.status = "Undone".to_string();
            true
        } else {
            false
        }
    }

    /// Step forward one snapshot, adopting it wholesale.
    pub fn redo(&mut self) -> bool {
        if let Some(snapshot) = self.history.redo() {
            self.diagram.restore(snapshot);
            self.gesture.cancel();
            self.dirty = true;
            self.status = "Redone".to_string();
            true
        } else {
            false
        }
    }

    pub fn can_undo(&self) -> bool {
        self.history.can_undo()
    }

    pub fn can_redo(&self) -> bool {
        self.history.can_redo()
    }

    // ── Collaborator payloads ───────────────────────────────────────────────

    /// Deep copy of the diagram as a wire payload.
    pub fn to_payload(
        &self,
        name: Option<String>,
        metadata: Option<DiagramMetadata>,
    ) -> DiagramPayload {
        self.diagram.to_payload(name, metadata)
    }

    /// Replace the diagram with an externally loaded payload. The payload is
    /// trusted as-is; the id counter is recomputed from the loaded blocks.
    pub fn load_payload(&mut self, payload: DiagramPayload) {
        let name = payload.name.clone().unwrap_or_else(|| "Diagram".to_string());
        self.diagram = Diagram::from_payload(payload);
        self.gesture.cancel();
        self.history.record(self.diagram.snapshot());
        self.dirty = false;
        self.status = format!("Loaded: {}", name);
    }

    /// Apply a reduction result. The model is replaced only when the
    /// response carries both the reduced blocks and connections; otherwise
    /// it is left untouched and no snapshot is recorded.
    pub fn apply_reduction(&mut self, response: ReductionResponse) -> bool {
        let (Some(blocks), Some(connections)) =
            (response.reduced_blocks, response.reduced_connections)
        else {
            return false;
        };
        self.diagram.load_from(blocks, connections);
        self.gesture.cancel();
        self.committed("Graph reduced successfully".to_string());
        true
    }
}
