//! Core diagram model: blocks, directed connections, and the owning
//! [`Diagram`].
//!
//! The [`Diagram`] is the single mutable source of truth for the editor. It
//! holds the block and connection sequences plus the monotonically increasing
//! block id counter, and provides creation, lookup, and structural mutation
//! primitives without any UI knowledge. Wiring rules (summer fan-in, delete
//! cascades) live in [`crate::editor::operations`]; undo/redo snapshots in
//! [`crate::editor::history`].

use indexmap::IndexMap;
use serde::{Deserialize, Serialize};

/// Process-lifetime-unique block identifier. Ids are never reused after
/// deletion.
pub type BlockId = u64;

// ────────────────────────────────────────────────────────────────────────────
// Block kind
// ────────────────────────────────────────────────────────────────────────────

/// The closed enumeration of block types a diagram may contain.
///
/// Each kind carries its own default display value, label, and glyph
/// dimensions. The set is fixed: block types are not user-extensible.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum BlockKind {
    /// Multiplies its input by a constant factor.
    Gain,
    /// Summing junction combining multiple signed inputs into one output.
    Summer,
    /// `1/s` — integrates the input signal.
    Integrator,
    /// `s` — differentiates the input signal.
    Differentiator,
    /// Pass-through signal node.
    Node,
    /// Branch (pick-off) point.
    Branch,
    /// External reference input, conventionally `R(s)`.
    Input,
    /// Controlled output, conventionally `C(s)`.
    Output,
}

impl BlockKind {
    /// All block kinds, in toolbar order.
    pub const ALL: [BlockKind; 8] = [
        BlockKind::Gain,
        BlockKind::Summer,
        BlockKind::Integrator,
        BlockKind::Differentiator,
        BlockKind::Node,
        BlockKind::Branch,
        BlockKind::Input,
        BlockKind::Output,
    ];

    /// Human-readable display label.
    pub fn label(self) -> &'static str {
        match self {
            BlockKind::Gain => "Gain",
            BlockKind::Summer => "Summer",
            BlockKind::Integrator => "Integrator",
            BlockKind::Differentiator => "Differentiator",
            BlockKind::Node => "Node",
            BlockKind::Branch => "Branch",
            BlockKind::Input => "Input",
            BlockKind::Output => "Output",
        }
    }

    /// Default display value for a freshly created block of this kind.
    pub fn default_value(self) -> &'static str {
        match self {
            BlockKind::Gain => "1",
            BlockKind::Summer => "Σ",
            BlockKind::Integrator => "1/s",
            BlockKind::Differentiator => "s",
            BlockKind::Node => "",
            BlockKind::Branch => "1",
            BlockKind::Input => "R(s)",
            BlockKind::Output => "C(s)",
        }
    }

    /// Glyph dimensions `(width, height)` in diagram coordinates. The summer
    /// is a 60×60 circular glyph; every other kind is a 100×60 box.
    pub fn dimensions(self) -> (f64, f64) {
        match self {
            BlockKind::Summer => (60.0, 60.0),
            _ => (100.0, 60.0),
        }
    }
}

// ────────────────────────────────────────────────────────────────────────────
// Signs and ports
// ────────────────────────────────────────────────────────────────────────────

/// Sign of a summer input: positive (additive) or negative (subtractive)
/// feedback. New inputs default to [`Sign::Plus`] per control-diagram
/// convention; sign is an editable property, never inferred from topology.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Sign {
    #[serde(rename = "+")]
    Plus,
    #[serde(rename = "-")]
    Minus,
}

impl Sign {
    /// The opposite sign.
    pub fn toggled(self) -> Sign {
        match self {
            Sign::Plus => Sign::Minus,
            Sign::Minus => Sign::Plus,
        }
    }

    /// Wire/display representation (`"+"` / `"-"`).
    pub fn as_str(self) -> &'static str {
        match self {
            Sign::Plus => "+",
            Sign::Minus => "-",
        }
    }
}

/// Which side of a block a connection endpoint attaches to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PortKind {
    Input,
    Output,
}

// ────────────────────────────────────────────────────────────────────────────
// Block
// ────────────────────────────────────────────────────────────────────────────

/// Ordered summer input table: source block id → sign.
///
/// Insertion order is load-bearing — it determines the summer's visual input
/// port positions (top to bottom), and each connection's `inputIndex` ties it
/// to a specific port. The map key enforces that a source block feeds a given
/// summer at most once.
pub type SummerInputs = IndexMap<BlockId, Sign>;

/// A node in the diagram representing a control-system element.
///
/// Invariant: `inputs` is `Some` if and only if `kind == BlockKind::Summer`.
/// A non-summer block has exactly one implicit input port and one output
/// port, not modeled as a list.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Block {
    pub id: BlockId,
    #[serde(rename = "type")]
    pub kind: BlockKind,
    /// Top-left position in diagram coordinate space.
    pub x: f64,
    pub y: f64,
    /// Fixed per kind; stored explicitly because the wire format carries it.
    pub width: f64,
    pub height: f64,
    /// Free-text display string (e.g. a gain factor or transfer function).
    pub value: String,
    /// Display name derived from the kind.
    pub label: String,
    /// Signed input table, present only for summers.
    #[serde(with = "summer_inputs_wire", default)]
    pub inputs: Option<SummerInputs>,
}

impl Block {
    /// Create a block of the given kind at `(x, y)` with per-kind defaults.
    pub fn new(id: BlockId, kind: BlockKind, x: f64, y: f64) -> Self {
        let (width, height) = kind.dimensions();
        Self {
            id,
            kind,
            x,
            y,
            width,
            height,
            value: kind.default_value().to_string(),
            label: kind.label().to_string(),
            inputs: if kind == BlockKind::Summer {
                Some(SummerInputs::new())
            } else {
                None
            },
        }
    }
}

/// Serde adapter mapping [`SummerInputs`] to the wire shape
/// `[{"from": 3, "sign": "+"}, …] | null`, preserving entry order.
mod summer_inputs_wire {
    use super::{BlockId, Sign, SummerInputs};
    use serde::ser::SerializeSeq;
    use serde::{Deserialize, Deserializer, Serialize, Serializer};

    #[derive(Serialize, Deserialize)]
    struct Entry {
        from: BlockId,
        sign: Sign,
    }

    struct Entries<'a>(&'a SummerInputs);

    impl Serialize for Entries<'_> {
        fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
            let mut seq = serializer.serialize_seq(Some(self.0.len()))?;
            for (&from, &sign) in self.0 {
                seq.serialize_element(&Entry { from, sign })?;
            }
            seq.end()
        }
    }

    pub fn serialize<S: Serializer>(
        inputs: &Option<SummerInputs>,
        serializer: S,
    ) -> Result<S::Ok, S::Error> {
        match inputs {
            None => serializer.serialize_none(),
            Some(map) => serializer.serialize_some(&Entries(map)),
        }
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(
        deserializer: D,
    ) -> Result<Option<SummerInputs>, D::Error> {
        let entries: Option<Vec<Entry>> = Option::deserialize(deserializer)?;
        Ok(entries.map(|list| list.into_iter().map(|e| (e.from, e.sign)).collect()))
    }
}

// ────────────────────────────────────────────────────────────────────────────
// Connection
// ────────────────────────────────────────────────────────────────────────────

/// A directed edge from one block's output port to another block's input
/// port. Direction is normalized at creation time, so `from_port` is always
/// [`PortKind::Output`] and `to_port` always [`PortKind::Input`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Connection {
    pub id: u64,
    pub from: BlockId,
    #[serde(rename = "fromType")]
    pub from_port: PortKind,
    pub to: BlockId,
    #[serde(rename = "toType")]
    pub to_port: PortKind,
    /// Index into the target summer's input table when `to` is a summer,
    /// `None` otherwise.
    #[serde(rename = "inputIndex")]
    pub input_index: Option<usize>,
}

// ────────────────────────────────────────────────────────────────────────────
// Diagram
// ────────────────────────────────────────────────────────────────────────────

/// Immutable deep copy of the full diagram state at one point in edit
/// history. Snapshots never alias live model objects.
#[derive(Debug, Clone, PartialEq)]
pub struct DiagramSnapshot {
    pub blocks: Vec<Block>,
    pub connections: Vec<Connection>,
    pub next_block_id: BlockId,
}

/// The authoritative block/connection graph of one editing session.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Diagram {
    pub blocks: Vec<Block>,
    pub connections: Vec<Connection>,
    /// Last allocated block id. Not reset by [`Diagram::clear`], so ids stay
    /// unique across a session; recomputed when loading external data.
    next_block_id: BlockId,
}

impl Diagram {
    /// Create an empty diagram.
    pub fn new() -> Self {
        Self::default()
    }

    /// Allocate the next block id and append a block of the given kind at
    /// `(x, y)` with per-kind defaults. Returns a reference to the new block.
    pub fn create_block(&mut self, kind: BlockKind, x: f64, y: f64) -> &Block {
        self.next_block_id += 1;
        let block = Block::new(self.next_block_id, kind, x, y);
        self.blocks.push(block);
        self.blocks.last().expect("block was just pushed")
    }

    /// Look up a block by id.
    pub fn find_block(&self, id: BlockId) -> Option<&Block> {
        self.blocks.iter().find(|b| b.id == id)
    }

    /// Look up a block by id, mutably.
    pub fn find_block_mut(&mut self, id: BlockId) -> Option<&mut Block> {
        self.blocks.iter_mut().find(|b| b.id == id)
    }

    /// Set a block's display value. Returns false (no-op) if the id is
    /// absent.
    pub fn set_block_value(&mut self, id: BlockId, value: &str) -> bool {
        match self.find_block_mut(id) {
            Some(block) => {
                block.value = value.to_string();
                true
            }
            None => false,
        }
    }

    /// Move a block to a new top-left position. Returns false (no-op) if the
    /// id is absent.
    pub fn set_block_position(&mut self, id: BlockId, x: f64, y: f64) -> bool {
        match self.find_block_mut(id) {
            Some(block) => {
                block.x = x;
                block.y = y;
                true
            }
            None => false,
        }
    }

    /// Empty both sequences. The id counter is NOT reset, preserving
    /// uniqueness across the session.
    pub fn clear(&mut self) {
        self.blocks.clear();
        self.connections.clear();
    }

    /// Replace blocks and connections with externally produced data. The id
    /// counter is recomputed as the maximum block id found (or 0) so that
    /// future allocations never collide with loaded ids.
    ///
    /// Cross-consistency of summer input tables vs. connections is trusted
    /// as-is; the persistence and reduction collaborators are expected to
    /// return internally consistent graphs.
    pub fn load_from(&mut self, blocks: Vec<Block>, connections: Vec<Connection>) {
        self.next_block_id = blocks.iter().map(|b| b.id).max().unwrap_or(0);
        self.blocks = blocks;
        self.connections = connections;
    }

    /// Next free connection id (maximum live id + 1). Derived from the live
    /// sequence so it stays consistent across snapshot restores.
    pub fn next_connection_id(&self) -> u64 {
        self.connections.iter().map(|c| c.id).max().unwrap_or(0) + 1
    }

    /// The last allocated block id.
    pub fn next_block_id(&self) -> BlockId {
        self.next_block_id
    }

    /// Deep copy of the current state for the undo/redo history.
    pub fn snapshot(&self) -> DiagramSnapshot {
        DiagramSnapshot {
            blocks: self.blocks.clone(),
            connections: self.connections.clone(),
            next_block_id: self.next_block_id,
        }
    }

    /// Adopt a history snapshot wholesale, including the id counter.
    pub fn restore(&mut self, snapshot: &DiagramSnapshot) {
        self.blocks = snapshot.blocks.clone();
        self.connections = snapshot.connections.clone();
        self.next_block_id = snapshot.next_block_id;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_block_kind_defaults() {
        for kind in BlockKind::ALL {
            let block = Block::new(1, kind, 0.0, 0.0);
            assert_eq!(block.inputs.is_some(), kind == BlockKind::Summer);
            if kind == BlockKind::Summer {
                assert_eq!((block.width, block.height), (60.0, 60.0));
            } else {
                assert_eq!((block.width, block.height), (100.0, 60.0));
            }
            assert_eq!(block.value, kind.default_value());
            assert_eq!(block.label, kind.label());
        }
    }

    #[test]
    fn test_create_block_allocates_sequential_ids() {
        let mut diagram = Diagram::new();
        let a = diagram.create_block(BlockKind::Gain, 10.0, 20.0).id;
        let b = diagram.create_block(BlockKind::Summer, 30.0, 40.0).id;
        assert_eq!(a, 1);
        assert_eq!(b, 2);
        assert_eq!(diagram.next_block_id(), 2);
    }

    #[test]
    fn test_ids_not_reused_after_clear() {
        let mut diagram = Diagram::new();
        diagram.create_block(BlockKind::Gain, 0.0, 0.0);
        diagram.create_block(BlockKind::Node, 0.0, 0.0);
        diagram.clear();
        assert!(diagram.blocks.is_empty());
        assert!(diagram.connections.is_empty());
        let next = diagram.create_block(BlockKind::Input, 0.0, 0.0).id;
        assert_eq!(next, 3);
    }

    #[test]
    fn test_set_value_and_position() {
        let mut diagram = Diagram::new();
        let id = diagram.create_block(BlockKind::Gain, 0.0, 0.0).id;
        assert!(diagram.set_block_value(id, "2.5"));
        assert!(diagram.set_block_position(id, 120.0, 80.0));
        let block = diagram.find_block(id).unwrap();
        assert_eq!(block.value, "2.5");
        assert_eq!((block.x, block.y), (120.0, 80.0));

        // Lookup misses are benign no-ops
        assert!(!diagram.set_block_value(999, "x"));
        assert!(!diagram.set_block_position(999, 0.0, 0.0));
        assert!(diagram.find_block(999).is_none());
    }

    #[test]
    fn test_load_from_recomputes_id_counter() {
        let mut diagram = Diagram::new();
        let blocks = vec![
            Block::new(7, BlockKind::Gain, 0.0, 0.0),
            Block::new(3, BlockKind::Output, 0.0, 0.0),
        ];
        diagram.load_from(blocks, Vec::new());
        assert_eq!(diagram.next_block_id(), 7);
        assert_eq!(diagram.create_block(BlockKind::Node, 0.0, 0.0).id, 8);

        diagram.load_from(Vec::new(), Vec::new());
        assert_eq!(diagram.next_block_id(), 0);
    }

    #[test]
    fn test_snapshot_restore_roundtrip() {
        let mut diagram = Diagram::new();
        diagram.create_block(BlockKind::Gain, 1.0, 2.0);
        let snap = diagram.snapshot();
        diagram.create_block(BlockKind::Summer, 3.0, 4.0);
        assert_ne!(diagram.snapshot(), snap);
        diagram.restore(&snap);
        assert_eq!(diagram.snapshot(), snap);
        assert_eq!(diagram.blocks.len(), 1);
    }

    #[test]
    fn test_snapshot_does_not_alias_live_state() {
        let mut diagram = Diagram::new();
        let id = diagram.create_block(BlockKind::Gain, 0.0, 0.0).id;
        let snap = diagram.snapshot();
        diagram.set_block_value(id, "42");
        assert_eq!(snap.blocks[0].value, "1");
    }

    #[test]
    fn test_block_wire_shape() {
        let block = Block::new(1, BlockKind::Gain, 10.0, 20.0);
        let json = serde_json::to_value(&block).unwrap();
        assert_eq!(json["type"], "gain");
        assert_eq!(json["label"], "Gain");
        assert!(json["inputs"].is_null());

        let mut summer = Block::new(2, BlockKind::Summer, 0.0, 0.0);
        summer.inputs.as_mut().unwrap().insert(1, Sign::Minus);
        let json = serde_json::to_value(&summer).unwrap();
        assert_eq!(json["type"], "summer");
        assert_eq!(json["inputs"][0]["from"], 1);
        assert_eq!(json["inputs"][0]["sign"], "-");

        let back: Block = serde_json::from_value(json).unwrap();
        assert_eq!(back, summer);
    }

    #[test]
    fn test_connection_wire_shape() {
        let conn = Connection {
            id: 1,
            from: 2,
            from_port: PortKind::Output,
            to: 3,
            to_port: PortKind::Input,
            input_index: Some(0),
        };
        let json = serde_json::to_value(&conn).unwrap();
        assert_eq!(json["fromType"], "output");
        assert_eq!(json["toType"], "input");
        assert_eq!(json["inputIndex"], 0);
    }

    #[test]
    fn test_sign_toggle() {
        assert_eq!(Sign::Plus.toggled(), Sign::Minus);
        assert_eq!(Sign::Minus.toggled(), Sign::Plus);
        assert_eq!(Sign::Plus.as_str(), "+");
    }
}
