//! Transport-neutral wire format for diagrams.
//!
//! The JSON-compatible payload shapes exchanged with the persistence and
//! reduction collaborators, conversions to and from the live [`Diagram`], and
//! a versioned binary document format for on-disk storage.
//!
//! Payloads are deep, order-preserving copies that never alias live model
//! objects. Externally produced payloads are applied as-is: the collaborator
//! is trusted to return internally consistent graphs, and only the block id
//! counter is recomputed to keep future allocations collision-free.

use serde::{Deserialize, Serialize};

use crate::model::{Block, Connection, Diagram};

/// Wire format version stamped into payload metadata.
pub const WIRE_VERSION: &str = "1.0";

// ────────────────────────────────────────────────────────────────────────────
// Payload shapes
// ────────────────────────────────────────────────────────────────────────────

/// Optional payload metadata attached on save.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DiagramMetadata {
    /// Creation timestamp, ISO 8601. Supplied by the embedding UI, which
    /// owns the clock.
    pub created: String,
    pub version: String,
}

impl DiagramMetadata {
    /// Metadata with the given creation timestamp and the current wire
    /// version.
    pub fn new(created: impl Into<String>) -> Self {
        Self {
            created: created.into(),
            version: WIRE_VERSION.to_string(),
        }
    }
}

/// Complete diagram as exchanged with the persistence collaborator.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DiagramPayload {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    /// Missing sequences in external data default to empty.
    #[serde(default)]
    pub blocks: Vec<Block>,
    #[serde(default)]
    pub connections: Vec<Connection>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub metadata: Option<DiagramMetadata>,
}

/// Graph sent to the reduction collaborator.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ReductionRequest {
    pub blocks: Vec<Block>,
    pub connections: Vec<Connection>,
}

impl ReductionRequest {
    /// Deep copy of the live graph.
    pub fn from_diagram(diagram: &Diagram) -> Self {
        Self {
            blocks: diagram.blocks.clone(),
            connections: diagram.connections.clone(),
        }
    }
}

/// Reduction collaborator response. Absence of the reduced graph means the
/// model is left unchanged even on a successful call.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct ReductionResponse {
    #[serde(
        rename = "reducedBlocks",
        default,
        skip_serializing_if = "Option::is_none"
    )]
    pub reduced_blocks: Option<Vec<Block>>,
    #[serde(
        rename = "reducedConnections",
        default,
        skip_serializing_if = "Option::is_none"
    )]
    pub reduced_connections: Option<Vec<Connection>>,
    #[serde(
        rename = "transferFunction",
        default,
        skip_serializing_if = "Option::is_none"
    )]
    pub transfer_function: Option<String>,
}

// ────────────────────────────────────────────────────────────────────────────
// Diagram ↔ payload conversion
// ────────────────────────────────────────────────────────────────────────────

impl Diagram {
    /// Deep, order-preserving copy of the diagram as a wire payload.
    pub fn to_payload(&self, name: Option<String>, metadata: Option<DiagramMetadata>) -> DiagramPayload {
        DiagramPayload {
            name,
            blocks: self.blocks.clone(),
            connections: self.connections.clone(),
            metadata,
        }
    }

    /// Build a diagram from an external payload. The block id counter is
    /// recomputed from the loaded blocks.
    pub fn from_payload(payload: DiagramPayload) -> Diagram {
        let mut diagram = Diagram::new();
        diagram.load_from(payload.blocks, payload.connections);
        diagram
    }
}

// ────────────────────────────────────────────────────────────────────────────
// Binary document format
// ────────────────────────────────────────────────────────────────────────────

const DOC_MAGIC: &[u8; 9] = b"BLOCKCANV";
const DOC_VERSION: u32 = 1;

/// On-disk diagram document with magic bytes and format versioning.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DiagramDoc {
    pub payload: DiagramPayload,
}

impl DiagramDoc {
    /// Save the document to a binary file with magic bytes and versioning.
    pub fn save_to_binary<P: AsRef<std::path::Path>>(&self, path: P) -> anyhow::Result<()> {
        let file = std::fs::File::create(path)?;
        let mut writer = std::io::BufWriter::new(file);
        std::io::Write::write_all(&mut writer, DOC_MAGIC)?;
        std::io::Write::write_all(&mut writer, &DOC_VERSION.to_le_bytes())?;
        bincode::serde::encode_into_std_write(self, &mut writer, bincode::config::standard())?;
        Ok(())
    }

    /// Load a document from a binary file, checking magic bytes and version.
    pub fn load_from_binary<P: AsRef<std::path::Path>>(path: P) -> anyhow::Result<Self> {
        let file = std::fs::File::open(path)?;
        let mut reader = std::io::BufReader::new(file);
        let mut magic = [0u8; 9];
        std::io::Read::read_exact(&mut reader, &mut magic)?;
        if &magic != DOC_MAGIC {
            anyhow::bail!("Invalid magic bytes: expected 'BLOCKCANV'");
        }
        let mut version_bytes = [0u8; 4];
        std::io::Read::read_exact(&mut reader, &mut version_bytes)?;
        let version = u32::from_le_bytes(version_bytes);
        if version != DOC_VERSION {
            anyhow::bail!("Unsupported version: {}", version);
        }
        let doc: DiagramDoc =
            bincode::serde::decode_from_std_read(&mut reader, bincode::config::standard())?;
        Ok(doc)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::editor::operations::connect;
    use crate::model::{BlockKind, PortKind};

    /// Input(1) → Summer(2) → Output(3), with a negative feedback entry.
    fn sample_diagram() -> Diagram {
        let mut diagram = Diagram::new();
        diagram.create_block(BlockKind::Input, 0.0, 0.0);
        diagram.create_block(BlockKind::Summer, 200.0, 0.0);
        diagram.create_block(BlockKind::Output, 400.0, 0.0);
        connect(&mut diagram, 1, PortKind::Output, 2, PortKind::Input);
        connect(&mut diagram, 3, PortKind::Output, 2, PortKind::Input);
        connect(&mut diagram, 2, PortKind::Output, 3, PortKind::Input);
        crate::editor::operations::toggle_input_sign(&mut diagram, 2, 1);
        diagram
    }

    #[test]
    fn test_payload_roundtrip_preserves_structure() {
        let diagram = sample_diagram();
        let payload = diagram.to_payload(Some("loop".into()), None);
        let restored = Diagram::from_payload(payload);
        assert_eq!(restored, diagram);
    }

    #[test]
    fn test_payload_roundtrip_through_json() {
        let diagram = sample_diagram();
        let payload = diagram.to_payload(None, Some(DiagramMetadata::new("2026-01-01T00:00:00Z")));
        let json = serde_json::to_string(&payload).unwrap();
        let parsed: DiagramPayload = serde_json::from_str(&json).unwrap();
        assert_eq!(parsed, payload);
        assert_eq!(Diagram::from_payload(parsed), diagram);
    }

    #[test]
    fn test_payload_missing_sequences_default_empty() {
        let payload: DiagramPayload = serde_json::from_str(r#"{"name": "bare"}"#).unwrap();
        assert!(payload.blocks.is_empty());
        assert!(payload.connections.is_empty());
        let diagram = Diagram::from_payload(payload);
        assert_eq!(diagram.next_block_id(), 0);
    }

    #[test]
    fn test_from_payload_recomputes_id_counter() {
        let diagram = sample_diagram();
        let mut restored = Diagram::from_payload(diagram.to_payload(None, None));
        assert_eq!(restored.next_block_id(), 3);
        assert_eq!(restored.create_block(BlockKind::Gain, 0.0, 0.0).id, 4);
    }

    #[test]
    fn test_reduction_response_wire_names() {
        let json = r#"{
            "reducedBlocks": [],
            "reducedConnections": [],
            "transferFunction": "G/(1+GH)"
        }"#;
        let response: ReductionResponse = serde_json::from_str(json).unwrap();
        assert_eq!(response.reduced_blocks.as_deref(), Some(&[][..]));
        assert_eq!(response.reduced_connections.as_deref(), Some(&[][..]));
        assert_eq!(response.transfer_function.as_deref(), Some("G/(1+GH)"));

        let empty: ReductionResponse = serde_json::from_str("{}").unwrap();
        assert_eq!(empty, ReductionResponse::default());
    }

    #[test]
    fn test_binary_doc_roundtrip() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("diagram.bcd");
        let doc = DiagramDoc {
            payload: sample_diagram().to_payload(Some("loop".into()), None),
        };
        doc.save_to_binary(&path).unwrap();
        let loaded = DiagramDoc::load_from_binary(&path).unwrap();
        assert_eq!(loaded.payload, doc.payload);
    }

    #[test]
    fn test_binary_doc_rejects_bad_magic() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("bogus.bcd");
        std::fs::write(&path, b"NOTADIAGRAMFILE").unwrap();
        assert!(DiagramDoc::load_from_binary(&path).is_err());
    }
}
