//! Wiring operations for block diagrams.
//!
//! This module is the connection rule engine: it enforces output→input
//! directionality, the summer fan-in rules, and the delete cascade that keeps
//! summer input tables consistent with the connection sequence. Operations
//! work directly on a [`Diagram`] and report typed outcomes; invalid attempts
//! never panic and never mutate the model.

use crate::model::{BlockId, Connection, Diagram, PortKind, Sign};

// ────────────────────────────────────────────────────────────────────────────
// Connect
// ────────────────────────────────────────────────────────────────────────────

/// Result of a connection attempt.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConnectOutcome {
    /// A new connection was created.
    Connected { connection_id: u64 },
    /// The target summer already has an input from this source block.
    AlreadyExists,
    /// Self-connection, same-port pairing, or unknown block id. No-op.
    Rejected,
}

impl ConnectOutcome {
    /// True if a new connection was created.
    pub fn is_connected(self) -> bool {
        matches!(self, ConnectOutcome::Connected { .. })
    }
}

/// Try to wire two blocks together.
///
/// The pair is given in gesture order and normalized here: if `port_a` is an
/// input or `port_b` is an output, the endpoints are swapped so the resolved
/// direction is always `(from, output) -> (to, input)`.
///
/// For summer targets, an entry `(from, +)` is appended to the summer's input
/// table and the connection records its index; a second connection from the
/// same source into one summer is rejected as [`ConnectOutcome::AlreadyExists`].
pub fn connect(
    diagram: &mut Diagram,
    block_a: BlockId,
    port_a: PortKind,
    block_b: BlockId,
    port_b: PortKind,
) -> ConnectOutcome {
    if block_a == block_b || port_a == port_b {
        return ConnectOutcome::Rejected;
    }
    let (from, to) = if port_a == PortKind::Input || port_b == PortKind::Output {
        (block_b, block_a)
    } else {
        (block_a, block_b)
    };
    if diagram.find_block(from).is_none() {
        return ConnectOutcome::Rejected;
    }

    let id = diagram.next_connection_id();
    let Some(to_block) = diagram.find_block_mut(to) else {
        return ConnectOutcome::Rejected;
    };
    let input_index = match to_block.inputs.as_mut() {
        Some(inputs) => {
            if inputs.contains_key(&from) {
                return ConnectOutcome::AlreadyExists;
            }
            inputs.insert(from, Sign::Plus);
            Some(inputs.len() - 1)
        }
        None => None,
    };

    diagram.connections.push(Connection {
        id,
        from,
        from_port: PortKind::Output,
        to,
        to_port: PortKind::Input,
        input_index,
    });
    ConnectOutcome::Connected { connection_id: id }
}

// ────────────────────────────────────────────────────────────────────────────
// Summer input signs
// ────────────────────────────────────────────────────────────────────────────

/// Flip the sign of a summer input at the given index, returning the new
/// sign. Silently a no-op (`None`) if the block is absent, not a summer, or
/// the index is out of range.
pub fn toggle_input_sign(
    diagram: &mut Diagram,
    summer: BlockId,
    input_index: usize,
) -> Option<Sign> {
    let block = diagram.find_block_mut(summer)?;
    let inputs = block.inputs.as_mut()?;
    let (_, sign) = inputs.get_index_mut(input_index)?;
    *sign = sign.toggled();
    Some(*sign)
}

// ────────────────────────────────────────────────────────────────────────────
// Delete cascade
// ────────────────────────────────────────────────────────────────────────────

/// Delete a block and everything referencing it: every connection where it is
/// source or target, and its entry in every surviving summer's input table
/// (relative order of the remaining entries is kept; their stored
/// `input_index` values are re-derived at render time, not rewritten here).
///
/// Returns false (no-op) if the id is absent.
pub fn delete_block(diagram: &mut Diagram, id: BlockId) -> bool {
    if diagram.find_block(id).is_none() {
        return false;
    }
    for block in &mut diagram.blocks {
        if block.id == id {
            continue;
        }
        if let Some(inputs) = block.inputs.as_mut() {
            inputs.shift_remove(&id);
        }
    }
    diagram.connections.retain(|c| c.from != id && c.to != id);
    diagram.blocks.retain(|b| b.id != id);
    true
}
