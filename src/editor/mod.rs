//! Interactive editing engine for block diagrams.
//!
//! This module layers the editing machinery on top of the core model:
//!
//! - **Wiring rules**: output→input normalization, summer fan-in rules, and
//!   the delete cascade ([`operations`])
//! - **Undo/Redo**: snapshot history with a cursor and bounded capacity
//!   ([`history`])
//! - **Connection gesture**: the explicit two-click port-to-port state
//!   machine ([`gesture`])
//! - **Session**: the facade that validates user intents, applies them, and
//!   keeps history, dirty flag, and status line consistent ([`session`])

pub mod gesture;
pub mod history;
pub mod operations;
pub mod session;

pub use gesture::{ConnectAttempt, ConnectGesture};
pub use history::{History, MAX_HISTORY};
pub use operations::{ConnectOutcome, connect, delete_block, toggle_input_sign};
pub use session::EditorSession;
