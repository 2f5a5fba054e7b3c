//! Two-click connection gesture.
//!
//! Wiring two blocks is a two-press gesture: the first press on a port arms
//! the gesture, the second press completes it. Modeling this as an explicit
//! state machine (instead of a boolean flag plus a nullable endpoint) means
//! the pending state cannot be left dangling after an invalid attempt: the
//! second press always disarms, and validation of the resulting pair is the
//! rule engine's job.

use crate::model::{BlockId, PortKind};

/// An armed-and-completed gesture: the two endpoints as pressed, in gesture
/// order. Not yet validated or normalized.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ConnectAttempt {
    pub from_block: BlockId,
    pub from_port: PortKind,
    pub to_block: BlockId,
    pub to_port: PortKind,
}

/// State of the connection gesture.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ConnectGesture {
    /// No connection in progress.
    #[default]
    Idle,
    /// First endpoint pressed, waiting for the second.
    PendingFrom { block: BlockId, port: PortKind },
}

impl ConnectGesture {
    /// The single gesture transition. A press while idle arms the gesture
    /// and returns `None`; a press while pending disarms it and returns the
    /// attempted pair, valid or not.
    pub fn press(&mut self, block: BlockId, port: PortKind) -> Option<ConnectAttempt> {
        match *self {
            ConnectGesture::Idle => {
                *self = ConnectGesture::PendingFrom { block, port };
                None
            }
            ConnectGesture::PendingFrom {
                block: from_block,
                port: from_port,
            } => {
                *self = ConnectGesture::Idle;
                Some(ConnectAttempt {
                    from_block,
                    from_port,
                    to_block: block,
                    to_port: port,
                })
            }
        }
    }

    /// Abandon a pending gesture (e.g. on Escape or canvas click).
    pub fn cancel(&mut self) {
        *self = ConnectGesture::Idle;
    }

    /// True if the first endpoint has been pressed.
    pub fn is_pending(&self) -> bool {
        matches!(self, ConnectGesture::PendingFrom { .. })
    }
}
