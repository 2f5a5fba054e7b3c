//! Control-system block diagram editor core.
//!
//! This crate owns the in-memory state of an interactive block diagram
//! editor: typed blocks (gain, summer, integrator, …), directed connections,
//! the wiring rules that keep summer multi-input tables consistent, and a
//! snapshot-based undo/redo history. Rendering, input capture, and transport
//! are external collaborators; the crate exposes geometry and topology, a
//! JSON wire format for the persistence and reduction services, and a local
//! backup slot used when those services are unreachable.

pub mod model;
pub mod editor;
pub mod wire;
pub mod service;
