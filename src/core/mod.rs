//! Core logic – wire types, reveal scheduling, checklist parsing and clause
//! rows.
//!
//! Nothing in this module depends on any TUI, HTTP or rendering crate.

pub mod checklist;
pub mod clause;
pub mod model;
pub mod reveal;
