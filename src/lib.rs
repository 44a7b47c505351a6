//! Local synchronization core for a resume editor.
//!
//! Keeps one canonical document in memory, autosaves it after edits settle,
//! stores named versions, renders previews through an external renderer and
//! serves all of it to the UI over a local HTTP bridge.

pub mod api;
pub mod application;
pub mod domain;
pub mod infrastructure;
