//! ui
//!
//! User interaction utilities: output formatting and editor invocation.

pub mod editor;
pub mod output;

pub use editor::{edit_file, EditKind, EditorError};
pub use output::Verbosity;
