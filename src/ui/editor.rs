//! ui::editor
//!
//! Launch the user's editor on a state file.
//!
//! Selection order:
//! 1. `RSQ_EDITOR` (also the test override)
//! 2. `GIT_SEQUENCE_EDITOR` for todo files / `GIT_EDITOR` otherwise
//! 3. configured `editor`
//! 4. `EDITOR`
//! 5. `vi`

use std::path::Path;
use std::process::Command;

use thiserror::Error;

/// Errors from editor invocation.
#[derive(Debug, Error)]
pub enum EditorError {
    /// The editor could not be spawned.
    #[error("could not launch editor '{editor}': {source}")]
    Launch {
        /// The editor command
        editor: String,
        #[source]
        source: std::io::Error,
    },

    /// The editor exited with a failure status.
    #[error("editor '{editor}' exited with status {status}")]
    Failed {
        /// The editor command
        editor: String,
        /// Its exit status
        status: i32,
    },
}

/// What kind of file is being edited; selects the git variable consulted.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EditKind {
    /// The todo program (`GIT_SEQUENCE_EDITOR`).
    Sequence,
    /// A commit message (`GIT_EDITOR`).
    Message,
}

/// Pick the editor command for the given kind of file.
pub fn select_editor(kind: EditKind, configured: Option<&str>) -> String {
    let git_var = match kind {
        EditKind::Sequence => "GIT_SEQUENCE_EDITOR",
        EditKind::Message => "GIT_EDITOR",
    };
    std::env::var("RSQ_EDITOR")
        .or_else(|_| std::env::var(git_var))
        .ok()
        .or_else(|| configured.map(str::to_string))
        .or_else(|| std::env::var("EDITOR").ok())
        .unwrap_or_else(|| "vi".to_string())
}

/// Open the editor on a file and wait for it to exit.
///
/// The editor string is run through the shell so values like
/// `"code --wait"` work.
///
/// # Errors
///
/// Returns `EditorError` when the editor cannot be spawned or exits
/// non-zero.
pub fn edit_file(path: &Path, kind: EditKind, configured: Option<&str>) -> Result<(), EditorError> {
    let editor = select_editor(kind, configured);
    let status = Command::new("sh")
        .arg("-c")
        .arg(format!("{editor} \"$1\""))
        .arg(&editor)
        .arg(path)
        .status()
        .map_err(|source| EditorError::Launch {
            editor: editor.clone(),
            source,
        })?;
    if status.success() {
        Ok(())
    } else {
        Err(EditorError::Failed {
            editor,
            status: status.code().unwrap_or(-1),
        })
    }
}
