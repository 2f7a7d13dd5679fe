//! state
//!
//! The resumable state directory.
//!
//! # Architecture
//!
//! Everything the engine needs to survive a process exit lives in small
//! files under `<git_dir>/rebase-merge/` (see [`crate::core::paths`] for the
//! layout). The presence of the directory is the "rebase in progress" lock:
//! `start` fails if it exists, every other entry point fails if it does not.
//!
//! Durability rules:
//! - the todo file is replaced by write-temp-then-rename, so a kill mid
//!   rewrite never leaves a truncated program;
//! - the done log and the rewritten logs are append-only;
//! - everything else is a whole-file write of a small value.
//!
//! The store does no interpretation beyond parsing: ordering and semantics
//! belong to the executor.

use std::fs;
use std::io::Write as _;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::core::author::{AuthorError, AuthorInfo};
use crate::core::paths::StatePaths;
use crate::core::types::{LabelName, Oid, TypeError};
use crate::todo::TodoList;

/// Errors from state persistence.
#[derive(Debug, Error)]
pub enum StateError {
    /// A rebase is already in progress.
    #[error("a rebase is already in progress ({0})")]
    AlreadyInProgress(PathBuf),

    /// No rebase is in progress.
    #[error("no rebase in progress")]
    NotInProgress,

    /// A label was recorded twice.
    #[error("label already defined: {0}")]
    LabelExists(String),

    /// A state file holds something unexpected.
    #[error("corrupt state file {path}: {detail}")]
    Corrupt {
        /// The offending file
        path: PathBuf,
        /// What was wrong with it
        detail: String,
    },

    /// Filesystem failure.
    #[error("state io error on {path}: {source}")]
    Io {
        /// The file being accessed
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

impl StateError {
    fn io(path: impl Into<PathBuf>) -> impl FnOnce(std::io::Error) -> Self {
        let path = path.into();
        move |source| Self::Io { path, source }
    }

    fn corrupt(path: impl Into<PathBuf>, detail: impl ToString) -> Self {
        Self::Corrupt {
            path: path.into(),
            detail: detail.to_string(),
        }
    }
}

/// The persisted option block for one rebase run.
///
/// Written to `opts.json` at `start` and read back at every resume, so the
/// flags in force cannot drift between invocations.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct RebaseOptions {
    /// Rearrange `squash!`/`fixup!` commits into their targets.
    pub autosquash: bool,
    /// Keep commits whose tree equals their parent's tree.
    pub keep_empty: bool,
    /// Generate a label/goto/merge program instead of a flat pick list.
    pub preserve_merges: bool,
    /// Replay every pick even when fast-forwarding would do.
    pub force_rebase: bool,
    /// Print a diffstat at finalisation.
    pub verbose: bool,
    /// Command to insert after every pick.
    pub exec_cmd: Option<String>,
}

/// Handle to the state directory of one rebase.
#[derive(Debug)]
pub struct StateStore {
    paths: StatePaths,
}

impl StateStore {
    /// Create the state directory. This is the `start` lock acquisition.
    ///
    /// # Errors
    ///
    /// [`StateError::AlreadyInProgress`] when the directory exists.
    pub fn create(git_dir: &Path) -> Result<Self, StateError> {
        let paths = StatePaths::new(git_dir);
        if paths.state_dir().exists() {
            return Err(StateError::AlreadyInProgress(paths.state_dir()));
        }
        paths
            .ensure_dirs()
            .map_err(StateError::io(paths.state_dir()))?;
        Ok(Self { paths })
    }

    /// Open an existing state directory.
    ///
    /// # Errors
    ///
    /// [`StateError::NotInProgress`] when there is none.
    pub fn open(git_dir: &Path) -> Result<Self, StateError> {
        let paths = StatePaths::new(git_dir);
        if !paths.state_dir().is_dir() {
            return Err(StateError::NotInProgress);
        }
        Ok(Self { paths })
    }

    /// Whether a rebase is in progress for this git directory.
    pub fn in_progress(git_dir: &Path) -> bool {
        StatePaths::new(git_dir).state_dir().is_dir()
    }

    /// The path routing for this store.
    pub fn paths(&self) -> &StatePaths {
        &self.paths
    }

    /// Remove the whole state directory (finalisation or `abort`).
    pub fn remove(&self) -> Result<(), StateError> {
        fs::remove_dir_all(self.paths.state_dir())
            .map_err(StateError::io(self.paths.state_dir()))
    }

    /// Expose the next-commit message as the merge-message scratch file
    /// (failed squash path).
    pub fn export_message_as_merge_msg(&self) -> Result<(), StateError> {
        fs::copy(self.paths.message(), self.paths.merge_msg_scratch())
            .map(|_| ())
            .map_err(StateError::io(self.paths.merge_msg_scratch()))
    }

    /// Copy the squash message to the `SQUASH_MSG` scratch file and drop any
    /// stale `MERGE_MSG`, for the editor-backed final commit of a run.
    pub fn export_squash_message_scratch(&self) -> Result<(), StateError> {
        fs::copy(self.paths.message_squash(), self.paths.squash_msg_scratch())
            .map(|_| ())
            .map_err(StateError::io(self.paths.squash_msg_scratch()))?;
        self.clear_file(&self.paths.merge_msg_scratch())
    }

    // =========================================================================
    // Small-file helpers
    // =========================================================================

    fn write_file(&self, path: &Path, contents: &str) -> Result<(), StateError> {
        fs::write(path, contents).map_err(StateError::io(path))
    }

    fn read_opt(&self, path: &Path) -> Result<Option<String>, StateError> {
        match fs::read_to_string(path) {
            Ok(text) => Ok(Some(text)),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(None),
            Err(e) => Err(StateError::Io {
                path: path.to_path_buf(),
                source: e,
            }),
        }
    }

    fn clear_file(&self, path: &Path) -> Result<(), StateError> {
        match fs::remove_file(path) {
            Ok(()) => Ok(()),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(()),
            Err(e) => Err(StateError::Io {
                path: path.to_path_buf(),
                source: e,
            }),
        }
    }

    fn append_line(&self, path: &Path, line: &str) -> Result<(), StateError> {
        let mut file = fs::OpenOptions::new()
            .create(true)
            .append(true)
            .open(path)
            .map_err(StateError::io(path))?;
        writeln!(file, "{line}").map_err(StateError::io(path))
    }

    fn read_oid_opt(&self, path: &Path) -> Result<Option<Oid>, StateError> {
        match self.read_opt(path)? {
            None => Ok(None),
            Some(text) => Oid::new(text.trim())
                .map(Some)
                .map_err(|e: TypeError| StateError::corrupt(path, e)),
        }
    }

    // =========================================================================
    // Todo and done
    // =========================================================================

    /// Read the current instruction stream.
    pub fn read_todo(&self) -> Result<TodoList, StateError> {
        let text = self
            .read_opt(&self.paths.todo())?
            .ok_or_else(|| StateError::corrupt(self.paths.todo(), "missing todo file"))?;
        Ok(TodoList::parse(&text))
    }

    /// Replace the instruction stream atomically (temp file + rename).
    pub fn write_todo(&self, todo: &TodoList) -> Result<(), StateError> {
        let path = self.paths.todo();
        let tmp = path.with_extension("new");
        fs::write(&tmp, todo.to_text()).map_err(StateError::io(&tmp))?;
        fs::rename(&tmp, &path).map_err(StateError::io(&path))
    }

    /// Snapshot the todo before the first editor invocation.
    pub fn backup_todo(&self) -> Result<(), StateError> {
        fs::copy(self.paths.todo(), self.paths.todo_backup())
            .map(|_| ())
            .map_err(StateError::io(self.paths.todo_backup()))
    }

    /// Append one consumed line to the done log, verbatim.
    pub fn append_done_line(&self, raw: &str) -> Result<(), StateError> {
        self.append_line(&self.paths.done(), raw)
    }

    /// Read the done log as a program (for progress and lookbehind).
    pub fn read_done(&self) -> Result<TodoList, StateError> {
        let text = self.read_opt(&self.paths.done())?.unwrap_or_default();
        Ok(TodoList::parse(&text))
    }

    // =========================================================================
    // Message arena
    // =========================================================================

    /// The commit message for the next commit action.
    pub fn read_message(&self) -> Result<Option<String>, StateError> {
        self.read_opt(&self.paths.message())
    }

    pub fn write_message(&self, message: &str) -> Result<(), StateError> {
        self.write_file(&self.paths.message(), message)
    }

    pub fn clear_message(&self) -> Result<(), StateError> {
        self.clear_file(&self.paths.message())
    }

    /// The accumulating combined message of the current squash run.
    pub fn read_squash_message(&self) -> Result<Option<String>, StateError> {
        self.read_opt(&self.paths.message_squash())
    }

    pub fn write_squash_message(&self, message: &str) -> Result<(), StateError> {
        self.write_file(&self.paths.message_squash(), message)
    }

    pub fn clear_squash_message(&self) -> Result<(), StateError> {
        self.clear_file(&self.paths.message_squash())
    }

    /// The original pick's message while the run is pure-fixup.
    pub fn read_fixup_message(&self) -> Result<Option<String>, StateError> {
        self.read_opt(&self.paths.message_fixup())
    }

    pub fn write_fixup_message(&self, message: &str) -> Result<(), StateError> {
        self.write_file(&self.paths.message_fixup(), message)
    }

    pub fn clear_fixup_message(&self) -> Result<(), StateError> {
        self.clear_file(&self.paths.message_fixup())
    }

    /// Demote the squash message to the plain next-commit message (failed
    /// squash path).
    pub fn move_squash_message_to_message(&self) -> Result<(), StateError> {
        fs::rename(self.paths.message_squash(), self.paths.message())
            .map_err(StateError::io(self.paths.message()))
    }

    // =========================================================================
    // Author script
    // =========================================================================

    pub fn write_author(&self, author: &AuthorInfo) -> Result<(), StateError> {
        self.write_file(&self.paths.author_script(), &author.to_script())
    }

    pub fn read_author(&self) -> Result<Option<AuthorInfo>, StateError> {
        match self.read_opt(&self.paths.author_script())? {
            None => Ok(None),
            Some(text) => AuthorInfo::from_script(&text)
                .map(Some)
                .map_err(|e: AuthorError| StateError::corrupt(self.paths.author_script(), e)),
        }
    }

    pub fn clear_author(&self) -> Result<(), StateError> {
        self.clear_file(&self.paths.author_script())
    }

    // =========================================================================
    // Pause markers
    // =========================================================================

    /// HEAD at the moment the user was asked to amend.
    pub fn write_amend(&self, head: &Oid) -> Result<(), StateError> {
        self.write_file(&self.paths.amend(), head.as_str())
    }

    pub fn read_amend(&self) -> Result<Option<Oid>, StateError> {
        self.read_oid_opt(&self.paths.amend())
    }

    pub fn clear_amend(&self) -> Result<(), StateError> {
        self.clear_file(&self.paths.amend())
    }

    /// The commit being processed when the engine paused.
    pub fn write_stopped_sha(&self, oid: &Oid) -> Result<(), StateError> {
        self.write_file(&self.paths.stopped_sha(), oid.as_str())
    }

    pub fn read_stopped_sha(&self) -> Result<Option<Oid>, StateError> {
        self.read_oid_opt(&self.paths.stopped_sha())
    }

    pub fn clear_stopped_sha(&self) -> Result<(), StateError> {
        self.clear_file(&self.paths.stopped_sha())
    }

    // =========================================================================
    // Run setup
    // =========================================================================

    pub fn write_upstream(&self, oid: &Oid) -> Result<(), StateError> {
        self.write_file(&self.paths.upstream(), oid.as_str())
    }

    pub fn read_upstream(&self) -> Result<Option<Oid>, StateError> {
        self.read_oid_opt(&self.paths.upstream())
    }

    pub fn write_onto(&self, oid: &Oid) -> Result<(), StateError> {
        self.write_file(&self.paths.onto(), oid.as_str())
    }

    pub fn read_onto(&self) -> Result<Option<Oid>, StateError> {
        self.read_oid_opt(&self.paths.onto())
    }

    pub fn write_orig_head(&self, oid: &Oid) -> Result<(), StateError> {
        self.write_file(&self.paths.orig_head(), oid.as_str())
    }

    pub fn read_orig_head(&self) -> Result<Option<Oid>, StateError> {
        self.read_oid_opt(&self.paths.orig_head())
    }

    /// The symbolic name being rebased, or "detached HEAD".
    pub fn write_head_name(&self, name: &str) -> Result<(), StateError> {
        self.write_file(&self.paths.head_name(), name)
    }

    pub fn read_head_name(&self) -> Result<Option<String>, StateError> {
        Ok(self
            .read_opt(&self.paths.head_name())?
            .map(|s| s.trim().to_string()))
    }

    /// Persist the option block.
    pub fn write_options(&self, opts: &RebaseOptions) -> Result<(), StateError> {
        let json = serde_json::to_string_pretty(opts)
            .map_err(|e| StateError::corrupt(self.paths.opts(), e))?;
        self.write_file(&self.paths.opts(), &json)
    }

    /// Read the option block back; defaults when absent (state written by
    /// an older run).
    pub fn read_options(&self) -> Result<RebaseOptions, StateError> {
        match self.read_opt(&self.paths.opts())? {
            None => Ok(RebaseOptions::default()),
            Some(json) => serde_json::from_str(&json)
                .map_err(|e| StateError::corrupt(self.paths.opts(), e)),
        }
    }

    /// Flag this as an interactive rebase.
    pub fn mark_interactive(&self) -> Result<(), StateError> {
        self.write_file(&self.paths.interactive(), "")
    }

    /// Record or clear the verbose flag artifact.
    pub fn set_verbose(&self, verbose: bool) -> Result<(), StateError> {
        if verbose {
            self.write_file(&self.paths.verbose(), "")
        } else {
            self.clear_file(&self.paths.verbose())
        }
    }

    pub fn is_verbose(&self) -> bool {
        self.paths.verbose().exists()
    }

    // =========================================================================
    // Rewritten bookkeeping
    // =========================================================================

    /// Append an old id awaiting its final mapping.
    pub fn append_rewritten_pending(&self, old: &Oid) -> Result<(), StateError> {
        self.append_line(&self.paths.rewritten_pending(), old.as_str())
    }

    /// All pending old ids, oldest first.
    pub fn read_rewritten_pending(&self) -> Result<Vec<Oid>, StateError> {
        let path = self.paths.rewritten_pending();
        let Some(text) = self.read_opt(&path)? else {
            return Ok(Vec::new());
        };
        text.lines()
            .filter(|l| !l.trim().is_empty())
            .map(|l| Oid::new(l.trim()).map_err(|e| StateError::corrupt(&path, e)))
            .collect()
    }

    pub fn clear_rewritten_pending(&self) -> Result<(), StateError> {
        self.clear_file(&self.paths.rewritten_pending())
    }

    /// Append one finalised `<old> <new>` pair.
    pub fn append_rewritten_pair(&self, old: &Oid, new: &Oid) -> Result<(), StateError> {
        self.append_line(&self.paths.rewritten_list(), &format!("{old} {new}"))
    }

    /// The finalised list, raw, for the post-rewrite hook and notes copy.
    pub fn read_rewritten_list_raw(&self) -> Result<String, StateError> {
        Ok(self
            .read_opt(&self.paths.rewritten_list())?
            .unwrap_or_default())
    }

    /// The finalised list as pairs.
    pub fn read_rewritten_list(&self) -> Result<Vec<(Oid, Oid)>, StateError> {
        let path = self.paths.rewritten_list();
        let mut out = Vec::new();
        for line in self.read_rewritten_list_raw()?.lines() {
            let line = line.trim();
            if line.is_empty() {
                continue;
            }
            let (old, new) = line
                .split_once(' ')
                .ok_or_else(|| StateError::corrupt(&path, format!("bad pair: {line}")))?;
            out.push((
                Oid::new(old).map_err(|e| StateError::corrupt(&path, e))?,
                Oid::new(new).map_err(|e| StateError::corrupt(&path, e))?,
            ));
        }
        Ok(out)
    }

    // =========================================================================
    // Labels
    // =========================================================================

    /// Record a label. Labels are write-once.
    ///
    /// # Errors
    ///
    /// [`StateError::LabelExists`] on a duplicate `label` instruction.
    pub fn write_label(&self, name: &LabelName, oid: &Oid) -> Result<(), StateError> {
        let path = self.paths.label(name.as_str());
        if path.exists() {
            return Err(StateError::LabelExists(name.to_string()));
        }
        self.write_file(&path, oid.as_str())
    }

    /// Look up a label.
    pub fn read_label(&self, name: &LabelName) -> Result<Option<Oid>, StateError> {
        self.read_oid_opt(&self.paths.label(name.as_str()))
    }

    // =========================================================================
    // Artifacts
    // =========================================================================

    /// The patch text of the commit that failed to apply.
    pub fn write_patch(&self, text: &str) -> Result<(), StateError> {
        self.write_file(&self.paths.patch(), text)
    }

    /// Record an empty commit the planner commented out.
    pub fn append_dropped(&self, oid: &Oid) -> Result<(), StateError> {
        self.append_line(&self.paths.dropped(), oid.as_str())
    }
}
