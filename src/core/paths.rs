//! core::paths
//!
//! Centralized path routing for the rebase state directory.
//!
//! # Storage Layout
//!
//! All resumable state lives under `<git_dir>/rebase-merge/`:
//!
//! - `git-rebase-todo` / `git-rebase-todo.backup` - instruction stream
//! - `done` - consumed instructions
//! - `message`, `message-squash`, `message-fixup` - message arena
//! - `author-script` - author identity to restore at resume
//! - `amend`, `stopped-sha` - pause markers
//! - `rewritten-list`, `rewritten-pending` - old-to-new commit logs
//! - `labels/<name>` - label map
//! - `upstream`, `onto`, `orig-head`, `head-name`, `opts.json` - run setup
//! - `interactive`, `verbose`, `patch`, `dropped` - flag/artifact files
//!
//! No code outside this module computes a state-file path by hand; every
//! location is routed through [`StatePaths`] so the layout is defined in
//! exactly one place.

use std::path::{Path, PathBuf};

/// Directory name of the state directory under the git directory.
pub const STATE_DIR_NAME: &str = "rebase-merge";

/// Centralized path routing for rebase state.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StatePaths {
    git_dir: PathBuf,
}

impl StatePaths {
    /// Create path routing rooted at a repository's git directory.
    ///
    /// # Example
    ///
    /// ```
    /// use resequencer::core::paths::StatePaths;
    /// use std::path::PathBuf;
    ///
    /// let paths = StatePaths::new(PathBuf::from("/repo/.git"));
    /// assert_eq!(
    ///     paths.state_dir(),
    ///     PathBuf::from("/repo/.git/rebase-merge")
    /// );
    /// ```
    pub fn new(git_dir: impl Into<PathBuf>) -> Self {
        Self {
            git_dir: git_dir.into(),
        }
    }

    /// The git directory this routing is rooted at.
    pub fn git_dir(&self) -> &Path {
        &self.git_dir
    }

    /// The state directory. Its presence is the "rebase in progress" lock.
    pub fn state_dir(&self) -> PathBuf {
        self.git_dir.join(STATE_DIR_NAME)
    }

    /// Current instruction stream.
    pub fn todo(&self) -> PathBuf {
        self.state_dir().join("git-rebase-todo")
    }

    /// Snapshot of the initial todo, taken before the first editor run.
    pub fn todo_backup(&self) -> PathBuf {
        self.state_dir().join("git-rebase-todo.backup")
    }

    /// Consumed instructions, verbatim.
    pub fn done(&self) -> PathBuf {
        self.state_dir().join("done")
    }

    /// Next commit message to use after a conflict pause.
    pub fn message(&self) -> PathBuf {
        self.state_dir().join("message")
    }

    /// Accumulating squash message.
    pub fn message_squash(&self) -> PathBuf {
        self.state_dir().join("message-squash")
    }

    /// Original pick message while the current run is pure-fixup.
    pub fn message_fixup(&self) -> PathBuf {
        self.state_dir().join("message-fixup")
    }

    /// Shell-evaluable author assignments.
    pub fn author_script(&self) -> PathBuf {
        self.state_dir().join("author-script")
    }

    /// HEAD at the moment the user was asked to amend.
    pub fn amend(&self) -> PathBuf {
        self.state_dir().join("amend")
    }

    /// Commit being processed when paused.
    pub fn stopped_sha(&self) -> PathBuf {
        self.state_dir().join("stopped-sha")
    }

    /// Finalised `<old-id> <new-id>` pairs.
    pub fn rewritten_list(&self) -> PathBuf {
        self.state_dir().join("rewritten-list")
    }

    /// Old ids awaiting a coalesced partner.
    pub fn rewritten_pending(&self) -> PathBuf {
        self.state_dir().join("rewritten-pending")
    }

    /// Directory holding one file per label.
    pub fn labels_dir(&self) -> PathBuf {
        self.state_dir().join("labels")
    }

    /// The file backing a single label.
    pub fn label(&self, name: &str) -> PathBuf {
        self.labels_dir().join(name)
    }

    /// Upstream of the rebased range.
    pub fn upstream(&self) -> PathBuf {
        self.state_dir().join("upstream")
    }

    /// New base of the rebased range.
    pub fn onto(&self) -> PathBuf {
        self.state_dir().join("onto")
    }

    /// HEAD as it was when the rebase started.
    pub fn orig_head(&self) -> PathBuf {
        self.state_dir().join("orig-head")
    }

    /// Symbolic name of the branch being rebased (or "detached HEAD").
    pub fn head_name(&self) -> PathBuf {
        self.state_dir().join("head-name")
    }

    /// Serialized option block.
    pub fn opts(&self) -> PathBuf {
        self.state_dir().join("opts.json")
    }

    /// Marker: this is an interactive rebase.
    pub fn interactive(&self) -> PathBuf {
        self.state_dir().join("interactive")
    }

    /// Marker: print a diffstat at finalisation.
    pub fn verbose(&self) -> PathBuf {
        self.state_dir().join("verbose")
    }

    /// Patch text of the commit that failed to apply.
    pub fn patch(&self) -> PathBuf {
        self.state_dir().join("patch")
    }

    /// Empty commits the planner commented out.
    pub fn dropped(&self) -> PathBuf {
        self.state_dir().join("dropped")
    }

    /// Scratch squash message handed to `git commit -F`, kept in the git
    /// directory so the usual commit tooling sees it.
    pub fn squash_msg_scratch(&self) -> PathBuf {
        self.git_dir.join("SQUASH_MSG")
    }

    /// The merge-message scratch file other tooling inspects after a failed
    /// squash.
    pub fn merge_msg_scratch(&self) -> PathBuf {
        self.git_dir.join("MERGE_MSG")
    }

    /// Create the state directory and its `labels/` subdirectory.
    ///
    /// # Errors
    ///
    /// Returns an IO error if directory creation fails.
    pub fn ensure_dirs(&self) -> std::io::Result<()> {
        std::fs::create_dir_all(self.state_dir())?;
        std::fs::create_dir_all(self.labels_dir())?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn paths() -> StatePaths {
        StatePaths::new(PathBuf::from("/repo/.git"))
    }

    #[test]
    fn state_dir_under_git_dir() {
        assert_eq!(
            paths().state_dir(),
            PathBuf::from("/repo/.git/rebase-merge")
        );
    }

    #[test]
    fn todo_files() {
        assert_eq!(
            paths().todo(),
            PathBuf::from("/repo/.git/rebase-merge/git-rebase-todo")
        );
        assert_eq!(
            paths().todo_backup(),
            PathBuf::from("/repo/.git/rebase-merge/git-rebase-todo.backup")
        );
        assert_eq!(paths().done(), PathBuf::from("/repo/.git/rebase-merge/done"));
    }

    #[test]
    fn message_arena() {
        assert_eq!(
            paths().message(),
            PathBuf::from("/repo/.git/rebase-merge/message")
        );
        assert_eq!(
            paths().message_squash(),
            PathBuf::from("/repo/.git/rebase-merge/message-squash")
        );
        assert_eq!(
            paths().message_fixup(),
            PathBuf::from("/repo/.git/rebase-merge/message-fixup")
        );
    }

    #[test]
    fn pause_markers() {
        assert_eq!(
            paths().amend(),
            PathBuf::from("/repo/.git/rebase-merge/amend")
        );
        assert_eq!(
            paths().stopped_sha(),
            PathBuf::from("/repo/.git/rebase-merge/stopped-sha")
        );
        assert_eq!(
            paths().author_script(),
            PathBuf::from("/repo/.git/rebase-merge/author-script")
        );
    }

    #[test]
    fn rewritten_logs() {
        assert_eq!(
            paths().rewritten_list(),
            PathBuf::from("/repo/.git/rebase-merge/rewritten-list")
        );
        assert_eq!(
            paths().rewritten_pending(),
            PathBuf::from("/repo/.git/rebase-merge/rewritten-pending")
        );
    }

    #[test]
    fn labels() {
        assert_eq!(
            paths().label("onto"),
            PathBuf::from("/repo/.git/rebase-merge/labels/onto")
        );
    }

    #[test]
    fn scratch_files_in_git_dir() {
        assert_eq!(
            paths().squash_msg_scratch(),
            PathBuf::from("/repo/.git/SQUASH_MSG")
        );
        assert_eq!(
            paths().merge_msg_scratch(),
            PathBuf::from("/repo/.git/MERGE_MSG")
        );
    }

    #[test]
    fn ensure_dirs_creates_labels() {
        let tmp = tempfile::TempDir::new().unwrap();
        let paths = StatePaths::new(tmp.path().join(".git"));
        paths.ensure_dirs().unwrap();
        assert!(paths.state_dir().is_dir());
        assert!(paths.labels_dir().is_dir());
    }
}
