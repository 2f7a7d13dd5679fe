//! git::interface
//!
//! Git interface implementation using git2 plus git subprocesses.
//!
//! This module is the **single doorway** to the repository. Object and ref
//! reads (the oracle side) go through `git2`; working-tree mutations
//! (cherry-pick, commit, checkout, merge) shell out to the `git` binary so
//! that hooks, rerere, and conflict markers behave exactly as users expect.
//! No other module imports `git2` or spawns `git` directly.
//!
//! # Error Handling
//!
//! Git errors are categorized into typed variants:
//! - [`GitError::NotARepo`]: not inside a Git repository
//! - [`GitError::RefNotFound`] / [`GitError::ObjectNotFound`]: resolution
//!   failures
//! - [`GitError::MissingIdentity`]: no committer identity configured
//! - [`GitError::CommandFailed`]: a git subprocess exited non-zero

use std::collections::HashSet;
use std::io::Write as _;
use std::path::{Path, PathBuf};
use std::process::{Command, Stdio};

use sha2::{Digest as _, Sha256};
use thiserror::Error;

use crate::core::author::AuthorInfo;
use crate::core::types::{CommitRef, Oid, RefName, TypeError};

/// Errors from Git operations.
#[derive(Debug, Error)]
pub enum GitError {
    /// Not inside a Git repository.
    #[error("not a git repository: {path}")]
    NotARepo {
        /// The path that was searched
        path: PathBuf,
    },

    /// Repository is bare (no working directory).
    #[error("bare repository not supported")]
    BareRepo,

    /// Requested ref does not exist.
    #[error("ref not found: {refname}")]
    RefNotFound {
        /// The ref that was not found
        refname: String,
    },

    /// Object not found in repository.
    #[error("object not found: {oid}")]
    ObjectNotFound {
        /// The id that was not found
        oid: String,
    },

    /// Invalid object id format.
    #[error("invalid object id: {oid}")]
    InvalidOid {
        /// The invalid id string
        oid: String,
    },

    /// Committer identity (user.name / user.email) is not configured.
    #[error("committer identity unknown; set user.name and user.email")]
    MissingIdentity,

    /// A git subprocess exited with a failure status.
    #[error("`{command}` failed with status {status}")]
    CommandFailed {
        /// The command line that failed
        command: String,
        /// Its exit status (-1 when killed by a signal)
        status: i32,
    },

    /// Internal git2 error.
    #[error("git error: {message}")]
    Internal {
        /// The error message
        message: String,
    },
}

impl GitError {
    /// Create a GitError from a git2::Error with richer context.
    fn from_git2(err: git2::Error, context: &str) -> Self {
        match err.code() {
            git2::ErrorCode::NotFound => {
                if context.starts_with("refs/") || context == "HEAD" {
                    GitError::RefNotFound {
                        refname: context.to_string(),
                    }
                } else {
                    GitError::ObjectNotFound {
                        oid: context.to_string(),
                    }
                }
            }
            git2::ErrorCode::InvalidSpec | git2::ErrorCode::Ambiguous => GitError::InvalidOid {
                oid: context.to_string(),
            },
            _ => GitError::Internal {
                message: format!("{}: {}", context, err.message()),
            },
        }
    }
}

impl From<git2::Error> for GitError {
    fn from(err: git2::Error) -> Self {
        GitError::Internal {
            message: err.message().to_string(),
        }
    }
}

impl From<TypeError> for GitError {
    fn from(err: TypeError) -> Self {
        match err {
            TypeError::InvalidOid(msg) | TypeError::InvalidCommitRef(msg) => {
                GitError::InvalidOid { oid: msg }
            }
            TypeError::InvalidRefName(msg) | TypeError::InvalidLabelName(msg) => {
                GitError::Internal { message: msg }
            }
        }
    }
}

/// Summary of working tree status.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct WorktreeStatus {
    /// Number of staged changes
    pub staged: usize,
    /// Number of unstaged changes to tracked files
    pub unstaged: usize,
    /// Whether there are unresolved conflicts
    pub has_conflicts: bool,
}

impl WorktreeStatus {
    /// Check if the worktree is clean (ignoring untracked files).
    pub fn is_clean(&self) -> bool {
        self.staged == 0 && self.unstaged == 0 && !self.has_conflicts
    }

    /// Check if there are staged changes ready to commit.
    pub fn has_staged(&self) -> bool {
        self.staged > 0
    }
}

/// Information about a commit.
#[derive(Debug, Clone)]
pub struct CommitInfo {
    /// The commit id
    pub oid: Oid,
    /// First line of the commit message
    pub summary: String,
    /// Full commit message (headers stripped)
    pub message: String,
    /// Author identity
    pub author: AuthorInfo,
}

/// Options for a cherry-pick.
#[derive(Debug, Clone, Copy, Default)]
pub struct CherryPickOpts {
    /// Apply to the index and worktree without committing.
    pub no_commit: bool,
    /// Keep commits that become empty.
    pub allow_empty: bool,
    /// Fast-forward instead of replaying when HEAD is the commit's parent.
    pub ff: bool,
}

/// Options for creating or amending a commit.
#[derive(Debug, Clone, Copy, Default)]
pub struct CommitOpts<'a> {
    /// Replace the current HEAD commit.
    pub amend: bool,
    /// Bypass pre-commit and commit-msg hooks.
    pub no_verify: bool,
    /// Open the editor on the message.
    pub edit: bool,
    /// Take the message from this file.
    pub message_file: Option<&'a Path>,
    /// Commit with this author instead of the configured one.
    pub author: Option<&'a AuthorInfo>,
}

/// The Git interface.
///
/// Reads are answered by `git2`; mutations run `git` in the working tree.
/// See the module docs for the split.
pub struct Git {
    /// The underlying git2 repository
    repo: git2::Repository,
}

impl std::fmt::Debug for Git {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Git")
            .field("path", &self.repo.path())
            .finish()
    }
}

impl Git {
    // =========================================================================
    // Repository opening and info
    // =========================================================================

    /// Open a repository at the given path.
    ///
    /// Uses `git2::Repository::discover`, so `path` can be any directory
    /// within the repository.
    ///
    /// # Errors
    ///
    /// - [`GitError::NotARepo`] if no repository is found
    /// - [`GitError::BareRepo`] if the repository has no working directory
    pub fn open(path: &Path) -> Result<Self, GitError> {
        let repo = git2::Repository::discover(path).map_err(|_| GitError::NotARepo {
            path: path.to_path_buf(),
        })?;
        if repo.is_bare() {
            return Err(GitError::BareRepo);
        }
        Ok(Self { repo })
    }

    /// The `.git` directory path.
    pub fn git_dir(&self) -> &Path {
        self.repo.path()
    }

    /// The working directory path.
    pub fn work_dir(&self) -> Result<&Path, GitError> {
        self.repo.workdir().ok_or(GitError::BareRepo)
    }

    /// Require a configured committer identity.
    ///
    /// # Errors
    ///
    /// [`GitError::MissingIdentity`] when `user.name`/`user.email` are not
    /// available.
    pub fn require_identity(&self) -> Result<(), GitError> {
        self.repo
            .signature()
            .map(|_| ())
            .map_err(|_| GitError::MissingIdentity)
    }

    // =========================================================================
    // Oracle: resolution
    // =========================================================================

    /// Resolve an arbitrary revision spec (ref name, full or abbreviated id)
    /// to a commit id.
    ///
    /// # Errors
    ///
    /// [`GitError::ObjectNotFound`] / [`GitError::InvalidOid`] when the spec
    /// does not name a commit.
    pub fn resolve(&self, spec: &str) -> Result<Oid, GitError> {
        let object = self
            .repo
            .revparse_single(spec)
            .map_err(|e| GitError::from_git2(e, spec))?;
        let commit = object
            .peel_to_commit()
            .map_err(|e| GitError::from_git2(e, spec))?;
        Ok(Oid::new(commit.id().to_string())?)
    }

    /// Resolve a spec, returning `None` instead of a not-found error.
    pub fn try_resolve(&self, spec: &str) -> Option<Oid> {
        self.resolve(spec).ok()
    }

    /// Resolve a todo commit reference.
    pub fn resolve_commit_ref(&self, commit: &CommitRef) -> Result<Oid, GitError> {
        self.resolve(commit.as_str())
    }

    /// HEAD's commit id.
    pub fn head_oid(&self) -> Result<Oid, GitError> {
        let head = self
            .repo
            .head()
            .map_err(|e| GitError::from_git2(e, "HEAD"))?;
        let oid = head
            .peel_to_commit()
            .map_err(|e| GitError::from_git2(e, "HEAD"))?
            .id();
        Ok(Oid::new(oid.to_string())?)
    }

    /// The branch HEAD points at, or `None` when detached.
    pub fn head_ref_name(&self) -> Result<Option<RefName>, GitError> {
        let head = self
            .repo
            .find_reference("HEAD")
            .map_err(|e| GitError::from_git2(e, "HEAD"))?;
        match head.symbolic_target() {
            Some(target) => Ok(Some(RefName::new(target)?)),
            None => Ok(None),
        }
    }

    // =========================================================================
    // Oracle: commit inspection
    // =========================================================================

    fn find_commit(&self, oid: &Oid) -> Result<git2::Commit<'_>, GitError> {
        let raw = git2::Oid::from_str(oid.as_str()).map_err(|_| GitError::InvalidOid {
            oid: oid.to_string(),
        })?;
        self.repo
            .find_commit(raw)
            .map_err(|e| GitError::from_git2(e, oid.as_str()))
    }

    /// Full information about a commit.
    pub fn commit_info(&self, oid: &Oid) -> Result<CommitInfo, GitError> {
        let commit = self.find_commit(oid)?;
        let author = commit.author();
        Ok(CommitInfo {
            oid: oid.clone(),
            summary: commit.summary().unwrap_or("").to_string(),
            message: commit.message().unwrap_or("").to_string(),
            author: AuthorInfo::from_signature(
                String::from_utf8_lossy(author.name_bytes()),
                String::from_utf8_lossy(author.email_bytes()),
                author.when().seconds(),
                author.when().offset_minutes(),
            ),
        })
    }

    /// A commit's message with headers stripped.
    pub fn commit_message(&self, oid: &Oid) -> Result<String, GitError> {
        Ok(self.find_commit(oid)?.message().unwrap_or("").to_string())
    }

    /// A commit's parent ids, in order.
    pub fn commit_parents(&self, oid: &Oid) -> Result<Vec<Oid>, GitError> {
        let commit = self.find_commit(oid)?;
        commit
            .parent_ids()
            .map(|p| Oid::new(p.to_string()).map_err(GitError::from))
            .collect()
    }

    /// A commit's first parent, or `None` for a root commit.
    pub fn first_parent(&self, oid: &Oid) -> Result<Option<Oid>, GitError> {
        Ok(self.commit_parents(oid)?.into_iter().next())
    }

    /// Whether the commit's tree equals its first parent's tree.
    ///
    /// Root commits are never considered empty.
    pub fn is_empty_commit(&self, oid: &Oid) -> Result<bool, GitError> {
        let commit = self.find_commit(oid)?;
        match commit.parent(0) {
            Ok(parent) => Ok(commit.tree_id() == parent.tree_id()),
            Err(_) => Ok(false),
        }
    }

    /// The abbreviated, unambiguous form of a commit id.
    pub fn short_id(&self, oid: &Oid) -> Result<String, GitError> {
        let commit = self.find_commit(oid)?;
        let buf = commit
            .as_object()
            .short_id()
            .map_err(|e| GitError::from_git2(e, oid.as_str()))?;
        Ok(String::from_utf8_lossy(&buf).into_owned())
    }

    /// Whether `ancestor` is an ancestor of `descendant`.
    pub fn is_ancestor(&self, ancestor: &Oid, descendant: &Oid) -> Result<bool, GitError> {
        if ancestor == descendant {
            return Ok(true);
        }
        let a = git2::Oid::from_str(ancestor.as_str()).map_err(|_| GitError::InvalidOid {
            oid: ancestor.to_string(),
        })?;
        let d = git2::Oid::from_str(descendant.as_str()).map_err(|_| GitError::InvalidOid {
            oid: descendant.to_string(),
        })?;
        Ok(self.repo.graph_descendant_of(d, a)?)
    }

    // =========================================================================
    // Oracle: range enumeration
    // =========================================================================

    /// Commits reachable from `head` but not `upstream`, oldest first.
    ///
    /// Merges are excluded unless `include_merges`.
    pub fn rev_list(
        &self,
        upstream: &Oid,
        head: &Oid,
        include_merges: bool,
    ) -> Result<Vec<Oid>, GitError> {
        let mut walk = self.repo.revwalk()?;
        walk.set_sorting(git2::Sort::TOPOLOGICAL | git2::Sort::REVERSE)?;
        walk.push(git2::Oid::from_str(head.as_str()).map_err(|_| GitError::InvalidOid {
            oid: head.to_string(),
        })?)?;
        walk.hide(
            git2::Oid::from_str(upstream.as_str()).map_err(|_| GitError::InvalidOid {
                oid: upstream.to_string(),
            })?,
        )?;

        let mut out = Vec::new();
        for oid in walk {
            let oid = oid?;
            let commit = self.repo.find_commit(oid)?;
            if !include_merges && commit.parent_count() > 1 {
                continue;
            }
            out.push(Oid::new(oid.to_string())?);
        }
        Ok(out)
    }

    /// Commits to replay for `upstream..head`: merges excluded, and commits
    /// whose patch is already present on the upstream side dropped
    /// (cherry-pick equivalence), oldest first.
    pub fn commits_for_rebase(&self, upstream: &Oid, head: &Oid) -> Result<Vec<Oid>, GitError> {
        // Patch-ids of the upstream side of the symmetric difference.
        let mut upstream_patches = HashSet::new();
        let mut walk = self.repo.revwalk()?;
        walk.push(
            git2::Oid::from_str(upstream.as_str()).map_err(|_| GitError::InvalidOid {
                oid: upstream.to_string(),
            })?,
        )?;
        walk.hide(git2::Oid::from_str(head.as_str()).map_err(|_| GitError::InvalidOid {
            oid: head.to_string(),
        })?)?;
        for oid in walk {
            let commit = self.repo.find_commit(oid?)?;
            if commit.parent_count() <= 1 {
                if let Some(id) = self.patch_id_of(&commit)? {
                    upstream_patches.insert(id);
                }
            }
        }

        let mut out = Vec::new();
        for oid in self.rev_list(upstream, head, false)? {
            let commit = self.find_commit(&oid)?;
            if let Some(id) = self.patch_id_of(&commit)? {
                if upstream_patches.contains(&id) {
                    continue;
                }
            }
            out.push(oid);
        }
        Ok(out)
    }

    /// A stable hash of a commit's diff against its first parent.
    ///
    /// `None` for commits with an empty diff (hunk positions are ignored so
    /// equal patches at different offsets compare equal, like `git
    /// patch-id`).
    pub fn patch_id(&self, oid: &Oid) -> Result<Option<String>, GitError> {
        let commit = self.find_commit(oid)?;
        self.patch_id_of(&commit)
    }

    fn patch_id_of(&self, commit: &git2::Commit<'_>) -> Result<Option<String>, GitError> {
        use std::cell::{Cell, RefCell};

        let diff = self.diff_to_first_parent(commit)?;
        let hasher = RefCell::new(Sha256::new());
        let saw_change = Cell::new(false);
        diff.foreach(
            &mut |delta, _| {
                let mut hasher = hasher.borrow_mut();
                if let Some(path) = delta.old_file().path() {
                    hasher.update(path.to_string_lossy().as_bytes());
                }
                hasher.update(b"\0");
                if let Some(path) = delta.new_file().path() {
                    hasher.update(path.to_string_lossy().as_bytes());
                }
                hasher.update(b"\0");
                true
            },
            None,
            None,
            Some(&mut |_, _, line| {
                if matches!(line.origin(), '+' | '-') {
                    saw_change.set(true);
                    let mut hasher = hasher.borrow_mut();
                    hasher.update([line.origin() as u8]);
                    hasher.update(line.content());
                }
                true
            }),
        )?;
        if saw_change.get() {
            Ok(Some(hex::encode(hasher.into_inner().finalize())))
        } else {
            Ok(None)
        }
    }

    /// The patch text of a commit against its first parent, for the `patch`
    /// artifact written at a conflict pause.
    pub fn patch_text(&self, oid: &Oid) -> Result<String, GitError> {
        let commit = self.find_commit(oid)?;
        if commit.parent_count() == 0 {
            return Ok("Root commit\n".to_string());
        }
        let diff = self.diff_to_first_parent(&commit)?;
        let mut text = String::new();
        diff.print(git2::DiffFormat::Patch, |_, _, line| {
            match line.origin() {
                '+' | '-' | ' ' => text.push(line.origin()),
                _ => {}
            }
            text.push_str(&String::from_utf8_lossy(line.content()));
            true
        })?;
        Ok(text)
    }

    fn diff_to_first_parent(&self, commit: &git2::Commit<'_>) -> Result<git2::Diff<'_>, GitError> {
        let tree = commit.tree()?;
        let parent_tree = match commit.parent(0) {
            Ok(parent) => Some(parent.tree()?),
            Err(_) => None,
        };
        Ok(self
            .repo
            .diff_tree_to_tree(parent_tree.as_ref(), Some(&tree), None)?)
    }

    // =========================================================================
    // Ref mutation
    // =========================================================================

    /// Point `refname` at `oid`, creating or moving it, with a reflog
    /// message.
    pub fn update_ref(&self, refname: &str, oid: &Oid, log_message: &str) -> Result<(), GitError> {
        let raw = git2::Oid::from_str(oid.as_str()).map_err(|_| GitError::InvalidOid {
            oid: oid.to_string(),
        })?;
        self.repo
            .reference(refname, raw, true, log_message)
            .map_err(|e| GitError::from_git2(e, refname))?;
        Ok(())
    }

    /// Re-attach HEAD to a branch ref (without touching the worktree).
    pub fn set_head(&self, refname: &RefName) -> Result<(), GitError> {
        self.repo
            .set_head(refname.as_str())
            .map_err(|e| GitError::from_git2(e, refname.as_str()))
    }

    // =========================================================================
    // Working tree status
    // =========================================================================

    /// Working tree status summary (untracked files ignored).
    pub fn worktree_status(&self) -> Result<WorktreeStatus, GitError> {
        let mut opts = git2::StatusOptions::new();
        opts.include_untracked(false).include_ignored(false);

        let statuses = self.repo.statuses(Some(&mut opts))?;
        let mut result = WorktreeStatus::default();
        for entry in statuses.iter() {
            let status = entry.status();
            if status.is_conflicted() {
                result.has_conflicts = true;
            }
            if status.is_index_new()
                || status.is_index_modified()
                || status.is_index_deleted()
                || status.is_index_renamed()
                || status.is_index_typechange()
            {
                result.staged += 1;
            }
            if status.is_wt_modified()
                || status.is_wt_deleted()
                || status.is_wt_renamed()
                || status.is_wt_typechange()
            {
                result.unstaged += 1;
            }
        }
        Ok(result)
    }

    /// Check if the working tree is clean (untracked files ignored).
    pub fn is_worktree_clean(&self) -> Result<bool, GitError> {
        Ok(self.worktree_status()?.is_clean())
    }

    // =========================================================================
    // Worktree mutation (subprocess)
    // =========================================================================

    fn git_command(&self) -> Result<Command, GitError> {
        let mut cmd = Command::new("git");
        cmd.current_dir(self.work_dir()?);
        Ok(cmd)
    }

    fn run(&self, args: &[&str]) -> Result<(), GitError> {
        let mut cmd = self.git_command()?;
        cmd.args(args);
        let status = cmd.status().map_err(|e| GitError::Internal {
            message: format!("failed to run git: {e}"),
        })?;
        if status.success() {
            Ok(())
        } else {
            Err(GitError::CommandFailed {
                command: format!("git {}", args.join(" ")),
                status: status.code().unwrap_or(-1),
            })
        }
    }

    /// Replay a commit on top of HEAD.
    ///
    /// # Errors
    ///
    /// [`GitError::CommandFailed`] on conflict or any other cherry-pick
    /// failure; the caller decides whether that is a pause.
    pub fn cherry_pick(&self, oid: &Oid, opts: CherryPickOpts) -> Result<(), GitError> {
        let mut args = vec!["cherry-pick"];
        if opts.no_commit {
            args.push("-n");
        }
        if opts.ff {
            args.push("--ff");
        }
        if opts.allow_empty {
            args.push("--allow-empty");
        }
        args.push(oid.as_str());
        self.run(&args)
    }

    /// Create or amend a commit.
    pub fn commit(&self, opts: CommitOpts<'_>) -> Result<(), GitError> {
        let mut cmd = self.git_command()?;
        cmd.arg("commit");
        if opts.amend {
            cmd.arg("--amend");
        }
        if opts.no_verify {
            cmd.arg("--no-verify");
        }
        if let Some(file) = opts.message_file {
            cmd.arg("-F").arg(file);
        }
        if opts.edit {
            cmd.arg("-e");
        } else if opts.amend && opts.message_file.is_none() {
            cmd.arg("--no-edit");
        }
        if let Some(author) = opts.author {
            for (key, value) in author.env() {
                cmd.env(key, value);
            }
        }
        let status = cmd.status().map_err(|e| GitError::Internal {
            message: format!("failed to run git: {e}"),
        })?;
        if status.success() {
            Ok(())
        } else {
            Err(GitError::CommandFailed {
                command: "git commit".to_string(),
                status: status.code().unwrap_or(-1),
            })
        }
    }

    /// Check out a commit, detaching HEAD.
    pub fn checkout_detached(&self, oid: &Oid) -> Result<(), GitError> {
        self.run(&["checkout", "-q", "--detach", oid.as_str()])
    }

    /// Check out a ref or revision by name.
    pub fn checkout(&self, name: &str) -> Result<(), GitError> {
        self.run(&["checkout", "-q", name])
    }

    /// Create a non-fast-forward merge of `parents` into HEAD with the
    /// given message.
    pub fn merge_no_ff(&self, message: &str, parents: &[Oid]) -> Result<(), GitError> {
        let mut args = vec!["merge", "--no-ff", "-m", message];
        for parent in parents {
            args.push(parent.as_str());
        }
        self.run(&args)
    }

    /// Throw away index and worktree changes.
    pub fn reset_hard_head(&self) -> Result<(), GitError> {
        self.run(&["reset", "-q", "--hard", "HEAD"])
    }

    /// Forget recorded conflict resolutions for the current conflict.
    ///
    /// Failures are ignored: rerere may be disabled entirely.
    pub fn rerere_clear(&self) {
        let _ = self.run(&["rerere", "clear"]);
    }

    /// Run a shell command in the working tree, returning its exit status.
    ///
    /// Stdio is inherited so the command talks to the user directly.
    pub fn run_shell(&self, command: &str) -> Result<i32, GitError> {
        let status = Command::new("sh")
            .arg("-c")
            .arg(command)
            .current_dir(self.work_dir()?)
            .status()
            .map_err(|e| GitError::Internal {
                message: format!("failed to run shell: {e}"),
            })?;
        Ok(status.code().unwrap_or(1))
    }

    /// Print a diffstat between two commits to the user.
    pub fn print_diffstat(&self, old: &Oid, new: &Oid) {
        let range = format!("{old}..{new}");
        let _ = self.run(&["diff-tree", "--stat", range.as_str()]);
    }

    // =========================================================================
    // Hooks and notes
    // =========================================================================

    /// Invoke the post-rewrite hook with `rebase` and the old/new pairs on
    /// stdin. Failures are ignored.
    pub fn run_post_rewrite_hook(&self, rewritten: &str) {
        let hook = self.git_dir().join("hooks/post-rewrite");
        if !is_executable(&hook) {
            return;
        }
        let Ok(work_dir) = self.work_dir() else {
            return;
        };
        let child = Command::new(&hook)
            .arg("rebase")
            .current_dir(work_dir)
            .stdin(Stdio::piped())
            .spawn();
        if let Ok(mut child) = child {
            if let Some(stdin) = child.stdin.as_mut() {
                let _ = stdin.write_all(rewritten.as_bytes());
            }
            let _ = child.wait();
        }
    }

    /// Copy notes onto rewritten commits. Failures are ignored.
    pub fn copy_notes_for_rewrite(&self, rewritten: &str) {
        let Ok(work_dir) = self.work_dir() else {
            return;
        };
        let child = Command::new("git")
            .args(["notes", "copy", "--for-rewrite=rebase"])
            .current_dir(work_dir)
            .stdin(Stdio::piped())
            .stderr(Stdio::null())
            .spawn();
        if let Ok(mut child) = child {
            if let Some(stdin) = child.stdin.as_mut() {
                let _ = stdin.write_all(rewritten.as_bytes());
            }
            let _ = child.wait();
        }
    }

    /// Opportunistic garbage collection. Failures are ignored.
    pub fn gc_auto(&self) {
        if let Ok(work_dir) = self.work_dir() {
            let _ = Command::new("git")
                .args(["gc", "--auto"])
                .current_dir(work_dir)
                .status();
        }
    }
}

fn is_executable(path: &Path) -> bool {
    #[cfg(unix)]
    {
        use std::os::unix::fs::PermissionsExt as _;
        path.metadata()
            .map(|m| m.is_file() && m.permissions().mode() & 0o111 != 0)
            .unwrap_or(false)
    }
    #[cfg(not(unix))]
    {
        path.is_file()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    mod worktree_status {
        use super::*;

        #[test]
        fn clean_by_default() {
            let status = WorktreeStatus::default();
            assert!(status.is_clean());
            assert!(!status.has_staged());
        }

        #[test]
        fn staged_changes_are_dirty() {
            let status = WorktreeStatus {
                staged: 1,
                ..Default::default()
            };
            assert!(!status.is_clean());
            assert!(status.has_staged());
        }

        #[test]
        fn conflicts_are_dirty() {
            let status = WorktreeStatus {
                has_conflicts: true,
                ..Default::default()
            };
            assert!(!status.is_clean());
        }
    }

    mod git_error {
        use super::*;

        #[test]
        fn display_formatting() {
            let err = GitError::RefNotFound {
                refname: "refs/heads/x".to_string(),
            };
            assert!(err.to_string().contains("refs/heads/x"));

            let err = GitError::CommandFailed {
                command: "git cherry-pick deadbee".to_string(),
                status: 1,
            };
            assert!(err.to_string().contains("cherry-pick"));
            assert!(err.to_string().contains('1'));

            let err = GitError::MissingIdentity;
            assert!(err.to_string().contains("user.name"));
        }

        #[test]
        fn type_error_conversion() {
            let err: GitError = TypeError::InvalidOid("xyz".to_string()).into();
            assert!(matches!(err, GitError::InvalidOid { .. }));
        }
    }
}
