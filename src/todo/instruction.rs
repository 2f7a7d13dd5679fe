//! todo::instruction
//!
//! The instruction set of the rebase program.
//!
//! Each non-comment todo line is `opcode [args...]`. Opcodes are recognised
//! in both long and short form (`pick`/`p`, `squash`/`s`, ...). `exec`
//! treats the whole remainder as a shell command; `merge` takes an optional
//! `-c <commit>` message source followed by parent references; `label` and
//! `goto` take a bare name.

use crate::core::types::{CommitRef, LabelName, TypeError};
use thiserror::Error;

/// Errors from instruction parsing.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum TodoError {
    /// The opcode token is not part of the instruction set.
    #[error("unknown instruction: {opcode}")]
    UnknownInstruction {
        /// The unrecognised opcode token.
        opcode: String,
    },

    /// The opcode requires an argument that is missing.
    #[error("missing argument for '{opcode}'")]
    MissingArgument {
        /// The long form of the opcode.
        opcode: &'static str,
    },

    /// An argument failed validation.
    #[error("bad argument for '{opcode}': {source}")]
    BadArgument {
        /// The long form of the opcode.
        opcode: &'static str,
        #[source]
        source: TypeError,
    },
}

/// The opcode of an instruction, without its arguments.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Opcode {
    Pick,
    Reword,
    Edit,
    Squash,
    Fixup,
    Exec,
    Label,
    Goto,
    Merge,
    Noop,
}

impl Opcode {
    /// Recognise a long or short opcode token.
    pub fn parse(token: &str) -> Option<Self> {
        match token {
            "pick" | "p" => Some(Self::Pick),
            "reword" | "r" => Some(Self::Reword),
            "edit" | "e" => Some(Self::Edit),
            "squash" | "s" => Some(Self::Squash),
            "fixup" | "f" => Some(Self::Fixup),
            "exec" | "x" => Some(Self::Exec),
            "label" | "l" => Some(Self::Label),
            "goto" | "g" => Some(Self::Goto),
            "merge" | "m" => Some(Self::Merge),
            "noop" => Some(Self::Noop),
            _ => None,
        }
    }

    /// The long form used when serialising.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Pick => "pick",
            Self::Reword => "reword",
            Self::Edit => "edit",
            Self::Squash => "squash",
            Self::Fixup => "fixup",
            Self::Exec => "exec",
            Self::Label => "label",
            Self::Goto => "goto",
            Self::Merge => "merge",
            Self::Noop => "noop",
        }
    }

    /// Whether this opcode continues a squash/fixup run.
    pub fn is_squash_fixup(&self) -> bool {
        matches!(self, Self::Squash | Self::Fixup)
    }
}

impl std::fmt::Display for Opcode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// A parent reference of a `merge` instruction: either a raw commit or a
/// label recorded earlier in the program.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum MergeParent {
    Commit(CommitRef),
    Label(LabelName),
}

impl std::fmt::Display for MergeParent {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Commit(c) => write!(f, "{c}"),
            Self::Label(l) => write!(f, "{l}"),
        }
    }
}

/// One instruction of the rebase program.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Instruction {
    /// Replay the commit's diff on top of HEAD.
    Pick { commit: CommitRef, subject: String },
    /// As pick, then reopen the commit message in the editor.
    Reword { commit: CommitRef, subject: String },
    /// As pick, then stop so the user can amend.
    Edit { commit: CommitRef, subject: String },
    /// Meld into the previous commit, combining messages.
    Squash { commit: CommitRef, subject: String },
    /// Meld into the previous commit, discarding this message.
    Fixup { commit: CommitRef, subject: String },
    /// Run a shell command.
    Exec { command: String },
    /// Record the current HEAD under a name.
    Label { name: LabelName },
    /// Detach HEAD to a previously recorded label.
    Goto { name: LabelName },
    /// Recreate a merge commit.
    Merge {
        /// Commit whose body supplies the merge message, if any.
        message_from: Option<CommitRef>,
        /// Parents beyond the current HEAD.
        parents: Vec<MergeParent>,
    },
    /// Do nothing; keeps an otherwise-empty todo actionable.
    Noop,
}

impl Instruction {
    /// The opcode of this instruction.
    pub fn opcode(&self) -> Opcode {
        match self {
            Self::Pick { .. } => Opcode::Pick,
            Self::Reword { .. } => Opcode::Reword,
            Self::Edit { .. } => Opcode::Edit,
            Self::Squash { .. } => Opcode::Squash,
            Self::Fixup { .. } => Opcode::Fixup,
            Self::Exec { .. } => Opcode::Exec,
            Self::Label { .. } => Opcode::Label,
            Self::Goto { .. } => Opcode::Goto,
            Self::Merge { .. } => Opcode::Merge,
            Self::Noop => Opcode::Noop,
        }
    }

    /// The commit operand of a pick-like instruction.
    pub fn commit(&self) -> Option<&CommitRef> {
        match self {
            Self::Pick { commit, .. }
            | Self::Reword { commit, .. }
            | Self::Edit { commit, .. }
            | Self::Squash { commit, .. }
            | Self::Fixup { commit, .. } => Some(commit),
            _ => None,
        }
    }

    /// The subject of a pick-like instruction.
    pub fn subject(&self) -> Option<&str> {
        match self {
            Self::Pick { subject, .. }
            | Self::Reword { subject, .. }
            | Self::Edit { subject, .. }
            | Self::Squash { subject, .. }
            | Self::Fixup { subject, .. } => Some(subject),
            _ => None,
        }
    }

    /// Parse a single non-comment, non-blank line.
    ///
    /// # Errors
    ///
    /// Returns `TodoError` for unknown opcodes and malformed arguments.
    pub fn parse(line: &str) -> Result<Self, TodoError> {
        let line = line.trim();
        let (op_tok, rest) = match line.split_once(char::is_whitespace) {
            Some((op, rest)) => (op, rest.trim_start()),
            None => (line, ""),
        };
        let opcode = Opcode::parse(op_tok).ok_or_else(|| TodoError::UnknownInstruction {
            opcode: op_tok.to_string(),
        })?;

        match opcode {
            Opcode::Noop => Ok(Self::Noop),
            Opcode::Exec => {
                if rest.is_empty() {
                    return Err(TodoError::MissingArgument { opcode: "exec" });
                }
                Ok(Self::Exec {
                    command: rest.to_string(),
                })
            }
            Opcode::Label | Opcode::Goto => {
                let name = rest.split_whitespace().next().ok_or(
                    TodoError::MissingArgument {
                        opcode: opcode.as_str(),
                    },
                )?;
                let name = LabelName::new(name).map_err(|source| TodoError::BadArgument {
                    opcode: opcode.as_str(),
                    source,
                })?;
                Ok(match opcode {
                    Opcode::Label => Self::Label { name },
                    _ => Self::Goto { name },
                })
            }
            Opcode::Merge => Self::parse_merge(rest),
            // The pick-like opcodes share their argument shape.
            _ => {
                let (commit_tok, subject) = match rest.split_once(char::is_whitespace) {
                    Some((c, s)) => (c, s.trim().to_string()),
                    None => (rest, String::new()),
                };
                if commit_tok.is_empty() {
                    return Err(TodoError::MissingArgument {
                        opcode: opcode.as_str(),
                    });
                }
                let commit =
                    CommitRef::new(commit_tok).map_err(|source| TodoError::BadArgument {
                        opcode: opcode.as_str(),
                        source,
                    })?;
                Ok(match opcode {
                    Opcode::Pick => Self::Pick { commit, subject },
                    Opcode::Reword => Self::Reword { commit, subject },
                    Opcode::Edit => Self::Edit { commit, subject },
                    Opcode::Squash => Self::Squash { commit, subject },
                    _ => Self::Fixup { commit, subject },
                })
            }
        }
    }

    fn parse_merge(rest: &str) -> Result<Self, TodoError> {
        let mut tokens = rest.split_whitespace().peekable();
        let message_from = if tokens.peek() == Some(&"-c") {
            tokens.next();
            let id = tokens.next().ok_or(TodoError::MissingArgument { opcode: "merge" })?;
            Some(
                CommitRef::new(id).map_err(|source| TodoError::BadArgument {
                    opcode: "merge",
                    source,
                })?,
            )
        } else {
            None
        };

        let mut parents = Vec::new();
        for tok in tokens {
            // A trailing "# oneline" annotation ends the parent list.
            if tok.starts_with('#') {
                break;
            }
            let parent = match CommitRef::new(tok) {
                Ok(commit) => MergeParent::Commit(commit),
                Err(_) => MergeParent::Label(LabelName::new(tok).map_err(|source| {
                    TodoError::BadArgument {
                        opcode: "merge",
                        source,
                    }
                })?),
            };
            parents.push(parent);
        }
        if parents.is_empty() {
            return Err(TodoError::MissingArgument { opcode: "merge" });
        }
        Ok(Self::Merge {
            message_from,
            parents,
        })
    }
}

impl std::fmt::Display for Instruction {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Pick { commit, subject }
            | Self::Reword { commit, subject }
            | Self::Edit { commit, subject }
            | Self::Squash { commit, subject }
            | Self::Fixup { commit, subject } => {
                write!(f, "{} {commit}", self.opcode())?;
                if !subject.is_empty() {
                    write!(f, " {subject}")?;
                }
                Ok(())
            }
            Self::Exec { command } => write!(f, "exec {command}"),
            Self::Label { name } => write!(f, "label {name}"),
            Self::Goto { name } => write!(f, "goto {name}"),
            Self::Merge {
                message_from,
                parents,
            } => {
                write!(f, "merge")?;
                if let Some(id) = message_from {
                    write!(f, " -c {id}")?;
                }
                for parent in parents {
                    write!(f, " {parent}")?;
                }
                Ok(())
            }
            Self::Noop => write!(f, "noop"),
        }
    }
}
