//! todo
//!
//! The rebase program as a first-class value.
//!
//! A [`TodoList`] is parsed once per entry point and retains the original
//! textual form of every line, so user edits and comments survive a
//! round-trip through the state directory. Lookahead is a peek primitive
//! ([`TodoList::peek_next_opcode`]); consumption happens by migrating lines
//! to the done log, never by re-reading partially consumed files.

pub mod instruction;

pub use instruction::{Instruction, MergeParent, Opcode, TodoError};

/// How a single line of the program was classified.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LineKind {
    /// A well-formed instruction.
    Instruction(Instruction),
    /// A `#` comment line.
    Comment,
    /// An empty (or whitespace-only) line.
    Blank,
    /// A line that failed to parse; kept so the executor can report it.
    Invalid {
        /// The token after the opcode, if any (a candidate commit id).
        token: Option<String>,
        /// Why parsing failed.
        error: TodoError,
    },
}

/// One line of the program, with its original text preserved.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TodoLine {
    /// The line exactly as it appears on disk (no trailing newline).
    pub raw: String,
    /// Parsed classification.
    pub kind: LineKind,
}

impl TodoLine {
    /// Classify one line of todo text.
    pub fn parse(raw: impl Into<String>) -> Self {
        let raw = raw.into();
        let trimmed = raw.trim();
        let kind = if trimmed.is_empty() {
            LineKind::Blank
        } else if trimmed.starts_with('#') {
            LineKind::Comment
        } else {
            match Instruction::parse(trimmed) {
                Ok(insn) => LineKind::Instruction(insn),
                Err(error) => LineKind::Invalid {
                    token: trimmed
                        .split_whitespace()
                        .nth(1)
                        .map(|t| t.to_string()),
                    error,
                },
            }
        };
        Self { raw, kind }
    }

    /// Build a line from an instruction (canonical serialisation).
    pub fn from_instruction(insn: Instruction) -> Self {
        Self {
            raw: insn.to_string(),
            kind: LineKind::Instruction(insn),
        }
    }

    /// The instruction, if this line holds one.
    pub fn instruction(&self) -> Option<&Instruction> {
        match &self.kind {
            LineKind::Instruction(insn) => Some(insn),
            _ => None,
        }
    }

    /// Whether the line is ignorable (comment or blank).
    pub fn is_ignorable(&self) -> bool {
        matches!(self.kind, LineKind::Comment | LineKind::Blank)
    }
}

/// An ordered rebase program plus its comments and blanks.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TodoList {
    lines: Vec<TodoLine>,
}

impl TodoList {
    /// An empty program.
    pub fn new() -> Self {
        Self::default()
    }

    /// Parse a whole todo file.
    pub fn parse(text: &str) -> Self {
        Self {
            lines: text.lines().map(TodoLine::parse).collect(),
        }
    }

    /// Serialise back to file form. Every line gets a trailing newline; an
    /// empty program serialises to the empty string.
    pub fn to_text(&self) -> String {
        let mut out = String::new();
        for line in &self.lines {
            out.push_str(&line.raw);
            out.push('\n');
        }
        out
    }

    /// All lines, in order.
    pub fn lines(&self) -> &[TodoLine] {
        &self.lines
    }

    /// Number of lines (of any kind).
    pub fn len(&self) -> usize {
        self.lines.len()
    }

    /// Whether the program has no lines at all.
    pub fn is_empty(&self) -> bool {
        self.lines.is_empty()
    }

    /// Whether the program contains at least one instruction line.
    ///
    /// Invalid lines count: the user wrote something intending an action,
    /// and the executor owns reporting it.
    pub fn has_action(&self) -> bool {
        self.lines
            .iter()
            .any(|l| matches!(l.kind, LineKind::Instruction(_) | LineKind::Invalid { .. }))
    }

    /// Opcode of the next instruction, without consuming anything.
    ///
    /// Comments, blanks, and invalid lines are skipped; `None` when no
    /// well-formed instruction remains.
    pub fn peek_next_opcode(&self) -> Option<Opcode> {
        self.lines
            .iter()
            .find_map(|l| l.instruction().map(Instruction::opcode))
    }

    /// The first line, if any.
    pub fn first(&self) -> Option<&TodoLine> {
        self.lines.first()
    }

    /// Remove and return the first line.
    pub fn shift(&mut self) -> Option<TodoLine> {
        if self.lines.is_empty() {
            None
        } else {
            Some(self.lines.remove(0))
        }
    }

    /// Append an instruction in canonical form.
    pub fn push(&mut self, insn: Instruction) {
        self.lines.push(TodoLine::from_instruction(insn));
    }

    /// Append a raw line, classifying it.
    pub fn push_raw(&mut self, raw: impl Into<String>) {
        self.lines.push(TodoLine::parse(raw));
    }

    /// Append a comment line (the `# ` prefix is added here).
    pub fn push_comment(&mut self, text: &str) {
        let raw = if text.is_empty() {
            "#".to_string()
        } else {
            format!("# {text}")
        };
        self.lines.push(TodoLine {
            raw,
            kind: LineKind::Comment,
        });
    }

    /// Append a blank line.
    pub fn push_blank(&mut self) {
        self.lines.push(TodoLine {
            raw: String::new(),
            kind: LineKind::Blank,
        });
    }

    /// Drop every comment line, keeping instructions and blanks.
    pub fn strip_comments(&mut self) {
        self.lines.retain(|l| l.kind != LineKind::Comment);
    }

    /// Iterate over the instructions only.
    pub fn instructions(&self) -> impl Iterator<Item = &Instruction> {
        self.lines.iter().filter_map(TodoLine::instruction)
    }
}

impl std::fmt::Display for TodoList {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.to_text())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const SAMPLE: &str = "\
# Rebase deadbee..cafe123 onto deadbee
pick deadbee First subject

squash cafe123 Second subject
# trailing comment
";

    mod parse {
        use super::*;

        #[test]
        fn classifies_lines() {
            let todo = TodoList::parse(SAMPLE);
            assert_eq!(todo.len(), 5);
            assert!(matches!(todo.lines()[0].kind, LineKind::Comment));
            assert!(matches!(todo.lines()[1].kind, LineKind::Instruction(_)));
            assert!(matches!(todo.lines()[2].kind, LineKind::Blank));
            assert!(matches!(todo.lines()[3].kind, LineKind::Instruction(_)));
            assert!(matches!(todo.lines()[4].kind, LineKind::Comment));
        }

        #[test]
        fn invalid_line_keeps_token() {
            let todo = TodoList::parse("munge deadbee stuff\n");
            match &todo.lines()[0].kind {
                LineKind::Invalid { token, error } => {
                    assert_eq!(token.as_deref(), Some("deadbee"));
                    assert_eq!(
                        error,
                        &TodoError::UnknownInstruction {
                            opcode: "munge".to_string()
                        }
                    );
                }
                other => panic!("unexpected: {other:?}"),
            }
        }

        #[test]
        fn empty_text() {
            let todo = TodoList::parse("");
            assert!(todo.is_empty());
            assert!(!todo.has_action());
        }
    }

    mod roundtrip {
        use super::*;

        #[test]
        fn to_text_preserves_raw_lines() {
            let todo = TodoList::parse(SAMPLE);
            assert_eq!(todo.to_text(), SAMPLE);
        }

        #[test]
        fn preserves_user_formatting() {
            let text = "p  deadbee   subject with   spacing\n";
            let todo = TodoList::parse(text);
            assert_eq!(todo.to_text(), text);
        }
    }

    mod peek {
        use super::*;

        #[test]
        fn skips_comments_and_blanks() {
            let todo = TodoList::parse("# c\n\nsquash deadbee x\n");
            assert_eq!(todo.peek_next_opcode(), Some(Opcode::Squash));
        }

        #[test]
        fn none_when_no_instruction() {
            let todo = TodoList::parse("# only comments\n");
            assert_eq!(todo.peek_next_opcode(), None);
        }

        #[test]
        fn does_not_consume() {
            let todo = TodoList::parse("pick deadbee x\n");
            let _ = todo.peek_next_opcode();
            assert_eq!(todo.len(), 1);
        }
    }

    mod mutation {
        use super::*;

        #[test]
        fn shift_removes_first() {
            let mut todo = TodoList::parse("pick deadbee a\npick cafe123 b\n");
            let first = todo.shift().unwrap();
            assert_eq!(first.raw, "pick deadbee a");
            assert_eq!(todo.len(), 1);
        }

        #[test]
        fn strip_comments_keeps_instructions() {
            let mut todo = TodoList::parse(SAMPLE);
            todo.strip_comments();
            assert_eq!(todo.instructions().count(), 2);
            assert!(todo.lines().iter().all(|l| l.kind != LineKind::Comment));
        }

        #[test]
        fn has_action_counts_invalid_lines() {
            let todo = TodoList::parse("munge deadbee\n");
            assert!(todo.has_action());
        }

        #[test]
        fn push_comment_prefixes() {
            let mut todo = TodoList::new();
            todo.push_comment("hello");
            todo.push_comment("");
            assert_eq!(todo.to_text(), "# hello\n#\n");
        }
    }
}
