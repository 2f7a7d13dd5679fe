//! core::types
//!
//! Strong types for core domain concepts.
//!
//! # Types
//!
//! - [`Oid`] - Fully resolved commit identifier (SHA)
//! - [`CommitRef`] - Possibly-abbreviated commit id as written in a todo line
//! - [`RefName`] - Validated Git reference name
//! - [`LabelName`] - Validated todo label name
//!
//! These types enforce validity at construction time, so invalid values
//! cannot flow into the state directory or into git invocations.

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Errors from type validation.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum TypeError {
    #[error("invalid object id: {0}")]
    InvalidOid(String),

    #[error("invalid commit reference: {0}")]
    InvalidCommitRef(String),

    #[error("invalid ref name: {0}")]
    InvalidRefName(String),

    #[error("invalid label name: {0}")]
    InvalidLabelName(String),
}

/// A fully resolved Git object identifier (SHA-1 or SHA-256).
///
/// OIDs are normalized to lowercase.
///
/// # Example
///
/// ```
/// use resequencer::core::types::Oid;
///
/// let oid = Oid::new("ABC123DEF4567890ABC123DEF4567890ABC12345").unwrap();
/// assert_eq!(oid.as_str(), "abc123def4567890abc123def4567890abc12345");
/// assert_eq!(oid.short(7), "abc123d");
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct Oid(String);

impl Oid {
    /// Create a new validated object id, normalized to lowercase.
    ///
    /// # Errors
    ///
    /// Returns `TypeError::InvalidOid` if the string is not a full hex OID.
    pub fn new(oid: impl Into<String>) -> Result<Self, TypeError> {
        let oid = oid.into().to_ascii_lowercase();
        // SHA-1 is 40 hex chars, SHA-256 is 64
        if oid.len() != 40 && oid.len() != 64 {
            return Err(TypeError::InvalidOid(format!(
                "expected 40 or 64 hex characters, got {}",
                oid.len()
            )));
        }
        if !oid.chars().all(|c| c.is_ascii_hexdigit()) {
            return Err(TypeError::InvalidOid("object id must be hexadecimal".into()));
        }
        Ok(Self(oid))
    }

    /// Get an abbreviated form: the first `len` characters (or the whole id
    /// if `len` exceeds it).
    pub fn short(&self, len: usize) -> &str {
        &self.0[..len.min(self.0.len())]
    }

    /// Get the object id as a string slice.
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl TryFrom<String> for Oid {
    type Error = TypeError;

    fn try_from(s: String) -> Result<Self, Self::Error> {
        Self::new(s)
    }
}

impl From<Oid> for String {
    fn from(oid: Oid) -> Self {
        oid.0
    }
}

impl AsRef<str> for Oid {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

impl std::fmt::Display for Oid {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// A commit reference exactly as written in a todo line.
///
/// Todo lines carry abbreviated ids (`pick deadbee Subject`), so a
/// `CommitRef` is a hex prefix rather than a full [`Oid`]. Resolution to an
/// `Oid` happens against the object database at execution time.
///
/// # Example
///
/// ```
/// use resequencer::core::types::CommitRef;
///
/// let r = CommitRef::new("deadbee").unwrap();
/// assert_eq!(r.as_str(), "deadbee");
/// assert!(CommitRef::new("not-hex!").is_err());
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct CommitRef(String);

impl CommitRef {
    /// Minimum abbreviation git will ever produce.
    const MIN_LEN: usize = 4;

    /// Create a validated commit reference.
    ///
    /// # Errors
    ///
    /// Returns `TypeError::InvalidCommitRef` unless the string is 4-64 hex
    /// characters.
    pub fn new(s: impl Into<String>) -> Result<Self, TypeError> {
        let s = s.into();
        if s.len() < Self::MIN_LEN || s.len() > 64 {
            return Err(TypeError::InvalidCommitRef(format!(
                "expected 4 to 64 hex characters, got {}",
                s.len()
            )));
        }
        if !s.chars().all(|c| c.is_ascii_hexdigit()) {
            return Err(TypeError::InvalidCommitRef(
                "commit reference must be hexadecimal".into(),
            ));
        }
        Ok(Self(s))
    }

    /// Get the reference as written.
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl From<&Oid> for CommitRef {
    fn from(oid: &Oid) -> Self {
        Self(oid.as_str().to_string())
    }
}

impl std::fmt::Display for CommitRef {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// A validated Git reference name (e.g. `refs/heads/topic`).
///
/// Reference names must conform to Git's refname rules (see
/// `git check-ref-format`).
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct RefName(String);

impl RefName {
    /// Create a new validated ref name.
    ///
    /// # Errors
    ///
    /// Returns `TypeError::InvalidRefName` if the name violates Git's
    /// refname rules.
    pub fn new(name: impl Into<String>) -> Result<Self, TypeError> {
        let name = name.into();
        Self::validate(&name)?;
        Ok(Self(name))
    }

    /// Check if this ref is a branch ref.
    pub fn is_branch_ref(&self) -> bool {
        self.0.starts_with("refs/heads/")
    }

    /// Strip a prefix from the ref name and return the remainder.
    pub fn strip_prefix(&self, prefix: &str) -> Option<&str> {
        self.0.strip_prefix(prefix)
    }

    fn validate(name: &str) -> Result<(), TypeError> {
        if name.is_empty() {
            return Err(TypeError::InvalidRefName("ref name cannot be empty".into()));
        }
        if name.starts_with('/') || name.ends_with('/') {
            return Err(TypeError::InvalidRefName(
                "ref name cannot start or end with '/'".into(),
            ));
        }
        if name.ends_with(".lock") {
            return Err(TypeError::InvalidRefName(
                "ref name cannot end with '.lock'".into(),
            ));
        }
        for bad in ["..", "@{", "//"] {
            if name.contains(bad) {
                return Err(TypeError::InvalidRefName(format!(
                    "ref name cannot contain '{bad}'"
                )));
            }
        }
        const INVALID_CHARS: [char; 8] = [' ', '~', '^', ':', '\\', '?', '*', '['];
        for c in INVALID_CHARS {
            if name.contains(c) {
                return Err(TypeError::InvalidRefName(format!(
                    "ref name cannot contain '{c}'"
                )));
            }
        }
        if name.chars().any(|c| c.is_ascii_control()) {
            return Err(TypeError::InvalidRefName(
                "ref name cannot contain control characters".into(),
            ));
        }
        for component in name.split('/') {
            if component.starts_with('.') {
                return Err(TypeError::InvalidRefName(
                    "path component cannot start with '.'".into(),
                ));
            }
            if component.ends_with(".lock") {
                return Err(TypeError::InvalidRefName(
                    "path component cannot end with '.lock'".into(),
                ));
            }
        }
        Ok(())
    }

    /// Get the ref name as a string slice.
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl TryFrom<String> for RefName {
    type Error = TypeError;

    fn try_from(s: String) -> Result<Self, Self::Error> {
        Self::new(s)
    }
}

impl From<RefName> for String {
    fn from(name: RefName) -> Self {
        name.0
    }
}

impl std::fmt::Display for RefName {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// A validated todo label name.
///
/// Labels name positions in a preserve-merges program (`label`/`goto` and
/// `merge` parent references). They become file names under the state
/// directory's `labels/` subdirectory, so the validation is stricter than
/// Git's refname rules.
///
/// # Example
///
/// ```
/// use resequencer::core::types::LabelName;
///
/// assert!(LabelName::new("onto").is_ok());
/// assert!(LabelName::new("rewritten-abc123d").is_ok());
/// assert!(LabelName::new("has space").is_err());
/// assert!(LabelName::new("-flag").is_err());
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct LabelName(String);

impl LabelName {
    /// Create a new validated label name.
    ///
    /// # Errors
    ///
    /// Returns `TypeError::InvalidLabelName` if the name is empty, starts
    /// with `-`, or contains whitespace, path separators, or control
    /// characters.
    pub fn new(name: impl Into<String>) -> Result<Self, TypeError> {
        let name = name.into();
        if name.is_empty() {
            return Err(TypeError::InvalidLabelName("label cannot be empty".into()));
        }
        if name.starts_with('-') {
            return Err(TypeError::InvalidLabelName(
                "label cannot start with '-'".into(),
            ));
        }
        if name == "." || name == ".." {
            return Err(TypeError::InvalidLabelName("label is reserved".into()));
        }
        if name
            .chars()
            .any(|c| c.is_whitespace() || c.is_ascii_control() || c == '/' || c == '\\')
        {
            return Err(TypeError::InvalidLabelName(
                "label cannot contain whitespace or path separators".into(),
            ));
        }
        Ok(Self(name))
    }

    /// The label generated for a rebased commit in a preserve-merges
    /// program.
    pub fn for_rewritten(short_id: &str) -> Self {
        Self(format!("rewritten-{short_id}"))
    }

    /// The label recording the rebase base.
    pub fn onto() -> Self {
        Self("onto".to_string())
    }

    /// Get the label as a string slice.
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl std::fmt::Display for LabelName {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}
