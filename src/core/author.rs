//! core::author
//!
//! Structured author identity and its author-script serialisation.
//!
//! Authorship is externalised so that a commit performed after a user pause
//! replays with the original author. Internally this is a structured
//! [`AuthorInfo`]; it is serialised only at pause boundaries, as
//! shell-evaluable assignments:
//!
//! ```text
//! GIT_AUTHOR_NAME='Jane Doe'
//! GIT_AUTHOR_EMAIL='jane@example.com'
//! GIT_AUTHOR_DATE='Tue, 1 Jul 2008 10:00:00 +0200'
//! ```
//!
//! Values are single-quoted with `'\''` escaping, matching what a POSIX
//! shell would need to round-trip arbitrary names.

use chrono::{DateTime, FixedOffset, TimeZone as _};
use thiserror::Error;

/// Errors from author-script parsing.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum AuthorError {
    /// A required assignment is missing from the script.
    #[error("author script is missing {0}")]
    MissingField(&'static str),

    /// A line is not a well-formed quoted assignment.
    #[error("malformed author script line: {0}")]
    MalformedLine(String),
}

/// Author identity restored on the next commit after a pause.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AuthorInfo {
    /// Author name.
    pub name: String,
    /// Author email.
    pub email: String,
    /// Author date, in a format git accepts verbatim (RFC 2822).
    pub date: String,
}

impl AuthorInfo {
    /// Build an author record from raw signature parts.
    ///
    /// `seconds` and `offset_minutes` are the epoch timestamp and timezone
    /// offset of the original commit's author signature; the date is
    /// rendered as RFC 2822 so it survives a trip through the environment.
    pub fn from_signature(
        name: impl Into<String>,
        email: impl Into<String>,
        seconds: i64,
        offset_minutes: i32,
    ) -> Self {
        let date = FixedOffset::east_opt(offset_minutes * 60)
            .and_then(|tz| tz.timestamp_opt(seconds, 0).single())
            .map(|dt: DateTime<FixedOffset>| dt.to_rfc2822())
            // A signature with an unrepresentable offset falls back to epoch
            // seconds, which git also accepts.
            .unwrap_or_else(|| format!("@{seconds} +0000"));
        Self {
            name: name.into(),
            email: email.into(),
            date,
        }
    }

    /// Serialise to the on-disk author-script form.
    pub fn to_script(&self) -> String {
        format!(
            "GIT_AUTHOR_NAME={}\nGIT_AUTHOR_EMAIL={}\nGIT_AUTHOR_DATE={}\n",
            sq(&self.name),
            sq(&self.email),
            sq(&self.date)
        )
    }

    /// Parse the on-disk author-script form.
    ///
    /// # Errors
    ///
    /// Returns `AuthorError` when a line is not a quoted assignment or when
    /// one of the three fields is absent.
    pub fn from_script(script: &str) -> Result<Self, AuthorError> {
        let mut name = None;
        let mut email = None;
        let mut date = None;
        for line in script.lines() {
            if line.trim().is_empty() {
                continue;
            }
            let (key, value) = line
                .split_once('=')
                .ok_or_else(|| AuthorError::MalformedLine(line.to_string()))?;
            let value = unsq(value).ok_or_else(|| AuthorError::MalformedLine(line.to_string()))?;
            match key {
                "GIT_AUTHOR_NAME" => name = Some(value),
                "GIT_AUTHOR_EMAIL" => email = Some(value),
                "GIT_AUTHOR_DATE" => date = Some(value),
                _ => return Err(AuthorError::MalformedLine(line.to_string())),
            }
        }
        Ok(Self {
            name: name.ok_or(AuthorError::MissingField("GIT_AUTHOR_NAME"))?,
            email: email.ok_or(AuthorError::MissingField("GIT_AUTHOR_EMAIL"))?,
            date: date.ok_or(AuthorError::MissingField("GIT_AUTHOR_DATE"))?,
        })
    }

    /// Environment variable pairs for a commit subprocess.
    pub fn env(&self) -> [(&'static str, &str); 3] {
        [
            ("GIT_AUTHOR_NAME", self.name.as_str()),
            ("GIT_AUTHOR_EMAIL", self.email.as_str()),
            ("GIT_AUTHOR_DATE", self.date.as_str()),
        ]
    }
}

/// Single-quote a value for shell evaluation.
fn sq(value: &str) -> String {
    format!("'{}'", value.replace('\'', r"'\''"))
}

/// Strip shell single-quoting; `None` if the value is not quoted.
fn unsq(value: &str) -> Option<String> {
    let inner = value.strip_prefix('\'')?.strip_suffix('\'')?;
    Some(inner.replace(r"'\''", "'"))
}
