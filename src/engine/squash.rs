//! engine::squash
//!
//! Combined-message accumulation across a squash/fixup run.
//!
//! The combined message is state, not computation: it lives in
//! `message-squash` on disk so a crash mid-run loses nothing, and its first
//! line always reads `# This is a combination of N commits.` with N equal
//! to the number of embedded messages. `message-fixup` mirrors the original
//! pick's message for as long as the run has seen only `fixup` opcodes, so
//! a pure-fixup run can finalise without the editor.

use crate::state::{StateError, StateStore};

/// Which flavor of coalescing a step performs.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SquashStyle {
    /// Keep the incoming message in the combination.
    Squash,
    /// Embed the incoming message commented out.
    Fixup,
}

/// The mandatory first line of `message-squash`.
fn header(count: usize) -> String {
    format!("# This is a combination of {count} commits.")
}

/// Parse the count out of the header line.
fn parse_header(text: &str) -> Option<usize> {
    text.lines()
        .next()?
        .strip_prefix("# This is a combination of ")?
        .strip_suffix(" commits.")?
        .parse()
        .ok()
}

/// English ordinal with the 11th-19th exception.
pub fn ordinal(n: usize) -> String {
    let suffix = match n % 100 {
        11..=19 => "th",
        _ => match n % 10 {
            1 => "st",
            2 => "nd",
            3 => "rd",
            _ => "th",
        },
    };
    format!("{n}{suffix}")
}

/// Fold one more commit message into the run.
///
/// `head_message` is the message of the commit being squashed into (used
/// only when this step opens the run); `incoming` is the message of the
/// commit being folded. Returns the new count.
///
/// # Errors
///
/// `StateError::Corrupt` when an existing `message-squash` lost its header.
pub fn update_squash_message(
    store: &StateStore,
    head_message: &str,
    incoming: &str,
    style: SquashStyle,
) -> Result<usize, StateError> {
    let (count, mut combined) = match store.read_squash_message()? {
        Some(existing) => {
            let count = parse_header(&existing).ok_or_else(|| StateError::Corrupt {
                path: store.paths().message_squash(),
                detail: "missing combination header".to_string(),
            })? + 1;
            let rest = existing.split_once('\n').map(|(_, r)| r).unwrap_or("");
            let mut combined = header(count);
            combined.push('\n');
            combined.push_str(rest);
            (count, combined)
        }
        None => {
            store.write_fixup_message(head_message)?;
            let mut combined = header(2);
            combined.push('\n');
            combined.push_str("# The first commit's message is:\n\n");
            combined.push_str(head_message);
            ensure_trailing_newline(&mut combined);
            (2, combined)
        }
    };

    match style {
        SquashStyle::Squash => {
            store.clear_fixup_message()?;
            combined.push_str(&format!("\n# This is the {} commit message:\n\n", ordinal(count)));
            combined.push_str(incoming);
        }
        SquashStyle::Fixup => {
            combined.push_str(&format!(
                "\n# The {} commit message will be skipped:\n\n",
                ordinal(count)
            ));
            for line in incoming.lines() {
                combined.push_str("#\t");
                combined.push_str(line);
                combined.push('\n');
            }
        }
    }
    ensure_trailing_newline(&mut combined);
    store.write_squash_message(&combined)?;
    Ok(count)
}

fn ensure_trailing_newline(text: &mut String) {
    if !text.ends_with('\n') {
        text.push('\n');
    }
}
