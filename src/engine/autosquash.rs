//! engine::autosquash
//!
//! Rearrange `squash!`/`fixup!` commits into their targets.
//!
//! A pick whose subject begins with `squash! X` or `fixup! X` moves to
//! directly after the first pick whose subject has `X` as a prefix, or
//! whose commit `X` names, and its opcode flips to `squash`/`fixup`.
//! Chains (`fixup! fixup! X`) coalesce transitively because a moved line
//! carries its own attachments with it.
//!
//! Only `pick` lines are candidates for moving, so rearranging an already
//! rearranged program is the identity.

use std::collections::HashMap;

use crate::core::types::{CommitRef, Oid};
use crate::todo::{Instruction, Opcode, TodoList};

/// The marker prefixes recognised on subjects.
const SQUASH_BANG: &str = "squash! ";
const FIXUP_BANG: &str = "fixup! ";

/// Rearrange the program.
///
/// `resolve` maps a commit token to its full id; it is consulted to match
/// `X` against line commits when `X` looks like an id, and may return
/// `None` for tokens that do not resolve.
pub fn rearrange_autosquash<F>(todo: &TodoList, resolve: F) -> TodoList
where
    F: Fn(&CommitRef) -> Option<Oid>,
{
    let lines = todo.lines();

    // Pick lines that want to move, with their target style and X.
    let mut wants_move: HashMap<usize, (Opcode, String)> = HashMap::new();
    for (i, line) in lines.iter().enumerate() {
        let Some(Instruction::Pick { subject, .. }) = line.instruction() else {
            continue;
        };
        if let Some(x) = subject.strip_prefix(SQUASH_BANG) {
            wants_move.insert(i, (Opcode::Squash, x.to_string()));
        } else if let Some(x) = subject.strip_prefix(FIXUP_BANG) {
            wants_move.insert(i, (Opcode::Fixup, x.to_string()));
        }
    }
    if wants_move.is_empty() {
        return todo.clone();
    }

    // Resolved ids of every commit-bearing line, for id-targeted marks.
    let line_oid: HashMap<usize, Oid> = lines
        .iter()
        .enumerate()
        .filter_map(|(i, line)| {
            let commit = line.instruction()?.commit()?;
            Some((i, resolve(commit)?))
        })
        .collect();

    // Attach each mover to the first matching line, skipping matches that
    // would close a cycle.
    let mut target_of: HashMap<usize, usize> = HashMap::new();
    let mut attachments: HashMap<usize, Vec<usize>> = HashMap::new();
    for (&i, (_, x)) in {
        let mut movers: Vec<_> = wants_move.iter().collect();
        movers.sort_by_key(|(i, _)| **i);
        movers
    } {
        let x_oid = CommitRef::new(x.as_str()).ok().and_then(|r| resolve(&r));
        let candidate = lines.iter().enumerate().position(|(j, line)| {
            if j == i {
                return false;
            }
            let Some(insn) = line.instruction() else {
                return false;
            };
            let subject_match = insn
                .subject()
                .is_some_and(|s| !s.is_empty() && s.starts_with(x.as_str()));
            let id_match = match (&x_oid, line_oid.get(&j)) {
                (Some(x_oid), Some(oid)) => x_oid == oid,
                _ => false,
            };
            if !(subject_match || id_match) {
                return false;
            }
            // Reject a target whose own attachment chain leads back here.
            let mut cursor = j;
            while let Some(&next) = target_of.get(&cursor) {
                if next == i {
                    return false;
                }
                cursor = next;
            }
            true
        });
        if let Some(j) = candidate {
            target_of.insert(i, j);
            attachments.entry(j).or_default().push(i);
        }
    }

    // Emit: unattached lines in order, each followed (recursively) by its
    // attachments with flipped opcodes.
    let mut out = TodoList::new();
    for (i, line) in lines.iter().enumerate() {
        if target_of.contains_key(&i) {
            continue;
        }
        out.push_raw(line.raw.clone());
        emit_attachments(i, lines, &wants_move, &attachments, &mut out);
    }
    out
}

fn emit_attachments(
    target: usize,
    lines: &[crate::todo::TodoLine],
    wants_move: &HashMap<usize, (Opcode, String)>,
    attachments: &HashMap<usize, Vec<usize>>,
    out: &mut TodoList,
) {
    let Some(attached) = attachments.get(&target) else {
        return;
    };
    for &i in attached {
        let Some(Instruction::Pick { commit, subject }) = lines[i].instruction() else {
            continue;
        };
        let (style, _) = &wants_move[&i];
        let insn = match style {
            Opcode::Squash => Instruction::Squash {
                commit: commit.clone(),
                subject: subject.clone(),
            },
            _ => Instruction::Fixup {
                commit: commit.clone(),
                subject: subject.clone(),
            },
        };
        out.push(insn);
        emit_attachments(i, lines, wants_move, attachments, out);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn no_resolve(_: &CommitRef) -> Option<Oid> {
        None
    }

    fn text(todo: &TodoList) -> String {
        todo.to_text()
    }

    #[test]
    fn fixup_moves_after_target() {
        let todo = TodoList::parse(
            "pick 1111111 fix foo\npick 2222222 unrelated\npick 3333333 fixup! fix foo\n",
        );
        let out = rearrange_autosquash(&todo, no_resolve);
        assert_eq!(
            text(&out),
            "pick 1111111 fix foo\nfixup 3333333 fixup! fix foo\npick 2222222 unrelated\n"
        );
    }

    #[test]
    fn squash_flips_opcode() {
        let todo = TodoList::parse("pick 1111111 topic\npick 2222222 squash! topic\n");
        let out = rearrange_autosquash(&todo, no_resolve);
        assert_eq!(
            text(&out),
            "pick 1111111 topic\nsquash 2222222 squash! topic\n"
        );
    }

    #[test]
    fn prefix_matching() {
        // "fix" is a prefix of "fix foo", so the shorthand attaches.
        let todo = TodoList::parse("pick 1111111 fix foo\npick 2222222 fixup! fix\n");
        let out = rearrange_autosquash(&todo, no_resolve);
        assert_eq!(
            text(&out),
            "pick 1111111 fix foo\nfixup 2222222 fixup! fix\n"
        );
    }

    #[test]
    fn first_pick_wins() {
        let todo = TodoList::parse(
            "pick 1111111 same subject\npick 2222222 same subject\npick 3333333 fixup! same\n",
        );
        let out = rearrange_autosquash(&todo, no_resolve);
        assert_eq!(
            text(&out),
            "pick 1111111 same subject\nfixup 3333333 fixup! same\npick 2222222 same subject\n"
        );
    }

    #[test]
    fn two_fixups_same_target_keep_order() {
        let todo = TodoList::parse(
            "pick 1111111 topic\npick 2222222 fixup! topic\npick 3333333 fixup! topic\n",
        );
        let out = rearrange_autosquash(&todo, no_resolve);
        assert_eq!(
            text(&out),
            "pick 1111111 topic\nfixup 2222222 fixup! topic\nfixup 3333333 fixup! topic\n"
        );
    }

    #[test]
    fn chain_coalesces_transitively() {
        let todo = TodoList::parse(
            "pick 1111111 topic\npick 2222222 fixup! topic\npick 3333333 fixup! fixup! topic\n",
        );
        let out = rearrange_autosquash(&todo, no_resolve);
        assert_eq!(
            text(&out),
            "pick 1111111 topic\nfixup 2222222 fixup! topic\nfixup 3333333 fixup! fixup! topic\n"
        );
    }

    #[test]
    fn commit_id_target() {
        let full_1 = Oid::new(&"1".repeat(40)).unwrap();
        let resolve = move |r: &CommitRef| {
            // Both "1111111" and any prefix of it resolve to commit 1.
            full_1.as_str().starts_with(r.as_str()).then(|| full_1.clone())
        };
        let todo = TodoList::parse("pick 1111111 topic\npick 2222222 fixup! 11111\n");
        let out = rearrange_autosquash(&todo, resolve);
        assert_eq!(text(&out), "pick 1111111 topic\nfixup 2222222 fixup! 11111\n");
    }

    #[test]
    fn unmatched_mover_stays_put() {
        let todo = TodoList::parse("pick 1111111 topic\npick 2222222 fixup! nothing here\n");
        let out = rearrange_autosquash(&todo, no_resolve);
        assert_eq!(text(&out), text(&todo));
    }

    #[test]
    fn comments_pass_through() {
        let todo = TodoList::parse(
            "# header\npick 1111111 topic\n# middle\npick 2222222 fixup! topic\n",
        );
        let out = rearrange_autosquash(&todo, no_resolve);
        assert_eq!(
            text(&out),
            "# header\npick 1111111 topic\nfixup 2222222 fixup! topic\n# middle\n"
        );
    }

    #[test]
    fn idempotent() {
        let todo = TodoList::parse(
            "pick 1111111 topic\npick 2222222 fixup! topic\npick 3333333 other\npick 4444444 squash! other\n",
        );
        let once = rearrange_autosquash(&todo, no_resolve);
        let twice = rearrange_autosquash(&once, no_resolve);
        assert_eq!(text(&once), text(&twice));
    }

    #[test]
    fn mutual_reference_does_not_lose_lines() {
        // Two movers that prefix-match each other's subjects; the cycle
        // guard keeps at least the chain root in place.
        let todo = TodoList::parse("pick 1111111 fixup! fixup\npick 2222222 fixup! fixup\n");
        let out = rearrange_autosquash(&todo, no_resolve);
        assert_eq!(out.instructions().count(), 2);
    }
}
