//! engine::merges
//!
//! Preserve-merges expansion: replace the flat pick list with a
//! label/goto/merge program.
//!
//! Every rebased commit that is later referenced as a parent gets a
//! deterministic `rewritten-<short-id>` label. First-parent chains are
//! emitted contiguously, oldest first; a chain that does not continue the
//! previous line opens with `goto` to its base (`onto` when the base lies
//! outside the rebased set). Merge commits become
//! `merge -c <id> <parent refs>` with side parents referenced by label when
//! they are themselves rebased, by raw id otherwise.

use std::collections::{HashMap, HashSet};

use crate::core::types::{CommitRef, LabelName, Oid};
use crate::git::Git;
use crate::todo::{Instruction, MergeParent, TodoList};

use super::plan::PlanError;

/// One commit of the rebased range, as the program builder sees it.
#[derive(Debug, Clone)]
pub struct CommitNode {
    /// Full id.
    pub oid: Oid,
    /// Abbreviated id used in labels and todo lines.
    pub short: String,
    /// Subject line.
    pub subject: String,
    /// All parents, first parent first.
    pub parents: Vec<Oid>,
}

/// Generate the preserve-merges program for `upstream..head`.
pub fn generate_merge_todo(git: &Git, upstream: &Oid, head: &Oid) -> Result<TodoList, PlanError> {
    let mut nodes = Vec::new();
    for oid in git.rev_list(upstream, head, true)? {
        let info = git.commit_info(&oid)?;
        nodes.push(CommitNode {
            short: git.short_id(&oid)?,
            subject: info.summary,
            parents: git.commit_parents(&oid)?,
            oid,
        });
    }
    Ok(build_program(&nodes, head))
}

/// Where the program's cursor sits between instructions.
#[derive(Debug, Clone, PartialEq, Eq)]
enum Position {
    Onto,
    At(Oid),
}

/// Build the program from the commit nodes of the range.
///
/// `nodes` must contain every commit of the range (parents may point
/// outside it); `head` is the tip the traversal starts from.
pub fn build_program(nodes: &[CommitNode], head: &Oid) -> TodoList {
    let by_oid: HashMap<&Oid, &CommitNode> = nodes.iter().map(|n| (&n.oid, n)).collect();

    // Order commits so first-parent chains stay contiguous and parents
    // always precede children.
    let mut ordered: Vec<&CommitNode> = Vec::new();
    let mut placed: HashSet<&Oid> = HashSet::new();
    order_chains(head, &by_oid, &mut placed, &mut ordered);

    // A commit needs a label when a later merge references it as a side
    // parent, or when some later chain will `goto` back to it (its
    // first-parent child is not the line emitted directly after it).
    let mut side_parents: HashSet<&Oid> = HashSet::new();
    for node in nodes {
        for parent in node.parents.iter().skip(1) {
            if let Some((key, _)) = by_oid.get_key_value(parent) {
                side_parents.insert(*key);
            }
        }
    }
    let mut goto_targets: HashSet<&Oid> = HashSet::new();
    let mut prev: Option<&Oid> = None;
    for node in &ordered {
        if let Some(fp) = node.parents.first() {
            if let Some((key, _)) = by_oid.get_key_value(fp) {
                if prev != Some(*key) {
                    goto_targets.insert(*key);
                }
            }
        }
        prev = Some(&node.oid);
    }
    let needs_label = |oid: &Oid| side_parents.contains(oid) || goto_targets.contains(oid);

    // Emit.
    let mut out = TodoList::new();
    out.push(Instruction::Label {
        name: LabelName::onto(),
    });
    let mut position = Position::Onto;
    for node in ordered {
        let base = match node.parents.first() {
            Some(fp) if by_oid.contains_key(fp) => Position::At(fp.clone()),
            _ => Position::Onto,
        };
        if position != base {
            let name = match &base {
                Position::Onto => LabelName::onto(),
                Position::At(oid) => LabelName::for_rewritten(&by_oid[oid].short),
            };
            out.push(Instruction::Goto { name });
        }
        if node.parents.len() > 1 {
            let parents = node
                .parents
                .iter()
                .skip(1)
                .map(|p| match by_oid.get(p) {
                    Some(side) => MergeParent::Label(LabelName::for_rewritten(&side.short)),
                    None => MergeParent::Commit(CommitRef::from(p)),
                })
                .collect();
            out.push(Instruction::Merge {
                message_from: Some(CommitRef::new(node.short.clone()).unwrap_or_else(|_| {
                    CommitRef::from(&node.oid)
                })),
                parents,
            });
        } else {
            out.push(Instruction::Pick {
                commit: CommitRef::new(node.short.clone())
                    .unwrap_or_else(|_| CommitRef::from(&node.oid)),
                subject: node.subject.clone(),
            });
        }
        position = Position::At(node.oid.clone());
        if needs_label(&node.oid) {
            out.push(Instruction::Label {
                name: LabelName::for_rewritten(&node.short),
            });
        }
    }

    collapse_adjacent_duplicates(out)
}

/// Depth-first ordering over first-parent chains; side branches of a merge
/// are placed before the merge itself.
fn order_chains<'a>(
    tip: &Oid,
    by_oid: &HashMap<&'a Oid, &'a CommitNode>,
    placed: &mut HashSet<&'a Oid>,
    ordered: &mut Vec<&'a CommitNode>,
) {
    let Some((tip_key, _)) = by_oid.get_key_value(tip) else {
        return;
    };
    if placed.contains(tip_key) {
        return;
    }

    // Walk the first-parent chain until it leaves the range or reaches an
    // already-placed commit.
    let mut chain: Vec<&CommitNode> = Vec::new();
    let mut cursor = *tip_key;
    loop {
        let node = by_oid[cursor];
        chain.push(node);
        match node.parents.first() {
            Some(fp) => match by_oid.get_key_value(fp) {
                Some((key, _)) if !placed.contains(*key) => cursor = *key,
                _ => break,
            },
            None => break,
        }
    }

    for node in chain.into_iter().rev() {
        for parent in node.parents.iter().skip(1) {
            order_chains(parent, by_oid, placed, ordered);
        }
        if let Some((key, _)) = by_oid.get_key_value(&node.oid) {
            if placed.insert(*key) {
                ordered.push(node);
            }
        }
    }
}

fn collapse_adjacent_duplicates(todo: TodoList) -> TodoList {
    let mut out = TodoList::new();
    let mut last: Option<String> = None;
    for line in todo.lines() {
        if last.as_deref() == Some(line.raw.as_str()) {
            continue;
        }
        last = Some(line.raw.clone());
        out.push_raw(line.raw.clone());
    }
    out
}
