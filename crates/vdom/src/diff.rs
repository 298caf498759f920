//! Tree differ.
//!
//! Siblings are matched by their `Id` attribute when they carry one and in
//! order otherwise. Siblings sharing an `Id` pair up in order too. A matched pair that would need a wholesale replacement
//! is emitted as a fresh node instead, leaving the old one to be dropped.

use std::collections::{HashMap, VecDeque};

use patchwire_protocol::{
    AttributeKind, AttributePatch, Element, ListEntry, ListOp, Node, PatchCommon, PatchElement,
    PatchList, PatchNode, PatchSingle, Single,
};

/// Patch turning `old` into `new`, or `None` if they are equal.
pub fn diff_node(old: &Node, new: &Node) -> Option<PatchNode> {
    match (old, new) {
        (Node::Single(old), Node::Single(new)) => diff_single(old, new).map(PatchNode::Single),
        (Node::List(old), Node::List(new)) => diff_list(old, new).map(PatchNode::List),
        _ => Some(PatchNode::Replace(new.clone())),
    }
}

pub fn diff_single(old: &Single, new: &Single) -> Option<PatchSingle> {
    match (old, new) {
        (Single::Text(a), Single::Text(b)) if a == b => None,
        (Single::Element(old), Single::Element(new)) => {
            diff_element(old, new).map(PatchSingle::Element)
        }
        _ => Some(PatchSingle::Replace(new.clone())),
    }
}

pub fn diff_element(old: &Element, new: &Element) -> Option<PatchElement> {
    if old.tag != new.tag {
        return Some(PatchElement::Replace(new.clone()));
    }
    let common = diff_common(old, new);
    if common.is_empty() {
        None
    } else {
        Some(PatchElement::Patch {
            tag: new.tag,
            common,
        })
    }
}

fn diff_common(old: &Element, new: &Element) -> PatchCommon {
    let mut attributes = Vec::new();
    for kind in [AttributeKind::Id, AttributeKind::OnClick, AttributeKind::OnPointerMove] {
        match (old.attributes.get(kind), new.attributes.get(kind)) {
            (Some(a), Some(b)) if a == b => {}
            (_, Some(b)) => attributes.push(AttributePatch::Insert(b.clone())),
            (Some(_), None) => attributes.push(AttributePatch::Remove(kind)),
            (None, None) => {}
        }
    }
    PatchCommon {
        attributes,
        children: diff_list(&old.children, &new.children),
    }
}

/// Patch turning the sibling list `old` into `new`.
///
/// Emits `Entries` when nothing moved and at least half the slots are
/// untouched, `Truncate` when that leaves no edits but the list shrank, and
/// `All` otherwise.
pub fn diff_list(old: &[Single], new: &[Single]) -> Option<PatchList> {
    let ops = match_siblings(old, new);

    let untouched = ops.iter().filter(|op| matches!(op, ListOp::Nop)).count();
    if untouched == new.len() && new.len() == old.len() {
        return None;
    }
    let moved = ops
        .iter()
        .any(|op| matches!(op, ListOp::From(_) | ListOp::FromModify(..)));
    if moved || untouched < new.len().div_ceil(2) {
        return Some(PatchList::All(ops));
    }

    let entries: Vec<ListEntry> = ops
        .into_iter()
        .enumerate()
        .filter_map(|(index, op)| match op {
            ListOp::Nop => None,
            ListOp::Modify(patch) => Some(ListEntry { index, patch }),
            ListOp::New(single) => Some(ListEntry {
                index,
                patch: PatchSingle::Replace(single),
            }),
            ListOp::From(_) | ListOp::FromModify(..) => None,
        })
        .collect();
    if entries.is_empty() {
        return (new.len() < old.len()).then_some(PatchList::Truncate(new.len()));
    }
    Some(PatchList::Entries {
        len: new.len(),
        entries,
    })
}

fn match_siblings(old: &[Single], new: &[Single]) -> Vec<ListOp> {
    let mut keyed: HashMap<&str, VecDeque<usize>> = HashMap::new();
    let mut unkeyed = Vec::new();
    for (index, item) in old.iter().enumerate() {
        match item.key() {
            Some(key) => keyed.entry(key).or_default().push_back(index),
            None => unkeyed.push(index),
        }
    }
    let mut unkeyed = unkeyed.into_iter();

    let mut ops = Vec::with_capacity(new.len());
    for (position, item) in new.iter().enumerate() {
        let source = match item.key() {
            Some(key) => keyed.get_mut(key).and_then(VecDeque::pop_front),
            None => unkeyed.next(),
        };
        let Some(index) = source else {
            ops.push(ListOp::New(item.clone()));
            continue;
        };
        let op = match diff_single(&old[index], item) {
            Some(PatchSingle::Replace(_)) => ListOp::New(item.clone()),
            None if index == position => ListOp::Nop,
            None => ListOp::From(index),
            Some(patch) if index == position => ListOp::Modify(patch),
            Some(patch) => ListOp::FromModify(index, patch),
        };
        ops.push(op);
    }
    ops
}
