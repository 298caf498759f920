//! Read-only validation of a decoded patch against the live tree.
//!
//! Runs every shape assertion the apply pass would make, without touching
//! the host, so a patch that cannot be applied leaves the tree as it was.

use patchwire_protocol::{ListOp, PatchElement, PatchList, PatchNode, PatchSingle};

use crate::builder::Mounted;
use crate::error::{Mismatch, RenderError};
use crate::host::Host;

pub fn check_node<H: Host>(
    host: &H,
    root: &Mounted<H::Node>,
    patch: &PatchNode,
) -> Result<(), RenderError> {
    match (patch, root) {
        (PatchNode::Replace(_), _) => Ok(()),
        (PatchNode::Single(patch), Mounted::Single(node)) => check_single(host, node, patch),
        (PatchNode::Single(_), Mounted::List(_)) => Err(Mismatch::NotSingle.into()),
        (PatchNode::List(patch), Mounted::List(nodes)) => check_list(host, nodes, patch),
        (PatchNode::List(_), Mounted::Single(_)) => Err(Mismatch::NotList.into()),
    }
}

pub fn check_single<H: Host>(
    host: &H,
    node: &H::Node,
    patch: &PatchSingle,
) -> Result<(), RenderError> {
    let PatchSingle::Element(patch) = patch else {
        return Ok(());
    };
    let name = host.element_name(node).ok_or(Mismatch::NotElement)?;
    match patch {
        PatchElement::Replace(_) => Ok(()),
        PatchElement::Patch { tag, common } => {
            if name.tag() != Some(*tag) {
                return Err(Mismatch::TagMismatch {
                    expected: *tag,
                    found: name.to_string(),
                }
                .into());
            }
            match &common.children {
                Some(children) => check_list(host, &host.children(node)?, children),
                None => Ok(()),
            }
        }
    }
}

pub fn check_list<H: Host>(
    host: &H,
    nodes: &[H::Node],
    patch: &PatchList,
) -> Result<(), RenderError> {
    match patch {
        PatchList::All(ops) => {
            let mut taken = vec![false; nodes.len()];
            for (position, op) in ops.iter().enumerate() {
                let (index, modify) = match op {
                    ListOp::New(_) => continue,
                    ListOp::Nop => (position, None),
                    ListOp::Modify(patch) => (position, Some(patch)),
                    ListOp::From(index) => (*index, None),
                    ListOp::FromModify(index, patch) => (*index, Some(patch)),
                };
                let Some(slot) = taken.get_mut(index) else {
                    let len = nodes.len();
                    return Err(match op {
                        ListOp::Nop | ListOp::Modify(_) => Mismatch::NopOutOfBounds { index, len },
                        _ => Mismatch::SourceOutOfBounds { index, len },
                    }
                    .into());
                };
                if *slot {
                    return Err(Mismatch::SourceTaken { index }.into());
                }
                *slot = true;
                if let Some(patch) = modify {
                    check_single(host, &nodes[index], patch)?;
                }
            }
            Ok(())
        }
        PatchList::Entries { len, entries } => {
            let mut current = nodes.len().min(*len);
            let mut previous: Option<usize> = None;
            for entry in entries {
                let index = entry.index;
                if let Some(previous) = previous.filter(|p| index <= *p) {
                    return Err(Mismatch::EntryOrder { index, previous }.into());
                }
                previous = Some(index);
                if index < current {
                    check_single(host, &nodes[index], &entry.patch)?;
                } else if index == current {
                    if !matches!(entry.patch, PatchSingle::Replace(_)) {
                        return Err(Mismatch::EntryNotElement { index }.into());
                    }
                    current += 1;
                } else {
                    return Err(Mismatch::EntryGap {
                        index,
                        len: current,
                    }
                    .into());
                }
            }
            if current != *len {
                return Err(Mismatch::EntryLength {
                    expected: *len,
                    actual: current,
                }
                .into());
            }
            Ok(())
        }
        PatchList::Truncate(len) => {
            if *len > nodes.len() {
                return Err(Mismatch::TruncateBeyondEnd {
                    len: *len,
                    current: nodes.len(),
                }
                .into());
            }
            Ok(())
        }
    }
}
