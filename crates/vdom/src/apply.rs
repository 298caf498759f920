//! Reference implementation of patch application over plain data.
//!
//! Same rules as the live interpreter, with none of its host plumbing.
//! On error the target may be left partially patched.

use patchwire_protocol::{
    AttributePatch, Element, ListOp, Node, PatchElement, PatchList, PatchNode, PatchSingle,
    Single, Tag,
};
use thiserror::Error;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ApplyError {
    #[error("expected a single node")]
    NotSingle,
    #[error("expected a list")]
    NotList,
    #[error("expected an element")]
    NotElement,
    #[error("expected <{expected}>, found <{found}>")]
    TagMismatch { expected: Tag, found: Tag },
    #[error("source index {index} out of bounds for length {len}")]
    SourceOutOfBounds { index: usize, len: usize },
    #[error("source index {index} taken twice")]
    SourceTaken { index: usize },
    #[error("in-place op at {index} past length {len}")]
    NopOutOfBounds { index: usize, len: usize },
    #[error("entry index {index} does not follow {previous}")]
    EntryOrder { index: usize, previous: usize },
    #[error("entry index {index} leaves a gap after length {len}")]
    EntryGap { index: usize, len: usize },
    #[error("entry {index} patches a missing element")]
    EntryNotElement { index: usize },
    #[error("entries produced length {actual}, expected {expected}")]
    EntryLength { expected: usize, actual: usize },
    #[error("cannot truncate length {current} to {len}")]
    TruncateBeyondEnd { len: usize, current: usize },
}

pub fn apply_node(node: &mut Node, patch: &PatchNode) -> Result<(), ApplyError> {
    match (patch, node) {
        (PatchNode::Replace(new), node) => {
            *node = new.clone();
            Ok(())
        }
        (PatchNode::Single(patch), Node::Single(single)) => apply_single(single, patch),
        (PatchNode::List(patch), Node::List(items)) => apply_list(items, patch),
        (PatchNode::Single(_), Node::List(_)) => Err(ApplyError::NotSingle),
        (PatchNode::List(_), Node::Single(_)) => Err(ApplyError::NotList),
    }
}

pub fn apply_single(single: &mut Single, patch: &PatchSingle) -> Result<(), ApplyError> {
    match (patch, single) {
        (PatchSingle::Replace(new), single) => {
            *single = new.clone();
            Ok(())
        }
        (PatchSingle::Element(patch), Single::Element(element)) => apply_element(element, patch),
        (PatchSingle::Element(_), Single::Text(_)) => Err(ApplyError::NotElement),
    }
}

pub fn apply_element(element: &mut Element, patch: &PatchElement) -> Result<(), ApplyError> {
    match patch {
        PatchElement::Replace(new) => {
            *element = new.clone();
            Ok(())
        }
        PatchElement::Patch { tag, common } => {
            if element.tag != *tag {
                return Err(ApplyError::TagMismatch {
                    expected: *tag,
                    found: element.tag,
                });
            }
            for edit in &common.attributes {
                match edit {
                    AttributePatch::Remove(kind) => {
                        element.attributes.remove(*kind);
                    }
                    AttributePatch::Insert(attr) => {
                        element.attributes.insert(attr.clone());
                    }
                }
            }
            match &common.children {
                Some(children) => apply_list(&mut element.children, children),
                None => Ok(()),
            }
        }
    }
}

pub fn apply_list(items: &mut Vec<Single>, patch: &PatchList) -> Result<(), ApplyError> {
    match patch {
        PatchList::All(ops) => {
            let len = items.len();
            let mut sources: Vec<Option<Single>> = items.drain(..).map(Some).collect();
            let mut take = |index: usize, in_place: bool| -> Result<Single, ApplyError> {
                match sources.get_mut(index) {
                    Some(slot) => slot.take().ok_or(ApplyError::SourceTaken { index }),
                    None if in_place => Err(ApplyError::NopOutOfBounds { index, len }),
                    None => Err(ApplyError::SourceOutOfBounds { index, len }),
                }
            };
            for (position, op) in ops.iter().enumerate() {
                let item = match op {
                    ListOp::Nop => take(position, true)?,
                    ListOp::Modify(patch) => {
                        let mut item = take(position, true)?;
                        apply_single(&mut item, patch)?;
                        item
                    }
                    ListOp::From(index) => take(*index, false)?,
                    ListOp::FromModify(index, patch) => {
                        let mut item = take(*index, false)?;
                        apply_single(&mut item, patch)?;
                        item
                    }
                    ListOp::New(single) => single.clone(),
                };
                items.push(item);
            }
            Ok(())
        }
        PatchList::Entries { len, entries } => {
            items.truncate(*len);
            let mut previous: Option<usize> = None;
            for entry in entries {
                let index = entry.index;
                if let Some(previous) = previous.filter(|p| index <= *p) {
                    return Err(ApplyError::EntryOrder { index, previous });
                }
                previous = Some(index);
                if let Some(item) = items.get_mut(index) {
                    apply_single(item, &entry.patch)?;
                } else if index == items.len() {
                    let PatchSingle::Replace(single) = &entry.patch else {
                        return Err(ApplyError::EntryNotElement { index });
                    };
                    items.push(single.clone());
                } else {
                    return Err(ApplyError::EntryGap {
                        index,
                        len: items.len(),
                    });
                }
            }
            if items.len() != *len {
                return Err(ApplyError::EntryLength {
                    expected: *len,
                    actual: items.len(),
                });
            }
            Ok(())
        }
        PatchList::Truncate(len) => {
            if *len > items.len() {
                return Err(ApplyError::TruncateBeyondEnd {
                    len: *len,
                    current: items.len(),
                });
            }
            items.truncate(*len);
            Ok(())
        }
    }
}
