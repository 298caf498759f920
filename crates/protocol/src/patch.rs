//! Typed model of a patch, one enum per grammar level.
//!
//! Source indices in a list patch always refer to the list as it was before
//! the patch started.

use serde::Serialize;

use crate::enums::{AttributeKind, Tag};
use crate::tree::{Attribute, Element, Node, Single};

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub enum PatchNode {
    Replace(Node),
    Single(PatchSingle),
    List(PatchList),
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub enum PatchSingle {
    Replace(Single),
    Element(PatchElement),
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub enum PatchElement {
    Replace(Element),
    /// Edit in place. `tag` must match the live element exactly.
    Patch { tag: Tag, common: PatchCommon },
}

/// Attribute edits followed by an optional children patch.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct PatchCommon {
    pub attributes: Vec<AttributePatch>,
    pub children: Option<PatchList>,
}

impl PatchCommon {
    pub fn is_empty(&self) -> bool {
        self.attributes.is_empty() && self.children.is_none()
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub enum AttributePatch {
    Remove(AttributeKind),
    Insert(Attribute),
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub enum PatchList {
    /// One op per slot of the new list.
    All(Vec<ListOp>),
    /// Truncate to `len`, then apply sparse edits in increasing index order.
    Entries { len: usize, entries: Vec<ListEntry> },
    /// Drop every node at or after the given length.
    Truncate(usize),
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub enum ListOp {
    Nop,
    Modify(PatchSingle),
    From(usize),
    FromModify(usize, PatchSingle),
    New(Single),
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ListEntry {
    pub index: usize,
    pub patch: PatchSingle,
}

impl PatchSingle {
    /// In-place element patch with no children patch.
    pub fn attributes(tag: Tag, attributes: Vec<AttributePatch>) -> Self {
        PatchSingle::Element(PatchElement::Patch {
            tag,
            common: PatchCommon {
                attributes,
                children: None,
            },
        })
    }

    /// In-place element patch that only touches children.
    pub fn children(tag: Tag, children: PatchList) -> Self {
        PatchSingle::Element(PatchElement::Patch {
            tag,
            common: PatchCommon {
                attributes: Vec::new(),
                children: Some(children),
            },
        })
    }
}
