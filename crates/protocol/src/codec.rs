//! Binary codec for trees and patches.
//!
//! Every selector is a `u32` tag, every count and index a `u64`. Lists are
//! count-prefixed. The decoder never trusts a count for preallocation beyond
//! the bytes actually left in the buffer.
//!
//! Every element and every element patch opens one [`Cursor::nested`] level,
//! so a hostile message fails with a framing error instead of exhausting the
//! stack.

use patchwire_buffers::{Cursor, Writer};

use crate::enums::{
    AttributeEditTag, AttributeKind, ListOpTag, NodeTag, PatchListTag, PatchNodeTag,
    PatchSingleTag, SingleTag, Tag, PATCH_ELEMENT_REPLACE,
};
use crate::error::DecodeError;
use crate::patch::{
    AttributePatch, ListEntry, ListOp, PatchCommon, PatchElement, PatchList, PatchNode,
    PatchSingle,
};
use crate::tree::{Attribute, AttributeList, Element, HandlerId, Node, Single};

/// A value that can be read from a [`Cursor`].
pub trait Decode: Sized {
    fn decode(cursor: &mut Cursor<'_>) -> Result<Self, DecodeError>;
}

/// A value that can be written to a [`Writer`].
pub trait Encode {
    fn encode(&self, writer: &mut Writer);
}

fn tag<T>(
    cursor: &mut Cursor<'_>,
    grammar: &'static str,
    from_u32: fn(u32) -> Option<T>,
) -> Result<T, DecodeError> {
    let raw = cursor.u32()?;
    from_u32(raw).ok_or(DecodeError::unknown(grammar, raw))
}

fn decode_seq<T: Decode>(cursor: &mut Cursor<'_>) -> Result<Vec<T>, DecodeError> {
    let count = cursor.len_prefix()?;
    let mut out = Vec::with_capacity(count.min(cursor.remaining()));
    for _ in 0..count {
        out.push(T::decode(cursor)?);
    }
    Ok(out)
}

fn encode_seq<T: Encode>(writer: &mut Writer, items: &[T]) {
    writer.len_prefix(items.len());
    for item in items {
        item.encode(writer);
    }
}

// ── Tree ─────────────────────────────────────────────────────────────────

impl Decode for Tag {
    fn decode(cursor: &mut Cursor<'_>) -> Result<Self, DecodeError> {
        tag(cursor, "element", Tag::from_u32)
    }
}

impl Encode for Tag {
    fn encode(&self, writer: &mut Writer) {
        writer.u32(self.as_u32());
    }
}

impl Decode for AttributeKind {
    fn decode(cursor: &mut Cursor<'_>) -> Result<Self, DecodeError> {
        tag(cursor, "attribute", AttributeKind::from_u32)
    }
}

impl Encode for AttributeKind {
    fn encode(&self, writer: &mut Writer) {
        writer.u32(self.as_u32());
    }
}

impl Decode for HandlerId {
    fn decode(cursor: &mut Cursor<'_>) -> Result<Self, DecodeError> {
        Ok(HandlerId(cursor.array()?))
    }
}

impl Encode for HandlerId {
    fn encode(&self, writer: &mut Writer) {
        writer.buf(self.as_bytes());
    }
}

impl Decode for Attribute {
    fn decode(cursor: &mut Cursor<'_>) -> Result<Self, DecodeError> {
        Ok(match AttributeKind::decode(cursor)? {
            AttributeKind::Id => Attribute::Id(cursor.string()?),
            AttributeKind::OnClick => Attribute::OnClick(HandlerId::decode(cursor)?),
            AttributeKind::OnPointerMove => Attribute::OnPointerMove(HandlerId::decode(cursor)?),
        })
    }
}

impl Encode for Attribute {
    fn encode(&self, writer: &mut Writer) {
        self.kind().encode(writer);
        match self {
            Attribute::Id(id) => writer.str(id),
            Attribute::OnClick(handler) | Attribute::OnPointerMove(handler) => {
                handler.encode(writer)
            }
        }
    }
}

impl Decode for AttributeList {
    fn decode(cursor: &mut Cursor<'_>) -> Result<Self, DecodeError> {
        let count = cursor.len_prefix()?;
        let mut list = AttributeList::new();
        for _ in 0..count {
            list.insert(Attribute::decode(cursor)?);
        }
        Ok(list)
    }
}

impl Encode for AttributeList {
    fn encode(&self, writer: &mut Writer) {
        writer.len_prefix(self.len());
        for attr in self {
            attr.encode(writer);
        }
    }
}

impl Decode for Element {
    fn decode(cursor: &mut Cursor<'_>) -> Result<Self, DecodeError> {
        cursor.nested(|cursor| {
            let tag = Tag::decode(cursor)?;
            let attributes = AttributeList::decode(cursor)?;
            let children = decode_seq(cursor)?;
            Ok(Element {
                tag,
                attributes,
                children,
            })
        })
    }
}

impl Encode for Element {
    fn encode(&self, writer: &mut Writer) {
        self.tag.encode(writer);
        self.attributes.encode(writer);
        encode_seq(writer, &self.children);
    }
}

impl Decode for Single {
    fn decode(cursor: &mut Cursor<'_>) -> Result<Self, DecodeError> {
        Ok(match tag(cursor, "single", SingleTag::from_u32)? {
            SingleTag::Text => Single::Text(cursor.string()?),
            SingleTag::Element => Single::Element(Element::decode(cursor)?),
        })
    }
}

impl Encode for Single {
    fn encode(&self, writer: &mut Writer) {
        match self {
            Single::Text(text) => {
                writer.u32(SingleTag::Text.as_u32());
                writer.str(text);
            }
            Single::Element(element) => {
                writer.u32(SingleTag::Element.as_u32());
                element.encode(writer);
            }
        }
    }
}

impl Decode for Node {
    fn decode(cursor: &mut Cursor<'_>) -> Result<Self, DecodeError> {
        Ok(match tag(cursor, "node", NodeTag::from_u32)? {
            NodeTag::Single => Node::Single(Single::decode(cursor)?),
            NodeTag::List => Node::List(decode_seq(cursor)?),
        })
    }
}

impl Encode for Node {
    fn encode(&self, writer: &mut Writer) {
        match self {
            Node::Single(single) => {
                writer.u32(NodeTag::Single.as_u32());
                single.encode(writer);
            }
            Node::List(items) => {
                writer.u32(NodeTag::List.as_u32());
                encode_seq(writer, items);
            }
        }
    }
}

// ── Patch ────────────────────────────────────────────────────────────────

impl Decode for PatchNode {
    fn decode(cursor: &mut Cursor<'_>) -> Result<Self, DecodeError> {
        Ok(match tag(cursor, "patch node", PatchNodeTag::from_u32)? {
            PatchNodeTag::Replace => PatchNode::Replace(Node::decode(cursor)?),
            PatchNodeTag::Single => PatchNode::Single(PatchSingle::decode(cursor)?),
            PatchNodeTag::List => PatchNode::List(PatchList::decode(cursor)?),
        })
    }
}

impl Encode for PatchNode {
    fn encode(&self, writer: &mut Writer) {
        match self {
            PatchNode::Replace(node) => {
                writer.u32(PatchNodeTag::Replace.as_u32());
                node.encode(writer);
            }
            PatchNode::Single(patch) => {
                writer.u32(PatchNodeTag::Single.as_u32());
                patch.encode(writer);
            }
            PatchNode::List(patch) => {
                writer.u32(PatchNodeTag::List.as_u32());
                patch.encode(writer);
            }
        }
    }
}

impl Decode for PatchSingle {
    fn decode(cursor: &mut Cursor<'_>) -> Result<Self, DecodeError> {
        Ok(match tag(cursor, "patch single", PatchSingleTag::from_u32)? {
            PatchSingleTag::Replace => PatchSingle::Replace(Single::decode(cursor)?),
            PatchSingleTag::Element => PatchSingle::Element(PatchElement::decode(cursor)?),
        })
    }
}

impl Encode for PatchSingle {
    fn encode(&self, writer: &mut Writer) {
        match self {
            PatchSingle::Replace(single) => {
                writer.u32(PatchSingleTag::Replace.as_u32());
                single.encode(writer);
            }
            PatchSingle::Element(patch) => {
                writer.u32(PatchSingleTag::Element.as_u32());
                patch.encode(writer);
            }
        }
    }
}

impl Decode for PatchElement {
    fn decode(cursor: &mut Cursor<'_>) -> Result<Self, DecodeError> {
        let raw = cursor.u32()?;
        if raw == PATCH_ELEMENT_REPLACE {
            return Ok(PatchElement::Replace(Element::decode(cursor)?));
        }
        let tag = Tag::from_u32(raw - 1).ok_or(DecodeError::unknown("patch element", raw))?;
        Ok(PatchElement::Patch {
            tag,
            common: PatchCommon::decode(cursor)?,
        })
    }
}

impl Encode for PatchElement {
    fn encode(&self, writer: &mut Writer) {
        match self {
            PatchElement::Replace(element) => {
                writer.u32(PATCH_ELEMENT_REPLACE);
                element.encode(writer);
            }
            PatchElement::Patch { tag, common } => {
                writer.u32(tag.as_u32() + 1);
                common.encode(writer);
            }
        }
    }
}

impl Decode for AttributePatch {
    fn decode(cursor: &mut Cursor<'_>) -> Result<Self, DecodeError> {
        Ok(match tag(cursor, "attribute edit", AttributeEditTag::from_u32)? {
            AttributeEditTag::Remove => AttributePatch::Remove(AttributeKind::decode(cursor)?),
            AttributeEditTag::Insert => AttributePatch::Insert(Attribute::decode(cursor)?),
        })
    }
}

impl Encode for AttributePatch {
    fn encode(&self, writer: &mut Writer) {
        match self {
            AttributePatch::Remove(kind) => {
                writer.u32(AttributeEditTag::Remove.as_u32());
                kind.encode(writer);
            }
            AttributePatch::Insert(attr) => {
                writer.u32(AttributeEditTag::Insert.as_u32());
                attr.encode(writer);
            }
        }
    }
}

impl Decode for PatchCommon {
    fn decode(cursor: &mut Cursor<'_>) -> Result<Self, DecodeError> {
        cursor.nested(|cursor| {
            let attributes = decode_seq(cursor)?;
            let children = cursor.optional(PatchList::decode)?;
            Ok(PatchCommon {
                attributes,
                children,
            })
        })
    }
}

impl Encode for PatchCommon {
    fn encode(&self, writer: &mut Writer) {
        encode_seq(writer, &self.attributes);
        writer.optional(self.children.as_ref(), |w, children| children.encode(w));
    }
}

impl Decode for PatchList {
    fn decode(cursor: &mut Cursor<'_>) -> Result<Self, DecodeError> {
        Ok(match tag(cursor, "patch list", PatchListTag::from_u32)? {
            PatchListTag::All => PatchList::All(decode_seq(cursor)?),
            PatchListTag::Entries => {
                let len = cursor.len_prefix()?;
                let entries = decode_seq(cursor)?;
                PatchList::Entries { len, entries }
            }
            PatchListTag::Truncate => PatchList::Truncate(cursor.len_prefix()?),
        })
    }
}

impl Encode for PatchList {
    fn encode(&self, writer: &mut Writer) {
        match self {
            PatchList::All(ops) => {
                writer.u32(PatchListTag::All.as_u32());
                encode_seq(writer, ops);
            }
            PatchList::Entries { len, entries } => {
                writer.u32(PatchListTag::Entries.as_u32());
                writer.len_prefix(*len);
                encode_seq(writer, entries);
            }
            PatchList::Truncate(len) => {
                writer.u32(PatchListTag::Truncate.as_u32());
                writer.len_prefix(*len);
            }
        }
    }
}

impl Decode for ListOp {
    fn decode(cursor: &mut Cursor<'_>) -> Result<Self, DecodeError> {
        Ok(match tag(cursor, "list op", ListOpTag::from_u32)? {
            ListOpTag::Nop => ListOp::Nop,
            ListOpTag::Modify => ListOp::Modify(PatchSingle::decode(cursor)?),
            ListOpTag::From => ListOp::From(cursor.len_prefix()?),
            ListOpTag::FromModify => {
                let index = cursor.len_prefix()?;
                ListOp::FromModify(index, PatchSingle::decode(cursor)?)
            }
            ListOpTag::New => ListOp::New(Single::decode(cursor)?),
        })
    }
}

impl Encode for ListOp {
    fn encode(&self, writer: &mut Writer) {
        match self {
            ListOp::Nop => writer.u32(ListOpTag::Nop.as_u32()),
            ListOp::Modify(patch) => {
                writer.u32(ListOpTag::Modify.as_u32());
                patch.encode(writer);
            }
            ListOp::From(index) => {
                writer.u32(ListOpTag::From.as_u32());
                writer.len_prefix(*index);
            }
            ListOp::FromModify(index, patch) => {
                writer.u32(ListOpTag::FromModify.as_u32());
                writer.len_prefix(*index);
                patch.encode(writer);
            }
            ListOp::New(single) => {
                writer.u32(ListOpTag::New.as_u32());
                single.encode(writer);
            }
        }
    }
}

impl Decode for ListEntry {
    fn decode(cursor: &mut Cursor<'_>) -> Result<Self, DecodeError> {
        let index = cursor.len_prefix()?;
        let patch = PatchSingle::decode(cursor)?;
        Ok(ListEntry { index, patch })
    }
}

impl Encode for ListEntry {
    fn encode(&self, writer: &mut Writer) {
        writer.len_prefix(self.index);
        self.patch.encode(writer);
    }
}
