//! patchwire-protocol - wire grammar of the patchwire remote-rendering protocol.
//!
//! A rendering core sends a tree once, then a stream of patches that replay
//! the core's own diff against the tree the client already holds. The client
//! answers with fixed-layout event records. This crate holds the typed model
//! of all three messages and their little-endian binary codec.
//!
//! ```
//! use patchwire_protocol::{decode_message, encode_message, Element, Node, Single, Tag};
//!
//! let tree = Node::from(Element::new(Tag::Div).with_child(Single::text("hello")));
//! let bytes = encode_message(&tree);
//! assert_eq!(decode_message::<Node>(&bytes), Ok(tree));
//! ```

pub mod codec;
pub mod enums;
pub mod error;
pub mod event;
pub mod patch;
pub mod tree;

pub use codec::{Decode, Encode};
pub use enums::{AttributeKind, EventKind, Tag};
pub use error::DecodeError;
pub use event::{Event, EventRecord};
pub use patch::{
    AttributePatch, ListEntry, ListOp, PatchCommon, PatchElement, PatchList, PatchNode,
    PatchSingle,
};
pub use tree::{Attribute, AttributeList, Element, HandlerId, Node, Single, XHTML_NAMESPACE};

pub use patchwire_buffers::DEFAULT_MAX_DEPTH;

use patchwire_buffers::{Cursor, Writer};

/// Decodes one complete top-level message. Trailing bytes are an error.
///
/// Elements may nest at most [`DEFAULT_MAX_DEPTH`] levels deep.
pub fn decode_message<T: Decode>(data: &[u8]) -> Result<T, DecodeError> {
    decode_message_with_depth(data, DEFAULT_MAX_DEPTH)
}

/// Like [`decode_message`], with an explicit nesting limit.
pub fn decode_message_with_depth<T: Decode>(
    data: &[u8],
    max_depth: usize,
) -> Result<T, DecodeError> {
    let mut cursor = Cursor::new(data).with_max_depth(max_depth);
    let value = T::decode(&mut cursor)?;
    cursor.end()?;
    Ok(value)
}

/// Encodes one top-level message.
pub fn encode_message<T: Encode + ?Sized>(value: &T) -> Vec<u8> {
    let mut writer = Writer::new();
    value.encode(&mut writer);
    writer.into_vec()
}

/// The rendering core on the other side of the wire.
///
/// Implementations own all application state. The client only ever asks
/// for bytes and hands event records back; it never calls into the core
/// from inside [`Core::handle_event`].
pub trait Core {
    /// Full tree, encoded as a `Node` message.
    fn produce_initial(&mut self) -> Vec<u8>;

    /// Patch against the last produced tree, encoded as a `PatchNode`
    /// message, or `None` when nothing changed.
    fn produce_patch(&mut self) -> Option<Vec<u8>>;

    /// Receives one event record.
    fn handle_event(&mut self, record: &[u8]);
}

impl<C: Core + ?Sized> Core for Box<C> {
    fn produce_initial(&mut self) -> Vec<u8> {
        (**self).produce_initial()
    }

    fn produce_patch(&mut self) -> Option<Vec<u8>> {
        (**self).produce_patch()
    }

    fn handle_event(&mut self, record: &[u8]) {
        (**self).handle_event(record)
    }
}
