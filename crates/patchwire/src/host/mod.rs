//! The document the tree is rendered into.
//!
//! [`Host`] is the narrow set of primitives the builder, the interpreter
//! and the event bridge need. [`MemoryDocument`] is an in-process arena
//! implementation; browser embedders provide one over the DOM.

mod memory;

pub use memory::{ListenerId, MemoryDocument, NodeId};

use std::fmt;
use std::hash::Hash;
use std::rc::Rc;

use patchwire_protocol::{Event, EventKind, Tag};
use thiserror::Error;

/// Listener body installed by the event bridge.
pub type Callback = Rc<dyn Fn(&Event)>;

/// Failure reported by a host primitive.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("{0}")]
pub struct HostError(pub String);

impl HostError {
    pub fn new(message: impl Into<String>) -> Self {
        HostError(message.into())
    }
}

/// Qualified name of a host element.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ElementName {
    pub namespace: String,
    pub local_name: String,
}

impl ElementName {
    pub fn of(tag: Tag) -> Self {
        Self {
            namespace: tag.namespace().to_owned(),
            local_name: tag.local_name().to_owned(),
        }
    }

    /// The protocol tag with exactly this name, if any.
    pub fn tag(&self) -> Option<Tag> {
        Tag::from_name(&self.namespace, &self.local_name)
    }
}

impl fmt::Display for ElementName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.tag() {
            Some(tag) => write!(f, "<{tag}>"),
            None => write!(f, "<{{{}}}{}>", self.namespace, self.local_name),
        }
    }
}

pub trait Host {
    /// Handle to a live node. Clones refer to the same node.
    type Node: Clone + PartialEq + fmt::Debug;
    /// Stable identity of a node for as long as it is alive.
    type Key: Copy + Eq + Hash + fmt::Debug;
    /// Token returned by [`Host::add_listener`].
    type Listener;

    fn create_text(&mut self, text: &str) -> Result<Self::Node, HostError>;

    /// Creates an element in the tag's namespace.
    fn create_element(&mut self, tag: Tag) -> Result<Self::Node, HostError>;

    /// Namespace and local name of an element, `None` for text.
    fn element_name(&self, node: &Self::Node) -> Option<ElementName>;

    /// Text of a text node, `None` for elements.
    fn text_content(&self, node: &Self::Node) -> Option<String>;

    fn attribute(&self, node: &Self::Node, name: &str) -> Option<String>;

    fn children(&self, node: &Self::Node) -> Result<Vec<Self::Node>, HostError>;

    /// Replaces the whole child list of `parent`, in order.
    fn replace_children(
        &mut self,
        parent: &Self::Node,
        children: &[Self::Node],
    ) -> Result<(), HostError>;

    fn set_attribute(&mut self, node: &Self::Node, name: &str, value: &str)
        -> Result<(), HostError>;

    fn remove_attribute(&mut self, node: &Self::Node, name: &str) -> Result<(), HostError>;

    fn key(&self, node: &Self::Node) -> Result<Self::Key, HostError>;

    fn add_listener(
        &mut self,
        node: &Self::Node,
        kind: EventKind,
        callback: Callback,
    ) -> Result<Self::Listener, HostError>;

    fn remove_listener(
        &mut self,
        node: &Self::Node,
        kind: EventKind,
        listener: Self::Listener,
    ) -> Result<(), HostError>;

    /// Called once for every node dropped from the tree, after its
    /// listeners are gone.
    fn discard(&mut self, node: &Self::Node);

    /// Makes `nodes` the content of the mount point.
    fn mount(&mut self, nodes: &[Self::Node]) -> Result<(), HostError>;
}
