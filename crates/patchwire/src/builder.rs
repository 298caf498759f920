//! Materializes host subtrees.

use patchwire_buffers::Cursor;
use patchwire_protocol::{Attribute, Decode, Element, Node, Single};
use tracing::warn;

use crate::bridge::EventBridge;
use crate::error::RenderError;
use crate::host::{Host, HostError};

/// The live root of a rendered tree.
#[derive(Debug, Clone, PartialEq)]
pub enum Mounted<N> {
    Single(N),
    List(Vec<N>),
}

impl<N: Clone> Mounted<N> {
    /// Nodes that belong directly under the mount point.
    pub fn nodes(&self) -> Vec<N> {
        match self {
            Mounted::Single(node) => vec![node.clone()],
            Mounted::List(nodes) => nodes.clone(),
        }
    }
}

/// Builds fresh host nodes and registers their handlers.
///
/// A build that fails partway releases what it already made, so a host
/// error leaves no orphaned nodes or listeners behind.
pub struct Builder<'a, H: Host> {
    host: &'a mut H,
    bridge: &'a mut EventBridge<H>,
}

impl<'a, H: Host> Builder<'a, H> {
    pub fn new(host: &'a mut H, bridge: &'a mut EventBridge<H>) -> Self {
        Self { host, bridge }
    }

    /// Decodes a `Node` at the cursor and builds it.
    pub fn decode_node(&mut self, cursor: &mut Cursor<'_>) -> Result<Mounted<H::Node>, RenderError> {
        let node = Node::decode(cursor)?;
        Ok(self.node(&node)?)
    }

    /// Decodes a `Single` at the cursor and builds it.
    pub fn decode_single(&mut self, cursor: &mut Cursor<'_>) -> Result<H::Node, RenderError> {
        let single = Single::decode(cursor)?;
        Ok(self.single(&single)?)
    }

    pub fn node(&mut self, node: &Node) -> Result<Mounted<H::Node>, HostError> {
        match node {
            Node::Single(single) => self.single(single).map(Mounted::Single),
            Node::List(items) => self.list(items).map(Mounted::List),
        }
    }

    pub fn list(&mut self, items: &[Single]) -> Result<Vec<H::Node>, HostError> {
        let mut nodes = Vec::with_capacity(items.len());
        for item in items {
            match self.single(item) {
                Ok(node) => nodes.push(node),
                Err(err) => {
                    self.abandon(&nodes);
                    return Err(err);
                }
            }
        }
        Ok(nodes)
    }

    pub fn single(&mut self, single: &Single) -> Result<H::Node, HostError> {
        match single {
            Single::Text(text) => self.host.create_text(text),
            Single::Element(element) => self.element(element),
        }
    }

    pub fn element(&mut self, element: &Element) -> Result<H::Node, HostError> {
        let node = self.host.create_element(element.tag)?;
        match self.fill(&node, element) {
            Ok(()) => Ok(node),
            Err(err) => {
                self.abandon(std::slice::from_ref(&node));
                Err(err)
            }
        }
    }

    fn fill(&mut self, node: &H::Node, element: &Element) -> Result<(), HostError> {
        for attr in &element.attributes {
            self.attribute(node, attr)?;
        }
        let children = self.list(&element.children)?;
        if !children.is_empty() {
            if let Err(err) = self.host.replace_children(node, &children) {
                self.abandon(&children);
                return Err(err);
            }
        }
        Ok(())
    }

    /// Releases the listeners of half-built nodes and discards them.
    fn abandon(&mut self, nodes: &[H::Node]) {
        for node in nodes {
            if let Err(err) = self.bridge.release_subtree(self.host, node) {
                warn!(%err, "could not release listeners of an abandoned node");
            }
            self.host.discard(node);
        }
    }

    /// Sets one attribute on a live element, registering handlers.
    pub fn attribute(&mut self, node: &H::Node, attr: &Attribute) -> Result<(), HostError> {
        match attr {
            Attribute::Id(id) => self.host.set_attribute(node, "id", id),
            Attribute::OnClick(_) | Attribute::OnPointerMove(_) => {
                if let Some((kind, handler)) = attr.handler() {
                    self.bridge.register(self.host, node, kind, handler)?;
                }
                Ok(())
            }
        }
    }
}
