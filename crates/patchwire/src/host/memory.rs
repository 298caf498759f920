//! Arena-backed document for tests and native embedders.

use std::collections::BTreeMap;

use patchwire_protocol::{Event, EventKind, Tag};

use super::{Callback, ElementName, Host, HostError};

/// Index of a node in a [`MemoryDocument`]. Slots are never reused.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct NodeId(usize);

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ListenerId(u64);

enum Content {
    Text(String),
    Element {
        tag: Tag,
        attributes: BTreeMap<String, String>,
        children: Vec<NodeId>,
    },
}

struct Listener {
    id: ListenerId,
    kind: EventKind,
    callback: Callback,
}

struct Slot {
    content: Content,
    listeners: Vec<Listener>,
}

/// An in-memory document.
///
/// Like a browser, it allows any number of listeners per node and event
/// kind. Discarded nodes are freed together with their descendants.
#[derive(Default)]
pub struct MemoryDocument {
    slots: Vec<Option<Slot>>,
    mounted: Vec<NodeId>,
    next_listener: u64,
    create_budget: Option<usize>,
    mounts: usize,
}

impl MemoryDocument {
    pub fn new() -> Self {
        Self::default()
    }

    fn slot(&self, node: NodeId) -> Result<&Slot, HostError> {
        self.slots
            .get(node.0)
            .and_then(Option::as_ref)
            .ok_or_else(|| HostError::new(format!("node {} is not alive", node.0)))
    }

    fn slot_mut(&mut self, node: NodeId) -> Result<&mut Slot, HostError> {
        self.slots
            .get_mut(node.0)
            .and_then(Option::as_mut)
            .ok_or_else(|| HostError::new(format!("node {} is not alive", node.0)))
    }

    fn attributes_mut(&mut self, node: NodeId) -> Result<&mut BTreeMap<String, String>, HostError> {
        match &mut self.slot_mut(node)?.content {
            Content::Element { attributes, .. } => Ok(attributes),
            Content::Text(_) => Err(HostError::new("text nodes have no attributes")),
        }
    }

    fn alloc(&mut self, content: Content) -> Result<NodeId, HostError> {
        if let Some(budget) = &mut self.create_budget {
            if *budget == 0 {
                return Err(HostError::new("node creation limit reached"));
            }
            *budget -= 1;
        }
        self.slots.push(Some(Slot {
            content,
            listeners: Vec::new(),
        }));
        Ok(NodeId(self.slots.len() - 1))
    }

    /// Makes every node creation after the next `remaining` ones fail.
    pub fn limit_creates(&mut self, remaining: usize) {
        self.create_budget = Some(remaining);
    }

    pub fn unlimit_creates(&mut self) {
        self.create_budget = None;
    }

    /// Content of the mount point.
    pub fn mounted(&self) -> &[NodeId] {
        &self.mounted
    }

    /// How many times the mount point content was set.
    pub fn mount_count(&self) -> usize {
        self.mounts
    }

    pub fn is_alive(&self, node: NodeId) -> bool {
        self.slot(node).is_ok()
    }

    /// Number of nodes that have not been discarded.
    pub fn live_nodes(&self) -> usize {
        self.slots.iter().flatten().count()
    }

    pub fn listener_count(&self, node: NodeId, kind: EventKind) -> usize {
        self.slot(node)
            .map(|slot| slot.listeners.iter().filter(|l| l.kind == kind).count())
            .unwrap_or(0)
    }

    pub fn total_listeners(&self) -> usize {
        self.slots.iter().flatten().map(|slot| slot.listeners.len()).sum()
    }

    /// Fires `event` on `node`. Returns how many listeners ran.
    pub fn dispatch(&self, node: NodeId, event: &Event) -> usize {
        let callbacks: Vec<Callback> = match self.slot(node) {
            Ok(slot) => slot
                .listeners
                .iter()
                .filter(|l| l.kind == event.kind())
                .map(|l| l.callback.clone())
                .collect(),
            Err(_) => return 0,
        };
        for callback in &callbacks {
            callback(event);
        }
        callbacks.len()
    }

    /// Renders a node as indented markup, handy in assertion messages.
    pub fn to_markup(&self, node: NodeId) -> String {
        let mut out = String::new();
        self.write_markup(node, &mut out);
        out
    }

    fn write_markup(&self, node: NodeId, out: &mut String) {
        let Ok(slot) = self.slot(node) else {
            out.push_str("<!-- freed -->");
            return;
        };
        match &slot.content {
            Content::Text(text) => out.push_str(text),
            Content::Element {
                tag,
                attributes,
                children,
            } => {
                out.push('<');
                out.push_str(tag.local_name());
                for (name, value) in attributes {
                    out.push_str(&format!(" {name}=\"{value}\""));
                }
                for listener in &slot.listeners {
                    out.push_str(&format!(" on{}", listener.kind.name()));
                }
                out.push('>');
                for &child in children {
                    self.write_markup(child, out);
                }
                out.push_str(&format!("</{}>", tag.local_name()));
            }
        }
    }
}

impl Host for MemoryDocument {
    type Node = NodeId;
    type Key = NodeId;
    type Listener = ListenerId;

    fn create_text(&mut self, text: &str) -> Result<NodeId, HostError> {
        self.alloc(Content::Text(text.to_owned()))
    }

    fn create_element(&mut self, tag: Tag) -> Result<NodeId, HostError> {
        self.alloc(Content::Element {
            tag,
            attributes: BTreeMap::new(),
            children: Vec::new(),
        })
    }

    fn element_name(&self, node: &NodeId) -> Option<ElementName> {
        match &self.slot(*node).ok()?.content {
            Content::Element { tag, .. } => Some(ElementName::of(*tag)),
            Content::Text(_) => None,
        }
    }

    fn text_content(&self, node: &NodeId) -> Option<String> {
        match &self.slot(*node).ok()?.content {
            Content::Text(text) => Some(text.clone()),
            Content::Element { .. } => None,
        }
    }

    fn attribute(&self, node: &NodeId, name: &str) -> Option<String> {
        match &self.slot(*node).ok()?.content {
            Content::Element { attributes, .. } => attributes.get(name).cloned(),
            Content::Text(_) => None,
        }
    }

    fn children(&self, node: &NodeId) -> Result<Vec<NodeId>, HostError> {
        match &self.slot(*node)?.content {
            Content::Element { children, .. } => Ok(children.clone()),
            Content::Text(_) => Ok(Vec::new()),
        }
    }

    fn replace_children(&mut self, parent: &NodeId, new: &[NodeId]) -> Result<(), HostError> {
        if let Some(dead) = new.iter().find(|child| !self.is_alive(**child)) {
            return Err(HostError::new(format!("node {} is not alive", dead.0)));
        }
        match &mut self.slot_mut(*parent)?.content {
            Content::Element { children, .. } => {
                children.clear();
                children.extend_from_slice(new);
                Ok(())
            }
            Content::Text(_) => Err(HostError::new("text nodes have no children")),
        }
    }

    fn set_attribute(&mut self, node: &NodeId, name: &str, value: &str) -> Result<(), HostError> {
        self.attributes_mut(*node)?
            .insert(name.to_owned(), value.to_owned());
        Ok(())
    }

    fn remove_attribute(&mut self, node: &NodeId, name: &str) -> Result<(), HostError> {
        self.attributes_mut(*node)?.remove(name);
        Ok(())
    }

    fn key(&self, node: &NodeId) -> Result<NodeId, HostError> {
        Ok(*node)
    }

    fn add_listener(
        &mut self,
        node: &NodeId,
        kind: EventKind,
        callback: Callback,
    ) -> Result<ListenerId, HostError> {
        let id = ListenerId(self.next_listener);
        self.next_listener += 1;
        self.slot_mut(*node)?.listeners.push(Listener { id, kind, callback });
        Ok(id)
    }

    fn remove_listener(
        &mut self,
        node: &NodeId,
        kind: EventKind,
        listener: ListenerId,
    ) -> Result<(), HostError> {
        let slot = self.slot_mut(*node)?;
        let Some(pos) = slot
            .listeners
            .iter()
            .position(|l| l.id == listener && l.kind == kind)
        else {
            return Err(HostError::new(format!(
                "no {} listener {} on node {}",
                kind.name(),
                listener.0,
                node.0
            )));
        };
        slot.listeners.remove(pos);
        Ok(())
    }

    fn discard(&mut self, node: &NodeId) {
        let mut stack = vec![*node];
        while let Some(id) = stack.pop() {
            if let Some(Some(slot)) = self.slots.get_mut(id.0).map(Option::take) {
                if let Content::Element { children, .. } = slot.content {
                    stack.extend(children);
                }
            }
        }
    }

    fn mount(&mut self, nodes: &[NodeId]) -> Result<(), HostError> {
        if let Some(dead) = nodes.iter().find(|node| !self.is_alive(**node)) {
            return Err(HostError::new(format!("node {} is not alive", dead.0)));
        }
        self.mounted = nodes.to_vec();
        self.mounts += 1;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::cell::Cell;
    use std::rc::Rc;

    #[test]
    fn build_and_render_markup() {
        let mut doc = MemoryDocument::new();
        let div = doc.create_element(Tag::Div).unwrap();
        let text = doc.create_text("hi").unwrap();
        doc.set_attribute(&div, "id", "a").unwrap();
        doc.replace_children(&div, &[text]).unwrap();
        assert_eq!(doc.to_markup(div), "<div id=\"a\">hi</div>");
        assert_eq!(doc.element_name(&div).and_then(|n| n.tag()), Some(Tag::Div));
        assert_eq!(doc.element_name(&text), None);
    }

    #[test]
    fn discard_frees_descendants() {
        let mut doc = MemoryDocument::new();
        let outer = doc.create_element(Tag::Div).unwrap();
        let inner = doc.create_element(Tag::Span).unwrap();
        let text = doc.create_text("x").unwrap();
        doc.replace_children(&inner, &[text]).unwrap();
        doc.replace_children(&outer, &[inner]).unwrap();
        assert_eq!(doc.live_nodes(), 3);
        doc.discard(&outer);
        assert_eq!(doc.live_nodes(), 0);
        assert!(doc.children(&outer).is_err());
    }

    #[test]
    fn creation_limit() {
        let mut doc = MemoryDocument::new();
        doc.limit_creates(1);
        assert!(doc.create_text("a").is_ok());
        assert!(doc.create_element(Tag::Span).is_err());
        doc.unlimit_creates();
        assert!(doc.create_element(Tag::Span).is_ok());
        assert_eq!(doc.live_nodes(), 2);
    }

    #[test]
    fn dispatch_runs_matching_listeners() {
        let mut doc = MemoryDocument::new();
        let div = doc.create_element(Tag::Div).unwrap();
        let hits = Rc::new(Cell::new(0));
        let counter = hits.clone();
        let id = doc
            .add_listener(&div, EventKind::Click, Rc::new(move |_: &Event| counter.set(counter.get() + 1)))
            .unwrap();
        assert_eq!(doc.dispatch(div, &Event::PointerMove { x: 0.0, y: 0.0 }), 0);
        assert_eq!(doc.dispatch(div, &Event::Click), 1);
        assert_eq!(hits.get(), 1);
        doc.remove_listener(&div, EventKind::Click, id).unwrap();
        assert_eq!(doc.dispatch(div, &Event::Click), 0);
        assert!(doc.remove_listener(&div, EventKind::Click, id).is_err());
    }
}
