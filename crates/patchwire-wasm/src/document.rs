//! [`Host`] over the browser DOM.

use std::cell::Cell;

use patchwire::{Callback, ElementName, Host, HostError};
use patchwire_protocol::{Event, EventKind, Tag};
use tracing::{trace, warn};
use wasm_bindgen::closure::Closure;
use wasm_bindgen::{JsCast as _, JsValue};
use web_sys::{Document, Element, Node};

/// Expando property holding a node's identity.
const KEY_PROPERTY: &str = "__patchwireKey";

type DomListener = Closure<dyn Fn(web_sys::Event)>;

pub struct WebDocument {
    document: Document,
    mount_point: Element,
    next_key: Cell<u64>,
}

impl std::fmt::Debug for WebDocument {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("WebDocument")
            .field("mount_point", &self.mount_point.id())
            .field("next_key", &self.next_key.get())
            .finish()
    }
}

fn js_error(context: &str, err: JsValue) -> HostError {
    HostError::new(format!("{context}: {err:?}"))
}

fn as_element<'n>(node: &'n Node, op: &str) -> Result<&'n Element, HostError> {
    node.dyn_ref::<Element>()
        .ok_or_else(|| HostError::new(format!("{op}: not an element")))
}

/// Reads a numeric property such as `clientX` without rounding it.
fn coordinate(event: &web_sys::Event, name: &str) -> Option<f64> {
    js_sys::Reflect::get(event, &JsValue::from_str(name))
        .ok()?
        .as_f64()
}

/// Translates a DOM event into the protocol event of `kind`.
///
/// `None` when a pointer event carries no usable coordinates.
fn to_event(kind: EventKind, event: &web_sys::Event) -> Option<Event> {
    match kind {
        EventKind::Click => Some(Event::Click),
        EventKind::PointerMove => Some(Event::PointerMove {
            x: coordinate(event, "clientX")?,
            y: coordinate(event, "clientY")?,
        }),
    }
}

impl WebDocument {
    /// Wraps the document of the current window, mounting into the element
    /// with id `mount_point`.
    pub fn from_window(mount_point: &str) -> Result<Self, HostError> {
        let document = web_sys::window()
            .and_then(|window| window.document())
            .ok_or_else(|| HostError::new("no global document"))?;
        let mount = document
            .get_element_by_id(mount_point)
            .ok_or_else(|| HostError::new(format!("no element with id {mount_point:?}")))?;
        Ok(Self::new(document, mount))
    }

    pub fn new(document: Document, mount_point: Element) -> Self {
        Self {
            document,
            mount_point,
            next_key: Cell::new(0),
        }
    }

    pub fn mount_point(&self) -> &Element {
        &self.mount_point
    }

    fn set_children(parent: &Node, children: &[Node]) -> Result<(), HostError> {
        parent.set_text_content(None);
        for child in children {
            parent
                .append_child(child)
                .map_err(|e| js_error("appendChild", e))?;
        }
        Ok(())
    }
}

impl Host for WebDocument {
    type Node = Node;
    type Key = u64;
    type Listener = DomListener;

    fn create_text(&mut self, text: &str) -> Result<Node, HostError> {
        Ok(self.document.create_text_node(text).into())
    }

    fn create_element(&mut self, tag: Tag) -> Result<Node, HostError> {
        self.document
            .create_element_ns(Some(tag.namespace()), tag.local_name())
            .map(Node::from)
            .map_err(|e| js_error("createElementNS", e))
    }

    fn element_name(&self, node: &Node) -> Option<ElementName> {
        let element = node.dyn_ref::<Element>()?;
        Some(ElementName {
            namespace: element.namespace_uri().unwrap_or_default(),
            local_name: element.local_name(),
        })
    }

    fn text_content(&self, node: &Node) -> Option<String> {
        if node.node_type() == Node::TEXT_NODE {
            node.text_content()
        } else {
            None
        }
    }

    fn attribute(&self, node: &Node, name: &str) -> Option<String> {
        node.dyn_ref::<Element>()?.get_attribute(name)
    }

    fn children(&self, node: &Node) -> Result<Vec<Node>, HostError> {
        let list = node.child_nodes();
        Ok((0..list.length()).filter_map(|i| list.get(i)).collect())
    }

    fn replace_children(&mut self, parent: &Node, children: &[Node]) -> Result<(), HostError> {
        as_element(parent, "replaceChildren")?;
        Self::set_children(parent, children)
    }

    fn set_attribute(&mut self, node: &Node, name: &str, value: &str) -> Result<(), HostError> {
        as_element(node, "setAttribute")?
            .set_attribute(name, value)
            .map_err(|e| js_error("setAttribute", e))
    }

    fn remove_attribute(&mut self, node: &Node, name: &str) -> Result<(), HostError> {
        as_element(node, "removeAttribute")?
            .remove_attribute(name)
            .map_err(|e| js_error("removeAttribute", e))
    }

    fn key(&self, node: &Node) -> Result<u64, HostError> {
        let property = JsValue::from_str(KEY_PROPERTY);
        let existing =
            js_sys::Reflect::get(node, &property).map_err(|e| js_error("read node key", e))?;
        if let Some(key) = existing.as_f64() {
            return Ok(key as u64);
        }
        let key = self.next_key.get();
        self.next_key.set(key + 1);
        js_sys::Reflect::set(node, &property, &JsValue::from_f64(key as f64))
            .map_err(|e| js_error("write node key", e))?;
        Ok(key)
    }

    fn add_listener(
        &mut self,
        node: &Node,
        kind: EventKind,
        callback: Callback,
    ) -> Result<DomListener, HostError> {
        let listener: DomListener = Closure::new(move |event: web_sys::Event| {
            match to_event(kind, &event) {
                Some(event) => callback(&event),
                None => warn!(kind = kind.name(), "event without coordinates, dropped"),
            }
        });
        node.add_event_listener_with_callback(kind.name(), listener.as_ref().unchecked_ref())
            .map_err(|e| js_error("addEventListener", e))?;
        Ok(listener)
    }

    fn remove_listener(
        &mut self,
        node: &Node,
        kind: EventKind,
        listener: DomListener,
    ) -> Result<(), HostError> {
        node.remove_event_listener_with_callback(kind.name(), listener.as_ref().unchecked_ref())
            .map_err(|e| js_error("removeEventListener", e))
    }

    fn discard(&mut self, node: &Node) {
        trace!(name = %node.node_name(), "discard");
        if let Some(parent) = node.parent_node() {
            if let Err(err) = parent.remove_child(node) {
                warn!(name = %node.node_name(), ?err, "removeChild failed");
            }
        }
    }

    fn mount(&mut self, nodes: &[Node]) -> Result<(), HostError> {
        Self::set_children(&self.mount_point, nodes)
    }
}
