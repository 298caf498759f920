//! Typed model of a rendered tree.
//!
//! A [`Node`] is either a single node or a fragment of sibling singles. An
//! [`Element`] owns its attributes and children outright; there are no
//! parent links.

use std::fmt;

use serde::{Serialize, Serializer};

use crate::enums::{AttributeKind, EventKind, Tag};

/// Namespace shared by every element tag.
pub const XHTML_NAMESPACE: &str = "http://www.w3.org/1999/xhtml";

// ── Handler ids ──────────────────────────────────────────────────────────

/// Opaque 12-byte token naming a callback inside the rendering core.
#[derive(Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Default)]
pub struct HandlerId(pub [u8; HandlerId::LEN]);

impl HandlerId {
    pub const LEN: usize = 12;

    /// Packs a component number and a per-component index.
    pub fn from_parts(component: u32, index: u64) -> Self {
        let mut bytes = [0u8; Self::LEN];
        bytes[..4].copy_from_slice(&component.to_le_bytes());
        bytes[4..].copy_from_slice(&index.to_le_bytes());
        HandlerId(bytes)
    }

    /// Inverse of [`HandlerId::from_parts`].
    pub fn parts(&self) -> (u32, u64) {
        let mut component = [0u8; 4];
        let mut index = [0u8; 8];
        component.copy_from_slice(&self.0[..4]);
        index.copy_from_slice(&self.0[4..]);
        (u32::from_le_bytes(component), u64::from_le_bytes(index))
    }

    pub fn as_bytes(&self) -> &[u8; Self::LEN] {
        &self.0
    }
}

impl fmt::Display for HandlerId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for byte in self.0 {
            write!(f, "{byte:02x}")?;
        }
        Ok(())
    }
}

impl fmt::Debug for HandlerId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "HandlerId({self})")
    }
}

impl Serialize for HandlerId {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

// ── Tags and attribute kinds ─────────────────────────────────────────────

impl Tag {
    pub fn namespace(self) -> &'static str {
        XHTML_NAMESPACE
    }

    pub fn local_name(self) -> &'static str {
        match self {
            Tag::Div => "div",
            Tag::Span => "span",
        }
    }

    /// Finds the tag with this exact namespace and local name.
    pub fn from_name(namespace: &str, local_name: &str) -> Option<Tag> {
        if namespace != XHTML_NAMESPACE {
            return None;
        }
        match local_name {
            "div" => Some(Tag::Div),
            "span" => Some(Tag::Span),
            _ => None,
        }
    }
}

impl fmt::Display for Tag {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.local_name())
    }
}

impl AttributeKind {
    /// The event a handler attribute listens for, `None` for plain attributes.
    pub fn event_kind(self) -> Option<EventKind> {
        match self {
            AttributeKind::Id => None,
            AttributeKind::OnClick => Some(EventKind::Click),
            AttributeKind::OnPointerMove => Some(EventKind::PointerMove),
        }
    }
}

impl EventKind {
    /// Host event type name.
    pub fn name(self) -> &'static str {
        match self {
            EventKind::Click => "click",
            EventKind::PointerMove => "pointermove",
        }
    }

    /// The handler attribute kind that registers this event.
    pub fn attribute_kind(self) -> AttributeKind {
        match self {
            EventKind::Click => AttributeKind::OnClick,
            EventKind::PointerMove => AttributeKind::OnPointerMove,
        }
    }

    pub const ALL: [EventKind; 2] = [EventKind::Click, EventKind::PointerMove];
}

// ── Attributes ───────────────────────────────────────────────────────────

#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize)]
pub enum Attribute {
    Id(String),
    OnClick(HandlerId),
    OnPointerMove(HandlerId),
}

impl Attribute {
    pub fn kind(&self) -> AttributeKind {
        match self {
            Attribute::Id(_) => AttributeKind::Id,
            Attribute::OnClick(_) => AttributeKind::OnClick,
            Attribute::OnPointerMove(_) => AttributeKind::OnPointerMove,
        }
    }

    /// Event kind and handler id for handler attributes.
    pub fn handler(&self) -> Option<(EventKind, HandlerId)> {
        match self {
            Attribute::Id(_) => None,
            Attribute::OnClick(id) => Some((EventKind::Click, *id)),
            Attribute::OnPointerMove(id) => Some((EventKind::PointerMove, *id)),
        }
    }

    /// Builds the handler attribute for `kind`.
    pub fn handler_for(kind: EventKind, id: HandlerId) -> Attribute {
        match kind {
            EventKind::Click => Attribute::OnClick(id),
            EventKind::PointerMove => Attribute::OnPointerMove(id),
        }
    }
}

/// Attribute set kept sorted by kind with at most one entry per kind.
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash, Serialize)]
#[serde(transparent)]
pub struct AttributeList(Vec<Attribute>);

impl AttributeList {
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets `attr`, returning the attribute it replaced.
    pub fn insert(&mut self, attr: Attribute) -> Option<Attribute> {
        match self.0.binary_search_by_key(&attr.kind(), Attribute::kind) {
            Ok(i) => Some(std::mem::replace(&mut self.0[i], attr)),
            Err(i) => {
                self.0.insert(i, attr);
                None
            }
        }
    }

    /// Clears the attribute of `kind`, returning it if it was set.
    pub fn remove(&mut self, kind: AttributeKind) -> Option<Attribute> {
        let i = self.0.binary_search_by_key(&kind, Attribute::kind).ok()?;
        Some(self.0.remove(i))
    }

    pub fn get(&self, kind: AttributeKind) -> Option<&Attribute> {
        let i = self.0.binary_search_by_key(&kind, Attribute::kind).ok()?;
        Some(&self.0[i])
    }

    pub fn id(&self) -> Option<&str> {
        match self.get(AttributeKind::Id) {
            Some(Attribute::Id(id)) => Some(id),
            _ => None,
        }
    }

    pub fn iter(&self) -> std::slice::Iter<'_, Attribute> {
        self.0.iter()
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl FromIterator<Attribute> for AttributeList {
    fn from_iter<I: IntoIterator<Item = Attribute>>(iter: I) -> Self {
        let mut list = AttributeList::new();
        for attr in iter {
            list.insert(attr);
        }
        list
    }
}

impl<'a> IntoIterator for &'a AttributeList {
    type Item = &'a Attribute;
    type IntoIter = std::slice::Iter<'a, Attribute>;

    fn into_iter(self) -> Self::IntoIter {
        self.0.iter()
    }
}

// ── Nodes ────────────────────────────────────────────────────────────────

#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize)]
pub struct Element {
    pub tag: Tag,
    pub attributes: AttributeList,
    pub children: Vec<Single>,
}

impl Element {
    pub fn new(tag: Tag) -> Self {
        Self {
            tag,
            attributes: AttributeList::new(),
            children: Vec::new(),
        }
    }

    pub fn with_attribute(mut self, attr: Attribute) -> Self {
        self.attributes.insert(attr);
        self
    }

    pub fn with_child(mut self, child: impl Into<Single>) -> Self {
        self.children.push(child.into());
        self
    }

    pub fn with_children<I>(mut self, children: I) -> Self
    where
        I: IntoIterator,
        I::Item: Into<Single>,
    {
        self.children.extend(children.into_iter().map(Into::into));
        self
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Single {
    Text(String),
    Element(Element),
}

impl Single {
    pub fn text(text: impl Into<String>) -> Self {
        Single::Text(text.into())
    }

    pub fn as_element(&self) -> Option<&Element> {
        match self {
            Single::Element(element) => Some(element),
            Single::Text(_) => None,
        }
    }

    /// Id attribute of an element, used as a sibling key.
    pub fn key(&self) -> Option<&str> {
        self.as_element().and_then(|e| e.attributes.id())
    }
}

impl From<Element> for Single {
    fn from(element: Element) -> Self {
        Single::Element(element)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Node {
    Single(Single),
    List(Vec<Single>),
}

impl From<Single> for Node {
    fn from(single: Single) -> Self {
        Node::Single(single)
    }
}

impl From<Element> for Node {
    fn from(element: Element) -> Self {
        Node::Single(Single::Element(element))
    }
}
