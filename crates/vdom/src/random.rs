//! Seeded random trees for differential testing.
//!
//! [`TreeFuzzer`] produces trees drawn from a deliberately small vocabulary
//! of keys and texts, so that two independently generated or mutated trees
//! share enough structure for the differ to find matches, moves and
//! in-place edits.

use rand::{Rng, SeedableRng};
use rand_xoshiro::Xoshiro256StarStar;

use patchwire_protocol::{Attribute, AttributeKind, Element, HandlerId, Node, Single, Tag};

const KEYS: &[&str] = &["a", "b", "c", "d", "e", "f"];
const TEXTS: &[&str] = &["", "x", "y", "hello", "ünïcödé", "日本", "🦀", "a b"];

/// Component number stamped into every generated handler id.
const COMPONENT: u32 = 7;

pub struct TreeFuzzer {
    /// The seed the generator was created from.
    pub seed: [u8; 32],
    rng: Xoshiro256StarStar,
    next_handler: u64,
    max_depth: usize,
    max_children: usize,
}

impl TreeFuzzer {
    pub fn new(seed: [u8; 32]) -> Self {
        Self {
            seed,
            rng: Xoshiro256StarStar::from_seed(seed),
            next_handler: 0,
            max_depth: 4,
            max_children: 5,
        }
    }

    /// Expands a short seed into a full generator state.
    pub fn from_u64(seed: u64) -> Self {
        let mut bytes = [0u8; 32];
        for (i, chunk) in bytes.chunks_mut(8).enumerate() {
            let word = seed.wrapping_add(i as u64).wrapping_mul(0x9E37_79B9_7F4A_7C15);
            chunk.copy_from_slice(&word.to_le_bytes());
        }
        Self::new(bytes)
    }

    pub fn with_limits(mut self, max_depth: usize, max_children: usize) -> Self {
        self.max_depth = max_depth;
        self.max_children = max_children;
        self
    }

    // ── Primitives ────────────────────────────────────────────────────────

    fn chance(&mut self, p: f64) -> bool {
        self.rng.gen_bool(p)
    }

    fn below(&mut self, n: usize) -> usize {
        self.rng.gen_range(0..n)
    }

    fn pick<'a, T>(&mut self, items: &'a [T]) -> &'a T {
        let index = self.below(items.len());
        &items[index]
    }

    /// Fresh handler id, never handed out before by this generator.
    pub fn handler(&mut self) -> HandlerId {
        let id = HandlerId::from_parts(COMPONENT, self.next_handler);
        self.next_handler += 1;
        id
    }

    pub fn tag(&mut self) -> Tag {
        *self.pick(&[Tag::Div, Tag::Span])
    }

    pub fn text(&mut self) -> String {
        (*self.pick(TEXTS)).to_owned()
    }

    fn attribute(&mut self, kind: AttributeKind) -> Attribute {
        match kind {
            AttributeKind::Id => Attribute::Id((*self.pick(KEYS)).to_owned()),
            AttributeKind::OnClick => Attribute::OnClick(self.handler()),
            AttributeKind::OnPointerMove => Attribute::OnPointerMove(self.handler()),
        }
    }

    // ── Generation ────────────────────────────────────────────────────────

    pub fn node(&mut self) -> Node {
        if self.chance(0.25) {
            Node::List(self.children(self.max_depth))
        } else {
            Node::Single(self.single(self.max_depth))
        }
    }

    pub fn single(&mut self, depth: usize) -> Single {
        if depth == 0 || self.chance(0.3) {
            Single::Text(self.text())
        } else {
            Single::Element(self.element(depth))
        }
    }

    pub fn element(&mut self, depth: usize) -> Element {
        let mut element = Element::new(self.tag());
        for (kind, p) in [
            (AttributeKind::Id, 0.5),
            (AttributeKind::OnClick, 0.3),
            (AttributeKind::OnPointerMove, 0.2),
        ] {
            if self.chance(p) {
                let attr = self.attribute(kind);
                element.attributes.insert(attr);
            }
        }
        element.children = self.children(depth.saturating_sub(1));
        element
    }

    fn children(&mut self, depth: usize) -> Vec<Single> {
        let count = self.below(self.max_children + 1);
        (0..count).map(|_| self.single(depth)).collect()
    }

    // ── Mutation ──────────────────────────────────────────────────────────

    /// A copy of `node` with a handful of random edits applied.
    pub fn mutate(&mut self, node: &Node) -> Node {
        if self.chance(0.05) {
            return self.node();
        }
        let mut node = node.clone();
        let edits = 1 + self.below(4);
        for _ in 0..edits {
            match &mut node {
                Node::Single(single) => self.mutate_single(single, self.max_depth),
                Node::List(items) => self.mutate_list(items, self.max_depth),
            }
        }
        node
    }

    fn mutate_single(&mut self, single: &mut Single, depth: usize) {
        match single {
            Single::Text(text) => {
                if self.chance(0.2) && depth > 0 {
                    *single = Single::Element(self.element(depth));
                } else {
                    *text = self.text();
                }
            }
            Single::Element(element) => {
                if !element.children.is_empty() && depth > 0 && self.chance(0.5) {
                    let index = self.below(element.children.len());
                    self.mutate_single(&mut element.children[index], depth - 1);
                } else {
                    self.mutate_element(element, depth);
                }
            }
        }
    }

    fn mutate_element(&mut self, element: &mut Element, depth: usize) {
        match self.below(4) {
            0 => element.tag = self.tag(),
            1 => {
                let kind = *self.pick(&[
                    AttributeKind::Id,
                    AttributeKind::OnClick,
                    AttributeKind::OnPointerMove,
                ]);
                if element.attributes.get(kind).is_some() && self.chance(0.5) {
                    element.attributes.remove(kind);
                } else {
                    let attr = self.attribute(kind);
                    element.attributes.insert(attr);
                }
            }
            _ => self.mutate_list(&mut element.children, depth.saturating_sub(1)),
        }
    }

    fn mutate_list(&mut self, items: &mut Vec<Single>, depth: usize) {
        let len = items.len();
        match self.below(5) {
            0 => {
                let single = self.single(depth);
                let at = self.below(len + 1);
                items.insert(at, single);
            }
            1 if len > 0 => {
                let at = self.below(len);
                items.remove(at);
            }
            2 if len > 1 => {
                let from = self.below(len);
                let item = items.remove(from);
                let to = self.below(len);
                items.insert(to, item);
            }
            3 if len > 0 => {
                let keep = self.below(len);
                items.truncate(keep);
            }
            _ if len > 0 => {
                let at = self.below(len);
                self.mutate_single(&mut items[at], depth);
            }
            _ => {
                let single = self.single(depth);
                items.push(single);
            }
        }
    }
}
