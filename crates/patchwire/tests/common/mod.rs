#![allow(dead_code)]

use std::collections::VecDeque;

use patchwire::{Host, MemoryDocument, Mounted, NodeId, Renderer};
use patchwire_protocol::{encode_message, Core, EventRecord, Node, PatchNode};

/// Core that replays prepared messages and records every event it gets.
#[derive(Default)]
pub struct Scripted {
    pub initial: Vec<u8>,
    pub patches: VecDeque<Vec<u8>>,
    pub events: Vec<EventRecord>,
    pub undecodable: usize,
}

impl Scripted {
    pub fn new(tree: &Node) -> Self {
        Self {
            initial: encode_message(tree),
            ..Self::default()
        }
    }

    pub fn push(&mut self, patch: &PatchNode) {
        self.patches.push_back(encode_message(patch));
    }

    pub fn push_raw(&mut self, bytes: Vec<u8>) {
        self.patches.push_back(bytes);
    }
}

impl Core for Scripted {
    fn produce_initial(&mut self) -> Vec<u8> {
        self.initial.clone()
    }

    fn produce_patch(&mut self) -> Option<Vec<u8>> {
        self.patches.pop_front()
    }

    fn handle_event(&mut self, record: &[u8]) {
        match EventRecord::from_bytes(record) {
            Ok(record) => self.events.push(record),
            Err(_) => self.undecodable += 1,
        }
    }
}

pub type TestRenderer = Renderer<MemoryDocument, Scripted>;

pub fn mounted(tree: &Node) -> TestRenderer {
    let mut renderer = Renderer::new(MemoryDocument::new(), Scripted::new(tree));
    renderer.mount().expect("initial mount");
    renderer
}

/// The single root node of a renderer.
pub fn root(renderer: &TestRenderer) -> NodeId {
    match renderer.root() {
        Some(Mounted::Single(node)) => *node,
        other => panic!("expected a single root, got {other:?}"),
    }
}

pub fn children(renderer: &TestRenderer, node: NodeId) -> Vec<NodeId> {
    renderer.host().children(&node).expect("live node")
}

/// Pushes `patch` and pulls it through the renderer.
pub fn patch(renderer: &mut TestRenderer, patch: &PatchNode) -> Result<(), patchwire::RenderError> {
    renderer.core().borrow_mut().push(patch);
    renderer.update().map(|_| ())
}
