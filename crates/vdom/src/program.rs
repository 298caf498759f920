//! A small model-view-update core.
//!
//! A [`Program`] renders its model to a [`Node`] and folds messages back
//! into the model. [`ProgramCore`] adapts it to the [`Core`] boundary: it
//! remembers the last rendered tree, diffs each new render against it, and
//! routes event records to the handler that produced them.

use std::collections::HashMap;

use patchwire_protocol::{
    encode_message, Attribute, Core, Event, EventKind, EventRecord, HandlerId, Node, PatchNode,
};
use tracing::{debug, warn};

use crate::diff::diff_node;

pub trait Program {
    type Msg;

    fn view(&self, handlers: &mut Handlers<Self::Msg>) -> Node;

    fn update(&mut self, msg: Self::Msg);
}

type Handler<Msg> = Box<dyn Fn(&Event) -> Option<Msg>>;

/// Handler table for one render.
///
/// Ids are handed out in call order from a per-render counter, so a view
/// that attaches the same handlers in the same places yields identical ids
/// and the differ sees no change.
pub struct Handlers<Msg> {
    component: u32,
    next: u64,
    table: HashMap<HandlerId, (EventKind, Handler<Msg>)>,
}

impl<Msg: 'static> Handlers<Msg> {
    pub fn new(component: u32) -> Self {
        Self {
            component,
            next: 0,
            table: HashMap::new(),
        }
    }

    fn reset(&mut self) {
        self.next = 0;
        self.table.clear();
    }

    fn allocate(&mut self, kind: EventKind, handler: Handler<Msg>) -> HandlerId {
        let id = HandlerId::from_parts(self.component, self.next);
        self.next += 1;
        self.table.insert(id, (kind, handler));
        id
    }

    /// Click handler attribute that sends `msg`.
    pub fn on_click(&mut self, msg: Msg) -> Attribute
    where
        Msg: Clone,
    {
        let id = self.allocate(EventKind::Click, Box::new(move |_: &Event| Some(msg.clone())));
        Attribute::OnClick(id)
    }

    /// Pointer-move handler attribute that maps coordinates to a message.
    pub fn on_pointer_move(&mut self, f: impl Fn(f64, f64) -> Msg + 'static) -> Attribute {
        let id = self.allocate(
            EventKind::PointerMove,
            Box::new(move |event: &Event| match *event {
                Event::PointerMove { x, y } => Some(f(x, y)),
                Event::Click => None,
            }),
        );
        Attribute::OnPointerMove(id)
    }

    /// Number of handlers attached by the last render.
    pub fn len(&self) -> usize {
        self.table.len()
    }

    pub fn is_empty(&self) -> bool {
        self.table.is_empty()
    }

    fn dispatch(&self, record: &EventRecord) -> Option<Msg> {
        let Some((kind, handler)) = self.table.get(&record.handler) else {
            warn!(handler = %record.handler, "event for unknown handler");
            return None;
        };
        if *kind != record.event.kind() {
            warn!(
                handler = %record.handler,
                expected = kind.name(),
                got = record.event.kind().name(),
                "event kind does not match handler"
            );
            return None;
        }
        handler(&record.event)
    }
}

/// Runs a [`Program`] behind the [`Core`] boundary.
pub struct ProgramCore<P: Program> {
    program: P,
    handlers: Handlers<P::Msg>,
    last: Option<Node>,
}

impl<P: Program> ProgramCore<P>
where
    P::Msg: 'static,
{
    pub fn new(program: P) -> Self {
        Self {
            program,
            handlers: Handlers::new(0),
            last: None,
        }
    }

    pub fn program(&self) -> &P {
        &self.program
    }

    /// Last tree handed out, as the client should now display it.
    pub fn last(&self) -> Option<&Node> {
        self.last.as_ref()
    }

    fn render(&mut self) -> Node {
        self.handlers.reset();
        self.program.view(&mut self.handlers)
    }
}

impl<P: Program> Core for ProgramCore<P>
where
    P::Msg: 'static,
{
    fn produce_initial(&mut self) -> Vec<u8> {
        let tree = self.render();
        let bytes = encode_message(&tree);
        self.last = Some(tree);
        bytes
    }

    fn produce_patch(&mut self) -> Option<Vec<u8>> {
        let tree = self.render();
        let patch = match &self.last {
            Some(last) => diff_node(last, &tree),
            None => Some(PatchNode::Replace(tree.clone())),
        };
        self.last = Some(tree);
        let patch = patch?;
        let bytes = encode_message(&patch);
        debug!(len = bytes.len(), "patch produced");
        Some(bytes)
    }

    fn handle_event(&mut self, record: &[u8]) {
        let record = match EventRecord::from_bytes(record) {
            Ok(record) => record,
            Err(err) => {
                warn!(%err, len = record.len(), "undecodable event record");
                return;
            }
        };
        if let Some(msg) = self.handlers.dispatch(&record) {
            self.program.update(msg);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use patchwire_protocol::{decode_message, Element, Single, Tag};

    struct Counter {
        count: i64,
    }

    #[derive(Clone)]
    enum Msg {
        Inc,
    }

    impl Program for Counter {
        type Msg = Msg;

        fn view(&self, handlers: &mut Handlers<Msg>) -> Node {
            Node::from(
                Element::new(Tag::Div)
                    .with_attribute(handlers.on_click(Msg::Inc))
                    .with_child(Single::text(self.count.to_string())),
            )
        }

        fn update(&mut self, msg: Msg) {
            match msg {
                Msg::Inc => self.count += 1,
            }
        }
    }

    #[test]
    fn click_updates_model_and_produces_patch() {
        let mut core = ProgramCore::new(Counter { count: 0 });
        let initial: Node = decode_message(&core.produce_initial()).unwrap();
        assert_eq!(core.produce_patch(), None);

        let record = EventRecord::new(HandlerId::from_parts(0, 0), Event::Click).to_bytes();
        core.handle_event(&record);
        assert_eq!(core.program().count, 1);

        let patch: PatchNode = decode_message(&core.produce_patch().unwrap()).unwrap();
        let mut tree = initial;
        crate::apply::apply_node(&mut tree, &patch).unwrap();
        assert_eq!(Some(&tree), core.last());
    }

    #[test]
    fn unknown_handler_and_garbage_are_ignored() {
        let mut core = ProgramCore::new(Counter { count: 0 });
        core.produce_initial();
        core.handle_event(&EventRecord::new(HandlerId::from_parts(9, 9), Event::Click).to_bytes());
        core.handle_event(&[1, 2, 3]);
        let wrong_kind = EventRecord::new(
            HandlerId::from_parts(0, 0),
            Event::PointerMove { x: 0.0, y: 0.0 },
        );
        core.handle_event(&wrong_kind.to_bytes());
        assert_eq!(core.program().count, 0);
    }
}
