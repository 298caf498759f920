mod common;

use common::Scripted;
use patchwire::{Config, MemoryDocument, Renderer};
use patchwire_protocol::{
    decode_message, encode_message, Attribute, Core, Element, Event, EventKind, EventRecord,
    HandlerId, Node, PatchNode, Single, Tag,
};
use patchwire_vdom::{apply_node, diff_node, Handlers, Program, ProgramCore, TreeFuzzer};

fn seeds() -> Vec<u64> {
    let mut seeds = vec![0, 1, 5, 11, 99, 2024, 0x5eed, u64::MAX - 1];
    seeds.extend((1..=24).map(|i| i * 104_729));
    seeds
}

#[test]
fn live_tree_follows_oracle_through_seeded_edits() {
    for seed in seeds() {
        let mut fuzzer = TreeFuzzer::from_u64(seed);
        let mut oracle = fuzzer.node();
        let mut renderer = Renderer::new(MemoryDocument::new(), Scripted::new(&oracle));
        renderer.mount().expect("mount");
        assert_eq!(renderer.snapshot().unwrap().as_ref(), Some(&oracle), "seed {seed} mount");

        for step in 0..20 {
            let next = fuzzer.mutate(&oracle);
            let Some(patch) = diff_node(&oracle, &next) else {
                continue;
            };
            apply_node(&mut oracle, &patch).expect("oracle apply");
            assert_eq!(oracle, next);

            renderer.core().borrow_mut().push(&patch);
            renderer
                .update()
                .unwrap_or_else(|err| panic!("seed {seed} step {step}: {err}"));
            let live = renderer.snapshot().unwrap().expect("mounted");
            assert_eq!(
                encode_message(&live),
                encode_message(&oracle),
                "seed {seed} step {step}"
            );
        }

        let handlers = count_handlers(&oracle);
        assert_eq!(renderer.listener_count(), handlers, "seed {seed} listeners");
        assert_eq!(renderer.host().total_listeners(), handlers, "seed {seed} host listeners");
    }
}

#[test]
fn list_roots_stay_in_sync_with_either_refresh_setting() {
    for refresh in [true, false] {
        let config = Config {
            refresh_mount_on_list_patch: refresh,
            ..Config::default()
        };
        for seed in seeds().into_iter().take(8) {
            let mut fuzzer = TreeFuzzer::from_u64(seed);
            let mut oracle = Node::List(vec![Single::text("a"), fuzzer.single(3)]);
            let mut renderer = Renderer::with_config(
                MemoryDocument::new(),
                Scripted::new(&oracle),
                config.clone(),
            );
            renderer.mount().unwrap();
            for _ in 0..10 {
                let next = fuzzer.mutate(&oracle);
                if let Some(patch) = diff_node(&oracle, &next) {
                    renderer.core().borrow_mut().push(&patch);
                    renderer.update().unwrap();
                }
                oracle = next;
                let context = format!("refresh {refresh} seed {seed}");
                assert_eq!(renderer.snapshot().unwrap().as_ref(), Some(&oracle), "{context}");
                let mounted = renderer.root().map(|root| root.nodes()).unwrap_or_default();
                assert_eq!(renderer.host().mounted(), mounted.as_slice(), "{context}");
            }
        }
    }
}

fn count_handlers(node: &Node) -> usize {
    fn count(single: &Single) -> usize {
        match single {
            Single::Text(_) => 0,
            Single::Element(element) => {
                element.attributes.iter().filter(|a| a.handler().is_some()).count()
                    + element.children.iter().map(count).sum::<usize>()
            }
        }
    }
    match node {
        Node::Single(single) => count(single),
        Node::List(items) => items.iter().map(count).sum(),
    }
}

// ── Program core end to end ───────────────────────────────────────────────

struct Todo {
    items: Vec<String>,
    next: usize,
    pointer: Option<(f64, f64)>,
}

#[derive(Clone)]
enum Msg {
    Add,
    Remove(usize),
    Moved(f64, f64),
}

impl Program for Todo {
    type Msg = Msg;

    fn view(&self, handlers: &mut Handlers<Msg>) -> Node {
        let add = Element::new(Tag::Span)
            .with_attribute(handlers.on_click(Msg::Add))
            .with_child(Single::text("add"));
        let mut list = Element::new(Tag::Div)
            .with_attribute(Attribute::Id("list".into()))
            .with_attribute(handlers.on_pointer_move(Msg::Moved));
        for (index, item) in self.items.iter().enumerate() {
            list = list.with_child(
                Element::new(Tag::Span)
                    .with_attribute(Attribute::Id(item.clone()))
                    .with_attribute(handlers.on_click(Msg::Remove(index)))
                    .with_child(Single::text(item.clone())),
            );
        }
        let status = match self.pointer {
            Some((x, y)) => format!("{x},{y}"),
            None => String::new(),
        };
        Node::List(vec![
            add.into(),
            list.into(),
            Single::text(status),
        ])
    }

    fn update(&mut self, msg: Msg) {
        match msg {
            Msg::Add => {
                self.items.push(format!("item{}", self.next));
                self.next += 1;
            }
            Msg::Remove(index) => {
                if index < self.items.len() {
                    self.items.remove(index);
                }
            }
            Msg::Moved(x, y) => self.pointer = Some((x, y)),
        }
    }
}

fn find_clickable(renderer: &Renderer<MemoryDocument, ProgramCore<Todo>>, text: &str) -> patchwire::NodeId {
    use patchwire::Host;

    let mut stack = renderer.host().mounted().to_vec();
    while let Some(node) = stack.pop() {
        let host = renderer.host();
        if host.listener_count(node, EventKind::Click) > 0 {
            let children = host.children(&node).unwrap_or_default();
            if children.iter().any(|c| host.text_content(c).as_deref() == Some(text)) {
                return node;
            }
        }
        stack.extend(host.children(&node).unwrap_or_default());
    }
    panic!("no clickable element with text {text:?}");
}

#[test]
fn program_core_round_trip() {
    let core = ProgramCore::new(Todo {
        items: Vec::new(),
        next: 0,
        pointer: None,
    });
    let mut renderer = Renderer::new(MemoryDocument::new(), core);
    renderer.mount().unwrap();

    for _ in 0..3 {
        let add = find_clickable(&renderer, "add");
        assert_eq!(renderer.host().dispatch(add, &Event::Click), 1);
        assert!(renderer.update().unwrap());
    }
    assert_eq!(renderer.core().borrow().program().items.len(), 3);

    let second = find_clickable(&renderer, "item1");
    renderer.host().dispatch(second, &Event::Click);
    assert!(renderer.update().unwrap());

    let list = match renderer.root() {
        Some(patchwire::Mounted::List(nodes)) => nodes[1],
        other => panic!("unexpected root {other:?}"),
    };
    renderer
        .host()
        .dispatch(list, &Event::PointerMove { x: 3.5, y: 4.0 });
    assert!(renderer.update().unwrap());
    assert!(!renderer.update().unwrap());

    let core = renderer.core().borrow();
    assert_eq!(core.program().items, vec!["item0".to_string(), "item2".to_string()]);
    assert_eq!(core.program().pointer, Some((3.5, 4.0)));
    assert_eq!(renderer.snapshot().unwrap().as_ref(), core.last());
}

#[test]
fn program_patch_matches_oracle_bytes() {
    let mut core = ProgramCore::new(Todo {
        items: vec!["a".into(), "b".into()],
        next: 0,
        pointer: None,
    });
    let initial = core.produce_initial();
    let mut oracle: Node = decode_message(&initial).unwrap();
    // The add button is rendered first, so it owns the first handler id.
    let add = EventRecord::new(HandlerId::from_parts(0, 0), Event::Click);
    core.handle_event(&add.to_bytes());
    let bytes = core.produce_patch().expect("model changed");
    let patch: PatchNode = decode_message(&bytes).unwrap();
    apply_node(&mut oracle, &patch).unwrap();
    assert_eq!(Some(&oracle), core.last());
}

mod seeded {
    use super::*;
    use proptest::prelude::*;

    proptest! {
        #![proptest_config(ProptestConfig::with_cases(32))]

        #[test]
        fn live_tree_matches_oracle_for_any_seed(seed in any::<u64>(), steps in 1usize..10) {
            let mut fuzzer = TreeFuzzer::from_u64(seed).with_limits(3, 4);
            let mut oracle = fuzzer.node();
            let mut renderer = Renderer::new(MemoryDocument::new(), Scripted::new(&oracle));
            prop_assert!(renderer.mount().is_ok());
            for _ in 0..steps {
                let next = fuzzer.mutate(&oracle);
                if let Some(patch) = diff_node(&oracle, &next) {
                    renderer.core().borrow_mut().push(&patch);
                    prop_assert!(renderer.update().is_ok());
                }
                oracle = next;
                prop_assert_eq!(renderer.snapshot().unwrap(), Some(oracle.clone()));
            }
        }
    }
}
