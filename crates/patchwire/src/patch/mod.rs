//! Patch interpreter.
//!
//! A patch is applied in two passes over the same decoded value: [`check`]
//! walks the live tree read-only and rejects any shape disagreement, then
//! [`Patcher`] mutates. Only host failures can interrupt the second pass.

mod apply;
pub mod check;

pub use apply::Patcher;

use patchwire_protocol::PatchNode;

use crate::bridge::EventBridge;
use crate::builder::Mounted;
use crate::error::RenderError;
use crate::host::Host;

/// Checks `patch` against `root`, then applies it.
///
/// When the check fails nothing in the host has changed and `root` is still
/// the live root.
pub fn apply_patch<H: Host>(
    host: &mut H,
    bridge: &mut EventBridge<H>,
    root: &Mounted<H::Node>,
    patch: &PatchNode,
) -> Result<Mounted<H::Node>, RenderError> {
    check::check_node(host, root, patch)?;
    Patcher::new(host, bridge).node(root.clone(), patch)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::builder::Builder;
    use crate::error::Mismatch;
    use crate::host::MemoryDocument;
    use patchwire_protocol::{
        Attribute, AttributeKind, AttributePatch, Element, EventKind, HandlerId, ListEntry,
        ListOp, Node, PatchElement, PatchList, PatchSingle, Single, Tag,
    };
    use std::rc::Rc;

    struct Fixture {
        doc: MemoryDocument,
        bridge: EventBridge<MemoryDocument>,
    }

    impl Fixture {
        fn new() -> Self {
            Self {
                doc: MemoryDocument::new(),
                bridge: EventBridge::new(Rc::new(|_: &[u8]| {})),
            }
        }

        fn build(&mut self, node: &Node) -> Mounted<crate::host::NodeId> {
            Builder::new(&mut self.doc, &mut self.bridge).node(node).unwrap()
        }

        fn apply(
            &mut self,
            root: &Mounted<crate::host::NodeId>,
            patch: &PatchNode,
        ) -> Result<Mounted<crate::host::NodeId>, RenderError> {
            apply_patch(&mut self.doc, &mut self.bridge, root, patch)
        }
    }

    fn texts(items: &[&str]) -> Node {
        Node::List(items.iter().map(|t| Single::text(*t)).collect())
    }

    #[test]
    fn single_patch_on_list_root_is_not_single() {
        let mut fx = Fixture::new();
        let root = fx.build(&texts(&["a"]));
        let patch = PatchNode::Single(PatchSingle::Replace(Single::text("b")));
        let err = fx.apply(&root, &patch).unwrap_err();
        assert!(matches!(err, RenderError::Mismatch(Mismatch::NotSingle)));
    }

    #[test]
    fn text_node_cannot_be_patched_in_place() {
        let mut fx = Fixture::new();
        let root = fx.build(&Node::Single(Single::text("a")));
        let patch = PatchNode::Single(PatchSingle::attributes(Tag::Div, vec![]));
        let err = fx.apply(&root, &patch).unwrap_err();
        assert!(matches!(err, RenderError::Mismatch(Mismatch::NotElement)));
    }

    #[test]
    fn remove_handler_unregisters_listener() {
        let mut fx = Fixture::new();
        let tree = Node::from(
            Element::new(Tag::Div).with_attribute(Attribute::OnClick(HandlerId::from_parts(0, 0))),
        );
        let root = fx.build(&tree);
        let patch = PatchNode::Single(PatchSingle::attributes(
            Tag::Div,
            vec![
                AttributePatch::Remove(AttributeKind::OnClick),
                AttributePatch::Remove(AttributeKind::Id),
            ],
        ));
        let root = fx.apply(&root, &patch).unwrap();
        let Mounted::Single(div) = root else { panic!() };
        assert_eq!(fx.doc.listener_count(div, EventKind::Click), 0);
        assert!(fx.bridge.is_empty());
    }

    #[test]
    fn element_replace_drops_old_subtree() {
        let mut fx = Fixture::new();
        let tree = Node::from(
            Element::new(Tag::Div)
                .with_child(Element::new(Tag::Span).with_attribute(Attribute::OnPointerMove(HandlerId::from_parts(0, 0)))),
        );
        let root = fx.build(&tree);
        let patch = PatchNode::Single(PatchSingle::Element(PatchElement::Replace(Element::new(Tag::Span))));
        let new_root = fx.apply(&root, &patch).unwrap();
        assert_ne!(new_root, root);
        assert_eq!(fx.doc.live_nodes(), 1);
        assert_eq!(fx.doc.total_listeners(), 0);
    }

    #[test]
    fn from_out_of_bounds_leaves_tree_untouched() {
        let mut fx = Fixture::new();
        let root = fx.build(&texts(&["a", "b"]));
        let patch = PatchNode::List(PatchList::All(vec![ListOp::New(Single::text("x")), ListOp::From(5)]));
        let err = fx.apply(&root, &patch).unwrap_err();
        assert!(matches!(
            err,
            RenderError::Mismatch(Mismatch::SourceOutOfBounds { index: 5, len: 2 })
        ));
        assert_eq!(fx.doc.live_nodes(), 2);
    }

    #[test]
    fn source_taken_twice() {
        let mut fx = Fixture::new();
        let root = fx.build(&texts(&["a", "b"]));
        let patch = PatchNode::List(PatchList::All(vec![ListOp::Nop, ListOp::From(0)]));
        let err = fx.apply(&root, &patch).unwrap_err();
        assert!(matches!(err, RenderError::Mismatch(Mismatch::SourceTaken { index: 0 })));
    }

    #[test]
    fn nop_past_old_length() {
        let mut fx = Fixture::new();
        let root = fx.build(&texts(&["a"]));
        let patch = PatchNode::List(PatchList::All(vec![ListOp::Nop, ListOp::Nop]));
        let err = fx.apply(&root, &patch).unwrap_err();
        assert!(matches!(
            err,
            RenderError::Mismatch(Mismatch::NopOutOfBounds { index: 1, len: 1 })
        ));
    }

    #[test]
    fn untaken_sources_are_dropped() {
        let mut fx = Fixture::new();
        let root = fx.build(&texts(&["a", "b", "c"]));
        let patch = PatchNode::List(PatchList::All(vec![ListOp::From(1)]));
        let new_root = fx.apply(&root, &patch).unwrap();
        let (Mounted::List(old), Mounted::List(new)) = (&root, &new_root) else { panic!() };
        assert_eq!(new, &vec![old[1]]);
        assert!(!fx.doc.is_alive(old[0]));
        assert!(!fx.doc.is_alive(old[2]));
    }

    #[test]
    fn entries_order_gap_and_length() {
        let mut fx = Fixture::new();
        let root = fx.build(&texts(&["a", "b"]));
        let replace = |t: &str| PatchSingle::Replace(Single::text(t));

        let out_of_order = PatchNode::List(PatchList::Entries {
            len: 2,
            entries: vec![
                ListEntry { index: 1, patch: replace("x") },
                ListEntry { index: 0, patch: replace("y") },
            ],
        });
        assert!(matches!(
            fx.apply(&root, &out_of_order).unwrap_err(),
            RenderError::Mismatch(Mismatch::EntryOrder { index: 0, previous: 1 })
        ));

        let gap = PatchNode::List(PatchList::Entries {
            len: 4,
            entries: vec![ListEntry { index: 3, patch: replace("x") }],
        });
        assert!(matches!(
            fx.apply(&root, &gap).unwrap_err(),
            RenderError::Mismatch(Mismatch::EntryGap { index: 3, len: 2 })
        ));

        let short = PatchNode::List(PatchList::Entries { len: 3, entries: vec![] });
        assert!(matches!(
            fx.apply(&root, &short).unwrap_err(),
            RenderError::Mismatch(Mismatch::EntryLength { expected: 3, actual: 2 })
        ));

        let append_patch = PatchNode::List(PatchList::Entries {
            len: 3,
            entries: vec![ListEntry {
                index: 2,
                patch: PatchSingle::attributes(Tag::Div, vec![]),
            }],
        });
        assert!(matches!(
            fx.apply(&root, &append_patch).unwrap_err(),
            RenderError::Mismatch(Mismatch::EntryNotElement { index: 2 })
        ));
        assert_eq!(fx.doc.live_nodes(), 2);
    }

    #[test]
    fn entries_shrink_drops_tail() {
        let mut fx = Fixture::new();
        let root = fx.build(&texts(&["a", "b", "c"]));
        let patch = PatchNode::List(PatchList::Entries { len: 1, entries: vec![] });
        let new_root = fx.apply(&root, &patch).unwrap();
        assert_eq!(new_root.nodes().len(), 1);
        assert_eq!(fx.doc.live_nodes(), 1);
    }

    #[test]
    fn truncate() {
        let mut fx = Fixture::new();
        let root = fx.build(&texts(&["a", "b", "c"]));
        let err = fx.apply(&root, &PatchNode::List(PatchList::Truncate(4))).unwrap_err();
        assert!(matches!(
            err,
            RenderError::Mismatch(Mismatch::TruncateBeyondEnd { len: 4, current: 3 })
        ));
        let new_root = fx.apply(&root, &PatchNode::List(PatchList::Truncate(1))).unwrap();
        assert_eq!(new_root.nodes(), root.nodes()[..1].to_vec());
        assert_eq!(fx.doc.live_nodes(), 1);
    }

    #[test]
    fn nested_mismatch_is_caught_before_mutation() {
        let mut fx = Fixture::new();
        let tree = Node::from(
            Element::new(Tag::Div)
                .with_child(Single::text("keep"))
                .with_child(Element::new(Tag::Span)),
        );
        let root = fx.build(&tree);
        let patch = PatchNode::Single(PatchSingle::Element(PatchElement::Patch {
            tag: Tag::Div,
            common: patchwire_protocol::PatchCommon {
                attributes: vec![AttributePatch::Insert(Attribute::Id("changed".into()))],
                children: Some(PatchList::All(vec![
                    ListOp::Modify(PatchSingle::Replace(Single::text("new"))),
                    ListOp::Modify(PatchSingle::attributes(Tag::Div, vec![])),
                ])),
            },
        }));
        let err = fx.apply(&root, &patch).unwrap_err();
        assert!(matches!(err, RenderError::Mismatch(Mismatch::TagMismatch { expected: Tag::Div, .. })));
        let Mounted::Single(div) = root else { panic!() };
        assert_eq!(fx.doc.to_markup(div), "<div>keep<span></span></div>");
    }
}
