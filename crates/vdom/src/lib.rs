//! patchwire-vdom - the producing side of the patchwire protocol.
//!
//! The client crate never diffs. Everything here lives on the core's side
//! of the wire: a tree differ that emits the patch grammar, a reference
//! apply over plain data that serves as the oracle in tests, a small
//! model-view-update [`Program`] core, and a seeded tree generator.
//!
//! ```
//! use patchwire_protocol::{Element, Node, Single, Tag};
//! use patchwire_vdom::{apply_node, diff_node};
//!
//! let old = Node::from(Element::new(Tag::Div).with_child(Single::text("a")));
//! let new = Node::from(Element::new(Tag::Div).with_child(Single::text("b")));
//! let patch = diff_node(&old, &new).unwrap();
//! let mut tree = old.clone();
//! apply_node(&mut tree, &patch).unwrap();
//! assert_eq!(tree, new);
//! ```

pub mod apply;
pub mod diff;
pub mod program;
pub mod random;

pub use apply::{apply_element, apply_list, apply_node, apply_single, ApplyError};
pub use diff::{diff_element, diff_list, diff_node, diff_single};
pub use program::{Handlers, Program, ProgramCore};
pub use random::TreeFuzzer;
