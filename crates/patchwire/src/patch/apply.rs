//! Mutating pass of the patch interpreter.

use patchwire_protocol::{
    Attribute, AttributeKind, AttributePatch, ListOp, PatchCommon, PatchElement, PatchList,
    PatchNode, PatchSingle,
};

use crate::bridge::EventBridge;
use crate::builder::{Builder, Mounted};
use crate::error::{Mismatch, RenderError};
use crate::host::Host;

/// Applies patches to live host nodes, reusing whatever the patch keeps.
pub struct Patcher<'a, H: Host> {
    host: &'a mut H,
    bridge: &'a mut EventBridge<H>,
}

impl<'a, H: Host> Patcher<'a, H> {
    pub fn new(host: &'a mut H, bridge: &'a mut EventBridge<H>) -> Self {
        Self { host, bridge }
    }

    fn builder(&mut self) -> Builder<'_, H> {
        Builder::new(self.host, self.bridge)
    }

    /// Releases a dropped node's listeners and hands it back to the host.
    pub fn drop_node(&mut self, node: &H::Node) -> Result<(), RenderError> {
        self.bridge.release_subtree(self.host, node)?;
        self.host.discard(node);
        Ok(())
    }

    pub fn drop_root(&mut self, root: &Mounted<H::Node>) -> Result<(), RenderError> {
        for node in root.nodes() {
            self.drop_node(&node)?;
        }
        Ok(())
    }

    // ── Node level ───────────────────────────────────────────────────────

    pub fn node(
        &mut self,
        root: Mounted<H::Node>,
        patch: &PatchNode,
    ) -> Result<Mounted<H::Node>, RenderError> {
        match (patch, root) {
            (PatchNode::Replace(node), root) => {
                let built = self.builder().node(node)?;
                self.drop_root(&root)?;
                Ok(built)
            }
            (PatchNode::Single(patch), Mounted::Single(node)) => {
                self.single(node, patch).map(Mounted::Single)
            }
            (PatchNode::List(patch), Mounted::List(nodes)) => {
                self.list(nodes, patch).map(Mounted::List)
            }
            (PatchNode::Single(_), Mounted::List(_)) => Err(Mismatch::NotSingle.into()),
            (PatchNode::List(_), Mounted::Single(_)) => Err(Mismatch::NotList.into()),
        }
    }

    // ── Single and element level ─────────────────────────────────────────

    pub fn single(&mut self, node: H::Node, patch: &PatchSingle) -> Result<H::Node, RenderError> {
        match patch {
            PatchSingle::Replace(single) => {
                let built = self.builder().single(single)?;
                self.drop_node(&node)?;
                Ok(built)
            }
            PatchSingle::Element(patch) => self.element(node, patch),
        }
    }

    fn element(&mut self, node: H::Node, patch: &PatchElement) -> Result<H::Node, RenderError> {
        let name = self.host.element_name(&node).ok_or(Mismatch::NotElement)?;
        match patch {
            PatchElement::Replace(element) => {
                let built = self.builder().element(element)?;
                self.drop_node(&node)?;
                Ok(built)
            }
            PatchElement::Patch { tag, common } => {
                if name.tag() != Some(*tag) {
                    return Err(Mismatch::TagMismatch {
                        expected: *tag,
                        found: name.to_string(),
                    }
                    .into());
                }
                self.common(&node, common)?;
                Ok(node)
            }
        }
    }

    fn common(&mut self, node: &H::Node, common: &PatchCommon) -> Result<(), RenderError> {
        for edit in &common.attributes {
            match edit {
                AttributePatch::Remove(AttributeKind::Id) => {
                    self.host.remove_attribute(node, "id")?;
                }
                AttributePatch::Remove(kind) => {
                    if let Some(event) = kind.event_kind() {
                        self.bridge.unregister(self.host, node, event)?;
                    }
                }
                AttributePatch::Insert(attr) => self.insert_attribute(node, attr)?,
            }
        }
        if let Some(children) = &common.children {
            let old = self.host.children(node)?;
            let new = self.list(old.clone(), children)?;
            if new != old {
                self.host.replace_children(node, &new)?;
            }
        }
        Ok(())
    }

    fn insert_attribute(&mut self, node: &H::Node, attr: &Attribute) -> Result<(), RenderError> {
        Ok(self.builder().attribute(node, attr)?)
    }

    // ── List level ───────────────────────────────────────────────────────

    pub fn list(
        &mut self,
        nodes: Vec<H::Node>,
        patch: &PatchList,
    ) -> Result<Vec<H::Node>, RenderError> {
        match patch {
            PatchList::All(ops) => self.list_all(nodes, ops),
            PatchList::Entries { len, entries } => {
                let mut nodes = nodes;
                let keep = (*len).min(nodes.len());
                self.truncate(&mut nodes, keep)?;
                let mut previous: Option<usize> = None;
                for entry in entries {
                    let index = entry.index;
                    if let Some(previous) = previous.filter(|p| index <= *p) {
                        return Err(Mismatch::EntryOrder { index, previous }.into());
                    }
                    previous = Some(index);
                    if let Some(node) = nodes.get(index).cloned() {
                        nodes[index] = self.single(node, &entry.patch)?;
                    } else if index == nodes.len() {
                        let PatchSingle::Replace(single) = &entry.patch else {
                            return Err(Mismatch::EntryNotElement { index }.into());
                        };
                        let node = self.builder().single(single)?;
                        nodes.push(node);
                    } else {
                        return Err(Mismatch::EntryGap {
                            index,
                            len: nodes.len(),
                        }
                        .into());
                    }
                }
                if nodes.len() != *len {
                    return Err(Mismatch::EntryLength {
                        expected: *len,
                        actual: nodes.len(),
                    }
                    .into());
                }
                Ok(nodes)
            }
            PatchList::Truncate(len) => {
                if *len > nodes.len() {
                    return Err(Mismatch::TruncateBeyondEnd {
                        len: *len,
                        current: nodes.len(),
                    }
                    .into());
                }
                let mut nodes = nodes;
                self.truncate(&mut nodes, *len)?;
                Ok(nodes)
            }
        }
    }

    fn list_all(&mut self, nodes: Vec<H::Node>, ops: &[ListOp]) -> Result<Vec<H::Node>, RenderError> {
        let mut sources: Vec<Option<H::Node>> = nodes.into_iter().map(Some).collect();
        let mut out = Vec::with_capacity(ops.len());
        for (position, op) in ops.iter().enumerate() {
            let node = match op {
                ListOp::Nop => take(&mut sources, position, true)?,
                ListOp::Modify(patch) => {
                    let node = take(&mut sources, position, true)?;
                    self.single(node, patch)?
                }
                ListOp::From(index) => take(&mut sources, *index, false)?,
                ListOp::FromModify(index, patch) => {
                    let node = take(&mut sources, *index, false)?;
                    self.single(node, patch)?
                }
                ListOp::New(single) => self.builder().single(single)?,
            };
            out.push(node);
        }
        for node in sources.into_iter().flatten() {
            self.drop_node(&node)?;
        }
        Ok(out)
    }

    fn truncate(&mut self, nodes: &mut Vec<H::Node>, len: usize) -> Result<(), RenderError> {
        if len < nodes.len() {
            for node in nodes.split_off(len) {
                self.drop_node(&node)?;
            }
        }
        Ok(())
    }
}

fn take<N>(sources: &mut [Option<N>], index: usize, in_place: bool) -> Result<N, Mismatch> {
    let len = sources.len();
    let Some(slot) = sources.get_mut(index) else {
        return Err(if in_place {
            Mismatch::NopOutOfBounds { index, len }
        } else {
            Mismatch::SourceOutOfBounds { index, len }
        });
    };
    slot.take().ok_or(Mismatch::SourceTaken { index })
}
