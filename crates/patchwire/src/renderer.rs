//! Owns one rendered tree and keeps it in sync with a core.

use std::cell::RefCell;
use std::rc::Rc;

use patchwire_protocol::{
    decode_message_with_depth, Core, Node, PatchElement, PatchNode, PatchSingle,
};
use tracing::{debug, error};

use crate::bridge::{EventBridge, Sink};
use crate::builder::{Builder, Mounted};
use crate::config::Config;
use crate::error::{Mismatch, RenderError};
use crate::host::Host;
use crate::patch::{apply_patch, Patcher};
use crate::snapshot::snapshot_root;

/// A host document driven by a rendering core.
///
/// The core is shared with the event sink, so events reach it while the
/// renderer is idle. A patch caused by an event is only applied on the next
/// [`Renderer::update`].
///
/// ```
/// use patchwire::{MemoryDocument, Renderer};
/// use patchwire_protocol::{encode_message, Core, Node, Single};
///
/// struct Static;
///
/// impl Core for Static {
///     fn produce_initial(&mut self) -> Vec<u8> {
///         encode_message(&Node::Single(Single::text("hello")))
///     }
///     fn produce_patch(&mut self) -> Option<Vec<u8>> {
///         None
///     }
///     fn handle_event(&mut self, _record: &[u8]) {}
/// }
///
/// let mut renderer = Renderer::new(MemoryDocument::new(), Static);
/// renderer.mount().unwrap();
/// assert!(!renderer.update().unwrap());
/// assert_eq!(renderer.snapshot().unwrap(), Some(Node::Single(Single::text("hello"))));
/// ```
pub struct Renderer<H: Host, C: Core> {
    host: H,
    core: Rc<RefCell<C>>,
    bridge: EventBridge<H>,
    root: Option<Mounted<H::Node>>,
    config: Config,
}

impl<H: Host, C: Core + 'static> Renderer<H, C> {
    pub fn new(host: H, core: C) -> Self {
        Self::with_config(host, core, Config::default())
    }

    pub fn with_config(host: H, core: C, config: Config) -> Self {
        let core = Rc::new(RefCell::new(core));
        let bridge = EventBridge::new(event_sink(core.clone()));
        Self {
            host,
            core,
            bridge,
            root: None,
            config,
        }
    }
}

fn event_sink<C: Core + 'static>(core: Rc<RefCell<C>>) -> Sink {
    Rc::new(move |record: &[u8]| match core.try_borrow_mut() {
        Ok(mut core) => core.handle_event(record),
        Err(_) => error!(len = record.len(), "core is busy, dropping event"),
    })
}

impl<H: Host, C: Core> Renderer<H, C> {
    pub fn host(&self) -> &H {
        &self.host
    }

    pub fn host_mut(&mut self) -> &mut H {
        &mut self.host
    }

    pub fn core(&self) -> &Rc<RefCell<C>> {
        &self.core
    }

    pub fn config(&self) -> &Config {
        &self.config
    }

    pub fn root(&self) -> Option<&Mounted<H::Node>> {
        self.root.as_ref()
    }

    /// Number of live event listeners.
    pub fn listener_count(&self) -> usize {
        self.bridge.len()
    }

    /// Builds the core's initial tree and mounts it, replacing any previous tree.
    pub fn mount(&mut self) -> Result<(), RenderError> {
        let bytes = self
            .core
            .try_borrow_mut()
            .map_err(|_| RenderError::CoreBusy)?
            .produce_initial();
        debug!(len = bytes.len(), "mount");
        let result = self.try_mount(&bytes);
        if let Err(err) = &result {
            error!(%err, class = ?err.class(), "mount aborted");
        }
        result
    }

    fn try_mount(&mut self, bytes: &[u8]) -> Result<(), RenderError> {
        self.check_len(bytes)?;
        let node: Node = decode_message_with_depth(bytes, self.config.max_depth)?;
        let root = Builder::new(&mut self.host, &mut self.bridge).node(&node)?;
        if let Some(old) = self.root.take() {
            Patcher::new(&mut self.host, &mut self.bridge).drop_root(&old)?;
        }
        self.host.mount(&root.nodes())?;
        self.root = Some(root);
        Ok(())
    }

    /// Pulls one patch from the core. Returns `false` if nothing changed.
    pub fn update(&mut self) -> Result<bool, RenderError> {
        let patch = self
            .core
            .try_borrow_mut()
            .map_err(|_| RenderError::CoreBusy)?
            .produce_patch();
        match patch {
            Some(bytes) => self.apply(&bytes).map(|()| true),
            None => Ok(false),
        }
    }

    /// Applies one encoded `PatchNode`.
    ///
    /// The message is decoded completely and checked against the live tree
    /// before anything is mutated, so every decode or mismatch error leaves
    /// the previous tree in place.
    pub fn apply(&mut self, bytes: &[u8]) -> Result<(), RenderError> {
        debug!(len = bytes.len(), "apply");
        let result = self.try_apply(bytes);
        if let Err(err) = &result {
            error!(%err, class = ?err.class(), "patch aborted");
        }
        result
    }

    fn try_apply(&mut self, bytes: &[u8]) -> Result<(), RenderError> {
        self.check_len(bytes)?;
        let patch: PatchNode = decode_message_with_depth(bytes, self.config.max_depth)?;
        let root = self.root.as_ref().ok_or(Mismatch::NotMounted)?;
        let new_root = apply_patch(&mut self.host, &mut self.bridge, root, &patch)?;
        if self.needs_remount(&patch, &new_root) {
            self.host.mount(&new_root.nodes())?;
        }
        self.root = Some(new_root);
        Ok(())
    }

    fn needs_remount(&self, patch: &PatchNode, new_root: &Mounted<H::Node>) -> bool {
        match patch {
            PatchNode::Replace(_) => true,
            PatchNode::Single(
                PatchSingle::Replace(_) | PatchSingle::Element(PatchElement::Replace(_)),
            ) => true,
            PatchNode::Single(PatchSingle::Element(PatchElement::Patch { .. })) => false,
            PatchNode::List(_) => {
                self.config.refresh_mount_on_list_patch || self.root.as_ref() != Some(new_root)
            }
        }
    }

    fn check_len(&self, bytes: &[u8]) -> Result<(), RenderError> {
        if bytes.len() > self.config.max_message_len {
            return Err(RenderError::MessageTooLarge {
                len: bytes.len(),
                max: self.config.max_message_len,
            });
        }
        Ok(())
    }

    /// Reads the live tree back, `None` before the first mount.
    pub fn snapshot(&self) -> Result<Option<Node>, RenderError> {
        match &self.root {
            Some(root) => Ok(Some(snapshot_root(&self.host, &self.bridge, root)?)),
            None => Ok(None),
        }
    }
}
