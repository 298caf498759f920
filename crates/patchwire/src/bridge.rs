//! Event bridge: handler attributes to host listeners, host events to
//! event records.
//!
//! Registrations are keyed by (host key, event kind). There is at most one
//! live listener per slot; registering into an occupied slot removes the
//! previous listener first.

use std::collections::HashMap;
use std::fmt;
use std::rc::Rc;

use patchwire_protocol::{Event, EventKind, EventRecord, HandlerId};
use tracing::trace;

use crate::host::{Callback, Host, HostError};

/// Receives every serialized event record.
pub type Sink = Rc<dyn Fn(&[u8])>;

struct Registration<L> {
    listener: L,
    handler: HandlerId,
}

pub struct EventBridge<H: Host> {
    registrations: HashMap<(H::Key, EventKind), Registration<H::Listener>>,
    sink: Sink,
}

impl<H: Host> fmt::Debug for EventBridge<H> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("EventBridge")
            .field("registrations", &self.registrations.len())
            .finish()
    }
}

impl<H: Host> EventBridge<H> {
    pub fn new(sink: Sink) -> Self {
        Self {
            registrations: HashMap::new(),
            sink,
        }
    }

    /// Installs the listener for `(node, kind)` that reports `handler`.
    pub fn register(
        &mut self,
        host: &mut H,
        node: &H::Node,
        kind: EventKind,
        handler: HandlerId,
    ) -> Result<(), HostError> {
        self.unregister(host, node, kind)?;
        let sink = self.sink.clone();
        let callback: Callback = Rc::new(move |event: &Event| {
            if event.kind() != kind {
                return;
            }
            let record = EventRecord::new(handler, *event).to_bytes();
            sink(record.as_slice());
        });
        let listener = host.add_listener(node, kind, callback)?;
        let key = host.key(node)?;
        trace!(?key, kind = kind.name(), %handler, "listener registered");
        self.registrations
            .insert((key, kind), Registration { listener, handler });
        Ok(())
    }

    /// Removes the listener for `(node, kind)`. Absent slots are a no-op.
    pub fn unregister(
        &mut self,
        host: &mut H,
        node: &H::Node,
        kind: EventKind,
    ) -> Result<(), HostError> {
        let key = host.key(node)?;
        if let Some(registration) = self.registrations.remove(&(key, kind)) {
            trace!(?key, kind = kind.name(), handler = %registration.handler, "listener removed");
            host.remove_listener(node, kind, registration.listener)?;
        }
        Ok(())
    }

    /// Removes every listener of one node.
    pub fn release(&mut self, host: &mut H, node: &H::Node) -> Result<(), HostError> {
        for kind in EventKind::ALL {
            self.unregister(host, node, kind)?;
        }
        Ok(())
    }

    /// Removes every listener of a node and all of its descendants.
    pub fn release_subtree(&mut self, host: &mut H, node: &H::Node) -> Result<(), HostError> {
        if self.registrations.is_empty() {
            return Ok(());
        }
        let mut stack = vec![node.clone()];
        while let Some(node) = stack.pop() {
            self.release(host, &node)?;
            stack.extend(host.children(&node)?);
        }
        Ok(())
    }

    /// Handler id currently registered for `(node, kind)`.
    pub fn handler(&self, host: &H, node: &H::Node, kind: EventKind) -> Option<HandlerId> {
        let key = host.key(node).ok()?;
        self.registrations.get(&(key, kind)).map(|r| r.handler)
    }

    /// Number of live registrations.
    pub fn len(&self) -> usize {
        self.registrations.len()
    }

    pub fn is_empty(&self) -> bool {
        self.registrations.is_empty()
    }
}
