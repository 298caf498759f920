//! Reads the live host tree back into the wire model.

use patchwire_protocol::{Attribute, AttributeList, Element, EventKind, Node, Single};

use crate::bridge::EventBridge;
use crate::builder::Mounted;
use crate::host::{Host, HostError};

pub fn snapshot_root<H: Host>(
    host: &H,
    bridge: &EventBridge<H>,
    root: &Mounted<H::Node>,
) -> Result<Node, HostError> {
    Ok(match root {
        Mounted::Single(node) => Node::Single(snapshot_single(host, bridge, node)?),
        Mounted::List(nodes) => Node::List(
            nodes
                .iter()
                .map(|node| snapshot_single(host, bridge, node))
                .collect::<Result<_, _>>()?,
        ),
    })
}

pub fn snapshot_single<H: Host>(
    host: &H,
    bridge: &EventBridge<H>,
    node: &H::Node,
) -> Result<Single, HostError> {
    let Some(name) = host.element_name(node) else {
        let text = host
            .text_content(node)
            .ok_or_else(|| HostError::new("node is neither text nor element"))?;
        return Ok(Single::Text(text));
    };
    let tag = name
        .tag()
        .ok_or_else(|| HostError::new(format!("foreign element {name}")))?;
    let mut attributes = AttributeList::new();
    if let Some(id) = host.attribute(node, "id") {
        attributes.insert(Attribute::Id(id));
    }
    for kind in EventKind::ALL {
        if let Some(handler) = bridge.handler(host, node, kind) {
            attributes.insert(Attribute::handler_for(kind, handler));
        }
    }
    let children = host
        .children(node)?
        .iter()
        .map(|child| snapshot_single(host, bridge, child))
        .collect::<Result<_, _>>()?;
    Ok(Single::Element(Element {
        tag,
        attributes,
        children,
    }))
}
