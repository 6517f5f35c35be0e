use crate::{Model, NodeId};

/// Change notifications emitted by [`Model`].
///
/// For a single property write the order is always `PropertyChanging` followed by
/// `PropertyChanged` for the same node and property; observers only receive a shared
/// `&Model`, so no other write can be interleaved between the two.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum NodeEvent {
    /// The property is about to change; the old value is still readable.
    PropertyChanging { node: NodeId, property: &'static str },
    /// The property has changed; the new value is readable.
    PropertyChanged { node: NodeId, property: &'static str },
    /// The node's parent link was set.
    Reparented { node: NodeId, parent: Option<NodeId> },
    ChildrenChanged { node: NodeId },
    ChildAdded { parent: NodeId, child: NodeId },
    ChildRemoved { parent: NodeId, child: NodeId },
    /// The node is leaving the model; its observers are dropped right after.
    Disposed { node: NodeId },
}

impl NodeEvent {
    /// The node whose observers receive this event.
    pub fn node(&self) -> NodeId {
        match self {
            NodeEvent::PropertyChanging { node, .. }
            | NodeEvent::PropertyChanged { node, .. }
            | NodeEvent::Reparented { node, .. }
            | NodeEvent::ChildrenChanged { node }
            | NodeEvent::Disposed { node } => *node,
            NodeEvent::ChildAdded { parent, .. } | NodeEvent::ChildRemoved { parent, .. } => {
                *parent
            }
        }
    }

    /// Whether the event reflects a completed change to document content.
    pub fn is_modification(&self) -> bool {
        !matches!(
            self,
            NodeEvent::PropertyChanging { .. } | NodeEvent::Disposed { .. }
        )
    }
}

/// Receives [`NodeEvent`]s. Observers are held weakly by the model.
pub trait NodeObserver {
    fn on_event(&self, model: &Model, event: &NodeEvent);
}
