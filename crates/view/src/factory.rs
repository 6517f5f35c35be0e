use std::collections::HashMap;
use std::rc::{Rc, Weak};

use codeflow_model::{Model, NodeId};
use tracing::{debug, trace, warn};

use crate::{NodeView, ViewError, ViewKind};

/// Creates views for model nodes and caches them by node id.
///
/// Entries are weak: a view lives as long as its owner (a parent view or the
/// host) holds it. An entry whose view was dropped, was disposed, or whose node
/// left the model counts as a miss and is removed when looked up.
#[derive(Debug, Default)]
pub struct ViewFactory {
    cache: HashMap<NodeId, Weak<NodeView>>,
}

impl ViewFactory {
    pub fn new() -> Self {
        Self::default()
    }

    fn live(view: &Weak<NodeView>, model: &Model, node: NodeId) -> Option<Rc<NodeView>> {
        view.upgrade()
            .filter(|view| !view.is_disposed() && model.contains(node))
    }

    fn cached(&mut self, model: &Model, node: NodeId) -> Option<Rc<NodeView>> {
        let entry = self.cache.get(&node)?;
        match Self::live(entry, model, node) {
            Some(view) => Some(view),
            None => {
                trace!(%node, "purging stale view entry");
                self.cache.remove(&node);
                None
            }
        }
    }

    /// Returns the cached view for `node`, creating and attaching one on a miss.
    pub fn get_view(&mut self, model: &mut Model, node: NodeId) -> Result<Rc<NodeView>, ViewError> {
        if let Some(view) = self.cached(model, node) {
            return Ok(view);
        }
        let kind = ViewKind::for_node(model.kind(node)?)?;
        let view = Rc::new(NodeView::new(kind, node));
        view.attach(model)?;
        self.cache.insert(node, Rc::downgrade(&view));
        debug!(%node, ?kind, "created view");
        Ok(view)
    }

    /// Returns the view for `root` with the views of all its descendants attached
    /// as visual children, each positioned at its node's `location`.
    ///
    /// On error the hierarchy may be partially built: siblings materialized
    /// before the failing child stay attached. Calling again is safe since
    /// re-adding a child view only updates its location.
    pub fn get_hierarchy(&mut self, model: &mut Model, root: NodeId) -> Result<Rc<NodeView>, ViewError> {
        let view = self.get_view(model, root)?;
        let children = model.children(root)?.to_vec();
        for child in children {
            let child_view = self.get_hierarchy(model, child)?;
            view.add_child_view_at_model_location(model, &child_view)?;
        }
        Ok(view)
    }

    /// Builds a fresh view for `node` that is neither cached nor subscribed to
    /// the node. Its visuals are a one-off copy of the node's properties.
    pub fn instantiate_detached(&self, model: &Model, node: NodeId) -> Result<Rc<NodeView>, ViewError> {
        let kind = ViewKind::for_node(model.kind(node)?)?;
        warn!(%node, ?kind, "instantiating a detached view outside the cache");
        let view = Rc::new(NodeView::new(kind, node));
        view.refresh(model)?;
        Ok(view)
    }

    pub fn has_cached_view(&self, model: &Model, node: NodeId) -> bool {
        self.cache
            .get(&node)
            .and_then(|entry| Self::live(entry, model, node))
            .is_some()
    }

    /// Evicts and disposes the views of `root` and its descendants. Returns the
    /// number of live views released.
    pub fn release(&mut self, model: &mut Model, root: NodeId) -> usize {
        let views: Vec<Rc<NodeView>> = model
            .subtree(root)
            .into_iter()
            .filter_map(|node| self.cache.remove(&node))
            .filter_map(|entry| entry.upgrade())
            .collect();
        for view in &views {
            view.dispose(model);
        }
        debug!(%root, released = views.len(), "released views");
        views.len()
    }

    /// Drops every stale entry. Returns how many were removed.
    pub fn purge(&mut self, model: &Model) -> usize {
        let before = self.cache.len();
        self.cache
            .retain(|node, entry| Self::live(entry, model, *node).is_some());
        before - self.cache.len()
    }

    /// Number of entries, stale ones included.
    pub fn len(&self) -> usize {
        self.cache.len()
    }

    pub fn is_empty(&self) -> bool {
        self.cache.is_empty()
    }
}
