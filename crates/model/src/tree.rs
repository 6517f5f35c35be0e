use std::collections::HashMap;
use std::fmt;
use std::rc::{Rc, Weak};

use tracing::{debug, trace};

use crate::{
    ModelError, Node, NodeBody, NodeEvent, NodeId, NodeKind, NodeObserver, NodeRecord,
    PropertyValue,
};

/// Arena owning every live node of a document.
///
/// Parents own their children through ordered id lists; the `parent` field of a node
/// is a plain back-reference. Observers are held weakly and pruned whenever an event
/// is delivered to their node.
#[derive(Default)]
pub struct Model {
    nodes: HashMap<NodeId, Node>,
    watchers: Vec<Weak<dyn NodeObserver>>,
}

impl Model {
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates a standalone node with a fresh id.
    pub fn create(&mut self, name: impl Into<String>, body: NodeBody) -> NodeId {
        let id = NodeId::new();
        self.nodes.insert(id, Node::new(id, name.into(), body));
        id
    }

    pub fn contains(&self, id: NodeId) -> bool {
        self.nodes.contains_key(&id)
    }

    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    pub fn node(&self, id: NodeId) -> Option<&Node> {
        self.nodes.get(&id)
    }

    fn get(&self, id: NodeId) -> Result<&Node, ModelError> {
        self.nodes.get(&id).ok_or(ModelError::NodeNotFound(id))
    }

    fn get_mut(&mut self, id: NodeId) -> Result<&mut Node, ModelError> {
        self.nodes.get_mut(&id).ok_or(ModelError::NodeNotFound(id))
    }

    pub fn kind(&self, id: NodeId) -> Result<NodeKind, ModelError> {
        Ok(self.get(id)?.kind())
    }

    /// The recorded parent link. After `remove_child` this still names the old
    /// parent; see [`Model::attached_parent`] for the structural parent.
    pub fn parent(&self, id: NodeId) -> Result<Option<NodeId>, ModelError> {
        Ok(self.get(id)?.parent)
    }

    /// The parent whose child list currently contains `id`.
    pub fn attached_parent(&self, id: NodeId) -> Option<NodeId> {
        let parent = self.nodes.get(&id)?.parent?;
        self.nodes
            .get(&parent)
            .filter(|node| node.children.contains(&id))
            .map(|_| parent)
    }

    pub fn children(&self, id: NodeId) -> Result<&[NodeId], ModelError> {
        Ok(self.get(id)?.children())
    }

    /// Top-most attached ancestor of `id`, cached per node until its linkage changes.
    pub fn root(&self, id: NodeId) -> Result<NodeId, ModelError> {
        let node = self.get(id)?;
        if let Some(root) = node.root_cache.get() {
            return Ok(root);
        }
        let mut current = id;
        while let Some(parent) = self.attached_parent(current) {
            current = parent;
        }
        node.root_cache.set(Some(current));
        Ok(current)
    }

    fn invalidate_roots(&self, id: NodeId) {
        for node in self.subtree(id) {
            if let Some(node) = self.nodes.get(&node) {
                node.root_cache.set(None);
            }
        }
    }

    fn post_order(&self, root: NodeId) -> Vec<NodeId> {
        fn visit(nodes: &HashMap<NodeId, Node>, id: NodeId, out: &mut Vec<NodeId>) {
            if let Some(node) = nodes.get(&id) {
                for child in &node.children {
                    visit(nodes, *child, out);
                }
                out.push(id);
            }
        }
        let mut out = Vec::new();
        visit(&self.nodes, root, &mut out);
        out
    }

    fn is_self_or_ancestor(&self, candidate: NodeId, of: NodeId) -> bool {
        let mut current = Some(of);
        while let Some(id) = current {
            if id == candidate {
                return true;
            }
            current = self.attached_parent(id);
        }
        false
    }

    /// Appends `child` to `parent`'s children.
    ///
    /// Every check runs before the tree is touched, so a failed call leaves both
    /// nodes exactly as they were.
    pub fn add_child(&mut self, parent: NodeId, child: NodeId) -> Result<(), ModelError> {
        let parent_kind = self.get(parent)?.kind();
        let child_kind = self.get(child)?.kind();
        if !parent_kind.can_accept(child_kind) {
            return Err(ModelError::InvalidSubclass {
                parent: parent_kind,
                child: child_kind,
            });
        }
        if let Some(current) = self.attached_parent(child) {
            return Err(ModelError::AlreadyAttached {
                child,
                parent: current,
            });
        }
        if self.is_self_or_ancestor(child, parent) {
            return Err(ModelError::Cycle { parent, child });
        }

        self.get_mut(parent)?.children.push(child);
        self.get_mut(child)?.parent = Some(parent);
        self.invalidate_roots(child);

        self.emit(NodeEvent::Reparented {
            node: child,
            parent: Some(parent),
        });
        self.emit(NodeEvent::ChildrenChanged { node: parent });
        self.emit(NodeEvent::ChildAdded { parent, child });
        Ok(())
    }

    /// Removes `child` from `parent`'s children. Returns `false` when it was not
    /// listed there. The child keeps its `parent` link.
    pub fn remove_child(&mut self, parent: NodeId, child: NodeId) -> Result<bool, ModelError> {
        let children = &mut self.get_mut(parent)?.children;
        let Some(index) = children.iter().position(|id| *id == child) else {
            return Ok(false);
        };
        children.remove(index);
        self.invalidate_roots(child);

        self.emit(NodeEvent::ChildrenChanged { node: parent });
        self.emit(NodeEvent::ChildRemoved { parent, child });
        Ok(true)
    }

    /// Ids of `root` and its descendants in depth-first pre-order. Empty when
    /// `root` is unknown.
    pub fn subtree(&self, root: NodeId) -> Vec<NodeId> {
        let mut out = Vec::new();
        let mut stack = vec![root];
        while let Some(id) = stack.pop() {
            let Some(node) = self.nodes.get(&id) else {
                continue;
            };
            out.push(id);
            stack.extend(node.children.iter().rev().copied());
        }
        out
    }

    /// First node in pre-order under `root` (inclusive) matching `predicate`.
    pub fn find<P>(&self, root: NodeId, mut predicate: P) -> Option<&Node>
    where
        P: FnMut(&Node) -> bool,
    {
        self.subtree(root)
            .into_iter()
            .filter_map(|id| self.nodes.get(&id))
            .find(|node| predicate(node))
    }

    pub fn find_by_id(&self, root: NodeId, id: NodeId) -> Option<&Node> {
        self.find(root, |node| node.id == id)
    }

    /// Visits `root` and its descendants in pre-order.
    pub fn apply<F>(&self, root: NodeId, mut action: F) -> Result<(), ModelError>
    where
        F: FnMut(&Node),
    {
        self.get(root)?;
        for id in self.subtree(root) {
            if let Some(node) = self.nodes.get(&id) {
                action(node);
            }
        }
        Ok(())
    }

    pub fn property_names(&self, id: NodeId) -> Result<&'static [&'static str], ModelError> {
        Ok(self.get(id)?.property_names())
    }

    pub fn property(&self, id: NodeId, name: &str) -> Result<PropertyValue, ModelError> {
        self.get(id)?.property(name)
    }

    /// Writes a property by name.
    ///
    /// Returns `Ok(false)` and emits nothing when the value is unchanged. Otherwise
    /// `PropertyChanging` is delivered while the old value is still stored, then the
    /// value is written and `PropertyChanged` follows.
    pub fn set_property(
        &mut self,
        id: NodeId,
        name: &str,
        value: impl Into<PropertyValue>,
    ) -> Result<bool, ModelError> {
        let value = value.into();
        let Some(name) = self.get(id)?.check_write(name, &value)? else {
            return Ok(false);
        };
        self.emit(NodeEvent::PropertyChanging { node: id, property: name });
        self.get_mut(id)?.write_property(name, value);
        self.emit(NodeEvent::PropertyChanged { node: id, property: name });
        Ok(true)
    }

    /// Registers `observer` for events on `id`. Registering the same observer twice
    /// has no effect.
    pub fn subscribe<O>(&mut self, id: NodeId, observer: &Rc<O>) -> Result<(), ModelError>
    where
        O: NodeObserver + 'static,
    {
        let weak = Rc::downgrade(observer);
        let weak: Weak<dyn NodeObserver> = weak;
        let observers = &mut self.get_mut(id)?.observers;
        if !observers.iter().any(|existing| Weak::ptr_eq(existing, &weak)) {
            observers.push(weak);
        }
        Ok(())
    }

    pub fn unsubscribe<O>(&mut self, id: NodeId, observer: &Rc<O>) -> bool
    where
        O: NodeObserver + 'static,
    {
        let weak = Rc::downgrade(observer);
        let weak: Weak<dyn NodeObserver> = weak;
        let Some(node) = self.nodes.get_mut(&id) else {
            return false;
        };
        let before = node.observers.len();
        node.observers.retain(|existing| !Weak::ptr_eq(existing, &weak));
        node.observers.len() != before
    }

    /// Number of live observers registered on `id`.
    pub fn observer_count(&self, id: NodeId) -> usize {
        self.nodes.get(&id).map_or(0, |node| {
            node.observers
                .iter()
                .filter(|observer| observer.strong_count() > 0)
                .count()
        })
    }

    /// Registers `observer` for events on every node.
    pub fn watch<O>(&mut self, observer: &Rc<O>)
    where
        O: NodeObserver + 'static,
    {
        let weak = Rc::downgrade(observer);
        let weak: Weak<dyn NodeObserver> = weak;
        if !self.watchers.iter().any(|existing| Weak::ptr_eq(existing, &weak)) {
            self.watchers.push(weak);
        }
    }

    pub fn unwatch<O>(&mut self, observer: &Rc<O>) -> bool
    where
        O: NodeObserver + 'static,
    {
        let weak = Rc::downgrade(observer);
        let weak: Weak<dyn NodeObserver> = weak;
        let before = self.watchers.len();
        self.watchers.retain(|existing| !Weak::ptr_eq(existing, &weak));
        self.watchers.len() != before
    }

    fn emit(&mut self, event: NodeEvent) {
        let target = event.node();
        self.watchers.retain(|observer| observer.strong_count() > 0);
        let mut receivers: Vec<Rc<dyn NodeObserver>> = Vec::new();
        if let Some(node) = self.nodes.get_mut(&target) {
            node.observers.retain(|observer| observer.strong_count() > 0);
            receivers.extend(node.observers.iter().filter_map(Weak::upgrade));
        }
        receivers.extend(self.watchers.iter().filter_map(Weak::upgrade));
        trace!(?event, receivers = receivers.len(), "node event");

        let model: &Model = self;
        for receiver in receivers {
            receiver.on_event(model, &event);
        }
    }

    /// Disposes `root` and all of its descendants, children before parents.
    ///
    /// Each node receives `Disposed`, loses its observers and leaves the arena. A
    /// root that is attached somewhere is then removed from its parent's children.
    /// Returns the disposed ids in disposal order.
    pub fn dispose(&mut self, root: NodeId) -> Result<Vec<NodeId>, ModelError> {
        self.get(root)?;
        let parent = self.attached_parent(root);
        let order = self.post_order(root);

        for id in &order {
            self.emit(NodeEvent::Disposed { node: *id });
            if let Some(mut node) = self.nodes.remove(id) {
                node.observers.clear();
            }
        }

        if let Some(parent) = parent {
            if let Some(node) = self.nodes.get_mut(&parent) {
                node.children.retain(|id| *id != root);
            }
            self.emit(NodeEvent::ChildrenChanged { node: parent });
            self.emit(NodeEvent::ChildRemoved {
                parent,
                child: root,
            });
        }
        debug!(%root, nodes = order.len(), "disposed subtree");
        Ok(order)
    }

    /// Serializable copy of the subtree under `root`.
    pub fn export(&self, root: NodeId) -> Result<NodeRecord, ModelError> {
        let node = self.get(root)?;
        let children = node
            .children
            .iter()
            .map(|child| self.export(*child))
            .collect::<Result<Vec<_>, _>>()?;
        Ok(NodeRecord {
            id: node.id,
            name: node.name.clone(),
            body: node.body.clone(),
            children,
        })
    }

    /// Inserts a persisted subtree and rebuilds its parent links.
    ///
    /// The whole record is validated before anything is inserted: see
    /// [`NodeRecord::validate`], and no id may already be known to this model.
    pub fn import(&mut self, record: NodeRecord) -> Result<NodeId, ModelError> {
        let ids = record.validate()?;
        if let Some(existing) = ids.iter().find(|id| self.contains(**id)) {
            return Err(ModelError::DuplicateId(*existing));
        }
        let root = self.insert_record(record);
        self.repair_parent_links(root)?;
        debug!(%root, nodes = ids.len(), "imported subtree");
        Ok(root)
    }

    fn insert_record(&mut self, record: NodeRecord) -> NodeId {
        let NodeRecord {
            id,
            name,
            body,
            children,
        } = record;
        id.reserve();
        let mut node = Node::new(id, name, body);
        node.children = children
            .into_iter()
            .map(|child| self.insert_record(child))
            .collect();
        self.nodes.insert(id, node);
        id
    }

    /// Points every child under `root` back at the node listing it, top-down.
    pub fn repair_parent_links(&mut self, root: NodeId) -> Result<(), ModelError> {
        self.get(root)?;
        for id in self.subtree(root) {
            let children = self.get(id)?.children.clone();
            for child in children {
                self.get_mut(child)?.parent = Some(id);
            }
        }
        self.invalidate_roots(root);
        Ok(())
    }
}

impl fmt::Debug for Model {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Model")
            .field("nodes", &self.nodes.len())
            .field("watchers", &self.watchers.len())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use std::cell::RefCell;

    use super::*;
    use crate::property::names;
    use crate::{DefaultProps, Point, VisualProps};

    #[derive(Default)]
    struct Recorder {
        events: RefCell<Vec<NodeEvent>>,
        seen_names: RefCell<Vec<String>>,
    }

    impl NodeObserver for Recorder {
        fn on_event(&self, model: &Model, event: &NodeEvent) {
            if let NodeEvent::PropertyChanging { node, .. } | NodeEvent::PropertyChanged { node, .. } =
                event
            {
                if let Some(node) = model.node(*node) {
                    self.seen_names.borrow_mut().push(node.name().to_string());
                }
            }
            self.events.borrow_mut().push(event.clone());
        }
    }

    fn slide_with_box(model: &mut Model) -> (NodeId, NodeId) {
        let slide = model.create("slide", NodeBody::Slide);
        let node = model.create("box", NodeBody::Default(DefaultProps::default()));
        model.add_child(slide, node).unwrap();
        (slide, node)
    }

    #[test]
    fn rejected_child_leaves_tree_untouched() {
        let mut model = Model::new();
        let collection = model.create("doc", NodeBody::SlideCollection);
        let node = model.create("box", NodeBody::Default(DefaultProps::default()));

        let err = model.add_child(collection, node).unwrap_err();
        assert_eq!(
            err,
            ModelError::InvalidSubclass {
                parent: NodeKind::SlideCollection,
                child: NodeKind::Default,
            }
        );
        assert!(model.children(collection).unwrap().is_empty());
        assert_eq!(model.parent(node).unwrap(), None);
    }

    #[test]
    fn add_child_emits_structural_events_in_order() {
        let mut model = Model::new();
        let slide = model.create("slide", NodeBody::Slide);
        let node = model.create("box", NodeBody::Visual(VisualProps::default()));
        let recorder = Rc::new(Recorder::default());
        model.watch(&recorder);

        model.add_child(slide, node).unwrap();

        assert_eq!(
            *recorder.events.borrow(),
            vec![
                NodeEvent::Reparented {
                    node,
                    parent: Some(slide)
                },
                NodeEvent::ChildrenChanged { node: slide },
                NodeEvent::ChildAdded {
                    parent: slide,
                    child: node
                },
            ]
        );
        assert_eq!(model.parent(node).unwrap(), Some(slide));
        assert_eq!(model.children(slide).unwrap(), &[node]);
    }

    #[test]
    fn child_cannot_join_a_second_parent() {
        let mut model = Model::new();
        let (slide, node) = slide_with_box(&mut model);
        let other = model.create("other", NodeBody::Slide);

        let err = model.add_child(other, node).unwrap_err();
        assert_eq!(
            err,
            ModelError::AlreadyAttached {
                child: node,
                parent: slide
            }
        );
    }

    #[test]
    fn ancestors_cannot_become_children() {
        let mut model = Model::new();
        let outer = model.create("outer", NodeBody::Visual(VisualProps::default()));
        let inner = model.create("inner", NodeBody::Visual(VisualProps::default()));
        model.add_child(outer, inner).unwrap();

        assert_eq!(
            model.add_child(inner, outer).unwrap_err(),
            ModelError::Cycle {
                parent: inner,
                child: outer
            }
        );
        assert_eq!(
            model.add_child(outer, outer).unwrap_err(),
            ModelError::Cycle {
                parent: outer,
                child: outer
            }
        );
    }

    #[test]
    fn property_change_pair_brackets_the_write() {
        let mut model = Model::new();
        let (_, node) = slide_with_box(&mut model);
        let recorder = Rc::new(Recorder::default());
        model.subscribe(node, &recorder).unwrap();

        assert!(model.set_property(node, names::NAME, "renamed").unwrap());

        assert_eq!(
            *recorder.events.borrow(),
            vec![
                NodeEvent::PropertyChanging {
                    node,
                    property: names::NAME
                },
                NodeEvent::PropertyChanged {
                    node,
                    property: names::NAME
                },
            ]
        );
        assert_eq!(*recorder.seen_names.borrow(), vec!["box", "renamed"]);
    }

    #[test]
    fn unchanged_value_is_silent() {
        let mut model = Model::new();
        let (_, node) = slide_with_box(&mut model);
        let recorder = Rc::new(Recorder::default());
        model.subscribe(node, &recorder).unwrap();

        let changed = model
            .set_property(node, names::LOCATION, Point::default())
            .unwrap();
        assert!(!changed);
        assert!(recorder.events.borrow().is_empty());
    }

    #[test]
    fn failed_write_emits_nothing() {
        let mut model = Model::new();
        let slide = model.create("slide", NodeBody::Slide);
        let recorder = Rc::new(Recorder::default());
        model.subscribe(slide, &recorder).unwrap();

        let err = model
            .set_property(slide, names::LOCATION, Point::new(1.0, 1.0))
            .unwrap_err();
        assert!(matches!(err, ModelError::PropertyNotFound { .. }));
        assert!(recorder.events.borrow().is_empty());
    }

    #[test]
    fn dropped_observers_are_pruned() {
        let mut model = Model::new();
        let (_, node) = slide_with_box(&mut model);
        let recorder = Rc::new(Recorder::default());
        model.subscribe(node, &recorder).unwrap();
        model.subscribe(node, &recorder).unwrap();
        assert_eq!(model.observer_count(node), 1);

        drop(recorder);
        assert_eq!(model.observer_count(node), 0);
        model.set_property(node, names::NAME, "still works").unwrap();
    }

    #[test]
    fn unsubscribe_stops_delivery() {
        let mut model = Model::new();
        let (_, node) = slide_with_box(&mut model);
        let recorder = Rc::new(Recorder::default());
        model.subscribe(node, &recorder).unwrap();
        assert!(model.unsubscribe(node, &recorder));
        assert!(!model.unsubscribe(node, &recorder));

        model.set_property(node, names::NAME, "quiet").unwrap();
        assert!(recorder.events.borrow().is_empty());
    }

    #[test]
    fn dispose_runs_children_first_and_unlinks_root() {
        let mut model = Model::new();
        let collection = model.create("doc", NodeBody::SlideCollection);
        let (slide, node) = slide_with_box(&mut model);
        model.add_child(collection, slide).unwrap();
        let recorder = Rc::new(Recorder::default());
        model.subscribe(node, &recorder).unwrap();

        let disposed = model.dispose(slide).unwrap();

        assert_eq!(disposed, vec![node, slide]);
        assert!(!model.contains(node));
        assert!(!model.contains(slide));
        assert!(model.children(collection).unwrap().is_empty());
        assert_eq!(
            *recorder.events.borrow(),
            vec![NodeEvent::Disposed { node }]
        );
    }

    #[test]
    fn root_follows_reattachment() {
        let mut model = Model::new();
        let (slide, node) = slide_with_box(&mut model);
        assert_eq!(model.root(node).unwrap(), slide);

        let collection = model.create("doc", NodeBody::SlideCollection);
        model.add_child(collection, slide).unwrap();
        assert_eq!(model.root(node).unwrap(), collection);

        model.remove_child(collection, slide).unwrap();
        assert_eq!(model.root(node).unwrap(), slide);
    }

    #[test]
    fn traversal_is_pre_order() {
        let mut model = Model::new();
        let slide = model.create("slide", NodeBody::Slide);
        let a = model.create("a", NodeBody::Visual(VisualProps::default()));
        let a1 = model.create("a1", NodeBody::Visual(VisualProps::default()));
        let b = model.create("b", NodeBody::Visual(VisualProps::default()));
        model.add_child(slide, a).unwrap();
        model.add_child(a, a1).unwrap();
        model.add_child(slide, b).unwrap();

        assert_eq!(model.subtree(slide), vec![slide, a, a1, b]);

        let mut visited = Vec::new();
        model
            .apply(slide, |node| visited.push(node.name().to_string()))
            .unwrap();
        assert_eq!(visited, vec!["slide", "a", "a1", "b"]);

        let found = model.find(slide, |node| node.name().starts_with('a') && node.id() != a);
        assert_eq!(found.map(Node::id), Some(a1));
        assert_eq!(model.find_by_id(slide, b).map(Node::id), Some(b));
        assert!(model.find_by_id(a, b).is_none());
    }

    #[test]
    fn import_rejects_duplicate_ids_before_inserting() {
        let mut model = Model::new();
        let (slide, _) = slide_with_box(&mut model);
        let record = model.export(slide).unwrap();
        let before = model.len();

        let err = model.import(record).unwrap_err();
        assert_eq!(err, ModelError::DuplicateId(slide));
        assert_eq!(model.len(), before);
    }
}
