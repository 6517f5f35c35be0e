use std::cell::{Cell, RefCell};
use std::collections::BTreeMap;
use std::fmt;
use std::rc::{Rc, Weak};

use codeflow_model::{
    names, Model, ModelError, NodeEvent, NodeId, NodeKind, NodeObserver, Point, PropertyValue,
};
use tracing::trace;

use crate::ViewError;

/// Closed mapping from node kinds to the view types that render them.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum ViewKind {
    Slide,
    DefaultNode,
}

impl ViewKind {
    pub fn for_node(kind: NodeKind) -> Result<Self, ViewError> {
        match kind {
            NodeKind::Slide => Ok(ViewKind::Slide),
            NodeKind::Default => Ok(ViewKind::DefaultNode),
            other => Err(ViewError::ViewNotFound(other)),
        }
    }
}

/// A visual child entry of a view.
#[derive(Clone)]
pub struct ChildView {
    pub view: Rc<NodeView>,
    pub location: Point,
}

impl fmt::Debug for ChildView {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ChildView")
            .field("node", &self.view.model_id())
            .field("location", &self.location)
            .finish()
    }
}

#[derive(Default)]
struct ViewState {
    visuals: BTreeMap<&'static str, PropertyValue>,
    children: Vec<ChildView>,
    parent: Weak<NodeView>,
    revision: u64,
}

/// View bound to a single model node.
pub struct NodeView {
    kind: ViewKind,
    model: NodeId,
    state: RefCell<ViewState>,
    disposed: Cell<bool>,
}

impl NodeView {
    pub(crate) fn new(kind: ViewKind, model: NodeId) -> Self {
        Self {
            kind,
            model,
            state: RefCell::new(ViewState::default()),
            disposed: Cell::new(false),
        }
    }

    pub fn kind(&self) -> ViewKind {
        self.kind
    }

    pub fn model_id(&self) -> NodeId {
        self.model
    }

    pub fn is_disposed(&self) -> bool {
        self.disposed.get()
    }

    /// Subscribes to the node and loads every property once.
    pub(crate) fn attach(self: &Rc<Self>, model: &mut Model) -> Result<(), ViewError> {
        model.subscribe(self.model, self)?;
        self.refresh(model)
    }

    /// Reloads the full property enumeration of the node.
    pub fn refresh(&self, model: &Model) -> Result<(), ViewError> {
        let mut visuals = BTreeMap::new();
        for name in model.property_names(self.model)? {
            visuals.insert(*name, model.property(self.model, name)?);
        }
        let mut state = self.state.borrow_mut();
        state.visuals = visuals;
        state.revision += 1;
        Ok(())
    }

    pub fn visual(&self, name: &str) -> Option<PropertyValue> {
        self.state.borrow().visuals.get(name).cloned()
    }

    pub fn name(&self) -> String {
        self.visual(names::NAME)
            .and_then(|value| value.as_text().map(str::to_string))
            .unwrap_or_default()
    }

    pub fn location(&self) -> Option<Point> {
        self.visual(names::LOCATION).and_then(|value| value.as_point())
    }

    /// Incremented on every visual update.
    pub fn revision(&self) -> u64 {
        self.state.borrow().revision
    }

    pub fn children(&self) -> Vec<ChildView> {
        self.state.borrow().children.clone()
    }

    pub fn child_count(&self) -> usize {
        self.state.borrow().children.len()
    }

    pub fn parent_view(&self) -> Option<Rc<NodeView>> {
        self.state.borrow().parent.upgrade()
    }

    /// Places `child` among this view's visual children. A child that is already
    /// present only has its location updated.
    pub fn add_child_view(self: &Rc<Self>, child: &Rc<NodeView>, location: Point) {
        {
            let mut state = self.state.borrow_mut();
            match state
                .children
                .iter_mut()
                .find(|entry| entry.view.model_id() == child.model_id())
            {
                Some(entry) => {
                    entry.view = Rc::clone(child);
                    entry.location = location;
                }
                None => state.children.push(ChildView {
                    view: Rc::clone(child),
                    location,
                }),
            }
            state.revision += 1;
        }
        child.state.borrow_mut().parent = Rc::downgrade(self);
    }

    /// Places `child` at the `location` property of its model node.
    pub fn add_child_view_at_model_location(
        self: &Rc<Self>,
        model: &Model,
        child: &Rc<NodeView>,
    ) -> Result<(), ViewError> {
        let node = child.model_id();
        let location = match model.property(node, names::LOCATION) {
            Ok(PropertyValue::Point(point)) => point,
            Ok(other) => {
                return Err(ViewError::LocationType {
                    node,
                    found: other.type_name(),
                })
            }
            Err(ModelError::PropertyNotFound { .. }) => {
                return Err(ViewError::MissingLocation { node })
            }
            Err(err) => return Err(err.into()),
        };
        self.add_child_view(child, location);
        Ok(())
    }

    pub fn remove_child_view(&self, node: NodeId) -> bool {
        let mut state = self.state.borrow_mut();
        let before = state.children.len();
        state.children.retain(|entry| entry.view.model_id() != node);
        let removed = state.children.len() != before;
        if removed {
            state.revision += 1;
        }
        removed
    }

    fn move_child(&self, node: NodeId, location: Point) {
        let mut state = self.state.borrow_mut();
        if let Some(entry) = state
            .children
            .iter_mut()
            .find(|entry| entry.view.model_id() == node)
        {
            entry.location = location;
            state.revision += 1;
        }
    }

    /// Unsubscribes from the node, leaves the parent view and drops the visual
    /// children.
    pub fn dispose(self: &Rc<Self>, model: &mut Model) {
        model.unsubscribe(self.model, self);
        if let Some(parent) = self.parent_view() {
            parent.remove_child_view(self.model);
        }
        self.mark_disposed();
    }

    fn mark_disposed(&self) {
        self.disposed.set(true);
        let mut state = self.state.borrow_mut();
        state.children.clear();
        state.parent = Weak::new();
    }
}

impl NodeObserver for NodeView {
    fn on_event(&self, model: &Model, event: &NodeEvent) {
        match *event {
            NodeEvent::PropertyChanged { node, property } if node == self.model => {
                let Ok(value) = model.property(node, property) else {
                    return;
                };
                let location = value.as_point().filter(|_| property == names::LOCATION);
                let parent = {
                    let mut state = self.state.borrow_mut();
                    state.visuals.insert(property, value);
                    state.revision += 1;
                    state.parent.upgrade()
                };
                if let (Some(parent), Some(location)) = (parent, location) {
                    parent.move_child(node, location);
                }
                trace!(%node, property, "view updated");
            }
            NodeEvent::ChildRemoved { parent, child } if parent == self.model => {
                self.remove_child_view(child);
            }
            NodeEvent::Disposed { node } if node == self.model => {
                if let Some(parent) = self.parent_view() {
                    parent.remove_child_view(node);
                }
                self.mark_disposed();
            }
            _ => {}
        }
    }
}

impl fmt::Debug for NodeView {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let state = self.state.borrow();
        f.debug_struct("NodeView")
            .field("kind", &self.kind)
            .field("model", &self.model)
            .field("children", &state.children.len())
            .field("revision", &state.revision)
            .field("disposed", &self.disposed.get())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use codeflow_model::{DefaultProps, NodeBody, Size};

    use super::*;

    #[test]
    fn only_slides_and_default_nodes_have_views() {
        assert_eq!(ViewKind::for_node(NodeKind::Slide), Ok(ViewKind::Slide));
        assert_eq!(ViewKind::for_node(NodeKind::Default), Ok(ViewKind::DefaultNode));
        assert_eq!(
            ViewKind::for_node(NodeKind::Link),
            Err(ViewError::ViewNotFound(NodeKind::Link))
        );
        assert_eq!(
            ViewKind::for_node(NodeKind::Visual),
            Err(ViewError::ViewNotFound(NodeKind::Visual))
        );
    }

    #[test]
    fn attached_view_mirrors_property_changes() {
        let mut model = Model::new();
        let node = model.create(
            "box",
            NodeBody::Default(DefaultProps::at(Point::new(1.0, 2.0), Size::new(3.0, 4.0))),
        );
        let view = Rc::new(NodeView::new(ViewKind::DefaultNode, node));
        view.attach(&mut model).unwrap();
        assert_eq!(view.location(), Some(Point::new(1.0, 2.0)));
        assert_eq!(view.name(), "box");
        let before = view.revision();

        model.set_property(node, names::SIZE, Size::new(9.0, 9.0)).unwrap();
        assert_eq!(
            view.visual(names::SIZE),
            Some(PropertyValue::Size(Size::new(9.0, 9.0)))
        );
        assert!(view.revision() > before);
    }

    #[test]
    fn moving_a_child_updates_the_parent_entry() {
        let mut model = Model::new();
        let slide = model.create("slide", NodeBody::Slide);
        let node = model.create("box", NodeBody::Default(DefaultProps::default()));
        model.add_child(slide, node).unwrap();

        let slide_view = Rc::new(NodeView::new(ViewKind::Slide, slide));
        let node_view = Rc::new(NodeView::new(ViewKind::DefaultNode, node));
        slide_view.attach(&mut model).unwrap();
        node_view.attach(&mut model).unwrap();
        slide_view
            .add_child_view_at_model_location(&model, &node_view)
            .unwrap();

        model
            .set_property(node, names::LOCATION, Point::new(40.0, 50.0))
            .unwrap();
        assert_eq!(slide_view.children()[0].location, Point::new(40.0, 50.0));

        slide_view.add_child_view(&node_view, Point::new(1.0, 1.0));
        assert_eq!(slide_view.child_count(), 1);
        assert_eq!(slide_view.children()[0].location, Point::new(1.0, 1.0));
    }

    #[test]
    fn slide_views_cannot_be_positioned_by_location() {
        let mut model = Model::new();
        let first = model.create("first", NodeBody::Slide);
        let second = model.create("second", NodeBody::Slide);
        let parent = Rc::new(NodeView::new(ViewKind::Slide, first));
        let child = Rc::new(NodeView::new(ViewKind::Slide, second));

        let err = parent
            .add_child_view_at_model_location(&model, &child)
            .unwrap_err();
        assert_eq!(err, ViewError::MissingLocation { node: second });
        assert_eq!(parent.child_count(), 0);
    }

    #[test]
    fn disposing_the_node_detaches_the_view() {
        let mut model = Model::new();
        let slide = model.create("slide", NodeBody::Slide);
        let node = model.create("box", NodeBody::Default(DefaultProps::default()));
        model.add_child(slide, node).unwrap();
        let slide_view = Rc::new(NodeView::new(ViewKind::Slide, slide));
        let node_view = Rc::new(NodeView::new(ViewKind::DefaultNode, node));
        slide_view.attach(&mut model).unwrap();
        node_view.attach(&mut model).unwrap();
        slide_view.add_child_view(&node_view, Point::default());

        model.dispose(node).unwrap();
        assert!(node_view.is_disposed());
        assert_eq!(slide_view.child_count(), 0);
        assert!(!slide_view.is_disposed());
    }
}
