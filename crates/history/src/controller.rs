use std::cell::{Cell, RefCell};
use std::collections::VecDeque;
use std::fmt;
use std::rc::Rc;

use codeflow_model::{is_ignored, Model, NodeEvent, NodeId, NodeObserver};
use tracing::{debug, warn};

use crate::{HistoryError, Memento};

#[derive(Default)]
struct Stacks {
    undo: VecDeque<Memento>,
    redo: Vec<Memento>,
}

/// Undo/redo stacks fed by property-change notifications of tracked nodes.
///
/// The controller is shared as `Rc` because the model only keeps a weak
/// reference to it. A new recorded change clears the redo stack; changes made
/// while an undo or redo is being applied are never recorded.
pub struct HistoryController {
    stacks: RefCell<Stacks>,
    restoring: Cell<bool>,
    limit: usize,
}

/// Marks the controller as restoring for as long as it lives.
struct RestoreGuard<'a> {
    flag: &'a Cell<bool>,
    previous: bool,
}

impl<'a> RestoreGuard<'a> {
    fn enter(flag: &'a Cell<bool>) -> Self {
        let previous = flag.replace(true);
        Self { flag, previous }
    }
}

impl Drop for RestoreGuard<'_> {
    fn drop(&mut self) {
        self.flag.set(self.previous);
    }
}

impl Default for HistoryController {
    fn default() -> Self {
        Self::new()
    }
}

impl HistoryController {
    /// Unbounded history.
    pub fn new() -> Self {
        Self::with_limit(0)
    }

    /// History keeping at most `limit` undo entries; `0` means unbounded.
    pub fn with_limit(limit: usize) -> Self {
        Self {
            stacks: RefCell::new(Stacks::default()),
            restoring: Cell::new(false),
            limit,
        }
    }

    pub fn limit(&self) -> Option<usize> {
        (self.limit > 0).then_some(self.limit)
    }

    /// Starts recording property changes of `node`.
    pub fn track(self: &Rc<Self>, model: &mut Model, node: NodeId) -> Result<(), HistoryError> {
        model.subscribe(node, self)?;
        Ok(())
    }

    /// Tracks `root` and every node currently below it.
    pub fn track_subtree(self: &Rc<Self>, model: &mut Model, root: NodeId) -> Result<(), HistoryError> {
        for node in model.subtree(root) {
            self.track(model, node)?;
        }
        Ok(())
    }

    pub fn untrack(self: &Rc<Self>, model: &mut Model, node: NodeId) -> bool {
        model.unsubscribe(node, self)
    }

    /// Pushes a memento onto the undo stack as a new change.
    pub fn record(&self, memento: Memento) {
        let mut stacks = self.stacks.borrow_mut();
        stacks.redo.clear();
        stacks.undo.push_back(memento);
        self.enforce_limit(&mut stacks);
    }

    fn enforce_limit(&self, stacks: &mut Stacks) {
        if self.limit == 0 {
            return;
        }
        while stacks.undo.len() > self.limit {
            stacks.undo.pop_front();
        }
    }

    /// Reverts the most recent change. Returns `Ok(false)` when there is nothing
    /// to undo.
    pub fn undo(&self, model: &mut Model) -> Result<bool, HistoryError> {
        let Some(memento) = self.stacks.borrow_mut().undo.pop_back() else {
            return Ok(false);
        };
        let inverse = self.apply(model, &memento)?;
        self.stacks.borrow_mut().redo.push(inverse);
        debug!(node = %memento.node(), "undo");
        Ok(true)
    }

    /// Re-applies the most recently undone change. Returns `Ok(false)` when there
    /// is nothing to redo.
    pub fn redo(&self, model: &mut Model) -> Result<bool, HistoryError> {
        let Some(memento) = self.stacks.borrow_mut().redo.pop() else {
            return Ok(false);
        };
        let inverse = self.apply(model, &memento)?;
        let mut stacks = self.stacks.borrow_mut();
        stacks.undo.push_back(inverse);
        self.enforce_limit(&mut stacks);
        debug!(node = %memento.node(), "redo");
        Ok(true)
    }

    fn apply(&self, model: &mut Model, memento: &Memento) -> Result<Memento, HistoryError> {
        let _guard = RestoreGuard::enter(&self.restoring);
        memento.restore(model).map_err(|err| {
            warn!(node = %memento.node(), %err, "dropping history entry that no longer applies");
            err
        })
    }

    /// Drops every entry that targets `node`. Returns how many were removed.
    pub fn forget(&self, node: NodeId) -> usize {
        let mut stacks = self.stacks.borrow_mut();
        let before = stacks.undo.len() + stacks.redo.len();
        stacks.undo.retain(|memento| memento.node() != node);
        stacks.redo.retain(|memento| memento.node() != node);
        before - stacks.undo.len() - stacks.redo.len()
    }

    pub fn is_restoring(&self) -> bool {
        self.restoring.get()
    }

    pub fn can_undo(&self) -> bool {
        !self.stacks.borrow().undo.is_empty()
    }

    pub fn can_redo(&self) -> bool {
        !self.stacks.borrow().redo.is_empty()
    }

    pub fn undo_depth(&self) -> usize {
        self.stacks.borrow().undo.len()
    }

    pub fn redo_depth(&self) -> usize {
        self.stacks.borrow().redo.len()
    }

    pub fn clear(&self) {
        let mut stacks = self.stacks.borrow_mut();
        stacks.undo.clear();
        stacks.redo.clear();
    }
}

impl NodeObserver for HistoryController {
    fn on_event(&self, model: &Model, event: &NodeEvent) {
        let NodeEvent::PropertyChanging { node, property } = event else {
            return;
        };
        if self.restoring.get() || is_ignored(property) {
            return;
        }
        match Memento::capture_one(model, *node, property) {
            Ok(memento) => self.record(memento),
            Err(err) => warn!(%node, property, %err, "could not snapshot property"),
        }
    }
}

impl fmt::Debug for HistoryController {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("HistoryController")
            .field("undo_depth", &self.undo_depth())
            .field("redo_depth", &self.redo_depth())
            .field("limit", &self.limit)
            .field("restoring", &self.restoring.get())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use codeflow_model::{names, NodeBody, PropertyValue};

    use super::*;

    fn tracked_slide() -> (Model, Rc<HistoryController>, NodeId) {
        let mut model = Model::new();
        let slide = model.create("slide", NodeBody::Slide);
        let history = Rc::new(HistoryController::new());
        history.track(&mut model, slide).unwrap();
        (model, history, slide)
    }

    fn name_of(model: &Model, node: NodeId) -> PropertyValue {
        model.property(node, names::NAME).unwrap()
    }

    #[test]
    fn empty_stacks_are_no_ops() {
        let (mut model, history, slide) = tracked_slide();
        assert!(!history.undo(&mut model).unwrap());
        assert!(!history.redo(&mut model).unwrap());
        assert_eq!(name_of(&model, slide), PropertyValue::Text("slide".into()));
    }

    #[test]
    fn undo_and_redo_move_one_entry_between_stacks() {
        let (mut model, history, slide) = tracked_slide();
        model.set_property(slide, names::NAME, "renamed").unwrap();
        assert_eq!(history.undo_depth(), 1);

        assert!(history.undo(&mut model).unwrap());
        assert_eq!(name_of(&model, slide), PropertyValue::Text("slide".into()));
        assert_eq!((history.undo_depth(), history.redo_depth()), (0, 1));

        assert!(history.redo(&mut model).unwrap());
        assert_eq!(name_of(&model, slide), PropertyValue::Text("renamed".into()));
        assert_eq!((history.undo_depth(), history.redo_depth()), (1, 0));
    }

    #[test]
    fn restoring_does_not_record() {
        let (mut model, history, slide) = tracked_slide();
        model.set_property(slide, names::NAME, "a").unwrap();
        model.set_property(slide, names::NAME, "b").unwrap();
        history.undo(&mut model).unwrap();
        assert!(!history.is_restoring());
        assert_eq!(history.undo_depth(), 1);
        assert_eq!(history.redo_depth(), 1);
    }

    #[test]
    fn limit_discards_oldest_entries() {
        let mut model = Model::new();
        let slide = model.create("slide", NodeBody::Slide);
        let history = Rc::new(HistoryController::with_limit(2));
        history.track(&mut model, slide).unwrap();

        for name in ["one", "two", "three"] {
            model.set_property(slide, names::NAME, name).unwrap();
        }
        assert_eq!(history.undo_depth(), 2);
        while history.undo(&mut model).unwrap() {}
        assert_eq!(name_of(&model, slide), PropertyValue::Text("one".into()));
    }

    #[test]
    fn forget_removes_entries_of_one_node() {
        let (mut model, history, slide) = tracked_slide();
        let other = model.create("other", NodeBody::Slide);
        history.track(&mut model, other).unwrap();
        model.set_property(slide, names::NAME, "a").unwrap();
        model.set_property(other, names::NAME, "b").unwrap();
        model.set_property(slide, names::NAME, "c").unwrap();
        history.undo(&mut model).unwrap();

        assert_eq!(history.forget(slide), 2);
        assert_eq!(history.undo_depth(), 1);
        assert!(!history.can_redo());
    }

    #[test]
    fn stale_entry_is_dropped_with_an_error() {
        let (mut model, history, slide) = tracked_slide();
        model.set_property(slide, names::NAME, "gone soon").unwrap();
        model.dispose(slide).unwrap();

        let err = history.undo(&mut model).unwrap_err();
        assert!(matches!(err, HistoryError::Model(_)));
        assert!(!history.can_undo());
        assert!(!history.can_redo());
    }
}
