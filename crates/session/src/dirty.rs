use std::cell::Cell;

use codeflow_model::{Model, NodeEvent, NodeObserver};

/// Document-wide unsaved-changes flag, raised by any completed model change.
#[derive(Debug, Default)]
pub struct DirtyFlag {
    dirty: Cell<bool>,
}

impl DirtyFlag {
    pub fn is_dirty(&self) -> bool {
        self.dirty.get()
    }

    pub fn mark(&self) {
        self.dirty.set(true);
    }

    pub fn clear(&self) {
        self.dirty.set(false);
    }
}

impl NodeObserver for DirtyFlag {
    fn on_event(&self, _model: &Model, event: &NodeEvent) {
        if event.is_modification() {
            self.mark();
        }
    }
}
