use std::fmt;
use std::rc::Rc;

use codeflow_history::HistoryController;
use codeflow_model::{Model, NodeId};
use codeflow_settings::Preferences;
use codeflow_view::{NodeView, ViewFactory};
use tracing::debug;

use crate::{DirtyFlag, SessionError, UiHub};

/// Everything the document core shares with the host: the model arena, its
/// history and view cache, the dirty flag and the UI collaborators.
pub struct AppContext {
    pub model: Model,
    pub history: Rc<HistoryController>,
    pub views: ViewFactory,
    pub hub: UiHub,
    dirty: Rc<DirtyFlag>,
    preferences: Preferences,
    current_slide: Option<Rc<NodeView>>,
}

impl AppContext {
    pub fn new(preferences: Preferences) -> Self {
        let mut model = Model::new();
        let dirty = Rc::new(DirtyFlag::default());
        model.watch(&dirty);
        let history = Rc::new(HistoryController::with_limit(
            preferences.editor.history_limit,
        ));
        Self {
            model,
            history,
            views: ViewFactory::new(),
            hub: UiHub::new(),
            dirty,
            preferences,
            current_slide: None,
        }
    }

    pub fn preferences(&self) -> &Preferences {
        &self.preferences
    }

    pub fn is_dirty(&self) -> bool {
        self.dirty.is_dirty()
    }

    pub fn mark_dirty(&self) {
        self.dirty.mark();
    }

    pub fn clear_dirty(&self) {
        self.dirty.clear();
    }

    pub fn current_slide(&self) -> Option<&Rc<NodeView>> {
        self.current_slide.as_ref()
    }

    pub fn current_slide_id(&self) -> Option<NodeId> {
        self.current_slide.as_ref().map(|view| view.model_id())
    }

    /// Makes `view` the current slide and tells the UI about it.
    pub fn set_current_slide(&mut self, view: Rc<NodeView>) -> Result<(), SessionError> {
        debug!(slide = %view.model_id(), "slide selected");
        self.current_slide = Some(Rc::clone(&view));
        self.hub.slide_selected(&view)
    }

    /// Materializes the view hierarchy of `slide` and makes it current.
    pub fn select_slide(&mut self, slide: NodeId) -> Result<(), SessionError> {
        let view = self.views.get_hierarchy(&mut self.model, slide)?;
        self.set_current_slide(view)
    }

    /// Rebuilds the current slide's hierarchy so views exist for nodes added
    /// since it was selected.
    pub fn refresh_current_slide(&mut self) -> Result<(), SessionError> {
        let slide = self.current_slide_id().ok_or(SessionError::NoCurrentSlide)?;
        self.views.get_hierarchy(&mut self.model, slide)?;
        Ok(())
    }

    /// Tells the UI to let go of the current slide, if there is one.
    pub fn detach_current_slide(&mut self) -> Result<(), SessionError> {
        if let Some(view) = self.current_slide.as_ref() {
            debug!(slide = %view.model_id(), "detaching slide");
            self.hub.detach_slide(view)?;
        }
        self.current_slide = None;
        Ok(())
    }
}

impl fmt::Debug for AppContext {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("AppContext")
            .field("model", &self.model)
            .field("history", &self.history)
            .field("views", &self.views.len())
            .field("dirty", &self.is_dirty())
            .field("current_slide", &self.current_slide_id())
            .finish()
    }
}
