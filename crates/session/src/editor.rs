use codeflow_model::{names, DefaultProps, NodeBody, NodeId, Point, PropertyValue, Size};
use codeflow_settings::Preferences;
use tracing::debug;

use crate::{AppContext, DocumentStore, FileController, SessionError};

/// Facade the host UI talks to: one [`AppContext`] plus the [`FileController`]
/// managing its document.
#[derive(Debug)]
pub struct Editor<S> {
    pub context: AppContext,
    pub files: FileController<S>,
}

impl<S: DocumentStore> Editor<S> {
    pub fn new(store: S, preferences: Preferences) -> Self {
        Self {
            context: AppContext::new(preferences),
            files: FileController::new(store),
        }
    }

    pub fn new_file(&mut self) -> Result<bool, SessionError> {
        self.files.new_file(&mut self.context)
    }

    pub fn open(&mut self) -> Result<bool, SessionError> {
        self.files.open(&mut self.context)
    }

    pub fn save(&mut self) -> Result<bool, SessionError> {
        self.files.save(&mut self.context)
    }

    pub fn save_as(&mut self) -> Result<bool, SessionError> {
        self.files.save_as(&mut self.context)
    }

    pub fn close(&mut self) -> Result<bool, SessionError> {
        self.files.close(&mut self.context)
    }

    pub fn is_dirty(&self) -> bool {
        self.context.is_dirty()
    }

    pub fn can_undo(&self) -> bool {
        self.context.history.can_undo()
    }

    pub fn can_redo(&self) -> bool {
        self.context.history.can_redo()
    }

    pub fn undo(&mut self) -> Result<bool, SessionError> {
        let ctx = &mut self.context;
        Ok(ctx.history.undo(&mut ctx.model)?)
    }

    pub fn redo(&mut self) -> Result<bool, SessionError> {
        let ctx = &mut self.context;
        Ok(ctx.history.redo(&mut ctx.model)?)
    }

    /// Reports `node` to the UI as the selected node.
    pub fn select_node(&mut self, node: NodeId) -> Result<(), SessionError> {
        self.context.model.kind(node)?;
        self.context.hub.node_selected(node)
    }

    /// Appends a new slide to the open document without selecting it.
    pub fn add_slide(&mut self, name: impl Into<String>) -> Result<NodeId, SessionError> {
        let document = self.files.document().ok_or(SessionError::NoDocument)?;
        let ctx = &mut self.context;
        let slide = ctx.model.create(name, NodeBody::Slide);
        ctx.model.add_child(document, slide)?;
        ctx.history.track(&mut ctx.model, slide)?;
        debug!(%slide, "added slide");
        Ok(slide)
    }

    pub fn select_slide(&mut self, slide: NodeId) -> Result<(), SessionError> {
        self.context.select_slide(slide)
    }

    /// Adds a default node at `location` on the current slide, sized from the
    /// canvas preferences, and gives it a view.
    pub fn add_node(&mut self, location: Point) -> Result<NodeId, SessionError> {
        let ctx = &mut self.context;
        let slide = ctx.current_slide_id().ok_or(SessionError::NoCurrentSlide)?;
        let canvas = &ctx.preferences().canvas;
        let size = Size::new(canvas.default_node_width, canvas.default_node_height);
        let ordinal = ctx.model.children(slide)?.len() + 1;

        let node = ctx.model.create(
            format!("Node {ordinal}"),
            NodeBody::Default(DefaultProps::at(location, size)),
        );
        ctx.model.add_child(slide, node)?;
        ctx.history.track(&mut ctx.model, node)?;
        ctx.refresh_current_slide()?;
        debug!(%node, %slide, "added node");
        Ok(node)
    }

    /// Generic property write; tracked nodes get one undo step per changed value.
    pub fn set_property(
        &mut self,
        node: NodeId,
        name: &str,
        value: impl Into<PropertyValue>,
    ) -> Result<bool, SessionError> {
        Ok(self.context.model.set_property(node, name, value)?)
    }

    pub fn move_node(&mut self, node: NodeId, location: Point) -> Result<bool, SessionError> {
        self.set_property(node, names::LOCATION, location)
    }

    /// Removes `node` and its descendants from the document, along with any
    /// history entries that refer to them. The document root and the current
    /// slide cannot be deleted this way.
    pub fn delete_node(&mut self, node: NodeId) -> Result<(), SessionError> {
        if Some(node) == self.files.document() || Some(node) == self.context.current_slide_id() {
            return Err(SessionError::ProtectedNode(node));
        }
        let ctx = &mut self.context;
        ctx.views.release(&mut ctx.model, node);
        for disposed in ctx.model.dispose(node)? {
            ctx.history.forget(disposed);
        }
        Ok(())
    }
}
