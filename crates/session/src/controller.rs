use codeflow_model::{NodeBody, NodeId, NodeKind};
use tracing::{debug, info};

use crate::{AppContext, DocumentStore, FileLocation, SessionError, StoreError};

/// Name given to the root of a freshly created document.
const DOCUMENT_NAME: &str = "Slides";

/// Drives the new/open/save/close lifecycle of the single open document.
///
/// The controller owns the document root and its location; persistence goes
/// through the [`DocumentStore`] it was built with, and every question to the
/// user goes through the context's [`crate::UiHub`].
#[derive(Debug)]
pub struct FileController<S> {
    store: S,
    location: Option<FileLocation>,
    document: Option<NodeId>,
}

impl<S: DocumentStore> FileController<S> {
    pub fn new(store: S) -> Self {
        Self {
            store,
            location: None,
            document: None,
        }
    }

    pub fn store(&self) -> &S {
        &self.store
    }

    pub fn location(&self) -> Option<&FileLocation> {
        self.location.as_ref()
    }

    /// Root of the open document.
    pub fn document(&self) -> Option<NodeId> {
        self.document
    }

    pub fn can_save(&self, ctx: &AppContext) -> bool {
        self.document.is_some() && ctx.is_dirty()
    }

    pub fn can_save_as(&self) -> bool {
        self.document.is_some()
    }

    pub fn can_close(&self) -> bool {
        self.document.is_some()
    }

    pub fn can_open(&self) -> bool {
        true
    }

    pub fn can_create_new(&self) -> bool {
        true
    }

    /// Replaces the open document with an empty one holding a single slide.
    /// Returns `Ok(false)` when the user declines to discard unsaved changes.
    pub fn new_file(&mut self, ctx: &mut AppContext) -> Result<bool, SessionError> {
        if !self.confirm_discard(ctx)? {
            return Ok(false);
        }
        if self.document.is_some() {
            self.close_document(ctx)?;
        }

        let slide_name = ctx.preferences().editor.new_slide_name.clone();
        let collection = ctx.model.create(DOCUMENT_NAME, NodeBody::SlideCollection);
        let slide = ctx.model.create(slide_name, NodeBody::Slide);
        ctx.model.add_child(collection, slide)?;
        self.adopt(ctx, collection, None)?;
        ctx.select_slide(slide)?;
        info!(document = %collection, "created new document");
        Ok(true)
    }

    /// Asks for a file and loads it in place of the open document. Returns
    /// `Ok(false)` when the user cancels.
    ///
    /// The file is read and validated before the open document is closed, so a
    /// file that cannot be loaded leaves the current document untouched.
    pub fn open(&mut self, ctx: &mut AppContext) -> Result<bool, SessionError> {
        if !self.confirm_discard(ctx)? {
            return Ok(false);
        }
        let response = ctx.hub.request_open_filename()?;
        if response.cancel {
            return Ok(false);
        }
        let location = response.location();
        let path = location.full_path();
        let record = self.store.restore(&path)?;
        if record.kind() != NodeKind::SlideCollection {
            return Err(StoreError::UnexpectedRoot {
                path,
                kind: record.kind(),
            }
            .into());
        }
        record.validate()?;

        if self.document.is_some() {
            self.close_document(ctx)?;
        }
        let collection = ctx.model.import(record)?;
        let slide = first_or_new_slide(ctx, collection)?;
        self.adopt(ctx, collection, Some(location))?;
        ctx.select_slide(slide)?;
        info!(path = %path.display(), "opened document");
        Ok(true)
    }

    /// Saves to the known location, asking for one first if the document was
    /// never saved. Returns `Ok(false)` when the user cancels.
    pub fn save(&mut self, ctx: &mut AppContext) -> Result<bool, SessionError> {
        let document = self.document.ok_or(SessionError::NoDocument)?;
        if !ctx.is_dirty() {
            return Err(SessionError::NotDirty);
        }
        let location = match &self.location {
            Some(location) => location.clone(),
            None => {
                let response = ctx.hub.request_save_filename()?;
                if response.cancel {
                    return Ok(false);
                }
                response.location()
            }
        };
        self.persist(ctx, document, location)?;
        Ok(true)
    }

    /// Saves under a newly requested location. Returns `Ok(false)` when the user
    /// cancels.
    pub fn save_as(&mut self, ctx: &mut AppContext) -> Result<bool, SessionError> {
        let document = self.document.ok_or(SessionError::NoDocument)?;
        let response = ctx.hub.request_save_as_filename()?;
        if response.cancel {
            return Ok(false);
        }
        self.persist(ctx, document, response.location())?;
        Ok(true)
    }

    /// Closes the open document. Returns `Ok(false)` when the user declines to
    /// discard unsaved changes.
    pub fn close(&mut self, ctx: &mut AppContext) -> Result<bool, SessionError> {
        if self.document.is_none() {
            return Err(SessionError::NoDocument);
        }
        if !self.confirm_discard(ctx)? {
            return Ok(false);
        }
        self.close_document(ctx)?;
        Ok(true)
    }

    /// `true` when nothing unsaved is at stake or the user agreed to lose it.
    fn confirm_discard(&self, ctx: &mut AppContext) -> Result<bool, SessionError> {
        if self.document.is_none() || !ctx.is_dirty() {
            return Ok(true);
        }
        Ok(!ctx.hub.confirm_discard()?.cancel)
    }

    fn adopt(
        &mut self,
        ctx: &mut AppContext,
        collection: NodeId,
        location: Option<FileLocation>,
    ) -> Result<(), SessionError> {
        ctx.history.clear();
        ctx.history.track_subtree(&mut ctx.model, collection)?;
        self.document = Some(collection);
        self.location = location;
        ctx.clear_dirty();
        Ok(())
    }

    fn persist(
        &mut self,
        ctx: &mut AppContext,
        document: NodeId,
        location: FileLocation,
    ) -> Result<(), SessionError> {
        let record = ctx.model.export(document)?;
        let path = location.full_path();
        self.store.persist(&path, &record)?;
        self.location = Some(location);
        ctx.clear_dirty();
        info!(path = %path.display(), "saved document");
        Ok(())
    }

    fn close_document(&mut self, ctx: &mut AppContext) -> Result<(), SessionError> {
        let Some(document) = self.document else {
            return Ok(());
        };
        ctx.detach_current_slide()?;
        ctx.views.release(&mut ctx.model, document);
        let disposed = ctx.model.dispose(document)?;
        ctx.history.clear();
        self.document = None;
        self.location = None;
        ctx.clear_dirty();
        debug!(%document, nodes = disposed.len(), "closed document");
        Ok(())
    }
}

/// First slide of `collection`, or a new one appended to it when it has none.
fn first_or_new_slide(ctx: &mut AppContext, collection: NodeId) -> Result<NodeId, SessionError> {
    if let Some(slide) = ctx.model.children(collection)?.first() {
        return Ok(*slide);
    }
    let slide_name = ctx.preferences().editor.new_slide_name.clone();
    let slide = ctx.model.create(slide_name, NodeBody::Slide);
    ctx.model.add_child(collection, slide)?;
    Ok(slide)
}
