use std::fmt;
use std::rc::Rc;

use codeflow_model::NodeId;
use codeflow_view::NodeView;
use tracing::trace;

use crate::{Confirmation, FileResponse, SessionError};

type ConfirmHandler = Box<dyn FnMut() -> Confirmation>;
type FilenameHandler = Box<dyn FnMut() -> FileResponse>;
type SlideHandler = Box<dyn FnMut(&Rc<NodeView>)>;
type NodeHandler = Box<dyn FnMut(NodeId)>;

/// Synchronous request/response channel between the document core and the host
/// UI.
///
/// Every request and notification needs a registered handler; raising one that
/// nobody handles is [`SessionError::MissingHandler`].
#[derive(Default)]
pub struct UiHub {
    confirm_discard: Option<ConfirmHandler>,
    open_filename: Option<FilenameHandler>,
    save_filename: Option<FilenameHandler>,
    save_as_filename: Option<FilenameHandler>,
    slide_selected: Option<SlideHandler>,
    detach_slide: Option<SlideHandler>,
    node_selected: Option<NodeHandler>,
}

impl UiHub {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn on_confirm_discard(&mut self, handler: impl FnMut() -> Confirmation + 'static) {
        self.confirm_discard = Some(Box::new(handler));
    }

    pub fn on_open_filename(&mut self, handler: impl FnMut() -> FileResponse + 'static) {
        self.open_filename = Some(Box::new(handler));
    }

    pub fn on_save_filename(&mut self, handler: impl FnMut() -> FileResponse + 'static) {
        self.save_filename = Some(Box::new(handler));
    }

    pub fn on_save_as_filename(&mut self, handler: impl FnMut() -> FileResponse + 'static) {
        self.save_as_filename = Some(Box::new(handler));
    }

    pub fn on_slide_selected(&mut self, handler: impl FnMut(&Rc<NodeView>) + 'static) {
        self.slide_selected = Some(Box::new(handler));
    }

    pub fn on_detach_slide(&mut self, handler: impl FnMut(&Rc<NodeView>) + 'static) {
        self.detach_slide = Some(Box::new(handler));
    }

    pub fn on_node_selected(&mut self, handler: impl FnMut(NodeId) + 'static) {
        self.node_selected = Some(Box::new(handler));
    }

    /// Asks whether unsaved changes may be thrown away.
    pub fn confirm_discard(&mut self) -> Result<Confirmation, SessionError> {
        let handler = self
            .confirm_discard
            .as_mut()
            .ok_or(SessionError::MissingHandler("confirm_discard"))?;
        let answer = handler();
        trace!(cancel = answer.cancel, "confirm discard");
        Ok(answer)
    }

    pub fn request_open_filename(&mut self) -> Result<FileResponse, SessionError> {
        request(&mut self.open_filename, "open_filename")
    }

    pub fn request_save_filename(&mut self) -> Result<FileResponse, SessionError> {
        request(&mut self.save_filename, "save_filename")
    }

    pub fn request_save_as_filename(&mut self) -> Result<FileResponse, SessionError> {
        request(&mut self.save_as_filename, "save_as_filename")
    }

    pub fn slide_selected(&mut self, view: &Rc<NodeView>) -> Result<(), SessionError> {
        let handler = self
            .slide_selected
            .as_mut()
            .ok_or(SessionError::MissingHandler("slide_selected"))?;
        handler(view);
        Ok(())
    }

    pub fn detach_slide(&mut self, view: &Rc<NodeView>) -> Result<(), SessionError> {
        let handler = self
            .detach_slide
            .as_mut()
            .ok_or(SessionError::MissingHandler("detach_slide"))?;
        handler(view);
        Ok(())
    }

    pub fn node_selected(&mut self, node: NodeId) -> Result<(), SessionError> {
        let handler = self
            .node_selected
            .as_mut()
            .ok_or(SessionError::MissingHandler("node_selected"))?;
        handler(node);
        Ok(())
    }
}

fn request(
    slot: &mut Option<FilenameHandler>,
    name: &'static str,
) -> Result<FileResponse, SessionError> {
    let handler = slot.as_mut().ok_or(SessionError::MissingHandler(name))?;
    let response = handler();
    trace!(request = name, cancel = response.cancel, "filename request");
    Ok(response)
}

impl fmt::Debug for UiHub {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("UiHub")
            .field("confirm_discard", &self.confirm_discard.is_some())
            .field("open_filename", &self.open_filename.is_some())
            .field("save_filename", &self.save_filename.is_some())
            .field("save_as_filename", &self.save_as_filename.is_some())
            .field("slide_selected", &self.slide_selected.is_some())
            .field("detach_slide", &self.detach_slide.is_some())
            .field("node_selected", &self.node_selected.is_some())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use std::cell::Cell;

    use super::*;

    #[test]
    fn unhandled_requests_are_contract_violations() {
        let mut hub = UiHub::new();
        assert!(matches!(
            hub.confirm_discard(),
            Err(SessionError::MissingHandler("confirm_discard"))
        ));
        assert!(matches!(
            hub.request_save_as_filename(),
            Err(SessionError::MissingHandler("save_as_filename"))
        ));
        assert!(matches!(
            hub.node_selected(NodeId::new()),
            Err(SessionError::MissingHandler("node_selected"))
        ));
    }

    #[test]
    fn handlers_are_called_for_each_request() {
        let calls = Rc::new(Cell::new(0));
        let mut hub = UiHub::new();
        let counter = Rc::clone(&calls);
        hub.on_open_filename(move || {
            counter.set(counter.get() + 1);
            FileResponse::cancelled()
        });

        assert!(hub.request_open_filename().unwrap().cancel);
        assert!(hub.request_open_filename().unwrap().cancel);
        assert_eq!(calls.get(), 2);
    }
}
