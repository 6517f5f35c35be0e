use codeflow_history::HistoryError;
use codeflow_model::ModelError;
use codeflow_view::ViewError;
use thiserror::Error;

use crate::StoreError;

#[derive(Debug, Error)]
pub enum SessionError {
    #[error("no document is open")]
    NoDocument,
    #[error("the document has no unsaved changes")]
    NotDirty,
    #[error("no slide is selected")]
    NoCurrentSlide,
    #[error("node {0} is open and cannot be deleted")]
    ProtectedNode(codeflow_model::NodeId),
    #[error("no handler is attached for the {0} request")]
    MissingHandler(&'static str),
    #[error(transparent)]
    Store(#[from] StoreError),
    #[error(transparent)]
    Model(#[from] ModelError),
    #[error(transparent)]
    View(#[from] ViewError),
    #[error(transparent)]
    History(#[from] HistoryError),
}

impl SessionError {
    /// Whether the caller broke an operation's precondition, as opposed to the
    /// operation failing on its own.
    pub fn is_precondition(&self) -> bool {
        matches!(
            self,
            SessionError::NoDocument
                | SessionError::NotDirty
                | SessionError::NoCurrentSlide
                | SessionError::ProtectedNode(_)
                | SessionError::MissingHandler(_)
        )
    }
}
