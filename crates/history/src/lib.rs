//! Property-level undo/redo for the CodeFlow document model.
//!
//! A [`Memento`] snapshots named properties of one node. The
//! [`HistoryController`] records a memento whenever a tracked node announces a
//! property change and replays them on undo/redo.

mod controller;
mod memento;

use codeflow_model::ModelError;
use thiserror::Error;

pub use controller::HistoryController;
pub use memento::Memento;

#[derive(Debug, Error, Clone, PartialEq)]
pub enum HistoryError {
    #[error(transparent)]
    Model(#[from] ModelError),
    #[error("property {name} is excluded from history")]
    IgnoredProperty { name: String },
}
