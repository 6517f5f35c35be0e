//! Document lifecycle for CodeFlow: persistence backends, the file controller and
//! the application context that ties model, history and views to the host UI.

mod context;
mod controller;
mod dirty;
mod editor;
mod error;
mod hub;
mod location;
mod store;
mod util;

pub use context::AppContext;
pub use controller::FileController;
pub use dirty::DirtyFlag;
pub use editor::Editor;
pub use error::SessionError;
pub use hub::UiHub;
pub use location::{Confirmation, FileLocation, FileResponse};
pub use store::{DocumentStore, JsonFileStore, StoreError, DOCUMENT_FORMAT_VERSION};
pub use util::write_atomic;
