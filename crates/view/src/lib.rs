//! View layer for the CodeFlow document model.
//!
//! A [`NodeView`] mirrors the properties of one model node and keeps its visual
//! children in order. The [`ViewFactory`] materializes views on demand and caches
//! them weakly, so the cache never keeps a view or a node alive.

mod error;
mod factory;
mod view;

pub use error::ViewError;
pub use factory::ViewFactory;
pub use view::{ChildView, NodeView, ViewKind};
