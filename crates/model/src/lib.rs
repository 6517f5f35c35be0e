//! Document model for CodeFlow: a typed node hierarchy (slide collections, slides,
//! visual nodes and links) stored in an arena, with change notification and
//! name-based property access.

mod error;
mod event;
mod id;
mod node;
mod property;
mod record;
mod tree;

pub use error::ModelError;
pub use event::{NodeEvent, NodeObserver};
pub use id::NodeId;
pub use node::{DefaultProps, Node, NodeBody, NodeKind, VisualProps};
pub use property::{names, is_ignored, BorderStyle, Point, PropertyValue, Rgba, ShapeStyle, Size};
pub use record::NodeRecord;
pub use tree::Model;
