use thiserror::Error;

use crate::{NodeId, NodeKind};

/// Errors raised by tree manipulation and property access.
#[derive(Debug, Error, Clone, PartialEq)]
pub enum ModelError {
    #[error("node {0} not found")]
    NodeNotFound(NodeId),
    #[error("cannot add a node of kind {child} to a node of kind {parent}")]
    InvalidSubclass { parent: NodeKind, child: NodeKind },
    #[error("{kind} does not have a property named {name}")]
    PropertyNotFound { kind: NodeKind, name: String },
    #[error("property {name} is read-only")]
    ReadOnlyProperty { name: &'static str },
    #[error("property {name} expects a {expected} value, got {found}")]
    TypeMismatch {
        name: &'static str,
        expected: &'static str,
        found: &'static str,
    },
    #[error("node {child} is already attached to {parent}")]
    AlreadyAttached { child: NodeId, parent: NodeId },
    #[error("attaching {child} under {parent} would create a cycle")]
    Cycle { parent: NodeId, child: NodeId },
    #[error("node {0} already exists")]
    DuplicateId(NodeId),
    #[error("node id {0} is out of range")]
    InvalidId(NodeId),
}
