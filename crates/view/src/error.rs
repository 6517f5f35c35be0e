use codeflow_model::{ModelError, NodeId, NodeKind};
use thiserror::Error;

#[derive(Debug, Error, Clone, PartialEq)]
pub enum ViewError {
    #[error(transparent)]
    Model(#[from] ModelError),
    #[error("no view is registered for {0} nodes")]
    ViewNotFound(NodeKind),
    #[error("node {node} has no location property to position its view")]
    MissingLocation { node: NodeId },
    #[error("location of node {node} is a {found} value, expected a point")]
    LocationType { node: NodeId, found: &'static str },
}
