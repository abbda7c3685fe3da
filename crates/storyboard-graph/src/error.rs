//! Error types for the document model

use crate::id::{EdgeId, NodeId};

/// Malformed mutation input or malformed document shape
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ValidationError {
    /// Node label is empty or whitespace-only
    #[error("node label must not be empty")]
    EmptyLabel,

    /// Edge would connect a node to itself
    #[error("edge from {0} to itself is not allowed")]
    SelfLoop(NodeId),

    /// Serialized document does not have the expected shape
    #[error("malformed document: {0}")]
    MalformedDocument(String),
}

/// Mutation names an entity that is not in the document
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ReferenceError {
    /// Edge source is not a node of this document
    #[error("edge source {0} not found")]
    UnknownSource(NodeId),

    /// Edge target is not a node of this document
    #[error("edge target {0} not found")]
    UnknownTarget(NodeId),

    /// Node not found
    #[error("node {0} not found")]
    UnknownNode(NodeId),

    /// Edge not found
    #[error("edge {0} not found")]
    UnknownEdge(EdgeId),
}

/// Any rejected document mutation
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum GraphError {
    /// Invalid input
    #[error("validation error: {0}")]
    Validation(#[from] ValidationError),

    /// Dangling reference
    #[error("reference error: {0}")]
    Reference(#[from] ReferenceError),
}
