//! Domain-level errors (no external dependencies)

use thiserror::Error;

use crate::domain::NodeId;

/// Domain errors represent tree-shape and ordering violations.
/// These are independent of infrastructure concerns.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum DomainError {
    #[error("ordering references unknown node: {0}")]
    UnknownNode(NodeId),

    #[error("ordering lists node more than once: {0}")]
    DuplicateNode(NodeId),

    #[error("ordering omits {} known node(s): {}", .missing.len(), join_ids(.missing))]
    IncompleteOrdering { missing: Vec<NodeId> },

    #[error("malformed ordering request: {0}")]
    MalformedRequest(String),

    #[error("node not found: {0}")]
    NodeNotFound(NodeId),

    #[error("node {node} references missing parent {parent}")]
    MissingParent { node: NodeId, parent: NodeId },

    #[error("cycle detected in parent links at node: {0}")]
    CycleDetected(NodeId),

    #[error("invalid move of node {node}: {message}")]
    InvalidMove { node: NodeId, message: String },
}

impl DomainError {
    /// Ordering errors are recovered by a full rebuild instead of surfacing.
    pub fn requires_rebuild(&self) -> bool {
        matches!(
            self,
            DomainError::UnknownNode(_)
                | DomainError::DuplicateNode(_)
                | DomainError::IncompleteOrdering { .. }
                | DomainError::MalformedRequest(_)
        )
    }
}

fn join_ids(ids: &[NodeId]) -> String {
    ids.iter()
        .map(|id| id.to_string())
        .collect::<Vec<_>>()
        .join(", ")
}

/// Result type for domain operations.
pub type DomainResult<T> = Result<T, DomainError>;
