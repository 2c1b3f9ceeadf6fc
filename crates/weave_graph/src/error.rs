//! Graph error types.

/// Errors that can occur when mutating a [`Graph`](crate::Graph).
#[derive(Debug, thiserror::Error)]
pub enum GraphError {
    /// A node with this name already exists in the hypergraph.
    #[error("node '{0}' already exists in the hypergraph")]
    DuplicateNode(String),

    /// A hyperedge over this exact member set already exists.
    #[error("hyperedge over '{0}' already exists in the hypergraph")]
    DuplicateEdge(String),

    /// An edge referenced a node name that is not in the graph.
    #[error("unknown node '{0}'")]
    UnknownNode(String),

    /// A name or weight failed validation.
    #[error("invalid argument: {0}")]
    InvalidArgument(String),
}
