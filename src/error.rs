use thiserror::Error;

/// Errors raised while constructing or mutating a [`crate::graph::Graph`].
#[derive(Debug, Error, PartialEq, Eq)]
pub enum GraphError {
    #[error("node list has {nodes} nodes, but adjacency list has {adjacency} entries")]
    ShapeMismatch { nodes: usize, adjacency: usize },
}

/// Errors raised while parsing a benchmark instance document.
#[derive(Debug, Error)]
pub enum InstanceError {
    #[error("customer index {0} is missing from `all_customers`")]
    MissingCustomer(usize),
    #[error("`all_customers` must describe at least one node")]
    Empty,
    #[error(transparent)]
    Json(#[from] serde_json::Error),
    #[error(transparent)]
    Io(#[from] std::io::Error),
}
