use crate::{Entity, VertexId};
use serde::{Deserialize, Serialize};
use std::fmt;
use thiserror::Error;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum AlgorithmKind {
    Layout,
    Clustering,
}

impl fmt::Display for AlgorithmKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            AlgorithmKind::Layout => f.write_str("layout"),
            AlgorithmKind::Clustering => f.write_str("clustering"),
        }
    }
}

/// Failures while reading a graph file.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum GraphFileError {
    #[error("failed to read graph file: {0}")]
    Io(String),
    #[error("invalid XML: {0}")]
    Xml(String),
    #[error("malformed GraphML: {0}")]
    Malformed(String),
}

/// Every failure a canvas operation can report.
///
/// A failed operation never leaves partially applied graph or view state behind.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum CanvasError {
    #[error("{0} not found")]
    NotFound(Entity),
    #[error("invalid edge endpoints {from} -> {to}: {reason}")]
    InvalidEndpoint {
        from: VertexId,
        to: VertexId,
        reason: &'static str,
    },
    #[error("unknown {kind} algorithm: {name}")]
    UnknownAlgorithm { kind: AlgorithmKind, name: String },
    #[error("vertex {0} is not a member of any cluster")]
    OrphanVertex(VertexId),
    #[error("invalid value for attribute '{name}' on {entity}: {reason}")]
    InvalidAttribute {
        entity: Entity,
        name: String,
        reason: &'static str,
    },
    #[error(transparent)]
    GraphFile(#[from] GraphFileError),
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::EdgeId;

    #[test]
    fn test_error_messages() {
        let err = CanvasError::NotFound(Entity::Edge(EdgeId(4)));
        assert_eq!(err.to_string(), "edge 4 not found");

        let err = CanvasError::UnknownAlgorithm {
            kind: AlgorithmKind::Layout,
            name: "layout_nope".into(),
        };
        assert_eq!(err.to_string(), "unknown layout algorithm: layout_nope");

        let err: CanvasError = GraphFileError::Malformed("edge without source".into()).into();
        assert_eq!(err.to_string(), "malformed GraphML: edge without source");
    }
}
