use thiserror::Error;

use crate::ir::VertexKey;

use super::Generation;

/// Rejected submissions. Nothing is issued for a graph that fails validation.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum GraphError {
    #[error("duplicate vertex key {0}")]
    DuplicateVertex(VertexKey),
    #[error("edge {from} -> {to} references missing vertex {missing}")]
    MissingEndpoint {
        from: VertexKey,
        to: VertexKey,
        missing: VertexKey,
    },
    #[error("parallel edges {from} -> {to} cannot be told apart")]
    DuplicateEdge { from: VertexKey, to: VertexKey },
}

#[derive(Debug, Clone, PartialEq, Error)]
pub enum MatchError {
    #[error("unable to find vertex for key(s) {}", join_keys(.keys))]
    UnknownVertices { keys: Vec<VertexKey> },
    #[error("layout placed vertex key(s) {} more than once", join_keys(.keys))]
    RepeatedVertices { keys: Vec<VertexKey> },
    #[error("layout is missing vertex key(s) {}", join_keys(.keys))]
    MissingVertices { keys: Vec<VertexKey> },
    #[error("unable to find edge for {}", join_edges(.edges))]
    UnknownEdges { edges: Vec<(VertexKey, VertexKey)> },
    #[error("layout routed edge(s) {} more than once", join_edges(.edges))]
    RepeatedEdges { edges: Vec<(VertexKey, VertexKey)> },
    #[error("layout is missing edge(s) {}", join_edges(.edges))]
    MissingEdges { edges: Vec<(VertexKey, VertexKey)> },
}

#[derive(Debug, Clone, PartialEq, Error)]
pub enum MeasureError {
    #[error("expected {expected} sizes, got {actual}")]
    Incomplete { expected: usize, actual: usize },
    #[error("invalid size for vertex {key}: {width}x{height}")]
    InvalidSize {
        key: VertexKey,
        width: f32,
        height: f32,
    },
}

#[derive(Debug, Clone, PartialEq, Error)]
pub enum AlgorithmError {
    #[error("failed to run {program}: {message}")]
    Spawn { program: String, message: String },
    #[error("{program} exited with {status}: {stderr}")]
    Exit {
        program: String,
        status: String,
        stderr: String,
    },
    #[error("malformed layout output at line {line}: {message}")]
    MalformedOutput { line: usize, message: String },
    #[error("layout failed: {0}")]
    Failed(String),
}

#[derive(Debug, Clone, PartialEq, Error)]
pub enum LayoutError {
    #[error(transparent)]
    Graph(#[from] GraphError),
    #[error("generation {generation}: measurement failed: {source}")]
    Measure {
        generation: Generation,
        source: MeasureError,
    },
    #[error("generation {generation}: layout algorithm failed: {source}")]
    Algorithm {
        generation: Generation,
        source: AlgorithmError,
    },
    #[error("generation {generation}: {source}")]
    Match {
        generation: Generation,
        source: MatchError,
    },
}

impl LayoutError {
    pub fn generation(&self) -> Option<Generation> {
        match self {
            LayoutError::Graph(_) => None,
            LayoutError::Measure { generation, .. }
            | LayoutError::Algorithm { generation, .. }
            | LayoutError::Match { generation, .. } => Some(*generation),
        }
    }
}

fn join_keys(keys: &[VertexKey]) -> String {
    keys.iter()
        .map(|key| format!("'{key}'"))
        .collect::<Vec<_>>()
        .join(", ")
}

fn join_edges(edges: &[(VertexKey, VertexKey)]) -> String {
    edges
        .iter()
        .map(|(from, to)| format!("{from} -> {to}"))
        .collect::<Vec<_>>()
        .join(", ")
}
