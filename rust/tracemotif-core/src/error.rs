//! Error types for trace construction and motif handling.

/// Reasons a trace cannot be built.
///
/// Every variant is fatal for the trace it names: the partially built graph
/// is dropped and nothing about it is kept.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ConstructionError {
    #[error("trace {base_id}: expected exactly one root node, found {found}")]
    MissingRoot { base_id: String, found: usize },
    #[error("trace {base_id}: root node is at position {position}, nodes must be supplied root-first")]
    RootNotFirst { base_id: String, position: usize },
    #[error("trace {base_id}: node {earliest} precedes the root in time")]
    RootNotEarliest { base_id: String, earliest: usize },
    #[error("trace {base_id}: call edges form a cycle")]
    CyclicGraph { base_id: String },
    #[error("trace {base_id}: {unreachable} node(s) are not connected to the root")]
    DisconnectedGraph { base_id: String, unreachable: usize },
    #[error("trace {base_id}: trace duration {duration} is not positive")]
    NonPositiveDuration { base_id: String, duration: i64 },
    #[error("trace {base_id}: edge {edge} references unknown node {endpoint}")]
    DanglingEdge {
        base_id: String,
        edge: usize,
        endpoint: String,
    },
    #[error("trace {base_id}: node id '{id}' appears more than once")]
    DuplicateNodeId { base_id: String, id: String },
}

impl ConstructionError {
    /// The identifier of the trace that failed to build.
    pub fn base_id(&self) -> &str {
        match self {
            ConstructionError::MissingRoot { base_id, .. }
            | ConstructionError::RootNotFirst { base_id, .. }
            | ConstructionError::RootNotEarliest { base_id, .. }
            | ConstructionError::CyclicGraph { base_id }
            | ConstructionError::DisconnectedGraph { base_id, .. }
            | ConstructionError::NonPositiveDuration { base_id, .. }
            | ConstructionError::DanglingEdge { base_id, .. }
            | ConstructionError::DuplicateNodeId { base_id, .. } => base_id,
        }
    }
}

/// Errors raised while assembling motifs against a trace.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum MotifError {
    #[error("motif span [{start}, {end}] is empty or reversed")]
    InvalidSpan { start: usize, end: usize },
    #[error("motif duration {0} is negative")]
    NegativeDuration(i64),
    #[error("motif has no elements")]
    Empty,
    #[error("motif references node {node} but the trace has {len} nodes")]
    NodeOutOfRange { node: usize, len: usize },
    #[error("label '{0}' is not in the vocabulary")]
    UnknownLabel(String),
    #[error("motif set mixes sequence-mined and subgraph-mined motifs")]
    MixedEncodings,
}
