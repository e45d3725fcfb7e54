//! Span records supplied by the ingestion layer.
//!
//! A [`Node`] is one timestamped tracing event and an [`Edge`] a causal call
//! between two of them. Edges refer to nodes by position ([`NodeRef`]) in the
//! trace's node list, never by owning pointer. [`SpanBatch`] is the adapter
//! between tracing backends and [`TraceGraph::build`]: it accepts either
//! positional edges or parent-id linked spans.

use std::collections::HashMap;
use std::fmt;

use serde::{Deserialize, Serialize};

use crate::error::ConstructionError;
use crate::graph::TraceGraph;

// ---------------------------------------------------------------------------
// Typed references
// ---------------------------------------------------------------------------

/// Position of a node in its trace's node list.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct NodeRef(pub usize);

impl NodeRef {
    pub fn index(self) -> usize {
        self.0
    }
}

impl fmt::Display for NodeRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

// ---------------------------------------------------------------------------
// Node
// ---------------------------------------------------------------------------

/// What kind of tracepoint a node records. Backends without the notion leave
/// it unset.
#[derive(
    Debug,
    Clone,
    Copy,
    PartialEq,
    Eq,
    PartialOrd,
    Ord,
    Hash,
    Serialize,
    Deserialize,
    strum::Display,
    strum::EnumString,
    strum::IntoStaticStr,
)]
#[strum(ascii_case_insensitive)]
pub enum Variant {
    Entry,
    Exit,
    Annotation,
}

/// A single timestamped event.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Node {
    /// Unique within one trace.
    pub id: String,
    pub function_label: String,
    /// Monotonic clock units. Shifted so the root sits at 0 once the node
    /// belongs to a built [`TraceGraph`].
    pub timestamp: i64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub variant: Option<Variant>,
}

impl Node {
    pub fn new(id: impl Into<String>, function_label: impl Into<String>, timestamp: i64) -> Self {
        Self {
            id: id.into(),
            function_label: function_label.into(),
            timestamp,
            variant: None,
        }
    }

    pub fn with_variant(mut self, variant: Variant) -> Self {
        self.variant = Some(variant);
        self
    }

    /// The label used for matching: the function label, qualified by the
    /// variant when one is present.
    pub fn name(&self) -> String {
        match self.variant {
            Some(variant) => format!("{} {}", self.function_label, variant),
            None => self.function_label.clone(),
        }
    }
}

// ---------------------------------------------------------------------------
// Edge
// ---------------------------------------------------------------------------

/// A causal call: `source` invoked or preceded `destination`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Edge {
    pub source: NodeRef,
    pub destination: NodeRef,
    /// `destination.timestamp - source.timestamp` as reported by the backend.
    pub duration: i64,
    /// Backend-specific relationship tag (e.g. `"ChildOf"`), if any.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub variant: Option<String>,
}

impl Edge {
    pub fn new(source: NodeRef, destination: NodeRef, duration: i64) -> Self {
        Self {
            source,
            destination,
            duration,
            variant: None,
        }
    }

    pub fn with_variant(mut self, variant: impl Into<String>) -> Self {
        self.variant = Some(variant.into());
        self
    }
}

// ---------------------------------------------------------------------------
// Ingestion adapter
// ---------------------------------------------------------------------------

/// A span that names its parents by id instead of by position.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LinkedSpan {
    pub node: Node,
    pub parent_ids: Vec<String>,
}

impl LinkedSpan {
    pub fn new(node: Node, parent_ids: Vec<String>) -> Self {
        Self { node, parent_ids }
    }

    pub fn root(node: Node) -> Self {
        Self {
            node,
            parent_ids: Vec::new(),
        }
    }
}

/// A complete, unvalidated node/edge list for one trace.
#[derive(Debug, Clone, Default)]
pub struct SpanBatch {
    pub request_type: String,
    pub base_id: String,
    pub nodes: Vec<Node>,
    pub edges: Vec<Edge>,
}

impl SpanBatch {
    pub fn new(request_type: impl Into<String>, base_id: impl Into<String>) -> Self {
        Self {
            request_type: request_type.into(),
            base_id: base_id.into(),
            nodes: Vec::new(),
            edges: Vec::new(),
        }
    }

    /// Append a node, returning its position.
    pub fn push_node(&mut self, node: Node) -> NodeRef {
        let id = NodeRef(self.nodes.len());
        self.nodes.push(node);
        id
    }

    /// Add a call edge whose duration is derived from the endpoint
    /// timestamps. Returns `None` if either endpoint is out of range.
    pub fn link(&mut self, source: NodeRef, destination: NodeRef) -> Option<usize> {
        let from = self.nodes.get(source.0)?;
        let to = self.nodes.get(destination.0)?;
        let duration = to.timestamp - from.timestamp;
        self.edges.push(Edge::new(source, destination, duration));
        Some(self.edges.len() - 1)
    }

    /// Build a batch from spans that reference their parents by id.
    ///
    /// Spans keep their input order. One edge is produced per parent id, in
    /// span order and then parent order.
    pub fn from_linked_spans(
        request_type: impl Into<String>,
        base_id: impl Into<String>,
        spans: Vec<LinkedSpan>,
    ) -> Result<Self, ConstructionError> {
        let mut batch = Self::new(request_type, base_id);
        let mut by_id: HashMap<String, NodeRef> = HashMap::with_capacity(spans.len());
        let mut links = Vec::new();

        for span in spans {
            if by_id.contains_key(&span.node.id) {
                return Err(ConstructionError::DuplicateNodeId {
                    base_id: batch.base_id.clone(),
                    id: span.node.id,
                });
            }
            let id = batch.push_node(span.node);
            by_id.insert(batch.nodes[id.0].id.clone(), id);
            links.extend(span.parent_ids.into_iter().map(|parent| (parent, id)));
        }

        for (parent_id, child) in links {
            let edge = batch.edges.len();
            let parent = by_id.get(&parent_id).copied().ok_or_else(|| {
                ConstructionError::DanglingEdge {
                    base_id: batch.base_id.clone(),
                    edge,
                    endpoint: parent_id.clone(),
                }
            })?;
            batch.link(parent, child);
        }

        Ok(batch)
    }

    /// Validate and annotate this batch as a [`TraceGraph`].
    pub fn build(self) -> Result<TraceGraph, ConstructionError> {
        TraceGraph::build(self.nodes, self.edges, self.request_type, self.base_id)
    }
}
