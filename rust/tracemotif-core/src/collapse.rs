//! Sequence-reduced views of a trace.
//!
//! Collapsing replaces every multi-node [`Sequence`](crate::sequence::Sequence)
//! with its first node, so a repetitive call chain counts as one element
//! during motif discovery. The fuzzy form additionally merges neighbouring
//! elements that carry the same name.

use crate::graph::TraceGraph;
use crate::span::NodeRef;

/// One element of a collapsed trace.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CollapsedEntry {
    /// The node standing in for the whole element.
    pub representative: NodeRef,
    /// Time-order positions of every node folded into this element.
    pub covers: Vec<usize>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CollapsedTrace {
    entries: Vec<CollapsedEntry>,
}

impl CollapsedTrace {
    pub fn new(graph: &TraceGraph) -> Self {
        let mut entries = Vec::new();
        for &node in graph.ordered_refs() {
            let sequence = graph
                .sequence_of(node)
                .and_then(|id| graph.sequence(id))
                .filter(|s| s.len() > 1);
            match sequence {
                Some(seq) if seq.first() == node => {
                    let covers = seq
                        .nodes()
                        .iter()
                        .filter_map(|r| graph.position_of(*r))
                        .collect();
                    entries.push(CollapsedEntry {
                        representative: node,
                        covers,
                    });
                }
                // Folded into the entry of its sequence's first node.
                Some(_) => {}
                None => entries.push(CollapsedEntry {
                    representative: node,
                    covers: graph.position_of(node).into_iter().collect(),
                }),
            }
        }
        Self { entries }
    }

    /// Collapse, then merge runs of adjacent entries with equal names.
    pub fn fuzzy(graph: &TraceGraph) -> Self {
        let collapsed = Self::new(graph);
        let mut entries: Vec<CollapsedEntry> = Vec::with_capacity(collapsed.entries.len());
        let name = |r: NodeRef| graph.node(r).map(|n| n.name());
        for entry in collapsed.entries {
            match entries.last_mut() {
                Some(prev) if name(prev.representative) == name(entry.representative) => {
                    prev.covers.extend(entry.covers);
                }
                _ => entries.push(entry),
            }
        }
        Self { entries }
    }

    pub fn entries(&self) -> &[CollapsedEntry] {
        &self.entries
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Names of the representatives, in collapsed order.
    pub fn names(&self, graph: &TraceGraph) -> Vec<String> {
        self.entries
            .iter()
            .filter_map(|e| graph.node(e.representative))
            .map(|n| n.name())
            .collect()
    }
}
