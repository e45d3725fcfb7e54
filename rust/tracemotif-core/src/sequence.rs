//! Maximal linear call chains.
//!
//! A [`Sequence`] is a run of nodes in which every node after the first has
//! exactly one parent, that parent is the previous element, and every node
//! before the last has at most one child. Sequences are used to collapse
//! repetitive call chains before motif discovery.

use std::collections::VecDeque;

use serde::{Deserialize, Serialize};

use crate::graph::{Adjacency, TraceGraph};
use crate::span::NodeRef;

/// Ordinal of a sequence within its trace.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct SequenceId(pub usize);

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Sequence {
    ordinal: usize,
    nodes: Vec<NodeRef>,
}

impl Sequence {
    fn start(first: NodeRef, ordinal: usize) -> Self {
        Self {
            ordinal,
            nodes: vec![first],
        }
    }

    pub fn id(&self) -> SequenceId {
        SequenceId(self.ordinal)
    }

    pub fn ordinal(&self) -> usize {
        self.ordinal
    }

    pub fn nodes(&self) -> &[NodeRef] {
        &self.nodes
    }

    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    pub fn first(&self) -> NodeRef {
        self.nodes[0]
    }

    pub fn last(&self) -> NodeRef {
        self.nodes[self.nodes.len() - 1]
    }

    /// `last.timestamp - first.timestamp` in `graph`'s time frame.
    pub fn duration(&self, graph: &TraceGraph) -> i64 {
        let first = graph.node(self.first()).map_or(0, |n| n.timestamp);
        let last = graph.node(self.last()).map_or(0, |n| n.timestamp);
        last - first
    }

    /// Node names along the chain; equal tuples mean equal call chains.
    pub fn names(&self, graph: &TraceGraph) -> Vec<String> {
        self.nodes
            .iter()
            .filter_map(|r| graph.node(*r))
            .map(|n| n.name())
            .collect()
    }
}

/// All sequences of a trace plus the owning sequence of every node.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct SequencePartition {
    sequences: Vec<Sequence>,
    membership: Vec<Option<SequenceId>>,
}

impl SequencePartition {
    pub fn sequences(&self) -> &[Sequence] {
        &self.sequences
    }

    pub fn get(&self, id: SequenceId) -> Option<&Sequence> {
        self.sequences.get(id.0)
    }

    pub fn sequence_of(&self, node: NodeRef) -> Option<SequenceId> {
        self.membership.get(node.0).copied().flatten()
    }

    fn open(&mut self, node: NodeRef) {
        let id = SequenceId(self.sequences.len());
        self.sequences.push(Sequence::start(node, id.0));
        self.membership[node.0] = Some(id);
    }

    fn extend(&mut self, id: SequenceId, node: NodeRef) {
        self.sequences[id.0].nodes.push(node);
        self.membership[node.0] = Some(id);
    }
}

/// Breadth-first partition of the trace into sequences.
///
/// The root always opens sequence 0. Every other node is visited once:
///
/// - a node with exactly one parent and fewer than two children joins the
///   parent's sequence when the parent has a sequence and did not branch,
///   and otherwise opens a new one;
/// - nodes with several parents or several children belong to none.
///
/// A child reachable through several parents is queued only once.
pub fn detect_sequences(adjacency: &Adjacency, root: NodeRef) -> SequencePartition {
    let n = adjacency.len();
    let mut partition = SequencePartition {
        sequences: Vec::new(),
        membership: vec![None; n],
    };
    if root.0 >= n {
        return partition;
    }

    let mut visited = vec![false; n];
    let mut queued = vec![false; n];
    let mut queue = VecDeque::new();

    partition.open(root);
    queued[root.0] = true;
    queue.push_back(root);

    while let Some(current) = queue.pop_front() {
        if visited[current.0] {
            continue;
        }
        visited[current.0] = true;

        let parents = adjacency.parents_of(current);
        if current != root && parents.len() == 1 && adjacency.children_of(current).len() < 2 {
            let parent = parents[0];
            let parent_linear = adjacency.children_of(parent).len() <= 1;
            match partition.sequence_of(parent) {
                Some(id) if parent_linear => partition.extend(id, current),
                _ => partition.open(current),
            }
        }

        for &child in adjacency.children_of(current) {
            if !queued[child.0] {
                queued[child.0] = true;
                queue.push_back(child);
            }
        }
    }

    partition
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::span::Edge;

    fn partition(n: usize, pairs: &[(usize, usize)]) -> SequencePartition {
        let edges: Vec<Edge> = pairs
            .iter()
            .map(|&(a, b)| Edge::new(NodeRef(a), NodeRef(b), 1))
            .collect();
        let adj = Adjacency::from_edges(n, &edges, "t").unwrap();
        detect_sequences(&adj, NodeRef(0))
    }

    fn members(p: &SequencePartition) -> Vec<Vec<usize>> {
        p.sequences()
            .iter()
            .map(|s| s.nodes().iter().map(|r| r.0).collect())
            .collect()
    }

    #[test]
    fn pure_chain_is_one_sequence() {
        let p = partition(5, &[(0, 1), (1, 2), (2, 3), (3, 4)]);
        assert_eq!(members(&p), vec![vec![0, 1, 2, 3, 4]]);
    }

    #[test]
    fn branching_root_keeps_sequence_zero_alone() {
        // 0 -> {1, 2}, 1 -> 3
        let p = partition(4, &[(0, 1), (0, 2), (1, 3)]);
        assert_eq!(members(&p), vec![vec![0], vec![1, 3], vec![2]]);
        assert_eq!(p.sequence_of(NodeRef(3)), Some(SequenceId(1)));
    }

    #[test]
    fn branching_node_belongs_to_no_sequence() {
        // 0 -> 1 -> {2, 3}
        let p = partition(4, &[(0, 1), (1, 2), (1, 3)]);
        assert_eq!(p.sequence_of(NodeRef(1)), None);
        assert_eq!(members(&p), vec![vec![0], vec![2], vec![3]]);
    }

    #[test]
    fn join_node_belongs_to_no_sequence() {
        // diamond 0 -> {1, 2} -> 3 -> 4
        let p = partition(5, &[(0, 1), (0, 2), (1, 3), (2, 3), (3, 4)]);
        assert_eq!(p.sequence_of(NodeRef(3)), None);
        // 4 has a single parent without a sequence, so it opens its own.
        assert_eq!(members(&p), vec![vec![0], vec![1], vec![2], vec![4]]);
    }

    #[test]
    fn every_node_is_in_at_most_one_sequence() {
        let p = partition(6, &[(0, 1), (1, 2), (0, 3), (3, 4), (4, 5)]);
        let mut seen = vec![0; 6];
        for seq in p.sequences() {
            for node in seq.nodes() {
                seen[node.0] += 1;
            }
        }
        assert!(seen.iter().all(|c| *c <= 1));
    }
}
