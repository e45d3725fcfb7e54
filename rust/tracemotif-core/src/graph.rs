//! The execution-trace graph.
//!
//! [`TraceGraph::build`] turns a complete node/edge list into a validated,
//! annotated, immutable graph in four passes:
//!
//! 1. adjacency (parent/child sets) and structural checks: one root, placed
//!    first, no dangling edges, no duplicate ids, no cycles;
//! 2. ranks (see [`crate::rank`]);
//! 3. sequences (see [`crate::sequence`]);
//! 4. time ordering by `(timestamp, rank, function_label)` followed by
//!    timestamp normalization so the root sits at 0.
//!
//! Any failure discards the whole trace.

use std::collections::{BTreeSet, HashMap, VecDeque};

use tracing::debug;

use crate::error::ConstructionError;
use crate::rank::compute_ranks;
use crate::sequence::{detect_sequences, Sequence, SequenceId, SequencePartition};
use crate::span::{Edge, Node, NodeRef};

// ---------------------------------------------------------------------------
// Adjacency
// ---------------------------------------------------------------------------

/// Parent and child sets for every node, derived from the edge list.
///
/// Duplicate edges between the same pair collapse into a single adjacency
/// entry; insertion order is otherwise preserved.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Adjacency {
    parents: Vec<Vec<NodeRef>>,
    children: Vec<Vec<NodeRef>>,
}

impl Adjacency {
    /// Build adjacency for `node_count` nodes. Fails on the first edge whose
    /// endpoint is out of range.
    pub fn from_edges(
        node_count: usize,
        edges: &[Edge],
        base_id: &str,
    ) -> Result<Self, ConstructionError> {
        let mut parents = vec![Vec::new(); node_count];
        let mut children = vec![Vec::new(); node_count];

        for (index, edge) in edges.iter().enumerate() {
            for endpoint in [edge.source, edge.destination] {
                if endpoint.0 >= node_count {
                    return Err(ConstructionError::DanglingEdge {
                        base_id: base_id.to_string(),
                        edge: index,
                        endpoint: endpoint.to_string(),
                    });
                }
            }
            let from = edge.source;
            let to = edge.destination;
            if !children[from.0].contains(&to) {
                children[from.0].push(to);
            }
            if !parents[to.0].contains(&from) {
                parents[to.0].push(from);
            }
        }

        Ok(Self { parents, children })
    }

    pub fn len(&self) -> usize {
        self.parents.len()
    }

    pub fn is_empty(&self) -> bool {
        self.parents.is_empty()
    }

    pub fn parents_of(&self, node: NodeRef) -> &[NodeRef] {
        self.parents.get(node.0).map(Vec::as_slice).unwrap_or(&[])
    }

    pub fn children_of(&self, node: NodeRef) -> &[NodeRef] {
        self.children.get(node.0).map(Vec::as_slice).unwrap_or(&[])
    }

    /// Undirected neighbours: parents first, then children.
    pub fn neighbors(&self, node: NodeRef) -> impl Iterator<Item = NodeRef> + '_ {
        self.parents_of(node)
            .iter()
            .chain(self.children_of(node).iter())
            .copied()
    }

    /// Nodes with no parent, in node order.
    pub fn roots(&self) -> Vec<NodeRef> {
        self.parents
            .iter()
            .enumerate()
            .filter(|(_, p)| p.is_empty())
            .map(|(i, _)| NodeRef(i))
            .collect()
    }

    /// Kahn's algorithm over the child edges. `true` when every node can be
    /// emitted, i.e. the directed graph has no cycle.
    pub fn is_acyclic(&self) -> bool {
        let mut in_degree: Vec<usize> = self.parents.iter().map(Vec::len).collect();
        let mut queue: VecDeque<NodeRef> = in_degree
            .iter()
            .enumerate()
            .filter(|(_, d)| **d == 0)
            .map(|(i, _)| NodeRef(i))
            .collect();

        let mut emitted = 0;
        while let Some(node) = queue.pop_front() {
            emitted += 1;
            for &child in self.children_of(node) {
                in_degree[child.0] -= 1;
                if in_degree[child.0] == 0 {
                    queue.push_back(child);
                }
            }
        }
        emitted == self.len()
    }
}

// ---------------------------------------------------------------------------
// TraceGraph
// ---------------------------------------------------------------------------

/// A rooted, acyclic, time-ordered execution trace.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TraceGraph {
    request_type: String,
    base_id: String,
    nodes: Vec<Node>,
    edges: Vec<Edge>,
    adjacency: Adjacency,
    id_index: HashMap<String, NodeRef>,
    ranks: Vec<u32>,
    partition: SequencePartition,
    /// Node references in time order.
    ordered: Vec<NodeRef>,
    /// Inverse of `ordered`: position of each node in time order.
    positions: Vec<usize>,
    duration: i64,
}

impl TraceGraph {
    /// Validate and annotate a complete node/edge list.
    ///
    /// Nodes must be supplied root-first. On success every timestamp has been
    /// shifted so that the root is at 0.
    pub fn build(
        mut nodes: Vec<Node>,
        edges: Vec<Edge>,
        request_type: impl Into<String>,
        base_id: impl Into<String>,
    ) -> Result<Self, ConstructionError> {
        let request_type = request_type.into();
        let base_id = base_id.into();
        debug!(
            base_id = %base_id,
            nodes = nodes.len(),
            edges = edges.len(),
            "building trace graph"
        );

        // Pass 1: adjacency and structure.
        let mut id_index = HashMap::with_capacity(nodes.len());
        for (i, node) in nodes.iter().enumerate() {
            if id_index.insert(node.id.clone(), NodeRef(i)).is_some() {
                return Err(ConstructionError::DuplicateNodeId {
                    base_id,
                    id: node.id.clone(),
                });
            }
        }

        let adjacency = Adjacency::from_edges(nodes.len(), &edges, &base_id)?;
        let roots = adjacency.roots();
        if roots.len() != 1 {
            return Err(ConstructionError::MissingRoot {
                base_id,
                found: roots.len(),
            });
        }
        let root = roots[0];
        if root != NodeRef(0) {
            return Err(ConstructionError::RootNotFirst {
                base_id,
                position: root.0,
            });
        }
        if !adjacency.is_acyclic() {
            return Err(ConstructionError::CyclicGraph { base_id });
        }

        // Pass 2: ranks.
        let ranks = compute_ranks(&adjacency, root, &base_id)?;

        // Pass 3: sequences.
        let partition = detect_sequences(&adjacency, root);
        debug!(
            base_id = %base_id,
            sequences = partition.sequences().len(),
            "detected sequences"
        );

        // Pass 4: ordering and normalization.
        let mut ordered: Vec<NodeRef> = (0..nodes.len()).map(NodeRef).collect();
        ordered.sort_by(|a, b| {
            let (na, nb) = (&nodes[a.0], &nodes[b.0]);
            na.timestamp
                .cmp(&nb.timestamp)
                .then(ranks[a.0].cmp(&ranks[b.0]))
                .then_with(|| na.function_label.cmp(&nb.function_label))
                .then(a.0.cmp(&b.0))
        });
        let mut positions = vec![0; nodes.len()];
        for (position, node) in ordered.iter().enumerate() {
            positions[node.0] = position;
        }

        if ordered[0] != root {
            return Err(ConstructionError::RootNotEarliest {
                base_id,
                earliest: ordered[0].0,
            });
        }

        let minimum = nodes[ordered[0].0].timestamp;
        let maximum = nodes[ordered[ordered.len() - 1].0].timestamp;
        let duration = maximum - minimum;
        if duration <= 0 {
            return Err(ConstructionError::NonPositiveDuration { base_id, duration });
        }
        for node in &mut nodes {
            node.timestamp -= minimum;
        }

        debug!(base_id = %base_id, duration, "trace graph built");
        Ok(Self {
            request_type,
            base_id,
            nodes,
            edges,
            adjacency,
            id_index,
            ranks,
            partition,
            ordered,
            positions,
            duration,
        })
    }

    // -- Identity -----------------------------------------------------------

    pub fn request_type(&self) -> &str {
        &self.request_type
    }

    pub fn base_id(&self) -> &str {
        &self.base_id
    }

    // -- Nodes and edges ----------------------------------------------------

    /// Nodes in their input (positional) order.
    pub fn nodes(&self) -> &[Node] {
        &self.nodes
    }

    pub fn edges(&self) -> &[Edge] {
        &self.edges
    }

    pub fn node(&self, node: NodeRef) -> Option<&Node> {
        self.nodes.get(node.0)
    }

    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    /// Always `false` for a built graph; present for API symmetry with `len`.
    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    pub fn root(&self) -> NodeRef {
        NodeRef(0)
    }

    /// Look a node up by its backend id.
    pub fn find(&self, id: &str) -> Option<NodeRef> {
        self.id_index.get(id).copied()
    }

    pub fn adjacency(&self) -> &Adjacency {
        &self.adjacency
    }

    pub fn parents_of(&self, node: NodeRef) -> &[NodeRef] {
        self.adjacency.parents_of(node)
    }

    pub fn children_of(&self, node: NodeRef) -> &[NodeRef] {
        self.adjacency.children_of(node)
    }

    // -- Annotations --------------------------------------------------------

    pub fn rank_of(&self, node: NodeRef) -> Option<u32> {
        self.ranks.get(node.0).copied()
    }

    /// Rank of every node, indexed by position.
    pub fn ranks(&self) -> &[u32] {
        &self.ranks
    }

    pub fn sequences(&self) -> &[Sequence] {
        self.partition.sequences()
    }

    pub fn sequence_of(&self, node: NodeRef) -> Option<SequenceId> {
        self.partition.sequence_of(node)
    }

    pub fn sequence(&self, id: SequenceId) -> Option<&Sequence> {
        self.partition.get(id)
    }

    // -- Time order ---------------------------------------------------------

    /// Node references sorted by `(timestamp, rank, function_label)`.
    pub fn ordered_refs(&self) -> &[NodeRef] {
        &self.ordered
    }

    pub fn ordered_nodes(&self) -> impl Iterator<Item = &Node> + '_ {
        self.ordered.iter().map(move |r| &self.nodes[r.0])
    }

    /// Position of `node` in time order.
    pub fn position_of(&self, node: NodeRef) -> Option<usize> {
        self.positions.get(node.0).copied()
    }

    /// The `k`-th node in time order, or `None` when `k` is out of range.
    pub fn kth_node(&self, k: i64) -> Option<&Node> {
        let k = usize::try_from(k).ok()?;
        self.ordered.get(k).map(|r| &self.nodes[r.0])
    }

    pub fn duration(&self) -> i64 {
        self.duration
    }

    /// Always 0 once built.
    pub fn minimum_timestamp(&self) -> i64 {
        self.nodes[self.ordered[0].0].timestamp
    }

    pub fn maximum_timestamp(&self) -> i64 {
        self.nodes[self.ordered[self.ordered.len() - 1].0].timestamp
    }

    // -- Labels -------------------------------------------------------------

    /// Sorted, deduplicated function labels.
    pub fn unique_function_labels(&self) -> Vec<String> {
        self.nodes
            .iter()
            .map(|n| n.function_label.as_str())
            .collect::<BTreeSet<_>>()
            .into_iter()
            .map(str::to_string)
            .collect()
    }

    /// Sorted, deduplicated node names (label plus variant).
    pub fn unique_names(&self) -> Vec<String> {
        self.nodes
            .iter()
            .map(Node::name)
            .collect::<BTreeSet<_>>()
            .into_iter()
            .collect()
    }
}

/// Union of the function labels of several traces, sorted.
pub fn unique_function_labels_across<'a>(
    traces: impl IntoIterator<Item = &'a TraceGraph>,
) -> Vec<String> {
    let mut labels = BTreeSet::new();
    for trace in traces {
        labels.extend(trace.nodes.iter().map(|n| n.function_label.clone()));
    }
    labels.into_iter().collect()
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;
    use crate::span::SpanBatch;

    fn chain(labels: &[&str]) -> TraceGraph {
        let mut batch = SpanBatch::new("get", "chain");
        let mut prev = None;
        for (i, label) in labels.iter().enumerate() {
            let id = batch.push_node(Node::new(format!("n{}", i), *label, 1000 + 10 * i as i64));
            if let Some(p) = prev {
                batch.link(p, id);
            }
            prev = Some(id);
        }
        batch.build().unwrap()
    }

    #[test]
    fn adjacency_dedups_parallel_edges() {
        let edges = vec![
            Edge::new(NodeRef(0), NodeRef(1), 1),
            Edge::new(NodeRef(0), NodeRef(1), 1),
        ];
        let adj = Adjacency::from_edges(2, &edges, "t").unwrap();
        assert_eq!(adj.children_of(NodeRef(0)), &[NodeRef(1)]);
        assert_eq!(adj.parents_of(NodeRef(1)), &[NodeRef(0)]);
    }

    #[test]
    fn adjacency_rejects_out_of_range_endpoint() {
        let edges = vec![Edge::new(NodeRef(0), NodeRef(7), 1)];
        let err = Adjacency::from_edges(2, &edges, "t").unwrap_err();
        assert!(matches!(err, ConstructionError::DanglingEdge { edge: 0, .. }));
    }

    #[test]
    fn kahn_detects_cycle() {
        let edges = vec![
            Edge::new(NodeRef(0), NodeRef(1), 1),
            Edge::new(NodeRef(1), NodeRef(2), 1),
            Edge::new(NodeRef(2), NodeRef(1), 1),
        ];
        let adj = Adjacency::from_edges(3, &edges, "t").unwrap();
        assert!(!adj.is_acyclic());
    }

    #[test]
    fn timestamps_are_normalized() {
        let g = chain(&["a", "b", "c"]);
        let ts: Vec<i64> = g.nodes().iter().map(|n| n.timestamp).collect();
        assert_eq!(ts, vec![0, 10, 20]);
        assert_eq!(g.duration(), 20);
        assert_eq!(g.minimum_timestamp(), 0);
        assert_eq!(g.maximum_timestamp(), 20);
    }

    #[test]
    fn kth_node_is_total() {
        let g = chain(&["a", "b", "c"]);
        assert_eq!(g.kth_node(0).map(|n| n.function_label.as_str()), Some("a"));
        assert_eq!(g.kth_node(2).map(|n| n.function_label.as_str()), Some("c"));
        assert!(g.kth_node(3).is_none());
        assert!(g.kth_node(-1).is_none());
        assert!(g.kth_node(i64::MIN).is_none());
        assert!(g.kth_node(i64::MAX).is_none());
    }

    #[test]
    fn equal_timestamps_order_by_rank_then_label() {
        // root -> x(ts 5) -> y(ts 5); root -> b(ts 5) -> a(ts 5)
        let mut batch = SpanBatch::new("put", "ties");
        let root = batch.push_node(Node::new("r", "root", 0));
        let x = batch.push_node(Node::new("x", "zeta", 5));
        let y = batch.push_node(Node::new("y", "alpha", 5));
        let b = batch.push_node(Node::new("b", "beta", 5));
        batch.link(root, x);
        batch.link(x, y);
        batch.link(root, b);
        let g = batch.build().unwrap();

        let order: Vec<&str> = g.ordered_nodes().map(|n| n.id.as_str()).collect();
        // rank 1: b (beta) before x (zeta); rank 2: y
        assert_eq!(order, vec!["r", "b", "x", "y"]);
        assert_eq!(g.position_of(y), Some(3));
    }

    #[test]
    fn find_resolves_backend_ids() {
        let g = chain(&["a", "b"]);
        assert_eq!(g.find("n1"), Some(NodeRef(1)));
        assert_eq!(g.find("zz"), None);
    }

    #[test]
    fn unique_labels_are_sorted_and_deduped() {
        let g = chain(&["b", "a", "b", "c"]);
        assert_eq!(g.unique_function_labels(), vec!["a", "b", "c"]);
        let other = chain(&["d", "a"]);
        assert_eq!(
            unique_function_labels_across([&g, &other]),
            vec!["a", "b", "c", "d"]
        );
    }
}
