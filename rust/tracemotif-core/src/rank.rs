//! Deterministic tie-break ranks.
//!
//! A node's rank is its hop distance from the root over the undirected view
//! of the call graph. It is only ever used as a secondary sort key so that
//! nodes sharing a timestamp order identically across runs.

use std::cmp::Reverse;
use std::collections::BinaryHeap;

use crate::error::ConstructionError;
use crate::graph::Adjacency;
use crate::span::NodeRef;

/// Relax unit-weight undirected edges outward from `root`.
///
/// Queue entries are `(rank, insertion counter, node)`; the counter grows on
/// every push so equal-rank entries pop in insertion order. A node may be
/// queued more than once; entries for already finalized nodes are skipped.
///
/// Fails with [`ConstructionError::DisconnectedGraph`] when some node is
/// never finalized.
pub fn compute_ranks(
    adjacency: &Adjacency,
    root: NodeRef,
    base_id: &str,
) -> Result<Vec<u32>, ConstructionError> {
    let n = adjacency.len();
    let mut best = vec![u32::MAX; n];
    let mut finalized = vec![false; n];
    let mut heap = BinaryHeap::new();
    let mut counter: u64 = 0;

    if root.0 < n {
        best[root.0] = 0;
        heap.push(Reverse((0u32, counter, root.0)));
        counter += 1;
    }

    while let Some(Reverse((rank, _, node))) = heap.pop() {
        if finalized[node] {
            continue;
        }
        finalized[node] = true;

        for neighbor in adjacency.neighbors(NodeRef(node)) {
            let candidate = rank + 1;
            if !finalized[neighbor.0] && candidate < best[neighbor.0] {
                best[neighbor.0] = candidate;
                heap.push(Reverse((candidate, counter, neighbor.0)));
                counter += 1;
            }
        }
    }

    let unreachable = finalized.iter().filter(|f| !**f).count();
    if unreachable > 0 {
        return Err(ConstructionError::DisconnectedGraph {
            base_id: base_id.to_string(),
            unreachable,
        });
    }
    Ok(best)
}
