//! Greedy non-overlap pruning of motif occurrences.
//!
//! Candidates are visited by `(start_index ascending, size descending)`,
//! stable with respect to input order. Every accepted motif starts at or
//! before the current candidate, so the candidate conflicts exactly when it
//! starts at or before the furthest accepted `end_index`. The result is
//! conflict-free and deterministic for a given input order, though not
//! coverage-optimal.

use tracing::info;

use crate::motif::Motif;

/// Select a pairwise non-overlapping subset of `motifs`, returned sorted by
/// `end_index`.
pub fn prune_motifs(mut motifs: Vec<Motif>) -> Vec<Motif> {
    let total = motifs.len();
    motifs.sort_by(|a, b| {
        a.start_index()
            .cmp(&b.start_index())
            .then(b.size().cmp(&a.size()))
    });

    let mut claimed_through: Option<usize> = None;
    let mut kept = Vec::new();

    for motif in motifs {
        if claimed_through.is_some_and(|end| motif.start_index() <= end) {
            continue;
        }
        claimed_through = Some(motif.end_index());
        kept.push(motif);
    }

    kept.sort_by_key(|m| m.end_index());
    info!(kept = kept.len(), total, "pruned motifs");
    kept
}
