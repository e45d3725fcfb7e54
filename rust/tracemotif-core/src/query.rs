//! Occurrence lookup for already-known sequence motifs.
//!
//! [`crate::identify`] decides *which* label runs are motifs; this module
//! only finds where those runs occur in one trace's time-ordered label
//! sequence.

use std::collections::HashSet;

use crate::error::MotifError;
use crate::graph::TraceGraph;
use crate::motif::Motif;
use crate::vocabulary::{LabelId, LabelVocabulary};

/// Every occurrence of any run in `known` within `graph`.
///
/// Runs shorter than two labels cannot form a valid span and are ignored.
/// Occurrences are emitted by end position, then by start position.
pub fn find_sequence_occurrences(
    graph: &TraceGraph,
    vocab: &LabelVocabulary,
    known: &HashSet<Vec<LabelId>>,
) -> Result<Vec<Motif>, MotifError> {
    let runs: Vec<&Vec<LabelId>> = known.iter().filter(|r| r.len() >= 2).collect();
    let Some(min_len) = runs.iter().map(|r| r.len()).min() else {
        return Ok(Vec::new());
    };
    let max_len = runs.iter().map(|r| r.len()).max().unwrap_or(min_len);

    let labels = vocab.label_sequence(graph)?;
    let timestamps: Vec<i64> = graph.ordered_nodes().map(|n| n.timestamp).collect();

    let mut found = Vec::new();
    for end in 0..labels.len() {
        for len in (min_len..=max_len).rev() {
            if len > end + 1 {
                continue;
            }
            let start = end + 1 - len;
            let window = &labels[start..=end];
            if known.contains(window) {
                let duration = timestamps[end] - timestamps[start];
                found.push(Motif::sequence(window.to_vec(), start, end, duration)?);
            }
        }
    }
    Ok(found)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::span::{Node, SpanBatch};

    fn chain(labels: &[&str]) -> TraceGraph {
        let mut batch = SpanBatch::new("get", "q");
        let mut prev = None;
        for (i, label) in labels.iter().enumerate() {
            let id = batch.push_node(Node::new(format!("n{}", i), *label, 5 * i as i64));
            if let Some(p) = prev {
                batch.link(p, id);
            }
            prev = Some(id);
        }
        batch.build().unwrap()
    }

    #[test]
    fn finds_every_occurrence_of_known_runs() {
        let g = chain(&["a", "b", "c", "a", "b"]);
        let vocab = LabelVocabulary::from_traces([&g]);
        let ab = vec![vocab.get("a").unwrap(), vocab.get("b").unwrap()];
        let abc = vec![
            vocab.get("a").unwrap(),
            vocab.get("b").unwrap(),
            vocab.get("c").unwrap(),
        ];
        let known: HashSet<Vec<LabelId>> = [ab, abc].into_iter().collect();

        let found = find_sequence_occurrences(&g, &vocab, &known).unwrap();
        let spans: Vec<(usize, usize, i64)> = found
            .iter()
            .map(|m| (m.start_index(), m.end_index(), m.duration()))
            .collect();
        assert_eq!(spans, vec![(0, 1, 5), (0, 2, 10), (3, 4, 5)]);
    }

    #[test]
    fn single_label_runs_are_ignored() {
        let g = chain(&["a", "b"]);
        let vocab = LabelVocabulary::from_traces([&g]);
        let known: HashSet<Vec<LabelId>> = [vec![LabelId(0)]].into_iter().collect();
        assert!(find_sequence_occurrences(&g, &vocab, &known).unwrap().is_empty());
    }
}
