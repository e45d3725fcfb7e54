//! Frequency-based identification of sequence motifs.
//!
//! Every window of `min_len..=max_len` consecutive labels in each trace's
//! time-ordered label sequence is counted. A run is a motif of its request
//! type when it makes up at least 2% of all windows of its length, or when
//! it occurs at least once per trace on average. The resulting runs feed
//! [`crate::query::find_sequence_occurrences`].

use std::collections::{BTreeMap, HashMap, HashSet};

use tracing::debug;

use crate::error::MotifError;
use crate::graph::TraceGraph;
use crate::vocabulary::{LabelId, LabelVocabulary};

/// Shortest run considered by default.
pub const DEFAULT_MIN_RUN: usize = 5;
/// Longest run considered by default.
pub const DEFAULT_MAX_RUN: usize = 20;

/// Minimum share, in percent, of a run among windows of its length.
const MIN_FREQUENCY_PERCENT: usize = 2;

/// Frequent label runs across `traces`, which should share one request type.
///
/// Runs shorter than two labels are never motifs; `min_len` is raised to two.
pub fn identify_sequence_motifs<'a>(
    traces: impl IntoIterator<Item = &'a TraceGraph>,
    vocab: &LabelVocabulary,
    min_len: usize,
    max_len: usize,
) -> Result<HashSet<Vec<LabelId>>, MotifError> {
    let min_len = min_len.max(2);
    let mut counts: HashMap<Vec<LabelId>, usize> = HashMap::new();
    let mut windows_of_len: HashMap<usize, usize> = HashMap::new();
    let mut trace_count = 0;

    for graph in traces {
        trace_count += 1;
        let labels = vocab.label_sequence(graph)?;
        for len in min_len..=max_len.min(labels.len()) {
            for window in labels.windows(len) {
                *counts.entry(window.to_vec()).or_default() += 1;
            }
            *windows_of_len.entry(len).or_default() += labels.len() + 1 - len;
        }
    }

    let motifs: HashSet<Vec<LabelId>> = counts
        .into_iter()
        .filter(|(run, occurrences)| {
            let total = windows_of_len.get(&run.len()).copied().unwrap_or(0);
            occurrences * 100 >= total * MIN_FREQUENCY_PERCENT || *occurrences >= trace_count
        })
        .map(|(run, _)| run)
        .collect();

    debug!(traces = trace_count, motifs = motifs.len(), "identified sequence motifs");
    Ok(motifs)
}

/// [`identify_sequence_motifs`] applied to each request type separately.
pub fn identify_sequence_motifs_by_request_type<'a>(
    traces: impl IntoIterator<Item = &'a TraceGraph>,
    vocab: &LabelVocabulary,
    min_len: usize,
    max_len: usize,
) -> Result<BTreeMap<String, HashSet<Vec<LabelId>>>, MotifError> {
    let mut groups: BTreeMap<&str, Vec<&TraceGraph>> = BTreeMap::new();
    for graph in traces {
        groups.entry(graph.request_type()).or_default().push(graph);
    }
    groups
        .into_iter()
        .map(|(request_type, group)| {
            let motifs = identify_sequence_motifs(group, vocab, min_len, max_len)?;
            Ok((request_type.to_string(), motifs))
        })
        .collect()
}
