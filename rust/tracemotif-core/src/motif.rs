//! Motif occurrences within one trace.
//!
//! A motif is a recurring labeled pattern. Two discovery strategies produce
//! them and each has its own persisted layout, so a [`Motif`] carries a
//! [`MotifShape`] discriminating the two:
//!
//! - sequence-mined: a contiguous run of label ids in time order;
//! - subgraph-mined: the node set of one isomorphic-subgraph match plus the
//!   id of the subgraph kind it matched.
//!
//! Either way the occurrence spans the time-order positions
//! `[start_index, end_index]` (inclusive) of its trace.

use std::ops::RangeInclusive;

use serde::{Deserialize, Serialize};

use crate::error::MotifError;
use crate::graph::TraceGraph;
use crate::span::NodeRef;
use crate::vocabulary::{LabelId, LabelVocabulary};

/// Which on-disk layout a motif (or a whole motif file) uses.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, strum::Display)]
#[strum(serialize_all = "kebab-case")]
pub enum MotifEncoding {
    Sequence,
    Subgraph,
}

/// The payload that distinguishes the two motif encodings.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum MotifShape {
    /// Label ids of a contiguous time-ordered run.
    Sequence { labels: Vec<LabelId> },
    /// Node-array positions of one match and the subgraph kind it matched.
    Subgraph { nodes: Vec<NodeRef>, kind_id: u64 },
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Motif {
    shape: MotifShape,
    start_index: usize,
    end_index: usize,
    duration: i64,
}

impl Motif {
    /// A sequence-mined occurrence. Requires `start_index < end_index` and a
    /// non-negative duration.
    pub fn sequence(
        labels: Vec<LabelId>,
        start_index: usize,
        end_index: usize,
        duration: i64,
    ) -> Result<Self, MotifError> {
        if labels.is_empty() {
            return Err(MotifError::Empty);
        }
        if start_index >= end_index {
            return Err(MotifError::InvalidSpan {
                start: start_index,
                end: end_index,
            });
        }
        if duration < 0 {
            return Err(MotifError::NegativeDuration(duration));
        }
        Ok(Self {
            shape: MotifShape::Sequence { labels },
            start_index,
            end_index,
            duration,
        })
    }

    /// A subgraph-mined occurrence over node-array positions of `graph`.
    /// The span and duration are derived from the nodes' time-order
    /// positions and timestamps.
    pub fn subgraph(graph: &TraceGraph, nodes: Vec<NodeRef>, kind_id: u64) -> Result<Self, MotifError> {
        if nodes.is_empty() {
            return Err(MotifError::Empty);
        }
        let mut start = usize::MAX;
        let mut end = 0;
        let mut earliest = i64::MAX;
        let mut latest = i64::MIN;
        for &node in &nodes {
            let (Some(position), Some(record)) = (graph.position_of(node), graph.node(node)) else {
                return Err(MotifError::NodeOutOfRange {
                    node: node.0,
                    len: graph.len(),
                });
            };
            start = start.min(position);
            end = end.max(position);
            earliest = earliest.min(record.timestamp);
            latest = latest.max(record.timestamp);
        }
        if start >= end {
            return Err(MotifError::InvalidSpan { start, end });
        }
        Ok(Self {
            shape: MotifShape::Subgraph { nodes, kind_id },
            start_index: start,
            end_index: end,
            duration: latest - earliest,
        })
    }

    pub fn shape(&self) -> &MotifShape {
        &self.shape
    }

    pub fn encoding(&self) -> MotifEncoding {
        match self.shape {
            MotifShape::Sequence { .. } => MotifEncoding::Sequence,
            MotifShape::Subgraph { .. } => MotifEncoding::Subgraph,
        }
    }

    pub fn start_index(&self) -> usize {
        self.start_index
    }

    pub fn end_index(&self) -> usize {
        self.end_index
    }

    pub fn duration(&self) -> i64 {
        self.duration
    }

    /// Number of elements: labels for sequence motifs, nodes for subgraphs.
    pub fn size(&self) -> usize {
        match &self.shape {
            MotifShape::Sequence { labels } => labels.len(),
            MotifShape::Subgraph { nodes, .. } => nodes.len(),
        }
    }

    pub fn kind_id(&self) -> Option<u64> {
        match self.shape {
            MotifShape::Subgraph { kind_id, .. } => Some(kind_id),
            MotifShape::Sequence { .. } => None,
        }
    }

    pub fn span(&self) -> RangeInclusive<usize> {
        self.start_index..=self.end_index
    }

    pub fn covers(&self, position: usize) -> bool {
        self.span().contains(&position)
    }

    pub fn overlaps(&self, other: &Motif) -> bool {
        self.start_index <= other.end_index && other.start_index <= self.end_index
    }

    /// Label names of a sequence motif; `None` for subgraph motifs or when a
    /// label is missing from `vocab`.
    pub fn label_names<'v>(&self, vocab: &'v LabelVocabulary) -> Option<Vec<&'v str>> {
        match &self.shape {
            MotifShape::Sequence { labels } => labels.iter().map(|id| vocab.name(*id)).collect(),
            MotifShape::Subgraph { .. } => None,
        }
    }
}

/// The motifs of one trace, ordered by `end_index`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MotifSet {
    base_id: String,
    encoding: MotifEncoding,
    motifs: Vec<Motif>,
}

impl MotifSet {
    /// Sorts `motifs` by `end_index` (stable). All motifs must share
    /// `encoding`.
    pub fn new(
        base_id: impl Into<String>,
        encoding: MotifEncoding,
        mut motifs: Vec<Motif>,
    ) -> Result<Self, MotifError> {
        if motifs.iter().any(|m| m.encoding() != encoding) {
            return Err(MotifError::MixedEncodings);
        }
        motifs.sort_by_key(|m| m.end_index);
        Ok(Self {
            base_id: base_id.into(),
            encoding,
            motifs,
        })
    }

    pub fn base_id(&self) -> &str {
        &self.base_id
    }

    pub fn encoding(&self) -> MotifEncoding {
        self.encoding
    }

    pub fn motifs(&self) -> &[Motif] {
        &self.motifs
    }

    pub fn into_motifs(self) -> Vec<Motif> {
        self.motifs
    }

    pub fn len(&self) -> usize {
        self.motifs.len()
    }

    pub fn is_empty(&self) -> bool {
        self.motifs.is_empty()
    }

    /// Motifs whose span covers time-order `position`.
    pub fn overlapping(&self, position: usize) -> impl Iterator<Item = &Motif> + '_ {
        self.motifs.iter().filter(move |m| m.covers(position))
    }

    /// Percentage of the first `node_count` positions claimed by at least
    /// one motif.
    pub fn coverage(&self, node_count: usize) -> f64 {
        if node_count == 0 {
            return 0.0;
        }
        let mut covered = vec![false; node_count];
        for motif in &self.motifs {
            for position in motif.span().filter(|p| *p < node_count) {
                covered[position] = true;
            }
        }
        100.0 * covered.iter().filter(|c| **c).count() as f64 / node_count as f64
    }

    /// The non-overlapping subset chosen by [`crate::prune::prune_motifs`].
    pub fn pruned(&self) -> MotifSet {
        MotifSet {
            base_id: self.base_id.clone(),
            encoding: self.encoding,
            motifs: crate::prune::prune_motifs(self.motifs.clone()),
        }
    }
}
