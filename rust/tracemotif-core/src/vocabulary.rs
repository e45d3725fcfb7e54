//! Name ↔ index mapping shared by every trace of a dataset.
//!
//! Sequence-mined motifs are stored as runs of [`LabelId`]s, so a motif file
//! is only meaningful together with the vocabulary it was written against.
//! The on-disk form is one name per line, line number = index.

use std::collections::{BTreeSet, HashMap};

use serde::{Deserialize, Serialize};

use crate::error::MotifError;
use crate::graph::TraceGraph;

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct LabelId(pub u32);

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct LabelVocabulary {
    names: Vec<String>,
    index: HashMap<String, LabelId>,
}

impl LabelVocabulary {
    /// Vocabulary over the sorted union of node names of `traces`.
    pub fn from_traces<'a>(traces: impl IntoIterator<Item = &'a TraceGraph>) -> Self {
        let mut names = BTreeSet::new();
        for trace in traces {
            names.extend(trace.unique_names());
        }
        Self::from_names(names)
    }

    /// Vocabulary in the given order. Repeated names keep their first index.
    pub fn from_names<S: Into<String>>(names: impl IntoIterator<Item = S>) -> Self {
        let mut vocab = Self::default();
        for name in names {
            vocab.insert(name.into());
        }
        vocab
    }

    /// Parse the newline-separated mapping form. Blank lines are skipped.
    pub fn from_mapping_text(text: &str) -> Self {
        Self::from_names(text.lines().filter(|l| !l.trim().is_empty()))
    }

    pub fn to_mapping_text(&self) -> String {
        let mut out = String::new();
        for name in &self.names {
            out.push_str(name);
            out.push('\n');
        }
        out
    }

    /// Add `name` if absent and return its id.
    pub fn insert(&mut self, name: String) -> LabelId {
        if let Some(&id) = self.index.get(&name) {
            return id;
        }
        let id = LabelId(self.names.len() as u32);
        self.index.insert(name.clone(), id);
        self.names.push(name);
        id
    }

    pub fn get(&self, name: &str) -> Option<LabelId> {
        self.index.get(name).copied()
    }

    pub fn name(&self, id: LabelId) -> Option<&str> {
        self.names.get(id.0 as usize).map(String::as_str)
    }

    pub fn len(&self) -> usize {
        self.names.len()
    }

    pub fn is_empty(&self) -> bool {
        self.names.is_empty()
    }

    /// The trace's time-ordered nodes as label ids.
    pub fn label_sequence(&self, graph: &TraceGraph) -> Result<Vec<LabelId>, MotifError> {
        graph
            .ordered_nodes()
            .map(|node| {
                let name = node.name();
                self.get(&name).ok_or(MotifError::UnknownLabel(name))
            })
            .collect()
    }
}
