//! tracemotif core
//!
//! Execution-trace graphs built from distributed-tracing spans: adjacency,
//! rank and sequence annotation, time ordering, and the motif model that
//! downstream analyses share.

pub mod collapse;
pub mod error;
pub mod graph;
pub mod identify;
pub mod motif;
pub mod prune;
pub mod query;
pub mod rank;
pub mod sequence;
pub mod span;
pub mod vocabulary;

pub use collapse::{CollapsedEntry, CollapsedTrace};
pub use error::{ConstructionError, MotifError};
pub use graph::{unique_function_labels_across, Adjacency, TraceGraph};
pub use identify::{identify_sequence_motifs, identify_sequence_motifs_by_request_type};
pub use motif::{Motif, MotifEncoding, MotifSet, MotifShape};
pub use prune::prune_motifs;
pub use query::find_sequence_occurrences;
pub use sequence::{Sequence, SequenceId, SequencePartition};
pub use span::{Edge, LinkedSpan, Node, NodeRef, SpanBatch, Variant};
pub use vocabulary::{LabelId, LabelVocabulary};
