//! Binary motif files.
//!
//! A one-byte tag names the encoding, followed by the motif count and the
//! records:
//!
//! ```text
//! [tag: u8][motif_count: i64]
//! tag 1, sequence-mined:
//!   [size: i32][label_index: i32 x size][start_index: i32][end_index: i32][duration: i64]
//! tag 2, subgraph-mined:
//!   [node_count: i64][node_index: i64 x node_count][kind_id: i64]
//! ```
//!
//! Subgraph records store node-array indices only. Their span and duration
//! are recomputed against the trace they belong to when read.

use std::path::Path;

use tracemotif_core::{LabelId, Motif, MotifEncoding, MotifError, MotifSet, MotifShape, NodeRef, TraceGraph};
use tracing::{debug, warn};

use crate::error::CodecError;
use crate::wire::{Reader, Writer};

const TAG_SEQUENCE: u8 = 1;
const TAG_SUBGRAPH: u8 = 2;

/// Smallest possible record in either encoding; bounds up-front allocation.
const MIN_RECORD_BYTES: usize = 16;

fn tag_of(encoding: MotifEncoding) -> u8 {
    match encoding {
        MotifEncoding::Sequence => TAG_SEQUENCE,
        MotifEncoding::Subgraph => TAG_SUBGRAPH,
    }
}

// ---------------------------------------------------------------------------
// Encoding
// ---------------------------------------------------------------------------

pub fn encode_motifs(set: &MotifSet) -> Result<Vec<u8>, CodecError> {
    let mut w = Writer::new(set.base_id());
    w.put_u8(tag_of(set.encoding()));
    w.put_len_i64("motif_count", set.len())?;

    for motif in set.motifs() {
        match motif.shape() {
            MotifShape::Sequence { labels } => {
                w.put_len_i32("motif_size", labels.len())?;
                for label in labels {
                    w.put_len_i32("label_index", label.0 as usize)?;
                }
                w.put_len_i32("start_index", motif.start_index())?;
                w.put_len_i32("end_index", motif.end_index())?;
                w.put_i64(motif.duration());
            }
            MotifShape::Subgraph { nodes, kind_id } => {
                w.put_len_i64("node_count", nodes.len())?;
                for node in nodes {
                    w.put_len_i64("node_index", node.index())?;
                }
                let kind = i64::try_from(*kind_id).map_err(|_| CodecError::FieldTooLong {
                    origin: set.base_id().to_string(),
                    field: "kind_id",
                    len: usize::try_from(*kind_id).unwrap_or(usize::MAX),
                    max: i64::MAX as usize,
                })?;
                w.put_i64(kind);
            }
        }
    }

    Ok(w.into_bytes())
}

// ---------------------------------------------------------------------------
// Decoding
// ---------------------------------------------------------------------------

/// Decode the motifs of `graph` from `bytes`.
pub fn decode_motifs(bytes: &[u8], graph: &TraceGraph) -> Result<MotifSet, CodecError> {
    decode_with_origin(bytes, graph, graph.base_id())
}

fn decode_with_origin(bytes: &[u8], graph: &TraceGraph, origin: &str) -> Result<MotifSet, CodecError> {
    let mut r = Reader::new(bytes, origin);
    let tag = r.u8("encoding tag")?;
    let encoding = match tag {
        TAG_SEQUENCE => MotifEncoding::Sequence,
        TAG_SUBGRAPH => MotifEncoding::Subgraph,
        tag => {
            return Err(CodecError::UnknownMotifEncoding {
                origin: origin.to_string(),
                tag,
            })
        }
    };
    let count = r.len_i64("motif_count")?;
    r.require("motif records", count.saturating_mul(MIN_RECORD_BYTES))?;

    let mut motifs = Vec::with_capacity(count);
    for index in 0..count {
        let motif = match encoding {
            MotifEncoding::Sequence => read_sequence_record(&mut r, graph),
            MotifEncoding::Subgraph => read_subgraph_record(&mut r, graph),
        };
        let motif = motif?.map_err(|source| CodecError::InvalidMotif {
            origin: r.origin().to_string(),
            index,
            source,
        })?;
        motifs.push(motif);
    }
    r.finish()?;

    debug!(base_id = %graph.base_id(), %encoding, motifs = motifs.len(), "decoded motifs");
    MotifSet::new(graph.base_id(), encoding, motifs).map_err(|source| CodecError::InvalidMotif {
        origin: origin.to_string(),
        index: 0,
        source,
    })
}

/// Outer error: the bytes are unreadable. Inner error: the bytes decode but
/// do not describe a valid motif of `graph`.
type Record = Result<Result<Motif, MotifError>, CodecError>;

fn read_sequence_record(r: &mut Reader<'_>, graph: &TraceGraph) -> Record {
    let size = r.len_i32("motif_size")?;
    r.require("label indices", size.saturating_mul(4))?;
    let mut labels = Vec::with_capacity(size);
    for _ in 0..size {
        labels.push(LabelId(r.len_i32("label_index")? as u32));
    }
    let start = r.len_i32("start_index")?;
    let end = r.len_i32("end_index")?;
    let duration = r.i64("duration")?;
    if end >= graph.len() {
        return Ok(Err(MotifError::NodeOutOfRange {
            node: end,
            len: graph.len(),
        }));
    }
    Ok(Motif::sequence(labels, start, end, duration))
}

fn read_subgraph_record(r: &mut Reader<'_>, graph: &TraceGraph) -> Record {
    let node_count = r.len_i64("node_count")?;
    r.require("node indices", node_count.saturating_mul(8))?;
    let mut nodes = Vec::with_capacity(node_count);
    for _ in 0..node_count {
        nodes.push(NodeRef(r.len_i64("node_index")?));
    }
    let kind = r.i64("kind_id")?;
    let kind_id = u64::try_from(kind).map_err(|_| r.malformed(format!("kind_id is negative ({})", kind)))?;
    Ok(Motif::subgraph(graph, nodes, kind_id))
}

// ---------------------------------------------------------------------------
// Files
// ---------------------------------------------------------------------------

pub fn write_motifs(path: &Path, set: &MotifSet) -> Result<(), CodecError> {
    let bytes = encode_motifs(set)?;
    if let Some(dir) = path.parent() {
        std::fs::create_dir_all(dir).map_err(|e| CodecError::io(dir, e))?;
    }
    std::fs::write(path, &bytes).map_err(|e| CodecError::io(path, e))?;
    debug!(
        base_id = %set.base_id(),
        path = %path.display(),
        motifs = set.len(),
        "wrote motifs"
    );
    Ok(())
}

pub fn read_motifs(path: &Path, graph: &TraceGraph) -> Result<MotifSet, CodecError> {
    let bytes = std::fs::read(path).map_err(|e| CodecError::io(path, e))?;
    decode_with_origin(&bytes, graph, &path.display().to_string())
}

/// Like [`read_motifs`], but a missing or unreadable file counts as absent.
pub fn read_motifs_optional(path: &Path, graph: &TraceGraph) -> Option<MotifSet> {
    if !path.exists() {
        debug!(path = %path.display(), "motif file absent");
        return None;
    }
    match read_motifs(path, graph) {
        Ok(set) => Some(set),
        Err(err) => {
            warn!(base_id = %graph.base_id(), error = %err, "ignoring unreadable motif file");
            None
        }
    }
}
