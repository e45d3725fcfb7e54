//! Binary trace files.
//!
//! ```text
//! [request_type: S][base_id: S][node_count: i32][edge_count: i32]
//! node_count x [id: S][function_label: L][timestamp: i64][variant: S]
//! edge_count x [source: i32][destination: i32][duration: i64][variant: S]
//! ```
//!
//! `S` and `L` are the dataset's [`FieldWidths`]. Edge endpoints are indices
//! into the node array. An empty variant field means "no variant".
//!
//! Decoding rebuilds the graph with [`TraceGraph::build`], so ranks,
//! sequences, and ordering are recomputed rather than stored.

use std::path::Path;
use std::str::FromStr;

use tracemotif_core::{Edge, Node, NodeRef, TraceGraph, Variant};
use tracing::debug;

use crate::config::FieldWidths;
use crate::error::CodecError;
use crate::wire::{Reader, Writer};

/// Serialize `graph` completely in memory.
pub fn encode_trace(graph: &TraceGraph, widths: FieldWidths) -> Result<Vec<u8>, CodecError> {
    let mut w = Writer::new(graph.base_id());
    let s = widths.string_width;

    w.put_str("request_type", graph.request_type(), s)?;
    w.put_str("base_id", graph.base_id(), s)?;
    w.put_len_i32("node_count", graph.nodes().len())?;
    w.put_len_i32("edge_count", graph.edges().len())?;

    for node in graph.nodes() {
        w.put_str("node id", &node.id, s)?;
        w.put_str("function_label", &node.function_label, widths.label_width)?;
        w.put_i64(node.timestamp);
        let variant: &str = node.variant.map(<&'static str>::from).unwrap_or("");
        w.put_str("node variant", variant, s)?;
    }

    for edge in graph.edges() {
        w.put_len_i32("edge source", edge.source.index())?;
        w.put_len_i32("edge destination", edge.destination.index())?;
        w.put_i64(edge.duration);
        w.put_str("edge variant", edge.variant.as_deref().unwrap_or(""), s)?;
    }

    Ok(w.into_bytes())
}

/// Parse and rebuild a trace from `bytes`.
pub fn decode_trace(bytes: &[u8], widths: FieldWidths) -> Result<TraceGraph, CodecError> {
    decode_with_origin(bytes, widths, "<trace bytes>")
}

fn decode_with_origin(bytes: &[u8], widths: FieldWidths, origin: &str) -> Result<TraceGraph, CodecError> {
    let mut r = Reader::new(bytes, origin);
    let s = widths.string_width;

    let request_type = r.str("request_type", s)?;
    let base_id = r.str("base_id", s)?;
    let node_count = r.len_i32("node_count")?;
    let edge_count = r.len_i32("edge_count")?;

    let node_size = s + widths.label_width + 8 + s;
    let edge_size = 4 + 4 + 8 + s;
    let body = node_count
        .checked_mul(node_size)
        .and_then(|n| edge_count.checked_mul(edge_size).and_then(|e| n.checked_add(e)))
        .ok_or_else(|| r.malformed(format!("{} nodes and {} edges overflow", node_count, edge_count)))?;
    r.require("trace body", body)?;

    let mut nodes = Vec::with_capacity(node_count);
    for _ in 0..node_count {
        let id = r.str("node id", s)?;
        let function_label = r.str("function_label", widths.label_width)?;
        let timestamp = r.i64("timestamp")?;
        let variant = r.str("node variant", s)?;
        let mut node = Node::new(id, function_label, timestamp);
        if !variant.is_empty() {
            let parsed = Variant::from_str(&variant)
                .map_err(|_| r.malformed(format!("unknown node variant '{}'", variant)))?;
            node = node.with_variant(parsed);
        }
        nodes.push(node);
    }

    let mut edges = Vec::with_capacity(edge_count);
    for _ in 0..edge_count {
        let source = r.len_i32("edge source")?;
        let destination = r.len_i32("edge destination")?;
        let duration = r.i64("duration")?;
        let variant = r.str("edge variant", s)?;
        let mut edge = Edge::new(NodeRef(source), NodeRef(destination), duration);
        if !variant.is_empty() {
            edge = edge.with_variant(variant);
        }
        edges.push(edge);
    }

    r.finish()?;
    debug!(base_id = %base_id, nodes = node_count, edges = edge_count, "decoded trace");
    Ok(TraceGraph::build(nodes, edges, request_type, base_id)?)
}

/// Encode `graph` and write it to `path` in one step. Nothing is written if
/// encoding fails.
pub fn write_trace(path: &Path, graph: &TraceGraph, widths: FieldWidths) -> Result<(), CodecError> {
    let bytes = encode_trace(graph, widths)?;
    if let Some(dir) = path.parent() {
        std::fs::create_dir_all(dir).map_err(|e| CodecError::io(dir, e))?;
    }
    std::fs::write(path, &bytes).map_err(|e| CodecError::io(path, e))?;
    debug!(
        base_id = %graph.base_id(),
        path = %path.display(),
        bytes = bytes.len(),
        "wrote trace"
    );
    Ok(())
}

/// Read and rebuild the trace stored at `path`.
pub fn read_trace(path: &Path, widths: FieldWidths) -> Result<TraceGraph, CodecError> {
    let bytes = std::fs::read(path).map_err(|e| CodecError::io(path, e))?;
    decode_with_origin(&bytes, widths, &path.display().to_string())
}
