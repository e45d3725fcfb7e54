//! Implementation of the `tracemotif` subcommands.
//!
//! Each command resolves files through the configured [`DatasetLayout`] and
//! returns a serializable report; rendering is left to the caller.

use std::fmt;
use std::path::PathBuf;

use serde::Serialize;
use tracemotif_core::TraceGraph;
use tracemotif_store::{
    prune_with_cache, read_motifs, read_trace, write_motifs, ArtifactCache, CacheError, CodecError,
    ConfigError, DatasetLayout, MotifVariant, StoreConfig,
};
use tracing::debug;

// =============================================================================
// Errors
// =============================================================================

#[derive(Debug, thiserror::Error)]
pub enum CliError {
    #[error("failed to load configuration")]
    Config(#[from] ConfigError),

    #[error("failed to read trace '{base_id}'")]
    Trace {
        base_id: String,
        #[source]
        source: CodecError,
    },

    #[error("failed to process motifs of '{base_id}'")]
    Motifs {
        base_id: String,
        #[source]
        source: CodecError,
    },

    #[error("failed to list dataset '{dataset}'")]
    List {
        dataset: String,
        #[source]
        source: CodecError,
    },

    #[error("artifact cache failure")]
    Cache(#[from] CacheError),
}

// =============================================================================
// Workspace
// =============================================================================

/// Resolved configuration shared by every command.
#[derive(Debug, Clone)]
pub struct Workspace {
    pub config: StoreConfig,
    pub layout: DatasetLayout,
}

impl Workspace {
    pub fn new(config: StoreConfig) -> Self {
        let layout = DatasetLayout::from_config(&config);
        Self { config, layout }
    }

    pub fn load_trace(&self, dataset: &str, base_id: &str) -> Result<TraceGraph, CliError> {
        let path = self.layout.trace_path(dataset, base_id);
        debug!(dataset, base_id, path = %path.display(), "loading trace");
        read_trace(&path, self.config.widths(dataset)).map_err(|source| CliError::Trace {
            base_id: base_id.to_string(),
            source,
        })
    }
}

// =============================================================================
// list
// =============================================================================

pub fn list_traces(ws: &Workspace, dataset: &str) -> Result<Vec<String>, CliError> {
    let paths = ws
        .layout
        .list_traces(dataset)
        .map_err(|source| CliError::List {
            dataset: dataset.to_string(),
            source,
        })?;
    Ok(paths
        .iter()
        .filter_map(|p| DatasetLayout::base_id_of(p))
        .map(str::to_string)
        .collect())
}

// =============================================================================
// inspect-trace
// =============================================================================

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TraceSummary {
    pub base_id: String,
    pub request_type: String,
    pub nodes: usize,
    pub edges: usize,
    pub duration: i64,
    pub sequences: usize,
    pub longest_sequence: usize,
    pub unique_function_labels: Vec<String>,
}

impl fmt::Display for TraceSummary {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "trace {} ({})", self.base_id, self.request_type)?;
        writeln!(f, "  nodes:      {}", self.nodes)?;
        writeln!(f, "  edges:      {}", self.edges)?;
        writeln!(f, "  duration:   {}", self.duration)?;
        writeln!(
            f,
            "  sequences:  {} (longest {})",
            self.sequences, self.longest_sequence
        )?;
        write!(f, "  labels:     {}", self.unique_function_labels.join(", "))
    }
}

pub fn inspect_trace(ws: &Workspace, dataset: &str, base_id: &str) -> Result<TraceSummary, CliError> {
    let graph = ws.load_trace(dataset, base_id)?;
    Ok(TraceSummary {
        base_id: graph.base_id().to_string(),
        request_type: graph.request_type().to_string(),
        nodes: graph.len(),
        edges: graph.edges().len(),
        duration: graph.duration(),
        sequences: graph.sequences().len(),
        longest_sequence: graph.sequences().iter().map(|s| s.len()).max().unwrap_or(0),
        unique_function_labels: graph.unique_function_labels(),
    })
}

// =============================================================================
// inspect-motifs
// =============================================================================

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct MotifSummary {
    pub base_id: String,
    pub variant: String,
    pub encoding: String,
    pub motifs: usize,
    pub largest: usize,
    pub coverage_percent: f64,
}

impl fmt::Display for MotifSummary {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "motifs of {} [{}]", self.base_id, self.variant)?;
        writeln!(f, "  encoding:   {}", self.encoding)?;
        writeln!(f, "  motifs:     {}", self.motifs)?;
        writeln!(f, "  largest:    {}", self.largest)?;
        write!(f, "  coverage:   {:.1}%", self.coverage_percent)
    }
}

pub fn inspect_motifs(
    ws: &Workspace,
    dataset: &str,
    base_id: &str,
    variant: MotifVariant,
) -> Result<MotifSummary, CliError> {
    let graph = ws.load_trace(dataset, base_id)?;
    let path = ws.layout.motif_path(dataset, base_id, variant);
    let set = read_motifs(&path, &graph).map_err(|source| CliError::Motifs {
        base_id: base_id.to_string(),
        source,
    })?;
    Ok(MotifSummary {
        base_id: base_id.to_string(),
        variant: variant.to_string(),
        encoding: set.encoding().to_string(),
        motifs: set.len(),
        largest: set.motifs().iter().map(|m| m.size()).max().unwrap_or(0),
        coverage_percent: set.coverage(graph.len()),
    })
}

// =============================================================================
// prune
// =============================================================================

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PruneReport {
    pub base_id: String,
    pub variant: String,
    pub kept: usize,
    pub total: usize,
    pub coverage_percent: f64,
    pub output: PathBuf,
}

impl fmt::Display for PruneReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{}: kept {} of {} motifs ({:.1}% coverage) -> {}",
            self.base_id,
            self.kept,
            self.total,
            self.coverage_percent,
            self.output.display()
        )
    }
}

/// Prune the raw motif file for `variant` and write its pruned sibling.
pub fn prune(
    ws: &Workspace,
    dataset: &str,
    base_id: &str,
    variant: MotifVariant,
) -> Result<PruneReport, CliError> {
    let motif_err = |source: CodecError| CliError::Motifs {
        base_id: base_id.to_string(),
        source,
    };

    let graph = ws.load_trace(dataset, base_id)?;
    let raw = read_motifs(&ws.layout.motif_path(dataset, base_id, variant), &graph).map_err(motif_err)?;

    let mut cache = ArtifactCache::open(&ws.config.cache_dir)?;
    let pruned = prune_with_cache(&mut cache, &raw, &graph, variant)?;

    let output = ws.layout.motif_path(dataset, base_id, variant.pruned());
    write_motifs(&output, &pruned).map_err(motif_err)?;

    Ok(PruneReport {
        base_id: base_id.to_string(),
        variant: variant.pruned().to_string(),
        kept: pruned.len(),
        total: raw.len(),
        coverage_percent: pruned.coverage(graph.len()),
        output,
    })
}
