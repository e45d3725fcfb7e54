//! Integration tests for the `tracemotif` subcommands against a dataset in
//! a temporary data root.

use std::path::PathBuf;

use tracemotif_cli::commands::{self, CliError, Workspace};
use tracemotif_cli::error_chain::chain_from_error;
use tracemotif_core::*;
use tracemotif_store::*;

// ===========================================================================
// Helpers
// ===========================================================================

struct Fixture {
    root: PathBuf,
    ws: Workspace,
}

impl Fixture {
    fn new() -> Self {
        let root = std::env::temp_dir().join(format!("tracemotif-cli-{}", uuid::Uuid::new_v4()));
        let config = StoreConfig {
            data_root: root.join("data"),
            cache_dir: root.join("cache"),
            ..StoreConfig::default()
        };
        Fixture {
            root,
            ws: Workspace::new(config),
        }
    }

    /// Writes a six-node chain `a b c a b c` and returns it.
    fn add_trace(&self, base_id: &str) -> TraceGraph {
        let mut batch = SpanBatch::new("Boot", base_id);
        let mut prev = None;
        for (i, label) in ["a", "b", "c", "a", "b", "c"].iter().enumerate() {
            let id = batch.push_node(Node::new(format!("n{}", i), *label, 2 * i as i64));
            if let Some(p) = prev {
                batch.link(p, id);
            }
            prev = Some(id);
        }
        let graph = batch.build().unwrap();
        let path = self.ws.layout.trace_path("xtrace", base_id);
        write_trace(&path, &graph, self.ws.config.widths("xtrace")).unwrap();
        graph
    }
}

impl Drop for Fixture {
    fn drop(&mut self) {
        let _ = std::fs::remove_dir_all(&self.root);
    }
}

// ===========================================================================
// Commands
// ===========================================================================

#[test]
fn list_and_inspect_trace() {
    let fx = Fixture::new();
    fx.add_trace("t2");
    fx.add_trace("t1");

    assert_eq!(commands::list_traces(&fx.ws, "xtrace").unwrap(), vec!["t1", "t2"]);
    assert!(commands::list_traces(&fx.ws, "openstack").unwrap().is_empty());

    let summary = commands::inspect_trace(&fx.ws, "xtrace", "t1").unwrap();
    assert_eq!(summary.nodes, 6);
    assert_eq!(summary.edges, 5);
    assert_eq!(summary.duration, 10);
    assert_eq!(summary.sequences, 1);
    assert_eq!(summary.longest_sequence, 6);
    assert_eq!(summary.unique_function_labels, vec!["a", "b", "c"]);
    assert!(summary.to_string().starts_with("trace t1 (Boot)"));
}

#[test]
fn prune_writes_the_pruned_sibling() {
    let fx = Fixture::new();
    let graph = fx.add_trace("t1");
    let raw = MotifSet::new(
        "t1",
        MotifEncoding::Subgraph,
        vec![
            Motif::subgraph(&graph, vec![NodeRef(0), NodeRef(1), NodeRef(2)], 1).unwrap(),
            Motif::subgraph(&graph, vec![NodeRef(2), NodeRef(3)], 2).unwrap(),
            Motif::subgraph(&graph, vec![NodeRef(3), NodeRef(4), NodeRef(5)], 1).unwrap(),
        ],
    )
    .unwrap();
    let variant = MotifVariant::complete(Reduction::Collapsed);
    write_motifs(&fx.ws.layout.motif_path("xtrace", "t1", variant), &raw).unwrap();

    let report = commands::prune(&fx.ws, "xtrace", "t1", variant).unwrap();
    assert_eq!((report.kept, report.total), (2, 3));
    assert_eq!(report.variant, "collapsed-pruned");
    assert!((report.coverage_percent - 100.0).abs() < f64::EPSILON);
    assert!(report.output.ends_with("t1-motifs-collapsed-pruned.motifs"));

    let summary = commands::inspect_motifs(&fx.ws, "xtrace", "t1", variant.pruned()).unwrap();
    assert_eq!(summary.motifs, 2);
    assert_eq!(summary.encoding, "subgraph");
    assert_eq!(summary.largest, 3);

    // Re-running hits the cache and produces the same file.
    let again = commands::prune(&fx.ws, "xtrace", "t1", variant).unwrap();
    assert_eq!(again, report);
}

#[test]
fn missing_motif_file_reports_a_cause_chain() {
    let fx = Fixture::new();
    fx.add_trace("t1");
    let err = commands::inspect_motifs(&fx.ws, "xtrace", "t1", MotifVariant::complete(Reduction::None))
        .unwrap_err();
    assert!(matches!(err, CliError::Motifs { .. }));
    let shown = chain_from_error(&err).format_for_display();
    assert!(shown.starts_with("error: failed to process motifs of 't1'"));
    assert!(shown.contains("caused by: I/O error on"));
}

#[test]
fn unknown_trace_is_a_trace_error() {
    let fx = Fixture::new();
    let err = commands::inspect_trace(&fx.ws, "xtrace", "ghost").unwrap_err();
    assert!(matches!(err, CliError::Trace { ref base_id, .. } if base_id == "ghost"));
}
