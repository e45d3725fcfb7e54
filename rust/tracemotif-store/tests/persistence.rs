//! Integration tests for `tracemotif_store`: files on disk under a dataset
//! layout, fail-fast writes, optional reads, and cached pruning.

use std::path::PathBuf;

use tracemotif_core::*;
use tracemotif_store::*;

// ===========================================================================
// Helpers
// ===========================================================================

struct TempRoot(PathBuf);

impl TempRoot {
    fn new() -> Self {
        let dir = std::env::temp_dir().join(format!("tracemotif-store-{}", uuid::Uuid::new_v4()));
        std::fs::create_dir_all(&dir).unwrap();
        TempRoot(dir)
    }
}

impl Drop for TempRoot {
    fn drop(&mut self) {
        let _ = std::fs::remove_dir_all(&self.0);
    }
}

fn request(base_id: &str) -> TraceGraph {
    let spans = vec![
        LinkedSpan::root(Node::new("s0", "nova.api.create", 1_700_000_000).with_variant(Variant::Entry)),
        LinkedSpan::new(Node::new("s1", "nova.scheduler", 1_700_000_004), vec!["s0".into()]),
        LinkedSpan::new(Node::new("s2", "nova.compute", 1_700_000_009), vec!["s1".into()]),
        LinkedSpan::new(Node::new("s3", "neutron.port", 1_700_000_009), vec!["s0".into()]),
        LinkedSpan::new(
            Node::new("s4", "nova.api.create", 1_700_000_020).with_variant(Variant::Exit),
            vec!["s2".into(), "s3".into()],
        ),
    ];
    SpanBatch::from_linked_spans("ServerCreate", base_id, spans)
        .unwrap()
        .build()
        .unwrap()
}

// ===========================================================================
// Trace files
// ===========================================================================

#[test]
fn trace_survives_a_trip_through_the_dataset_layout() {
    let root = TempRoot::new();
    let layout = DatasetLayout::new(&root.0);
    let widths = StoreConfig::default().widths("openstack");

    let g = request("req-1");
    let path = layout.trace_path("openstack", g.base_id());
    write_trace(&path, &g, widths).unwrap();

    assert_eq!(layout.list_traces("openstack").unwrap(), vec![path.clone()]);
    assert_eq!(DatasetLayout::base_id_of(&path), Some("req-1"));

    let back = read_trace(&path, widths).unwrap();
    assert_eq!(back.nodes(), g.nodes());
    assert_eq!(back.edges(), g.edges());
    assert_eq!(back.ranks(), g.ranks());
    assert_eq!(back.ordered_refs(), g.ordered_refs());
    assert_eq!(back.kth_node(4).map(|n| n.id.as_str()), Some("s4"));
}

#[test]
fn base_id_at_max_width_fits_and_one_more_writes_nothing() {
    let root = TempRoot::new();
    let layout = DatasetLayout::new(&root.0);
    let widths = FieldWidths::XTRACE;

    let exact = "x".repeat(widths.string_width);
    let path = layout.trace_path("xtrace", "exact");
    write_trace(&path, &request(&exact), widths).unwrap();
    assert_eq!(read_trace(&path, widths).unwrap().base_id(), exact);

    let long = "x".repeat(widths.string_width + 1);
    let path = layout.trace_path("xtrace", "long");
    let err = write_trace(&path, &request(&long), widths).unwrap_err();
    assert!(matches!(
        err,
        CodecError::FieldTooLong {
            field: "base_id",
            len: 33,
            max: 32,
            ..
        }
    ));
    assert!(!path.exists());
}

#[test]
fn truncated_trace_file_is_rejected_with_its_path() {
    let root = TempRoot::new();
    let path = root.0.join("cut.trace");
    let bytes = encode_trace(&request("cut"), FieldWidths::OPENSTACK).unwrap();
    std::fs::write(&path, &bytes[..bytes.len() / 2]).unwrap();

    let err = read_trace(&path, FieldWidths::OPENSTACK).unwrap_err();
    assert!(err.is_corrupt());
    assert!(matches!(err, CodecError::TruncatedFile { ref origin, .. } if origin.ends_with("cut.trace")));
}

#[test]
fn missing_trace_file_is_an_io_error() {
    let root = TempRoot::new();
    let err = read_trace(&root.0.join("none.trace"), FieldWidths::OPENSTACK).unwrap_err();
    assert!(matches!(err, CodecError::Io { .. }));
}

// ===========================================================================
// Motif files
// ===========================================================================

#[test]
fn optional_motif_reads_treat_bad_files_as_absent() {
    let root = TempRoot::new();
    let layout = DatasetLayout::new(&root.0);
    let g = request("req-2");
    let variant = MotifVariant::complete(Reduction::None);
    let path = layout.motif_path("openstack", g.base_id(), variant);

    assert!(read_motifs_optional(&path, &g).is_none());

    let set = MotifSet::new(
        g.base_id(),
        MotifEncoding::Subgraph,
        vec![Motif::subgraph(&g, vec![NodeRef(1), NodeRef(2)], 4).unwrap()],
    )
    .unwrap();
    write_motifs(&path, &set).unwrap();
    assert_eq!(read_motifs_optional(&path, &g), Some(set));

    std::fs::write(&path, [9u8, 0, 0]).unwrap();
    assert!(read_motifs_optional(&path, &g).is_none());
    assert!(matches!(
        read_motifs(&path, &g),
        Err(CodecError::UnknownMotifEncoding { tag: 9, .. })
    ));
}

#[test]
fn cached_pruning_reuses_identical_input() {
    let root = TempRoot::new();
    let mut cache = ArtifactCache::open(root.0.join("cache")).unwrap();
    let g = request("req-3");
    let vocab = LabelVocabulary::from_traces([&g]);
    let labels = vocab.label_sequence(&g).unwrap();

    let raw = MotifSet::new(
        g.base_id(),
        MotifEncoding::Sequence,
        vec![
            Motif::sequence(labels[0..3].to_vec(), 0, 2, 9).unwrap(),
            Motif::sequence(labels[1..5].to_vec(), 1, 4, 16).unwrap(),
            Motif::sequence(labels[3..5].to_vec(), 3, 4, 11).unwrap(),
        ],
    )
    .unwrap();
    let variant = MotifVariant::complete(Reduction::None);

    let first = prune_with_cache(&mut cache, &raw, &g, variant).unwrap();
    let spans: Vec<(usize, usize)> = first
        .motifs()
        .iter()
        .map(|m| (m.start_index(), m.end_index()))
        .collect();
    assert_eq!(spans, vec![(0, 2), (3, 4)]);
    assert_eq!(cache.len(), 1);

    let second = prune_with_cache(&mut cache, &raw, &g, variant).unwrap();
    assert_eq!(second, first);
    assert_eq!(cache.len(), 1);

    let key = ArtifactKey::new(g.base_id(), variant.pruned(), &encode_motifs(&raw).unwrap());
    assert!(cache.contains(&key));

    // Different input is a different artifact.
    let smaller = MotifSet::new(g.base_id(), MotifEncoding::Sequence, first.motifs().to_vec()).unwrap();
    prune_with_cache(&mut cache, &smaller, &g, variant).unwrap();
    assert_eq!(cache.len(), 2);
}
