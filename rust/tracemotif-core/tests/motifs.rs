//! Integration tests for motif discovery support: vocabulary, occurrence
//! lookup, collapsing, and pruning working on built traces.

use std::collections::HashSet;

use tracemotif_core::*;

// ===========================================================================
// Helpers
// ===========================================================================

/// `login, fetch, render` repeated `rounds` times as one chain.
fn repeating_session(base_id: &str, rounds: usize) -> TraceGraph {
    let mut batch = SpanBatch::new("session", base_id);
    let mut prev = None;
    let mut ts = 0;
    for round in 0..rounds {
        for label in ["login", "fetch", "render"] {
            let id = batch.push_node(Node::new(format!("{}-{}", label, round), label, ts));
            if let Some(p) = prev {
                batch.link(p, id);
            }
            prev = Some(id);
            ts += 3;
        }
    }
    batch.build().unwrap()
}

fn spans(motifs: &[Motif]) -> Vec<(usize, usize)> {
    motifs
        .iter()
        .map(|m| (m.start_index(), m.end_index()))
        .collect()
}

// ===========================================================================
// Pruning
// ===========================================================================

#[test]
fn overlapping_sequence_motifs_keep_the_earlier_one() {
    let a = Motif::sequence(vec![LabelId(0), LabelId(1), LabelId(2)], 2, 5, 9).unwrap();
    let b = Motif::sequence(
        vec![LabelId(0), LabelId(1), LabelId(2), LabelId(3)],
        3,
        7,
        4,
    )
    .unwrap();
    let set = MotifSet::new("t", MotifEncoding::Sequence, vec![b, a.clone()]).unwrap();
    let pruned = set.pruned();
    assert_eq!(pruned.motifs(), &[a]);
    assert_eq!(pruned.base_id(), "t");
    assert_eq!(pruned.encoding(), MotifEncoding::Sequence);
}

#[test]
fn identified_runs_drive_occurrence_lookup() {
    let traces = [repeating_session("s1", 3), repeating_session("s2", 3)];
    let vocab = LabelVocabulary::from_traces(&traces);

    let by_type = identify_sequence_motifs_by_request_type(
        &traces,
        &vocab,
        identify::DEFAULT_MIN_RUN,
        identify::DEFAULT_MAX_RUN,
    )
    .unwrap();
    let known = &by_type["session"];
    assert!(known.iter().all(|r| (5..=9).contains(&r.len())));

    let found = find_sequence_occurrences(&traces[0], &vocab, known).unwrap();
    let kept = prune_motifs(found);
    assert_eq!(spans(&kept), vec![(0, 8)]);
}

#[test]
fn occurrences_of_repeating_runs_prune_to_a_tiling() {
    let g = repeating_session("tiles", 3);
    let vocab = LabelVocabulary::from_traces([&g]);
    let run: Vec<LabelId> = ["login", "fetch", "render"]
        .iter()
        .map(|n| vocab.get(n).unwrap())
        .collect();
    let pair: Vec<LabelId> = run[1..].to_vec();
    let known: HashSet<Vec<LabelId>> = [run, pair].into_iter().collect();

    let found = find_sequence_occurrences(&g, &vocab, &known).unwrap();
    assert_eq!(found.len(), 6);

    let kept = prune_motifs(found);
    assert_eq!(spans(&kept), vec![(0, 2), (3, 5), (6, 8)]);
    for m in &kept {
        assert_eq!(m.size(), 3);
        assert_eq!(m.duration(), 6);
        assert_eq!(
            m.label_names(&vocab),
            Some(vec!["login", "fetch", "render"])
        );
    }

    let set = MotifSet::new(g.base_id(), MotifEncoding::Sequence, kept).unwrap();
    assert!((set.coverage(g.len()) - 100.0).abs() < f64::EPSILON);
}

#[test]
fn subgraph_motifs_prune_by_span() {
    let g = repeating_session("sub", 2);
    let first = Motif::subgraph(&g, vec![NodeRef(0), NodeRef(1), NodeRef(2)], 11).unwrap();
    let straddling = Motif::subgraph(&g, vec![NodeRef(2), NodeRef(3)], 12).unwrap();
    let second = Motif::subgraph(&g, vec![NodeRef(3), NodeRef(4), NodeRef(5)], 11).unwrap();
    let kept = prune_motifs(vec![straddling, second.clone(), first.clone()]);
    assert_eq!(kept, vec![first, second]);
}

// ===========================================================================
// Vocabulary and collapsing
// ===========================================================================

#[test]
fn vocabulary_spans_several_traces() {
    let a = repeating_session("a", 1);
    let mut batch = SpanBatch::new("session", "b");
    let r = batch.push_node(Node::new("r", "logout", 0));
    let c = batch.push_node(Node::new("c", "login", 1).with_variant(Variant::Exit));
    batch.link(r, c);
    let b = batch.build().unwrap();

    let vocab = LabelVocabulary::from_traces([&a, &b]);
    let text = vocab.to_mapping_text();
    assert_eq!(text, "fetch\nlogin\nlogin Exit\nlogout\nrender\n");
    assert_eq!(LabelVocabulary::from_mapping_text(&text), vocab);
    assert_eq!(
        unique_function_labels_across([&a, &b]),
        vec!["fetch", "login", "logout", "render"]
    );
}

#[test]
fn chain_collapses_to_its_first_node() {
    let g = repeating_session("collapse", 2);
    let collapsed = CollapsedTrace::new(&g);
    assert_eq!(collapsed.len(), 1);
    assert_eq!(collapsed.entries()[0].representative, g.root());
    assert_eq!(collapsed.entries()[0].covers, (0..6).collect::<Vec<_>>());
}
