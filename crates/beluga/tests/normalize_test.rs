use beluga::model::{EdgeLabel, LabelSize, LayoutGraph, NodeKind, NodeLabel, RankView};
use beluga::rank::{self, Balance};
use beluga::ranks::{self, Ranks};
use beluga::normalize;
use beluga_digraph::NodeId;

fn add_nodes(g: &mut LayoutGraph, n: usize) -> Vec<NodeId> {
    (0..n).map(|_| g.add_node(NodeLabel::default())).collect()
}

fn ranked(mut g: LayoutGraph) -> (LayoutGraph, Ranks) {
    rank::assign(&mut g, RankView::Normal, usize::MAX, Balance::None);
    ranks::normalize_ranks(&mut g, RankView::Normal);
    let r = Ranks::build(&mut g, 50.0);
    (g, r)
}

#[test]
fn merges_parallel_edges_into_one_representative() {
    let mut g = LayoutGraph::new();
    let ids = add_nodes(&mut g, 2);
    let e1 = g.add_edge(ids[0], ids[1], EdgeLabel::default());
    g.add_edge(
        ids[0],
        ids[1],
        EdgeLabel {
            weight: 2.0,
            minlen: 3,
            ..Default::default()
        },
    );
    normalize::merge_parallel_edges(&mut g);
    assert_eq!(g.edge_count(), 1);
    let kept = g.edge(e1);
    assert_eq!(kept.weight, 3.0);
    assert_eq!(kept.minlen, 3);
    assert_eq!(kept.merged, 2);
}

#[test]
fn breaks_a_long_edge_into_a_virtual_chain() {
    let mut g = LayoutGraph::new();
    let ids = add_nodes(&mut g, 4);
    g.add_edge(ids[0], ids[1], EdgeLabel::default());
    g.add_edge(ids[1], ids[2], EdgeLabel::default());
    g.add_edge(ids[2], ids[3], EdgeLabel::default());
    let long = g.add_edge(
        ids[0],
        ids[3],
        EdgeLabel {
            weight: 2.0,
            ..Default::default()
        },
    );

    let (mut g, mut r) = ranked(g);
    let chains = normalize::run(&mut g, &mut r);

    assert_eq!(chains.len(), 1);
    let chain = &chains[0];
    assert_eq!(chain.edge, long);
    assert_eq!(chain.tail, ids[0]);
    assert_eq!(chain.head, ids[3]);
    assert_eq!(chain.nodes.len(), 2);
    assert!(!g.contains_edge(long));

    for (i, &dummy) in chain.nodes.iter().enumerate() {
        let label = g.node(dummy);
        assert_eq!(label.kind, NodeKind::Virtual);
        assert_eq!(label.rank, Some(i as i32 + 1));
        assert_eq!(label.edge, Some(long));
        assert!(r.nodes(i as i32 + 1).contains(&dummy));
    }

    // Each replacement segment is rank-adjacent and keeps the weight.
    for e in g.edge_ids() {
        let (tail, head) = g.endpoints(e);
        let span = g.node(head).rank.unwrap() - g.node(tail).rank.unwrap();
        assert_eq!(span, 1);
    }
}

#[test]
fn tight_labeled_edge_gets_a_brand_new_rank() {
    let mut g = LayoutGraph::new();
    let ids = add_nodes(&mut g, 2);
    let e = g.add_edge(
        ids[0],
        ids[1],
        EdgeLabel {
            label_size: Some(LabelSize {
                width: 40.0,
                height: 12.0,
            }),
            ..Default::default()
        },
    );

    let (mut g, mut r) = ranked(g);
    assert_eq!(r.max_rank(), 1);
    let chains = normalize::run(&mut g, &mut r);

    // The head moved down to make room for the label's rank.
    assert_eq!(g.node(ids[1]).rank, Some(2));
    assert_eq!(r.max_rank(), 2);

    let chain = &chains[0];
    assert_eq!(chain.nodes.len(), 1);
    let label_node = chain.nodes[0];
    let label = g.node(label_node);
    assert_eq!(label.kind, NodeKind::EdgeLabel);
    assert_eq!(label.rank, Some(1));
    assert_eq!(label.width, 40.0);
    assert_eq!(label.height, 12.0);
    assert_eq!(label.edge, Some(e));
}

#[test]
fn label_lands_at_the_chain_midpoint() {
    let mut g = LayoutGraph::new();
    let ids = add_nodes(&mut g, 6);
    for pair in ids.windows(2) {
        g.add_edge(pair[0], pair[1], EdgeLabel::default());
    }
    g.add_edge(
        ids[0],
        ids[4],
        EdgeLabel {
            label_size: Some(LabelSize {
                width: 10.0,
                height: 10.0,
            }),
            ..Default::default()
        },
    );

    let (mut g, mut r) = ranked(g);
    let chains = normalize::run(&mut g, &mut r);
    let chain = chains
        .iter()
        .find(|c| c.label.label_size.is_some())
        .unwrap();
    let mid: Vec<&NodeId> = chain
        .nodes
        .iter()
        .filter(|&&v| g.node(v).kind == NodeKind::EdgeLabel)
        .collect();
    assert_eq!(mid.len(), 1);
    assert_eq!(g.node(*mid[0]).rank, Some(2));
}

#[test]
fn labeled_flat_edge_becomes_a_label_node_between_its_endpoints() {
    let mut g = LayoutGraph::new();
    let ids = add_nodes(&mut g, 2);
    g.node_mut(ids[0]).rank = Some(0);
    g.node_mut(ids[1]).rank = Some(0);
    let e = g.add_edge(
        ids[0],
        ids[1],
        EdgeLabel {
            label_size: Some(LabelSize {
                width: 8.0,
                height: 8.0,
            }),
            ..Default::default()
        },
    );

    let mut r = Ranks::build(&mut g, 50.0);
    let chains = normalize::run(&mut g, &mut r);

    assert!(!g.contains_edge(e));
    assert_eq!(chains.len(), 1);
    let label_node = chains[0].nodes[0];
    assert_eq!(g.node(label_node).kind, NodeKind::EdgeLabel);
    assert_eq!(g.node(label_node).rank, Some(0));
    assert_eq!(g.find_edge(ids[0], label_node).is_some(), true);
    assert_eq!(g.find_edge(label_node, ids[1]).is_some(), true);
}

#[test]
fn unlabeled_flat_edges_survive_untouched() {
    let mut g = LayoutGraph::new();
    let ids = add_nodes(&mut g, 2);
    g.node_mut(ids[0]).rank = Some(0);
    g.node_mut(ids[1]).rank = Some(0);
    let e = g.add_edge(ids[0], ids[1], EdgeLabel::default());
    let mut r = Ranks::build(&mut g, 50.0);
    let chains = normalize::run(&mut g, &mut r);
    assert!(chains.is_empty());
    assert!(g.contains_edge(e));
}
