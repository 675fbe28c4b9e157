use beluga::model::{
    EdgeLabel, LayoutGraph, LayoutOptions, NodeKind, NodeLabel, RankConstraint, RankView, Subgraph,
};
use beluga::rank::{self, Balance};
use beluga::{LayoutError, collapse, ranks};
use beluga_digraph::NodeId;

fn leaf(g: &mut LayoutGraph) -> NodeId {
    g.add_node(NodeLabel::with_size(10.0, 10.0))
}

fn cluster(g: &mut LayoutGraph) -> NodeId {
    g.add_node(NodeLabel {
        kind: NodeKind::Cluster,
        ..Default::default()
    })
}

fn edge(g: &mut LayoutGraph, tail: NodeId, head: NodeId) {
    g.add_edge(tail, head, EdgeLabel::default());
}

fn rank_of(g: &LayoutGraph, v: NodeId) -> i32 {
    g.node(v).rank.unwrap()
}

#[test]
fn empty_graph_is_a_hard_error() {
    let mut g = LayoutGraph::new();
    let err = collapse::assign_ranks(&mut g, &[], &LayoutOptions::default());
    assert_eq!(err, Err(LayoutError::GraphEmpty));
}

#[test]
fn flat_graph_matches_direct_rank_assignment() {
    let build = || {
        let mut g = LayoutGraph::new();
        let ids: Vec<NodeId> = (0..6).map(|_| g.add_node(NodeLabel::default())).collect();
        edge(&mut g, ids[0], ids[1]);
        edge(&mut g, ids[1], ids[2]);
        edge(&mut g, ids[0], ids[3]);
        edge(&mut g, ids[3], ids[2]);
        edge(&mut g, ids[2], ids[4]);
        edge(&mut g, ids[0], ids[5]);
        (g, ids)
    };

    let (mut collapsed, ids) = build();
    collapse::assign_ranks(&mut collapsed, &[], &LayoutOptions::default()).unwrap();
    ranks::normalize_ranks(&mut collapsed, RankView::Normal);

    let (mut direct, _) = build();
    rank::assign(&mut direct, RankView::Normal, usize::MAX, Balance::TopBottom);
    ranks::normalize_ranks(&mut direct, RankView::Normal);

    for &v in &ids {
        assert_eq!(rank_of(&collapsed, v), rank_of(&direct, v), "node {v:?}");
    }
}

#[test]
fn cluster_members_offset_by_the_proxy_rank() {
    // a -> b -> c -> x with x, y inside a cluster and x -> y: the cluster's
    // delegate lands at rank 3, so its members land at 3 and 4.
    let mut g = LayoutGraph::new();
    let a = leaf(&mut g);
    let b = leaf(&mut g);
    let c = leaf(&mut g);
    let k = cluster(&mut g);
    let x = leaf(&mut g);
    let y = leaf(&mut g);
    g.set_parent(x, k);
    g.set_parent(y, k);
    edge(&mut g, a, b);
    edge(&mut g, b, c);
    edge(&mut g, c, x);
    edge(&mut g, x, y);

    collapse::assign_ranks(&mut g, &[], &LayoutOptions::default()).unwrap();
    ranks::normalize_ranks(&mut g, RankView::Normal);

    assert_eq!(rank_of(&g, a), 0);
    assert_eq!(rank_of(&g, b), 1);
    assert_eq!(rank_of(&g, c), 2);
    assert_eq!(rank_of(&g, x), 3);
    assert_eq!(rank_of(&g, y), 4);
}

#[test]
fn nested_clusters_expand_recursively() {
    let mut g = LayoutGraph::new();
    let a = leaf(&mut g);
    let outer = cluster(&mut g);
    let inner = cluster(&mut g);
    let y = leaf(&mut g);
    let x = leaf(&mut g);
    g.set_parent(inner, outer);
    g.set_parent(y, outer);
    g.set_parent(x, inner);
    edge(&mut g, a, y);
    edge(&mut g, y, x);

    collapse::assign_ranks(&mut g, &[], &LayoutOptions::default()).unwrap();
    ranks::normalize_ranks(&mut g, RankView::Normal);

    assert_eq!(rank_of(&g, a), 0);
    assert_eq!(rank_of(&g, y), 1);
    assert_eq!(rank_of(&g, x), 2);
}

#[test]
fn empty_cluster_is_skipped() {
    let mut g = LayoutGraph::new();
    let a = leaf(&mut g);
    let b = leaf(&mut g);
    let _empty = cluster(&mut g);
    edge(&mut g, a, b);
    collapse::assign_ranks(&mut g, &[], &LayoutOptions::default()).unwrap();
    assert_eq!(rank_of(&g, a), 0);
    assert_eq!(rank_of(&g, b), 1);
}

#[test]
fn same_constraint_pins_members_to_one_rank() {
    let mut g = LayoutGraph::new();
    let a = leaf(&mut g);
    let b = leaf(&mut g);
    let c = leaf(&mut g);
    edge(&mut g, a, b);
    edge(&mut g, b, c);
    edge(&mut g, a, c);

    let sg = Subgraph {
        name: "tier".to_string(),
        nodes: vec![b, c],
        constraint: RankConstraint::Same,
    };
    collapse::assign_ranks(&mut g, &[sg], &LayoutOptions::default()).unwrap();
    ranks::normalize_ranks(&mut g, RankView::Normal);
    assert_eq!(rank_of(&g, b), rank_of(&g, c));
    assert!(rank_of(&g, b) > rank_of(&g, a));
}

#[test]
fn sink_constraint_pulls_a_source_below_everything() {
    let mut g = LayoutGraph::new();
    let a = leaf(&mut g);
    let b = leaf(&mut g);
    let c = leaf(&mut g);
    edge(&mut g, a, b);
    edge(&mut g, b, c);

    let sg = Subgraph {
        name: "last".to_string(),
        nodes: vec![a],
        constraint: RankConstraint::Sink,
    };
    collapse::assign_ranks(&mut g, &[sg], &LayoutOptions::default()).unwrap();
    ranks::normalize_ranks(&mut g, RankView::Normal);
    assert!(rank_of(&g, a) > rank_of(&g, b));
    assert!(rank_of(&g, a) > rank_of(&g, c));
}

#[test]
fn min_constraint_keeps_members_at_the_top() {
    let mut g = LayoutGraph::new();
    let a = leaf(&mut g);
    let b = leaf(&mut g);
    let c = leaf(&mut g);
    edge(&mut g, a, b);
    edge(&mut g, c, b);

    let sg = Subgraph {
        name: "first".to_string(),
        nodes: vec![c],
        constraint: RankConstraint::Min,
    };
    collapse::assign_ranks(&mut g, &[sg], &LayoutOptions::default()).unwrap();
    ranks::normalize_ranks(&mut g, RankView::Normal);
    assert_eq!(rank_of(&g, c), 0);
    for v in [a, b] {
        assert!(rank_of(&g, v) >= rank_of(&g, c));
    }
}

#[test]
fn opposite_constraints_sharing_nodes_are_rejected() {
    let mut g = LayoutGraph::new();
    let a = leaf(&mut g);
    let b = leaf(&mut g);
    edge(&mut g, a, b);

    let subgraphs = [
        Subgraph {
            name: "top".to_string(),
            nodes: vec![a],
            constraint: RankConstraint::Min,
        },
        Subgraph {
            name: "bottom".to_string(),
            nodes: vec![a],
            constraint: RankConstraint::Max,
        },
    ];
    let err = collapse::assign_ranks(&mut g, &subgraphs, &LayoutOptions::default());
    assert_eq!(
        err,
        Err(LayoutError::OppositeRankConstraint {
            first: "top".to_string(),
            second: "bottom".to_string(),
        })
    );
}

#[test]
fn subgraphs_merge_transitively_through_shared_nodes() {
    let mut g = LayoutGraph::new();
    let a = leaf(&mut g);
    let b = leaf(&mut g);
    let c = leaf(&mut g);
    let d = leaf(&mut g);
    edge(&mut g, d, a);
    edge(&mut g, d, c);

    let subgraphs = [
        Subgraph {
            name: "left".to_string(),
            nodes: vec![a, b],
            constraint: RankConstraint::Same,
        },
        Subgraph {
            name: "right".to_string(),
            nodes: vec![b, c],
            constraint: RankConstraint::Same,
        },
    ];
    collapse::assign_ranks(&mut g, &subgraphs, &LayoutOptions::default()).unwrap();
    ranks::normalize_ranks(&mut g, RankView::Normal);
    assert_eq!(rank_of(&g, a), rank_of(&g, b));
    assert_eq!(rank_of(&g, b), rank_of(&g, c));
}
