use beluga::model::{
    EdgeLabel, LabelSize, LayoutGraph, LayoutOptions, NodeKind, NodeLabel, RankView,
};
use beluga::order::cross_count;
use beluga::rank::slack;
use beluga::{LayoutError, layout};
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

#[test]
fn empty_graph_is_rejected() {
    let g = LayoutGraph::new();
    let err = layout(g, &[], &LayoutOptions::default());
    assert!(matches!(err, Err(LayoutError::GraphEmpty)));
}

#[test]
fn a_simple_chain_lays_out_one_node_per_rank() {
    let mut g = LayoutGraph::new();
    let ids: Vec<NodeId> = (0..4).map(|_| leaf(&mut g)).collect();
    edge(&mut g, ids[0], ids[1]);
    edge(&mut g, ids[1], ids[2]);
    edge(&mut g, ids[2], ids[3]);

    let result = layout(g, &[], &LayoutOptions::default()).unwrap();
    for (i, &v) in ids.iter().enumerate() {
        assert_eq!(result.graph.node(v).rank, Some(i as i32));
        assert_eq!(result.graph.node(v).order, Some(0));
        assert!(result.graph.node(v).x.is_some());
    }
    assert_eq!(cross_count::total(&result.graph, &result.ranks.layering()), 0.0);
}

#[test]
fn self_loops_become_node_annotations() {
    let mut g = LayoutGraph::new();
    let a = leaf(&mut g);
    let b = leaf(&mut g);
    let lp = g.add_edge(a, a, EdgeLabel::default());
    edge(&mut g, a, b);

    let result = layout(g, &[], &LayoutOptions::default()).unwrap();
    let annotations = &result.graph.node(a).self_loops;
    assert_eq!(annotations.len(), 1);
    assert_eq!(annotations[0].edge, lp);
    assert!(!result.graph.contains_edge(lp));
    // No rank bucket carries the loop's endpoints twice.
    for (_, bucket) in result.ranks.iter() {
        let hits = bucket.nodes().iter().filter(|&&v| v == a).count();
        assert!(hits <= 1);
    }
}

#[test]
fn cycles_are_legalized_and_restored() {
    let mut g = LayoutGraph::new();
    let a = leaf(&mut g);
    let b = leaf(&mut g);
    let c = leaf(&mut g);
    let ab = g.add_edge(a, b, EdgeLabel::default());
    let bc = g.add_edge(b, c, EdgeLabel::default());
    let ca = g.add_edge(c, a, EdgeLabel::default());

    let result = layout(g, &[], &LayoutOptions::default()).unwrap();
    let g = &result.graph;

    // Surviving edges keep their original directions.
    assert_eq!(g.endpoints(ab), (a, b));
    assert_eq!(g.endpoints(bc), (b, c));

    // The back edge spent the layout reversed and spanning two ranks, so it
    // comes back as a chain reported in its original orientation.
    let chain = result.chains.iter().find(|ch| ch.edge == ca).unwrap();
    assert_eq!(chain.tail, c);
    assert_eq!(chain.head, a);
    assert!(!chain.label.reversed);

    // Ranks are a legal layering of the graph with the back edge flipped.
    assert!(g.node(b).rank > g.node(a).rank);
    assert!(g.node(c).rank > g.node(b).rank);
}

#[test]
fn long_edges_leave_routable_chains() {
    let mut g = LayoutGraph::new();
    let ids: Vec<NodeId> = (0..4).map(|_| leaf(&mut g)).collect();
    edge(&mut g, ids[0], ids[1]);
    edge(&mut g, ids[1], ids[2]);
    edge(&mut g, ids[2], ids[3]);
    let long = g.add_edge(
        ids[0],
        ids[3],
        EdgeLabel {
            label_size: Some(LabelSize {
                width: 30.0,
                height: 10.0,
            }),
            ..Default::default()
        },
    );

    let result = layout(g, &[], &LayoutOptions::default()).unwrap();
    let chain = result
        .chains
        .iter()
        .find(|c| c.edge == long)
        .expect("the long edge leaves a chain");
    assert_eq!(chain.tail, ids[0]);
    assert_eq!(chain.head, ids[3]);
    assert!(!chain.nodes.is_empty());

    // Chain nodes walk consecutive ranks and carry coordinates plus the
    // owning edge for the router.
    let tail_rank = result.graph.node(ids[0]).rank.unwrap();
    for (i, &v) in chain.nodes.iter().enumerate() {
        let label = result.graph.node(v);
        assert_eq!(label.rank, Some(tail_rank + 1 + i as i32));
        assert_eq!(label.edge, Some(long));
        assert!(label.x.is_some());
    }
    let has_label_node = chain
        .nodes
        .iter()
        .any(|&v| result.graph.node(v).kind == NodeKind::EdgeLabel);
    assert!(has_label_node);
}

#[test]
fn reversed_edges_report_chains_in_original_orientation() {
    let mut g = LayoutGraph::new();
    let a = leaf(&mut g);
    let b = leaf(&mut g);
    let c = leaf(&mut g);
    let d = leaf(&mut g);
    // a -> b -> c -> d plus a back edge d -> a spanning three ranks once
    // reversed.
    edge(&mut g, a, b);
    edge(&mut g, b, c);
    edge(&mut g, c, d);
    let back = g.add_edge(d, a, EdgeLabel::default());

    let result = layout(g, &[], &LayoutOptions::default()).unwrap();
    let chain = result.chains.iter().find(|ch| ch.edge == back).unwrap();
    assert_eq!(chain.tail, d);
    assert_eq!(chain.head, a);
    assert!(!chain.label.reversed);
    // Nodes run from d's side toward a's side.
    let first = result.graph.node(*chain.nodes.first().unwrap()).rank.unwrap();
    let last = result.graph.node(*chain.nodes.last().unwrap()).rank.unwrap();
    assert!(first >= last);
}

#[test]
fn every_rank_is_a_dense_permutation_after_layout() {
    let mut g = LayoutGraph::new();
    let ids: Vec<NodeId> = (0..8).map(|_| leaf(&mut g)).collect();
    edge(&mut g, ids[0], ids[2]);
    edge(&mut g, ids[0], ids[3]);
    edge(&mut g, ids[1], ids[3]);
    edge(&mut g, ids[2], ids[4]);
    edge(&mut g, ids[3], ids[5]);
    edge(&mut g, ids[3], ids[6]);
    edge(&mut g, ids[4], ids[7]);
    edge(&mut g, ids[5], ids[7]);

    let result = layout(g, &[], &LayoutOptions::default()).unwrap();
    for (_, bucket) in result.ranks.iter() {
        let mut orders: Vec<usize> = bucket
            .nodes()
            .iter()
            .map(|&v| result.graph.node(v).order.unwrap())
            .collect();
        orders.sort_unstable();
        assert_eq!(orders, (0..bucket.len()).collect::<Vec<_>>());
    }
}

#[test]
fn surviving_edges_stay_feasible() {
    let mut g = LayoutGraph::new();
    let ids: Vec<NodeId> = (0..6).map(|_| leaf(&mut g)).collect();
    edge(&mut g, ids[0], ids[1]);
    edge(&mut g, ids[0], ids[2]);
    edge(&mut g, ids[1], ids[3]);
    edge(&mut g, ids[2], ids[4]);
    edge(&mut g, ids[3], ids[5]);
    edge(&mut g, ids[4], ids[5]);

    let result = layout(g, &[], &LayoutOptions::default()).unwrap();
    for e in result.graph.edge_ids() {
        assert!(slack(&result.graph, RankView::Normal, e) >= 0);
    }
}

#[test]
fn two_clusters_never_interleave_within_a_rank() {
    let mut g = LayoutGraph::new();
    let s = leaf(&mut g);
    let k1 = cluster(&mut g);
    let k2 = cluster(&mut g);
    let members = |g: &mut LayoutGraph, k: NodeId| -> Vec<NodeId> {
        let top1 = leaf(g);
        let top2 = leaf(g);
        let bottom1 = leaf(g);
        let bottom2 = leaf(g);
        for v in [top1, top2, bottom1, bottom2] {
            g.set_parent(v, k);
        }
        edge(g, top1, bottom1);
        edge(g, top1, bottom2);
        edge(g, top2, bottom2);
        vec![top1, top2, bottom1, bottom2]
    };
    let m1 = members(&mut g, k1);
    let m2 = members(&mut g, k2);
    edge(&mut g, s, m1[0]);
    edge(&mut g, s, m2[0]);

    let result = layout(g, &[], &LayoutOptions::default()).unwrap();
    for (_, bucket) in result.ranks.iter() {
        let owners: Vec<Option<NodeId>> = bucket
            .nodes()
            .iter()
            .map(|&v| result.graph.parent(v))
            .collect();
        for k in [k1, k2] {
            let positions: Vec<usize> = owners
                .iter()
                .enumerate()
                .filter(|(_, owner)| **owner == Some(k))
                .map(|(i, _)| i)
                .collect();
            if let (Some(&first), Some(&last)) = (positions.first(), positions.last()) {
                assert_eq!(
                    last - first + 1,
                    positions.len(),
                    "cluster members must stay contiguous"
                );
            }
        }
    }
}

#[test]
fn parallel_edges_collapse_to_one_weighted_representative() {
    let mut g = LayoutGraph::new();
    let a = leaf(&mut g);
    let b = leaf(&mut g);
    let first = g.add_edge(a, b, EdgeLabel::default());
    g.add_edge(a, b, EdgeLabel::default());
    g.add_edge(a, b, EdgeLabel::default());

    let result = layout(g, &[], &LayoutOptions::default()).unwrap();
    let live: Vec<_> = result.graph.edge_ids().collect();
    assert_eq!(live, vec![first]);
    assert_eq!(result.graph.edge(first).merged, 3);
    assert_eq!(result.graph.edge(first).weight, 3.0);
}
