//! Classic coordinate assignment: auxiliary-graph network simplex.
//!
//! Every adjacent-rank edge becomes an auxiliary node pulled toward both
//! endpoints with an omega-scaled weight, and every in-rank neighbor pair
//! becomes a minimum-separation edge. Running the ranking simplex over this
//! graph in the auxiliary view yields globally optimal positions; slack in
//! zero-cut-value subtrees is re-centered by the left/right balancing pass.

use super::{omega, sep};
use crate::model::{EdgeLabel, LayoutGraph, LayoutOptions, NodeLabel, RankView};
use crate::rank::{self, Balance};
use crate::ranks::Ranks;
use beluga_digraph::NodeId;

pub fn run(g: &mut LayoutGraph, ranks: &Ranks, opts: &LayoutOptions) {
    let mut aux: LayoutGraph = LayoutGraph::new();
    let mut rep: Vec<Option<NodeId>> = vec![None; g.node_bound()];

    for (_, bucket) in ranks.iter() {
        for &v in bucket.nodes() {
            rep[v.index()] = Some(aux.add_node(NodeLabel::default()));
        }
    }

    // In-rank separation edges keep the order fixed and spaced.
    for (_, bucket) in ranks.iter() {
        for pair in bucket.nodes().windows(2) {
            let (left, right) = (pair[0], pair[1]);
            let minlen = sep(g, opts, left, right).ceil() as i32;
            aux.add_edge(
                rep[left.index()].expect("bucketed node has a representative"),
                rep[right.index()].expect("bucketed node has a representative"),
                EdgeLabel {
                    weight: 0.0,
                    minlen,
                    ..Default::default()
                },
            );
        }
    }

    // One auxiliary node per adjacent-rank edge, tied to both endpoints.
    for e in g.edge_ids() {
        let (tail, head) = g.endpoints(e);
        let (Some(tail_rank), Some(head_rank)) = (g.node(tail).rank, g.node(head).rank) else {
            continue;
        };
        if (head_rank - tail_rank).abs() != 1 {
            continue;
        }
        let (Some(rt), Some(rh)) = (rep[tail.index()], rep[head.index()]) else {
            continue;
        };
        let weight = omega(g, e) * g.edge(e).weight;
        let pull = aux.add_node(NodeLabel::default());
        aux.add_edge(
            pull,
            rt,
            EdgeLabel {
                weight,
                minlen: 0,
                ..Default::default()
            },
        );
        aux.add_edge(
            pull,
            rh,
            EdgeLabel {
                weight,
                minlen: 0,
                ..Default::default()
            },
        );
    }

    rank::assign(&mut aux, RankView::Aux, opts.ns_limit_x, Balance::LeftRight);

    for (_, bucket) in ranks.iter() {
        let nodes: Vec<NodeId> = bucket.nodes().to_vec();
        for v in nodes {
            let image = rep[v.index()].expect("bucketed node has a representative");
            let x = aux.node(image).aux_rank.unwrap_or(0);
            let label = g.node_mut(v);
            label.aux_rank = Some(x);
            label.x = Some(x as f64);
        }
    }
}
