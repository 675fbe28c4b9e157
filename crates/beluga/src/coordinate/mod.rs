//! Coordinate assignment.
//!
//! Turns the fixed rank/order into final coordinates. The rank axis is a
//! simple cumulative walk over bucket heights; the cross axis comes from
//! one of three interchangeable strategies. Every strategy ends with a
//! shift making the minimum cross-axis coordinate zero.

pub mod aux_simplex;
pub mod bk;
pub mod blocks;
pub mod quick;

use crate::model::{CoordinateStrategy, LayoutGraph, LayoutOptions};
use crate::ranks::Ranks;
use beluga_digraph::NodeId;

pub fn assign(g: &mut LayoutGraph, ranks: &Ranks, opts: &LayoutOptions) {
    if ranks.is_empty() {
        return;
    }
    match opts.coordinate {
        CoordinateStrategy::AuxSimplex => aux_simplex::run(g, ranks, opts),
        CoordinateStrategy::Quick => quick::run(g, ranks, opts),
        CoordinateStrategy::BrandesKoepf => bk::run(g, ranks, opts),
    }
    assign_rank_axis(g, ranks);
    shift_positive(g, ranks);
    tracing::debug!(strategy = ?opts.coordinate, "coordinates assigned");
}

/// Minimum cross-axis separation between `v` and `w` when `v` sits
/// immediately left of `w` in a rank: half widths, node or edge separation
/// per side, and the cluster margin when a cluster border runs between
/// them.
pub(crate) fn sep(g: &LayoutGraph, opts: &LayoutOptions, v: NodeId, w: NodeId) -> f64 {
    let v_label = g.node(v);
    let w_label = g.node(w);
    let mut sum = v_label.width / 2.0 + w_label.width / 2.0;
    sum += if v_label.is_dummy() {
        opts.edgesep
    } else {
        opts.nodesep
    } / 2.0;
    sum += if w_label.is_dummy() {
        opts.edgesep
    } else {
        opts.nodesep
    } / 2.0;
    if g.parent(v) != g.parent(w) {
        sum += opts.cluster_margin;
    }
    sum
}

/// Edge-straightening priority: real-to-real edges dominate, chains of
/// virtual nodes bend first.
pub(crate) fn omega(g: &LayoutGraph, e: beluga_digraph::EdgeId) -> f64 {
    let (tail, head) = g.endpoints(e);
    match (g.node(tail).is_dummy(), g.node(head).is_dummy()) {
        (false, false) => 8.0,
        (true, true) => 1.0,
        _ => 2.0,
    }
}

fn assign_rank_axis(g: &mut LayoutGraph, ranks: &Ranks) {
    let mut cursor = 0.0f64;
    let buckets: Vec<(f64, Vec<NodeId>)> = ranks
        .iter()
        .map(|(_, bucket)| (bucket.ranksep, bucket.nodes().to_vec()))
        .collect();
    for (ranksep, nodes) in buckets {
        let mut max_height = 0.0f64;
        for &v in &nodes {
            max_height = max_height.max(g.node(v).height);
        }
        for &v in &nodes {
            g.node_mut(v).y = Some(cursor + max_height / 2.0);
        }
        cursor += max_height + ranksep;
    }
}

fn shift_positive(g: &mut LayoutGraph, ranks: &Ranks) {
    let mut min_x = f64::INFINITY;
    for (_, bucket) in ranks.iter() {
        for &v in bucket.nodes() {
            if let Some(x) = g.node(v).x {
                min_x = min_x.min(x - g.node(v).width / 2.0);
            }
        }
    }
    if !min_x.is_finite() || min_x == 0.0 {
        return;
    }
    let nodes: Vec<NodeId> = ranks
        .iter()
        .flat_map(|(_, bucket)| bucket.nodes().to_vec())
        .collect();
    for v in nodes {
        if let Some(x) = g.node(v).x {
            g.node_mut(v).x = Some(x - min_x);
        }
    }
}
