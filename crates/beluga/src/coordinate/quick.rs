//! Fast block-based coordinates.
//!
//! Blocks come from a greedy conflict-aware DFS rather than the median
//! alignment, the block constraint graph is solved with network simplex,
//! and a fixed down/up pair of median refinement passes pulls each node
//! toward its neighbors under the spacing constraints.

use super::blocks::{self, Conflicts};
use super::sep;
use crate::model::{LayoutGraph, LayoutOptions};
use crate::ranks::Ranks;
use beluga_digraph::NodeId;

pub fn run(g: &mut LayoutGraph, ranks: &Ranks, opts: &LayoutOptions) {
    let layering = ranks.layering();

    let mut conflicts: Conflicts = blocks::find_type1_conflicts(g, &layering);
    for (v, w) in blocks::find_type2_conflicts(g, &layering) {
        blocks::add_conflict(&mut conflicts, v, w);
    }

    let root = blocks::greedy_alignment(g, &layering, &conflicts);
    let mut xs = blocks::position_blocks(g, opts, &layering, &root);

    refine_down(g, opts, &layering, &mut xs);
    refine_up(g, opts, &layering, &mut xs);

    for layer in &layering {
        for &v in layer {
            g.node_mut(v).x = Some(xs[v.index()]);
        }
    }
}

/// Top-down pass: each node moves toward the median of its predecessors.
fn refine_down(g: &LayoutGraph, opts: &LayoutOptions, layering: &[Vec<NodeId>], xs: &mut [f64]) {
    for li in 1..layering.len() {
        refine_layer(g, opts, &layering[li], xs, true);
    }
}

/// Bottom-up pass: toward the median of successors.
fn refine_up(g: &LayoutGraph, opts: &LayoutOptions, layering: &[Vec<NodeId>], xs: &mut [f64]) {
    for li in (0..layering.len().saturating_sub(1)).rev() {
        refine_layer(g, opts, &layering[li], xs, false);
    }
}

/// Walks the layer left to right, clamping each desired position against
/// the separation from the already-placed left neighbor. A node pushed
/// right drags the rest of the layer through their own clamps.
fn refine_layer(
    g: &LayoutGraph,
    opts: &LayoutOptions,
    layer: &[NodeId],
    xs: &mut [f64],
    use_predecessors: bool,
) {
    for j in 0..layer.len() {
        let v = layer[j];
        let desired = neighbor_median(g, v, xs, use_predecessors).unwrap_or(xs[v.index()]);
        let lower = if j > 0 {
            let left = layer[j - 1];
            xs[left.index()] + sep(g, opts, left, v)
        } else {
            f64::NEG_INFINITY
        };
        xs[v.index()] = desired.max(lower);
    }
}

fn neighbor_median(g: &LayoutGraph, v: NodeId, xs: &[f64], use_predecessors: bool) -> Option<f64> {
    // Flat neighbors sit in the same rank and are mid-move; only the
    // adjacent rank pulls.
    let v_rank = g.node(v).rank;
    let mut positions: Vec<f64> = if use_predecessors {
        g.predecessors(v)
            .filter(|&u| g.node(u).rank != v_rank)
            .map(|u| xs[u.index()])
            .collect()
    } else {
        g.successors(v)
            .filter(|&w| g.node(w).rank != v_rank)
            .map(|w| xs[w.index()])
            .collect()
    };
    if positions.is_empty() {
        return None;
    }
    positions.sort_by(|a, b| a.total_cmp(b));
    let m = positions.len() / 2;
    if positions.len() % 2 == 1 {
        Some(positions[m])
    } else {
        Some((positions[m - 1] + positions[m]) / 2.0)
    }
}
