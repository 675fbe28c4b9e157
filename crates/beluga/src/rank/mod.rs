//! Rank assignment.
//!
//! Assigns every node an integer rank minimizing `sum(weight * slack)`
//! subject to `slack >= minlen` on every edge, via the network simplex
//! method over a feasible spanning tree. The optimality loop is bounded by
//! an iteration cap; hitting the cap keeps the current feasible ranking.

pub mod feasible_tree;
pub mod simplex;

use crate::model::{LayoutGraph, RankView};
use beluga_digraph::{EdgeId, NodeId};

pub use simplex::{Balance, SimplexState};

/// Actual rank separation of `e` minus its required minimum. Non-negative
/// once the ranking is feasible; zero means the edge is tight.
pub fn slack(g: &LayoutGraph, view: RankView, e: EdgeId) -> i32 {
    let (tail, head) = g.endpoints(e);
    let tail_rank = g.node(tail).rank_in(view).unwrap_or(0);
    let head_rank = g.node(head).rank_in(view).unwrap_or(0);
    head_rank - tail_rank - g.edge(e).minlen
}

/// Longest-path initialization: a feasible (usually far from optimal)
/// ranking where every sink sits at rank zero and each node is pushed as
/// high as its out-edges allow.
pub fn init_rank(g: &mut LayoutGraph, view: RankView) {
    #[derive(Clone, Copy)]
    struct Frame {
        v: NodeId,
        next_out: usize,
    }

    let bound = g.node_bound();
    let mut computed: Vec<Option<i32>> = vec![None; bound];
    let mut on_stack = vec![false; bound];
    let mut stack: Vec<Frame> = Vec::new();

    let ids: Vec<NodeId> = g.node_ids().collect();
    for &root in &ids {
        if computed[root.index()].is_some() {
            continue;
        }
        on_stack[root.index()] = true;
        stack.push(Frame { v: root, next_out: 0 });

        while let Some(frame) = stack.last_mut() {
            let v = frame.v;
            let out = g.out_edges(v);
            if frame.next_out < out.len() {
                let e = out[frame.next_out];
                frame.next_out += 1;
                let w = g.head(e);
                // The graph is acyclic by the time ranking runs; the stack
                // check keeps a malformed input from hanging the DFS.
                if computed[w.index()].is_none() && !on_stack[w.index()] {
                    on_stack[w.index()] = true;
                    stack.push(Frame { v: w, next_out: 0 });
                }
                continue;
            }

            let mut rank: Option<i32> = None;
            for &e in g.out_edges(v) {
                let w = g.head(e);
                let Some(w_rank) = computed[w.index()] else {
                    continue;
                };
                let candidate = w_rank - g.edge(e).minlen;
                rank = Some(match rank {
                    Some(current) => current.min(candidate),
                    None => candidate,
                });
            }
            let rank = rank.unwrap_or(0);
            computed[v.index()] = Some(rank);
            g.node_mut(v).set_rank_in(view, rank);
            on_stack[v.index()] = false;
            stack.pop();
        }
    }
}

/// Full ranking: init, feasible tree, simplex optimality loop, balancing.
pub fn assign(g: &mut LayoutGraph, view: RankView, limit: usize, balance: Balance) {
    simplex::network_simplex(g, view, limit, balance);
}
