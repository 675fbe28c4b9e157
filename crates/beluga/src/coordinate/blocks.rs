//! Alignment conflicts and block positioning shared by the coordinate
//! strategies.
//!
//! An "inner segment" is an edge between two algorithm-inserted nodes.
//! Type-1 conflicts mark non-inner segments crossing an inner one, type-2
//! conflicts mark two inner segments crossing each other; alignment never
//! follows a conflicted segment. Blocks (chains of vertically aligned
//! nodes) are positioned with the same network simplex as ranking, run over
//! a block-level constraint graph in the auxiliary rank view.

use super::sep;
use crate::model::{EdgeLabel, LayoutGraph, LayoutOptions, NodeLabel, RankView};
use crate::rank::{self, Balance};
use beluga_digraph::NodeId;
use rustc_hash::{FxHashMap, FxHashSet};

pub type Conflicts = FxHashSet<(NodeId, NodeId)>;

pub fn add_conflict(conflicts: &mut Conflicts, v: NodeId, w: NodeId) {
    let key = if v <= w { (v, w) } else { (w, v) };
    conflicts.insert(key);
}

pub fn has_conflict(conflicts: &Conflicts, v: NodeId, w: NodeId) -> bool {
    let key = if v <= w { (v, w) } else { (w, v) };
    conflicts.contains(&key)
}

fn pos_table(g: &LayoutGraph, layering: &[Vec<NodeId>]) -> Vec<usize> {
    let mut pos = vec![0usize; g.node_bound()];
    for layer in layering {
        for (j, &v) in layer.iter().enumerate() {
            pos[v.index()] = j;
        }
    }
    pos
}

/// The dummy predecessor of a dummy node, if any: the upper end of an inner
/// segment.
fn inner_segment_upper(g: &LayoutGraph, v: NodeId) -> Option<NodeId> {
    if !g.node(v).is_dummy() {
        return None;
    }
    g.predecessors(v).find(|&u| g.node(u).is_dummy())
}

/// Non-inner segments crossing an inner segment.
pub fn find_type1_conflicts(g: &LayoutGraph, layering: &[Vec<NodeId>]) -> Conflicts {
    let mut conflicts = Conflicts::default();
    let pos = pos_table(g, layering);

    for i in 1..layering.len() {
        let prev_layer = &layering[i - 1];
        let layer = &layering[i];
        let last = layer.last().copied();

        let mut k0: usize = 0;
        let mut scan_pos: usize = 0;
        for (idx, &v) in layer.iter().enumerate() {
            let upper = inner_segment_upper(g, v);
            let k1 = upper.map(|u| pos[u.index()]).unwrap_or(prev_layer.len());

            if upper.is_some() || last == Some(v) {
                for &scan_node in layer.iter().take(idx + 1).skip(scan_pos) {
                    let scan_dummy = g.node(scan_node).is_dummy();
                    let uppers: Vec<NodeId> = g.predecessors(scan_node).collect();
                    for u in uppers {
                        let u_pos = pos[u.index()];
                        let u_dummy = g.node(u).is_dummy();
                        if (u_pos < k0 || k1 < u_pos) && !(u_dummy && scan_dummy) {
                            add_conflict(&mut conflicts, u, scan_node);
                        }
                    }
                }
                scan_pos = idx + 1;
                k0 = k1;
            }
        }
    }
    conflicts
}

/// Pairs of inner segments crossing each other; one of each pair must not
/// be followed during alignment.
pub fn find_type2_conflicts(g: &LayoutGraph, layering: &[Vec<NodeId>]) -> Conflicts {
    let mut conflicts = Conflicts::default();
    let pos = pos_table(g, layering);

    for layer in layering.iter().skip(1) {
        let inner: Vec<(NodeId, NodeId)> = layer
            .iter()
            .filter_map(|&v| inner_segment_upper(g, v).map(|u| (u, v)))
            .collect();
        for (a, &(ua, va)) in inner.iter().enumerate() {
            for &(ub, vb) in inner.iter().skip(a + 1) {
                // `va` precedes `vb` in the layer; the segments cross when
                // the upper ends are ordered the other way.
                if pos[ua.index()] > pos[ub.index()] {
                    add_conflict(&mut conflicts, ua, va);
                    add_conflict(&mut conflicts, ub, vb);
                }
            }
        }
    }
    conflicts
}

/// Median-based vertical alignment: each node tries to align with one of
/// its two median upper neighbors, left to right, never crossing a
/// conflicted segment or going back over an already-claimed position.
/// Returns the block root of every node.
pub fn vertical_alignment(
    g: &LayoutGraph,
    layering: &[Vec<NodeId>],
    conflicts: &Conflicts,
) -> Vec<NodeId> {
    let pos = pos_table(g, layering);
    let mut root: Vec<NodeId> = (0..g.node_bound())
        .map(|ix| NodeId::from_index(ix))
        .collect();
    let mut align: Vec<NodeId> = root.clone();

    for layer in layering {
        let mut prev_idx: isize = -1;
        for &v in layer {
            let mut uppers: Vec<NodeId> = g.predecessors(v).collect();
            if uppers.is_empty() {
                continue;
            }
            uppers.sort_by_key(|u| pos[u.index()]);

            let mp = (uppers.len() - 1) as f64 / 2.0;
            let lo = mp.floor() as usize;
            let hi = mp.ceil() as usize;
            for &u in uppers.iter().take(hi + 1).skip(lo) {
                let u_pos = pos[u.index()] as isize;
                if align[v.index()] == v && prev_idx < u_pos && !has_conflict(conflicts, u, v) {
                    align[u.index()] = v;
                    root[v.index()] = root[u.index()];
                    align[v.index()] = root[u.index()];
                    prev_idx = u_pos;
                }
            }
        }
    }
    root
}

/// Greedy chain alignment for the fast strategy: a node joins the first
/// unclaimed, unconflicted upper neighbor's block.
pub fn greedy_alignment(
    g: &LayoutGraph,
    layering: &[Vec<NodeId>],
    conflicts: &Conflicts,
) -> Vec<NodeId> {
    let pos = pos_table(g, layering);
    let mut root: Vec<NodeId> = (0..g.node_bound())
        .map(|ix| NodeId::from_index(ix))
        .collect();
    let mut claimed: Vec<bool> = vec![false; g.node_bound()];

    for layer in layering {
        let mut prev_idx: isize = -1;
        for &v in layer {
            let mut uppers: Vec<NodeId> = g.predecessors(v).collect();
            uppers.sort_by_key(|u| pos[u.index()]);
            for u in uppers {
                let u_pos = pos[u.index()] as isize;
                if claimed[u.index()] || u_pos <= prev_idx || has_conflict(conflicts, u, v) {
                    continue;
                }
                claimed[u.index()] = true;
                root[v.index()] = root[u.index()];
                prev_idx = u_pos;
                break;
            }
        }
    }
    root
}

/// Positions blocks with network simplex over the block constraint graph:
/// one node per block, one separation edge per horizontally adjacent pair
/// (cluster margins included through `sep`). Returns the cross-axis
/// coordinate per node.
pub fn position_blocks(
    g: &LayoutGraph,
    opts: &LayoutOptions,
    layering: &[Vec<NodeId>],
    root: &[NodeId],
) -> Vec<f64> {
    let mut bg: LayoutGraph = LayoutGraph::new();
    let mut block_node: FxHashMap<NodeId, NodeId> = FxHashMap::default();
    for layer in layering {
        for &v in layer {
            let r = root[v.index()];
            block_node
                .entry(r)
                .or_insert_with(|| bg.add_node(NodeLabel::default()));
        }
    }

    let mut constraint: FxHashMap<(NodeId, NodeId), i32> = FxHashMap::default();
    for layer in layering {
        for pair in layer.windows(2) {
            let (u, v) = (pair[0], pair[1]);
            let ru = block_node[&root[u.index()]];
            let rv = block_node[&root[v.index()]];
            if ru == rv {
                continue;
            }
            let min_sep = sep(g, opts, u, v).ceil() as i32;
            let entry = constraint.entry((ru, rv)).or_insert(0);
            *entry = (*entry).max(min_sep);
        }
    }
    let mut constraints: Vec<((NodeId, NodeId), i32)> = constraint.into_iter().collect();
    constraints.sort_by_key(|&((u, v), _)| (u, v));
    for ((bu, bv), minlen) in constraints {
        bg.add_edge(
            bu,
            bv,
            EdgeLabel {
                weight: 1.0,
                minlen,
                ..Default::default()
            },
        );
    }

    rank::assign(&mut bg, RankView::Aux, opts.ns_limit_x, Balance::LeftRight);

    let mut xs = vec![0.0f64; g.node_bound()];
    for layer in layering {
        for &v in layer {
            let bv = block_node[&root[v.index()]];
            xs[v.index()] = bg.node(bv).aux_rank.unwrap_or(0) as f64;
        }
    }
    xs
}
