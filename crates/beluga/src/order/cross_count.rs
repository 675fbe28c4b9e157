//! Weighted crossing counts between adjacent ranks.
//!
//! The two-layer count uses an accumulator tree over south positions, so a
//! full pair count is O(E log V) instead of the O(E^2) pairwise scan. The
//! pairwise scan survives in the test suite as the oracle.

use crate::model::LayoutGraph;
use beluga_digraph::NodeId;
use rustc_hash::FxHashMap;

/// Weighted crossings between one ordered layer and the next.
pub fn two_layer(g: &LayoutGraph, north: &[NodeId], south: &[NodeId]) -> f64 {
    if south.is_empty() || north.is_empty() {
        return 0.0;
    }

    let mut south_pos: FxHashMap<NodeId, usize> = FxHashMap::default();
    for (i, &v) in south.iter().enumerate() {
        south_pos.insert(v, i);
    }

    struct SouthEntry {
        pos: usize,
        weight: f64,
    }

    let mut south_entries: Vec<SouthEntry> = Vec::new();
    for &v in north {
        let mut entries: Vec<SouthEntry> = g
            .out_edges(v)
            .iter()
            .filter_map(|&e| {
                let pos = *south_pos.get(&g.head(e))?;
                Some(SouthEntry {
                    pos,
                    weight: g.edge(e).weight,
                })
            })
            .collect();
        entries.sort_by_key(|entry| entry.pos);
        south_entries.extend(entries);
    }

    // Accumulator tree: leaves are south positions, inner nodes hold the
    // weight sum of their subtree.
    let mut first_index: usize = 1;
    while first_index < south.len() {
        first_index <<= 1;
    }
    let tree_size = 2 * first_index - 1;
    first_index -= 1;
    let mut tree: Vec<f64> = vec![0.0; tree_size];

    let mut cc: f64 = 0.0;
    for entry in south_entries {
        let mut index = entry.pos + first_index;
        tree[index] += entry.weight;
        let mut weight_sum: f64 = 0.0;
        while index > 0 {
            if index % 2 == 1 {
                weight_sum += tree[index + 1];
            }
            index = (index - 1) >> 1;
            tree[index] += entry.weight;
        }
        cc += entry.weight * weight_sum;
    }
    cc
}

/// Total weighted crossings of a layering.
pub fn total(g: &LayoutGraph, layering: &[Vec<NodeId>]) -> f64 {
    let mut cc = 0.0;
    for window in layering.windows(2) {
        cc += two_layer(g, &window[0], &window[1]);
    }
    cc
}
