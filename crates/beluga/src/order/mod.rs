//! Crossing minimization.
//!
//! Orders every rank to reduce weighted edge crossings: two DFS-seeded
//! candidate orders, then bounded passes of weighted-median re-sorting and
//! adjacent transpositions. Per-pair crossing counts are cached so a
//! transposition adjusts the global count locally instead of recounting the
//! whole graph. The best layering seen is kept as a deep snapshot and
//! restored at the end.

pub mod cluster;
pub mod cross_count;

use crate::model::{LayoutGraph, LayoutOptions, NodeKind};
use crate::ranks::Ranks;
use beluga_digraph::NodeId;

pub fn run(g: &mut LayoutGraph, ranks: &mut Ranks, opts: &LayoutOptions) {
    if ranks.is_empty() {
        return;
    }
    let has_clusters = g
        .node_ids()
        .any(|v| g.node(v).kind == NodeKind::Cluster && g.has_children(v));
    if has_clusters {
        cluster::order_with_clusters(g, ranks, opts);
    } else {
        mincross(g, ranks, opts);
    }
    tracing::debug!(
        crossings = cross_count::total(g, &ranks.layering()),
        "ordering finished"
    );
}

/// Median/transpose loop over one flat graph. Mutates only the rank orders.
pub fn mincross(g: &mut LayoutGraph, ranks: &mut Ranks, opts: &LayoutOptions) {
    let forward = seed_layering(g, ranks, true);
    let backward = seed_layering(g, ranks, false);
    let forward_cc = cross_count::total(g, &forward);
    let backward_cc = cross_count::total(g, &backward);
    let seeded = if backward_cc < forward_cc {
        backward
    } else {
        forward
    };

    let mut state = MincrossState::new(g, seeded);
    let mut best = state.layering.clone();
    let mut best_cc = state.total;
    let mut trying = 0usize;

    let mut iteration = 0usize;
    while iteration < opts.max_order_iterations && best_cc > 0.0 && trying < opts.mc_limit {
        state.wmedian(g, iteration % 2 == 0);
        state.transpose(g, iteration % 4 >= 2);

        if state.total < opts.convergence * best_cc {
            trying = 0;
        } else {
            trying += 1;
        }
        if state.total < best_cc {
            best_cc = state.total;
            best.clone_from(&state.layering);
        }
        iteration += 1;
    }

    ranks.restore_layering(g, &best);
    enforce_flat_order(g, ranks);
}

/// Stable topological reorder of each rank along its flat edges, so a flat
/// tail always ends up left of its head. Cycle leftovers (possible only in
/// proxy graphs) keep their current order.
fn enforce_flat_order(g: &mut LayoutGraph, ranks: &mut Ranks) {
    for rank in ranks.rank_range() {
        let nodes: Vec<NodeId> = ranks.nodes(rank).to_vec();
        if nodes.len() < 2 {
            continue;
        }

        let mut indegree: rustc_hash::FxHashMap<NodeId, usize> =
            nodes.iter().map(|&v| (v, 0usize)).collect();
        let mut any_flat = false;
        for &v in &nodes {
            for &e in g.out_edges(v) {
                let w = g.head(e);
                if w != v && indegree.contains_key(&w) {
                    *indegree.get_mut(&w).expect("seeded above") += 1;
                    any_flat = true;
                }
            }
        }
        if !any_flat {
            continue;
        }

        let mut remaining = nodes.clone();
        let mut ordered: Vec<NodeId> = Vec::with_capacity(nodes.len());
        while !remaining.is_empty() {
            let pick = remaining
                .iter()
                .position(|&v| indegree[&v] == 0)
                // A flat cycle: fall back to the current leftmost node.
                .unwrap_or(0);
            let v = remaining.remove(pick);
            for &e in g.out_edges(v) {
                let w = g.head(e);
                if let Some(d) = indegree.get_mut(&w) {
                    *d = d.saturating_sub(1);
                }
            }
            indegree.remove(&v);
            ordered.push(v);
        }
        ranks.set_order(g, rank, ordered);
    }
}

struct MincrossState {
    layering: Vec<Vec<NodeId>>,
    /// Node index -> position within its layer.
    pos: Vec<usize>,
    /// Node index -> layer index (usize::MAX when unbucketed).
    layer_ix: Vec<usize>,
    /// Crossings between layer i and i+1.
    pair_cc: Vec<f64>,
    total: f64,
}

impl MincrossState {
    fn new(g: &LayoutGraph, layering: Vec<Vec<NodeId>>) -> Self {
        let mut state = Self {
            pair_cc: vec![0.0; layering.len().saturating_sub(1)],
            pos: vec![0; g.node_bound()],
            layer_ix: vec![usize::MAX; g.node_bound()],
            total: 0.0,
            layering,
        };
        for (li, layer) in state.layering.iter().enumerate() {
            for (j, &v) in layer.iter().enumerate() {
                state.pos[v.index()] = j;
                state.layer_ix[v.index()] = li;
            }
        }
        for li in 0..state.pair_cc.len() {
            state.pair_cc[li] =
                cross_count::two_layer(g, &state.layering[li], &state.layering[li + 1]);
        }
        state.total = state.pair_cc.iter().sum();
        state
    }

    /// Re-sorts each layer by the weighted median of its already-ordered
    /// neighbors. Nodes with no neighbors hold their position.
    fn wmedian(&mut self, g: &LayoutGraph, forward: bool) {
        let layer_count = self.layering.len();
        if forward {
            for li in 1..layer_count {
                self.wmedian_layer(g, li, true);
            }
        } else {
            for li in (0..layer_count.saturating_sub(1)).rev() {
                self.wmedian_layer(g, li, false);
            }
        }
    }

    fn wmedian_layer(&mut self, g: &LayoutGraph, li: usize, use_in_edges: bool) {
        let layer = &self.layering[li];
        let len = layer.len();
        if len < 2 {
            return;
        }

        let mut fixed: Vec<(usize, NodeId)> = Vec::new();
        let mut movable: Vec<(f64, usize, NodeId)> = Vec::new();
        for (j, &v) in layer.iter().enumerate() {
            let median = self.median_of_neighbors(g, v, li, use_in_edges);
            if median < 0.0 {
                fixed.push((j, v));
            } else {
                movable.push((median, j, v));
            }
        }
        if movable.is_empty() {
            return;
        }
        movable.sort_by(|a, b| a.0.total_cmp(&b.0).then(a.1.cmp(&b.1)));

        let mut new_layer: Vec<Option<NodeId>> = vec![None; len];
        for &(j, v) in &fixed {
            new_layer[j] = Some(v);
        }
        let mut next = movable.into_iter();
        for slot in new_layer.iter_mut() {
            if slot.is_none() {
                *slot = Some(next.next().expect("movable fills the free slots").2);
            }
        }
        let new_layer: Vec<NodeId> = new_layer
            .into_iter()
            .map(|slot| slot.expect("every slot filled"))
            .collect();

        for (j, &v) in new_layer.iter().enumerate() {
            self.pos[v.index()] = j;
        }
        self.layering[li] = new_layer;
        self.refresh_pair(g, li);
    }

    /// Recounts the pair caches touching layer `li` after a reorder.
    fn refresh_pair(&mut self, g: &LayoutGraph, li: usize) {
        if li > 0 {
            self.pair_cc[li - 1] =
                cross_count::two_layer(g, &self.layering[li - 1], &self.layering[li]);
        }
        if li + 1 < self.layering.len() {
            self.pair_cc[li] = cross_count::two_layer(g, &self.layering[li], &self.layering[li + 1]);
        }
        self.total = self.pair_cc.iter().sum();
    }

    fn median_of_neighbors(&self, g: &LayoutGraph, v: NodeId, li: usize, use_in_edges: bool) -> f64 {
        let mut positions: Vec<usize> = Vec::new();
        if use_in_edges {
            for &e in g.in_edges(v) {
                let u = g.tail(e);
                if self.layer_ix[u.index()] == li - 1 {
                    positions.push(self.pos[u.index()]);
                }
            }
        } else {
            for &e in g.out_edges(v) {
                let w = g.head(e);
                if self.layer_ix[w.index()] == li + 1 {
                    positions.push(self.pos[w.index()]);
                }
            }
        }
        positions.sort_unstable();
        median_value(&positions)
    }

    /// Greedy adjacent swaps. A swap happens when it strictly reduces the
    /// crossing count, or keeps it equal during the equal-swap iterations
    /// (deterministic tie-breaking to escape plateaus). Endpoint pairs of a
    /// flat edge never swap.
    fn transpose(&mut self, g: &LayoutGraph, allow_equal: bool) {
        loop {
            let mut improved = 0.0;
            for li in 0..self.layering.len() {
                if self.layering[li].len() < 2 {
                    continue;
                }
                for j in 0..self.layering[li].len() - 1 {
                    let v = self.layering[li][j];
                    let w = self.layering[li][j + 1];
                    if g.find_edge(v, w).is_some() || g.find_edge(w, v).is_some() {
                        continue;
                    }

                    let (c0_up, c0_down) = self.pair_crossings(g, v, w, li);
                    let (c1_up, c1_down) = self.pair_crossings(g, w, v, li);
                    let c0 = c0_up + c0_down;
                    let c1 = c1_up + c1_down;
                    if c1 < c0 || (allow_equal && c0 > 0.0 && c1 == c0) {
                        self.layering[li].swap(j, j + 1);
                        self.pos[v.index()] = j + 1;
                        self.pos[w.index()] = j;
                        if li > 0 {
                            self.pair_cc[li - 1] += c1_up - c0_up;
                        }
                        if li + 1 < self.layering.len() {
                            self.pair_cc[li] += c1_down - c0_down;
                        }
                        self.total += c1 - c0;
                        improved += c0 - c1;
                    }
                }
            }
            if improved <= 0.0 {
                break;
            }
        }
    }

    /// Crossings contributed by the adjacent pair `(left, right)` against
    /// the layers above and below.
    fn pair_crossings(&self, g: &LayoutGraph, left: NodeId, right: NodeId, li: usize) -> (f64, f64) {
        let mut up = 0.0;
        if li > 0 {
            let left_ins = self.adjacent_positions(g, left, li - 1, true);
            let right_ins = self.adjacent_positions(g, right, li - 1, true);
            for &(lp, lw) in &left_ins {
                for &(rp, rw) in &right_ins {
                    if lp > rp {
                        up += lw * rw;
                    }
                }
            }
        }
        let mut down = 0.0;
        if li + 1 < self.layering.len() {
            let left_outs = self.adjacent_positions(g, left, li + 1, false);
            let right_outs = self.adjacent_positions(g, right, li + 1, false);
            for &(lp, lw) in &left_outs {
                for &(rp, rw) in &right_outs {
                    if lp > rp {
                        down += lw * rw;
                    }
                }
            }
        }
        (up, down)
    }

    fn adjacent_positions(
        &self,
        g: &LayoutGraph,
        v: NodeId,
        target_layer: usize,
        use_in_edges: bool,
    ) -> Vec<(usize, f64)> {
        let edges = if use_in_edges {
            g.in_edges(v)
        } else {
            g.out_edges(v)
        };
        edges
            .iter()
            .filter_map(|&e| {
                let other = g.other_endpoint(e, v);
                if self.layer_ix[other.index()] == target_layer {
                    Some((self.pos[other.index()], g.edge(e).weight))
                } else {
                    None
                }
            })
            .collect()
    }
}

/// The weighted median position rule: odd counts take the middle, a pair
/// averages, larger even counts interpolate weighted by the gap sizes, and
/// no neighbors at all yields -1 (hold position).
fn median_value(positions: &[usize]) -> f64 {
    let len = positions.len();
    let m = len / 2;
    match len {
        0 => -1.0,
        _ if len % 2 == 1 => positions[m] as f64,
        2 => (positions[0] + positions[1]) as f64 / 2.0,
        _ => {
            let left = (positions[m - 1] - positions[0]) as f64;
            let right = (positions[len - 1] - positions[m]) as f64;
            if left + right == 0.0 {
                return positions[m] as f64;
            }
            (positions[m - 1] as f64 * right + positions[m] as f64 * left) / (left + right)
        }
    }
}


/// DFS-seeded initial order: nodes visited from the rank extreme outward,
/// appended to their layer on first visit.
fn seed_layering(g: &LayoutGraph, ranks: &Ranks, forward: bool) -> Vec<Vec<NodeId>> {
    let min_rank = ranks.min_rank();
    let layer_count = (ranks.max_rank() - min_rank + 1) as usize;
    let mut layers: Vec<Vec<NodeId>> = vec![Vec::new(); layer_count];
    let mut visited = vec![false; g.node_bound()];

    let mut seeds: Vec<NodeId> = Vec::new();
    if forward {
        for (_, bucket) in ranks.iter() {
            seeds.extend_from_slice(bucket.nodes());
        }
    } else {
        let layering = ranks.layering();
        for layer in layering.iter().rev() {
            seeds.extend_from_slice(layer);
        }
    }

    let mut stack: Vec<NodeId> = Vec::new();
    for seed in seeds {
        if visited[seed.index()] {
            continue;
        }
        stack.push(seed);
        while let Some(v) = stack.pop() {
            if visited[v.index()] {
                continue;
            }
            visited[v.index()] = true;
            let Some(rank) = g.node(v).rank else {
                continue;
            };
            layers[(rank - min_rank) as usize].push(v);

            // Reverse push keeps neighbor visit order stable under the
            // explicit stack.
            let neighbors: Vec<NodeId> = if forward {
                g.successors(v).collect()
            } else {
                g.predecessors(v).collect()
            };
            for &w in neighbors.iter().rev() {
                if !visited[w.index()] {
                    stack.push(w);
                }
            }
        }
    }
    layers
}
