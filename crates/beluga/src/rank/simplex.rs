//! Network simplex over a feasible spanning tree.
//!
//! The spanning tree is numbered with DFS `low`/`lim` intervals so subtree
//! membership is an O(1) range test. Cut values are kept per tree edge,
//! derived bottom-up in O(degree) per edge, and patched incrementally after
//! an exchange along the two paths to the swapped edges' lowest common
//! ancestor. An independent half-tree recomputation exists for consistency
//! checks; it always walks the smaller of the two components.

use super::feasible_tree::{self, Tree};
use super::{init_rank, slack};
use crate::model::{LayoutGraph, RankView};
use beluga_digraph::{EdgeId, NodeId};

/// Post-optimality rank balancing mode.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Balance {
    None,
    /// Spread nodes with slack across under-populated ranks (layer mode).
    TopBottom,
    /// Re-center components hanging off zero-cut-value tree edges
    /// (coordinate mode).
    LeftRight,
}

#[derive(Debug, Clone)]
pub struct SimplexState {
    parent: Vec<Option<NodeId>>,
    parent_edge: Vec<Option<EdgeId>>,
    low: Vec<i32>,
    lim: Vec<i32>,
    /// Cut value per tree edge, signed by the edge's graph direction.
    cut: Vec<f64>,
    node_by_lim: Vec<Option<NodeId>>,
    roots: Vec<NodeId>,
}

impl SimplexState {
    pub fn new(g: &LayoutGraph) -> Self {
        Self {
            parent: vec![None; g.node_bound()],
            parent_edge: vec![None; g.node_bound()],
            low: vec![0; g.node_bound()],
            lim: vec![0; g.node_bound()],
            cut: vec![0.0; g.edge_bound()],
            node_by_lim: Vec::new(),
            roots: Vec::new(),
        }
    }

    pub fn parent_edge(&self, v: NodeId) -> Option<EdgeId> {
        self.parent_edge[v.index()]
    }

    pub fn cut_value(&self, e: EdgeId) -> f64 {
        self.cut[e.index()]
    }

    pub fn low_lim(&self, v: NodeId) -> (i32, i32) {
        (self.low[v.index()], self.lim[v.index()])
    }

    /// Whether `v` lies in the subtree hanging below `root`'s parent edge.
    fn in_subtree(&self, v: NodeId, root: NodeId) -> bool {
        self.low[root.index()] <= self.lim[v.index()]
            && self.lim[v.index()] <= self.lim[root.index()]
    }

    /// Renumbers the whole forest: parent pointers, low/lim intervals, and
    /// the lim-indexed node table.
    pub fn renumber(&mut self, g: &LayoutGraph, tree: &Tree) {
        self.parent.fill(None);
        self.parent_edge.fill(None);
        self.low.fill(0);
        self.lim.fill(0);
        self.node_by_lim = vec![None; tree.node_count() + 1];
        self.roots.clear();

        let mut next_low = 1;
        let ids: Vec<NodeId> = g.node_ids().collect();
        for v in ids {
            if !tree.contains_node(v) || self.lim[v.index()] != 0 {
                continue;
            }
            self.roots.push(v);
            self.renumber_subtree(g, tree, v, next_low);
            next_low = self.lim[v.index()] + 1;
        }
    }

    /// Re-runs the low/lim DFS for the subtree rooted at `root`, keeping
    /// `root`'s own parent linkage. `start_low` must be `root`'s previous
    /// `low` so the rest of the numbering stays valid.
    fn renumber_subtree(&mut self, g: &LayoutGraph, tree: &Tree, root: NodeId, start_low: i32) {
        struct Frame {
            v: NodeId,
            via: Option<EdgeId>,
            low: i32,
            next: usize,
        }

        let mut next_lim = start_low;
        let mut stack: Vec<Frame> = vec![Frame {
            v: root,
            via: self.parent_edge[root.index()],
            low: next_lim,
            next: 0,
        }];

        while let Some(top) = stack.last_mut() {
            let v = top.v;
            let adj = tree.adjacent(v);
            if top.next < adj.len() {
                let e = adj[top.next];
                top.next += 1;
                if Some(e) == top.via {
                    continue;
                }
                let w = g.other_endpoint(e, v);
                self.parent[w.index()] = Some(v);
                self.parent_edge[w.index()] = Some(e);
                stack.push(Frame {
                    v: w,
                    via: Some(e),
                    low: next_lim,
                    next: 0,
                });
                continue;
            }

            let frame = stack.pop().expect("stack is non-empty");
            self.low[frame.v.index()] = frame.low;
            self.lim[frame.v.index()] = next_lim;
            self.node_by_lim[next_lim as usize] = Some(frame.v);
            next_lim += 1;
        }
    }

    /// Derives every tree edge's cut value bottom-up. Children carry smaller
    /// `lim` values than their parents, so a single pass over the lim table
    /// sees each node after all of its tree children.
    pub fn init_cut_values(&mut self, g: &LayoutGraph) {
        for l in 1..self.node_by_lim.len() {
            let Some(v) = self.node_by_lim[l] else {
                continue;
            };
            let Some(pe) = self.parent_edge[v.index()] else {
                continue;
            };
            self.cut[pe.index()] = self.local_cut_value(g, v);
        }
    }

    /// O(degree) cut value of `v`'s parent edge, assuming the cut values of
    /// `v`'s tree children are already known.
    fn local_cut_value(&self, g: &LayoutGraph, v: NodeId) -> f64 {
        let pe = self.parent_edge[v.index()].expect("cut value needs a parent edge");
        let child_is_tail = g.tail(pe) == v;
        let mut cut = g.edge(pe).weight;

        for &e in g.out_edges(v) {
            if e == pe {
                continue;
            }
            let other = g.head(e);
            let points_to_head = child_is_tail;
            let weight = g.edge(e).weight;
            cut += if points_to_head { weight } else { -weight };
            if self.parent_edge[other.index()] == Some(e) {
                let other_cut = self.cut[e.index()];
                cut += if points_to_head { -other_cut } else { other_cut };
            }
        }
        for &e in g.in_edges(v) {
            if e == pe {
                continue;
            }
            let other = g.tail(e);
            let points_to_head = !child_is_tail;
            let weight = g.edge(e).weight;
            cut += if points_to_head { weight } else { -weight };
            if self.parent_edge[other.index()] == Some(e) {
                let other_cut = self.cut[e.index()];
                cut += if points_to_head { -other_cut } else { other_cut };
            }
        }
        cut
    }

    /// Recomputes a tree edge's cut value from scratch by walking the
    /// smaller of the two components obtained by deleting it. Used by the
    /// consistency tests; the optimality loop relies on the incremental
    /// values.
    pub fn cut_value_from_scratch(&self, g: &LayoutGraph, e: EdgeId) -> f64 {
        let (tail, head) = g.endpoints(e);
        let child = if self.parent_edge[tail.index()] == Some(e) {
            tail
        } else {
            head
        };
        debug_assert_eq!(self.parent_edge[child.index()], Some(e));
        let child_is_tail = child == tail;

        let mut root = child;
        while let Some(p) = self.parent[root.index()] {
            root = p;
        }

        let (c_low, c_lim) = (self.low[child.index()], self.lim[child.index()]);
        let (r_low, r_lim) = (self.low[root.index()], self.lim[root.index()]);
        let sub_size = c_lim - c_low + 1;
        let comp_size = r_lim - r_low + 1;
        let sign_tail_inside: f64 = if child_is_tail { 1.0 } else { -1.0 };

        let mut cut = 0.0;
        let mut add = |g: &LayoutGraph, x: NodeId, cut: &mut f64| {
            for &e2 in g.out_edges(x) {
                let y = g.head(e2);
                let x_in = c_low <= self.lim[x.index()] && self.lim[x.index()] <= c_lim;
                let y_in = c_low <= self.lim[y.index()] && self.lim[y.index()] <= c_lim;
                if x_in == y_in {
                    continue;
                }
                let weight = g.edge(e2).weight;
                *cut += if x_in {
                    sign_tail_inside * weight
                } else {
                    -sign_tail_inside * weight
                };
            }
            for &e2 in g.in_edges(x) {
                let y = g.tail(e2);
                let x_in = c_low <= self.lim[x.index()] && self.lim[x.index()] <= c_lim;
                let y_in = c_low <= self.lim[y.index()] && self.lim[y.index()] <= c_lim;
                if x_in == y_in {
                    continue;
                }
                let weight = g.edge(e2).weight;
                *cut += if y_in {
                    sign_tail_inside * weight
                } else {
                    -sign_tail_inside * weight
                };
            }
        };

        if 2 * sub_size <= comp_size {
            for l in c_low..=c_lim {
                if let Some(x) = self.node_by_lim[l as usize] {
                    add(g, x, &mut cut);
                }
            }
        } else {
            for l in r_low..=r_lim {
                if l >= c_low && l <= c_lim {
                    continue;
                }
                if let Some(x) = self.node_by_lim[l as usize] {
                    add(g, x, &mut cut);
                }
            }
        }
        cut
    }

    /// First tree edge with a negative cut value, scanning nodes in handle
    /// order for determinism.
    pub fn leave_edge(&self, g: &LayoutGraph) -> Option<EdgeId> {
        for v in g.node_ids() {
            if let Some(pe) = self.parent_edge[v.index()] {
                if self.cut[pe.index()] < 0.0 {
                    return Some(pe);
                }
            }
        }
        None
    }

    /// The minimum-slack graph edge crossing the split of `e_leave` in the
    /// opposite direction.
    pub fn enter_edge(&self, g: &LayoutGraph, view: RankView, e_leave: EdgeId) -> Option<EdgeId> {
        let (tail, head) = g.endpoints(e_leave);
        let child = if self.parent_edge[tail.index()] == Some(e_leave) {
            tail
        } else {
            head
        };
        let child_is_tail = child == tail;
        let (c_low, c_lim) = (self.low[child.index()], self.lim[child.index()]);

        let mut best: Option<(i32, EdgeId)> = None;
        for l in c_low..=c_lim {
            let Some(x) = self.node_by_lim[l as usize] else {
                continue;
            };
            // When the subtree is the tail side, the entering edge points
            // into it; otherwise it points out of it.
            let candidates = if child_is_tail {
                g.in_edges(x)
            } else {
                g.out_edges(x)
            };
            for &e in candidates {
                let other = g.other_endpoint(e, x);
                let other_lim = self.lim[other.index()];
                if c_low <= other_lim && other_lim <= c_lim {
                    continue;
                }
                let s = slack(g, view, e);
                match best {
                    Some((best_slack, _)) if s >= best_slack => {}
                    _ => best = Some((s, e)),
                }
            }
        }
        best.map(|(_, e)| e)
    }

    /// Walks from `v` up to the first ancestor of `w`, patching cut values
    /// with the leaving edge's value along the way. Returns that ancestor.
    ///
    /// Called once from each endpoint of the entering edge; the tree path
    /// between them is exactly the set of edges whose split gains or loses
    /// the detached component, and each gains or loses the leaving edge's
    /// cut value depending on its orientation along the path.
    fn path_update(&mut self, g: &LayoutGraph, mut v: NodeId, w: NodeId, cv: f64, dir: bool) -> NodeId {
        while !self.in_subtree(w, v) {
            let pe = self.parent_edge[v.index()].expect("path to the LCA stays below a root");
            let d = if g.tail(pe) == v { dir } else { !dir };
            if d {
                self.cut[pe.index()] += cv;
            } else {
                self.cut[pe.index()] -= cv;
            }
            v = self.parent[v.index()].expect("path to the LCA stays below a root");
        }
        v
    }

    /// Swaps `f_enter` into the tree for `e_leave`: shifts the detached
    /// component so the entering edge becomes tight, patches cut values up
    /// to the lowest common ancestor, and renumbers the subtree under it.
    pub fn exchange(
        &mut self,
        g: &mut LayoutGraph,
        view: RankView,
        tree: &mut Tree,
        e_leave: EdgeId,
        f_enter: EdgeId,
    ) {
        let (l_tail, l_head) = g.endpoints(e_leave);
        let child = if self.parent_edge[l_tail.index()] == Some(e_leave) {
            l_tail
        } else {
            l_head
        };

        let delta = slack(g, view, f_enter);
        if delta != 0 {
            let shift = if self.in_subtree(g.tail(f_enter), child) {
                delta
            } else {
                -delta
            };
            let (c_low, c_lim) = (self.low[child.index()], self.lim[child.index()]);
            for l in c_low..=c_lim {
                let Some(v) = self.node_by_lim[l as usize] else {
                    continue;
                };
                let rank = g.node(v).rank_in(view).unwrap_or(0);
                g.node_mut(v).set_rank_in(view, rank + shift);
            }
        }

        let cv = self.cut[e_leave.index()];
        let (f_tail, f_head) = g.endpoints(f_enter);
        let lca = self.path_update(g, f_tail, f_head, cv, true);
        let lca_check = self.path_update(g, f_head, f_tail, cv, false);
        debug_assert_eq!(lca, lca_check, "both paths must meet at the LCA");

        tree.remove_edge(g, e_leave);
        tree.add_edge(g, f_enter);
        self.cut[f_enter.index()] = -cv;
        self.cut[e_leave.index()] = 0.0;

        let lca_low = self.low[lca.index()];
        self.renumber_subtree(g, tree, lca, lca_low);
    }
}

/// Runs the full ranking: longest-path init, feasible tree, bounded
/// optimality loop, then the requested balancing pass.
pub fn network_simplex(g: &mut LayoutGraph, view: RankView, limit: usize, balance: Balance) {
    if g.node_count() == 0 {
        return;
    }

    init_rank(g, view);
    let mut tree = feasible_tree::feasible_tree(g, view);
    let mut state = SimplexState::new(g);
    state.renumber(g, &tree);
    state.init_cut_values(g);

    let mut iterations = 0usize;
    while iterations < limit {
        let Some(e_leave) = state.leave_edge(g) else {
            break;
        };
        let Some(f_enter) = state.enter_edge(g, view, e_leave) else {
            break;
        };
        state.exchange(g, view, &mut tree, e_leave, f_enter);
        iterations += 1;
    }
    tracing::trace!(iterations, nodes = g.node_count(), "network simplex done");

    match balance {
        Balance::None => {}
        Balance::TopBottom => balance_top_bottom(g, view),
        Balance::LeftRight => balance_left_right(g, view, &state),
    }
}

/// Moves nodes whose weighted in- and out-degree cancel to the least
/// populated rank in their feasible range. Ties keep the current rank.
fn balance_top_bottom(g: &mut LayoutGraph, view: RankView) {
    let ids: Vec<NodeId> = g.node_ids().collect();

    let mut min_rank = i32::MAX;
    let mut max_rank = i32::MIN;
    for &v in &ids {
        let rank = g.node(v).rank_in(view).unwrap_or(0);
        min_rank = min_rank.min(rank);
        max_rank = max_rank.max(rank);
    }
    if min_rank >= max_rank {
        return;
    }

    let mut counts: rustc_hash::FxHashMap<i32, usize> = rustc_hash::FxHashMap::default();
    for &v in &ids {
        *counts.entry(g.node(v).rank_in(view).unwrap_or(0)).or_insert(0) += 1;
    }

    for &v in &ids {
        let in_weight: f64 = g.in_edges(v).iter().map(|&e| g.edge(e).weight).sum();
        let out_weight: f64 = g.out_edges(v).iter().map(|&e| g.edge(e).weight).sum();
        if in_weight != out_weight {
            continue;
        }

        let mut feasible_low = min_rank;
        for &e in g.in_edges(v) {
            let bound = g.node(g.tail(e)).rank_in(view).unwrap_or(0) + g.edge(e).minlen;
            feasible_low = feasible_low.max(bound);
        }
        let mut feasible_high = max_rank;
        for &e in g.out_edges(v) {
            let bound = g.node(g.head(e)).rank_in(view).unwrap_or(0) - g.edge(e).minlen;
            feasible_high = feasible_high.min(bound);
        }
        if feasible_low >= feasible_high {
            continue;
        }

        let current = g.node(v).rank_in(view).unwrap_or(0);
        let mut best_rank = current;
        let mut best_count = counts.get(&current).copied().unwrap_or(0);
        for r in feasible_low..=feasible_high {
            let c = counts.get(&r).copied().unwrap_or(0);
            if c < best_count {
                best_count = c;
                best_rank = r;
            }
        }
        if best_rank != current {
            *counts.entry(current).or_insert(1) -= 1;
            *counts.entry(best_rank).or_insert(0) += 1;
            g.node_mut(v).set_rank_in(view, best_rank);
        }
    }
}

/// Re-centers components hanging off zero-cut-value tree edges halfway into
/// their slack. Run once after optimality; the tree is not reused afterward.
fn balance_left_right(g: &mut LayoutGraph, view: RankView, state: &SimplexState) {
    let ids: Vec<NodeId> = g.node_ids().collect();
    for &v in &ids {
        let Some(pe) = state.parent_edge(v) else {
            continue;
        };
        if state.cut_value(pe) != 0.0 {
            continue;
        }
        let Some(f) = state.enter_edge(g, view, pe) else {
            continue;
        };
        let delta = slack(g, view, f);
        if delta <= 1 {
            continue;
        }
        let shift = if state.in_subtree(g.tail(f), v) {
            delta / 2
        } else {
            -(delta / 2)
        };
        let (c_low, c_lim) = state.low_lim(v);
        for l in c_low..=c_lim {
            let Some(x) = state.node_by_lim[l as usize] else {
                continue;
            };
            let rank = g.node(x).rank_in(view).unwrap_or(0);
            g.node_mut(x).set_rank_in(view, rank + shift);
        }
    }
}
