//! Feasible spanning tree construction.
//!
//! Grows an undirected spanning tree over tight edges, repeatedly shifting
//! the tree component by the minimum incident slack until a non-tree tight
//! edge appears. Disconnected graphs produce a forest, one root per
//! component.

use super::slack;
use crate::model::{LayoutGraph, RankView};
use beluga_digraph::{EdgeId, NodeId};

/// Undirected view over a set of tree edges, kept as side tables indexed by
/// the graph's handles.
#[derive(Debug, Clone)]
pub struct Tree {
    in_tree_node: Vec<bool>,
    in_tree_edge: Vec<bool>,
    adj: Vec<Vec<EdgeId>>,
    node_count: usize,
}

impl Tree {
    pub fn new(g: &LayoutGraph) -> Self {
        Self {
            in_tree_node: vec![false; g.node_bound()],
            in_tree_edge: vec![false; g.edge_bound()],
            adj: vec![Vec::new(); g.node_bound()],
            node_count: 0,
        }
    }

    pub fn node_count(&self) -> usize {
        self.node_count
    }

    pub fn contains_node(&self, v: NodeId) -> bool {
        self.in_tree_node[v.index()]
    }

    pub fn contains_edge(&self, e: EdgeId) -> bool {
        self.in_tree_edge[e.index()]
    }

    /// Tree edges incident to `v`.
    pub fn adjacent(&self, v: NodeId) -> &[EdgeId] {
        &self.adj[v.index()]
    }

    pub fn add_node(&mut self, v: NodeId) {
        if !self.in_tree_node[v.index()] {
            self.in_tree_node[v.index()] = true;
            self.node_count += 1;
        }
    }

    pub fn add_edge(&mut self, g: &LayoutGraph, e: EdgeId) {
        debug_assert!(!self.in_tree_edge[e.index()]);
        let (tail, head) = g.endpoints(e);
        self.add_node(tail);
        self.add_node(head);
        self.in_tree_edge[e.index()] = true;
        self.adj[tail.index()].push(e);
        self.adj[head.index()].push(e);
    }

    pub fn remove_edge(&mut self, g: &LayoutGraph, e: EdgeId) {
        debug_assert!(self.in_tree_edge[e.index()]);
        let (tail, head) = g.endpoints(e);
        self.in_tree_edge[e.index()] = false;
        self.adj[tail.index()].retain(|&x| x != e);
        self.adj[head.index()].retain(|&x| x != e);
    }
}

/// Builds a feasible spanning forest. Requires a feasible initial ranking
/// (every edge slack non-negative); leaves every tree edge tight.
pub fn feasible_tree(g: &mut LayoutGraph, view: RankView) -> Tree {
    let mut tree = Tree::new(g);
    let ids: Vec<NodeId> = g.node_ids().collect();
    let Some(&start) = ids.first() else {
        return tree;
    };
    let size = ids.len();
    tree.add_node(start);

    while grow_tight_tree(g, view, &mut tree) < size {
        match find_min_slack_edge(g, view, &tree) {
            Some((edge_slack, tail_in_tree)) => {
                let delta = if tail_in_tree { edge_slack } else { -edge_slack };
                shift_tree_ranks(g, view, &tree, &ids, delta);
            }
            None => {
                // No edge touches the current component: start a new root so
                // disconnected inputs form a forest.
                let Some(&next_root) = ids.iter().find(|v| !tree.contains_node(**v)) else {
                    break;
                };
                tree.add_node(next_root);
            }
        }
    }

    tree
}

/// Expands the tree across tight edges; returns the tree's node count.
fn grow_tight_tree(g: &LayoutGraph, view: RankView, tree: &mut Tree) -> usize {
    let mut stack: Vec<NodeId> = g.node_ids().filter(|&v| tree.contains_node(v)).collect();
    while let Some(v) = stack.pop() {
        for &e in g.out_edges(v) {
            let w = g.head(e);
            if tree.contains_node(w) || slack(g, view, e) != 0 {
                continue;
            }
            tree.add_edge(g, e);
            stack.push(w);
        }
        for &e in g.in_edges(v) {
            let w = g.tail(e);
            if tree.contains_node(w) || slack(g, view, e) != 0 {
                continue;
            }
            tree.add_edge(g, e);
            stack.push(w);
        }
    }
    tree.node_count()
}

/// The minimum-slack edge with exactly one endpoint in the tree, plus
/// whether that endpoint is the tail.
fn find_min_slack_edge(g: &LayoutGraph, view: RankView, tree: &Tree) -> Option<(i32, bool)> {
    let mut best: Option<(i32, bool)> = None;
    for e in g.edge_ids() {
        let (tail, head) = g.endpoints(e);
        let tail_in = tree.contains_node(tail);
        let head_in = tree.contains_node(head);
        if tail_in == head_in {
            continue;
        }
        let s = slack(g, view, e);
        match best {
            Some((best_slack, _)) if s >= best_slack => {}
            _ => best = Some((s, tail_in)),
        }
    }
    best
}

fn shift_tree_ranks(
    g: &mut LayoutGraph,
    view: RankView,
    tree: &Tree,
    ids: &[NodeId],
    delta: i32,
) {
    for &v in ids {
        if !tree.contains_node(v) {
            continue;
        }
        let rank = g.node(v).rank_in(view).unwrap_or(0);
        g.node_mut(v).set_rank_in(view, rank + delta);
    }
}
