//! Long-edge normalization.
//!
//! After ranking, every edge spanning more than one rank is replaced by a
//! chain of virtual nodes, one per intermediate rank. A labeled edge gets a
//! label-bearing node at the chain midpoint, opening a brand-new rank first
//! when the edge is tight. Flat (same-rank) parallels merge, and a labeled
//! flat edge turns into a label node wired back to both endpoints.
//!
//! The original edges are detached, not forgotten: every chain records its
//! owning edge handle and label so routers can rebuild the path.

use crate::model::{EdgeLabel, LayoutGraph, NodeKind, NodeLabel};
use crate::ranks::Ranks;
use beluga_digraph::{EdgeId, NodeId};
use rustc_hash::FxHashMap;

/// The virtual-node chain standing in for one original edge. `tail`,
/// `head`, and `nodes` are reported in the edge's original orientation even
/// when the edge spent the layout reversed.
#[derive(Debug, Clone)]
pub struct EdgeChain {
    pub edge: EdgeId,
    pub tail: NodeId,
    pub head: NodeId,
    pub label: EdgeLabel,
    pub nodes: Vec<NodeId>,
}

/// Folds parallel edges into one representative per endpoint pair and
/// direction, summing weights and keeping the largest minlen. Reversed and
/// forward edges never merge so cycle restoration stays exact.
pub fn merge_parallel_edges(g: &mut LayoutGraph) {
    let mut first: FxHashMap<(NodeId, NodeId, bool), EdgeId> = FxHashMap::default();
    let all: Vec<EdgeId> = g.edge_ids().collect();
    for e in all {
        let (tail, head) = g.endpoints(e);
        let key = (tail, head, g.edge(e).reversed);
        match first.get(&key) {
            Some(&keep) => {
                let merged = g.edge(e).clone();
                g.remove_edge(e);
                let kept = g.edge_mut(keep);
                kept.weight += merged.weight;
                kept.minlen = kept.minlen.max(merged.minlen);
                kept.merged += merged.merged;
                if kept.label_size.is_none() {
                    kept.label_size = merged.label_size;
                }
            }
            None => {
                first.insert(key, e);
            }
        }
    }
}

/// Breaks long and labeled edges into chains. Ranks must already be built;
/// new ranks may be inserted for adjacent labeled edges.
pub fn run(g: &mut LayoutGraph, ranks: &mut Ranks) -> Vec<EdgeChain> {
    // A labeled edge needs an intermediate rank for its label node; open one
    // when the edge is tight. Re-reading ranks each step keeps a second
    // labeled edge over the same gap from opening another.
    let labeled: Vec<EdgeId> = g
        .edge_ids()
        .filter(|&e| g.edge(e).label_size.is_some())
        .collect();
    for e in labeled {
        let (tail, head) = g.endpoints(e);
        let span = g.node(head).rank.unwrap_or(0) - g.node(tail).rank.unwrap_or(0);
        if span == 1 {
            let head_rank = g.node(head).rank.unwrap_or(0);
            ranks.insert_rank_above(g, head_rank);
        }
    }

    let mut chains: Vec<EdgeChain> = Vec::new();
    let all: Vec<EdgeId> = g.edge_ids().collect();
    for e in all {
        let (tail, head) = g.endpoints(e);
        let tail_rank = g.node(tail).rank.unwrap_or(0);
        let head_rank = g.node(head).rank.unwrap_or(0);
        let label = g.edge(e).clone();

        if head_rank == tail_rank {
            if label.label_size.is_some() {
                chains.push(flat_label_chain(g, ranks, e, tail, head, label));
            }
            continue;
        }
        if head_rank - tail_rank == 1 {
            continue;
        }

        g.remove_edge(e);
        let label_rank = label
            .label_size
            .map(|_| tail_rank + (head_rank - tail_rank) / 2);
        let container = g.lowest_common_container(tail, head);

        let mut nodes: Vec<NodeId> = Vec::new();
        let mut prev = tail;
        for r in (tail_rank + 1)..head_rank {
            let is_label_rank = label_rank == Some(r);
            let dummy = g.add_node(NodeLabel {
                width: if is_label_rank {
                    label.label_size.map(|s| s.width).unwrap_or(0.0)
                } else {
                    0.0
                },
                height: if is_label_rank {
                    label.label_size.map(|s| s.height).unwrap_or(0.0)
                } else {
                    0.0
                },
                kind: if is_label_rank {
                    NodeKind::EdgeLabel
                } else {
                    NodeKind::Virtual
                },
                edge: Some(e),
                label_size: if is_label_rank { label.label_size } else { None },
                ..Default::default()
            });
            if let Some(c) = container {
                g.set_parent(dummy, c);
            }
            ranks.push_node(g, r, dummy);
            g.add_edge(
                prev,
                dummy,
                EdgeLabel {
                    weight: label.weight,
                    minlen: 1,
                    ..Default::default()
                },
            );
            nodes.push(dummy);
            prev = dummy;
        }
        g.add_edge(
            prev,
            head,
            EdgeLabel {
                weight: label.weight,
                minlen: 1,
                ..Default::default()
            },
        );

        chains.push(EdgeChain {
            edge: e,
            tail,
            head,
            label,
            nodes,
        });
    }
    chains
}

/// A labeled flat edge becomes a label node between its endpoints on the
/// same rank, connected back to both.
fn flat_label_chain(
    g: &mut LayoutGraph,
    ranks: &mut Ranks,
    e: EdgeId,
    tail: NodeId,
    head: NodeId,
    label: EdgeLabel,
) -> EdgeChain {
    let rank = g.node(tail).rank.unwrap_or(0);
    g.remove_edge(e);

    let size = label.label_size.unwrap_or_default();
    let dummy = g.add_node(NodeLabel {
        width: size.width,
        height: size.height,
        kind: NodeKind::EdgeLabel,
        edge: Some(e),
        label_size: label.label_size,
        ..Default::default()
    });
    if let Some(c) = g.lowest_common_container(tail, head) {
        g.set_parent(dummy, c);
    }
    ranks.push_node(g, rank, dummy);

    g.add_edge(
        tail,
        dummy,
        EdgeLabel {
            weight: label.weight,
            minlen: 0,
            ..Default::default()
        },
    );
    g.add_edge(
        dummy,
        head,
        EdgeLabel {
            weight: label.weight,
            minlen: 0,
            ..Default::default()
        },
    );

    EdgeChain {
        edge: e,
        tail,
        head,
        label,
        nodes: vec![dummy],
    }
}
