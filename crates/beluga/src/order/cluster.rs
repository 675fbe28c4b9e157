//! Cluster-aware ordering.
//!
//! Each container is ordered with its child clusters collapsed to one proxy
//! node per spanned rank; the proxies of a cluster are chained vertically
//! with a dominant weight so the mincross sweeps keep them aligned. The
//! clusters are then ordered recursively the same way and their per-rank
//! node lists spliced into the proxy positions, which keeps two different
//! clusters from interleaving within any rank.

use super::mincross;
use crate::model::{EdgeLabel, LayoutGraph, LayoutOptions, NodeKind, NodeLabel};
use crate::ranks::Ranks;
use beluga_digraph::NodeId;
use rustc_hash::FxHashMap;

pub fn order_with_clusters(g: &mut LayoutGraph, ranks: &mut Ranks, opts: &LayoutOptions) {
    let ordered = order_container(g, None, opts);
    for (rank, nodes) in ordered {
        ranks.set_order(g, rank, nodes);
    }
}

#[derive(Debug, Clone, Copy)]
enum Origin {
    Leaf(NodeId),
    Proxy(NodeId),
}

/// Orders one container's span; returns the ordered node list per rank,
/// already expanded down to leaves.
fn order_container(
    g: &LayoutGraph,
    container: Option<NodeId>,
    opts: &LayoutOptions,
) -> Vec<(i32, Vec<NodeId>)> {
    let direct: Vec<NodeId> = match container {
        Some(c) => g.children(c).to_vec(),
        None => g.roots().collect(),
    };

    let leaves: Vec<NodeId> = direct
        .iter()
        .copied()
        .filter(|&v| g.node(v).kind != NodeKind::Cluster && g.node(v).rank.is_some())
        .collect();

    // Child clusters and the rank span their leaves occupy.
    let mut child_spans: Vec<(NodeId, i32, i32)> = Vec::new();
    for &c in &direct {
        if g.node(c).kind != NodeKind::Cluster {
            continue;
        }
        let mut lo = i32::MAX;
        let mut hi = i32::MIN;
        for v in g.node_ids() {
            if g.node(v).kind == NodeKind::Cluster || !g.is_inside(v, c) {
                continue;
            }
            if let Some(rank) = g.node(v).rank {
                lo = lo.min(rank);
                hi = hi.max(rank);
            }
        }
        if lo <= hi {
            child_spans.push((c, lo, hi));
        }
    }

    if leaves.is_empty() && child_spans.is_empty() {
        return Vec::new();
    }

    // Scratch graph: leaves as themselves, clusters as per-rank proxy
    // chains.
    let mut s: LayoutGraph = LayoutGraph::new();
    let mut origins: Vec<Origin> = Vec::new();
    let mut rep_of_direct: FxHashMap<NodeId, Vec<(i32, NodeId)>> = FxHashMap::default();

    for &v in &leaves {
        let sv = s.add_node(NodeLabel {
            rank: g.node(v).rank,
            order: g.node(v).order,
            kind: g.node(v).kind,
            ..Default::default()
        });
        origins.push(Origin::Leaf(v));
        rep_of_direct.insert(v, vec![(g.node(v).rank.unwrap_or(0), sv)]);
    }

    let mut chain_weight: f64 = 1.0;
    for e in g.edge_ids() {
        chain_weight += g.edge(e).weight;
    }

    for &(c, lo, hi) in &child_spans {
        let mut chain: Vec<(i32, NodeId)> = Vec::new();
        let mut prev: Option<NodeId> = None;
        for r in lo..=hi {
            let proxy = s.add_node(NodeLabel {
                rank: Some(r),
                kind: NodeKind::ClusterProxy,
                ..Default::default()
            });
            origins.push(Origin::Proxy(c));
            if let Some(p) = prev {
                s.add_edge(
                    p,
                    proxy,
                    EdgeLabel {
                        weight: chain_weight,
                        minlen: 1,
                        ..Default::default()
                    },
                );
            }
            chain.push((r, proxy));
            prev = Some(proxy);
        }
        rep_of_direct.insert(c, chain);
    }

    // Remap this container's edges onto scratch representatives, merging
    // parallels so the crossing counts see one weight per pair.
    let mut merged: FxHashMap<(NodeId, NodeId), f64> = FxHashMap::default();
    for e in g.edge_ids() {
        let (u, v) = g.endpoints(e);
        let Some(su) = scratch_rep(g, container, &rep_of_direct, u) else {
            continue;
        };
        let Some(sv) = scratch_rep(g, container, &rep_of_direct, v) else {
            continue;
        };
        if su == sv {
            continue;
        }
        *merged.entry((su, sv)).or_insert(0.0) += g.edge(e).weight;
    }
    let mut merged: Vec<((NodeId, NodeId), f64)> = merged.into_iter().collect();
    merged.sort_by_key(|&((u, v), _)| (u, v));
    for ((su, sv), weight) in merged {
        s.add_edge(
            su,
            sv,
            EdgeLabel {
                weight,
                ..Default::default()
            },
        );
    }

    let mut s_ranks = Ranks::build(&mut s, opts.ranksep);
    if s_ranks.is_empty() {
        return Vec::new();
    }
    mincross(&mut s, &mut s_ranks, opts);

    // Recurse into each child cluster, then splice its per-rank lists into
    // the proxy slots.
    let mut child_orders: FxHashMap<NodeId, FxHashMap<i32, Vec<NodeId>>> = FxHashMap::default();
    for &(c, _, _) in &child_spans {
        let ordered = order_container(g, Some(c), opts);
        child_orders.insert(c, ordered.into_iter().collect());
    }

    let mut out: Vec<(i32, Vec<NodeId>)> = Vec::new();
    for (rank, bucket) in s_ranks.iter() {
        let mut nodes: Vec<NodeId> = Vec::new();
        for &sv in bucket.nodes() {
            match origins[sv.index()] {
                Origin::Leaf(v) => nodes.push(v),
                Origin::Proxy(c) => {
                    if let Some(per_rank) = child_orders.get(&c) {
                        if let Some(members) = per_rank.get(&rank) {
                            nodes.extend_from_slice(members);
                        }
                    }
                }
            }
        }
        out.push((rank, nodes));
    }
    out
}

/// Maps a node to its scratch representative within `container`: itself for
/// a direct leaf, the owning cluster's proxy at the node's rank otherwise.
fn scratch_rep(
    g: &LayoutGraph,
    container: Option<NodeId>,
    rep_of_direct: &FxHashMap<NodeId, Vec<(i32, NodeId)>>,
    u: NodeId,
) -> Option<NodeId> {
    let rank = g.node(u).rank?;
    let mut cursor = u;
    loop {
        let parent = g.parent(cursor);
        if parent == container {
            let chain = rep_of_direct.get(&cursor)?;
            return chain
                .iter()
                .find(|&&(r, _)| r == rank)
                .or_else(|| chain.last())
                .map(|&(_, sv)| sv);
        }
        cursor = parent?;
    }
}
