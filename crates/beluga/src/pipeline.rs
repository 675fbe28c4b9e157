//! The layout pipeline.
//!
//! One call computes one complete layout, single-threaded and synchronous.
//! The only bounded-time escape valves are the iteration caps carried in
//! [`LayoutOptions`].

use crate::error::{LayoutError, Result};
use crate::model::{LayoutGraph, LayoutOptions, RankView, Subgraph};
use crate::normalize::EdgeChain;
use crate::ranks::{self, Ranks};
use crate::{acyclic, collapse, coordinate, normalize, order, self_loops};

/// A finished layout: the graph (including surviving virtual/label nodes),
/// the ordered rank structure, and the virtual-node chain of every broken
/// edge, in the edge's original orientation.
#[derive(Debug)]
pub struct Layout {
    pub graph: LayoutGraph,
    pub ranks: Ranks,
    pub chains: Vec<EdgeChain>,
}

impl Layout {
    /// Ordered nodes of one rank.
    pub fn rank_nodes(&self, rank: i32) -> &[beluga_digraph::NodeId] {
        self.ranks.nodes(rank)
    }
}

/// Runs the full pipeline: self-loop extraction, cycle legalization,
/// collapsing + ranking, normalization, crossing minimization, coordinate
/// assignment, restoration.
pub fn layout(
    mut g: LayoutGraph,
    subgraphs: &[Subgraph],
    opts: &LayoutOptions,
) -> Result<Layout> {
    if g.node_count() == 0 {
        return Err(LayoutError::GraphEmpty);
    }
    tracing::debug!(
        nodes = g.node_count(),
        edges = g.edge_count(),
        "layout started"
    );

    self_loops::remove(&mut g);
    acyclic::run(&mut g);
    normalize::merge_parallel_edges(&mut g);

    collapse::assign_ranks(&mut g, subgraphs, opts)?;
    ranks::normalize_ranks(&mut g, RankView::Normal);
    let mut ranks = Ranks::build(&mut g, opts.ranksep);
    ranks.remove_empty_ranks(&mut g);

    let mut chains = normalize::run(&mut g, &mut ranks);
    order::run(&mut g, &mut ranks, opts);
    coordinate::assign(&mut g, &ranks, opts);

    acyclic::undo(&mut g);
    for chain in &mut chains {
        if chain.label.reversed {
            chain.nodes.reverse();
            std::mem::swap(&mut chain.tail, &mut chain.head);
            chain.label.reversed = false;
        }
    }

    Ok(Layout { graph: g, ranks, chains })
}
