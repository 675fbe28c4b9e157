//! Core label types and layout configuration.
//!
//! Labels are plain data: every field a layout phase assigns is an `Option`
//! so a half-run pipeline state is representable and cheap to clone for
//! snapshots. Per-phase working state (DFS numbering, cut values, medians)
//! lives in side tables owned by the phase, not here.

use beluga_digraph::{Digraph, EdgeId};
use serde::Serialize;

/// The layout graph: node/edge labels in a [`Digraph`] arena.
pub type LayoutGraph = Digraph<NodeLabel, EdgeLabel>;

/// Which of the two independent rank fields a simplex run reads and writes.
///
/// Rank assignment works in [`RankView::Normal`]; the coordinate strategies
/// re-run the same simplex over auxiliary graphs in [`RankView::Aux`]. The
/// view is an explicit parameter on every rank access so the two uses can
/// never bleed into each other.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RankView {
    Normal,
    Aux,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize)]
pub enum NodeKind {
    /// A caller-supplied node.
    #[default]
    Real,
    /// A container node grouping its children; never ranked or ordered
    /// itself.
    Cluster,
    /// Long-edge chain segment inserted by normalization.
    Virtual,
    /// Chain segment carrying an edge label's size.
    EdgeLabel,
    /// Stand-in for a collapsed cluster inside an auxiliary ranking problem.
    ClusterProxy,
    /// Stand-in for a merged subgraph inside an auxiliary ranking problem.
    MergeProxy,
}

#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize)]
pub struct LabelSize {
    pub width: f64,
    pub height: f64,
}

/// A self loop detached from the graph before layout and kept as an
/// annotation on its node.
#[derive(Debug, Clone, PartialEq)]
pub struct SelfLoop {
    pub edge: EdgeId,
    pub label: EdgeLabel,
}

#[derive(Debug, Clone, PartialEq, Default)]
pub struct NodeLabel {
    pub width: f64,
    pub height: f64,

    /// Layer index assigned by rank assignment.
    pub rank: Option<i32>,
    /// Independent rank used when the node participates in an auxiliary
    /// coordinate-assignment problem. See [`RankView`].
    pub aux_rank: Option<i32>,
    /// Dense position within the rank, assigned by crossing minimization.
    pub order: Option<usize>,

    pub kind: NodeKind,
    /// Owning edge, for [`NodeKind::Virtual`] and [`NodeKind::EdgeLabel`]
    /// nodes.
    pub edge: Option<EdgeId>,
    /// Label size, for [`NodeKind::EdgeLabel`] nodes.
    pub label_size: Option<LabelSize>,

    /// Final cross-axis coordinate.
    pub x: Option<f64>,
    /// Final rank-axis coordinate.
    pub y: Option<f64>,

    pub self_loops: Vec<SelfLoop>,
}

impl NodeLabel {
    pub fn with_size(width: f64, height: f64) -> Self {
        Self {
            width,
            height,
            ..Default::default()
        }
    }

    pub fn rank_in(&self, view: RankView) -> Option<i32> {
        match view {
            RankView::Normal => self.rank,
            RankView::Aux => self.aux_rank,
        }
    }

    pub fn set_rank_in(&mut self, view: RankView, rank: i32) {
        match view {
            RankView::Normal => self.rank = Some(rank),
            RankView::Aux => self.aux_rank = Some(rank),
        }
    }

    /// Whether the node was inserted by the algorithm rather than the caller.
    pub fn is_dummy(&self) -> bool {
        !matches!(self.kind, NodeKind::Real | NodeKind::Cluster)
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct EdgeLabel {
    /// Contribution to the simplex objective and to crossing counts.
    pub weight: f64,
    /// Minimum required rank separation ("minlen").
    pub minlen: i32,
    /// Size of the edge's label, if it carries one.
    pub label_size: Option<LabelSize>,
    /// Set while the edge is reversed to break a cycle; restored at the end.
    pub reversed: bool,
    /// Number of parallel edges folded into this representative.
    pub merged: u32,
}

impl Default for EdgeLabel {
    fn default() -> Self {
        Self {
            weight: 1.0,
            minlen: 1,
            label_size: None,
            reversed: false,
            merged: 1,
        }
    }
}

/// Rank constraint a subgraph imposes on its members.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RankConstraint {
    /// All members share one rank.
    Same,
    /// Members sit at the minimum rank; other nodes may share it.
    Min,
    /// Members sit strictly above every other node.
    Source,
    /// Members sit at the maximum rank; other nodes may share it.
    Max,
    /// Members sit strictly below every other node.
    Sink,
}

impl RankConstraint {
    /// Whether this constraint pins members to the low end of the ranking.
    pub fn is_min_class(self) -> bool {
        matches!(self, RankConstraint::Min | RankConstraint::Source)
    }

    pub fn is_max_class(self) -> bool {
        matches!(self, RankConstraint::Max | RankConstraint::Sink)
    }
}

/// A named group of nodes ranked together under one [`RankConstraint`].
#[derive(Debug, Clone)]
pub struct Subgraph {
    pub name: String,
    pub nodes: Vec<beluga_digraph::NodeId>,
    pub constraint: RankConstraint,
}

/// Cross-axis coordinate strategy. See the `coordinate` module.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum CoordinateStrategy {
    /// Auxiliary-graph network simplex. Most accurate, most expensive.
    AuxSimplex,
    /// Block-based simplex plus median refinement.
    #[default]
    Quick,
    /// Brandes-Köpf alignment with simplex-positioned blocks.
    BrandesKoepf,
}

/// Pass-through configuration for one layout run.
///
/// The iteration caps and the convergence threshold are inherited heuristics;
/// they are exposed as parameters rather than re-derived.
#[derive(Debug, Clone)]
pub struct LayoutOptions {
    /// Separation between adjacent ranks.
    pub ranksep: f64,
    /// Separation between adjacent real nodes within a rank.
    pub nodesep: f64,
    /// Separation against virtual (edge-chain) nodes within a rank.
    pub edgesep: f64,
    /// Extra separation across a cluster border.
    pub cluster_margin: f64,

    /// Iteration cap for the ranking network simplex.
    pub ns_limit: usize,
    /// Iteration cap for coordinate-assignment simplex runs.
    pub ns_limit_x: usize,
    /// Consecutive non-improving ordering passes tolerated before giving up.
    pub mc_limit: usize,
    /// Upper bound on median/transpose passes.
    pub max_order_iterations: usize,
    /// An ordering pass counts as improving only below this fraction of the
    /// best crossing count seen so far.
    pub convergence: f64,

    pub coordinate: CoordinateStrategy,
}

impl Default for LayoutOptions {
    fn default() -> Self {
        Self {
            ranksep: 50.0,
            nodesep: 50.0,
            edgesep: 20.0,
            cluster_margin: 8.0,
            ns_limit: usize::MAX,
            ns_limit_x: usize::MAX,
            mc_limit: 4,
            max_order_iterations: 8,
            convergence: 0.995,
            coordinate: CoordinateStrategy::default(),
        }
    }
}
