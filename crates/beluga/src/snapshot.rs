//! Serializable snapshots of layout state, for golden tests and debugging.

use crate::model::LayoutGraph;
use crate::ranks::Ranks;
use serde::Serialize;

#[derive(Debug, Clone, Serialize)]
pub struct RankSnapshot {
    pub rank: i32,
    pub nodes: Vec<u32>,
}

/// The per-rank node order as stable handles.
pub fn ranks_snapshot(ranks: &Ranks) -> Vec<RankSnapshot> {
    ranks
        .iter()
        .map(|(rank, bucket)| RankSnapshot {
            rank,
            nodes: bucket.nodes().iter().map(|v| v.as_u32()).collect(),
        })
        .collect()
}

#[derive(Debug, Clone, Serialize)]
pub struct NodeSnapshot {
    pub node: u32,
    pub rank: Option<i32>,
    pub order: Option<usize>,
    pub x: Option<f64>,
    pub y: Option<f64>,
}

/// One row per live node, in handle order.
pub fn nodes_snapshot(g: &LayoutGraph) -> Vec<NodeSnapshot> {
    g.node_ids()
        .map(|v| {
            let label = g.node(v);
            NodeSnapshot {
                node: v.as_u32(),
                rank: label.rank,
                order: label.order,
                x: label.x,
                y: label.y,
            }
        })
        .collect()
}

/// JSON dump of the rank structure, stable across runs.
pub fn ranks_json(ranks: &Ranks) -> String {
    serde_json::to_string(&ranks_snapshot(ranks)).expect("snapshot types serialize")
}
