//! Self-loop extraction.
//!
//! Self loops never participate in ranking or ordering. They are detached
//! before layout and kept as annotations on their node; downstream routers
//! draw them from the node's final position.

use crate::model::{LayoutGraph, SelfLoop};
use beluga_digraph::EdgeId;

pub fn remove(g: &mut LayoutGraph) {
    let loops: Vec<EdgeId> = g
        .edge_ids()
        .filter(|&e| {
            let (tail, head) = g.endpoints(e);
            tail == head
        })
        .collect();
    for e in loops {
        let v = g.tail(e);
        let label = g.edge(e).clone();
        g.remove_edge(e);
        g.node_mut(v).self_loops.push(SelfLoop { edge: e, label });
    }
}
