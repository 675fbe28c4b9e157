//! Cycle legalization: reverse a feedback arc set before ranking, restore
//! edge directions once layout is done.

use crate::model::LayoutGraph;
use beluga_digraph::{EdgeId, NodeId};

pub fn run(g: &mut LayoutGraph) {
    let fas = dfs_fas(g);
    for e in fas {
        g.reverse_edge(e);
        let label = g.edge_mut(e);
        label.reversed = !label.reversed;
    }
}

pub fn undo(g: &mut LayoutGraph) {
    let reversed: Vec<EdgeId> = g
        .edge_ids()
        .filter(|&e| g.edge(e).reversed)
        .collect();
    for e in reversed {
        g.reverse_edge(e);
        g.edge_mut(e).reversed = false;
    }
}

/// Back edges of a DFS over the graph, in visit order. Self loops are not
/// part of the set; reversing one cannot make the graph acyclic.
fn dfs_fas(g: &LayoutGraph) -> Vec<EdgeId> {
    #[derive(Clone, Copy)]
    struct Frame {
        v: NodeId,
        next_out: usize,
    }

    let bound = g.node_bound();
    let mut visited = vec![false; bound];
    let mut on_stack = vec![false; bound];
    let mut fas: Vec<EdgeId> = Vec::new();
    let mut stack: Vec<Frame> = Vec::new();

    let roots: Vec<NodeId> = g.node_ids().collect();
    for root in roots {
        if visited[root.index()] {
            continue;
        }
        visited[root.index()] = true;
        on_stack[root.index()] = true;
        stack.push(Frame { v: root, next_out: 0 });

        while let Some(frame) = stack.last_mut() {
            let v = frame.v;
            let out = g.out_edges(v);
            if frame.next_out >= out.len() {
                on_stack[v.index()] = false;
                stack.pop();
                continue;
            }
            let e = out[frame.next_out];
            frame.next_out += 1;

            let w = g.head(e);
            if w == v {
                continue;
            }
            if on_stack[w.index()] {
                fas.push(e);
            } else if !visited[w.index()] {
                visited[w.index()] = true;
                on_stack[w.index()] = true;
                stack.push(Frame { v: w, next_out: 0 });
            }
        }
    }
    fas
}
