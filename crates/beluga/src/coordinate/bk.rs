//! Brandes-Köpf style coordinates: median vertical alignment into maximal
//! non-conflicting blocks, blocks positioned with network simplex.

use super::blocks::{self, Conflicts};
use crate::model::{LayoutGraph, LayoutOptions};
use crate::ranks::Ranks;

pub fn run(g: &mut LayoutGraph, ranks: &Ranks, opts: &LayoutOptions) {
    let layering = ranks.layering();

    let mut conflicts: Conflicts = blocks::find_type1_conflicts(g, &layering);
    for (v, w) in blocks::find_type2_conflicts(g, &layering) {
        blocks::add_conflict(&mut conflicts, v, w);
    }

    let root = blocks::vertical_alignment(g, &layering, &conflicts);
    let xs = blocks::position_blocks(g, opts, &layering, &root);

    for layer in layering {
        for v in layer {
            g.node_mut(v).x = Some(xs[v.index()]);
        }
    }
}
