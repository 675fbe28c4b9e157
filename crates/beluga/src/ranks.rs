//! The rank structure: an ordered sequence of rank buckets.
//!
//! Buckets mirror the `rank`/`order` fields on node labels; every mutation
//! here writes both sides so the two views cannot drift. Indexing a rank
//! outside the current range, or exchanging nodes of different ranks, is a
//! caller bug and panics.

use crate::model::{LayoutGraph, NodeKind, RankView};
use beluga_digraph::NodeId;

#[derive(Debug, Clone, Default)]
pub struct RankBucket {
    nodes: Vec<NodeId>,
    /// Separation between this rank and the next.
    pub ranksep: f64,
}

impl RankBucket {
    pub fn nodes(&self) -> &[NodeId] {
        &self.nodes
    }

    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }
}

#[derive(Debug, Clone, Default)]
pub struct Ranks {
    min_rank: i32,
    buckets: Vec<RankBucket>,
}

impl Ranks {
    /// Builds buckets from the `rank` fields currently on the labels.
    /// Cluster container nodes are not bucketed. Within a rank, nodes keep
    /// their existing `order` if present, falling back to insertion order.
    pub fn build(g: &mut LayoutGraph, ranksep: f64) -> Self {
        let mut min_rank = i32::MAX;
        let mut max_rank = i32::MIN;
        let mut entries: Vec<(i32, usize, NodeId)> = Vec::new();
        for v in g.node_ids() {
            let label = g.node(v);
            if label.kind == NodeKind::Cluster {
                continue;
            }
            let Some(rank) = label.rank else {
                continue;
            };
            min_rank = min_rank.min(rank);
            max_rank = max_rank.max(rank);
            entries.push((rank, label.order.unwrap_or(v.index()), v));
        }

        if entries.is_empty() {
            return Self::default();
        }

        entries.sort_by_key(|&(rank, order, v)| (rank, order, v));
        let len = (max_rank - min_rank + 1) as usize;
        let mut buckets: Vec<RankBucket> = vec![RankBucket::default(); len];
        for bucket in &mut buckets {
            bucket.ranksep = ranksep;
        }
        for (rank, _, v) in entries {
            buckets[(rank - min_rank) as usize].nodes.push(v);
        }

        let mut ranks = Self { min_rank, buckets };
        ranks.sync_orders(g);
        ranks
    }

    pub fn is_empty(&self) -> bool {
        self.buckets.is_empty()
    }

    pub fn min_rank(&self) -> i32 {
        self.min_rank
    }

    pub fn max_rank(&self) -> i32 {
        self.min_rank + self.buckets.len() as i32 - 1
    }

    pub fn rank_range(&self) -> std::ops::RangeInclusive<i32> {
        self.min_rank()..=self.max_rank()
    }

    pub fn bucket(&self, rank: i32) -> &RankBucket {
        let ix = self.bucket_index(rank);
        &self.buckets[ix]
    }

    pub fn nodes(&self, rank: i32) -> &[NodeId] {
        self.bucket(rank).nodes()
    }

    pub fn iter(&self) -> impl Iterator<Item = (i32, &RankBucket)> {
        self.buckets
            .iter()
            .enumerate()
            .map(|(ix, bucket)| (self.min_rank + ix as i32, bucket))
    }

    fn bucket_index(&self, rank: i32) -> usize {
        assert!(
            rank >= self.min_rank && rank <= self.max_rank(),
            "rank {rank} outside [{}, {}]",
            self.min_rank,
            self.max_rank(),
        );
        (rank - self.min_rank) as usize
    }

    /// Replaces the order of one rank. The replacement must be a permutation
    /// of the bucket's current nodes.
    pub fn set_order(&mut self, g: &mut LayoutGraph, rank: i32, nodes: Vec<NodeId>) {
        let ix = self.bucket_index(rank);
        assert_eq!(
            nodes.len(),
            self.buckets[ix].nodes.len(),
            "rank {rank} reorder must keep the same node set"
        );
        self.buckets[ix].nodes = nodes;
        for (order, &v) in self.buckets[ix].nodes.iter().enumerate() {
            g.node_mut(v).order = Some(order);
        }
    }

    /// Swaps two nodes of the same rank. Exchanging nodes of different ranks
    /// is a caller bug.
    pub fn exchange(&mut self, g: &mut LayoutGraph, v: NodeId, w: NodeId) {
        let v_rank = g.node(v).rank.expect("exchange requires ranked nodes");
        let w_rank = g.node(w).rank.expect("exchange requires ranked nodes");
        assert_eq!(v_rank, w_rank, "exchange requires nodes of the same rank");
        let ix = self.bucket_index(v_rank);
        let bucket = &mut self.buckets[ix];
        let v_pos = bucket.nodes.iter().position(|&n| n == v).expect("in bucket");
        let w_pos = bucket.nodes.iter().position(|&n| n == w).expect("in bucket");
        bucket.nodes.swap(v_pos, w_pos);
        g.node_mut(v).order = Some(w_pos);
        g.node_mut(w).order = Some(v_pos);
    }

    /// Opens a brand-new empty rank at `rank`, shifting that rank and every
    /// rank below it down by one. Node labels are updated to match.
    pub fn insert_rank_above(&mut self, g: &mut LayoutGraph, rank: i32) {
        let ix = self.bucket_index(rank);
        let ranksep = self.buckets[ix].ranksep;
        for bucket in &self.buckets[ix..] {
            for &v in &bucket.nodes {
                let label = g.node_mut(v);
                label.rank = Some(label.rank.expect("bucketed node has a rank") + 1);
            }
        }
        self.buckets.insert(
            ix,
            RankBucket {
                nodes: Vec::new(),
                ranksep,
            },
        );
    }

    /// Appends a node to a rank's bucket, writing rank and order onto its
    /// label.
    pub fn push_node(&mut self, g: &mut LayoutGraph, rank: i32, v: NodeId) {
        let ix = self.bucket_index(rank);
        let order = self.buckets[ix].nodes.len();
        self.buckets[ix].nodes.push(v);
        let label = g.node_mut(v);
        label.rank = Some(rank);
        label.order = Some(order);
    }

    /// Drops empty buckets and renumbers the remaining ranks densely.
    pub fn remove_empty_ranks(&mut self, g: &mut LayoutGraph) {
        if self.buckets.iter().all(|b| !b.is_empty()) {
            return;
        }
        let mut kept: Vec<RankBucket> = Vec::with_capacity(self.buckets.len());
        for bucket in self.buckets.drain(..) {
            if bucket.is_empty() {
                continue;
            }
            let rank = self.min_rank + kept.len() as i32;
            for &v in &bucket.nodes {
                g.node_mut(v).rank = Some(rank);
            }
            kept.push(bucket);
        }
        self.buckets = kept;
    }

    /// Rewrites every bucketed node's `order` from its bucket position.
    pub fn sync_orders(&self, g: &mut LayoutGraph) {
        for bucket in &self.buckets {
            for (order, &v) in bucket.nodes.iter().enumerate() {
                g.node_mut(v).order = Some(order);
            }
        }
    }

    /// The per-rank node lists, lowest rank first. Used for snapshots and
    /// crossing counts.
    pub fn layering(&self) -> Vec<Vec<NodeId>> {
        self.buckets.iter().map(|b| b.nodes.clone()).collect()
    }

    /// Replaces every bucket's order from `layering` (same shape as
    /// [`Ranks::layering`] output).
    pub fn restore_layering(&mut self, g: &mut LayoutGraph, layering: &[Vec<NodeId>]) {
        assert_eq!(layering.len(), self.buckets.len(), "layering shape changed");
        for (bucket, nodes) in self.buckets.iter_mut().zip(layering) {
            assert_eq!(bucket.nodes.len(), nodes.len(), "layering shape changed");
            bucket.nodes.clone_from(nodes);
        }
        self.sync_orders(g);
    }
}

/// Shifts `view` ranks so the smallest becomes zero.
pub fn normalize_ranks(g: &mut LayoutGraph, view: RankView) {
    let mut min_rank = i32::MAX;
    let ids: Vec<NodeId> = g.node_ids().collect();
    for &v in &ids {
        if let Some(rank) = g.node(v).rank_in(view) {
            min_rank = min_rank.min(rank);
        }
    }
    if min_rank == i32::MAX || min_rank == 0 {
        return;
    }
    for &v in &ids {
        if let Some(rank) = g.node(v).rank_in(view) {
            g.node_mut(v).set_rank_in(view, rank - min_rank);
        }
    }
}
