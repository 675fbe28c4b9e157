//! Container collapsing.
//!
//! Ranking runs bottom-up over the container tree: every cluster is ranked
//! as its own flat problem first, then stands in for its members as a single
//! proxy node in the parent's auxiliary DAG. Subgraph groups with rank
//! constraints merge into proxy nodes the same way. After the parent is
//! ranked, proxies expand back: the parent solution opens up by each
//! cluster's local span and members take `proxy rank + local rank`.
//!
//! Proxy nodes and merge maps live in per-pass scratch graphs and are
//! dropped once expansion finishes.

use crate::error::{LayoutError, Result};
use crate::model::{EdgeLabel, LayoutGraph, LayoutOptions, NodeKind, NodeLabel, RankView, Subgraph};
use crate::rank::{self, Balance};
use crate::{acyclic, ranks};
use beluga_digraph::NodeId;
use rustc_hash::FxHashMap;

/// Ranks every leaf node of `g`, honoring cluster nesting and subgraph
/// constraints. Fails on an empty root container or on subgraphs pinning
/// shared nodes to opposite extremes.
pub fn assign_ranks(
    g: &mut LayoutGraph,
    subgraphs: &[Subgraph],
    opts: &LayoutOptions,
) -> Result<()> {
    let solution = collapse_container(g, None, subgraphs, opts)?;
    let Some(solution) = solution else {
        return Err(LayoutError::GraphEmpty);
    };
    for &(v, rank) in &solution.members {
        g.node_mut(v).rank = Some(rank);
    }
    tracing::debug!(
        nodes = solution.members.len(),
        span = solution.span,
        "container collapsing assigned ranks"
    );
    Ok(())
}

/// Result of ranking one container in isolation: member ranks normalized so
/// the smallest is zero, plus the occupied span.
struct LocalRanking {
    members: Vec<(NodeId, i32)>,
    span: i32,
}

fn collapse_container(
    g: &LayoutGraph,
    container: Option<NodeId>,
    subgraphs: &[Subgraph],
    opts: &LayoutOptions,
) -> Result<Option<LocalRanking>> {
    let direct: Vec<NodeId> = match container {
        Some(c) => g.children(c).to_vec(),
        None => g.roots().collect(),
    };

    // Children before parents: collapse every child cluster first and keep
    // its local solution. A cluster with no rankable content is skipped.
    let mut cluster_solutions: Vec<(NodeId, LocalRanking)> = Vec::new();
    for &c in &direct {
        if g.node(c).kind != NodeKind::Cluster {
            continue;
        }
        if let Some(local) = collapse_container(g, Some(c), subgraphs, opts)? {
            cluster_solutions.push((c, local));
        }
    }

    let leaves: Vec<NodeId> = direct
        .iter()
        .copied()
        .filter(|&v| g.node(v).kind != NodeKind::Cluster)
        .collect();

    // Subgraph groups whose members live directly in this container.
    let owned: Vec<&Subgraph> = subgraphs
        .iter()
        .filter(|sg| {
            sg.nodes
                .first()
                .is_some_and(|&v| g.parent(v) == container && g.node(v).kind != NodeKind::Cluster)
        })
        .collect();
    let groups = merge_subgraphs(g, &owned)?;

    // Auxiliary DAG over direct leaves + proxies.
    let mut aux: LayoutGraph = LayoutGraph::with_capacity(
        leaves.len() + cluster_solutions.len() + groups.len(),
        g.edge_count(),
    );
    let mut rep_of_direct: FxHashMap<NodeId, NodeId> = FxHashMap::default();

    let mut group_proxies: Vec<(NodeId, &MergedGroup)> = Vec::new();
    for group in &groups {
        let proxy = aux.add_node(NodeLabel {
            kind: NodeKind::MergeProxy,
            ..Default::default()
        });
        for &v in &group.members {
            rep_of_direct.insert(v, proxy);
        }
        group_proxies.push((proxy, group));
    }

    for &v in &leaves {
        rep_of_direct.entry(v).or_insert_with(|| {
            aux.add_node(NodeLabel {
                kind: NodeKind::Real,
                ..Default::default()
            })
        });
    }

    let mut cluster_proxies: Vec<(NodeId, NodeId)> = Vec::new();
    for &(c, _) in &cluster_solutions {
        let proxy = aux.add_node(NodeLabel {
            kind: NodeKind::ClusterProxy,
            ..Default::default()
        });
        rep_of_direct.insert(c, proxy);
        cluster_proxies.push((c, proxy));
    }

    if aux.node_count() == 0 {
        return Ok(None);
    }

    // Remap edges onto representatives. An edge belongs to this container
    // exactly when both endpoints resolve to (distinct) direct children;
    // edges internal to one proxy vanish, deeper and outer edges are
    // handled at their own level.
    for e in g.edge_ids() {
        let (u, v) = g.endpoints(e);
        let Some(ru) = representative(g, container, &rep_of_direct, u) else {
            continue;
        };
        let Some(rv) = representative(g, container, &rep_of_direct, v) else {
            continue;
        };
        if ru == rv {
            continue;
        }
        let label = g.edge(e);
        aux.add_edge(
            ru,
            rv,
            EdgeLabel {
                weight: label.weight,
                minlen: label.minlen,
                ..Default::default()
            },
        );
    }

    acyclic::run(&mut aux);

    // Source-class proxies keep no in-edges, sink-class proxies no
    // out-edges; the offending edges reverse rather than drop so their
    // length still counts.
    for &(proxy, group) in &group_proxies {
        if group.constraint_is_min {
            let incoming: Vec<_> = aux.in_edges(proxy).to_vec();
            for e in incoming {
                aux.reverse_edge(e);
            }
        }
        if group.constraint_is_max {
            let outgoing: Vec<_> = aux.out_edges(proxy).to_vec();
            for e in outgoing {
                aux.reverse_edge(e);
            }
        }
    }

    merge_parallel_aux_edges(&mut aux);
    add_extreme_ties(&mut aux, &group_proxies);

    rank::assign(&mut aux, RankView::Normal, opts.ns_limit, Balance::TopBottom);
    ranks::normalize_ranks(&mut aux, RankView::Normal);

    Ok(Some(expand(
        g,
        &aux,
        &rep_of_direct,
        &leaves,
        &cluster_solutions,
        &cluster_proxies,
        &group_proxies,
    )))
}

/// Resolves `u` to the direct child of `container` holding it, then to that
/// child's aux representative. `None` when `u` lives outside the container
/// (or inside a skipped cluster).
fn representative(
    g: &LayoutGraph,
    container: Option<NodeId>,
    rep_of_direct: &FxHashMap<NodeId, NodeId>,
    u: NodeId,
) -> Option<NodeId> {
    let mut cursor = u;
    loop {
        let parent = g.parent(cursor);
        if parent == container {
            return rep_of_direct.get(&cursor).copied();
        }
        cursor = parent?;
    }
}

struct MergedGroup {
    members: Vec<NodeId>,
    constraint_is_min: bool,
    constraint_is_max: bool,
    /// Source/Sink demand strict separation from other extremes.
    strict: bool,
}

/// Union-find merge of subgraph groups: groups sharing nodes merge, and all
/// min-class (resp. max-class) groups merge since they are forced to one
/// extreme anyway. A merged class pulling both ways is a caller input error.
fn merge_subgraphs(g: &LayoutGraph, owned: &[&Subgraph]) -> Result<Vec<MergedGroup>> {
    let mut parent: Vec<usize> = (0..owned.len()).collect();

    fn find(parent: &mut [usize], mut i: usize) -> usize {
        while parent[i] != i {
            parent[i] = parent[parent[i]];
            i = parent[i];
        }
        i
    }
    fn union(parent: &mut [usize], a: usize, b: usize) {
        let ra = find(parent, a);
        let rb = find(parent, b);
        if ra != rb {
            parent[rb] = ra;
        }
    }

    let mut seen: FxHashMap<NodeId, usize> = FxHashMap::default();
    for (i, sg) in owned.iter().enumerate() {
        for &v in &sg.nodes {
            if g.node(v).kind == NodeKind::Cluster {
                continue;
            }
            match seen.get(&v) {
                Some(&j) => union(&mut parent, i, j),
                None => {
                    seen.insert(v, i);
                }
            }
        }
    }

    let mut first_min: Option<usize> = None;
    let mut first_max: Option<usize> = None;
    for (i, sg) in owned.iter().enumerate() {
        if sg.constraint.is_min_class() {
            match first_min {
                Some(j) => union(&mut parent, j, i),
                None => first_min = Some(i),
            }
        }
        if sg.constraint.is_max_class() {
            match first_max {
                Some(j) => union(&mut parent, j, i),
                None => first_max = Some(i),
            }
        }
    }

    let mut by_root: FxHashMap<usize, Vec<usize>> = FxHashMap::default();
    for i in 0..owned.len() {
        let root = find(&mut parent, i);
        by_root.entry(root).or_default().push(i);
    }

    let mut groups: Vec<Vec<usize>> = by_root.into_values().collect();
    groups.sort_by_key(|members| members[0]);

    let mut out: Vec<MergedGroup> = Vec::new();
    for group_members in groups {
        let mut is_min = false;
        let mut is_max = false;
        let mut strict = false;
        for &i in &group_members {
            is_min |= owned[i].constraint.is_min_class();
            is_max |= owned[i].constraint.is_max_class();
            strict |= matches!(
                owned[i].constraint,
                crate::model::RankConstraint::Source | crate::model::RankConstraint::Sink
            );
        }
        if is_min && is_max {
            let first = group_members
                .iter()
                .find(|&&i| owned[i].constraint.is_min_class())
                .expect("a min-class member exists");
            let second = group_members
                .iter()
                .find(|&&i| owned[i].constraint.is_max_class())
                .expect("a max-class member exists");
            return Err(LayoutError::OppositeRankConstraint {
                first: owned[*first].name.clone(),
                second: owned[*second].name.clone(),
            });
        }

        let mut members: Vec<NodeId> = Vec::new();
        for &i in &group_members {
            for &v in &owned[i].nodes {
                if g.node(v).kind != NodeKind::Cluster && !members.contains(&v) {
                    members.push(v);
                }
            }
        }
        if members.is_empty() {
            continue;
        }
        out.push(MergedGroup {
            members,
            constraint_is_min: is_min,
            constraint_is_max: is_max,
            strict,
        });
    }
    Ok(out)
}

fn merge_parallel_aux_edges(aux: &mut LayoutGraph) {
    let mut first: FxHashMap<(NodeId, NodeId), beluga_digraph::EdgeId> = FxHashMap::default();
    let all: Vec<_> = aux.edge_ids().collect();
    for e in all {
        let key = aux.endpoints(e);
        match first.get(&key) {
            Some(&keep) => {
                let (weight, minlen) = {
                    let label = aux.edge(e);
                    (label.weight, label.minlen)
                };
                aux.remove_edge(e);
                let kept = aux.edge_mut(keep);
                kept.weight += weight;
                kept.minlen = kept.minlen.max(minlen);
                kept.merged += 1;
            }
            None => {
                first.insert(key, e);
            }
        }
    }
}

/// Ties min-class proxies below every other source of the DAG (and
/// max-class proxies above every other sink) so the extreme constraint
/// holds globally. `Min`/`Max` allow rank sharing (minlen 0), strict
/// `Source`/`Sink` do not.
fn add_extreme_ties(aux: &mut LayoutGraph, group_proxies: &[(NodeId, &MergedGroup)]) {
    let min_proxies: Vec<(NodeId, bool)> = group_proxies
        .iter()
        .filter(|(_, gr)| gr.constraint_is_min)
        .map(|&(p, gr)| (p, gr.strict))
        .collect();
    let max_proxies: Vec<(NodeId, bool)> = group_proxies
        .iter()
        .filter(|(_, gr)| gr.constraint_is_max)
        .map(|&(p, gr)| (p, gr.strict))
        .collect();
    if min_proxies.is_empty() && max_proxies.is_empty() {
        return;
    }

    let sources: Vec<NodeId> = aux.node_ids().filter(|&v| aux.in_degree(v) == 0).collect();
    let sinks: Vec<NodeId> = aux.node_ids().filter(|&v| aux.out_degree(v) == 0).collect();

    for &(p, strict) in &min_proxies {
        for &s in &sources {
            if s == p || min_proxies.iter().any(|&(q, _)| q == s) {
                continue;
            }
            aux.add_edge(
                p,
                s,
                EdgeLabel {
                    weight: 0.0,
                    minlen: if strict { 1 } else { 0 },
                    ..Default::default()
                },
            );
        }
    }
    for &(p, strict) in &max_proxies {
        for &s in &sinks {
            if s == p || max_proxies.iter().any(|&(q, _)| q == s) {
                continue;
            }
            aux.add_edge(
                s,
                p,
                EdgeLabel {
                    weight: 0.0,
                    minlen: if strict { 1 } else { 0 },
                    ..Default::default()
                },
            );
        }
    }
}

/// Expands proxies back into member ranks. Parent ranks strictly below a
/// cluster proxy shift down by the cluster's span so the expansion never
/// lands siblings inside the cluster's range.
fn expand(
    g: &LayoutGraph,
    aux: &LayoutGraph,
    rep_of_direct: &FxHashMap<NodeId, NodeId>,
    leaves: &[NodeId],
    cluster_solutions: &[(NodeId, LocalRanking)],
    cluster_proxies: &[(NodeId, NodeId)],
    group_proxies: &[(NodeId, &MergedGroup)],
) -> LocalRanking {
    let aux_rank = |p: NodeId| aux.node(p).rank.unwrap_or(0);

    let mut span_at: FxHashMap<i32, i32> = FxHashMap::default();
    for (c, local) in cluster_solutions {
        let proxy = cluster_proxies
            .iter()
            .find(|(cc, _)| cc == c)
            .map(|&(_, p)| p)
            .expect("every collapsed cluster has a proxy");
        let r = aux_rank(proxy);
        let entry = span_at.entry(r).or_insert(0);
        *entry = (*entry).max(local.span);
    }

    let mut shift_points: Vec<(i32, i32)> = span_at.into_iter().collect();
    shift_points.sort_by_key(|&(r, _)| r);
    let shifted = |r: i32| -> i32 {
        let mut shift = 0;
        for &(pr, span) in &shift_points {
            if pr < r {
                shift += span;
            }
        }
        r + shift
    };

    let mut members: Vec<(NodeId, i32)> = Vec::new();
    let mut placed = vec![false; g.node_bound()];

    for &(proxy, group) in group_proxies {
        let rank = shifted(aux_rank(proxy));
        for &v in &group.members {
            members.push((v, rank));
            placed[v.index()] = true;
        }
    }
    for &v in leaves {
        if placed[v.index()] {
            continue;
        }
        let Some(&rep) = rep_of_direct.get(&v) else {
            continue;
        };
        members.push((v, shifted(aux_rank(rep))));
        placed[v.index()] = true;
    }
    for (c, local) in cluster_solutions {
        let proxy = cluster_proxies
            .iter()
            .find(|(cc, _)| cc == c)
            .map(|&(_, p)| p)
            .expect("every collapsed cluster has a proxy");
        let base = shifted(aux_rank(proxy));
        for &(v, local_rank) in &local.members {
            members.push((v, base + local_rank));
        }
    }

    let span = members.iter().map(|&(_, r)| r).max().unwrap_or(0);
    LocalRanking { members, span }
}
