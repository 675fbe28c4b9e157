use rustc_hash::FxBuildHasher;

type HashSet<T> = hashbrown::HashSet<T, FxBuildHasher>;

/// Stable handle for a node slot. Handles survive removal of other nodes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct NodeId(u32);

impl NodeId {
    pub fn index(self) -> usize {
        self.0 as usize
    }

    /// Rebuilds a handle from an index previously obtained via
    /// [`NodeId::index`]. Useful for dense side tables keyed by index.
    pub fn from_index(index: usize) -> Self {
        NodeId(index as u32)
    }

    pub fn as_u32(self) -> u32 {
        self.0
    }
}

/// Stable handle for an edge slot.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct EdgeId(u32);

impl EdgeId {
    pub fn index(self) -> usize {
        self.0 as usize
    }
}

#[derive(Debug, Clone)]
struct NodeSlot<N> {
    label: N,
    alive: bool,
    out: Vec<EdgeId>,
    inc: Vec<EdgeId>,
    parent: Option<NodeId>,
    children: Vec<NodeId>,
}

#[derive(Debug, Clone)]
struct EdgeSlot<E> {
    label: E,
    alive: bool,
    tail: NodeId,
    head: NodeId,
}

/// A directed multigraph arena with optional container (parent/child)
/// structure over its nodes.
///
/// Adjacency lists only ever hold live edges: removing an edge detaches it
/// from both endpoint lists, so `out_edges`/`in_edges` can hand out slices
/// without filtering. Labels of tombstoned slots stay readable, which lets
/// callers keep a handle across a remove/re-derive cycle.
#[derive(Debug, Clone, Default)]
pub struct Digraph<N, E> {
    nodes: Vec<NodeSlot<N>>,
    edges: Vec<EdgeSlot<E>>,
    node_count: usize,
    edge_count: usize,
}

impl<N, E> Digraph<N, E> {
    pub fn new() -> Self {
        Self {
            nodes: Vec::new(),
            edges: Vec::new(),
            node_count: 0,
            edge_count: 0,
        }
    }

    pub fn with_capacity(nodes: usize, edges: usize) -> Self {
        Self {
            nodes: Vec::with_capacity(nodes),
            edges: Vec::with_capacity(edges),
            node_count: 0,
            edge_count: 0,
        }
    }

    pub fn node_count(&self) -> usize {
        self.node_count
    }

    pub fn edge_count(&self) -> usize {
        self.edge_count
    }

    /// Exclusive upper bound on `NodeId::index` values, for sizing side tables.
    pub fn node_bound(&self) -> usize {
        self.nodes.len()
    }

    /// Exclusive upper bound on `EdgeId::index` values, for sizing side tables.
    pub fn edge_bound(&self) -> usize {
        self.edges.len()
    }

    pub fn add_node(&mut self, label: N) -> NodeId {
        let id = NodeId(self.nodes.len() as u32);
        self.nodes.push(NodeSlot {
            label,
            alive: true,
            out: Vec::new(),
            inc: Vec::new(),
            parent: None,
            children: Vec::new(),
        });
        self.node_count += 1;
        id
    }

    pub fn add_edge(&mut self, tail: NodeId, head: NodeId, label: E) -> EdgeId {
        debug_assert!(self.contains_node(tail) && self.contains_node(head));
        let id = EdgeId(self.edges.len() as u32);
        self.edges.push(EdgeSlot {
            label,
            alive: true,
            tail,
            head,
        });
        self.nodes[tail.index()].out.push(id);
        self.nodes[head.index()].inc.push(id);
        self.edge_count += 1;
        id
    }

    pub fn contains_node(&self, v: NodeId) -> bool {
        self.nodes.get(v.index()).is_some_and(|slot| slot.alive)
    }

    pub fn contains_edge(&self, e: EdgeId) -> bool {
        self.edges.get(e.index()).is_some_and(|slot| slot.alive)
    }

    pub fn node(&self, v: NodeId) -> &N {
        &self.nodes[v.index()].label
    }

    pub fn node_mut(&mut self, v: NodeId) -> &mut N {
        &mut self.nodes[v.index()].label
    }

    pub fn edge(&self, e: EdgeId) -> &E {
        &self.edges[e.index()].label
    }

    pub fn edge_mut(&mut self, e: EdgeId) -> &mut E {
        &mut self.edges[e.index()].label
    }

    pub fn tail(&self, e: EdgeId) -> NodeId {
        self.edges[e.index()].tail
    }

    pub fn head(&self, e: EdgeId) -> NodeId {
        self.edges[e.index()].head
    }

    pub fn endpoints(&self, e: EdgeId) -> (NodeId, NodeId) {
        let slot = &self.edges[e.index()];
        (slot.tail, slot.head)
    }

    /// The endpoint of `e` that is not `v`. For a self loop this is `v`.
    pub fn other_endpoint(&self, e: EdgeId, v: NodeId) -> NodeId {
        let (tail, head) = self.endpoints(e);
        if tail == v { head } else { tail }
    }

    pub fn node_ids(&self) -> impl Iterator<Item = NodeId> + '_ {
        self.nodes
            .iter()
            .enumerate()
            .filter(|(_, slot)| slot.alive)
            .map(|(ix, _)| NodeId(ix as u32))
    }

    pub fn edge_ids(&self) -> impl Iterator<Item = EdgeId> + '_ {
        self.edges
            .iter()
            .enumerate()
            .filter(|(_, slot)| slot.alive)
            .map(|(ix, _)| EdgeId(ix as u32))
    }

    /// Live out-edges of `v`, in insertion order.
    pub fn out_edges(&self, v: NodeId) -> &[EdgeId] {
        &self.nodes[v.index()].out
    }

    /// Live in-edges of `v`, in insertion order.
    pub fn in_edges(&self, v: NodeId) -> &[EdgeId] {
        &self.nodes[v.index()].inc
    }

    pub fn out_degree(&self, v: NodeId) -> usize {
        self.nodes[v.index()].out.len()
    }

    pub fn in_degree(&self, v: NodeId) -> usize {
        self.nodes[v.index()].inc.len()
    }

    pub fn degree(&self, v: NodeId) -> usize {
        self.out_degree(v) + self.in_degree(v)
    }

    /// First live edge `tail -> head`, if any.
    pub fn find_edge(&self, tail: NodeId, head: NodeId) -> Option<EdgeId> {
        self.nodes[tail.index()]
            .out
            .iter()
            .copied()
            .find(|&e| self.edges[e.index()].head == head)
    }

    pub fn successors(&self, v: NodeId) -> impl Iterator<Item = NodeId> + '_ {
        self.nodes[v.index()]
            .out
            .iter()
            .map(|&e| self.edges[e.index()].head)
    }

    pub fn predecessors(&self, v: NodeId) -> impl Iterator<Item = NodeId> + '_ {
        self.nodes[v.index()]
            .inc
            .iter()
            .map(|&e| self.edges[e.index()].tail)
    }

    /// Swaps the endpoints of `e` in place. The handle and the label are
    /// preserved; only the adjacency lists move.
    pub fn reverse_edge(&mut self, e: EdgeId) {
        debug_assert!(self.contains_edge(e));
        let (tail, head) = self.endpoints(e);
        self.nodes[tail.index()].out.retain(|&x| x != e);
        self.nodes[head.index()].inc.retain(|&x| x != e);
        let slot = &mut self.edges[e.index()];
        slot.tail = head;
        slot.head = tail;
        self.nodes[head.index()].out.push(e);
        self.nodes[tail.index()].inc.push(e);
    }

    /// Tombstones `e` and detaches it from both endpoints. The slot's label
    /// remains readable through the handle.
    pub fn remove_edge(&mut self, e: EdgeId) {
        if !self.contains_edge(e) {
            return;
        }
        let (tail, head) = self.endpoints(e);
        self.nodes[tail.index()].out.retain(|&x| x != e);
        self.nodes[head.index()].inc.retain(|&x| x != e);
        self.edges[e.index()].alive = false;
        self.edge_count -= 1;
    }

    /// Tombstones `v`, removes its incident edges, and reparents its
    /// children to `v`'s own parent.
    pub fn remove_node(&mut self, v: NodeId) {
        if !self.contains_node(v) {
            return;
        }
        let incident: Vec<EdgeId> = self.nodes[v.index()]
            .out
            .iter()
            .chain(self.nodes[v.index()].inc.iter())
            .copied()
            .collect();
        for e in incident {
            self.remove_edge(e);
        }

        let parent = self.nodes[v.index()].parent;
        if let Some(p) = parent {
            self.nodes[p.index()].children.retain(|&c| c != v);
        }
        let children = std::mem::take(&mut self.nodes[v.index()].children);
        for c in &children {
            self.nodes[c.index()].parent = parent;
        }
        if let Some(p) = parent {
            self.nodes[p.index()].children.extend(children);
        }

        self.nodes[v.index()].alive = false;
        self.nodes[v.index()].parent = None;
        self.node_count -= 1;
    }

    pub fn parent(&self, v: NodeId) -> Option<NodeId> {
        self.nodes[v.index()].parent
    }

    pub fn children(&self, v: NodeId) -> &[NodeId] {
        &self.nodes[v.index()].children
    }

    pub fn has_children(&self, v: NodeId) -> bool {
        !self.nodes[v.index()].children.is_empty()
    }

    /// Makes `parent` the container of `child`. Containment is strictly a
    /// tree; introducing a cycle is a caller bug and panics.
    pub fn set_parent(&mut self, child: NodeId, parent: NodeId) {
        debug_assert!(self.contains_node(child) && self.contains_node(parent));
        let mut cursor = Some(parent);
        while let Some(v) = cursor {
            assert!(v != child, "container containment must form a tree");
            cursor = self.nodes[v.index()].parent;
        }

        self.clear_parent(child);
        self.nodes[child.index()].parent = Some(parent);
        self.nodes[parent.index()].children.push(child);
    }

    pub fn clear_parent(&mut self, child: NodeId) {
        if let Some(old) = self.nodes[child.index()].parent.take() {
            self.nodes[old.index()].children.retain(|&c| c != child);
        }
    }

    /// Live nodes with no container, in insertion order.
    pub fn roots(&self) -> impl Iterator<Item = NodeId> + '_ {
        self.node_ids().filter(|&v| self.parent(v).is_none())
    }

    /// Deepest container holding both `a` and `b`, or `None` when their only
    /// common container is the root graph itself.
    pub fn lowest_common_container(&self, a: NodeId, b: NodeId) -> Option<NodeId> {
        let mut ancestors: HashSet<NodeId> = HashSet::default();
        let mut cursor = self.parent(a);
        while let Some(v) = cursor {
            ancestors.insert(v);
            cursor = self.parent(v);
        }
        let mut cursor = self.parent(b);
        while let Some(v) = cursor {
            if ancestors.contains(&v) {
                return Some(v);
            }
            cursor = self.parent(v);
        }
        None
    }

    /// Whether `ancestor` contains `v` (transitively). A node does not
    /// contain itself.
    pub fn is_inside(&self, v: NodeId, ancestor: NodeId) -> bool {
        let mut cursor = self.parent(v);
        while let Some(p) = cursor {
            if p == ancestor {
                return true;
            }
            cursor = self.parent(p);
        }
        false
    }
}
