//! Graph container APIs used by `beluga`.
//!
//! The container is an arena: nodes and edges live in slot vectors and are
//! addressed by stable integer handles. Removal tombstones a slot instead of
//! shifting its neighbors, so handles held by layout phases stay valid for
//! the lifetime of the graph. Adjacency and container membership are index
//! lookups into side tables kept on the slots themselves.

mod graph;

pub use graph::{Digraph, EdgeId, NodeId};
