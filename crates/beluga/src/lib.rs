//! Layered (Sugiyama-style) layout for directed graphs.
//!
//! Given nodes with sizes and directed edges, possibly nested inside
//! clusters and constrained subgraphs, the pipeline assigns every node an
//! integer rank, an order within its rank, and final coordinates,
//! minimizing edge crossings and weighted edge length under minimum-length
//! and containment constraints.
//!
//! The phases, in dependency order:
//!
//! - [`collapse`]: flattens nested clusters/subgraphs into proxy nodes so
//!   ranking sees a simple DAG, then expands the results back.
//! - [`rank`]: network simplex rank assignment over a feasible spanning
//!   tree.
//! - [`normalize`] + [`order`]: virtual-node insertion for long and labeled
//!   edges, then median/transpose crossing minimization.
//! - [`coordinate`]: three interchangeable cross-axis strategies.
//!
//! [`pipeline::layout`] runs the whole thing; the phases are public for
//! callers that need only a slice of it.

pub use beluga_digraph as digraph;

pub const VERSION: &str = env!("CARGO_PKG_VERSION");

pub mod acyclic;
pub mod collapse;
pub mod coordinate;
pub mod error;
pub mod model;
pub mod normalize;
pub mod order;
pub mod pipeline;
pub mod rank;
pub mod ranks;
pub mod self_loops;
pub mod snapshot;

pub use error::{LayoutError, Result};
pub use model::{
    CoordinateStrategy, EdgeLabel, LabelSize, LayoutGraph, LayoutOptions, NodeKind, NodeLabel,
    RankConstraint, RankView, SelfLoop, Subgraph,
};
pub use normalize::EdgeChain;
pub use pipeline::{Layout, layout};
pub use ranks::{RankBucket, Ranks};
