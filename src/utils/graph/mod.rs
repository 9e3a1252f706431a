//! Directed graph primitives used for control-flow analysis.
//!
//! The algorithms in [`algorithms`] are written against the small trait set in this module
//! rather than a concrete graph, so they run on the block graph of an
//! [`ir::Function`](crate::ir::Function) and on ad-hoc test graphs alike.
//!
//! - [`GraphBase`] - node count and node iteration
//! - [`Successors`] / [`Predecessors`] - adjacency in either direction
//! - [`RootedGraph`] - graphs with a designated entry node

mod directed;
mod traits;

pub mod algorithms;

pub use directed::DirectedGraph;
pub use traits::{GraphBase, Predecessors, RootedGraph, Successors};

define_index!(
    /// Identifies a node of a [`DirectedGraph`].
    ///
    /// Node ids are handed out sequentially by [`DirectedGraph::add_node`] and double as
    /// basic-block ids in [`ir`](crate::ir).
    NodeId,
    "n"
);
