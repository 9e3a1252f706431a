//! Supporting data structures and graph algorithms.
//!
//! - [`BitSet`] - compact sets over small indices
//! - [`graph`] - directed graphs, traversal orders and dominator trees

mod bitset;
pub mod graph;

pub use bitset::BitSet;
