//! Graph algorithms for control-flow analysis.
//!
//! - [`postorder`], [`reverse_postorder`], [`reachable`] - depth-first orderings
//! - [`compute_dominators`] - dominator tree of a rooted graph
//!
//! | Algorithm | Time Complexity |
//! |-----------|-----------------|
//! | Orderings | O(V + E) |
//! | Dominators | O(V + E) per round, few rounds on reducible graphs |

mod dominators;
mod traversal;

pub use dominators::{compute_dominators, compute_dominators_rooted, DominatorTree};
pub use traversal::{postorder, reachable, reverse_postorder};
