//! Boundary selection for idempotent regions.
//!
//! A region is idempotent when re-executing it from its entry observes the same inputs as
//! the first execution. Memory breaks that when a region reads a location and later
//! overwrites it, so every such anti-dependence must be separated by a region boundary.
//!
//! # Architecture
//!
//! - [`alias`] - Alias oracles answering whether two accesses may touch the same bytes
//! - [`antidep`] - Backward search from each store to the loads it may overwrite
//! - [`paths`] - The candidate cut points (stores) between each load and store
//! - [`hitting`] - Greedy hitting-set selection over those paths
//! - [`boundaries`] - The per-function pipeline and its result
//! - [`driver`] - The same pipeline over many functions on the rayon pool
//!
//! # Usage
//!
//! ```rust
//! use idemregions::analysis::{compute_boundaries, BasicAliasOracle};
//! use idemregions::ir::{Address, FunctionBuilder};
//!
//! let mut b = FunctionBuilder::new("inc");
//! let entry = b.block("entry");
//! b.switch_to(entry);
//! b.load(Address::object(0, 0), 8);
//! let store = b.store(Address::object(0, 0), 8);
//! b.ret(&[]);
//! let function = b.finish()?;
//!
//! let boundaries = compute_boundaries(&function, &BasicAliasOracle);
//! assert_eq!(boundaries.iter().collect::<Vec<_>>(), vec![store]);
//! # Ok::<(), idemregions::Error>(())
//! ```

pub mod alias;
pub mod antidep;
pub mod boundaries;
pub mod driver;
pub mod hitting;
pub mod paths;

pub use alias::{AliasOracle, AliasResult, BasicAliasOracle, ConservativeAliasOracle};
pub use antidep::{AntiDependencePair, AntiDependencyFinder};
pub use boundaries::{compute_boundaries, BoundaryReport, BoundarySet, IdempotenceAnalysis};
pub use driver::analyze_functions;
pub use hitting::{pairwise_vertex_cover, HittingSet, HittingSetSolver, SelectionStep};
pub use paths::{AntiDependencePath, PathEnumerator};
