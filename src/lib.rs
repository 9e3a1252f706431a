// Copyright 2025 Johann Kempter
//
// Licensed under the Apache License, Version 2.0 (the "License");
// you may not use this file except in compliance with the License.
// You may obtain a copy of the License at
//
//     http://www.apache.org/licenses/LICENSE-2.0
//
// Unless required by applicable law or agreed to in writing, software
// distributed under the License is distributed on an "AS IS" BASIS,
// WITHOUT WARRANTIES OR CONDITIONS OF ANY KIND, either express or implied.
// See the License for the specific language governing permissions and
// limitations under the License.
//
// SPDX-License-Identifier: Apache-2.0

#![doc(html_no_source)]
#![deny(missing_docs)]
#![allow(dead_code)]

//! # idemregions
//!
//! Idempotent region construction and shadow-interval safety analysis for compiled programs.
//!
//! An idempotent region is a range of instructions that can be re-executed from its start
//! after an interruption (a transient fault, a mis-speculation) and still produce the same
//! architectural state as a single execution. This crate answers the two questions a compiler
//! needs for that guarantee:
//!
//! 1. **Where must regions be cut?** Memory anti-dependences (a load followed by a store to a
//!    location it may read) break idempotence. The boundary pipeline finds every such pair,
//!    enumerates the stores lying between load and store, and greedily selects a small set of
//!    cut points that hits every enumerated path.
//! 2. **May two storage locations be merged?** Once regions exist, a register or stack slot
//!    that is live into a region must stay intact until every re-execution path has read it.
//!    That range is its *shadow*. The shadow tracker computes shadows with interval algebra and
//!    answers coalescing-safety queries for a register allocator.
//!
//! # Architecture
//!
//! ```text
//! Function ─► AntiDependencyFinder ─► PathEnumerator ─► HittingSetSolver ─► BoundarySet
//!                                                                              │
//!             LiveIntervals ──────────────► ShadowIntervalTracker ◄── RegionModel
//! ```
//!
//! - [`ir`] - The instruction graph: storage locations, instructions, blocks, slot indexes
//! - [`analysis`] - Alias oracles, anti-dependence search, path enumeration, hitting sets
//! - [`regions`] - Region partitioning and region-scoped forward walks
//! - [`live`] - Interval sets, live intervals and liveness computation
//! - [`shadow`] - Shadow intervals, clobber predicates and coalescing safety
//! - [`utils`] - Bit sets and graph primitives (dominators, traversal)
//!
//! # Quick Start
//!
//! ```rust
//! use idemregions::prelude::*;
//!
//! let mut builder = FunctionBuilder::new("copy_loop");
//! let entry = builder.block("entry");
//! let body = builder.block("body");
//! let exit = builder.block("exit");
//!
//! builder.switch_to(entry);
//! let load = builder.load(Address::object(0, 0), 4);
//! builder.branch(&[]);
//! builder.switch_to(body);
//! builder.arith("add", &[], &[]);
//! let store = builder.store(Address::object(0, 0), 4);
//! builder.branch(&[]);
//! builder.switch_to(exit);
//! builder.ret(&[]);
//!
//! builder.edge(entry, body);
//! builder.edge(body, exit);
//! let function = builder.finish()?;
//!
//! let boundaries = compute_boundaries(&function, &BasicAliasOracle);
//! assert!(boundaries.contains(store));
//! assert!(!boundaries.contains(load));
//! # Ok::<(), idemregions::Error>(())
//! ```
//!
//! # Shadow queries
//!
//! ```rust
//! use idemregions::prelude::*;
//!
//! let mut builder = FunctionBuilder::new("f");
//! let a = builder.vreg("a");
//! let b = builder.vreg("b");
//! let entry = builder.block("entry");
//! builder.switch_to(entry);
//! builder.arith("li", &[a], &[]);
//! builder.boundary();
//! builder.arith("use", &[], &[a]);
//! builder.arith("li", &[b], &[]);
//! builder.ret(&[b]);
//! let function = builder.finish()?;
//!
//! let regions = RegionModel::from_markers(&function);
//! let live = LiveIntervals::compute(&function);
//! let mut tracker = ShadowIntervalTracker::new(&regions, &live, AnalysisConfig::default());
//! // `b` is written while a restart of the second region would still read `a`.
//! assert!(!tracker.is_register_coalescing_safe(a, b)?);
//! # Ok::<(), idemregions::Error>(())
//! ```
//!
//! # Error Handling
//!
//! All fallible operations return [`Result`]. Graph construction rejects malformed input with
//! [`Error::Malformed`]; shadow queries fail with [`Error::ShadowVerification`] only when
//! verification is enabled and a region is provably not idempotent.

#[macro_use]
pub(crate) mod macros;

#[macro_use]
pub(crate) mod error;

#[cfg(test)]
pub(crate) mod test;

/// Convenient re-exports of the most commonly used types.
///
/// ```rust
/// use idemregions::prelude::*;
///
/// let config = AnalysisConfig::verifying();
/// assert!(config.verify);
/// ```
pub mod prelude;

/// Instruction graph data model.
///
/// Functions own their blocks, instructions and storage locations. Instructions are numbered
/// into program points by [`ir::SlotIndexes`] so that live ranges and shadows can be expressed
/// as half-open intervals.
pub mod ir;

/// Boundary selection: alias queries, anti-dependence pairs, paths and hitting sets.
pub mod analysis;

/// Region partitioning of a function by its boundary instructions.
pub mod regions;

/// Live ranges of storage locations over program points.
pub mod live;

/// Shadow intervals and coalescing safety.
pub mod shadow;

/// Supporting data structures and graph algorithms.
pub mod utils;

mod config;

/// The result type used throughout the crate.
pub type Result<T> = std::result::Result<T, Error>;

pub use config::{AnalysisConfig, ControlFlowPolicy};
pub use error::Error;

pub use analysis::{
    analyze_functions, compute_boundaries, AliasOracle, AliasResult, AntiDependencePair,
    AntiDependencePath, BasicAliasOracle, BoundarySet, ConservativeAliasOracle,
    IdempotenceAnalysis,
};
pub use ir::{Function, FunctionBuilder, InstId, ProgramPoint, StorageId};
pub use regions::{Region, RegionId, RegionModel};
pub use shadow::{ShadowInterval, ShadowIntervalTracker};
