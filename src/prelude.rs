//! # idemregions Prelude
//!
//! This module provides a convenient prelude for the most commonly used types and traits
//! from the idemregions library. Import this module to get quick access to everything needed
//! to build a function, select region boundaries and query shadow intervals.

// ================================================================================================
// Core Types and Error Handling
// ================================================================================================

/// The main error type for all idemregions operations
pub use crate::Error;

/// The result type used throughout idemregions
pub use crate::Result;

/// Configuration shared by the boundary pipeline, the driver and the shadow tracker
pub use crate::{AnalysisConfig, ControlFlowPolicy};

// ================================================================================================
// Instruction Graph
// ================================================================================================

/// Function construction and the instruction graph
pub use crate::ir::{
    Address, BasicBlock, BlockId, Function, FunctionBuilder, InstFlags, InstId, Instruction,
    InstructionData, MemoryLocation, OpcodeClass, ProgramPoint, StorageFlags, StorageId,
    StorageKind,
};

// ================================================================================================
// Boundary Selection
// ================================================================================================

/// Alias oracles
pub use crate::analysis::{AliasOracle, AliasResult, BasicAliasOracle, ConservativeAliasOracle};

/// Anti-dependence discovery, path enumeration and hitting sets
pub use crate::analysis::{
    AntiDependencePair, AntiDependencePath, AntiDependencyFinder, HittingSetSolver,
    PathEnumerator,
};

/// Pipeline entry points and results
pub use crate::analysis::{analyze_functions, compute_boundaries, BoundarySet, IdempotenceAnalysis};

// ================================================================================================
// Regions, Liveness and Shadows
// ================================================================================================

/// Region partitioning
pub use crate::regions::{Region, RegionId, RegionModel};

/// Live ranges
pub use crate::live::{IntervalSet, LiveInterval, LiveIntervals, LiveRangeOracle};

/// Shadow intervals and coalescing safety
pub use crate::shadow::{IgnoreQuery, ShadowInterval, ShadowIntervalTracker};
