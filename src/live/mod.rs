//! Live ranges of storage locations.
//!
//! Ranges are half-open intervals of [`ProgramPoint`](crate::ir::ProgramPoint)s kept in an
//! [`IntervalSet`]. The shadow tracker consumes live ranges through [`LiveRangeOracle`], so
//! callers with their own liveness information can plug it in; [`LiveIntervals`] computes
//! them from a function when nothing else is available.

mod interval;
mod liveness;

pub use interval::{IntervalSet, LiveInterval, LiveRangeOracle};
pub use liveness::LiveIntervals;
