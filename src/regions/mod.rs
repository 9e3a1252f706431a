//! Idempotent regions of a function.
//!
//! A region is defined by a single entry instruction and spans every instruction reachable
//! by control flow from that entry up to the next region entries. Regions are not a tree:
//! an instruction reached from two different nearest entries along divergent paths belongs
//! to both, so membership is reported as a set of [`RegionId`]s.
//!
//! [`RegionModel`] also provides the region-scoped forward walks the shadow tracker needs:
//! [`RegionModel::successor_slots`] and [`RegionModel::region_slots_until`].

mod model;
mod walk;

pub use model::{Region, RegionId, RegionModel};
