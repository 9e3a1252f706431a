//! Shadow intervals and coalescing safety.
//!
//! Re-executing a region re-reads every value live into it. The storage holding such a value
//! must therefore keep it intact, not only while the value is live, but also from its reads
//! inside the region up to the region's exits: a fault anywhere in between restarts the
//! region, which reads the value again. That additional range is the value's *shadow*.
//!
//! A register allocator may merge two storage locations only if neither one's definitions
//! land in the other's shadow. [`ShadowIntervalTracker`] computes shadows lazily and answers
//! those queries.
//!
//! # Policies
//!
//! Under [`ControlFlowPolicy::InvariableControlFlow`](crate::ControlFlowPolicy) re-execution
//! takes the same path, so a shadow stems from each read of the value inside the region that
//! no redefinition precedes. Under
//! [`ControlFlowPolicy::VariableControlFlow`](crate::ControlFlowPolicy) any path might be
//! taken and the shadow stems from the region entry.

mod ignore;
mod interval;
mod range;
mod tracker;

pub use ignore::{IgnoreQuery, NeverIgnore};
pub use interval::ShadowInterval;
pub use range::non_overlapping_sub_range;
pub use tracker::ShadowIntervalTracker;
