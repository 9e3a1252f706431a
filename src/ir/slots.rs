//! Program point numbering.
//!
//! Every instruction owns two consecutive program points in layout order: its *use point*,
//! where operands are read, and its *def point*, where results are written. Instruction `k`
//! in layout order has use point `2k` and def point `2k + 1`. A block spans the half-open
//! range from the use point of its first instruction to the use point that would follow its
//! last instruction, so consecutive blocks tile the function without gaps.
//!
//! Live ranges and shadows are sets of half-open program point ranges. A value defined by
//! instruction `d` and last read by instruction `u` is live over `[def(d), use(u) + 1)`: it
//! is readable at `u` and free to be overwritten by a def at `u`.

use std::ops::Range;

use crate::ir::{BlockId, InstId};

define_index!(
    /// A position in the linear program order of a function.
    ProgramPoint,
    "@"
);

impl ProgramPoint {
    /// The point `by` positions later.
    #[must_use]
    pub const fn advance(self, by: usize) -> Self {
        ProgramPoint::new(self.index() + by)
    }

    /// `true` for use points, `false` for def points.
    #[must_use]
    pub const fn is_use_point(self) -> bool {
        self.index() % 2 == 0
    }
}

/// Layout numbering of a function's instructions.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SlotIndexes {
    /// Instructions in layout order.
    layout: Vec<InstId>,
    /// Layout index of each instruction, indexed by id.
    position: Vec<usize>,
    /// Point range of each block, indexed by block id.
    blocks: Vec<Range<ProgramPoint>>,
}

impl SlotIndexes {
    /// Numbers the instructions of `blocks`, each given as its instruction list in order.
    pub(crate) fn new(blocks: &[&[InstId]], instruction_count: usize) -> Self {
        let mut layout = Vec::with_capacity(instruction_count);
        let mut position = vec![0; instruction_count];
        let mut ranges = Vec::with_capacity(blocks.len());

        for insts in blocks {
            let start = ProgramPoint::new(layout.len() * 2);
            for &inst in *insts {
                position[inst.index()] = layout.len();
                layout.push(inst);
            }
            ranges.push(start..ProgramPoint::new(layout.len() * 2));
        }

        SlotIndexes {
            layout,
            position,
            blocks: ranges,
        }
    }

    /// Layout index of `inst`.
    #[must_use]
    pub fn layout_index(&self, inst: InstId) -> usize {
        self.position[inst.index()]
    }

    /// The point at which `inst` reads its operands.
    #[must_use]
    pub fn use_point(&self, inst: InstId) -> ProgramPoint {
        ProgramPoint::new(self.layout_index(inst) * 2)
    }

    /// The point at which `inst` writes its results.
    #[must_use]
    pub fn def_point(&self, inst: InstId) -> ProgramPoint {
        ProgramPoint::new(self.layout_index(inst) * 2 + 1)
    }

    /// The points covered by `block`.
    #[must_use]
    pub fn block_range(&self, block: BlockId) -> Range<ProgramPoint> {
        self.blocks[block.index()].clone()
    }

    /// The instruction owning `point`, if any.
    #[must_use]
    pub fn instruction_at(&self, point: ProgramPoint) -> Option<InstId> {
        self.layout.get(point.index() / 2).copied()
    }

    /// Instructions in layout order.
    #[must_use]
    pub fn layout(&self) -> &[InstId] {
        &self.layout
    }

    /// One past the last point of the function.
    #[must_use]
    pub fn end(&self) -> ProgramPoint {
        ProgramPoint::new(self.layout.len() * 2)
    }
}
