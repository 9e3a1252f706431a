//! Forward walks that stay inside a region.
//!
//! Both walks are depth-first over blocks with a visited set and produce program point
//! ranges. A region entry met along the way is a hard stop: the walk covers points up to,
//! but not including, that entry's use point and does not continue into successors.

use crate::{
    ir::{BlockId, Instruction, InstId, ProgramPoint},
    live::IntervalSet,
    regions::{Region, RegionModel},
    utils::{graph::Successors, BitSet},
};

/// One pending block of a forward walk.
struct WalkItem {
    block: BlockId,
    /// Position of the first instruction to examine.
    from: usize,
    /// Where the range produced for this block starts.
    start: ProgramPoint,
}

impl RegionModel<'_> {
    /// The program points reachable forward from the def point of `inst` before control
    /// reaches a region entry.
    ///
    /// The block of `inst` may be re-entered around a cycle, in which case it is scanned from
    /// its first instruction.
    #[must_use]
    pub fn successor_slots(&self, inst: InstId) -> IntervalSet {
        let function = self.function;
        let slots = function.slots();
        let mut out = IntervalSet::new();
        let Some(stem) = function.instruction(inst) else {
            return out;
        };

        let mut visited = BitSet::new(function.block_count());
        let mut worklist = vec![WalkItem {
            block: stem.block(),
            from: stem.position() + 1,
            start: slots.def_point(inst),
        }];

        while let Some(item) = worklist.pop() {
            let instructions = function.block(item.block).map_or(&[][..], |b| b.instructions());
            let exit = instructions
                .iter()
                .skip(item.from)
                .find(|&&i| self.is_region_entry(i));

            if let Some(&boundary) = exit {
                out.union(item.start..slots.use_point(boundary));
                continue;
            }

            out.union(item.start..slots.block_range(item.block).end);
            for succ in function.successors(item.block) {
                if visited.insert(succ.index()) {
                    worklist.push(WalkItem {
                        block: succ,
                        from: 0,
                        start: slots.block_range(succ).start,
                    });
                }
            }
        }
        out
    }

    /// The program points of `region` from its entry up to the first instruction matching
    /// `stop` along each path.
    ///
    /// A matching instruction keeps its use point but not its def point, so reads it makes
    /// still fall inside the result. Successors of a block in which the walk stopped are not
    /// followed.
    pub fn region_slots_until<F>(&self, region: &Region, mut stop: F) -> IntervalSet
    where
        F: FnMut(&Instruction) -> bool,
    {
        let function = self.function;
        let slots = function.slots();
        let mut out = IntervalSet::new();

        let mut visited = BitSet::new(function.block_count());
        let mut worklist = vec![WalkItem {
            block: region.entry_block(),
            from: function[region.entry()].position(),
            start: region.entry_point(),
        }];
        let mut initial = true;

        while let Some(item) = worklist.pop() {
            let first_item = std::mem::replace(&mut initial, false);
            let instructions = function.block(item.block).map_or(&[][..], |b| b.instructions());
            let mut end = None;
            for &id in instructions.iter().skip(item.from) {
                // The region's own entry only ends the walk when re-entered around a cycle.
                let own_entry = first_item && id == region.entry();
                if !own_entry && self.is_region_entry(id) {
                    end = Some(slots.use_point(id));
                    break;
                }
                if stop(&function[id]) {
                    end = Some(slots.def_point(id));
                    break;
                }
            }

            if let Some(end) = end {
                out.union(item.start..end);
                continue;
            }

            out.union(item.start..slots.block_range(item.block).end);
            for succ in function.successors(item.block) {
                if visited.insert(succ.index()) {
                    worklist.push(WalkItem {
                        block: succ,
                        from: 0,
                        start: slots.block_range(succ).start,
                    });
                }
            }
        }
        out
    }
}
