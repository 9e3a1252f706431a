//! Live intervals computed from a function's def/use information.

use log::trace;

use crate::{
    ir::{BlockId, Function, ProgramPoint, StorageId},
    live::{IntervalSet, LiveInterval, LiveRangeOracle},
    utils::{
        graph::{algorithms::postorder, GraphBase, Successors},
        BitSet,
    },
};

/// Live intervals of every storage location of one function.
///
/// A value defined by `d` and last read by `u` is live over `[def(d), use(u) + 1)`. Values
/// live out of a block extend to the block end, values live into a block start at its first
/// use point, and a definition nobody reads occupies the single point `[def(d), def(d) + 1)`.
///
/// # Examples
///
/// ```rust
/// use idemregions::live::{LiveIntervals, LiveRangeOracle};
/// use idemregions::ir::FunctionBuilder;
///
/// let mut b = FunctionBuilder::new("f");
/// let r = b.vreg("r");
/// let entry = b.block("entry");
/// b.switch_to(entry);
/// let def = b.arith("li", &[r], &[]);
/// let user = b.ret(&[r]);
/// let function = b.finish()?;
///
/// let live = LiveIntervals::compute(&function);
/// let slots = function.slots();
/// assert!(live.live_at(r, slots.def_point(def)));
/// assert!(live.live_at(r, slots.use_point(user)));
/// assert!(!live.live_at(r, slots.def_point(user)));
/// # Ok::<(), idemregions::Error>(())
/// ```
#[derive(Debug, Clone)]
pub struct LiveIntervals {
    intervals: Vec<Option<LiveInterval>>,
}

impl LiveIntervals {
    /// Runs backward liveness over `function` and converts the result into intervals.
    #[must_use]
    pub fn compute(function: &Function) -> Self {
        let storage_count = function.storage_locations().len();
        let block_count = function.block_count();

        // Upward-exposed uses and definitions of each block.
        let mut gen = vec![BitSet::new(storage_count); block_count];
        let mut kill = vec![BitSet::new(storage_count); block_count];
        for block in function.blocks() {
            let index = block.id().index();
            for inst in function.block_instructions(block.id()) {
                for &used in inst.uses() {
                    if !kill[index].contains(used.index()) {
                        gen[index].insert(used.index());
                    }
                }
                for &defined in inst.defs() {
                    kill[index].insert(defined.index());
                }
            }
        }

        let order = Self::iteration_order(function);
        let mut live_in = vec![BitSet::new(storage_count); block_count];
        let mut live_out = vec![BitSet::new(storage_count); block_count];
        let mut changed = true;
        while changed {
            changed = false;
            for &block in &order {
                let index = block.index();
                let mut out = BitSet::new(storage_count);
                for succ in function.successors(block) {
                    out.union_with(&live_in[succ.index()]);
                }

                let mut incoming = out.clone();
                incoming.difference_with(&kill[index]);
                incoming.union_with(&gen[index]);

                live_out[index] = out;
                if incoming != live_in[index] {
                    live_in[index] = incoming;
                    changed = true;
                }
            }
        }

        let mut sets = vec![IntervalSet::new(); storage_count];
        for block in function.blocks() {
            Self::add_block_ranges(function, block.id(), &live_out[block.id().index()], &mut sets);
        }

        let intervals = sets
            .into_iter()
            .enumerate()
            .map(|(index, ranges)| {
                (!ranges.is_empty()).then(|| LiveInterval::new(StorageId::new(index), ranges))
            })
            .collect::<Vec<_>>();

        for interval in intervals.iter().flatten() {
            trace!("{}: live {}", function.name(), interval);
        }
        LiveIntervals { intervals }
    }

    /// Postorder from the entry, then the unreachable blocks.
    fn iteration_order(function: &Function) -> Vec<BlockId> {
        let mut order = postorder(function, function.entry());
        let mut seen = BitSet::new(function.node_count());
        for block in &order {
            seen.insert(block.index());
        }
        order.extend(
            (0..function.block_count())
                .filter(|&index| !seen.contains(index))
                .map(BlockId::new),
        );
        order
    }

    /// Walks `block` backward, closing a range at every definition.
    fn add_block_ranges(
        function: &Function,
        block: BlockId,
        live_out: &BitSet,
        sets: &mut [IntervalSet],
    ) {
        let slots = function.slots();
        let range = slots.block_range(block);

        // End of the range each storage location is currently live to, if any.
        let mut open: Vec<Option<ProgramPoint>> = vec![None; sets.len()];
        for storage in live_out.iter() {
            open[storage] = Some(range.end);
        }

        let instructions: Vec<_> = function.block_instructions(block).collect();
        for inst in instructions.into_iter().rev() {
            let def = slots.def_point(inst.id());
            for &defined in inst.defs() {
                let end = open[defined.index()].take().unwrap_or(def.advance(1));
                sets[defined.index()].union(def..end);
            }

            let end = slots.use_point(inst.id()).advance(1);
            for &used in inst.uses() {
                open[used.index()].get_or_insert(end);
            }
        }

        for (storage, end) in open.into_iter().enumerate() {
            if let Some(end) = end {
                sets[storage].union(range.start..end);
            }
        }
    }

    /// Iterates over the storage locations that are live somewhere.
    pub fn iter(&self) -> impl Iterator<Item = &LiveInterval> {
        self.intervals.iter().flatten()
    }
}

impl LiveRangeOracle for LiveIntervals {
    fn interval(&self, storage: StorageId) -> Option<&LiveInterval> {
        self.intervals.get(storage.index()).and_then(Option::as_ref)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{ir::FunctionBuilder, Result};

    fn points(live: &LiveIntervals, storage: StorageId) -> Vec<(usize, usize)> {
        live.interval(storage)
            .map(|interval| {
                interval
                    .ranges()
                    .iter()
                    .map(|r| (r.start.index(), r.end.index()))
                    .collect()
            })
            .unwrap_or_default()
    }

    #[test]
    fn test_straight_line() -> Result<()> {
        let mut b = FunctionBuilder::new("f");
        let x = b.vreg("x");
        let y = b.vreg("y");
        let entry = b.block("entry");
        b.switch_to(entry);
        b.arith("li", &[x], &[]); // 0,1
        b.arith("add", &[y], &[x]); // 2,3
        b.arith("nop", &[], &[]); // 4,5
        b.ret(&[y]); // 6,7
        let f = b.finish()?;

        let live = LiveIntervals::compute(&f);
        assert_eq!(points(&live, x), vec![(1, 3)]);
        assert_eq!(points(&live, y), vec![(3, 7)]);
        Ok(())
    }

    #[test]
    fn test_dead_def_and_redefinition() -> Result<()> {
        let mut b = FunctionBuilder::new("f");
        let x = b.vreg("x");
        let entry = b.block("entry");
        b.switch_to(entry);
        b.arith("li", &[x], &[]); // 0,1 dead
        b.arith("li", &[x], &[]); // 2,3
        b.arith("inc", &[x], &[x]); // 4,5
        b.ret(&[x]); // 6,7
        let f = b.finish()?;

        let live = LiveIntervals::compute(&f);
        // [1,2) is the dead def; [3,5) and [5,7) merge.
        assert_eq!(points(&live, x), vec![(1, 2), (3, 7)]);
        Ok(())
    }

    #[test]
    fn test_loop_carried_value() -> Result<()> {
        let mut b = FunctionBuilder::new("loop");
        let i = b.vreg("i");
        let entry = b.block("entry");
        let body = b.block("body");
        let exit = b.block("exit");
        b.switch_to(entry);
        b.arith("li", &[i], &[]); // 0,1
        b.branch(&[]); // 2,3
        b.switch_to(body);
        b.arith("inc", &[i], &[i]); // 4,5
        b.branch(&[i]); // 6,7
        b.switch_to(exit);
        b.ret(&[]); // 8,9
        b.edge(entry, body);
        b.edge(body, body);
        b.edge(body, exit);
        let f = b.finish()?;

        let live = LiveIntervals::compute(&f);
        assert_eq!(points(&live, i), vec![(1, 8)]);
        assert!(live.live_at(i, ProgramPoint::new(4)));
        assert!(!live.live_at(i, ProgramPoint::new(8)));
        Ok(())
    }

    #[test]
    fn test_live_in_argument_and_unused_storage() -> Result<()> {
        let mut b = FunctionBuilder::new("f");
        let arg = b.vreg("arg");
        let unused = b.vreg("unused");
        let entry = b.block("entry");
        b.switch_to(entry);
        b.arith("nop", &[], &[]); // 0,1
        b.ret(&[arg]); // 2,3
        let f = b.finish()?;

        let live = LiveIntervals::compute(&f);
        assert_eq!(points(&live, arg), vec![(0, 3)]);
        assert!(live.interval(unused).is_none());
        assert_eq!(live.iter().count(), 1);
        assert_eq!(live.find(arg, ProgramPoint::new(1)), Some(ProgramPoint::new(0)..ProgramPoint::new(3)));
        Ok(())
    }
}
