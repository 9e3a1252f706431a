//! Discovery of memory anti-dependences.
//!
//! For a store `S` writing `[D, D + n)`, every load `L` that may read those bytes and from
//! which `S` is reachable without the bytes being rewritten in between forms a pair
//! `(L, S)`. Re-executing a region containing both would let `L` observe the value `S`
//! wrote, so some cut must separate them.
//!
//! The search walks backward from `S`, one block at a time, with an explicit work list and
//! a visited-block set per store, so cyclic control flow terminates. A path ends at the
//! first aliasing load (one pair) or at a store that must-alias `[D, D + n)` (no pair: the
//! bytes were rewritten).

use std::fmt;

use log::trace;

use crate::{
    analysis::{AliasOracle, AliasResult},
    ir::{BlockId, Function, InstId, MemoryLocation},
    utils::{graph::Predecessors, BitSet},
};

/// A load and a later store to memory the load may have read.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct AntiDependencePair {
    /// The earlier read.
    pub load: InstId,
    /// The later write.
    pub store: InstId,
}

impl fmt::Display for AntiDependencePair {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "({}, {})", self.load, self.store)
    }
}

/// One pending piece of the backward search: scan `block` from `end` down to `floor`.
#[derive(Debug, Clone, Copy)]
struct ScanItem {
    block: BlockId,
    end: usize,
    floor: usize,
}

/// How the scan of one block ended.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum ScanOutcome {
    /// An aliasing load ends the path with a pair.
    Load(InstId),
    /// A store rewrote the searched bytes; the path ends without a pair.
    Refreshed,
    /// The block start was reached; the path continues into the predecessors.
    Exhausted,
}

/// Finds anti-dependence pairs in a function.
///
/// # Examples
///
/// ```rust
/// use idemregions::analysis::{AntiDependencyFinder, BasicAliasOracle};
/// use idemregions::ir::{Address, FunctionBuilder};
///
/// let mut b = FunctionBuilder::new("f");
/// let entry = b.block("entry");
/// b.switch_to(entry);
/// let load = b.load(Address::object(0, 0), 4);
/// let store = b.store(Address::object(0, 0), 4);
/// let function = b.finish()?;
///
/// let pairs = AntiDependencyFinder::new(&function, &BasicAliasOracle).find_all();
/// assert_eq!(pairs.len(), 1);
/// assert_eq!((pairs[0].load, pairs[0].store), (load, store));
/// # Ok::<(), idemregions::Error>(())
/// ```
pub struct AntiDependencyFinder<'f, A: AliasOracle + ?Sized> {
    function: &'f Function,
    oracle: &'f A,
}

impl<'f, A: AliasOracle + ?Sized> AntiDependencyFinder<'f, A> {
    /// Creates a finder over `function`, asking `oracle` for alias relations.
    pub fn new(function: &'f Function, oracle: &'f A) -> Self {
        AntiDependencyFinder { function, oracle }
    }

    /// Returns the pairs of every store in the function, ordered by store and then load in
    /// program order.
    #[must_use]
    pub fn find_all(&self) -> Vec<AntiDependencePair> {
        let mut pairs: Vec<AntiDependencePair> = self
            .function
            .stores()
            .flat_map(|store| self.find_for_store(store.id()))
            .collect();

        let slots = self.function.slots();
        pairs.sort_by_key(|pair| (slots.layout_index(pair.store), slots.layout_index(pair.load)));
        pairs.dedup();
        pairs
    }

    /// Returns the pairs ending at `store`. Empty if `store` is not a memory store.
    ///
    /// Divergent predecessor paths can each contribute a pair, so a store may have several.
    #[must_use]
    pub fn find_for_store(&self, store: InstId) -> Vec<AntiDependencePair> {
        let function = self.function;
        let Some(inst) = function.instruction(store) else {
            return Vec::new();
        };
        let Some(target) = inst.store_location() else {
            return Vec::new();
        };

        let (home, position) = (inst.block(), inst.position());
        let mut pairs = Vec::new();
        let mut visited = BitSet::new(function.block_count());
        let mut worklist = vec![ScanItem {
            block: home,
            end: position,
            floor: 0,
        }];

        while let Some(item) = worklist.pop() {
            match self.scan_block(item, &target) {
                ScanOutcome::Load(load) => {
                    trace!(
                        "anti-dependence {} -> {}",
                        function.locator(load),
                        function.locator(store)
                    );
                    pairs.push(AntiDependencePair { load, store });
                }
                ScanOutcome::Refreshed => {}
                ScanOutcome::Exhausted => {
                    for pred in function.predecessors(item.block) {
                        if !visited.insert(pred.index()) {
                            continue;
                        }
                        let len = function.block(pred).map_or(0, |block| block.len());
                        // Re-entering the store's own block completes the cycle: only the
                        // instructions after the store remain unscanned.
                        let floor = if pred == home { position + 1 } else { 0 };
                        worklist.push(ScanItem {
                            block: pred,
                            end: len,
                            floor,
                        });
                    }
                }
            }
        }

        pairs
    }

    fn scan_block(&self, item: ScanItem, target: &MemoryLocation) -> ScanOutcome {
        let Some(block) = self.function.block(item.block) else {
            return ScanOutcome::Exhausted;
        };
        let floor = item.floor.min(item.end);

        for &id in block.instructions()[floor..item.end].iter().rev() {
            let inst = &self.function[id];
            if let Some(read) = inst.load_location() {
                if self.oracle.alias(&read, target) != AliasResult::NoAlias {
                    return ScanOutcome::Load(id);
                }
            } else if let Some(written) = inst.store_location() {
                if self.oracle.alias(&written, target) == AliasResult::MustAlias {
                    return ScanOutcome::Refreshed;
                }
            }
        }
        ScanOutcome::Exhausted
    }
}
