//! Enumeration of the stores between the two ends of an anti-dependence.
//!
//! Only stores are candidate cut points: placing a region boundary immediately before one
//! of them ends the region before the overwrite that re-execution would observe. For a pair
//! `(L, S)` the path is `S` followed by the stores met walking backward toward `L`:
//!
//! - same block with `L` before `S`: the stores strictly between them;
//! - otherwise: starting in `S`'s block and climbing the immediate-dominator chain while
//!   `L`'s block dominates the current block, the stores between each block's relevant
//!   start (its first instruction, or just after `L` in `L`'s block) and the scan cursor.

use std::fmt;

use crate::{
    analysis::AntiDependencePair,
    ir::{BlockId, Function, InstId},
};

/// The stores on the dominance-consistent walk from a pair's store back to its load.
///
/// Never empty: the first element is always the pair's store.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AntiDependencePath {
    pair: AntiDependencePair,
    stores: Vec<InstId>,
}

impl AntiDependencePath {
    /// The pair this path was enumerated for.
    #[must_use]
    pub fn pair(&self) -> AntiDependencePair {
        self.pair
    }

    /// The stores, starting with the pair's store and moving backward.
    #[must_use]
    pub fn stores(&self) -> &[InstId] {
        &self.stores
    }

    /// Number of stores on the path.
    #[must_use]
    pub fn len(&self) -> usize {
        self.stores.len()
    }

    /// Always `false`; present for API symmetry with [`len`](Self::len).
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.stores.is_empty()
    }

    /// `true` if `inst` is on the path.
    #[must_use]
    pub fn contains(&self, inst: InstId) -> bool {
        self.stores.contains(&inst)
    }
}

impl fmt::Display for AntiDependencePath {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let stores: Vec<String> = self.stores.iter().map(ToString::to_string).collect();
        write!(f, "[{}]", stores.join(", "))
    }
}

/// Builds [`AntiDependencePath`]s over one function.
pub struct PathEnumerator<'f> {
    function: &'f Function,
}

impl<'f> PathEnumerator<'f> {
    /// Creates an enumerator over `function`.
    #[must_use]
    pub fn new(function: &'f Function) -> Self {
        PathEnumerator { function }
    }

    /// Enumerates one path per pair, in the order given.
    #[must_use]
    pub fn enumerate(&self, pairs: &[AntiDependencePair]) -> Vec<AntiDependencePath> {
        pairs.iter().map(|&pair| self.path(pair)).collect()
    }

    /// Enumerates the path of a single pair.
    #[must_use]
    pub fn path(&self, pair: AntiDependencePair) -> AntiDependencePath {
        let function = self.function;
        let mut stores = vec![pair.store];
        let (load, store) = (&function[pair.load], &function[pair.store]);

        if load.block() == store.block() && load.position() < store.position() {
            self.collect_stores(store.block(), load.position() + 1, store.position(), &mut stores);
            return AntiDependencePath { pair, stores };
        }

        let mut block = store.block();
        let mut cursor = store.position();
        while function.dominates(load.block(), block) {
            let floor = if block == load.block() {
                load.position() + 1
            } else {
                0
            };
            self.collect_stores(block, floor, cursor, &mut stores);

            if block == load.block() {
                break;
            }
            let Some(up) = function.immediate_dominator(block) else {
                break;
            };
            block = up;
            cursor = function.block(up).map_or(0, |b| b.len());
        }

        AntiDependencePath { pair, stores }
    }

    /// Appends the stores of `block` in positions `[floor, end)`, last first.
    fn collect_stores(&self, block: BlockId, floor: usize, end: usize, out: &mut Vec<InstId>) {
        let Some(found) = self.function.block(block) else {
            return;
        };
        if floor >= end {
            return;
        }
        out.extend(
            found.instructions()[floor..end]
                .iter()
                .rev()
                .copied()
                .filter(|&inst| self.function[inst].is_store()),
        );
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{
        ir::{Address, FunctionBuilder},
        test::diamond,
        Result,
    };

    #[test]
    fn test_same_block_collects_stores_between() -> Result<()> {
        let mut b = FunctionBuilder::new("f");
        let entry = b.block("entry");
        b.switch_to(entry);
        let load = b.load(Address::object(0, 0), 4);
        let s1 = b.store(Address::object(1, 0), 4);
        b.arith("add", &[], &[]);
        let s2 = b.store(Address::object(2, 0), 4);
        let store = b.store(Address::object(0, 0), 4);
        let f = b.finish()?;

        let path = PathEnumerator::new(&f).path(AntiDependencePair { load, store });
        assert_eq!(path.stores(), &[store, s2, s1]);
        assert_eq!(path.pair().store, store);
        assert!(!path.is_empty());
        Ok(())
    }

    #[test]
    fn test_dominator_walk_skips_sibling_arms() -> Result<()> {
        let d = diamond()?;
        let path = PathEnumerator::new(&d.function).path(AntiDependencePair {
            load: d.load,
            store: d.store,
        });
        // join -> entry along the dominator tree; the arms are never visited.
        assert_eq!(path.stores(), &[d.store]);
        Ok(())
    }

    #[test]
    fn test_dominator_walk_collects_along_chain() -> Result<()> {
        let mut b = FunctionBuilder::new("chain");
        let entry = b.block("entry");
        let mid = b.block("mid");
        let tail = b.block("tail");
        b.switch_to(entry);
        let before = b.store(Address::object(3, 0), 4);
        let load = b.load(Address::object(0, 0), 4);
        let after = b.store(Address::object(1, 0), 4);
        b.branch(&[]);
        b.switch_to(mid);
        let middle = b.store(Address::object(2, 0), 4);
        b.branch(&[]);
        b.switch_to(tail);
        let early = b.store(Address::object(4, 0), 4);
        let store = b.store(Address::object(0, 0), 4);
        b.ret(&[]);
        b.edge(entry, mid);
        b.edge(mid, tail);
        let f = b.finish()?;

        let path = PathEnumerator::new(&f).path(AntiDependencePair { load, store });
        assert_eq!(path.stores(), &[store, early, middle, after]);
        assert!(!path.contains(before));
        assert_eq!(path.len(), 4);
        Ok(())
    }

    #[test]
    fn test_load_after_store_in_same_block() -> Result<()> {
        let mut b = FunctionBuilder::new("f");
        let entry = b.block("entry");
        let spin = b.block("spin");
        b.switch_to(entry);
        b.branch(&[]);
        b.switch_to(spin);
        let store = b.store(Address::object(0, 0), 4);
        b.store(Address::object(1, 0), 4);
        let load = b.load(Address::object(0, 0), 4);
        b.branch(&[]);
        b.edge(entry, spin);
        b.edge(spin, spin);
        let f = b.finish()?;

        let path = PathEnumerator::new(&f).path(AntiDependencePair { load, store });
        assert_eq!(path.stores(), &[store]);
        assert_eq!(path.to_string(), format!("[{store}]"));
        Ok(())
    }

    #[test]
    fn test_enumerate_keeps_order() -> Result<()> {
        let d = diamond()?;
        let pair = AntiDependencePair {
            load: d.load,
            store: d.store,
        };
        let paths = PathEnumerator::new(&d.function).enumerate(&[pair, pair]);
        assert_eq!(paths.len(), 2);
        assert!(paths.iter().all(|p| p.stores()[0] == d.store));
        Ok(())
    }
}
