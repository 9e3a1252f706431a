//! Region partitioning of a function.

use std::{collections::BTreeSet, fmt};

use log::debug;

use crate::{
    analysis::BoundarySet,
    ir::{BlockId, Function, InstId, ProgramPoint},
    utils::{graph::Predecessors, BitSet},
};

define_index!(
    /// Identifies a region within one [`RegionModel`].
    RegionId,
    "IR#"
);

/// An idempotent region, identified by its entry instruction.
///
/// The region spans every instruction reachable from the entry without passing through
/// another region entry.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Region {
    id: RegionId,
    entry: InstId,
    block: BlockId,
    point: ProgramPoint,
}

impl Region {
    /// The region id.
    #[must_use]
    pub fn id(&self) -> RegionId {
        self.id
    }

    /// The first instruction of the region.
    #[must_use]
    pub fn entry(&self) -> InstId {
        self.entry
    }

    /// The block holding the entry instruction.
    #[must_use]
    pub fn entry_block(&self) -> BlockId {
        self.block
    }

    /// The use point of the entry instruction.
    #[must_use]
    pub fn entry_point(&self) -> ProgramPoint {
        self.point
    }
}

impl fmt::Display for Region {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} {} in {}", self.id, self.point, self.block)
    }
}

/// The regions of a function.
///
/// Every boundary instruction starts a region. The first instruction of the entry block
/// always does, whether or not it was selected as a boundary, so every reachable
/// instruction belongs to at least one region. Regions are numbered in layout order of
/// their entries.
///
/// The model borrows the function and must be rebuilt whenever the function or the
/// boundary set changes.
///
/// # Examples
///
/// ```rust
/// use idemregions::{compute_boundaries, BasicAliasOracle, RegionModel};
/// use idemregions::ir::{Address, FunctionBuilder};
///
/// let mut b = FunctionBuilder::new("f");
/// let entry = b.block("entry");
/// b.switch_to(entry);
/// let load = b.load(Address::object(0, 0), 4);
/// let store = b.store(Address::object(0, 0), 4);
/// let ret = b.ret(&[]);
/// let function = b.finish()?;
///
/// let boundaries = compute_boundaries(&function, &BasicAliasOracle);
/// let regions = RegionModel::new(&function, &boundaries);
/// assert_eq!(regions.len(), 2);
/// assert_ne!(regions.regions_containing(load), regions.regions_containing(ret));
/// assert!(regions.is_region_entry(store));
/// # Ok::<(), idemregions::Error>(())
/// ```
pub struct RegionModel<'f> {
    pub(crate) function: &'f Function,
    regions: Vec<Region>,
    /// Region started by each instruction, indexed by instruction id.
    entries: Vec<Option<RegionId>>,
}

impl<'f> RegionModel<'f> {
    /// Builds the regions started by `boundaries`.
    ///
    /// Boundaries that do not belong to `function` are ignored.
    #[must_use]
    pub fn new(function: &'f Function, boundaries: &BoundarySet) -> Self {
        Self::from_entries(function, boundaries.iter())
    }

    /// Builds the regions started by instructions flagged as boundary markers.
    #[must_use]
    pub fn from_markers(function: &'f Function) -> Self {
        let markers: Vec<InstId> = function
            .instructions()
            .filter(|inst| inst.is_boundary())
            .map(|inst| inst.id())
            .collect();
        Self::from_entries(function, markers.into_iter())
    }

    fn from_entries(function: &'f Function, entries: impl Iterator<Item = InstId>) -> Self {
        let slots = function.slots();
        let mut starts: BTreeSet<usize> = entries
            .filter(|&inst| function.instruction(inst).is_some())
            .map(|inst| slots.layout_index(inst))
            .collect();
        if let Some(first) = function.block(function.entry()).and_then(|b| b.first()) {
            starts.insert(slots.layout_index(first));
        }

        let mut by_inst = vec![None; function.instruction_count()];
        let regions: Vec<Region> = starts
            .into_iter()
            .enumerate()
            .map(|(index, layout)| {
                let entry = slots.layout()[layout];
                let id = RegionId::new(index);
                by_inst[entry.index()] = Some(id);
                Region {
                    id,
                    entry,
                    block: function[entry].block(),
                    point: slots.use_point(entry),
                }
            })
            .collect();

        debug!("{}: {} regions", function.name(), regions.len());
        RegionModel {
            function,
            regions,
            entries: by_inst,
        }
    }

    /// The function this model partitions.
    #[must_use]
    pub fn function(&self) -> &'f Function {
        self.function
    }

    /// All regions, ordered by entry.
    #[must_use]
    pub fn regions(&self) -> &[Region] {
        &self.regions
    }

    /// Returns a region by id.
    #[must_use]
    pub fn region(&self, id: RegionId) -> Option<&Region> {
        self.regions.get(id.index())
    }

    /// The region whose entry is `inst`, if any.
    #[must_use]
    pub fn region_at(&self, inst: InstId) -> Option<&Region> {
        self.entries
            .get(inst.index())
            .copied()
            .flatten()
            .and_then(|id| self.region(id))
    }

    /// `true` if `inst` starts a region.
    #[must_use]
    pub fn is_region_entry(&self, inst: InstId) -> bool {
        self.entries.get(inst.index()).is_some_and(Option::is_some)
    }

    /// Number of regions.
    #[must_use]
    pub fn len(&self) -> usize {
        self.regions.len()
    }

    /// `true` if there are no regions, which only happens for a function without
    /// instructions.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.regions.is_empty()
    }

    /// The regions `inst` belongs to, ordered by id.
    ///
    /// Walks backward from `inst` (inclusive) along every predecessor path to the nearest
    /// region entry. Divergent paths can reach different entries, in which case `inst`
    /// belongs to several regions. Instructions in blocks unreachable from the entry may
    /// belong to none.
    #[must_use]
    pub fn regions_containing(&self, inst: InstId) -> Vec<RegionId> {
        let function = self.function;
        let Some(found) = function.instruction(inst) else {
            return Vec::new();
        };

        let mut regions = BTreeSet::new();
        // The starting block is not marked visited, so a cycle back into it scans it whole.
        let mut visited = BitSet::new(function.block_count());
        let mut worklist = vec![(found.block(), found.position() + 1)];

        while let Some((block, end)) = worklist.pop() {
            let instructions = function.block(block).map_or(&[][..], |b| b.instructions());
            let nearest = instructions[..end.min(instructions.len())]
                .iter()
                .rev()
                .find_map(|&i| self.entries[i.index()]);

            if let Some(region) = nearest {
                regions.insert(region);
                continue;
            }
            for pred in function.predecessors(block) {
                if visited.insert(pred.index()) {
                    let len = function.block(pred).map_or(0, |b| b.len());
                    worklist.push((pred, len));
                }
            }
        }

        regions.into_iter().collect()
    }
}

impl fmt::Display for RegionModel<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "Regions of '{}':", self.function.name())?;
        for region in &self.regions {
            writeln!(f, "  {region}")?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{
        ir::{Address, FunctionBuilder},
        test::{counted_loop, diamond},
        Result,
    };

    #[test]
    fn test_implicit_entry_region() -> Result<()> {
        let d = diamond()?;
        let regions = RegionModel::new(&d.function, &BoundarySet::new());
        assert_eq!(regions.len(), 1);

        let only = regions.regions()[0];
        assert_eq!(only.entry(), d.load);
        assert_eq!(only.entry_block(), d.entry);
        assert_eq!(only.entry_point(), ProgramPoint::new(0));
        assert_eq!(regions.regions_containing(d.store), vec![only.id()]);
        Ok(())
    }

    #[test]
    fn test_boundary_belongs_to_its_own_region() -> Result<()> {
        let d = diamond()?;
        let boundaries: BoundarySet = [d.store].into_iter().collect();
        let regions = RegionModel::new(&d.function, &boundaries);

        let at_store = regions.region_at(d.store).map(Region::id);
        assert_eq!(at_store, Some(RegionId::new(1)));
        assert_eq!(regions.regions_containing(d.store), vec![RegionId::new(1)]);
        assert_eq!(regions.regions_containing(d.load), vec![RegionId::new(0)]);
        Ok(())
    }

    #[test]
    fn test_divergent_paths_reach_two_regions() -> Result<()> {
        let mut b = FunctionBuilder::new("f");
        let entry = b.block("entry");
        let left = b.block("left");
        let right = b.block("right");
        let join = b.block("join");
        b.switch_to(entry);
        b.branch(&[]);
        b.switch_to(left);
        let cut = b.boundary();
        b.branch(&[]);
        b.switch_to(right);
        b.branch(&[]);
        b.switch_to(join);
        let ret = b.ret(&[]);
        b.edge(entry, left);
        b.edge(entry, right);
        b.edge(left, join);
        b.edge(right, join);
        let f = b.finish()?;

        let regions = RegionModel::from_markers(&f);
        assert_eq!(regions.len(), 2);
        assert!(regions.is_region_entry(cut));
        assert_eq!(
            regions.regions_containing(ret),
            vec![RegionId::new(0), RegionId::new(1)]
        );
        Ok(())
    }

    #[test]
    fn test_loop_without_boundary_in_body() -> Result<()> {
        let l = counted_loop()?;
        let regions = RegionModel::new(&l.function, &BoundarySet::new());
        assert_eq!(regions.regions_containing(l.store), vec![RegionId::new(0)]);
        Ok(())
    }

    #[test]
    fn test_loop_with_boundary_in_body() -> Result<()> {
        let l = counted_loop()?;
        let boundaries: BoundarySet = [l.store].into_iter().collect();
        let regions = RegionModel::new(&l.function, &boundaries);
        // The load is reached from the entry and around the back edge from the store.
        assert_eq!(
            regions.regions_containing(l.load),
            vec![RegionId::new(0), RegionId::new(1)]
        );
        Ok(())
    }

    #[test]
    fn test_display() -> Result<()> {
        let mut b = FunctionBuilder::new("f");
        let entry = b.block("entry");
        b.switch_to(entry);
        b.load(Address::object(0, 0), 4);
        let store = b.store(Address::object(0, 0), 4);
        let f = b.finish()?;

        let boundaries: BoundarySet = [store].into_iter().collect();
        let regions = RegionModel::new(&f, &boundaries);
        assert_eq!(regions.regions()[1].to_string(), "IR#1 @2 in n0");
        assert!(regions.to_string().contains("IR#0 @0 in n0"));
        assert!(regions.region(RegionId::new(2)).is_none());
        Ok(())
    }
}
