//! Memoized shadow computation and the coalescing-safety queries built on it.

use std::{collections::HashMap, ops::Range};

use log::{debug, error, trace};

use crate::{
    config::ControlFlowPolicy,
    ir::{Function, InstId, Instruction, ProgramPoint, StorageId, StorageLocation},
    live::{IntervalSet, LiveInterval, LiveRangeOracle},
    regions::{Region, RegionModel},
    shadow::{non_overlapping_sub_range, IgnoreQuery, NeverIgnore, ShadowInterval},
    AnalysisConfig, Error, Result,
};

/// Computes shadows on demand and answers clobber and coalescing queries.
///
/// Shadows are cached per storage location. Nothing tracks when a cached shadow goes stale:
/// after changing a live interval call [`forget_shadow`](Self::forget_shadow) or
/// [`recompute_shadow`](Self::recompute_shadow), and after changing the region structure
/// build a new tracker or call [`forget_all`](Self::forget_all).
///
/// # Examples
///
/// ```rust
/// use idemregions::{AnalysisConfig, RegionModel, ShadowIntervalTracker};
/// use idemregions::ir::FunctionBuilder;
/// use idemregions::live::LiveIntervals;
///
/// let mut b = FunctionBuilder::new("f");
/// let x = b.vreg("x");
/// let z = b.vreg("z");
/// let entry = b.block("entry");
/// b.switch_to(entry);
/// b.arith("li", &[x], &[]);
/// b.boundary();
/// b.arith("use", &[], &[x]);
/// b.arith("li", &[z], &[]);
/// b.ret(&[z]);
/// let function = b.finish()?;
///
/// let regions = RegionModel::from_markers(&function);
/// let live = LiveIntervals::compute(&function);
/// let mut tracker = ShadowIntervalTracker::new(&regions, &live, AnalysisConfig::default());
///
/// // Re-executing from the boundary reads `x` again, so `z` may not take its place.
/// assert!(!tracker.is_register_coalescing_safe(x, z)?);
/// # Ok::<(), idemregions::Error>(())
/// ```
pub struct ShadowIntervalTracker<'a> {
    function: &'a Function,
    regions: &'a RegionModel<'a>,
    live: &'a dyn LiveRangeOracle,
    config: AnalysisConfig,
    cache: HashMap<StorageId, ShadowInterval>,
    ignore: Box<dyn IgnoreQuery + 'a>,
}

impl<'a> ShadowIntervalTracker<'a> {
    /// Creates a tracker over the regions of one function and the live ranges of its
    /// storage locations.
    #[must_use]
    pub fn new(
        regions: &'a RegionModel<'a>,
        live: &'a dyn LiveRangeOracle,
        config: AnalysisConfig,
    ) -> Self {
        ShadowIntervalTracker {
            function: regions.function(),
            regions,
            live,
            config,
            cache: HashMap::new(),
            ignore: Box::new(NeverIgnore),
        }
    }

    /// The configuration in use.
    #[must_use]
    pub fn config(&self) -> &AnalysisConfig {
        &self.config
    }

    /// Runs `f` with `query` masking instructions, then restores the previous query.
    ///
    /// Shadows computed inside `f` stay cached afterwards.
    pub fn with_ignore_query<Q, R>(&mut self, query: Q, f: impl FnOnce(&mut Self) -> R) -> R
    where
        Q: IgnoreQuery + 'a,
    {
        let previous = std::mem::replace(&mut self.ignore, Box::new(query));
        let result = f(self);
        self.ignore = previous;
        result
    }

    /// The shadow of `storage`, computed on first request.
    ///
    /// # Errors
    ///
    /// Returns [`Error::StorageNotFound`] for unknown storage, and
    /// [`Error::ShadowVerification`] if verification is enabled and fails.
    pub fn shadow(&mut self, storage: StorageId) -> Result<&ShadowInterval> {
        self.ensure_shadow(storage)?;
        self.cache
            .get(&storage)
            .ok_or(Error::StorageNotFound(storage))
    }

    /// `true` if the shadow of `storage` is cached.
    #[must_use]
    pub fn is_cached(&self, storage: StorageId) -> bool {
        self.cache.contains_key(&storage)
    }

    /// Drops the cached shadow of `storage`.
    pub fn forget_shadow(&mut self, storage: StorageId) {
        self.cache.remove(&storage);
    }

    /// Drops every cached shadow.
    pub fn forget_all(&mut self) {
        self.cache.clear();
    }

    /// Recomputes the shadow of `storage`, replacing any cached one.
    ///
    /// # Errors
    ///
    /// See [`shadow`](Self::shadow). On error the previous shadow is dropped.
    pub fn recompute_shadow(&mut self, storage: StorageId) -> Result<&ShadowInterval> {
        self.forget_shadow(storage);
        self.shadow(storage)
    }

    /// `true` if `inst` writes a register inside the shadow of `storage`.
    ///
    /// Copies reading `storage`, calls and ignored instructions never clobber: a copy
    /// duplicates the value the shadow protects, and a call's register writes are covered
    /// by the boundary at the callee's entry.
    ///
    /// # Errors
    ///
    /// See [`shadow`](Self::shadow); also [`Error::InstructionNotFound`].
    pub fn is_clobbered_by_instruction(&mut self, storage: StorageId, inst: InstId) -> Result<bool> {
        let found = self
            .function
            .instruction(inst)
            .ok_or(Error::InstructionNotFound(inst))?;
        self.ensure_shadow(storage)?;
        Ok(self.clobbers(&self.cache[&storage], found))
    }

    /// `true` if some definition of `other` clobbers the shadow of `storage`.
    ///
    /// # Errors
    ///
    /// See [`shadow`](Self::shadow).
    pub fn is_clobbered_by_interval(&mut self, storage: StorageId, other: StorageId) -> Result<bool> {
        self.location(other)?;
        self.ensure_shadow(storage)?;
        Ok(self.clobbered_by_defs_of(&self.cache[&storage], other))
    }

    /// `true` if `reg` is callee-saved and its restore before returning would clobber the
    /// shadow of `storage`.
    ///
    /// The last instruction of each exit block stands in for the restore.
    ///
    /// # Errors
    ///
    /// See [`shadow`](Self::shadow); also [`Error::StorageKindMismatch`] if `reg` is a
    /// stack slot.
    pub fn is_clobbered_by_callee_saved_restore_of(
        &mut self,
        storage: StorageId,
        reg: StorageId,
    ) -> Result<bool> {
        let location = self.location(reg)?;
        if location.is_stack_slot() {
            return Err(Error::StorageKindMismatch {
                storage: reg,
                expected: "register",
            });
        }
        if !location.is_callee_saved() {
            return Ok(false);
        }

        self.ensure_shadow(storage)?;
        let shadow = &self.cache[&storage];
        let function = self.function;
        let clobbered = function
            .exits()
            .iter()
            .filter_map(|&exit| function.block(exit).and_then(|b| b.last()))
            .any(|last| shadow.is_shadow_at(function.slots().use_point(last)));
        if clobbered {
            debug!("{shadow} clobbered by callee-saved restore of {location}");
        }
        Ok(clobbered)
    }

    /// `true` if the shadow of `storage` shares a program point with the live interval of
    /// `other`.
    ///
    /// Pessimistic stand-in for [`is_clobbered_by_interval`](Self::is_clobbered_by_interval)
    /// where definitions cannot be enumerated precisely.
    ///
    /// # Errors
    ///
    /// See [`shadow`](Self::shadow).
    pub fn is_overlapped_by_interval(&mut self, storage: StorageId, other: StorageId) -> Result<bool> {
        self.location(other)?;
        self.ensure_shadow(storage)?;
        Ok(self.overlapped_by(&self.cache[&storage], other))
    }

    /// `true` if registers `src` and `dst` can share storage without either one clobbering
    /// the other's shadow.
    ///
    /// # Errors
    ///
    /// [`Error::StorageKindMismatch`] if either location is a stack slot, otherwise see
    /// [`shadow`](Self::shadow).
    pub fn is_register_coalescing_safe(&mut self, src: StorageId, dst: StorageId) -> Result<bool> {
        for storage in [src, dst] {
            if self.location(storage)?.is_stack_slot() {
                return Err(Error::StorageKindMismatch {
                    storage,
                    expected: "register",
                });
            }
        }

        self.ensure_shadow(src)?;
        self.ensure_shadow(dst)?;
        let (src_shadow, dst_shadow) = (&self.cache[&src], &self.cache[&dst]);
        let src_clobbered = self.clobbered_by_defs_of(src_shadow, dst);
        let dst_clobbered = self.clobbered_by_defs_of(dst_shadow, src);
        debug!("{src_shadow} clobbered by {dst}: {src_clobbered}");
        debug!("{dst_shadow} clobbered by {src}: {dst_clobbered}");
        Ok(!src_clobbered && !dst_clobbered)
    }

    /// `true` if `src` and `dst`, at least one a stack slot, can share storage.
    ///
    /// Uses the overlap test in both directions.
    ///
    /// # Errors
    ///
    /// [`Error::StorageKindMismatch`] if neither location is a stack slot, otherwise see
    /// [`shadow`](Self::shadow).
    pub fn is_stack_slot_coalescing_safe(&mut self, src: StorageId, dst: StorageId) -> Result<bool> {
        if !self.location(src)?.is_stack_slot() && !self.location(dst)?.is_stack_slot() {
            return Err(Error::StorageKindMismatch {
                storage: src,
                expected: "stack slot",
            });
        }

        self.ensure_shadow(src)?;
        self.ensure_shadow(dst)?;
        let overlapped = self.overlapped_by(&self.cache[&src], dst)
            || self.overlapped_by(&self.cache[&dst], src);
        Ok(!overlapped)
    }

    /// Checks every region: no live-in value of a region may be redefined inside it.
    ///
    /// Runs regardless of [`AnalysisConfig::verify`]. Protected locations, calls, identity
    /// copies, kills and ignored instructions are exempt.
    ///
    /// # Errors
    ///
    /// [`Error::ShadowVerification`] for the first violation found.
    pub fn verify_function(&self) -> Result<()> {
        let function = self.function;
        for region in self.regions.regions() {
            let live_ins: Vec<StorageId> = function
                .storage_locations()
                .iter()
                .map(StorageLocation::id)
                .filter(|&storage| self.live.live_at(storage, region.entry_point()))
                .collect();
            if live_ins.is_empty() {
                continue;
            }

            let span = self.regions.region_slots_until(region, |_| false);
            for range in span.iter() {
                self.verify_range(range, &live_ins)?;
            }
        }
        Ok(())
    }

    fn location(&self, storage: StorageId) -> Result<&'a StorageLocation> {
        self.function
            .storage(storage)
            .ok_or(Error::StorageNotFound(storage))
    }

    fn ensure_shadow(&mut self, storage: StorageId) -> Result<()> {
        if !self.cache.contains_key(&storage) {
            let shadow = self.compute_shadow(storage)?;
            self.cache.insert(storage, shadow);
        }
        Ok(())
    }

    fn should_ignore(&self, inst: &Instruction) -> bool {
        self.ignore.ignore(inst) || inst.is_identity_copy() || inst.is_kill()
    }

    fn clobbers(&self, shadow: &ShadowInterval, inst: &Instruction) -> bool {
        if inst.copy_source() == Some(shadow.storage()) {
            return false;
        }
        if inst.is_call() || self.should_ignore(inst) {
            return false;
        }
        !inst.defs().is_empty() && shadow.is_shadow_at(self.function.slots().def_point(inst.id()))
    }

    fn clobbered_by_defs_of(&self, shadow: &ShadowInterval, other: StorageId) -> bool {
        self.function
            .defs_of(other)
            .iter()
            .any(|&def| self.clobbers(shadow, &self.function[def]))
    }

    fn overlapped_by(&self, shadow: &ShadowInterval, other: StorageId) -> bool {
        let Some(live) = self.live.interval(other) else {
            return false;
        };
        for range in shadow.ranges().iter() {
            let Some(next) = live.find(range.start) else {
                return false;
            };
            if next.start < range.end {
                return true;
            }
        }
        false
    }

    fn compute_shadow(&self, storage: StorageId) -> Result<ShadowInterval> {
        let location = self.location(storage)?;
        let mut shadow = ShadowInterval::new(storage, location.name());
        let Some(live) = self.live.interval(storage) else {
            return Ok(shadow);
        };

        trace!("computing shadow of {location} ({live})");
        for region in self.regions.regions() {
            self.compute_shadow_for_region(region, location, live, &mut shadow.ranges)?;
        }
        debug!("{}: {shadow}", self.function.name());
        Ok(shadow)
    }

    fn compute_shadow_for_region(
        &self,
        region: &Region,
        location: &StorageLocation,
        live: &LiveInterval,
        shadow: &mut IntervalSet,
    ) -> Result<()> {
        if !live.live_at(region.entry_point()) {
            return Ok(());
        }
        trace!("  region {region}");

        let storage = location.id();
        let (stems, verify) = match self.config.policy {
            ControlFlowPolicy::VariableControlFlow => (vec![region.entry()], true),
            // Uses of a stack slot cannot be enumerated; the entry is a pessimistic proxy
            // that verification would reject spuriously.
            ControlFlowPolicy::InvariableControlFlow if location.is_stack_slot() => {
                (vec![region.entry()], false)
            }
            ControlFlowPolicy::InvariableControlFlow => (self.use_stems(region, storage), true),
        };

        for stem in stems {
            trace!("  stem {}", self.function.slots().use_point(stem));
            for range in self.regions.successor_slots(stem).iter() {
                if self.config.verify && verify {
                    self.verify_range(range, &[storage])?;
                }
                compute_shadow_for_range(range.clone(), live.ranges(), shadow)?;
            }
        }
        Ok(())
    }

    /// Uses of `storage` in `region` that no definition of it precedes.
    fn use_stems(&self, region: &Region, storage: StorageId) -> Vec<InstId> {
        let function = self.function;
        let bounds = self
            .regions
            .region_slots_until(region, |inst| !self.should_ignore(inst) && inst.defines(storage));
        function
            .uses_of(storage)
            .iter()
            .copied()
            .filter(|&inst| {
                !self.should_ignore(&function[inst])
                    && bounds.contains(function.slots().use_point(inst))
            })
            .collect()
    }

    /// Fails if an instruction in `range` redefines one of `live_ins`.
    fn verify_range(&self, range: &Range<ProgramPoint>, live_ins: &[StorageId]) -> Result<()> {
        let function = self.function;
        let slots = function.slots();
        let mut previous = None;

        for index in range.start.index()..range.end.index() {
            let Some(id) = slots.instruction_at(ProgramPoint::new(index)) else {
                continue;
            };
            if previous.replace(id) == Some(id) {
                continue;
            }
            let inst = &function[id];
            if self.should_ignore(inst) || inst.is_call() {
                continue;
            }

            let clobbered = inst.defs().iter().copied().find(|&def| {
                live_ins.contains(&def)
                    && function.storage(def).is_some_and(|l| !l.is_protected())
            });
            if let Some(storage) = clobbered {
                error!(
                    "{} clobbers {} inside [{}, {})",
                    function.locator(id),
                    storage,
                    range.start,
                    range.end
                );
                return Err(Error::ShadowVerification {
                    storage,
                    clobber: id,
                    start: range.start,
                    end: range.end,
                });
            }
        }
        Ok(())
    }
}

/// Adds the points of `range` covered by neither `live` nor `shadow` to `shadow`.
fn compute_shadow_for_range(
    range: Range<ProgramPoint>,
    live: &IntervalSet,
    shadow: &mut IntervalSet,
) -> Result<()> {
    let (mut outer, outer_end) = (range.start, range.end);
    while outer < outer_end {
        let (mut inner, mut inner_end) = (outer, outer_end);
        if let Some(conflict) = live.find(outer) {
            let (free, next) = non_overlapping_sub_range(outer..outer_end, conflict.clone());
            outer = next;
            match free {
                Some(free) => (inner, inner_end) = (free.start, free.end),
                None => continue,
            }
        }

        while inner < inner_end {
            let (ok_start, ok_end) = match shadow.find(inner) {
                Some(conflict) => {
                    let (free, next) = non_overlapping_sub_range(inner..inner_end, conflict.clone());
                    inner = next;
                    match free {
                        Some(free) => (free.start, free.end),
                        None => continue,
                    }
                }
                None => {
                    let whole = (inner, inner_end);
                    inner = inner_end;
                    whole
                }
            };
            shadow.insert(ok_start..ok_end)?;
        }

        outer = outer.max(inner);
    }
    Ok(())
}
