//! Sets of disjoint program point ranges.

use std::{fmt, ops::Range};

use crate::{
    ir::{ProgramPoint, StorageId},
    Error, Result,
};

/// A sorted set of disjoint, non-adjacent half-open ranges of program points.
///
/// Adjacent ranges are merged on insertion, so `[2, 4)` followed by `[4, 6)` is stored as
/// `[2, 6)`. [`insert`](Self::insert) refuses ranges that overlap existing coverage;
/// [`union`](Self::union) absorbs them.
///
/// # Examples
///
/// ```rust
/// use idemregions::live::IntervalSet;
/// use idemregions::ProgramPoint;
///
/// let p = ProgramPoint::new;
/// let mut set = IntervalSet::new();
/// set.insert(p(2)..p(4))?;
/// set.insert(p(4)..p(6))?;
/// assert_eq!(set.ranges(), &[p(2)..p(6)]);
/// assert!(set.insert(p(5)..p(8)).is_err());
///
/// set.union(p(5)..p(8));
/// assert_eq!(set.size(), 6);
/// # Ok::<(), idemregions::Error>(())
/// ```
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct IntervalSet {
    ranges: Vec<Range<ProgramPoint>>,
}

impl IntervalSet {
    /// Creates an empty set.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Inserts `range`, which must not overlap any range already present.
    ///
    /// Empty ranges are ignored.
    ///
    /// # Errors
    ///
    /// Returns [`Error::OverlappingRange`] if `range` shares a point with the set.
    pub fn insert(&mut self, range: Range<ProgramPoint>) -> Result<()> {
        if range.start >= range.end {
            return Ok(());
        }

        let at = self.ranges.partition_point(|r| r.end <= range.start);
        if self.ranges.get(at).is_some_and(|next| next.start < range.end) {
            return Err(Error::OverlappingRange {
                start: range.start,
                end: range.end,
            });
        }

        let joins_prev = at > 0 && self.ranges[at - 1].end == range.start;
        let joins_next = self.ranges.get(at).is_some_and(|next| next.start == range.end);
        match (joins_prev, joins_next) {
            (true, true) => {
                self.ranges[at - 1].end = self.ranges[at].end;
                self.ranges.remove(at);
            }
            (true, false) => self.ranges[at - 1].end = range.end,
            (false, true) => self.ranges[at].start = range.start,
            (false, false) => self.ranges.insert(at, range),
        }
        Ok(())
    }

    /// Adds `range`, merging it with every range it overlaps or touches.
    pub fn union(&mut self, range: Range<ProgramPoint>) {
        if range.start >= range.end {
            return;
        }

        let first = self.ranges.partition_point(|r| r.end < range.start);
        let last = self.ranges.partition_point(|r| r.start <= range.end);
        let mut merged = range;
        if first < last {
            merged.start = merged.start.min(self.ranges[first].start);
            merged.end = merged.end.max(self.ranges[last - 1].end);
        }
        self.ranges.splice(first..last, std::iter::once(merged));
    }

    /// The first range ending after `point`, which either contains `point` or lies
    /// entirely after it.
    #[must_use]
    pub fn find(&self, point: ProgramPoint) -> Option<&Range<ProgramPoint>> {
        let at = self.ranges.partition_point(|r| r.end <= point);
        self.ranges.get(at)
    }

    /// `true` if `point` lies in some range.
    #[must_use]
    pub fn contains(&self, point: ProgramPoint) -> bool {
        self.find(point).is_some_and(|r| r.start <= point)
    }

    /// `true` if `range` shares at least one point with the set.
    #[must_use]
    pub fn overlaps(&self, range: &Range<ProgramPoint>) -> bool {
        range.start < range.end && self.find(range.start).is_some_and(|r| r.start < range.end)
    }

    /// Number of program points covered.
    #[must_use]
    pub fn size(&self) -> usize {
        self.ranges
            .iter()
            .map(|r| r.end.index() - r.start.index())
            .sum()
    }

    /// The ranges in ascending order.
    #[must_use]
    pub fn ranges(&self) -> &[Range<ProgramPoint>] {
        &self.ranges
    }

    /// Iterates over the ranges in ascending order.
    pub fn iter(&self) -> impl Iterator<Item = &Range<ProgramPoint>> {
        self.ranges.iter()
    }

    /// Number of ranges.
    #[must_use]
    pub fn len(&self) -> usize {
        self.ranges.len()
    }

    /// `true` if the set covers no point.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.ranges.is_empty()
    }

    /// Removes every range.
    pub fn clear(&mut self) {
        self.ranges.clear();
    }
}

impl FromIterator<Range<ProgramPoint>> for IntervalSet {
    fn from_iter<I: IntoIterator<Item = Range<ProgramPoint>>>(iter: I) -> Self {
        let mut set = IntervalSet::new();
        for range in iter {
            set.union(range);
        }
        set
    }
}

impl fmt::Display for IntervalSet {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for range in &self.ranges {
            write!(f, "[{},{})", range.start.index(), range.end.index())?;
        }
        Ok(())
    }
}

/// The program points over which a storage location holds a live value.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LiveInterval {
    storage: StorageId,
    ranges: IntervalSet,
}

impl LiveInterval {
    /// Creates a live interval for `storage` over `ranges`.
    #[must_use]
    pub fn new(storage: StorageId, ranges: IntervalSet) -> Self {
        LiveInterval { storage, ranges }
    }

    /// The storage location this interval describes.
    #[must_use]
    pub fn storage(&self) -> StorageId {
        self.storage
    }

    /// The live ranges.
    #[must_use]
    pub fn ranges(&self) -> &IntervalSet {
        &self.ranges
    }

    /// `true` if the value is live at `point`.
    #[must_use]
    pub fn live_at(&self, point: ProgramPoint) -> bool {
        self.ranges.contains(point)
    }

    /// See [`IntervalSet::find`].
    #[must_use]
    pub fn find(&self, point: ProgramPoint) -> Option<&Range<ProgramPoint>> {
        self.ranges.find(point)
    }

    /// `true` if the interval covers no point.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.ranges.is_empty()
    }
}

impl fmt::Display for LiveInterval {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} = {}", self.storage, self.ranges)
    }
}

/// Source of live intervals for the shadow tracker.
///
/// Register allocators keep their own live-range representation; implementing this trait
/// over it avoids converting. [`LiveIntervals`](crate::live::LiveIntervals) is the
/// implementation computed from a function.
pub trait LiveRangeOracle {
    /// The live interval of `storage`, or `None` if it is never live.
    fn interval(&self, storage: StorageId) -> Option<&LiveInterval>;

    /// `true` if `storage` holds a live value at `point`.
    fn live_at(&self, storage: StorageId, point: ProgramPoint) -> bool {
        self.interval(storage)
            .is_some_and(|interval| interval.live_at(point))
    }

    /// The first live range of `storage` ending after `point`.
    fn find(&self, storage: StorageId, point: ProgramPoint) -> Option<Range<ProgramPoint>> {
        self.interval(storage)
            .and_then(|interval| interval.find(point))
            .cloned()
    }
}
