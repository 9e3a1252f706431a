//! The shadow of one storage location.

use std::fmt;

use crate::{
    ir::{ProgramPoint, StorageId},
    live::IntervalSet,
};

/// The program points over which a storage location must not be overwritten for the
/// regions it is live into to stay idempotent.
///
/// Always disjoint from the location's own live interval. A location that is not live
/// into any region has an empty shadow.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ShadowInterval {
    storage: StorageId,
    name: String,
    pub(crate) ranges: IntervalSet,
}

impl ShadowInterval {
    pub(crate) fn new(storage: StorageId, name: impl Into<String>) -> Self {
        ShadowInterval {
            storage,
            name: name.into(),
            ranges: IntervalSet::new(),
        }
    }

    /// The storage location this shadow belongs to.
    #[must_use]
    pub fn storage(&self) -> StorageId {
        self.storage
    }

    /// The shadow ranges.
    #[must_use]
    pub fn ranges(&self) -> &IntervalSet {
        &self.ranges
    }

    /// Number of program points covered.
    #[must_use]
    pub fn size(&self) -> usize {
        self.ranges.size()
    }

    /// `true` if the shadow covers `point`.
    #[must_use]
    pub fn is_shadow_at(&self, point: ProgramPoint) -> bool {
        self.ranges.contains(point)
    }

    /// `true` if the shadow covers nothing.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.ranges.is_empty()
    }
}

impl fmt::Display for ShadowInterval {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "ShadowInterval {} = ", self.name)?;
        if self.ranges.is_empty() {
            return write!(f, "empty");
        }
        write!(f, "{}", self.ranges)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_display() {
        let mut shadow = ShadowInterval::new(StorageId::new(0), "x");
        assert_eq!(shadow.to_string(), "ShadowInterval x = empty");

        shadow.ranges.union(ProgramPoint::new(3)..ProgramPoint::new(6));
        shadow.ranges.union(ProgramPoint::new(9)..ProgramPoint::new(10));
        assert_eq!(shadow.to_string(), "ShadowInterval x = [3,6)[9,10)");
        assert_eq!(shadow.size(), 4);
        assert!(shadow.is_shadow_at(ProgramPoint::new(5)));
        assert!(!shadow.is_shadow_at(ProgramPoint::new(6)));
    }
}
