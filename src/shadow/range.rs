//! Range splitting used when subtracting one interval set from a candidate range.

use std::ops::Range;

use crate::ir::ProgramPoint;

/// Splits `candidate` against the first range of some set that ends after
/// `candidate.start`.
///
/// Returns the leading part of `candidate` that does not overlap `conflict`, if there is
/// one, together with the point from which the rest of `candidate` still has to be checked:
///
/// - `conflict` starts at or after the end of `candidate`: the whole candidate is free and
///   nothing is left to check;
/// - `conflict` covers the start of `candidate`: nothing is free before `conflict.end`;
/// - otherwise `[candidate.start, conflict.start)` is free and checking resumes at
///   `conflict.end`.
///
/// The resume point may lie beyond `candidate.end`.
///
/// # Examples
///
/// ```rust
/// use idemregions::shadow::non_overlapping_sub_range;
/// use idemregions::ProgramPoint;
///
/// let p = ProgramPoint::new;
/// assert_eq!(non_overlapping_sub_range(p(2)..p(10), p(6)..p(8)), (Some(p(2)..p(6)), p(8)));
/// assert_eq!(non_overlapping_sub_range(p(2)..p(10), p(0)..p(4)), (None, p(4)));
/// assert_eq!(non_overlapping_sub_range(p(2)..p(10), p(12)..p(14)), (Some(p(2)..p(10)), p(10)));
/// ```
#[must_use]
pub fn non_overlapping_sub_range(
    candidate: Range<ProgramPoint>,
    conflict: Range<ProgramPoint>,
) -> (Option<Range<ProgramPoint>>, ProgramPoint) {
    debug_assert!(candidate.start < candidate.end && conflict.start < conflict.end);
    debug_assert!(conflict.end > candidate.start);

    if conflict.start >= candidate.end {
        let end = candidate.end;
        return (Some(candidate), end);
    }
    if conflict.start <= candidate.start {
        return (None, conflict.end);
    }
    (Some(candidate.start..conflict.start), conflict.end)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn p(index: usize) -> ProgramPoint {
        ProgramPoint::new(index)
    }

    #[test]
    fn test_conflict_after_candidate() {
        assert_eq!(
            non_overlapping_sub_range(p(4)..p(8), p(8)..p(9)),
            (Some(p(4)..p(8)), p(8))
        );
    }

    #[test]
    fn test_conflict_covers_start() {
        assert_eq!(non_overlapping_sub_range(p(4)..p(8), p(4)..p(6)), (None, p(6)));
        assert_eq!(non_overlapping_sub_range(p(4)..p(8), p(1)..p(20)), (None, p(20)));
    }

    #[test]
    fn test_conflict_inside_candidate() {
        assert_eq!(
            non_overlapping_sub_range(p(4)..p(8), p(5)..p(6)),
            (Some(p(4)..p(5)), p(6))
        );
        assert_eq!(
            non_overlapping_sub_range(p(4)..p(8), p(7)..p(12)),
            (Some(p(4)..p(7)), p(12))
        );
    }
}
