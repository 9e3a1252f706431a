//! Alias queries between memory locations.
//!
//! The anti-dependence search treats every answer other than [`AliasResult::NoAlias`] as a
//! potential conflict, so an oracle that lacks information must answer
//! [`AliasResult::MayAlias`].

use strum::Display;

use crate::ir::{AddressBase, MemoryLocation};

/// Answer to an alias query.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Display)]
pub enum AliasResult {
    /// The locations never overlap.
    NoAlias,
    /// The locations might overlap.
    MayAlias,
    /// The locations are the same bytes.
    MustAlias,
}

/// Answers whether two memory locations may overlap.
///
/// Implemented for closures, which keeps test oracles short:
///
/// ```rust
/// use idemregions::{AliasOracle, AliasResult};
/// use idemregions::ir::{Address, MemoryLocation};
///
/// let never = |_: &MemoryLocation, _: &MemoryLocation| AliasResult::NoAlias;
/// let loc = MemoryLocation { address: Address::unknown(), size: 4 };
/// assert_eq!(never.alias(&loc, &loc), AliasResult::NoAlias);
/// ```
pub trait AliasOracle {
    /// Relates the bytes of `a` to the bytes of `b`.
    fn alias(&self, a: &MemoryLocation, b: &MemoryLocation) -> AliasResult;
}

impl<F> AliasOracle for F
where
    F: Fn(&MemoryLocation, &MemoryLocation) -> AliasResult,
{
    fn alias(&self, a: &MemoryLocation, b: &MemoryLocation) -> AliasResult {
        self(a, b)
    }
}

/// An oracle without any information: everything may alias.
#[derive(Debug, Clone, Copy, Default)]
pub struct ConservativeAliasOracle;

impl AliasOracle for ConservativeAliasOracle {
    fn alias(&self, _: &MemoryLocation, _: &MemoryLocation) -> AliasResult {
        AliasResult::MayAlias
    }
}

/// An oracle reasoning about address bases and constant offsets.
///
/// - Accesses of zero bytes touch nothing.
/// - Unknown bases may alias anything.
/// - Equal bases compare byte ranges: identical ranges must alias, disjoint ranges do not,
///   partial overlap may.
/// - Distinct identified objects never alias.
/// - Any other pair of bases may alias.
#[derive(Debug, Clone, Copy, Default)]
pub struct BasicAliasOracle;

impl AliasOracle for BasicAliasOracle {
    fn alias(&self, a: &MemoryLocation, b: &MemoryLocation) -> AliasResult {
        if a.size == 0 || b.size == 0 {
            return AliasResult::NoAlias;
        }

        match (a.address.base, b.address.base) {
            (AddressBase::Unknown, _) | (_, AddressBase::Unknown) => AliasResult::MayAlias,
            (left, right) if left == right => {
                let (a_start, b_start) = (a.address.offset, b.address.offset);
                let a_end = a_start.saturating_add(i64::from(a.size));
                let b_end = b_start.saturating_add(i64::from(b.size));
                if a_start == b_start && a.size == b.size {
                    AliasResult::MustAlias
                } else if a_end <= b_start || b_end <= a_start {
                    AliasResult::NoAlias
                } else {
                    AliasResult::MayAlias
                }
            }
            (AddressBase::Object(_), AddressBase::Object(_)) => AliasResult::NoAlias,
            _ => AliasResult::MayAlias,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ir::{Address, InstId};

    fn loc(address: Address, size: u32) -> MemoryLocation {
        MemoryLocation { address, size }
    }

    #[test]
    fn test_same_object_offsets() {
        let oracle = BasicAliasOracle;
        let whole = loc(Address::object(1, 0), 4);
        assert_eq!(oracle.alias(&whole, &whole), AliasResult::MustAlias);
        assert_eq!(
            oracle.alias(&whole, &loc(Address::object(1, 4), 4)),
            AliasResult::NoAlias
        );
        assert_eq!(
            oracle.alias(&whole, &loc(Address::object(1, 2), 4)),
            AliasResult::MayAlias
        );
        assert_eq!(
            oracle.alias(&whole, &loc(Address::object(1, 0), 8)),
            AliasResult::MayAlias
        );
    }

    #[test]
    fn test_distinct_bases() {
        let oracle = BasicAliasOracle;
        let a = loc(Address::object(1, 0), 4);
        let b = loc(Address::object(2, 0), 4);
        let p = loc(Address::value(InstId::new(0), 0), 4);
        assert_eq!(oracle.alias(&a, &b), AliasResult::NoAlias);
        assert_eq!(oracle.alias(&a, &p), AliasResult::MayAlias);
        assert_eq!(oracle.alias(&p, &p), AliasResult::MustAlias);
    }

    #[test]
    fn test_unknown_and_empty() {
        let oracle = BasicAliasOracle;
        let unknown = loc(Address::unknown(), 4);
        assert_eq!(oracle.alias(&unknown, &unknown), AliasResult::MayAlias);
        assert_eq!(
            oracle.alias(&unknown, &loc(Address::object(0, 0), 0)),
            AliasResult::NoAlias
        );
    }

    #[test]
    fn test_conservative_oracle() {
        let a = loc(Address::object(1, 0), 4);
        let b = loc(Address::object(2, 0), 4);
        assert_eq!(ConservativeAliasOracle.alias(&a, &b), AliasResult::MayAlias);
        assert_eq!(AliasResult::MayAlias.to_string(), "MayAlias");
    }
}
