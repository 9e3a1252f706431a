//! Masking of instructions during shadow computation.

use crate::ir::Instruction;

/// Selects instructions the shadow tracker treats as absent.
///
/// A coalescer rewriting copies in place can use this to hide the intermediate states it
/// produces. Closures taking an [`Instruction`] implement the trait.
pub trait IgnoreQuery {
    /// `true` if `inst` must be ignored.
    fn ignore(&self, inst: &Instruction) -> bool;
}

impl<F> IgnoreQuery for F
where
    F: Fn(&Instruction) -> bool,
{
    fn ignore(&self, inst: &Instruction) -> bool {
        self(inst)
    }
}

/// The default query: nothing is ignored.
#[derive(Debug, Clone, Copy, Default)]
pub struct NeverIgnore;

impl IgnoreQuery for NeverIgnore {
    fn ignore(&self, _: &Instruction) -> bool {
        false
    }
}
