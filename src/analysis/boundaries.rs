//! The boundary selection pipeline.
//!
//! ```text
//! Function ─► AntiDependencyFinder ─► PathEnumerator ─► HittingSetSolver ─► BoundarySet
//! ```
//!
//! Every selected store becomes a region entry: a boundary placed immediately before it cuts
//! each anti-dependence path it lies on. Paths are solved keyed by layout position, so ties in
//! the greedy selection go to the earliest store in program order.

use std::{collections::BTreeSet, fmt};

use log::debug;

use crate::{
    analysis::{
        hitting::{HittingSetSolver, SelectionStep},
        AliasOracle, AntiDependencePair, AntiDependencePath, AntiDependencyFinder, PathEnumerator,
    },
    ir::{BlockId, Function, InstId},
};

/// Instructions selected as region entries.
///
/// Ordered by instruction id; iteration is deterministic.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct BoundarySet {
    instructions: BTreeSet<InstId>,
}

impl BoundarySet {
    /// Creates an empty set.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds a boundary. Returns `true` if it was not present.
    pub fn insert(&mut self, inst: InstId) -> bool {
        self.instructions.insert(inst)
    }

    /// `true` if `inst` is a boundary.
    #[must_use]
    pub fn contains(&self, inst: InstId) -> bool {
        self.instructions.contains(&inst)
    }

    /// Iterates over the boundaries.
    pub fn iter(&self) -> impl Iterator<Item = InstId> + '_ {
        self.instructions.iter().copied()
    }

    /// Number of boundaries.
    #[must_use]
    pub fn len(&self) -> usize {
        self.instructions.len()
    }

    /// `true` if there are no boundaries.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.instructions.is_empty()
    }

    /// `true` if every path contains at least one boundary.
    #[must_use]
    pub fn covers(&self, paths: &[AntiDependencePath]) -> bool {
        paths
            .iter()
            .all(|path| path.stores().iter().any(|&inst| self.contains(inst)))
    }

    /// The blocks that receive at least one boundary.
    #[must_use]
    pub fn blocks(&self, function: &Function) -> BTreeSet<BlockId> {
        self.iter()
            .filter_map(|inst| function.instruction(inst))
            .map(|inst| inst.block())
            .collect()
    }
}

impl FromIterator<InstId> for BoundarySet {
    fn from_iter<I: IntoIterator<Item = InstId>>(iter: I) -> Self {
        BoundarySet {
            instructions: iter.into_iter().collect(),
        }
    }
}

/// Everything the pipeline derived for one function.
///
/// # Examples
///
/// ```rust
/// use idemregions::{BasicAliasOracle, IdempotenceAnalysis};
/// use idemregions::ir::{Address, FunctionBuilder};
///
/// let mut b = FunctionBuilder::new("f");
/// let entry = b.block("entry");
/// b.switch_to(entry);
/// b.load(Address::object(0, 0), 4);
/// let store = b.store(Address::object(0, 0), 4);
/// let function = b.finish()?;
///
/// let analysis = IdempotenceAnalysis::run(&function, &BasicAliasOracle);
/// assert_eq!(analysis.pairs().len(), 1);
/// assert!(analysis.boundaries().contains(store));
/// println!("{}", analysis.report(&function));
/// # Ok::<(), idemregions::Error>(())
/// ```
#[derive(Debug, Clone)]
pub struct IdempotenceAnalysis {
    function: String,
    pairs: Vec<AntiDependencePair>,
    paths: Vec<AntiDependencePath>,
    selection: Vec<SelectionStep<InstId>>,
    boundaries: BoundarySet,
}

impl IdempotenceAnalysis {
    /// Runs pair discovery, path enumeration and greedy selection on `function`.
    pub fn run<A: AliasOracle + ?Sized>(function: &Function, oracle: &A) -> Self {
        let pairs = AntiDependencyFinder::new(function, oracle).find_all();
        let paths = PathEnumerator::new(function).enumerate(&pairs);

        let slots = function.slots();
        let keyed: Vec<Vec<usize>> = paths
            .iter()
            .map(|path| path.stores().iter().map(|&s| slots.layout_index(s)).collect())
            .collect();
        let solved = HittingSetSolver::new(&keyed).solve();

        let layout = slots.layout();
        let selection: Vec<SelectionStep<InstId>> = solved
            .steps()
            .iter()
            .map(|step| SelectionStep {
                element: layout[step.element],
                newly_covered: step.newly_covered,
                covered: step.covered,
            })
            .collect();
        let boundaries: BoundarySet = selection.iter().map(|step| step.element).collect();

        debug!(
            "{}: {} anti-dependence pairs, {} paths, {} boundaries",
            function.name(),
            pairs.len(),
            paths.len(),
            boundaries.len()
        );

        IdempotenceAnalysis {
            function: function.name().to_string(),
            pairs,
            paths,
            selection,
            boundaries,
        }
    }

    /// Name of the analysed function.
    #[must_use]
    pub fn function_name(&self) -> &str {
        &self.function
    }

    /// Anti-dependence pairs, ordered by store then load.
    #[must_use]
    pub fn pairs(&self) -> &[AntiDependencePair] {
        &self.pairs
    }

    /// One path per pair, in pair order.
    #[must_use]
    pub fn paths(&self) -> &[AntiDependencePath] {
        &self.paths
    }

    /// The greedy selections in the order they were made.
    #[must_use]
    pub fn selection(&self) -> &[SelectionStep<InstId>] {
        &self.selection
    }

    /// The selected region entries.
    #[must_use]
    pub fn boundaries(&self) -> &BoundarySet {
        &self.boundaries
    }

    /// Consumes the analysis, returning the selected region entries.
    #[must_use]
    pub fn into_boundaries(self) -> BoundarySet {
        self.boundaries
    }

    /// A printable dump with `block:offset` locators resolved against `function`.
    #[must_use]
    pub fn report<'a>(&'a self, function: &'a Function) -> BoundaryReport<'a> {
        BoundaryReport {
            analysis: self,
            function,
        }
    }
}

/// Diagnostic rendering of an [`IdempotenceAnalysis`].
pub struct BoundaryReport<'a> {
    analysis: &'a IdempotenceAnalysis,
    function: &'a Function,
}

impl fmt::Display for BoundaryReport<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let (analysis, function) = (self.analysis, self.function);
        let at = |inst: InstId| function.locator(inst);

        writeln!(f, "Idempotence analysis of '{}'", analysis.function)?;
        writeln!(f, "Anti-dependence pairs ({}):", analysis.pairs.len())?;
        for pair in &analysis.pairs {
            writeln!(f, "  load {} -> store {}", at(pair.load), at(pair.store))?;
        }

        writeln!(f, "Anti-dependence paths ({}):", analysis.paths.len())?;
        for path in &analysis.paths {
            let stores: Vec<String> = path.stores().iter().map(|&s| at(s)).collect();
            writeln!(f, "  [{}]", stores.join(", "))?;
        }

        writeln!(f, "Hitting set ({}):", analysis.boundaries.len())?;
        for step in &analysis.selection {
            writeln!(
                f,
                "  {} covers {} (total {})",
                at(step.element),
                step.newly_covered,
                step.covered
            )?;
        }

        let blocks: Vec<&str> = analysis
            .boundaries
            .blocks(function)
            .into_iter()
            .filter_map(|block| function.block(block).map(|b| b.name()))
            .collect();
        write!(f, "Boundary blocks: {}", blocks.join(", "))
    }
}

/// Selects region entries for `function`.
///
/// Every anti-dependence path contains at least one returned instruction. A function
/// without anti-dependences yields an empty set.
pub fn compute_boundaries<A: AliasOracle + ?Sized>(function: &Function, oracle: &A) -> BoundarySet {
    IdempotenceAnalysis::run(function, oracle).into_boundaries()
}
