//! Boundary selection over many functions.
//!
//! Functions share nothing during selection, so the driver hands them to the rayon pool
//! unless [`AnalysisConfig::parallel`] is off. Results are returned in input order either way.

use log::info;
use rayon::prelude::*;

use crate::{
    analysis::{AliasOracle, IdempotenceAnalysis},
    ir::Function,
    AnalysisConfig,
};

/// Runs [`IdempotenceAnalysis`] on every function.
///
/// The oracle is shared between worker threads and must therefore be `Sync`.
///
/// # Examples
///
/// ```rust
/// use idemregions::{analyze_functions, AnalysisConfig, BasicAliasOracle};
/// use idemregions::ir::{Address, FunctionBuilder};
///
/// let mut functions = Vec::new();
/// for name in ["a", "b"] {
///     let mut b = FunctionBuilder::new(name);
///     let entry = b.block("entry");
///     b.switch_to(entry);
///     b.load(Address::object(0, 0), 4);
///     b.store(Address::object(0, 0), 4);
///     functions.push(b.finish()?);
/// }
///
/// let results = analyze_functions(&functions, &BasicAliasOracle, &AnalysisConfig::default());
/// assert_eq!(results[1].function_name(), "b");
/// assert!(results.iter().all(|r| r.boundaries().len() == 1));
/// # Ok::<(), idemregions::Error>(())
/// ```
pub fn analyze_functions<A>(
    functions: &[Function],
    oracle: &A,
    config: &AnalysisConfig,
) -> Vec<IdempotenceAnalysis>
where
    A: AliasOracle + Sync + ?Sized,
{
    let results: Vec<IdempotenceAnalysis> = if config.parallel {
        functions
            .par_iter()
            .map(|function| IdempotenceAnalysis::run(function, oracle))
            .collect()
    } else {
        functions
            .iter()
            .map(|function| IdempotenceAnalysis::run(function, oracle))
            .collect()
    };

    info!(
        "selected {} boundaries across {} functions",
        results.iter().map(|r| r.boundaries().len()).sum::<usize>(),
        functions.len()
    );
    results
}
