//! Hitting sets over anti-dependence paths.
//!
//! A hitting set contains at least one element of every input set. Finding a minimum one is
//! NP-hard, so [`HittingSetSolver`] runs the greedy maximum-coverage heuristic: repeatedly
//! take the element contained in the most not-yet-covered sets. Ties go to the smallest
//! element, which makes results reproducible.
//!
//! [`pairwise_vertex_cover`] is a more conservative alternative that covers the
//! co-occurrence graph of the sets instead of the sets themselves. It is not used by the
//! boundary pipeline.

use std::{
    collections::{BTreeMap, BTreeSet},
    fmt,
};

use log::{trace, warn};

use crate::utils::BitSet;

/// One greedy selection.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SelectionStep<T> {
    /// The element selected.
    pub element: T,
    /// Sets covered for the first time by this element.
    pub newly_covered: usize,
    /// Sets covered after this step.
    pub covered: usize,
}

/// The result of [`HittingSetSolver::solve`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HittingSet<T: Ord> {
    elements: BTreeSet<T>,
    steps: Vec<SelectionStep<T>>,
    skipped: usize,
}

impl<T: Ord + Copy> HittingSet<T> {
    /// The selected elements.
    #[must_use]
    pub fn elements(&self) -> &BTreeSet<T> {
        &self.elements
    }

    /// Consumes the result, returning the selected elements.
    #[must_use]
    pub fn into_elements(self) -> BTreeSet<T> {
        self.elements
    }

    /// The selections in the order they were made.
    #[must_use]
    pub fn steps(&self) -> &[SelectionStep<T>] {
        &self.steps
    }

    /// Number of empty input sets, which no element can cover.
    #[must_use]
    pub fn skipped(&self) -> usize {
        self.skipped
    }

    /// Number of selected elements.
    #[must_use]
    pub fn len(&self) -> usize {
        self.elements.len()
    }

    /// `true` if nothing was selected.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.elements.is_empty()
    }
}

/// Greedy maximum-coverage hitting-set solver.
///
/// # Examples
///
/// ```rust
/// use idemregions::analysis::HittingSetSolver;
///
/// let paths = vec![vec![5], vec![3, 5, 7], vec![5, 7, 9]];
/// let result = HittingSetSolver::new(&paths).solve();
/// assert_eq!(result.elements().iter().copied().collect::<Vec<_>>(), vec![5]);
/// ```
pub struct HittingSetSolver<T> {
    sets: Vec<Vec<T>>,
}

impl<T: Ord + Copy + fmt::Debug> HittingSetSolver<T> {
    /// Creates a solver for `sets`. Duplicate elements within a set are ignored.
    pub fn new<S: AsRef<[T]>>(sets: &[S]) -> Self {
        let sets = sets
            .iter()
            .map(|set| {
                let mut unique = set.as_ref().to_vec();
                unique.sort_unstable();
                unique.dedup();
                unique
            })
            .collect();
        HittingSetSolver { sets }
    }

    /// Runs the greedy selection until every non-empty set is covered.
    #[must_use]
    pub fn solve(&self) -> HittingSet<T> {
        let mut containing: BTreeMap<T, Vec<usize>> = BTreeMap::new();
        for (index, set) in self.sets.iter().enumerate() {
            for &element in set {
                containing.entry(element).or_default().push(index);
            }
        }
        let mut count: BTreeMap<T, usize> = containing
            .iter()
            .map(|(&element, sets)| (element, sets.len()))
            .collect();

        let skipped = self.sets.iter().filter(|set| set.is_empty()).count();
        if skipped > 0 {
            warn!("{skipped} empty set(s) cannot be covered and are ignored");
        }

        let coverable = self.sets.len() - skipped;
        let mut covered = BitSet::new(self.sets.len());
        let mut elements = BTreeSet::new();
        let mut steps = Vec::new();

        while covered.count() < coverable {
            // Strictly greater keeps the smallest element among ties.
            let best = count
                .iter()
                .filter(|&(_, &c)| c > 0)
                .fold(None, |best: Option<(T, usize)>, (&element, &c)| match best {
                    Some((_, top)) if top >= c => best,
                    _ => Some((element, c)),
                });
            let Some((element, _)) = best else {
                break;
            };

            count.remove(&element);
            let mut newly_covered = 0;
            for index in containing.remove(&element).unwrap_or_default() {
                if !covered.insert(index) {
                    continue;
                }
                newly_covered += 1;
                for other in &self.sets[index] {
                    if let Some(c) = count.get_mut(other) {
                        *c = c.saturating_sub(1);
                    }
                }
            }

            if newly_covered > 0 {
                trace!("selected {element:?}: {newly_covered} new, {} covered", covered.count());
                elements.insert(element);
                steps.push(SelectionStep {
                    element,
                    newly_covered,
                    covered: covered.count(),
                });
            }
        }

        HittingSet {
            elements,
            steps,
            skipped,
        }
    }
}

/// Covers every pair of elements that occur together in some set.
///
/// Builds the co-occurrence graph (an edge between each two distinct elements of one set)
/// and greedily takes the highest-degree vertex, smallest first on ties, until no edge is
/// left. Singleton sets contribute no edges and so stay uncovered, while a set of `k`
/// elements needs `k - 1` of them; the result is therefore not a hitting set of the input.
///
/// ```rust
/// use idemregions::analysis::pairwise_vertex_cover;
///
/// let cover = pairwise_vertex_cover(&[vec![1, 2, 3]]);
/// assert_eq!(cover.len(), 2);
/// ```
pub fn pairwise_vertex_cover<T: Ord + Copy, S: AsRef<[T]>>(sets: &[S]) -> BTreeSet<T> {
    let mut edges: BTreeSet<(T, T)> = BTreeSet::new();
    for set in sets {
        let set = set.as_ref();
        for (i, &a) in set.iter().enumerate() {
            for &b in &set[i + 1..] {
                if a != b {
                    edges.insert((a.min(b), a.max(b)));
                }
            }
        }
    }

    let mut cover = BTreeSet::new();
    while !edges.is_empty() {
        let mut degree: BTreeMap<T, usize> = BTreeMap::new();
        for &(a, b) in &edges {
            *degree.entry(a).or_default() += 1;
            *degree.entry(b).or_default() += 1;
        }
        let Some(vertex) = degree
            .iter()
            .fold(None, |best: Option<(T, usize)>, (&v, &d)| match best {
                Some((_, top)) if top >= d => best,
                _ => Some((v, d)),
            })
            .map(|(v, _)| v)
        else {
            break;
        };

        cover.insert(vertex);
        edges.retain(|&(a, b)| a != vertex && b != vertex);
    }
    cover
}
