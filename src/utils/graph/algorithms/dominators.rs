//! Dominator tree computation.
//!
//! A node `a` dominates `b` if every path from the entry to `b` passes through `a`. The tree
//! is computed with the iterative algorithm of Cooper, Harvey and Kennedy ("A Simple, Fast
//! Dominance Algorithm"): immediate dominators are refined over reverse postorder until a
//! fixpoint, intersecting candidate dominators by walking up postorder numbers.
//!
//! Nodes unreachable from the entry have no immediate dominator and are dominated only by
//! themselves.

use crate::utils::graph::{
    algorithms::traversal::postorder, NodeId, Predecessors, RootedGraph, Successors,
};

/// The dominator tree of a rooted graph.
///
/// # Examples
///
/// ```rust
/// use idemregions::utils::graph::{algorithms::compute_dominators, DirectedGraph};
///
/// // entry -> left, entry -> right, left -> join, right -> join
/// let mut graph = DirectedGraph::new();
/// let entry = graph.add_node("entry");
/// let left = graph.add_node("left");
/// let right = graph.add_node("right");
/// let join = graph.add_node("join");
/// graph.add_edge(entry, left)?;
/// graph.add_edge(entry, right)?;
/// graph.add_edge(left, join)?;
/// graph.add_edge(right, join)?;
///
/// let tree = compute_dominators(&graph, entry);
/// assert_eq!(tree.immediate_dominator(join), Some(entry));
/// assert!(!tree.dominates(left, join));
/// # Ok::<(), idemregions::Error>(())
/// ```
#[derive(Debug, Clone)]
pub struct DominatorTree {
    entry: NodeId,
    idom: Vec<Option<NodeId>>,
}

impl DominatorTree {
    /// Returns the root of the tree.
    #[must_use]
    pub fn entry(&self) -> NodeId {
        self.entry
    }

    /// Returns the immediate dominator of `node`.
    ///
    /// `None` for the entry, for unreachable nodes and for ids outside the graph.
    #[must_use]
    pub fn immediate_dominator(&self, node: NodeId) -> Option<NodeId> {
        if node == self.entry {
            return None;
        }
        self.idom.get(node.index()).copied().flatten()
    }

    /// Returns `true` if `a` dominates `b`. Every node dominates itself.
    #[must_use]
    pub fn dominates(&self, a: NodeId, b: NodeId) -> bool {
        self.dominators(b).any(|d| d == a)
    }

    /// Returns `true` if `a` dominates `b` and `a != b`.
    #[must_use]
    pub fn strictly_dominates(&self, a: NodeId, b: NodeId) -> bool {
        a != b && self.dominates(a, b)
    }

    /// Returns `true` if `node` is the entry or reachable from it.
    #[must_use]
    pub fn is_reachable(&self, node: NodeId) -> bool {
        node == self.entry || self.immediate_dominator(node).is_some()
    }

    /// Iterates over the dominators of `node`, starting with `node` itself and ending at the
    /// entry (or at `node` alone if it is unreachable).
    pub fn dominators(&self, node: NodeId) -> impl Iterator<Item = NodeId> + '_ {
        std::iter::successors(Some(node), move |&current| {
            self.immediate_dominator(current)
        })
    }

    /// Depth of `node` in the tree; the entry and unreachable nodes have depth 0.
    #[must_use]
    pub fn depth(&self, node: NodeId) -> usize {
        self.dominators(node).count() - 1
    }

    /// Returns the nodes immediately dominated by `node`, in ascending order.
    #[must_use]
    pub fn children(&self, node: NodeId) -> Vec<NodeId> {
        (0..self.idom.len())
            .map(NodeId::new)
            .filter(|&child| self.immediate_dominator(child) == Some(node))
            .collect()
    }

    /// Number of nodes the tree was computed for.
    #[must_use]
    pub fn node_count(&self) -> usize {
        self.idom.len()
    }
}

/// Computes the dominator tree of `graph` rooted at `entry`.
pub fn compute_dominators<G>(graph: &G, entry: NodeId) -> DominatorTree
where
    G: Successors + Predecessors,
{
    let count = graph.node_count();
    let mut idom: Vec<Option<NodeId>> = vec![None; count];
    if entry.index() >= count {
        return DominatorTree { entry, idom };
    }

    let order = postorder(graph, entry);
    let mut rank = vec![usize::MAX; count];
    for (position, node) in order.iter().enumerate() {
        rank[node.index()] = position;
    }

    idom[entry.index()] = Some(entry);
    let mut changed = true;
    while changed {
        changed = false;
        for &node in order.iter().rev() {
            if node == entry {
                continue;
            }

            let mut candidate: Option<NodeId> = None;
            for pred in graph.predecessors(node) {
                if idom[pred.index()].is_none() {
                    continue;
                }
                candidate = Some(match candidate {
                    None => pred,
                    Some(current) => intersect(&idom, &rank, pred, current),
                });
            }

            if candidate.is_some() && idom[node.index()] != candidate {
                idom[node.index()] = candidate;
                changed = true;
            }
        }
    }

    idom[entry.index()] = None;
    DominatorTree { entry, idom }
}

/// Computes the dominator tree of a rooted graph from its own entry.
pub fn compute_dominators_rooted<G: RootedGraph>(graph: &G) -> DominatorTree {
    compute_dominators(graph, graph.entry())
}

/// Walks both fingers up the tree until they meet at the nearest common dominator.
fn intersect(idom: &[Option<NodeId>], rank: &[usize], a: NodeId, b: NodeId) -> NodeId {
    let (mut left, mut right) = (a, b);
    while left != right {
        while rank[left.index()] < rank[right.index()] {
            match idom[left.index()] {
                Some(up) => left = up,
                None => return right,
            }
        }
        while rank[right.index()] < rank[left.index()] {
            match idom[right.index()] {
                Some(up) => right = up,
                None => return left,
            }
        }
    }
    left
}
