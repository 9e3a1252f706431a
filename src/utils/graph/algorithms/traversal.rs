//! Depth-first orderings.
//!
//! - [`postorder`] - every node after all of its DFS descendants
//! - [`reverse_postorder`] - the usual iteration order for forward data flow
//! - [`reachable`] - the set of nodes reachable from a start node
//!
//! All walks are iterative and use a visited set, so they terminate on cyclic graphs.

use crate::utils::{
    graph::{NodeId, Successors},
    BitSet,
};

/// Returns the nodes reachable from `start` in depth-first postorder.
///
/// Successors are explored in the order the graph yields them. An out-of-range start yields
/// an empty order.
pub fn postorder<G: Successors>(graph: &G, start: NodeId) -> Vec<NodeId> {
    let count = graph.node_count();
    if start.index() >= count {
        return Vec::new();
    }

    let mut visited = BitSet::new(count);
    let mut order = Vec::with_capacity(count);
    // Each frame holds a node and its not-yet-explored successors.
    let mut stack: Vec<(NodeId, Vec<NodeId>)> = Vec::new();

    visited.insert(start.index());
    stack.push((start, graph.successors(start).rev_collect()));

    while let Some((node, pending)) = stack.last_mut() {
        match pending.pop() {
            Some(next) => {
                if visited.insert(next.index()) {
                    let succs = graph.successors(next).rev_collect();
                    stack.push((next, succs));
                }
            }
            None => {
                order.push(*node);
                stack.pop();
            }
        }
    }

    order
}

/// Returns the nodes reachable from `start` in reverse postorder.
///
/// Every node appears before its successors except along back edges.
pub fn reverse_postorder<G: Successors>(graph: &G, start: NodeId) -> Vec<NodeId> {
    let mut order = postorder(graph, start);
    order.reverse();
    order
}

/// Returns the set of node indices reachable from `start`, including `start` itself.
pub fn reachable<G: Successors>(graph: &G, start: NodeId) -> BitSet {
    let mut seen = BitSet::new(graph.node_count());
    if start.index() >= graph.node_count() {
        return seen;
    }

    let mut worklist = vec![start];
    seen.insert(start.index());
    while let Some(node) = worklist.pop() {
        for succ in graph.successors(node) {
            if seen.insert(succ.index()) {
                worklist.push(succ);
            }
        }
    }
    seen
}

trait RevCollect: Iterator<Item = NodeId> + Sized {
    /// Collects reversed, so that popping from the end yields the original order.
    fn rev_collect(self) -> Vec<NodeId> {
        let mut nodes: Vec<NodeId> = self.collect();
        nodes.reverse();
        nodes
    }
}

impl<I: Iterator<Item = NodeId>> RevCollect for I {}
