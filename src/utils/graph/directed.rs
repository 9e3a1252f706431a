//! Adjacency-list directed graph.
//!
//! [`DirectedGraph`] stores node payloads densely and keeps both successor and predecessor
//! lists, so walks run equally cheaply in either direction. Parallel edges collapse into one:
//! control flow only cares whether an edge exists.

use crate::{
    utils::graph::{
        traits::{GraphBase, Predecessors, Successors},
        NodeId,
    },
    Error, Result,
};

/// A directed graph with node payloads of type `N` and unlabelled edges.
///
/// # Examples
///
/// ```rust
/// use idemregions::utils::graph::{DirectedGraph, Successors};
///
/// let mut graph = DirectedGraph::new();
/// let a = graph.add_node("a");
/// let b = graph.add_node("b");
/// graph.add_edge(a, b)?;
///
/// assert_eq!(graph.successors(a).collect::<Vec<_>>(), vec![b]);
/// # Ok::<(), idemregions::Error>(())
/// ```
#[derive(Debug, Clone)]
pub struct DirectedGraph<N> {
    nodes: Vec<N>,
    succs: Vec<Vec<NodeId>>,
    preds: Vec<Vec<NodeId>>,
    edge_count: usize,
}

impl<N> Default for DirectedGraph<N> {
    fn default() -> Self {
        Self::new()
    }
}

impl<N> DirectedGraph<N> {
    /// Creates an empty graph.
    #[must_use]
    pub fn new() -> Self {
        DirectedGraph {
            nodes: Vec::new(),
            succs: Vec::new(),
            preds: Vec::new(),
            edge_count: 0,
        }
    }

    /// Creates an empty graph with room for `nodes` nodes.
    #[must_use]
    pub fn with_capacity(nodes: usize) -> Self {
        DirectedGraph {
            nodes: Vec::with_capacity(nodes),
            succs: Vec::with_capacity(nodes),
            preds: Vec::with_capacity(nodes),
            edge_count: 0,
        }
    }

    /// Adds a node and returns its id.
    pub fn add_node(&mut self, payload: N) -> NodeId {
        let id = NodeId::new(self.nodes.len());
        self.nodes.push(payload);
        self.succs.push(Vec::new());
        self.preds.push(Vec::new());
        id
    }

    /// Adds the edge `from -> to`.
    ///
    /// # Returns
    ///
    /// `true` if the edge is new, `false` if it already existed.
    ///
    /// # Errors
    ///
    /// Returns [`Error::GraphError`] if either endpoint is not a node of this graph.
    pub fn add_edge(&mut self, from: NodeId, to: NodeId) -> Result<bool> {
        for endpoint in [from, to] {
            if endpoint.index() >= self.nodes.len() {
                return Err(Error::GraphError(format!(
                    "edge {from} -> {to} references missing node {endpoint}"
                )));
            }
        }

        if self.succs[from.index()].contains(&to) {
            return Ok(false);
        }
        self.succs[from.index()].push(to);
        self.preds[to.index()].push(from);
        self.edge_count += 1;
        Ok(true)
    }

    /// Returns the payload of `node`, if it exists.
    #[must_use]
    pub fn node(&self, node: NodeId) -> Option<&N> {
        self.nodes.get(node.index())
    }

    /// Returns the mutable payload of `node`, if it exists.
    pub fn node_mut(&mut self, node: NodeId) -> Option<&mut N> {
        self.nodes.get_mut(node.index())
    }

    /// Returns all payloads in node order.
    #[must_use]
    pub fn nodes(&self) -> &[N] {
        &self.nodes
    }

    /// Number of distinct edges.
    #[must_use]
    pub fn edge_count(&self) -> usize {
        self.edge_count
    }

    /// Returns `true` if the edge `from -> to` exists.
    #[must_use]
    pub fn has_edge(&self, from: NodeId, to: NodeId) -> bool {
        self.succs
            .get(from.index())
            .is_some_and(|succs| succs.contains(&to))
    }

    /// Number of outgoing edges of `node`.
    #[must_use]
    pub fn out_degree(&self, node: NodeId) -> usize {
        self.succs.get(node.index()).map_or(0, Vec::len)
    }

    /// Number of incoming edges of `node`.
    #[must_use]
    pub fn in_degree(&self, node: NodeId) -> usize {
        self.preds.get(node.index()).map_or(0, Vec::len)
    }
}

impl<N> GraphBase for DirectedGraph<N> {
    fn node_count(&self) -> usize {
        self.nodes.len()
    }

    fn node_ids(&self) -> impl Iterator<Item = NodeId> {
        (0..self.nodes.len()).map(NodeId::new)
    }
}

impl<N> Successors for DirectedGraph<N> {
    fn successors(&self, node: NodeId) -> impl Iterator<Item = NodeId> {
        self.succs
            .get(node.index())
            .map(|s| s.as_slice())
            .unwrap_or_default()
            .iter()
            .copied()
    }
}

impl<N> Predecessors for DirectedGraph<N> {
    fn predecessors(&self, node: NodeId) -> impl Iterator<Item = NodeId> {
        self.preds
            .get(node.index())
            .map(|p| p.as_slice())
            .unwrap_or_default()
            .iter()
            .copied()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_add_nodes_and_edges() -> Result<()> {
        let mut graph = DirectedGraph::with_capacity(3);
        let a = graph.add_node('a');
        let b = graph.add_node('b');
        let c = graph.add_node('c');

        assert!(graph.add_edge(a, b)?);
        assert!(graph.add_edge(a, c)?);
        assert!(graph.add_edge(c, a)?);
        assert!(!graph.add_edge(a, b)?);

        assert_eq!(graph.node_count(), 3);
        assert_eq!(graph.edge_count(), 3);
        assert_eq!(graph.out_degree(a), 2);
        assert_eq!(graph.in_degree(a), 1);
        assert!(graph.has_edge(c, a));
        assert!(!graph.has_edge(b, a));
        assert_eq!(graph.node(b), Some(&'b'));
        Ok(())
    }

    #[test]
    fn test_predecessors_follow_insertion_order() -> Result<()> {
        let mut graph = DirectedGraph::new();
        let nodes: Vec<NodeId> = (0..4).map(|i| graph.add_node(i)).collect();
        graph.add_edge(nodes[2], nodes[3])?;
        graph.add_edge(nodes[0], nodes[3])?;
        graph.add_edge(nodes[1], nodes[3])?;

        let preds: Vec<NodeId> = graph.predecessors(nodes[3]).collect();
        assert_eq!(preds, vec![nodes[2], nodes[0], nodes[1]]);
        Ok(())
    }

    #[test]
    fn test_invalid_edge_rejected() {
        let mut graph = DirectedGraph::new();
        let a = graph.add_node(());
        let result = graph.add_edge(a, NodeId::new(5));
        assert!(matches!(result, Err(Error::GraphError(_))));
        assert_eq!(graph.edge_count(), 0);
    }

    #[test]
    fn test_missing_node_has_no_neighbours() {
        let graph: DirectedGraph<()> = DirectedGraph::new();
        assert_eq!(graph.successors(NodeId::new(3)).count(), 0);
        assert_eq!(graph.predecessors(NodeId::new(3)).count(), 0);
        assert!(graph.node(NodeId::new(0)).is_none());
    }

    #[test]
    fn test_node_mut() {
        let mut graph = DirectedGraph::new();
        let a = graph.add_node(1);
        if let Some(value) = graph.node_mut(a) {
            *value = 9;
        }
        assert_eq!(graph.nodes(), &[9]);
    }
}
