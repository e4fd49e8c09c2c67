//! Concrete network graph.
//!
//! Nodes are keyed by a stable string id and keep their insertion order.
//! Edges are undirected and unweighted. A graph has a single writer while it
//! is being built and is only read afterwards.

use std::collections::{BTreeSet, HashMap};

use serde::{Deserialize, Serialize};

use crate::error::NetworkError;

/// 2D position of a node in the network diagram.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct Position {
    pub x: f64,
    pub y: f64,
}

impl Position {
    pub fn new(x: f64, y: f64) -> Self {
        Self { x, y }
    }
}

/// A node of the simulated network.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Node {
    pub id: String,
    pub position: Position,
    pub entry_node: bool,
    pub high_value_node: bool,
    /// Vulnerability score in `[0, 1]`.
    pub vulnerability: f64,
}

impl Node {
    pub fn new(id: &str, entry_node: bool, high_value_node: bool, vulnerability: f64) -> Self {
        Self {
            id: id.to_string(),
            position: Position::default(),
            entry_node,
            high_value_node,
            vulnerability: vulnerability.clamp(0.0, 1.0),
        }
    }
}

/// Undirected, unweighted graph of [`Node`]s.
#[derive(Debug, Clone, Default)]
pub struct Graph {
    nodes: Vec<Node>,
    index: HashMap<String, usize>,
    adjacency: Vec<BTreeSet<usize>>,
}

impl Graph {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add_node(&mut self, node: Node) -> Result<(), NetworkError> {
        if self.index.contains_key(&node.id) {
            return Err(NetworkError::DuplicateNode(node.id));
        }
        self.index.insert(node.id.clone(), self.nodes.len());
        self.nodes.push(node);
        self.adjacency.push(BTreeSet::new());
        Ok(())
    }

    /// Connect two existing nodes. Both endpoints must already be present.
    pub fn add_edge(&mut self, a: &str, b: &str) -> Result<(), NetworkError> {
        let ia = self.position_of(a)?;
        let ib = self.position_of(b)?;
        self.adjacency[ia].insert(ib);
        self.adjacency[ib].insert(ia);
        Ok(())
    }

    fn position_of(&self, id: &str) -> Result<usize, NetworkError> {
        self.index
            .get(id)
            .copied()
            .ok_or_else(|| NetworkError::UnknownNode(id.to_string()))
    }

    pub fn contains(&self, id: &str) -> bool {
        self.index.contains_key(id)
    }

    pub fn node(&self, id: &str) -> Option<&Node> {
        self.index.get(id).map(|&i| &self.nodes[i])
    }

    pub fn node_mut(&mut self, id: &str) -> Option<&mut Node> {
        match self.index.get(id) {
            Some(&i) => Some(&mut self.nodes[i]),
            None => None,
        }
    }

    /// Nodes in insertion order.
    pub fn nodes(&self) -> &[Node] {
        &self.nodes
    }

    pub fn nodes_mut(&mut self) -> impl Iterator<Item = &mut Node> {
        self.nodes.iter_mut()
    }

    pub fn node_count(&self) -> usize {
        self.nodes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    pub fn edge_count(&self) -> usize {
        let mut count = 0;
        for (i, neighbours) in self.adjacency.iter().enumerate() {
            // Count each undirected edge once; self-loops once
            count += neighbours.iter().filter(|&&j| j >= i).count();
        }
        count
    }

    pub fn neighbours(&self, id: &str) -> Result<Vec<&str>, NetworkError> {
        let i = self.position_of(id)?;
        Ok(self.adjacency[i]
            .iter()
            .map(|&j| self.nodes[j].id.as_str())
            .collect())
    }

    pub fn degree(&self, id: &str) -> Result<usize, NetworkError> {
        let i = self.position_of(id)?;
        Ok(self.adjacency[i].len())
    }

    pub fn has_edge(&self, a: &str, b: &str) -> bool {
        match (self.index.get(a), self.index.get(b)) {
            (Some(&ia), Some(&ib)) => self.adjacency[ia].contains(&ib),
            _ => false,
        }
    }

    pub fn entry_nodes(&self) -> Vec<&str> {
        self.nodes
            .iter()
            .filter(|n| n.entry_node)
            .map(|n| n.id.as_str())
            .collect()
    }

    pub fn high_value_nodes(&self) -> Vec<&str> {
        self.nodes
            .iter()
            .filter(|n| n.high_value_node)
            .map(|n| n.id.as_str())
            .collect()
    }

    pub fn set_position(&mut self, id: &str, position: Position) -> Result<(), NetworkError> {
        let node = self
            .node_mut(id)
            .ok_or_else(|| NetworkError::UnknownNode(id.to_string()))?;
        node.position = position;
        Ok(())
    }

    /// Node ids sorted lexicographically; the row order of
    /// [`Graph::adjacency_matrix`].
    pub fn sorted_ids(&self) -> Vec<&str> {
        let mut ids: Vec<&str> = self.nodes.iter().map(|n| n.id.as_str()).collect();
        ids.sort_unstable();
        ids
    }

    /// Symmetric 0/1 adjacency matrix in [`Graph::sorted_ids`] order.
    pub fn adjacency_matrix(&self) -> Vec<Vec<u8>> {
        let ids = self.sorted_ids();
        ids.iter()
            .map(|a| {
                ids.iter()
                    .map(|b| u8::from(self.has_edge(a, b)))
                    .collect()
            })
            .collect()
    }
}
