//! Multi-source unweighted shortest paths from the entry nodes.
//!
//! Each entry node is explored independently with a breadth-first worklist
//! and its own visited set; the distance reported for a node is the minimum
//! over all entry nodes. Nodes no entry node can reach are
//! [`PathDistance::Unreachable`].

use std::cmp::Ordering;
use std::collections::{HashMap, HashSet, VecDeque};
use std::fmt;

use serde::{Serialize, Serializer};

use crate::error::NetworkError;
use crate::network::Graph;

/// Hop distance from the nearest entry node.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum PathDistance {
    Hops(usize),
    Unreachable,
}

impl PathDistance {
    pub fn hops(&self) -> Option<usize> {
        match self {
            Self::Hops(n) => Some(*n),
            Self::Unreachable => None,
        }
    }

    pub fn is_reachable(&self) -> bool {
        matches!(self, Self::Hops(_))
    }
}

impl Ord for PathDistance {
    // Unreachable sorts after every finite distance
    fn cmp(&self, other: &Self) -> Ordering {
        match (self, other) {
            (Self::Hops(a), Self::Hops(b)) => a.cmp(b),
            (Self::Hops(_), Self::Unreachable) => Ordering::Less,
            (Self::Unreachable, Self::Hops(_)) => Ordering::Greater,
            (Self::Unreachable, Self::Unreachable) => Ordering::Equal,
        }
    }
}

impl PartialOrd for PathDistance {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl fmt::Display for PathDistance {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Hops(n) => write!(f, "{}", n),
            Self::Unreachable => f.write_str("unreachable"),
        }
    }
}

// Serialized as a hop count, or null when unreachable
impl Serialize for PathDistance {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        self.hops().serialize(serializer)
    }
}

/// Distances from the entry nodes to every node, in graph order.
#[derive(Debug, Clone, PartialEq)]
pub struct EntryDistances {
    order: Vec<String>,
    distances: HashMap<String, PathDistance>,
}

impl EntryDistances {
    pub fn get(&self, id: &str) -> Option<PathDistance> {
        self.distances.get(id).copied()
    }

    /// `(node id, distance)` pairs in graph insertion order.
    pub fn iter(&self) -> impl Iterator<Item = (&str, PathDistance)> + '_ {
        self.order
            .iter()
            .map(move |id| (id.as_str(), self.distances[id]))
    }

    pub fn len(&self) -> usize {
        self.order.len()
    }

    pub fn is_empty(&self) -> bool {
        self.order.is_empty()
    }

    pub fn reachable_count(&self) -> usize {
        self.distances.values().filter(|d| d.is_reachable()).count()
    }

    pub fn unreachable(&self) -> Vec<&str> {
        self.iter()
            .filter(|(_, d)| !d.is_reachable())
            .map(|(id, _)| id)
            .collect()
    }

    /// Largest finite distance, if any node is reachable.
    pub fn eccentricity(&self) -> Option<usize> {
        self.distances.values().filter_map(PathDistance::hops).max()
    }

    /// Reachable nodes at the largest finite distance.
    pub fn furthest_nodes(&self) -> Vec<&str> {
        let Some(max) = self.eccentricity() else {
            return Vec::new();
        };
        self.iter()
            .filter(|(_, d)| *d == PathDistance::Hops(max))
            .map(|(id, _)| id)
            .collect()
    }

    /// Plain id → hop count map; unreachable nodes map to null.
    pub fn to_json(&self) -> serde_json::Map<String, serde_json::Value> {
        self.iter()
            .map(|(id, d)| {
                let value = d
                    .hops()
                    .map(serde_json::Value::from)
                    .unwrap_or(serde_json::Value::Null);
                (id.to_string(), value)
            })
            .collect()
    }
}

/// Hop distances from a single source, visiting each node at most once.
fn explore(graph: &Graph, source: &str) -> Result<HashMap<String, usize>, NetworkError> {
    let mut distances = HashMap::new();
    let mut visited: HashSet<String> = HashSet::new();
    let mut queue = VecDeque::new();

    visited.insert(source.to_string());
    distances.insert(source.to_string(), 0);
    queue.push_back((source.to_string(), 0usize));

    while let Some((current, distance)) = queue.pop_front() {
        for neighbour in graph.neighbours(&current)? {
            if visited.insert(neighbour.to_string()) {
                distances.insert(neighbour.to_string(), distance + 1);
                queue.push_back((neighbour.to_string(), distance + 1));
            }
        }
    }

    Ok(distances)
}

/// Distances from the given `sources` to every node of `graph`.
pub fn shortest_distances_from(graph: &Graph, sources: &[&str]) -> Result<EntryDistances, NetworkError> {
    for source in sources {
        if !graph.contains(source) {
            return Err(NetworkError::UnknownEntryNode(source.to_string()));
        }
    }

    let per_source = sources
        .iter()
        .map(|source| explore(graph, source))
        .collect::<Result<Vec<_>, _>>()?;

    let order: Vec<String> = graph.nodes().iter().map(|n| n.id.clone()).collect();
    let distances = order
        .iter()
        .map(|id| {
            let best = per_source
                .iter()
                .filter_map(|paths| paths.get(id).copied())
                .min()
                .map(PathDistance::Hops)
                .unwrap_or(PathDistance::Unreachable);
            (id.clone(), best)
        })
        .collect();

    Ok(EntryDistances { order, distances })
}

/// Distances from the graph's entry nodes to every node.
pub fn shortest_entry_distances(graph: &Graph) -> Result<EntryDistances, NetworkError> {
    let entry_nodes = graph.entry_nodes();
    if entry_nodes.is_empty() {
        log::warn!("Network has no entry nodes; every node is unreachable");
    }
    shortest_distances_from(graph, &entry_nodes)
}
