//! Applying a placement policy to a built graph.
//!
//! A disabled policy keeps the nodes flagged in the input. An enabled policy
//! must resolve to exactly one method; ties between equally good candidates
//! are broken by a shuffle from the caller's RNG so seeded runs repeat.

use std::collections::HashSet;

use rand::seq::SliceRandom;
use rand::Rng;

use super::graph::Graph;
use super::placement::{PlacementMethod, PlacementPolicy, PlacementTarget};
use crate::analysis::shortest_path::{shortest_distances_from, PathDistance};
use crate::config::ConfigGroup;
use crate::error::NetworkError;

/// Choose the nodes `policy` places in `graph`.
///
/// High-value placement that depends on entry distance measures it from
/// `entry_nodes`, the result of the entry policy.
pub fn select_nodes<R: Rng + ?Sized>(
    graph: &Graph,
    policy: &PlacementPolicy,
    entry_nodes: &[String],
    rng: &mut R,
) -> Result<Vec<String>, NetworkError> {
    if !policy.is_enabled() {
        let flagged = match policy.target() {
            PlacementTarget::Entry => graph.entry_nodes(),
            PlacementTarget::HighValue => graph.high_value_nodes(),
        };
        return Ok(flagged.into_iter().map(String::from).collect());
    }

    let validation = policy.evaluate();
    if !validation.passed() {
        return Err(NetworkError::InvalidPolicy(validation.to_string()));
    }
    let method = policy.selected_method().ok_or_else(|| {
        NetworkError::InvalidPolicy(format!("{} has no single selection method", policy.name()))
    })?;

    let requested = usize::try_from(policy.count().unwrap_or(0)).unwrap_or(0);

    let excluded: HashSet<&str> = match policy.target() {
        // High value nodes never double as entry nodes
        PlacementTarget::HighValue => entry_nodes.iter().map(String::as_str).collect(),
        PlacementTarget::Entry => HashSet::new(),
    };
    let mut candidates: Vec<&str> = graph
        .nodes()
        .iter()
        .map(|n| n.id.as_str())
        .filter(|id| !excluded.contains(id))
        .collect();

    if requested > candidates.len() {
        log::warn!(
            "{} nodes requested by {} but only {} candidates exist, placing {}",
            requested,
            policy.name(),
            candidates.len(),
            candidates.len()
        );
    }
    let count = requested.min(candidates.len());

    candidates.shuffle(rng);
    match method {
        PlacementMethod::Random => {}
        PlacementMethod::CloseToEdge => {
            candidates.sort_by_key(|id| graph.degree(id).unwrap_or(0));
        }
        PlacementMethod::CloseToCenter => {
            candidates.sort_by_key(|id| std::cmp::Reverse(graph.degree(id).unwrap_or(0)));
        }
        PlacementMethod::FarFromEntry => {
            let sources: Vec<&str> = entry_nodes.iter().map(String::as_str).collect();
            let distances = shortest_distances_from(graph, &sources)?;
            // Furthest first; unreachable nodes count as furthest of all
            candidates.sort_by_key(|id| {
                std::cmp::Reverse(distances.get(id).unwrap_or(PathDistance::Unreachable))
            });
        }
    }

    let chosen: Vec<String> = candidates.into_iter().take(count).map(String::from).collect();
    log::debug!("{} selected {:?} using {}", policy.name(), chosen, method);
    Ok(chosen)
}

/// Rewrite the entry and high-value flags of `graph` to the given sets.
pub fn apply_selection(graph: &mut Graph, entry_nodes: &[String], high_value_nodes: &[String]) {
    for node in graph.nodes_mut() {
        node.entry_node = entry_nodes.contains(&node.id);
        node.high_value_node = high_value_nodes.contains(&node.id);
    }
}

/// Apply both policies to `graph`, entry first, and update its flags.
pub fn place_nodes<R: Rng + ?Sized>(
    graph: &mut Graph,
    entry_policy: &PlacementPolicy,
    high_value_policy: &PlacementPolicy,
    rng: &mut R,
) -> Result<(Vec<String>, Vec<String>), NetworkError> {
    let entry = select_nodes(graph, entry_policy, &[], rng)?;
    let high_value = select_nodes(graph, high_value_policy, &entry, rng)?;
    apply_selection(graph, &entry, &high_value);
    Ok((entry, high_value))
}
