//! Automatic node positioning.

use std::f64::consts::TAU;

use super::graph::{Graph, Position};

/// Radius of the circle nodes are placed on.
const LAYOUT_RADIUS: f64 = 1.0;

/// Place nodes evenly on a circle, in insertion order, starting at angle 0.
/// A single node sits at the origin.
pub fn circular_layout(graph: &mut Graph) {
    let n = graph.node_count();
    if n == 1 {
        for node in graph.nodes_mut() {
            node.position = Position::default();
        }
        return;
    }
    for (i, node) in graph.nodes_mut().enumerate() {
        let angle = TAU * i as f64 / n as f64;
        node.position = Position::new(LAYOUT_RADIUS * angle.cos(), LAYOUT_RADIUS * angle.sin());
    }
}
