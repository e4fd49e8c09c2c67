//! Graph analysis over built networks.

pub mod shortest_path;

pub use shortest_path::{shortest_distances_from, shortest_entry_distances, EntryDistances, PathDistance};
