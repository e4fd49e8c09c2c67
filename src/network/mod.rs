//! Network model: placement policies, configuration, graph construction and
//! node selection.

pub mod builder;
pub mod config;
pub mod csv;
pub mod graph;
pub mod layout;
pub mod placement;
pub mod selection;
pub mod vulnerability_range;

pub use builder::{BuildOptions, BuiltNetwork, NetworkBuilder, VulnerabilitySource};
pub use config::NetworkConfig;
pub use csv::{parse_network_csv, parse_network_csv_file, parse_network_json, NetworkRow};
pub use graph::{Graph, Node, Position};
pub use layout::circular_layout;
pub use placement::{PlacementBase, PlacementKind, PlacementMethod, PlacementPolicy, PlacementTarget};
pub use selection::{apply_selection, place_nodes, select_nodes};
pub use vulnerability_range::VulnerabilityRange;
