//! # Breachnet - Network configuration toolkit for cyber-defence simulations
//!
//! This library builds the simulated networks that attack/defence training
//! scenarios run on, and describes how their entry points, high-value
//! targets and node vulnerabilities are chosen.
//!
//! ## Overview
//!
//! A network is described by a CSV table of nodes, flags, feed identifiers
//! and connections. Node vulnerabilities come from a vulnerability feed when
//! one answers, or are drawn at random within a configurable range. The
//! resulting graph is snapshotted into a [`network::NetworkConfig`], a
//! validated configuration document that round-trips through JSON or YAML.
//!
//! ## Key Features
//!
//! - **Constrained configuration**: typed items with bounds, defaults and
//!   aliases, grouped with cross-field rules and collected validation reports
//! - **Placement policies**: random, edge, center or far-from-entry placement
//!   of entry and high-value nodes, with exactly one method in force
//! - **Feed resolution**: best-effort scoring with a timeout and random fallback
//! - **Entry distances**: multi-source breadth-first hop counts
//!
//! ## Architecture
//!
//! - `config`: constrained items, config groups and validation results
//! - `network`: placement policies, graph, CSV input, builder and selection
//! - `resolver`: vulnerability feed trait, table-backed feed and scoring
//! - `analysis`: shortest paths from the entry nodes
//! - `config_loader`: reading and writing configuration documents
//! - `error`: error types
//! - `utils`: duration parsing and command line validation
//!
//! ## Example Usage
//!
//! ```rust,no_run
//! use breachnet::analysis::shortest_entry_distances;
//! use breachnet::network::{BuildOptions, NetworkBuilder, NetworkConfig};
//! use std::path::Path;
//!
//! let built = NetworkBuilder::new(BuildOptions::default())
//!     .build_from_file(Path::new("network.csv"))?;
//! let distances = shortest_entry_distances(&built.graph)?;
//! let config = NetworkConfig::from_built(&built);
//! breachnet::config_loader::save_network_config(&config, Path::new("network.json"))?;
//! # Ok::<(), color_eyre::Report>(())
//! ```

pub mod analysis;
pub mod config;
pub mod config_loader;
pub mod error;
pub mod network;
pub mod resolver;
pub mod utils;

pub use error::{ConfigError, NetworkError};
pub use resolver::ResolveError;
