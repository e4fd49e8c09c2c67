//! Builds a [`Graph`] from parsed network table rows.
//!
//! Construction order matters:
//! 1. every row is indexed first so connections may reference later rows;
//! 2. vulnerabilities come from the feed when one is configured and answers
//!    (rows without identifiers score as unknown), otherwise they are random;
//! 3. all nodes are added before any edge;
//! 4. connections are wired, failing on unknown ids and self connections;
//! 5. positions are applied last (declared, or generated on request).

use std::collections::{BTreeSet, HashMap, HashSet};
use std::path::Path;
use std::sync::Arc;
use std::time::Duration;

use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

use super::csv::{parse_network_csv, parse_network_csv_file, parse_network_json, NetworkRow};
use super::graph::{Graph, Node, Position};
use super::layout::circular_layout;
use crate::error::NetworkError;
use crate::resolver::{
    find_highest_vulnerability, normalise, resolve_or_empty, VulnerabilityResolver,
    DEFAULT_FEED_TIMEOUT, UNKNOWN_IDENTIFIER_SCORE,
};

/// Options controlling network construction.
#[derive(Debug, Clone, PartialEq)]
pub struct BuildOptions {
    /// Lay nodes out automatically, ignoring declared positions.
    pub generate_positions: bool,
    /// Raw feed score range that maps onto `[0, 1]`.
    pub feed_score_range: (f64, f64),
    /// Range random scores are drawn from.
    pub random_score_range: (f64, f64),
    pub feed_timeout: Duration,
    /// Seed for reproducible random scores.
    pub seed: Option<u64>,
}

impl Default for BuildOptions {
    fn default() -> Self {
        Self {
            generate_positions: false,
            feed_score_range: (0.0, 1.0),
            random_score_range: (0.0, 1.0),
            feed_timeout: DEFAULT_FEED_TIMEOUT,
            seed: None,
        }
    }
}

/// Where the vulnerability scores of a built network came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum VulnerabilitySource {
    Feed,
    Random,
}

/// Result of a successful build.
#[derive(Debug, Clone)]
pub struct BuiltNetwork {
    pub graph: Graph,
    /// Number of rows flagged high value; default for the high-value policy count.
    pub high_value_count: usize,
    pub vulnerability_source: VulnerabilitySource,
}

/// Builds networks from the tabular description.
#[derive(Clone, Default)]
pub struct NetworkBuilder {
    options: BuildOptions,
    resolver: Option<Arc<dyn VulnerabilityResolver>>,
}

impl NetworkBuilder {
    pub fn new(options: BuildOptions) -> Self {
        Self {
            options,
            resolver: None,
        }
    }

    /// Score nodes from `resolver` instead of at random.
    pub fn with_resolver(mut self, resolver: Arc<dyn VulnerabilityResolver>) -> Self {
        self.resolver = Some(resolver);
        self
    }

    pub fn options(&self) -> &BuildOptions {
        &self.options
    }

    pub fn build_from_csv(&self, content: &str) -> Result<BuiltNetwork, NetworkError> {
        self.build(&parse_network_csv(content)?)
    }

    pub fn build_from_json(&self, encoded: &str) -> Result<BuiltNetwork, NetworkError> {
        self.build(&parse_network_json(encoded)?)
    }

    pub fn build_from_file(&self, path: &Path) -> Result<BuiltNetwork, NetworkError> {
        log::info!("Building network from: {:?}", path);
        self.build(&parse_network_csv_file(path)?)
    }

    pub fn build(&self, rows: &[NetworkRow]) -> Result<BuiltNetwork, NetworkError> {
        // Index every row up front so forward references resolve
        let mut seen = HashSet::new();
        for row in rows {
            if !seen.insert(row.node_id.as_str()) {
                return Err(NetworkError::DuplicateNode(row.node_id.clone()));
            }
        }

        let feed_scores = self.query_feed(rows);
        let vulnerability_source = if feed_scores.is_some() {
            VulnerabilitySource::Feed
        } else {
            VulnerabilitySource::Random
        };

        let mut rng = match self.options.seed {
            Some(seed) => StdRng::seed_from_u64(seed),
            None => StdRng::from_entropy(),
        };

        let mut graph = Graph::new();
        let mut high_value_count = 0;
        for row in rows {
            let vulnerability = self.score_row(row, feed_scores.as_ref(), &mut rng);
            if row.high_value_node {
                high_value_count += 1;
            }
            graph.add_node(Node::new(
                &row.node_id,
                row.entry_node,
                row.high_value_node,
                vulnerability,
            ))?;
        }

        for row in rows {
            for connected in &row.connections {
                if *connected == row.node_id {
                    return Err(NetworkError::MalformedRow {
                        line: row.line,
                        reason: format!("node '{}' is connected to itself", row.node_id),
                    });
                }
                if !graph.contains(connected) {
                    return Err(NetworkError::UnknownConnection {
                        from: row.node_id.clone(),
                        to: connected.clone(),
                    });
                }
                graph.add_edge(&row.node_id, connected)?;
            }
        }

        if self.options.generate_positions {
            circular_layout(&mut graph);
        } else {
            // Declared positions go last so nothing overwrites them
            for row in rows {
                let (x, y) = row.position.ok_or_else(|| NetworkError::MalformedRow {
                    line: row.line,
                    reason: format!("node '{}' has no position", row.node_id),
                })?;
                graph.set_position(&row.node_id, Position::new(x, y))?;
            }
        }

        log::info!(
            "Built network with {} nodes, {} edges, {} entry and {} high value nodes ({:?} vulnerabilities)",
            graph.node_count(),
            graph.edge_count(),
            graph.entry_nodes().len(),
            high_value_count,
            vulnerability_source
        );

        Ok(BuiltNetwork {
            graph,
            high_value_count,
            vulnerability_source,
        })
    }

    /// One feed query for the identifiers of every row. `None` means no data.
    fn query_feed(&self, rows: &[NetworkRow]) -> Option<HashMap<String, f64>> {
        let resolver = self.resolver.as_ref()?;
        let identifiers: BTreeSet<String> = rows
            .iter()
            .flat_map(|row| row.cpes.iter().cloned())
            .collect();
        if identifiers.is_empty() {
            // Nothing to ask for; every row scores as unknown
            log::warn!("No feed identifiers in network input for feed '{}'", resolver.name());
            return Some(HashMap::new());
        }
        resolve_or_empty(Arc::clone(resolver), identifiers, self.options.feed_timeout)
    }

    fn score_row(&self, row: &NetworkRow, feed_scores: Option<&HashMap<String, f64>>, rng: &mut StdRng) -> f64 {
        match feed_scores {
            Some(scores) => {
                let (min, max) = self.options.feed_score_range;
                if row.cpes.is_empty() {
                    normalise(min, max, UNKNOWN_IDENTIFIER_SCORE)
                } else {
                    find_highest_vulnerability(row.cpes.as_slice(), scores, min, max)
                }
            }
            None => {
                let (min, max) = self.options.random_score_range;
                min + rng.gen::<f64>() * (max - min)
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::resolver::{ResolveError, TableFeedResolver};

    const HEADER: &str = "nodeID,xGraphLocation,yGraphLocation,isEntryNode,isHighValue,cpe,connections";

    fn table(rows: &[&str]) -> String {
        let mut content = HEADER.to_string();
        for row in rows {
            content.push('\n');
            content.push_str(row);
        }
        content
    }

    fn seeded() -> NetworkBuilder {
        NetworkBuilder::new(BuildOptions {
            seed: Some(7),
            ..BuildOptions::default()
        })
    }

    struct DownFeed;

    impl VulnerabilityResolver for DownFeed {
        fn name(&self) -> &str {
            "down"
        }

        fn resolve(&self, _: &BTreeSet<String>) -> Result<HashMap<String, f64>, ResolveError> {
            Err(ResolveError::Unavailable("login failed".to_string()))
        }
    }

    #[test]
    fn test_forward_references_resolve() {
        // Node 1 points at node 2 before node 2 is declared
        let built = seeded()
            .build_from_csv(&table(&["1,0,0,T,F,,2", "2,1,1,F,T,,1"]))
            .unwrap();
        assert!(built.graph.has_edge("1", "2"));
        assert!(built.graph.has_edge("2", "1"));
        assert_eq!(built.graph.edge_count(), 1);
    }

    #[test]
    fn test_unknown_connection_aborts() {
        let err = seeded()
            .build_from_csv(&table(&["1,0,0,T,F,,2", "2,1,1,F,F,,9"]))
            .unwrap_err();
        assert!(matches!(
            err,
            NetworkError::UnknownConnection { ref from, ref to } if from == "2" && to == "9"
        ));
    }

    #[test]
    fn test_self_connection_aborts() {
        let err = seeded()
            .build_from_csv(&table(&["a,0,0,T,F,,a,b", "b,1,1,F,F,,"]))
            .unwrap_err();
        assert!(matches!(
            err,
            NetworkError::MalformedRow { line: 2, ref reason } if reason.contains("'a'")
        ));
    }

    #[test]
    fn test_duplicate_rows_abort() {
        let err = seeded()
            .build_from_csv(&table(&["1,0,0,T,F,,", "1,1,1,F,F,,"]))
            .unwrap_err();
        assert!(matches!(err, NetworkError::DuplicateNode(ref id) if id == "1"));
    }

    #[test]
    fn test_declared_positions_and_flags() {
        let built = seeded()
            .build_from_csv(&table(&["a,1.5,-2,T,F,,b", "b,3,4,F,T,,", "c,0,0,F,T,,a"]))
            .unwrap();
        let a = built.graph.node("a").unwrap();
        assert_eq!(a.position, Position::new(1.5, -2.0));
        assert!(a.entry_node);
        assert_eq!(built.high_value_count, 2);
        assert_eq!(built.vulnerability_source, VulnerabilitySource::Random);
        for node in built.graph.nodes() {
            assert!((0.0..1.0).contains(&node.vulnerability));
        }
    }

    #[test]
    fn test_missing_position_requires_auto_layout() {
        let rows = table(&["a,,,T,F,,"]);
        let err = seeded().build_from_csv(&rows).unwrap_err();
        assert!(matches!(err, NetworkError::MalformedRow { line: 2, .. }));

        let builder = NetworkBuilder::new(BuildOptions {
            generate_positions: true,
            ..BuildOptions::default()
        });
        let built = builder.build_from_csv(&rows).unwrap();
        assert_eq!(built.graph.node("a").unwrap().position, Position::default());
    }

    #[test]
    fn test_auto_layout_overrides_declared_positions() {
        let builder = NetworkBuilder::new(BuildOptions {
            generate_positions: true,
            ..BuildOptions::default()
        });
        let built = builder
            .build_from_csv(&table(&["a,50,50,T,F,,b", "b,60,60,F,F,,"]))
            .unwrap();
        assert!((built.graph.node("a").unwrap().position.x - 1.0).abs() < 1e-9);
    }

    #[test]
    fn test_seed_makes_scores_reproducible() {
        let rows = table(&["a,0,0,T,F,,b", "b,1,1,F,F,,"]);
        let first = seeded().build_from_csv(&rows).unwrap();
        let second = seeded().build_from_csv(&rows).unwrap();
        for (x, y) in first.graph.nodes().iter().zip(second.graph.nodes()) {
            assert_eq!(x.vulnerability, y.vulnerability);
        }
    }

    #[test]
    fn test_random_scores_respect_range() {
        let builder = NetworkBuilder::new(BuildOptions {
            random_score_range: (0.4, 0.6),
            seed: Some(1),
            ..BuildOptions::default()
        });
        let rows: Vec<String> = (0..20).map(|i| format!("{},0,0,F,F,,", i)).collect();
        let rows: Vec<&str> = rows.iter().map(String::as_str).collect();
        let built = builder.build_from_csv(&table(&rows)).unwrap();
        for node in built.graph.nodes() {
            assert!((0.4..0.6).contains(&node.vulnerability));
        }
    }

    #[test]
    fn test_feed_scores() {
        let scores: HashMap<String, f64> = [
            ("cpe:a".to_string(), 0.3),
            ("cpe:b".to_string(), 0.8),
        ]
        .into_iter()
        .collect();
        let builder = seeded().with_resolver(Arc::new(TableFeedResolver::from_scores("memory", scores)));

        let built = builder
            .build_from_csv(&table(&["1,0,0,T,F,cpe:a|cpe:b,2", "2,0,0,F,F,cpe:unknown,", "3,0,0,F,F,,"]))
            .unwrap();
        assert_eq!(built.vulnerability_source, VulnerabilitySource::Feed);
        assert_eq!(built.graph.node("1").unwrap().vulnerability, 0.8);
        assert_eq!(built.graph.node("2").unwrap().vulnerability, UNKNOWN_IDENTIFIER_SCORE);
        // An empty cpe column scores as unknown, not at random
        assert_eq!(built.graph.node("3").unwrap().vulnerability, UNKNOWN_IDENTIFIER_SCORE);
    }

    #[test]
    fn test_feed_without_any_identifiers_scores_floor() {
        let builder = seeded().with_resolver(Arc::new(TableFeedResolver::from_scores(
            "memory",
            HashMap::new(),
        )));
        let built = builder
            .build_from_csv(&table(&["1,0,0,T,F,,2", "2,0,0,F,F,,1"]))
            .unwrap();
        assert_eq!(built.vulnerability_source, VulnerabilitySource::Feed);
        for node in built.graph.nodes() {
            assert_eq!(node.vulnerability, UNKNOWN_IDENTIFIER_SCORE);
        }
    }

    #[test]
    fn test_empty_cpe_floor_is_normalised() {
        let builder = NetworkBuilder::new(BuildOptions {
            feed_score_range: (0.0, 0.5),
            seed: Some(7),
            ..BuildOptions::default()
        })
        .with_resolver(Arc::new(TableFeedResolver::from_scores("memory", HashMap::new())));
        let built = builder.build_from_csv(&table(&["1,0,0,T,F,,"])).unwrap();
        let score = built.graph.node("1").unwrap().vulnerability;
        assert!((score - 0.02).abs() < 1e-12);
    }

    #[test]
    fn test_failed_feed_falls_back_to_random() {
        let builder = seeded().with_resolver(Arc::new(DownFeed));
        let built = builder
            .build_from_csv(&table(&["1,0,0,T,F,cpe:a,", "2,0,0,F,F,cpe:b,1"]))
            .unwrap();
        assert_eq!(built.vulnerability_source, VulnerabilitySource::Random);
        assert_eq!(built.graph.node_count(), 2);
    }
}
