//! Network-level configuration: placement policies, vulnerability range and
//! the raw graph data of a built network.
//!
//! The raw data (adjacency matrix, positions, flagged node ids, explicit
//! vulnerabilities) is not made of constrained items, so it is serialized and
//! loaded by hand next to the declared elements. Matrix rows follow the sorted
//! node ids, which are the keys of `positions`.

use std::collections::BTreeMap;

use serde::de::DeserializeOwned;
use serde_json::{Map, Value};

use super::builder::BuiltNetwork;
use super::graph::{Graph, Node, Position};
use super::placement::{PlacementPolicy, PlacementTarget};
use super::vulnerability_range::VulnerabilityRange;
use crate::config::{
    assign_element, represent_elements, ConfigGroup, DocMetadata, Element, ElementMut,
    FieldValidation, RepresentationOptions, ValidationResult,
};
use crate::error::{json_type_name, ConfigError, NetworkError};

const MATRIX_KEY: &str = "matrix";
const POSITIONS_KEY: &str = "positions";
const ENTRY_NODES_KEY: &str = "entry_nodes";
const HIGH_VALUE_NODES_KEY: &str = "high_value_nodes";
const VULNERABILITIES_KEY: &str = "vulnerabilities";
const DOC_METADATA_KEY: &str = "_doc_metadata";
const ENTRY_PLACEMENT_KEY: &str = "entry_node_random_placement";
const HIGH_VALUE_PLACEMENT_KEY: &str = "high_value_node_random_placement";

/// Placement and vulnerability settings of a network plus its graph data.
#[derive(Debug, Clone, PartialEq)]
pub struct NetworkConfig {
    doc: Option<String>,
    entry_placement: PlacementPolicy,
    high_value_placement: PlacementPolicy,
    vulnerability_range: VulnerabilityRange,
    pub matrix: Option<Vec<Vec<u8>>>,
    pub positions: Option<BTreeMap<String, [f64; 2]>>,
    pub entry_nodes: Option<Vec<String>>,
    pub high_value_nodes: Option<Vec<String>>,
    pub vulnerabilities: Option<BTreeMap<String, f64>>,
    doc_metadata: Option<DocMetadata>,
    validation: ValidationResult,
}

impl Default for NetworkConfig {
    fn default() -> Self {
        Self::new(
            PlacementPolicy::disabled(PlacementTarget::Entry),
            PlacementPolicy::disabled(PlacementTarget::HighValue),
            VulnerabilityRange::unrestricted(),
        )
    }
}

impl NetworkConfig {
    pub fn new(
        entry_placement: PlacementPolicy,
        high_value_placement: PlacementPolicy,
        vulnerability_range: VulnerabilityRange,
    ) -> Self {
        let mut config = Self {
            doc: Some("The configuration of the network.".to_string()),
            entry_placement,
            high_value_placement,
            vulnerability_range,
            matrix: None,
            positions: None,
            entry_nodes: None,
            high_value_nodes: None,
            vulnerabilities: None,
            doc_metadata: None,
            validation: ValidationResult::default(),
        };
        config.apply_aliases();
        config.validate();
        config
    }

    /// Network-level names of the child fields.
    fn apply_aliases(&mut self) {
        self.entry_placement
            .set_aliases("number_of_entry_nodes", "choose_entry_nodes_randomly");
        self.high_value_placement.set_aliases(
            "number_of_high_value_nodes",
            "choose_high_value_nodes_placement_at_random",
        );
        self.vulnerability_range.max.set_alias("node_vulnerability_upper_bound");
        self.vulnerability_range.min.set_alias("node_vulnerability_lower_bound");
    }

    /// Snapshot of `graph`. The high-value policy count defaults to
    /// `high_value_count`.
    pub fn from_graph(graph: &Graph, high_value_count: usize) -> Self {
        let mut config = Self::default();
        config.matrix = Some(graph.adjacency_matrix());
        config.positions = Some(
            graph
                .nodes()
                .iter()
                .map(|n| (n.id.clone(), [n.position.x, n.position.y]))
                .collect(),
        );
        config.entry_nodes = Some(graph.entry_nodes().into_iter().map(String::from).collect());
        config.high_value_nodes = Some(graph.high_value_nodes().into_iter().map(String::from).collect());
        config.vulnerabilities = Some(
            graph
                .nodes()
                .iter()
                .map(|n| (n.id.clone(), n.vulnerability))
                .collect(),
        );
        config
            .high_value_placement
            .set_count(Some(i64::try_from(high_value_count).unwrap_or(i64::MAX)));
        config.validate();
        config
    }

    pub fn from_built(built: &BuiltNetwork) -> Self {
        Self::from_graph(&built.graph, built.high_value_count)
    }

    /// Rebuild a config from its representation. Keys may be field names or
    /// aliases; unknown keys and mistyped values are errors.
    pub fn from_representation(map: &Map<String, Value>) -> Result<Self, ConfigError> {
        let mut config = Self::default();
        config.load(map)?;
        Ok(config)
    }

    pub fn entry_placement(&self) -> &PlacementPolicy {
        &self.entry_placement
    }

    pub fn entry_placement_mut(&mut self) -> &mut PlacementPolicy {
        &mut self.entry_placement
    }

    pub fn high_value_placement(&self) -> &PlacementPolicy {
        &self.high_value_placement
    }

    pub fn high_value_placement_mut(&mut self) -> &mut PlacementPolicy {
        &mut self.high_value_placement
    }

    pub fn vulnerability_range(&self) -> &VulnerabilityRange {
        &self.vulnerability_range
    }

    pub fn vulnerability_range_mut(&mut self) -> &mut VulnerabilityRange {
        &mut self.vulnerability_range
    }

    /// Replace the placement and vulnerability settings, keeping the graph
    /// data. Child fields take their network-level aliases.
    pub fn set_policies(
        &mut self,
        entry_placement: PlacementPolicy,
        high_value_placement: PlacementPolicy,
        vulnerability_range: VulnerabilityRange,
    ) {
        self.entry_placement = entry_placement;
        self.high_value_placement = high_value_placement;
        self.vulnerability_range = vulnerability_range;
        self.apply_aliases();
        self.validate();
    }

    pub fn doc_metadata(&self) -> Option<&DocMetadata> {
        self.doc_metadata.as_ref()
    }

    /// Attach document metadata. It can only be set once.
    pub fn set_doc_metadata(&mut self, metadata: DocMetadata) -> Result<(), ConfigError> {
        if self.doc_metadata.is_some() {
            log::error!("Cannot set doc_metadata as it has already been set");
            return Err(ConfigError::MetadataAlreadySet);
        }
        self.doc_metadata = Some(metadata);
        Ok(())
    }

    /// Node ids in matrix order.
    fn matrix_ids(&self) -> Option<Vec<String>> {
        if let Some(positions) = &self.positions {
            return Some(positions.keys().cloned().collect());
        }
        self.matrix
            .as_ref()
            .map(|m| (0..m.len()).map(|i| i.to_string()).collect())
    }

    /// Reconstruct the graph described by the raw data.
    pub fn to_graph(&self) -> Result<Graph, NetworkError> {
        let ids = self.matrix_ids().unwrap_or_default();
        let entry = self.entry_nodes.clone().unwrap_or_default();
        let high_value = self.high_value_nodes.clone().unwrap_or_default();

        let mut graph = Graph::new();
        for id in &ids {
            let vulnerability = self
                .vulnerabilities
                .as_ref()
                .and_then(|v| v.get(id).copied())
                .unwrap_or(0.0);
            let mut node = Node::new(id, entry.contains(id), high_value.contains(id), vulnerability);
            if let Some([x, y]) = self.positions.as_ref().and_then(|p| p.get(id)) {
                node.position = Position::new(*x, *y);
            }
            graph.add_node(node)?;
        }

        for id in entry.iter().chain(high_value.iter()) {
            if !graph.contains(id) {
                return Err(NetworkError::UnknownNode(id.clone()));
            }
        }

        if let Some(matrix) = &self.matrix {
            for (i, row) in matrix.iter().enumerate() {
                for (j, &cell) in row.iter().enumerate().skip(i + 1) {
                    if cell == 0 {
                        continue;
                    }
                    let (Some(a), Some(b)) = (ids.get(i), ids.get(j)) else {
                        return Err(NetworkError::UnknownNode(format!("matrix index {}", j.max(i))));
                    };
                    graph.add_edge(a, b)?;
                }
            }
        }

        Ok(graph)
    }

    fn check_matrix(&self, result: &mut ValidationResult) {
        let Some(matrix) = &self.matrix else {
            return;
        };
        let n = matrix.len();
        let outcome = if let Some((i, row)) = matrix.iter().enumerate().find(|(_, row)| row.len() != n) {
            FieldValidation::fail(format!(
                "Matrix must be square: row {} has {} entries, expected {}",
                i,
                row.len(),
                n
            ))
        } else if let Some(cell) = matrix.iter().flatten().find(|&&c| c > 1) {
            FieldValidation::fail(format!("Matrix entries must be 0 or 1, found {}", cell))
        } else if let Some(i) = (0..n).find(|&i| matrix[i][i] != 0) {
            FieldValidation::fail(format!("Matrix diagonal must be 0: node {} is connected to itself", i))
        } else if let Some((i, j)) = (0..n)
            .flat_map(|i| (i + 1..n).map(move |j| (i, j)))
            .find(|&(i, j)| matrix[i][j] != matrix[j][i])
        {
            FieldValidation::fail(format!("Matrix must be symmetric: [{}][{}] != [{}][{}]", i, j, j, i))
        } else if let Some(positions) = self.positions.as_ref().filter(|p| p.len() != n) {
            FieldValidation::fail(format!(
                "Matrix has {} nodes but {} positions are given",
                n,
                positions.len()
            ))
        } else {
            FieldValidation::pass()
        };
        result.record_field(MATRIX_KEY, outcome);
    }

    fn check_node_ids(&self, key: &str, ids: Option<&Vec<String>>, result: &mut ValidationResult) {
        let (Some(ids), Some(known)) = (ids, self.matrix_ids()) else {
            return;
        };
        let unknown: Vec<&str> = ids
            .iter()
            .filter(|id| !known.contains(id))
            .map(String::as_str)
            .collect();
        let outcome = if unknown.is_empty() {
            FieldValidation::pass()
        } else {
            FieldValidation::fail(format!("Unknown node ids: {}", unknown.join(", ")))
        };
        result.record_field(key, outcome);
    }

    fn check_vulnerabilities(&self, result: &mut ValidationResult) {
        let Some(vulnerabilities) = &self.vulnerabilities else {
            return;
        };
        let outcome = match vulnerabilities
            .iter()
            .find(|(_, v)| !(0.0..=1.0).contains(*v))
        {
            Some((id, v)) => FieldValidation::fail(format!(
                "Vulnerability {} of node '{}' is outside [0, 1]",
                v, id
            )),
            None => FieldValidation::pass(),
        };
        result.record_field(VULNERABILITIES_KEY, outcome);
    }

    fn raw_fields(&self, options: RepresentationOptions) -> Vec<(&'static str, Value)> {
        let fields = [
            (MATRIX_KEY, to_json_value(&self.matrix)),
            (POSITIONS_KEY, to_json_value(&self.positions)),
            (ENTRY_NODES_KEY, to_json_value(&self.entry_nodes)),
            (HIGH_VALUE_NODES_KEY, to_json_value(&self.high_value_nodes)),
            (VULNERABILITIES_KEY, to_json_value(&self.vulnerabilities)),
            (DOC_METADATA_KEY, to_json_value(&self.doc_metadata)),
        ];
        fields
            .into_iter()
            .filter(|(_, value)| options.include_none || !value.is_null())
            .collect()
    }
}

/// A policy must place the node subset of the slot it sits in.
fn check_target(
    key: &str,
    policy: &PlacementPolicy,
    expected: PlacementTarget,
    result: &mut ValidationResult,
) {
    let label = |target: PlacementTarget| match target {
        PlacementTarget::Entry => "an entry node",
        PlacementTarget::HighValue => "a high value node",
    };
    if policy.target() != expected {
        result.record_field(
            key,
            FieldValidation::fail(format!(
                "Expected {} placement policy, found {} one",
                label(expected),
                label(policy.target())
            )),
        );
    }
}

fn to_json_value<T: serde::Serialize>(value: &T) -> Value {
    // Plain data with string keys always serializes
    serde_json::to_value(value).unwrap_or(Value::Null)
}

fn from_json_value<T: DeserializeOwned>(
    key: &str,
    value: &Value,
    expected: &'static str,
) -> Result<Option<T>, ConfigError> {
    if value.is_null() {
        return Ok(None);
    }
    serde_json::from_value(value.clone())
        .map(Some)
        .map_err(|_| ConfigError::WrongType {
            key: key.to_string(),
            expected,
            found: json_type_name(value),
        })
}

impl ConfigGroup for NetworkConfig {
    fn name(&self) -> &'static str {
        "network"
    }

    fn doc(&self) -> Option<&str> {
        self.doc.as_deref()
    }

    fn elements(&self) -> Vec<(&'static str, Element<'_>)> {
        vec![
            (ENTRY_PLACEMENT_KEY, Element::Group(&self.entry_placement)),
            (HIGH_VALUE_PLACEMENT_KEY, Element::Group(&self.high_value_placement)),
            ("node_vulnerabilities", Element::Group(&self.vulnerability_range)),
        ]
    }

    fn elements_mut(&mut self) -> Vec<(&'static str, ElementMut<'_>)> {
        vec![
            (ENTRY_PLACEMENT_KEY, ElementMut::Group(&mut self.entry_placement)),
            (HIGH_VALUE_PLACEMENT_KEY, ElementMut::Group(&mut self.high_value_placement)),
            ("node_vulnerabilities", ElementMut::Group(&mut self.vulnerability_range)),
        ]
    }

    fn validation(&self) -> &ValidationResult {
        &self.validation
    }

    fn validation_mut(&mut self) -> &mut ValidationResult {
        &mut self.validation
    }

    fn check_rules(&self, result: &mut ValidationResult) {
        check_target(ENTRY_PLACEMENT_KEY, &self.entry_placement, PlacementTarget::Entry, result);
        check_target(
            HIGH_VALUE_PLACEMENT_KEY,
            &self.high_value_placement,
            PlacementTarget::HighValue,
            result,
        );
        self.check_matrix(result);
        self.check_node_ids(ENTRY_NODES_KEY, self.entry_nodes.as_ref(), result);
        self.check_node_ids(HIGH_VALUE_NODES_KEY, self.high_value_nodes.as_ref(), result);
        self.check_vulnerabilities(result);
    }

    fn to_representation(&self, options: RepresentationOptions) -> Map<String, Value> {
        let mut map = represent_elements(self, options);
        for (key, value) in self.raw_fields(options) {
            map.insert(key.to_string(), value);
        }
        map
    }

    fn assign(&mut self, key: &str, value: &Value) -> Result<(), ConfigError> {
        match key {
            MATRIX_KEY => self.matrix = from_json_value(key, value, "matrix of 0/1 rows")?,
            POSITIONS_KEY => self.positions = from_json_value(key, value, "map of node id to [x, y]")?,
            ENTRY_NODES_KEY => self.entry_nodes = from_json_value(key, value, "list of node ids")?,
            HIGH_VALUE_NODES_KEY => {
                self.high_value_nodes = from_json_value(key, value, "list of node ids")?
            }
            VULNERABILITIES_KEY => {
                self.vulnerabilities = from_json_value(key, value, "map of node id to score")?
            }
            DOC_METADATA_KEY => {
                if let Some(metadata) = from_json_value(key, value, "document metadata object")? {
                    self.set_doc_metadata(metadata)?;
                }
            }
            _ => return assign_element(self, key, value),
        }
        Ok(())
    }
}
