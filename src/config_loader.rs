//! Loading and saving network configuration documents.
//!
//! Documents are YAML or JSON files holding the representation of a
//! [`NetworkConfig`]. YAML is converted to a JSON value tree first so both
//! formats go through the same key/alias handling.

use std::fs;
use std::path::Path;

use color_eyre::eyre::{eyre, WrapErr};
use color_eyre::Result;
use log::{info, warn};
use serde_json::Value;

use crate::config::{ConfigGroup, RepresentationOptions};
use crate::error::ConfigError;
use crate::network::NetworkConfig;

fn is_json(path: &Path) -> bool {
    path.extension()
        .and_then(|ext| ext.to_str())
        .is_some_and(|ext| ext.eq_ignore_ascii_case("json"))
}

/// Parse a configuration document into its raw value tree.
fn read_document(path: &Path) -> std::result::Result<Value, ConfigError> {
    let content = fs::read_to_string(path).map_err(|source| ConfigError::Io {
        path: path.to_path_buf(),
        source,
    })?;

    let parsed = if is_json(path) {
        serde_json::from_str::<Value>(&content).map_err(|e| e.to_string())
    } else {
        serde_yaml::from_str::<Value>(&content).map_err(|e| e.to_string())
    };
    parsed.map_err(|message| ConfigError::Parse {
        path: path.to_path_buf(),
        message,
    })
}

/// Load a network configuration from a YAML or JSON file.
///
/// Unknown keys and mistyped values are errors. Validation failures are not:
/// the returned config carries them in its validation result.
pub fn load_network_config(config_path: &Path) -> Result<NetworkConfig> {
    info!("Loading configuration from: {:?}", config_path);

    let document = read_document(config_path)?;
    let map = match document {
        Value::Object(map) => map,
        Value::Null => {
            warn!("Configuration {:?} is empty, using defaults", config_path);
            serde_json::Map::new()
        }
        other => {
            return Err(eyre!(
                "Configuration {:?} must be a mapping at the top level, found {}",
                config_path,
                crate::error::json_type_name(&other)
            ))
        }
    };

    let config = NetworkConfig::from_representation(&map)
        .wrap_err_with(|| format!("Invalid configuration in {:?}", config_path))?;

    if config.validation().passed() {
        info!("Configuration is valid");
    } else {
        warn!("Configuration has validation failures:\n{}", config.validation());
    }
    Ok(config)
}

/// Write `config` as pretty JSON containing only JSON primitives.
pub fn save_network_config(config: &NetworkConfig, output_path: &Path) -> Result<()> {
    let map = config.to_representation(RepresentationOptions::json());
    let json = serde_json::to_string_pretty(&Value::Object(map))?;
    fs::write(output_path, json)
        .wrap_err_with(|| format!("Failed to write configuration to {:?}", output_path))?;
    info!("Wrote network configuration to {:?}", output_path);
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::network::{Graph, Node, PlacementMethod};
    use std::io::Write;
    use tempfile::{Builder, NamedTempFile};

    fn write_temp(suffix: &str, content: &str) -> NamedTempFile {
        let mut file = Builder::new().suffix(suffix).tempfile().unwrap();
        write!(file, "{}", content).unwrap();
        file
    }

    #[test]
    fn test_load_yaml_with_aliases() {
        let yaml = r#"
entry_node_random_placement:
  use: true
  number_of_entry_nodes: 2
  choose_entry_nodes_randomly: false
  prefer_central_nodes_for_entry_nodes: true
node_vulnerabilities:
  restrict: true
  node_vulnerability_lower_bound: 0.2
  node_vulnerability_upper_bound: 0.4
"#;
        let file = write_temp(".yaml", yaml);
        let config = load_network_config(file.path()).unwrap();
        assert!(config.validation().passed(), "{}", config.validation());
        assert_eq!(config.entry_placement().count(), Some(2));
        assert_eq!(
            config.entry_placement().selected_method(),
            Some(PlacementMethod::CloseToCenter)
        );
        assert_eq!(config.vulnerability_range().bounds(), (0.2, 0.4));
    }

    #[test]
    fn test_invalid_document_loads_with_failures() {
        let yaml = "node_vulnerabilities:\n  restrict: true\n  min: 0.9\n  max: 0.1\n";
        let file = write_temp(".yml", yaml);
        let config = load_network_config(file.path()).unwrap();
        assert!(!config.validation().passed());
    }

    #[test]
    fn test_unknown_key_is_an_error() {
        let file = write_temp(".yaml", "number_of_nodes: 12\n");
        let err = load_network_config(file.path()).unwrap_err();
        assert!(format!("{:?}", err).contains("number_of_nodes"));
    }

    #[test]
    fn test_non_mapping_and_missing_files() {
        let file = write_temp(".yaml", "- 1\n- 2\n");
        assert!(load_network_config(file.path()).is_err());
        assert!(load_network_config(Path::new("/nonexistent/network.yaml")).is_err());

        let file = write_temp(".json", "{ not json");
        assert!(load_network_config(file.path()).is_err());
    }

    #[test]
    fn test_save_then_load_json() {
        let mut graph = Graph::new();
        graph.add_node(Node::new("gateway", true, false, 0.3)).unwrap();
        graph.add_node(Node::new("db", false, true, 0.8)).unwrap();
        graph.add_edge("gateway", "db").unwrap();
        let config = NetworkConfig::from_graph(&graph, 1);

        let out = Builder::new().suffix(".json").tempfile().unwrap();
        save_network_config(&config, out.path()).unwrap();

        let text = fs::read_to_string(out.path()).unwrap();
        assert!(text.contains("\"matrix\""));

        let reloaded = load_network_config(out.path()).unwrap();
        assert_eq!(reloaded.matrix, config.matrix);
        assert_eq!(reloaded.high_value_nodes, Some(vec!["db".to_string()]));
        assert_eq!(reloaded.high_value_placement().count(), Some(1));
    }
}
