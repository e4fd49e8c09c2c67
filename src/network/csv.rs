//! Parser for the tabular network description.
//!
//! The table has the header
//! `nodeID,xGraphLocation,yGraphLocation,isEntryNode,isHighValue,cpe,connections`.
//! Flags are the literal `T` for true, `cpe` is a `|` separated list of feed
//! identifiers, and every field after `cpe` is the id of a connected node.

use std::fs;
use std::path::Path;

use crate::error::NetworkError;

/// Expected header columns, in order.
pub const HEADER: [&str; 7] = [
    "nodeID",
    "xGraphLocation",
    "yGraphLocation",
    "isEntryNode",
    "isHighValue",
    "cpe",
    "connections",
];

const CPE_SEPARATOR: char = '|';
const TRUE_FLAG: &str = "T";

/// One parsed row of the network table.
#[derive(Debug, Clone, PartialEq)]
pub struct NetworkRow {
    /// 1-based line number in the input, for error messages.
    pub line: usize,
    pub node_id: String,
    /// Declared position; `None` when either coordinate is left empty.
    pub position: Option<(f64, f64)>,
    pub entry_node: bool,
    pub high_value_node: bool,
    pub cpes: Vec<String>,
    pub connections: Vec<String>,
}

fn parse_coordinate(value: &str, column: &str, line: usize) -> Result<Option<f64>, NetworkError> {
    let value = value.trim();
    if value.is_empty() {
        return Ok(None);
    }
    value
        .parse::<f64>()
        .ok()
        .filter(|v| v.is_finite())
        .map(Some)
        .ok_or_else(|| NetworkError::MalformedRow {
            line,
            reason: format!("{} '{}' is not a number", column, value),
        })
}

fn parse_row(line: usize, text: &str) -> Result<NetworkRow, NetworkError> {
    let fields: Vec<&str> = text.split(',').map(str::trim).collect();
    if fields.len() < 6 {
        return Err(NetworkError::MalformedRow {
            line,
            reason: format!("expected at least 6 fields, found {}", fields.len()),
        });
    }

    let node_id = fields[0];
    if node_id.is_empty() {
        return Err(NetworkError::MalformedRow {
            line,
            reason: "empty node id".to_string(),
        });
    }

    let x = parse_coordinate(fields[1], HEADER[1], line)?;
    let y = parse_coordinate(fields[2], HEADER[2], line)?;

    let cpes = fields[5]
        .split(CPE_SEPARATOR)
        .map(str::trim)
        .filter(|cpe| !cpe.is_empty())
        .map(String::from)
        .collect();

    // Trailing commas leave empty connection fields behind
    let connections = fields[6..]
        .iter()
        .filter(|id| !id.is_empty())
        .map(|id| id.to_string())
        .collect();

    Ok(NetworkRow {
        line,
        node_id: node_id.to_string(),
        position: x.zip(y),
        entry_node: fields[3] == TRUE_FLAG,
        high_value_node: fields[4] == TRUE_FLAG,
        cpes,
        connections,
    })
}

fn check_header(line: &str) -> Result<(), NetworkError> {
    let columns: Vec<&str> = line.split(',').map(str::trim).collect();
    if columns.len() >= HEADER.len() && columns[..HEADER.len()] == HEADER {
        Ok(())
    } else {
        Err(NetworkError::MissingHeader {
            expected: HEADER.join(","),
            found: line.to_string(),
        })
    }
}

/// Parse the network table from a string.
///
/// Carriage returns are stripped and blank lines skipped.
pub fn parse_network_csv(content: &str) -> Result<Vec<NetworkRow>, NetworkError> {
    let content = content.replace('\r', "");
    let mut lines = content
        .lines()
        .enumerate()
        .map(|(i, line)| (i + 1, line))
        .filter(|(_, line)| !line.trim().is_empty());

    let (_, header) = lines.next().ok_or_else(|| NetworkError::MissingHeader {
        expected: HEADER.join(","),
        found: String::new(),
    })?;
    check_header(header)?;

    let rows = lines
        .map(|(line, text)| parse_row(line, text))
        .collect::<Result<Vec<_>, _>>()?;

    log::debug!("Parsed {} rows from network table", rows.len());
    Ok(rows)
}

/// Parse a network table that arrives as a JSON string literal, the form in
/// which the node editor uploads it.
pub fn parse_network_json(encoded: &str) -> Result<Vec<NetworkRow>, NetworkError> {
    let content: String = serde_json::from_str(encoded)
        .map_err(|e| NetworkError::InvalidEncoding(e.to_string()))?;
    parse_network_csv(&content)
}

/// Read and parse a network table file.
pub fn parse_network_csv_file(path: &Path) -> Result<Vec<NetworkRow>, NetworkError> {
    let content = fs::read_to_string(path).map_err(|source| NetworkError::Io {
        path: path.to_path_buf(),
        source,
    })?;
    parse_network_csv(&content)
}
