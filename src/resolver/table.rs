//! Feed resolver backed by an exported feed table.
//!
//! Supported formats, chosen by file extension:
//! - `.json`: object of identifier → score
//! - `.yaml` / `.yml`: mapping of identifier → score
//! - anything else: text table of `identifier,score` lines; a first line whose
//!   score column is not numeric is treated as a header

use std::collections::{BTreeSet, HashMap};
use std::fs;
use std::path::Path;

use super::{FeedSettings, ResolveError, VulnerabilityResolver};

/// In-memory copy of a feed table.
#[derive(Debug, Clone)]
pub struct TableFeedResolver {
    name: String,
    scores: HashMap<String, f64>,
}

impl TableFeedResolver {
    /// Load the table named by `settings.endpoint`, keeping only identifiers
    /// that match `settings.filter`.
    pub fn open(settings: &FeedSettings) -> Result<Self, ResolveError> {
        let path = Path::new(&settings.endpoint);
        let content = fs::read_to_string(path).map_err(|e| {
            ResolveError::Unavailable(format!("cannot read feed table '{}': {}", path.display(), e))
        })?;

        let extension = path
            .extension()
            .and_then(|ext| ext.to_str())
            .map(str::to_ascii_lowercase);
        let scores = match extension.as_deref() {
            Some("json") => serde_json::from_str::<HashMap<String, f64>>(&content)
                .map_err(|e| ResolveError::Malformed(e.to_string()))?,
            Some("yaml") | Some("yml") => serde_yaml::from_str::<HashMap<String, f64>>(&content)
                .map_err(|e| ResolveError::Malformed(e.to_string()))?,
            _ => parse_score_table(&content)?,
        };

        let mut resolver = Self::from_scores(&settings.endpoint, scores);
        if let Some(filter) = &settings.filter {
            resolver.scores.retain(|id, _| id.contains(filter.as_str()));
        }
        log::info!(
            "Loaded {} feed entries from '{}'",
            resolver.scores.len(),
            settings.endpoint
        );
        Ok(resolver)
    }

    pub fn from_scores(name: &str, scores: HashMap<String, f64>) -> Self {
        Self {
            name: name.to_string(),
            scores,
        }
    }

    pub fn len(&self) -> usize {
        self.scores.len()
    }

    pub fn is_empty(&self) -> bool {
        self.scores.is_empty()
    }
}

fn parse_score_table(content: &str) -> Result<HashMap<String, f64>, ResolveError> {
    let mut scores = HashMap::new();

    for (i, line) in content.lines().enumerate() {
        let line = line.trim();
        if line.is_empty() || line.starts_with('#') {
            continue;
        }
        // Identifiers such as CPE URIs may contain commas; the score is last
        let Some((id, score)) = line.rsplit_once(',') else {
            return Err(ResolveError::Malformed(format!(
                "line {}: expected 'identifier,score'",
                i + 1
            )));
        };
        match score.trim().parse::<f64>() {
            Ok(score) => {
                scores.insert(id.trim().to_string(), score);
            }
            Err(_) if scores.is_empty() => {
                log::debug!("Treating line {} of feed table as a header", i + 1);
            }
            Err(_) => {
                return Err(ResolveError::Malformed(format!(
                    "line {}: score '{}' is not a number",
                    i + 1,
                    score.trim()
                )));
            }
        }
    }

    Ok(scores)
}

impl VulnerabilityResolver for TableFeedResolver {
    fn name(&self) -> &str {
        &self.name
    }

    fn resolve(&self, identifiers: &BTreeSet<String>) -> Result<HashMap<String, f64>, ResolveError> {
        Ok(identifiers
            .iter()
            .filter_map(|id| self.scores.get(id).map(|&score| (id.clone(), score)))
            .collect())
    }
}
