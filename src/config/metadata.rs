//! Document metadata attached to a stored configuration.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Metadata describing a stored network document.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DocMetadata {
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub author: Option<String>,
    pub created_at: DateTime<Utc>,
    /// Locked documents are read-only in the document store.
    #[serde(default)]
    pub locked: bool,
}

impl DocMetadata {
    pub fn new(name: &str) -> Self {
        Self {
            name: name.to_string(),
            description: None,
            author: None,
            created_at: Utc::now(),
            locked: false,
        }
    }

    pub fn with_description(mut self, description: &str) -> Self {
        self.description = Some(description.to_string());
        self
    }

    pub fn with_author(mut self, author: &str) -> Self {
        self.author = Some(author.to_string());
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_metadata_serde() {
        let meta = DocMetadata::new("corporate-lan").with_author("blue team");
        let value = serde_json::to_value(&meta).unwrap();
        assert_eq!(value["name"], "corporate-lan");
        assert_eq!(value["author"], "blue team");
        assert!(value.get("description").is_none());

        let back: DocMetadata = serde_json::from_value(value).unwrap();
        assert_eq!(back, meta);
    }
}
