//! Record types shared by every pipeline stage
//!
//! A graph moves through the pipeline as two flat lists:
//! - `NodeRecord`: identifier plus display name
//! - `EdgeRecord`: source identifier, target identifier, optional label
//!
//! Nothing here checks that edge endpoints refer to declared nodes. Dangling
//! references are carried through untouched.

use serde::{Deserialize, Serialize};

/// A node row: unique identifier and free-text display name.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NodeRecord {
    pub id: String,
    pub name: String,
}

impl NodeRecord {
    pub fn new(id: impl Into<String>, name: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            name: name.into(),
        }
    }
}

/// A directed edge between two node identifiers.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct EdgeRecord {
    pub source: String,
    pub target: String,
    /// Relationship label; empty labels are normalized to `None`
    pub label: Option<String>,
}

impl EdgeRecord {
    /// Create a new edge. An empty label is stored as `None`.
    pub fn new(source: impl Into<String>, target: impl Into<String>, label: Option<String>) -> Self {
        Self {
            source: source.into(),
            target: target.into(),
            label: label.filter(|l| !l.is_empty()),
        }
    }

    /// The label, or `fallback` when the edge carries none
    pub fn label_or<'a>(&'a self, fallback: &'a str) -> &'a str {
        self.label.as_deref().unwrap_or(fallback)
    }

    pub fn endpoints(&self) -> (&str, &str) {
        (&self.source, &self.target)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_empty_label_is_none() {
        let edge = EdgeRecord::new("1", "2", Some(String::new()));
        assert_eq!(edge.label, None);
        assert_eq!(edge.label_or("RELATED_TO"), "RELATED_TO");
    }

    #[test]
    fn test_label_or_prefers_label() {
        let edge = EdgeRecord::new("1", "2", Some("finetune".to_string()));
        assert_eq!(edge.label_or("RELATED_TO"), "finetune");
        assert_eq!(edge.endpoints(), ("1", "2"));
    }
}
