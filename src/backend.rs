//! Graph database access for the serve layer
//!
//! `GraphBackend` is the seam between the HTTP handlers and the database.
//! `Neo4jBackend` talks Bolt through `neo4rs`; tests use an in-memory
//! backend instead.

use std::collections::{BTreeMap, HashSet};

use async_trait::async_trait;
use neo4rs::{query, Graph};
use serde::{Deserialize, Serialize};

use crate::Result;
use crate::config::DatabaseConfig;
use crate::cypher::sanitize_identifier;

/// A node as returned by the database
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StoredNode {
    /// Internal database id
    pub id: i64,
    pub labels: Vec<String>,
    pub properties: BTreeMap<String, serde_json::Value>,
}

/// One `(n)-[r]->(m)` row
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Triple {
    pub source: StoredNode,
    pub relationship_type: String,
    pub target: StoredNode,
}

#[async_trait]
pub trait GraphBackend: Send + Sync {
    /// Fetch up to `limit` node-relationship-node triples
    async fn fetch_triples(&self, limit: usize) -> Result<Vec<Triple>>;

    /// Round-trip a trivial query
    async fn ping(&self) -> Result<()>;
}

/// Bolt-backed implementation.
///
/// The driver hands each query its own connection and returns it once the
/// result stream is drained or dropped, on success and on error alike.
pub struct Neo4jBackend {
    graph: Graph,
    node_label: String,
    relationship_type: String,
}

impl Neo4jBackend {
    pub async fn connect(config: &DatabaseConfig) -> Result<Self> {
        tracing::debug!("Connecting to {} as {}", config.uri, config.user);
        let graph = Graph::new(config.uri.as_str(), config.user.as_str(), config.password.as_str()).await?;
        Ok(Self {
            graph,
            node_label: sanitize_identifier(&config.node_label),
            relationship_type: sanitize_identifier(&config.relationship_type),
        })
    }

    fn triples_query(&self, limit: usize) -> String {
        format!(
            "MATCH (n:{label})-[r:{rel}]->(m:{label}) RETURN n, r, m LIMIT {limit}",
            label = self.node_label,
            rel = self.relationship_type,
        )
    }
}

#[async_trait]
impl GraphBackend for Neo4jBackend {
    async fn fetch_triples(&self, limit: usize) -> Result<Vec<Triple>> {
        let mut result = self.graph.execute(query(&self.triples_query(limit))).await?;

        let mut triples = Vec::new();
        while let Some(row) = result.next().await? {
            let n: neo4rs::Node = row.get("n")?;
            let r: neo4rs::Relation = row.get("r")?;
            let m: neo4rs::Node = row.get("m")?;
            triples.push(Triple {
                source: stored_node(&n),
                relationship_type: r.typ().to_string(),
                target: stored_node(&m),
            });
        }

        tracing::debug!("Fetched {} triples", triples.len());
        Ok(triples)
    }

    async fn ping(&self) -> Result<()> {
        let mut result = self.graph.execute(query("RETURN 1 AS ok")).await?;
        match result.next().await? {
            Some(row) => {
                let ok: i64 = row.get("ok")?;
                tracing::debug!("Ping returned {}", ok);
                Ok(())
            }
            None => Err(crate::Error::Database("ping returned no rows".to_string())),
        }
    }
}

fn stored_node(node: &neo4rs::Node) -> StoredNode {
    let properties = node
        .keys()
        .into_iter()
        .filter_map(|key| {
            node.get::<serde_json::Value>(key)
                .ok()
                .map(|value| (key.to_string(), value))
        })
        .collect();

    StoredNode {
        id: node.id(),
        labels: node.labels().into_iter().map(str::to_string).collect(),
        properties,
    }
}

/// Node entry of the `/api/graph` payload
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GraphNode {
    pub id: String,
    pub label: String,
    pub properties: BTreeMap<String, serde_json::Value>,
}

/// Link entry of the `/api/graph` payload
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GraphLink {
    pub source: String,
    pub target: String,
    #[serde(rename = "type")]
    pub kind: String,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct GraphResponse {
    pub nodes: Vec<GraphNode>,
    pub links: Vec<GraphLink>,
}

/// Shape query rows into `{nodes, links}`.
///
/// Nodes are deduplicated by internal id, keeping first-seen order. Every
/// row yields one link.
pub fn build_graph_response(triples: Vec<Triple>) -> GraphResponse {
    let mut response = GraphResponse::default();
    let mut seen: HashSet<i64> = HashSet::new();

    for triple in triples {
        let link = GraphLink {
            source: triple.source.id.to_string(),
            target: triple.target.id.to_string(),
            kind: triple.relationship_type,
        };

        for node in [triple.source, triple.target] {
            if seen.insert(node.id) {
                response.nodes.push(GraphNode {
                    id: node.id.to_string(),
                    label: node.labels.into_iter().next().unwrap_or_else(|| "Node".to_string()),
                    properties: node.properties,
                });
            }
        }

        response.links.push(link);
    }

    response
}


#[cfg(test)]
mod tests {
    use super::testing::{node, triple};
    use super::*;

    #[test]
    fn test_empty_rows() {
        let response = build_graph_response(Vec::new());
        assert_eq!(serde_json::to_value(&response).unwrap(), serde_json::json!({"nodes": [], "links": []}));
    }

    #[test]
    fn test_nodes_deduplicated_by_id() {
        let a = node(1, "a");
        let b = node(2, "b");
        let c = node(3, "c");
        let response = build_graph_response(vec![triple(a.clone(), b.clone()), triple(b, c)]);

        let ids: Vec<_> = response.nodes.iter().map(|n| n.id.as_str()).collect();
        assert_eq!(ids, vec!["1", "2", "3"]);
        assert_eq!(response.links.len(), 2);
        assert_eq!(response.links[1].source, "2");
        assert_eq!(response.nodes[0].properties["name"], serde_json::json!("a"));
    }

    #[test]
    fn test_unlabeled_node_falls_back() {
        let mut bare = node(7, "x");
        bare.labels.clear();
        let response = build_graph_response(vec![triple(bare, node(8, "y"))]);
        assert_eq!(response.nodes[0].label, "Node");
        assert_eq!(response.nodes[1].label, "Dataset");
    }

    #[test]
    fn test_link_serializes_type() {
        let response = build_graph_response(vec![triple(node(1, "a"), node(2, "b"))]);
        let value = serde_json::to_value(&response.links[0]).unwrap();
        assert_eq!(value, serde_json::json!({"source": "1", "target": "2", "type": "TRAINED_ON"}));
    }
}
