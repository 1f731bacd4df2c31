//! # dotcypher - Graph text pipeline
//!
//! Small batch stages that move a graph between text formats, plus a thin
//! read-only API over a property-graph database.
//!
//! dotcypher provides:
//! - CSV node/edge tables to Graphviz DOT
//! - DOT subsetting (first N body lines, header and footer preserved)
//! - DOT to idempotent Cypher `MERGE` scripts
//! - Downstream/upstream lineage extraction from a DOT graph
//! - A self-contained interactive HTML view of a DOT graph
//! - An HTTP endpoint serving Neo4j query results as `{nodes, links}` JSON

pub mod model;
pub mod tabular;
pub mod dot;
pub mod subset;
pub mod cypher;
pub mod lineage;
pub mod viz;
pub mod backend;
pub mod server;
pub mod config;
pub mod output;
pub mod ui;

// Re-exports for convenient access
pub use model::{EdgeRecord, NodeRecord};
pub use dot::{DotDocument, Statement};
pub use cypher::{CypherOptions, CypherScript, ConversionReport};
pub use lineage::{Algorithm, Direction, LineageGraph};
pub use backend::{GraphBackend, Neo4jBackend};

/// Result type alias for dotcypher operations
pub type Result<T> = std::result::Result<T, Error>;

/// Error types for dotcypher operations
#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Config error: {0}")]
    Config(String),

    #[error("Database error: {0}")]
    Database(String),

    #[error("Node not found: {0}")]
    NodeNotFound(String),

    #[error("Invalid input: {0}")]
    InvalidInput(String),
}

impl From<neo4rs::Error> for Error {
    fn from(e: neo4rs::Error) -> Self {
        Error::Database(e.to_string())
    }
}

impl From<neo4rs::DeError> for Error {
    fn from(e: neo4rs::DeError) -> Self {
        Error::Database(e.to_string())
    }
}
