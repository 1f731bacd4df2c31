use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

use crate::cypher::{CypherOptions, DEFAULT_MAX_EDGES, DEFAULT_NODE_LABEL, DEFAULT_RELATIONSHIP_TYPE};
use crate::subset::DEFAULT_SUBSET_LINES;
use crate::{Error, Result};

pub const ENV_NEO4J_URI: &str = "DOTCYPHER_NEO4J_URI";
pub const ENV_NEO4J_USER: &str = "DOTCYPHER_NEO4J_USER";
pub const ENV_NEO4J_PASSWORD: &str = "DOTCYPHER_NEO4J_PASSWORD";

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct DotcypherConfig {
    pub database: DatabaseConfig,
    pub server: ServerConfig,
    pub convert: ConvertConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct DatabaseConfig {
    pub uri: String,
    pub user: String,
    pub password: String,
    pub node_label: String,
    pub relationship_type: String,
}

impl Default for DatabaseConfig {
    fn default() -> Self {
        Self {
            uri: "bolt://localhost:7687".to_string(),
            user: "neo4j".to_string(),
            password: String::new(),
            node_label: DEFAULT_NODE_LABEL.to_string(),
            relationship_type: DEFAULT_RELATIONSHIP_TYPE.to_string(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ServerConfig {
    pub port: u16,
    /// Row limit of the `/api/graph` query
    pub query_limit: usize,
    /// Directory holding `index.html` and front-end assets
    pub static_dir: PathBuf,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            port: 5000,
            query_limit: 100,
            static_dir: PathBuf::from("."),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ConvertConfig {
    /// Row cap for each CSV table (`None` reads everything)
    pub max_rows: Option<usize>,
    pub subset_lines: usize,
    pub max_edges: Option<usize>,
}

impl Default for ConvertConfig {
    fn default() -> Self {
        Self {
            max_rows: Some(100),
            subset_lines: DEFAULT_SUBSET_LINES,
            max_edges: Some(DEFAULT_MAX_EDGES),
        }
    }
}

impl DotcypherConfig {
    /// Cypher options from the database naming and convert limits
    pub fn cypher_options(&self) -> CypherOptions {
        CypherOptions {
            node_label: self.database.node_label.clone(),
            relationship_type: self.database.relationship_type.clone(),
            max_edges: self.convert.max_edges,
        }
    }

    /// Apply `DOTCYPHER_NEO4J_*` environment overrides
    pub fn apply_env(&mut self) {
        self.apply_overrides(|key| std::env::var(key).ok());
    }

    fn apply_overrides(&mut self, lookup: impl Fn(&str) -> Option<String>) {
        if let Some(uri) = lookup(ENV_NEO4J_URI) {
            self.database.uri = uri;
        }
        if let Some(user) = lookup(ENV_NEO4J_USER) {
            self.database.user = user;
        }
        if let Some(password) = lookup(ENV_NEO4J_PASSWORD) {
            self.database.password = password;
        }
    }
}

pub fn default_config_path() -> PathBuf {
    PathBuf::from("dotcypher.toml")
}

pub fn load_config(path: Option<&Path>) -> Result<Option<DotcypherConfig>> {
    let path = path.map(Path::to_path_buf).unwrap_or_else(default_config_path);
    if !path.exists() {
        return Ok(None);
    }

    let contents = std::fs::read_to_string(&path)?;
    let config: DotcypherConfig =
        toml::from_str(&contents).map_err(|e| Error::Config(format!("{}: {}", path.display(), e)))?;
    Ok(Some(config))
}

/// Config file (if any) with environment overrides applied
pub fn resolve_config(path: Option<&Path>) -> Result<DotcypherConfig> {
    let mut config = load_config(path)?.unwrap_or_default();
    config.apply_env();
    Ok(config)
}

pub fn write_config(path: &Path, config: &DotcypherConfig, force: bool) -> Result<()> {
    if path.exists() && !force {
        return Err(Error::Config(format!(
            "config already exists at {} (use --force to overwrite)",
            path.display()
        )));
    }

    let contents = toml::to_string_pretty(config).map_err(|e| Error::Config(e.to_string()))?;
    std::fs::write(path, contents)?;
    Ok(())
}
