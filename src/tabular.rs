//! Tabular input - node and edge CSV tables
//!
//! Both tables require a header row. Columns:
//! - nodes: `node_id`, `name`
//! - edges: `Source`, `Target`, `edge_type`
//!
//! Lower-case aliases (`id`, `source`, `target`, `label`) are accepted as well.

use std::fs::File;
use std::io::Read;
use std::path::Path;

use serde::Deserialize;

use crate::Result;
use crate::model::{EdgeRecord, NodeRecord};

/// Row-count truncation applied to a table while reading it
#[derive(Debug, Clone, Copy, Default)]
pub struct TableOptions {
    /// Keep at most this many data rows (`None` keeps all)
    pub max_rows: Option<usize>,
}

impl TableOptions {
    pub fn with_max_rows(max_rows: Option<usize>) -> Self {
        Self { max_rows }
    }
}

#[derive(Debug, Deserialize)]
struct NodeRow {
    #[serde(alias = "id")]
    node_id: String,
    name: String,
}

#[derive(Debug, Deserialize)]
struct EdgeRow {
    #[serde(rename = "Source", alias = "source")]
    source: String,
    #[serde(rename = "Target", alias = "target")]
    target: String,
    #[serde(default, alias = "label", alias = "type")]
    edge_type: Option<String>,
}

fn csv_reader<R: Read>(reader: R) -> csv::Reader<R> {
    csv::ReaderBuilder::new()
        .has_headers(true)
        .trim(csv::Trim::All)
        .from_reader(reader)
}

/// Read the node table
pub fn read_nodes<R: Read>(reader: R, options: TableOptions) -> Result<Vec<NodeRecord>> {
    let mut rdr = csv_reader(reader);
    let limit = options.max_rows.unwrap_or(usize::MAX);

    let mut nodes = Vec::new();
    for row in rdr.deserialize::<NodeRow>().take(limit) {
        let row = row?;
        nodes.push(NodeRecord::new(row.node_id, row.name));
    }

    tracing::debug!("Read {} node rows", nodes.len());
    Ok(nodes)
}

/// Read the edge table
pub fn read_edges<R: Read>(reader: R, options: TableOptions) -> Result<Vec<EdgeRecord>> {
    let mut rdr = csv_reader(reader);
    let limit = options.max_rows.unwrap_or(usize::MAX);

    let mut edges = Vec::new();
    for row in rdr.deserialize::<EdgeRow>().take(limit) {
        let row = row?;
        edges.push(EdgeRecord::new(row.source, row.target, row.edge_type));
    }

    tracing::debug!("Read {} edge rows", edges.len());
    Ok(edges)
}

pub fn read_nodes_from_path(path: &Path, options: TableOptions) -> Result<Vec<NodeRecord>> {
    read_nodes(File::open(path)?, options)
}

pub fn read_edges_from_path(path: &Path, options: TableOptions) -> Result<Vec<EdgeRecord>> {
    read_edges(File::open(path)?, options)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_read_nodes() {
        let data = "node_id,name\n1, bert-base \n2,gpt2\n";
        let nodes = read_nodes(data.as_bytes(), TableOptions::default()).unwrap();
        assert_eq!(nodes.len(), 2);
        assert_eq!(nodes[0], NodeRecord::new("1", "bert-base"));
    }

    #[test]
    fn test_row_limit() {
        let data = "node_id,name\n1,a\n2,b\n3,c\n";
        let nodes = read_nodes(data.as_bytes(), TableOptions::with_max_rows(Some(2))).unwrap();
        assert_eq!(nodes.len(), 2);
        assert_eq!(nodes[1].id, "2");
    }

    #[test]
    fn test_read_edges_with_and_without_label() {
        let data = "Source,Target,edge_type\n1,2,finetune\n2,3,\n";
        let edges = read_edges(data.as_bytes(), TableOptions::default()).unwrap();
        assert_eq!(edges.len(), 2);
        assert_eq!(edges[0].label.as_deref(), Some("finetune"));
        assert_eq!(edges[1].label, None);
    }

    #[test]
    fn test_lowercase_aliases() {
        let data = "source,target,label\nA,B,REL\n";
        let edges = read_edges(data.as_bytes(), TableOptions::default()).unwrap();
        assert_eq!(edges[0], EdgeRecord::new("A", "B", Some("REL".to_string())));
    }

    #[test]
    fn test_missing_column_is_error() {
        let data = "node_id,title\n1,a\n";
        let result = read_nodes(data.as_bytes(), TableOptions::default());
        assert!(matches!(result, Err(crate::Error::Csv(_))));
    }
}
