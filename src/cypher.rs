//! DOT to Cypher - idempotent `MERGE` scripts
//!
//! Conversion runs in three steps:
//! 1. Scan the document once, recording node names and edges in file order
//! 2. Keep the first `max_edges` edges
//! 3. Emit one node `MERGE` per identifier referenced by a kept edge (sorted),
//!    then one relationship `MERGE` per kept edge (file order)
//!
//! Declared nodes that no kept edge touches are dropped. Edge endpoints that
//! were never declared still get a node statement, with an empty name.
//! Every edge uses the same relationship type; its DOT label travels as the
//! `type` property.

use std::collections::{BTreeSet, HashMap};
use std::fmt;
use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::Result;
use crate::dot::{DotDocument, Statement};
use crate::model::EdgeRecord;

pub const DEFAULT_NODE_LABEL: &str = "Dataset";
pub const DEFAULT_RELATIONSHIP_TYPE: &str = "TRAINED_ON";
pub const DEFAULT_MAX_EDGES: usize = 1000;

/// Conversion settings
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CypherOptions {
    pub node_label: String,
    pub relationship_type: String,
    /// Keep at most this many edges (`None` keeps all)
    pub max_edges: Option<usize>,
}

impl Default for CypherOptions {
    fn default() -> Self {
        Self {
            node_label: DEFAULT_NODE_LABEL.to_string(),
            relationship_type: DEFAULT_RELATIONSHIP_TYPE.to_string(),
            max_edges: Some(DEFAULT_MAX_EDGES),
        }
    }
}

/// A single upsert statement
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CypherStatement {
    MergeNode { id: String, name: String },
    MergeRelationship { source: String, target: String, label: Option<String> },
}

impl CypherStatement {
    pub fn is_node(&self) -> bool {
        matches!(self, CypherStatement::MergeNode { .. })
    }

    /// Render as one `;`-terminated line
    pub fn render(&self, options: &CypherOptions) -> String {
        let node_label = sanitize_identifier(&options.node_label);
        match self {
            CypherStatement::MergeNode { id, name } => format!(
                "MERGE (n:{node_label} {{id: \"{}\"}}) SET n.name = \"{}\";",
                escape_string(id),
                escape_string(name)
            ),
            CypherStatement::MergeRelationship { source, target, label } => {
                let rel_type = sanitize_identifier(&options.relationship_type);
                let props = label
                    .as_ref()
                    .map(|l| format!(" {{type: \"{}\"}}", escape_string(l)))
                    .unwrap_or_default();
                format!(
                    "MATCH (a:{node_label} {{id: \"{}\"}}), (b:{node_label} {{id: \"{}\"}}) MERGE (a)-[:{rel_type}{props}]->(b);",
                    escape_string(source),
                    escape_string(target)
                )
            }
        }
    }
}

/// Counts gathered while converting a document
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct ConversionReport {
    /// Node declarations seen in the document
    pub declared_nodes: usize,
    /// Edge declarations seen in the document
    pub recorded_edges: usize,
    /// Edges kept after the `max_edges` cut
    pub retained_edges: usize,
    /// Node statements emitted
    pub emitted_nodes: usize,
    /// Emitted nodes that had no declaration (empty name)
    pub dangling_nodes: usize,
    /// Body lines matching neither pattern
    pub unrecognized_lines: usize,
}

impl fmt::Display for ConversionReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "Conversion Report:")?;
        writeln!(f, "  Declared nodes: {}", self.declared_nodes)?;
        writeln!(f, "  Recorded edges: {}", self.recorded_edges)?;
        writeln!(f, "  Retained edges: {}", self.retained_edges)?;
        writeln!(f, "  Emitted nodes: {}", self.emitted_nodes)?;
        writeln!(f, "  Dangling nodes: {}", self.dangling_nodes)?;
        write!(f, "  Unrecognized lines: {}", self.unrecognized_lines)
    }
}

/// An ordered Cypher import script
#[derive(Debug, Clone)]
pub struct CypherScript {
    options: CypherOptions,
    statements: Vec<CypherStatement>,
    report: ConversionReport,
}

impl CypherScript {
    /// Convert a parsed DOT document
    pub fn from_document(doc: &DotDocument, options: CypherOptions) -> Self {
        let mut report = ConversionReport::default();
        let mut names: HashMap<String, String> = HashMap::new();
        let mut edges: Vec<EdgeRecord> = Vec::new();

        for stmt in doc.statements() {
            match stmt {
                Statement::Edge(decl) => edges.push(decl.into()),
                Statement::Node(decl) => {
                    report.declared_nodes += 1;
                    // only a labeled declaration names the node; later attribute-only lines keep it
                    match decl.label {
                        Some(label) => {
                            names.insert(decl.id, label);
                        }
                        None => {
                            names.entry(decl.id).or_default();
                        }
                    }
                }
                Statement::Unrecognized(line) => {
                    report.unrecognized_lines += 1;
                    if !line.trim().is_empty() {
                        tracing::trace!("Skipping unrecognized line: {}", line);
                    }
                }
            }
        }
        report.recorded_edges = edges.len();

        if let Some(max) = options.max_edges {
            edges.truncate(max);
        }
        report.retained_edges = edges.len();

        let used: BTreeSet<&str> = edges
            .iter()
            .flat_map(|e| [e.source.as_str(), e.target.as_str()])
            .collect();

        let mut statements = Vec::with_capacity(used.len() + edges.len());
        for id in &used {
            let name = match names.get(*id) {
                Some(name) => name.clone(),
                None => {
                    report.dangling_nodes += 1;
                    String::new()
                }
            };
            statements.push(CypherStatement::MergeNode {
                id: id.to_string(),
                name,
            });
        }
        report.emitted_nodes = used.len();

        statements.extend(edges.into_iter().map(|e| CypherStatement::MergeRelationship {
            source: e.source,
            target: e.target,
            label: e.label,
        }));

        if report.dangling_nodes > 0 {
            tracing::debug!("{} edge endpoints have no node declaration", report.dangling_nodes);
        }

        Self {
            options,
            statements,
            report,
        }
    }

    pub fn statements(&self) -> &[CypherStatement] {
        &self.statements
    }

    pub fn report(&self) -> &ConversionReport {
        &self.report
    }

    pub fn node_statements(&self) -> impl Iterator<Item = &CypherStatement> {
        self.statements.iter().filter(|s| s.is_node())
    }

    pub fn relationship_statements(&self) -> impl Iterator<Item = &CypherStatement> {
        self.statements.iter().filter(|s| !s.is_node())
    }

    /// One statement per line
    pub fn render(&self) -> String {
        let mut out = String::new();
        for stmt in &self.statements {
            out.push_str(&stmt.render(&self.options));
            out.push('\n');
        }
        out
    }

    /// Write the script to `path`, replacing any existing file
    pub fn write_to_path(&self, path: &Path) -> Result<()> {
        std::fs::write(path, self.render())?;
        Ok(())
    }
}

/// Convert the DOT file at `input` into a Cypher script at `output`
pub fn convert_file(input: &Path, output: &Path, options: CypherOptions) -> Result<ConversionReport> {
    let doc = DotDocument::from_path(input)?;
    let script = CypherScript::from_document(&doc, options);
    script.write_to_path(output)?;

    tracing::info!(
        "Cypher script written to {} with {} nodes and {} edges",
        output.display(),
        script.report.emitted_nodes,
        script.report.retained_edges
    );
    Ok(script.report.clone())
}

/// Escape a value for a double-quoted Cypher string literal
pub fn escape_string(s: &str) -> String {
    s.replace('\\', "\\\\").replace('"', "\\\"")
}

/// Reduce a label or relationship type to identifier characters
pub fn sanitize_identifier(s: &str) -> String {
    let cleaned: String = s
        .chars()
        .map(|c| if c.is_alphanumeric() || c == '_' { c } else { '_' })
        .collect();
    if cleaned.is_empty() {
        "_".to_string()
    } else {
        cleaned
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn convert(text: &str, max_edges: Option<usize>) -> CypherScript {
        let options = CypherOptions {
            max_edges,
            ..CypherOptions::default()
        };
        CypherScript::from_document(&DotDocument::parse(text), options)
    }

    #[test]
    fn test_statement_format() {
        let script = convert("digraph {\n1 [label=\"bert\"];\n2 [label=\"gpt\"];\n1 -> 2 [label=\"finetune\"];\n}\n", None);
        assert_eq!(
            script.render(),
            "MERGE (n:Dataset {id: \"1\"}) SET n.name = \"bert\";\n\
             MERGE (n:Dataset {id: \"2\"}) SET n.name = \"gpt\";\n\
             MATCH (a:Dataset {id: \"1\"}), (b:Dataset {id: \"2\"}) MERGE (a)-[:TRAINED_ON {type: \"finetune\"}]->(b);\n"
        );
    }

    #[test]
    fn test_unlabeled_edge_has_no_properties() {
        let script = convert("digraph {\n1 -> 2;\n}\n", None);
        let rel = script.relationship_statements().next().unwrap();
        assert_eq!(
            rel.render(&CypherOptions::default()),
            "MATCH (a:Dataset {id: \"1\"}), (b:Dataset {id: \"2\"}) MERGE (a)-[:TRAINED_ON]->(b);"
        );
    }

    #[test]
    fn test_unreferenced_nodes_are_dropped() {
        let script = convert("digraph {\n1 [label=\"a\"];\n2 [label=\"b\"];\n3 [label=\"c\"];\n1 -> 2;\n}\n", None);
        let ids: Vec<_> = script
            .node_statements()
            .map(|s| match s {
                CypherStatement::MergeNode { id, .. } => id.as_str(),
                _ => unreachable!(),
            })
            .collect();
        assert_eq!(ids, vec!["1", "2"]);
        assert_eq!(script.report().declared_nodes, 3);
    }

    #[test]
    fn test_edge_limit_keeps_file_order() {
        let script = convert("digraph {\n5 -> 6;\n1 -> 2;\n3 -> 4;\n}\n", Some(2));
        let rels: Vec<_> = script.relationship_statements().cloned().collect();
        assert_eq!(rels.len(), 2);
        assert_eq!(
            rels[0],
            CypherStatement::MergeRelationship { source: "5".into(), target: "6".into(), label: None }
        );
        // node statements are sorted and only cover the first two edges
        assert_eq!(script.node_statements().count(), 4);
        assert!(matches!(&script.statements()[0], CypherStatement::MergeNode { id, .. } if id == "1"));
    }

    #[test]
    fn test_undeclared_endpoint_gets_empty_name() {
        let script = convert("digraph {\n1 [label=\"a\"];\n1 -> 99 [label=\"x\"];\n}\n", None);
        assert!(script.statements().contains(&CypherStatement::MergeNode {
            id: "99".into(),
            name: String::new()
        }));
        assert_eq!(script.report().dangling_nodes, 1);
        assert_eq!(script.relationship_statements().count(), 1);
    }

    #[test]
    fn test_unlabeled_redeclaration_keeps_name() {
        let script = convert("digraph {\n1 [label=\"bert\"];\n1 [shape=box];\n2 [color=red];\n1 -> 2;\n}\n", None);
        assert_eq!(
            script.statements()[..2],
            [
                CypherStatement::MergeNode { id: "1".into(), name: "bert".into() },
                CypherStatement::MergeNode { id: "2".into(), name: String::new() },
            ]
        );
        assert_eq!(script.report().dangling_nodes, 0);
    }

    #[test]
    fn test_unrecognized_lines_are_counted() {
        let script = convert("digraph {\nrankdir=LR;\n\n1 -> 2;\n}\n", None);
        assert_eq!(script.report().unrecognized_lines, 2);
        assert_eq!(script.report().retained_edges, 1);
    }

    #[test]
    fn test_escape_and_sanitize() {
        assert_eq!(escape_string(r#"a "b" \c"#), r#"a \"b\" \\c"#);
        assert_eq!(sanitize_identifier("TRAINED ON-X"), "TRAINED_ON_X");
    }
}
