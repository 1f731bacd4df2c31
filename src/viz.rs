//! Interactive HTML view of a DOT graph
//!
//! The page is self-contained apart from the vis-network script it loads:
//! graph data is embedded as JSON into `templates/graph.html`.

use std::collections::HashSet;
use std::path::Path;

use serde::Serialize;

use crate::Result;
use crate::dot::{DotDocument, Statement};

#[derive(Debug, Clone)]
pub struct VizOptions {
    pub title: String,
    /// CSS height of the canvas
    pub height: String,
    /// Start with the physics simulation running
    pub physics: bool,
}

impl Default for VizOptions {
    fn default() -> Self {
        Self {
            title: "Graph".to_string(),
            height: "750px".to_string(),
            physics: true,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct VizNode {
    pub id: String,
    pub label: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct VizEdge {
    pub from: String,
    pub to: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub label: Option<String>,
}

#[derive(Debug, Clone, Default, Serialize)]
pub struct VizGraph {
    pub nodes: Vec<VizNode>,
    pub edges: Vec<VizEdge>,
}

impl VizGraph {
    /// Collect nodes and edges in document order.
    ///
    /// Edge endpoints without a declaration become nodes labelled with their id.
    pub fn from_document(doc: &DotDocument) -> Self {
        let mut graph = VizGraph::default();
        let mut seen: HashSet<String> = HashSet::new();

        let statements: Vec<Statement> = doc.statements().collect();

        for stmt in &statements {
            if let Statement::Node(decl) = stmt {
                if seen.insert(decl.id.clone()) {
                    graph.nodes.push(VizNode {
                        id: decl.id.clone(),
                        label: decl.label.as_deref().map(unescape_html).unwrap_or_else(|| decl.id.clone()),
                    });
                }
            }
        }

        for stmt in statements {
            if let Statement::Edge(decl) = stmt {
                for id in [&decl.source, &decl.target] {
                    if seen.insert(id.clone()) {
                        graph.nodes.push(VizNode {
                            id: id.clone(),
                            label: id.clone(),
                        });
                    }
                }
                graph.edges.push(VizEdge {
                    from: decl.source,
                    to: decl.target,
                    label: decl.label.as_deref().map(unescape_html),
                });
            }
        }

        graph
    }
}

/// Render the HTML page for a document
pub fn render_html(doc: &DotDocument, options: &VizOptions) -> Result<String> {
    let graph = VizGraph::from_document(doc);

    // keep `</script>` in labels from closing the script tag
    let json = serde_json::to_string(&graph)?.replace("</", "<\\/");

    let template = include_str!("../templates/graph.html");
    let mut html = template.to_string();
    html = html.replace("{{TITLE}}", &escape_html(&options.title));
    html = html.replace("{{HEIGHT}}", &escape_html(&options.height));
    html = html.replace("{{NODES_COUNT}}", &graph.nodes.len().to_string());
    html = html.replace("{{EDGES_COUNT}}", &graph.edges.len().to_string());
    html = html.replace("{{PHYSICS_CHECKED}}", if options.physics { "checked" } else { "" });
    html = html.replace("{{PHYSICS}}", &options.physics.to_string());
    html = html.replace("{{GRAPH_JSON}}", &json);

    Ok(html)
}

/// Render `input` to an HTML file at `output`
pub fn render_file(input: &Path, output: &Path, options: &VizOptions) -> Result<VizGraph> {
    let doc = DotDocument::from_path(input)?;
    let html = render_html(&doc, options)?;
    std::fs::write(output, html)?;
    Ok(VizGraph::from_document(&doc))
}

fn escape_html(s: &str) -> String {
    s.replace('&', "&amp;")
        .replace('<', "&lt;")
        .replace('>', "&gt;")
        .replace('"', "&quot;")
}

fn unescape_html(s: &str) -> String {
    s.replace("&lt;", "<")
        .replace("&gt;", ">")
        .replace("&#x27;", "'")
        .replace("&quot;", "\"")
        .replace("&amp;", "&")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_graph_includes_dangling_endpoints() {
        let doc = DotDocument::parse("digraph {\n1 [label=\"a &amp; b\"];\n1 -> 2 [label=\"x\"];\nnode [shape=box];\n}\n");
        let graph = VizGraph::from_document(&doc);
        assert_eq!(
            graph.nodes,
            vec![
                VizNode { id: "1".into(), label: "a & b".into() },
                VizNode { id: "2".into(), label: "2".into() },
            ]
        );
        assert_eq!(graph.edges.len(), 1);
    }

    #[test]
    fn test_keyword_endpoints_are_not_nodes() {
        let doc = DotDocument::parse("digraph {\n1 -> 2;\nnode -> 1;\n2 -> graph;\nedge [color=red];\n}\n");
        let graph = VizGraph::from_document(&doc);
        let ids: Vec<&str> = graph.nodes.iter().map(|n| n.id.as_str()).collect();
        assert_eq!(ids, vec!["1", "2"]);
        assert_eq!(graph.edges.len(), 1);
    }

    #[test]
    fn test_render_html_embeds_data() {
        let doc = DotDocument::parse("digraph {\n1 -> 2;\n}\n");
        let html = render_html(&doc, &VizOptions::default()).unwrap();
        assert!(html.contains("\"from\":\"1\""));
        assert!(html.contains("2 nodes, 1 edges"));
        assert!(!html.contains("{{"));
    }

    #[test]
    fn test_script_close_is_escaped() {
        let doc = DotDocument::parse("digraph {\n1 [label=\"</script>\"];\n}\n");
        let html = render_html(&doc, &VizOptions::default()).unwrap();
        assert!(!html.contains("</script>\""));
    }
}
