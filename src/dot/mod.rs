//! Graph text documents - Graphviz DOT
//!
//! A document is an opening declaration line, a body of node/edge lines, and
//! a closing `}` line. The body is kept verbatim so that subsetting and
//! re-rendering never rewrite lines they did not drop.
//!
//! Body lines are classified on demand by [`parser::parse_line`] into
//! [`Statement`] variants.

pub mod parser;
pub mod writer;

use std::path::Path;

use crate::Result;
use crate::model::{EdgeRecord, NodeRecord};

pub use parser::parse_line;
pub use writer::DotWriter;

/// A node declaration: `id [label="text"];`
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NodeDeclaration {
    pub id: String,
    pub label: Option<String>,
}

/// An edge declaration: `src -> tgt [label="text"];`
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EdgeDeclaration {
    pub source: String,
    pub target: String,
    pub label: Option<String>,
}

/// One classified body line
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Statement {
    Node(NodeDeclaration),
    Edge(EdgeDeclaration),
    /// Anything else: blank lines, comments, attribute defaults, multi-line fragments
    Unrecognized(String),
}

impl Statement {
    pub fn is_unrecognized(&self) -> bool {
        matches!(self, Statement::Unrecognized(_))
    }
}

impl From<NodeDeclaration> for NodeRecord {
    fn from(decl: NodeDeclaration) -> Self {
        NodeRecord::new(decl.id, decl.label.unwrap_or_default())
    }
}

impl From<EdgeDeclaration> for EdgeRecord {
    fn from(decl: EdgeDeclaration) -> Self {
        EdgeRecord::new(decl.source, decl.target, decl.label)
    }
}

/// Structured view of a DOT file.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct DotDocument {
    /// Opening declaration, e.g. `digraph G {`. Leading blank or comment
    /// lines and a brace on its own line are kept as part of it.
    pub header: Option<String>,
    /// Body lines in file order, verbatim
    pub body: Vec<String>,
    /// Closing line, normally `}`
    pub footer: Option<String>,
}

impl DotDocument {
    /// Split a DOT text into header, body and footer.
    ///
    /// The header is recognized structurally: the first line that is not
    /// blank or a comment must open with `graph`/`digraph`/`strict`, and the
    /// brace may follow on a later line. A single-line document such as
    /// `digraph G { a -> b }` is kept whole as the header with an empty body.
    /// A trailing `}` line is always the footer; everything in between is body.
    pub fn parse(text: &str) -> Self {
        let mut lines: Vec<&str> = text.lines().collect();
        while lines.last().is_some_and(|l| l.trim().is_empty()) {
            lines.pop();
        }

        let mut doc = DotDocument::default();
        if lines.is_empty() {
            return doc;
        }

        let mut rest = match header_end(&lines) {
            Some(end) => {
                let rest = lines.split_off(end + 1);
                let closed = lines[end].trim_end().ends_with('}');
                doc.header = Some(lines.join("\n"));
                if closed {
                    doc.body = rest.into_iter().map(str::to_string).collect();
                    return doc;
                }
                rest
            }
            None => lines,
        };

        if rest.last().is_some_and(|l| l.trim() == "}") {
            doc.footer = rest.pop().map(str::to_string);
        }

        doc.body = rest.into_iter().map(str::to_string).collect();
        doc
    }

    /// Read and parse a DOT file
    pub fn from_path(path: &Path) -> Result<Self> {
        let text = std::fs::read_to_string(path)?;
        Ok(Self::parse(&text))
    }

    /// Classify each body line, in file order
    pub fn statements(&self) -> impl Iterator<Item = Statement> + '_ {
        self.body.iter().map(|line| parse_line(line))
    }

    /// Keep only the first `n` body lines
    pub fn truncate_body(&mut self, n: usize) {
        self.body.truncate(n);
    }

    /// Render back to text; every line is newline-terminated
    pub fn render(&self) -> String {
        let mut out = String::new();
        for line in self.header.iter().chain(self.body.iter()).chain(self.footer.iter()) {
            out.push_str(line);
            out.push('\n');
        }
        out
    }

    pub fn write_to_path(&self, path: &Path) -> Result<()> {
        std::fs::write(path, self.render())?;
        Ok(())
    }
}

/// Index of the line that opens the graph body, if the text has a header
fn header_end(lines: &[&str]) -> Option<usize> {
    let first = lines.iter().position(|l| !is_preamble_line(l))?;
    if !opens_graph(lines[first]) {
        return None;
    }
    if lines[first].contains('{') {
        return Some(first);
    }

    let brace = (first + 1..lines.len()).find(|&i| !lines[i].trim().is_empty())?;
    lines[brace].trim_start().starts_with('{').then_some(brace)
}

fn is_preamble_line(line: &str) -> bool {
    let trimmed = line.trim();
    trimmed.is_empty()
        || trimmed.starts_with("//")
        || trimmed.starts_with('#')
        || trimmed.starts_with("/*")
        || trimmed.starts_with('*')
}

fn opens_graph(line: &str) -> bool {
    let trimmed = line.trim_start().to_ascii_lowercase();
    ["strict", "digraph", "graph"].iter().any(|keyword| {
        trimmed
            .strip_prefix(keyword)
            .is_some_and(|rest| !rest.starts_with(|c: char| c.is_ascii_alphanumeric() || c == '_'))
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    const SAMPLE: &str = "digraph G {\n  1 [label=\"bert\"];\n  2 [label=\"gpt\"];\n  1 -> 2 [label=\"finetune\"];\n}\n";

    #[test]
    fn test_parse_splits_header_body_footer() {
        let doc = DotDocument::parse(SAMPLE);
        assert_eq!(doc.header.as_deref(), Some("digraph G {"));
        assert_eq!(doc.footer.as_deref(), Some("}"));
        assert_eq!(doc.body.len(), 3);
    }

    #[test]
    fn test_render_roundtrip() {
        let doc = DotDocument::parse(SAMPLE);
        assert_eq!(doc.render(), SAMPLE);
    }

    #[test]
    fn test_statements_are_classified() {
        let doc = DotDocument::parse(SAMPLE);
        let stmts: Vec<_> = doc.statements().collect();
        assert!(matches!(stmts[0], Statement::Node(_)));
        assert!(matches!(stmts[2], Statement::Edge(_)));
    }

    #[test]
    fn test_single_line_document() {
        let doc = DotDocument::parse("digraph G { a -> b }");
        assert_eq!(doc.header.as_deref(), Some("digraph G { a -> b }"));
        assert!(doc.body.is_empty());
        assert!(doc.footer.is_none());
    }

    #[test]
    fn test_headerless_text_keeps_closing_brace() {
        let doc = DotDocument::parse("a -> b;\nb -> c;\n}");
        assert!(doc.header.is_none());
        assert_eq!(doc.footer.as_deref(), Some("}"));
        assert_eq!(doc.body.len(), 2);
    }

    #[test]
    fn test_leading_blank_line_before_header() {
        let text = "\ndigraph G {\n  1 -> 2;\n}\n";
        let doc = DotDocument::parse(text);
        assert_eq!(doc.header.as_deref(), Some("\ndigraph G {"));
        assert_eq!(doc.body, vec!["  1 -> 2;".to_string()]);
        assert_eq!(doc.footer.as_deref(), Some("}"));
        assert_eq!(doc.render(), text);
    }

    #[test]
    fn test_leading_comments_before_header() {
        let doc = DotDocument::parse("// generated\n/* lineage\n * export */\ndigraph G {\n  1 -> 2;\n}\n");
        assert_eq!(doc.header.as_deref(), Some("// generated\n/* lineage\n * export */\ndigraph G {"));
        assert_eq!(doc.body.len(), 1);
        assert_eq!(doc.footer.as_deref(), Some("}"));
    }

    #[test]
    fn test_brace_on_next_line() {
        let doc = DotDocument::parse("strict digraph G\n{\n  1 -> 2;\n  2 -> 3;\n}\n");
        assert_eq!(doc.header.as_deref(), Some("strict digraph G\n{"));
        assert_eq!(doc.body.len(), 2);
        assert_eq!(doc.footer.as_deref(), Some("}"));
    }

    #[test]
    fn test_keyword_prefix_is_not_a_header() {
        let doc = DotDocument::parse("graphite [label=\"g\"];\n{\n}");
        assert!(doc.header.is_none());
        assert_eq!(doc.body.len(), 2);
    }

    #[test]
    fn test_trailing_blank_lines_are_dropped() {
        let doc = DotDocument::parse("digraph {\na -> b;\n}\n\n\n");
        assert_eq!(doc.footer.as_deref(), Some("}"));
        assert_eq!(doc.body, vec!["a -> b;".to_string()]);
    }
}
