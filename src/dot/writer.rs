//! DOT emission for node/edge records

use std::io::Write;
use std::path::Path;

use crate::Result;
use crate::model::{EdgeRecord, NodeRecord};

/// Writes a `digraph` document: one line per node, then one line per edge.
pub struct DotWriter {
    graph_name: String,
}

impl Default for DotWriter {
    fn default() -> Self {
        Self::new("G")
    }
}

impl DotWriter {
    pub fn new(graph_name: impl Into<String>) -> Self {
        Self {
            graph_name: graph_name.into(),
        }
    }

    pub fn write<W: Write>(&self, out: &mut W, nodes: &[NodeRecord], edges: &[EdgeRecord]) -> Result<()> {
        writeln!(out, "digraph {} {{", format_id(&self.graph_name))?;

        for node in nodes {
            writeln!(out, "  {} [label=\"{}\"];", format_id(&node.id), escape_label(&node.name))?;
        }

        for edge in edges {
            match &edge.label {
                Some(label) => writeln!(
                    out,
                    "  {} -> {} [label=\"{}\"];",
                    format_id(&edge.source),
                    format_id(&edge.target),
                    escape_label(label)
                )?,
                None => writeln!(out, "  {} -> {};", format_id(&edge.source), format_id(&edge.target))?,
            }
        }

        writeln!(out, "}}")?;
        Ok(())
    }

    pub fn render(&self, nodes: &[NodeRecord], edges: &[EdgeRecord]) -> Result<String> {
        let mut buf = Vec::new();
        self.write(&mut buf, nodes, edges)?;
        String::from_utf8(buf).map_err(|e| crate::Error::InvalidInput(e.to_string()))
    }

    /// Write to `path`, replacing any existing file
    pub fn write_to_path(&self, path: &Path, nodes: &[NodeRecord], edges: &[EdgeRecord]) -> Result<()> {
        let file = std::fs::File::create(path)?;
        let mut out = std::io::BufWriter::new(file);
        self.write(&mut out, nodes, edges)?;
        out.flush()?;
        Ok(())
    }
}

/// Make free text safe inside a double-quoted DOT label.
///
/// Double quotes are dropped outright, then the remaining markup
/// characters are HTML-escaped.
pub fn escape_label(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    for c in text.chars() {
        match c {
            '"' => {}
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '\'' => out.push_str("&#x27;"),
            '\\' => out.push_str("\\\\"),
            c => out.push(c),
        }
    }
    out
}

/// Bare identifiers pass through; anything else is double-quoted
pub fn format_id(id: &str) -> String {
    let bare = !id.is_empty() && id.chars().all(|c| c.is_ascii_alphanumeric() || c == '_' || c == '.');
    if bare {
        id.to_string()
    } else {
        quote(id)
    }
}

/// Double-quote a DOT string, escaping `\` and `"`
pub fn quote(text: &str) -> String {
    format!("\"{}\"", text.replace('\\', "\\\\").replace('"', "\\\""))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_escape_label() {
        assert_eq!(escape_label(r#"say "hi" <b> & 'x'"#), "say hi &lt;b&gt; &amp; &#x27;x&#x27;");
    }

    #[test]
    fn test_format_id() {
        assert_eq!(format_id("123"), "123");
        assert_eq!(format_id("bert-base"), "\"bert-base\"");
        assert_eq!(format_id(r"a\b"), r#""a\\b""#);
        assert_eq!(format_id(r#"say "x""#), r#""say \"x\"""#);
    }

    #[test]
    fn test_labels_read_back_unchanged() {
        use crate::dot::{Statement, parse_line};

        let nodes = vec![NodeRecord::new("1", r"C:\x"), NodeRecord::new("2", "bert [v2]")];
        let edges = vec![EdgeRecord::new("1", "2", Some("fine]tune".to_string()))];
        let text = DotWriter::default().render(&nodes, &edges).unwrap();
        let stmts: Vec<Statement> = text.lines().map(parse_line).collect();

        assert!(matches!(&stmts[1], Statement::Node(n) if n.label.as_deref() == Some(r"C:\x")));
        assert!(matches!(&stmts[2], Statement::Node(n) if n.label.as_deref() == Some("bert [v2]")));
        assert!(matches!(&stmts[3], Statement::Edge(e) if e.label.as_deref() == Some("fine]tune")));
    }

    #[test]
    fn test_render_document() {
        let nodes = vec![NodeRecord::new("1", "bert"), NodeRecord::new("2", "gpt")];
        let edges = vec![
            EdgeRecord::new("1", "2", Some("finetune".to_string())),
            EdgeRecord::new("2", "9", None),
        ];
        let text = DotWriter::default().render(&nodes, &edges).unwrap();
        assert_eq!(
            text,
            "digraph G {\n  1 [label=\"bert\"];\n  2 [label=\"gpt\"];\n  1 -> 2 [label=\"finetune\"];\n  2 -> 9;\n}\n"
        );
    }
}
