//! Line-local DOT statement parser
//!
//! Each body line is classified on its own; statements spanning several
//! lines are not supported. The edge pattern is tried first and a line that
//! matches it is never tested against the node pattern.
//!
//! Identifiers are either bare (`[A-Za-z0-9_.]+`) or double-quoted. The label
//! is taken from a `label=` attribute inside the bracketed attribute list.
//! Bare DOT keywords (`node`, `edge`, `graph`, ...) are never identifiers, on
//! either side of an edge.

use std::sync::OnceLock;

use regex::Regex;

use super::{EdgeDeclaration, NodeDeclaration, Statement};

const ID: &str = r#"(?:"((?:[^"\\]|\\.)*)"|([A-Za-z0-9_.]+))"#;

/// Bracketed attribute list; `]` inside a quoted value does not close it
const ATTRS: &str = r#"\[((?:"(?:[^"\\]|\\.)*"|[^\]"])*)\]"#;

/// DOT keywords that open attribute-default statements, never node ids
const RESERVED: &[&str] = &["node", "edge", "graph", "digraph", "subgraph", "strict"];

fn edge_pattern() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| {
        Regex::new(&format!(r"^\s*{ID}\s*->\s*{ID}\s*(?:{ATTRS})?\s*;?\s*$"))
            .expect("edge pattern is valid")
    })
}

fn node_pattern() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| {
        Regex::new(&format!(r"^\s*{ID}\s*(?:{ATTRS})?\s*;?\s*$"))
            .expect("node pattern is valid")
    })
}

fn label_pattern() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| {
        Regex::new(r#"(?:^|[\s,;])label\s*=\s*(?:"((?:[^"\\]|\\.)*)"|([A-Za-z0-9_.]+))"#)
            .expect("label pattern is valid")
    })
}

/// Classify a single line
pub fn parse_line(line: &str) -> Statement {
    if let Some(caps) = edge_pattern().captures(line) {
        let source = identifier(caps.get(1), caps.get(2));
        let target = identifier(caps.get(3), caps.get(4));
        let bare_keyword =
            |group: usize, id: &Option<String>| caps.get(group).is_none() && id.as_deref().is_some_and(is_reserved);
        if bare_keyword(1, &source) || bare_keyword(3, &target) {
            return Statement::Unrecognized(line.to_string());
        }
        if let (Some(source), Some(target)) = (source, target) {
            let label = caps.get(5).and_then(|m| extract_label(m.as_str()));
            return Statement::Edge(EdgeDeclaration { source, target, label });
        }
    }

    if let Some(caps) = node_pattern().captures(line) {
        let quoted = caps.get(1).is_some();
        if let Some(id) = identifier(caps.get(1), caps.get(2)) {
            if quoted || !is_reserved(&id) {
                let label = caps.get(3).and_then(|m| extract_label(m.as_str()));
                return Statement::Node(NodeDeclaration { id, label });
            }
        }
    }

    Statement::Unrecognized(line.to_string())
}

/// Pull the `label` value out of an attribute list body (`label="x", color=red`)
pub fn extract_label(attrs: &str) -> Option<String> {
    let caps = label_pattern().captures(attrs)?;
    caps.get(1)
        .map(|m| unescape(m.as_str()))
        .or_else(|| caps.get(2).map(|m| m.as_str().to_string()))
}

fn identifier(quoted: Option<regex::Match<'_>>, bare: Option<regex::Match<'_>>) -> Option<String> {
    quoted
        .map(|m| unescape(m.as_str()))
        .or_else(|| bare.map(|m| m.as_str().to_string()))
}

fn is_reserved(id: &str) -> bool {
    RESERVED.iter().any(|k| k.eq_ignore_ascii_case(id))
}

/// Undo `\"` and `\\`; other backslash sequences are DOT escapes and stay as written
fn unescape(s: &str) -> String {
    let mut out = String::with_capacity(s.len());
    let mut chars = s.chars();
    while let Some(c) = chars.next() {
        if c != '\\' {
            out.push(c);
            continue;
        }
        match chars.next() {
            Some(next @ ('"' | '\\')) => out.push(next),
            Some(next) => {
                out.push('\\');
                out.push(next);
            }
            None => out.push('\\'),
        }
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    fn edge(source: &str, target: &str, label: Option<&str>) -> Statement {
        Statement::Edge(EdgeDeclaration {
            source: source.to_string(),
            target: target.to_string(),
            label: label.map(str::to_string),
        })
    }

    fn node(id: &str, label: Option<&str>) -> Statement {
        Statement::Node(NodeDeclaration {
            id: id.to_string(),
            label: label.map(str::to_string),
        })
    }

    #[test]
    fn test_edge_with_label() {
        assert_eq!(parse_line(r#"  12 -> 34 [label="finetune"];"#), edge("12", "34", Some("finetune")));
    }

    #[test]
    fn test_edge_without_label() {
        assert_eq!(parse_line("A -> B;"), edge("A", "B", None));
        assert_eq!(parse_line(r#""A" -> "B""#), edge("A", "B", None));
    }

    #[test]
    fn test_edge_with_extra_attributes() {
        assert_eq!(
            parse_line(r#"a -> b [color=red, label="uses"];"#),
            edge("a", "b", Some("uses"))
        );
    }

    #[test]
    fn test_node_with_label() {
        assert_eq!(parse_line(r#"  "7" [label="llama &amp; co"];"#), node("7", Some("llama &amp; co")));
    }

    #[test]
    fn test_edge_wins_over_node() {
        // an edge line also contains `[label=...]`, but must never become a node
        let stmt = parse_line(r#"1 -> 2 [label="x"];"#);
        assert!(matches!(stmt, Statement::Edge(_)));
    }

    #[test]
    fn test_unrecognized_lines() {
        assert!(parse_line("digraph G {").is_unrecognized());
        assert!(parse_line("}").is_unrecognized());
        assert!(parse_line("").is_unrecognized());
        assert!(parse_line("// comment").is_unrecognized());
        assert!(parse_line("node [shape=box];").is_unrecognized());
        assert!(parse_line("rankdir=LR;").is_unrecognized());
    }

    #[test]
    fn test_quoted_reserved_word_is_a_node() {
        assert_eq!(parse_line(r#""node" [label="n"];"#), node("node", Some("n")));
    }

    #[test]
    fn test_closing_bracket_inside_label() {
        assert_eq!(parse_line(r#"  1 -> 2 [label="fine]tune"];"#), edge("1", "2", Some("fine]tune")));
        assert_eq!(parse_line(r#"  1 [label="bert [v2]"];"#), node("1", Some("bert [v2]")));
        assert_eq!(
            parse_line(r#"a -> b [label="x]", color=red];"#),
            edge("a", "b", Some("x]"))
        );
    }

    #[test]
    fn test_backslashes_are_unescaped() {
        assert_eq!(parse_line(r#"1 [label="C:\\x"];"#), node("1", Some(r"C:\x")));
        assert_eq!(parse_line(r#"1 [label="left\l"];"#), node("1", Some(r"left\l")));
    }

    #[test]
    fn test_bare_keyword_endpoint_is_unrecognized() {
        assert!(parse_line("node -> a;").is_unrecognized());
        assert!(parse_line("a -> graph;").is_unrecognized());
        assert_eq!(parse_line(r#""node" -> a;"#), edge("node", "a", None));
    }

    #[test]
    fn test_escaped_quote_in_identifier() {
        assert_eq!(parse_line(r#""a\"b" -> c;"#), edge("a\"b", "c", None));
    }
}
