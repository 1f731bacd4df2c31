//! Lineage traversal over a DOT graph
//!
//! Builds forward and reverse adjacency from the edge declarations of a
//! document and walks them breadth-first or depth-first from a start node:
//! - `Downstream`: follow edges source -> target (what derives from the node)
//! - `Upstream`: follow edges target -> source (what the node derives from)
//! - `Both`: union of the two
//!
//! The result can be rendered back to DOT, so a lineage slice can be fed to
//! the Cypher converter or the HTML view like any other graph.

use std::collections::{BTreeMap, HashMap, HashSet, VecDeque};
use std::str::FromStr;

use serde::Serialize;

use crate::dot::{DotDocument, Statement, writer};
use crate::model::EdgeRecord;
use crate::{Error, Result};

/// Traversal direction
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Direction {
    Downstream,
    Upstream,
    Both,
}

impl Direction {
    pub fn as_str(&self) -> &'static str {
        match self {
            Direction::Downstream => "downstream",
            Direction::Upstream => "upstream",
            Direction::Both => "both",
        }
    }
}

impl FromStr for Direction {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_ascii_lowercase().as_str() {
            "downstream" | "down" | "forward" | "out" => Ok(Direction::Downstream),
            "upstream" | "up" | "backward" | "in" => Ok(Direction::Upstream),
            "both" => Ok(Direction::Both),
            other => Err(Error::InvalidInput(format!(
                "unknown direction `{other}` (expected downstream|upstream|both)"
            ))),
        }
    }
}

impl std::fmt::Display for Direction {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Traversal order
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Algorithm {
    #[default]
    Bfs,
    /// Neighbours are pushed in reverse so the first one is expanded first
    Dfs,
}

impl Algorithm {
    pub fn as_str(&self) -> &'static str {
        match self {
            Algorithm::Bfs => "bfs",
            Algorithm::Dfs => "dfs",
        }
    }
}

impl FromStr for Algorithm {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_ascii_lowercase().as_str() {
            "bfs" | "breadth" | "breadth-first" => Ok(Algorithm::Bfs),
            "dfs" | "depth" | "depth-first" => Ok(Algorithm::Dfs),
            other => Err(Error::InvalidInput(format!("unknown algorithm `{other}` (expected bfs|dfs)"))),
        }
    }
}

impl std::fmt::Display for Algorithm {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// A node reached by a traversal
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Visit {
    pub id: String,
    /// Hops from the start node (0 for the start itself)
    pub level: usize,
    /// Node ids from the start node to this one, inclusive
    pub path: Vec<String>,
}

impl Visit {
    pub fn is_start(&self) -> bool {
        self.level == 0
    }

    fn step(&self, next: &str) -> Visit {
        let mut path = self.path.clone();
        path.push(next.to_string());
        Visit {
            id: next.to_string(),
            level: self.level + 1,
            path,
        }
    }
}

/// Outcome of a traversal: visits in traversal order plus the edges between them
#[derive(Debug, Clone, Serialize)]
pub struct Lineage {
    pub start: String,
    pub direction: Direction,
    pub algorithm: Algorithm,
    pub visits: Vec<Visit>,
    pub edges: Vec<EdgeRecord>,
}

impl Lineage {
    pub fn max_level(&self) -> usize {
        self.visits.iter().map(|v| v.level).max().unwrap_or(0)
    }
}

const LEVEL_COLORS: &[&str] = &[
    "red", "orange", "yellow", "lightgreen", "lightblue", "lightpink", "lavender", "lightcyan", "lightgray",
];

/// Adjacency view of a DOT document
#[derive(Debug, Default)]
pub struct LineageGraph {
    edges: Vec<EdgeRecord>,
    /// node -> indices of edges leaving it
    outgoing: HashMap<String, Vec<usize>>,
    /// node -> indices of edges entering it
    incoming: HashMap<String, Vec<usize>>,
    labels: HashMap<String, String>,
}

impl LineageGraph {
    pub fn from_document(doc: &DotDocument) -> Self {
        let mut graph = LineageGraph::default();
        for stmt in doc.statements() {
            match stmt {
                Statement::Node(decl) => {
                    if let Some(label) = decl.label {
                        graph.labels.insert(decl.id, label);
                    }
                }
                Statement::Edge(decl) => graph.add_edge(decl.into()),
                Statement::Unrecognized(_) => {}
            }
        }
        graph
    }

    pub fn add_edge(&mut self, edge: EdgeRecord) {
        let idx = self.edges.len();
        self.outgoing.entry(edge.source.clone()).or_default().push(idx);
        self.incoming.entry(edge.target.clone()).or_default().push(idx);
        self.edges.push(edge);
    }

    pub fn contains(&self, id: &str) -> bool {
        self.outgoing.contains_key(id) || self.incoming.contains_key(id) || self.labels.contains_key(id)
    }

    pub fn label(&self, id: &str) -> Option<&str> {
        self.labels.get(id).map(String::as_str)
    }

    /// Resolve user input to a node id.
    ///
    /// Tries the exact id, then the id without leading zeros, then a
    /// case-insensitive exact label match.
    pub fn resolve(&self, input: &str) -> Result<String> {
        let input = input.trim();
        if self.contains(input) {
            return Ok(input.to_string());
        }

        let stripped = input.trim_start_matches('0');
        let stripped = if stripped.is_empty() && !input.is_empty() { "0" } else { stripped };
        if self.contains(stripped) {
            return Ok(stripped.to_string());
        }

        let mut by_label: Vec<&String> = self
            .labels
            .iter()
            .filter(|(_, label)| label.eq_ignore_ascii_case(input))
            .map(|(id, _)| id)
            .collect();
        by_label.sort();
        by_label
            .first()
            .map(|id| id.to_string())
            .ok_or_else(|| Error::NodeNotFound(input.to_string()))
    }

    /// Walk from `start` up to `depth` hops
    pub fn traverse(&self, start: &str, direction: Direction, depth: usize, algorithm: Algorithm) -> Result<Lineage> {
        let start = self.resolve(start)?;
        let root = Visit {
            id: start.clone(),
            level: 0,
            path: vec![start.clone()],
        };

        let (visits, edge_ids) = match algorithm {
            Algorithm::Bfs => self.breadth_first(root, direction, depth),
            Algorithm::Dfs => self.depth_first(root, direction, depth),
        };

        tracing::debug!(
            "Traversed {} ({}) from {}: {} nodes, {} edges",
            direction,
            algorithm,
            start,
            visits.len(),
            edge_ids.len()
        );

        Ok(Lineage {
            start,
            direction,
            algorithm,
            visits,
            edges: edge_ids.into_iter().map(|i| self.edges[i].clone()).collect(),
        })
    }

    fn breadth_first(&self, root: Visit, direction: Direction, depth: usize) -> (Vec<Visit>, Vec<usize>) {
        let mut visited: HashSet<String> = HashSet::new();
        let mut queue = VecDeque::new();
        let mut visits: Vec<Visit> = Vec::new();
        let mut edge_ids: Vec<usize> = Vec::new();
        let mut seen_edges: HashSet<usize> = HashSet::new();

        visited.insert(root.id.clone());
        queue.push_back(root);

        while let Some(visit) = queue.pop_front() {
            if visit.level < depth {
                for (edge_idx, next) in self.neighbors(&visit.id, direction) {
                    if !visited.contains(next) {
                        visited.insert(next.to_string());
                        queue.push_back(visit.step(next));
                    }
                    if visited.contains(next) && seen_edges.insert(edge_idx) {
                        edge_ids.push(edge_idx);
                    }
                }
            }
            visits.push(visit);
        }

        (visits, edge_ids)
    }

    fn depth_first(&self, root: Visit, direction: Direction, depth: usize) -> (Vec<Visit>, Vec<usize>) {
        let mut visited: HashSet<String> = HashSet::new();
        let mut stack = vec![root];
        let mut visits: Vec<Visit> = Vec::new();
        let mut candidates: Vec<usize> = Vec::new();

        while let Some(visit) = stack.pop() {
            if !visited.insert(visit.id.clone()) {
                continue;
            }
            if visit.level < depth {
                for (edge_idx, next) in self.neighbors(&visit.id, direction).into_iter().rev() {
                    candidates.push(edge_idx);
                    if !visited.contains(next) {
                        stack.push(visit.step(next));
                    }
                }
            }
            visits.push(visit);
        }

        // keep edges whose far end was reached, in discovery order
        let mut seen_edges: HashSet<usize> = HashSet::new();
        let edge_ids = candidates
            .into_iter()
            .filter(|&idx| {
                let edge = &self.edges[idx];
                visited.contains(&edge.source) && visited.contains(&edge.target) && seen_edges.insert(idx)
            })
            .collect();

        (visits, edge_ids)
    }

    /// Traverse and render the reached part of the graph as DOT
    pub fn subgraph(
        &self,
        start: &str,
        direction: Direction,
        depth: usize,
        algorithm: Algorithm,
    ) -> Result<DotDocument> {
        let lineage = self.traverse(start, direction, depth, algorithm)?;
        Ok(self.render_lineage(&lineage))
    }

    /// DOT rendering: nodes colored by level, original edge labels kept
    pub fn render_lineage(&self, lineage: &Lineage) -> DotDocument {
        let max_level = lineage.max_level();
        let title = format!("{}_of_{}", lineage.direction.as_str(), lineage.start);

        let mut body = vec![
            "  node [shape=box, style=filled];".to_string(),
            format!("  // Algorithm: {}", lineage.algorithm.as_str().to_ascii_uppercase()),
            format!("  // Nodes visited: {}", lineage.visits.len()),
            format!("  // Edges found: {}", lineage.edges.len()),
            format!("  // Maximum depth: {}", max_level),
        ];

        let mut levels: BTreeMap<usize, Vec<&str>> = BTreeMap::new();
        for visit in &lineage.visits {
            levels.entry(visit.level).or_default().push(&visit.id);
        }
        for (level, ids) in &levels {
            let members: Vec<String> = ids.iter().map(|id| format!("{};", writer::format_id(id))).collect();
            body.push(format!("  {{ rank=same; {} }}", members.join(" ")));
            tracing::trace!("level {} has {} nodes", level, ids.len());
        }

        for visit in &lineage.visits {
            let name = self.label(&visit.id).unwrap_or(&visit.id);
            let color = LEVEL_COLORS[visit.level % LEVEL_COLORS.len()];
            let bold = if visit.level == max_level && max_level > 0 { ", penwidth=3" } else { "" };
            body.push(format!(
                "  {} [label={}, level={}, fillcolor={}{}];",
                writer::format_id(&visit.id),
                writer::quote(name),
                visit.level,
                color,
                bold
            ));
        }

        for edge in &lineage.edges {
            let label = edge
                .label
                .as_ref()
                .map(|l| format!(" [label={}]", writer::quote(l)))
                .unwrap_or_default();
            body.push(format!(
                "  {} -> {}{};",
                writer::format_id(&edge.source),
                writer::format_id(&edge.target),
                label
            ));
        }

        DotDocument {
            header: Some(format!("digraph {} {{", writer::format_id(&title))),
            body,
            footer: Some("}".to_string()),
        }
    }

    fn neighbors<'a>(&'a self, id: &str, direction: Direction) -> Vec<(usize, &'a str)> {
        let mut out = Vec::new();
        if matches!(direction, Direction::Downstream | Direction::Both) {
            for &idx in self.outgoing.get(id).map(Vec::as_slice).unwrap_or(&[]) {
                out.push((idx, self.edges[idx].target.as_str()));
            }
        }
        if matches!(direction, Direction::Upstream | Direction::Both) {
            for &idx in self.incoming.get(id).map(Vec::as_slice).unwrap_or(&[]) {
                out.push((idx, self.edges[idx].source.as_str()));
            }
        }
        out
    }
}
