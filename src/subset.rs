//! DOT subsetting - keep the first N body lines
//!
//! Header and footer lines survive verbatim. Node and edge lines are not
//! told apart: the cut is purely by body position.

use std::path::Path;

use crate::Result;
use crate::dot::DotDocument;

/// Number of body lines kept when no limit is given
pub const DEFAULT_SUBSET_LINES: usize = 1000;

/// Summary of a subset run
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SubsetStats {
    pub input_lines: usize,
    pub kept_lines: usize,
}

/// Copy of `doc` with only its first `n` body lines
pub fn subset_document(doc: &DotDocument, n: usize) -> DotDocument {
    let mut out = doc.clone();
    out.truncate_body(n);
    out
}

/// Parse, subset and re-render a DOT text
pub fn subset_text(text: &str, n: usize) -> String {
    subset_document(&DotDocument::parse(text), n).render()
}

/// Subset `input` into `output`, replacing `output` if it exists
pub fn subset_file(input: &Path, output: &Path, n: usize) -> Result<SubsetStats> {
    let doc = DotDocument::from_path(input)?;
    if doc.header.is_none() {
        tracing::warn!("{} has no graph header; subsetting raw lines", input.display());
    }

    let subset = subset_document(&doc, n);
    subset.write_to_path(output)?;

    let stats = SubsetStats {
        input_lines: doc.body.len(),
        kept_lines: subset.body.len(),
    };
    tracing::info!(
        "Kept {} of {} body lines in {}",
        stats.kept_lines,
        stats.input_lines,
        output.display()
    );
    Ok(stats)
}
