/*!
 * Context handed to the translation and review capabilities.
 *
 * - `Glossary` and `AuthorProfile` are opaque textual context, passed
 *   through unmodified and only rendered into prompts.
 * - `translation_context` and `plan_review_batches` hold the index
 *   arithmetic of the pipeline as pure functions.
 */

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt::Write;
use std::path::Path;

/// Text used in prompts when a piece of context is absent
pub const NO_CONTEXT: &str = "None";

/// Term glossary: either source term to target term, or a bare list of source terms
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Glossary {
    /// Source term mapped to its preferred translation
    Mapping(BTreeMap<String, String>),
    /// Source terms to keep consistent, without a fixed translation
    Terms(Vec<String>),
}

impl Default for Glossary {
    fn default() -> Self {
        Self::empty()
    }
}

impl Glossary {
    /// A glossary with no entries
    pub fn empty() -> Self {
        Self::Mapping(BTreeMap::new())
    }

    /// Number of entries
    pub fn len(&self) -> usize {
        match self {
            Self::Mapping(map) => map.len(),
            Self::Terms(terms) => terms.len(),
        }
    }

    /// Whether the glossary has no entries
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Render the glossary for a prompt, one entry per line
    pub fn to_prompt_text(&self) -> String {
        if self.is_empty() {
            return NO_CONTEXT.to_string();
        }

        let mut out = String::new();
        match self {
            Self::Mapping(map) => {
                for (source, target) in map {
                    let _ = writeln!(out, "- {} -> {}", source, target);
                }
            }
            Self::Terms(terms) => {
                for term in terms {
                    let _ = writeln!(out, "- {}", term);
                }
            }
        }
        out.trim_end().to_string()
    }

    /// Load a glossary from a JSON file (object or array)
    pub fn load(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read glossary file: {}", path.display()))?;
        serde_json::from_str(&content)
            .with_context(|| format!("Failed to parse glossary file: {}", path.display()))
    }
}

/// Free-form description of the author's style
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct AuthorProfile {
    /// Author name, if known
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub author: Option<String>,

    /// Style attributes such as tone, register or sentence structure
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub style_analysis: BTreeMap<String, serde_json::Value>,

    /// Any other attribute the profiler produced
    #[serde(flatten)]
    pub extra: BTreeMap<String, serde_json::Value>,
}

impl AuthorProfile {
    /// Profile carrying only an author name
    pub fn for_author(author: impl Into<String>) -> Self {
        Self {
            author: Some(author.into()),
            ..Self::default()
        }
    }

    /// Whether the profile carries nothing at all
    pub fn is_empty(&self) -> bool {
        self.author.is_none() && self.style_analysis.is_empty() && self.extra.is_empty()
    }

    /// Render the profile for a prompt
    pub fn to_prompt_text(&self) -> String {
        if self.is_empty() {
            return NO_CONTEXT.to_string();
        }

        let mut out = String::new();
        if let Some(author) = &self.author {
            let _ = writeln!(out, "Author: {}", author);
        }
        for (key, value) in self.style_analysis.iter().chain(self.extra.iter()) {
            let _ = writeln!(out, "{}: {}", key, render_value(value));
        }
        out.trim_end().to_string()
    }

    /// Load a profile from a JSON file
    pub fn load(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read profile file: {}", path.display()))?;
        serde_json::from_str(&content)
            .with_context(|| format!("Failed to parse profile file: {}", path.display()))
    }
}

/// Strings without their JSON quotes, everything else as compact JSON
fn render_value(value: &serde_json::Value) -> String {
    match value {
        serde_json::Value::String(s) => s.clone(),
        serde_json::Value::Array(items) => items.iter().map(render_value).collect::<Vec<_>>().join(", "),
        other => other.to_string(),
    }
}

/// Neighbours of block `index` used as translation context
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TranslationContext {
    /// Index of the translated unit before the block
    pub previous: Option<usize>,
    /// Index of the source block after the block
    pub next: Option<usize>,
}

/// Context indices for block `index` of a document with `block_count` blocks
pub fn translation_context(index: usize, block_count: usize) -> TranslationContext {
    TranslationContext {
        previous: index.checked_sub(1),
        next: (index + 1 < block_count).then_some(index + 1),
    }
}

/// A contiguous group of translated units reviewed in one call
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ReviewBatch {
    /// Position of the batch in emission order
    pub index: usize,
    /// First translated unit of the batch
    pub start: usize,
    /// One past the last translated unit
    pub end: usize,
    /// First source block of the context window
    pub window_start: usize,
    /// One past the last source block of the context window
    pub window_end: usize,
}

impl ReviewBatch {
    /// Number of translated units in the batch
    pub fn len(&self) -> usize {
        self.end - self.start
    }

    /// Whether the batch covers no unit
    pub fn is_empty(&self) -> bool {
        self.start == self.end
    }

    /// Whether this is the undersized batch closing the document
    pub fn is_trailing(&self, batch_size: usize) -> bool {
        self.len() < batch_size
    }
}

/// Plan the review batches of `block_count` translated units
///
/// Full batches close after every `batch_size` units and see the last
/// `context_width` source blocks up to their end. The units left after the
/// last full batch form a trailing batch whose window is widened backwards
/// by `context_width - remaining`, clamped at zero. `batch_size` must be
/// non-zero.
pub fn plan_review_batches(block_count: usize, batch_size: usize, context_width: usize) -> Vec<ReviewBatch> {
    debug_assert!(batch_size > 0, "batch size must be non-zero");
    let batch_size = batch_size.max(1);

    let mut batches = Vec::with_capacity(block_count.div_ceil(batch_size));
    let full_end = block_count - block_count % batch_size;

    for end in (batch_size..=full_end).step_by(batch_size) {
        batches.push(ReviewBatch {
            index: batches.len(),
            start: end - batch_size,
            end,
            window_start: end.saturating_sub(context_width),
            window_end: end,
        });
    }

    let remaining = block_count - full_end;
    if remaining > 0 {
        batches.push(ReviewBatch {
            index: batches.len(),
            start: full_end,
            end: block_count,
            window_start: full_end.saturating_sub(context_width.saturating_sub(remaining)),
            window_end: block_count,
        });
    }

    batches
}
