/*!
 * Paragraph-respecting, token-budgeted block splitting.
 *
 * A document is a sequence of paragraphs separated by one or more blank
 * lines. Consecutive paragraphs are packed into blocks whose summed token
 * count stays within a budget; a paragraph is never split, so a single
 * oversized paragraph still becomes a block of its own.
 */

use once_cell::sync::Lazy;
use regex::Regex;

/// One or more blank lines (empty or spaces/tabs only), `\r\n` tolerated
static PARAGRAPH_BREAK: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"\r?\n(?:[ \t]*\r?\n)+").unwrap()
});

/// Separator placed between paragraphs of a block and between units of a document
pub const PARAGRAPH_SEPARATOR: &str = "\n\n";

/// Counts tokens in a piece of text
///
/// Implementations must be deterministic and side-effect free: the segmenter
/// calls them once per paragraph and relies on the sum of the counts.
pub trait TokenCounter: Send + Sync {
    /// Number of tokens in `text`
    fn count_tokens(&self, text: &str) -> usize;
}

/// Character-based estimate used when no tokenizer is available
///
/// Roughly 4 characters per token for Latin scripts, but never fewer tokens
/// than whitespace-separated words.
#[derive(Debug, Clone, Copy, Default)]
pub struct HeuristicTokenCounter;

impl TokenCounter for HeuristicTokenCounter {
    fn count_tokens(&self, text: &str) -> usize {
        let chars = text.chars().count();
        let words = text.split_whitespace().count();
        chars.div_ceil(4).max(words)
    }
}

impl<F> TokenCounter for F
where
    F: Fn(&str) -> usize + Send + Sync,
{
    fn count_tokens(&self, text: &str) -> usize {
        self(text)
    }
}

/// A run of consecutive paragraphs sent to the translator in one call
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Block {
    /// Position of the block in the document, starting at 0
    pub index: usize,
    /// Paragraphs joined by a blank line
    pub text: String,
    /// Number of paragraphs in the block
    pub paragraph_count: usize,
    /// Sum of the paragraph token counts
    pub token_count: usize,
}

/// Split a document into its paragraphs, in order
///
/// Whitespace-only pieces are dropped. Interior line breaks and leading
/// indentation are kept; trailing line breaks are removed.
pub fn split_paragraphs(document: &str) -> Vec<&str> {
    PARAGRAPH_BREAK
        .split(document)
        .map(trim_paragraph_end)
        .filter(|p| !p.trim().is_empty())
        .collect()
}

/// Remove trailing line breaks and trailing whitespace-only lines
fn trim_paragraph_end(paragraph: &str) -> &str {
    let mut paragraph = paragraph.trim_end_matches(['\r', '\n']);

    while let Some(pos) = paragraph.rfind('\n') {
        if !paragraph[pos + 1..].trim().is_empty() {
            break;
        }
        paragraph = paragraph[..pos].trim_end_matches(['\r', '\n']);
    }

    paragraph
}

/// Pack the paragraphs of `document` into blocks of at most `token_budget` tokens
///
/// A block is closed only when it already holds at least one paragraph and
/// adding the next one would exceed the budget. An empty document yields no
/// blocks.
pub fn split_into_blocks<C>(document: &str, token_budget: usize, counter: &C) -> Vec<Block>
where
    C: TokenCounter + ?Sized,
{
    let mut blocks = Vec::new();
    let mut current: Vec<&str> = Vec::new();
    let mut running = 0usize;

    for paragraph in split_paragraphs(document) {
        let tokens = counter.count_tokens(paragraph);

        if !current.is_empty() && running + tokens > token_budget {
            close_block(&mut blocks, &mut current, running);
            running = 0;
        }

        current.push(paragraph);
        running += tokens;
    }

    if !current.is_empty() {
        close_block(&mut blocks, &mut current, running);
    }

    blocks
}

fn close_block(blocks: &mut Vec<Block>, current: &mut Vec<&str>, token_count: usize) {
    blocks.push(Block {
        index: blocks.len(),
        text: current.join(PARAGRAPH_SEPARATOR),
        paragraph_count: current.len(),
        token_count,
    });
    current.clear();
}
