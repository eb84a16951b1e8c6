/*!
 * Tests for paragraph splitting and block packing
 */

use yadtwai::translation::segmenter::{split_into_blocks, split_paragraphs, HeuristicTokenCounter, TokenCounter};
use crate::common;

fn hundred_tokens(_: &str) -> usize {
    100
}

/// Words count as tokens, so a document's cost is predictable
fn word_tokens(text: &str) -> usize {
    text.split_whitespace().count()
}

fn sample_documents() -> Vec<String> {
    vec![
        common::numbered_document(1),
        common::numbered_document(17),
        "A short one.\n\nA much longer paragraph with quite a few more words in it than the others.\n\nMid sized paragraph here.".to_string(),
        "Line one\nline two of the same paragraph\n\n\n\n   \nNext paragraph\n\n".to_string(),
        "Oversized paragraph that certainly does not fit in the tiny budget used below at all.\n\nSmall.".to_string(),
    ]
}

/// Test that twelve paragraphs of 100 tokens with a budget of 250 pack two per block
#[test]
fn test_splitIntoBlocks_twelveParagraphsBudget250_shouldPackPairs() {
    let blocks = split_into_blocks(&common::numbered_document(12), 250, &hundred_tokens);

    assert_eq!(blocks.len(), 6);
    for (i, block) in blocks.iter().enumerate() {
        assert_eq!(block.index, i);
        assert_eq!(block.paragraph_count, 2);
        assert_eq!(block.token_count, 200);
        assert_eq!(block.text, format!("Paragraph {}.\n\nParagraph {}.", 2 * i, 2 * i + 1));
    }
}

/// Test that the blocks, split again, give back the document's paragraphs in order
#[test]
fn test_splitIntoBlocks_anyBudget_shouldPartitionParagraphs() {
    for document in sample_documents() {
        for budget in [1, 3, 8, 20, 1000] {
            let blocks = split_into_blocks(&document, budget, &word_tokens);
            let rejoined: Vec<&str> = blocks.iter().flat_map(|b| split_paragraphs(&b.text)).collect();

            assert_eq!(rejoined, split_paragraphs(&document), "budget {}", budget);
            assert_eq!(
                blocks.iter().map(|b| b.paragraph_count).sum::<usize>(),
                split_paragraphs(&document).len()
            );
        }
    }
}

/// Test that only single-paragraph blocks may exceed the budget
#[test]
fn test_splitIntoBlocks_anyBudget_shouldRespectBudgetForMultiParagraphBlocks() {
    for document in sample_documents() {
        for budget in [1, 3, 8, 20, 1000] {
            for block in split_into_blocks(&document, budget, &word_tokens) {
                if block.token_count > budget {
                    assert_eq!(block.paragraph_count, 1, "block {:?} over budget {}", block.text, budget);
                }
                assert_eq!(
                    block.token_count,
                    split_paragraphs(&block.text).iter().map(|p| word_tokens(p)).sum::<usize>()
                );
            }
        }
    }
}

/// Test that an oversized paragraph is emitted alone and is never split
#[test]
fn test_splitIntoBlocks_oversizedParagraph_shouldFormItsOwnBlock() {
    let document = "Small.\n\nThis paragraph has far too many words for the budget.\n\nTiny.";
    let blocks = split_into_blocks(document, 3, &word_tokens);

    assert_eq!(blocks.len(), 3);
    assert_eq!(blocks[1].text, "This paragraph has far too many words for the budget.");
    assert_eq!(blocks[1].paragraph_count, 1);
}

/// Test that a whitespace-only document yields no blocks
#[test]
fn test_splitIntoBlocks_blankDocument_shouldYieldNothing() {
    assert!(split_into_blocks("", 100, &HeuristicTokenCounter).is_empty());
    assert!(split_into_blocks("\n\n   \n\t\n", 100, &HeuristicTokenCounter).is_empty());
}

/// Test that the heuristic never counts fewer tokens than words
#[test]
fn test_heuristicTokenCounter_shouldCountAtLeastWords() {
    let counter = HeuristicTokenCounter;

    assert_eq!(counter.count_tokens(""), 0);
    assert_eq!(counter.count_tokens("abcdefgh"), 2);
    assert_eq!(counter.count_tokens("a b c d e"), 5);
}
