/*!
 * Document translation using AI providers.
 *
 * This module contains the core functionality for translating long
 * documents. It is split into several submodules:
 *
 * - `core`: Provider factory and completion service
 * - `segmenter`: Paragraph-respecting, token-budgeted block splitting
 * - `context`: Glossary, author profile and context window arithmetic
 * - `prompts`: Prompt templates for translation, review and preprocessing
 * - `capabilities`: Translator and reviewer traits with model-backed implementations
 * - `pipeline`: Sequential translation with batch review
 * - `assembly`: Reassembly of ordered units
 * - `staging`: Checkpointing of intermediate units
 * - `preprocessing`: Glossary and author profile producers
 */

// Re-export main types for easier usage
pub use self::assembly::{assemble, assemble_directory};
pub use self::capabilities::{BatchReviewer, BlockTranslator, LanguagePair, LlmBatchReviewer, LlmBlockTranslator};
pub use self::context::{plan_review_batches, translation_context, AuthorProfile, Glossary, ReviewBatch};
pub use self::core::{TokenUsageStats, TranslationService};
pub use self::pipeline::{run_pipeline, DocumentPipeline, PipelineProgress};
pub use self::preprocessing::{AuthorProfiler, GlossaryBuilder, TermExtractor};
pub use self::segmenter::{split_into_blocks, Block, HeuristicTokenCounter, TokenCounter};
pub use self::staging::{Checkpoint, Stage, StageDirectory};

// Submodules
pub mod assembly;
pub mod capabilities;
pub mod context;
pub mod core;
pub mod pipeline;
pub mod preprocessing;
pub mod prompts;
pub mod segmenter;
pub mod staging;
