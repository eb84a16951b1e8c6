/*!
 * # YADTwAI - Yet Another Document Translator with AI
 *
 * A Rust library for translating long documents with language models.
 *
 * ## Features
 *
 * - Paragraph-aligned segmentation under a token budget
 * - Sequential block translation with the previous translation and the next
 *   source block as context
 * - Batched review over a sliding window of source blocks
 * - Glossary and author profile preprocessing
 * - Translation through various AI providers:
 *   - Ollama (local LLM)
 *   - OpenAI API
 *   - Anthropic API
 *   - LM Studio
 * - Checkpointing to a staging directory or an SQLite session database
 *
 * ## Architecture
 *
 * The library is organized in these main modules:
 * - `app_config`: Configuration management
 * - `translation`: Segmentation, translation pipeline and preprocessing:
 *   - `translation::core`: Provider factory and completion service
 *   - `translation::segmenter`: Block splitting
 *   - `translation::pipeline`: Translation and batch review
 *   - `translation::staging`: Checkpoint trait and staging directory
 * - `database` and `session`: SQLite checkpoint store
 * - `file_utils`: File system operations
 * - `app_controller`: Main application controller
 * - `language_utils`: ISO language code utilities
 * - `providers`: Client implementations for various LLM providers
 * - `errors`: Custom error types for the application
 *
 * ## License
 *
 * This project is licensed under the MIT License
 */

// Global lints configuration
// These lints will be allowed but not auto-fixed
#![allow(clippy::uninlined_format_args)]
#![allow(clippy::redundant_closure_for_method_calls)]

// Public modules
pub mod app_config;
pub mod app_controller;
pub mod database;
pub mod errors;
pub mod file_utils;
pub mod language_utils;
pub mod providers;
pub mod session;
pub mod translation;

// Re-export main types for easier usage
pub use app_config::Config;
pub use translation::{run_pipeline, DocumentPipeline, TranslationService};
pub use language_utils::{language_codes_match, normalize_to_part2t, get_language_name};
pub use errors::{ProviderError, TranslationError};
