/*!
 * Capabilities the pipeline depends on.
 *
 * The pipeline only knows the `BlockTranslator` and `BatchReviewer` traits.
 * The model-backed implementations render the prompts and send them through
 * the shared `TranslationService`.
 */

use async_trait::async_trait;
use log::debug;
use std::sync::Arc;

use crate::errors::ProviderError;
use crate::translation::context::{AuthorProfile, Glossary};
use crate::translation::core::TranslationService;
use crate::translation::prompts::{review_prompt, TranslationPromptBuilder};

/// Translates one block with its neighbours as context
#[async_trait]
pub trait BlockTranslator: Send + Sync {
    /// Translate `block`
    ///
    /// # Arguments
    /// * `block` - Source text of the block
    /// * `glossary` - Terminology to apply
    /// * `profile` - Author style description
    /// * `previous` - Translation of the preceding block, if any
    /// * `next` - Source text of the following block, if any
    async fn translate_block(
        &self,
        block: &str,
        glossary: &Glossary,
        profile: &AuthorProfile,
        previous: Option<&str>,
        next: Option<&str>,
    ) -> Result<String, ProviderError>;
}

/// Re-harmonizes a batch of translated units into one merged unit
#[async_trait]
pub trait BatchReviewer: Send + Sync {
    /// Review `units` using `source_window` as read-only context
    async fn review_batch(
        &self,
        units: &[&str],
        source_window: &[&str],
        glossary: &Glossary,
        profile: &AuthorProfile,
    ) -> Result<String, ProviderError>;
}

/// Display names of the language pair, as used in prompts
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LanguagePair {
    /// Source language name (e.g. "English")
    pub source: String,
    /// Target language name (e.g. "French")
    pub target: String,
}

impl LanguagePair {
    /// Resolve ISO codes to English language names, keeping unknown codes as-is
    pub fn from_codes(source: &str, target: &str) -> Self {
        let name = |code: &str| {
            crate::language_utils::get_language_name(code).unwrap_or_else(|_| code.to_string())
        };

        Self {
            source: name(source),
            target: name(target),
        }
    }
}

/// Block translator backed by a language model
#[derive(Debug, Clone)]
pub struct LlmBlockTranslator {
    service: Arc<TranslationService>,
    languages: LanguagePair,
}

impl LlmBlockTranslator {
    /// Create a translator sending prompts through `service`
    pub fn new(service: Arc<TranslationService>, languages: LanguagePair) -> Self {
        Self { service, languages }
    }
}

#[async_trait]
impl BlockTranslator for LlmBlockTranslator {
    async fn translate_block(
        &self,
        block: &str,
        glossary: &Glossary,
        profile: &AuthorProfile,
        previous: Option<&str>,
        next: Option<&str>,
    ) -> Result<String, ProviderError> {
        let (system, user) = TranslationPromptBuilder::new(&self.languages.source, &self.languages.target)
            .with_glossary(glossary)
            .with_profile(profile)
            .with_previous_translation(previous)
            .with_next_source(next)
            .build(block);

        let completion = self.service.complete(&system, &user).await?;
        debug!("Block translated: {} -> {} chars", block.len(), completion.text.len());
        Ok(completion.text)
    }
}

/// Batch reviewer backed by a language model
#[derive(Debug, Clone)]
pub struct LlmBatchReviewer {
    service: Arc<TranslationService>,
    languages: LanguagePair,
}

impl LlmBatchReviewer {
    /// Create a reviewer sending prompts through `service`
    pub fn new(service: Arc<TranslationService>, languages: LanguagePair) -> Self {
        Self { service, languages }
    }
}

#[async_trait]
impl BatchReviewer for LlmBatchReviewer {
    async fn review_batch(
        &self,
        units: &[&str],
        source_window: &[&str],
        glossary: &Glossary,
        profile: &AuthorProfile,
    ) -> Result<String, ProviderError> {
        let (system, user) = review_prompt(
            &self.languages.source,
            &self.languages.target,
            units,
            source_window,
            glossary,
            profile,
        );

        let completion = self.service.complete(&system, &user).await?;
        debug!(
            "Batch of {} units reviewed with {} source blocks of context",
            units.len(),
            source_window.len()
        );
        Ok(completion.text)
    }
}
