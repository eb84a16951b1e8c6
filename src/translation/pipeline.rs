/*!
 * Windowed translation and review pipeline.
 *
 * Blocks are translated strictly in order, each call seeing the previous
 * translated unit and the next source block. With review enabled, every
 * `batch_size` translated units are merged by the reviewer using a sliding
 * window of source blocks; the units left at the end form a trailing batch.
 */

use log::{debug, info, warn};
use std::sync::Arc;

use crate::app_config::{PipelineConfig, ReviewFailurePolicy};
use crate::errors::TranslationError;
use crate::translation::assembly::assemble;
use crate::translation::capabilities::{BatchReviewer, BlockTranslator};
use crate::translation::context::{plan_review_batches, translation_context, AuthorProfile, Glossary, ReviewBatch};
use crate::translation::segmenter::{split_into_blocks, Block, HeuristicTokenCounter, TokenCounter};
use crate::translation::staging::{Checkpoint, Stage};

/// Progress event emitted after every capability call
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PipelineProgress {
    /// Segmentation finished
    Segmented {
        /// Number of blocks
        blocks: usize,
        /// Number of review batches (0 with review disabled)
        batches: usize,
    },
    /// A block has its translated unit
    BlockTranslated {
        /// Position of the block in the translated slice
        index: usize,
        /// Number of blocks
        total: usize,
        /// Whether the unit came from the checkpoint
        resumed: bool,
    },
    /// A batch has its reviewed part
    BatchReviewed {
        /// Batch index
        batch: usize,
        /// Number of batches
        total: usize,
        /// Whether the part came from the checkpoint
        resumed: bool,
        /// Whether the raw units were emitted after a failed review
        fallback: bool,
    },
}

/// Callback receiving progress events
pub type ProgressCallback = Arc<dyn Fn(&PipelineProgress) + Send + Sync>;

/// Document pipeline wired with its capabilities
pub struct DocumentPipeline {
    config: PipelineConfig,
    translator: Arc<dyn BlockTranslator>,
    reviewer: Option<Arc<dyn BatchReviewer>>,
    counter: Arc<dyn TokenCounter>,
    checkpoint: Option<Arc<dyn Checkpoint>>,
    progress: Option<ProgressCallback>,
}

impl DocumentPipeline {
    /// Create a pipeline; fails on a zero block budget or batch size
    pub fn new(config: PipelineConfig, translator: Arc<dyn BlockTranslator>) -> Result<Self, TranslationError> {
        config.validate()
            .map_err(|e| TranslationError::Configuration(e.to_string()))?;

        Ok(Self {
            config,
            translator,
            reviewer: None,
            counter: Arc::new(HeuristicTokenCounter),
            checkpoint: None,
            progress: None,
        })
    }

    /// Set the reviewer used when review is enabled
    pub fn with_reviewer(mut self, reviewer: Arc<dyn BatchReviewer>) -> Self {
        self.reviewer = Some(reviewer);
        self
    }

    /// Replace the default heuristic token counter
    pub fn with_token_counter(mut self, counter: Arc<dyn TokenCounter>) -> Self {
        self.counter = counter;
        self
    }

    /// Store every unit in `checkpoint`, and resume from it when configured
    pub fn with_checkpoint(mut self, checkpoint: Arc<dyn Checkpoint>) -> Self {
        self.checkpoint = Some(checkpoint);
        self
    }

    /// Report progress to `callback`
    pub fn with_progress(mut self, callback: ProgressCallback) -> Self {
        self.progress = Some(callback);
        self
    }

    /// Pipeline settings
    pub fn config(&self) -> &PipelineConfig {
        &self.config
    }

    /// Split `document` into blocks using the configured budget and counter
    pub fn segment(&self, document: &str) -> Vec<Block> {
        split_into_blocks(document, self.config.tokens_per_block, self.counter.as_ref())
    }

    /// Translate and review `document`, returning the assembled text
    pub async fn run(
        &self,
        document: &str,
        glossary: &Glossary,
        profile: &AuthorProfile,
    ) -> Result<String, TranslationError> {
        let blocks = self.segment(document);
        self.translate(&blocks, glossary, profile).await
    }

    /// Translate and review already segmented `blocks`
    pub async fn translate(
        &self,
        blocks: &[Block],
        glossary: &Glossary,
        profile: &AuthorProfile,
    ) -> Result<String, TranslationError> {
        let reviewer = match (self.config.review_enabled, &self.reviewer) {
            (false, _) => None,
            (true, Some(reviewer)) => Some(reviewer.as_ref()),
            (true, None) => {
                return Err(TranslationError::Configuration(
                    "Review is enabled but no reviewer was configured".to_string(),
                ));
            }
        };

        let total = blocks.len();
        let plan = if reviewer.is_some() {
            plan_review_batches(total, self.config.batch_size, self.config.review_context_width)
        } else {
            Vec::new()
        };
        let mut pending = plan.iter().peekable();

        info!(
            "Translating {} blocks{}",
            total,
            if reviewer.is_some() { format!(" with {} review batches", plan.len()) } else { String::new() }
        );
        self.report(PipelineProgress::Segmented { blocks: total, batches: plan.len() });

        let mut translated: Vec<String> = Vec::with_capacity(total);
        let mut reviewed: Vec<String> = Vec::with_capacity(plan.len());

        self.verify_resumable(blocks).await?;

        // Context, stored units and progress all use the position in `blocks`
        for (position, block) in blocks.iter().enumerate() {
            self.stage(Stage::Raw, position, &block.text).await?;

            let unit = self.translate_one(blocks, &translated, position, glossary, profile).await?;
            translated.push(unit);

            // Batches close right after their last unit, before the next translation
            while let Some(batch) = pending.next_if(|b| b.end == translated.len()) {
                if let Some(reviewer) = reviewer {
                    let part = self.review_one(reviewer, batch, plan.len(), blocks, &translated, glossary, profile).await?;
                    reviewed.push(part);
                }
            }
        }

        let output = if reviewer.is_some() {
            assemble(&reviewed)
        } else {
            assemble(&translated)
        };

        info!(
            "Pipeline finished: {} blocks translated, {} batches reviewed",
            translated.len(),
            reviewed.len()
        );

        Ok(output)
    }

    async fn translate_one(
        &self,
        blocks: &[Block],
        translated: &[String],
        index: usize,
        glossary: &Glossary,
        profile: &AuthorProfile,
    ) -> Result<String, TranslationError> {
        let total = blocks.len();

        if let Some(unit) = self.resume(Stage::Translated, index).await? {
            debug!("Block {}/{} resumed from checkpoint", index + 1, total);
            self.report(PipelineProgress::BlockTranslated { index, total, resumed: true });
            return Ok(unit);
        }

        let context = translation_context(index, total);
        let previous = context.previous.map(|i| translated[i].as_str());
        let next = context.next.map(|i| blocks[i].text.as_str());

        debug!(
            "Translating block {}/{} ({} paragraphs, {} tokens)",
            index + 1,
            total,
            blocks[index].paragraph_count,
            blocks[index].token_count
        );

        let unit = self.translator
            .translate_block(&blocks[index].text, glossary, profile, previous, next)
            .await
            .map_err(|source| TranslationError::BlockTranslation { index, source })?;

        if unit.trim().is_empty() {
            return Err(TranslationError::EmptyTranslation { index });
        }

        self.stage(Stage::Translated, index, &unit).await?;
        self.report(PipelineProgress::BlockTranslated { index, total, resumed: false });

        Ok(unit)
    }

    #[allow(clippy::too_many_arguments)]
    async fn review_one(
        &self,
        reviewer: &dyn BatchReviewer,
        batch: &ReviewBatch,
        total: usize,
        blocks: &[Block],
        translated: &[String],
        glossary: &Glossary,
        profile: &AuthorProfile,
    ) -> Result<String, TranslationError> {
        if let Some(part) = self.resume(Stage::Reviewed, batch.index).await? {
            debug!("Batch {} resumed from checkpoint", batch.index);
            self.report(PipelineProgress::BatchReviewed { batch: batch.index, total, resumed: true, fallback: false });
            return Ok(part);
        }

        let units: Vec<&str> = translated[batch.start..batch.end].iter().map(String::as_str).collect();
        let window: Vec<&str> = blocks[batch.window_start..batch.window_end].iter().map(|b| b.text.as_str()).collect();

        debug!(
            "Reviewing batch {} (units {}..{}, source window {}..{})",
            batch.index, batch.start, batch.end, batch.window_start, batch.window_end
        );

        let failure = match reviewer.review_batch(&units, &window, glossary, profile).await {
            Ok(part) if !part.trim().is_empty() => {
                self.stage(Stage::Reviewed, batch.index, &part).await?;
                self.report(PipelineProgress::BatchReviewed { batch: batch.index, total, resumed: false, fallback: false });
                return Ok(part);
            }
            Ok(_) => TranslationError::EmptyReview { batch: batch.index, start: batch.start, end: batch.end },
            Err(source) => TranslationError::BatchReview { batch: batch.index, start: batch.start, end: batch.end, source },
        };

        match self.config.review_failure {
            ReviewFailurePolicy::Abort => Err(failure),
            ReviewFailurePolicy::Fallback => {
                warn!("{}; keeping the unreviewed translation of the batch", failure);
                let part = assemble(&units);
                self.stage(Stage::Reviewed, batch.index, &part).await?;
                self.report(PipelineProgress::BatchReviewed { batch: batch.index, total, resumed: false, fallback: true });
                Ok(part)
            }
        }
    }

    /// Refuse to resume from units stored for a different document
    ///
    /// Every stored raw block must equal the block at the same position and
    /// nothing may be stored past the end, otherwise the stored translations
    /// and reviewed parts belong to another text.
    async fn verify_resumable(&self, blocks: &[Block]) -> Result<(), TranslationError> {
        let checkpoint = match &self.checkpoint {
            Some(checkpoint) if self.config.resume => checkpoint,
            _ => return Ok(()),
        };

        for (position, block) in blocks.iter().enumerate() {
            if let Some(stored) = checkpoint.load(Stage::Raw, position).await? {
                if stored != block.text {
                    return Err(TranslationError::Checkpoint(format!(
                        "Stored block {} does not match the document; run without resume to start over",
                        position
                    )));
                }
            }
        }

        if checkpoint.load(Stage::Raw, blocks.len()).await?.is_some() {
            return Err(TranslationError::Checkpoint(format!(
                "Checkpoint holds more than {} blocks; run without resume to start over",
                blocks.len()
            )));
        }

        Ok(())
    }

    async fn resume(&self, stage: Stage, index: usize) -> Result<Option<String>, TranslationError> {
        match &self.checkpoint {
            Some(checkpoint) if self.config.resume => checkpoint.load(stage, index).await,
            _ => Ok(None),
        }
    }

    async fn stage(&self, stage: Stage, index: usize, text: &str) -> Result<(), TranslationError> {
        match &self.checkpoint {
            Some(checkpoint) => checkpoint.store(stage, index, text).await,
            None => Ok(()),
        }
    }

    fn report(&self, event: PipelineProgress) {
        if let Some(callback) = &self.progress {
            callback(&event);
        }
    }
}

/// Segment, translate and optionally review `document` in one call
///
/// Uses the heuristic token counter and no checkpoint.
pub async fn run_pipeline(
    document: &str,
    glossary: &Glossary,
    profile: &AuthorProfile,
    config: PipelineConfig,
    translator: Arc<dyn BlockTranslator>,
    reviewer: Option<Arc<dyn BatchReviewer>>,
) -> Result<String, TranslationError> {
    let mut pipeline = DocumentPipeline::new(config, translator)?;
    if let Some(reviewer) = reviewer {
        pipeline = pipeline.with_reviewer(reviewer);
    }
    pipeline.run(document, glossary, profile).await
}
