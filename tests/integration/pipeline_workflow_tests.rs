/*!
 * End-to-end pipeline tests with model-backed capabilities over the mock provider
 */

use std::sync::Arc;
use anyhow::Result;
use yadtwai::app_config::{PipelineConfig, TranslationConfig};
use yadtwai::errors::TranslationError;
use yadtwai::providers::mock::MockProvider;
use yadtwai::translation::{
    assemble_directory, run_pipeline, AuthorProfile, BatchReviewer, BlockTranslator, DocumentPipeline, Glossary,
    LanguagePair, LlmBatchReviewer, LlmBlockTranslator, Stage, StageDirectory, TranslationService,
};
use crate::common;
use crate::common::mock_capabilities::IdentityTranslator;

/// Every "Paragraph N." costs 3 or 4 heuristic tokens, so a budget of 4 keeps one per block
fn small_blocks(review_enabled: bool) -> PipelineConfig {
    PipelineConfig {
        tokens_per_block: 4,
        review_enabled,
        ..PipelineConfig::default()
    }
}

fn capabilities(provider: MockProvider) -> (Arc<dyn BlockTranslator>, Arc<dyn BatchReviewer>) {
    let service = Arc::new(TranslationService::with_mock_provider(TranslationConfig::default(), provider));
    let languages = LanguagePair::from_codes("en", "fr");
    (
        Arc::new(LlmBlockTranslator::new(service.clone(), languages.clone())),
        Arc::new(LlmBatchReviewer::new(service, languages)),
    )
}

/// Test that identity translation without review returns the normalized document
#[tokio::test]
async fn test_runPipeline_identityWithoutReview_shouldReturnRejoinedDocument() -> Result<()> {
    let document = "Title\n\n\n\nFirst paragraph\nwith two lines.\n\n  \n\nLast one.\n";

    let output = run_pipeline(
        document,
        &Glossary::empty(),
        &AuthorProfile::default(),
        PipelineConfig { review_enabled: false, ..PipelineConfig::default() },
        Arc::new(IdentityTranslator),
        None,
    )
    .await?;

    assert_eq!(output, "Title\n\nFirst paragraph\nwith two lines.\n\nLast one.");
    Ok(())
}

/// Test that the model-backed pipeline sends one request per block and per batch
#[tokio::test]
async fn test_runPipeline_withMockProvider_shouldSendTranslationAndReviewRequests() -> Result<()> {
    common::init_logging();
    let provider = MockProvider::working();
    let (translator, reviewer) = capabilities(provider.clone());

    let output = run_pipeline(
        &common::numbered_document(12),
        &Glossary::empty(),
        &AuthorProfile::default(),
        small_blocks(true),
        translator,
        Some(reviewer),
    )
    .await?;

    // 12 translations, then batches [0,5) [5,10) [10,12)
    assert_eq!(provider.request_count(), 15);
    assert_eq!(output.matches("[TRANSLATED] [Segment 1]").count(), 3);
    assert!(output.starts_with("[TRANSLATED]"));

    let requests = provider.requests();
    assert_eq!(MockProvider::fenced_payload(&requests[0].prompt), "Paragraph 0.");
    assert!(requests[5].prompt.contains("Paragraph 4."));
    Ok(())
}

/// Test that the translated unit of a block is the previous context of the next one
#[tokio::test]
async fn test_runPipeline_withMockProvider_shouldChainPreviousTranslation() -> Result<()> {
    let provider = MockProvider::working();
    let (translator, _) = capabilities(provider.clone());

    run_pipeline(
        &common::numbered_document(2),
        &Glossary::empty(),
        &AuthorProfile::default(),
        small_blocks(false),
        translator,
        None,
    )
    .await?;

    let requests = provider.requests();
    assert_eq!(requests.len(), 2);
    assert!(requests[0].prompt.contains("Paragraph 1."));
    assert!(requests[1].prompt.contains("[TRANSLATED] Paragraph 0."));
    Ok(())
}

/// Test that a failing provider surfaces as a block translation error
#[tokio::test]
async fn test_runPipeline_failingProvider_shouldFail() -> Result<()> {
    let (translator, _) = capabilities(MockProvider::failing());

    let result = run_pipeline(
        &common::numbered_document(3),
        &Glossary::empty(),
        &AuthorProfile::default(),
        small_blocks(false),
        translator,
        None,
    )
    .await;

    let error = result.expect_err("a failing provider must fail the run");
    assert!(error.to_string().starts_with("Translation of block 0 failed"));
    Ok(())
}

/// Test that staged reviewed parts reassemble into the pipeline output
#[tokio::test]
async fn test_stageDirectory_afterRun_shouldReassembleOutput() -> Result<()> {
    let temp_dir = common::create_temp_dir()?;
    let staging = Arc::new(StageDirectory::new(temp_dir.path().join("book")));
    let (translator, reviewer) = capabilities(MockProvider::working());

    let pipeline = DocumentPipeline::new(small_blocks(true), translator)?
        .with_reviewer(reviewer)
        .with_checkpoint(staging.clone());
    let output = pipeline.run(&common::numbered_document(7), &Glossary::empty(), &AuthorProfile::default()).await?;

    assert_eq!(assemble_directory(&staging.stage_dir(Stage::Reviewed))?, output);
    assert_eq!(std::fs::read_dir(staging.stage_dir(Stage::Raw))?.count(), 7);
    assert_eq!(std::fs::read_dir(staging.stage_dir(Stage::Translated))?.count(), 7);
    assert!(staging.unit_path(Stage::Translated, 6)?.exists());
    Ok(())
}

/// Test that a resumed run reuses every staged unit without calling the provider
#[tokio::test]
async fn test_stageDirectory_resume_shouldSkipProviderCalls() -> Result<()> {
    let temp_dir = common::create_temp_dir()?;
    let staging = Arc::new(StageDirectory::new(temp_dir.path().join("book")));
    let document = common::numbered_document(6);

    let (translator, reviewer) = capabilities(MockProvider::working());
    let first = DocumentPipeline::new(small_blocks(true), translator)?
        .with_reviewer(reviewer)
        .with_checkpoint(staging.clone())
        .run(&document, &Glossary::empty(), &AuthorProfile::default())
        .await?;

    let provider = MockProvider::failing();
    let (translator, reviewer) = capabilities(provider.clone());
    let resumed = DocumentPipeline::new(PipelineConfig { resume: true, ..small_blocks(true) }, translator)?
        .with_reviewer(reviewer)
        .with_checkpoint(staging)
        .run(&document, &Glossary::empty(), &AuthorProfile::default())
        .await?;

    assert_eq!(resumed, first);
    assert_eq!(provider.request_count(), 0);
    Ok(())
}

/// Test that resuming a different document from the same staging directory is refused
#[tokio::test]
async fn test_stageDirectory_resumeWithOtherDocument_shouldFailWithCheckpoint() -> Result<()> {
    let temp_dir = common::create_temp_dir()?;
    let staging = Arc::new(StageDirectory::new(temp_dir.path().join("book")));

    let (translator, _) = capabilities(MockProvider::working());
    DocumentPipeline::new(small_blocks(false), translator)?
        .with_checkpoint(staging.clone())
        .run("alpha\n\nbeta", &Glossary::empty(), &AuthorProfile::default())
        .await?;

    let provider = MockProvider::working();
    let (translator, _) = capabilities(provider.clone());
    let resumed = DocumentPipeline::new(PipelineConfig { resume: true, ..small_blocks(false) }, translator.clone())?
        .with_checkpoint(staging.clone())
        .run("gamma\n\ndelta", &Glossary::empty(), &AuthorProfile::default())
        .await;

    assert!(matches!(resumed, Err(TranslationError::Checkpoint(_))));
    assert_eq!(provider.request_count(), 0);

    let fresh = DocumentPipeline::new(small_blocks(false), translator)?
        .with_checkpoint(staging)
        .run("gamma\n\ndelta", &Glossary::empty(), &AuthorProfile::default())
        .await?;

    assert!(fresh.contains("gamma") && fresh.contains("delta"));
    assert!(!fresh.contains("alpha"));
    Ok(())
}
