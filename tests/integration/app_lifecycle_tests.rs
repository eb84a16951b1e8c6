/*!
 * Controller lifecycle tests: files in, translated files out
 */

use std::fs;
use anyhow::Result;
use yadtwai::app_config::Config;
use yadtwai::app_controller::{Controller, ISSUES_LOG_FILE};
use yadtwai::database::SessionStatus;
use yadtwai::providers::mock::{MockProvider, MockRequest};
use yadtwai::session::SessionManager;
use yadtwai::translation::{AuthorProfile, Glossary};
use crate::common;

/// One paragraph per block, no review, so each block costs exactly one request
fn per_paragraph_config() -> Config {
    let mut config = common::mock_config();
    config.pipeline.tokens_per_block = 4;
    config.pipeline.review_enabled = false;
    config
}

fn preprocessing_response(request: &MockRequest) -> String {
    if request.prompt.contains("Candidate terms:") {
        r#"{"Pemberley": "Pemberley"}"#.to_string()
    } else if request.prompt.contains("Text sample:") {
        r#"{"author": "Jane Austen", "style_analysis": {"tone": "ironic"}}"#.to_string()
    } else {
        format!("[TRANSLATED] {}", MockProvider::fenced_payload(&request.prompt))
    }
}

/// Test that a document is translated into `<stem>.<lang>.<ext>` in the output directory
#[tokio::test]
async fn test_run_withWorkingProvider_shouldWriteTranslatedFile() -> Result<()> {
    let temp_dir = common::create_temp_dir()?;
    let input = common::create_test_file(&temp_dir.path().to_path_buf(), "book.txt", &common::numbered_document(3))?;
    let out_dir = temp_dir.path().join("out");

    let config = common::mock_config();
    let controller = Controller::with_service(config.clone(), common::mock_service(&config, MockProvider::working()));

    let output = controller.run(input, out_dir.clone(), false).await?;

    assert_eq!(output, Some(out_dir.join("book.fr.txt")));
    let content = fs::read_to_string(out_dir.join("book.fr.txt"))?;
    assert!(content.starts_with("[TRANSLATED]"));
    assert!(content.contains("Paragraph 2."));
    assert!(!content.ends_with('\n'));
    Ok(())
}

/// Test that an existing translation is only replaced with force
#[tokio::test]
async fn test_run_existingOutput_shouldSkipUnlessForced() -> Result<()> {
    let temp_dir = common::create_temp_dir()?;
    let root = temp_dir.path().to_path_buf();
    let input = common::create_test_file(&root, "book.txt", "Hello there.")?;
    common::create_test_file(&root, "book.fr.txt", "old translation")?;

    let config = common::mock_config();
    let provider = MockProvider::working();
    let controller = Controller::with_service(config.clone(), common::mock_service(&config, provider.clone()));

    assert_eq!(controller.run(input.clone(), root.clone(), false).await?, None);
    assert_eq!(provider.request_count(), 0);
    assert_eq!(fs::read_to_string(root.join("book.fr.txt"))?, "old translation");

    assert!(controller.run(input, root.clone(), true).await?.is_some());
    assert_ne!(fs::read_to_string(root.join("book.fr.txt"))?, "old translation");
    Ok(())
}

/// Test that a missing input file is an error
#[test]
fn test_run_missingInput_shouldFail() -> Result<()> {
    let temp_dir = common::create_temp_dir()?;
    let config = common::mock_config();
    let controller = Controller::with_service(config.clone(), common::mock_service(&config, MockProvider::working()));

    let result = tokio_test::block_on(async {
        controller.run(temp_dir.path().join("absent.txt"), temp_dir.path().to_path_buf(), false).await
    });

    assert!(result.is_err());
    Ok(())
}

/// Test that folder runs translate new documents and skip previous outputs
#[tokio::test]
async fn test_runFolder_withPreviousOutputs_shouldCountEachDocument() -> Result<()> {
    let temp_dir = common::create_temp_dir()?;
    let root = temp_dir.path().to_path_buf();
    common::create_test_file(&root, "one.txt", "First document.")?;
    common::create_test_file(&root, "two.md", "Second document.")?;
    common::create_test_file(&root, "three.txt", "Third document.")?;
    common::create_test_file(&root, "three.fr.txt", "Already translated.")?;
    common::create_test_file(&root, "notes.json", "{}")?;

    let config = common::mock_config();
    let controller = Controller::with_service(config.clone(), common::mock_service(&config, MockProvider::working()));

    let summary = controller.run_folder(root.clone(), false).await?;

    assert_eq!((summary.processed, summary.skipped, summary.failed), (2, 1, 0));
    assert!(root.join("one.fr.txt").exists());
    assert!(root.join("two.fr.md").exists());
    assert!(!root.join("three.fr.fr.txt").exists());
    Ok(())
}

/// Test that failed documents are logged to the folder's issues log
#[tokio::test]
async fn test_runFolder_failingProvider_shouldLogIssues() -> Result<()> {
    let temp_dir = common::create_temp_dir()?;
    let root = temp_dir.path().to_path_buf();
    common::create_test_file(&root, "one.txt", "First document.")?;
    common::create_test_file(&root, "two.txt", "Second document.")?;

    let config = common::mock_config();
    let controller = Controller::with_service(config.clone(), common::mock_service(&config, MockProvider::failing()));

    let summary = controller.run_folder(root.clone(), false).await?;

    assert_eq!(summary.failed, 2);
    let issues = fs::read_to_string(root.join(ISSUES_LOG_FILE))?;
    assert_eq!(issues.lines().count(), 2);
    assert!(issues.contains("one.txt"));
    assert!(!root.join("one.fr.txt").exists());
    Ok(())
}

/// Test that an interrupted run resumes from the session database
#[tokio::test]
async fn test_translateDocument_resumeFromDatabase_shouldOnlyTranslateMissingBlocks() -> Result<()> {
    common::init_logging();
    let temp_dir = common::create_temp_dir()?;
    let db_path = temp_dir.path().join("sessions.db");
    let source = temp_dir.path().join("book.txt");
    let document = common::numbered_document(5);

    let mut config = per_paragraph_config();
    config.pipeline.database_path = Some(db_path.clone());

    // The third request fails: blocks 0 and 1 are stored, the session is marked failed
    let interrupted = Controller::with_service(config.clone(), common::mock_service(&config, MockProvider::intermittent(3)));
    assert!(interrupted.translate_document(&source, &document).await.is_err());

    let manager = SessionManager::open(&db_path)?;
    let sessions = manager.list_sessions(None).await?;
    assert_eq!(sessions.len(), 1);
    assert_eq!(sessions[0].status, SessionStatus::Failed);

    config.pipeline.resume = true;
    let provider = MockProvider::working();
    let resumed = Controller::with_service(config.clone(), common::mock_service(&config, provider.clone()));
    let output = resumed.translate_document(&source, &document).await?;

    assert_eq!(provider.request_count(), 3);
    let expected: Vec<String> = (0..5).map(|i| format!("[TRANSLATED] Paragraph {}.", i)).collect();
    assert_eq!(output, expected.join("\n\n"));

    let sessions = manager.list_sessions(None).await?;
    assert_eq!(sessions.len(), 1);
    assert_eq!(sessions[0].status, SessionStatus::Completed);
    Ok(())
}

/// Test that resuming with another glossary starts a new session instead of reusing units
#[tokio::test]
async fn test_translateDocument_resumeWithChangedGlossary_shouldCreateNewSession() -> Result<()> {
    let temp_dir = common::create_temp_dir()?;
    let root = temp_dir.path().to_path_buf();
    let db_path = root.join("sessions.db");
    let source = root.join("book.txt");
    let document = common::numbered_document(5);

    let mut config = per_paragraph_config();
    config.pipeline.database_path = Some(db_path.clone());
    config.preprocessing.glossary_path = Some(common::create_test_file(&root, "first.json", r#"{"Paragraph": "Paragraphe"}"#)?);

    let interrupted = Controller::with_service(config.clone(), common::mock_service(&config, MockProvider::intermittent(3)));
    assert!(interrupted.translate_document(&source, &document).await.is_err());

    config.pipeline.resume = true;
    config.preprocessing.glossary_path = Some(common::create_test_file(&root, "second.json", r#"{"Paragraph": "Alinea"}"#)?);
    let provider = MockProvider::working();
    let resumed = Controller::with_service(config.clone(), common::mock_service(&config, provider.clone()));
    resumed.translate_document(&source, &document).await?;

    assert_eq!(provider.request_count(), 5);
    let manager = SessionManager::open(&db_path)?;
    assert_eq!(manager.list_sessions(None).await?.len(), 2);
    assert_eq!(manager.list_sessions(Some(SessionStatus::Failed)).await?.len(), 1);
    Ok(())
}

/// Test that without resume every run starts a new session
#[tokio::test]
async fn test_translateDocument_withoutResume_shouldCreateNewSession() -> Result<()> {
    let temp_dir = common::create_temp_dir()?;
    let db_path = temp_dir.path().join("sessions.db");
    let source = temp_dir.path().join("book.txt");

    let mut config = per_paragraph_config();
    config.pipeline.database_path = Some(db_path.clone());

    let provider = MockProvider::working();
    let controller = Controller::with_service(config.clone(), common::mock_service(&config, provider.clone()));
    controller.translate_document(&source, &common::numbered_document(2)).await?;
    controller.translate_document(&source, &common::numbered_document(2)).await?;

    assert_eq!(provider.request_count(), 4);
    let completed = SessionManager::open(&db_path)?.list_sessions(Some(SessionStatus::Completed)).await?;
    assert_eq!(completed.len(), 2);
    Ok(())
}

/// Test that a staging directory receives one file per unit and stage
#[tokio::test]
async fn test_translateDocument_withStagingDir_shouldStageUnits() -> Result<()> {
    let temp_dir = common::create_temp_dir()?;
    let staging_root = temp_dir.path().join("staging");

    let mut config = per_paragraph_config();
    config.pipeline.staging_dir = Some(staging_root.clone());

    let controller = Controller::with_service(config.clone(), common::mock_service(&config, MockProvider::working()));
    let output = controller.translate_document(&temp_dir.path().join("novel.txt"), &common::numbered_document(3)).await?;

    let translated_dir = staging_root.join("novel").join("translated");
    assert_eq!(fs::read_dir(&translated_dir)?.count(), 3);
    assert_eq!(
        yadtwai::translation::assemble_directory(&translated_dir)?,
        output
    );
    Ok(())
}

/// Test that preprocessing writes a glossary and a profile next to the input
#[tokio::test]
async fn test_writePreprocessing_withModel_shouldWriteBothFiles() -> Result<()> {
    let temp_dir = common::create_temp_dir()?;
    let input = common::create_test_file(
        &temp_dir.path().to_path_buf(),
        "pride.txt",
        "Elizabeth walked to Pemberley.\n\nAt Pemberley, Elizabeth met Mr. Darcy again.",
    )?;

    let mut config = Config::default();
    config.preprocessing.author = Some("Jane Austen".to_string());
    let provider = MockProvider::working().with_custom_response(preprocessing_response);
    let controller = Controller::with_service(config.clone(), common::mock_service(&config, provider));

    let (glossary_path, profile_path) = controller.write_preprocessing(&input).await?;

    assert_eq!(glossary_path, temp_dir.path().join("pride.glossary.json"));
    assert_eq!(profile_path, temp_dir.path().join("pride.profile.json"));

    let profile = AuthorProfile::load(&profile_path)?;
    assert_eq!(profile.author.as_deref(), Some("Jane Austen"));
    assert!(profile.to_prompt_text().contains("tone: ironic"));
    assert!(Glossary::load(&glossary_path).is_ok());
    Ok(())
}

/// Test that configured glossary and profile files replace the model calls
#[tokio::test]
async fn test_preprocess_withFiles_shouldNotCallProvider() -> Result<()> {
    let temp_dir = common::create_temp_dir()?;
    let root = temp_dir.path().to_path_buf();
    let glossary_path = common::create_test_file(&root, "glossary.json", r#"{"Longbourn": "Longbourn"}"#)?;
    let profile_path = common::create_test_file(&root, "profile.json", r#"{"author": "Jane Austen"}"#)?;

    let mut config = Config::default();
    config.preprocessing.glossary_path = Some(glossary_path);
    config.preprocessing.profile_path = Some(profile_path);
    let provider = MockProvider::working();
    let controller = Controller::with_service(config.clone(), common::mock_service(&config, provider.clone()));

    let (glossary, profile) = controller.preprocess("Some text about Longbourn.").await?;

    assert_eq!(glossary.len(), 1);
    assert_eq!(profile.author.as_deref(), Some("Jane Austen"));
    assert_eq!(provider.request_count(), 0);
    Ok(())
}

/// Test that disabled preprocessing yields an author-only profile and an empty glossary
#[tokio::test]
async fn test_preprocess_disabled_shouldUseAuthorOnly() -> Result<()> {
    let mut config = common::mock_config();
    config.preprocessing.author = Some("Mary Shelley".to_string());
    let provider = MockProvider::working();
    let controller = Controller::with_service(config.clone(), common::mock_service(&config, provider.clone()));

    let (glossary, profile) = controller.preprocess("It was a dreary night of November.").await?;

    assert_eq!(glossary.len(), 0);
    assert_eq!(profile.author.as_deref(), Some("Mary Shelley"));
    assert_eq!(provider.request_count(), 0);
    Ok(())
}

/// Test that the connection check reflects the provider state
#[test]
fn test_testConnection_shouldReflectProviderState() {
    let config = common::mock_config();
    let working = Controller::with_service(config.clone(), common::mock_service(&config, MockProvider::working()));
    let failing = Controller::with_service(config.clone(), common::mock_service(&config, MockProvider::failing()));

    assert!(tokio_test::block_on(working.test_connection()).is_ok());
    let error = tokio_test::block_on(failing.test_connection()).unwrap_err();
    assert!(error.to_string().ends_with("is not reachable"));
    assert!(format!("{:#}", error).contains("Simulated"));
}
