use anyhow::{Result, Context, anyhow};
use log::{error, warn, info, debug};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use indicatif::{ProgressBar, ProgressStyle, MultiProgress};

use crate::app_config::Config;
use crate::file_utils::{FileManager, DOCUMENT_EXTENSIONS};
use crate::session::{SessionCreateParams, SessionManager};
use crate::translation::pipeline::ProgressCallback;
use crate::translation::{
    AuthorProfile, AuthorProfiler, BatchReviewer, Checkpoint, DocumentPipeline,
    Glossary, GlossaryBuilder, LanguagePair, LlmBatchReviewer, LlmBlockTranslator, PipelineProgress,
    StageDirectory, TranslationService,
};

// @module: Application controller for document processing

/// File receiving the errors of a folder run, next to the documents
pub const ISSUES_LOG_FILE: &str = "yadtwai.issues.log";

/// Outcome of a folder run
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct FolderSummary {
    /// Documents translated
    pub processed: usize,
    /// Documents skipped because their output exists
    pub skipped: usize,
    /// Documents that failed
    pub failed: usize,
}

/// Where the units of one document run are checkpointed
enum RunCheckpoint {
    None,
    Directory,
    Session { manager: SessionManager, session_id: String },
}

/// Main application controller for document translation
pub struct Controller {
    // @field: App configuration
    config: Config,
    // @field: Completion service shared by all capabilities
    service: Arc<TranslationService>,
    // @field: Progress bars of the current run
    multi_progress: MultiProgress,
}

impl Controller {
    // @method: Create a new controller with the given configuration
    pub fn with_config(config: Config) -> Result<Self> {
        let service = TranslationService::new(config.translation.clone())
            .context("Failed to create translation service")?;

        Ok(Self::with_service(config, Arc::new(service)))
    }

    /// Create a controller around an existing completion service
    pub fn with_service(config: Config, service: Arc<TranslationService>) -> Self {
        Self {
            config,
            service,
            multi_progress: MultiProgress::new(),
        }
    }

    /// Active configuration
    pub fn config(&self) -> &Config {
        &self.config
    }

    /// Check that the provider answers before starting long work
    pub async fn test_connection(&self) -> Result<()> {
        self.service.test_connection().await.with_context(|| {
            format!(
                "{} ({}) is not reachable",
                self.config.translation.provider.display_name(),
                self.config.translation.get_model()
            )
        })
    }

    fn languages(&self) -> LanguagePair {
        LanguagePair::from_codes(&self.config.source_language, &self.config.target_language)
    }

    /// Translate one document into `output_dir`
    ///
    /// Returns the output path, or `None` when the output exists and `force_overwrite` is unset.
    pub async fn run(&self, input_file: PathBuf, output_dir: PathBuf, force_overwrite: bool) -> Result<Option<PathBuf>> {
        let start_time = std::time::Instant::now();

        if !FileManager::file_exists(&input_file) {
            return Err(anyhow!("Input file does not exist: {:?}", input_file));
        }

        let output_path = FileManager::generate_output_path(&input_file, &output_dir, &self.config.target_language);
        if output_path.exists() && !force_overwrite {
            warn!("Skipping {}, translation already exists (use -f to force overwrite)", input_file.display());
            return Ok(None);
        }

        let document = FileManager::read_to_string(&input_file)?;
        let translated = self.translate_document(&input_file, &document).await?;

        FileManager::write_to_file(&output_path, &translated)?;
        info!("Success: {}", output_path.display());
        info!("Translation completed in {}.", Self::format_duration(start_time.elapsed()));

        Ok(Some(output_path))
    }

    /// Translate every document of a directory, writing outputs next to their inputs
    ///
    /// Files that already have a translation are skipped; failures are logged to
    /// the issues log of the folder and do not stop the run.
    pub async fn run_folder(&self, input_dir: PathBuf, force_overwrite: bool) -> Result<FolderSummary> {
        let start_time = std::time::Instant::now();

        if !FileManager::dir_exists(&input_dir) {
            return Err(anyhow!("Input directory does not exist: {:?}", input_dir));
        }

        let documents: Vec<PathBuf> = FileManager::find_files(&input_dir, &DOCUMENT_EXTENSIONS)?
            .into_iter()
            .filter(|path| !FileManager::is_translated_output(path, &self.config.target_language))
            .collect();

        if documents.is_empty() {
            return Err(anyhow!("No documents found in directory: {:?}", input_dir));
        }

        let folder_pb = self.multi_progress.add(ProgressBar::new(documents.len() as u64));
        folder_pb.set_style(Self::bar_style("files"));
        folder_pb.set_message("Processing files");

        let mut summary = FolderSummary::default();

        for document in &documents {
            let file_name = document.file_name()
                .map(|f| f.to_string_lossy().to_string())
                .unwrap_or_else(|| "unknown".to_string());
            folder_pb.set_message(format!("Processing: {}", file_name));

            let output_dir = document.parent().map(Path::to_path_buf).unwrap_or_else(|| input_dir.clone());

            match self.run(document.clone(), output_dir, force_overwrite).await {
                Ok(Some(_)) => summary.processed += 1,
                Ok(None) => summary.skipped += 1,
                Err(e) => {
                    error!("Error processing file {}: {:#}", file_name, e);
                    let log_path = input_dir.join(ISSUES_LOG_FILE);
                    if let Err(log_err) = FileManager::append_to_log_file(&log_path, &format!("{}: {:#}", file_name, e)) {
                        warn!("Failed to write issues log: {}", log_err);
                    }
                    summary.failed += 1;
                }
            }

            folder_pb.inc(1);
        }

        folder_pb.finish_with_message("Folder processing complete");

        info!(
            "Folder processing completed in {}: {} processed, {} skipped, {} errors",
            Self::format_duration(start_time.elapsed()),
            summary.processed,
            summary.skipped,
            summary.failed
        );

        Ok(summary)
    }

    /// Glossary and author profile for `document`
    ///
    /// Files named in the configuration win; otherwise each is produced by the
    /// model when enabled, and left empty when disabled.
    pub async fn preprocess(&self, document: &str) -> Result<(Glossary, AuthorProfile)> {
        let settings = &self.config.preprocessing;
        let author = settings.author.as_deref();

        let profile = match (&settings.profile_path, settings.profile_enabled) {
            (Some(path), _) => AuthorProfile::load(path)?,
            (None, true) => {
                info!("Analysing author style");
                AuthorProfiler::new(self.service.clone(), settings.profile_sample_chars)
                    .profile(author, document)
                    .await
                    .context("Author profiling failed")?
            }
            (None, false) => author.map(AuthorProfile::for_author).unwrap_or_default(),
        };

        let glossary = match (&settings.glossary_path, settings.glossary_enabled) {
            (Some(path), _) => Glossary::load(path)?,
            (None, true) => {
                info!("Building glossary");
                GlossaryBuilder::new(self.service.clone(), self.languages(), settings.max_glossary_terms)
                    .build(document, &profile)
                    .await
                    .context("Glossary extraction failed")?
            }
            (None, false) => Glossary::empty(),
        };

        debug!("Preprocessing produced {} glossary entries", glossary.len());
        Ok((glossary, profile))
    }

    /// Run preprocessing on `input_file` and write `<stem>.glossary.json` and `<stem>.profile.json`
    pub async fn write_preprocessing(&self, input_file: &Path) -> Result<(PathBuf, PathBuf)> {
        let document = FileManager::read_to_string(input_file)?;
        let (glossary, profile) = self.preprocess(&document).await?;

        let glossary_path = FileManager::sibling_path(input_file, "glossary.json");
        let profile_path = FileManager::sibling_path(input_file, "profile.json");

        FileManager::write_to_file(&glossary_path, &serde_json::to_string_pretty(&glossary)?)?;
        FileManager::write_to_file(&profile_path, &serde_json::to_string_pretty(&profile)?)?;

        info!("Glossary written to {}", glossary_path.display());
        info!("Profile written to {}", profile_path.display());

        Ok((glossary_path, profile_path))
    }

    /// Preprocess, segment, translate and review `document`
    pub async fn translate_document(&self, source_path: &Path, document: &str) -> Result<String> {
        let languages = self.languages();
        let (glossary, profile) = self.preprocess(document).await?;

        let translator = Arc::new(LlmBlockTranslator::new(self.service.clone(), languages.clone()));
        let mut pipeline = DocumentPipeline::new(self.config.pipeline.clone(), translator)?;
        if self.config.pipeline.review_enabled {
            let reviewer: Arc<dyn BatchReviewer> = Arc::new(LlmBatchReviewer::new(self.service.clone(), languages));
            pipeline = pipeline.with_reviewer(reviewer);
        }

        let blocks = pipeline.segment(document);
        let (checkpoint, run_checkpoint) = self
            .open_checkpoint(source_path, document, &glossary, &profile, blocks.len())
            .await?;
        if let Some(checkpoint) = checkpoint {
            pipeline = pipeline.with_checkpoint(checkpoint);
        }

        let progress_bar = self.multi_progress.add(ProgressBar::new(blocks.len() as u64));
        progress_bar.set_style(Self::bar_style("steps"));
        progress_bar.set_message("Translating");
        pipeline = pipeline.with_progress(Self::progress_callback(progress_bar.clone()));

        info!(
            "Translating {} with {} - {}",
            source_path.display(),
            self.config.translation.provider.display_name(),
            self.config.translation.get_model()
        );

        let result = pipeline.translate(&blocks, &glossary, &profile).await;
        progress_bar.finish_and_clear();

        if let RunCheckpoint::Session { manager, session_id } = &run_checkpoint {
            let status = match &result {
                Ok(_) => manager.complete_session(session_id).await,
                Err(_) => manager.fail_session(session_id).await,
            };
            if let Err(e) = status {
                warn!("Failed to update session status: {:#}", e);
            }
        }

        let usage = self.service.token_usage();
        if usage.total_tokens > 0 {
            info!("{}", usage.summary());
        }

        Ok(result?)
    }

    /// Checkpoint for one run: the staging directory when configured, else the session database
    /// when a database path is set or resuming is requested
    async fn open_checkpoint(
        &self,
        source_path: &Path,
        document: &str,
        glossary: &Glossary,
        profile: &AuthorProfile,
        total_blocks: usize,
    ) -> Result<(Option<Arc<dyn Checkpoint>>, RunCheckpoint)> {
        let settings = &self.config.pipeline;

        if let Some(root) = &settings.staging_dir {
            let stem = source_path.file_stem().unwrap_or_default().to_string_lossy().to_string();
            let staging = StageDirectory::new(root.join(stem));
            if !settings.resume {
                staging.clear().await?;
            }
            debug!("Staging units under {}", staging.root().display());
            return Ok((Some(Arc::new(staging)), RunCheckpoint::Directory));
        }

        let manager = match (&settings.database_path, settings.resume) {
            (Some(path), _) => SessionManager::open(path)?,
            (None, true) => SessionManager::new_default()?,
            (None, false) => return Ok((None, RunCheckpoint::None)),
        };

        let params = SessionCreateParams::new(
            source_path.to_path_buf(),
            document,
            &self.config,
            glossary,
            profile,
            total_blocks,
        );
        let session = if settings.resume {
            manager.resume_or_create(params).await?.0
        } else {
            manager.create_session(params).await?
        };
        let checkpoint: Arc<dyn Checkpoint> = Arc::new(manager.checkpoint(&session));

        Ok((
            Some(checkpoint),
            RunCheckpoint::Session { manager, session_id: session.id },
        ))
    }

    fn progress_callback(progress_bar: ProgressBar) -> ProgressCallback {
        Arc::new(move |event: &PipelineProgress| match event {
            PipelineProgress::Segmented { blocks, batches } => {
                progress_bar.set_length((blocks + batches) as u64);
            }
            PipelineProgress::BlockTranslated { .. } => {
                progress_bar.set_message("Translating");
                progress_bar.inc(1);
            }
            PipelineProgress::BatchReviewed { fallback, .. } => {
                progress_bar.set_message(if *fallback { "Reviewing (fallback)" } else { "Reviewing" });
                progress_bar.inc(1);
            }
        })
    }

    fn bar_style(unit: &str) -> ProgressStyle {
        let template = format!(
            "{{spinner:.green}} [{{elapsed_precise}}] [{{bar:40.cyan/blue}}] {{pos}}/{{len}} {} ({{percent}}%) {{msg}} {{eta}}",
            unit
        );
        ProgressStyle::default_bar()
            .template(&template)
            .or_else(|_| ProgressStyle::default_bar().template("{spinner} [{elapsed_precise}] [{bar:40}] {pos}/{len} ({percent}%) {msg}"))
            .unwrap_or_else(|_| ProgressStyle::default_bar())
            .progress_chars("█▓▒░")
    }

    // Format duration in a human-readable format
    fn format_duration(duration: std::time::Duration) -> String {
        let total_seconds = duration.as_secs();
        let hours = total_seconds / 3600;
        let minutes = (total_seconds % 3600) / 60;
        let seconds = total_seconds % 60;

        if hours > 0 {
            format!("{}h {}m {}s", hours, minutes, seconds)
        } else if minutes > 0 {
            format!("{}m {}s", minutes, seconds)
        } else {
            format!("{}.{:03}s", seconds, duration.subsec_millis())
        }
    }
}
