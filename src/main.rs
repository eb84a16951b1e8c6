// Module-specific lints configuration
#![allow(clippy::uninlined_format_args)]

use anyhow::{Result, anyhow, Context};
use log::{info, warn, LevelFilter, Log, Metadata, Record, Level, SetLoggerError};
use std::path::{Path, PathBuf};
use std::io::Write;
use std::fs::File;
use std::io::BufReader;
use clap::{Args, Parser, ValueEnum, CommandFactory, Subcommand};
use clap_complete::{generate, Shell};

use yadtwai::app_config::{self, Config, ReviewFailurePolicy, TranslationProvider};
use yadtwai::app_controller::Controller;

/// CLI Wrapper for TranslationProvider to implement ValueEnum
#[derive(Debug, Clone, ValueEnum)]
enum CliTranslationProvider {
    Ollama,
    OpenAI,
    Anthropic,
    LMStudio,
}

impl From<CliTranslationProvider> for TranslationProvider {
    fn from(cli_provider: CliTranslationProvider) -> Self {
        match cli_provider {
            CliTranslationProvider::Ollama => TranslationProvider::Ollama,
            CliTranslationProvider::OpenAI => TranslationProvider::OpenAI,
            CliTranslationProvider::Anthropic => TranslationProvider::Anthropic,
            CliTranslationProvider::LMStudio => TranslationProvider::LMStudio,
        }
    }
}

/// CLI Wrapper for LogLevel to implement ValueEnum
#[derive(Debug, Clone, ValueEnum)]
enum CliLogLevel {
    Error,
    Warn,
    Info,
    Debug,
    Trace,
}

impl From<CliLogLevel> for app_config::LogLevel {
    fn from(cli_level: CliLogLevel) -> Self {
        match cli_level {
            CliLogLevel::Error => app_config::LogLevel::Error,
            CliLogLevel::Warn => app_config::LogLevel::Warn,
            CliLogLevel::Info => app_config::LogLevel::Info,
            CliLogLevel::Debug => app_config::LogLevel::Debug,
            CliLogLevel::Trace => app_config::LogLevel::Trace,
        }
    }
}

/// CLI Wrapper for ReviewFailurePolicy to implement ValueEnum
#[derive(Debug, Clone, ValueEnum)]
enum CliReviewFailure {
    Abort,
    Fallback,
}

impl From<CliReviewFailure> for ReviewFailurePolicy {
    fn from(cli_policy: CliReviewFailure) -> Self {
        match cli_policy {
            CliReviewFailure::Abort => ReviewFailurePolicy::Abort,
            CliReviewFailure::Fallback => ReviewFailurePolicy::Fallback,
        }
    }
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Translate documents using AI providers (default command)
    Translate(TranslateArgs),

    /// Build the glossary and author profile of a document and write them as JSON
    Preprocess(PreprocessArgs),

    /// Join the unit files of a staging directory into one document
    Assemble(AssembleArgs),

    /// Generate shell completions for yadtwai
    Completions {
        /// Shell to generate completions for
        #[arg(value_enum)]
        shell: Shell,
    },
}

#[derive(Args, Debug, Clone)]
struct TranslateArgs {
    /// Input document or directory to process
    #[arg(value_name = "INPUT_PATH")]
    input_path: Option<PathBuf>,

    /// Output directory (defaults to the directory of each input)
    #[arg(short, long)]
    output_dir: Option<PathBuf>,

    /// Force overwrite of existing output files
    #[arg(short, long)]
    force_overwrite: bool,

    /// Translation provider to use
    #[arg(short, long, value_enum)]
    provider: Option<CliTranslationProvider>,

    /// Model name to use for translation
    #[arg(short, long)]
    model: Option<String>,

    /// Source language code (e.g., 'en', 'es', 'fr')
    #[arg(short, long)]
    source_language: Option<String>,

    /// Target language code (e.g., 'en', 'es', 'fr')
    #[arg(short, long)]
    target_language: Option<String>,

    /// Configuration file path
    #[arg(short, long, default_value = "conf.json")]
    config_path: String,

    /// Set logging level
    #[arg(short, long, value_enum)]
    log_level: Option<CliLogLevel>,

    /// Skip the batch review pass
    #[arg(long)]
    no_review: bool,

    /// Translated blocks merged per review call
    #[arg(long)]
    batch_size: Option<usize>,

    /// Source blocks shown to the reviewer
    #[arg(long)]
    context_width: Option<usize>,

    /// Token budget of a block
    #[arg(long)]
    tokens_per_block: Option<usize>,

    /// What to do when a review call fails
    #[arg(long, value_enum)]
    review_failure: Option<CliReviewFailure>,

    /// Glossary JSON file, replacing the extracted glossary
    #[arg(long)]
    glossary: Option<PathBuf>,

    /// Author profile JSON file, replacing the generated profile
    #[arg(long)]
    profile: Option<PathBuf>,

    /// Author name given to the profiler
    #[arg(long)]
    author: Option<String>,

    /// Write every unit to this directory, one file per block and stage
    #[arg(long)]
    staging_dir: Option<PathBuf>,

    /// Reuse units stored by an interrupted run
    #[arg(long)]
    resume: bool,
}

#[derive(Args, Debug, Clone)]
struct PreprocessArgs {
    /// Input document
    #[arg(value_name = "INPUT_PATH")]
    input_path: PathBuf,

    /// Configuration file path
    #[arg(short, long, default_value = "conf.json")]
    config_path: String,

    /// Author name given to the profiler
    #[arg(long)]
    author: Option<String>,

    /// Set logging level
    #[arg(short, long, value_enum)]
    log_level: Option<CliLogLevel>,
}

#[derive(Args, Debug, Clone)]
struct AssembleArgs {
    /// Stage directory holding NNNNN.txt unit files
    #[arg(value_name = "STAGE_DIR")]
    stage_dir: PathBuf,

    /// Output file (stdout when omitted)
    #[arg(short, long)]
    output: Option<PathBuf>,
}

/// YADTwAI - Yet Another Document Translator with AI
///
/// Translates long documents block by block with a language model, keeping
/// continuity through neighbouring context and a batched review pass.
#[derive(Parser, Debug)]
#[command(name = "yadtwai")]
#[command(version)]
#[command(about = "AI-powered long document translation tool")]
#[command(args_conflicts_with_subcommands = true)]
#[command(long_about = "YADTwAI splits documents into paragraph-aligned blocks, translates them in order \
with the previous translation and the next source block as context, then reviews the translation in batches.

EXAMPLES:
    yadtwai novel.txt                            # Translate using default config
    yadtwai -f novel.txt                         # Force overwrite existing files
    yadtwai -p openai -m gpt-4o novel.txt        # Use specific provider and model
    yadtwai -s en -t es novel.txt                # Translate from English to Spanish
    yadtwai --no-review --tokens-per-block 1000 notes.md
    yadtwai --staging-dir stage --resume novel.txt
    yadtwai preprocess --author 'Jane Austen' novel.txt
    yadtwai assemble stage/novel/translated -o novel.fr.txt
    yadtwai completions bash > yadtwai.bash      # Generate bash completions

CONFIGURATION:
    Configuration is stored in conf.json by default. You can specify a different
    config file with --config-path. If the config file doesn't exist, a default one
    will be created automatically.")]
struct CommandLineOptions {
    #[command(subcommand)]
    command: Option<Commands>,

    #[command(flatten)]
    translate: TranslateArgs,
}

// @struct: Custom logger implementation
struct CustomLogger {
    level: LevelFilter,
}

impl CustomLogger {
    // @creates: New logger with specified level
    fn new(level: LevelFilter) -> Self {
        CustomLogger { level }
    }

    // @initializes: Global logger
    fn init(level: LevelFilter) -> Result<(), SetLoggerError> {
        let logger = Box::new(CustomLogger::new(level));
        log::set_boxed_logger(logger)?;
        log::set_max_level(level);
        Ok(())
    }

    // @returns: Emoji for log level
    fn get_emoji_for_level(level: Level) -> &'static str {
        match level {
            Level::Error => "❌",
            Level::Warn => "🚧",
            Level::Info => " ",
            Level::Debug => "🔍",
            Level::Trace => "📋",
        }
    }

    // @returns: ANSI color for log level
    fn get_color_for_level(level: Level) -> &'static str {
        match level {
            Level::Error => "1;31",
            Level::Warn => "1;33",
            Level::Info => "1;32",
            Level::Debug => "1;36",
            Level::Trace => "1;35",
        }
    }
}

impl Log for CustomLogger {
    fn enabled(&self, metadata: &Metadata) -> bool {
        metadata.level() <= self.level
    }

    fn log(&self, record: &Record) {
        if self.enabled(record.metadata()) {
            let now = chrono::Local::now().format("%H:%M:%S.%3f");
            let level = record.level();

            let mut stderr = std::io::stderr();
            let _ = writeln!(
                stderr,
                "\x1B[{}m{} {} {}\x1B[0m",
                Self::get_color_for_level(level),
                now,
                Self::get_emoji_for_level(level),
                record.args()
            );
        }
    }

    fn flush(&self) {
        let _ = std::io::stderr().flush();
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    // Trace is the ceiling; the effective level is set once the config is known
    CustomLogger::init(LevelFilter::Trace)?;
    log::set_max_level(LevelFilter::Info);

    let cli = CommandLineOptions::parse();

    match cli.command {
        Some(Commands::Completions { shell }) => {
            let mut cmd = CommandLineOptions::command();
            generate(shell, &mut cmd, "yadtwai", &mut std::io::stdout());
            Ok(())
        }
        Some(Commands::Translate(args)) => run_translate(args).await,
        Some(Commands::Preprocess(args)) => run_preprocess(args).await,
        Some(Commands::Assemble(args)) => run_assemble(args),
        None => run_translate(cli.translate).await,
    }
}

/// Load the configuration file, creating it with defaults when missing
fn load_config(config_path: &str) -> Result<Config> {
    if Path::new(config_path).exists() {
        let file = File::open(config_path)
            .context(format!("Failed to open config file: {}", config_path))?;

        let reader = BufReader::new(file);
        let config: Config = serde_json::from_reader(reader)
            .context(format!("Failed to parse config file: {}", config_path))?;

        Ok(config)
    } else {
        warn!("Config file not found at '{}', creating default config.", config_path);

        let config = Config::default();

        let config_json = serde_json::to_string_pretty(&config)
            .context("Failed to serialize default config to JSON")?;

        std::fs::write(config_path, config_json)
            .context(format!("Failed to write default config to file: {}", config_path))?;

        Ok(config)
    }
}

/// Apply the CLI log level, or the configured one when none was given
fn apply_log_level(config: &mut Config, cli_level: Option<&CliLogLevel>) {
    if let Some(level) = cli_level {
        config.log_level = level.clone().into();
    }
    log::set_max_level(config.log_level.to_level_filter());
}

fn apply_translate_overrides(config: &mut Config, options: &TranslateArgs) {
    if let Some(provider) = &options.provider {
        config.translation.provider = provider.clone().into();
    }
    if let Some(model) = &options.model {
        config.translation.active_provider_config_mut().model = model.clone();
    }
    if let Some(source_lang) = &options.source_language {
        config.source_language = source_lang.clone();
    }
    if let Some(target_lang) = &options.target_language {
        config.target_language = target_lang.clone();
    }

    let pipeline = &mut config.pipeline;
    if options.no_review {
        pipeline.review_enabled = false;
    }
    if let Some(batch_size) = options.batch_size {
        pipeline.batch_size = batch_size;
    }
    if let Some(width) = options.context_width {
        pipeline.review_context_width = width;
    }
    if let Some(budget) = options.tokens_per_block {
        pipeline.tokens_per_block = budget;
    }
    if let Some(policy) = &options.review_failure {
        pipeline.review_failure = policy.clone().into();
    }
    if let Some(dir) = &options.staging_dir {
        pipeline.staging_dir = Some(dir.clone());
    }
    if options.resume {
        pipeline.resume = true;
    }

    let preprocessing = &mut config.preprocessing;
    if let Some(path) = &options.glossary {
        preprocessing.glossary_path = Some(path.clone());
    }
    if let Some(path) = &options.profile {
        preprocessing.profile_path = Some(path.clone());
    }
    if let Some(author) = &options.author {
        preprocessing.author = Some(author.clone());
    }
}

async fn run_translate(options: TranslateArgs) -> Result<()> {
    let input_path = options.input_path.clone().ok_or_else(|| {
        anyhow!("INPUT_PATH is required when no subcommand is specified")
    })?;

    let mut config = load_config(&options.config_path)?;
    apply_log_level(&mut config, options.log_level.as_ref());
    apply_translate_overrides(&mut config, &options);

    config.validate()
        .context("Configuration validation failed")?;

    let controller = Controller::with_config(config)?;
    controller.test_connection().await?;

    if input_path.is_file() {
        let output_dir = options.output_dir.clone()
            .unwrap_or_else(|| input_path.parent().unwrap_or(Path::new(".")).to_path_buf());
        controller.run(input_path, output_dir, options.force_overwrite).await?;
    } else if input_path.is_dir() {
        if options.output_dir.is_some() {
            warn!("--output-dir is ignored for directories, outputs are written next to their inputs");
        }
        let summary = controller.run_folder(input_path, options.force_overwrite).await?;
        if summary.failed > 0 {
            return Err(anyhow!("{} document(s) failed, see the issues log", summary.failed));
        }
    } else {
        return Err(anyhow!("Input path does not exist: {:?}", input_path));
    }

    Ok(())
}

async fn run_preprocess(options: PreprocessArgs) -> Result<()> {
    let mut config = load_config(&options.config_path)?;
    apply_log_level(&mut config, options.log_level.as_ref());
    if let Some(author) = &options.author {
        config.preprocessing.author = Some(author.clone());
    }

    config.validate()
        .context("Configuration validation failed")?;

    if !options.input_path.is_file() {
        return Err(anyhow!("Input file does not exist: {:?}", options.input_path));
    }

    let controller = Controller::with_config(config)?;
    controller.test_connection().await?;
    controller.write_preprocessing(&options.input_path).await?;

    Ok(())
}

fn run_assemble(options: AssembleArgs) -> Result<()> {
    let text = yadtwai::translation::assemble_directory(&options.stage_dir)?;

    match &options.output {
        Some(path) => {
            yadtwai::file_utils::FileManager::write_to_file(path, &text)?;
            info!("Assembled document written to {}", path.display());
        }
        None => {
            let mut stdout = std::io::stdout();
            stdout.write_all(text.as_bytes()).context("Failed to write to stdout")?;
            stdout.flush().context("Failed to flush stdout")?;
        }
    }

    Ok(())
}
