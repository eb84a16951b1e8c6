/*!
 * Tests for application configuration
 */

use anyhow::Result;
use yadtwai::app_config::{Config, LogLevel, ReviewFailurePolicy, TranslationProvider};

/// Test that the default configuration matches the documented defaults
#[test]
fn test_default_config_shouldUseDocumentedDefaults() {
    let config = Config::default();

    assert_eq!(config.source_language, "en");
    assert_eq!(config.target_language, "fr");
    assert_eq!(config.translation.provider, TranslationProvider::Ollama);
    assert_eq!(config.pipeline.tokens_per_block, 2000);
    assert!(config.pipeline.review_enabled);
    assert_eq!(config.pipeline.batch_size, 5);
    assert_eq!(config.pipeline.review_context_width, 10);
    assert_eq!(config.pipeline.review_failure, ReviewFailurePolicy::Abort);
    assert!(!config.pipeline.resume);
    assert!(config.pipeline.staging_dir.is_none());
    assert!(config.preprocessing.glossary_enabled);
    assert!(config.preprocessing.profile_enabled);
    assert_eq!(config.log_level, LogLevel::Info);
}

/// Test that the default configuration passes validation
#[test]
fn test_default_config_shouldValidate() -> Result<()> {
    Config::default().validate()
}

/// Test that missing sections in a config file fall back to their defaults
#[test]
fn test_deserialize_partialJson_shouldFillDefaults() -> Result<()> {
    let json = r#"{
        "source_language": "de",
        "target_language": "es",
        "translation": { "provider": "anthropic" },
        "pipeline": { "batch_size": 3, "review_failure": "fallback" }
    }"#;

    let config: Config = serde_json::from_str(json)?;

    assert_eq!(config.source_language, "de");
    assert_eq!(config.translation.provider, TranslationProvider::Anthropic);
    assert_eq!(config.pipeline.batch_size, 3);
    assert_eq!(config.pipeline.review_failure, ReviewFailurePolicy::Fallback);
    assert_eq!(config.pipeline.tokens_per_block, 2000);
    assert_eq!(config.pipeline.review_context_width, 10);
    assert!(config.pipeline.review_enabled);
    assert!(config.preprocessing.glossary_enabled);
    assert!(!config.translation.get_model().is_empty());
    Ok(())
}

/// Test that a serialized configuration reads back with the same settings
#[test]
fn test_serialize_thenDeserialize_shouldKeepSettings() -> Result<()> {
    let mut config = Config::default();
    config.pipeline.batch_size = 7;
    config.pipeline.review_enabled = false;
    config.preprocessing.author = Some("Jane Austen".to_string());
    config.translation.active_provider_config_mut().model = "custom-model".to_string();

    let json = serde_json::to_string_pretty(&config)?;
    let restored: Config = serde_json::from_str(&json)?;

    assert_eq!(restored.pipeline.batch_size, 7);
    assert!(!restored.pipeline.review_enabled);
    assert_eq!(restored.preprocessing.author.as_deref(), Some("Jane Austen"));
    assert_eq!(restored.translation.get_model(), "custom-model");
    Ok(())
}

/// Test that invalid language codes are rejected
#[test]
fn test_validate_withInvalidLanguage_shouldFail() {
    let mut config = Config::default();
    config.target_language = "zz-invalid".to_string();

    assert!(config.validate().is_err());
}

/// Test that remote providers require an API key
#[test]
fn test_validate_remoteProviderWithoutApiKey_shouldFail() {
    let mut config = Config::default();
    config.translation.provider = TranslationProvider::OpenAI;
    assert!(config.validate().is_err());

    config.translation.active_provider_config_mut().api_key = "sk-test".to_string();
    assert!(config.validate().is_ok());
}

/// Test that zero-sized pipeline settings are rejected
#[test]
fn test_validate_zeroPipelineSizes_shouldFail() {
    let mut config = Config::default();
    config.pipeline.batch_size = 0;
    assert!(config.validate().is_err());

    let mut config = Config::default();
    config.pipeline.tokens_per_block = 0;
    assert!(config.validate().is_err());
}

/// Test that the active provider entry is created when missing
#[test]
fn test_activeProviderConfigMut_missingEntry_shouldInsertDefaults() {
    let mut config = Config::default();
    config.translation.available_providers.clear();
    config.translation.provider = TranslationProvider::LMStudio;

    config.translation.active_provider_config_mut().model = "local-model".to_string();

    assert_eq!(config.translation.available_providers.len(), 1);
    assert_eq!(config.translation.get_model(), "local-model");
    assert!(!config.translation.get_endpoint().is_empty());
}
