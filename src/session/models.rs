/*!
 * Session-specific models.
 *
 * These structures provide a higher-level abstraction over the raw
 * database records for session management operations.
 */

use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};
use std::path::PathBuf;

use crate::app_config::Config;
use crate::database::models::{SessionRecord, SessionStatus};
use crate::translation::context::{AuthorProfile, Glossary};

/// Parameters for creating or resuming a session
#[derive(Debug, Clone)]
pub struct SessionCreateParams {
    /// Path to the source document
    pub source_path: PathBuf,
    /// Fingerprint of the document and the settings shaping its units
    pub fingerprint: String,
    /// Source language code
    pub source_language: String,
    /// Target language code
    pub target_language: String,
    /// Translation provider name
    pub provider: String,
    /// Model name
    pub model: String,
    /// Number of blocks of the segmented document
    pub total_blocks: usize,
}

impl SessionCreateParams {
    /// Parameters for translating `document` read from `source_path` with `config`
    /// and the preprocessing results
    pub fn new(
        source_path: PathBuf,
        document: &str,
        config: &Config,
        glossary: &Glossary,
        profile: &AuthorProfile,
        total_blocks: usize,
    ) -> Self {
        Self {
            source_path,
            fingerprint: fingerprint(document, config, glossary, profile),
            source_language: config.source_language.clone(),
            target_language: config.target_language.clone(),
            provider: config.translation.provider.to_lowercase_string(),
            model: config.translation.get_model(),
            total_blocks,
        }
    }
}

/// SHA256 over the document and everything that changes the stored units
///
/// Two runs share units only when the text, the languages, the model, the
/// pipeline parameters, the glossary and the author profile are identical.
pub fn fingerprint(document: &str, config: &Config, glossary: &Glossary, profile: &AuthorProfile) -> String {
    let pipeline = &config.pipeline;
    let mut hasher = Sha256::new();

    hasher.update(document.as_bytes());
    for part in [
        config.source_language.clone(),
        config.target_language.clone(),
        config.translation.provider.to_lowercase_string(),
        config.translation.get_model(),
        pipeline.tokens_per_block.to_string(),
        pipeline.review_enabled.to_string(),
        pipeline.batch_size.to_string(),
        pipeline.review_context_width.to_string(),
        format!("{:?}", pipeline.review_failure),
        serde_json::to_string(glossary).unwrap_or_default(),
        serde_json::to_string(profile).unwrap_or_default(),
    ] {
        // Separator keeps ("ab", "c") and ("a", "bc") apart
        hasher.update([0u8]);
        hasher.update(part.as_bytes());
    }

    format!("{:x}", hasher.finalize())
}

/// High-level session information for display and tracking
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SessionInfo {
    /// Session ID
    pub id: String,
    /// Source document path
    pub source_path: String,
    /// Source language
    pub source_language: String,
    /// Target language
    pub target_language: String,
    /// Provider used
    pub provider: String,
    /// Model used
    pub model: String,
    /// Number of blocks
    pub total_blocks: i64,
    /// Session status
    pub status: SessionStatus,
    /// Creation time
    pub created_at: String,
    /// Last update time
    pub updated_at: String,
}

impl SessionInfo {
    /// Create from a session record
    pub fn from_record(record: &SessionRecord) -> Self {
        Self {
            id: record.id.clone(),
            source_path: record.source_path.clone(),
            source_language: record.source_language.clone(),
            target_language: record.target_language.clone(),
            provider: record.provider.clone(),
            model: record.model.clone(),
            total_blocks: record.total_blocks,
            status: record.status,
            created_at: record.created_at.clone(),
            updated_at: record.updated_at.clone(),
        }
    }

    /// First eight characters of the id, for log lines
    pub fn short_id(&self) -> &str {
        self.id.get(..8).unwrap_or(&self.id)
    }

    /// Get a human-readable status string
    pub fn status_display(&self) -> &'static str {
        match self.status {
            SessionStatus::InProgress => "In Progress",
            SessionStatus::Completed => "Completed",
            SessionStatus::Failed => "Failed",
        }
    }
}

impl std::fmt::Display for SessionInfo {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "[{}] {} {} -> {} ({} blocks, {})",
            self.short_id(),
            self.source_path,
            self.source_language,
            self.target_language,
            self.total_blocks,
            self.status_display()
        )
    }
}
