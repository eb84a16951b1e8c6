/*!
 * Database entity models.
 *
 * These structures map directly to database tables and provide
 * type-safe access to persisted data.
 */

use serde::{Deserialize, Serialize};
use std::fmt;

use crate::translation::staging::Stage;

/// Session status enumeration
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SessionStatus {
    /// Session is being processed or was interrupted
    InProgress,
    /// The document was fully translated and written
    Completed,
    /// The run stopped on an error; stored units remain usable
    Failed,
}

impl fmt::Display for SessionStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SessionStatus::InProgress => write!(f, "in_progress"),
            SessionStatus::Completed => write!(f, "completed"),
            SessionStatus::Failed => write!(f, "failed"),
        }
    }
}

impl std::str::FromStr for SessionStatus {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "in_progress" => Ok(SessionStatus::InProgress),
            "completed" => Ok(SessionStatus::Completed),
            "failed" => Ok(SessionStatus::Failed),
            _ => Err(anyhow::anyhow!("Invalid session status: {}", s)),
        }
    }
}

/// Translation session record
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SessionRecord {
    /// Unique session identifier (UUID)
    pub id: String,
    /// Path to the source document
    pub source_path: String,
    /// SHA256 over the document and every setting that shapes its units
    pub fingerprint: String,
    /// Source language code
    pub source_language: String,
    /// Target language code
    pub target_language: String,
    /// Translation provider used
    pub provider: String,
    /// Model used for translation
    pub model: String,
    /// Number of blocks the document was split into
    pub total_blocks: i64,
    /// Current session status
    pub status: SessionStatus,
    /// Creation timestamp (RFC 3339)
    pub created_at: String,
    /// Last update timestamp (RFC 3339)
    pub updated_at: String,
    /// Completion timestamp (RFC 3339), if completed
    pub completed_at: Option<String>,
}

impl SessionRecord {
    /// Create a new in-progress session record
    #[allow(clippy::too_many_arguments)]
    pub fn new(
        id: String,
        source_path: String,
        fingerprint: String,
        source_language: String,
        target_language: String,
        provider: String,
        model: String,
        total_blocks: i64,
    ) -> Self {
        let now = chrono::Utc::now().to_rfc3339();
        Self {
            id,
            source_path,
            fingerprint,
            source_language,
            target_language,
            provider,
            model,
            total_blocks,
            status: SessionStatus::InProgress,
            created_at: now.clone(),
            updated_at: now,
            completed_at: None,
        }
    }

    /// Failed and interrupted sessions can both be picked up again
    pub fn is_resumable(&self) -> bool {
        matches!(self.status, SessionStatus::InProgress | SessionStatus::Failed)
    }
}

/// One stored unit of a session
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UnitRecord {
    /// Session this unit belongs to
    pub session_id: String,
    /// Pipeline stage
    pub stage: Stage,
    /// Block index for raw and translated units, batch index for reviewed ones
    pub index: usize,
    /// Unit text
    pub text: String,
}
