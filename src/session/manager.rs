/*!
 * Session manager for translation session lifecycle.
 *
 * This module handles:
 * - Creating new translation sessions
 * - Resuming interrupted sessions by fingerprint
 * - Marking sessions completed or failed
 * - Session listing and cleanup
 */

use anyhow::Result;
use log::{debug, info, warn};
use std::path::Path;
use uuid::Uuid;

use crate::database::connection::DatabaseConnection;
use crate::database::models::{SessionRecord, SessionStatus};
use crate::database::repository::Repository;
use crate::translation::staging::Stage;

use super::checkpoint::SessionCheckpoint;
use super::models::{SessionCreateParams, SessionInfo};

/// Session manager for handling translation session lifecycle
#[derive(Clone, Debug)]
pub struct SessionManager {
    /// Repository for database operations
    repo: Repository,
}

impl SessionManager {
    /// Create a new session manager with the given repository
    pub fn new(repo: Repository) -> Self {
        Self { repo }
    }

    /// Create a new session manager with the default database
    pub fn new_default() -> Result<Self> {
        let repo = Repository::new_default()?;
        Ok(Self::new(repo))
    }

    /// Create a session manager backed by the database at `path`
    pub fn open(path: &Path) -> Result<Self> {
        let db = DatabaseConnection::new(path)?;
        Ok(Self::new(Repository::new(db)))
    }

    /// Create a new session manager with an in-memory database (for testing)
    pub fn new_in_memory() -> Result<Self> {
        let repo = Repository::new_in_memory()?;
        Ok(Self::new(repo))
    }

    /// Checkpoint storing units under `session`
    pub fn checkpoint(&self, session: &SessionInfo) -> SessionCheckpoint {
        SessionCheckpoint::new(self.repo.clone(), session.id.clone())
    }

    // =========================================================================
    // Session Creation
    // =========================================================================

    /// Create a new translation session
    pub async fn create_session(&self, params: SessionCreateParams) -> Result<SessionInfo> {
        let session_id = Uuid::new_v4().to_string();

        info!(
            "Creating new session {} for {} ({} blocks)",
            &session_id[..8],
            params.source_path.display(),
            params.total_blocks
        );

        let record = SessionRecord::new(
            session_id,
            params.source_path.to_string_lossy().to_string(),
            params.fingerprint,
            params.source_language,
            params.target_language,
            params.provider,
            params.model,
            params.total_blocks as i64,
        );

        self.repo.create_session(&record).await?;

        Ok(SessionInfo::from_record(&record))
    }

    /// Resume the latest unfinished session with the same fingerprint, or create one
    ///
    /// Returns the session and whether it was resumed.
    pub async fn resume_or_create(&self, params: SessionCreateParams) -> Result<(SessionInfo, bool)> {
        match self.repo.find_resumable_session(&params.fingerprint).await? {
            Some(record) => {
                if record.status == SessionStatus::Failed {
                    warn!("Previous run of session {} failed, resuming it", &record.id[..8.min(record.id.len())]);
                }
                self.repo
                    .update_session_status(&record.id, SessionStatus::InProgress)
                    .await?;

                let session = SessionInfo::from_record(&record);
                let translated = self.repo.count_units(&session.id, Stage::Translated).await?;
                info!(
                    "Resuming session {} ({}/{} blocks already translated)",
                    session.short_id(),
                    translated,
                    session.total_blocks
                );

                Ok((session, true))
            }
            None => {
                debug!("No resumable session for fingerprint {}", &params.fingerprint[..8.min(params.fingerprint.len())]);
                let session = self.create_session(params).await?;
                Ok((session, false))
            }
        }
    }

    // =========================================================================
    // Session State Management
    // =========================================================================

    /// Get session by ID
    pub async fn get_session(&self, session_id: &str) -> Result<Option<SessionInfo>> {
        let record = self.repo.get_session(session_id).await?;
        Ok(record.map(|r| SessionInfo::from_record(&r)))
    }

    /// Mark session as completed
    pub async fn complete_session(&self, session_id: &str) -> Result<()> {
        info!("Completing session {}", &session_id[..8.min(session_id.len())]);
        self.repo
            .update_session_status(session_id, SessionStatus::Completed)
            .await
    }

    /// Mark session as failed
    pub async fn fail_session(&self, session_id: &str) -> Result<()> {
        warn!("Marking session {} as failed", &session_id[..8.min(session_id.len())]);
        self.repo
            .update_session_status(session_id, SessionStatus::Failed)
            .await
    }

    // =========================================================================
    // Session Listing and Cleanup
    // =========================================================================

    /// List all sessions
    pub async fn list_sessions(&self, status: Option<SessionStatus>) -> Result<Vec<SessionInfo>> {
        let records = self.repo.list_sessions(status).await?;
        Ok(records.iter().map(SessionInfo::from_record).collect())
    }

    /// Delete a session and its units
    pub async fn delete_session(&self, session_id: &str) -> Result<()> {
        info!("Deleting session {}", session_id);
        self.repo.delete_session(session_id).await
    }
}
