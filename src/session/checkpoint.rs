/*!
 * SQLite-backed checkpoint bound to one session.
 */

use async_trait::async_trait;

use crate::database::models::UnitRecord;
use crate::database::repository::Repository;
use crate::errors::TranslationError;
use crate::translation::staging::{Checkpoint, Stage};

/// Stores the units of one session in the `units` table
#[derive(Clone, Debug)]
pub struct SessionCheckpoint {
    repo: Repository,
    session_id: String,
}

impl SessionCheckpoint {
    /// Checkpoint writing under `session_id`
    pub fn new(repo: Repository, session_id: String) -> Self {
        Self { repo, session_id }
    }

    /// Session the units belong to
    pub fn session_id(&self) -> &str {
        &self.session_id
    }
}

#[async_trait]
impl Checkpoint for SessionCheckpoint {
    async fn load(&self, stage: Stage, index: usize) -> Result<Option<String>, TranslationError> {
        self.repo
            .get_unit(&self.session_id, stage, index)
            .await
            .map_err(|e| TranslationError::Checkpoint(format!("Failed to load {} unit {}: {:#}", stage, index, e)))
    }

    async fn store(&self, stage: Stage, index: usize, text: &str) -> Result<(), TranslationError> {
        let unit = UnitRecord {
            session_id: self.session_id.clone(),
            stage,
            index,
            text: text.to_string(),
        };

        self.repo
            .upsert_unit(unit)
            .await
            .map_err(|e| TranslationError::Checkpoint(format!("Failed to store {} unit {}: {:#}", stage, index, e)))
    }
}
