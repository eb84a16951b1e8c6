/*!
 * Repository layer for database operations.
 *
 * This module provides a high-level API for session and unit storage,
 * abstracting away the SQL details and providing type-safe access.
 */

use anyhow::Result;
use log::debug;
use rusqlite::{params, Connection, OptionalExtension, Row};

use super::connection::DatabaseConnection;
use super::models::{SessionRecord, SessionStatus, UnitRecord};
use crate::translation::staging::Stage;

const SESSION_COLUMNS: &str = "id, source_path, fingerprint, source_language, target_language, \
     provider, model, total_blocks, status, created_at, updated_at, completed_at";

/// Repository for database operations
#[derive(Clone, Debug)]
pub struct Repository {
    /// Database connection
    db: DatabaseConnection,
}

impl Repository {
    /// Create a new repository with the given database connection
    pub fn new(db: DatabaseConnection) -> Self {
        Self { db }
    }

    /// Create a repository with the default database location
    pub fn new_default() -> Result<Self> {
        let db = DatabaseConnection::new_default()?;
        Ok(Self::new(db))
    }

    /// Create a repository with an in-memory database (for testing)
    pub fn new_in_memory() -> Result<Self> {
        let db = DatabaseConnection::new_in_memory()?;
        Ok(Self::new(db))
    }

    // =========================================================================
    // Session Operations
    // =========================================================================

    /// Create a new translation session
    pub async fn create_session(&self, session: &SessionRecord) -> Result<()> {
        let session = session.clone();

        self.db
            .execute_async(move |conn| {
                conn.execute(
                    r#"
                    INSERT INTO sessions (
                        id, source_path, fingerprint, source_language, target_language,
                        provider, model, total_blocks, status,
                        created_at, updated_at, completed_at
                    ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11, ?12)
                    "#,
                    params![
                        session.id,
                        session.source_path,
                        session.fingerprint,
                        session.source_language,
                        session.target_language,
                        session.provider,
                        session.model,
                        session.total_blocks,
                        session.status.to_string(),
                        session.created_at,
                        session.updated_at,
                        session.completed_at,
                    ],
                )?;
                Ok(())
            })
            .await
    }

    /// Get a session by ID
    pub async fn get_session(&self, session_id: &str) -> Result<Option<SessionRecord>> {
        let session_id = session_id.to_string();

        self.db
            .execute_async(move |conn| Self::get_session_sync(conn, &session_id))
            .await
    }

    fn get_session_sync(conn: &Connection, session_id: &str) -> Result<Option<SessionRecord>> {
        let result = conn
            .query_row(
                &format!("SELECT {} FROM sessions WHERE id = ?1", SESSION_COLUMNS),
                [session_id],
                parse_session_row,
            )
            .optional()?;

        Ok(result)
    }

    /// Most recently updated resumable session with the given fingerprint
    pub async fn find_resumable_session(&self, fingerprint: &str) -> Result<Option<SessionRecord>> {
        let fingerprint = fingerprint.to_string();

        self.db
            .execute_async(move |conn| {
                let result = conn
                    .query_row(
                        &format!(
                            r#"
                            SELECT {} FROM sessions
                            WHERE fingerprint = ?1
                              AND status IN ('in_progress', 'failed')
                            ORDER BY updated_at DESC
                            LIMIT 1
                            "#,
                            SESSION_COLUMNS
                        ),
                        [&fingerprint],
                        parse_session_row,
                    )
                    .optional()?;

                Ok(result)
            })
            .await
    }

    /// Update session status
    pub async fn update_session_status(
        &self,
        session_id: &str,
        status: SessionStatus,
    ) -> Result<()> {
        let session_id = session_id.to_string();
        let now = chrono::Utc::now().to_rfc3339();

        self.db
            .execute_async(move |conn| {
                let completed_at = if status == SessionStatus::Completed {
                    Some(now.clone())
                } else {
                    None
                };

                conn.execute(
                    r#"
                    UPDATE sessions
                    SET status = ?1, updated_at = ?2, completed_at = COALESCE(?3, completed_at)
                    WHERE id = ?4
                    "#,
                    params![status.to_string(), now, completed_at, session_id],
                )?;
                Ok(())
            })
            .await
    }

    /// List all sessions with optional status filter
    pub async fn list_sessions(
        &self,
        status_filter: Option<SessionStatus>,
    ) -> Result<Vec<SessionRecord>> {
        self.db
            .execute_async(move |conn| {
                let sessions: Vec<SessionRecord> = match status_filter {
                    Some(status) => {
                        let mut stmt = conn.prepare(&format!(
                            "SELECT {} FROM sessions WHERE status = ?1 ORDER BY updated_at DESC",
                            SESSION_COLUMNS
                        ))?;
                        stmt.query_map([status.to_string()], parse_session_row)?
                            .filter_map(|r| r.ok())
                            .collect()
                    }
                    None => {
                        let mut stmt = conn.prepare(&format!(
                            "SELECT {} FROM sessions ORDER BY updated_at DESC",
                            SESSION_COLUMNS
                        ))?;
                        stmt.query_map([], parse_session_row)?
                            .filter_map(|r| r.ok())
                            .collect()
                    }
                };

                Ok(sessions)
            })
            .await
    }

    /// Delete a session and all its units
    pub async fn delete_session(&self, session_id: &str) -> Result<()> {
        let session_id = session_id.to_string();

        self.db
            .execute_async(move |conn| {
                // Units go with the session through ON DELETE CASCADE
                conn.execute("DELETE FROM sessions WHERE id = ?1", [&session_id])?;
                Ok(())
            })
            .await
    }

    // =========================================================================
    // Unit Operations
    // =========================================================================

    /// Insert or replace the unit stored at `(stage, index)` of a session
    pub async fn upsert_unit(&self, unit: UnitRecord) -> Result<()> {
        let now = chrono::Utc::now().to_rfc3339();

        self.db
            .execute_async(move |conn| {
                conn.execute(
                    r#"
                    INSERT INTO units (session_id, stage, idx, text, updated_at)
                    VALUES (?1, ?2, ?3, ?4, ?5)
                    ON CONFLICT(session_id, stage, idx)
                    DO UPDATE SET text = excluded.text, updated_at = excluded.updated_at
                    "#,
                    params![unit.session_id, unit.stage.as_str(), unit.index as i64, unit.text, now],
                )?;
                conn.execute(
                    "UPDATE sessions SET updated_at = ?1 WHERE id = ?2",
                    params![now, unit.session_id],
                )?;
                debug!("Stored {} unit {} of session {}", unit.stage, unit.index, unit.session_id);
                Ok(())
            })
            .await
    }

    /// Text of the unit stored at `(stage, index)`, if any
    pub async fn get_unit(&self, session_id: &str, stage: Stage, index: usize) -> Result<Option<String>> {
        let session_id = session_id.to_string();

        self.db
            .execute_async(move |conn| {
                let text = conn
                    .query_row(
                        "SELECT text FROM units WHERE session_id = ?1 AND stage = ?2 AND idx = ?3",
                        params![session_id, stage.as_str(), index as i64],
                        |row| row.get(0),
                    )
                    .optional()?;
                Ok(text)
            })
            .await
    }

    /// Number of units stored for one stage of a session
    pub async fn count_units(&self, session_id: &str, stage: Stage) -> Result<usize> {
        let session_id = session_id.to_string();

        self.db
            .execute_async(move |conn| {
                let count: i64 = conn.query_row(
                    "SELECT COUNT(*) FROM units WHERE session_id = ?1 AND stage = ?2",
                    params![session_id, stage.as_str()],
                    |row| row.get(0),
                )?;
                Ok(count as usize)
            })
            .await
    }
}

fn parse_session_row(row: &Row) -> rusqlite::Result<SessionRecord> {
    Ok(SessionRecord {
        id: row.get(0)?,
        source_path: row.get(1)?,
        fingerprint: row.get(2)?,
        source_language: row.get(3)?,
        target_language: row.get(4)?,
        provider: row.get(5)?,
        model: row.get(6)?,
        total_blocks: row.get(7)?,
        status: row
            .get::<_, String>(8)?
            .parse()
            .unwrap_or(SessionStatus::InProgress),
        created_at: row.get(9)?,
        updated_at: row.get(10)?,
        completed_at: row.get(11)?,
    })
}
