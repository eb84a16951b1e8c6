/*!
 * Database module for persistent checkpoints.
 *
 * This module provides SQLite-based persistence for translation sessions
 * and their staged units, so an interrupted run resumes where it stopped.
 */

pub mod schema;
pub mod connection;
pub mod repository;
pub mod models;

// Re-export main types
pub use connection::DatabaseConnection;
pub use models::{SessionRecord, SessionStatus, UnitRecord};
pub use repository::Repository;
