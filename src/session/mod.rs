/*!
 * Session management module for translation sessions.
 *
 * This module provides:
 * - Session creation and tracking
 * - Resume capability for interrupted translations
 * - A `Checkpoint` implementation over the session database
 */

pub mod checkpoint;
pub mod manager;
pub mod models;

// Re-export main types
pub use checkpoint::SessionCheckpoint;
pub use manager::SessionManager;
pub use models::{fingerprint, SessionCreateParams, SessionInfo};
