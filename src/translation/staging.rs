/*!
 * Checkpointing of intermediate units.
 *
 * Every raw block, translated unit and reviewed part is keyed by its stage
 * and its index. `StageDirectory` writes one file per unit; the SQLite
 * implementation lives in `session::checkpoint`.
 */

use async_trait::async_trait;
use std::fmt;
use std::path::{Path, PathBuf};
use std::str::FromStr;

use crate::errors::TranslationError;

/// Largest index representable with the 5-digit file names
pub const MAX_STAGED_INDEX: usize = 99_999;

/// Pipeline stage a unit belongs to
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Stage {
    /// Source blocks as produced by the segmenter
    Raw,
    /// One translated unit per block
    Translated,
    /// One merged unit per review batch, keyed by batch index
    Reviewed,
}

impl Stage {
    /// All stages, in pipeline order
    pub const ALL: [Stage; 3] = [Stage::Raw, Stage::Translated, Stage::Reviewed];

    /// Directory and database name of the stage
    pub fn as_str(&self) -> &'static str {
        match self {
            Stage::Raw => "raw",
            Stage::Translated => "translated",
            Stage::Reviewed => "reviewed",
        }
    }
}

impl fmt::Display for Stage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Stage {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "raw" => Ok(Stage::Raw),
            "translated" => Ok(Stage::Translated),
            "reviewed" => Ok(Stage::Reviewed),
            other => Err(format!("Unknown stage: {}", other)),
        }
    }
}

/// Durable store of intermediate units, keyed by stage and index
#[async_trait]
pub trait Checkpoint: Send + Sync {
    /// Previously stored unit, if any
    async fn load(&self, stage: Stage, index: usize) -> Result<Option<String>, TranslationError>;

    /// Store a unit, replacing any previous value
    async fn store(&self, stage: Stage, index: usize, text: &str) -> Result<(), TranslationError>;
}

/// One sub-directory per stage, one `NNNNN.txt` file per unit
#[derive(Debug, Clone)]
pub struct StageDirectory {
    root: PathBuf,
}

impl StageDirectory {
    /// Use `root` as the staging directory; sub-directories are created on first write
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    /// Root of the staging directory
    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Directory holding the units of `stage`
    pub fn stage_dir(&self, stage: Stage) -> PathBuf {
        self.root.join(stage.as_str())
    }

    /// Path of the unit `index` of `stage`
    pub fn unit_path(&self, stage: Stage, index: usize) -> Result<PathBuf, TranslationError> {
        Ok(self.stage_dir(stage).join(unit_file_name(index)?))
    }

    /// Remove every staged unit
    pub async fn clear(&self) -> Result<(), TranslationError> {
        for stage in Stage::ALL {
            let dir = self.stage_dir(stage);
            if tokio::fs::try_exists(&dir).await.unwrap_or(false) {
                tokio::fs::remove_dir_all(&dir).await
                    .map_err(|e| checkpoint_error("clear", &dir, e))?;
            }
        }
        Ok(())
    }
}

#[async_trait]
impl Checkpoint for StageDirectory {
    async fn load(&self, stage: Stage, index: usize) -> Result<Option<String>, TranslationError> {
        let path = self.unit_path(stage, index)?;

        match tokio::fs::read_to_string(&path).await {
            Ok(text) => Ok(Some(text)),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(None),
            Err(e) => Err(checkpoint_error("read", &path, e)),
        }
    }

    async fn store(&self, stage: Stage, index: usize, text: &str) -> Result<(), TranslationError> {
        let path = self.unit_path(stage, index)?;
        let dir = self.stage_dir(stage);

        tokio::fs::create_dir_all(&dir).await
            .map_err(|e| checkpoint_error("create", &dir, e))?;
        tokio::fs::write(&path, text).await
            .map_err(|e| checkpoint_error("write", &path, e))
    }
}

/// Zero-padded file name of unit `index`
pub fn unit_file_name(index: usize) -> Result<String, TranslationError> {
    if index > MAX_STAGED_INDEX {
        return Err(TranslationError::Checkpoint(format!(
            "Unit index {} does not fit the 5-digit staging file names",
            index
        )));
    }
    Ok(format!("{:05}.txt", index))
}

/// Index encoded in a staging file name, if it is one
pub fn parse_unit_index(path: &Path) -> Option<usize> {
    if path.extension().and_then(|e| e.to_str()) != Some("txt") {
        return None;
    }
    path.file_stem()?.to_str()?.parse().ok()
}

fn checkpoint_error(action: &str, path: &Path, error: std::io::Error) -> TranslationError {
    TranslationError::Checkpoint(format!("Failed to {} {}: {}", action, path.display(), error))
}
