/*!
 * In-memory capabilities for pipeline tests.
 *
 * Translators and reviewers push an entry to a shared `CallLog` on every
 * call, so tests can check both the arguments and the interleaving of
 * translation and review calls.
 */

use std::collections::HashMap;
use std::sync::Arc;
use async_trait::async_trait;
use parking_lot::Mutex;
use yadtwai::errors::{ProviderError, TranslationError};
use yadtwai::translation::{AuthorProfile, BatchReviewer, BlockTranslator, Checkpoint, Glossary, Stage};

/// Ordered record of capability calls, e.g. `["T0", "T1", "R0"]`
#[derive(Debug, Clone, Default)]
pub struct CallLog(Arc<Mutex<Vec<String>>>);

impl CallLog {
    pub fn push(&self, entry: String) {
        self.0.lock().push(entry);
    }

    pub fn entries(&self) -> Vec<String> {
        self.0.lock().clone()
    }
}

/// Arguments of one `translate_block` call
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TranslateCall {
    pub block: String,
    pub previous: Option<String>,
    pub next: Option<String>,
}

/// Arguments of one `review_batch` call
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReviewCall {
    pub units: Vec<String>,
    pub window: Vec<String>,
}

fn simulated_failure() -> ProviderError {
    ProviderError::ApiError {
        message: "Simulated failure".to_string(),
        status_code: 500,
    }
}

/// Returns every block unchanged
pub struct IdentityTranslator;

#[async_trait]
impl BlockTranslator for IdentityTranslator {
    async fn translate_block(
        &self,
        block: &str,
        _glossary: &Glossary,
        _profile: &AuthorProfile,
        _previous: Option<&str>,
        _next: Option<&str>,
    ) -> Result<String, ProviderError> {
        Ok(block.to_string())
    }
}

/// Wraps every block in angle brackets and records the call
///
/// The n-th call (counting from zero) can be made to fail or to return a
/// blank unit.
#[derive(Default)]
pub struct RecordingTranslator {
    log: CallLog,
    calls: Mutex<Vec<TranslateCall>>,
    fail_at: Option<usize>,
    blank_at: Option<usize>,
}

impl RecordingTranslator {
    pub fn new(log: CallLog) -> Self {
        Self { log, ..Default::default() }
    }

    pub fn failing_at(log: CallLog, call: usize) -> Self {
        Self { log, fail_at: Some(call), ..Default::default() }
    }

    pub fn blank_at(log: CallLog, call: usize) -> Self {
        Self { log, blank_at: Some(call), ..Default::default() }
    }

    pub fn calls(&self) -> Vec<TranslateCall> {
        self.calls.lock().clone()
    }
}

#[async_trait]
impl BlockTranslator for RecordingTranslator {
    async fn translate_block(
        &self,
        block: &str,
        _glossary: &Glossary,
        _profile: &AuthorProfile,
        previous: Option<&str>,
        next: Option<&str>,
    ) -> Result<String, ProviderError> {
        let call = {
            let mut calls = self.calls.lock();
            calls.push(TranslateCall {
                block: block.to_string(),
                previous: previous.map(str::to_string),
                next: next.map(str::to_string),
            });
            calls.len() - 1
        };
        self.log.push(format!("T{}", call));

        if self.fail_at == Some(call) {
            return Err(simulated_failure());
        }
        if self.blank_at == Some(call) {
            return Ok("  \n".to_string());
        }
        Ok(format!("<{}>", block))
    }
}

/// Joins the units of a batch as `R[a+b+c]` and records the call
#[derive(Default)]
pub struct RecordingReviewer {
    log: CallLog,
    calls: Mutex<Vec<ReviewCall>>,
    fail_at: Option<usize>,
    blank_at: Option<usize>,
}

impl RecordingReviewer {
    pub fn new(log: CallLog) -> Self {
        Self { log, ..Default::default() }
    }

    pub fn failing_at(log: CallLog, call: usize) -> Self {
        Self { log, fail_at: Some(call), ..Default::default() }
    }

    pub fn blank_at(log: CallLog, call: usize) -> Self {
        Self { log, blank_at: Some(call), ..Default::default() }
    }

    pub fn calls(&self) -> Vec<ReviewCall> {
        self.calls.lock().clone()
    }
}

#[async_trait]
impl BatchReviewer for RecordingReviewer {
    async fn review_batch(
        &self,
        units: &[&str],
        source_window: &[&str],
        _glossary: &Glossary,
        _profile: &AuthorProfile,
    ) -> Result<String, ProviderError> {
        let call = {
            let mut calls = self.calls.lock();
            calls.push(ReviewCall {
                units: units.iter().map(|u| u.to_string()).collect(),
                window: source_window.iter().map(|s| s.to_string()).collect(),
            });
            calls.len() - 1
        };
        self.log.push(format!("R{}", call));

        if self.fail_at == Some(call) {
            return Err(simulated_failure());
        }
        if self.blank_at == Some(call) {
            return Ok(String::new());
        }
        Ok(format!("R[{}]", units.join("+")))
    }
}

/// Checkpoint kept in a map, optionally preloaded with units
#[derive(Default)]
pub struct MemoryCheckpoint {
    units: Mutex<HashMap<(Stage, usize), String>>,
}

impl MemoryCheckpoint {
    pub fn with_units(units: &[(Stage, usize, &str)]) -> Self {
        let checkpoint = Self::default();
        {
            let mut map = checkpoint.units.lock();
            for (stage, index, text) in units {
                map.insert((*stage, *index), text.to_string());
            }
        }
        checkpoint
    }

    pub fn get(&self, stage: Stage, index: usize) -> Option<String> {
        self.units.lock().get(&(stage, index)).cloned()
    }

    pub fn count(&self, stage: Stage) -> usize {
        self.units.lock().keys().filter(|(s, _)| *s == stage).count()
    }
}

#[async_trait]
impl Checkpoint for MemoryCheckpoint {
    async fn load(&self, stage: Stage, index: usize) -> Result<Option<String>, TranslationError> {
        Ok(self.get(stage, index))
    }

    async fn store(&self, stage: Stage, index: usize, text: &str) -> Result<(), TranslationError> {
        self.units.lock().insert((stage, index), text.to_string());
        Ok(())
    }
}
