/*!
 * Reassembly of ordered units into the final document.
 */

use anyhow::{Context, Result};
use log::{debug, warn};
use std::path::{Path, PathBuf};

use crate::translation::segmenter::PARAGRAPH_SEPARATOR;
use crate::translation::staging::parse_unit_index;

/// Join units in order with a blank line, without filtering or trimming
pub fn assemble<S: AsRef<str>>(units: &[S]) -> String {
    units
        .iter()
        .map(|unit| unit.as_ref())
        .collect::<Vec<&str>>()
        .join(PARAGRAPH_SEPARATOR)
}

/// Staged unit files of `dir`, ordered by the index encoded in their name
pub fn ordered_unit_files(dir: &Path) -> Result<Vec<(usize, PathBuf)>> {
    let entries = std::fs::read_dir(dir)
        .with_context(|| format!("Failed to read staging directory: {}", dir.display()))?;

    let mut files = Vec::new();
    for entry in entries {
        let path = entry
            .with_context(|| format!("Failed to list staging directory: {}", dir.display()))?
            .path();

        if !path.is_file() {
            continue;
        }

        match parse_unit_index(&path) {
            Some(index) => files.push((index, path)),
            None => warn!("Skipping non-unit file: {}", path.display()),
        }
    }

    files.sort_by_key(|(index, _)| *index);
    Ok(files)
}

/// Assemble the unit files of a staging stage directory
pub fn assemble_directory(dir: &Path) -> Result<String> {
    let files = ordered_unit_files(dir)?;
    debug!("Assembling {} units from {}", files.len(), dir.display());

    let units = files
        .iter()
        .map(|(_, path)| {
            std::fs::read_to_string(path)
                .with_context(|| format!("Failed to read unit file: {}", path.display()))
        })
        .collect::<Result<Vec<String>>>()?;

    Ok(assemble(&units))
}
