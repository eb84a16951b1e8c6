/*!
 * Tests for file utility functions
 */

use std::fs;
use std::path::Path;
use anyhow::Result;
use yadtwai::file_utils::{FileManager, DOCUMENT_EXTENSIONS};
use crate::common;

/// Test that file_exists returns true for existing files
#[test]
fn test_file_exists_withExistingFile_shouldReturnTrue() -> Result<()> {
    let temp_dir = common::create_temp_dir()?;
    let test_file = common::create_test_file(&temp_dir.path().to_path_buf(), "book.txt", "test content")?;

    assert!(FileManager::file_exists(&test_file));
    assert!(!FileManager::dir_exists(&test_file));
    Ok(())
}

/// Test that file_exists returns false for non-existent files
#[test]
fn test_file_exists_withNonExistentFile_shouldReturnFalse() {
    assert!(!FileManager::file_exists("non_existent_file.tmp"));
}

/// Test that generate_output_path inserts the language before the extension
#[test]
fn test_generate_output_path_withValidInputs_shouldCreateCorrectPath() {
    let output_path = FileManager::generate_output_path(Path::new("/tmp/input/book.txt"), Path::new("/tmp/out"), "fr");
    assert_eq!(output_path, Path::new("/tmp/out/book.fr.txt"));

    let output_path = FileManager::generate_output_path(Path::new("/tmp/input/README"), Path::new("/tmp/out"), "de");
    assert_eq!(output_path, Path::new("/tmp/out/README.de"));
}

/// Test that sibling_path replaces the extension next to the input
#[test]
fn test_sibling_path_shouldStayInInputDirectory() {
    let path = FileManager::sibling_path(Path::new("/books/novel.md"), "glossary.json");
    assert_eq!(path, Path::new("/books/novel.glossary.json"));
}

/// Test that find_files returns matching documents sorted by path
#[test]
fn test_find_files_withMixedExtensions_shouldReturnSortedDocuments() -> Result<()> {
    let temp_dir = common::create_temp_dir()?;
    let root = temp_dir.path().to_path_buf();
    fs::create_dir(root.join("nested"))?;

    common::create_test_file(&root, "b.txt", "b")?;
    common::create_test_file(&root, "a.MD", "a")?;
    common::create_test_file(&root, "notes.json", "{}")?;
    common::create_test_file(&root.join("nested"), "c.txt", "c")?;

    let files = FileManager::find_files(&root, &DOCUMENT_EXTENSIONS)?;

    assert_eq!(files, vec![root.join("a.MD"), root.join("b.txt"), root.join("nested").join("c.txt")]);
    Ok(())
}

/// Test that previous outputs are recognized by their language suffix
#[test]
fn test_is_translated_output_shouldMatchLanguageSuffix() {
    assert!(FileManager::is_translated_output("book.fr.txt", "fr"));
    assert!(FileManager::is_translated_output("book.FR.md", "fr"));
    assert!(!FileManager::is_translated_output("book.txt", "fr"));
    assert!(!FileManager::is_translated_output("book.de.txt", "fr"));
}

/// Test that write_to_file creates missing parent directories
#[test]
fn test_write_to_file_withMissingParent_shouldCreateIt() -> Result<()> {
    let temp_dir = common::create_temp_dir()?;
    let path = temp_dir.path().join("deep").join("er").join("out.txt");

    FileManager::write_to_file(&path, "content")?;

    assert_eq!(FileManager::read_to_string(&path)?, "content");
    Ok(())
}

/// Test that log entries are appended with a timestamp
#[test]
fn test_append_to_log_file_shouldAppendTimestampedLines() -> Result<()> {
    let temp_dir = common::create_temp_dir()?;
    let path = temp_dir.path().join("issues.log");

    FileManager::append_to_log_file(&path, "first")?;
    FileManager::append_to_log_file(&path, "second")?;

    let content = fs::read_to_string(&path)?;
    let lines: Vec<&str> = content.lines().collect();
    assert_eq!(lines.len(), 2);
    assert!(lines[0].starts_with('[') && lines[0].ends_with("] first"));
    assert!(lines[1].ends_with("] second"));
    Ok(())
}
