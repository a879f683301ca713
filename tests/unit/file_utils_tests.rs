/*!
 * Tests for file utilities, uploads and the style library
 */

use anyhow::Result;
use std::fs;

use storycast::errors::PipelineError;
use storycast::file_utils::{FileManager, UploadedDocument};
use storycast::style_library::{StyleLibrary, StyleSelection};

use crate::common;

/// Test text document discovery ignores other files and subdirectories
#[test]
fn test_find_text_documents_withMixedEntries_shouldReturnSortedTextFiles() -> Result<()> {
    let dir = common::create_temp_dir()?;
    common::create_test_file(dir.path(), "b.txt", "b")?;
    common::create_test_file(dir.path(), "a.MD", "a")?;
    common::create_test_file(dir.path(), "c.pdf", "c")?;
    fs::create_dir(dir.path().join("nested.md"))?;

    let names: Vec<String> = FileManager::find_text_documents(dir.path())?
        .iter()
        .filter_map(|p| p.file_name().map(|n| n.to_string_lossy().to_string()))
        .collect();
    assert_eq!(names, vec!["a.MD", "b.txt"]);
    Ok(())
}

/// Test writing bytes creates missing parent directories
#[test]
fn test_write_bytes_withMissingParents_shouldCreateThem() -> Result<()> {
    let dir = common::create_temp_dir()?;
    let path = dir.path().join("deep").join("er").join("out.md");

    FileManager::write_bytes(&path, b"content")?;
    assert_eq!(fs::read(&path)?, b"content");
    Ok(())
}

/// Test uploads keep their file name and decode as UTF-8
#[test]
fn test_uploaded_document_fromPath_shouldKeepNameAndContent() -> Result<()> {
    let dir = common::create_temp_dir()?;
    let path = common::create_test_file(dir.path(), "海洋.md", "潮汐与月亮")?;

    let document = UploadedDocument::from_path(&path)?;
    assert_eq!(document.name, "海洋.md");
    assert_eq!(document.content, "潮汐与月亮");
    Ok(())
}

/// Test invalid UTF-8 is an encoding error
#[test]
fn test_uploaded_document_withInvalidUtf8_shouldBeEncodingError() {
    let result = UploadedDocument::from_bytes("broken.txt", vec![0xc3, 0x28]);
    assert!(matches!(result, Err(PipelineError::Encoding(name)) if name == "broken.txt"));
}

/// Test style selection resolution order
#[test]
fn test_style_selection_withUploadAndLibrary_shouldPreferUpload() -> Result<()> {
    let dir = common::create_temp_dir()?;
    common::create_test_file(dir.path(), "documentary.md", "Measured and calm")?;
    let library = StyleLibrary::new(dir.path());

    let upload = UploadedDocument::from_bytes("quick.md", b"Fast and punchy".to_vec())?;
    let both = StyleSelection {
        upload: Some(upload),
        library_entry: Some("documentary.md".into()),
    };
    assert_eq!(both.resolve(&library)?.as_deref(), Some("Fast and punchy"));
    assert_eq!(
        StyleSelection::from_library("documentary.md").resolve(&library)?.as_deref(),
        Some("Measured and calm")
    );
    assert_eq!(StyleSelection::from_library("None").resolve(&library)?, None);
    Ok(())
}

/// Test unknown library entries are reported, not silently ignored
#[test]
fn test_style_library_withUnknownEntry_shouldBeMissingInput() -> Result<()> {
    let dir = common::create_temp_dir()?;
    let library = StyleLibrary::new(dir.path());

    let result = StyleSelection::from_library("ghost.md").resolve(&library);
    assert!(matches!(result, Err(PipelineError::MissingInput(_))));
    Ok(())
}
