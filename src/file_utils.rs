use anyhow::{Context, Result};
use chrono::Local;
use std::fs;
use std::path::{Path, PathBuf};
use walkdir::WalkDir;

use crate::errors::PipelineError;

// @module: File and directory utilities

/// Extensions accepted for uploads and style guides
pub const TEXT_EXTENSIONS: [&str; 2] = ["md", "txt"];

// @struct: File operations utility
pub struct FileManager;

impl FileManager {
    // @checks: File existence
    pub fn file_exists<P: AsRef<Path>>(path: P) -> bool {
        path.as_ref().exists() && path.as_ref().is_file()
    }

    // @checks: Directory existence
    pub fn dir_exists<P: AsRef<Path>>(path: P) -> bool {
        path.as_ref().exists() && path.as_ref().is_dir()
    }

    // @creates: Directory and parents if needed
    pub fn ensure_dir<P: AsRef<Path>>(path: P) -> Result<()> {
        let path = path.as_ref();
        if !path.exists() {
            fs::create_dir_all(path).with_context(|| format!("Failed to create directory: {:?}", path))?;
        }
        Ok(())
    }

    /// Whether a path carries one of the accepted text extensions
    pub fn is_text_document<P: AsRef<Path>>(path: P) -> bool {
        path.as_ref()
            .extension()
            .map(|ext| {
                let ext = ext.to_string_lossy();
                TEXT_EXTENSIONS.iter().any(|allowed| ext.eq_ignore_ascii_case(allowed))
            })
            .unwrap_or(false)
    }

    /// Text documents directly inside a directory, sorted by file name
    pub fn find_text_documents<P: AsRef<Path>>(dir: P) -> Result<Vec<PathBuf>> {
        let mut result = Vec::new();

        for entry in WalkDir::new(dir.as_ref()).min_depth(1).max_depth(1).follow_links(true) {
            let entry = entry.context("Failed to read directory entry")?;
            let path = entry.path();
            if path.is_file() && Self::is_text_document(path) {
                result.push(path.to_path_buf());
            }
        }

        result.sort();
        Ok(result)
    }

    /// Read a file that must be valid UTF-8
    pub fn read_utf8<P: AsRef<Path>>(path: P) -> Result<String, PipelineError> {
        let path = path.as_ref();
        let bytes = fs::read(path)?;
        String::from_utf8(bytes).map_err(|_| PipelineError::Encoding(path.display().to_string()))
    }

    /// Write bytes to a file, creating parent directories
    pub fn write_bytes<P: AsRef<Path>>(path: P, bytes: &[u8]) -> Result<()> {
        if let Some(parent) = path.as_ref().parent() {
            Self::ensure_dir(parent)?;
        }

        fs::write(&path, bytes).with_context(|| format!("Failed to write to file: {:?}", path.as_ref()))
    }

    // @generates: Timestamped export directory below `base`
    pub fn timestamped_dir<P: AsRef<Path>>(base: P) -> PathBuf {
        base.as_ref().join(Local::now().format("%Y%m%d-%H%M%S").to_string())
    }
}

/// A user-supplied document, decoded as UTF-8
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UploadedDocument {
    /// File name as uploaded, without directories
    pub name: String,
    pub content: String,
}

impl UploadedDocument {
    /// Decode raw upload bytes
    pub fn from_bytes(name: impl Into<String>, bytes: Vec<u8>) -> Result<Self, PipelineError> {
        let name = name.into();
        let content = String::from_utf8(bytes).map_err(|_| PipelineError::Encoding(name.clone()))?;
        Ok(Self { name, content })
    }

    /// Read an upload from disk
    pub fn from_path<P: AsRef<Path>>(path: P) -> Result<Self, PipelineError> {
        let path = path.as_ref();
        let name = path
            .file_name()
            .map(|n| n.to_string_lossy().to_string())
            .unwrap_or_else(|| path.display().to_string());
        let bytes = fs::read(path)?;
        Self::from_bytes(name, bytes)
    }
}
