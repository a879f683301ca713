/*!
 * Style guides for the script stage.
 *
 * The library is a directory of named `.md`/`.txt` files. A selection can
 * also carry an ad hoc upload, which always wins over a library entry.
 */

use log::debug;
use std::path::{Path, PathBuf};

use crate::errors::PipelineError;
use crate::file_utils::{FileManager, UploadedDocument};

/// Library choice meaning "no style guide"
pub const NO_STYLE: &str = "none";

#[derive(Debug, Clone)]
pub struct StyleLibrary {
    root: PathBuf,
}

impl StyleLibrary {
    pub fn new<P: AsRef<Path>>(root: P) -> Self {
        Self {
            root: root.as_ref().to_path_buf(),
        }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Entry names (file names) in sorted order; empty when the directory is missing
    pub fn list(&self) -> Result<Vec<String>, PipelineError> {
        if !FileManager::dir_exists(&self.root) {
            debug!("Style library {:?} does not exist", self.root);
            return Ok(Vec::new());
        }

        let files = FileManager::find_text_documents(&self.root)
            .map_err(|e| PipelineError::Io(std::io::Error::other(e.to_string())))?;
        Ok(files
            .iter()
            .filter_map(|p| p.file_name())
            .map(|n| n.to_string_lossy().to_string())
            .collect())
    }

    /// Read one entry as UTF-8 text
    pub fn read(&self, name: &str) -> Result<String, PipelineError> {
        let is_plain_name = Path::new(name).file_name().is_some_and(|n| n == name);
        if !is_plain_name || !FileManager::is_text_document(name) {
            return Err(PipelineError::MissingInput(format!("style guide '{}' is not a library entry", name)));
        }

        let path = self.root.join(name);
        if !FileManager::file_exists(&path) {
            return Err(PipelineError::MissingInput(format!("style guide '{}' not found in {:?}", name, self.root)));
        }
        FileManager::read_utf8(path)
    }
}

/// The user's style guide choice for one script generation
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct StyleSelection {
    /// Ad hoc upload; takes precedence
    pub upload: Option<UploadedDocument>,
    /// Library entry name, or `none`
    pub library_entry: Option<String>,
}

impl StyleSelection {
    pub fn none() -> Self {
        Self::default()
    }

    pub fn from_library(name: impl Into<String>) -> Self {
        Self {
            upload: None,
            library_entry: Some(name.into()),
        }
    }

    pub fn from_upload(upload: UploadedDocument) -> Self {
        Self {
            upload: Some(upload),
            library_entry: None,
        }
    }

    /// Upload first, then the named library entry unless it is `none`, else absent
    pub fn resolve(&self, library: &StyleLibrary) -> Result<Option<String>, PipelineError> {
        if let Some(upload) = &self.upload {
            return Ok(Some(upload.content.clone()));
        }

        match self.library_entry.as_deref().map(str::trim) {
            Some(name) if !name.is_empty() && !name.eq_ignore_ascii_case(NO_STYLE) => library.read(name).map(Some),
            _ => Ok(None),
        }
    }
}
