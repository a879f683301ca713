/*!
 * Download package assembly.
 *
 * Packages are rendered on demand from the current pipeline state and are
 * never cached. Nothing here touches the filesystem; callers decide how the
 * bytes reach the user.
 */

use std::io::{Cursor, Write};

use zip::write::SimpleFileOptions;
use zip::{CompressionMethod, DateTime, ZipWriter};

use crate::errors::PackageError;
use crate::pipeline::align::{align, AlignedRow};

pub const MARKDOWN_MIME: &str = "text/markdown";
pub const ZIP_MIME: &str = "application/zip";

pub const SCRIPT_SUMMARY_FILE_NAME: &str = "summary_stories.md";
pub const METADATA_SUMMARY_FILE_NAME: &str = "summary_metadata.md";
pub const ZIP_BUNDLE_FILE_NAME: &str = "youtube_story_packages.zip";

const COMPARISON_TITLE: &str = "Source / Target Comparison";
const TARGET_TITLE: &str = "Target Language Script";
const SEPARATOR: &str = "---";

/// A downloadable blob with its file name and MIME type
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Artifact {
    pub file_name: String,
    pub mime: &'static str,
    pub bytes: Vec<u8>,
}

impl Artifact {
    pub fn markdown(file_name: impl Into<String>, bytes: Vec<u8>) -> Self {
        Self {
            file_name: file_name.into(),
            mime: MARKDOWN_MIME,
            bytes,
        }
    }

    pub fn zip(file_name: impl Into<String>, bytes: Vec<u8>) -> Self {
        Self {
            file_name: file_name.into(),
            mime: ZIP_MIME,
            bytes,
        }
    }
}

/// File name of a per-language package
pub fn package_file_name(language_code: &str) -> String {
    format!("{}_story_package.md", language_code)
}

fn escape_cell(cell: &str) -> String {
    cell.replace('|', "\\|")
}

/// Render aligned rows as a Markdown pipe table
pub fn render_comparison_table(rows: &[AlignedRow<'_>]) -> String {
    let mut table = String::from("| No. | Source | Target |\n| ---: | :--- | :--- |\n");
    for row in rows {
        table.push_str(&format!(
            "| {} | {} | {} |\n",
            row.index,
            escape_cell(row.source),
            escape_cell(row.target)
        ));
    }
    table
}

/// Comparison table followed by the raw target text
pub fn build_language_package(source_text: &str, target_text: &str) -> Vec<u8> {
    let table = render_comparison_table(&align(source_text, target_text));
    format!(
        "# {}\n\n{}\n{}\n\n# {}\n\n{}\n",
        COMPARISON_TITLE, table, SEPARATOR, TARGET_TITLE, target_text
    )
    .into_bytes()
}

/// Titled document with one subsection per non-empty section, in input order
pub fn build_summary_document<L, T>(title: &str, sections: &[(L, T)]) -> Vec<u8>
where
    L: AsRef<str>,
    T: AsRef<str>,
{
    let mut content = format!("# {}\n\n", title);
    for (label, text) in sections {
        let text = text.as_ref();
        if text.is_empty() {
            continue;
        }
        content.push_str(&format!("## {}\n\n{}\n\n{}\n\n", label.as_ref(), text, SEPARATOR));
    }
    content.into_bytes()
}

/// Zip of per-language packages, one member per language with non-empty text.
///
/// Members are written in the order of `entries`; timestamps are fixed so the
/// same inputs always produce the same bytes.
pub fn build_zip_archive<C, T>(entries: &[(C, T)], source_text: &str) -> Result<Vec<u8>, PackageError>
where
    C: AsRef<str>,
    T: AsRef<str>,
{
    let mut writer = ZipWriter::new(Cursor::new(Vec::new()));
    let options = SimpleFileOptions::default()
        .compression_method(CompressionMethod::Deflated)
        .last_modified_time(DateTime::default());

    for (code, text) in entries {
        let text = text.as_ref();
        if text.is_empty() {
            continue;
        }
        writer.start_file(package_file_name(code.as_ref()), options)?;
        writer.write_all(&build_language_package(source_text, text))?;
    }

    Ok(writer.finish()?.into_inner())
}
