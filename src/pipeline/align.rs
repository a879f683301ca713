/*!
 * Line alignment of a source document against its translation.
 *
 * Models do not always preserve the exact line count, so the shorter side
 * is padded with empty cells instead of failing.
 */

/// One row of a comparison table
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AlignedRow<'a> {
    /// 1-based row number
    pub index: usize,
    pub source: &'a str,
    pub target: &'a str,
}

/// Lines of a document after trimming surrounding whitespace from the whole text.
///
/// Individual lines keep their own indentation.
pub fn split_lines(document: &str) -> Vec<&str> {
    document.trim().lines().collect()
}

/// Number of lines `split_lines` yields; zero for an empty or blank document
pub fn line_count(document: &str) -> usize {
    split_lines(document).len()
}

/// Pair two documents line by line.
///
/// Produces `max(line_count(a), line_count(b))` rows; cells beyond the
/// shorter document are empty strings.
pub fn align<'a>(source: &'a str, target: &'a str) -> Vec<AlignedRow<'a>> {
    let source_lines = split_lines(source);
    let target_lines = split_lines(target);
    let rows = source_lines.len().max(target_lines.len());

    (0..rows)
        .map(|i| AlignedRow {
            index: i + 1,
            source: source_lines.get(i).copied().unwrap_or(""),
            target: target_lines.get(i).copied().unwrap_or(""),
        })
        .collect()
}
