/*!
 * Tests for text alignment and package assembly
 */

use std::io::{Cursor, Read};

use storycast::pipeline::align::{align, line_count};
use storycast::pipeline::package::{
    build_language_package, build_summary_document, build_zip_archive, package_file_name,
};

fn archive_members(bytes: Vec<u8>) -> Vec<(String, String)> {
    let mut archive = zip::ZipArchive::new(Cursor::new(bytes)).expect("valid zip archive");
    (0..archive.len())
        .map(|i| {
            let mut member = archive.by_index(i).expect("member readable");
            let mut content = String::new();
            member.read_to_string(&mut content).expect("member is UTF-8");
            (member.name().to_string(), content)
        })
        .collect()
}

/// Row count is the longer document's line count for a spread of shapes
#[test]
fn test_align_withMismatchedDocuments_shouldPadShorterSide() {
    let samples = [
        ("", ""),
        ("a", ""),
        ("", "x\ny"),
        ("a\nb\nc", "x"),
        ("  a\n\n b  \n", "x\ny\nz\nw"),
        ("one\ntwo", "uno\ndos"),
    ];

    for (source, target) in samples {
        let rows = align(source, target);
        let (short, long) = (line_count(source).min(line_count(target)), line_count(source).max(line_count(target)));
        assert_eq!(rows.len(), long, "rows for {:?}/{:?}", source, target);

        for row in rows.iter().skip(short) {
            assert!(row.source.is_empty() || row.target.is_empty());
        }
        for (i, row) in rows.iter().enumerate() {
            assert_eq!(row.index, i + 1);
        }
    }
}

/// Aligning a document with itself pairs identical lines
#[test]
fn test_align_withSameDocument_shouldPairEqualCells() {
    let document = "First line\n\nThird line after a blank\n  indented stays indented";
    for row in align(document, document) {
        assert_eq!(row.source, row.target);
    }
}

/// Whole-document trimming keeps inner blank lines and per-line whitespace
#[test]
fn test_align_withSurroundingWhitespace_shouldTrimOnlyDocumentEdges() {
    let rows = align("\n\n  a  \n\n b\n\n", "x");
    assert_eq!(rows.len(), 3);
    assert_eq!(rows[0].source, "a  ");
    assert_eq!(rows[1].source, "");
    assert_eq!(rows[2].source, " b");
}

/// Three source lines against two target lines leaves the third target cell empty
#[test]
fn test_language_package_withShorterTranslation_shouldHaveThreeRows() {
    let text = String::from_utf8(build_language_package("Line1\nLine2\nLine3", "L1\nL2")).unwrap();

    let rows: Vec<&str> = text.lines().filter(|l| l.starts_with("| ") && !l.starts_with("| No.") && !l.starts_with("| ---")).collect();
    assert_eq!(rows, vec!["| 1 | Line1 | L1 |", "| 2 | Line2 | L2 |", "| 3 | Line3 |  |"]);
    assert!(text.contains("# Target Language Script\n\nL1\nL2\n"));
}

/// Summary documents keep order and drop empty sections
#[test]
fn test_summary_document_withEmptySections_shouldOmitThem() {
    let sections = vec![
        ("English (en)".to_string(), "Hello".to_string()),
        ("French (fr)".to_string(), String::new()),
        ("German (de)".to_string(), "Hallo".to_string()),
    ];
    let text = String::from_utf8(build_summary_document("Scripts", &sections)).unwrap();

    assert!(!text.contains("French"));
    let en = text.find("## English (en)").unwrap();
    let de = text.find("## German (de)").unwrap();
    assert!(en < de);
}

/// Zip members are exactly the languages with text, in caller order
#[test]
fn test_zip_archive_withSomeTranslations_shouldContainOnlyThose() {
    let entries = [("en", "Hello"), ("fr", ""), ("de", "Hallo"), ("es", ""), ("pt", "Olá")];
    let members = archive_members(build_zip_archive(&entries, "你好").unwrap());

    let names: Vec<&str> = members.iter().map(|(n, _)| n.as_str()).collect();
    assert_eq!(names, vec!["en_story_package.md", "de_story_package.md", "pt_story_package.md"]);

    let (_, pt) = &members[2];
    assert_eq!(pt.as_bytes(), build_language_package("你好", "Olá").as_slice());
}

/// No translated text yields a valid archive with zero members
#[test]
fn test_zip_archive_withAllTranslationsEmpty_shouldBeEmptyNotError() {
    let entries = [("en", ""), ("fr", ""), ("de", ""), ("es", ""), ("pt", "")];
    let bytes = build_zip_archive(&entries, "源稿").unwrap();
    assert!(archive_members(bytes).is_empty());
}

/// Whitespace-only text is still text and gets its own member and section
#[test]
fn test_zip_archive_withWhitespaceOnlyTranslation_shouldKeepMember() {
    let members = archive_members(build_zip_archive(&[("en", "  \n "), ("fr", "")], "src").unwrap());
    let names: Vec<&str> = members.iter().map(|(n, _)| n.as_str()).collect();
    assert_eq!(names, vec!["en_story_package.md"]);

    let sections = [("Blank", "   "), ("Empty", "")];
    let text = String::from_utf8(build_summary_document("Scripts", &sections)).unwrap();
    assert!(text.contains("## Blank"));
    assert!(!text.contains("## Empty"));
}

/// Package file names follow the language code convention
#[test]
fn test_package_file_name_withCode_shouldFollowConvention() {
    assert_eq!(package_file_name("fr"), "fr_story_package.md");
}
