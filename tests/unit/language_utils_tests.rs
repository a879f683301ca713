/*!
 * Tests for ISO language code utilities
 */

use storycast::app_config::LanguageSpec;
use storycast::language_utils::{get_language_name, language_codes_match, normalize_to_part2t, validate_language_code};

/// Test validation of ISO 639-1 and 639-2 codes
#[test]
fn test_validate_language_code_withVariousCodes_shouldValidateCorrectly() {
    for code in ["zh", "en", "fr", "de", "es", "pt", "zho", "chi", "ger", " EN "] {
        assert!(validate_language_code(code).is_ok(), "{} should be valid", code);
    }
    for code in ["", "x", "xx", "english"] {
        assert!(validate_language_code(code).is_err(), "{} should be invalid", code);
    }
}

/// Test normalization to the 3-letter terminology form
#[test]
fn test_normalize_to_part2t_withBibliographicCode_shouldReturnTerminologyCode() {
    assert_eq!(normalize_to_part2t("fre").unwrap(), "fra");
    assert_eq!(normalize_to_part2t("de").unwrap(), "deu");
    assert!(normalize_to_part2t("xx").is_err());
}

/// Test code matching across code forms
#[test]
fn test_language_codes_match_withEquivalentCodes_shouldMatch() {
    assert!(language_codes_match("pt", "por"));
    assert!(language_codes_match("de", "ger"));
    assert!(!language_codes_match("es", "pt"));
}

/// Test language specs resolve names and match equivalent codes
#[test]
fn test_language_spec_withCodeOnly_shouldDeriveName() {
    assert_eq!(get_language_name("es").unwrap(), "Spanish");

    let language = LanguageSpec::from_code("PT").unwrap();
    assert_eq!(language.code, "pt");
    assert_eq!(language.display_name(), "Portuguese");
    assert!(language.matches("por"));
    assert!(!language.matches("es"));
}
