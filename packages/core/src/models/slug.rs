//! Slug derivation
//!
//! Slugs are lower-case ASCII words joined by single hyphens
//! (`[a-z0-9]+(-[a-z0-9]+)*`). They are derived from the title and are the
//! collection-scoped human identifier used in URLs.

use crate::models::ValidationError;
use regex::Regex;
use std::sync::OnceLock;

/// Runs of anything that is not a lower-case ASCII letter or digit
const SLUG_SEPARATOR_PATTERN: &str = r"[^a-z0-9]+";

/// Upper bound on slug length (bytes); longer slugs are cut at a word boundary
pub const MAX_SLUG_LENGTH: usize = 120;

/// Derive a URL-safe slug from a title
///
/// Common Latin diacritics are folded to their base letter before the
/// separator pass, so "Über uns" becomes "uber-uns".
///
/// # Errors
///
/// `ValidationError::UnsluggableTitle` when the title contains no ASCII
/// letters or digits after folding (e.g. "!!!" or "日本語").
///
/// # Examples
///
/// ```rust
/// use folio_core::models::slugify;
///
/// assert_eq!(slugify("Setup Guide").unwrap(), "setup-guide");
/// assert_eq!(slugify("  C++ / Rust: FAQ ").unwrap(), "c-rust-faq");
/// assert!(slugify("???").is_err());
/// ```
pub fn slugify(title: &str) -> Result<String, ValidationError> {
    static SEPARATOR_REGEX: OnceLock<Regex> = OnceLock::new();
    let separator = SEPARATOR_REGEX.get_or_init(|| Regex::new(SLUG_SEPARATOR_PATTERN).unwrap());

    let folded: String = title.chars().map(fold_diacritic).collect::<String>().to_lowercase();
    let joined = separator.replace_all(&folded, "-");
    let mut slug = joined.trim_matches('-').to_string();

    if slug.len() > MAX_SLUG_LENGTH {
        slug.truncate(MAX_SLUG_LENGTH);
        if let Some(cut) = slug.rfind('-') {
            slug.truncate(cut);
        }
        slug = slug.trim_end_matches('-').to_string();
    }

    if slug.is_empty() {
        return Err(ValidationError::UnsluggableTitle(title.to_string()));
    }

    Ok(slug)
}

fn fold_diacritic(c: char) -> char {
    match c {
        'à' | 'á' | 'â' | 'ã' | 'ä' | 'å' | 'À' | 'Á' | 'Â' | 'Ã' | 'Ä' | 'Å' => 'a',
        'ç' | 'Ç' => 'c',
        'è' | 'é' | 'ê' | 'ë' | 'È' | 'É' | 'Ê' | 'Ë' => 'e',
        'ì' | 'í' | 'î' | 'ï' | 'Ì' | 'Í' | 'Î' | 'Ï' => 'i',
        'ñ' | 'Ñ' => 'n',
        'ò' | 'ó' | 'ô' | 'õ' | 'ö' | 'ø' | 'Ò' | 'Ó' | 'Ô' | 'Õ' | 'Ö' | 'Ø' => 'o',
        'ù' | 'ú' | 'û' | 'ü' | 'Ù' | 'Ú' | 'Û' | 'Ü' => 'u',
        'ý' | 'ÿ' | 'Ý' => 'y',
        _ => c,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_basic_titles() {
        assert_eq!(slugify("Setup Guide").unwrap(), "setup-guide");
        assert_eq!(slugify("setup   guide").unwrap(), "setup-guide");
        assert_eq!(slugify("Setup-Guide!").unwrap(), "setup-guide");
        assert_eq!(slugify("Release 2.0 notes").unwrap(), "release-2-0-notes");
    }

    #[test]
    fn test_case_and_punctuation_variants_collide() {
        // Same slug means the registry will treat these as the same page
        assert_eq!(
            slugify("Setup Guide").unwrap(),
            slugify("SETUP, guide.").unwrap()
        );
    }

    #[test]
    fn test_diacritics_are_folded() {
        assert_eq!(slugify("Über uns").unwrap(), "uber-uns");
        assert_eq!(slugify("Café Menü").unwrap(), "cafe-menu");
    }

    #[test]
    fn test_unsluggable_titles_are_rejected() {
        assert!(matches!(
            slugify("!!!"),
            Err(ValidationError::UnsluggableTitle(_))
        ));
        assert!(slugify("").is_err());
        assert!(slugify("日本語").is_err());
    }

    #[test]
    fn test_long_titles_cut_at_word_boundary() {
        let title = "word ".repeat(60);
        let slug = slugify(&title).unwrap();

        assert!(slug.len() <= MAX_SLUG_LENGTH);
        assert!(!slug.ends_with('-'));
        assert!(slug.split('-').all(|w| w == "word"));
    }
}
