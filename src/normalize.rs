//! Text normalization for French listing text.
//!
//! Listings spell the same thing many ways ("Sud-Ouest", "sud ouest",
//! "SUDOUEST", "Étage 4", "4ème étage"). Everything that matches keywords
//! goes through [`fold`] first: lowercase, diacritics stripped, every
//! non-alphanumeric run collapsed into a single space.

use sha2::{Digest, Sha256};

const COMBINING_MARKS: std::ops::RangeInclusive<char> = '\u{300}'..='\u{36f}';

/// Lowercase, strip French diacritics and collapse separators into single spaces.
pub fn fold(input: &str) -> String {
    let mut out = String::with_capacity(input.len());
    let mut last_space = true;
    for ch in input.chars() {
        for lc in ch.to_lowercase() {
            match strip_accent(lc) {
                Some(folded) => {
                    out.push_str(folded);
                    last_space = false;
                }
                // decomposed accents ("e" + U+0301) fold to the bare letter
                None if COMBINING_MARKS.contains(&lc) => {}
                None if lc.is_alphanumeric() => {
                    out.push(lc);
                    last_space = false;
                }
                None => {
                    if !last_space {
                        out.push(' ');
                        last_space = true;
                    }
                }
            }
        }
    }
    out.trim_end().to_string()
}

/// Folded tokens (see [`fold`]), in order of appearance.
pub fn tokens(input: &str) -> Vec<String> {
    fold(input).split(' ').filter(|t| !t.is_empty()).map(str::to_string).collect()
}

fn strip_accent(c: char) -> Option<&'static str> {
    let s = match c {
        'à' | 'â' | 'ä' | 'á' | 'ã' => "a",
        'ç' => "c",
        'é' | 'è' | 'ê' | 'ë' => "e",
        'î' | 'ï' | 'í' | 'ì' => "i",
        'ô' | 'ö' | 'ó' | 'ò' | 'õ' => "o",
        'ù' | 'û' | 'ü' | 'ú' => "u",
        'ÿ' => "y",
        'œ' => "oe",
        'æ' => "ae",
        // ordinal indicators ("4º étage")
        'º' | '°' => "e",
        _ => return None,
    };
    Some(s)
}

/// Short stable id for log lines; raw listing text never reaches the logs.
pub fn anon_id(text: &str) -> String {
    let mut hasher = Sha256::new();
    hasher.update(text.as_bytes());
    let digest = hasher.finalize();
    let mut out = String::with_capacity(12);
    for b in digest.iter().take(6) {
        use std::fmt::Write as _;
        let _ = write!(&mut out, "{:02x}", b);
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn folds_case_accents_and_separators() {
        assert_eq!(fold("Sud-Ouest"), "sud ouest");
        assert_eq!(fold("  SUD   ouest!! "), "sud ouest");
        assert_eq!(fold("4ème Étage"), "4eme etage");
        assert_eq!(fold("Rez-de-chaussée"), "rez de chaussee");
    }

    #[test]
    fn decomposed_accents_fold_like_composed_ones() {
        assert_eq!(fold("4e\u{300}me e\u{301}tage"), "4eme etage");
        assert_eq!(fold("Expose\u{301} plein sud"), "expose plein sud");
    }

    #[test]
    fn tokens_skip_empty_pieces() {
        assert_eq!(tokens("--Plein  Sud--"), vec!["plein", "sud"]);
        assert!(tokens("  ,; ").is_empty());
    }

    #[test]
    fn anon_id_is_short_and_stable() {
        let a = anon_id("Exposition Sud");
        assert_eq!(a.len(), 12);
        assert_eq!(a, anon_id("Exposition Sud"));
        assert_ne!(a, anon_id("Exposition Nord"));
    }
}
