//! Floor level parsing from French listing text.
//!
//! Recognized shapes (after folding): "4eme etage", "1er etage", "4e etage",
//! "etage 4", "etage4eme" (scraper artefact), "rdc", "rez de chaussee" (= 0).
//! "sur 2 etages" describes a duplex, not a level, and is not matched.

use once_cell::sync::Lazy;
use regex::Regex;
use serde::{Deserialize, Serialize};

use crate::normalize;

static FLOOR_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(
        r"\b(?:rdc|rez de chaussee)\b|\b(\d{1,2})\s*(?:er|ere|re|eme|em|ieme|e)?\s*etage\b|\betage\s*(\d{1,2})",
    )
    .expect("floor regex")
});

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FloorMatch {
    pub level: u8,
    /// Folded text that produced the match.
    pub raw: String,
}

/// First floor mention across `texts`, scanned in order; within one text the
/// leftmost mention wins.
pub fn find_floor(texts: &[&str]) -> Option<FloorMatch> {
    texts.iter().find_map(|t| parse_floor(t))
}

/// Parse a single text. `None` when no floor-like mention is found.
pub fn parse_floor(text: &str) -> Option<FloorMatch> {
    let folded = normalize::fold(text);
    let caps = FLOOR_RE.captures(&folded)?;
    let raw = caps.get(0)?.as_str().to_string();
    let level = match caps.get(1).or_else(|| caps.get(2)) {
        Some(num) => num.as_str().parse::<u8>().ok()?,
        None => 0,
    };
    Some(FloorMatch { level, raw })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn level(text: &str) -> Option<u8> {
        parse_floor(text).map(|m| m.level)
    }

    #[test]
    fn ordinal_shapes() {
        assert_eq!(level("Appartement au 4ème étage avec ascenseur"), Some(4));
        assert_eq!(level("1er étage sur cour"), Some(1));
        assert_eq!(level("situé au 6e étage"), Some(6));
        assert_eq!(level("Étage : 3"), Some(3));
        assert_eq!(level("Étage4ème étage"), Some(4));
    }

    #[test]
    fn decomposed_accents() {
        assert_eq!(level("4e\u{300}me e\u{301}tage"), Some(4));
        assert_eq!(level("Rez-de-chausse\u{301}e"), Some(0));
    }

    #[test]
    fn ground_floor_is_zero() {
        assert_eq!(level("RDC sur jardin"), Some(0));
        assert_eq!(level("Rez-de-chaussée"), Some(0));
    }

    #[test]
    fn unparseable_or_unrelated_text() {
        assert_eq!(level("Dernier étage"), None);
        assert_eq!(level("Duplex sur 2 étages, 3 pièces"), None);
        assert_eq!(level(""), None);
    }

    #[test]
    fn first_mention_wins() {
        assert_eq!(level("2ème étage (annonce: 5ème étage)"), Some(2));
        let m = find_floor(&["", "Balcon", "au 7e étage"]).unwrap();
        assert_eq!(m.level, 7);
        assert_eq!(m.raw, "7e etage");
    }
}
