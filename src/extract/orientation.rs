//! Explicit compass mentions in listing text.
//!
//! Matching runs on folded tokens (see [`crate::normalize`]), so case,
//! accents and separators never matter and substrings never match
//! ("estimation", "sudiste" are ignored). Compounds are resolved before
//! simple directions: "sud ouest", "sud-ouest" and "sudouest" all give
//! `SudOuest`.
//!
//! Known limitation: the first mention wins, conflicting mentions are not
//! reconciled.

use serde::{Deserialize, Serialize};

use crate::normalize;
use crate::signal::Orientation;

/// Words that make a following bare "est" an orientation rather than the verb.
const ORIENTATION_CUES: &[&str] = &[
    "exposition",
    "expose",
    "exposee",
    "exposes",
    "orientation",
    "oriente",
    "orientee",
    "plein",
    "face",
    "cote",
];

/// "sud parisien", "nord de paris" are places, not orientations.
const PLACE_SUFFIXES: &[&str] = &["parisien", "parisienne", "francilien", "francilienne"];

/// A matched orientation and the keyword(s) that produced it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OrientationMatch {
    pub orientation: Orientation,
    pub keyword: String,
}

/// First explicit orientation across `texts`, scanned in order.
pub fn find_orientation(texts: &[&str]) -> Option<OrientationMatch> {
    texts.iter().find_map(|t| scan(&normalize::tokens(t)))
}

fn scan(tokens: &[String]) -> Option<OrientationMatch> {
    let mut i = 0;
    while i < tokens.len() {
        let tok = tokens[i].as_str();
        let Some(first) = Orientation::from_joined(tok) else {
            i += 1;
            continue;
        };

        if is_place_name(tokens, i) {
            i += 1;
            continue;
        }

        // "sud ouest" / "ouest sud" written as two words
        if let Some(next) = tokens.get(i + 1) {
            if is_cardinal_word(tok) && is_cardinal_word(next) {
                if let Some(compound) = Orientation::from_joined(next).and_then(|b| compose(first, b)) {
                    return Some(OrientationMatch {
                        orientation: compound,
                        keyword: format!("{tok} {next}"),
                    });
                }
            }
        }

        if tok == "est" && !has_cue_before(tokens, i) {
            i += 1;
            continue;
        }

        return Some(OrientationMatch {
            orientation: first,
            keyword: tok.to_string(),
        });
    }
    None
}

fn is_cardinal_word(tok: &str) -> bool {
    matches!(tok, "sud" | "nord" | "est" | "ouest")
}

fn compose(a: Orientation, b: Orientation) -> Option<Orientation> {
    use Orientation::*;
    let o = match (a, b) {
        (Sud, Ouest) | (Ouest, Sud) => SudOuest,
        (Sud, Est) | (Est, Sud) => SudEst,
        (Nord, Ouest) | (Ouest, Nord) => NordOuest,
        (Nord, Est) | (Est, Nord) => NordEst,
        _ => return None,
    };
    Some(o)
}

fn has_cue_before(tokens: &[String], i: usize) -> bool {
    tokens[i.saturating_sub(2)..i]
        .iter()
        .any(|t| ORIENTATION_CUES.contains(&t.as_str()))
}

fn is_place_name(tokens: &[String], i: usize) -> bool {
    match tokens.get(i + 1).map(String::as_str) {
        Some(next) if PLACE_SUFFIXES.contains(&next) => true,
        Some("de") => tokens.get(i + 2).map(String::as_str) == Some("paris"),
        _ => false,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn found(text: &str) -> Option<Orientation> {
        find_orientation(&[text]).map(|m| m.orientation)
    }

    #[test]
    fn separators_case_and_accents_do_not_matter() {
        for text in ["Exposition Sud-Ouest", "exposé sud ouest", "SUDOUEST", "Sud Ouest !"] {
            assert_eq!(found(text), Some(Orientation::SudOuest), "{text}");
        }
    }

    #[test]
    fn simple_directions_and_synonyms() {
        assert_eq!(found("Plein sud, très calme"), Some(Orientation::Sud));
        assert_eq!(found("séjour au nord"), Some(Orientation::Nord));
        assert_eq!(found("vue sur le couchant"), Some(Orientation::Ouest));
        assert_eq!(found("chambre côté levant"), Some(Orientation::Est));
        assert_eq!(found("Ouest-Nord"), Some(Orientation::NordOuest));
    }

    #[test]
    fn bare_est_needs_an_orientation_cue() {
        assert_eq!(found("L'appartement est lumineux"), None);
        assert_eq!(found("Exposition est, au calme"), Some(Orientation::Est));
        assert_eq!(found("orienté Est"), Some(Orientation::Est));
    }

    #[test]
    fn substrings_and_place_names_are_ignored() {
        assert_eq!(found("estimation gratuite, sudiste"), None);
        assert_eq!(found("dans le sud parisien"), None);
        assert_eq!(found("au nord de Paris, exposition ouest"), Some(Orientation::Ouest));
    }

    #[test]
    fn first_mention_wins_and_texts_are_scanned_in_order() {
        assert_eq!(found("exposition nord, salon plein sud"), Some(Orientation::Nord));
        let m = find_orientation(&["rien ici", "Double exposition Sud-Est"]).unwrap();
        assert_eq!(m.orientation, Orientation::SudEst);
        assert_eq!(m.keyword, "sud est");
    }
}
