//! Contextual clues that strengthen a neighborhood guess.
//!
//! Outdoor spaces and open layouts ("balcon", "duplex"), a good floor and
//! brightness wording each add points. Points raise the neighborhood score
//! before it is compared to `cascade.contextual_accept`, and add a small
//! bonus to the contextual confidence.

use serde::{Deserialize, Serialize};

use crate::collab::LuminosityLevel;
use crate::judgement::floor_label;
use crate::normalize;

/// Neighborhood score added per clue point.
pub const SCORE_PER_POINT: f32 = 0.05;
/// Confidence percent added per clue point, capped at [`MAX_PERCENT_BONUS`].
pub const PERCENT_PER_POINT: i32 = 2;
pub const MAX_PERCENT_BONUS: i32 = 10;

/// Folded phrases and their points.
const LAYOUT_CLUES: &[(&str, u8)] = &[
    ("duplex", 2),
    ("cuisine americaine", 2),
    ("cuisine ouverte", 2),
    ("balcon", 1),
    ("terrasse", 1),
    ("jardin", 1),
    ("spacieux", 1),
    ("grand salon", 1),
];

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ContextClues {
    /// Human-readable clue names, in detection order.
    pub found: Vec<String>,
    pub points: u8,
}

impl ContextClues {
    pub fn is_empty(&self) -> bool {
        self.found.is_empty()
    }

    pub fn score_bonus(&self) -> f32 {
        f32::from(self.points) * SCORE_PER_POINT
    }

    pub fn percent_bonus(&self) -> i32 {
        (i32::from(self.points) * PERCENT_PER_POINT).min(MAX_PERCENT_BONUS)
    }

    fn add(&mut self, name: impl Into<String>, points: u8) {
        if points > 0 {
            self.found.push(name.into());
            self.points = self.points.saturating_add(points);
        }
    }
}

/// Middle floors are the best compromise; 2nd and 6th count a little.
fn floor_points(level: u8) -> u8 {
    match level {
        3..=5 => 2,
        2 | 6 => 1,
        _ => 0,
    }
}

fn luminosity_points(level: LuminosityLevel) -> u8 {
    match level {
        LuminosityLevel::Excellent => 3,
        LuminosityLevel::Bon => 2,
        LuminosityLevel::Moyen => 1,
        LuminosityLevel::Faible => 0,
    }
}

pub fn find_clues(texts: &[&str], floor: Option<u8>, luminosity: Option<LuminosityLevel>) -> ContextClues {
    let padded: Vec<String> = texts.iter().map(|t| format!(" {} ", normalize::fold(t))).collect();
    let mut clues = ContextClues::default();

    for (phrase, points) in LAYOUT_CLUES {
        let needle = format!(" {phrase} ");
        if padded.iter().any(|t| t.contains(&needle)) {
            clues.add(*phrase, *points);
        }
    }
    if let Some(level) = floor {
        clues.add(floor_label(level), floor_points(level));
    }
    if let Some(level) = luminosity {
        clues.add(level.label(), luminosity_points(level));
    }
    clues
}
