//! Naive keyword text analyzer.
//!
//! Used when the language model is disabled or fails. Produces the same
//! report shape from the local extractors plus a handful of view phrases.

use async_trait::async_trait;

use super::{
    CollaboratorError, FloorAnalysis, LightImpact, LuminosityLevel, TextOrientationAnalyzer,
    TextOrientationReport, ViewAnalysis, ViewKind,
};
use crate::extract::{find_floor, find_orientation};
use crate::normalize;

// Confidence in hundredths, summed as integers.
const BASE_POINTS: u8 = 30;
const ORIENTATION_POINTS: u8 = 30;
const FLOOR_POINTS: u8 = 10;
/// Only counted together with a floor; an orientation alone stays at 0.60.
const CLEAR_VIEW_POINTS: u8 = 10;
const MAX_POINTS: u8 = 90;

/// Folded phrases, checked in order; the first hit decides the view.
const VIEW_PHRASES: &[(&str, ViewKind)] = &[
    ("pas de vis a vis", ViewKind::Degagee),
    ("sans vis a vis", ViewKind::Degagee),
    ("vue panoramique", ViewKind::Panoramique),
    ("vue imprenable", ViewKind::Panoramique),
    ("vue degagee", ViewKind::Degagee),
    ("vue sur parc", ViewKind::Degagee),
    ("vue obstruee", ViewKind::Obstruee),
    ("pas de vue", ViewKind::Obstruee),
    ("vis a vis", ViewKind::VisAVis),
];

/// Folded phrases per level. Checked in this order so that "tres lumineux",
/// "peu lumineux" and "assez lumineux" win over the bare "lumineux".
const LUMINOSITY_PHRASES: &[(LuminosityLevel, &[&str])] = &[
    (
        LuminosityLevel::Excellent,
        &["tres lumineux", "tres lumineuse", "tres clair", "tres claire", "plein de lumiere", "tres ensoleille", "lumineux toute la journee"],
    ),
    (
        LuminosityLevel::Faible,
        &["peu lumineux", "peu lumineuse", "peu eclaire", "manque de lumiere", "sombre"],
    ),
    (
        LuminosityLevel::Moyen,
        &["assez lumineux", "assez lumineuse", "correctement eclaire", "luminosite correcte"],
    ),
    (
        LuminosityLevel::Bon,
        &["lumineux", "lumineuse", "clair", "claire", "bien eclaire", "ensoleille", "ensoleillee", "bien expose"],
    ),
];

#[derive(Debug, Clone, Copy, Default)]
pub struct KeywordTextAnalyzer;

impl KeywordTextAnalyzer {
    pub fn new() -> Self {
        Self
    }

    /// Synchronous core, also used directly by the engine as the fallback.
    pub fn report(&self, description: &str, characteristics: &str, floor_text: &str) -> TextOrientationReport {
        let orientation = find_orientation(&[description, characteristics]);
        let floor = find_floor(&[floor_text, characteristics, description]);
        let view = detect_view(&[description, characteristics]);
        let luminosity = detect_luminosity(&[description, characteristics]);

        let mut points = BASE_POINTS;
        let mut why = Vec::new();
        if let Some(m) = &orientation {
            points += ORIENTATION_POINTS;
            why.push(format!("mot-clé « {} »", m.keyword));
        }
        if let Some(f) = &floor {
            points += FLOOR_POINTS;
            why.push(format!("étage « {} »", f.raw));
            if view.impact == Some(LightImpact::Positive) {
                points += CLEAR_VIEW_POINTS;
            }
        }
        if let Some(kind) = view.kind {
            why.push(format!("vue {}", kind.label()));
        }
        if let Some(level) = luminosity {
            why.push(level.label().to_string());
        }

        TextOrientationReport {
            available: true,
            orientation: orientation.map(|m| m.orientation),
            is_false_positive: false,
            global_confidence: f32::from(points.min(MAX_POINTS)) / 100.0,
            floor_analysis: FloorAnalysis {
                floor_found: floor.as_ref().map(|f| f.raw.clone()),
                level: floor.as_ref().map(|f| f.level),
                impact: floor.as_ref().map(|f| floor_impact(f.level)),
                confidence: if floor.is_some() { 0.8 } else { 0.0 },
            },
            view_analysis: view,
            luminosity,
            justification: why.join(", "),
        }
    }
}

fn floor_impact(level: u8) -> LightImpact {
    match level {
        0 | 1 => LightImpact::Negative,
        2..=4 => LightImpact::Neutral,
        _ => LightImpact::Positive,
    }
}

fn detect_view(texts: &[&str]) -> ViewAnalysis {
    for text in texts {
        let padded = format!(" {} ", normalize::fold(text));
        for (phrase, kind) in VIEW_PHRASES {
            if padded.contains(&format!(" {phrase} ")) {
                return ViewAnalysis {
                    view_found: true,
                    kind: Some(*kind),
                    impact: Some(kind.impact()),
                    confidence: 0.6,
                };
            }
        }
    }
    ViewAnalysis::default()
}

fn detect_luminosity(texts: &[&str]) -> Option<LuminosityLevel> {
    let padded: Vec<String> = texts.iter().map(|t| format!(" {} ", normalize::fold(t))).collect();
    LUMINOSITY_PHRASES.iter().find_map(|(level, phrases)| {
        phrases
            .iter()
            .any(|p| padded.iter().any(|t| t.contains(&format!(" {p} "))))
            .then_some(*level)
    })
}

#[async_trait]
impl TextOrientationAnalyzer for KeywordTextAnalyzer {
    async fn analyze(
        &self,
        description: &str,
        characteristics: &str,
        floor_text: &str,
    ) -> Result<TextOrientationReport, CollaboratorError> {
        Ok(self.report(description, characteristics, floor_text))
    }

    fn name(&self) -> &'static str {
        "keyword"
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::signal::Orientation;

    fn approx(a: f32, b: f32) -> bool {
        (a - b).abs() < 1e-5
    }

    #[test]
    fn confidence_steps() {
        let k = KeywordTextAnalyzer::new();
        assert!(approx(k.report("", "", "").global_confidence, 0.30));

        let r = k.report("Exposition Sud", "", "");
        assert_eq!(r.orientation, Some(Orientation::Sud));
        assert!(approx(r.global_confidence, 0.60));

        let r = k.report("Exposition Sud, vue dégagée", "", "4ème étage");
        assert_eq!(r.floor_analysis.level, Some(4));
        assert!(approx(r.global_confidence, 0.80));
    }

    #[test]
    fn orientation_with_clear_view_stays_below_short_circuit() {
        let k = KeywordTextAnalyzer::new();
        let r = k.report("Exposition nord, vue dégagée", "", "");
        assert!(approx(r.global_confidence, 0.60));
        assert!(r.global_confidence < 0.70);

        let r = k.report("Exposition nord, vue dégagée", "", "3ème étage");
        assert!(approx(r.global_confidence, 0.80));
    }

    #[test]
    fn luminosity_levels_prefer_the_qualified_phrase() {
        let k = KeywordTextAnalyzer::new();
        assert_eq!(k.report("Appartement très lumineux", "", "").luminosity, Some(LuminosityLevel::Excellent));
        assert_eq!(k.report("Séjour peu lumineux", "", "").luminosity, Some(LuminosityLevel::Faible));
        assert_eq!(k.report("Assez lumineux", "", "").luminosity, Some(LuminosityLevel::Moyen));
        assert_eq!(k.report("", "Lumineux, calme", "").luminosity, Some(LuminosityLevel::Bon));
        assert_eq!(k.report("Rez-de-chaussée sombre", "", "").luminosity, Some(LuminosityLevel::Faible));
        assert_eq!(k.report("Proche métro", "", "").luminosity, None);
    }

    #[test]
    fn vis_a_vis_is_negated_by_pas_de() {
        let k = KeywordTextAnalyzer::new();
        let clear = k.report("Séjour lumineux, pas de vis-à-vis", "", "");
        assert_eq!(clear.view_analysis.kind, Some(ViewKind::Degagee));
        assert_eq!(clear.view_analysis.impact, Some(LightImpact::Positive));

        let facing = k.report("Studio sur cour, vis-à-vis", "", "");
        assert_eq!(facing.view_analysis.kind, Some(ViewKind::VisAVis));
        assert!(approx(facing.global_confidence, 0.30));
    }

    #[test]
    fn floor_label_wins_over_description() {
        let r = KeywordTextAnalyzer.report("Au 2ème étage", "", "RDC");
        assert_eq!(r.floor_analysis.level, Some(0));
        assert_eq!(r.floor_analysis.impact, Some(LightImpact::Negative));
    }
}
