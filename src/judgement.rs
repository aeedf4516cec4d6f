//! Output record of one exposition evaluation.
//!
//! Built once per listing by the cascade, never mutated afterwards. Consumed
//! by the aggregate scorer (`numeric_score`, `tier`) and the display layer.

use serde::{Deserialize, Serialize};

use crate::collab::{LightImpact, LuminosityLevel, ValidationStatus, ViewAnalysis};
use crate::config::TierPoints;
use crate::signal::{ClassifiedSignal, ImageIntensity, Orientation, SignalClass};

pub const NO_INFORMATION: &str = "Aucune information disponible sur l'exposition";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Tier {
    Tier1,
    Tier2,
    Tier3,
}

impl Tier {
    /// Total mapping: Lumineux → tier1, Moyen → tier2, Sombre → tier3.
    pub fn from_class(class: SignalClass) -> Self {
        match class {
            SignalClass::Lumineux => Tier::Tier1,
            SignalClass::Moyen => Tier::Tier2,
            SignalClass::Sombre => Tier::Tier3,
        }
    }

    pub fn points(self, points: &TierPoints) -> i32 {
        match self {
            Tier::Tier1 => points.tier1,
            Tier::Tier2 => points.tier2,
            Tier::Tier3 => points.tier3,
        }
    }
}

/// Cascade state that produced the judgement.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CascadeState {
    ExplicitText,
    PhotoAnalysis,
    Contextual,
    /// Not enough evidence; the text result is returned as-is.
    Unknown,
}

impl CascadeState {
    pub fn as_str(self) -> &'static str {
        match self {
            CascadeState::ExplicitText => "explicit_text",
            CascadeState::PhotoAnalysis => "photo_analysis",
            CascadeState::Contextual => "contextual",
            CascadeState::Unknown => "unknown",
        }
    }
}

/// Raw evidence behind a judgement, for display and audits.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct JudgementDetails {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub orientation: Option<Orientation>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub floor_level: Option<u8>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub image_brightness: Option<f32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub image_intensity: Option<ImageIntensity>,
    pub photos_analyzed: usize,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub validation_status: Option<ValidationStatus>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub neighborhood: Option<String>,
    /// Text analyzer confidence in `[0, 1]`, after the explicit-mention boost.
    pub text_confidence: f32,
    /// `"openai"`, `"keyword"`, ...
    pub text_source: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub view: Option<ViewAnalysis>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub luminosity: Option<LuminosityLevel>,
    /// Clues that backed a neighborhood guess ("balcon", "4e étage").
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub context_clues: Vec<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ExpositionJudgement {
    pub final_class: SignalClass,
    pub numeric_score: i32,
    pub tier: Tier,
    /// Always within `[50, 95]`.
    pub confidence_percent: u8,
    pub justification: String,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub contributing_signals: Vec<ClassifiedSignal>,
    pub resolved_by: CascadeState,
    #[serde(default)]
    pub details: JudgementDetails,
}

impl ExpositionJudgement {
    /// Skeleton judgement: tier and score follow from `class`.
    pub fn new(class: SignalClass, confidence_percent: u8, points: &TierPoints, state: CascadeState) -> Self {
        let tier = Tier::from_class(class);
        Self {
            final_class: class,
            numeric_score: tier.points(points),
            tier,
            confidence_percent: crate::confidence::clamp_percent(i32::from(confidence_percent)),
            justification: NO_INFORMATION.to_string(),
            contributing_signals: Vec::new(),
            resolved_by: state,
            details: JudgementDetails::default(),
        }
    }

    pub fn with_signals(mut self, signals: Vec<ClassifiedSignal>) -> Self {
        self.contributing_signals = signals;
        self
    }

    pub fn with_justification(mut self, text: impl Into<String>) -> Self {
        self.justification = text.into();
        self
    }

    pub fn with_details(mut self, details: JudgementDetails) -> Self {
        self.details = details;
        self
    }
}

/// "RDC", "1er étage", "4e étage".
pub fn floor_label(level: u8) -> String {
    match level {
        0 => "RDC".to_string(),
        1 => "1er étage".to_string(),
        n => format!("{n}e étage"),
    }
}

/// Human-readable trail of which signals fired, joined with " · ".
#[derive(Debug, Default)]
pub struct Justification {
    parts: Vec<String>,
}

impl Justification {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn orientation(mut self, o: Orientation, class: SignalClass) -> Self {
        self.parts.push(format!("Exposition {o} ({class})"));
        self
    }

    pub fn floor(mut self, level: u8, class: SignalClass) -> Self {
        self.parts.push(format!("{} ({class})", floor_label(level)));
        self
    }

    /// `photos == 0` means the value comes from an earlier photo pass.
    pub fn image(mut self, value: f32, class: Option<SignalClass>, photos: usize) -> Self {
        let source = if photos == 0 {
            "analyse antérieure".to_string()
        } else {
            format!("sur {photos} photo(s)")
        };
        match class {
            Some(c) => self.parts.push(format!("Luminosité photos {value:.2} {source} ({c})")),
            None => self.parts.push(format!("Luminosité photos {value:.2} {source}")),
        }
        self
    }

    pub fn neighborhood(mut self, name: &str, o: Orientation, class: SignalClass) -> Self {
        self.parts.push(format!("Quartier {name}: orientation typique {o} ({class})"));
        self
    }

    pub fn view(mut self, view: &ViewAnalysis) -> Self {
        let Some(kind) = view.kind else { return self };
        let effect = match view.impact {
            Some(LightImpact::Positive) => " (+)",
            Some(LightImpact::Negative) => " (-)",
            _ => "",
        };
        self.parts.push(format!("Vue {}{effect}", kind.label()));
        self
    }

    pub fn luminosity(mut self, level: Option<LuminosityLevel>) -> Self {
        if let Some(level) = level {
            self.parts.push(format!("Annonce: {}", level.label()));
        }
        self
    }

    pub fn note(mut self, text: impl Into<String>) -> Self {
        self.parts.push(text.into());
        self
    }

    pub fn is_empty(&self) -> bool {
        self.parts.is_empty()
    }

    pub fn build(self) -> String {
        if self.parts.is_empty() {
            NO_INFORMATION.to_string()
        } else {
            self.parts.join(" · ")
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::signal::SignalKind;
    use serde_json::json;

    #[test]
    fn tier_and_points_follow_class() {
        let pts = TierPoints::default();
        let j = ExpositionJudgement::new(SignalClass::Lumineux, 80, &pts, CascadeState::PhotoAnalysis);
        assert_eq!(j.tier, Tier::Tier1);
        assert_eq!(j.numeric_score, 20);
        let j = ExpositionJudgement::new(SignalClass::Moyen, 50, &pts, CascadeState::Unknown);
        assert_eq!((j.tier, j.numeric_score), (Tier::Tier2, 10));
        let j = ExpositionJudgement::new(SignalClass::Sombre, 99, &pts, CascadeState::Contextual);
        assert_eq!((j.tier, j.numeric_score, j.confidence_percent), (Tier::Tier3, 0, 95));
    }

    #[test]
    fn serialized_shape() {
        let pts = TierPoints::default();
        let j = ExpositionJudgement::new(SignalClass::Lumineux, 80, &pts, CascadeState::ExplicitText)
            .with_signals(vec![ClassifiedSignal::new(SignalKind::Orientation, SignalClass::Lumineux)])
            .with_justification("Exposition Sud (Lumineux)");
        let v = serde_json::to_value(&j).unwrap();
        assert_eq!(v["final_class"], json!("Lumineux"));
        assert_eq!(v["tier"], json!("tier1"));
        assert_eq!(v["resolved_by"], json!("explicit_text"));
        assert_eq!(v["contributing_signals"][0]["kind"], json!("orientation"));
    }

    #[test]
    fn justification_trail() {
        let text = Justification::new()
            .orientation(Orientation::Sud, SignalClass::Lumineux)
            .floor(4, SignalClass::Moyen)
            .build();
        assert_eq!(text, "Exposition Sud (Lumineux) · 4e étage (Moyen)");
        assert_eq!(Justification::new().build(), NO_INFORMATION);
        assert_eq!(floor_label(0), "RDC");
        assert_eq!(floor_label(1), "1er étage");
    }

    #[test]
    fn image_from_an_earlier_pass_is_labelled() {
        let text = Justification::new().image(0.9, Some(SignalClass::Lumineux), 0).build();
        assert_eq!(text, "Luminosité photos 0.90 analyse antérieure (Lumineux)");
        let text = Justification::new().image(0.3, None, 3).build();
        assert_eq!(text, "Luminosité photos 0.30 sur 3 photo(s)");
    }
}
