//! External collaborators of the exposition engine.
//!
//! The engine never talks to the network itself. It consumes three
//! collaborators through the traits below:
//! - a text analyzer (language model, or the keyword fallback),
//! - a photo brightness analyzer (vision model),
//! - a neighborhood orientation lookup (static table).
//!
//! Every collaborator failure is a [`CollaboratorError`]; the cascade
//! absorbs it and moves to its next state.

pub mod cache;
pub mod keyword;
pub mod neighborhood;
pub mod openai;

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::config::EngineConfig;
use crate::signal::{classify_brightness, Orientation, SignalClass};

pub use cache::{AnswerCache, CachedTextAnalyzer};
pub use keyword::KeywordTextAnalyzer;
pub use neighborhood::NeighborhoodTable;
pub use openai::{OpenAiTextAnalyzer, OpenAiVisionAnalyzer};

#[derive(Debug, thiserror::Error)]
pub enum CollaboratorError {
    #[error("collaborator unavailable: {0}")]
    Unavailable(String),
    /// Switched off by configuration; not a failure.
    #[error("{0} disabled")]
    Disabled(&'static str),
    #[error("http error: {0}")]
    Http(#[from] reqwest::Error),
    #[error("timed out after {0:?}")]
    Timeout(Duration),
    #[error("malformed response: {0}")]
    MalformedResponse(String),
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
    #[error("no usable photo among {0} reference(s)")]
    NoUsablePhoto(usize),
}

impl CollaboratorError {
    /// `false` for the expected "nothing to do" outcomes: a collaborator
    /// switched off by configuration, or a listing without photos.
    pub fn is_failure(&self) -> bool {
        !matches!(self, CollaboratorError::Disabled(_) | CollaboratorError::NoUsablePhoto(0))
    }
}

/// Effect of a mention on natural light.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LightImpact {
    #[serde(alias = "positif")]
    Positive,
    #[serde(alias = "neutre")]
    Neutral,
    #[serde(alias = "negatif")]
    Negative,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct FloorAnalysis {
    /// Floor as written by the analyzer ("4ème", "RDC").
    pub floor_found: Option<String>,
    pub level: Option<u8>,
    pub impact: Option<LightImpact>,
    pub confidence: f32,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ViewKind {
    Degagee,
    Panoramique,
    Correcte,
    VisAVis,
    Obstruee,
}

impl ViewKind {
    pub fn label(self) -> &'static str {
        match self {
            ViewKind::Degagee => "dégagée",
            ViewKind::Panoramique => "panoramique",
            ViewKind::Correcte => "correcte",
            ViewKind::VisAVis => "vis-à-vis",
            ViewKind::Obstruee => "obstruée",
        }
    }

    pub fn impact(self) -> LightImpact {
        match self {
            ViewKind::Degagee | ViewKind::Panoramique => LightImpact::Positive,
            ViewKind::Correcte => LightImpact::Neutral,
            ViewKind::VisAVis | ViewKind::Obstruee => LightImpact::Negative,
        }
    }
}

/// How bright the listing text says the flat is ("très lumineux", "peu lumineux").
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LuminosityLevel {
    Excellent,
    Bon,
    Moyen,
    Faible,
}

impl LuminosityLevel {
    pub fn label(self) -> &'static str {
        match self {
            LuminosityLevel::Excellent => "très lumineux",
            LuminosityLevel::Bon => "lumineux",
            LuminosityLevel::Moyen => "luminosité correcte",
            LuminosityLevel::Faible => "peu lumineux",
        }
    }

    /// Lenient parse of a level word or phrase; unknown words give `None`.
    pub fn parse(raw: &str) -> Option<Self> {
        let level = match crate::normalize::fold(raw).as_str() {
            "excellent" | "excellente" | "tres lumineux" | "tres bon" => LuminosityLevel::Excellent,
            "bon" | "bonne" | "lumineux" | "lumineuse" => LuminosityLevel::Bon,
            "moyen" | "moyenne" | "correct" | "correcte" | "luminosite correcte" => LuminosityLevel::Moyen,
            "faible" | "sombre" | "peu lumineux" | "peu lumineuse" => LuminosityLevel::Faible,
            _ => return None,
        };
        Some(level)
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ViewAnalysis {
    pub view_found: bool,
    pub kind: Option<ViewKind>,
    pub impact: Option<LightImpact>,
    pub confidence: f32,
}

/// Answer of the text analyzer.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct TextOrientationReport {
    /// `false` when the analyzer could not run; the engine then degrades to keywords.
    pub available: bool,
    pub orientation: Option<Orientation>,
    /// The analyzer saw a compass word that isn't an orientation ("sud parisien").
    pub is_false_positive: bool,
    /// Overall confidence in `[0, 1]`.
    pub global_confidence: f32,
    pub floor_analysis: FloorAnalysis,
    pub view_analysis: ViewAnalysis,
    /// Brightness wording of the text, kept for display and context clues.
    #[serde(default)]
    pub luminosity: Option<LuminosityLevel>,
    #[serde(default)]
    pub justification: String,
}

impl TextOrientationReport {
    pub fn unavailable() -> Self {
        Self::default()
    }

    /// Orientation the engine may use: absent when flagged as a false positive.
    pub fn trusted_orientation(&self) -> Option<Orientation> {
        if self.is_false_positive {
            None
        } else {
            self.orientation
        }
    }
}

/// Agreement between the photo verdict and the text verdict.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ValidationStatus {
    Validated,
    Conflict,
    /// No text verdict to compare with.
    PhotoOnly,
}

impl ValidationStatus {
    pub fn assess(text_hint: Option<SignalClass>, brightness: f32) -> Self {
        match (text_hint, classify_brightness(brightness)) {
            (Some(text), Some(image)) if text == image => ValidationStatus::Validated,
            (Some(_), Some(_)) => ValidationStatus::Conflict,
            _ => ValidationStatus::PhotoOnly,
        }
    }
}

/// Answer of the photo analyzer.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PhotoBrightnessReport {
    pub photos_analyzed: usize,
    /// Aggregated brightness in `[0, 1]`; absent when nothing was measurable.
    pub brightness_value: Option<f32>,
    pub validation_status: ValidationStatus,
}

/// Answer of the neighborhood lookup.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct NeighborhoodReport {
    pub found: bool,
    pub name: Option<String>,
    pub typical_orientation: Option<Orientation>,
    pub confidence_score: f32,
}

#[async_trait]
pub trait TextOrientationAnalyzer: Send + Sync {
    async fn analyze(
        &self,
        description: &str,
        characteristics: &str,
        floor_text: &str,
    ) -> Result<TextOrientationReport, CollaboratorError>;

    fn name(&self) -> &'static str;
}

#[async_trait]
pub trait PhotoBrightnessAnalyzer: Send + Sync {
    /// Analyze at most `max` of `photos`. `text_hint` is the text verdict, used
    /// only to compute the validation status.
    async fn analyze(
        &self,
        photos: &[String],
        max: usize,
        text_hint: Option<SignalClass>,
    ) -> Result<PhotoBrightnessReport, CollaboratorError>;

    fn name(&self) -> &'static str;
}

pub trait NeighborhoodLookup: Send + Sync {
    fn lookup(&self, text: &str) -> Result<NeighborhoodReport, CollaboratorError>;
}

pub type DynTextAnalyzer = Arc<dyn TextOrientationAnalyzer>;
pub type DynPhotoAnalyzer = Arc<dyn PhotoBrightnessAnalyzer>;
pub type DynNeighborhoodLookup = Arc<dyn NeighborhoodLookup>;

/// Text analyzer used when the language model is disabled: always reports
/// `available = false`, which makes the engine use the keyword analyzer.
pub struct DisabledTextAnalyzer;

#[async_trait]
impl TextOrientationAnalyzer for DisabledTextAnalyzer {
    async fn analyze(
        &self,
        _description: &str,
        _characteristics: &str,
        _floor_text: &str,
    ) -> Result<TextOrientationReport, CollaboratorError> {
        Ok(TextOrientationReport::unavailable())
    }

    fn name(&self) -> &'static str {
        "disabled"
    }
}

/// Photo analyzer used when vision is disabled.
pub struct DisabledPhotoAnalyzer;

#[async_trait]
impl PhotoBrightnessAnalyzer for DisabledPhotoAnalyzer {
    async fn analyze(
        &self,
        _photos: &[String],
        _max: usize,
        _text_hint: Option<SignalClass>,
    ) -> Result<PhotoBrightnessReport, CollaboratorError> {
        Err(CollaboratorError::Disabled("vision"))
    }

    fn name(&self) -> &'static str {
        "disabled"
    }
}

/// The engine's three collaborators.
#[derive(Clone)]
pub struct Collaborators {
    pub text: DynTextAnalyzer,
    pub photos: DynPhotoAnalyzer,
    pub neighborhoods: DynNeighborhoodLookup,
}

impl Collaborators {
    /// Keyword text analysis, no vision, neighborhood table from `config`.
    pub fn offline(config: &EngineConfig) -> Self {
        Self {
            text: Arc::new(DisabledTextAnalyzer),
            photos: Arc::new(DisabledPhotoAnalyzer),
            neighborhoods: Arc::new(NeighborhoodTable::from_entries(&config.neighborhoods)),
        }
    }
}

/// Factory: build collaborators according to config.
///
/// * `ai.enabled == false` → offline collaborators.
/// * otherwise OpenAI text (cached) + OpenAI vision (per-photo cache).
///
/// A provider that can't be built degrades to its disabled counterpart.
pub fn build_collaborators(config: &EngineConfig) -> Collaborators {
    let mut collab = Collaborators::offline(config);
    if !config.ai.enabled {
        return collab;
    }

    let cache = AnswerCache::new(config.ai.cache_dir.clone(), config.ai.cache_ttl_days);

    match OpenAiTextAnalyzer::new(&config.ai) {
        Ok(provider) => {
            collab.text = Arc::new(CachedTextAnalyzer::new(provider, cache.clone()));
        }
        Err(e) => tracing::warn!(target: "exposition", error = %e, "text analyzer disabled"),
    }
    match OpenAiVisionAnalyzer::new(&config.ai, Some(cache)) {
        Ok(provider) => collab.photos = Arc::new(provider),
        Err(e) => tracing::warn!(target: "exposition", error = %e, "vision analyzer disabled"),
    }
    collab
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn validation_status_compares_classes() {
        assert_eq!(
            ValidationStatus::assess(Some(SignalClass::Lumineux), 0.9),
            ValidationStatus::Validated
        );
        assert_eq!(
            ValidationStatus::assess(Some(SignalClass::Sombre), 0.82),
            ValidationStatus::Conflict
        );
        assert_eq!(ValidationStatus::assess(None, 0.5), ValidationStatus::PhotoOnly);
    }

    #[test]
    fn false_positive_orientation_is_not_trusted() {
        let report = TextOrientationReport {
            available: true,
            orientation: Some(Orientation::Sud),
            is_false_positive: true,
            ..Default::default()
        };
        assert_eq!(report.trusted_orientation(), None);
    }

    #[test]
    fn disabled_and_photoless_are_not_failures() {
        assert!(!CollaboratorError::Disabled("vision").is_failure());
        assert!(!CollaboratorError::NoUsablePhoto(0).is_failure());
        assert!(CollaboratorError::NoUsablePhoto(3).is_failure());
        assert!(CollaboratorError::Unavailable("openai returned 503".into()).is_failure());
    }

    #[test]
    fn luminosity_words() {
        assert_eq!(LuminosityLevel::parse("Très lumineux"), Some(LuminosityLevel::Excellent));
        assert_eq!(LuminosityLevel::parse("bonne"), Some(LuminosityLevel::Bon));
        assert_eq!(LuminosityLevel::parse("sombre"), Some(LuminosityLevel::Faible));
        assert_eq!(LuminosityLevel::parse("null"), None);
    }

    #[tokio::test]
    async fn disabled_collaborators_degrade_cleanly() {
        let text = DisabledTextAnalyzer.analyze("Exposition Sud", "", "").await.unwrap();
        assert!(!text.available);
        let photos = DisabledPhotoAnalyzer
            .analyze(&["a.jpg".to_string()], 5, None)
            .await;
        assert!(matches!(photos, Err(CollaboratorError::Disabled("vision"))));
    }
}
