//! # Exposition cascade
//! Orchestrates the collaborators into one [`ExpositionJudgement`] per listing.
//!
//! States, tried in order, one way only:
//! 1. explicit text: language model (or keyword fallback). Terminal when the
//!    text confidence reaches `cascade.text_short_circuit`.
//! 2. photo analysis: brightness of up to `cascade.max_photos` photos, voted
//!    together with the text signals.
//! 3. contextual: typical orientation of the neighborhood, voted together
//!    with the text signals; kept only above `cascade.contextual_accept`
//!    once layout, floor and wording clues are added to its score.
//! 4. unknown: the text result as-is.
//!
//! Collaborator failures never escape [`ExpositionEngine::evaluate`]: they are
//! logged, counted and turned into "no new evidence" for that state.

use metrics::counter;
use tracing::{debug, info, warn};

use crate::collab::{
    CollaboratorError, Collaborators, KeywordTextAnalyzer, TextOrientationReport, ValidationStatus,
};
use crate::confidence::{self, clamp_percent, percent_from_unit};
use crate::config::EngineConfig;
use crate::extract::{extract_brightness, find_clues, find_floor, find_orientation, BrightnessReading};
use crate::judgement::{CascadeState, ExpositionJudgement, JudgementDetails, Justification, NO_INFORMATION};
use crate::listing::ListingObservation;
use crate::normalize::anon_id;
use crate::signal::{
    classify_brightness, classify_floor, classify_orientation, image_intensity, ClassifiedSignal, Orientation,
    SignalClass, SignalKind, SignalReading,
};
use crate::vote::{self, VoteOutcome};

pub const VALIDATED_BONUS: i32 = 5;
pub const CONFLICT_PENALTY: i32 = 10;

const LOG_TARGET: &str = "exposition";

/// Compared in whole percent, independent of f32 rounding.
fn reaches(confidence: f32, threshold: f32) -> bool {
    (confidence * 100.0).round() as i32 >= (threshold * 100.0).round() as i32
}

/// What the text state learned, reused by every later state.
#[derive(Debug, Clone)]
struct TextOutcome {
    report: TextOrientationReport,
    source: &'static str,
    orientation: Option<Orientation>,
    floor: Option<u8>,
    /// `[0, 1]`, after the explicit-mention boost.
    confidence: f32,
    signals: Vec<ClassifiedSignal>,
    vote: VoteOutcome,
}

impl TextOutcome {
    /// Class the text claims, compared against the photos: the explicit
    /// orientation when there is one, else the text vote.
    fn hint(&self) -> Option<SignalClass> {
        self.orientation
            .map(classify_orientation)
            .or_else(|| (!self.signals.is_empty()).then_some(self.vote.class))
    }

    /// Text signals pull towards both extremes ("nord" on a 7th floor).
    fn contradicted(&self) -> bool {
        let has = |c: SignalClass| self.signals.iter().any(|s| s.class == c);
        has(SignalClass::Lumineux) && has(SignalClass::Sombre)
    }

    fn justification(&self) -> Justification {
        let mut j = Justification::new();
        if let Some(o) = self.orientation {
            j = j.orientation(o, classify_orientation(o));
        }
        if let Some(level) = self.floor {
            j = j.floor(level, classify_floor(level));
        }
        j.view(&self.report.view_analysis).luminosity(self.report.luminosity)
    }

    /// Justification of a terminal state built from text alone: without any
    /// signal it opens with the "no information" sentence.
    fn closing_justification(&self) -> Justification {
        if self.signals.is_empty() {
            Justification::new()
                .note(NO_INFORMATION)
                .view(&self.report.view_analysis)
                .luminosity(self.report.luminosity)
        } else {
            self.justification()
        }
    }

    fn details(&self) -> JudgementDetails {
        let view = &self.report.view_analysis;
        JudgementDetails {
            orientation: self.orientation,
            floor_level: self.floor,
            text_confidence: self.confidence,
            text_source: self.source.to_string(),
            view: (view.view_found || view.kind.is_some()).then(|| view.clone()),
            luminosity: self.report.luminosity,
            ..Default::default()
        }
    }
}

fn demotion_note(j: Justification, vote: &VoteOutcome) -> Justification {
    match vote.demoted_from {
        Some(from) => j.note(format!("{from} non corroboré, ramené à Moyen")),
        None => j,
    }
}

pub struct ExpositionEngine {
    config: EngineConfig,
    collab: Collaborators,
    keywords: KeywordTextAnalyzer,
}

impl ExpositionEngine {
    pub fn new(config: EngineConfig, collaborators: Collaborators) -> Self {
        Self {
            config,
            collab: collaborators,
            keywords: KeywordTextAnalyzer::new(),
        }
    }

    /// Judge one listing. Never fails; missing evidence lowers confidence.
    pub async fn evaluate(&self, listing: &ListingObservation) -> ExpositionJudgement {
        let id = anon_id(&listing.text_fingerprint());
        let text = self.text_state(listing, &id).await;
        debug!(target: LOG_TARGET, %id, source = text.source, confidence = text.confidence, signals = text.signals.len(), "text analyzed");

        let judgement = if reaches(text.confidence, self.config.cascade.text_short_circuit) {
            self.short_circuit(&text, listing)
        } else {
            match self.photo_state(&text, listing).await {
                Ok(j) => j,
                Err(e) => {
                    self.absorb("photos", &e, &id);
                    match self.contextual_state(&text, listing) {
                        Ok(Some(j)) => j,
                        Ok(None) => self.unknown_state(&text),
                        Err(e) => {
                            self.absorb("neighborhoods", &e, &id);
                            self.unknown_state(&text)
                        }
                    }
                }
            }
        };

        counter!("exposition_cascade_total", "state" => judgement.resolved_by.as_str()).increment(1);
        info!(
            target: LOG_TARGET,
            %id,
            state = judgement.resolved_by.as_str(),
            class = %judgement.final_class,
            confidence = judgement.confidence_percent,
            "exposition judged"
        );
        judgement
    }

    fn absorb(&self, collaborator: &'static str, err: &CollaboratorError, id: &str) {
        if !err.is_failure() {
            debug!(target: LOG_TARGET, %id, collaborator, reason = %err, "state skipped");
            return;
        }
        counter!("exposition_collaborator_errors_total", "collaborator" => collaborator).increment(1);
        warn!(target: LOG_TARGET, %id, collaborator, error = %err, "collaborator failed, state skipped");
    }

    // ------------------------------------------------------------
    // 1. explicit text
    // ------------------------------------------------------------

    async fn text_state(&self, listing: &ListingObservation, id: &str) -> TextOutcome {
        let (desc, chars, floor_text) = (
            listing.description.as_str(),
            listing.characteristics.as_str(),
            listing.floor.as_str(),
        );

        let (report, source) = match self.collab.text.analyze(desc, chars, floor_text).await {
            Ok(r) if r.available => (r, self.collab.text.name()),
            Ok(_) => (self.keywords.report(desc, chars, floor_text), "keyword"),
            Err(e) => {
                self.absorb("text", &e, id);
                (self.keywords.report(desc, chars, floor_text), "keyword")
            }
        };

        let local_orientation = find_orientation(&[desc, chars]).map(|m| m.orientation);
        let local_floor = find_floor(&[floor_text, chars, desc]).map(|m| m.level);

        // a flagged false positive also silences the local extractor
        let orientation = match report.trusted_orientation() {
            Some(o) => Some(o),
            None if report.is_false_positive => None,
            None => local_orientation,
        };
        let floor = report.floor_analysis.level.or(local_floor);

        let mut confidence = report.global_confidence.clamp(0.0, 1.0);
        if !report.is_false_positive && local_orientation.is_some() && local_floor.is_some() {
            confidence = confidence.max(self.config.cascade.text_short_circuit);
        }

        let signals: Vec<ClassifiedSignal> = [
            orientation.map(|o| (SignalKind::Orientation, SignalReading::Orientation(o))),
            floor.map(|f| (SignalKind::Floor, SignalReading::Floor(f))),
        ]
        .into_iter()
        .flatten()
        .filter_map(|(kind, reading)| ClassifiedSignal::from_reading(kind, reading))
        .collect();
        let vote = vote::aggregate(&signals, None);

        TextOutcome {
            report,
            source,
            orientation,
            floor,
            confidence,
            signals,
            vote,
        }
    }

    /// Confident text. An explicit orientation decides the class unless
    /// another text signal votes the opposite extreme; then, and without an
    /// orientation, the text signals are voted. Confidence is the higher of
    /// the text confidence and the signal agreement, or the agreement alone
    /// for contradicting text. A known brightness is attached for
    /// information only.
    fn short_circuit(&self, text: &TextOutcome, listing: &ListingObservation) -> ExpositionJudgement {
        let contradicted = text.contradicted();
        let class = match text.orientation.map(classify_orientation) {
            Some(c) if !contradicted => c,
            _ => text.vote.class,
        };
        let percent = if text.signals.is_empty() {
            confidence::NO_SIGNAL_CONFIDENCE as u8
        } else if contradicted {
            confidence::compute(&text.signals, class, None)
        } else {
            percent_from_unit(text.confidence).max(confidence::compute(&text.signals, class, None))
        };

        let mut details = text.details();
        let mut justification = text.closing_justification();
        if contradicted {
            justification = demotion_note(justification.note("texte contradictoire"), &text.vote);
        }
        if let Some(value) = listing.known_brightness.filter(|v| classify_brightness(*v).is_some()) {
            details.image_brightness = Some(value);
            details.image_intensity = Some(image_intensity(value));
            justification = justification.image(value, classify_brightness(value), 0);
        }

        ExpositionJudgement::new(class, percent, &self.config.points, CascadeState::ExplicitText)
            .with_signals(text.signals.clone())
            .with_justification(justification.build())
            .with_details(details)
    }

    // ------------------------------------------------------------
    // 2. photos
    // ------------------------------------------------------------

    async fn photo_state(
        &self,
        text: &TextOutcome,
        listing: &ListingObservation,
    ) -> Result<ExpositionJudgement, CollaboratorError> {
        let max = self.config.cascade.max_photos;
        let photos = listing.photo_refs();
        // a brightness carried by the record comes from an earlier pass: 0 photos analyzed now
        let reading = match listing.known_brightness.filter(|v| classify_brightness(*v).is_some()) {
            Some(value) => BrightnessReading {
                value,
                intensity: image_intensity(value),
                photos_analyzed: 0,
                validation: ValidationStatus::assess(text.hint(), value),
            },
            None => extract_brightness(self.collab.photos.as_ref(), &photos, max, text.hint()).await?,
        };
        let image = ClassifiedSignal::from_reading(SignalKind::Image, SignalReading::ImageBrightness(reading.value))
            .ok_or(CollaboratorError::NoUsablePhoto(reading.photos_analyzed))?;

        let mut signals = text.signals.clone();
        signals.push(image);
        let vote = vote::aggregate(&signals, Some(reading.intensity));

        let mut percent = i32::from(confidence::compute(&signals, vote.class, Some(reading.intensity)));
        let mut justification = text
            .justification()
            .image(reading.value, Some(image.class), reading.photos_analyzed);
        match reading.validation {
            ValidationStatus::Validated => {
                percent += VALIDATED_BONUS;
                justification = justification.note("photos cohérentes avec le texte");
            }
            ValidationStatus::Conflict => {
                percent -= CONFLICT_PENALTY;
                justification = justification.note("photos en contradiction avec le texte");
            }
            ValidationStatus::PhotoOnly => {}
        }
        let justification = demotion_note(justification, &vote);

        let details = JudgementDetails {
            image_brightness: Some(reading.value),
            image_intensity: Some(reading.intensity),
            photos_analyzed: reading.photos_analyzed,
            validation_status: Some(reading.validation),
            ..text.details()
        };

        Ok(
            ExpositionJudgement::new(vote.class, clamp_percent(percent), &self.config.points, CascadeState::PhotoAnalysis)
                .with_signals(signals)
                .with_justification(justification.build())
                .with_details(details),
        )
    }

    // ------------------------------------------------------------
    // 3. neighborhood
    // ------------------------------------------------------------

    fn contextual_state(
        &self,
        text: &TextOutcome,
        listing: &ListingObservation,
    ) -> Result<Option<ExpositionJudgement>, CollaboratorError> {
        let haystack = format!("{} {}", listing.location, listing.description);
        let found = self.collab.neighborhoods.lookup(&haystack)?;
        let (Some(orientation), true) = (found.typical_orientation, found.found) else {
            return Ok(None);
        };

        let clues = find_clues(
            &[listing.description.as_str(), listing.characteristics.as_str()],
            text.floor,
            text.report.luminosity,
        );
        let score = found.confidence_score + clues.score_bonus();
        if score <= self.config.cascade.contextual_accept {
            debug!(target: LOG_TARGET, score, clues = clues.points, "neighborhood too uncertain");
            return Ok(None);
        }

        let Some(context) =
            ClassifiedSignal::from_reading(SignalKind::Neighborhood, SignalReading::Orientation(orientation))
        else {
            return Ok(None);
        };
        let mut signals = text.signals.clone();
        signals.push(context);
        let vote = vote::aggregate(&signals, None);
        let percent = i32::from(confidence::compute(&signals, vote.class, None)) + clues.percent_bonus();

        let name = found.name.unwrap_or_default();
        let mut justification = text.justification().neighborhood(&name, orientation, context.class);
        if !clues.is_empty() {
            justification = justification.note(format!("Indices: {}", clues.found.join(", ")));
        }
        let justification = demotion_note(justification, &vote);
        let details = JudgementDetails {
            neighborhood: Some(name),
            context_clues: clues.found,
            ..text.details()
        };

        Ok(Some(
            ExpositionJudgement::new(vote.class, clamp_percent(percent), &self.config.points, CascadeState::Contextual)
                .with_signals(signals)
                .with_justification(justification.build())
                .with_details(details),
        ))
    }

    // ------------------------------------------------------------
    // 4. unknown
    // ------------------------------------------------------------

    fn unknown_state(&self, text: &TextOutcome) -> ExpositionJudgement {
        let percent = if text.signals.is_empty() {
            confidence::NO_SIGNAL_CONFIDENCE as u8
        } else {
            percent_from_unit(text.confidence)
        };
        let justification = demotion_note(text.closing_justification(), &text.vote);
        ExpositionJudgement::new(text.vote.class, percent, &self.config.points, CascadeState::Unknown)
            .with_signals(text.signals.clone())
            .with_justification(justification.build())
            .with_details(text.details())
    }
}
