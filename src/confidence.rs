//! Confidence of a voted exposition class, in percent.
//!
//! - no signal: 50, nothing else applies
//! - one signal: 60
//! - two or more: 60, +20 per agreeing signal after the first,
//!   -15 per disagreeing signal (the first one included)
//! - image agrees with the verdict and is `Fort`: +10 once
//! - image is `Faible`: -10 once, agreeing or not
//! - result clamped to `[50, 95]`
//!
//! The deltas are empirical and uncalibrated.

use crate::signal::{ClassifiedSignal, ImageIntensity, SignalClass, SignalKind};

pub const CONFIDENCE_FLOOR: i32 = 50;
pub const CONFIDENCE_CEIL: i32 = 95;
pub const NO_SIGNAL_CONFIDENCE: i32 = 50;
pub const BASE_CONFIDENCE: i32 = 60;
pub const AGREEMENT_BONUS: i32 = 20;
pub const DISAGREEMENT_PENALTY: i32 = 15;
pub const STRONG_IMAGE_BONUS: i32 = 10;
pub const WEAK_IMAGE_PENALTY: i32 = 10;

/// Confidence for `final_class` given the signals that voted for it.
pub fn compute(
    signals: &[ClassifiedSignal],
    final_class: SignalClass,
    image_intensity: Option<ImageIntensity>,
) -> u8 {
    if signals.is_empty() {
        return clamp_percent(NO_SIGNAL_CONFIDENCE);
    }

    let mut confidence = BASE_CONFIDENCE;

    if signals.len() >= 2 {
        for (i, s) in signals.iter().enumerate() {
            if s.class == final_class {
                if i > 0 {
                    confidence += AGREEMENT_BONUS;
                }
            } else {
                confidence -= DISAGREEMENT_PENALTY;
            }
        }
    }

    let image = signals.iter().find(|s| s.kind == SignalKind::Image);
    if let (Some(img), Some(intensity)) = (image, image_intensity) {
        match intensity {
            ImageIntensity::Fort if img.class == final_class => confidence += STRONG_IMAGE_BONUS,
            ImageIntensity::Faible => confidence -= WEAK_IMAGE_PENALTY,
            _ => {}
        }
    }

    clamp_percent(confidence)
}

/// Clamp any raw percentage into `[50, 95]`.
pub fn clamp_percent(raw: i32) -> u8 {
    raw.clamp(CONFIDENCE_FLOOR, CONFIDENCE_CEIL) as u8
}

/// Convert a `[0, 1]` collaborator confidence into a clamped percentage.
pub fn percent_from_unit(unit: f32) -> u8 {
    if !unit.is_finite() {
        return clamp_percent(CONFIDENCE_FLOOR);
    }
    clamp_percent((unit * 100.0).round() as i32)
}
