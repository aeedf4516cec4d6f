//! Image brightness reading, delegated to the photo collaborator.

use serde::{Deserialize, Serialize};

use crate::collab::{CollaboratorError, PhotoBrightnessAnalyzer, ValidationStatus};
use crate::signal::{image_intensity, ImageIntensity, SignalClass};

/// A usable brightness measurement.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct BrightnessReading {
    pub value: f32,
    pub intensity: ImageIntensity,
    pub photos_analyzed: usize,
    pub validation: ValidationStatus,
}

/// Ask the collaborator for the brightness of up to `max` photos.
///
/// No photos, nothing analyzed, a missing or out-of-range value all come
/// back as `NoUsablePhoto`: the signal is absent, never fabricated.
pub async fn extract_brightness(
    analyzer: &dyn PhotoBrightnessAnalyzer,
    photos: &[String],
    max: usize,
    text_hint: Option<SignalClass>,
) -> Result<BrightnessReading, CollaboratorError> {
    if photos.is_empty() || max == 0 {
        return Err(CollaboratorError::NoUsablePhoto(0));
    }
    let capped = &photos[..photos.len().min(max)];
    let report = analyzer.analyze(capped, max, text_hint).await?;

    match report.brightness_value {
        Some(value) if report.photos_analyzed > 0 && (0.0..=1.0).contains(&value) => {
            Ok(BrightnessReading {
                value,
                intensity: image_intensity(value),
                photos_analyzed: report.photos_analyzed,
                validation: report.validation_status,
            })
        }
        _ => Err(CollaboratorError::NoUsablePhoto(capped.len())),
    }
}
