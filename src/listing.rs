//! Raw listing record as supplied by the scraper.

use serde::{Deserialize, Serialize};

/// Everything the exposition engine may look at for one listing.
/// Read-only for the duration of one evaluation.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ListingObservation {
    #[serde(default)]
    pub description: String,
    /// Free-text "characteristics" block ("Balcon, Ascenseur, Étage 4ème étage").
    #[serde(default, alias = "caracteristiques")]
    pub characteristics: String,
    /// Floor label as scraped ("4ème étage", "RDC"), may be empty.
    #[serde(default, alias = "etage")]
    pub floor: String,
    /// Neighborhood / address line, used by the contextual fallback.
    #[serde(default, alias = "localisation")]
    pub location: String,
    /// Photo URLs or local paths, in listing order.
    #[serde(default)]
    pub photos: Vec<PhotoRef>,
    /// Brightness measured by an earlier photo pass, if the record carries one.
    #[serde(default, alias = "brightness_value", skip_serializing_if = "Option::is_none")]
    pub known_brightness: Option<f32>,
}

/// Scrapers store photos either as a bare string or as `{ "url": ... }`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum PhotoRef {
    Plain(String),
    Object { url: String },
}

impl PhotoRef {
    pub fn as_str(&self) -> &str {
        match self {
            PhotoRef::Plain(s) => s,
            PhotoRef::Object { url } => url,
        }
    }
}

impl From<&str> for PhotoRef {
    fn from(value: &str) -> Self {
        PhotoRef::Plain(value.to_string())
    }
}

impl ListingObservation {
    pub fn new(description: impl Into<String>) -> Self {
        Self {
            description: description.into(),
            ..Default::default()
        }
    }

    pub fn with_characteristics(mut self, text: impl Into<String>) -> Self {
        self.characteristics = text.into();
        self
    }

    pub fn with_floor(mut self, text: impl Into<String>) -> Self {
        self.floor = text.into();
        self
    }

    pub fn with_location(mut self, text: impl Into<String>) -> Self {
        self.location = text.into();
        self
    }

    pub fn with_photos<I, P>(mut self, photos: I) -> Self
    where
        I: IntoIterator<Item = P>,
        P: Into<PhotoRef>,
    {
        self.photos = photos.into_iter().map(Into::into).collect();
        self
    }

    /// Non-empty photo references, in order.
    pub fn photo_refs(&self) -> Vec<String> {
        self.photos
            .iter()
            .map(|p| p.as_str().trim())
            .filter(|p| !p.is_empty())
            .map(str::to_string)
            .collect()
    }

    /// Stable text used for log ids and cache keys.
    pub fn text_fingerprint(&self) -> String {
        format!("{}\n{}\n{}", self.description, self.characteristics, self.floor)
    }
}
