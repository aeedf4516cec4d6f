//! Signals about exposition and their classification into light classes.
//!
//! Three independent readings feed the judgement: an orientation keyword,
//! a floor level, and an image brightness value. Each present reading maps
//! to exactly one [`SignalClass`], or to nothing when it can't be classified
//! (treated the same as an absent reading).

use serde::{Deserialize, Serialize};
use std::fmt;

use crate::normalize;

/// Brightness at or above this votes `Lumineux`.
pub const BRIGHTNESS_BRIGHT_MIN: f32 = 0.70;
/// Brightness at or above this (and below the bright bound) votes `Moyen`.
pub const BRIGHTNESS_MEDIUM_MIN: f32 = 0.40;
/// Brightness at or above this is a strong visual signal.
pub const INTENSITY_STRONG_HIGH: f32 = 0.85;
/// Brightness at or below this is a strong visual signal.
pub const INTENSITY_STRONG_LOW: f32 = 0.25;
/// Inclusive band around the decision boundary where brightness is ambiguous.
pub const INTENSITY_WEAK_BAND: (f32, f32) = (0.45, 0.55);

/// Floors at or above this vote `Lumineux`.
pub const FLOOR_BRIGHT_MIN: u8 = 5;
/// Floors at or above this (and below the bright bound) vote `Moyen`.
pub const FLOOR_MEDIUM_MIN: u8 = 2;

/// Light class: bright / medium / dark.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum SignalClass {
    Lumineux,
    Moyen,
    Sombre,
}

impl SignalClass {
    pub const ALL: [SignalClass; 3] = [SignalClass::Lumineux, SignalClass::Moyen, SignalClass::Sombre];

    /// `true` for the two classes that need corroboration (`Lumineux`, `Sombre`).
    pub fn is_extreme(self) -> bool {
        !matches!(self, SignalClass::Moyen)
    }

    pub fn as_str(self) -> &'static str {
        match self {
            SignalClass::Lumineux => "Lumineux",
            SignalClass::Moyen => "Moyen",
            SignalClass::Sombre => "Sombre",
        }
    }
}

impl fmt::Display for SignalClass {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Where a classified signal came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SignalKind {
    Orientation,
    Floor,
    Image,
    /// Typical orientation of the neighborhood (contextual fallback only).
    Neighborhood,
}

impl SignalKind {
    pub fn name(self) -> &'static str {
        match self {
            SignalKind::Orientation => "orientation",
            SignalKind::Floor => "etage",
            SignalKind::Image => "image",
            SignalKind::Neighborhood => "quartier",
        }
    }
}

/// How strongly an image brightness value should weigh in confidence,
/// independent of the class it voted for.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ImageIntensity {
    Fort,
    Faible,
    Normal,
}

/// Canonical compass orientations found in listings.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Orientation {
    Sud,
    SudOuest,
    SudEst,
    Est,
    Ouest,
    Nord,
    NordOuest,
    NordEst,
}

impl Orientation {
    pub fn label(self) -> &'static str {
        match self {
            Orientation::Sud => "Sud",
            Orientation::SudOuest => "Sud-Ouest",
            Orientation::SudEst => "Sud-Est",
            Orientation::Est => "Est",
            Orientation::Ouest => "Ouest",
            Orientation::Nord => "Nord",
            Orientation::NordOuest => "Nord-Ouest",
            Orientation::NordEst => "Nord-Est",
        }
    }

    /// Parse any spelling of an orientation label ("sud_ouest", "Sud-Ouest",
    /// "SUDOUEST", "ouest sud"). Unknown labels give `None`.
    pub fn parse(raw: &str) -> Option<Self> {
        let joined: String = normalize::fold(&raw.replace('_', " "))
            .chars()
            .filter(|c| !c.is_whitespace())
            .collect();
        Self::from_joined(&joined)
    }

    /// Lookup on a folded, separator-free token ("sudouest").
    pub(crate) fn from_joined(token: &str) -> Option<Self> {
        let o = match token {
            "sud" => Orientation::Sud,
            "sudouest" | "ouestsud" => Orientation::SudOuest,
            "sudest" | "estsud" => Orientation::SudEst,
            "est" | "levant" => Orientation::Est,
            "ouest" | "couchant" => Orientation::Ouest,
            "nord" => Orientation::Nord,
            "nordouest" | "ouestnord" => Orientation::NordOuest,
            "nordest" | "estnord" => Orientation::NordEst,
            _ => return None,
        };
        Some(o)
    }
}

impl fmt::Display for Orientation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

/// One raw observation about exposition.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub enum SignalReading {
    Orientation(Orientation),
    Floor(u8),
    ImageBrightness(f32),
}

impl SignalReading {
    pub fn classify(&self) -> Option<SignalClass> {
        match *self {
            SignalReading::Orientation(o) => Some(classify_orientation(o)),
            SignalReading::Floor(level) => Some(classify_floor(level)),
            SignalReading::ImageBrightness(v) => classify_brightness(v),
        }
    }
}

/// South-facing is bright, east/west medium, north-facing dark.
pub fn classify_orientation(o: Orientation) -> SignalClass {
    match o {
        Orientation::Sud | Orientation::SudOuest | Orientation::SudEst => SignalClass::Lumineux,
        Orientation::Est | Orientation::Ouest => SignalClass::Moyen,
        Orientation::Nord | Orientation::NordOuest | Orientation::NordEst => SignalClass::Sombre,
    }
}

/// Ground floor (0) and first floor are dark, 2..=4 medium, 5+ bright.
pub fn classify_floor(level: u8) -> SignalClass {
    if level >= FLOOR_BRIGHT_MIN {
        SignalClass::Lumineux
    } else if level >= FLOOR_MEDIUM_MIN {
        SignalClass::Moyen
    } else {
        SignalClass::Sombre
    }
}

/// Values outside `[0, 1]` (or NaN) are unclassifiable.
pub fn classify_brightness(value: f32) -> Option<SignalClass> {
    if !(0.0..=1.0).contains(&value) {
        return None;
    }
    let class = if value >= BRIGHTNESS_BRIGHT_MIN {
        SignalClass::Lumineux
    } else if value >= BRIGHTNESS_MEDIUM_MIN {
        SignalClass::Moyen
    } else {
        SignalClass::Sombre
    };
    Some(class)
}

pub fn image_intensity(value: f32) -> ImageIntensity {
    let (weak_lo, weak_hi) = INTENSITY_WEAK_BAND;
    if value >= INTENSITY_STRONG_HIGH || value <= INTENSITY_STRONG_LOW {
        ImageIntensity::Fort
    } else if (weak_lo..=weak_hi).contains(&value) {
        ImageIntensity::Faible
    } else {
        ImageIntensity::Normal
    }
}

/// A present, classified signal as it enters the vote.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ClassifiedSignal {
    pub kind: SignalKind,
    pub class: SignalClass,
}

impl ClassifiedSignal {
    pub fn new(kind: SignalKind, class: SignalClass) -> Self {
        Self { kind, class }
    }

    /// Classify `reading` under `kind`; unclassifiable readings give `None`.
    pub fn from_reading(kind: SignalKind, reading: SignalReading) -> Option<Self> {
        reading.classify().map(|class| Self { kind, class })
    }
}
