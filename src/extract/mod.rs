//! Signal extractors: pull raw readings out of listing text and the photo collaborator,
//! plus the contextual clues used by the neighborhood fallback.

pub mod brightness;
pub mod clues;
pub mod floor;
pub mod orientation;

pub use brightness::{extract_brightness, BrightnessReading};
pub use clues::{find_clues, ContextClues};
pub use floor::{find_floor, FloorMatch};
pub use orientation::{find_orientation, OrientationMatch};
