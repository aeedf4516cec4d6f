// src/lib.rs
// Public library surface: exposition judgement of apartment listings.

pub mod cascade;
pub mod collab;
pub mod confidence;
pub mod config;
pub mod display;
pub mod extract;
pub mod judgement;
pub mod listing;
pub mod normalize;
pub mod signal;
pub mod vote;

// ---- Re-exports for stable public API ----
pub use crate::cascade::ExpositionEngine;
pub use crate::collab::{build_collaborators, CollaboratorError, Collaborators};
pub use crate::config::EngineConfig;
pub use crate::display::{format_exposition, ExpositionDisplay};
pub use crate::judgement::{CascadeState, ExpositionJudgement, Tier};
pub use crate::listing::{ListingObservation, PhotoRef};
pub use crate::signal::{ImageIntensity, Orientation, SignalClass, SignalKind};
