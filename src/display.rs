//! Display line for a judgement:
//! `Lumineux (80% confiance) · 4e étage · pas de vis à vis · Exposition Sud détectée`.

use std::fmt;

use serde::Serialize;

use crate::collab::ViewKind;
use crate::extract::find_floor;
use crate::judgement::{floor_label, ExpositionJudgement};
use crate::listing::ListingObservation;
use crate::normalize;
use crate::signal::SignalClass;

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ExpositionDisplay {
    pub main_value: &'static str,
    pub confidence: u8,
    /// Evidence hints joined with " · "; `None` when there is nothing to show.
    pub indices: Option<String>,
}

pub fn main_value(class: SignalClass) -> &'static str {
    match class {
        SignalClass::Lumineux => "Lumineux",
        SignalClass::Moyen => "Luminosité moyenne",
        SignalClass::Sombre => "Sombre",
    }
}

pub fn format_exposition(judgement: &ExpositionJudgement, listing: &ListingObservation) -> ExpositionDisplay {
    let mut indices = Vec::new();

    let level = judgement
        .details
        .floor_level
        .or_else(|| find_floor(&[listing.floor.as_str()]).map(|m| m.level));
    if let Some(level) = level {
        indices.push(floor_label(level));
    }

    if let Some(hint) = vis_a_vis(judgement, listing) {
        indices.push(hint.to_string());
    }

    if let Some(o) = judgement.details.orientation {
        indices.push(format!("Exposition {o} détectée"));
    }

    ExpositionDisplay {
        main_value: main_value(judgement.final_class),
        confidence: judgement.confidence_percent,
        indices: (!indices.is_empty()).then(|| indices.join(" · ")),
    }
}

fn vis_a_vis(judgement: &ExpositionJudgement, listing: &ListingObservation) -> Option<&'static str> {
    let folded = format!(" {} ", normalize::fold(&listing.description));
    if folded.contains(" pas de vis ") || folded.contains(" sans vis a vis ") {
        return Some("pas de vis à vis");
    }
    if folded.contains(" vis a vis ") {
        return Some("vis à vis");
    }
    match judgement.details.view.as_ref().and_then(|v| v.kind) {
        Some(ViewKind::VisAVis) => Some("vis à vis"),
        _ => None,
    }
}

impl fmt::Display for ExpositionDisplay {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} ({}% confiance)", self.main_value, self.confidence)?;
        if let Some(indices) = &self.indices {
            write!(f, " · {indices}")?;
        }
        Ok(())
    }
}
