//! Static neighborhood → typical orientation table.

use super::{CollaboratorError, NeighborhoodLookup, NeighborhoodReport};
use crate::config::NeighborhoodEntry;
use crate::normalize;
use crate::signal::Orientation;

#[derive(Debug, Clone)]
struct District {
    name: String,
    /// Folded name and aliases.
    needles: Vec<String>,
    orientation: Orientation,
    confidence: f32,
    near_tokens: Vec<String>,
    near_confidence: Option<f32>,
}

/// Lookup over configured districts. First district in table order wins;
/// an exact name or alias beats a proximity match.
#[derive(Debug, Clone, Default)]
pub struct NeighborhoodTable {
    districts: Vec<District>,
}

impl NeighborhoodTable {
    /// Entries with an unknown orientation label are skipped.
    pub fn from_entries(entries: &[NeighborhoodEntry]) -> Self {
        let districts = entries
            .iter()
            .filter_map(|e| {
                let Some(orientation) = Orientation::parse(&e.orientation) else {
                    tracing::warn!(target: "exposition", district = %e.name, label = %e.orientation, "unknown orientation, district ignored");
                    return None;
                };
                let needles = std::iter::once(&e.name)
                    .chain(e.aliases.iter())
                    .map(|s| normalize::fold(s))
                    .filter(|s| !s.is_empty())
                    .collect();
                Some(District {
                    name: e.name.clone(),
                    needles,
                    orientation,
                    confidence: e.confidence,
                    near_tokens: e.near_tokens.iter().map(|t| normalize::fold(t)).collect(),
                    near_confidence: e.near_confidence,
                })
            })
            .collect();
        Self { districts }
    }

    pub fn len(&self) -> usize {
        self.districts.len()
    }

    pub fn is_empty(&self) -> bool {
        self.districts.is_empty()
    }

    pub fn find(&self, text: &str) -> NeighborhoodReport {
        let folded = normalize::fold(text);
        if folded.is_empty() {
            return NeighborhoodReport::default();
        }
        let padded = format!(" {folded} ");

        if let Some(d) = self
            .districts
            .iter()
            .find(|d| d.needles.iter().any(|n| padded.contains(&format!(" {n} "))))
        {
            return report(d, d.confidence);
        }

        let tokens: Vec<&str> = folded.split(' ').collect();
        for d in &self.districts {
            let Some(near) = d.near_confidence else { continue };
            if !d.near_tokens.is_empty() && d.near_tokens.iter().all(|t| tokens.contains(&t.as_str())) {
                return report(d, near);
            }
        }
        NeighborhoodReport::default()
    }
}

fn report(d: &District, confidence: f32) -> NeighborhoodReport {
    NeighborhoodReport {
        found: true,
        name: Some(d.name.clone()),
        typical_orientation: Some(d.orientation),
        confidence_score: confidence,
    }
}

impl NeighborhoodLookup for NeighborhoodTable {
    fn lookup(&self, text: &str) -> Result<NeighborhoodReport, CollaboratorError> {
        Ok(self.find(text))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::default_neighborhoods;

    fn table() -> NeighborhoodTable {
        NeighborhoodTable::from_entries(&default_neighborhoods())
    }

    #[test]
    fn exact_names_and_aliases() {
        let t = table();
        let r = t.find("Paris 19e - Buttes-Chaumont");
        assert!(r.found);
        assert_eq!(r.typical_orientation, Some(Orientation::SudEst));
        assert!((r.confidence_score - 0.8).abs() < 1e-6);

        let r = t.find("Appartement rue des Pyrénées");
        assert_eq!(r.name.as_deref(), Some("Pyrénées"));
        assert_eq!(r.typical_orientation, Some(Orientation::SudOuest));

        assert!((t.find("BELLEVILLE").confidence_score - 0.9).abs() < 1e-6);
    }

    #[test]
    fn proximity_tokens_give_lower_confidence() {
        let r = table().find("à deux pas des Buttes, parc Chaumont");
        assert!(r.found);
        assert!((r.confidence_score - 0.7).abs() < 1e-6);
    }

    #[test]
    fn unknown_places_and_bad_entries() {
        assert!(!table().find("Paris 15e, Convention").found);
        assert!(!table().find("").found);

        let mut bad = default_neighborhoods();
        bad[0].orientation = "plein ciel".into();
        assert_eq!(NeighborhoodTable::from_entries(&bad).len(), 3);
    }
}
